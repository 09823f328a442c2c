//! Request log pipeline and dashboard analytics for HostGuard.
//!
//! Two halves share the `requests` table:
//!
//! - [`RequestLog`] — write side. A bounded queue decouples producers from a
//!   single writer worker; producers never block (drop-on-full), shutdown
//!   drains everything already queued.
//! - [`get_dashboard`] — read side. Scans a time window and aggregates rows
//!   into epoch-aligned buckets plus window-wide totals.
//!
//! # Example
//!
//! ```rust,no_run
//! use hostguard_reqlog::{get_dashboard, RequestLog};
//! use hostguard_storage::Database;
//!
//! #[tokio::main]
//! async fn main() -> hostguard_storage::Result<()> {
//!     let db = Database::open("/var/lib/hostguard")?;
//!     let log = RequestLog::spawn(db.clone());
//!
//!     // Fire-and-forget from the interception layer.
//!     log.log_request("example.com", "connect", "/", 443, false, 12_500);
//!
//!     let data = get_dashboard(&db, "1h")?;
//!     println!("{} requests in the last hour", data.total_requests);
//!
//!     log.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod dashboard;
pub mod event;
pub mod pipeline;

pub use dashboard::{get_dashboard, BucketCount, DashboardData, RequestDetail, TimeRange};
pub use event::{Decision, LogEvent};
pub use pipeline::{RequestLog, DEFAULT_QUEUE_CAPACITY};
