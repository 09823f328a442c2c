//! Bounded log queue and the single writer worker.
//!
//! Multi-producer/single-consumer: any number of callers fire events into a
//! bounded channel; one blocking worker drains it into the `requests` table.
//! Producers never block and never fail because of logging — when the queue
//! is full the event is dropped, counted and logged.
//!
//! Shutdown is stop-then-drain: the sender is taken away first, then the
//! worker is awaited. Every event queued before shutdown is persisted; only
//! events dropped on a full queue during normal operation are ever lost.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use chrono::Utc;
use rusqlite::params;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use hostguard_storage::Database;

use crate::event::{Decision, LogEvent};

/// Default bound of the in-memory log queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Inserts slower than this are logged for operators.
const SLOW_WRITE: Duration = Duration::from_millis(250);

/// Handle to the request log pipeline.
///
/// Owns the queue sender and the writer task. Embedders wrap it in an `Arc`
/// and hand clones of the reference to every producer; there is no global
/// instance.
pub struct RequestLog {
    sender: Mutex<Option<mpsc::Sender<LogEvent>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    dropped: AtomicU64,
}

impl RequestLog {
    /// Spawn the writer worker with the default queue capacity.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(db: Database) -> Self {
        Self::spawn_with_capacity(db, DEFAULT_QUEUE_CAPACITY)
    }

    /// Spawn the writer worker with an explicit queue capacity.
    pub fn spawn_with_capacity(db: Database, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let worker = tokio::task::spawn_blocking(move || writer_loop(db, receiver));

        Self {
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
            dropped: AtomicU64::new(0),
        }
    }

    /// Record a connection attempt. Never blocks.
    ///
    /// If the queue is full the event is dropped with a warning; after
    /// [`shutdown`](Self::shutdown) the call is a no-op.
    pub fn log_request(
        &self,
        host: &str,
        method: &str,
        path: &str,
        port: u16,
        approved: bool,
        duration_nanos: i64,
    ) {
        let event = LogEvent {
            host: host.to_string(),
            method: method.to_string(),
            path: path.to_string(),
            port,
            approved,
            duration_nanos,
        };

        let guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = guard.as_ref() else {
            warn!(host = %event.host, "request log stopped, discarding event");
            return;
        };

        match sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(host = %event.host, "log queue full, dropping request");
            }
            Err(TrySendError::Closed(event)) => {
                warn!(host = %event.host, "log writer gone, discarding event");
            }
        }
    }

    /// Number of events dropped because the queue was full.
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stop accepting events, then wait for the worker to drain the queue.
    ///
    /// Idempotent; a second call returns immediately.
    pub async fn shutdown(&self) {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(sender);

        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            if let Err(err) = worker.await {
                warn!(error = %err, "log writer task failed");
            }
        }
    }
}

/// Drains the queue one event at a time. Exits once every sender is gone and
/// the queue is empty, which is exactly the shutdown drain guarantee.
fn writer_loop(db: Database, mut receiver: mpsc::Receiver<LogEvent>) {
    while let Some(event) = receiver.blocking_recv() {
        persist(&db, &event);
    }
    debug!("log writer drained and stopped");
}

fn persist(db: &Database, event: &LogEvent) {
    // Row timestamp reflects write time, not capture time.
    let timestamp = Utc::now().timestamp_millis();
    let decision = Decision::from_approved(event.approved);

    let start = Instant::now();
    let result = db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO requests (timestamp, host, method, path, port, decision, duration)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                timestamp,
                event.host,
                event.method.to_uppercase(),
                event.path,
                event.port,
                decision.as_str(),
                event.duration_nanos as f64,
            ],
        )
    });

    match result {
        Ok(_) => {
            let elapsed = start.elapsed();
            if elapsed > SLOW_WRITE {
                warn!(host = %event.host, ?elapsed, "slow request log write");
            }
        }
        Err(err) => {
            warn!(host = %event.host, error = %err, "failed to write request log");
        }
    }
}
