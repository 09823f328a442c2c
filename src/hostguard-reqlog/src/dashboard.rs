//! Time-bucketed dashboard aggregation.
//!
//! Read side of the pipeline: scans the `requests` table for a time window
//! and folds rows into fixed-width buckets aligned to the epoch. Linear in
//! the number of rows inside the window; there are no pre-aggregated
//! rollups, so very wide windows over a high-rate log get expensive.

use std::collections::BTreeMap;

use chrono::Utc;
use rusqlite::params;
use serde::{Deserialize, Serialize};

use hostguard_storage::{Database, Result};

use crate::event::Decision;

const MINUTE_MILLIS: i64 = 60 * 1000;

/// Dashboard window selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    OneHour,
    SixHours,
    TwentyFourHours,
    SevenDays,
    ThirtyDays,
}

impl TimeRange {
    /// Parse a range key. Unrecognized keys fall back to 24 hours.
    pub fn parse(key: &str) -> Self {
        match key {
            "1h" => TimeRange::OneHour,
            "6h" => TimeRange::SixHours,
            "7d" => TimeRange::SevenDays,
            "30d" => TimeRange::ThirtyDays,
            _ => TimeRange::TwentyFourHours,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeRange::OneHour => "1h",
            TimeRange::SixHours => "6h",
            TimeRange::TwentyFourHours => "24h",
            TimeRange::SevenDays => "7d",
            TimeRange::ThirtyDays => "30d",
        }
    }

    /// Window length in milliseconds.
    pub fn window_millis(self) -> i64 {
        match self {
            TimeRange::OneHour => 60 * MINUTE_MILLIS,
            TimeRange::SixHours => 6 * 60 * MINUTE_MILLIS,
            TimeRange::TwentyFourHours => 24 * 60 * MINUTE_MILLIS,
            TimeRange::SevenDays => 7 * 24 * 60 * MINUTE_MILLIS,
            TimeRange::ThirtyDays => 30 * 24 * 60 * MINUTE_MILLIS,
        }
    }

    /// Bucket width in milliseconds.
    pub fn bucket_millis(self) -> i64 {
        match self {
            TimeRange::OneHour => 5 * MINUTE_MILLIS,
            TimeRange::SixHours => 30 * MINUTE_MILLIS,
            TimeRange::TwentyFourHours => 60 * MINUTE_MILLIS,
            TimeRange::SevenDays => 360 * MINUTE_MILLIS,
            TimeRange::ThirtyDays => 1440 * MINUTE_MILLIS,
        }
    }
}

/// Per-bucket connection counts for the chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketCount {
    pub timestamp: i64,
    pub count: i64,
    pub approved: i64,
    pub rejected: i64,
}

/// One raw event row for the detail table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestDetail {
    pub timestamp: i64,
    pub host: String,
    pub method: String,
    pub path: String,
    pub port: u16,
    pub decision: Decision,
    /// Evaluation duration in nanoseconds, as stored.
    pub duration: f64,
}

/// Aggregated dashboard payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub time_range: String,
    pub total_requests: i64,
    pub approved_count: i64,
    pub rejected_count: i64,
    /// Buckets in ascending time order.
    pub connections: Vec<BucketCount>,
    /// Raw rows, newest first.
    pub requests: Vec<RequestDetail>,
}

/// Aggregate the event rows of `[now - window, now]` into a dashboard.
///
/// Bucket keys are the row timestamp floor-divided by the bucket width, so
/// bucket boundaries align to the epoch rather than to the window start.
pub fn get_dashboard(db: &Database, range_key: &str) -> Result<DashboardData> {
    let range = TimeRange::parse(range_key);
    let end = Utc::now().timestamp_millis();
    let start = end - range.window_millis();
    let bucket_width = range.bucket_millis();

    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT timestamp, host, method, path, port, decision, duration
             FROM requests
             WHERE timestamp >= ?1 AND timestamp <= ?2
             ORDER BY timestamp DESC",
        )?;
        let mut rows = stmt.query(params![start, end])?;

        let mut buckets: BTreeMap<i64, BucketCount> = BTreeMap::new();
        let mut requests = Vec::new();
        let mut total_requests = 0i64;
        let mut approved_count = 0i64;
        let mut rejected_count = 0i64;

        while let Some(row) = rows.next()? {
            let timestamp: i64 = row.get(0)?;
            let decision_raw: String = row.get(5)?;
            let decision = Decision::parse(&decision_raw);

            let bucket_start = (timestamp / bucket_width) * bucket_width;
            let bucket = buckets.entry(bucket_start).or_insert(BucketCount {
                timestamp: bucket_start,
                count: 0,
                approved: 0,
                rejected: 0,
            });

            bucket.count += 1;
            match decision {
                Decision::Approved => {
                    bucket.approved += 1;
                    approved_count += 1;
                }
                Decision::Rejected => {
                    bucket.rejected += 1;
                    rejected_count += 1;
                }
            }
            total_requests += 1;

            requests.push(RequestDetail {
                timestamp,
                host: row.get(1)?,
                method: row.get(2)?,
                path: row.get(3)?,
                port: row.get(4)?,
                decision,
                duration: row.get(6)?,
            });
        }

        Ok(DashboardData {
            time_range: range_key.to_string(),
            total_requests,
            approved_count,
            rejected_count,
            // BTreeMap iteration yields buckets in ascending time order.
            connections: buckets.into_values().collect(),
            requests,
        })
    })
}
