//! Cooldown-based staleness check
//!
//! A record is stale once more than `cooldown_hours` have passed since its
//! anchor timestamp. Only stale (or absent) records justify an upstream call.

use chrono::{DateTime, Utc};

use crate::models::{LiveRecord, VideoRecord};

/// Records carrying the timestamp the cooldown is measured from
pub trait Timestamped {
    fn anchor(&self) -> DateTime<Utc>;
}

impl Timestamped for VideoRecord {
    fn anchor(&self) -> DateTime<Utc> {
        self.observed_at
    }
}

impl Timestamped for LiveRecord {
    fn anchor(&self) -> DateTime<Utc> {
        self.started_at
    }
}

/// Hours elapsed between `from` and `to`, with sub-second precision
pub fn elapsed_hours(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let delta = to - from;
    let seconds = delta.num_seconds() as f64 + f64::from(delta.subsec_nanos()) / 1e9;
    seconds / 3600.0
}

/// Whether a record is old enough to be re-checked
///
/// An absent record is always stale. Elapsed time exactly equal to the
/// cooldown is not stale.
pub fn is_stale<R: Timestamped>(record: Option<&R>, cooldown_hours: f64, now: DateTime<Utc>) -> bool {
    match record {
        None => true,
        Some(record) => elapsed_hours(record.anchor(), now) > cooldown_hours,
    }
}
