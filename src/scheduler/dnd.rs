//! Do-not-disturb window
//!
//! An inclusive range of local hours in a named IANA timezone. `00,09`
//! covers 00:00 through 09:59. A start hour greater than the end hour wraps
//! past midnight (`22,06`).

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use std::fmt;

use super::error::{SchedulerError, SchedulerResult};
use crate::config::ScheduleConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DndWindow {
    start_hour: u32,
    end_hour: u32,
    tz: Tz,
}

impl DndWindow {
    pub fn new(start_hour: u32, end_hour: u32, tz: Tz) -> SchedulerResult<Self> {
        for hour in [start_hour, end_hour] {
            if hour > 23 {
                return Err(SchedulerError::invalid_hour(hour));
            }
        }
        Ok(Self {
            start_hour,
            end_hour,
            tz,
        })
    }

    /// Parse a `"start,end"` hour range and a timezone name
    pub fn parse(hours: &str, timezone: &str) -> SchedulerResult<Self> {
        let (start, end) = hours
            .split_once(',')
            .ok_or_else(|| SchedulerError::invalid_window(hours, "expected 'start,end'"))?;

        let parse_hour = |raw: &str| {
            raw.trim()
                .parse::<u32>()
                .map_err(|_| SchedulerError::invalid_window(hours, format!("'{}' is not an hour", raw.trim())))
        };

        let tz: Tz = timezone
            .trim()
            .parse()
            .map_err(|_| SchedulerError::invalid_timezone(timezone))?;

        Self::new(parse_hour(start)?, parse_hour(end)?, tz)
    }

    /// Window described by the schedule section; `None` when disabled
    pub fn from_config(config: &ScheduleConfig) -> SchedulerResult<Option<Self>> {
        if !config.dnd_enabled {
            return Ok(None);
        }
        Self::parse(&config.dnd_hours, &config.timezone).map(Some)
    }

    pub fn start_hour(&self) -> u32 {
        self.start_hour
    }

    pub fn end_hour(&self) -> u32 {
        self.end_hour
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Hour of `now` in the window's timezone
    pub fn local_hour(&self, now: DateTime<Utc>) -> u32 {
        now.with_timezone(&self.tz).hour()
    }

    /// Whether `now` falls inside the window
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        let hour = self.local_hour(now);
        if self.start_hour <= self.end_hour {
            self.start_hour <= hour && hour <= self.end_hour
        } else {
            hour >= self.start_hour || hour <= self.end_hour
        }
    }
}

impl fmt::Display for DndWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02} {}", self.start_hour, self.end_hour, self.tz.name())
    }
}
