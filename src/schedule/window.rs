//! Session windows and the timing-window predicate.

use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;

use super::spec::ScheduleError;

/// A time-of-day interval with its own polling interval.
///
/// Windows never wrap midnight: `start` is strictly before `end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionWindow {
    start: NaiveTime,
    end: NaiveTime,
    interval: Duration,
}

impl SessionWindow {
    /// Create a window active on `[start, end)` that ticks every `interval`.
    ///
    /// # Errors
    /// Returns `ScheduleError::InvalidWindow` if `start >= end` or the interval is zero.
    pub fn new(start: NaiveTime, end: NaiveTime, interval: Duration) -> Result<Self, ScheduleError> {
        if start >= end {
            return Err(ScheduleError::InvalidWindow(format!(
                "start {start} must be before end {end}"
            )));
        }
        if interval.is_zero() {
            return Err(ScheduleError::InvalidWindow(format!(
                "window {start}-{end} interval must be positive"
            )));
        }
        Ok(Self {
            start,
            end,
            interval,
        })
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether a local time of day falls inside `[start, end)`.
    pub fn contains(&self, local: NaiveTime) -> bool {
        self.start <= local && local < self.end
    }

    /// Whether the window is active at `now`, evaluated in `tz`.
    pub fn is_active(&self, now: DateTime<Utc>, tz: Tz) -> bool {
        self.contains(now.with_timezone(&tz).time())
    }

    /// Whether two windows share any instant.
    pub fn overlaps(&self, other: &SessionWindow) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl std::fmt::Display for SessionWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{} every {:?}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M"),
            self.interval
        )
    }
}
