//! Schedule configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::schedule::{ClockSchedule, ScheduleSpec, SessionSchedule, SessionWindow};

use super::validation::{ConfigError, parse_clock_time, parse_timezone};

/// Timezone used when a schedule block does not name one.
pub const DEFAULT_TIMEZONE: &str = "America/New_York";

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

/// One session window, local times as `HH:MM`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub start: String,
    pub end: String,
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

/// Session-window mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// IANA timezone of the window times (default: America/New_York).
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Interval outside every window (default: 1m).
    #[serde(default, with = "humantime_serde")]
    pub default_interval: Option<Duration>,
    pub windows: Vec<WindowConfig>,
}

/// Fixed clock-time mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockTimesConfig {
    /// IANA timezone of the listed times (default: America/New_York).
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Local times as `HH:MM`.
    pub times: Vec<String>,
}

/// Schedule block of a recorder. At most one mode may be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleConfig {
    /// Fixed interval mode.
    #[serde(default, with = "humantime_serde")]
    pub interval: Option<Duration>,
    /// Session-window mode.
    #[serde(default)]
    pub sessions: Option<SessionsConfig>,
    /// Fixed clock-time mode.
    #[serde(default)]
    pub clock_times: Option<ClockTimesConfig>,
}

impl ScheduleConfig {
    /// Build the schedule. No mode selects the US equity session.
    ///
    /// # Errors
    /// Returns `ConfigError` when more than one mode is set, or when a
    /// timezone, time, or window is invalid.
    pub fn to_spec(&self) -> Result<ScheduleSpec, ConfigError> {
        let modes = [
            self.interval.is_some(),
            self.sessions.is_some(),
            self.clock_times.is_some(),
        ];
        if modes.iter().filter(|set| **set).count() > 1 {
            return Err(ConfigError::ValidationError(
                "schedule: set only one of interval, sessions, clock_times".to_string(),
            ));
        }

        if let Some(interval) = self.interval {
            return Ok(ScheduleSpec::interval(interval));
        }
        if let Some(sessions) = &self.sessions {
            return sessions.to_spec();
        }
        if let Some(clock) = &self.clock_times {
            return clock.to_spec();
        }
        Ok(ScheduleSpec::equity_session())
    }
}

impl SessionsConfig {
    fn to_spec(&self) -> Result<ScheduleSpec, ConfigError> {
        let tz = parse_timezone(&self.timezone)
            .map_err(|e| ConfigError::ValidationError(format!("schedule.sessions: {e}")))?;
        let windows = self
            .windows
            .iter()
            .map(|w| {
                let start = parse_clock_time(&w.start).map_err(ConfigError::ValidationError)?;
                let end = parse_clock_time(&w.end).map_err(ConfigError::ValidationError)?;
                Ok(SessionWindow::new(start, end, w.interval)?)
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(ScheduleSpec::Sessions(SessionSchedule::new(
            tz,
            windows,
            self.default_interval,
        )?))
    }
}

impl ClockTimesConfig {
    fn to_spec(&self) -> Result<ScheduleSpec, ConfigError> {
        let tz = parse_timezone(&self.timezone)
            .map_err(|e| ConfigError::ValidationError(format!("schedule.clock_times: {e}")))?;
        let times = self
            .times
            .iter()
            .map(|t| parse_clock_time(t).map_err(ConfigError::ValidationError))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ScheduleSpec::ClockTimes(ClockSchedule::new(tz, times)?))
    }
}
