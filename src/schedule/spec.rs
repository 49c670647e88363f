//! Schedule specification types.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use thiserror::Error;

use super::window::SessionWindow;

/// Minimum allowed interval (1 second).
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Interval used outside every session window when none is configured (60 seconds).
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Re-check period while waiting for a listed clock time (1 second).
pub const CLOCK_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Errors raised while constructing a schedule.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// A session window is malformed.
    #[error("invalid session window: {0}")]
    InvalidWindow(String),

    /// Two session windows share an instant.
    #[error("session windows overlap: {first} and {second}")]
    OverlappingWindows { first: String, second: String },

    /// Clock-time schedule without any times.
    #[error("clock-time schedule needs at least one time")]
    EmptyClockTimes,
}

/// Describes when fetch/persist ticks occur.
#[derive(Debug, Clone)]
pub enum ScheduleSpec {
    /// Tick every interval unconditionally.
    Interval(Duration),
    /// Session windows with a fallback interval.
    Sessions(SessionSchedule),
    /// Fire once per listed local wall-clock minute.
    ClockTimes(ClockSchedule),
}

impl ScheduleSpec {
    /// Create a fixed-interval schedule.
    ///
    /// Interval is clamped to a minimum of 1 second.
    pub fn interval(duration: Duration) -> Self {
        Self::Interval(clamp_interval(duration))
    }

    /// US equity session: 09:25-16:05 New York time every 5 seconds, every
    /// minute otherwise.
    pub fn equity_session() -> Self {
        let window = SessionWindow::new(
            NaiveTime::from_hms_opt(9, 25, 0).unwrap_or(NaiveTime::MIN),
            NaiveTime::from_hms_opt(16, 5, 0).unwrap_or(NaiveTime::MIN),
            Duration::from_secs(5),
        );
        match window {
            Ok(w) => Self::Sessions(SessionSchedule {
                windows: vec![w],
                default_interval: DEFAULT_INTERVAL,
                timezone: chrono_tz::America::New_York,
            }),
            Err(_) => Self::Interval(DEFAULT_INTERVAL),
        }
    }
}

impl std::fmt::Display for ScheduleSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Interval(d) => write!(f, "every {:?}", d),
            Self::Sessions(s) => write!(
                f,
                "{} session window(s) in {}, default every {:?}",
                s.windows.len(),
                s.timezone,
                s.default_interval
            ),
            Self::ClockTimes(c) => {
                let times: Vec<String> = c
                    .times
                    .iter()
                    .map(|t| t.format("%H:%M").to_string())
                    .collect();
                write!(f, "at {} ({})", times.join(", "), c.timezone)
            }
        }
    }
}

/// Ordered, non-overlapping session windows in one timezone.
#[derive(Debug, Clone)]
pub struct SessionSchedule {
    windows: Vec<SessionWindow>,
    default_interval: Duration,
    timezone: Tz,
}

impl SessionSchedule {
    /// Create a session schedule.
    ///
    /// Windows keep their declaration order. A missing default interval falls
    /// back to [`DEFAULT_INTERVAL`]; an empty window list always uses the default.
    ///
    /// # Errors
    /// Returns `ScheduleError::OverlappingWindows` if any two windows overlap.
    pub fn new(
        timezone: Tz,
        windows: Vec<SessionWindow>,
        default_interval: Option<Duration>,
    ) -> Result<Self, ScheduleError> {
        for (i, first) in windows.iter().enumerate() {
            if let Some(second) = windows[i + 1..].iter().find(|w| first.overlaps(w)) {
                return Err(ScheduleError::OverlappingWindows {
                    first: first.to_string(),
                    second: second.to_string(),
                });
            }
        }

        Ok(Self {
            windows,
            default_interval: clamp_interval(default_interval.unwrap_or(DEFAULT_INTERVAL)),
            timezone,
        })
    }

    pub fn windows(&self) -> &[SessionWindow] {
        &self.windows
    }

    pub fn default_interval(&self) -> Duration {
        self.default_interval
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// First window (in declaration order) active at `now`.
    pub fn active_window(&self, now: DateTime<Utc>) -> Option<&SessionWindow> {
        self.windows.iter().find(|w| w.is_active(now, self.timezone))
    }

    /// Interval that applies at `now`.
    pub fn interval_at(&self, now: DateTime<Utc>) -> Duration {
        self.active_window(now)
            .map(SessionWindow::interval)
            .unwrap_or(self.default_interval)
    }
}

/// Explicit set of local wall-clock minutes.
#[derive(Debug, Clone)]
pub struct ClockSchedule {
    times: BTreeSet<NaiveTime>,
    timezone: Tz,
}

impl ClockSchedule {
    /// Create a clock-time schedule. Seconds are truncated.
    ///
    /// # Errors
    /// Returns `ScheduleError::EmptyClockTimes` if no time is given.
    pub fn new(
        timezone: Tz,
        times: impl IntoIterator<Item = NaiveTime>,
    ) -> Result<Self, ScheduleError> {
        let times: BTreeSet<NaiveTime> = times.into_iter().map(truncate_to_minute).collect();
        if times.is_empty() {
            return Err(ScheduleError::EmptyClockTimes);
        }
        Ok(Self { times, timezone })
    }

    pub fn times(&self) -> impl Iterator<Item = &NaiveTime> {
        self.times.iter()
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// The local minute at `now` if it is a listed time.
    ///
    /// The returned value carries the local date so the same listed time on
    /// consecutive days is distinguishable.
    pub fn matching_minute(&self, now: DateTime<Utc>) -> Option<NaiveDateTime> {
        let local = now.with_timezone(&self.timezone).naive_local();
        let minute = truncate_to_minute(local.time());
        self.times
            .contains(&minute)
            .then(|| local.date().and_time(minute))
    }
}

/// Drop seconds and sub-second precision from a time of day.
pub fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}

fn clamp_interval(duration: Duration) -> Duration {
    if duration < MIN_INTERVAL {
        tracing::warn!(min_interval = ?MIN_INTERVAL, requested = ?duration,
            "Interval duration is less than minimum allowed. Using minimum duration."
        );
        MIN_INTERVAL
    } else {
        duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn window(start: (u32, u32), end: (u32, u32), secs: u64) -> SessionWindow {
        SessionWindow::new(
            hm(start.0, start.1),
            hm(end.0, end.1),
            Duration::from_secs(secs),
        )
        .unwrap()
    }

    #[test]
    fn test_schedule_interval_minimum() {
        match ScheduleSpec::interval(Duration::from_millis(100)) {
            ScheduleSpec::Interval(d) => assert_eq!(d, MIN_INTERVAL),
            _ => panic!("expected Interval"),
        }
    }

    #[test]
    fn test_schedule_interval_valid() {
        match ScheduleSpec::interval(Duration::from_secs(30)) {
            ScheduleSpec::Interval(d) => assert_eq!(d, Duration::from_secs(30)),
            _ => panic!("expected Interval"),
        }
    }

    #[test]
    fn test_sessions_reject_overlap() {
        let result = SessionSchedule::new(
            chrono_tz::UTC,
            vec![window((9, 0), (12, 0), 5), window((11, 0), (14, 0), 10)],
            None,
        );
        let err = result.unwrap_err();
        assert!(matches!(err, ScheduleError::OverlappingWindows { .. }));
        assert!(err.to_string().contains("overlap"));
    }

    #[test]
    fn test_sessions_reject_overlap_out_of_order() {
        let result = SessionSchedule::new(
            chrono_tz::UTC,
            vec![
                window((13, 0), (15, 0), 5),
                window((9, 0), (10, 0), 5),
                window((14, 30), (16, 0), 5),
            ],
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_sessions_interval_inside_and_outside() {
        let schedule = SessionSchedule::new(
            chrono_tz::UTC,
            vec![window((9, 0), (12, 0), 5), window((13, 0), (16, 0), 15)],
            Some(Duration::from_secs(120)),
        )
        .unwrap();

        let morning = Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap();
        let lunch = Utc.with_ymd_and_hms(2024, 3, 4, 12, 30, 0).unwrap();
        let afternoon = Utc.with_ymd_and_hms(2024, 3, 4, 15, 59, 59).unwrap();
        let night = Utc.with_ymd_and_hms(2024, 3, 4, 23, 0, 0).unwrap();

        assert_eq!(schedule.interval_at(morning), Duration::from_secs(5));
        assert_eq!(schedule.interval_at(lunch), Duration::from_secs(120));
        assert_eq!(schedule.interval_at(afternoon), Duration::from_secs(15));
        assert_eq!(schedule.interval_at(night), Duration::from_secs(120));
    }

    #[test]
    fn test_sessions_empty_windows_use_default() {
        let schedule = SessionSchedule::new(chrono_tz::UTC, vec![], None).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap();
        assert_eq!(schedule.interval_at(now), DEFAULT_INTERVAL);
        assert!(schedule.active_window(now).is_none());
    }

    #[test]
    fn test_equity_session_defaults() {
        let ScheduleSpec::Sessions(schedule) = ScheduleSpec::equity_session() else {
            panic!("expected Sessions");
        };
        assert_eq!(schedule.timezone(), chrono_tz::America::New_York);
        assert_eq!(schedule.default_interval(), DEFAULT_INTERVAL);

        // 15:00 UTC on a January weekday is 10:00 in New York.
        let open = Utc.with_ymd_and_hms(2024, 1, 3, 15, 0, 0).unwrap();
        assert_eq!(schedule.interval_at(open), Duration::from_secs(5));
        let closed = Utc.with_ymd_and_hms(2024, 1, 3, 23, 0, 0).unwrap();
        assert_eq!(schedule.interval_at(closed), DEFAULT_INTERVAL);
    }

    #[test]
    fn test_clock_schedule_truncates_seconds() {
        let schedule = ClockSchedule::new(
            chrono_tz::UTC,
            [NaiveTime::from_hms_opt(0, 23, 45).unwrap()],
        )
        .unwrap();
        assert_eq!(schedule.times().next(), Some(&hm(0, 23)));

        let inside = Utc.with_ymd_and_hms(2024, 5, 1, 0, 23, 59).unwrap();
        let expected = inside.date_naive().and_time(hm(0, 23));
        assert_eq!(schedule.matching_minute(inside), Some(expected));

        let after = Utc.with_ymd_and_hms(2024, 5, 1, 0, 24, 0).unwrap();
        assert_eq!(schedule.matching_minute(after), None);
    }

    #[test]
    fn test_clock_schedule_rejects_empty() {
        let result = ClockSchedule::new(chrono_tz::UTC, std::iter::empty());
        assert!(matches!(result, Err(ScheduleError::EmptyClockTimes)));
    }

    #[test]
    fn test_schedule_display() {
        let spec = ScheduleSpec::interval(Duration::from_secs(30));
        assert!(spec.to_string().contains("30s"));

        let clock = ScheduleSpec::ClockTimes(
            ClockSchedule::new(chrono_tz::UTC, [hm(9, 30), hm(16, 0)]).unwrap(),
        );
        assert_eq!(clock.to_string(), "at 09:30, 16:00 (UTC)");
    }
}
