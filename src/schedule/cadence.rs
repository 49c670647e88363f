//! Per-recorder tick timing state.

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};

use super::spec::{CLOCK_POLL_INTERVAL, ScheduleSpec};

/// What the recorder loop should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Sleep, then re-evaluate without ticking.
    Wait(Duration),
    /// Sleep (possibly zero), then run one tick.
    TickAfter(Duration),
}

/// Turns a [`ScheduleSpec`] into loop steps.
///
/// For clock-time schedules the cadence remembers the last local minute it
/// fired for, so each listed minute yields exactly one tick however often the
/// loop polls.
#[derive(Debug, Clone)]
pub struct Cadence {
    spec: ScheduleSpec,
    last_fired: Option<NaiveDateTime>,
}

impl Cadence {
    pub fn new(spec: ScheduleSpec) -> Self {
        Self {
            spec,
            last_fired: None,
        }
    }

    pub fn spec(&self) -> &ScheduleSpec {
        &self.spec
    }

    /// Decide the next step at `now`.
    pub fn next_step(&mut self, now: DateTime<Utc>) -> Step {
        match &self.spec {
            ScheduleSpec::ClockTimes(clock) => match clock.matching_minute(now) {
                Some(minute) if self.last_fired != Some(minute) => {
                    self.last_fired = Some(minute);
                    Step::TickAfter(Duration::ZERO)
                }
                _ => Step::Wait(CLOCK_POLL_INTERVAL),
            },
            ScheduleSpec::Sessions(sessions) => Step::TickAfter(sessions.interval_at(now)),
            ScheduleSpec::Interval(interval) => Step::TickAfter(*interval),
        }
    }
}
