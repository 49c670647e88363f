//! Tick Scheduling
//!
//! Decides when a recorder fetches and persists. Timing is evaluated fresh at
//! every loop iteration against the current wall clock, never pre-computed.
//!
//! # Modes
//!
//! - [`ScheduleSpec::Interval`]: tick every `N` seconds unconditionally
//! - [`ScheduleSpec::Sessions`]: per-window intervals inside trading sessions,
//!   a default interval outside them
//! - [`ScheduleSpec::ClockTimes`]: fire once per listed local wall-clock minute
//!
//! [`Cadence`] owns the per-recorder state (the clock-time debounce) and turns
//! a spec plus "now" into the next [`Step`].

mod cadence;
mod spec;
mod window;

pub use cadence::{Cadence, Step};
pub use spec::{
    CLOCK_POLL_INTERVAL, ClockSchedule, DEFAULT_INTERVAL, MIN_INTERVAL, ScheduleError,
    ScheduleSpec, SessionSchedule, truncate_to_minute,
};
pub use window::SessionWindow;
