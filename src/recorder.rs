//! Recorder Layer
//!
//! The recording scheduler: fetch on the configured cadence, fan each batch
//! out to every target, rotate before every write, isolate failures per tick
//! and per target.
//!
//! - [`Recorder`]: One source, one schedule, its targets
//! - [`RecorderRegistry`]: Runs recorders as independent tasks with shared shutdown
//! - [`TickReport`]: What one tick did, for logs and the single-shot surface
//! - [`Clock`]: Wall-clock time for calendar decisions

mod clock;
mod registry;
mod report;
mod runner;

pub use clock::{Clock, ManualClock, SystemClock};
pub use registry::{JobInfo, RecorderRegistry, SHUTDOWN_WARN_AFTER};
pub use report::{FetchOutcome, TargetOutcome, TickReport, TickStatus};
pub use runner::Recorder;
