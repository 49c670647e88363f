//! Configuration module for the market recorder.
//!
//! Provides YAML-based configuration loading and validation for:
//! - Server settings (port, bind address) of the single-shot HTTP surface
//! - Recorders: symbols, source, schedule and storage targets

mod app;
mod schedule;
mod source;
mod target;
mod validation;

pub use app::{AppConfig, RecorderConfig, ServerConfig};
pub use schedule::{
    ClockTimesConfig, DEFAULT_TIMEZONE, ScheduleConfig, SessionsConfig, WindowConfig,
};
pub use source::SourceConfig;
pub use target::{ArtifactConfig, StoreConfig, TableConfig, TargetConfig};
pub use validation::{
    ConfigError, expand_env_vars, parse_clock_time, parse_duration, parse_timezone,
};
