//! Rotation policy and decisions.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use super::name::ArtifactName;

/// Per-target rotation configuration.
///
/// A target always has a policy; [`RotationPolicy::none`] is the explicit
/// "never rotate" value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RotationPolicy {
    max_bytes: Option<u64>,
    daily: Option<Tz>,
}

impl RotationPolicy {
    /// Policy that never rotates.
    pub fn none() -> Self {
        Self::default()
    }

    /// Rotate to the next generation once the artifact reaches `max_bytes`.
    #[must_use]
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    /// Open one artifact per calendar day in `tz`.
    #[must_use]
    pub fn with_daily(mut self, tz: Tz) -> Self {
        self.daily = Some(tz);
        self
    }

    pub fn max_bytes(&self) -> Option<u64> {
        self.max_bytes
    }

    pub fn daily(&self) -> Option<Tz> {
        self.daily
    }

    /// Whether this policy can never rotate.
    pub fn is_noop(&self) -> bool {
        self.max_bytes.is_none() && self.daily.is_none()
    }

    /// Today's date in the policy timezone, if day rotation is enabled.
    pub fn today(&self, now: DateTime<Utc>) -> Option<NaiveDate> {
        self.daily.map(|tz| now.with_timezone(&tz).date_naive())
    }

    /// Identifier a target starts with at construction.
    pub fn initial_name(
        &self,
        prefix: impl Into<String>,
        extension: impl Into<String>,
        now: DateTime<Utc>,
    ) -> ArtifactName {
        let name = ArtifactName::new(prefix, extension);
        match self.today(now) {
            Some(date) => name.with_date(date),
            None => name,
        }
    }

    /// New-day identifier if the date encoded in `current` is not today.
    pub fn date_rollover(&self, current: &ArtifactName, now: DateTime<Utc>) -> Option<ArtifactName> {
        let today = self.today(now)?;
        (current.date() != Some(today)).then(|| current.for_date(today))
    }

    /// Whether an artifact of `size` bytes is due for size rotation.
    pub fn size_exceeded(&self, size: u64) -> bool {
        self.max_bytes.is_some_and(|max| size >= max)
    }
}

/// Outcome of one rotation check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rotation {
    /// Current artifact stays in use.
    Unchanged,
    /// Calendar day changed; switched to generation 0 of today.
    NewDay { from: ArtifactName, to: ArtifactName },
    /// Size threshold reached; switched to a later generation.
    NextGeneration { from: ArtifactName, to: ArtifactName },
}

impl Rotation {
    /// Whether the current artifact changed.
    pub fn is_rotated(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}
