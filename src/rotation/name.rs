//! Artifact identifiers.

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

/// Identifier of one output artifact.
///
/// Renders as `<prefix>[_<date>].<ext>[_<generation>]`, e.g.
/// `snapshots_2024-01-02.json` (generation 0) or `snapshots_2024-01-02.json_3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactName {
    prefix: String,
    date: Option<NaiveDate>,
    extension: String,
    generation: u32,
}

impl ArtifactName {
    /// Undated generation-0 identifier.
    pub fn new(prefix: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            date: None,
            extension: extension.into(),
            generation: 0,
        }
    }

    /// Same identifier stamped with `date`.
    #[must_use]
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Generation-0 identifier for another date.
    #[must_use]
    pub fn for_date(&self, date: NaiveDate) -> Self {
        Self {
            prefix: self.prefix.clone(),
            date: Some(date),
            extension: self.extension.clone(),
            generation: 0,
        }
    }

    /// Identifier of the following generation on the same date.
    #[must_use]
    pub fn next_generation(&self) -> Self {
        Self {
            generation: self.generation.saturating_add(1),
            ..self.clone()
        }
    }
}

impl std::fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.prefix)?;
        if let Some(date) = self.date {
            write!(f, "_{}", date.format("%Y-%m-%d"))?;
        }
        write!(f, ".{}", self.extension)?;
        if self.generation > 0 {
            write!(f, "_{}", self.generation)?;
        }
        Ok(())
    }
}

impl Serialize for ArtifactName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_undated_name() {
        let name = ArtifactName::new("stocks/intraday_data/snapshots_logs", "json");
        assert_eq!(name.to_string(), "stocks/intraday_data/snapshots_logs.json");
        assert_eq!(name.generation(), 0);
        assert_eq!(name.date(), None);
    }

    #[test]
    fn test_dated_name() {
        let name = ArtifactName::new("prices", "csv").with_date(date(2024, 1, 1));
        assert_eq!(name.to_string(), "prices_2024-01-01.csv");
    }

    #[test]
    fn test_generations_are_suffixed() {
        let gen0 = ArtifactName::new("prices", "csv").with_date(date(2024, 1, 1));
        let gen1 = gen0.next_generation();
        let gen2 = gen1.next_generation();

        assert_eq!(gen1.to_string(), "prices_2024-01-01.csv_1");
        assert_eq!(gen2.to_string(), "prices_2024-01-01.csv_2");
        assert_eq!(gen2.generation(), 2);
        assert_eq!(gen2.date(), Some(date(2024, 1, 1)));
    }

    #[test]
    fn test_for_date_resets_generation() {
        let old = ArtifactName::new("prices", "json")
            .with_date(date(2024, 1, 1))
            .next_generation()
            .next_generation();
        let new = old.for_date(date(2024, 1, 2));

        assert_eq!(new.generation(), 0);
        assert_eq!(new.to_string(), "prices_2024-01-02.json");
    }

    #[test]
    fn test_serializes_as_string() {
        let name = ArtifactName::new("prices", "json").next_generation();
        let json = serde_json::to_value(&name).unwrap();
        assert_eq!(json, serde_json::json!("prices.json_1"));
    }
}
