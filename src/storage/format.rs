//! Artifact serialization formats.
//!
//! - **csv**: row-oriented, naturally appendable; header written once per artifact
//! - **json**: one top-level array of record objects, rewritten on every append

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{AsRefStr, Display, EnumString};

use crate::record::Record;
use crate::storage::StorageError;

/// Serialization format of an artifact target.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Format {
    /// Row-oriented tabular artifact.
    Csv,
    /// Structured-document artifact (JSON array).
    Json,
}

impl Format {
    /// File extension used in artifact names.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    /// Initial content of a fresh artifact, for formats whose appends are not
    /// self-contained.
    pub fn seed(&self) -> Option<&'static [u8]> {
        match self {
            Self::Csv => None,
            Self::Json => Some(b"[]".as_slice()),
        }
    }
}

/// Column order derived from a record: its keys, sorted.
pub fn infer_columns(record: &Record) -> Vec<String> {
    let mut columns: Vec<String> = record.keys().cloned().collect();
    columns.sort();
    columns
}

/// Header row of an existing CSV artifact, `None` if it has no rows.
pub fn csv_header(existing: &[u8]) -> Result<Option<Vec<String>>, StorageError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(existing);
    match reader.records().next() {
        Some(row) => Ok(Some(row?.iter().map(str::to_string).collect())),
        None => Ok(None),
    }
}

/// Encode records as CSV rows in `columns` order.
///
/// Missing keys become empty cells; nested values are written as compact JSON.
pub fn encode_csv(
    columns: &[String],
    records: &[Record],
    with_header: bool,
) -> Result<Vec<u8>, StorageError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if with_header {
        writer.write_record(columns)?;
    }
    for record in records {
        writer.write_record(columns.iter().map(|c| cell(record.get(c))))?;
    }
    writer
        .into_inner()
        .map_err(|e| StorageError::Io(e.into_error()))
}

/// Append records to a JSON-array document.
///
/// A missing or blank document counts as `[]`.
///
/// # Errors
/// Returns `StorageError::Rejected` if the existing document is not an array.
pub fn merge_json(existing: Option<&[u8]>, records: &[Record]) -> Result<Vec<u8>, StorageError> {
    let mut items = match existing {
        Some(bytes) if !bytes.trim_ascii().is_empty() => match serde_json::from_slice(bytes)? {
            Value::Array(items) => items,
            other => {
                return Err(StorageError::Rejected(format!(
                    "existing document is a JSON {} rather than an array",
                    json_kind(&other)
                )));
            }
        },
        _ => Vec::new(),
    };
    items.extend(records.iter().cloned().map(Value::Object));
    Ok(serde_json::to_vec(&items)?)
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!(Format::from_str("csv").unwrap(), Format::Csv);
        assert_eq!(Format::from_str("JSON").unwrap(), Format::Json);
        assert!(Format::from_str("parquet").is_err());
        assert_eq!(Format::Json.extension(), "json");
        assert_eq!(Format::Csv.as_ref(), "csv");
    }

    #[test]
    fn test_seed() {
        assert_eq!(Format::Json.seed(), Some(&b"[]"[..]));
        assert_eq!(Format::Csv.seed(), None);
    }

    #[test]
    fn test_infer_columns_sorted() {
        let r = record(json!({ "symbol": "SPY", "bid": 1.0, "ask": 2.0 }));
        assert_eq!(infer_columns(&r), vec!["ask", "bid", "symbol"]);
    }

    #[test]
    fn test_encode_csv_with_header_and_missing_cells() {
        let columns = vec!["symbol".to_string(), "bid".to_string(), "quote".to_string()];
        let records = vec![
            record(json!({ "symbol": "SPY", "bid": 470.5, "quote": { "ap": 471 } })),
            record(json!({ "symbol": "VOO", "quote": null })),
        ];

        let bytes = encode_csv(&columns, &records, true).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text,
            "symbol,bid,quote\nSPY,470.5,\"{\"\"ap\"\":471}\"\nVOO,,\n"
        );
    }

    #[test]
    fn test_encode_csv_without_header() {
        let columns = vec!["symbol".to_string()];
        let records = vec![record(json!({ "symbol": "SPY" }))];
        let text = String::from_utf8(encode_csv(&columns, &records, false).unwrap()).unwrap();
        assert_eq!(text, "SPY\n");
    }

    #[test]
    fn test_csv_header() {
        assert_eq!(csv_header(b"").unwrap(), None);
        assert_eq!(
            csv_header(b"ts,symbol\n1,SPY\n").unwrap(),
            Some(vec!["ts".to_string(), "symbol".to_string()])
        );
    }

    #[test]
    fn test_merge_json_creates_and_extends() {
        let first = merge_json(None, &[record(json!({ "symbol": "SPY" }))]).unwrap();
        let second =
            merge_json(Some(first.as_slice()), &[record(json!({ "symbol": "VOO" }))]).unwrap();

        let doc: Value = serde_json::from_slice(&second).unwrap();
        assert_eq!(doc, json!([{ "symbol": "SPY" }, { "symbol": "VOO" }]));
    }

    #[test]
    fn test_merge_json_blank_and_seeded() {
        let from_blank = merge_json(Some(&b"  \n"[..]), &[]).unwrap();
        assert_eq!(from_blank, b"[]");

        let from_seed = merge_json(Format::Json.seed(), &[record(json!({ "a": 1 }))]).unwrap();
        assert_eq!(from_seed, br#"[{"a":1}]"#);
    }

    #[test]
    fn test_merge_json_rejects_non_array() {
        let err = merge_json(Some(&br#"{"a":1}"#[..]), &[]).unwrap_err();
        assert!(matches!(err, StorageError::Rejected(_)));
        assert!(err.to_string().contains("object"));
    }
}
