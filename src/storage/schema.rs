//! Table-target schema definitions.

use crate::storage::StorageError;

/// DDL for a record table. `{table}` is replaced by the validated table name.
///
/// `recorded_at` is Unix milliseconds of the fetch; `payload` holds the full
/// record as JSON text.
const RECORD_TABLE_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS {table} (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    recorded_at INTEGER NOT NULL,
    symbol      TEXT,
    payload     TEXT NOT NULL
);
"#;

/// DDL for the lookup index on `(symbol, recorded_at)`.
const RECORD_INDEX_DDL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_{table}_symbol_ts ON {table} (symbol, recorded_at);
"#;

/// Validate a table name: ASCII letters, digits and underscores, not starting with a digit.
///
/// # Errors
/// Returns `StorageError::Rejected` for anything else.
pub fn validate_table_name(table: &str) -> Result<(), StorageError> {
    let mut chars = table.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(StorageError::Rejected(format!(
            "invalid table name '{table}': use letters, digits and underscores"
        )))
    }
}

/// DDL statements creating `table` and its index.
pub fn record_table_ddl(table: &str) -> Result<[String; 2], StorageError> {
    validate_table_name(table)?;
    Ok([
        RECORD_TABLE_DDL.replace("{table}", table),
        RECORD_INDEX_DDL.replace("{table}", table),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name_validation() {
        assert!(validate_table_name("trades").is_ok());
        assert!(validate_table_name("_options_chain_2").is_ok());
        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("2trades").is_err());
        assert!(validate_table_name("trades; DROP TABLE x").is_err());
        assert!(validate_table_name("alpaca.trades").is_err());
    }

    #[test]
    fn test_ddl_substitutes_table() {
        let [table, index] = record_table_ddl("quotes").unwrap();
        assert!(table.contains("CREATE TABLE IF NOT EXISTS quotes"));
        assert!(index.contains("idx_quotes_symbol_ts ON quotes"));
        assert!(!table.contains("{table}"));
    }
}
