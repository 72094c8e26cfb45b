//! Translation settings shared by every pipeline stage.

use indexmap::IndexMap;
use serde::Deserialize;

/// Immutable settings threaded through parser, generator and renderer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Render complex columns as `JSON` instead of `MEDIUMTEXT`.
    pub use_json: bool,
    pub default_collate: String,
    pub default_charset: String,
    /// Downgrade a missing primary key from an error to a warning.
    pub allow_primary_key_missing: bool,
    /// Carry a parent's `__unique_code` column into generated child tables.
    pub foreign_key_use_unique_code: bool,
    pub inject_etl_date_col: bool,
    pub etl_col_name: String,
    /// Render every table as `CREATE TABLE IF NOT EXISTS`.
    pub inject_if_not_exists: bool,
    pub simplify_flag: bool,
    /// Type name -> fields a column of that type is flattened into.
    pub simplify_types: IndexMap<String, Vec<String>>,
    /// Columns always rendered with the complex fallback type.
    pub complex_columns: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            use_json: false,
            default_collate: "utf8mb4_0900_ai_ci".to_string(),
            default_charset: "utf8mb4".to_string(),
            allow_primary_key_missing: false,
            foreign_key_use_unique_code: true,
            inject_etl_date_col: true,
            etl_col_name: "etl_date".to_string(),
            inject_if_not_exists: false,
            simplify_flag: true,
            simplify_types: IndexMap::new(),
            complex_columns: Vec::new(),
        }
    }
}

impl Config {
    /// Parse a configuration from JSON. Missing keys take their defaults.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Fields a column of type `type_name` flattens into, if simplification applies.
    pub fn simplified_fields(&self, type_name: &str) -> Option<&[String]> {
        if !self.simplify_flag {
            return None;
        }
        self.simplify_types.get(type_name).map(Vec::as_slice)
    }

    pub fn is_simplified(&self, type_name: &str) -> bool {
        self.simplified_fields(type_name).is_some()
    }

    /// Column type used where a value has no relational shape.
    pub fn complex_type(&self) -> &'static str {
        if self.use_json { "JSON" } else { "MEDIUMTEXT" }
    }

    pub fn is_complex_column(&self, name: &str) -> bool {
        self.complex_columns.iter().any(|c| c == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.inject_etl_date_col);
        assert_eq!(config.etl_col_name, "etl_date");
        assert_eq!(config.complex_type(), "MEDIUMTEXT");
        assert!(!config.is_simplified("AmountInput"));
    }

    #[test]
    fn test_from_json_partial() {
        let json = r#"{
            "use_json": true,
            "simplify_types": { "AmountInput": ["amount"], "DateTimeInput": ["startTime", "endTime"] }
        }"#;
        let config = Config::from_json(json).unwrap();
        assert_eq!(config.complex_type(), "JSON");
        assert_eq!(config.default_collate, "utf8mb4_0900_ai_ci");
        assert_eq!(
            config.simplified_fields("DateTimeInput"),
            Some(&["startTime".to_string(), "endTime".to_string()][..])
        );
        let keys: Vec<_> = config.simplify_types.keys().collect();
        assert_eq!(keys, vec!["AmountInput", "DateTimeInput"]);
    }

    #[test]
    fn test_simplify_flag_off() {
        let mut config = Config::default();
        config.simplify_types.insert("AmountInput".into(), vec!["amount".into()]);
        assert!(config.is_simplified("AmountInput"));
        config.simplify_flag = false;
        assert!(!config.is_simplified("AmountInput"));
    }
}
