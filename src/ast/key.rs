//! Primary, unique and foreign keys.

use std::fmt;

use super::Position;

/// Symbol that marks a unique key as the table's unique code.
pub const UNIQUE_CODE_SYMBOL: &str = "__unique_code";

/// `col_name [(length)]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPart {
    pub column: String,
    pub length: Option<i64>,
    pub pos: Position,
}

impl KeyPart {
    pub fn new(column: &str) -> Self {
        Self {
            column: column.to_string(),
            length: None,
            pos: Position::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryKey {
    pub symbol: Option<String>,
    pub index_type: Option<String>,
    pub parts: Vec<KeyPart>,
    pub pos: Position,
}

impl PrimaryKey {
    pub fn on(columns: &[&str]) -> Self {
        Self {
            symbol: None,
            index_type: None,
            parts: columns.iter().map(|c| KeyPart::new(c)).collect(),
            pos: Position::default(),
        }
    }
}

/// `INDEX (col)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub column: String,
    pub pos: Position,
}

impl Index {
    pub fn on(column: &str) -> Self {
        Self {
            column: column.to_string(),
            pos: Position::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueKey {
    pub symbol: Option<String>,
    pub index_name: Option<String>,
    pub parts: Vec<KeyPart>,
    pub pos: Position,
}

impl UniqueKey {
    pub fn on(columns: &[&str]) -> Self {
        Self {
            symbol: None,
            index_name: None,
            parts: columns.iter().map(|c| KeyPart::new(c)).collect(),
            pos: Position::default(),
        }
    }

    /// The single column this key names, or `None` for composite keys.
    pub fn key_name(&self) -> Option<&str> {
        match self.parts.as_slice() {
            [part] => Some(&part.column),
            _ => None,
        }
    }

    pub fn is_unique_code(&self) -> bool {
        self.symbol.as_deref() == Some(UNIQUE_CODE_SYMBOL)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceOption {
    Restrict,
    Cascade,
    SetNull,
    NoAction,
    SetDefault,
}

impl ReferenceOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::NoAction => "NO ACTION",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

impl fmt::Display for ReferenceOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub symbol: Option<String>,
    /// Also the lookup key that keeps foreign key synthesis idempotent.
    pub index_name: Option<String>,
    pub columns: Vec<String>,
    pub ref_table: String,
    pub ref_columns: Vec<String>,
    pub match_kind: Option<String>,
    pub on_delete: Option<ReferenceOption>,
    pub on_update: Option<ReferenceOption>,
    pub pos: Position,
}

impl ForeignKey {
    pub fn new(index_name: &str, column: &str, ref_table: &str, ref_column: &str) -> Self {
        Self {
            symbol: None,
            index_name: Some(index_name.to_string()),
            columns: vec![column.to_string()],
            ref_table: ref_table.to_string(),
            ref_columns: vec![ref_column.to_string()],
            match_kind: None,
            on_delete: None,
            on_update: None,
            pos: Position::default(),
        }
    }

    pub fn on_delete(mut self, option: ReferenceOption) -> Self {
        self.on_delete = Some(option);
        self
    }
}
