//! Column data types and literal values.

use std::fmt;

use super::Position;

/// Scalar type keywords recognized in a column definition.
const SCALAR_TYPES: &[&str] = &[
    "bit", "tinyint", "smallint", "mediumint", "int", "integer", "bigint", "long",
    "decimal", "numeric", "float", "double", "real",
    "bool", "boolean",
    "date", "time", "datetime", "timestamp", "year",
    "char", "varchar", "binary", "varbinary",
    "tinytext", "text", "mediumtext", "longtext", "clob",
    "tinyblob", "blob", "mediumblob", "longblob",
    "xml", "json",
];

pub fn is_scalar_type(word: &str) -> bool {
    SCALAR_TYPES.iter().any(|t| t.eq_ignore_ascii_case(word))
}

/// Closed set of column types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    /// A plain SQL type such as `VARCHAR(36)`.
    Scalar(ScalarType),
    /// Names another declared table; a to-one relationship.
    TypeRef(TypeRef),
    /// `List<T>`; a to-many relationship expanded into a child table.
    List(ListType),
    /// `Map<K, V>`; never relational.
    Map(MapType),
}

impl DataType {
    pub fn scalar(name: &str) -> Self {
        DataType::Scalar(ScalarType::new(name))
    }

    pub fn int() -> Self {
        Self::scalar("INT")
    }

    /// Name of the table a to-one reference points at.
    pub fn referenced_table(&self) -> Option<&str> {
        match self {
            DataType::TypeRef(r) => Some(&r.name),
            _ => None,
        }
    }

    /// Element table of a to-many reference.
    pub fn list_element(&self) -> Option<&str> {
        match self {
            DataType::List(l) => Some(&l.element),
            _ => None,
        }
    }
}

/// Prints the type as written in the extended dialect.
impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Scalar(s) => write!(f, "{s}"),
            DataType::TypeRef(r) => write!(f, "{}", r.name),
            DataType::List(l) => write!(f, "List<{}>", l.element),
            DataType::Map(m) => write!(f, "Map<{}, {}>", m.key, m.value),
        }
    }
}

#[derive(Debug, Clone, Eq)]
pub struct ScalarType {
    pub name: String,
    pub max: Option<i64>,
    pub scale: Option<i64>,
    pub pos: Position,
}

impl ScalarType {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            max: None,
            scale: None,
            pos: Position::default(),
        }
    }

    pub fn with_max(mut self, max: i64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn with_scale(mut self, scale: i64) -> Self {
        self.scale = Some(scale);
        self
    }
}

// Type keywords are case-insensitive.
impl PartialEq for ScalarType {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
            && self.max == other.max
            && self.scale == other.scale
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.max, self.scale) {
            (Some(max), Some(scale)) => write!(f, "{}({}, {})", self.name, max, scale),
            (Some(max), None) => write!(f, "{}({})", self.name, max),
            _ => write!(f, "{}", self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub name: String,
    pub pos: Position,
}

impl TypeRef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            pos: Position::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListType {
    pub element: String,
    pub pos: Position,
}

impl ListType {
    pub fn new(element: &str) -> Self {
        Self {
            element: element.to_string(),
            pos: Position::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapType {
    pub key: String,
    pub value: Box<DataType>,
    pub pos: Position,
}

/// A literal in a `DEFAULT` clause or a table option value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Ident(String),
    Str(String),
    Num(i64),
}

impl Literal {
    pub fn text(&self) -> String {
        match self {
            Literal::Ident(s) | Literal::Str(s) => s.clone(),
            Literal::Num(n) => n.to_string(),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Ident(s) => write!(f, "{s}"),
            Literal::Str(s) => write!(f, "'{s}'"),
            Literal::Num(n) => write!(f, "{n}"),
        }
    }
}
