//! Tables and columns.

use std::collections::BTreeSet;

use indexmap::IndexMap;

use super::{
    DataType, ForeignKey, Index, Literal, NodeId, Position, PrimaryKey, ReferenceOption,
    UniqueKey,
};
use crate::config::Config;

/// Table options in declaration order, e.g. `ENGINE`, `CHARSET`, `COMMENT`.
pub type TableOptions = IndexMap<String, Literal>;

/// `__assoc tbl.col` target of a many-to-many column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    pub table: String,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    pub default: Option<Literal>,
    pub auto_increment: bool,
    pub unique: bool,
    pub comment: Option<String>,
    pub enum_choices: Option<String>,
    pub assoc: Option<Association>,
    pub lift: bool,
    /// Name of the declaring table; a lookup key, not an owner.
    pub table: Option<String>,
    pub pos: Position,
}

impl Column {
    pub fn new(name: &str, data_type: DataType) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            nullable: true,
            default: None,
            auto_increment: false,
            unique: false,
            comment: None,
            enum_choices: None,
            assoc: None,
            lift: false,
            table: None,
            pos: Position::default(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// A composite-typed column flattened into simple columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub original: Column,
    /// Template field name -> replacing column.
    pub columns: IndexMap<String, Column>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnEntry {
    Column(Column),
    Replacement(Replacement),
}

impl ColumnEntry {
    pub fn as_column(&self) -> Option<&Column> {
        match self {
            ColumnEntry::Column(c) => Some(c),
            ColumnEntry::Replacement(_) => None,
        }
    }

    /// Columns this entry contributes to the table body.
    pub fn columns(&self) -> Vec<&Column> {
        match self {
            ColumnEntry::Column(c) => vec![c],
            ColumnEntry::Replacement(r) => r.columns.values().collect(),
        }
    }
}

/// `CREATE TABLE`, either declared in a source or generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTable {
    pub name: String,
    pub temporary: bool,
    pub if_not_exists: bool,
    pub columns: IndexMap<String, ColumnEntry>,
    pub primary_key: Option<PrimaryKey>,
    pub indexes: Vec<Index>,
    pub unique_keys: Vec<UniqueKey>,
    pub foreign_keys: Vec<ForeignKey>,
    /// Cross-system exchange key declared with `__common_code`.
    pub common_code: Option<UniqueKey>,
    pub options: TableOptions,
    pub comment: String,
    /// Tables this one has foreign keys into.
    pub refs: BTreeSet<String>,
    /// Tables generated from this one.
    pub children: BTreeSet<String>,
    /// Table this one was generated from.
    pub parent: Option<String>,
    pub pos: Position,
    finalized: bool,
}

impl CreateTable {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            temporary: false,
            if_not_exists: false,
            columns: IndexMap::new(),
            primary_key: None,
            indexes: Vec::new(),
            unique_keys: Vec::new(),
            foreign_keys: Vec::new(),
            common_code: None,
            options: TableOptions::new(),
            comment: String::new(),
            refs: BTreeSet::new(),
            children: BTreeSet::new(),
            parent: None,
            pos: Position::default(),
            finalized: false,
        }
    }

    pub fn id(&self) -> NodeId {
        self.pos.id()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn add_column(&mut self, column: Column) {
        self.columns
            .insert(column.name.clone(), ColumnEntry::Column(column));
    }

    /// Declared (non-replaced) column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name).and_then(ColumnEntry::as_column)
    }

    pub fn plain_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values().filter_map(ColumnEntry::as_column)
    }

    /// `(column, element)` for every `List<T>` column.
    pub fn list_columns(&self) -> Vec<(String, String)> {
        self.plain_columns()
            .filter_map(|c| {
                c.data_type
                    .list_element()
                    .map(|e| (c.name.clone(), e.to_string()))
            })
            .collect()
    }

    /// Option value by case-insensitive key.
    pub fn option(&self, key: &str) -> Option<&Literal> {
        self.options
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    /// Replace an option in place, or append it.
    pub fn set_option(&mut self, key: &str, value: Literal) {
        match self
            .options
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
        {
            Some((_, v)) => *v = value,
            None => {
                self.options.insert(key.to_string(), value);
            }
        }
    }

    /// The unique key carrying the `__unique_code` symbol.
    pub fn unique_code(&self) -> Option<&UniqueKey> {
        self.unique_keys.iter().find(|k| k.is_unique_code())
    }

    pub fn find_foreign_key(&self, index_name: &str) -> Option<&ForeignKey> {
        self.foreign_keys
            .iter()
            .find(|fk| fk.index_name.as_deref() == Some(index_name))
    }

    /// Per-table finalization; only the first call has any effect.
    pub fn finalize(&mut self, config: &Config) {
        if self.finalized {
            return;
        }

        if config.inject_etl_date_col {
            self.inject_etl_column(&config.etl_col_name);
        }
        self.bind_columns();

        if self.comment.is_empty() {
            if let Some(comment) = self.option("COMMENT") {
                self.comment = comment.text();
            }
        }

        self.synthesize_foreign_keys(config);
        self.update_refs();
        self.finalized = true;
    }

    fn inject_etl_column(&mut self, name: &str) {
        if self.columns.contains_key(name) {
            return;
        }
        let column = Column::new(name, DataType::scalar("DATETIME"))
            .with_comment("injected column for recording ETL datetime");
        self.add_column(column);
    }

    fn bind_columns(&mut self) {
        let table = Some(self.name.clone());
        for entry in self.columns.values_mut() {
            match entry {
                ColumnEntry::Column(c) => c.table = table.clone(),
                ColumnEntry::Replacement(r) => {
                    r.original.table = table.clone();
                    for c in r.columns.values_mut() {
                        c.table = table.clone();
                    }
                }
            }
        }
    }

    /// Ensure every to-one column has its `<col>_id -> <Table>.id` foreign key.
    pub fn synthesize_foreign_keys(&mut self, config: &Config) {
        let missing: Vec<ForeignKey> = self
            .plain_columns()
            .filter_map(|col| {
                let target = col.data_type.referenced_table()?;
                if config.is_simplified(target) || self.find_foreign_key(&col.name).is_some() {
                    return None;
                }
                let fk = ForeignKey::new(&col.name, &format!("{}_id", col.name), target, "id")
                    .on_delete(ReferenceOption::Cascade);
                Some(fk)
            })
            .collect();
        self.foreign_keys.extend(missing);
    }

    pub fn update_refs(&mut self) {
        self.refs = self
            .foreign_keys
            .iter()
            .map(|fk| fk.ref_table.clone())
            .collect();
    }
}
