//! Name-indexed arena of tables shared by the generation engine.
//!
//! Tables refer to each other by name only; every cross-table link
//! (foreign key target, parent, child, association side) is a lookup here.

use indexmap::IndexMap;
use indexmap::map::Entry;
use tracing::warn;

use crate::ast::{CreateTable, SourceFile};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRegistry {
    tables: IndexMap<String, CreateTable>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect declared tables; a later declaration of a name replaces the
    /// earlier one but keeps its slot.
    pub fn from_tables(tables: impl IntoIterator<Item = CreateTable>) -> Self {
        let mut registry = Self::new();
        for table in tables {
            if let Some(previous) = registry.insert(table) {
                warn!(table = %previous.name, "table declared more than once; keeping the last");
            }
        }
        registry
    }

    pub fn from_sources(sources: impl IntoIterator<Item = SourceFile>) -> Self {
        Self::from_tables(sources.into_iter().flat_map(SourceFile::into_tables))
    }

    pub fn insert(&mut self, table: CreateTable) -> Option<CreateTable> {
        self.tables.insert(table.name.clone(), table)
    }

    /// The table named `name`, created with `create` when absent.
    /// The flag tells whether it was created.
    pub fn get_or_insert_with(
        &mut self,
        name: &str,
        create: impl FnOnce() -> CreateTable,
    ) -> (&mut CreateTable, bool) {
        match self.tables.entry(name.to_string()) {
            Entry::Occupied(e) => (e.into_mut(), false),
            Entry::Vacant(e) => (e.insert(create()), true),
        }
    }

    pub fn get(&self, name: &str) -> Option<&CreateTable> {
        self.tables.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut CreateTable> {
        self.tables.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Declaration position of `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.tables.get_index_of(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CreateTable> {
        self.tables.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut CreateTable> {
        self.tables.values_mut()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl IntoIterator for TableRegistry {
    type Item = CreateTable;
    type IntoIter = indexmap::map::IntoValues<String, CreateTable>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.into_values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Column, DataType, SourceId, Statement};

    #[test]
    fn test_later_declaration_wins_in_place() {
        let mut a2 = CreateTable::new("A");
        a2.add_column(Column::new("x", DataType::int()));

        let registry = TableRegistry::from_tables([
            CreateTable::new("A"),
            CreateTable::new("B"),
            a2.clone(),
        ]);

        assert_eq!(registry.names(), vec!["A", "B"]);
        assert_eq!(registry.get("A"), Some(&a2));
        assert_eq!(registry.index_of("B"), Some(1));
    }

    #[test]
    fn test_get_or_insert_with() {
        let mut registry = TableRegistry::new();
        let (_, created) = registry.get_or_insert_with("A_b", || CreateTable::new("A_b"));
        assert!(created);

        let (table, created) = registry.get_or_insert_with("A_b", || CreateTable::new("other"));
        assert!(!created);
        assert_eq!(table.name, "A_b");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_from_sources_merges_files() {
        let file = |source, name: &str| SourceFile {
            source: SourceId(source),
            statements: vec![Statement::CreateTable(Box::new(CreateTable::new(name)))],
        };
        let registry = TableRegistry::from_sources([file(0, "A"), file(1, "B")]);
        assert!(registry.contains("A"));
        assert!(registry.contains("B"));
        assert!(!registry.is_empty());
    }
}
