//! Table generation: expands declared templates into the full table set.
//!
//! 1. flatten columns of simplifiable types into plain columns
//! 2. check that every referenced table exists
//! 3. generate a child table per `List<T>` column, depth-first
//! 4. generate one junction table per associated table pair

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::debug;

use crate::ast::*;
use crate::config::Config;
use crate::registry::TableRegistry;

#[derive(Debug, thiserror::Error)]
pub enum SemanticError {
    #[error("{table}.{column}: table `{referenced}` is not declared")]
    UndeclaredTable {
        table: String,
        column: String,
        referenced: String,
    },
    #[error("{table}.{column}: table `{referenced}` has no column `{field}`")]
    UndeclaredColumn {
        table: String,
        column: String,
        referenced: String,
        field: String,
    },
    #[error("{table}.{column}: cannot flatten `{type_name}`: {reason}")]
    AmbiguousFlattening {
        table: String,
        column: String,
        type_name: String,
        reason: String,
    },
    #[error("{table}.{column}: `List<{element}>` expands into itself")]
    RecursiveListType {
        table: String,
        column: String,
        element: String,
    },
    #[error("table `{table}` has no primary key")]
    MissingPrimaryKey { table: String },
    #[error("table `{table}`: the {key} must name exactly one column")]
    CompositeCommonCode { table: String, key: &'static str },
}

/// `Foo, Bar -> Bar_Foo_assoc`
pub fn association_table_name(one: &str, other: &str) -> String {
    let mut names = [one, other];
    names.sort_unstable();
    format!("{}_{}_assoc", names[0], names[1])
}

pub fn child_table_name(parent: &str, column: &str) -> String {
    format!("{parent}_{column}")
}

pub fn expand(templates: TableRegistry, config: &Config) -> Result<TableRegistry, SemanticError> {
    Generator::new(config).expand(templates)
}

pub struct Generator<'c> {
    config: &'c Config,
}

impl<'c> Generator<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self { config }
    }

    pub fn expand(&self, templates: TableRegistry) -> Result<TableRegistry, SemanticError> {
        let mut registry = templates;
        for table in registry.iter_mut() {
            table.finalize(self.config);
        }

        self.simplify(&mut registry)?;
        self.check_references(&registry)?;

        let templates = registry.clone();
        for name in templates.names() {
            let mut lineage = vec![name.clone()];
            self.expand_children(&templates, &mut registry, &name, &mut lineage)?;
        }
        self.generate_associations(&templates, &mut registry)?;

        debug!(
            templates = templates.len(),
            tables = registry.len(),
            "expanded table set"
        );
        Ok(registry)
    }

    fn simplify(&self, registry: &mut TableRegistry) -> Result<(), SemanticError> {
        let snapshot = registry.clone();
        for table in registry.iter_mut() {
            self.simplify_table(table, &snapshot)?;
            table.synthesize_foreign_keys(self.config);
            table.update_refs();
        }
        Ok(())
    }

    /// Replace each column of a simplifiable type with the configured fields
    /// copied from that type's declared table.
    fn simplify_table(
        &self,
        table: &mut CreateTable,
        snapshot: &TableRegistry,
    ) -> Result<(), SemanticError> {
        let targets: Vec<(Column, String, Vec<String>)> = table
            .plain_columns()
            .filter_map(|col| {
                let type_name = col.data_type.referenced_table()?;
                let fields = self.config.simplified_fields(type_name)?;
                Some((col.clone(), type_name.to_string(), fields.to_vec()))
            })
            .collect();

        for (original, type_name, fields) in targets {
            let ambiguous = |reason: String| SemanticError::AmbiguousFlattening {
                table: table.name.clone(),
                column: original.name.clone(),
                type_name: type_name.clone(),
                reason,
            };

            if fields.is_empty() {
                return Err(ambiguous("no fields are configured".into()));
            }
            let mut seen = HashSet::new();
            if let Some(dup) = fields.iter().find(|f| !seen.insert(f.as_str())) {
                return Err(ambiguous(format!("field `{dup}` is listed twice")));
            }

            let template =
                snapshot
                    .get(&type_name)
                    .ok_or_else(|| SemanticError::UndeclaredTable {
                        table: table.name.clone(),
                        column: original.name.clone(),
                        referenced: type_name.clone(),
                    })?;

            let mut columns = IndexMap::new();
            for field in &fields {
                let source =
                    template
                        .column(field)
                        .ok_or_else(|| SemanticError::UndeclaredColumn {
                            table: table.name.clone(),
                            column: original.name.clone(),
                            referenced: type_name.clone(),
                            field: field.clone(),
                        })?;

                let name = if fields.len() == 1 {
                    original.name.clone()
                } else {
                    format!("{}_{}", original.name, field)
                };
                if name != original.name && table.columns.contains_key(&name) {
                    return Err(ambiguous(format!("column `{name}` already exists")));
                }

                let mut column = Column::new(&name, source.data_type.clone());
                column.comment = source.comment.clone().or_else(|| original.comment.clone());
                column.nullable = original.nullable;
                column.table = Some(table.name.clone());
                column.pos = original.pos;
                columns.insert(field.clone(), column);
            }

            debug!(
                table = %table.name,
                column = %original.name,
                type_name = %type_name,
                fields = columns.len(),
                "flattened column"
            );
            let key = original.name.clone();
            table
                .columns
                .insert(key, ColumnEntry::Replacement(Replacement { original, columns }));
        }
        Ok(())
    }

    fn check_references(&self, registry: &TableRegistry) -> Result<(), SemanticError> {
        for table in registry.iter() {
            for column in table.plain_columns() {
                let referenced = match &column.data_type {
                    DataType::TypeRef(r) => &r.name,
                    DataType::List(l) => &l.element,
                    DataType::Scalar(_) | DataType::Map(_) => continue,
                };
                if !registry.contains(referenced) {
                    return Err(SemanticError::UndeclaredTable {
                        table: table.name.clone(),
                        column: column.name.clone(),
                        referenced: referenced.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Generate the children of `parent_name`, then theirs, depth-first.
    /// `lineage` holds the element types already being expanded on this chain.
    fn expand_children(
        &self,
        templates: &TableRegistry,
        registry: &mut TableRegistry,
        parent_name: &str,
        lineage: &mut Vec<String>,
    ) -> Result<(), SemanticError> {
        let lists = match registry.get(parent_name) {
            Some(parent) => parent.list_columns(),
            None => return Ok(()),
        };

        for (column, element) in lists {
            if lineage.contains(&element) {
                return Err(SemanticError::RecursiveListType {
                    table: parent_name.to_string(),
                    column,
                    element,
                });
            }

            let template = templates
                .get(&element)
                .ok_or_else(|| SemanticError::UndeclaredTable {
                    table: parent_name.to_string(),
                    column: column.clone(),
                    referenced: element.clone(),
                })?;

            let child = match registry.get(parent_name) {
                Some(parent) => self.build_child(parent, &column, template)?,
                None => continue,
            };
            let child_name = child.name.clone();

            let created = match registry.get_mut(&child_name) {
                Some(existing) => {
                    merge_child(existing, child);
                    false
                }
                None => {
                    registry.insert(child);
                    true
                }
            };
            debug!(table = %child_name, parent = %parent_name, created, "child table");

            if let Some(parent) = registry.get_mut(parent_name) {
                parent.children.insert(child_name.clone());
            }

            lineage.push(element);
            self.expand_children(templates, registry, &child_name, lineage)?;
            lineage.pop();
        }
        Ok(())
    }

    fn build_child(
        &self,
        parent: &CreateTable,
        column: &str,
        template: &CreateTable,
    ) -> Result<CreateTable, SemanticError> {
        let mut child = CreateTable::new(&child_table_name(&parent.name, column));
        child.columns = template.columns.clone();
        child.primary_key = template.primary_key.clone();
        child.indexes = template.indexes.clone();
        child.unique_keys = template.unique_keys.clone();
        child.foreign_keys = template.foreign_keys.clone();
        child.options = template.options.clone();
        child.parent = Some(parent.name.clone());
        child.comment = format!(
            "Generated from template table '{}', for {}.{}",
            template.name, parent.name, column
        );

        if let (Some(tpl), Some(own)) = (template.option("COMMENT"), parent.option("COMMENT")) {
            let merged = format!("{}_{}", tpl.text(), own.text());
            child.set_option("COMMENT", Literal::Str(merged));
        }

        let link_comment = format!("foreign key to {} ({})", parent.name, parent.comment);

        let parent_id = format!("{}_id", parent.name);
        child.add_column(Column::new(&parent_id, DataType::int()).with_comment(link_comment.clone()));
        child
            .foreign_keys
            .push(ForeignKey::new(column, &parent_id, &parent.name, "id"));

        if self.config.foreign_key_use_unique_code {
            if let Some(key) = parent.unique_code() {
                let code = single_column(parent, key, "unique code")?;
                let code_col = code_column(parent, column, code)?;
                let name = format!("{}_{}", parent.name, code);
                if !child.columns.contains_key(&name) {
                    child.add_column(
                        Column::new(&name, code_col.data_type.clone()).with_comment(link_comment),
                    );
                }
                if child.find_foreign_key(&name).is_none() {
                    child.foreign_keys.push(
                        ForeignKey::new(&name, &name, &parent.name, code)
                            .on_delete(ReferenceOption::Cascade),
                    );
                }
            }
        }

        if let Some(common) = &parent.common_code {
            let code = single_column(parent, common, "common code")?;
            let code_col = code_column(parent, column, code)?;
            if !child.columns.contains_key(code) {
                let mut col = Column::new(code, code_col.data_type.clone());
                col.comment = code_col.comment.clone();
                child.add_column(col);
            }
            if child.find_foreign_key(code).is_none() {
                child.foreign_keys.push(
                    ForeignKey::new(code, code, &parent.name, code)
                        .on_delete(ReferenceOption::Cascade),
                );
            }
            child.common_code = Some(common.clone());
        }

        child.finalize(self.config);
        Ok(child)
    }

    fn generate_associations(
        &self,
        templates: &TableRegistry,
        registry: &mut TableRegistry,
    ) -> Result<(), SemanticError> {
        let mut created = Vec::new();

        for table in templates.iter() {
            for column in table.plain_columns() {
                let Some(assoc) = &column.assoc else {
                    continue;
                };

                let target =
                    templates
                        .get(&assoc.table)
                        .ok_or_else(|| SemanticError::UndeclaredTable {
                            table: table.name.clone(),
                            column: column.name.clone(),
                            referenced: assoc.table.clone(),
                        })?;
                let target_col =
                    target
                        .column(&assoc.column)
                        .ok_or_else(|| SemanticError::UndeclaredColumn {
                            table: table.name.clone(),
                            column: column.name.clone(),
                            referenced: assoc.table.clone(),
                            field: assoc.column.clone(),
                        })?;

                let name = association_table_name(&table.name, &assoc.table);
                let (junction, is_new) = registry.get_or_insert_with(&name, || {
                    new_association_table(&name, &table.name, &assoc.table)
                });
                if is_new {
                    created.push(name.clone());
                }

                let side = format!("{}_{}", assoc.table, assoc.column);
                if !junction.columns.contains_key(&side) {
                    let mut col = Column::new(&side, target_col.data_type.clone());
                    col.table = Some(name.clone());
                    junction.add_column(col);
                }
            }
        }

        for name in &created {
            if let Some(junction) = registry.get_mut(name) {
                junction.finalize(self.config);
            }
        }
        debug!(junctions = created.len(), "association tables");
        Ok(())
    }
}

fn single_column<'a>(
    table: &CreateTable,
    key: &'a UniqueKey,
    what: &'static str,
) -> Result<&'a str, SemanticError> {
    key.key_name().ok_or_else(|| SemanticError::CompositeCommonCode {
        table: table.name.clone(),
        key: what,
    })
}

fn code_column<'a>(
    parent: &'a CreateTable,
    column: &str,
    code: &str,
) -> Result<&'a Column, SemanticError> {
    parent
        .column(code)
        .ok_or_else(|| SemanticError::UndeclaredColumn {
            table: parent.name.clone(),
            column: column.to_string(),
            referenced: parent.name.clone(),
            field: code.to_string(),
        })
}

/// Add what `child` has and `existing` lacks; nothing is replaced.
fn merge_child(existing: &mut CreateTable, child: CreateTable) {
    for (name, entry) in child.columns {
        if !existing.columns.contains_key(&name) {
            existing.columns.insert(name, entry);
        }
    }
    for fk in child.foreign_keys {
        let present = match &fk.index_name {
            Some(index_name) => existing.find_foreign_key(index_name).is_some(),
            None => existing.foreign_keys.contains(&fk),
        };
        if !present {
            existing.foreign_keys.push(fk);
        }
    }
    existing.update_refs();
}

fn new_association_table(name: &str, this: &str, other: &str) -> CreateTable {
    let mut table = CreateTable::new(name);

    let mut id = Column::new("id", DataType::int()).with_comment("generated primary key column");
    id.nullable = false;
    id.auto_increment = true;
    id.unique = true;
    table.add_column(id);
    table.primary_key = Some(PrimaryKey::on(&["id"]));

    table.set_option(
        "COMMENT",
        Literal::Str(format!("association table for {this} and {other}")),
    );
    table.comment = "many-to-many assoc table".to_string();
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn templates(input: &str, config: &Config) -> TableRegistry {
        let file = Parser::new(input, config).unwrap().parse().unwrap();
        TableRegistry::from_sources([file])
    }

    fn column_names(table: &CreateTable) -> Vec<&str> {
        table.columns.keys().map(String::as_str).collect()
    }

    const ONE_TO_MANY: &str = "
CREATE TABLE Item (id INT NOT NULL, name VARCHAR(32), PRIMARY KEY (id)) COMMENT = 'item';
CREATE TABLE A (id INT NOT NULL, item List<Item>, PRIMARY KEY (id)) COMMENT = 'a';
";

    #[test]
    fn test_one_to_many_expansion() {
        let config = Config::default();
        let registry = expand(templates(ONE_TO_MANY, &config), &config).unwrap();

        assert_eq!(registry.names(), vec!["Item", "A", "A_item"]);

        let child = registry.get("A_item").unwrap();
        assert_eq!(column_names(child), vec!["id", "name", "etl_date", "A_id"]);
        assert_eq!(child.parent.as_deref(), Some("A"));
        assert_eq!(child.primary_key, Some(PrimaryKey::on(&["id"])));
        assert_eq!(child.comment, "Generated from template table 'Item', for A.item");
        assert_eq!(child.option("COMMENT"), Some(&Literal::Str("item_a".into())));
        assert_eq!(
            child.column("A_id").unwrap().comment.as_deref(),
            Some("foreign key to A (a)")
        );

        let fk = child.find_foreign_key("item").unwrap();
        assert_eq!(fk.columns, vec!["A_id"]);
        assert_eq!(fk.ref_table, "A");
        assert_eq!(fk.ref_columns, vec!["id"]);
        assert_eq!(fk.on_delete, None);
        assert!(child.refs.contains("A"));

        let parent = registry.get("A").unwrap();
        assert!(parent.children.contains("A_item"));
    }

    #[test]
    fn test_unique_and_common_code_propagate() {
        let input = "
CREATE TABLE Line (id INT NOT NULL, qty INT, PRIMARY KEY (id));
CREATE TABLE Form (
    id INT NOT NULL,
    formCode VARCHAR(32) NOT NULL COMMENT 'form code',
    lines List<Line>,
    PRIMARY KEY (id),
    CONSTRAINT __unique_code UNIQUE KEY (formCode),
    __common_code (formCode)
);
";
        let config = Config::default();
        let registry = expand(templates(input, &config), &config).unwrap();
        let child = registry.get("Form_lines").unwrap();

        assert_eq!(
            column_names(child),
            vec!["id", "qty", "etl_date", "Form_id", "Form_formCode", "formCode"]
        );
        let unique = child.find_foreign_key("Form_formCode").unwrap();
        assert_eq!(unique.ref_columns, vec!["formCode"]);
        assert_eq!(unique.on_delete, Some(ReferenceOption::Cascade));

        let common = child.find_foreign_key("formCode").unwrap();
        assert_eq!(common.columns, vec!["formCode"]);
        assert_eq!(child.common_code, Some(UniqueKey::on(&["formCode"])));
        assert_eq!(
            child.column("formCode").unwrap().comment.as_deref(),
            Some("form code")
        );

        let config = Config {
            foreign_key_use_unique_code: false,
            ..Config::default()
        };
        let registry = expand(templates(input, &config), &config).unwrap();
        let child = registry.get("Form_lines").unwrap();
        assert!(child.column("Form_formCode").is_none());
        assert!(child.column("formCode").is_some());
    }

    #[test]
    fn test_nested_lists_expand_depth_first() {
        let input = "
CREATE TABLE C (id INT, PRIMARY KEY (id));
CREATE TABLE B (id INT, cs List<C>, PRIMARY KEY (id));
CREATE TABLE A (id INT, bs List<B>, PRIMARY KEY (id));
";
        let config = Config::default();
        let registry = expand(templates(input, &config), &config).unwrap();
        assert_eq!(
            registry.names(),
            vec!["C", "B", "A", "B_cs", "A_bs", "A_bs_cs"]
        );
        let grandchild = registry.get("A_bs_cs").unwrap();
        assert_eq!(grandchild.parent.as_deref(), Some("A_bs"));
        assert!(grandchild.column("A_bs_id").is_some());
        assert!(registry.get("A_bs").unwrap().children.contains("A_bs_cs"));
    }

    #[test]
    fn test_no_duplicate_children() {
        let input = "
CREATE TABLE X (id INT, x VARCHAR(8), PRIMARY KEY (id));
CREATE TABLE Y (id INT, c List<X>, PRIMARY KEY (id));
CREATE TABLE A (id INT, b_c List<X>, b List<Y>, PRIMARY KEY (id));
";
        let config = Config::default();
        let registry = expand(templates(input, &config), &config).unwrap();

        let count = registry.names().iter().filter(|n| *n == "A_b_c").count();
        assert_eq!(count, 1);

        // built first from A.b_c, then merged from A_b.c
        let merged = registry.get("A_b_c").unwrap();
        assert!(merged.column("A_id").is_some());
        assert!(merged.column("A_b_id").is_some());
        assert!(merged.find_foreign_key("b_c").is_some());
        assert!(merged.find_foreign_key("c").is_some());
        assert!(merged.refs.contains("A") && merged.refs.contains("A_b"));
    }

    #[test]
    fn test_recursive_list_is_rejected() {
        let input = "
CREATE TABLE Node (id INT, kids List<Leaf>, PRIMARY KEY (id));
CREATE TABLE Leaf (id INT, back List<Node>, PRIMARY KEY (id));
";
        let config = Config::default();
        let err = expand(templates(input, &config), &config).unwrap_err();
        assert!(matches!(err, SemanticError::RecursiveListType { ref element, .. } if element == "Node"));
    }

    #[test]
    fn test_undeclared_tables() {
        let config = Config::default();
        let err = expand(
            templates("CREATE TABLE A (id INT, item List<Item>, PRIMARY KEY (id));", &config),
            &config,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "A.item: table `Item` is not declared");

        let err = expand(
            templates("CREATE TABLE A (id INT, owner User, PRIMARY KEY (id));", &config),
            &config,
        )
        .unwrap_err();
        assert!(matches!(err, SemanticError::UndeclaredTable { ref referenced, .. } if referenced == "User"));
    }

    fn simplify_config(fields: &[&str]) -> Config {
        let mut config = Config::default();
        config.simplify_types.insert(
            "DateTimeInput".into(),
            fields.iter().map(|f| f.to_string()).collect(),
        );
        config
    }

    const SIMPLIFY: &str = "
CREATE TABLE DateTimeInput (
    id INT,
    startTime DATETIME COMMENT 'start',
    endTime DATETIME,
    PRIMARY KEY (id)
);
CREATE TABLE Trip (id INT, period DateTimeInput NOT NULL COMMENT 'trip period', PRIMARY KEY (id));
";

    #[test]
    fn test_simplify_single_field() {
        let config = simplify_config(&["startTime"]);
        let registry = expand(templates(SIMPLIFY, &config), &config).unwrap();
        let trip = registry.get("Trip").unwrap();

        match trip.columns.get("period").unwrap() {
            ColumnEntry::Replacement(r) => {
                assert_eq!(r.original.data_type, DataType::TypeRef(TypeRef::new("DateTimeInput")));
                let col = &r.columns["startTime"];
                assert_eq!(col.name, "period");
                assert_eq!(col.data_type, DataType::scalar("DATETIME"));
                assert_eq!(col.comment.as_deref(), Some("start"));
                assert!(!col.nullable);
            }
            other => panic!("expected replacement, got {other:?}"),
        }
        assert!(trip.foreign_keys.is_empty());
        assert!(trip.refs.is_empty());
    }

    #[test]
    fn test_simplify_several_fields() {
        let config = simplify_config(&["startTime", "endTime"]);
        let registry = expand(templates(SIMPLIFY, &config), &config).unwrap();
        let entry = registry.get("Trip").unwrap().columns.get("period").unwrap();
        let names: Vec<_> = entry.columns().iter().map(|c| c.name.clone()).collect();
        assert_eq!(names, vec!["period_startTime", "period_endTime"]);
        // falls back to the original column's comment
        assert_eq!(entry.columns()[1].comment.as_deref(), Some("trip period"));
    }

    #[test]
    fn test_simplify_errors() {
        let config = simplify_config(&["nope"]);
        let err = expand(templates(SIMPLIFY, &config), &config).unwrap_err();
        assert!(matches!(err, SemanticError::UndeclaredColumn { ref field, .. } if field == "nope"));

        let config = simplify_config(&[]);
        let err = expand(templates(SIMPLIFY, &config), &config).unwrap_err();
        assert!(matches!(err, SemanticError::AmbiguousFlattening { .. }));

        let config = simplify_config(&["startTime", "startTime"]);
        let err = expand(templates(SIMPLIFY, &config), &config).unwrap_err();
        assert!(matches!(err, SemanticError::AmbiguousFlattening { .. }));
    }

    #[test]
    fn test_association_merge() {
        let input = "
CREATE TABLE Tag (id INT, name VARCHAR(16), label VARCHAR(32), PRIMARY KEY (id));
CREATE TABLE Post (
    id INT,
    title VARCHAR(64),
    tagName VARCHAR(16) __assoc Tag.name,
    tagLabel VARCHAR(32) __assoc Tag.label,
    tagAgain VARCHAR(16) __assoc Tag.name,
    PRIMARY KEY (id)
);
CREATE TABLE Tag2 (id INT, post VARCHAR(64) __assoc Post.title, PRIMARY KEY (id));
CREATE TABLE Other (id INT, t VARCHAR(64) __assoc Post.title, PRIMARY KEY (id));
";
        let config = Config::default();
        let registry = expand(templates(input, &config), &config).unwrap();

        let junction = registry.get("Post_Tag_assoc").unwrap();
        assert_eq!(
            column_names(junction),
            vec!["id", "Tag_name", "Tag_label", "etl_date"]
        );
        let id = junction.column("id").unwrap();
        assert!(id.auto_increment && id.unique && !id.nullable);
        assert_eq!(junction.primary_key, Some(PrimaryKey::on(&["id"])));
        assert_eq!(junction.comment, "many-to-many assoc table");
        assert_eq!(
            junction.column("Tag_label").unwrap().data_type,
            DataType::Scalar(ScalarType::new("VARCHAR").with_max(32))
        );

        assert!(registry.contains("Post_Tag2_assoc"));
        assert!(registry.contains("Other_Post_assoc"));
        let junctions = registry.names().iter().filter(|n| n.ends_with("_assoc")).count();
        assert_eq!(junctions, 3);
    }

    #[test]
    fn test_association_from_both_sides() {
        let input = "
CREATE TABLE Tag (id INT, name VARCHAR(16), post VARCHAR(64) __assoc Post.title, PRIMARY KEY (id));
CREATE TABLE Post (id INT, title VARCHAR(64), tag VARCHAR(16) __assoc Tag.name, PRIMARY KEY (id));
";
        let config = Config::default();
        let registry = expand(templates(input, &config), &config).unwrap();

        let junctions: Vec<String> = registry
            .names()
            .into_iter()
            .filter(|n| n.ends_with("_assoc"))
            .collect();
        assert_eq!(junctions, vec!["Post_Tag_assoc"]);

        let junction = registry.get("Post_Tag_assoc").unwrap();
        assert_eq!(
            column_names(junction),
            vec!["id", "Post_title", "Tag_name", "etl_date"]
        );
        assert_eq!(
            junction.column("Post_title").unwrap().data_type,
            DataType::Scalar(ScalarType::new("VARCHAR").with_max(64))
        );
    }

    #[test]
    fn test_association_errors() {
        let config = Config::default();
        let input = "CREATE TABLE A (id INT, t VARCHAR(8) __assoc Tag.name, PRIMARY KEY (id));";
        let err = expand(templates(input, &config), &config).unwrap_err();
        assert!(matches!(err, SemanticError::UndeclaredTable { ref referenced, .. } if referenced == "Tag"));

        let input = "
CREATE TABLE Tag (id INT, PRIMARY KEY (id));
CREATE TABLE A (id INT, t VARCHAR(8) __assoc Tag.name, PRIMARY KEY (id));
";
        let err = expand(templates(input, &config), &config).unwrap_err();
        assert!(matches!(err, SemanticError::UndeclaredColumn { ref field, .. } if field == "name"));
    }

    #[test]
    fn test_expansion_is_deterministic() {
        let config = Config::default();
        let once = expand(templates(ONE_TO_MANY, &config), &config).unwrap();
        let twice = expand(templates(ONE_TO_MANY, &config), &config).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_table_names() {
        assert_eq!(association_table_name("Foo", "Bar"), "Bar_Foo_assoc");
        assert_eq!(association_table_name("Bar", "Foo"), "Bar_Foo_assoc");
        assert_eq!(child_table_name("A", "item"), "A_item");
    }
}
