//! Pipeline: parse, collect templates, expand, rank, render.

use tracing::debug;

use crate::ast::{SourceFile, SourceId};
use crate::config::Config;
use crate::generate::{self, SemanticError};
use crate::parser::{ParseError, Parser};
use crate::rank::Ranking;
use crate::registry::TableRegistry;
use crate::render::Renderer;

#[derive(Debug, thiserror::Error)]
pub enum TranspileError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Semantic(#[from] SemanticError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranspileOptions {
    /// Emit `DROP TABLE IF EXISTS` for every table before the creates.
    pub drop_tables: bool,
    pub drop_cascade: bool,
}

pub fn parse_source(
    input: &str,
    source: SourceId,
    config: &Config,
) -> Result<SourceFile, ParseError> {
    Parser::with_source(input, source, config)?.parse()
}

pub fn transpile(
    input: &str,
    config: &Config,
    options: TranspileOptions,
) -> Result<String, TranspileError> {
    transpile_sources(&[input], config, options)
}

/// Transpile several sources as one schema; tables are merged by name.
pub fn transpile_sources<S: AsRef<str>>(
    inputs: &[S],
    config: &Config,
    options: TranspileOptions,
) -> Result<String, TranspileError> {
    let mut files = Vec::with_capacity(inputs.len());
    for (i, input) in inputs.iter().enumerate() {
        files.push(parse_source(input.as_ref(), SourceId(i as u32), config)?);
    }

    let templates = TableRegistry::from_sources(files);
    let registry = generate::expand(templates, config)?;
    let ranking = Ranking::new(&registry);
    let renderer = Renderer::new(config);

    let mut output = String::new();
    if options.drop_tables {
        for name in ranking.drop_order() {
            output.push_str(&renderer.drop_statement(name, options.drop_cascade));
        }
        output.push('\n');
    }
    for name in ranking.create_order() {
        if let Some(table) = registry.get(name) {
            output.push_str(&renderer.render_table(table)?);
        }
    }

    debug!(
        sources = inputs.len(),
        tables = registry.len(),
        bytes = output.len(),
        "transpiled"
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(sql: &str, needle: &str) -> usize {
        sql.find(needle)
            .unwrap_or_else(|| panic!("`{needle}` not in output:\n{sql}"))
    }

    #[test]
    fn test_one_to_many_end_to_end() {
        let input = "
CREATE TABLE Item (id INT NOT NULL, name VARCHAR(32), PRIMARY KEY (id));
CREATE TABLE A (id INT NOT NULL, item List<Item>, PRIMARY KEY (id)) COMMENT = 'a';
";
        let sql = transpile(input, &Config::default(), TranspileOptions::default()).unwrap();

        let a = position(&sql, "CREATE TABLE `A`\n");
        let child = position(&sql, "CREATE TABLE `A_item`\n");
        assert!(a < child);
        assert!(sql.contains("-- Generated from template table 'Item', for A.item\n"));
        assert!(sql.contains("    `A_id` INT NULL COMMENT 'foreign key to A (a)',\n"));
        assert!(sql.contains("    FOREIGN KEY `item` (`A_id`) REFERENCES `A` (`id`)\n)"));

        let a_body = &sql[a..child];
        assert!(!a_body.contains("`item`"));
    }

    #[test]
    fn test_create_and_drop_order() {
        let input = "
CREATE TABLE X (id INT, y Y, PRIMARY KEY (id));
CREATE TABLE Y (id INT, z Z, PRIMARY KEY (id));
CREATE TABLE Z (id INT, PRIMARY KEY (id));
CREATE TABLE Alone (id INT, PRIMARY KEY (id));
";
        let options = TranspileOptions {
            drop_tables: true,
            drop_cascade: false,
        };
        let sql = transpile(input, &Config::default(), options).unwrap();

        assert!(sql.starts_with(
            "DROP TABLE IF EXISTS `X`;\nDROP TABLE IF EXISTS `Y`;\nDROP TABLE IF EXISTS `Z`;\n\
             DROP TABLE IF EXISTS `Alone`;\n\n-- \n"
        ));
        let z = position(&sql, "CREATE TABLE `Z`");
        let y = position(&sql, "CREATE TABLE `Y`");
        let x = position(&sql, "CREATE TABLE `X`");
        let alone = position(&sql, "CREATE TABLE `Alone`");
        assert!(z < y && y < x && x < alone);
    }

    #[test]
    fn test_cyclic_references_terminate() {
        let input = "
CREATE TABLE A (id INT, b B, PRIMARY KEY (id));
CREATE TABLE B (id INT, a A, PRIMARY KEY (id));
";
        let sql = transpile(input, &Config::default(), TranspileOptions::default()).unwrap();
        assert!(position(&sql, "CREATE TABLE `A`") < position(&sql, "CREATE TABLE `B`"));
    }

    #[test]
    fn test_sources_are_merged() {
        let config = Config::default();
        let sql = transpile_sources(
            &[
                "CREATE TABLE Item (id INT, PRIMARY KEY (id));",
                "CREATE TABLE A (id INT, items List<Item>, PRIMARY KEY (id));",
            ],
            &config,
            TranspileOptions::default(),
        )
        .unwrap();
        assert!(sql.contains("CREATE TABLE `A_items`"));
    }

    #[test]
    fn test_errors_abort() {
        let config = Config::default();
        let err = transpile(
            "CREATE TABLE A (id INT, item List<Item>, PRIMARY KEY (id));",
            &config,
            TranspileOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TranspileError::Semantic(SemanticError::UndeclaredTable { .. })));

        let err = transpile("CREATE VIEW v;", &config, TranspileOptions::default()).unwrap_err();
        assert!(matches!(err, TranspileError::Parse(_)));
        assert_eq!(err.to_string(), "1:8: unexpected VIEW, expected DATABASE or TABLE");
    }

    #[test]
    fn test_association_end_to_end() {
        let input = "
CREATE TABLE Tag (id INT, name VARCHAR(16), PRIMARY KEY (id));
CREATE TABLE Post (id INT, tag VARCHAR(16) __assoc Tag.name, PRIMARY KEY (id));
";
        let sql = transpile(input, &Config::default(), TranspileOptions::default()).unwrap();
        assert!(sql.contains("-- many-to-many assoc table\nCREATE TABLE `Post_Tag_assoc`\n"));
        assert!(sql.contains("    `id` INT AUTO_INCREMENT NOT NULL UNIQUE COMMENT 'generated primary key column',\n"));
        assert!(sql.contains("    `Tag_name` VARCHAR(16) NULL,\n"));
        assert!(sql.contains("COMMENT = 'association table for Post and Tag'"));
    }
}
