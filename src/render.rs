//! DDL renderer for expanded tables.

use tracing::warn;

use crate::ast::{Column, ColumnEntry, CreateTable, DataType, Index, Literal};
use crate::config::Config;
use crate::generate::SemanticError;
use crate::serializer::{foreign_key_line, primary_key_line, unique_key_line};

pub struct Renderer<'c> {
    config: &'c Config,
}

impl<'c> Renderer<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self { config }
    }

    /// `CREATE TABLE` statement, followed by two blank lines.
    pub fn render_table(&self, table: &CreateTable) -> Result<String, SemanticError> {
        let mut s = String::new();
        for line in table.comment.split('\n') {
            s.push_str(&format!("-- {}\n", line.trim_end_matches('\r')));
        }
        s.push_str("CREATE TABLE");
        if table.if_not_exists || self.config.inject_if_not_exists {
            s.push_str(" IF NOT EXISTS");
        }
        s.push_str(&format!(" `{}`\n(\n", table.name));

        let mut lines: Vec<String> = Vec::new();
        for entry in table.columns.values() {
            match entry {
                ColumnEntry::Column(c) => lines.extend(self.render_column(c)),
                ColumnEntry::Replacement(r) => {
                    lines.extend(r.columns.values().filter_map(|c| self.render_column(c)))
                }
            }
        }

        match &table.primary_key {
            Some(pk) => lines.push(primary_key_line(pk)),
            None if self.config.allow_primary_key_missing => {
                warn!(table = %table.name, "rendering table without a primary key");
            }
            None => {
                return Err(SemanticError::MissingPrimaryKey {
                    table: table.name.clone(),
                });
            }
        }

        lines.extend(table.indexes.iter().map(index_line));
        lines.extend(table.unique_keys.iter().map(unique_key_line));
        lines.extend(table.foreign_keys.iter().map(foreign_key_line));
        s.push_str(&lines.join(",\n"));

        if let Some(code) = &table.common_code {
            let key = code
                .key_name()
                .ok_or_else(|| SemanticError::CompositeCommonCode {
                    table: table.name.clone(),
                    key: "common code",
                })?;
            if !table.indexes.iter().any(|i| i.column == key) {
                s.push_str(&format!(",\n{}", index_line(&Index::on(key))));
            }
            s.push_str(&format!("\n    #@@ __common_code (`{key}`)"));
        }

        s.push_str("\n) ");
        s.push_str(&self.format_options(table));
        s.push_str(";\n\n\n");
        Ok(s)
    }

    /// One column line, or `None` for columns absorbed into a child table.
    pub fn render_column(&self, column: &Column) -> Option<String> {
        let mut s = match &column.data_type {
            DataType::List(_) => return None,
            DataType::TypeRef(_) => format!("    `{}_id` int", column.name),
            DataType::Map(_) => format!("    `{}` {}", column.name, self.config.complex_type()),
            DataType::Scalar(_) if self.config.is_complex_column(&column.name) => {
                format!("    `{}` {}", column.name, self.config.complex_type())
            }
            DataType::Scalar(scalar) => format!("    `{}` {}", column.name, scalar),
        };

        let is_ref = matches!(column.data_type, DataType::TypeRef(_));
        if column.auto_increment && !is_ref {
            s.push_str(" AUTO_INCREMENT");
        }
        s.push_str(if column.nullable { " NULL" } else { " NOT NULL" });
        if let Some(default) = column.default.as_ref().filter(|_| !is_ref) {
            s.push_str(&format!(" DEFAULT {default}"));
        }
        if column.unique {
            s.push_str(" UNIQUE");
        }
        if let Some(comment) = &column.comment {
            s.push_str(&format!(" COMMENT '{comment}'"));
        }
        Some(s)
    }

    /// ``DROP TABLE IF EXISTS `name`[ CASCADE];``
    pub fn drop_statement(&self, table: &str, cascade: bool) -> String {
        if cascade {
            format!("DROP TABLE IF EXISTS `{table}` CASCADE;\n")
        } else {
            format!("DROP TABLE IF EXISTS `{table}`;\n")
        }
    }

    fn format_options(&self, table: &CreateTable) -> String {
        let mut lines: Vec<String> = table
            .options
            .iter()
            .map(|(k, v)| match v {
                Literal::Str(text) => format!("{k} = '{text}'"),
                other => format!("{k} = {other}"),
            })
            .collect();

        if table.option("CHARSET").is_none() {
            lines.push(format!("CHARSET = {}", self.config.default_charset));
        }
        if table.option("COLLATE").is_none() {
            lines.push(format!("COLLATE = {}", self.config.default_collate));
        }
        lines.join("\n  ")
    }
}

fn index_line(index: &Index) -> String {
    format!("    INDEX (`{}`)", index.column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SourceFile;
    use crate::parser::Parser;

    fn parse(input: &str, config: &Config) -> SourceFile {
        Parser::new(input, config).unwrap().parse().unwrap()
    }

    fn render_first(input: &str, config: &Config) -> String {
        let file = parse(input, config);
        Renderer::new(config).render_table(file.tables()[0]).unwrap()
    }

    #[test]
    fn test_render_table() {
        let config = Config::default();
        let sql = render_first(
            "CREATE TABLE Customer (
                id INT NOT NULL AUTO_INCREMENT COMMENT 'pk',
                name VARCHAR(32) DEFAULT 'x',
                PRIMARY KEY (id)
            ) ENGINE = InnoDB COMMENT = 'customers';",
            &config,
        );
        let expected = "\
-- customers
CREATE TABLE `Customer`
(
    `id` INT AUTO_INCREMENT NOT NULL COMMENT 'pk',
    `name` VARCHAR(32) NULL DEFAULT 'x',
    `etl_date` DATETIME NULL COMMENT 'injected column for recording ETL datetime',
    PRIMARY KEY (`id`)
) ENGINE = InnoDB
  COMMENT = 'customers'
  CHARSET = utf8mb4
  COLLATE = utf8mb4_0900_ai_ci;


";
        assert_eq!(sql, expected);
    }

    #[test]
    fn test_render_relations() {
        let config = Config {
            use_json: true,
            inject_etl_date_col: false,
            complex_columns: vec!["customObject".into()],
            ..Config::default()
        };
        let sql = render_first(
            "CREATE TABLE A (
                id INT NOT NULL,
                owner User NOT NULL UNIQUE COMMENT 'who',
                items List<Item>,
                attrs Map<String, Object>,
                customObject VARCHAR(255),
                PRIMARY KEY (id)
            ) CHARSET = latin1;",
            &config,
        );
        assert!(sql.contains("    `owner_id` int NOT NULL UNIQUE COMMENT 'who',\n"));
        assert!(!sql.contains("items"));
        assert!(sql.contains("    `attrs` JSON NULL,\n"));
        assert!(sql.contains("    `customObject` JSON NULL,\n"));
        assert!(sql.contains(
            "    FOREIGN KEY `owner` (`owner_id`) REFERENCES `User` (`id`) ON DELETE CASCADE\n)"
        ));
        assert!(sql.ends_with(") CHARSET = latin1\n  COLLATE = utf8mb4_0900_ai_ci;\n\n\n"));
    }

    #[test]
    fn test_render_common_code() {
        let config = Config {
            inject_etl_date_col: false,
            ..Config::default()
        };
        let input = "CREATE TABLE F (
            id INT NOT NULL,
            code VARCHAR(8) NOT NULL,
            PRIMARY KEY (id),
            __common_code (code)
        );";
        let sql = render_first(input, &config);
        assert!(sql.contains(
            "    PRIMARY KEY (`id`),\n    INDEX (`code`)\n    #@@ __common_code (`code`)\n)"
        ));

        // rendering the re-scanned output does not add a second index
        let again = render_first(&sql, &config);
        assert_eq!(again.matches("INDEX (`code`)").count(), 1);
        assert!(again.contains("#@@ __common_code (`code`)"));
    }

    #[test]
    fn test_missing_primary_key() {
        let config = Config {
            allow_primary_key_missing: true,
            ..Config::default()
        };
        let file = parse("CREATE TABLE A (id INT);", &config);
        let table = file.tables()[0];
        assert!(Renderer::new(&config).render_table(table).is_ok());

        let strict = Config::default();
        let err = Renderer::new(&strict).render_table(table).unwrap_err();
        assert!(matches!(err, SemanticError::MissingPrimaryKey { ref table } if table == "A"));
    }

    #[test]
    fn test_if_not_exists_and_drop() {
        let config = Config {
            inject_if_not_exists: true,
            ..Config::default()
        };
        let sql = render_first("CREATE TABLE A (id INT, PRIMARY KEY (id));", &config);
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS `A`\n"));

        let renderer = Renderer::new(&config);
        assert_eq!(renderer.drop_statement("A", false), "DROP TABLE IF EXISTS `A`;\n");
        assert_eq!(renderer.drop_statement("A", true), "DROP TABLE IF EXISTS `A` CASCADE;\n");
        assert_eq!(
            renderer.drop_statement("Order", false),
            "DROP TABLE IF EXISTS `Order`;\n"
        );
    }

    #[test]
    fn test_multiline_comment_header() {
        let config = Config::default();
        let sql = render_first(
            "CREATE TABLE A (id INT, PRIMARY KEY (id)) COMMENT = 'line one\r\nline two';",
            &config,
        );
        assert!(sql.starts_with("-- line one\n-- line two\nCREATE TABLE `A`\n"));

        let again = parse(&sql, &config);
        assert_eq!(again.tables()[0].name, "A");
    }
}
