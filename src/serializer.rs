//! Serializer for converting the AST back to the extended dialect.
//!
//! The output re-parses to a structurally equal AST. Flattened columns
//! unparse as the column they replaced.

use crate::ast::{
    Column, ColumnEntry, CreateTable, ForeignKey, KeyPart, PrimaryKey, SourceFile, Statement,
    UniqueKey,
};

/// Serialize a whole source unit. Skipped statements produce nothing.
pub fn unparse(file: &SourceFile) -> String {
    let mut output = String::new();
    for stmt in &file.statements {
        unparse_statement(&mut output, stmt);
    }
    output
}

pub fn unparse_statement(output: &mut String, stmt: &Statement) {
    match stmt {
        Statement::CreateDatabase {
            name,
            if_not_exists,
            ..
        } => {
            output.push_str("CREATE DATABASE ");
            if *if_not_exists {
                output.push_str("IF NOT EXISTS ");
            }
            output.push_str(&format!("`{name}`;\n"));
        }
        Statement::CreateTable(table) => unparse_table(output, table),
        Statement::Transaction { statements, .. } => {
            output.push_str("START TRANSACTION;\n");
            for stmt in statements {
                unparse_statement(output, stmt);
            }
            output.push_str("COMMIT;\n");
        }
        Statement::Skipped { .. } => {}
    }
}

pub fn unparse_table(output: &mut String, table: &CreateTable) {
    output.push_str("CREATE ");
    if table.temporary {
        output.push_str("TEMPORARY ");
    }
    output.push_str("TABLE ");
    if table.if_not_exists {
        output.push_str("IF NOT EXISTS ");
    }
    output.push_str(&format!("`{}` (\n", table.name));

    let mut lines: Vec<String> = table
        .columns
        .values()
        .map(|entry| match entry {
            ColumnEntry::Column(c) => unparse_column(c),
            ColumnEntry::Replacement(r) => unparse_column(&r.original),
        })
        .collect();

    if let Some(pk) = &table.primary_key {
        lines.push(primary_key_line(pk));
    }
    for index in &table.indexes {
        lines.push(format!("    INDEX (`{}`)", index.column));
    }
    for key in &table.unique_keys {
        lines.push(unique_key_line(key));
    }
    for fk in &table.foreign_keys {
        lines.push(foreign_key_line(fk));
    }
    if let Some(code) = &table.common_code {
        lines.push(format!("    __common_code ({})", key_parts(&code.parts)));
    }

    output.push_str(&lines.join(",\n"));
    output.push_str("\n)");

    let options: Vec<String> = table
        .options
        .iter()
        .map(|(k, v)| format!("{k} = {v}"))
        .collect();
    if !options.is_empty() {
        output.push(' ');
        output.push_str(&options.join(", "));
    }
    output.push_str(";\n");
}

fn unparse_column(column: &Column) -> String {
    let mut s = format!("    `{}` {}", column.name, column.data_type);
    if !column.nullable {
        s.push_str(" NOT NULL");
    }
    if let Some(default) = &column.default {
        s.push_str(&format!(" DEFAULT {default}"));
    }
    if column.auto_increment {
        s.push_str(" AUTO_INCREMENT");
    }
    if column.unique {
        s.push_str(" UNIQUE");
    }
    if let Some(comment) = &column.comment {
        s.push_str(&format!(" COMMENT '{comment}'"));
    }
    if let Some(choices) = &column.enum_choices {
        s.push_str(&format!(" enum_choices '{choices}'"));
    }
    if let Some(assoc) = &column.assoc {
        s.push_str(&format!(" __assoc {}.{}", assoc.table, assoc.column));
    }
    if column.lift {
        s.push_str(" __lift");
    }
    s
}

pub(crate) fn key_parts(parts: &[KeyPart]) -> String {
    parts
        .iter()
        .map(|p| match p.length {
            Some(len) => format!("`{}`({})", p.column, len),
            None => format!("`{}`", p.column),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn column_list(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| format!("`{c}`"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn constraint_prefix(symbol: &Option<String>) -> String {
    match symbol {
        Some(symbol) => format!("    CONSTRAINT {symbol} "),
        None => "    ".to_string(),
    }
}

pub(crate) fn primary_key_line(pk: &PrimaryKey) -> String {
    let mut s = constraint_prefix(&pk.symbol);
    s.push_str("PRIMARY KEY ");
    if let Some(index_type) = &pk.index_type {
        s.push_str(&format!("USING {index_type} "));
    }
    s.push_str(&format!("({})", key_parts(&pk.parts)));
    s
}

pub(crate) fn unique_key_line(key: &UniqueKey) -> String {
    let mut s = constraint_prefix(&key.symbol);
    s.push_str("UNIQUE KEY ");
    if let Some(name) = &key.index_name {
        s.push_str(&format!("`{name}` "));
    }
    s.push_str(&format!("({})", key_parts(&key.parts)));
    s
}

pub(crate) fn foreign_key_line(fk: &ForeignKey) -> String {
    let mut s = constraint_prefix(&fk.symbol);
    s.push_str("FOREIGN KEY ");
    if let Some(name) = &fk.index_name {
        s.push_str(&format!("`{name}` "));
    }
    s.push_str(&format!(
        "({}) REFERENCES `{}` ({})",
        column_list(&fk.columns),
        fk.ref_table,
        column_list(&fk.ref_columns)
    ));
    if let Some(kind) = &fk.match_kind {
        s.push_str(&format!(" MATCH {kind}"));
    }
    if let Some(option) = fk.on_delete {
        s.push_str(&format!(" ON DELETE {option}"));
    }
    if let Some(option) = fk.on_update {
        s.push_str(&format!(" ON UPDATE {option}"));
    }
    s
}
