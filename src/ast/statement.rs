//! Top-level statements of a source unit.

use super::{CreateTable, NodeId, Position, SourceId};

/// One parsed input unit; statements keep declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub source: SourceId,
    pub statements: Vec<Statement>,
}

impl SourceFile {
    /// Declared tables in order, looking inside transactions.
    pub fn tables(&self) -> Vec<&CreateTable> {
        let mut tables = Vec::new();
        collect_tables(&self.statements, &mut tables);
        tables
    }

    pub fn into_tables(self) -> Vec<CreateTable> {
        let mut tables = Vec::new();
        flatten_tables(self.statements, &mut tables);
        tables
    }
}

fn collect_tables<'a>(statements: &'a [Statement], out: &mut Vec<&'a CreateTable>) {
    for stmt in statements {
        match stmt {
            Statement::CreateTable(t) => out.push(t),
            Statement::Transaction { statements, .. } => collect_tables(statements, out),
            Statement::CreateDatabase { .. } | Statement::Skipped { .. } => {}
        }
    }
}

fn flatten_tables(statements: Vec<Statement>, out: &mut Vec<CreateTable>) {
    for stmt in statements {
        match stmt {
            Statement::CreateTable(t) => out.push(*t),
            Statement::Transaction { statements, .. } => flatten_tables(statements, out),
            Statement::CreateDatabase { .. } | Statement::Skipped { .. } => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    CreateDatabase {
        name: String,
        if_not_exists: bool,
        pos: Position,
    },
    CreateTable(Box<CreateTable>),
    /// `START TRANSACTION; ... COMMIT;`
    Transaction {
        statements: Vec<Statement>,
        pos: Position,
    },
    /// `DROP ...;` or `USE ...;`, kept only as a placeholder.
    Skipped {
        keyword: String,
        pos: Position,
    },
}

impl Statement {
    pub fn pos(&self) -> Position {
        match self {
            Statement::CreateDatabase { pos, .. }
            | Statement::Transaction { pos, .. }
            | Statement::Skipped { pos, .. } => *pos,
            Statement::CreateTable(t) => t.pos,
        }
    }

    pub fn id(&self) -> NodeId {
        self.pos().id()
    }
}
