use tracing::{trace, warn};

use crate::ast::*;
use crate::config::Config;
use crate::lexer::{IdentifierKind, LexError, Lexer, Token, TokenKind};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Lex error: {0}")]
    Lex(#[from] LexError),
    #[error("{pos}: unexpected {found}, expected {expected}")]
    Unexpected {
        found: String,
        expected: String,
        pos: Position,
    },
    #[error("Unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },
    #[error("{pos}: table `{table}` has no primary key")]
    MissingPrimaryKey { table: String, pos: Position },
    #[error("{pos}: duplicate column `{column}` in table `{table}`")]
    DuplicateColumn {
        table: String,
        column: String,
        pos: Position,
    },
    #[error("{pos}: table `{table}` declares more than one primary key")]
    DuplicatePrimaryKey { table: String, pos: Position },
    #[error("{pos}: {kind} name `{name}` is longer than {limit} characters")]
    IdentifierTooLong {
        kind: IdentifierKind,
        name: String,
        limit: usize,
        pos: Position,
    },
    #[error("{pos}: association target `{target}` must be written as table.column")]
    InvalidAssociation { target: String, pos: Position },
}

/// Starts a column definition's type: a class-like name, not a SQL keyword.
fn is_type_name(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase) && !is_scalar_type(word)
}

pub struct Parser<'c> {
    tokens: Vec<Token>,
    pos: usize,
    source: SourceId,
    config: &'c Config,
}

impl<'c> Parser<'c> {
    pub fn new(input: &str, config: &'c Config) -> Result<Self, ParseError> {
        Self::with_source(input, SourceId::default(), config)
    }

    pub fn with_source(
        input: &str,
        source: SourceId,
        config: &'c Config,
    ) -> Result<Self, ParseError> {
        let tokens = Lexer::with_source(input, source).tokenize()?;
        Ok(Self::from_tokens(tokens, source, config))
    }

    pub fn from_tokens(mut tokens: Vec<Token>, source: SourceId, config: &'c Config) -> Self {
        if !tokens.last().is_some_and(Token::is_eof) {
            let pos = tokens.last().map(|t| t.pos).unwrap_or_default();
            tokens.push(Token {
                kind: TokenKind::Eof,
                pos,
            });
        }
        Self {
            tokens,
            pos: 0,
            source,
            config,
        }
    }

    fn peek(&self) -> &Token {
        // the stream always ends with Eof
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let tok = self.peek();
        match &tok.kind {
            TokenKind::Eof => ParseError::UnexpectedEof {
                expected: expected.to_string(),
            },
            kind => ParseError::Unexpected {
                found: kind.to_string(),
                expected: expected.to_string(),
                pos: tok.pos,
            },
        }
    }

    /// Keywords are unquoted and case-insensitive.
    fn check_keyword(&self, keyword: &str) -> bool {
        matches!(
            &self.peek().kind,
            TokenKind::Ident { value, quoted: false } if value.eq_ignore_ascii_case(keyword)
        )
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<Position, ParseError> {
        if self.check_keyword(keyword) {
            Ok(self.advance().pos)
        } else {
            Err(self.unexpected(keyword))
        }
    }

    fn check_delim(&self, c: char) -> bool {
        self.peek().kind == TokenKind::Delim(c)
    }

    fn eat_delim(&mut self, c: char) -> bool {
        if self.check_delim(c) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_delim(&mut self, c: char) -> Result<Position, ParseError> {
        if self.check_delim(c) {
            Ok(self.advance().pos)
        } else {
            Err(self.unexpected(&format!("'{c}'")))
        }
    }

    fn check_ident(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Ident { .. })
    }

    fn expect_name(&mut self, expected: &str) -> Result<(String, Position), ParseError> {
        match self.peek().kind.clone() {
            TokenKind::Ident { value, .. } => Ok((value, self.advance().pos)),
            _ => Err(self.unexpected(expected)),
        }
    }

    fn expect_ident(&mut self, kind: IdentifierKind) -> Result<(String, Position), ParseError> {
        let (name, pos) = self.expect_name(&format!("{kind} name"))?;
        let limit = kind.max_len();
        if name.chars().count() > limit {
            return Err(ParseError::IdentifierTooLong {
                kind,
                name,
                limit,
                pos,
            });
        }
        Ok((name, pos))
    }

    fn expect_number(&mut self) -> Result<i64, ParseError> {
        match self.peek().kind {
            TokenKind::Num(n) => {
                self.advance();
                Ok(n)
            }
            _ => Err(self.unexpected("number")),
        }
    }

    fn expect_string(&mut self) -> Result<String, ParseError> {
        match self.peek().kind.clone() {
            TokenKind::Str(s) => {
                self.advance();
                Ok(s)
            }
            _ => Err(self.unexpected("string")),
        }
    }

    /// Position of the last consumed token.
    fn last_pos(&self) -> Position {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.pos)
            .unwrap_or_default()
    }

    pub fn parse(&mut self) -> Result<SourceFile, ParseError> {
        let mut statements = Vec::new();
        while !self.peek().is_eof() {
            statements.push(self.parse_statement()?);
        }
        Ok(SourceFile {
            source: self.source,
            statements,
        })
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        if self.check_keyword("START") {
            self.parse_transaction()
        } else if self.check_keyword("DROP") || self.check_keyword("USE") {
            self.skip_statement()
        } else if self.check_keyword("CREATE") {
            self.parse_create()
        } else {
            Err(self.unexpected("CREATE, START TRANSACTION, DROP or USE"))
        }
    }

    fn parse_transaction(&mut self) -> Result<Statement, ParseError> {
        let start = self.expect_keyword("START")?;
        self.expect_keyword("TRANSACTION")?;
        self.expect_delim(';')?;

        let mut statements = Vec::new();
        while !self.check_keyword("COMMIT") {
            if self.peek().is_eof() {
                return Err(self.unexpected("COMMIT"));
            }
            statements.push(self.parse_statement()?);
        }
        self.advance(); // COMMIT
        let end = self.expect_delim(';')?;

        trace!(statements = statements.len(), "parsed transaction");
        Ok(Statement::Transaction {
            statements,
            pos: Position::span(start, end),
        })
    }

    /// `DROP ...;` and `USE ...;` are consumed up to the `;` and dropped.
    fn skip_statement(&mut self) -> Result<Statement, ParseError> {
        let first = self.advance();
        let keyword = first.kind.to_string().to_uppercase();
        loop {
            if self.peek().is_eof() {
                return Err(self.unexpected("';'"));
            }
            if self.advance().kind == TokenKind::Delim(';') {
                break;
            }
        }
        trace!(keyword = %keyword, "skipped statement");
        Ok(Statement::Skipped {
            keyword,
            pos: Position::span(first.pos, self.last_pos()),
        })
    }

    fn parse_create(&mut self) -> Result<Statement, ParseError> {
        let start = self.expect_keyword("CREATE")?;
        if self.check_keyword("DATABASE") {
            self.advance();
            let if_not_exists = if self.eat_keyword("IF") {
                self.expect_keyword("NOT")?;
                self.expect_keyword("EXISTS")?;
                true
            } else {
                false
            };
            let (name, _) = self.expect_ident(IdentifierKind::Database)?;
            while !self.eat_delim(';') {
                if self.peek().is_eof() {
                    return Err(self.unexpected("';'"));
                }
                self.advance();
            }
            return Ok(Statement::CreateDatabase {
                name,
                if_not_exists,
                pos: Position::span(start, self.last_pos()),
            });
        }
        if self.check_keyword("TABLE") || self.check_keyword("TEMPORARY") {
            let table = self.parse_create_table(start)?;
            return Ok(Statement::CreateTable(Box::new(table)));
        }
        Err(self.unexpected("DATABASE or TABLE"))
    }

    fn parse_create_table(&mut self, start: Position) -> Result<CreateTable, ParseError> {
        let temporary = self.eat_keyword("TEMPORARY");
        self.expect_keyword("TABLE")?;
        let if_not_exists = if self.eat_keyword("IF") {
            self.expect_keyword("NOT")?;
            self.expect_keyword("EXISTS")?;
            true
        } else {
            false
        };

        let (name, _) = self.expect_ident(IdentifierKind::Table)?;
        let mut table = CreateTable::new(&name);
        table.temporary = temporary;
        table.if_not_exists = if_not_exists;

        self.expect_delim('(')?;
        self.parse_create_definitions(&mut table)?;
        self.expect_delim(')')?;
        table.options = self.parse_table_options()?;
        let end = self.expect_delim(';')?;
        table.pos = Position::span(start, end);

        if table.primary_key.is_none() {
            if self.config.allow_primary_key_missing {
                warn!(table = %table.name, "table has no primary key");
            } else {
                return Err(ParseError::MissingPrimaryKey {
                    table: table.name,
                    pos: table.pos,
                });
            }
        }

        table.finalize(self.config);
        trace!(
            table = %table.name,
            columns = table.columns.len(),
            foreign_keys = table.foreign_keys.len(),
            "parsed table"
        );
        Ok(table)
    }

    /// Definitions are comma separated. The `#@@` annotation line follows the
    /// last definition without a comma.
    fn parse_create_definitions(&mut self, table: &mut CreateTable) -> Result<(), ParseError> {
        if self.check_delim(')') {
            return Ok(());
        }
        loop {
            if self.peek().kind == TokenKind::Annotation {
                self.advance();
                if !self.check_keyword("__common_code") {
                    return Err(self.unexpected("__common_code"));
                }
            }

            if self.check_keyword("PRIMARY") {
                let pk = self.parse_primary_key(None)?;
                self.set_primary_key(table, pk)?;
            } else if self.check_keyword("FOREIGN") {
                let fk = self.parse_foreign_key(None)?;
                table.foreign_keys.push(fk);
            } else if self.check_keyword("INDEX") {
                let index = self.parse_index()?;
                table.indexes.push(index);
            } else if self.check_keyword("UNIQUE") {
                let key = self.parse_unique(None)?;
                table.unique_keys.push(key);
            } else if self.check_keyword("CONSTRAINT") {
                self.parse_constraint(table)?;
            } else if self.check_keyword("__common_code") {
                table.common_code = Some(self.parse_common_code()?);
            } else if self.check_ident() {
                let column = self.parse_column_definition()?;
                if table.columns.contains_key(&column.name) {
                    return Err(ParseError::DuplicateColumn {
                        table: table.name.clone(),
                        column: column.name,
                        pos: column.pos,
                    });
                }
                table.add_column(column);
            } else {
                return Err(self.unexpected("column or key definition"));
            }

            if self.check_delim(')') {
                return Ok(());
            }
            if self.peek().kind == TokenKind::Annotation {
                continue;
            }
            if !self.eat_delim(',') {
                return Err(self.unexpected("',' or ')'"));
            }
        }
    }

    /// `key = value [,] ...` up to the closing `;`.
    fn parse_table_options(&mut self) -> Result<TableOptions, ParseError> {
        let mut options = TableOptions::new();
        loop {
            if self.check_delim(';') {
                return Ok(options);
            }
            if self.eat_delim(',') {
                continue;
            }
            let key = match self.peek().kind.clone() {
                TokenKind::Ident {
                    value,
                    quoted: false,
                } => {
                    self.advance();
                    value
                }
                _ => return Err(self.unexpected("table option or ';'")),
            };
            self.expect_delim('=')?;
            let value = self.parse_literal()?;
            options.insert(key, value);
        }
    }

    fn set_primary_key(&self, table: &mut CreateTable, pk: PrimaryKey) -> Result<(), ParseError> {
        if table.primary_key.is_some() {
            return Err(ParseError::DuplicatePrimaryKey {
                table: table.name.clone(),
                pos: pk.pos,
            });
        }
        table.primary_key = Some(pk);
        Ok(())
    }

    /// `CONSTRAINT [symbol] {PRIMARY KEY | UNIQUE [KEY] | FOREIGN KEY} ...`
    fn parse_constraint(&mut self, table: &mut CreateTable) -> Result<(), ParseError> {
        self.expect_keyword("CONSTRAINT")?;
        let symbol = if self.check_ident()
            && !self.check_keyword("PRIMARY")
            && !self.check_keyword("UNIQUE")
            && !self.check_keyword("FOREIGN")
        {
            Some(self.expect_ident(IdentifierKind::Constraint)?.0)
        } else {
            None
        };

        if self.check_keyword("PRIMARY") {
            let pk = self.parse_primary_key(symbol)?;
            self.set_primary_key(table, pk)
        } else if self.check_keyword("UNIQUE") {
            let key = self.parse_unique(symbol)?;
            table.unique_keys.push(key);
            Ok(())
        } else if self.check_keyword("FOREIGN") {
            let fk = self.parse_foreign_key(symbol)?;
            table.foreign_keys.push(fk);
            Ok(())
        } else {
            Err(self.unexpected("PRIMARY KEY, UNIQUE KEY or FOREIGN KEY"))
        }
    }

    /// `PRIMARY KEY [USING type] (key_part, ...)`
    pub fn parse_primary_key(&mut self, symbol: Option<String>) -> Result<PrimaryKey, ParseError> {
        let start = self.expect_keyword("PRIMARY")?;
        self.expect_keyword("KEY")?;
        let index_type = if self.eat_keyword("USING") {
            Some(self.expect_name("index type")?.0)
        } else {
            None
        };
        let parts = self.parse_key_parts()?;
        Ok(PrimaryKey {
            symbol,
            index_type,
            parts,
            pos: Position::span(start, self.last_pos()),
        })
    }

    fn parse_key_parts(&mut self) -> Result<Vec<KeyPart>, ParseError> {
        self.expect_delim('(')?;
        let mut parts = vec![self.parse_key_part()?];
        while self.eat_delim(',') {
            parts.push(self.parse_key_part()?);
        }
        self.expect_delim(')')?;
        Ok(parts)
    }

    /// `col_name [(length)]`
    fn parse_key_part(&mut self) -> Result<KeyPart, ParseError> {
        let (column, start) = self.expect_ident(IdentifierKind::Column)?;
        let length = if self.eat_delim('(') {
            let n = self.expect_number()?;
            self.expect_delim(')')?;
            Some(n)
        } else {
            None
        };
        Ok(KeyPart {
            column,
            length,
            pos: Position::span(start, self.last_pos()),
        })
    }

    fn parse_index(&mut self) -> Result<Index, ParseError> {
        let start = self.expect_keyword("INDEX")?;
        self.expect_delim('(')?;
        let (column, _) = self.expect_ident(IdentifierKind::Column)?;
        let end = self.expect_delim(')')?;
        Ok(Index {
            column,
            pos: Position::span(start, end),
        })
    }

    /// `UNIQUE [INDEX | KEY] [index_name] (key_part, ...)`
    fn parse_unique(&mut self, symbol: Option<String>) -> Result<UniqueKey, ParseError> {
        let start = self.expect_keyword("UNIQUE")?;
        if !self.eat_keyword("KEY") {
            self.eat_keyword("INDEX");
        }
        let index_name = if self.check_ident() {
            Some(self.expect_ident(IdentifierKind::Index)?.0)
        } else {
            None
        };
        let parts = self.parse_key_parts()?;
        Ok(UniqueKey {
            symbol,
            index_name,
            parts,
            pos: Position::span(start, self.last_pos()),
        })
    }

    fn parse_common_code(&mut self) -> Result<UniqueKey, ParseError> {
        let start = self.expect_keyword("__common_code")?;
        let parts = self.parse_key_parts()?;
        Ok(UniqueKey {
            symbol: None,
            index_name: None,
            parts,
            pos: Position::span(start, self.last_pos()),
        })
    }

    fn parse_column_list(&mut self) -> Result<Vec<String>, ParseError> {
        self.expect_delim('(')?;
        let mut columns = vec![self.expect_ident(IdentifierKind::Column)?.0];
        while self.eat_delim(',') {
            columns.push(self.expect_ident(IdentifierKind::Column)?.0);
        }
        self.expect_delim(')')?;
        Ok(columns)
    }

    /// `FOREIGN KEY [index_name] (col, ...) REFERENCES tbl (col, ...)
    ///  [MATCH kind] [ON DELETE option] [ON UPDATE option]`
    pub fn parse_foreign_key(&mut self, symbol: Option<String>) -> Result<ForeignKey, ParseError> {
        let start = self.expect_keyword("FOREIGN")?;
        self.expect_keyword("KEY")?;
        let index_name = if self.check_ident() {
            Some(self.expect_ident(IdentifierKind::Index)?.0)
        } else {
            None
        };
        let columns = self.parse_column_list()?;

        self.expect_keyword("REFERENCES")?;
        let (ref_table, _) = self.expect_ident(IdentifierKind::Table)?;
        let ref_columns = self.parse_column_list()?;

        let match_kind = if self.eat_keyword("MATCH") {
            if !(self.check_keyword("FULL")
                || self.check_keyword("PARTIAL")
                || self.check_keyword("SIMPLE"))
            {
                return Err(self.unexpected("FULL, PARTIAL or SIMPLE"));
            }
            Some(self.expect_name("match type")?.0.to_uppercase())
        } else {
            None
        };

        let mut on_delete = None;
        let mut on_update = None;
        while self.eat_keyword("ON") {
            if self.eat_keyword("DELETE") {
                on_delete = Some(self.parse_reference_option()?);
            } else if self.eat_keyword("UPDATE") {
                on_update = Some(self.parse_reference_option()?);
            } else {
                return Err(self.unexpected("DELETE or UPDATE"));
            }
        }

        Ok(ForeignKey {
            symbol,
            index_name,
            columns,
            ref_table,
            ref_columns,
            match_kind,
            on_delete,
            on_update,
            pos: Position::span(start, self.last_pos()),
        })
    }

    fn parse_reference_option(&mut self) -> Result<ReferenceOption, ParseError> {
        if self.eat_keyword("RESTRICT") {
            Ok(ReferenceOption::Restrict)
        } else if self.eat_keyword("CASCADE") {
            Ok(ReferenceOption::Cascade)
        } else if self.eat_keyword("SET") {
            if self.eat_keyword("NULL") {
                Ok(ReferenceOption::SetNull)
            } else {
                self.expect_keyword("DEFAULT")?;
                Ok(ReferenceOption::SetDefault)
            }
        } else if self.eat_keyword("NO") {
            self.expect_keyword("ACTION")?;
            Ok(ReferenceOption::NoAction)
        } else {
            Err(self.unexpected("RESTRICT, CASCADE, SET NULL, NO ACTION or SET DEFAULT"))
        }
    }

    /// `name data_type [NOT NULL | NULL] [DEFAULT literal] [AUTO_INCREMENT] [UNIQUE]
    ///  [COMMENT 'str'] [enum_choices 'str'] [__assoc tbl.col] [__lift]`
    pub fn parse_column_definition(&mut self) -> Result<Column, ParseError> {
        let (name, start) = self.expect_ident(IdentifierKind::Column)?;
        let data_type = self.parse_data_type()?;
        let mut column = Column::new(&name, data_type);

        loop {
            if self.check_delim(',')
                || self.check_delim(')')
                || self.peek().kind == TokenKind::Annotation
            {
                break;
            }

            if self.eat_keyword("NOT") {
                self.expect_keyword("NULL")?;
                column.nullable = false;
            } else if self.eat_keyword("NULL") {
                column.nullable = true;
            } else if self.eat_keyword("DEFAULT") {
                column.default = Some(self.parse_literal()?);
            } else if self.eat_keyword("AUTO_INCREMENT") {
                column.auto_increment = true;
            } else if self.eat_keyword("UNIQUE") {
                column.unique = true;
            } else if self.eat_keyword("COMMENT") {
                column.comment = Some(self.expect_string()?);
            } else if self.eat_keyword("enum_choices") {
                column.enum_choices = Some(self.expect_string()?);
            } else if self.eat_keyword("__assoc") {
                column.assoc = Some(self.parse_association()?);
            } else if self.eat_keyword("__lift") {
                column.lift = true;
            } else {
                return Err(self.unexpected("column attribute, ',' or ')'"));
            }
        }

        column.pos = Position::span(start, self.last_pos());
        Ok(column)
    }

    fn parse_association(&mut self) -> Result<Association, ParseError> {
        let (target, pos) = match self.peek().kind.clone() {
            TokenKind::Ident {
                value,
                quoted: false,
            } => (value, self.advance().pos),
            _ => return Err(self.unexpected("table.column")),
        };
        match target.split_once('.') {
            Some((table, column))
                if !table.is_empty() && !column.is_empty() && !column.contains('.') =>
            {
                Ok(Association {
                    table: table.to_string(),
                    column: column.to_string(),
                })
            }
            _ => Err(ParseError::InvalidAssociation { target, pos }),
        }
    }

    fn parse_literal(&mut self) -> Result<Literal, ParseError> {
        let literal = match self.peek().kind.clone() {
            TokenKind::Str(s) => Literal::Str(s),
            TokenKind::Num(n) => Literal::Num(n),
            TokenKind::Ident {
                value,
                quoted: false,
            } => Literal::Ident(value),
            _ => return Err(self.unexpected("literal")),
        };
        self.advance();
        Ok(literal)
    }

    /// A SQL scalar type when the next word is a type keyword, else a type reference.
    pub fn parse_data_type(&mut self) -> Result<DataType, ParseError> {
        match &self.peek().kind {
            TokenKind::Ident { value, .. } if is_scalar_type(value) => {
                Ok(DataType::Scalar(self.parse_scalar_type()?))
            }
            TokenKind::Ident { .. } => self.parse_type_reference(),
            _ => Err(self.unexpected("data type")),
        }
    }

    /// `name [(max [, scale])]`
    fn parse_scalar_type(&mut self) -> Result<ScalarType, ParseError> {
        let (name, start) = self.expect_name("data type")?;
        let mut scalar = ScalarType::new(&name);
        if self.eat_delim('(') {
            scalar.max = Some(self.expect_number()?);
            if self.eat_delim(',') {
                scalar.scale = Some(self.expect_number()?);
            }
            self.expect_delim(')')?;
        }
        scalar.pos = Position::span(start, self.last_pos());
        Ok(scalar)
    }

    fn expect_type_name(&mut self) -> Result<(String, Position), ParseError> {
        match &self.peek().kind {
            TokenKind::Ident { value, .. }
                if is_type_name(value) && value != "List" && value != "Map" =>
            {
                self.expect_ident(IdentifierKind::Table)
            }
            _ => Err(self.unexpected("type name")),
        }
    }

    /// `Name`, `List<Name>` or `Map<Key, Type>`.
    pub fn parse_type_reference(&mut self) -> Result<DataType, ParseError> {
        if self.check_keyword("List") {
            let start = self.advance().pos;
            self.expect_delim('<')?;
            let (element, _) = self.expect_type_name()?;
            let end = self.expect_delim('>')?;
            let pos = Position::span(start, end);

            if element == "String" {
                let mut json = ScalarType::new("JSON");
                json.pos = pos;
                return Ok(DataType::Scalar(json));
            }
            return Ok(DataType::List(ListType { element, pos }));
        }

        if self.check_keyword("Map") {
            let start = self.advance().pos;
            self.expect_delim('<')?;
            let (key, _) = self.expect_type_name()?;
            self.expect_delim(',')?;
            // a scalar is allowed here so `Map<K, List<String>>` re-parses as `Map<K, JSON>`
            let value = self.parse_data_type()?;
            let end = self.expect_delim('>')?;
            return Ok(DataType::Map(MapType {
                key,
                value: Box::new(value),
                pos: Position::span(start, end),
            }));
        }

        let (name, pos) = self.expect_type_name()?;
        Ok(DataType::TypeRef(TypeRef { name, pos }))
    }
}
