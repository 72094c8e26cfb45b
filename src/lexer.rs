use std::fmt;

use unicode_width::UnicodeWidthChar;

use crate::ast::{Location, Position, SourceId};

pub const MAX_STRING_LEN: usize = 65000;

/// Longest identifier of any kind; the tokenizer's bound.
pub const MAX_IDENTIFIER_LEN: usize = 256;

const DELIMITERS: &[char] = &['(', ')', '<', '>', '=', ',', ';'];

/// Marker that keeps a following clause alive through a comment.
const ANNOTATION: &str = "#@@ ";

/// What an identifier names; each kind has its own length limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    Database,
    Table,
    Column,
    Index,
    Constraint,
    StoredProgram,
    View,
    Tablespace,
    Server,
    LogFileGroup,
    Alias,
    CompoundStatementLabel,
    UserDefinedVariable,
    ResourceGroup,
}

impl IdentifierKind {
    pub fn max_len(self) -> usize {
        match self {
            IdentifierKind::Alias => 256,
            IdentifierKind::CompoundStatementLabel => 16,
            _ => 64,
        }
    }
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IdentifierKind::Database => "database",
            IdentifierKind::Table => "table",
            IdentifierKind::Column => "column",
            IdentifierKind::Index => "index",
            IdentifierKind::Constraint => "constraint",
            IdentifierKind::StoredProgram => "stored program",
            IdentifierKind::View => "view",
            IdentifierKind::Tablespace => "tablespace",
            IdentifierKind::Server => "server",
            IdentifierKind::LogFileGroup => "log file group",
            IdentifierKind::Alias => "alias",
            IdentifierKind::CompoundStatementLabel => "compound statement label",
            IdentifierKind::UserDefinedVariable => "user-defined variable",
            IdentifierKind::ResourceGroup => "resource group",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident { value: String, quoted: bool },
    Str(String),
    Num(i64),
    Delim(char),
    /// `#@@ `
    Annotation,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident { value, quoted: true } => write!(f, "`{value}`"),
            TokenKind::Ident { value, .. } => write!(f, "{value}"),
            TokenKind::Str(s) => write!(f, "'{s}'"),
            TokenKind::Num(n) => write!(f, "{n}"),
            TokenKind::Delim(c) => write!(f, "'{c}'"),
            TokenKind::Annotation => f.write_str("annotation marker"),
            TokenKind::Eof => f.write_str("end of input"),
        }
    }
}

/// Positions compare equal, so tokens compare by kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Position,
}

impl Token {
    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LexError {
    #[error("{pos}: unexpected character {ch:?}")]
    UnexpectedChar { ch: char, pos: Position },
    #[error("{pos}: unterminated string")]
    UnterminatedString { pos: Position },
    #[error("{pos}: unterminated quoted identifier")]
    UnterminatedIdentifier { pos: Position },
    #[error("{pos}: unmatched backtick")]
    UnmatchedBacktick { pos: Position },
    #[error("{pos}: string exceeds {MAX_STRING_LEN} characters")]
    StringTooLong { pos: Position },
    #[error("{pos}: identifier exceeds {MAX_IDENTIFIER_LEN} characters")]
    IdentifierTooLong { pos: Position },
    #[error("{pos}: invalid number {text}")]
    InvalidNumber { text: String, pos: Position },
    #[error("{pos}: '--' comment must be followed by whitespace")]
    BadComment { pos: Position },
    #[error("{pos}: '-' is not followed by a number")]
    DanglingMinus { pos: Position },
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || DELIMITERS.contains(&c)
}

pub struct Lexer<'a> {
    input: &'a str,
    source: SourceId,
    loc: Location,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::with_source(input, SourceId::default())
    }

    pub fn with_source(input: &'a str, source: SourceId) -> Self {
        Self {
            input,
            source,
            loc: Location::start(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.loc.offset..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.loc.offset += c.len_utf8();
        if c == '\n' {
            self.loc.line += 1;
            self.loc.column = 1;
        } else {
            self.loc.column += c.width().unwrap_or(1);
        }
        Some(c)
    }

    fn bump_n(&mut self, n: usize) {
        for _ in 0..n {
            self.bump();
        }
    }

    fn pos_from(&self, start: Location) -> Position {
        Position::new(self.source, start, self.loc)
    }

    fn here(&self) -> Position {
        self.pos_from(self.loc)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.bump() {
            if c == '\n' {
                break;
            }
        }
    }

    fn read_string(&mut self, start: Location) -> Result<String, LexError> {
        self.bump(); // '
        let mut s = String::new();
        let mut len = 0;
        loop {
            match self.bump() {
                Some('\'') => return Ok(s),
                Some(c) => {
                    len += 1;
                    if len > MAX_STRING_LEN {
                        return Err(LexError::StringTooLong {
                            pos: self.pos_from(start),
                        });
                    }
                    s.push(c);
                }
                None => {
                    return Err(LexError::UnterminatedString {
                        pos: self.pos_from(start),
                    });
                }
            }
        }
    }

    fn read_number(&mut self, start: Location, negative: bool) -> Result<i64, LexError> {
        let mut digits = String::new();
        while let Some(c) = self.peek().filter(char::is_ascii_digit) {
            digits.push(c);
            self.bump();
        }
        if negative {
            digits.insert(0, '-');
        }
        digits.parse().map_err(|_| LexError::InvalidNumber {
            text: digits.clone(),
            pos: self.pos_from(start),
        })
    }

    fn push_name_char(&self, s: &mut String, c: char, start: Location) -> Result<(), LexError> {
        s.push(c);
        if s.chars().count() > MAX_IDENTIFIER_LEN {
            return Err(LexError::IdentifierTooLong {
                pos: self.pos_from(start),
            });
        }
        Ok(())
    }

    fn read_quoted_ident(&mut self, start: Location) -> Result<String, LexError> {
        self.bump(); // `
        let mut s = String::new();
        loop {
            match self.peek() {
                Some('`') => {
                    self.bump();
                    return Ok(s);
                }
                Some(c) if is_name_char(c) => {
                    self.bump();
                    self.push_name_char(&mut s, c, start)?;
                }
                Some(ch) => {
                    return Err(LexError::UnexpectedChar {
                        ch,
                        pos: self.here(),
                    });
                }
                None => {
                    return Err(LexError::UnterminatedIdentifier {
                        pos: self.pos_from(start),
                    });
                }
            }
        }
    }

    fn read_ident(&mut self, start: Location) -> Result<String, LexError> {
        let mut s = String::new();
        loop {
            match self.peek() {
                None => return Ok(s),
                Some(c) if is_delimiter(c) => return Ok(s),
                Some('`') => return Err(LexError::UnmatchedBacktick { pos: self.here() }),
                Some(c) if is_name_char(c) => {
                    self.bump();
                    self.push_name_char(&mut s, c, start)?;
                }
                Some(ch) => {
                    return Err(LexError::UnexpectedChar {
                        ch,
                        pos: self.here(),
                    });
                }
            }
        }
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        loop {
            self.skip_whitespace();
            let start = self.loc;

            let Some(c) = self.peek() else {
                return Ok(Token {
                    kind: TokenKind::Eof,
                    pos: self.here(),
                });
            };

            let kind = match c {
                '-' if self.rest().starts_with("--") => {
                    self.bump_n(2);
                    if !self.peek().is_some_and(char::is_whitespace) {
                        return Err(LexError::BadComment {
                            pos: self.pos_from(start),
                        });
                    }
                    self.skip_line();
                    continue;
                }
                '-' => {
                    self.bump();
                    self.skip_whitespace();
                    if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
                        return Err(LexError::DanglingMinus {
                            pos: self.pos_from(start),
                        });
                    }
                    TokenKind::Num(self.read_number(start, true)?)
                }
                '#' if self.rest().starts_with(ANNOTATION) => {
                    self.bump_n(ANNOTATION.len());
                    TokenKind::Annotation
                }
                '#' => {
                    self.skip_line();
                    continue;
                }
                '\'' => TokenKind::Str(self.read_string(start)?),
                c if c.is_ascii_digit() => TokenKind::Num(self.read_number(start, false)?),
                c if DELIMITERS.contains(&c) => {
                    self.bump();
                    TokenKind::Delim(c)
                }
                '`' => TokenKind::Ident {
                    value: self.read_quoted_ident(start)?,
                    quoted: true,
                },
                c if is_name_char(c) => TokenKind::Ident {
                    value: self.read_ident(start)?,
                    quoted: false,
                },
                ch => {
                    return Err(LexError::UnexpectedChar {
                        ch,
                        pos: self.here(),
                    });
                }
            };

            return Ok(Token {
                kind,
                pos: self.pos_from(start),
            });
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let done = tok.is_eof();
            tokens.push(tok);
            if done {
                break;
            }
        }
        Ok(tokens)
    }
}
