//! Source locations and node identity.

use std::fmt;

/// Identifies one input unit when several sources are merged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub u32);

/// A point in the input: byte offset plus 1-based line and display column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Location {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn start() -> Self {
        Self {
            offset: 0,
            line: 1,
            column: 1,
        }
    }
}

/// Half-open span `[start, end)` of a node in its source.
///
/// Positions never take part in structural equality: any two positions
/// compare equal, so AST values compare by content alone. Use [`NodeId`]
/// when the identity of a node matters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Position {
    pub source: SourceId,
    pub start: Location,
    pub end: Location,
}

impl Position {
    pub fn new(source: SourceId, start: Location, end: Location) -> Self {
        Self { source, start, end }
    }

    /// Span covering `first` through `last`.
    pub fn span(first: Position, last: Position) -> Self {
        Self {
            source: first.source,
            start: first.start,
            end: last.end,
        }
    }

    pub fn id(&self) -> NodeId {
        NodeId {
            source: self.source,
            start: self.start.offset,
            end: self.end.offset,
        }
    }

    pub fn len(&self) -> usize {
        self.end.offset.saturating_sub(self.start.offset)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PartialEq for Position {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for Position {}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start.line, self.start.column)
    }
}

/// Identity of a node: same source and same span means same node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub source: SourceId,
    pub start: usize,
    pub end: usize,
}
