//! Data model shared by the parser, the generation engine and the renderer.

mod key;
mod position;
mod statement;
mod table;
mod types;

pub use key::{
    ForeignKey, Index, KeyPart, PrimaryKey, ReferenceOption, UniqueKey, UNIQUE_CODE_SYMBOL,
};
pub use position::{Location, NodeId, Position, SourceId};
pub use statement::{SourceFile, Statement};
pub use table::{Association, Column, ColumnEntry, CreateTable, Replacement, TableOptions};
pub use types::{is_scalar_type, DataType, ListType, Literal, MapType, ScalarType, TypeRef};
