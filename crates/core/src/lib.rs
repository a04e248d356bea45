//! erlisp-core: compiler core for the ER diagram DSL.
//!
//! Turns S-expression source describing entities, associations,
//! generalization hierarchies, foreign keys, attributes, primary keys and
//! cardinalities into a [`Graph`] of typed, cross-linked nodes.
//!
//! # Public API
//!
//! - [`parse()`] -- compile source text into a [`Graph`] or a [`CompileError`]
//! - [`Parser`] -- the same, as an explicit session value
//! - [`Lexer`] -- the tokenizer on its own
//! - [`GraphBuilder`] -- scopes, id allocation and both resolution modes
//! - value types: [`Cardinality`], [`CardinalityValue`], [`GerarchyType`]

pub mod cardinality;
pub mod error;
pub mod gerarchy;
pub mod graph;
pub mod lexer;
pub mod parser;
pub mod scope;

// ── Convenience re-exports ───────────────────────────────────────────

pub use cardinality::{Cardinality, CardinalityValue};
pub use error::{CompileError, Diagnostic, ErrorKind, Near};
pub use gerarchy::GerarchyType;
pub use graph::{Graph, Node, NodeId, NodeKind, START_ID};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{parse, Parser};
pub use scope::{GraphBuilder, ScopeError};
