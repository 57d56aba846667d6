//! # staticlang-base
//!
//! Pure structural atoms shared by every stage of the StaticLang compiler:
//!
//! - [`Pos`] / [`Span`] — source positions and ranges, attached to every
//!   token, AST node, and diagnostic.
//! - [`Diagnostic`] / [`DiagnosticSink`] / [`SortedSink`] — errors and
//!   warnings as values, accumulated rather than thrown.
//! - [`Interner`] / [`Name`] — string interning so identifiers compare in
//!   O(1).
//! - [`Arena`] — bump allocation for AST nodes, one arena set per compile.
//!
//! This crate has no knowledge of the language itself; it depends only on
//! `bumpalo` and `serde`.

pub mod arena;
pub mod diag;
pub mod intern;
pub mod span;

pub use arena::Arena;
pub use diag::{Diagnostic, DiagnosticKind, DiagnosticSink, Severity, SortedSink};
pub use intern::{Interner, Name};
pub use span::{Pos, Span};
