//! # staticlang-language
//!
//! The StaticLang front end: everything between source text and a typed
//! AST ready for IR emission.
//!
//! ## Pipeline position
//!
//! 1. **Lexer** ([`lexer`]) — source bytes to a token stream with source
//!    positions, recovering past bad bytes.
//! 2. **Parser** ([`parser`]) — tokens to an arena-allocated AST with
//!    operator precedence and synchronizing error recovery.
//! 3. **Analysis** ([`analysis`]) — name resolution against a scope stack
//!    ([`symtab`]), type checking against the registry ([`types`]), and
//!    type annotation of every expression node.
//!
//! The back end lives in `staticlang-compile`; the shared atoms (spans,
//! diagnostics, interning, arenas) in `staticlang-base`.
//!
//! ## Example
//!
//! ```
//! use staticlang_base::{Arena, DiagnosticSink, Interner};
//! use staticlang_language::ast::AstContext;
//! use staticlang_language::analysis::Analyzer;
//! use staticlang_language::lexer::Lexer;
//! use staticlang_language::parser::Parser;
//! use staticlang_language::symtab::ScopeStack;
//! use staticlang_language::types::TypeRegistry;
//!
//! let source = "func main() -> int { return 42; }";
//! let mut interner = Interner::new();
//! let mut sink = DiagnosticSink::new();
//! let tokens = Lexer::new(source, "demo.sl", &mut interner, &mut sink).tokenize();
//!
//! let arena = Arena::new();
//! let ctx = AstContext::new(&arena);
//! let program = Parser::new(tokens, ctx, &mut interner, &mut sink, "demo.sl").parse();
//!
//! let mut registry = TypeRegistry::new(&mut interner);
//! let mut scopes = ScopeStack::new();
//! Analyzer::new(&mut interner, &mut registry, &mut scopes, &mut sink, "demo.sl")
//!     .analyze(&program);
//!
//! assert!(!sink.has_errors());
//! ```

pub mod analysis;
pub mod ast;
pub mod lexer;
pub mod parser;
pub mod symtab;
pub mod token;
pub mod types;

pub use analysis::Analyzer;
pub use ast::{AstContext, Program};
pub use lexer::Lexer;
pub use parser::Parser;
pub use symtab::{ScopeStack, SymbolEntry, SymbolKind};
pub use token::{Token, TokenKind};
pub use types::{Type, TypeId, TypeRegistry, DYNAMIC_LEN};
