//! # staticlang-compile
//!
//! The StaticLang back end: lowering typed ASTs to textual LLVM IR, and
//! the [`Pipeline`] that drives all four stages end to end.
//!
//! ## Quick start
//!
//! ```
//! use staticlang_compile::Pipeline;
//!
//! let mut pipeline = Pipeline::default();
//! let ir = pipeline
//!     .compile("demo.sl", "func main() -> int { return 42; }")
//!     .expect("clean program");
//!
//! assert!(ir.contains("define i64 @main()"));
//! assert!(ir.contains("ret i64 42"));
//! ```
//!
//! The emitted module, concatenated with a compiled runtime object
//! providing the `sl_*` symbols, links and executes with the external
//! LLVM toolchain; this crate never invokes that toolchain itself.

pub mod codegen;
pub mod pipeline;

pub use codegen::{CodegenOptions, Emitter};
pub use pipeline::{CompileOptions, CompileStats, Pipeline};
