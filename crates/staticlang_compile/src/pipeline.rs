//! The compilation pipeline: one object owning everything a run needs.
//!
//! A [`Pipeline`] owns the interner, type registry, global scope,
//! diagnostic sink, and per-run statistics, and drives the four stages in
//! order: lex, parse, analyze, emit. IR is produced only when the sink is
//! free of errors (and, under warnings-as-errors, free of warnings);
//! diagnostics are always available afterwards through
//! [`Pipeline::diagnostics`].
//!
//! Multi-file compiles pass several units to [`Pipeline::compile_many`];
//! the units share the symbol and type tables, so later files see earlier
//! files' declarations, and the output is a single module with one
//! preamble.
//!
//! [`Pipeline::reset`] returns the pipeline to its freshly-created state;
//! resetting and re-compiling the same input yields byte-identical IR.

use staticlang_base::{Arena, DiagnosticSink, Interner};
use staticlang_language::ast::{AstContext, Program};
use staticlang_language::{Analyzer, Lexer, Parser, ScopeStack, TypeRegistry};

use crate::codegen::{CodegenOptions, Emitter};

/// Options for one pipeline, fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub codegen: CodegenOptions,
    /// When set, any warning fails the compile even with zero errors.
    pub warnings_as_errors: bool,
}

/// Counters accumulated over the lifetime of a pipeline (until `reset`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileStats {
    pub files: usize,
    pub tokens: usize,
    pub decls: usize,
    pub arena_bytes: usize,
    pub errors: usize,
    pub warnings: usize,
}

/// Owns one compilation's state; reusable after [`reset`](Pipeline::reset).
pub struct Pipeline {
    interner: Interner,
    registry: TypeRegistry,
    scopes: ScopeStack,
    sink: DiagnosticSink,
    options: CompileOptions,
    stats: CompileStats,
}

impl Pipeline {
    pub fn new(options: CompileOptions) -> Self {
        let mut interner = Interner::new();
        let registry = TypeRegistry::new(&mut interner);
        Self {
            interner,
            registry,
            scopes: ScopeStack::new(),
            sink: DiagnosticSink::new(),
            options,
            stats: CompileStats::default(),
        }
    }

    /// Compiles one source file to IR.
    ///
    /// Returns `None` when the run failed; the diagnostics explain why.
    pub fn compile(&mut self, file: &str, source: &str) -> Option<String> {
        self.compile_many(&[(file, source)])
    }

    /// Compiles several units into one module over shared tables.
    pub fn compile_many(&mut self, units: &[(&str, &str)]) -> Option<String> {
        let arenas: Vec<Arena> = units.iter().map(|_| Arena::new()).collect();

        let mut programs: Vec<Program<'_>> = Vec::with_capacity(units.len());
        for ((file, source), arena) in units.iter().zip(&arenas) {
            let tokens = Lexer::new(source, file, &mut self.interner, &mut self.sink).tokenize();
            self.stats.tokens += tokens.len();
            let ctx = AstContext::new(arena);
            let program = Parser::new(tokens, ctx, &mut self.interner, &mut self.sink, file).parse();
            self.stats.decls += program.decls.len();
            programs.push(program);
        }

        for ((file, _), program) in units.iter().zip(&programs) {
            Analyzer::new(
                &mut self.interner,
                &mut self.registry,
                &mut self.scopes,
                &mut self.sink,
                file,
            )
            .analyze(program);
        }

        self.stats.files += units.len();
        self.stats.arena_bytes += arenas.iter().map(Arena::allocated_bytes).sum::<usize>();

        let result = if self.failed() {
            None
        } else {
            let mut emitter = Emitter::new(
                &self.interner,
                &mut self.registry,
                &mut self.sink,
                self.options.codegen.clone(),
            );
            let mut emitted = true;
            for ((file, _), program) in units.iter().zip(&programs) {
                if emitter.emit_program(program, file).is_err() {
                    emitted = false;
                    break;
                }
            }
            let module_name = units.first().map(|(file, _)| *file).unwrap_or("module");
            let ir = emitter.finish(module_name);
            if emitted && !self.failed() {
                Some(ir)
            } else {
                None
            }
        };

        self.stats.errors = self.sink.errors().count();
        self.stats.warnings = self.sink.warnings().count();
        result
    }

    fn failed(&self) -> bool {
        self.sink.has_errors() || (self.options.warnings_as_errors && self.sink.has_warnings())
    }

    /// Diagnostics accumulated since creation or the last reset.
    pub fn diagnostics(&self) -> &DiagnosticSink {
        &self.sink
    }

    /// Resolves interned names in diagnostics or tests.
    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    pub fn stats(&self) -> &CompileStats {
        &self.stats
    }

    /// Clears diagnostics, symbols, per-compile types, and statistics.
    ///
    /// The interner is kept: existing handles stay resolvable, and reusing
    /// it does not affect output (emission is keyed by content, not by
    /// handle numbering).
    pub fn reset(&mut self) {
        self.sink.clear();
        self.scopes.reset();
        self.registry.reset();
        self.stats = CompileStats::default();
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(CompileOptions::default())
    }
}
