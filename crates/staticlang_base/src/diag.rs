//! Structured diagnostics and the sink that accumulates them.
//!
//! Every stage of the compiler reports problems as [`Diagnostic`] values
//! into a shared [`DiagnosticSink`] and then keeps going; nothing in the
//! front end aborts on the first error. The driver renders the collected
//! diagnostics at the end of a run.
//!
//! # Ordering
//!
//! The sink preserves insertion order, which follows pipeline stage order
//! rather than document order. [`DiagnosticSink::sorted`] produces a view
//! ordered by `(file, line, column)` for user-facing output, and
//! [`SortedSink`] wraps another sink to apply the same ordering on flush.
//!
//! # Example
//!
//! ```
//! use staticlang_base::{Diagnostic, DiagnosticKind, DiagnosticSink, Span};
//!
//! let mut sink = DiagnosticSink::new();
//! sink.report(Diagnostic::error(
//!     DiagnosticKind::Semantic,
//!     "variable 'x' already declared",
//!     "main.sl",
//!     Span::default(),
//! ));
//!
//! assert!(sink.has_errors());
//! assert_eq!(sink.errors().count(), 1);
//! ```

use crate::span::Span;
use serde::Serialize;
use std::fmt;

/// Which stage of the pipeline produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    /// Malformed input at the byte/character level.
    Lexical,
    /// The token stream does not match the grammar.
    Syntax,
    /// Name resolution or declaration problems.
    Semantic,
    /// Type rule violations.
    Type,
    /// Problems surfacing during IR emission.
    Codegen,
    /// A compiler invariant was broken; always a bug report candidate.
    Internal,
}

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    /// Prevents IR from being written.
    Error,
    /// Reported but does not fail the compile (unless warnings-as-errors).
    Warning,
}

/// A single problem report with its source location.
///
/// Diagnostics are plain values; construct them with [`Diagnostic::error`]
/// or [`Diagnostic::warning`] and enrich them with [`with_context`] and
/// [`with_hint`] before reporting.
///
/// [`with_context`]: Diagnostic::with_context
/// [`with_hint`]: Diagnostic::with_hint
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    /// Producing stage.
    pub kind: DiagnosticKind,
    /// Error or warning.
    pub severity: Severity,
    /// Human-readable description of the problem.
    pub message: String,
    /// Name of the source file the span refers to.
    pub file: String,
    /// Where in the source the problem sits.
    pub span: Span,
    /// Optional surrounding context, e.g. the enclosing function name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Zero or more suggestions for fixing the problem.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<String>,
}

impl Diagnostic {
    /// Creates an error diagnostic.
    pub fn error(
        kind: DiagnosticKind,
        message: impl Into<String>,
        file: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            message: message.into(),
            file: file.into(),
            span,
            context: None,
            hints: Vec::new(),
        }
    }

    /// Creates a warning diagnostic.
    pub fn warning(
        kind: DiagnosticKind,
        message: impl Into<String>,
        file: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(kind, message, file, span)
        }
    }

    /// Attaches a context string, e.g. `"in function 'main'"`.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Appends a hint suggesting how to fix the problem.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }

    /// The ordering key used for sorted views: `(file, line, column)`.
    fn sort_key(&self) -> (&str, u32, u32) {
        (&self.file, self.span.start.line, self.span.start.column)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(
            f,
            "{}:{}:{}: {}: {}",
            self.file, self.span.start.line, self.span.start.column, level, self.message
        )?;
        if let Some(context) = &self.context {
            write!(f, " ({})", context)?;
        }
        for hint in &self.hints {
            write!(f, "\n  hint: {}", hint)?;
        }
        Ok(())
    }
}

/// Accumulates diagnostics for one compile in insertion order.
///
/// Optional caps silently drop entries past the limit, so a pathological
/// input cannot flood the user with thousands of reports.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    entries: Vec<Diagnostic>,
    error_count: usize,
    warning_count: usize,
    max_errors: Option<usize>,
    max_warnings: Option<usize>,
}

impl DiagnosticSink {
    /// Creates an uncapped sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink that keeps at most `max_errors` errors and
    /// `max_warnings` warnings; further entries are dropped silently.
    pub fn with_caps(max_errors: usize, max_warnings: usize) -> Self {
        Self {
            max_errors: Some(max_errors),
            max_warnings: Some(max_warnings),
            ..Self::default()
        }
    }

    /// Records a diagnostic, honoring the caps.
    pub fn report(&mut self, diag: Diagnostic) {
        match diag.severity {
            Severity::Error => {
                if let Some(cap) = self.max_errors {
                    if self.error_count >= cap {
                        return;
                    }
                }
                self.error_count += 1;
            }
            Severity::Warning => {
                if let Some(cap) = self.max_warnings {
                    if self.warning_count >= cap {
                        return;
                    }
                }
                self.warning_count += 1;
            }
        }
        self.entries.push(diag);
    }

    /// Shorthand for reporting an error without context or hints.
    pub fn report_error(
        &mut self,
        kind: DiagnosticKind,
        message: impl Into<String>,
        file: impl Into<String>,
        span: Span,
    ) {
        self.report(Diagnostic::error(kind, message, file, span));
    }

    /// Shorthand for reporting a warning without context or hints.
    pub fn report_warning(
        &mut self,
        kind: DiagnosticKind,
        message: impl Into<String>,
        file: impl Into<String>,
        span: Span,
    ) {
        self.report(Diagnostic::warning(kind, message, file, span));
    }

    /// Returns `true` if any error has been recorded.
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// Returns `true` if any warning has been recorded.
    pub fn has_warnings(&self) -> bool {
        self.warning_count > 0
    }

    /// All recorded diagnostics in insertion order.
    pub fn all(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// The recorded errors, in insertion order.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    /// The recorded warnings, in insertion order.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    /// A view of all diagnostics ordered by `(file, line, column)`.
    ///
    /// The view is a permutation of the insertion-order contents; ties keep
    /// insertion order (the sort is stable).
    pub fn sorted(&self) -> Vec<&Diagnostic> {
        let mut view: Vec<&Diagnostic> = self.entries.iter().collect();
        view.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        view
    }

    /// Forgets all recorded diagnostics, keeping the caps.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.error_count = 0;
        self.warning_count = 0;
    }
}

/// A decorator that buffers diagnostics and forwards them sorted.
///
/// Stages report in pipeline order; wrapping the run's sink in a
/// `SortedSink` and calling [`flush`] at the end delivers the reports in
/// document order instead.
///
/// [`flush`]: SortedSink::flush
#[derive(Debug, Default)]
pub struct SortedSink {
    buffer: Vec<Diagnostic>,
}

impl SortedSink {
    /// Creates an empty buffering sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffers a diagnostic without forwarding it yet.
    pub fn report(&mut self, diag: Diagnostic) {
        self.buffer.push(diag);
    }

    /// Sorts the buffered diagnostics by `(file, line, column)` and forwards
    /// them to `inner`, leaving this sink empty.
    pub fn flush(&mut self, inner: &mut DiagnosticSink) {
        self.buffer
            .sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        for diag in self.buffer.drain(..) {
            inner.report(diag);
        }
    }
}
