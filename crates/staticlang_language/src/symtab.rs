//! Scope-stack symbol table for name resolution.
//!
//! A [`ScopeStack`] is a stack of frames, each mapping a [`Name`] to the
//! [`SymbolEntry`] declared under it. Lookup walks from the innermost frame
//! outward, so an inner declaration shadows an outer one; declaring a name
//! twice in the *same* frame is refused and the caller reports a Semantic
//! error. The bottom frame is the global scope shared by every compile
//! unit in a multi-file run.

use staticlang_base::{Name, Span};
use std::collections::HashMap;

use crate::types::TypeId;

/// What a symbol names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Function,
    Parameter,
    Struct,
    Field,
}

/// One declared name: its type, role, and declaration site.
#[derive(Debug, Clone, Copy)]
pub struct SymbolEntry {
    pub name: Name,
    pub ty: TypeId,
    pub kind: SymbolKind,
    /// Where the symbol was declared, for duplicate-declaration messages.
    pub span: Span,
}

/// A stack of scope frames with outward lookup.
#[derive(Debug)]
pub struct ScopeStack {
    frames: Vec<HashMap<Name, SymbolEntry>>,
}

impl ScopeStack {
    /// Creates a stack holding only the global frame.
    pub fn new() -> Self {
        Self { frames: vec![HashMap::new()] }
    }

    /// Pushes a fresh innermost frame.
    pub fn enter(&mut self) {
        self.frames.push(HashMap::new());
    }

    /// Pops the innermost frame. The global frame is never popped.
    pub fn exit(&mut self) {
        debug_assert!(self.frames.len() > 1, "attempted to pop the global scope");
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Current nesting depth; the global frame alone is depth 1.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Declares a symbol in the innermost frame.
    ///
    /// Returns `Err` with the existing entry when the frame already binds
    /// the name; shadowing an *outer* binding is not an error.
    pub fn declare(&mut self, entry: SymbolEntry) -> Result<(), SymbolEntry> {
        let frame = self.frames.last_mut().expect("scope stack is never empty");
        if let Some(existing) = frame.get(&entry.name) {
            return Err(*existing);
        }
        frame.insert(entry.name, entry);
        Ok(())
    }

    /// Looks a name up, innermost frame first.
    pub fn lookup(&self, name: Name) -> Option<&SymbolEntry> {
        self.frames.iter().rev().find_map(|frame| frame.get(&name))
    }

    /// Looks a name up with the depth (1-based from the global frame) of
    /// the frame that bound it.
    pub fn lookup_with_depth(&self, name: Name) -> Option<(&SymbolEntry, usize)> {
        for (idx, frame) in self.frames.iter().enumerate().rev() {
            if let Some(entry) = frame.get(&name) {
                return Some((entry, idx + 1));
            }
        }
        None
    }

    /// Looks a name up in the innermost frame only.
    pub fn lookup_local(&self, name: Name) -> Option<&SymbolEntry> {
        self.frames.last().and_then(|frame| frame.get(&name))
    }

    /// Looks a name up in the global frame only.
    pub fn lookup_global(&self, name: Name) -> Option<&SymbolEntry> {
        self.frames.first().and_then(|frame| frame.get(&name))
    }

    /// Drops everything, including global bindings, leaving one empty
    /// global frame.
    pub fn reset(&mut self) {
        self.frames.clear();
        self.frames.push(HashMap::new());
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}
