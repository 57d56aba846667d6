//! Lowering of typed programs to textual LLVM IR.
//!
//! The emitter presumes a fully typed tree: encountering an expression
//! whose type slot still holds the error sentinel is an Internal error,
//! reported once, after which emission aborts. (The pipeline only invokes
//! the emitter when analysis reported no errors, so this path only fires
//! on compiler bugs.)
//!
//! # Shape of the output
//!
//! A module is assembled from independently collected sections:
//!
//! ```text
//! ; ModuleID = …            module header, data layout, triple
//! declare …                 C runtime and sl_* helper declarations
//! %struct.Name = type <{…}> struct types, declaration order
//! @.str.N = private constant …   deduplicated string literals
//! @name = global …          global variables
//! define … { … }            function definitions
//! ```
//!
//! Inside a function, every local lives in an `alloca` collected into the
//! entry block; reads are `load`s and writes are `store`s, with lvalues
//! lowered in address mode (`getelementptr` for indexing and member
//! access). Virtual registers are `%tN` from a per-function counter and
//! block labels are construct-prefixed (`if.then0`, `while.cond1`, …).

mod expr;
mod stmt;
pub(crate) mod types;

use std::collections::HashMap;

use staticlang_base::{DiagnosticKind, DiagnosticSink, Interner, Name, Span};
use staticlang_language::ast::{Decl, DeclKind, Expr, ExprKind, Literal, Program, UnaryOp};
use staticlang_language::types::{Type, TypeId, TypeRegistry, DYNAMIC_LEN};

use types::{escape_string, float_constant, storage_type, value_type, zero_storage, zero_value};

/// Knobs the driver passes through to the emitter.
#[derive(Debug, Clone)]
pub struct CodegenOptions {
    pub target_triple: String,
    pub data_layout: String,
    /// Optimization level hint (0–3) recorded for the external toolchain;
    /// lowering itself is always the trivial form.
    pub opt_level: u8,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            target_triple: "x86_64-unknown-linux-gnu".to_string(),
            data_layout: "e-m:e-p270:32:32-p271:32:32-p272:64:64-i64:64-f80:128-n8:16:32:64-S128"
                .to_string(),
            opt_level: 0,
        }
    }
}

/// Emission aborted after an Internal diagnostic.
pub(crate) struct Aborted;

pub(crate) type Emit<T> = Result<T, Aborted>;

/// A variable's home: the pointer operand naming its slot, and its type.
#[derive(Debug, Clone)]
pub(crate) struct VarSlot {
    pub ptr: String,
    pub ty: TypeId,
}

/// Per-function emission state.
pub(crate) struct FuncCx {
    reg: usize,
    label: usize,
    allocas: Vec<String>,
    body: String,
    /// Label of the block instructions are currently appended to; phi
    /// nodes need to know where control actually came from.
    pub block: String,
    pub terminated: bool,
    /// Declared return type, for `return` lowering and array decay.
    pub ret: TypeId,
}

impl Default for FuncCx {
    fn default() -> Self {
        Self {
            reg: 0,
            label: 0,
            allocas: Vec::new(),
            body: String::new(),
            block: String::new(),
            terminated: false,
            ret: TypeId::VOID,
        }
    }
}

/// Streams one module's IR, across one or more analyzed programs.
pub struct Emitter<'env> {
    pub(crate) interner: &'env Interner,
    pub(crate) registry: &'env mut TypeRegistry,
    pub(crate) sink: &'env mut DiagnosticSink,
    pub(crate) file: String,
    options: CodegenOptions,

    struct_defs: String,
    string_defs: String,
    global_defs: String,
    func_defs: String,
    /// Decoded literal contents -> (global index, array length with NUL).
    string_table: HashMap<Name, (usize, usize)>,
    /// Global variables, visible from every function.
    globals: HashMap<Name, VarSlot>,
    /// Struct types already written to the types section.
    emitted_structs: std::collections::HashSet<Name>,

    pub(crate) fcx: FuncCx,
    /// Local scopes of the function currently being lowered.
    pub(crate) scopes: Vec<HashMap<Name, VarSlot>>,
}

impl<'env> Emitter<'env> {
    pub fn new(
        interner: &'env Interner,
        registry: &'env mut TypeRegistry,
        sink: &'env mut DiagnosticSink,
        options: CodegenOptions,
    ) -> Self {
        Self {
            interner,
            registry,
            sink,
            file: String::new(),
            options,
            struct_defs: String::new(),
            string_defs: String::new(),
            global_defs: String::new(),
            func_defs: String::new(),
            string_table: HashMap::new(),
            globals: HashMap::new(),
            emitted_structs: std::collections::HashSet::new(),
            fcx: FuncCx::default(),
            scopes: Vec::new(),
        }
    }

    /// Lowers one analyzed program into the module under construction.
    ///
    /// Struct types and globals are emitted before any function body so
    /// bodies can reference them regardless of declaration order.
    pub fn emit_program(&mut self, program: &Program<'_>, file: &str) -> Result<(), ()> {
        self.file = file.to_string();
        for decl in &program.decls {
            match self.emit_module_level(decl) {
                Ok(()) => {}
                Err(Aborted) => return Err(()),
            }
        }
        for decl in &program.decls {
            if let DeclKind::Function { .. } = &decl.kind {
                match self.emit_function(decl) {
                    Ok(()) => {}
                    Err(Aborted) => return Err(()),
                }
            }
        }
        Ok(())
    }

    /// Assembles the final module text.
    pub fn finish(self, module_name: &str) -> String {
        let mut out = String::new();
        out.push_str(&format!("; ModuleID = '{}'\n", module_name));
        out.push_str(&format!("; opt-level = {}\n", self.options.opt_level));
        out.push_str(&format!("source_filename = \"{}\"\n", module_name));
        out.push_str(&format!("target datalayout = \"{}\"\n", self.options.data_layout));
        out.push_str(&format!("target triple = \"{}\"\n\n", self.options.target_triple));

        out.push_str("declare i32 @printf(i8*, ...)\n");
        out.push_str("declare i8* @malloc(i64)\n");
        out.push_str("declare void @free(i8*)\n");
        out.push_str("declare void @sl_print_int(i64)\n");
        out.push_str("declare void @sl_print_double(double)\n");
        out.push_str("declare void @sl_print_string(i8*)\n");
        out.push_str("declare i8* @sl_alloc_string(i8*)\n");
        out.push_str("declare i8* @sl_concat_string(i8*, i8*)\n");
        out.push_str("declare i32 @sl_compare_string(i8*, i8*)\n");
        out.push_str("declare i8* @sl_alloc_array(i64, i64)\n\n");

        for section in [&self.struct_defs, &self.string_defs, &self.global_defs] {
            if !section.is_empty() {
                out.push_str(section);
                out.push('\n');
            }
        }
        out.push_str(&self.func_defs);
        out
    }

    // ------------------------------------------------------------------
    // Module-level declarations
    // ------------------------------------------------------------------

    fn emit_module_level(&mut self, decl: &Decl<'_>) -> Emit<()> {
        match &decl.kind {
            DeclKind::Struct { name, .. } => {
                if !self.emitted_structs.insert(*name) {
                    // Skipped duplicate; the first declaration emitted it.
                    return Ok(());
                }
                let Some(id) = self.registry.lookup_name(*name) else {
                    return Ok(());
                };
                let Type::Struct { fields, .. } = self.registry.get(id) else {
                    return Ok(());
                };
                let field_types: Vec<TypeId> = fields.iter().map(|(_, ty)| *ty).collect();
                let lowered: Vec<String> = field_types
                    .iter()
                    .map(|ty| storage_type(self.registry, self.interner, *ty))
                    .collect();
                self.struct_defs.push_str(&format!(
                    "%struct.{} = type <{{ {} }}>\n",
                    self.interner.resolve(*name),
                    lowered.join(", ")
                ));
                Ok(())
            }
            DeclKind::GlobalVar { name, ty, init, .. } => self.emit_global(decl, *name, ty, *init),
            DeclKind::Function { .. } => Ok(()),
        }
    }

    fn emit_global(
        &mut self,
        decl: &Decl<'_>,
        name: Name,
        ty: &staticlang_language::ast::TypeExpr,
        init: Option<&Expr<'_>>,
    ) -> Emit<()> {
        if self.globals.contains_key(&name) {
            // Skipped duplicate declaration.
            return Ok(());
        }
        let ty = self.resolve_annotation(ty, decl.span)?;
        let storage = storage_type(self.registry, self.interner, ty);
        let init_text = match init {
            None => zero_storage(self.registry, ty).to_string(),
            Some(expr) => match self.constant_initializer(expr) {
                Some(text) => text,
                None => {
                    self.sink.report_error(
                        DiagnosticKind::Codegen,
                        format!(
                            "initializer of global '{}' must be a constant literal",
                            self.interner.resolve(name)
                        ),
                        self.file.as_str(),
                        expr.span,
                    );
                    return Err(Aborted);
                }
            },
        };
        let ident = self.interner.resolve(name);
        self.global_defs
            .push_str(&format!("@{} = global {} {}\n", ident, storage, init_text));
        self.globals.insert(name, VarSlot { ptr: format!("@{}", ident), ty });
        Ok(())
    }

    /// Folds the literal forms allowed as global initializers, including
    /// a leading unary minus on numeric literals.
    fn constant_initializer(&mut self, expr: &Expr<'_>) -> Option<String> {
        match &expr.kind {
            ExprKind::Literal(Literal::Int(v)) => Some(v.to_string()),
            ExprKind::Literal(Literal::Float(v)) => Some(float_constant(*v)),
            ExprKind::Literal(Literal::Bool(b)) => {
                // Globals use the byte-wide storage form.
                Some(if *b { "1" } else { "0" }.to_string())
            }
            ExprKind::Literal(Literal::Str(content)) => Some(self.string_operand(*content)),
            ExprKind::Unary { op: UnaryOp::Neg, operand } => match &operand.kind {
                ExprKind::Literal(Literal::Int(v)) => Some((-v).to_string()),
                ExprKind::Literal(Literal::Float(v)) => Some(float_constant(-v)),
                _ => None,
            },
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Functions
    // ------------------------------------------------------------------

    fn emit_function(&mut self, decl: &Decl<'_>) -> Emit<()> {
        let DeclKind::Function { name, params, ret, body, .. } = &decl.kind else {
            return Ok(());
        };
        let ret_ty = match ret {
            Some(te) => self.resolve_annotation(te, decl.span)?,
            None => TypeId::INT,
        };

        self.fcx = FuncCx { block: "entry".to_string(), ret: ret_ty, ..FuncCx::default() };
        self.scopes.push(HashMap::new());

        let mut sig = Vec::new();
        for param in params {
            let ty = self.resolve_annotation(&param.ty, param.span)?;
            let arg = format!("%arg.{}", self.interner.resolve(param.name));
            sig.push(format!("{} {}", value_type(self.registry, self.interner, ty), arg));
            // Parameters get the same alloca discipline as locals.
            let slot = self.alloca_slot(ty);
            self.store_to(&arg, &slot, ty);
            self.bind(param.name, slot, ty);
        }

        self.lower_statement(body)?;

        if !self.fcx.terminated {
            if ret_ty == TypeId::VOID {
                self.line("ret void".to_string());
            } else {
                let zero = zero_value(self.registry, ret_ty);
                let vt = value_type(self.registry, self.interner, ret_ty);
                self.line(format!("ret {} {}", vt, zero));
            }
        }

        let fcx = std::mem::take(&mut self.fcx);
        self.scopes.pop();

        self.func_defs.push_str(&format!(
            "define {} @{}({}) {{\nentry:\n",
            value_type(self.registry, self.interner, ret_ty),
            self.interner.resolve(*name),
            sig.join(", ")
        ));
        for alloca in &fcx.allocas {
            self.func_defs.push_str(alloca);
        }
        self.func_defs.push_str(&fcx.body);
        self.func_defs.push_str("}\n\n");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Emission primitives
    // ------------------------------------------------------------------

    /// Fresh virtual register `%tN`.
    pub(crate) fn temp(&mut self) -> String {
        let reg = self.fcx.reg;
        self.fcx.reg += 1;
        format!("%t{}", reg)
    }

    /// Fresh block label with a construct prefix, e.g. `if.then3`.
    pub(crate) fn new_label(&mut self, prefix: &str) -> String {
        let n = self.fcx.label;
        self.fcx.label += 1;
        format!("{}{}", prefix, n)
    }

    /// Appends one instruction line to the current block.
    pub(crate) fn line(&mut self, text: String) {
        self.fcx.body.push_str("  ");
        self.fcx.body.push_str(&text);
        self.fcx.body.push('\n');
    }

    /// Opens a new basic block and makes it current.
    pub(crate) fn begin_block(&mut self, label: &str) {
        self.fcx.body.push_str(label);
        self.fcx.body.push_str(":\n");
        self.fcx.block = label.to_string();
        self.fcx.terminated = false;
    }

    /// Emits a terminator line and marks the block closed.
    pub(crate) fn terminate(&mut self, text: String) {
        self.line(text);
        self.fcx.terminated = true;
    }

    /// Reserves an entry-block alloca for a slot of `ty`.
    pub(crate) fn alloca_slot(&mut self, ty: TypeId) -> String {
        let reg = self.temp();
        let storage = storage_type(self.registry, self.interner, ty);
        self.fcx.allocas.push(format!("  {} = alloca {}\n", reg, storage));
        reg
    }

    /// Loads a value of `ty` out of `ptr`, inserting the bool `trunc`.
    pub(crate) fn load_from(&mut self, ptr: &str, ty: TypeId) -> String {
        let storage = storage_type(self.registry, self.interner, ty);
        let reg = self.temp();
        self.line(format!("{} = load {}, {}* {}", reg, storage, storage, ptr));
        if matches!(self.registry.get(ty), Type::Bool) {
            let truth = self.temp();
            self.line(format!("{} = trunc i8 {} to i1", truth, reg));
            return truth;
        }
        reg
    }

    /// Stores a value of `ty` into `ptr`, inserting the bool `zext`.
    pub(crate) fn store_to(&mut self, value: &str, ptr: &str, ty: TypeId) {
        let storage = storage_type(self.registry, self.interner, ty);
        if matches!(self.registry.get(ty), Type::Bool) {
            let widened = self.temp();
            self.line(format!("{} = zext i1 {} to i8", widened, value));
            self.line(format!("store i8 {}, i8* {}", widened, ptr));
            return;
        }
        self.line(format!("store {} {}, {}* {}", storage, value, storage, ptr));
    }

    // ------------------------------------------------------------------
    // Variable scope
    // ------------------------------------------------------------------

    pub(crate) fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub(crate) fn exit_scope(&mut self) {
        self.scopes.pop();
    }

    pub(crate) fn bind(&mut self, name: Name, ptr: String, ty: TypeId) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, VarSlot { ptr, ty });
        }
    }

    /// Finds a variable's slot, innermost scope first, then globals.
    pub(crate) fn slot_of(&self, name: Name) -> Option<&VarSlot> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(&name))
            .or_else(|| self.globals.get(&name))
    }

    // ------------------------------------------------------------------
    // Strings
    // ------------------------------------------------------------------

    /// Interns a string literal as a private constant global and returns
    /// the `i8*` constant-GEP operand referencing it. Identical contents
    /// share one global.
    pub(crate) fn string_operand(&mut self, content: Name) -> String {
        let (index, len) = match self.string_table.get(&content) {
            Some(&entry) => entry,
            None => {
                let index = self.string_table.len();
                let text = self.interner.resolve(content);
                let len = text.len() + 1;
                self.string_defs.push_str(&format!(
                    "@.str.{} = private constant [{} x i8] c\"{}\\00\"\n",
                    index,
                    len,
                    escape_string(text)
                ));
                self.string_table.insert(content, (index, len));
                (index, len)
            }
        };
        format!(
            "getelementptr inbounds ([{} x i8], [{} x i8]* @.str.{}, i64 0, i64 0)",
            len, len, index
        )
    }

    // ------------------------------------------------------------------
    // Shared plumbing
    // ------------------------------------------------------------------

    /// Re-resolves a syntactic type annotation. Analysis already vetted
    /// every annotation, so failure here is an internal error.
    pub(crate) fn resolve_annotation(
        &mut self,
        te: &staticlang_language::ast::TypeExpr,
        span: Span,
    ) -> Emit<TypeId> {
        use staticlang_language::ast::TypeExprKind;
        match &te.kind {
            TypeExprKind::Named(name) => match self.registry.lookup_name(*name) {
                Some(id) => Ok(id),
                None => Err(self.internal("unresolved type annotation reached code generation", span)),
            },
            TypeExprKind::Array { len, elem } => {
                let elem = self.resolve_annotation(elem, span)?;
                Ok(self.registry.array_of(elem, *len))
            }
            TypeExprKind::Dynamic { elem } => {
                let elem = self.resolve_annotation(elem, span)?;
                Ok(self.registry.array_of(elem, DYNAMIC_LEN))
            }
        }
    }

    /// The expression's analyzed type; the error sentinel aborts emission.
    pub(crate) fn expr_ty(&mut self, expr: &Expr<'_>) -> Emit<TypeId> {
        let ty = expr.ty.get();
        if ty.is_error() {
            return Err(self.internal("expression with unresolved type reached code generation", expr.span));
        }
        Ok(ty)
    }

    pub(crate) fn internal(&mut self, message: &str, span: Span) -> Aborted {
        self.sink.report_error(
            DiagnosticKind::Internal,
            format!("internal error: {}", message),
            self.file.as_str(),
            span,
        );
        Aborted
    }

    /// Element type behind an array-typed id.
    pub(crate) fn array_elem(&mut self, ty: TypeId, span: Span) -> Emit<(TypeId, i64)> {
        match self.registry.get(ty) {
            Type::Array { elem, len } => Ok((*elem, *len)),
            _ => Err(self.internal("indexing a non-array reached code generation", span)),
        }
    }
}
