//! Semantic analysis: name resolution and type checking.
//!
//! Two passes over the program share the scope stack and type registry:
//!
//! 1. **Declaration pass** — installs every top-level name into the global
//!    scope. Structs register their nominal type; functions register their
//!    signature. The first declaration of a duplicated name wins.
//! 2. **Body pass** — walks function bodies and global initializers,
//!    computing every expression's type bottom-up and writing it into the
//!    node's type slot.
//!
//! A builtin pre-pass installs `print`, the only variadic function: any
//! positive number of arguments, each int, float, string, or bool.
//!
//! # Error discipline
//!
//! A failed check reports one diagnostic and leaves the node's type as the
//! error sentinel. Operands that are already the sentinel never produce a
//! second report, so one undefined identifier does not cascade into a
//! column of follow-on noise. Analysis always continues to the end of the
//! program.

use staticlang_base::{DiagnosticKind, DiagnosticSink, Interner, Name, Span};

use crate::ast::{
    BinaryOp, Decl, DeclKind, Expr, ExprKind, Literal, Program, Stmt, StmtKind, TypeExpr,
    TypeExprKind, UnaryOp,
};
use crate::symtab::{ScopeStack, SymbolEntry, SymbolKind};
use crate::types::{Type, TypeId, TypeRegistry};

/// Analyzes one program against shared tables.
///
/// In a multi-file compile the same interner, registry, and scope stack are
/// threaded through one `Analyzer` per file, so later files see the
/// declarations of earlier ones.
pub struct Analyzer<'env, 'src> {
    interner: &'env mut Interner,
    registry: &'env mut TypeRegistry,
    scopes: &'env mut ScopeStack,
    sink: &'env mut DiagnosticSink,
    file: &'src str,
    /// Return type of the function being checked; `None` at top level.
    current_return: Option<TypeId>,
    print_name: Name,
}

impl<'env, 'src> Analyzer<'env, 'src> {
    pub fn new(
        interner: &'env mut Interner,
        registry: &'env mut TypeRegistry,
        scopes: &'env mut ScopeStack,
        sink: &'env mut DiagnosticSink,
        file: &'src str,
    ) -> Self {
        let print_name = interner.intern("print");
        Self {
            interner,
            registry,
            scopes,
            sink,
            file,
            current_return: None,
            print_name,
        }
    }

    /// Runs both passes. Diagnostics land in the sink; the tree's type
    /// slots are filled in place.
    pub fn analyze(&mut self, program: &Program<'_>) {
        self.install_builtins();
        for decl in &program.decls {
            self.declare_top_level(decl);
        }
        for decl in &program.decls {
            self.check_decl(decl);
        }
    }

    fn install_builtins(&mut self) {
        // Idempotent across the files of a multi-file compile.
        if self.scopes.lookup_global(self.print_name).is_some() {
            return;
        }
        let ty = self.registry.function_of(Vec::new(), TypeId::VOID);
        let _ = self.scopes.declare(SymbolEntry {
            name: self.print_name,
            ty,
            kind: SymbolKind::Function,
            span: Span::default(),
        });
    }

    // ------------------------------------------------------------------
    // Pass 1: top-level declarations
    // ------------------------------------------------------------------

    fn declare_top_level(&mut self, decl: &Decl<'_>) {
        match &decl.kind {
            DeclKind::Struct { name, name_span, fields } => {
                let mut resolved = Vec::new();
                for field in fields {
                    let ty = self.resolve_value_type(&field.ty, "field");
                    if resolved.iter().any(|(n, _)| *n == field.name) {
                        self.semantic_error(
                            format!(
                                "field '{}' already declared in struct '{}'",
                                self.interner.resolve(field.name),
                                self.interner.resolve(*name)
                            ),
                            field.span,
                        );
                        continue;
                    }
                    resolved.push((field.name, ty));
                }
                let Some(id) = self.registry.register_struct(*name, resolved) else {
                    self.semantic_error(
                        format!("struct '{}' already declared", self.interner.resolve(*name)),
                        *name_span,
                    );
                    return;
                };
                self.declare_symbol(*name, id, SymbolKind::Struct, *name_span);
            }
            DeclKind::Function { name, name_span, params, ret, .. } => {
                let param_types: Vec<TypeId> = params
                    .iter()
                    .map(|p| self.resolve_value_type(&p.ty, "parameter"))
                    .collect();
                let ret_ty = match ret {
                    Some(te) => self.resolve_type(te),
                    None => TypeId::INT,
                };
                let ty = self.registry.function_of(param_types, ret_ty);
                self.declare_symbol(*name, ty, SymbolKind::Function, *name_span);
            }
            DeclKind::GlobalVar { name, name_span, ty, .. } => {
                let ty = self.resolve_value_type(ty, "variable");
                self.declare_symbol(*name, ty, SymbolKind::Variable, *name_span);
            }
        }
    }

    fn declare_symbol(&mut self, name: Name, ty: TypeId, kind: SymbolKind, span: Span) {
        let entry = SymbolEntry { name, ty, kind, span };
        if self.scopes.declare(entry).is_err() {
            self.semantic_error(
                format!("'{}' already declared", self.interner.resolve(name)),
                span,
            );
        }
    }

    // ------------------------------------------------------------------
    // Pass 2: bodies
    // ------------------------------------------------------------------

    fn check_decl(&mut self, decl: &Decl<'_>) {
        match &decl.kind {
            DeclKind::Function { name, name_span, params, body, .. } => {
                // The signature was resolved and recorded in pass 1; a
                // mismatched declaration span means this is a skipped
                // duplicate whose body is not checked.
                let entry = self.scopes.lookup_global(*name).copied();
                let signature = match entry {
                    Some(e) if e.kind == SymbolKind::Function && e.span == *name_span => {
                        match self.registry.get(e.ty) {
                            Type::Function { params, ret } => (params.clone(), *ret),
                            _ => return,
                        }
                    }
                    _ => return,
                };
                let (param_types, ret_ty) = signature;

                self.current_return = Some(ret_ty);
                self.scopes.enter();
                for (param, &ty) in params.iter().zip(param_types.iter()) {
                    let entry = SymbolEntry {
                        name: param.name,
                        ty,
                        kind: SymbolKind::Parameter,
                        span: param.span,
                    };
                    if self.scopes.declare(entry).is_err() {
                        self.semantic_error(
                            format!(
                                "parameter '{}' already declared",
                                self.interner.resolve(param.name)
                            ),
                            param.span,
                        );
                    }
                }
                self.check_stmt(body);
                self.scopes.exit();
                self.current_return = None;
            }
            DeclKind::GlobalVar { name, name_span, init, .. } => {
                if let Some(init) = init {
                    let declared = match self.scopes.lookup_global(*name).copied() {
                        Some(e) if e.span == *name_span => e.ty,
                        _ => TypeId::ERROR,
                    };
                    let actual = self.infer(init);
                    if !declared.is_error()
                        && !actual.is_error()
                        && !self.registry.assignable_from(declared, actual)
                    {
                        self.type_error(
                            format!(
                                "cannot initialize '{}' of type {} with value of type {}",
                                self.interner.resolve(*name),
                                self.display(declared),
                                self.display(actual)
                            ),
                            init.span,
                        );
                    }
                }
            }
            DeclKind::Struct { .. } => {}
        }
    }

    fn check_stmt(&mut self, stmt: &Stmt<'_>) {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                self.infer(expr);
            }
            StmtKind::VarDecl { name, name_span, ty, init } => {
                let declared = self.resolve_value_type(ty, "variable");
                if let Some(init) = init {
                    let actual = self.infer(init);
                    if !declared.is_error()
                        && !actual.is_error()
                        && !self.registry.assignable_from(declared, actual)
                    {
                        self.type_error(
                            format!(
                                "cannot initialize '{}' of type {} with value of type {}",
                                self.interner.resolve(*name),
                                self.display(declared),
                                self.display(actual)
                            ),
                            init.span,
                        );
                    }
                }
                let entry = SymbolEntry {
                    name: *name,
                    ty: declared,
                    kind: SymbolKind::Variable,
                    span: *name_span,
                };
                if self.scopes.declare(entry).is_err() {
                    self.semantic_error(
                        format!("variable '{}' already declared", self.interner.resolve(*name)),
                        *name_span,
                    );
                }
            }
            StmtKind::Assign { target, value } => {
                let target_ty = self.infer(target);
                let value_ty = self.infer(value);
                if !target.is_lvalue() {
                    self.type_error("invalid assignment target".to_string(), target.span);
                    return;
                }
                if !target_ty.is_error()
                    && !value_ty.is_error()
                    && !self.registry.assignable_from(target_ty, value_ty)
                {
                    self.type_error(
                        format!(
                            "cannot assign value of type {} to target of type {}",
                            self.display(value_ty),
                            self.display(target_ty)
                        ),
                        stmt.span,
                    );
                }
            }
            StmtKind::If { cond, then, otherwise } => {
                self.check_condition(cond, "if");
                self.scopes.enter();
                self.check_stmt(then);
                self.scopes.exit();
                if let Some(otherwise) = otherwise {
                    self.scopes.enter();
                    self.check_stmt(otherwise);
                    self.scopes.exit();
                }
            }
            StmtKind::While { cond, body } => {
                self.check_condition(cond, "while");
                self.scopes.enter();
                self.check_stmt(body);
                self.scopes.exit();
            }
            StmtKind::For { init, cond, update, body } => {
                self.scopes.enter();
                if let Some(init) = init {
                    self.check_stmt(init);
                }
                if let Some(cond) = cond {
                    self.check_condition(cond, "for");
                }
                if let Some(update) = update {
                    self.check_stmt(update);
                }
                self.check_stmt(body);
                self.scopes.exit();
            }
            StmtKind::Return { value } => self.check_return(stmt.span, *value),
            StmtKind::Block { stmts } => {
                self.scopes.enter();
                for stmt in *stmts {
                    self.check_stmt(stmt);
                }
                self.scopes.exit();
            }
        }
    }

    fn check_condition(&mut self, cond: &Expr<'_>, construct: &str) {
        let ty = self.infer(cond);
        if !ty.is_error() && ty != TypeId::BOOL {
            self.type_error(
                format!("{} condition must be bool, got {}", construct, self.display(ty)),
                cond.span,
            );
        }
    }

    fn check_return(&mut self, span: Span, value: Option<&Expr<'_>>) {
        let Some(ret_ty) = self.current_return else {
            self.semantic_error("return outside of a function".to_string(), span);
            if let Some(value) = value {
                self.infer(value);
            }
            return;
        };
        match value {
            None => {
                if ret_ty != TypeId::VOID && !ret_ty.is_error() {
                    self.type_error(
                        format!(
                            "missing return value in function returning {}",
                            self.display(ret_ty)
                        ),
                        span,
                    );
                }
            }
            Some(value) => {
                let actual = self.infer(value);
                if ret_ty == TypeId::VOID {
                    if !actual.is_error() {
                        self.type_error(
                            "void function cannot return a value".to_string(),
                            value.span,
                        );
                    }
                } else if !ret_ty.is_error()
                    && !actual.is_error()
                    && !self.registry.assignable_from(ret_ty, actual)
                {
                    self.type_error(
                        format!(
                            "cannot return value of type {} from function returning {}",
                            self.display(actual),
                            self.display(ret_ty)
                        ),
                        value.span,
                    );
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Expression typing
    // ------------------------------------------------------------------

    /// Computes and stores the type of an expression, reporting at most
    /// one diagnostic for the node itself.
    fn infer(&mut self, expr: &Expr<'_>) -> TypeId {
        let ty = self.infer_kind(expr);
        expr.ty.set(ty);
        ty
    }

    fn infer_kind(&mut self, expr: &Expr<'_>) -> TypeId {
        match &expr.kind {
            ExprKind::Literal(lit) => match lit {
                Literal::Int(_) => TypeId::INT,
                Literal::Float(_) => TypeId::FLOAT,
                Literal::Str(_) => TypeId::STRING,
                Literal::Bool(_) => TypeId::BOOL,
            },
            ExprKind::Ident(name) => match self.scopes.lookup(*name).copied() {
                None => {
                    self.semantic_error(
                        format!("undefined identifier '{}'", self.interner.resolve(*name)),
                        expr.span,
                    );
                    TypeId::ERROR
                }
                Some(entry) if entry.kind == SymbolKind::Struct => {
                    self.semantic_error(
                        format!("'{}' is a type, not a value", self.interner.resolve(*name)),
                        expr.span,
                    );
                    TypeId::ERROR
                }
                Some(entry) => entry.ty,
            },
            ExprKind::Binary { op, left, right } => self.infer_binary(expr.span, *op, left, right),
            ExprKind::Unary { op, operand } => {
                let ty = self.infer(operand);
                if ty.is_error() {
                    return TypeId::ERROR;
                }
                match op {
                    UnaryOp::Neg if self.registry.is_numeric(ty) => ty,
                    UnaryOp::Not if ty == TypeId::BOOL => TypeId::BOOL,
                    _ => {
                        self.type_error(
                            format!(
                                "cannot apply operator {} to {}",
                                op.symbol(),
                                self.display(ty)
                            ),
                            expr.span,
                        );
                        TypeId::ERROR
                    }
                }
            }
            ExprKind::Call { callee, args } => self.infer_call(expr.span, callee, args),
            ExprKind::Index { object, index } => {
                let object_ty = self.infer(object);
                let index_ty = self.infer(index);
                if !index_ty.is_error() && index_ty != TypeId::INT {
                    self.type_error(
                        format!("array index must be int, got {}", self.display(index_ty)),
                        index.span,
                    );
                }
                if object_ty.is_error() {
                    return TypeId::ERROR;
                }
                match self.registry.get(object_ty) {
                    Type::Array { elem, .. } => *elem,
                    _ => {
                        self.type_error(
                            format!("cannot index value of type {}", self.display(object_ty)),
                            object.span,
                        );
                        TypeId::ERROR
                    }
                }
            }
            ExprKind::Member { object, field } => {
                let object_ty = self.infer(object);
                if object_ty.is_error() {
                    return TypeId::ERROR;
                }
                match self.registry.get(object_ty) {
                    Type::Struct { name, .. } => {
                        let struct_name = *name;
                        match self.registry.struct_field(object_ty, *field) {
                            Some((_, field_ty)) => field_ty,
                            None => {
                                self.type_error(
                                    format!(
                                        "struct '{}' has no field '{}'",
                                        self.interner.resolve(struct_name),
                                        self.interner.resolve(*field)
                                    ),
                                    expr.span,
                                );
                                TypeId::ERROR
                            }
                        }
                    }
                    _ => {
                        self.type_error(
                            format!(
                                "cannot access field '{}' on value of type {}",
                                self.interner.resolve(*field),
                                self.display(object_ty)
                            ),
                            expr.span,
                        );
                        TypeId::ERROR
                    }
                }
            }
        }
    }

    fn infer_binary(
        &mut self,
        span: Span,
        op: BinaryOp,
        left: &Expr<'_>,
        right: &Expr<'_>,
    ) -> TypeId {
        let lt = self.infer(left);
        let rt = self.infer(right);
        if lt.is_error() || rt.is_error() {
            return TypeId::ERROR;
        }

        if op.is_arithmetic() {
            if op == BinaryOp::Add && lt == TypeId::STRING && rt == TypeId::STRING {
                // Concatenation, backed by the runtime's sl_concat_string.
                return TypeId::STRING;
            }
            if lt == rt && self.registry.is_numeric(lt) {
                return lt;
            }
        } else if op.is_equality() {
            if lt == rt && self.registry.is_comparable(lt) {
                return TypeId::BOOL;
            }
        } else if op.is_relational() {
            if lt == rt && (self.registry.is_numeric(lt) || lt == TypeId::STRING) {
                return TypeId::BOOL;
            }
        } else if lt == TypeId::BOOL && rt == TypeId::BOOL {
            return TypeId::BOOL;
        }

        self.type_error(
            format!(
                "cannot apply operator {} to {} and {}",
                op.symbol(),
                self.display(lt),
                self.display(rt)
            ),
            span,
        );
        TypeId::ERROR
    }

    fn infer_call(&mut self, span: Span, callee: &Expr<'_>, args: &[&Expr<'_>]) -> TypeId {
        // The builtin print is variadic; it dispatches on argument types at
        // lowering time rather than through its registered signature.
        if let ExprKind::Ident(name) = callee.kind {
            if name == self.print_name
                && matches!(self.scopes.lookup(name), Some(e) if e.kind == SymbolKind::Function)
            {
                callee.ty.set(self.scopes.lookup(name).map(|e| e.ty).unwrap_or(TypeId::ERROR));
                return self.infer_print(span, args);
            }
        }

        let callee_ty = self.infer(callee);
        let arg_types: Vec<TypeId> = args.iter().map(|arg| self.infer(arg)).collect();
        if callee_ty.is_error() {
            return TypeId::ERROR;
        }
        let (params, ret) = match self.registry.get(callee_ty) {
            Type::Function { params, ret } => (params.clone(), *ret),
            _ => {
                self.type_error(
                    format!("called value is not a function, got {}", self.display(callee_ty)),
                    callee.span,
                );
                return TypeId::ERROR;
            }
        };
        if params.len() != args.len() {
            self.type_error(
                format!("function expects {} arguments, got {}", params.len(), args.len()),
                span,
            );
            return TypeId::ERROR;
        }
        let mut failed = false;
        for (i, (&param, &arg_ty)) in params.iter().zip(arg_types.iter()).enumerate() {
            if arg_ty.is_error() {
                failed = true;
                continue;
            }
            if !self.registry.assignable_from(param, arg_ty) {
                self.type_error(
                    format!(
                        "argument {} has type {}, expected {}",
                        i + 1,
                        self.display(arg_ty),
                        self.display(param)
                    ),
                    args[i].span,
                );
                failed = true;
            }
        }
        if failed {
            TypeId::ERROR
        } else {
            ret
        }
    }

    fn infer_print(&mut self, span: Span, args: &[&Expr<'_>]) -> TypeId {
        if args.is_empty() {
            self.type_error("print requires at least one argument".to_string(), span);
            return TypeId::ERROR;
        }
        for arg in args {
            let ty = self.infer(arg);
            if !ty.is_error() && !self.registry.is_printable(ty) {
                self.type_error(
                    format!("cannot print value of type {}", self.display(ty)),
                    arg.span,
                );
            }
        }
        TypeId::VOID
    }

    // ------------------------------------------------------------------
    // Type annotation resolution
    // ------------------------------------------------------------------

    /// Resolves a syntactic type annotation against the registry.
    fn resolve_type(&mut self, te: &TypeExpr) -> TypeId {
        match &te.kind {
            TypeExprKind::Named(name) => match self.registry.lookup_name(*name) {
                Some(id) => id,
                None => {
                    self.semantic_error(
                        format!("unknown type '{}'", self.interner.resolve(*name)),
                        te.span,
                    );
                    TypeId::ERROR
                }
            },
            TypeExprKind::Array { len, elem } => {
                let elem_ty = self.resolve_type(elem);
                if *len <= 0 {
                    self.semantic_error("array size must be positive".to_string(), te.span);
                    return TypeId::ERROR;
                }
                if elem_ty.is_error() {
                    return TypeId::ERROR;
                }
                self.registry.array_of(elem_ty, *len)
            }
            TypeExprKind::Dynamic { elem } => {
                let elem_ty = self.resolve_type(elem);
                if elem_ty.is_error() {
                    return TypeId::ERROR;
                }
                self.registry.array_of(elem_ty, crate::types::DYNAMIC_LEN)
            }
        }
    }

    /// Like [`resolve_type`](Self::resolve_type) but refuses `void`, which
    /// has no values.
    fn resolve_value_type(&mut self, te: &TypeExpr, what: &str) -> TypeId {
        let ty = self.resolve_type(te);
        if ty == TypeId::VOID {
            self.semantic_error(format!("{} cannot have type void", what), te.span);
            return TypeId::ERROR;
        }
        ty
    }

    // ------------------------------------------------------------------
    // Reporting helpers
    // ------------------------------------------------------------------

    fn display(&self, ty: TypeId) -> String {
        self.registry.display(ty, self.interner)
    }

    fn semantic_error(&mut self, message: String, span: Span) {
        self.sink
            .report_error(DiagnosticKind::Semantic, message, self.file, span);
    }

    fn type_error(&mut self, message: String, span: Span) {
        self.sink
            .report_error(DiagnosticKind::Type, message, self.file, span);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::AstContext;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use staticlang_base::Arena;

    /// Runs the full front end and hands the typed program to `f`.
    fn analyzed<R>(
        source: &str,
        f: impl FnOnce(&Program<'_>, &Interner, &TypeRegistry, &DiagnosticSink) -> R,
    ) -> R {
        let mut interner = Interner::new();
        let mut sink = DiagnosticSink::new();
        let tokens = Lexer::new(source, "test.sl", &mut interner, &mut sink).tokenize();
        let arena = Arena::new();
        let ctx = AstContext::new(&arena);
        let program = Parser::new(tokens, ctx, &mut interner, &mut sink, "test.sl").parse();
        let mut registry = TypeRegistry::new(&mut interner);
        let mut scopes = ScopeStack::new();
        Analyzer::new(&mut interner, &mut registry, &mut scopes, &mut sink, "test.sl")
            .analyze(&program);
        f(&program, &interner, &registry, &sink)
    }

    fn error_messages(sink: &DiagnosticSink) -> Vec<String> {
        sink.errors().map(|d| d.message.clone()).collect()
    }

    #[test]
    fn clean_function_produces_no_diagnostics() {
        analyzed(
            "func fib(n int) -> int { if (n <= 1) { return n; } return fib(n-1) + fib(n-2); }",
            |_, _, _, sink| {
                assert!(!sink.has_errors(), "unexpected: {:?}", error_messages(sink));
            },
        );
    }

    #[test]
    fn duplicate_local_reports_already_declared() {
        analyzed(
            "func main() -> int { var x int = 1; var x int = 2; return x; }",
            |_, _, _, sink| {
                let messages = error_messages(sink);
                assert_eq!(messages, ["variable 'x' already declared"]);
            },
        );
    }

    #[test]
    fn shadowing_in_inner_scope_is_allowed() {
        analyzed(
            "func main() -> int { var x int = 1; { var x int = 2; } return x; }",
            |_, _, _, sink| {
                assert!(!sink.has_errors(), "shadowing must succeed: {:?}", error_messages(sink));
            },
        );
    }

    #[test]
    fn string_plus_int_is_the_e5_diagnostic() {
        analyzed(
            "func main() -> int { var s string = \"a\"; return s + 1; }",
            |_, _, _, sink| {
                let messages = error_messages(sink);
                assert_eq!(messages.len(), 1, "got {:?}", messages);
                assert_eq!(messages[0], "cannot apply operator + to string and int");
            },
        );
    }

    #[test]
    fn string_plus_string_is_concatenation() {
        analyzed(
            "func greet(a string, b string) -> string { return a + b; }",
            |_, _, _, sink| {
                assert!(!sink.has_errors(), "{:?}", error_messages(sink));
            },
        );
    }

    #[test]
    fn int_condition_is_the_e6_diagnostic() {
        analyzed("func main() -> int { if (1) { return 0; } return 1; }", |_, _, _, sink| {
            let messages = error_messages(sink);
            assert_eq!(messages, ["if condition must be bool, got int"]);
        });
    }

    #[test]
    fn undefined_identifier_suppresses_enclosing_errors() {
        analyzed("func main() -> int { return ghost + 1 * 2; }", |_, _, _, sink| {
            let messages = error_messages(sink);
            assert_eq!(messages.len(), 1, "cascade must be suppressed, got {:?}", messages);
            assert!(messages[0].contains("undefined identifier 'ghost'"));
        });
    }

    #[test]
    fn void_return_rules() {
        analyzed("func log() -> void { return; }", |_, _, _, sink| {
            assert!(!sink.has_errors());
        });
        analyzed("func log() -> void { return 1; }", |_, _, _, sink| {
            assert_eq!(error_messages(sink), ["void function cannot return a value"]);
        });
        analyzed("func main() -> int { return; }", |_, _, _, sink| {
            assert_eq!(error_messages(sink), ["missing return value in function returning int"]);
        });
    }

    #[test]
    fn dynamic_array_accepts_fixed_array() {
        analyzed(
            "func f() { var fixed [4]int; var view []int = fixed; }",
            |_, _, _, sink| {
                assert!(!sink.has_errors(), "{:?}", error_messages(sink));
            },
        );
    }

    #[test]
    fn fixed_array_sizes_must_be_positive() {
        analyzed("func f() { var a [0]int; }", |_, _, _, sink| {
            assert_eq!(error_messages(sink), ["array size must be positive"]);
        });
    }

    #[test]
    fn struct_member_access_types_resolve() {
        analyzed(
            "struct Point { x int; y int; } \
             func f(p Point) -> int { return p.x + p.y; }",
            |_, _, _, sink| {
                assert!(!sink.has_errors(), "{:?}", error_messages(sink));
            },
        );
    }

    #[test]
    fn unknown_struct_field_is_reported() {
        analyzed(
            "struct Point { x int; } func f(p Point) -> int { return p.z; }",
            |_, _, _, sink| {
                assert_eq!(error_messages(sink), ["struct 'Point' has no field 'z'"]);
            },
        );
    }

    #[test]
    fn duplicate_struct_declaration_keeps_the_first() {
        analyzed(
            "struct P { x int; } struct P { y int; } func f(p P) -> int { return p.x; }",
            |_, _, _, sink| {
                assert_eq!(error_messages(sink), ["struct 'P' already declared"]);
            },
        );
    }

    #[test]
    fn call_arity_and_argument_types_are_checked() {
        analyzed(
            "func add(a int, b int) -> int { return a + b; } \
             func main() -> int { return add(1); }",
            |_, _, _, sink| {
                assert_eq!(error_messages(sink), ["function expects 2 arguments, got 1"]);
            },
        );
        analyzed(
            "func add(a int, b int) -> int { return a + b; } \
             func main() -> int { return add(1, true); }",
            |_, _, _, sink| {
                assert_eq!(error_messages(sink), ["argument 2 has type bool, expected int"]);
            },
        );
    }

    #[test]
    fn print_is_variadic_over_printable_types() {
        analyzed(
            "func main() -> int { print(\"hi\", 3, 2.5, true); return 0; }",
            |_, _, _, sink| {
                assert!(!sink.has_errors(), "{:?}", error_messages(sink));
            },
        );
        analyzed("struct P { x int; } func main(p P) -> int { print(p); return 0; }", |_, _, _, sink| {
            assert_eq!(error_messages(sink), ["cannot print value of type P"]);
        });
        analyzed("func main() -> int { print(); return 0; }", |_, _, _, sink| {
            assert_eq!(error_messages(sink), ["print requires at least one argument"]);
        });
    }

    #[test]
    fn assignment_requires_an_lvalue() {
        analyzed("func f() { 1 = 2; }", |_, _, _, sink| {
            assert_eq!(error_messages(sink), ["invalid assignment target"]);
        });
    }

    #[test]
    fn successful_analysis_leaves_no_error_types() {
        analyzed(
            "struct Point { x int; y int; } \
             func dist2(p Point) -> int { return p.x * p.x + p.y * p.y; } \
             func main() -> int { var a [2]int; a[0] = 1; a[1] = a[0] + 1; return a[1]; }",
            |program, _, _, sink| {
                assert!(!sink.has_errors(), "{:?}", error_messages(sink));
                fn walk_expr(expr: &Expr<'_>) {
                    assert!(!expr.ty.get().is_error(), "untyped node at {:?}", expr.span);
                    match &expr.kind {
                        ExprKind::Binary { left, right, .. } => {
                            walk_expr(left);
                            walk_expr(right);
                        }
                        ExprKind::Unary { operand, .. } => walk_expr(operand),
                        ExprKind::Call { callee, args } => {
                            walk_expr(callee);
                            args.iter().for_each(|a| walk_expr(a));
                        }
                        ExprKind::Index { object, index } => {
                            walk_expr(object);
                            walk_expr(index);
                        }
                        ExprKind::Member { object, .. } => walk_expr(object),
                        _ => {}
                    }
                }
                fn walk_stmt(stmt: &Stmt<'_>) {
                    match &stmt.kind {
                        StmtKind::Expr(e) => walk_expr(e),
                        StmtKind::VarDecl { init, .. } => {
                            if let Some(e) = init {
                                walk_expr(e);
                            }
                        }
                        StmtKind::Assign { target, value } => {
                            walk_expr(target);
                            walk_expr(value);
                        }
                        StmtKind::If { cond, then, otherwise } => {
                            walk_expr(cond);
                            walk_stmt(then);
                            if let Some(s) = otherwise {
                                walk_stmt(s);
                            }
                        }
                        StmtKind::While { cond, body } => {
                            walk_expr(cond);
                            walk_stmt(body);
                        }
                        StmtKind::For { init, cond, update, body } => {
                            init.iter().for_each(|s| walk_stmt(s));
                            cond.iter().for_each(|e| walk_expr(e));
                            update.iter().for_each(|s| walk_stmt(s));
                            walk_stmt(body);
                        }
                        StmtKind::Return { value } => {
                            value.iter().for_each(|e| walk_expr(e));
                        }
                        StmtKind::Block { stmts } => stmts.iter().for_each(|s| walk_stmt(s)),
                    }
                }
                for decl in &program.decls {
                    if let DeclKind::Function { body, .. } = &decl.kind {
                        walk_stmt(body);
                    }
                }
            },
        );
    }

    #[test]
    fn struct_name_used_as_value_is_rejected() {
        analyzed("struct P { x int; } func f() -> int { return P; }", |_, _, _, sink| {
            assert_eq!(error_messages(sink), ["'P' is a type, not a value"]);
        });
    }

    #[test]
    fn global_variables_are_visible_in_functions() {
        analyzed("int counter = 0; func bump() -> int { return counter + 1; }", |_, _, _, sink| {
            assert!(!sink.has_errors(), "{:?}", error_messages(sink));
        });
    }

    #[test]
    fn duplicate_top_level_names_report_once() {
        analyzed("func f() -> int { return 1; } func f() -> int { return 2; }", |_, _, _, sink| {
            assert_eq!(error_messages(sink), ["'f' already declared"]);
        });
    }
}
