//! Recursive-descent parser for StaticLang.
//!
//! Consumes the token stream and builds the arena AST. Binary expressions
//! use one precedence level per grammar tier (lowest `||` to highest
//! `* / %`), all left-associative; unary operators bind tighter, and the
//! postfix loop handles calls, indexing, and member access. The dangling
//! `else` binds to the nearest `if` as a direct consequence of recursive
//! descent.
//!
//! # Recovery
//!
//! On a syntax error the parser reports one diagnostic at the current
//! token, then skips ahead to a synchronizing token (`;`, `}`, a top-level
//! keyword, or end of input) and resumes. The resulting [`Program`] may be
//! missing the offending declarations but is always returned, so later
//! stages can still surface their own diagnostics for the healthy parts.
//!
//! Literal conversion happens here: an integer literal that overflows
//! 64 bits reports a **Lexical** diagnostic (the lexer deferred it) and
//! parses as zero.

use staticlang_base::{DiagnosticKind, DiagnosticSink, Interner, Span};

use crate::ast::{
    AstContext, BinaryOp, Decl, DeclKind, Expr, ExprKind, Field, Literal, Param, Program, Stmt,
    StmtKind, TypeExpr, TypeExprKind, UnaryOp,
};
use crate::token::{Token, TokenKind};

/// Marker for an error already reported to the sink; callers synchronize.
struct Reported;

type ParseResult<T> = Result<T, Reported>;

/// Parser over one file's token stream.
pub struct Parser<'a, 'src, 'ctx> {
    tokens: Vec<Token>,
    cursor: usize,
    ctx: AstContext<'a>,
    interner: &'ctx mut Interner,
    sink: &'ctx mut DiagnosticSink,
    file: &'src str,
}

impl<'a, 'src, 'ctx> Parser<'a, 'src, 'ctx> {
    /// `tokens` must end with an Eof token, as produced by
    /// [`Lexer::tokenize`](crate::lexer::Lexer::tokenize).
    pub fn new(
        tokens: Vec<Token>,
        ctx: AstContext<'a>,
        interner: &'ctx mut Interner,
        sink: &'ctx mut DiagnosticSink,
        file: &'src str,
    ) -> Self {
        debug_assert!(matches!(tokens.last(), Some(t) if t.kind == TokenKind::Eof));
        Self { tokens, cursor: 0, ctx, interner, sink, file }
    }

    /// Parses the whole token stream into a program.
    pub fn parse(mut self) -> Program<'a> {
        let mut program = Program::default();
        while !self.check(TokenKind::Eof) {
            let before = self.cursor;
            match self.declaration() {
                Ok(decl) => program.decls.push(decl),
                Err(Reported) => {
                    self.synchronize_top_level();
                    // Synchronization stops *before* top-level keywords; if
                    // nothing was consumed, skip one token so the loop
                    // always makes progress.
                    if self.cursor == before {
                        self.advance();
                    }
                }
            }
        }
        program
    }

    // ------------------------------------------------------------------
    // Token plumbing
    // ------------------------------------------------------------------

    fn peek(&self) -> Token {
        self.tokens[self.cursor.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek();
        if self.cursor < self.tokens.len() - 1 {
            self.cursor += 1;
        }
        tok
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        let found = self.peek();
        self.error(
            format!("expected {}, found {}", kind.describe(), found.kind.describe()),
            found.span,
        );
        Err(Reported)
    }

    fn error(&mut self, message: String, span: Span) {
        self.sink
            .report_error(DiagnosticKind::Syntax, message, self.file, span);
    }

    /// Skips to the next synchronizing token after a top-level error:
    /// past a `;` or `}`, or up to `func`/`struct`/`var`/EOF.
    fn synchronize_top_level(&mut self) {
        loop {
            match self.peek().kind {
                TokenKind::Semi | TokenKind::RBrace => {
                    self.advance();
                    return;
                }
                TokenKind::Func | TokenKind::Struct | TokenKind::Var | TokenKind::Eof => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Statement-level recovery: stop before `}` so the enclosing block can
    /// close, otherwise behave like top-level synchronization.
    fn synchronize_statement(&mut self) {
        loop {
            match self.peek().kind {
                TokenKind::Semi => {
                    self.advance();
                    return;
                }
                TokenKind::RBrace
                | TokenKind::Func
                | TokenKind::Struct
                | TokenKind::Var
                | TokenKind::Eof => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    fn declaration(&mut self) -> ParseResult<Decl<'a>> {
        match self.peek().kind {
            TokenKind::Func => self.function_decl(),
            TokenKind::Struct => self.struct_decl(),
            TokenKind::Ident | TokenKind::LBracket => self.global_var_decl(),
            _ => {
                let found = self.peek();
                self.error(
                    format!(
                        "expected declaration, found {}",
                        found.kind.describe()
                    ),
                    found.span,
                );
                Err(Reported)
            }
        }
    }

    /// `'func' Ident '(' params? ')' ('->' type)? block`
    fn function_decl(&mut self) -> ParseResult<Decl<'a>> {
        let func_tok = self.expect(TokenKind::Func)?;
        let name_tok = self.expect(TokenKind::Ident)?;
        self.expect(TokenKind::LParen)?;

        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let pname = self.expect(TokenKind::Ident)?;
                let pty = self.type_expr()?;
                params.push(Param {
                    name: pname.text,
                    span: pname.span.merge(pty.span),
                    ty: pty,
                });
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;

        let ret = if self.eat(TokenKind::Arrow).is_some() {
            Some(self.type_expr()?)
        } else {
            None
        };

        let body = self.block()?;
        Ok(Decl {
            span: func_tok.span.merge(body.span),
            kind: DeclKind::Function {
                name: name_tok.text,
                name_span: name_tok.span,
                params,
                ret,
                body,
            },
        })
    }

    /// `'struct' Ident '{' (Ident type ';')* '}'`
    fn struct_decl(&mut self) -> ParseResult<Decl<'a>> {
        let struct_tok = self.expect(TokenKind::Struct)?;
        let name_tok = self.expect(TokenKind::Ident)?;
        self.expect(TokenKind::LBrace)?;

        let mut fields = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.check(TokenKind::Eof) {
            let fname = self.expect(TokenKind::Ident)?;
            let fty = self.type_expr()?;
            let semi = self.expect(TokenKind::Semi)?;
            fields.push(Field {
                name: fname.text,
                span: fname.span.merge(semi.span),
                ty: fty,
            });
        }
        let close = self.expect(TokenKind::RBrace)?;
        Ok(Decl {
            span: struct_tok.span.merge(close.span),
            kind: DeclKind::Struct {
                name: name_tok.text,
                name_span: name_tok.span,
                fields,
            },
        })
    }

    /// `type Ident ('=' expr)? ';'`
    fn global_var_decl(&mut self) -> ParseResult<Decl<'a>> {
        let ty = self.type_expr()?;
        let name_tok = self.expect(TokenKind::Ident)?;
        let init = if self.eat(TokenKind::Assign).is_some() {
            Some(self.expression()?)
        } else {
            None
        };
        let semi = self.expect(TokenKind::Semi)?;
        Ok(Decl {
            span: ty.span.merge(semi.span),
            kind: DeclKind::GlobalVar {
                name: name_tok.text,
                name_span: name_tok.span,
                ty,
                init,
            },
        })
    }

    /// `type := Ident | '[' IntLit ']' type | '[' ']' type`
    fn type_expr(&mut self) -> ParseResult<TypeExpr> {
        if let Some(open) = self.eat(TokenKind::LBracket) {
            if self.eat(TokenKind::RBracket).is_some() {
                let elem = self.type_expr()?;
                return Ok(TypeExpr {
                    span: open.span.merge(elem.span),
                    kind: TypeExprKind::Dynamic { elem: Box::new(elem) },
                });
            }
            let len_tok = self.expect(TokenKind::IntLit)?;
            let len = self.int_value(len_tok).unwrap_or(1);
            self.expect(TokenKind::RBracket)?;
            let elem = self.type_expr()?;
            return Ok(TypeExpr {
                span: open.span.merge(elem.span),
                kind: TypeExprKind::Array { len, elem: Box::new(elem) },
            });
        }
        let name_tok = self.expect(TokenKind::Ident)?;
        Ok(TypeExpr {
            span: name_tok.span,
            kind: TypeExprKind::Named(name_tok.text),
        })
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    /// `'{' stmt* '}'`, with statement-level recovery inside.
    fn block(&mut self) -> ParseResult<&'a Stmt<'a>> {
        let open = self.expect(TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.check(TokenKind::Eof) {
            let before = self.cursor;
            match self.statement() {
                Ok(stmt) => stmts.push(stmt),
                Err(Reported) => {
                    self.synchronize_statement();
                    if self.cursor == before {
                        self.advance();
                    }
                }
            }
        }
        let close = self.expect(TokenKind::RBrace)?;
        Ok(self.ctx.stmt(
            StmtKind::Block { stmts: self.ctx.stmt_list(stmts) },
            open.span.merge(close.span),
        ))
    }

    fn statement(&mut self) -> ParseResult<&'a Stmt<'a>> {
        match self.peek().kind {
            TokenKind::Var => self.var_decl(),
            TokenKind::If => self.if_stmt(),
            TokenKind::While => self.while_stmt(),
            TokenKind::For => self.for_stmt(),
            TokenKind::Return => self.return_stmt(),
            TokenKind::LBrace => self.block(),
            _ => self.expr_or_assign_stmt(),
        }
    }

    /// `'var' Ident type ('=' expr)? ';'`
    fn var_decl(&mut self) -> ParseResult<&'a Stmt<'a>> {
        let var_tok = self.expect(TokenKind::Var)?;
        let name_tok = self.expect(TokenKind::Ident)?;
        let ty = self.type_expr()?;
        let init = if self.eat(TokenKind::Assign).is_some() {
            Some(self.expression()?)
        } else {
            None
        };
        let semi = self.expect(TokenKind::Semi)?;
        Ok(self.ctx.stmt(
            StmtKind::VarDecl {
                name: name_tok.text,
                name_span: name_tok.span,
                ty,
                init,
            },
            var_tok.span.merge(semi.span),
        ))
    }

    /// `'if' '(' expr ')' stmt ('else' stmt)?`
    ///
    /// `else` attaches to the nearest open `if`.
    fn if_stmt(&mut self) -> ParseResult<&'a Stmt<'a>> {
        let if_tok = self.expect(TokenKind::If)?;
        self.expect(TokenKind::LParen)?;
        let cond = self.expression()?;
        self.expect(TokenKind::RParen)?;
        let then = self.statement()?;
        let mut span = if_tok.span.merge(then.span);
        let otherwise = if self.eat(TokenKind::Else).is_some() {
            let stmt = self.statement()?;
            span = span.merge(stmt.span);
            Some(stmt)
        } else {
            None
        };
        Ok(self.ctx.stmt(StmtKind::If { cond, then, otherwise }, span))
    }

    fn while_stmt(&mut self) -> ParseResult<&'a Stmt<'a>> {
        let while_tok = self.expect(TokenKind::While)?;
        self.expect(TokenKind::LParen)?;
        let cond = self.expression()?;
        self.expect(TokenKind::RParen)?;
        let body = self.statement()?;
        Ok(self
            .ctx
            .stmt(StmtKind::While { cond, body }, while_tok.span.merge(body.span)))
    }

    /// `'for' '(' init? ';' cond? ';' update? ')' stmt`
    ///
    /// The init clause is a full statement (its own `;` is the first
    /// separator); the update clause is a semicolon-less assignment or
    /// expression. A missing condition means an always-true loop.
    fn for_stmt(&mut self) -> ParseResult<&'a Stmt<'a>> {
        let for_tok = self.expect(TokenKind::For)?;
        self.expect(TokenKind::LParen)?;

        let init = if self.eat(TokenKind::Semi).is_some() {
            None
        } else if self.check(TokenKind::Var) {
            Some(self.var_decl()?)
        } else {
            Some(self.simple_stmt(TokenKind::Semi)?)
        };

        let cond = if self.check(TokenKind::Semi) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(TokenKind::Semi)?;

        let update = if self.check(TokenKind::RParen) {
            None
        } else {
            Some(self.simple_stmt(TokenKind::RParen)?)
        };

        self.expect(TokenKind::RParen)?;
        let body = self.statement()?;
        Ok(self.ctx.stmt(
            StmtKind::For { init, cond, update, body },
            for_tok.span.merge(body.span),
        ))
    }

    /// An assignment or expression statement terminated by `terminator`,
    /// which is consumed only when it is `;`.
    fn simple_stmt(&mut self, terminator: TokenKind) -> ParseResult<&'a Stmt<'a>> {
        let expr = self.expression()?;
        let kind = if self.eat(TokenKind::Assign).is_some() {
            let value = self.expression()?;
            StmtKind::Assign { target: expr, value }
        } else {
            StmtKind::Expr(expr)
        };
        let end = match &kind {
            StmtKind::Assign { value, .. } => value.span,
            _ => expr.span,
        };
        if terminator == TokenKind::Semi {
            let semi = self.expect(TokenKind::Semi)?;
            return Ok(self.ctx.stmt(kind, expr.span.merge(semi.span)));
        }
        Ok(self.ctx.stmt(kind, expr.span.merge(end)))
    }

    fn return_stmt(&mut self) -> ParseResult<&'a Stmt<'a>> {
        let ret_tok = self.expect(TokenKind::Return)?;
        let value = if self.check(TokenKind::Semi) {
            None
        } else {
            Some(self.expression()?)
        };
        let semi = self.expect(TokenKind::Semi)?;
        Ok(self
            .ctx
            .stmt(StmtKind::Return { value }, ret_tok.span.merge(semi.span)))
    }

    fn expr_or_assign_stmt(&mut self) -> ParseResult<&'a Stmt<'a>> {
        self.simple_stmt(TokenKind::Semi)
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn expression(&mut self) -> ParseResult<&'a Expr<'a>> {
        self.logical_or()
    }

    fn binary_tier(
        &mut self,
        next: fn(&mut Self) -> ParseResult<&'a Expr<'a>>,
        ops: &[(TokenKind, BinaryOp)],
    ) -> ParseResult<&'a Expr<'a>> {
        let mut left = next(self)?;
        'outer: loop {
            for &(kind, op) in ops {
                if self.eat(kind).is_some() {
                    let right = next(self)?;
                    left = self.ctx.expr(
                        ExprKind::Binary { op, left, right },
                        left.span.merge(right.span),
                    );
                    continue 'outer;
                }
            }
            return Ok(left);
        }
    }

    fn logical_or(&mut self) -> ParseResult<&'a Expr<'a>> {
        self.binary_tier(Self::logical_and, &[(TokenKind::Or, BinaryOp::Or)])
    }

    fn logical_and(&mut self) -> ParseResult<&'a Expr<'a>> {
        self.binary_tier(Self::equality, &[(TokenKind::And, BinaryOp::And)])
    }

    fn equality(&mut self) -> ParseResult<&'a Expr<'a>> {
        self.binary_tier(
            Self::relational,
            &[(TokenKind::Eq, BinaryOp::Eq), (TokenKind::NotEq, BinaryOp::Ne)],
        )
    }

    fn relational(&mut self) -> ParseResult<&'a Expr<'a>> {
        self.binary_tier(
            Self::additive,
            &[
                (TokenKind::Less, BinaryOp::Lt),
                (TokenKind::LessEq, BinaryOp::Le),
                (TokenKind::Greater, BinaryOp::Gt),
                (TokenKind::GreaterEq, BinaryOp::Ge),
            ],
        )
    }

    fn additive(&mut self) -> ParseResult<&'a Expr<'a>> {
        self.binary_tier(
            Self::multiplicative,
            &[(TokenKind::Plus, BinaryOp::Add), (TokenKind::Minus, BinaryOp::Sub)],
        )
    }

    fn multiplicative(&mut self) -> ParseResult<&'a Expr<'a>> {
        self.binary_tier(
            Self::unary,
            &[
                (TokenKind::Star, BinaryOp::Mul),
                (TokenKind::Slash, BinaryOp::Div),
                (TokenKind::Percent, BinaryOp::Mod),
            ],
        )
    }

    fn unary(&mut self) -> ParseResult<&'a Expr<'a>> {
        let op = match self.peek().kind {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Not => Some(UnaryOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            let op_tok = self.advance();
            let operand = self.unary()?;
            return Ok(self.ctx.expr(
                ExprKind::Unary { op, operand },
                op_tok.span.merge(operand.span),
            ));
        }
        self.postfix()
    }

    /// Postfix loop: `expr(args)`, `expr[index]`, `expr.field`.
    fn postfix(&mut self) -> ParseResult<&'a Expr<'a>> {
        let mut expr = self.primary()?;
        loop {
            match self.peek().kind {
                TokenKind::LParen => {
                    self.advance();
                    let mut args = Vec::new();
                    if !self.check(TokenKind::RParen) {
                        loop {
                            args.push(self.expression()?);
                            if self.eat(TokenKind::Comma).is_none() {
                                break;
                            }
                        }
                    }
                    let close = self.expect(TokenKind::RParen)?;
                    expr = self.ctx.expr(
                        ExprKind::Call { callee: expr, args: self.ctx.expr_list(args) },
                        expr.span.merge(close.span),
                    );
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.expression()?;
                    let close = self.expect(TokenKind::RBracket)?;
                    expr = self.ctx.expr(
                        ExprKind::Index { object: expr, index },
                        expr.span.merge(close.span),
                    );
                }
                TokenKind::Dot => {
                    self.advance();
                    let field_tok = self.expect(TokenKind::Ident)?;
                    expr = self.ctx.expr(
                        ExprKind::Member { object: expr, field: field_tok.text },
                        expr.span.merge(field_tok.span),
                    );
                }
                _ => return Ok(expr),
            }
        }
    }

    fn primary(&mut self) -> ParseResult<&'a Expr<'a>> {
        let tok = self.peek();
        match tok.kind {
            TokenKind::IntLit => {
                self.advance();
                let value = self.int_value(tok).unwrap_or(0);
                Ok(self.ctx.expr(ExprKind::Literal(Literal::Int(value)), tok.span))
            }
            TokenKind::FloatLit => {
                self.advance();
                let value = self.float_value(tok);
                Ok(self.ctx.expr(ExprKind::Literal(Literal::Float(value)), tok.span))
            }
            TokenKind::StringLit => {
                self.advance();
                Ok(self
                    .ctx
                    .expr(ExprKind::Literal(Literal::Str(tok.text)), tok.span))
            }
            TokenKind::True => {
                self.advance();
                Ok(self.ctx.expr(ExprKind::Literal(Literal::Bool(true)), tok.span))
            }
            TokenKind::False => {
                self.advance();
                Ok(self
                    .ctx
                    .expr(ExprKind::Literal(Literal::Bool(false)), tok.span))
            }
            TokenKind::Ident => {
                self.advance();
                Ok(self.ctx.expr(ExprKind::Ident(tok.text), tok.span))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            _ => {
                self.error(
                    format!("expected expression, found {}", tok.kind.describe()),
                    tok.span,
                );
                Err(Reported)
            }
        }
    }

    // ------------------------------------------------------------------
    // Literal conversion
    // ------------------------------------------------------------------

    /// Converts an integer lexeme, reporting overflow as a Lexical
    /// diagnostic (the lexer defers value conversion to this point).
    fn int_value(&mut self, tok: Token) -> Option<i64> {
        let text = self.interner.resolve(tok.text);
        match text.parse::<i64>() {
            Ok(v) => Some(v),
            Err(_) => {
                let message = format!("integer literal '{}' out of range", text);
                self.sink
                    .report_error(DiagnosticKind::Lexical, message, self.file, tok.span);
                None
            }
        }
    }

    fn float_value(&mut self, tok: Token) -> f64 {
        let text = self.interner.resolve(tok.text);
        match text.parse::<f64>() {
            Ok(v) => v,
            Err(_) => {
                let message = format!("malformed float literal '{}'", text);
                self.sink
                    .report_error(DiagnosticKind::Lexical, message, self.file, tok.span);
                0.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use staticlang_base::Arena;

    fn with_program<R>(
        source: &str,
        f: impl FnOnce(&Program<'_>, &Interner, &DiagnosticSink) -> R,
    ) -> R {
        let mut interner = Interner::new();
        let mut sink = DiagnosticSink::new();
        let tokens = Lexer::new(source, "test.sl", &mut interner, &mut sink).tokenize();
        let arena = Arena::new();
        let ctx = AstContext::new(&arena);
        let program = Parser::new(tokens, ctx, &mut interner, &mut sink, "test.sl").parse();
        f(&program, &interner, &sink)
    }

    fn block_stmts<'p, 'a>(body: &'p Stmt<'a>) -> &'p [&'a Stmt<'a>] {
        match &body.kind {
            StmtKind::Block { stmts } => stmts,
            other => panic!("expected block, got {:?}", other),
        }
    }

    #[test]
    fn empty_program_parses_cleanly() {
        with_program("", |program, _, sink| {
            assert!(!sink.has_errors());
            assert!(program.decls.is_empty());
        });
    }

    #[test]
    fn function_with_params_and_return_type() {
        with_program("func add(a int, b int) -> int { return a + b; }", |program, interner, sink| {
            assert!(!sink.has_errors());
            assert_eq!(program.decls.len(), 1);
            let DeclKind::Function { name, params, ret, body, .. } = &program.decls[0].kind
            else {
                panic!("expected function");
            };
            assert_eq!(interner.resolve(*name), "add");
            assert_eq!(params.len(), 2);
            assert!(ret.is_some());
            assert_eq!(block_stmts(body).len(), 1);
        });
    }

    #[test]
    fn omitted_return_type_is_recorded_as_none() {
        with_program("func main() { return 0; }", |program, _, sink| {
            assert!(!sink.has_errors());
            let DeclKind::Function { ret, .. } = &program.decls[0].kind else {
                panic!("expected function");
            };
            assert!(ret.is_none());
        });
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        with_program("func f() -> int { return 1 + 2 * 3; }", |program, _, sink| {
            assert!(!sink.has_errors());
            let DeclKind::Function { body, .. } = &program.decls[0].kind else {
                panic!();
            };
            let StmtKind::Return { value: Some(expr) } = &block_stmts(body)[0].kind else {
                panic!("expected return");
            };
            let ExprKind::Binary { op: BinaryOp::Add, right, .. } = &expr.kind else {
                panic!("expected + at the root, got {:?}", expr.kind);
            };
            assert!(matches!(right.kind, ExprKind::Binary { op: BinaryOp::Mul, .. }));
        });
    }

    #[test]
    fn logical_or_is_the_loosest_tier() {
        with_program("func f() -> bool { return a || b && c; }", |program, _, sink| {
            assert!(!sink.has_errors());
            let DeclKind::Function { body, .. } = &program.decls[0].kind else { panic!() };
            let StmtKind::Return { value: Some(expr) } = &block_stmts(body)[0].kind else {
                panic!();
            };
            let ExprKind::Binary { op: BinaryOp::Or, right, .. } = &expr.kind else {
                panic!("expected || at the root");
            };
            assert!(matches!(right.kind, ExprKind::Binary { op: BinaryOp::And, .. }));
        });
    }

    #[test]
    fn relational_chains_are_left_associative() {
        with_program("func f() -> bool { return a < b < c; }", |program, _, sink| {
            assert!(!sink.has_errors());
            let DeclKind::Function { body, .. } = &program.decls[0].kind else { panic!() };
            let StmtKind::Return { value: Some(expr) } = &block_stmts(body)[0].kind else {
                panic!();
            };
            let ExprKind::Binary { op: BinaryOp::Lt, left, .. } = &expr.kind else {
                panic!("expected < at the root");
            };
            assert!(matches!(left.kind, ExprKind::Binary { op: BinaryOp::Lt, .. }));
        });
    }

    #[test]
    fn postfix_chain_call_index_member() {
        with_program("func f() -> int { return p.coords[0](1); }", |program, _, sink| {
            assert!(!sink.has_errors());
            let DeclKind::Function { body, .. } = &program.decls[0].kind else { panic!() };
            let StmtKind::Return { value: Some(expr) } = &block_stmts(body)[0].kind else {
                panic!();
            };
            let ExprKind::Call { callee, args } = &expr.kind else {
                panic!("outermost must be the call");
            };
            assert_eq!(args.len(), 1);
            let ExprKind::Index { object, .. } = &callee.kind else {
                panic!("call target must be the index");
            };
            assert!(matches!(object.kind, ExprKind::Member { .. }));
        });
    }

    #[test]
    fn dangling_else_binds_to_nearest_if() {
        with_program(
            "func f() { if (a) if (b) x = 1; else x = 2; }",
            |program, _, sink| {
                assert!(!sink.has_errors());
                let DeclKind::Function { body, .. } = &program.decls[0].kind else { panic!() };
                let StmtKind::If { then, otherwise, .. } = &block_stmts(body)[0].kind else {
                    panic!("expected outer if");
                };
                assert!(otherwise.is_none(), "outer if must not own the else");
                let StmtKind::If { otherwise: inner_else, .. } = &then.kind else {
                    panic!("expected inner if");
                };
                assert!(inner_else.is_some(), "inner if must own the else");
            },
        );
    }

    #[test]
    fn struct_declaration_keeps_field_order() {
        with_program("struct Point { x int; y float; }", |program, interner, sink| {
            assert!(!sink.has_errors());
            let DeclKind::Struct { name, fields, .. } = &program.decls[0].kind else {
                panic!("expected struct");
            };
            assert_eq!(interner.resolve(*name), "Point");
            let names: Vec<&str> = fields.iter().map(|f| interner.resolve(f.name)).collect();
            assert_eq!(names, ["x", "y"]);
        });
    }

    #[test]
    fn global_var_decl_is_type_first() {
        with_program("int counter = 3;", |program, interner, sink| {
            assert!(!sink.has_errors());
            let DeclKind::GlobalVar { name, init, .. } = &program.decls[0].kind else {
                panic!("expected global var");
            };
            assert_eq!(interner.resolve(*name), "counter");
            assert!(init.is_some());
        });
    }

    #[test]
    fn array_type_annotations() {
        with_program("func f() { var a [3]int; var b []float; var c [2][3]int; }", |program, _, sink| {
            assert!(!sink.has_errors());
            let DeclKind::Function { body, .. } = &program.decls[0].kind else { panic!() };
            let stmts = block_stmts(body);
            let StmtKind::VarDecl { ty, .. } = &stmts[0].kind else { panic!() };
            assert!(matches!(ty.kind, TypeExprKind::Array { len: 3, .. }));
            let StmtKind::VarDecl { ty, .. } = &stmts[1].kind else { panic!() };
            assert!(matches!(ty.kind, TypeExprKind::Dynamic { .. }));
            let StmtKind::VarDecl { ty, .. } = &stmts[2].kind else { panic!() };
            let TypeExprKind::Array { len: 2, elem } = &ty.kind else { panic!() };
            assert!(matches!(elem.kind, TypeExprKind::Array { len: 3, .. }));
        });
    }

    #[test]
    fn for_with_all_clauses() {
        with_program(
            "func f() { for (var i int = 0; i < 10; i = i + 1) { x = i; } }",
            |program, _, sink| {
                assert!(!sink.has_errors());
                let DeclKind::Function { body, .. } = &program.decls[0].kind else { panic!() };
                let StmtKind::For { init, cond, update, .. } = &block_stmts(body)[0].kind else {
                    panic!("expected for");
                };
                assert!(matches!(init.unwrap().kind, StmtKind::VarDecl { .. }));
                assert!(cond.is_some());
                assert!(matches!(update.unwrap().kind, StmtKind::Assign { .. }));
            },
        );
    }

    #[test]
    fn for_with_empty_clauses() {
        with_program("func f() { for (;;) { } }", |program, _, sink| {
            assert!(!sink.has_errors());
            let DeclKind::Function { body, .. } = &program.decls[0].kind else { panic!() };
            let StmtKind::For { init, cond, update, .. } = &block_stmts(body)[0].kind else {
                panic!("expected for");
            };
            assert!(init.is_none());
            assert!(cond.is_none());
            assert!(update.is_none());
        });
    }

    #[test]
    fn assignment_targets_may_be_postfix_expressions() {
        with_program("func f() { p.x = 1; a[0] = 2; }", |program, _, sink| {
            assert!(!sink.has_errors());
            let DeclKind::Function { body, .. } = &program.decls[0].kind else { panic!() };
            let stmts = block_stmts(body);
            let StmtKind::Assign { target, .. } = &stmts[0].kind else { panic!() };
            assert!(matches!(target.kind, ExprKind::Member { .. }));
            let StmtKind::Assign { target, .. } = &stmts[1].kind else { panic!() };
            assert!(matches!(target.kind, ExprKind::Index { .. }));
        });
    }

    #[test]
    fn recovery_surfaces_multiple_syntax_errors() {
        with_program(
            "func f() { var 1; return 0; } func g() { if } func h() { return 1; }",
            |program, _, sink| {
                assert!(sink.errors().count() >= 2, "expected at least two diagnostics");
                // The healthy declarations still parse.
                assert!(
                    program.decls.len() >= 2,
                    "recovery must keep parsing later declarations, got {}",
                    program.decls.len()
                );
            },
        );
    }

    #[test]
    fn recovery_makes_progress_on_nested_function_keyword() {
        with_program(
            "func f() { func g() } func h() -> int { return 1; }",
            |program, interner, sink| {
                assert!(sink.has_errors());
                let has_h = program.decls.iter().any(|d| match &d.kind {
                    DeclKind::Function { name, .. } => interner.resolve(*name) == "h",
                    _ => false,
                });
                assert!(has_h, "parsing must continue past the nested 'func'");
            },
        );
    }

    #[test]
    fn recovery_makes_progress_on_stray_top_level_var() {
        with_program("var x int = 1; func f() -> int { return 0; }", |program, interner, sink| {
            assert!(sink.has_errors(), "'var' is not a top-level declaration");
            let has_f = program.decls.iter().any(|d| match &d.kind {
                DeclKind::Function { name, .. } => interner.resolve(*name) == "f",
                _ => false,
            });
            assert!(has_f, "parsing must continue past the stray 'var'");
        });
    }

    #[test]
    fn integer_overflow_reports_lexical_diagnostic() {
        with_program("func f() -> int { return 99999999999999999999; }", |_, _, sink| {
            assert_eq!(sink.errors().count(), 1);
            let diag = sink.all().first().unwrap();
            assert_eq!(diag.kind, staticlang_base::DiagnosticKind::Lexical);
            assert!(diag.message.contains("out of range"));
        });
    }

    #[test]
    fn every_parsed_node_has_a_nonempty_span() {
        with_program("func f(a int) -> int { if (a > 0) { return a; } return 0; }", |program, _, sink| {
            assert!(!sink.has_errors());
            fn walk_stmt(stmt: &Stmt<'_>) {
                assert!(stmt.span.end.offset >= stmt.span.start.offset);
                assert!(!stmt.span.is_empty(), "statement span must be non-empty");
                match &stmt.kind {
                    StmtKind::Block { stmts } => stmts.iter().for_each(|s| walk_stmt(s)),
                    StmtKind::If { cond, then, otherwise } => {
                        walk_expr(cond);
                        walk_stmt(then);
                        if let Some(e) = otherwise {
                            walk_stmt(e);
                        }
                    }
                    StmtKind::Return { value: Some(v) } => walk_expr(v),
                    StmtKind::Expr(e) => walk_expr(e),
                    _ => {}
                }
            }
            fn walk_expr(expr: &Expr<'_>) {
                assert!(!expr.span.is_empty(), "expression span must be non-empty");
                if let ExprKind::Binary { left, right, .. } = &expr.kind {
                    walk_expr(left);
                    walk_expr(right);
                }
            }
            for decl in &program.decls {
                assert!(!decl.span.is_empty());
                if let DeclKind::Function { body, .. } = &decl.kind {
                    walk_stmt(body);
                }
            }
        });
    }
}
