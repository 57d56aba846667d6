//! Statement lowering and control-flow block construction.
//!
//! Each control construct owns a fixed label scheme: `if.then`/`if.else`/
//! `if.end`, `while.cond`/`while.body`/`while.end`, and `for.cond`/
//! `for.body`/`for.update`/`for.end`, each suffixed by the per-function
//! label counter. Every emitted block ends in exactly one terminator; a
//! fallthrough edge is an explicit `br`. After a `return`, the remaining
//! statements of the same source block emit nothing.

use staticlang_language::ast::{Stmt, StmtKind};

use super::types::{storage_type, value_type, zero_storage};
use super::{Emit, Emitter};

impl<'env> Emitter<'env> {
    pub(crate) fn lower_statement(&mut self, stmt: &Stmt<'_>) -> Emit<()> {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                self.lower_expr(expr)?;
                Ok(())
            }
            StmtKind::VarDecl { name, ty, init, .. } => {
                let ty = self.resolve_annotation(ty, stmt.span)?;
                let slot = self.alloca_slot(ty);
                match init {
                    Some(init) => {
                        let value = self.coerced_value(ty, init)?;
                        self.store_to(&value, &slot, ty);
                    }
                    None => {
                        // Zero-fill so every later read observes a write.
                        let storage = storage_type(self.registry, self.interner, ty);
                        let zero = zero_storage(self.registry, ty);
                        self.line(format!("store {} {}, {}* {}", storage, zero, storage, slot));
                    }
                }
                self.bind(*name, slot, ty);
                Ok(())
            }
            StmtKind::Assign { target, value } => {
                let (ptr, target_ty) = self.addr_of(target)?;
                let value = self.coerced_value(target_ty, value)?;
                self.store_to(&value, &ptr, target_ty);
                Ok(())
            }
            StmtKind::If { cond, then, otherwise } => self.lower_if(cond, then, *otherwise),
            StmtKind::While { cond, body } => self.lower_while(cond, body),
            StmtKind::For { init, cond, update, body } => {
                self.lower_for(*init, *cond, *update, body)
            }
            StmtKind::Return { value } => {
                match value {
                    Some(value) => {
                        let ret_ty = self.fcx.ret;
                        let v = self.coerced_value(ret_ty, value)?;
                        let vt = value_type(self.registry, self.interner, ret_ty);
                        self.terminate(format!("ret {} {}", vt, v));
                    }
                    None => self.terminate("ret void".to_string()),
                }
                Ok(())
            }
            StmtKind::Block { stmts } => {
                self.enter_scope();
                for stmt in *stmts {
                    if self.fcx.terminated {
                        break;
                    }
                    self.lower_statement(stmt)?;
                }
                self.exit_scope();
                Ok(())
            }
        }
    }

    fn lower_if(
        &mut self,
        cond: &staticlang_language::ast::Expr<'_>,
        then: &Stmt<'_>,
        otherwise: Option<&Stmt<'_>>,
    ) -> Emit<()> {
        let c = self.lower_expr(cond)?;
        let then_label = self.new_label("if.then");
        let else_label = otherwise.map(|_| self.new_label("if.else"));
        let end_label = self.new_label("if.end");

        let false_target = else_label.as_deref().unwrap_or(&end_label);
        self.terminate(format!(
            "br i1 {}, label %{}, label %{}",
            c, then_label, false_target
        ));

        self.begin_block(&then_label);
        self.enter_scope();
        self.lower_statement(then)?;
        self.exit_scope();
        let then_closed = self.fcx.terminated;
        if !then_closed {
            self.terminate(format!("br label %{}", end_label));
        }

        let mut else_closed = false;
        if let Some(otherwise) = otherwise {
            let else_label = else_label.expect("else label exists with else branch");
            self.begin_block(&else_label);
            self.enter_scope();
            self.lower_statement(otherwise)?;
            self.exit_scope();
            else_closed = self.fcx.terminated;
            if !else_closed {
                self.terminate(format!("br label %{}", end_label));
            }
        }

        // With both branches closed (and an else present) nothing reaches
        // the join block, so it is not emitted at all.
        if otherwise.is_some() && then_closed && else_closed {
            self.fcx.terminated = true;
            return Ok(());
        }
        self.begin_block(&end_label);
        Ok(())
    }

    fn lower_while(
        &mut self,
        cond: &staticlang_language::ast::Expr<'_>,
        body: &Stmt<'_>,
    ) -> Emit<()> {
        let cond_label = self.new_label("while.cond");
        let body_label = self.new_label("while.body");
        let end_label = self.new_label("while.end");

        self.terminate(format!("br label %{}", cond_label));

        self.begin_block(&cond_label);
        let c = self.lower_expr(cond)?;
        self.terminate(format!(
            "br i1 {}, label %{}, label %{}",
            c, body_label, end_label
        ));

        self.begin_block(&body_label);
        self.enter_scope();
        self.lower_statement(body)?;
        self.exit_scope();
        if !self.fcx.terminated {
            self.terminate(format!("br label %{}", cond_label));
        }

        self.begin_block(&end_label);
        Ok(())
    }

    fn lower_for(
        &mut self,
        init: Option<&Stmt<'_>>,
        cond: Option<&staticlang_language::ast::Expr<'_>>,
        update: Option<&Stmt<'_>>,
        body: &Stmt<'_>,
    ) -> Emit<()> {
        self.enter_scope();
        // The init clause runs once, inlined into the predecessor block.
        if let Some(init) = init {
            self.lower_statement(init)?;
        }

        let cond_label = self.new_label("for.cond");
        let body_label = self.new_label("for.body");
        let update_label = update.map(|_| self.new_label("for.update"));
        let end_label = self.new_label("for.end");

        self.terminate(format!("br label %{}", cond_label));

        self.begin_block(&cond_label);
        match cond {
            Some(cond) => {
                let c = self.lower_expr(cond)?;
                self.terminate(format!(
                    "br i1 {}, label %{}, label %{}",
                    c, body_label, end_label
                ));
            }
            // No condition: an always-taken loop edge.
            None => self.terminate(format!("br label %{}", body_label)),
        }

        self.begin_block(&body_label);
        self.lower_statement(body)?;
        if !self.fcx.terminated {
            let back_edge = update_label.as_deref().unwrap_or(&cond_label);
            self.terminate(format!("br label %{}", back_edge));
        }

        if let Some(update) = update {
            let update_label = update_label.expect("update label exists with update clause");
            self.begin_block(&update_label);
            self.lower_statement(update)?;
            self.terminate(format!("br label %{}", cond_label));
        }

        self.begin_block(&end_label);
        self.exit_scope();
        Ok(())
    }
}
