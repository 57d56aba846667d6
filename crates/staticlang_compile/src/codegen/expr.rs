//! Expression lowering: value mode and address mode.
//!
//! Every expression lowers to a sequence of instructions producing one
//! operand string (a register, a constant, or a constant expression).
//! Lvalues additionally lower in *address* mode, yielding a pointer
//! operand: identifiers resolve to their alloca (or global), indexing and
//! member access to `getelementptr`s. Reads are then loads through the
//! address; writes are stores.
//!
//! `&&` and `||` are branch-lowered so the right-hand side only executes
//! when it must, with a `phi` merging the two truth values. String
//! comparison routes through `sl_compare_string` and compares the result
//! to zero; string `+` routes through `sl_concat_string`.

use staticlang_language::ast::{BinaryOp, Expr, ExprKind, Literal, UnaryOp};
use staticlang_language::types::{Type, TypeId, DYNAMIC_LEN};

use super::types::{float_constant, storage_type, value_type};
use super::{Emit, Emitter};

impl<'env> Emitter<'env> {
    /// Lowers an expression to an operand carrying its value.
    pub(crate) fn lower_expr(&mut self, expr: &Expr<'_>) -> Emit<String> {
        let ty = self.expr_ty(expr)?;
        match &expr.kind {
            ExprKind::Literal(lit) => Ok(self.literal_operand(*lit)),
            ExprKind::Ident(name) => {
                let Some(slot) = self.slot_of(*name).cloned() else {
                    return Err(self.internal("identifier without a storage slot", expr.span));
                };
                Ok(self.load_from(&slot.ptr, slot.ty))
            }
            ExprKind::Binary { op, left, right } => match op {
                BinaryOp::And | BinaryOp::Or => self.lower_short_circuit(*op, left, right),
                _ => self.lower_binary(*op, left, right),
            },
            ExprKind::Unary { op, operand } => {
                let v = self.lower_expr(operand)?;
                let reg = self.temp();
                match (op, self.registry.get(ty)) {
                    (UnaryOp::Neg, Type::Float) => {
                        self.line(format!("{} = fneg double {}", reg, v));
                    }
                    (UnaryOp::Neg, _) => {
                        self.line(format!("{} = sub i64 0, {}", reg, v));
                    }
                    (UnaryOp::Not, _) => {
                        self.line(format!("{} = xor i1 {}, true", reg, v));
                    }
                }
                Ok(reg)
            }
            ExprKind::Call { callee, args } => self.lower_call(callee, args),
            ExprKind::Index { .. } | ExprKind::Member { .. } => {
                let (ptr, ty) = self.addr_of(expr)?;
                Ok(self.load_from(&ptr, ty))
            }
        }
    }

    fn literal_operand(&mut self, lit: Literal) -> String {
        match lit {
            Literal::Int(v) => v.to_string(),
            Literal::Float(v) => float_constant(v),
            Literal::Bool(true) => "true".to_string(),
            Literal::Bool(false) => "false".to_string(),
            Literal::Str(content) => self.string_operand(content),
        }
    }

    // ------------------------------------------------------------------
    // Binary operators
    // ------------------------------------------------------------------

    fn lower_binary(
        &mut self,
        op: BinaryOp,
        left: &Expr<'_>,
        right: &Expr<'_>,
    ) -> Emit<String> {
        let operand_ty = self.expr_ty(left)?;
        let l = self.lower_expr(left)?;
        let r = self.lower_expr(right)?;

        if operand_ty == TypeId::STRING {
            return self.lower_string_op(op, &l, &r, left.span);
        }

        let is_float = matches!(self.registry.get(operand_ty), Type::Float);
        let reg = self.temp();
        if op.is_arithmetic() {
            let opcode = match (op, is_float) {
                (BinaryOp::Add, false) => "add",
                (BinaryOp::Sub, false) => "sub",
                (BinaryOp::Mul, false) => "mul",
                (BinaryOp::Div, false) => "sdiv",
                (BinaryOp::Mod, false) => "srem",
                (BinaryOp::Add, true) => "fadd",
                (BinaryOp::Sub, true) => "fsub",
                (BinaryOp::Mul, true) => "fmul",
                (BinaryOp::Div, true) => "fdiv",
                (BinaryOp::Mod, true) => "frem",
                _ => unreachable!("arithmetic op"),
            };
            let vt = value_type(self.registry, self.interner, operand_ty);
            self.line(format!("{} = {} {} {}, {}", reg, opcode, vt, l, r));
            return Ok(reg);
        }

        // Comparisons: signed predicates for integers (and bools under
        // equality), ordered predicates for floats.
        let (instr, pred) = if is_float {
            let pred = match op {
                BinaryOp::Eq => "oeq",
                BinaryOp::Ne => "one",
                BinaryOp::Lt => "olt",
                BinaryOp::Le => "ole",
                BinaryOp::Gt => "ogt",
                BinaryOp::Ge => "oge",
                _ => unreachable!("comparison op"),
            };
            ("fcmp", pred)
        } else {
            let pred = match op {
                BinaryOp::Eq => "eq",
                BinaryOp::Ne => "ne",
                BinaryOp::Lt => "slt",
                BinaryOp::Le => "sle",
                BinaryOp::Gt => "sgt",
                BinaryOp::Ge => "sge",
                _ => unreachable!("comparison op"),
            };
            ("icmp", pred)
        };
        let vt = value_type(self.registry, self.interner, operand_ty);
        self.line(format!("{} = {} {} {} {}, {}", reg, instr, pred, vt, l, r));
        Ok(reg)
    }

    fn lower_string_op(
        &mut self,
        op: BinaryOp,
        l: &str,
        r: &str,
        span: staticlang_base::Span,
    ) -> Emit<String> {
        if op == BinaryOp::Add {
            let reg = self.temp();
            self.line(format!(
                "{} = call i8* @sl_concat_string(i8* {}, i8* {})",
                reg, l, r
            ));
            return Ok(reg);
        }
        let pred = match op {
            BinaryOp::Eq => "eq",
            BinaryOp::Ne => "ne",
            BinaryOp::Lt => "slt",
            BinaryOp::Le => "sle",
            BinaryOp::Gt => "sgt",
            BinaryOp::Ge => "sge",
            _ => return Err(self.internal("invalid string operator reached code generation", span)),
        };
        let cmp = self.temp();
        self.line(format!(
            "{} = call i32 @sl_compare_string(i8* {}, i8* {})",
            cmp, l, r
        ));
        let reg = self.temp();
        self.line(format!("{} = icmp {} i32 {}, 0", reg, pred, cmp));
        Ok(reg)
    }

    /// Branch-lowered `&&` / `||` with a phi merging the two outcomes.
    fn lower_short_circuit(
        &mut self,
        op: BinaryOp,
        left: &Expr<'_>,
        right: &Expr<'_>,
    ) -> Emit<String> {
        let (prefix, skip_value) = match op {
            BinaryOp::And => ("land", "false"),
            _ => ("lor", "true"),
        };
        let l = self.lower_expr(left)?;
        let from_block = self.fcx.block.clone();
        let rhs_label = self.new_label(&format!("{}.rhs", prefix));
        let end_label = self.new_label(&format!("{}.end", prefix));

        if op == BinaryOp::And {
            self.terminate(format!("br i1 {}, label %{}, label %{}", l, rhs_label, end_label));
        } else {
            self.terminate(format!("br i1 {}, label %{}, label %{}", l, end_label, rhs_label));
        }

        self.begin_block(&rhs_label);
        let r = self.lower_expr(right)?;
        let rhs_exit = self.fcx.block.clone();
        self.terminate(format!("br label %{}", end_label));

        self.begin_block(&end_label);
        let reg = self.temp();
        self.line(format!(
            "{} = phi i1 [ {}, %{} ], [ {}, %{} ]",
            reg, skip_value, from_block, r, rhs_exit
        ));
        Ok(reg)
    }

    // ------------------------------------------------------------------
    // Calls
    // ------------------------------------------------------------------

    fn lower_call(&mut self, callee: &Expr<'_>, args: &[&Expr<'_>]) -> Emit<String> {
        let ExprKind::Ident(name) = callee.kind else {
            return Err(self.internal("indirect calls are not supported", callee.span));
        };

        if self.is_print(name) {
            return self.lower_print(args);
        }

        let callee_ty = self.expr_ty(callee)?;
        let ret = match self.registry.get(callee_ty) {
            Type::Function { ret, .. } => *ret,
            _ => return Err(self.internal("call target is not a function", callee.span)),
        };

        let mut lowered = Vec::new();
        for arg in args {
            let ty = self.expr_ty(arg)?;
            let v = self.lower_expr(arg)?;
            lowered.push(format!("{} {}", value_type(self.registry, self.interner, ty), v));
        }
        let arg_list = lowered.join(", ");
        let fn_name = self.interner.resolve(name).to_string();

        if ret == TypeId::VOID {
            self.line(format!("call void @{}({})", fn_name, arg_list));
            return Ok(String::new());
        }
        let reg = self.temp();
        let rt = value_type(self.registry, self.interner, ret);
        self.line(format!("{} = call {} @{}({})", reg, rt, fn_name, arg_list));
        Ok(reg)
    }

    /// One runtime call per argument, dispatched on the argument's type.
    /// Bools widen to i64 and print as integers.
    fn lower_print(&mut self, args: &[&Expr<'_>]) -> Emit<String> {
        for arg in args {
            let ty = self.expr_ty(arg)?;
            let v = self.lower_expr(arg)?;
            match self.registry.get(ty) {
                Type::Int => self.line(format!("call void @sl_print_int(i64 {})", v)),
                Type::Float => self.line(format!("call void @sl_print_double(double {})", v)),
                Type::Str => self.line(format!("call void @sl_print_string(i8* {})", v)),
                Type::Bool => {
                    let widened = self.temp();
                    self.line(format!("{} = zext i1 {} to i64", widened, v));
                    self.line(format!("call void @sl_print_int(i64 {})", widened));
                }
                _ => {
                    return Err(self.internal("unprintable value reached code generation", arg.span))
                }
            }
        }
        Ok(String::new())
    }

    // ------------------------------------------------------------------
    // Address mode
    // ------------------------------------------------------------------

    /// Lowers an lvalue to a pointer operand and the pointee type.
    pub(crate) fn addr_of(&mut self, expr: &Expr<'_>) -> Emit<(String, TypeId)> {
        match &expr.kind {
            ExprKind::Ident(name) => {
                let Some(slot) = self.slot_of(*name).cloned() else {
                    return Err(self.internal("identifier without a storage slot", expr.span));
                };
                Ok((slot.ptr, slot.ty))
            }
            ExprKind::Index { object, index } => {
                let (base_ptr, object_ty) = self.addr_or_spill(object)?;
                let (elem, len) = self.array_elem(object_ty, object.span)?;
                let idx = self.lower_expr(index)?;
                let elem_st = storage_type(self.registry, self.interner, elem);
                let ptr = if len == DYNAMIC_LEN {
                    let base = self.temp();
                    self.line(format!(
                        "{} = load {}*, {}** {}",
                        base, elem_st, elem_st, base_ptr
                    ));
                    let ptr = self.temp();
                    self.line(format!(
                        "{} = getelementptr inbounds {}, {}* {}, i64 {}",
                        ptr, elem_st, elem_st, base, idx
                    ));
                    ptr
                } else {
                    let array_ty = format!("[{} x {}]", len, elem_st);
                    let ptr = self.temp();
                    self.line(format!(
                        "{} = getelementptr inbounds {}, {}* {}, i64 0, i64 {}",
                        ptr, array_ty, array_ty, base_ptr, idx
                    ));
                    ptr
                };
                Ok((ptr, elem))
            }
            ExprKind::Member { object, field } => {
                let (base_ptr, object_ty) = self.addr_or_spill(object)?;
                let Some((index, field_ty)) = self.registry.struct_field(object_ty, *field)
                else {
                    return Err(self.internal("unknown struct field reached code generation", expr.span));
                };
                let struct_ty = value_type(self.registry, self.interner, object_ty);
                let ptr = self.temp();
                self.line(format!(
                    "{} = getelementptr inbounds {}, {}* {}, i32 0, i32 {}",
                    ptr, struct_ty, struct_ty, base_ptr, index
                ));
                Ok((ptr, field_ty))
            }
            _ => Err(self.internal("address taken of a non-lvalue", expr.span)),
        }
    }

    /// Address mode for any expression: lvalues resolve directly, rvalues
    /// spill to a temporary alloca so indexing into them still works.
    fn addr_or_spill(&mut self, expr: &Expr<'_>) -> Emit<(String, TypeId)> {
        if expr.is_lvalue() {
            return self.addr_of(expr);
        }
        let ty = self.expr_ty(expr)?;
        let value = self.lower_expr(expr)?;
        let slot = self.alloca_slot(ty);
        self.store_to(&value, &slot, ty);
        Ok((slot, ty))
    }

    /// Lowers `expr` to a value valid where `dst` is expected. The one
    /// coercion in the language is array decay: a fixed array stored into
    /// a dynamic-array destination becomes a pointer to its first element.
    pub(crate) fn coerced_value(&mut self, dst: TypeId, expr: &Expr<'_>) -> Emit<String> {
        let src = self.expr_ty(expr)?;
        let dst_dynamic = matches!(self.registry.get(dst), Type::Array { len: DYNAMIC_LEN, .. });
        let src_fixed = match self.registry.get(src) {
            Type::Array { elem, len } if *len != DYNAMIC_LEN => Some((*elem, *len)),
            _ => None,
        };
        if dst_dynamic {
            if let Some((elem, len)) = src_fixed {
                let (base_ptr, _) = self.addr_or_spill(expr)?;
                let elem_st = storage_type(self.registry, self.interner, elem);
                let array_ty = format!("[{} x {}]", len, elem_st);
                let ptr = self.temp();
                self.line(format!(
                    "{} = getelementptr inbounds {}, {}* {}, i64 0, i64 0",
                    ptr, array_ty, array_ty, base_ptr
                ));
                return Ok(ptr);
            }
        }
        self.lower_expr(expr)
    }

    fn is_print(&self, name: staticlang_base::Name) -> bool {
        self.interner.get("print") == Some(name) && self.slot_of(name).is_none()
    }
}
