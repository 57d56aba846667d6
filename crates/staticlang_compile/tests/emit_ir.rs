//! Structural checks on the emitted IR: addressing discipline, control
//! flow shape, runtime calls, and the module layout.

mod common;

use common::{assert_blocks_terminated, compile_ok};

#[test]
fn module_preamble_lists_the_runtime_abi() {
    let ir = compile_ok("func main() -> int { return 0; }");
    for decl in [
        "declare i32 @printf(i8*, ...)",
        "declare i8* @malloc(i64)",
        "declare void @free(i8*)",
        "declare void @sl_print_int(i64)",
        "declare void @sl_print_double(double)",
        "declare void @sl_print_string(i8*)",
        "declare i8* @sl_alloc_string(i8*)",
        "declare i8* @sl_concat_string(i8*, i8*)",
        "declare i32 @sl_compare_string(i8*, i8*)",
        "declare i8* @sl_alloc_array(i64, i64)",
    ] {
        assert!(ir.contains(decl), "missing '{}' in:\n{}", decl, ir);
    }
    assert!(ir.contains("target datalayout"));
    assert!(ir.contains("target triple = \"x86_64-unknown-linux-gnu\""));
}

#[test]
fn locals_are_entry_allocas_with_load_store_access() {
    let ir = compile_ok("func f() -> int { var x int = 7; x = x + 1; return x; }");
    assert!(ir.contains("= alloca i64"), "got:\n{}", ir);
    assert!(ir.contains("store i64 7"), "got:\n{}", ir);
    assert!(ir.contains("load i64"), "got:\n{}", ir);
    assert_blocks_terminated(&ir);
}

#[test]
fn uninitialized_locals_are_zero_filled() {
    let ir = compile_ok("func f() -> int { var x int; return x; }");
    assert!(ir.contains("store i64 0"), "zero fill missing, got:\n{}", ir);
}

#[test]
fn parameters_share_the_alloca_discipline() {
    let ir = compile_ok("func id(a int) -> int { return a; }");
    assert!(ir.contains("define i64 @id(i64 %arg.a)"), "got:\n{}", ir);
    assert!(ir.contains("store i64 %arg.a"), "incoming store missing, got:\n{}", ir);
}

#[test]
fn bool_slots_are_bytes_with_zext_and_trunc() {
    let ir = compile_ok("func f(a bool) -> bool { var b bool = a; return b; }");
    assert!(ir.contains("alloca i8"), "got:\n{}", ir);
    assert!(ir.contains("zext i1 %arg.a to i8"), "got:\n{}", ir);
    assert!(ir.contains("trunc i8"), "got:\n{}", ir);
    assert!(ir.contains("define i1 @f(i1 %arg.a)"), "got:\n{}", ir);
}

#[test]
fn while_loop_uses_cond_body_end_blocks() {
    let ir = compile_ok(
        "func f() -> int { var i int = 0; while (i < 3) { i = i + 1; } return i; }",
    );
    assert!(ir.contains("while.cond"), "got:\n{}", ir);
    assert!(ir.contains("while.body"), "got:\n{}", ir);
    assert!(ir.contains("while.end"), "got:\n{}", ir);
    assert!(ir.contains("icmp slt i64"), "got:\n{}", ir);
    assert_blocks_terminated(&ir);
}

#[test]
fn for_loop_uses_cond_body_update_end_blocks() {
    let ir = compile_ok(
        "func sum() -> int { var s int = 0; \
         for (var i int = 0; i < 10; i = i + 1) { s = s + i; } return s; }",
    );
    for label in ["for.cond", "for.body", "for.update", "for.end"] {
        assert!(ir.contains(label), "missing {} in:\n{}", label, ir);
    }
    assert_blocks_terminated(&ir);
}

#[test]
fn if_with_both_branches_returning_omits_the_join_block() {
    let ir = compile_ok("func f(c bool) -> int { if (c) { return 1; } else { return 2; } }");
    assert!(ir.contains("if.then"), "got:\n{}", ir);
    assert!(ir.contains("if.else"), "got:\n{}", ir);
    assert!(!ir.contains("if.end"), "unreachable join must be omitted, got:\n{}", ir);
    assert_blocks_terminated(&ir);
}

#[test]
fn logical_operators_short_circuit_through_phis() {
    let ir = compile_ok("func f(a bool, b bool) -> bool { return a && b || a; }");
    assert!(ir.contains("land.rhs"), "got:\n{}", ir);
    assert!(ir.contains("land.end"), "got:\n{}", ir);
    assert!(ir.contains("lor.rhs"), "got:\n{}", ir);
    assert!(ir.contains("phi i1 [ false,"), "got:\n{}", ir);
    assert!(ir.contains("phi i1 [ true,"), "got:\n{}", ir);
    assert_blocks_terminated(&ir);
}

#[test]
fn float_arithmetic_and_ordered_comparison() {
    let ir = compile_ok("func f(a float, b float) -> bool { return a * b < 1.5; }");
    assert!(ir.contains("fmul double"), "got:\n{}", ir);
    assert!(ir.contains("fcmp olt double"), "got:\n{}", ir);
    assert!(ir.contains("0x3FF8000000000000"), "hex float constant, got:\n{}", ir);
}

#[test]
fn unary_operators_lower_to_sub_fneg_xor() {
    let ir = compile_ok(
        "func f(n int, x float, b bool) -> int { \
            var m int = -n; var y float = -x; var c bool = !b; return m; }",
    );
    assert!(ir.contains("sub i64 0,"), "got:\n{}", ir);
    assert!(ir.contains("fneg double"), "got:\n{}", ir);
    assert!(ir.contains("xor i1"), "got:\n{}", ir);
}

#[test]
fn struct_types_are_packed_and_member_access_is_gep() {
    let ir = compile_ok(
        "struct Point { x int; y int; } \
         func f() -> int { var p Point; p.y = 5; return p.y; }",
    );
    assert!(ir.contains("%struct.Point = type <{ i64, i64 }>"), "got:\n{}", ir);
    assert!(
        ir.contains("getelementptr inbounds %struct.Point, %struct.Point* %t0, i32 0, i32 1"),
        "field index 1 expected, got:\n{}",
        ir
    );
    assert_blocks_terminated(&ir);
}

#[test]
fn fixed_array_indexing_uses_two_index_gep() {
    let ir = compile_ok("func f() -> int { var a [3]int; a[1] = 7; return a[1]; }");
    assert!(ir.contains("alloca [3 x i64]"), "got:\n{}", ir);
    assert!(
        ir.contains("getelementptr inbounds [3 x i64], [3 x i64]* %t0, i64 0, i64 1"),
        "got:\n{}",
        ir
    );
}

#[test]
fn dynamic_array_indexing_loads_the_base_pointer() {
    let ir = compile_ok("func f(a []int) -> int { return a[2]; }");
    assert!(ir.contains("define i64 @f(i64* %arg.a)"), "got:\n{}", ir);
    assert!(ir.contains("load i64*, i64**"), "got:\n{}", ir);
    assert!(ir.contains("getelementptr inbounds i64, i64*"), "got:\n{}", ir);
}

#[test]
fn fixed_array_decays_into_dynamic_destination() {
    let ir = compile_ok("func f() -> int { var a [3]int; var d []int = a; return d[0]; }");
    assert!(
        ir.contains("getelementptr inbounds [3 x i64], [3 x i64]* %t0, i64 0, i64 0"),
        "decay GEP missing, got:\n{}",
        ir
    );
    assert!(ir.contains("store i64* %t"), "pointer store missing, got:\n{}", ir);
}

#[test]
fn string_comparison_goes_through_the_runtime() {
    let ir = compile_ok("func f(a string, b string) -> bool { return a < b; }");
    assert!(ir.contains("call i32 @sl_compare_string(i8*"), "got:\n{}", ir);
    assert!(ir.contains("icmp slt i32"), "got:\n{}", ir);
}

#[test]
fn string_concatenation_goes_through_the_runtime() {
    let ir = compile_ok("func f(a string, b string) -> string { return a + b; }");
    assert!(ir.contains("call i8* @sl_concat_string(i8*"), "got:\n{}", ir);
}

#[test]
fn identical_string_literals_share_one_global() {
    let ir = compile_ok(
        "func f() -> int { print(\"twice\"); print(\"twice\"); print(\"once\"); return 0; }",
    );
    assert_eq!(
        ir.matches("= private constant").count(),
        2,
        "dedup by content, got:\n{}",
        ir
    );
    assert!(ir.contains("c\"twice\\00\""), "got:\n{}", ir);
    assert!(ir.contains("c\"once\\00\""), "got:\n{}", ir);
}

#[test]
fn string_escapes_reencode_as_hex_bytes() {
    let ir = compile_ok("func f() -> int { print(\"a\\nb\\t\\\"q\\\"\"); return 0; }");
    assert!(ir.contains("c\"a\\0Ab\\09\\22q\\22\\00\""), "got:\n{}", ir);
}

#[test]
fn print_bool_widens_to_int() {
    let ir = compile_ok("func f() -> int { print(true); return 0; }");
    assert!(ir.contains("zext i1 true to i64"), "got:\n{}", ir);
    assert!(ir.contains("call void @sl_print_int(i64 %t"), "got:\n{}", ir);
}

#[test]
fn missing_return_gets_a_zero_default_terminator() {
    let ir = compile_ok("func f() -> int { var x int = 1; }");
    assert!(ir.contains("ret i64 0"), "got:\n{}", ir);

    let ir = compile_ok("func g() -> void { }");
    assert!(ir.contains("ret void"), "got:\n{}", ir);

    let ir = compile_ok("func h() -> float { }");
    assert!(ir.contains("ret double 0x0000000000000000"), "got:\n{}", ir);
}

#[test]
fn statements_after_return_emit_no_ir() {
    let ir = compile_ok("func f() -> int { return 1; print(\"dead\"); return 2; }");
    assert!(
        !ir.contains("call void @sl_print_string"),
        "dead code emitted, got:\n{}",
        ir
    );
    assert!(!ir.contains("c\"dead\\00\""), "dead string global emitted, got:\n{}", ir);
    assert!(!ir.contains("ret i64 2"), "dead return emitted, got:\n{}", ir);
    assert_blocks_terminated(&ir);
}

#[test]
fn globals_emit_module_level_definitions() {
    let ir = compile_ok(
        "int counter = 3; \
         func main() -> int { counter = counter + 1; return counter; }",
    );
    assert!(ir.contains("@counter = global i64 3"), "got:\n{}", ir);
    assert!(ir.contains("load i64, i64* @counter"), "got:\n{}", ir);
    assert!(ir.contains("store i64 %t"), "got:\n{}", ir);
}

#[test]
fn global_without_initializer_is_zeroed() {
    let ir = compile_ok("float ratio; func main() -> int { return 0; }");
    assert!(ir.contains("@ratio = global double 0x0000000000000000"), "got:\n{}", ir);
}

#[test]
fn negative_literal_globals_are_const_folded() {
    let ir = compile_ok("int offset = -8; func main() -> int { return offset; }");
    assert!(ir.contains("@offset = global i64 -8"), "got:\n{}", ir);
}

#[test]
fn void_function_calls_lower_without_a_result_register() {
    let ir = compile_ok(
        "func log() -> void { print(\"x\"); } \
         func main() -> int { log(); return 0; }",
    );
    assert!(ir.contains("call void @log()"), "got:\n{}", ir);
    assert!(!ir.contains("= call void"), "void call must not bind, got:\n{}", ir);
}
