//! Lowering of StaticLang types to LLVM type syntax.
//!
//! Two views exist for every type:
//!
//! - the **value** type, used for SSA values, parameters, and returns;
//! - the **storage** type, used for allocas, array elements, struct
//!   fields, and globals.
//!
//! They coincide for everything except `bool`, whose values are `i1` but
//! whose memory slots are `i8` (one byte, matching the logical size
//! model). Loads and stores of bools insert the `trunc`/`zext` pair.
//!
//! Structs lower to named packed types (`%struct.Name = type <{ … }>`) so
//! the emitted layout agrees with the no-padding size model.

use staticlang_base::Interner;
use staticlang_language::types::{Type, TypeId, TypeRegistry, DYNAMIC_LEN};

/// LLVM type for SSA values of `ty`.
pub fn value_type(registry: &TypeRegistry, interner: &Interner, ty: TypeId) -> String {
    match registry.get(ty) {
        Type::Int => "i64".to_string(),
        Type::Float => "double".to_string(),
        Type::Bool => "i1".to_string(),
        Type::Str => "i8*".to_string(),
        Type::Void => "void".to_string(),
        Type::Error => "void".to_string(),
        Type::Array { elem, len: DYNAMIC_LEN } => {
            format!("{}*", storage_type(registry, interner, *elem))
        }
        Type::Array { elem, len } => {
            format!("[{} x {}]", len, storage_type(registry, interner, *elem))
        }
        Type::Struct { name, .. } => format!("%struct.{}", interner.resolve(*name)),
        // Function values never materialize; calls go direct to symbols.
        Type::Function { .. } => "i8*".to_string(),
    }
}

/// LLVM type for memory slots holding `ty`.
pub fn storage_type(registry: &TypeRegistry, interner: &Interner, ty: TypeId) -> String {
    match registry.get(ty) {
        Type::Bool => "i8".to_string(),
        _ => value_type(registry, interner, ty),
    }
}

/// Zero constant for a *value* of `ty`, used for default returns.
pub fn zero_value(registry: &TypeRegistry, ty: TypeId) -> &'static str {
    match registry.get(ty) {
        Type::Int => "0",
        Type::Float => "0x0000000000000000",
        Type::Bool => "false",
        Type::Str | Type::Function { .. } => "null",
        Type::Array { len: DYNAMIC_LEN, .. } => "null",
        Type::Array { .. } | Type::Struct { .. } => "zeroinitializer",
        Type::Void | Type::Error => "",
    }
}

/// Zero constant for a *memory slot* of `ty`, used for default
/// initialization of locals and globals.
pub fn zero_storage(registry: &TypeRegistry, ty: TypeId) -> &'static str {
    match registry.get(ty) {
        Type::Bool => "0",
        _ => zero_value(registry, ty),
    }
}

/// Renders an `f64` as an LLVM hexadecimal float constant.
///
/// The bit-pattern form avoids every decimal round-trip question: the
/// constant is the value, digit for digit.
pub fn float_constant(value: f64) -> String {
    format!("0x{:016X}", value.to_bits())
}

/// Escapes decoded string contents for a `c"…"` array constant.
///
/// Printable ASCII passes through; quotes, backslashes, and everything
/// else become `\XX` hex escapes. The caller appends the trailing `\00`.
pub fn escape_string(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    for byte in content.bytes() {
        match byte {
            0x20..=0x7E if byte != b'"' && byte != b'\\' => out.push(byte as char),
            _ => out.push_str(&format!("\\{:02X}", byte)),
        }
    }
    out
}
