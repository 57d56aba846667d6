//! Type representations and the per-compile type registry.
//!
//! Types are interned the same way strings are: the registry stores each
//! distinct [`Type`] once and hands out `Copy` [`TypeId`] handles, which is
//! what AST nodes and symbol entries carry. Interning makes structural
//! equality an id comparison, and nominal struct identity falls out for
//! free because a struct name can only ever be registered once.
//!
//! The registry is per-compile, not process-wide; sharing across a
//! multi-file compile happens by passing the same registry to each unit.
//!
//! # Seeding
//!
//! A fresh registry holds the five primitives plus the error sentinel at
//! fixed ids ([`TypeId::INT`] …), and maps the primitive type names
//! (`int`, `float`, `string`, `bool`, `void`) for identifier resolution.
//! Type names are ordinary identifiers at the token level; this mapping is
//! where `int` first means something.

use staticlang_base::{Interner, Name};
use std::collections::HashMap;

/// Array length marker for dynamic arrays, which lower to a bare pointer.
pub const DYNAMIC_LEN: i64 = -1;

/// A type expression, stored once in the [`TypeRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// 64-bit signed integer.
    Int,
    /// 64-bit IEEE-754 float.
    Float,
    /// 1-bit truth value, stored in one byte.
    Bool,
    /// Pointer to NUL-terminated bytes.
    Str,
    Void,
    /// Sentinel for expressions whose type could not be determined.
    /// Propagates without producing further diagnostics.
    Error,
    /// Fixed (`len >= 0`) or dynamic (`len == DYNAMIC_LEN`) array.
    Array { elem: TypeId, len: i64 },
    /// Nominal struct: field order is part of the layout.
    Struct { name: Name, fields: Vec<(Name, TypeId)> },
    Function { params: Vec<TypeId>, ret: TypeId },
}

/// A `Copy` handle to an interned [`Type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(u32);

impl TypeId {
    pub const INT: TypeId = TypeId(0);
    pub const FLOAT: TypeId = TypeId(1);
    pub const BOOL: TypeId = TypeId(2);
    pub const STRING: TypeId = TypeId(3);
    pub const VOID: TypeId = TypeId(4);
    pub const ERROR: TypeId = TypeId(5);

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// `true` for the error sentinel.
    pub fn is_error(self) -> bool {
        self == TypeId::ERROR
    }
}

/// Number of pre-seeded entries; everything past this is per-compile.
const SEEDED: usize = 6;

/// Interns types and answers questions about them.
pub struct TypeRegistry {
    types: Vec<Type>,
    dedup: HashMap<Type, TypeId>,
    by_name: HashMap<Name, TypeId>,
}

impl TypeRegistry {
    /// Creates a registry seeded with the primitives and their names.
    pub fn new(interner: &mut Interner) -> Self {
        let mut registry = Self {
            types: Vec::new(),
            dedup: HashMap::new(),
            by_name: HashMap::new(),
        };
        for ty in [Type::Int, Type::Float, Type::Bool, Type::Str, Type::Void, Type::Error] {
            let id = TypeId(registry.types.len() as u32);
            registry.dedup.insert(ty.clone(), id);
            registry.types.push(ty);
        }
        for (name, id) in [
            ("int", TypeId::INT),
            ("float", TypeId::FLOAT),
            ("bool", TypeId::BOOL),
            ("string", TypeId::STRING),
            ("void", TypeId::VOID),
        ] {
            registry.by_name.insert(interner.intern(name), id);
        }
        registry
    }

    /// Interns a type, returning the existing id when it is already known.
    pub fn intern(&mut self, ty: Type) -> TypeId {
        if let Some(&id) = self.dedup.get(&ty) {
            return id;
        }
        let id = TypeId(self.types.len() as u32);
        self.dedup.insert(ty.clone(), id);
        self.types.push(ty);
        id
    }

    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.index()]
    }

    /// Resolves a type name (primitive or struct).
    pub fn lookup_name(&self, name: Name) -> Option<TypeId> {
        self.by_name.get(&name).copied()
    }

    /// Registers a struct type under its declared name.
    ///
    /// Returns `None` if the name already denotes a type; the caller turns
    /// that into a Semantic diagnostic and the first declaration wins.
    pub fn register_struct(&mut self, name: Name, fields: Vec<(Name, TypeId)>) -> Option<TypeId> {
        if self.by_name.contains_key(&name) {
            return None;
        }
        let id = self.intern(Type::Struct { name, fields });
        self.by_name.insert(name, id);
        Some(id)
    }

    pub fn array_of(&mut self, elem: TypeId, len: i64) -> TypeId {
        self.intern(Type::Array { elem, len })
    }

    pub fn function_of(&mut self, params: Vec<TypeId>, ret: TypeId) -> TypeId {
        self.intern(Type::Function { params, ret })
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Structural equality for basic/array/function types, nominal for
    /// structs. Interning collapses both cases to an id comparison.
    pub fn equals(&self, a: TypeId, b: TypeId) -> bool {
        a == b
    }

    /// Whether a value of type `src` may be stored where `dst` is expected.
    ///
    /// Equal types are always assignable. Additionally, a dynamic array
    /// accepts any array (fixed or dynamic) of the same element type.
    pub fn assignable_from(&self, dst: TypeId, src: TypeId) -> bool {
        if dst == src {
            return true;
        }
        match (self.get(dst), self.get(src)) {
            (
                Type::Array { elem: dst_elem, len: DYNAMIC_LEN },
                Type::Array { elem: src_elem, .. },
            ) => dst_elem == src_elem,
            _ => false,
        }
    }

    /// Logical size in bytes: pointers and 64-bit scalars are 8, Bool is 1,
    /// Void is 0, fixed arrays and structs sum their parts with no padding.
    pub fn size_of(&self, id: TypeId) -> usize {
        match self.get(id) {
            Type::Int | Type::Float | Type::Str | Type::Function { .. } => 8,
            Type::Bool => 1,
            Type::Void | Type::Error => 0,
            Type::Array { len: DYNAMIC_LEN, .. } => 8,
            Type::Array { elem, len } => *len as usize * self.size_of(*elem),
            Type::Struct { fields, .. } => {
                fields.iter().map(|(_, ty)| self.size_of(*ty)).sum()
            }
        }
    }

    pub fn is_numeric(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Int | Type::Float)
    }

    /// Types valid under `==` / `!=`.
    pub fn is_comparable(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Int | Type::Float | Type::Bool | Type::Str)
    }

    /// Types `print` accepts as arguments.
    pub fn is_printable(&self, id: TypeId) -> bool {
        self.is_comparable(id)
    }

    /// Renders a type for diagnostics, e.g. `[3]int` or `func(int) -> bool`.
    pub fn display(&self, id: TypeId, interner: &Interner) -> String {
        match self.get(id) {
            Type::Int => "int".to_string(),
            Type::Float => "float".to_string(),
            Type::Bool => "bool".to_string(),
            Type::Str => "string".to_string(),
            Type::Void => "void".to_string(),
            Type::Error => "<error>".to_string(),
            Type::Array { elem, len: DYNAMIC_LEN } => {
                format!("[]{}", self.display(*elem, interner))
            }
            Type::Array { elem, len } => format!("[{}]{}", len, self.display(*elem, interner)),
            Type::Struct { name, .. } => interner.resolve(*name).to_string(),
            Type::Function { params, ret } => {
                let params: Vec<String> =
                    params.iter().map(|p| self.display(*p, interner)).collect();
                format!("func({}) -> {}", params.join(", "), self.display(*ret, interner))
            }
        }
    }

    /// Field index and type for a struct member, if present.
    pub fn struct_field(&self, id: TypeId, field: Name) -> Option<(usize, TypeId)> {
        match self.get(id) {
            Type::Struct { fields, .. } => fields
                .iter()
                .position(|(name, _)| *name == field)
                .map(|i| (i, fields[i].1)),
            _ => None,
        }
    }

    /// Drops every per-compile type, keeping the seeded primitives and
    /// their name bindings.
    pub fn reset(&mut self) {
        self.types.truncate(SEEDED);
        self.dedup.retain(|_, id| id.index() < SEEDED);
        self.by_name.retain(|_, id| id.index() < SEEDED);
    }
}
