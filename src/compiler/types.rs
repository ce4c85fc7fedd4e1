//! Static types and type compatibility
//!
//! A type is a base name plus a pointer-indirection count. Its textual form is
//! the C spelling with `*` markers appended (`int`, `char*`, `struct No*`),
//! which is what compilation errors print.
//!
//! Array variables do not get a distinct type: an array of `T` is stored with
//! the internal type `T*` and flagged as an array on its symbol or member.
//! Element sizes are always derived from that type by stripping one `*`.

use crate::memory::{CHAR_SIZE, INT_SIZE, POINTER_SIZE};
use crate::parser::ast::TypeName;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BaseType {
    Int,
    Char,
    Void,
    Struct(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Type {
    pub base: BaseType,
    pub pointer_depth: usize,
}

impl Type {
    pub fn new(base: BaseType) -> Self {
        Type {
            base,
            pointer_depth: 0,
        }
    }

    pub fn from_name(name: &TypeName, pointers: usize) -> Self {
        let base = match name {
            TypeName::Int => BaseType::Int,
            TypeName::Char => BaseType::Char,
            TypeName::Void => BaseType::Void,
            TypeName::Struct(s) => BaseType::Struct(s.clone()),
        };
        Type {
            base,
            pointer_depth: pointers,
        }
    }

    pub fn int() -> Self {
        Type::new(BaseType::Int)
    }

    pub fn char() -> Self {
        Type::new(BaseType::Char)
    }

    pub fn void() -> Self {
        Type::new(BaseType::Void)
    }

    pub fn void_pointer() -> Self {
        Type::void().with_pointer()
    }

    pub fn with_pointer(mut self) -> Self {
        self.pointer_depth += 1;
        self
    }

    /// The pointee type, or `None` if this is not a pointer
    pub fn deref(&self) -> Option<Type> {
        if self.pointer_depth == 0 {
            return None;
        }
        Some(Type {
            base: self.base.clone(),
            pointer_depth: self.pointer_depth - 1,
        })
    }

    pub fn is_pointer(&self) -> bool {
        self.pointer_depth > 0
    }

    pub fn is_void(&self) -> bool {
        self.pointer_depth == 0 && self.base == BaseType::Void
    }

    pub fn is_void_pointer(&self) -> bool {
        self.pointer_depth == 1 && self.base == BaseType::Void
    }

    pub fn is_char(&self) -> bool {
        self.pointer_depth == 0 && self.base == BaseType::Char
    }

    /// `int` or `char`
    pub fn is_arithmetic(&self) -> bool {
        self.pointer_depth == 0 && matches!(self.base, BaseType::Int | BaseType::Char)
    }

    /// Values that fit in a single memory word or byte
    pub fn is_scalar(&self) -> bool {
        self.is_pointer() || self.is_arithmetic()
    }

    /// Struct name when this is a (non-pointer) struct type
    pub fn struct_name(&self) -> Option<&str> {
        match &self.base {
            BaseType::Struct(name) if self.pointer_depth == 0 => Some(name),
            _ => None,
        }
    }

    /// Size of types whose width does not depend on a struct layout
    pub fn fixed_size(&self) -> Option<u32> {
        if self.is_pointer() {
            return Some(POINTER_SIZE);
        }
        match self.base {
            BaseType::Int => Some(INT_SIZE),
            BaseType::Char => Some(CHAR_SIZE),
            BaseType::Void | BaseType::Struct(_) => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.base {
            BaseType::Int => write!(f, "int")?,
            BaseType::Char => write!(f, "char")?,
            BaseType::Void => write!(f, "void")?,
            BaseType::Struct(name) => write!(f, "struct {}", name)?,
        }
        for _ in 0..self.pointer_depth {
            write!(f, "*")?;
        }
        Ok(())
    }
}

/// Whether a value of type `src` may be stored into a location of type `dst`
///
/// Identical types are compatible, `int` and `char` convert freely, and
/// `void*` converts to and from any pointer type.
pub fn is_assignable(dst: &Type, src: &Type) -> bool {
    if dst == src {
        return true;
    }
    if dst.is_arithmetic() && src.is_arithmetic() {
        return true;
    }
    dst.is_pointer() && src.is_pointer() && (dst.is_void_pointer() || src.is_void_pointer())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strukt(name: &str) -> Type {
        Type::new(BaseType::Struct(name.to_string()))
    }

    #[test]
    fn test_pointer_sizes_are_constant() {
        for base in [Type::int(), Type::char(), Type::void(), strukt("No")] {
            let mut ty = base;
            for _ in 0..3 {
                ty = ty.with_pointer();
                assert_eq!(ty.fixed_size(), Some(POINTER_SIZE), "{}", ty);
            }
        }
    }

    #[test]
    fn test_base_sizes() {
        assert_eq!(Type::int().fixed_size(), Some(4));
        assert_eq!(Type::char().fixed_size(), Some(1));
        assert_eq!(Type::void().fixed_size(), None);
        assert_eq!(strukt("No").fixed_size(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Type::int().to_string(), "int");
        assert_eq!(Type::char().with_pointer().to_string(), "char*");
        assert_eq!(strukt("No").with_pointer().with_pointer().to_string(), "struct No**");
    }

    #[test]
    fn test_assignability() {
        let int_ptr = Type::int().with_pointer();
        let char_ptr = Type::char().with_pointer();
        assert!(is_assignable(&Type::int(), &Type::char()));
        assert!(is_assignable(&Type::char(), &Type::int()));
        assert!(is_assignable(&int_ptr, &Type::void_pointer()));
        assert!(is_assignable(&Type::void_pointer(), &char_ptr));
        assert!(!is_assignable(&int_ptr, &char_ptr));
        assert!(!is_assignable(&Type::int(), &int_ptr));
        assert!(!is_assignable(&int_ptr, &Type::int()));
        assert!(!is_assignable(&strukt("A"), &strukt("B")));
        assert!(is_assignable(&strukt("A"), &strukt("A")));
    }

    #[test]
    fn test_deref() {
        let pp = Type::int().with_pointer().with_pointer();
        assert_eq!(pp.deref(), Some(Type::int().with_pointer()));
        assert_eq!(Type::int().deref(), None);
    }
}
