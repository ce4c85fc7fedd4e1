// Typed scalar values

use super::{Address, Word};
use crate::compiler::types::Type;
use std::fmt;

/// A concrete value together with the static type it was produced at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedValue {
    pub ty: Type,
    pub value: Word,
}

impl TypedValue {
    pub fn new(ty: Type, value: Word) -> Self {
        TypedValue { ty, value }
    }

    pub fn int(value: Word) -> Self {
        TypedValue::new(Type::int(), value)
    }

    pub fn pointer(ty: Type, address: Address) -> Self {
        TypedValue::new(ty, address as Word)
    }

    pub fn is_truthy(&self) -> bool {
        self.value != 0
    }

    pub fn as_address(&self) -> Address {
        self.value as Address
    }

    /// Convert for storage at `ty`: `char` keeps the low byte, sign-extended
    pub fn converted_to(&self, ty: &Type) -> TypedValue {
        let value = if ty.is_char() {
            self.value as i8 as Word
        } else {
            self.value
        };
        TypedValue::new(ty.clone(), value)
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ty.is_pointer() {
            if self.value == 0 {
                write!(f, "NULL")
            } else {
                write!(f, "0x{:08x}", self.as_address())
            }
        } else {
            write!(f, "{}", self.value)
        }
    }
}
