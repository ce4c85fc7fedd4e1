//! Value resolver
//!
//! [`Interpreter::execute`] runs the instruction carried by an IR node and
//! reports what it produced: either a finished value or a place in memory.
//! [`Interpreter::solve`] goes one step further and loads a place.
//!
//! Each call executes the node exactly once. Nothing is cached on the IR, so
//! the same node can be evaluated again on the next loop iteration or call.
//!
//! Loading an array place yields the array's base address instead of reading
//! memory (array-to-pointer decay).

use crate::compiler::constant::fold_binary;
use crate::compiler::types::Type;
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::{ExecError, RuntimeError};
use crate::ir::{Expr, ExprKind};
use crate::memory::{Address, MemoryError, TypedValue, Word, CHAR_SIZE, INT_SIZE};
use crate::parser::ast::{BinOp, SourceLocation, UnOp};
use std::sync::Arc;

/// A typed memory location
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Place {
    pub address: Address,
    pub ty: Type,
    /// Whole array: loads decay to `address`
    pub array: bool,
}

impl Place {
    pub fn new(address: Address, ty: Type) -> Self {
        Place {
            address,
            ty,
            array: false,
        }
    }
}

/// Result of executing an IR node
#[derive(Debug, Clone)]
pub(crate) enum Resolved {
    Value(TypedValue),
    Place(Place),
}

impl Interpreter {
    /// Execute `expr` and reduce it to a value
    pub(super) fn solve(&mut self, expr: &Expr) -> Result<TypedValue, ExecError> {
        let resolved = self.execute(expr)?;
        Ok(self.load(resolved, expr.location)?)
    }

    /// Execute `expr`, which must designate a memory location
    pub(super) fn place(&mut self, expr: &Expr) -> Result<Place, ExecError> {
        match self.execute(expr)? {
            Resolved::Place(place) => Ok(place),
            Resolved::Value(_) => Err(RuntimeError::NotAddressable {
                location: expr.location,
            }
            .into()),
        }
    }

    /// Run the instruction carried by `expr`
    pub(super) fn execute(&mut self, expr: &Expr) -> Result<Resolved, ExecError> {
        let at = expr.location;
        let resolved = match &expr.kind {
            ExprKind::Const(value) => Resolved::Value(TypedValue::new(expr.ty.clone(), *value)),

            ExprKind::Str(id) => {
                let address = self.strings.get(id).copied().ok_or_else(|| {
                    RuntimeError::Unbound {
                        name: format!("\"{}\"", self.program.string(*id)),
                        location: at,
                    }
                })?;
                Resolved::Value(TypedValue::pointer(expr.ty.clone(), address))
            }

            ExprKind::Var(id) => {
                let address = self.frames.address_of(*id).ok_or_else(|| RuntimeError::Unbound {
                    name: self.program.symbol(*id).name.clone(),
                    location: at,
                })?;
                Resolved::Place(Place {
                    address,
                    ty: expr.ty.clone(),
                    array: self.program.symbol(*id).is_array(),
                })
            }

            ExprKind::Member {
                object,
                offset,
                array,
            } => {
                let object = self.place(object)?;
                Resolved::Place(Place {
                    address: displaced(object.address, *offset, access_width(&expr.ty), at)?,
                    ty: expr.ty.clone(),
                    array: array.is_some(),
                })
            }

            ExprKind::Deref(pointer) => {
                let pointer = self.solve(pointer)?;
                if pointer.value == 0 {
                    return Err(RuntimeError::NullDereference { location: at }.into());
                }
                Resolved::Place(Place::new(pointer.as_address(), expr.ty.clone()))
            }

            ExprKind::Index { base, index, scale } => {
                let base = self.solve(base)?;
                let index = self.solve(index)?;
                if base.value == 0 {
                    return Err(RuntimeError::NullDereference { location: at }.into());
                }
                let address = offset_address(&base, index.value, *scale, false, at)?;
                Resolved::Place(Place::new(address, expr.ty.clone()))
            }

            ExprKind::AddrOf(operand) => {
                let place = self.place(operand)?;
                Resolved::Value(TypedValue::pointer(expr.ty.clone(), place.address))
            }

            ExprKind::Unary { op, operand } => {
                let operand = self.solve(operand)?;
                let value = match op {
                    UnOp::Neg => operand.value.checked_neg().ok_or(RuntimeError::IntegerOverflow {
                        operation: "-",
                        location: at,
                    })?,
                    UnOp::Not => (operand.value == 0) as Word,
                    UnOp::Deref | UnOp::AddrOf => {
                        return Err(RuntimeError::NotAddressable { location: at }.into())
                    }
                };
                Resolved::Value(TypedValue::new(expr.ty.clone(), value))
            }

            ExprKind::Binary { op, left, right } => {
                let value = self.binary(*op, left, right, at)?;
                Resolved::Value(TypedValue::new(expr.ty.clone(), value))
            }

            ExprKind::PointerOffset {
                pointer,
                offset,
                scale,
                subtract,
            } => {
                let pointer = self.solve(pointer)?;
                let offset = self.solve(offset)?;
                let address = offset_address(&pointer, offset.value, *scale, *subtract, at)?;
                Resolved::Value(TypedValue::pointer(expr.ty.clone(), address))
            }

            ExprKind::PointerDiff { left, right, scale } => {
                let left = self.solve(left)?;
                let right = self.solve(right)?;
                let bytes = left.as_address() as i64 - right.as_address() as i64;
                let elements = Word::try_from(bytes / (*scale).max(1) as i64).map_err(|_| {
                    RuntimeError::IntegerOverflow {
                        operation: "-",
                        location: at,
                    }
                })?;
                Resolved::Value(TypedValue::new(expr.ty.clone(), elements))
            }

            ExprKind::Call {
                function,
                args,
                struct_allocation,
            } => {
                let returned = self.call_function(*function, args, at)?;
                if let (Some(layout), Some(value)) = (struct_allocation, &returned) {
                    if value.value != 0 {
                        let program = Arc::clone(&self.program);
                        self.visualizer
                            .struct_instance(&program.struct_type(*layout).name, value.as_address());
                    }
                }
                Resolved::Value(returned.unwrap_or_else(|| TypedValue::new(Type::void(), 0)))
            }

            ExprKind::Assign { dst, src } => self.assign(dst, src, at)?,

            ExprKind::ArrayAssign { dst, values, scope } => {
                let base = self.array_assign(dst, values, scope, at)?;
                Resolved::Value(TypedValue::pointer(expr.ty.clone(), base))
            }
        };
        Ok(resolved)
    }

    /// Integer and logical operators; `&&` and `||` skip the right operand when decided
    fn binary(
        &mut self,
        op: BinOp,
        left: &Expr,
        right: &Expr,
        at: SourceLocation,
    ) -> Result<Word, ExecError> {
        let lhs = self.solve(left)?.value;
        match op {
            BinOp::And if lhs == 0 => return Ok(0),
            BinOp::Or if lhs != 0 => return Ok(1),
            _ => {}
        }
        let rhs = self.solve(right)?.value;
        if matches!(op, BinOp::Div | BinOp::Mod) && rhs == 0 {
            return Err(RuntimeError::DivisionByZero { location: at }.into());
        }
        fold_binary(op, lhs, rhs).ok_or_else(|| {
            RuntimeError::IntegerOverflow {
                operation: op.symbol(),
                location: at,
            }
            .into()
        })
    }

    /// Scalars yield the stored value; structs yield the destination so
    /// that `a = b = c` copies twice
    fn assign(&mut self, dst: &Expr, src: &Expr, at: SourceLocation) -> Result<Resolved, ExecError> {
        if let Some(name) = dst.ty.struct_name() {
            let size = self.program.size_of(&dst.ty).ok_or_else(|| RuntimeError::UnsupportedValue {
                ty: format!("struct {}", name),
                location: at,
            })?;
            let from = self.place(src)?;
            let to = self.place(dst)?;
            self.copy_bytes(from.address, to.address, size, at)?;
            return Ok(Resolved::Place(to));
        }

        let value = self.solve(src)?;
        let place = self.place(dst)?;
        let stored = value.converted_to(&place.ty);
        self.store(&place, &stored, at)?;
        Ok(Resolved::Value(stored))
    }

    fn copy_bytes(
        &mut self,
        from: Address,
        to: Address,
        size: u32,
        at: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let bytes = (0..size)
            .map(|i| {
                let address = displaced(from, i, 1, at)?;
                self.memory
                    .read(address)
                    .map_err(|e| RuntimeError::memory(e, at))
            })
            .collect::<Result<Vec<u8>, _>>()?;
        for (i, byte) in (0..size).zip(bytes) {
            let address = displaced(to, i, 1, at)?;
            self.memory
                .write(address, byte)
                .map_err(|e| RuntimeError::memory(e, at))?;
        }
        Ok(())
    }

    /// Reduce a resolved node to a value, reading memory for places
    pub(super) fn load(&self, resolved: Resolved, at: SourceLocation) -> Result<TypedValue, RuntimeError> {
        let place = match resolved {
            Resolved::Value(value) => return Ok(value),
            Resolved::Place(place) => place,
        };
        if place.array {
            return Ok(TypedValue::pointer(place.ty, place.address));
        }
        if !place.ty.is_scalar() {
            return Err(RuntimeError::UnsupportedValue {
                ty: place.ty.to_string(),
                location: at,
            });
        }
        let value = if place.ty.is_char() {
            self.memory
                .read(place.address)
                .map(|byte| byte as i8 as Word)
        } else {
            self.memory.read_word(place.address)
        }
        .map_err(|e| RuntimeError::memory(e, at))?;
        Ok(TypedValue::new(place.ty, value))
    }

    /// Write `value` at `place` with the place's width
    pub(super) fn store(
        &mut self,
        place: &Place,
        value: &TypedValue,
        at: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let written = if place.ty.is_char() {
            self.memory.write(place.address, value.value as u8)
        } else {
            self.memory.write_word(place.address, value.value)
        };
        written.map_err(|e| RuntimeError::memory(e, at))
    }
}

/// `base ± index * scale`, rejecting results outside the address range
fn offset_address(
    base: &TypedValue,
    index: Word,
    scale: u32,
    subtract: bool,
    at: SourceLocation,
) -> Result<Address, RuntimeError> {
    let delta = index as i64 * scale as i64;
    let address = if subtract {
        base.as_address() as i64 - delta
    } else {
        base.as_address() as i64 + delta
    };
    Address::try_from(address).map_err(|_| RuntimeError::IntegerOverflow {
        operation: if subtract { "-" } else { "+" },
        location: at,
    })
}

fn access_width(ty: &Type) -> u32 {
    if ty.is_char() {
        CHAR_SIZE
    } else {
        INT_SIZE
    }
}

/// `base + offset` for a field or byte within an object
///
/// Running past the end of the address range is an access to unmapped memory.
fn displaced(
    base: Address,
    offset: u32,
    width: u32,
    at: SourceLocation,
) -> Result<Address, RuntimeError> {
    base.checked_add(offset).ok_or(RuntimeError::Memory {
        error: MemoryError::Unmapped {
            address: base,
            width: width.max(1),
        },
        location: at,
    })
}
