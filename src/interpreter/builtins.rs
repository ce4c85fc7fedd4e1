//! Builtin library
//!
//! Builtins are ordinary [`Function`] descriptors whose body is a single
//! [`BuiltinOp`]. They are installed into every fresh [`Program`] before user
//! code compiles, so calls to them are type-checked and executed through the
//! same protocol as user functions: arguments are bound to real parameter
//! storage and the terminal instruction reads them back from there.
//!
//! - `void highlight_index(int *arr, int index, char *color)`
//! - `void clear_highlight(int *arr)`
//! - `void *malloc(int size)`
//! - `void free(void *ptr)`

use crate::compiler::symbols::{Function, FunctionBody, Program, Symbol, SymbolId};
use crate::compiler::types::Type;
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::{ExecError, RuntimeError};
use crate::ir::{BuiltinOp, Expr};
use crate::memory::{Address, TypedValue, POINTER_SIZE};
use crate::parser::ast::SourceLocation;

/// Longest colour name read from simulated memory
const MAX_COLOR_LENGTH: u32 = 20;

pub(crate) fn install(program: &mut Program) {
    let int_ptr = Type::int().with_pointer();

    let array = parameter(program, "arr", int_ptr.clone());
    let index = parameter(program, "index", Type::int());
    let color = parameter(program, "color", Type::char().with_pointer());
    define(
        program,
        "highlight_index",
        Type::void(),
        vec![array, index, color],
        BuiltinOp::HighlightIndex {
            array,
            index,
            color,
        },
    );

    let array = parameter(program, "arr", int_ptr);
    define(
        program,
        "clear_highlight",
        Type::void(),
        vec![array],
        BuiltinOp::ClearHighlight { array },
    );

    let size = parameter(program, "size", Type::int());
    define(
        program,
        "malloc",
        Type::void_pointer(),
        vec![size],
        BuiltinOp::Malloc { size },
    );

    let pointer = parameter(program, "ptr", Type::void_pointer());
    define(
        program,
        "free",
        Type::void(),
        vec![pointer],
        BuiltinOp::Free { pointer },
    );
}

fn parameter(program: &mut Program, name: &str, ty: Type) -> SymbolId {
    let size = ty.fixed_size().unwrap_or(POINTER_SIZE);
    program.add_symbol(Symbol {
        name: name.to_string(),
        ty,
        size,
        array: None,
        declared_at: SourceLocation::default(),
    })
}

fn define(program: &mut Program, name: &str, return_type: Type, params: Vec<SymbolId>, op: BuiltinOp) {
    program.add_function(Function {
        name: name.to_string(),
        return_type,
        locals: params.clone(),
        params,
        body: FunctionBody::Builtin(op),
        defined_at: SourceLocation::default(),
    });
}

impl Interpreter {
    /// Execute the terminal instruction of a builtin inside its own frame
    pub(super) fn run_builtin(&mut self, op: BuiltinOp, at: SourceLocation) -> Result<(), ExecError> {
        match op {
            BuiltinOp::HighlightIndex {
                array,
                index,
                color,
            } => {
                let array = self.argument(array, at)?.as_address();
                let index = self.argument(index, at)?.value;
                let color = self.argument(color, at)?.as_address();
                let color = self.read_string(color);
                self.visualizer.highlight_index(array, index, color.as_deref());
            }
            BuiltinOp::ClearHighlight { array } => {
                let array = self.argument(array, at)?.as_address();
                self.visualizer.clear_highlight(array);
            }
            BuiltinOp::Malloc { size } => {
                let size = self.argument(size, at)?.value;
                if size <= 0 {
                    return Err(RuntimeError::InvalidMallocSize { size, location: at }.into());
                }
                let address = self
                    .memory
                    .allocate(size as u32)
                    .map_err(|e| RuntimeError::memory(e, at))?;
                self.heap_blocks.insert(address);
                tracing::trace!(address, size, "malloc");
                self.pending_return = Some(TypedValue::pointer(Type::void_pointer(), address));
            }
            BuiltinOp::Free { pointer } => {
                let address = self.argument(pointer, at)?.as_address();
                if address == 0 {
                    return Ok(());
                }
                if !self.heap_blocks.remove(&address) {
                    return Err(RuntimeError::InvalidFree {
                        address,
                        location: at,
                    }
                    .into());
                }
                self.memory
                    .free(address)
                    .map_err(|e| RuntimeError::memory(e, at))?;
                tracing::trace!(address, "free");
            }
        }
        Ok(())
    }

    /// Current value of a builtin parameter
    fn argument(&mut self, symbol: SymbolId, at: SourceLocation) -> Result<TypedValue, ExecError> {
        let ty = self.program.symbol(symbol).ty.clone();
        self.solve(&Expr::var(symbol, ty, at))
    }

    /// NUL-terminated string at `address`; stops at unreadable memory
    fn read_string(&self, address: Address) -> Option<String> {
        if address == 0 {
            return None;
        }
        let bytes: Vec<u8> = (0..MAX_COLOR_LENGTH)
            .map_while(|i| address.checked_add(i).and_then(|a| self.memory.read_safe(a)))
            .take_while(|&byte| byte != 0)
            .collect();
        Some(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_registers_descriptors() {
        let mut program = Program::new();
        install(&mut program);

        let malloc = program.function(program.function_by_name("malloc").unwrap());
        assert!(malloc.is_builtin());
        assert_eq!(malloc.return_type, Type::void_pointer());
        assert_eq!(malloc.params.len(), 1);
        assert_eq!(malloc.locals, malloc.params);

        let highlight = program.function(program.function_by_name("highlight_index").unwrap());
        let types: Vec<String> = highlight
            .params
            .iter()
            .map(|p| program.symbol(*p).ty.to_string())
            .collect();
        assert_eq!(types, vec!["int*", "int", "char*"]);
        assert!(!highlight.returns_value());
    }
}
