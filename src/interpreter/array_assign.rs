// `array = { v1, v2, ... }`

use crate::compiler::types::Type;
use crate::compiler::{Compiler, NameScope};
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::{ExecError, RuntimeError};
use crate::interpreter::solve::{Place, Resolved};
use crate::ir::Expr;
use crate::memory::{Address, CHAR_SIZE, INT_SIZE};
use crate::parser::ast::{AstNode, SourceLocation};
use std::sync::Arc;

impl Interpreter {
    /// Lower, evaluate and store each initializer in order, returning the array base
    ///
    /// Values are lowered one at a time against the running frame, so a later
    /// initializer observes the side effects of the earlier ones.
    pub(super) fn array_assign(
        &mut self,
        dst: &Expr,
        values: &[AstNode],
        scope: &NameScope,
        at: SourceLocation,
    ) -> Result<Address, ExecError> {
        let base = match self.execute(dst)? {
            Resolved::Place(place) if place.array => place,
            _ => return Err(RuntimeError::ArrayAssignTarget { location: at }.into()),
        };
        let function = self
            .frames
            .current()
            .map(|frame| frame.function)
            .ok_or(RuntimeError::ArrayAssignTarget { location: at })?;

        let element = base.ty.deref().unwrap_or_else(Type::int);
        let element_size = if element.is_char() { CHAR_SIZE } else { INT_SIZE };

        let registry = Arc::clone(&self.registry);
        let program = Arc::clone(&self.program);
        for (index, node) in values.iter().enumerate() {
            let expr = Compiler::for_runtime(&registry, &program, function, scope)
                .compile_expr(node)
                .map_err(RuntimeError::Lowering)?;
            let value = self.solve(&expr)?;

            let slot = Place::new(base.address + index as u32 * element_size, element.clone());
            self.store(&slot, &value.converted_to(&element), node.starts_at)?;
        }
        Ok(base.address)
    }
}
