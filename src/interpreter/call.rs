//! Call protocol shared by user functions and builtins
//!
//! A call evaluates its arguments left to right, opens a frame, allocates
//! every local in declaration order, binds the parameters through ordinary
//! assignments, runs the body, and tears the frame down in reverse
//! allocation order. Teardown happens on every exit path: normal return,
//! runtime error, and abort alike.

use crate::compiler::symbols::{Function, FunctionBody, FunctionId, Program};
use crate::interpreter::engine::{ControlFlow, Interpreter};
use crate::interpreter::errors::{ExecError, RuntimeError};
use crate::ir::Expr;
use crate::memory::TypedValue;
use crate::parser::ast::SourceLocation;
use std::sync::Arc;

impl Interpreter {
    /// Evaluate `args` and call `function` with them
    pub(super) fn call_function(
        &mut self,
        function: FunctionId,
        args: &[Expr],
        location: SourceLocation,
    ) -> Result<Option<TypedValue>, ExecError> {
        let name = self.program.function(function).name.clone();
        self.call_stack.push(name);

        let result = self
            .solve_arguments(args)
            .and_then(|values| self.invoke(function, values, location));

        self.call_stack.pop();
        result
    }

    fn solve_arguments(&mut self, args: &[Expr]) -> Result<Vec<TypedValue>, ExecError> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.solve(arg)?);
        }
        Ok(values)
    }

    /// Run `function` with already evaluated arguments
    pub(super) fn invoke(
        &mut self,
        function: FunctionId,
        args: Vec<TypedValue>,
        location: SourceLocation,
    ) -> Result<Option<TypedValue>, ExecError> {
        if self.frames.depth() >= self.config.max_call_depth {
            return Err(RuntimeError::StackOverflow {
                limit: self.config.max_call_depth,
                location,
            }
            .into());
        }

        let program = Arc::clone(&self.program);
        let descriptor = program.function(function);
        tracing::debug!(
            function = %descriptor.name,
            depth = self.frames.depth() + 1,
            "call"
        );

        self.frames.push_frame(function, &descriptor.name);
        let outcome = self
            .enter_frame(&program, descriptor, args)
            .and_then(|()| self.run_body(descriptor, location));
        let teardown = self.teardown_frame(descriptor);
        let returned = self.pending_return.take();
        self.control_flow = ControlFlow::Normal;

        outcome?;
        teardown?;

        if !descriptor.returns_value() {
            return Ok(None);
        }
        match returned {
            Some(value) => {
                tracing::debug!(function = %descriptor.name, value = value.value, "return");
                Ok(Some(value.converted_to(&descriptor.return_type)))
            }
            None => Err(RuntimeError::MissingReturnValue {
                function: descriptor.name.clone(),
            }
            .into()),
        }
    }

    /// Allocate every local of the new frame and bind the parameters
    fn enter_frame(
        &mut self,
        program: &Program,
        descriptor: &Function,
        args: Vec<TypedValue>,
    ) -> Result<(), ExecError> {
        for &local in &descriptor.locals {
            let symbol = program.symbol(local);
            let address = self
                .memory
                .allocate(symbol.size)
                .map_err(|e| RuntimeError::memory(e, symbol.declared_at))?;
            if self.frames.bind(local, address, symbol.size).is_none() {
                let _ = self.memory.free(address);
                return Err(RuntimeError::Unbound {
                    name: symbol.name.clone(),
                    location: symbol.declared_at,
                }
                .into());
            }
            self.register_array(symbol, address)?;
        }

        for (&param, value) in descriptor.params.iter().zip(args) {
            let symbol = program.symbol(param);
            let at = symbol.declared_at;
            let bind = Expr::assign(
                Expr::var(param, symbol.ty.clone(), at),
                Expr::constant(value.value, value.ty, at),
            );
            self.execute(&bind)?;
        }

        self.visualizer.frame_entered(&self.frames, &self.memory);
        Ok(())
    }

    fn run_body(&mut self, descriptor: &Function, location: SourceLocation) -> Result<(), ExecError> {
        match &descriptor.body {
            FunctionBody::Compiled(body) => self.execute_statement(body),
            FunctionBody::Builtin(op) => self.run_builtin(*op, location),
            FunctionBody::Declared => Err(RuntimeError::UndefinedFunction {
                name: descriptor.name.clone(),
            }
            .into()),
        }
    }

    /// Pop the innermost frame and free its locals, last allocated first
    fn teardown_frame(&mut self, descriptor: &Function) -> Result<(), RuntimeError> {
        let Some(frame) = self.frames.pop_frame() else {
            return Ok(());
        };

        let mut result = Ok(());
        for binding in frame.bindings().iter().rev() {
            if let Err(error) = self.memory.free(binding.address) {
                tracing::warn!(%error, function = %frame.name, "failed to release local");
                if result.is_ok() {
                    result = Err(RuntimeError::memory(error, descriptor.defined_at));
                }
            }
        }
        self.visualizer.frame_exited(&frame.name);
        result
    }
}
