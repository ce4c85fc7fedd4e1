//! Statement execution and loops (`while`, `do-while`, `for`).
//!
//! Every statement except a block passes through the execution-control
//! checkpoint first, which is where pausing, stepping and aborting happen.
//! `break` and `continue` are propagated via `LoopBodyResult` so the loop
//! drivers can react without inspecting `control_flow` themselves.

use crate::interpreter::engine::{ControlFlow, Interpreter};
use crate::interpreter::errors::ExecError;
use crate::ir::{Expr, Stmt, StmtKind};

/// How a loop body ended
pub(crate) enum LoopBodyResult {
    /// Ran to completion or hit `continue`: iterate again
    Continue,
    /// `break`: leave the loop normally
    Break,
    /// `return`: unwind and let the caller see `control_flow`
    Exit,
}

impl Interpreter {
    pub(super) fn execute_statement(&mut self, stmt: &Stmt) -> Result<(), ExecError> {
        if !matches!(stmt.kind, StmtKind::Block(_)) {
            self.checkpoint(stmt.location)?;
        }

        match &stmt.kind {
            StmtKind::Expr(expr) => {
                self.execute(expr)?;
            }
            StmtKind::Block(statements) => {
                for statement in statements {
                    self.execute_statement(statement)?;
                    if self.control_flow != ControlFlow::Normal {
                        break;
                    }
                }
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.solve(condition)?.is_truthy() {
                    self.execute_statement(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute_statement(else_branch)?;
                }
            }
            StmtKind::While { condition, body } => self.execute_while(condition, body)?,
            StmtKind::DoWhile { body, condition } => self.execute_do_while(body, condition)?,
            StmtKind::For {
                init,
                condition,
                increment,
                body,
            } => self.execute_for(init.as_ref(), condition.as_ref(), increment.as_ref(), body)?,
            StmtKind::Return(value) => {
                self.pending_return = match value {
                    Some(expr) => Some(self.solve(expr)?),
                    None => None,
                };
                self.control_flow = ControlFlow::Return;
            }
            StmtKind::Break => self.control_flow = ControlFlow::Break,
            StmtKind::Continue => self.control_flow = ControlFlow::Continue,
            StmtKind::Empty => {}
        }
        Ok(())
    }

    fn execute_loop_body(&mut self, body: &Stmt) -> Result<LoopBodyResult, ExecError> {
        self.execute_statement(body)?;
        let result = match self.control_flow {
            ControlFlow::Normal => LoopBodyResult::Continue,
            ControlFlow::Continue => {
                self.control_flow = ControlFlow::Normal;
                LoopBodyResult::Continue
            }
            ControlFlow::Break => {
                self.control_flow = ControlFlow::Normal;
                LoopBodyResult::Break
            }
            ControlFlow::Return => LoopBodyResult::Exit,
        };
        Ok(result)
    }

    fn execute_while(&mut self, condition: &Expr, body: &Stmt) -> Result<(), ExecError> {
        while self.solve(condition)?.is_truthy() {
            match self.execute_loop_body(body)? {
                LoopBodyResult::Continue => {}
                LoopBodyResult::Break | LoopBodyResult::Exit => break,
            }
        }
        Ok(())
    }

    fn execute_do_while(&mut self, body: &Stmt, condition: &Expr) -> Result<(), ExecError> {
        loop {
            match self.execute_loop_body(body)? {
                LoopBodyResult::Continue => {}
                LoopBodyResult::Break | LoopBodyResult::Exit => break,
            }
            if !self.solve(condition)?.is_truthy() {
                break;
            }
        }
        Ok(())
    }

    fn execute_for(
        &mut self,
        init: Option<&Expr>,
        condition: Option<&Expr>,
        increment: Option<&Expr>,
        body: &Stmt,
    ) -> Result<(), ExecError> {
        if let Some(init) = init {
            self.execute(init)?;
        }
        loop {
            if let Some(condition) = condition {
                if !self.solve(condition)?.is_truthy() {
                    break;
                }
            }
            match self.execute_loop_body(body)? {
                LoopBodyResult::Continue => {}
                LoopBodyResult::Break | LoopBodyResult::Exit => break,
            }
            if let Some(increment) = increment {
                self.execute(increment)?;
            }
        }
        Ok(())
    }
}
