//! Runtime error types
//!
//! This module defines [`RuntimeError`], which represents every failure that
//! can occur while a compiled program executes, and [`ExecError`], which
//! separates those from a deliberate abort.
//!
//! All runtime errors are fatal to the current run: the call stack unwinds,
//! every frame is torn down, and the error is surfaced to the caller of
//! [`run`](crate::interpreter::Interpreter::run).

use crate::compiler::CompileError;
use crate::memory::{Address, MemoryError, Word};
use crate::parser::ast::SourceLocation;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    /// `array = {...}` whose destination does not resolve to an array
    #[error("array-assign: destination is not an array")]
    ArrayAssignTarget { location: SourceLocation },

    /// Non-void function finished without `return value;`
    #[error("execution of function '{function}' did not return any value")]
    MissingReturnValue { function: String },

    #[error("{error}")]
    Memory {
        error: MemoryError,
        location: SourceLocation,
    },

    #[error("null pointer dereference")]
    NullDereference { location: SourceLocation },

    #[error("division by zero")]
    DivisionByZero { location: SourceLocation },

    #[error("integer overflow in '{operation}'")]
    IntegerOverflow {
        operation: &'static str,
        location: SourceLocation,
    },

    #[error("free(): 0x{address:08x} is not a live heap block")]
    InvalidFree {
        address: Address,
        location: SourceLocation,
    },

    #[error("malloc(): invalid size {size}")]
    InvalidMallocSize { size: Word, location: SourceLocation },

    #[error("stack overflow: call depth limit of {limit} exceeded")]
    StackOverflow {
        limit: usize,
        location: SourceLocation,
    },

    #[error("entry point '{name}' is not defined")]
    NoEntryPoint { name: String },

    #[error("function '{function}' expects {expected} argument(s), got {got}")]
    ArgumentCountMismatch {
        function: String,
        expected: usize,
        got: usize,
    },

    /// A deferred initializer failed to lower against the running frame
    #[error("{0}")]
    Lowering(CompileError),

    #[error("cannot use a value of type '{ty}' here")]
    UnsupportedValue {
        ty: String,
        location: SourceLocation,
    },

    #[error("expression does not designate a memory location")]
    NotAddressable { location: SourceLocation },

    #[error("'{name}' has no storage bound in the current frame")]
    Unbound {
        name: String,
        location: SourceLocation,
    },

    #[error("function '{name}' has no body")]
    UndefinedFunction { name: String },
}

impl RuntimeError {
    pub fn memory(error: MemoryError, location: SourceLocation) -> Self {
        RuntimeError::Memory { error, location }
    }

    /// Source position of the failing construct, when there is one
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            RuntimeError::ArrayAssignTarget { location }
            | RuntimeError::Memory { location, .. }
            | RuntimeError::NullDereference { location }
            | RuntimeError::DivisionByZero { location }
            | RuntimeError::IntegerOverflow { location, .. }
            | RuntimeError::InvalidFree { location, .. }
            | RuntimeError::InvalidMallocSize { location, .. }
            | RuntimeError::StackOverflow { location, .. }
            | RuntimeError::UnsupportedValue { location, .. }
            | RuntimeError::NotAddressable { location }
            | RuntimeError::Unbound { location, .. } => Some(*location),
            RuntimeError::Lowering(error) => Some(error.location),
            RuntimeError::MissingReturnValue { .. }
            | RuntimeError::NoEntryPoint { .. }
            | RuntimeError::ArgumentCountMismatch { .. }
            | RuntimeError::UndefinedFunction { .. } => None,
        }
    }
}

/// Why a run stopped early
#[derive(Debug, Clone, Error)]
pub enum ExecError {
    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    /// Cancelled from outside; not a failure of the program
    #[error("execution aborted")]
    Aborted,
}

impl ExecError {
    pub fn is_abort(&self) -> bool {
        matches!(self, ExecError::Aborted)
    }

    pub fn runtime(&self) -> Option<&RuntimeError> {
        match self {
            ExecError::Runtime(error) => Some(error),
            ExecError::Aborted => None,
        }
    }
}
