//! C interpreter execution engine
//!
//! This module provides the runtime half of the pipeline:
//! - [`engine`]: the [`Interpreter`], owner of the program, memory and frames
//! - [`errors`]: Runtime error types
//! - [`control`]: pause / step / abort checkpoints
//! - [`visualizer`]: structural events for an external memory view
//!
//! # Execution Model
//!
//! Every variable lives at an address in a simulated [`MemorySpace`]. A call
//! allocates fresh storage for each of the callee's locals on entry and frees
//! it on exit, so each level of a recursion owns its own copies. Expressions
//! are evaluated by the resolver in `solve`, which reads and writes only
//! through the memory space so every mutation reaches the write callback.
//!
//! # Built-in Functions
//!
//! `malloc`, `free`, `highlight_index` and `clear_highlight` are compiled
//! into every program as functions whose body is a single terminal
//! instruction, and are called through the same protocol as user code.
//!
//! [`MemorySpace`]: crate::memory::MemorySpace

mod array_assign;
mod builtins;
mod call;
pub mod control;
pub mod engine;
pub mod errors;
mod solve;
mod statements;
pub mod visualizer;

pub use control::{AbortHandle, Control, ExecutionControl, FreeRun, StepCommand, Stepper};
pub use engine::Interpreter;
pub use errors::{ExecError, RuntimeError};
pub use visualizer::{NoVisualizer, TracingVisualizer, Visualizer};
