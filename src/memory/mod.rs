//! Memory model for the interpreter
//!
//! This module provides the core memory abstractions:
//! - [`space`]: the simulated byte-addressable address space (allocate, free,
//!   raw and "safe" reads and writes, write notifications)
//! - [`stack`]: the call-frame arena binding symbols to addresses per call
//! - [`value`]: typed scalar values produced by the resolver
//!
//! # Type Sizes
//!
//! Sizes are fixed and platform-independent:
//! - `int`: 4 bytes
//! - `char`: 1 byte
//! - pointer: 4 bytes, regardless of pointee type
//! - `struct`: sum of member sizes (no padding or alignment)
//!
//! Words are stored little-endian.

pub mod space;
pub mod stack;
pub mod value;

pub use space::{MemoryError, MemorySpace, WriteCallback};
pub use stack::{Binding, CallFrames, Frame};
pub use value::TypedValue;

/// A location in the simulated address space; 0 is `NULL`
pub type Address = u32;

/// The interpreter's integer width
pub type Word = i32;

pub const INT_SIZE: u32 = 4;
pub const CHAR_SIZE: u32 = 1;
pub const POINTER_SIZE: u32 = 4;

/// Lowest address ever handed out, so that small integers never look like live pointers
pub const ADDRESS_SPACE_START: Address = 0x0000_1000;

/// Default size of the address space in bytes
pub const DEFAULT_CAPACITY: u32 = 1024 * 1024;
