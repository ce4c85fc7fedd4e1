//! Hooks for an external memory visualizer
//!
//! The interpreter reports structural events (arrays and struct instances
//! coming to life, highlight requests from the builtin library, frames
//! entering and leaving) through a [`Visualizer`]. Every method has an empty
//! default, so an implementation only overrides what it draws.
//!
//! Memory contents are not pushed; implementations read them from the views
//! passed to [`Visualizer::frame_entered`] or through a write callback on the
//! [`MemorySpace`].

use crate::compiler::types::Type;
use crate::memory::{Address, CallFrames, MemorySpace, Word};

#[allow(unused_variables)]
pub trait Visualizer {
    /// An array local or global received storage
    fn array_registered(&mut self, element: &Type, address: Address, length: u32) {}

    /// `malloc(sizeof(struct name))` returned `address`
    fn struct_instance(&mut self, name: &str, address: Address) {}

    /// `highlight_index(array, index, color)`
    fn highlight_index(&mut self, array: Address, index: Word, color: Option<&str>) {}

    /// `clear_highlight(array)`
    fn clear_highlight(&mut self, array: Address) {}

    /// A call's locals are allocated and its parameters bound
    fn frame_entered(&mut self, frames: &CallFrames, memory: &MemorySpace) {}

    /// A call's frame was torn down
    fn frame_exited(&mut self, function: &str) {}
}

/// Ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVisualizer;

impl Visualizer for NoVisualizer {}

/// Logs every event at `debug` level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingVisualizer;

impl Visualizer for TracingVisualizer {
    fn array_registered(&mut self, element: &Type, address: Address, length: u32) {
        tracing::debug!(%element, address, length, "array registered");
    }

    fn struct_instance(&mut self, name: &str, address: Address) {
        tracing::debug!(name, address, "struct instance");
    }

    fn highlight_index(&mut self, array: Address, index: Word, color: Option<&str>) {
        tracing::debug!(array, index, color, "highlight index");
    }

    fn clear_highlight(&mut self, array: Address) {
        tracing::debug!(array, "clear highlight");
    }

    fn frame_entered(&mut self, frames: &CallFrames, memory: &MemorySpace) {
        if let Some(frame) = frames.current() {
            tracing::debug!(
                function = %frame.name,
                depth = frames.depth(),
                bindings = frame.bindings().len(),
                allocated = memory.allocated_bytes(),
                "frame entered"
            );
        }
    }

    fn frame_exited(&mut self, function: &str) {
        tracing::debug!(function, "frame exited");
    }
}
