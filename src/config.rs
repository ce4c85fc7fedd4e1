// Interpreter configuration

use crate::memory::DEFAULT_CAPACITY;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterConfig {
    /// Size of the simulated address space in bytes
    pub memory_capacity: u32,
    /// Deepest call nesting allowed before a stack overflow is reported
    pub max_call_depth: usize,
    /// Function invoked by [`run`](crate::interpreter::Interpreter::run)
    pub entry_point: String,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        InterpreterConfig {
            memory_capacity: DEFAULT_CAPACITY,
            max_call_depth: 512,
            entry_point: "main".to_string(),
        }
    }
}

impl InterpreterConfig {
    pub fn with_memory_capacity(mut self, bytes: u32) -> Self {
        self.memory_capacity = bytes;
        self
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn with_entry_point(mut self, name: impl Into<String>) -> Self {
        self.entry_point = name.into();
        self
    }
}
