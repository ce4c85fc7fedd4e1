//! Call-frame arena
//!
//! Each active call owns a [`Frame`] mapping the callee's symbols to the
//! addresses allocated for this particular call. Globals live in a separate
//! bottom frame that outlives every call. A recursive function therefore has
//! one binding per live call for each of its locals, and name resolution
//! only ever looks at the innermost frame and the globals.
//!
//! This module only tracks bindings. Allocating and freeing the addresses is
//! the interpreter's job, in declaration order on entry and in reverse order
//! on exit.

use super::Address;
use crate::compiler::symbols::{FunctionId, SymbolId};

/// One symbol bound to storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub symbol: SymbolId,
    pub address: Address,
    pub size: u32,
}

/// Activation record of one call
#[derive(Debug, Clone)]
pub struct Frame {
    pub function: FunctionId,
    pub name: String,
    bindings: Vec<Binding>,
}

impl Frame {
    /// Bindings in the order they were made
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn address_of(&self, symbol: SymbolId) -> Option<Address> {
        self.bindings
            .iter()
            .rev()
            .find(|b| b.symbol == symbol)
            .map(|b| b.address)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CallFrames {
    globals: Vec<Binding>,
    frames: Vec<Frame>,
}

impl CallFrames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_frame(&mut self, function: FunctionId, name: &str) {
        self.frames.push(Frame {
            function,
            name: name.to_string(),
            bindings: Vec::new(),
        });
    }

    /// Remove the innermost frame; its bindings still need to be freed
    pub fn pop_frame(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    /// Bind `symbol` in the innermost frame
    ///
    /// Returns `None` when no call is active.
    #[must_use]
    pub fn bind(&mut self, symbol: SymbolId, address: Address, size: u32) -> Option<()> {
        let frame = self.frames.last_mut()?;
        frame.bindings.push(Binding {
            symbol,
            address,
            size,
        });
        Some(())
    }

    pub fn bind_global(&mut self, symbol: SymbolId, address: Address, size: u32) {
        self.globals.push(Binding {
            symbol,
            address,
            size,
        });
    }

    /// Current address of `symbol`: innermost frame first, then globals
    pub fn address_of(&self, symbol: SymbolId) -> Option<Address> {
        self.frames
            .last()
            .and_then(|frame| frame.address_of(symbol))
            .or_else(|| {
                self.globals
                    .iter()
                    .find(|b| b.symbol == symbol)
                    .map(|b| b.address)
            })
    }

    /// Every live address bound to `symbol`, outermost call first
    pub fn live_addresses(&self, symbol: SymbolId) -> Vec<Address> {
        self.globals
            .iter()
            .chain(self.frames.iter().flat_map(|f| f.bindings.iter()))
            .filter(|b| b.symbol == symbol)
            .map(|b| b.address)
            .collect()
    }

    /// Remove the global bindings; they still need to be freed
    pub fn take_globals(&mut self) -> Vec<Binding> {
        std::mem::take(&mut self.globals)
    }

    pub fn globals(&self) -> &[Binding] {
        &self.globals
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn current(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn clear(&mut self) {
        self.globals.clear();
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_innermost_binding_wins() {
        let mut frames = CallFrames::new();
        let r = SymbolId(3);
        frames.push_frame(FunctionId(0), "fact");
        frames.bind(r, 0x1000, 4).unwrap();
        frames.push_frame(FunctionId(0), "fact");
        frames.bind(r, 0x1004, 4).unwrap();

        assert_eq!(frames.address_of(r), Some(0x1004));
        assert_eq!(frames.live_addresses(r), vec![0x1000, 0x1004]);

        let popped = frames.pop_frame().unwrap();
        assert_eq!(popped.bindings().len(), 1);
        assert_eq!(frames.address_of(r), Some(0x1000));
    }

    #[test]
    fn test_globals_are_visible_from_every_frame() {
        let mut frames = CallFrames::new();
        let g = SymbolId(0);
        frames.bind_global(g, 0x2000, 4);
        frames.push_frame(FunctionId(1), "main");
        assert_eq!(frames.address_of(g), Some(0x2000));
        assert_eq!(frames.take_globals().len(), 1);
        assert_eq!(frames.address_of(g), None);
    }

    #[test]
    fn test_bind_without_frame() {
        let mut frames = CallFrames::new();
        assert!(frames.bind(SymbolId(0), 0x1000, 4).is_none());
        assert_eq!(frames.depth(), 0);
    }
}
