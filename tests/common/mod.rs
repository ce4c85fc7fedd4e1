// Shared helpers for the integration tests

#![allow(dead_code)]

use memscope::compiler::symbols::SymbolId;
use memscope::compiler::types::Type;
use memscope::config::InterpreterConfig;
use memscope::interpreter::{Interpreter, Visualizer};
use memscope::memory::{Address, CallFrames, MemorySpace, Word};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Array {
        element: String,
        address: Address,
        length: u32,
    },
    StructInstance(String, Address),
    Highlight(Address, Word, Option<String>),
    ClearHighlight(Address),
    FrameEntered {
        function: String,
        depth: usize,
        watched: Vec<Address>,
    },
    FrameExited(String),
}

/// Records every visualizer event; optionally snapshots the live addresses of one symbol
#[derive(Clone, Default)]
pub struct Recorder {
    pub events: Arc<Mutex<Vec<Event>>>,
    pub watch: Option<SymbolId>,
}

impl Recorder {
    pub fn watching(symbol: SymbolId) -> Self {
        Recorder {
            events: Arc::default(),
            watch: Some(symbol),
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl Visualizer for Recorder {
    fn array_registered(&mut self, element: &Type, address: Address, length: u32) {
        self.push(Event::Array {
            element: element.to_string(),
            address,
            length,
        });
    }

    fn struct_instance(&mut self, name: &str, address: Address) {
        self.push(Event::StructInstance(name.to_string(), address));
    }

    fn highlight_index(&mut self, array: Address, index: Word, color: Option<&str>) {
        self.push(Event::Highlight(array, index, color.map(str::to_string)));
    }

    fn clear_highlight(&mut self, array: Address) {
        self.push(Event::ClearHighlight(array));
    }

    fn frame_entered(&mut self, frames: &CallFrames, _memory: &MemorySpace) {
        let watched = self
            .watch
            .map(|symbol| frames.live_addresses(symbol))
            .unwrap_or_default();
        let function = frames.current().map(|f| f.name.clone()).unwrap_or_default();
        self.push(Event::FrameEntered {
            function,
            depth: frames.depth(),
            watched,
        });
    }

    fn frame_exited(&mut self, function: &str) {
        self.push(Event::FrameExited(function.to_string()));
    }
}

/// Write-callback log
pub type Writes = Arc<Mutex<Vec<(Address, Word)>>>;

pub fn record_writes(interpreter: &mut Interpreter) -> Writes {
    let writes: Writes = Arc::default();
    let sink = Arc::clone(&writes);
    interpreter
        .memory_mut()
        .set_write_callback(Box::new(move |address, value| {
            sink.lock().unwrap().push((address, value))
        }));
    writes
}

pub fn compiled(source: &str) -> Interpreter {
    let mut interpreter = Interpreter::new(InterpreterConfig::default()).unwrap();
    if let Err(error) = interpreter.compile(source) {
        panic!("compilation failed: {}", error);
    }
    interpreter
}

pub fn run(source: &str) -> Option<Word> {
    let mut interpreter = compiled(source);
    match interpreter.run() {
        Ok(value) => value,
        Err(error) => panic!("execution failed: {}", error),
    }
}
