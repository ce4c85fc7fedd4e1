// Execution engine for the C interpreter

use crate::compiler::symbols::{Program, StringId, Symbol};
use crate::compiler::{compile_program, BuildError};
use crate::config::InterpreterConfig;
use crate::grammar::{names, GrammarRegistry, RegistryError};
use crate::interpreter::builtins;
use crate::interpreter::control::{Control, ExecutionControl, FreeRun};
use crate::interpreter::errors::{ExecError, RuntimeError};
use crate::interpreter::visualizer::{NoVisualizer, Visualizer};
use crate::memory::{Address, CallFrames, MemorySpace, TypedValue, Word};
use crate::parser::ast::SourceLocation;
use crate::parser::parse::Parser;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

/// How the statement currently executing was left
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ControlFlow {
    Normal,
    Break,
    Continue,
    Return,
}

/// Compiles C source and executes it against a simulated address space
pub struct Interpreter {
    pub(super) registry: Arc<GrammarRegistry>,
    pub(super) config: InterpreterConfig,

    /// Symbol tables and IR of the last successful build
    pub(super) program: Arc<Program>,

    pub(super) memory: MemorySpace,

    /// Symbol-to-address bindings per active call, plus globals
    pub(super) frames: CallFrames,

    /// Where each string literal lives during a run
    pub(super) strings: FxHashMap<StringId, Address>,

    /// Blocks returned by `malloc` and not yet freed
    pub(super) heap_blocks: FxHashSet<Address>,

    /// Names of the functions currently executing, outermost first
    pub(super) call_stack: Vec<String>,

    /// Value produced by the last `return` of the innermost call
    pub(super) pending_return: Option<TypedValue>,

    pub(super) control_flow: ControlFlow,

    pub(super) visualizer: Box<dyn Visualizer + Send>,
    control: Box<dyn ExecutionControl + Send>,
}

impl Interpreter {
    /// Create an interpreter for the built-in C subset
    pub fn new(config: InterpreterConfig) -> Result<Self, RegistryError> {
        Ok(Self::with_registry(GrammarRegistry::c_subset()?, config))
    }

    /// Create an interpreter that parses and compiles through `registry`
    pub fn with_registry(registry: GrammarRegistry, config: InterpreterConfig) -> Self {
        let mut program = Program::new();
        builtins::install(&mut program);

        Interpreter {
            registry: Arc::new(registry),
            memory: MemorySpace::new(config.memory_capacity),
            config,
            program: Arc::new(program),
            frames: CallFrames::new(),
            strings: FxHashMap::default(),
            heap_blocks: FxHashSet::default(),
            call_stack: Vec::new(),
            pending_return: None,
            control_flow: ControlFlow::Normal,
            visualizer: Box::new(NoVisualizer),
            control: Box::new(FreeRun),
        }
    }

    pub fn with_visualizer(mut self, visualizer: impl Visualizer + Send + 'static) -> Self {
        self.visualizer = Box::new(visualizer);
        self
    }

    pub fn with_control(mut self, control: impl ExecutionControl + Send + 'static) -> Self {
        self.control = Box::new(control);
        self
    }

    pub fn set_visualizer(&mut self, visualizer: Box<dyn Visualizer + Send>) {
        self.visualizer = visualizer;
    }

    pub fn set_control(&mut self, control: Box<dyn ExecutionControl + Send>) {
        self.control = control;
    }

    // ===== Build =====

    /// Parse and compile `source`, replacing the current program
    ///
    /// Nothing from a failed build is kept: the previous program stays in
    /// place until the new one compiles completely.
    pub fn compile(&mut self, source: &str) -> Result<(), BuildError> {
        let root = Parser::new(&self.registry, source)?.parse(names::PROGRAM)?;

        let mut program = Program::new();
        builtins::install(&mut program);
        compile_program(&self.registry, &mut program, &root)?;

        self.reset();
        self.program = Arc::new(program);
        Ok(())
    }

    // ===== Run =====

    /// Execute the configured entry point with no arguments
    pub fn run(&mut self) -> Result<Option<Word>, ExecError> {
        let entry = self.config.entry_point.clone();
        self.call(&entry, &[])
    }

    /// Execute `name` with integer arguments as a complete run
    ///
    /// Globals and string literals are allocated before the call and freed
    /// after it, however it ends. Heap blocks outlive the run.
    pub fn call(&mut self, name: &str, args: &[Word]) -> Result<Option<Word>, ExecError> {
        let program = Arc::clone(&self.program);
        let function = program
            .function_by_name(name)
            .ok_or_else(|| RuntimeError::NoEntryPoint {
                name: name.to_string(),
            })?;
        let descriptor = program.function(function);
        if descriptor.params.len() != args.len() {
            return Err(RuntimeError::ArgumentCountMismatch {
                function: name.to_string(),
                expected: descriptor.params.len(),
                got: args.len(),
            }
            .into());
        }

        let values = descriptor
            .params
            .iter()
            .zip(args)
            .map(|(param, value)| TypedValue::new(program.symbol(*param).ty.clone(), *value))
            .collect();

        tracing::debug!(entry = name, "run started");
        let result = self.start_run(&program).and_then(|()| {
            self.call_stack.push(descriptor.name.clone());
            let returned = self.invoke(function, values, descriptor.defined_at);
            self.call_stack.pop();
            returned
        });
        self.finish_run();

        match &result {
            Ok(value) => tracing::debug!(?value, "run finished"),
            Err(error) => tracing::debug!(%error, "run stopped"),
        }
        result.map(|value| value.map(|v| v.value))
    }

    fn start_run(&mut self, program: &Program) -> Result<(), ExecError> {
        for &global in program.globals() {
            let symbol = program.symbol(global);
            let address = self
                .memory
                .allocate(symbol.size)
                .map_err(|e| RuntimeError::memory(e, symbol.declared_at))?;
            self.frames.bind_global(global, address, symbol.size);
            self.register_array(symbol, address)?;
        }

        for (id, text) in program.strings() {
            let size = text.len() as u32 + 1;
            let address = self
                .memory
                .allocate(size)
                .map_err(|e| RuntimeError::memory(e, SourceLocation::default()))?;
            self.strings.insert(id, address);
            for (i, byte) in text.bytes().chain(std::iter::once(0)).enumerate() {
                self.memory
                    .write(address + i as u32, byte)
                    .map_err(|e| RuntimeError::memory(e, SourceLocation::default()))?;
            }
        }
        Ok(())
    }

    /// Report an array symbol's shape once it has storage
    pub(super) fn register_array(&mut self, symbol: &Symbol, address: Address) -> Result<(), ExecError> {
        let (Some(array), Some(element)) = (&symbol.array, symbol.element_type()) else {
            return Ok(());
        };
        let length = self.solve(&array.length_expr)?.value;
        self.visualizer
            .array_registered(&element, address, length.max(0) as u32);
        Ok(())
    }

    fn finish_run(&mut self) {
        for binding in self.frames.take_globals().into_iter().rev() {
            if let Err(error) = self.memory.free(binding.address) {
                tracing::warn!(%error, "failed to release global");
            }
        }
        for (_, address) in self.strings.drain() {
            if let Err(error) = self.memory.free(address) {
                tracing::warn!(%error, "failed to release string literal");
            }
        }
        self.call_stack.clear();
        self.pending_return = None;
        self.control_flow = ControlFlow::Normal;
    }

    /// Suspension point consulted before every statement
    pub(super) fn checkpoint(&mut self, at: SourceLocation) -> Result<(), ExecError> {
        match self.control.checkpoint(at) {
            Control::Continue => Ok(()),
            Control::Abort => {
                tracing::debug!(line = at.line, "execution aborted");
                Err(ExecError::Aborted)
            }
        }
    }

    // ===== Reset =====

    /// Return to a clean slate: builtins only, empty memory, no frames
    pub fn reset(&mut self) {
        let mut program = Program::new();
        builtins::install(&mut program);
        self.program = Arc::new(program);

        self.memory.clear();
        self.frames.clear();
        self.strings.clear();
        self.heap_blocks.clear();
        self.call_stack.clear();
        self.pending_return = None;
        self.control_flow = ControlFlow::Normal;
    }

    // ===== Accessors =====

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn registry(&self) -> &GrammarRegistry {
        &self.registry
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn memory(&self) -> &MemorySpace {
        &self.memory
    }

    /// Mutable access for installing a write callback
    pub fn memory_mut(&mut self) -> &mut MemorySpace {
        &mut self.memory
    }

    pub fn frames(&self) -> &CallFrames {
        &self.frames
    }

    pub fn call_stack(&self) -> &[String] {
        &self.call_stack
    }

    /// Addresses of live `malloc` blocks
    pub fn heap_blocks(&self) -> impl Iterator<Item = Address> + '_ {
        self.heap_blocks.iter().copied()
    }
}
