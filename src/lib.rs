//! # Introduction
//!
//! memscope compiles and runs a small subset of C in which every variable,
//! array and heap block lives at an address of a simulated byte-addressable
//! memory. The state of that memory is observable at any point: writes are
//! reported through a callback, frames and bindings can be inspected, and
//! execution can be paused, stepped or aborted between statements.
//!
//! ## Execution pipeline
//!
//! ```text
//! Source → Lexer → Parser ⇄ Grammar registry → AST → Compiler → IR → Interpreter
//! ```
//!
//! 1. [`parser`]: tokenises the source and drives parsing by production name.
//! 2. [`grammar`]: the registry of named productions, each with a parse step
//!    and an optional compile step; [`grammar::GrammarRegistry::c_subset`]
//!    builds the C subset.
//! 3. [`compiler`]: symbol tables, types and struct layouts; lowers the AST
//!    into [`ir`].
//! 4. [`memory`]: the address space, the call-frame arena and typed values.
//! 5. [`interpreter`]: the call protocol, value resolver, builtins and
//!    execution control.
//!
//! ## Supported C subset
//!
//! Types: `int`, `char`, `void`, structs, pointers, fixed-size arrays.
//! Control flow: `if/else`, `while`, `do-while`, `for`, `break`, `continue`,
//! `return`.
//! Built-ins: `malloc`, `free`, `highlight_index`, `clear_highlight`.
//!
//! ```no_run
//! use memscope::config::InterpreterConfig;
//! use memscope::interpreter::Interpreter;
//!
//! let mut interpreter = Interpreter::new(InterpreterConfig::default())?;
//! interpreter.compile("int main() { int a[2]; a = {1, 2}; return a[0] + a[1]; }")?;
//! assert_eq!(interpreter.run()?, Some(3));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod compiler;
pub mod config;
pub mod diagnostics;
pub mod grammar;
pub mod interpreter;
pub mod ir;
pub mod memory;
pub mod parser;
