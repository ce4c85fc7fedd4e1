//! C source code parser
//!
//! This module transforms C source text into an Abstract Syntax Tree (AST):
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`parse`]: The recursive descent driver and its token cursor
//! - [`ast`]: AST node definitions
//!
//! # Parser Implementation
//!
//! The driver is grammar-agnostic. Every construct of the C subset is a named
//! production in [`crate::grammar`]; the driver dispatches to it by name and
//! tags the result with the production name and its starting position.

pub mod ast;
pub mod lexer;
pub mod parse;
