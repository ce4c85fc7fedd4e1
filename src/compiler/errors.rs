//! Compile-phase error types
//!
//! [`CompileError`] is raised by compile steps; [`BuildError`] is what
//! [`crate::interpreter::Interpreter::compile`] surfaces, folding in lexical,
//! syntactic and registry failures so that a caller sees every compile-phase
//! problem through one type.

use crate::grammar::RegistryError;
use crate::parser::ast::SourceLocation;
use crate::parser::lexer::LexError;
use crate::parser::parse::ParseError;
use thiserror::Error;

/// Semantic error found while lowering an AST node
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct CompileError {
    pub message: String,
    pub location: SourceLocation,
}

impl CompileError {
    pub fn new(message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            message: message.into(),
            location,
        }
    }
}

/// Any failure while turning source text into a runnable program
#[derive(Debug, Clone, Error)]
pub enum BuildError {
    #[error("lexical error: {0}")]
    Lexical(#[from] LexError),

    #[error("syntax error: {0}")]
    Syntactic(#[from] ParseError),

    #[error("compilation error: {0}")]
    Compilation(#[from] CompileError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl BuildError {
    /// Where in the source the failure was detected
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            BuildError::Lexical(e) => Some(e.location),
            BuildError::Syntactic(e) => Some(e.location),
            BuildError::Compilation(e) => Some(e.location),
            BuildError::Registry(_) => None,
        }
    }

    /// The bare message, without the phase prefix
    pub fn message(&self) -> String {
        match self {
            BuildError::Lexical(e) => e.message.clone(),
            BuildError::Syntactic(e) => e.message.clone(),
            BuildError::Compilation(e) => e.message.clone(),
            BuildError::Registry(e) => e.to_string(),
        }
    }
}
