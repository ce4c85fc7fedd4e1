//! Grammar registry: the single source of truth for the language syntax
//!
//! Every construct of the C subset is a named [`Production`] pairing a parse
//! step (tokens → [`AstNode`]) with an optional compile step
//! ([`AstNode`] → IR). The registry is built once by
//! [`GrammarRegistry::c_subset`] and then shared immutably by the parser, the
//! compiler, and the interpreter (which lowers deferred array initializers).
//!
//! Registering a name twice is rejected with
//! [`RegistryError::DuplicateProduction`]; there is exactly one authoritative
//! definition per production.

mod declarations;
mod expressions;
mod statements;

use crate::compiler::{CompileError, Compiler, Lowered};
use crate::parser::ast::{AstNode, Content};
use crate::parser::parse::{ParseError, Parser};
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Production names, as used for dispatch and as AST node tags
pub mod names {
    pub const PROGRAM: &str = "program";
    pub const STRUCT_DEF: &str = "struct-def";
    pub const FUNCTION_DEF: &str = "function-def";
    pub const PARAM: &str = "param";
    pub const TYPE: &str = "type";
    pub const VAR_DEC: &str = "var-dec";
    pub const VAR_ITEM: &str = "var-item";

    pub const STATEMENT: &str = "statement";
    pub const BLOCK: &str = "block";
    pub const IF: &str = "if";
    pub const WHILE: &str = "while";
    pub const DO_WHILE: &str = "do-while";
    pub const FOR: &str = "for";
    pub const RETURN: &str = "return";
    pub const BREAK: &str = "break";
    pub const CONTINUE: &str = "continue";
    pub const EMPTY: &str = "empty";
    pub const EXPR_STATEMENT: &str = "expr-statement";

    pub const EXPR: &str = "expr";
    pub const ASSIGNMENT: &str = "assignment";
    pub const ARRAY_INIT: &str = "array-init";
    pub const LOGICAL_OR: &str = "logical-or";
    pub const LOGICAL_AND: &str = "logical-and";
    pub const EQUALITY: &str = "equality";
    pub const RELATIONAL: &str = "relational";
    pub const ADDITIVE: &str = "additive";
    pub const MULTIPLICATIVE: &str = "multiplicative";
    pub const UNARY: &str = "unary";
    pub const POSTFIX: &str = "postfix";
    pub const PRIMARY: &str = "primary";
    pub const CALL: &str = "call";
    pub const IDENTIFIER: &str = "identifier";
    pub const LITERAL: &str = "literal";
}

/// Result of a production's parse step
pub enum Parsed {
    /// New node content; the driver tags it with the production name and entry position
    Node(Content),
    /// An already-built node passed through unchanged (e.g. an operand with no operator)
    Forward(AstNode),
}

pub type ParseFn = fn(&mut Parser<'_>) -> Result<Parsed, ParseError>;
pub type CompileFn = fn(&mut Compiler<'_>, &AstNode) -> Result<Lowered, CompileError>;

/// A named grammar rule
#[derive(Clone, Copy)]
pub struct Production {
    pub name: &'static str,
    pub parse: ParseFn,
    pub compile: Option<CompileFn>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("grammar production '{0}' is already registered")]
    DuplicateProduction(&'static str),
}

/// Mapping from production name to its parse/compile pair
#[derive(Default)]
pub struct GrammarRegistry {
    productions: FxHashMap<&'static str, Production>,
}

impl GrammarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry for the supported C subset
    pub fn c_subset() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        declarations::register(&mut registry)?;
        statements::register(&mut registry)?;
        expressions::register(&mut registry)?;
        tracing::debug!(productions = registry.len(), "grammar registry built");
        Ok(registry)
    }

    /// Add exactly one production; re-registering a name is an error
    pub fn register(
        &mut self,
        name: &'static str,
        parse: ParseFn,
        compile: Option<CompileFn>,
    ) -> Result<(), RegistryError> {
        if self.productions.contains_key(name) {
            return Err(RegistryError::DuplicateProduction(name));
        }
        self.productions.insert(
            name,
            Production {
                name,
                parse,
                compile,
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Production> {
        self.productions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.productions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.productions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.productions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_nothing(_: &mut Parser<'_>) -> Result<Parsed, ParseError> {
        Ok(Parsed::Node(Content::Empty))
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut registry = GrammarRegistry::new();
        registry.register("thing", parse_nothing, None).unwrap();
        assert_eq!(
            registry.register("thing", parse_nothing, None),
            Err(RegistryError::DuplicateProduction("thing"))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_c_subset_has_every_named_production() {
        let registry = GrammarRegistry::c_subset().unwrap();
        for name in [
            names::PROGRAM,
            names::VAR_DEC,
            names::VAR_ITEM,
            names::ASSIGNMENT,
            names::ARRAY_INIT,
            names::CALL,
            names::FOR,
        ] {
            assert!(registry.contains(name), "missing production {}", name);
        }
        assert!(registry.get(names::VAR_DEC).unwrap().compile.is_some());
    }

    #[test]
    fn test_registering_subset_twice_fails() {
        let mut registry = GrammarRegistry::c_subset().unwrap();
        assert!(declarations::register(&mut registry).is_err());
    }
}
