//! Parser driver and token cursor
//!
//! The [`Parser`] owns the token stream and a borrowed [`GrammarRegistry`].
//! It knows nothing about C syntax itself: [`Parser::parse`] looks the
//! requested production up by name, records where it started, and hands the
//! cursor to the production's parse function. Productions compose by calling
//! `parse` again for their sub-expressions.
//!
//! The cursor helpers (`peek`, `next_is`, `pop`, `pop_if_is`, `pop_many`) are
//! the only way productions consume tokens, so every unexpected token is
//! reported from one place as a syntactic error carrying its position.

use crate::grammar::{GrammarRegistry, Parsed};
use crate::parser::ast::*;
use crate::parser::lexer::{LexError, Lexer, Token, TokenKind};
use thiserror::Error;

/// Syntactic error: an unexpected token at a `pop` point
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
}

impl ParseError {
    pub fn new(message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            message: message.into(),
            location,
        }
    }
}

/// Recursive descent driver over a token cursor
pub struct Parser<'r> {
    registry: &'r GrammarRegistry,
    tokens: Vec<Token>,
    position: usize,
}

impl<'r> Parser<'r> {
    /// Tokenize `source` and prepare a parser over the resulting stream
    pub fn new(registry: &'r GrammarRegistry, source: &str) -> Result<Self, LexError> {
        let tokens = Lexer::new(source).tokenize()?;
        Ok(Self::from_tokens(registry, tokens))
    }

    /// Build a parser over an already-lexed token stream
    ///
    /// An `Eof` token is appended when the stream does not end with one.
    pub fn from_tokens(registry: &'r GrammarRegistry, mut tokens: Vec<Token>) -> Self {
        if tokens.last().map_or(true, |t| t.kind != TokenKind::Eof) {
            let location = tokens.last().map_or_else(SourceLocation::default, |t| t.location);
            tokens.push(Token {
                kind: TokenKind::Eof,
                content: String::new(),
                location,
            });
        }
        Self {
            registry,
            tokens,
            position: 0,
        }
    }

    /// Invoke the named production at the current cursor position
    pub fn parse(&mut self, name: &'static str) -> Result<AstNode, ParseError> {
        let production = self.registry.get(name).ok_or_else(|| {
            ParseError::new(
                format!("unknown grammar production '{}'", name),
                self.current_location(),
            )
        })?;

        let starts_at = self.current_location();
        match (production.parse)(self)? {
            Parsed::Node(content) => Ok(AstNode::new(name, content, starts_at)),
            Parsed::Forward(node) => Ok(node),
        }
    }

    // ===== Cursor =====

    pub fn peek(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.position.min(last)]
    }

    pub fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    /// Kind of the token `n` positions ahead of the cursor
    pub fn peek_ahead(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.position + n)
            .map_or(TokenKind::Eof, |t| t.kind)
    }

    pub fn next_is(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    pub fn is_at_end(&self) -> bool {
        self.next_is(TokenKind::Eof)
    }

    pub fn current_location(&self) -> SourceLocation {
        self.peek().location
    }

    /// Consume a token of the given kind or fail with a syntactic error
    pub fn pop(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.next_is(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&kind.to_string()))
        }
    }

    /// Consume the next token if it has the given kind
    pub fn pop_if_is(&mut self, kind: TokenKind) -> bool {
        if self.next_is(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume every consecutive token of the given kind
    pub fn pop_many(&mut self, kind: TokenKind) -> Vec<Token> {
        let mut popped = Vec::new();
        while self.next_is(kind) {
            popped.push(self.advance());
        }
        popped
    }

    /// Consume whatever token is next
    pub fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.position += 1;
        }
        token
    }

    /// Syntactic error at the current token
    pub fn unexpected(&self, wanted: &str) -> ParseError {
        let found = self.peek();
        let message = if found.kind == TokenKind::Eof {
            format!("expected {}, but reached end of file", wanted)
        } else {
            format!("expected {}, but found {}", wanted, found)
        };
        ParseError::new(message, found.location)
    }
}
