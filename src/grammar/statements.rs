//! Statement productions
//!
//! `statement` only picks the concrete production from the next token and
//! forwards its node; every other production here both parses and lowers one
//! kind of statement.

use super::expressions::value;
use super::{names, GrammarRegistry, Parsed, RegistryError};
use crate::compiler::types::is_assignable;
use crate::compiler::{CompileError, Compiler, Lowered};
use crate::ir::{Expr, Stmt, StmtKind};
use crate::parser::ast::{AstNode, Content};
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};

pub(super) fn register(registry: &mut GrammarRegistry) -> Result<(), RegistryError> {
    registry.register(names::STATEMENT, parse_statement, None)?;
    registry.register(names::BLOCK, parse_block, Some(compile_block))?;
    registry.register(names::IF, parse_if, Some(compile_if))?;
    registry.register(names::WHILE, parse_while, Some(compile_while))?;
    registry.register(names::DO_WHILE, parse_do_while, Some(compile_do_while))?;
    registry.register(names::FOR, parse_for, Some(compile_for))?;
    registry.register(names::RETURN, parse_return, Some(compile_return))?;
    registry.register(names::BREAK, parse_break, Some(compile_jump))?;
    registry.register(names::CONTINUE, parse_continue, Some(compile_jump))?;
    registry.register(names::EMPTY, parse_empty, Some(compile_empty))?;
    registry.register(
        names::EXPR_STATEMENT,
        parse_expr_statement,
        Some(compile_expr_statement),
    )?;
    Ok(())
}

// ===== Parsing =====

fn parse_statement(p: &mut Parser<'_>) -> Result<Parsed, ParseError> {
    let production = match p.peek_kind() {
        TokenKind::LBrace => names::BLOCK,
        TokenKind::If => names::IF,
        TokenKind::While => names::WHILE,
        TokenKind::Do => names::DO_WHILE,
        TokenKind::For => names::FOR,
        TokenKind::Return => names::RETURN,
        TokenKind::Break => names::BREAK,
        TokenKind::Continue => names::CONTINUE,
        TokenKind::Semicolon => names::EMPTY,
        kind if kind.starts_type() => names::VAR_DEC,
        _ => names::EXPR_STATEMENT,
    };
    Ok(Parsed::Forward(p.parse(production)?))
}

fn parse_block(p: &mut Parser<'_>) -> Result<Parsed, ParseError> {
    p.pop(TokenKind::LBrace)?;
    let mut statements = Vec::new();
    while !p.next_is(TokenKind::RBrace) && !p.is_at_end() {
        statements.push(p.parse(names::STATEMENT)?);
    }
    p.pop(TokenKind::RBrace)?;
    Ok(Parsed::Node(Content::Block { statements }))
}

fn parenthesized(p: &mut Parser<'_>) -> Result<Box<AstNode>, ParseError> {
    p.pop(TokenKind::LParen)?;
    let expr = p.parse(names::EXPR)?;
    p.pop(TokenKind::RParen)?;
    Ok(Box::new(expr))
}

fn parse_if(p: &mut Parser<'_>) -> Result<Parsed, ParseError> {
    p.pop(TokenKind::If)?;
    let condition = parenthesized(p)?;
    let then_branch = Box::new(p.parse(names::STATEMENT)?);
    let else_branch = if p.pop_if_is(TokenKind::Else) {
        Some(Box::new(p.parse(names::STATEMENT)?))
    } else {
        None
    };
    Ok(Parsed::Node(Content::If {
        condition,
        then_branch,
        else_branch,
    }))
}

fn parse_while(p: &mut Parser<'_>) -> Result<Parsed, ParseError> {
    p.pop(TokenKind::While)?;
    let condition = parenthesized(p)?;
    let body = Box::new(p.parse(names::STATEMENT)?);
    Ok(Parsed::Node(Content::While { condition, body }))
}

fn parse_do_while(p: &mut Parser<'_>) -> Result<Parsed, ParseError> {
    p.pop(TokenKind::Do)?;
    let body = Box::new(p.parse(names::STATEMENT)?);
    p.pop(TokenKind::While)?;
    let condition = parenthesized(p)?;
    p.pop(TokenKind::Semicolon)?;
    Ok(Parsed::Node(Content::DoWhile { body, condition }))
}

fn parse_for(p: &mut Parser<'_>) -> Result<Parsed, ParseError> {
    p.pop(TokenKind::For)?;
    p.pop(TokenKind::LParen)?;
    let init = optional_expr(p, TokenKind::Semicolon)?;
    p.pop(TokenKind::Semicolon)?;
    let condition = optional_expr(p, TokenKind::Semicolon)?;
    p.pop(TokenKind::Semicolon)?;
    let increment = optional_expr(p, TokenKind::RParen)?;
    p.pop(TokenKind::RParen)?;
    let body = Box::new(p.parse(names::STATEMENT)?);
    Ok(Parsed::Node(Content::For {
        init,
        condition,
        increment,
        body,
    }))
}

fn optional_expr(
    p: &mut Parser<'_>,
    terminator: TokenKind,
) -> Result<Option<Box<AstNode>>, ParseError> {
    if p.next_is(terminator) {
        Ok(None)
    } else {
        Ok(Some(Box::new(p.parse(names::EXPR)?)))
    }
}

fn parse_return(p: &mut Parser<'_>) -> Result<Parsed, ParseError> {
    p.pop(TokenKind::Return)?;
    let value = optional_expr(p, TokenKind::Semicolon)?;
    p.pop(TokenKind::Semicolon)?;
    Ok(Parsed::Node(Content::Return(value)))
}

fn parse_break(p: &mut Parser<'_>) -> Result<Parsed, ParseError> {
    p.pop(TokenKind::Break)?;
    p.pop(TokenKind::Semicolon)?;
    Ok(Parsed::Node(Content::Break))
}

fn parse_continue(p: &mut Parser<'_>) -> Result<Parsed, ParseError> {
    p.pop(TokenKind::Continue)?;
    p.pop(TokenKind::Semicolon)?;
    Ok(Parsed::Node(Content::Continue))
}

fn parse_empty(p: &mut Parser<'_>) -> Result<Parsed, ParseError> {
    p.pop(TokenKind::Semicolon)?;
    Ok(Parsed::Node(Content::Empty))
}

fn parse_expr_statement(p: &mut Parser<'_>) -> Result<Parsed, ParseError> {
    let expr = p.parse(names::EXPR)?;
    p.pop(TokenKind::Semicolon)?;
    Ok(Parsed::Node(Content::ExpressionStatement(Box::new(expr))))
}

// ===== Compilation =====

fn stmt(kind: StmtKind, node: &AstNode) -> Result<Lowered, CompileError> {
    Ok(Lowered::Stmt(Stmt::new(kind, node.starts_at)))
}

fn malformed(node: &AstNode) -> CompileError {
    CompileError::new(
        format!("malformed '{}' node", node.production),
        node.starts_at,
    )
}

/// A controlling expression: any scalar value
fn condition(c: &mut Compiler<'_>, node: &AstNode) -> Result<Expr, CompileError> {
    let expr = value(c, node)?;
    if !expr.ty.is_scalar() {
        return Err(CompileError::new(
            format!("used '{}' where a scalar is required", expr.ty),
            node.starts_at,
        ));
    }
    Ok(expr)
}

fn compile_block(c: &mut Compiler<'_>, node: &AstNode) -> Result<Lowered, CompileError> {
    let Content::Block { statements } = &node.content else {
        return Err(malformed(node));
    };
    c.enter_scope();
    let mut lowered = Vec::with_capacity(statements.len());
    for statement in statements {
        match c.compile(statement)? {
            Lowered::Stmt(s) => lowered.push(s),
            Lowered::Expr(e) => lowered.push(Stmt::new(StmtKind::Expr(e), statement.starts_at)),
            Lowered::Declared => {}
        }
    }
    c.exit_scope();
    stmt(StmtKind::Block(lowered), node)
}

fn compile_if(c: &mut Compiler<'_>, node: &AstNode) -> Result<Lowered, CompileError> {
    let Content::If {
        condition: cond,
        then_branch,
        else_branch,
    } = &node.content
    else {
        return Err(malformed(node));
    };
    let condition = condition(c, cond)?;
    let then_branch = Box::new(c.compile_stmt(then_branch)?);
    let else_branch = match else_branch {
        Some(branch) => Some(Box::new(c.compile_stmt(branch)?)),
        None => None,
    };
    stmt(
        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        },
        node,
    )
}

fn loop_body(c: &mut Compiler<'_>, body: &AstNode) -> Result<Box<Stmt>, CompileError> {
    c.enter_loop();
    let body = c.compile_stmt(body);
    c.exit_loop();
    Ok(Box::new(body?))
}

fn compile_while(c: &mut Compiler<'_>, node: &AstNode) -> Result<Lowered, CompileError> {
    let Content::While {
        condition: cond,
        body,
    } = &node.content
    else {
        return Err(malformed(node));
    };
    let condition = condition(c, cond)?;
    let body = loop_body(c, body)?;
    stmt(StmtKind::While { condition, body }, node)
}

fn compile_do_while(c: &mut Compiler<'_>, node: &AstNode) -> Result<Lowered, CompileError> {
    let Content::DoWhile {
        body,
        condition: cond,
    } = &node.content
    else {
        return Err(malformed(node));
    };
    let body = loop_body(c, body)?;
    let condition = condition(c, cond)?;
    stmt(StmtKind::DoWhile { body, condition }, node)
}

fn compile_for(c: &mut Compiler<'_>, node: &AstNode) -> Result<Lowered, CompileError> {
    let Content::For {
        init,
        condition: cond,
        increment,
        body,
    } = &node.content
    else {
        return Err(malformed(node));
    };
    let init = match init {
        Some(init) => Some(c.compile_expr(init)?),
        None => None,
    };
    let condition = match cond {
        Some(cond) => Some(condition(c, cond)?),
        None => None,
    };
    let increment = match increment {
        Some(increment) => Some(c.compile_expr(increment)?),
        None => None,
    };
    let body = loop_body(c, body)?;
    stmt(
        StmtKind::For {
            init,
            condition,
            increment,
            body,
        },
        node,
    )
}

fn compile_return(c: &mut Compiler<'_>, node: &AstNode) -> Result<Lowered, CompileError> {
    let Content::Return(returned) = &node.content else {
        return Err(malformed(node));
    };
    let Some(expected) = c.return_type().cloned() else {
        return Err(CompileError::new("'return' outside of a function", node.starts_at));
    };

    let returned = match returned {
        None if !expected.is_void() => {
            return Err(CompileError::new(
                "'return' with no value, in function returning non-void",
                node.starts_at,
            ));
        }
        None => None,
        Some(_) if expected.is_void() => {
            return Err(CompileError::new(
                "'return' with a value, in function returning void",
                node.starts_at,
            ));
        }
        Some(expr_node) => {
            let expr = value(c, expr_node)?;
            if !is_assignable(&expected, &expr.ty) {
                return Err(CompileError::new(
                    format!(
                        "incompatible types when returning type '{}' but '{}' was expected",
                        expr.ty, expected
                    ),
                    expr_node.starts_at,
                ));
            }
            Some(expr)
        }
    };
    stmt(StmtKind::Return(returned), node)
}

fn compile_jump(c: &mut Compiler<'_>, node: &AstNode) -> Result<Lowered, CompileError> {
    let (kind, keyword) = match node.content {
        Content::Break => (StmtKind::Break, "break"),
        Content::Continue => (StmtKind::Continue, "continue"),
        _ => return Err(malformed(node)),
    };
    if !c.in_loop() {
        return Err(CompileError::new(
            format!("{} statement not within loop", keyword),
            node.starts_at,
        ));
    }
    stmt(kind, node)
}

fn compile_empty(_: &mut Compiler<'_>, node: &AstNode) -> Result<Lowered, CompileError> {
    stmt(StmtKind::Empty, node)
}

fn compile_expr_statement(c: &mut Compiler<'_>, node: &AstNode) -> Result<Lowered, CompileError> {
    let Content::ExpressionStatement(expr) = &node.content else {
        return Err(malformed(node));
    };
    let expr = c.compile_expr(expr)?;
    stmt(StmtKind::Expr(expr), node)
}

#[cfg(test)]
mod tests {
    use crate::compiler::symbols::{FunctionBody, Program};
    use crate::compiler::{compile_program, CompileError};
    use crate::grammar::{names, GrammarRegistry};
    use crate::ir::StmtKind;
    use crate::parser::parse::Parser;

    fn build(source: &str) -> Result<Program, CompileError> {
        let registry = GrammarRegistry::c_subset().unwrap();
        let root = Parser::new(&registry, source)
            .unwrap()
            .parse(names::PROGRAM)
            .unwrap();
        let mut program = Program::new();
        compile_program(&registry, &mut program, &root)?;
        Ok(program)
    }

    #[test]
    fn test_declarations_emit_no_statements() {
        let program = build("int main() { int a; a = 1; int b; return a; }").unwrap();
        let main = program.function(program.function_by_name("main").unwrap());
        let FunctionBody::Compiled(body) = &main.body else {
            panic!("expected compiled body");
        };
        let StmtKind::Block(statements) = &body.kind else {
            panic!("expected block");
        };
        assert_eq!(statements.len(), 2);
        assert!(matches!(statements[1].kind, StmtKind::Return(Some(_))));
    }

    #[test]
    fn test_break_outside_loop() {
        let err = build("int main() { break; return 0; }").unwrap_err();
        assert_eq!(err.message, "break statement not within loop");
        assert!(build("int main() { while (1) { if (1) break; } return 0; }").is_ok());
    }

    #[test]
    fn test_return_checks() {
        let err = build("void f() { return 1; }").unwrap_err();
        assert_eq!(err.message, "'return' with a value, in function returning void");

        let err = build("int f() { return; }").unwrap_err();
        assert_eq!(err.message, "'return' with no value, in function returning non-void");

        let err = build("int *f(char *s) { return s; }").unwrap_err();
        assert_eq!(
            err.message,
            "incompatible types when returning type 'char*' but 'int*' was expected"
        );
    }

    #[test]
    fn test_for_parts_are_optional() {
        assert!(build("int main() { int i; for (;;) { break; } for (i = 0; i < 3; i = i + 1) ; return 0; }").is_ok());
    }

    #[test]
    fn test_struct_condition_rejected() {
        let err = build("struct S { int a; }; int main() { struct S s; if (s) return 1; return 0; }")
            .unwrap_err();
        assert_eq!(err.message, "used 'struct S' where a scalar is required");
    }
}
