//! Expression productions, lowest precedence first
//!
//! `expr` → `assignment` → `logical-or` → `logical-and` → `equality` →
//! `relational` → `additive` → `multiplicative` → `unary` → `postfix` →
//! `primary` (`call`, `identifier`, `literal`, parenthesised `expr`).
//!
//! A level with no operator forwards its operand's node unchanged, so the
//! tree only contains nodes for operators that were actually written.
//! `array-init` is reachable only from the right-hand side of `=`.

use super::declarations::type_name;
use super::{names, GrammarRegistry, Parsed, RegistryError};
use crate::compiler::symbols::FunctionId;
use crate::compiler::types::{is_assignable, Type};
use crate::compiler::{CompileError, Compiler, Lowered};
use crate::ir::{Expr, ExprKind};
use crate::parser::ast::{AstNode, BinOp, Content, SizeofTarget, TypeName, UnOp};
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};
use std::sync::Arc;

pub(super) fn register(registry: &mut GrammarRegistry) -> Result<(), RegistryError> {
    registry.register(names::EXPR, parse_expr, None)?;
    registry.register(names::ASSIGNMENT, parse_assignment, Some(compile_assignment))?;
    registry.register(names::ARRAY_INIT, parse_array_init, Some(compile_array_init))?;
    registry.register(names::LOGICAL_OR, parse_logical_or, Some(compile_binary))?;
    registry.register(names::LOGICAL_AND, parse_logical_and, Some(compile_binary))?;
    registry.register(names::EQUALITY, parse_equality, Some(compile_binary))?;
    registry.register(names::RELATIONAL, parse_relational, Some(compile_binary))?;
    registry.register(names::ADDITIVE, parse_additive, Some(compile_binary))?;
    registry.register(
        names::MULTIPLICATIVE,
        parse_multiplicative,
        Some(compile_binary),
    )?;
    registry.register(names::UNARY, parse_unary, Some(compile_unary))?;
    registry.register(names::POSTFIX, parse_postfix, Some(compile_postfix))?;
    registry.register(names::PRIMARY, parse_primary, None)?;
    registry.register(names::CALL, parse_call, Some(compile_call))?;
    registry.register(names::IDENTIFIER, parse_identifier, Some(compile_identifier))?;
    registry.register(names::LITERAL, parse_literal, Some(compile_literal))?;
    Ok(())
}

// ===== Parsing =====

fn parse_expr(p: &mut Parser<'_>) -> Result<Parsed, ParseError> {
    Ok(Parsed::Forward(p.parse(names::ASSIGNMENT)?))
}

fn parse_assignment(p: &mut Parser<'_>) -> Result<Parsed, ParseError> {
    let left = p.parse(names::LOGICAL_OR)?;
    if !p.pop_if_is(TokenKind::Assign) {
        return Ok(Parsed::Forward(left));
    }
    let right = if p.next_is(TokenKind::LBrace) {
        p.parse(names::ARRAY_INIT)?
    } else {
        p.parse(names::ASSIGNMENT)?
    };
    Ok(Parsed::Node(Content::Assign {
        left: Box::new(left),
        right: Box::new(right),
    }))
}

fn parse_array_init(p: &mut Parser<'_>) -> Result<Parsed, ParseError> {
    p.pop(TokenKind::LBrace)?;
    let mut values = Vec::new();
    if !p.next_is(TokenKind::RBrace) {
        loop {
            values.push(p.parse(names::ASSIGNMENT)?);
            if !p.pop_if_is(TokenKind::Comma) {
                break;
            }
        }
    }
    p.pop(TokenKind::RBrace)?;
    Ok(Parsed::Node(Content::ArrayInit { values }))
}

/// Left-associative chain of `operand (op operand)*`, tagged with `level`
fn binary_level(
    p: &mut Parser<'_>,
    level: &'static str,
    operand: &'static str,
    operators: &[(TokenKind, BinOp)],
) -> Result<Parsed, ParseError> {
    let starts_at = p.current_location();
    let mut left = p.parse(operand)?;
    loop {
        let next = p.peek_kind();
        let Some(&(_, op)) = operators.iter().find(|(kind, _)| *kind == next) else {
            break;
        };
        p.advance();
        let right = p.parse(operand)?;
        left = AstNode::new(
            level,
            Content::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            starts_at,
        );
    }
    Ok(Parsed::Forward(left))
}

fn parse_logical_or(p: &mut Parser<'_>) -> Result<Parsed, ParseError> {
    binary_level(
        p,
        names::LOGICAL_OR,
        names::LOGICAL_AND,
        &[(TokenKind::OrOr, BinOp::Or)],
    )
}

fn parse_logical_and(p: &mut Parser<'_>) -> Result<Parsed, ParseError> {
    binary_level(
        p,
        names::LOGICAL_AND,
        names::EQUALITY,
        &[(TokenKind::AndAnd, BinOp::And)],
    )
}

fn parse_equality(p: &mut Parser<'_>) -> Result<Parsed, ParseError> {
    binary_level(
        p,
        names::EQUALITY,
        names::RELATIONAL,
        &[(TokenKind::EqEq, BinOp::Eq), (TokenKind::NotEq, BinOp::Ne)],
    )
}

fn parse_relational(p: &mut Parser<'_>) -> Result<Parsed, ParseError> {
    binary_level(
        p,
        names::RELATIONAL,
        names::ADDITIVE,
        &[
            (TokenKind::Lt, BinOp::Lt),
            (TokenKind::Le, BinOp::Le),
            (TokenKind::Gt, BinOp::Gt),
            (TokenKind::Ge, BinOp::Ge),
        ],
    )
}

fn parse_additive(p: &mut Parser<'_>) -> Result<Parsed, ParseError> {
    binary_level(
        p,
        names::ADDITIVE,
        names::MULTIPLICATIVE,
        &[(TokenKind::Plus, BinOp::Add), (TokenKind::Minus, BinOp::Sub)],
    )
}

fn parse_multiplicative(p: &mut Parser<'_>) -> Result<Parsed, ParseError> {
    binary_level(
        p,
        names::MULTIPLICATIVE,
        names::UNARY,
        &[
            (TokenKind::Star, BinOp::Mul),
            (TokenKind::Slash, BinOp::Div),
            (TokenKind::Percent, BinOp::Mod),
        ],
    )
}

fn parse_unary(p: &mut Parser<'_>) -> Result<Parsed, ParseError> {
    let op = match p.peek_kind() {
        TokenKind::Minus => UnOp::Neg,
        TokenKind::Bang => UnOp::Not,
        TokenKind::Star => UnOp::Deref,
        TokenKind::Amp => UnOp::AddrOf,
        TokenKind::Sizeof => return parse_sizeof(p),
        _ => return Ok(Parsed::Forward(p.parse(names::POSTFIX)?)),
    };
    p.advance();
    let operand = Box::new(p.parse(names::UNARY)?);
    Ok(Parsed::Node(Content::Unary { op, operand }))
}

fn parse_sizeof(p: &mut Parser<'_>) -> Result<Parsed, ParseError> {
    p.pop(TokenKind::Sizeof)?;
    if p.next_is(TokenKind::LParen) && p.peek_ahead(1).starts_type() {
        p.advance();
        let name = type_name(p)?;
        let pointers = p.pop_many(TokenKind::Star).len();
        p.pop(TokenKind::RParen)?;
        return Ok(Parsed::Node(Content::Sizeof(SizeofTarget::Type {
            name,
            pointers,
        })));
    }
    let operand = p.parse(names::UNARY)?;
    Ok(Parsed::Node(Content::Sizeof(SizeofTarget::Expr(Box::new(
        operand,
    )))))
}

fn parse_postfix(p: &mut Parser<'_>) -> Result<Parsed, ParseError> {
    let starts_at = p.current_location();
    let mut node = p.parse(names::PRIMARY)?;
    loop {
        let content = match p.peek_kind() {
            TokenKind::LBracket => {
                p.advance();
                let index = p.parse(names::EXPR)?;
                p.pop(TokenKind::RBracket)?;
                Content::Index {
                    base: Box::new(node),
                    index: Box::new(index),
                }
            }
            TokenKind::Dot => {
                p.advance();
                let field = p.pop(TokenKind::Ident)?.content;
                Content::Member {
                    object: Box::new(node),
                    field,
                }
            }
            TokenKind::Arrow => {
                p.advance();
                let field = p.pop(TokenKind::Ident)?.content;
                Content::PointerMember {
                    pointer: Box::new(node),
                    field,
                }
            }
            _ => break,
        };
        node = AstNode::new(names::POSTFIX, content, starts_at);
    }
    Ok(Parsed::Forward(node))
}

fn parse_primary(p: &mut Parser<'_>) -> Result<Parsed, ParseError> {
    let node = match p.peek_kind() {
        TokenKind::Ident if p.peek_ahead(1) == TokenKind::LParen => p.parse(names::CALL)?,
        TokenKind::Ident => p.parse(names::IDENTIFIER)?,
        TokenKind::IntLiteral
        | TokenKind::CharLiteral
        | TokenKind::StringLiteral
        | TokenKind::Null => p.parse(names::LITERAL)?,
        TokenKind::LParen => {
            p.advance();
            let inner = p.parse(names::EXPR)?;
            p.pop(TokenKind::RParen)?;
            inner
        }
        _ => return Err(p.unexpected("an expression")),
    };
    Ok(Parsed::Forward(node))
}

fn parse_call(p: &mut Parser<'_>) -> Result<Parsed, ParseError> {
    let name = p.pop(TokenKind::Ident)?.content;
    p.pop(TokenKind::LParen)?;
    let mut args = Vec::new();
    if !p.next_is(TokenKind::RParen) {
        loop {
            args.push(p.parse(names::ASSIGNMENT)?);
            if !p.pop_if_is(TokenKind::Comma) {
                break;
            }
        }
    }
    p.pop(TokenKind::RParen)?;
    Ok(Parsed::Node(Content::Call { name, args }))
}

fn parse_identifier(p: &mut Parser<'_>) -> Result<Parsed, ParseError> {
    let name = p.pop(TokenKind::Ident)?.content;
    Ok(Parsed::Node(Content::Identifier(name)))
}

fn parse_literal(p: &mut Parser<'_>) -> Result<Parsed, ParseError> {
    let token = p.advance();
    let content = match token.kind {
        TokenKind::IntLiteral => {
            let value = token.content.parse::<i32>().map_err(|_| {
                ParseError::new(
                    format!("integer literal '{}' is out of range", token.content),
                    token.location,
                )
            })?;
            Content::IntLiteral(value)
        }
        TokenKind::CharLiteral => {
            let ch = token.content.chars().next().unwrap_or('\0');
            Content::CharLiteral(ch as u32 as u8 as i8)
        }
        TokenKind::StringLiteral => Content::StringLiteral(token.content),
        TokenKind::Null => Content::Null,
        _ => {
            return Err(ParseError::new(
                format!("expected a literal, but found {}", token),
                token.location,
            ))
        }
    };
    Ok(Parsed::Node(content))
}

// ===== Compilation =====

fn expr(kind: ExprKind, ty: Type, node: &AstNode) -> Result<Lowered, CompileError> {
    Ok(Lowered::Expr(Expr::new(kind, ty, node.starts_at)))
}

fn malformed(node: &AstNode) -> CompileError {
    CompileError::new(
        format!("malformed '{}' node", node.production),
        node.starts_at,
    )
}

/// Lower an expression whose value is used
pub(crate) fn value(c: &mut Compiler<'_>, node: &AstNode) -> Result<Expr, CompileError> {
    let expr = c.compile_expr(node)?;
    if expr.ty.is_void() {
        return Err(CompileError::new(
            "void value not ignored as it ought to be",
            node.starts_at,
        ));
    }
    Ok(expr)
}

fn compile_assignment(c: &mut Compiler<'_>, node: &AstNode) -> Result<Lowered, CompileError> {
    let Content::Assign { left, right } = &node.content else {
        return Err(malformed(node));
    };
    let dst = c.compile_expr(left)?;

    if let (Content::ArrayInit { values }, Some(length)) = (&right.content, c.array_length(&dst)) {
        return compile_array_assign(c, dst, length, values, right).map(Lowered::Expr);
    }

    if !dst.is_place() {
        return Err(CompileError::new(
            "lvalue required as left operand of assignment",
            left.starts_at,
        ));
    }
    if c.array_length(&dst).is_some() {
        return Err(CompileError::new(
            "assignment to expression with array type",
            left.starts_at,
        ));
    }

    let src = value(c, right)?;
    if !is_assignable(&dst.ty, &src.ty) {
        return Err(CompileError::new(
            format!(
                "incompatible types when assigning to type '{}' from type '{}'",
                dst.ty, src.ty
            ),
            node.starts_at,
        ));
    }
    Ok(Lowered::Expr(Expr::assign(dst, src)))
}

/// `array = { ... }`: checked now, evaluated element by element at run time
fn compile_array_assign(
    c: &mut Compiler<'_>,
    dst: Expr,
    length: u32,
    values: &[AstNode],
    init: &AstNode,
) -> Result<Expr, CompileError> {
    if values.len() > length as usize {
        return Err(CompileError::new(
            format!(
                "too many initializers for array of length {}, got {}",
                length,
                values.len()
            ),
            init.starts_at,
        ));
    }
    let element = dst.ty.deref().ok_or_else(|| malformed(init))?;
    if !element.is_scalar() {
        return Err(CompileError::new(
            format!("initializer lists of '{}' elements are not supported", element),
            init.starts_at,
        ));
    }
    for node in values {
        let lowered = value(c, node)?;
        if !is_assignable(&element, &lowered.ty) {
            return Err(CompileError::new(
                format!(
                    "incompatible types when initializing type '{}' using type '{}'",
                    element, lowered.ty
                ),
                node.starts_at,
            ));
        }
    }
    let scope = Arc::new(c.visible_names());
    Ok(Expr::array_assign(dst, values.to_vec(), scope))
}

fn compile_array_init(_: &mut Compiler<'_>, node: &AstNode) -> Result<Lowered, CompileError> {
    Err(CompileError::new(
        "initializer list is only valid when assigning to an array",
        node.starts_at,
    ))
}

fn invalid_operands(op: BinOp, left: &Expr, right: &Expr, node: &AstNode) -> CompileError {
    CompileError::new(
        format!(
            "invalid operands to binary {} (have '{}' and '{}')",
            op.symbol(),
            left.ty,
            right.ty
        ),
        node.starts_at,
    )
}

fn compile_binary(c: &mut Compiler<'_>, node: &AstNode) -> Result<Lowered, CompileError> {
    let Content::Binary { op, left, right } = &node.content else {
        return Err(malformed(node));
    };
    let op = *op;
    let lhs = value(c, left)?;
    let rhs = value(c, right)?;
    let (l, r) = (&lhs.ty, &rhs.ty);

    match op {
        BinOp::Add | BinOp::Sub if l.is_arithmetic() && r.is_arithmetic() => {}
        BinOp::Add if l.is_pointer() && r.is_arithmetic() => {
            return pointer_offset(c, lhs, rhs, false, node);
        }
        BinOp::Add if l.is_arithmetic() && r.is_pointer() => {
            return pointer_offset(c, rhs, lhs, false, node);
        }
        BinOp::Sub if l.is_pointer() && r.is_arithmetic() => {
            return pointer_offset(c, lhs, rhs, true, node);
        }
        BinOp::Sub if l.is_pointer() && l == r => {
            let pointee = l.deref().ok_or_else(|| malformed(node))?;
            let scale = c.size_of(&pointee, node.starts_at)?;
            let kind = ExprKind::PointerDiff {
                left: Box::new(lhs),
                right: Box::new(rhs),
                scale,
            };
            return expr(kind, Type::int(), node);
        }
        BinOp::Mul | BinOp::Div | BinOp::Mod if l.is_arithmetic() && r.is_arithmetic() => {}
        BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
            if l.is_scalar() && r.is_scalar() => {}
        BinOp::And | BinOp::Or if l.is_scalar() && r.is_scalar() => {}
        _ => return Err(invalid_operands(op, &lhs, &rhs, node)),
    }

    let kind = ExprKind::Binary {
        op,
        left: Box::new(lhs),
        right: Box::new(rhs),
    };
    expr(kind, Type::int(), node)
}

fn pointer_offset(
    c: &mut Compiler<'_>,
    pointer: Expr,
    offset: Expr,
    subtract: bool,
    node: &AstNode,
) -> Result<Lowered, CompileError> {
    let pointee = pointer.ty.deref().ok_or_else(|| malformed(node))?;
    if pointee.is_void() {
        return Err(CompileError::new(
            "pointer of type 'void*' used in arithmetic",
            node.starts_at,
        ));
    }
    let scale = c.size_of(&pointee, node.starts_at)?;
    let ty = pointer.ty.clone();
    let kind = ExprKind::PointerOffset {
        pointer: Box::new(pointer),
        offset: Box::new(offset),
        scale,
        subtract,
    };
    expr(kind, ty, node)
}

fn compile_unary(c: &mut Compiler<'_>, node: &AstNode) -> Result<Lowered, CompileError> {
    match &node.content {
        Content::Unary { op, operand } => compile_unary_op(c, *op, operand, node),
        Content::Sizeof(target) => {
            let size = match target {
                SizeofTarget::Type { name, pointers } => {
                    let ty = c.resolve_type(name, *pointers, node.starts_at)?;
                    c.size_of(&ty, node.starts_at)?
                }
                SizeofTarget::Expr(operand) => {
                    let lowered = c.compile_expr(operand)?;
                    match c.array_length(&lowered) {
                        Some(length) => {
                            let element = lowered.ty.deref().ok_or_else(|| malformed(node))?;
                            length * c.size_of(&element, node.starts_at)?
                        }
                        None => c.size_of(&lowered.ty, node.starts_at)?,
                    }
                }
            };
            expr(ExprKind::Const(size as i32), Type::int(), node)
        }
        _ => Err(malformed(node)),
    }
}

fn compile_unary_op(
    c: &mut Compiler<'_>,
    op: UnOp,
    operand: &AstNode,
    node: &AstNode,
) -> Result<Lowered, CompileError> {
    match op {
        UnOp::Neg | UnOp::Not => {
            let inner = value(c, operand)?;
            let accepted = match op {
                UnOp::Neg => inner.ty.is_arithmetic(),
                _ => inner.ty.is_scalar(),
            };
            if !accepted {
                let symbol = if op == UnOp::Neg { "minus" } else { "exclamation mark" };
                return Err(CompileError::new(
                    format!("wrong type argument to unary {} ('{}')", symbol, inner.ty),
                    node.starts_at,
                ));
            }
            let kind = ExprKind::Unary {
                op,
                operand: Box::new(inner),
            };
            expr(kind, Type::int(), node)
        }
        UnOp::Deref => {
            let inner = value(c, operand)?;
            let Some(pointee) = inner.ty.deref() else {
                return Err(CompileError::new(
                    format!("invalid type argument of unary '*' (have '{}')", inner.ty),
                    node.starts_at,
                ));
            };
            expr(ExprKind::Deref(Box::new(inner)), pointee, node)
        }
        UnOp::AddrOf => {
            let inner = c.compile_expr(operand)?;
            if !inner.is_place() {
                return Err(CompileError::new(
                    "lvalue required as unary '&' operand",
                    node.starts_at,
                ));
            }
            // an array already evaluates to its first element's address
            let ty = if c.array_length(&inner).is_some() {
                inner.ty.clone()
            } else {
                inner.ty.clone().with_pointer()
            };
            expr(ExprKind::AddrOf(Box::new(inner)), ty, node)
        }
    }
}

fn compile_postfix(c: &mut Compiler<'_>, node: &AstNode) -> Result<Lowered, CompileError> {
    match &node.content {
        Content::Index { base, index } => {
            let mut base = value(c, base)?;
            let mut index_expr = value(c, index)?;
            if base.ty.is_arithmetic() && index_expr.ty.is_pointer() {
                std::mem::swap(&mut base, &mut index_expr);
            }
            if !base.ty.is_pointer() || !index_expr.ty.is_arithmetic() {
                return Err(CompileError::new(
                    "subscripted value is neither array nor pointer",
                    node.starts_at,
                ));
            }
            let element = base.ty.deref().ok_or_else(|| malformed(node))?;
            if element.is_void() {
                return Err(CompileError::new(
                    "dereferencing 'void*' pointer",
                    node.starts_at,
                ));
            }
            let scale = c.size_of(&element, node.starts_at)?;
            let kind = ExprKind::Index {
                base: Box::new(base),
                index: Box::new(index_expr),
                scale,
            };
            expr(kind, element, node)
        }
        Content::Member { object, field } => {
            let object = c.compile_expr(object)?;
            member(c, object, field, node)
        }
        Content::PointerMember { pointer, field } => {
            let pointer = value(c, pointer)?;
            let pointee = pointer
                .ty
                .deref()
                .filter(|t| t.struct_name().is_some())
                .ok_or_else(|| {
                    CompileError::new(
                        format!(
                            "invalid type argument of '->' (have '{}')",
                            pointer.ty
                        ),
                        node.starts_at,
                    )
                })?;
            let object = Expr::new(ExprKind::Deref(Box::new(pointer)), pointee, node.starts_at);
            member(c, object, field, node)
        }
        _ => Err(malformed(node)),
    }
}

fn member(
    c: &mut Compiler<'_>,
    object: Expr,
    field: &str,
    node: &AstNode,
) -> Result<Lowered, CompileError> {
    let Some(struct_name) = object.ty.struct_name() else {
        return Err(CompileError::new(
            format!("request for member '{}' in something not a structure", field),
            node.starts_at,
        ));
    };
    let layout = c.program().struct_named(struct_name).ok_or_else(|| {
        CompileError::new(format!("unknown type 'struct {}'", struct_name), node.starts_at)
    })?;
    let member = layout.member(field).ok_or_else(|| {
        CompileError::new(
            format!("'struct {}' has no member named '{}'", struct_name, field),
            node.starts_at,
        )
    })?;
    let (offset, ty, array) = (member.offset, member.ty.clone(), member.array_length);
    let kind = ExprKind::Member {
        object: Box::new(object),
        offset,
        array,
    };
    expr(kind, ty, node)
}

fn compile_call(c: &mut Compiler<'_>, node: &AstNode) -> Result<Lowered, CompileError> {
    let Content::Call { name, args } = &node.content else {
        return Err(malformed(node));
    };
    let function = c.program().function_by_name(name).ok_or_else(|| {
        CompileError::new(
            format!("implicit declaration of function '{}'", name),
            node.starts_at,
        )
    })?;
    let descriptor = c.program().function(function);
    let return_type = descriptor.return_type.clone();
    let params: Vec<Type> = descriptor
        .params
        .iter()
        .map(|id| c.symbol(*id).ty.clone())
        .collect();

    if args.len() != params.len() {
        let amount = if args.len() > params.len() { "many" } else { "few" };
        return Err(CompileError::new(
            format!("too {} arguments to function '{}'", amount, name),
            node.starts_at,
        ));
    }

    let mut lowered = Vec::with_capacity(args.len());
    for (i, (arg, param)) in args.iter().zip(&params).enumerate() {
        let arg_expr = value(c, arg)?;
        if !is_assignable(param, &arg_expr.ty) {
            return Err(CompileError::new(
                format!(
                    "incompatible type for argument {} of '{}': expected '{}' but got '{}'",
                    i + 1,
                    name,
                    param,
                    arg_expr.ty
                ),
                arg.starts_at,
            ));
        }
        lowered.push(arg_expr);
    }

    let struct_allocation = match args.first().map(|a| &a.content) {
        Some(Content::Sizeof(SizeofTarget::Type {
            name: TypeName::Struct(struct_name),
            pointers: 0,
        })) if descriptor_is_malloc(c, function) => c.program().struct_by_name(struct_name),
        _ => None,
    };

    let kind = ExprKind::Call {
        function,
        args: lowered,
        struct_allocation,
    };
    expr(kind, return_type, node)
}

fn descriptor_is_malloc(c: &Compiler<'_>, function: FunctionId) -> bool {
    let descriptor = c.program().function(function);
    descriptor.is_builtin() && descriptor.name == "malloc"
}

fn compile_identifier(c: &mut Compiler<'_>, node: &AstNode) -> Result<Lowered, CompileError> {
    let Content::Identifier(name) = &node.content else {
        return Err(malformed(node));
    };
    let id = c.lookup(name, node.starts_at)?;
    let ty = c.symbol(id).ty.clone();
    expr(ExprKind::Var(id), ty, node)
}

fn compile_literal(c: &mut Compiler<'_>, node: &AstNode) -> Result<Lowered, CompileError> {
    match &node.content {
        Content::IntLiteral(value) => expr(ExprKind::Const(*value), Type::int(), node),
        Content::CharLiteral(value) => expr(ExprKind::Const(*value as i32), Type::char(), node),
        Content::StringLiteral(text) => {
            let id = c.intern_string(text, node.starts_at)?;
            expr(ExprKind::Str(id), Type::char().with_pointer(), node)
        }
        Content::Null => expr(ExprKind::Const(0), Type::void_pointer(), node),
        _ => Err(malformed(node)),
    }
}
