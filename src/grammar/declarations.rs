//! Top-level and declaration productions
//!
//! `program`, `struct-def`, `function-def`, `param`, `type`, `var-dec` and
//! `var-item`. The single `var-dec` compile step records metadata only: struct
//! members get their offsets, everything else becomes a [`Symbol`] whose
//! storage the interpreter binds later.
//!
//! [`Symbol`]: crate::compiler::symbols::Symbol

use super::{names, GrammarRegistry, Parsed, RegistryError};
use crate::compiler::symbols::ArraySpec;
use crate::compiler::{constant, CompileError, Compiler, Lowered};
use crate::parser::ast::{ArrayDeclarator, AstNode, Content, TypeName};
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};

pub(super) fn register(registry: &mut GrammarRegistry) -> Result<(), RegistryError> {
    registry.register(names::PROGRAM, parse_program, Some(compile_program))?;
    registry.register(names::STRUCT_DEF, parse_struct_def, Some(compile_struct_def))?;
    registry.register(
        names::FUNCTION_DEF,
        parse_function_def,
        Some(compile_function_def),
    )?;
    registry.register(names::PARAM, parse_param, Some(compile_param))?;
    registry.register(names::TYPE, parse_type, None)?;
    registry.register(names::VAR_DEC, parse_var_dec, Some(compile_var_dec))?;
    registry.register(names::VAR_ITEM, parse_var_item, None)?;
    Ok(())
}

// ===== Parsing =====

fn parse_program(p: &mut Parser<'_>) -> Result<Parsed, ParseError> {
    let mut items = Vec::new();
    while !p.is_at_end() {
        let is_struct_def = p.next_is(TokenKind::Struct)
            && p.peek_ahead(1) == TokenKind::Ident
            && p.peek_ahead(2) == TokenKind::LBrace;

        let item = if is_struct_def {
            p.parse(names::STRUCT_DEF)?
        } else if starts_function(p) {
            p.parse(names::FUNCTION_DEF)?
        } else {
            p.parse(names::VAR_DEC)?
        };
        items.push(item);
    }
    Ok(Parsed::Node(Content::Program { items }))
}

/// `type *...* name (` marks a function definition
fn starts_function(p: &Parser<'_>) -> bool {
    let mut n = if p.next_is(TokenKind::Struct) { 2 } else { 1 };
    while p.peek_ahead(n) == TokenKind::Star {
        n += 1;
    }
    p.peek_ahead(n) == TokenKind::Ident && p.peek_ahead(n + 1) == TokenKind::LParen
}

fn parse_struct_def(p: &mut Parser<'_>) -> Result<Parsed, ParseError> {
    p.pop(TokenKind::Struct)?;
    let name = p.pop(TokenKind::Ident)?.content;
    p.pop(TokenKind::LBrace)?;
    let mut members = Vec::new();
    while !p.next_is(TokenKind::RBrace) {
        members.push(p.parse(names::VAR_DEC)?);
    }
    p.pop(TokenKind::RBrace)?;
    p.pop(TokenKind::Semicolon)?;
    Ok(Parsed::Node(Content::StructDef { name, members }))
}

fn parse_function_def(p: &mut Parser<'_>) -> Result<Parsed, ParseError> {
    let return_type = type_name(p)?;
    let pointers = p.pop_many(TokenKind::Star).len();
    let name = p.pop(TokenKind::Ident)?.content;

    p.pop(TokenKind::LParen)?;
    let mut params = Vec::new();
    if p.next_is(TokenKind::Void) && p.peek_ahead(1) == TokenKind::RParen {
        p.advance();
    } else if !p.next_is(TokenKind::RParen) {
        loop {
            params.push(p.parse(names::PARAM)?);
            if !p.pop_if_is(TokenKind::Comma) {
                break;
            }
        }
    }
    p.pop(TokenKind::RParen)?;

    let body = Box::new(p.parse(names::BLOCK)?);
    Ok(Parsed::Node(Content::FunctionDef {
        return_type,
        pointers,
        name,
        params,
        body,
    }))
}

fn parse_param(p: &mut Parser<'_>) -> Result<Parsed, ParseError> {
    let type_name = type_name(p)?;
    let item = Box::new(p.parse(names::VAR_ITEM)?);
    Ok(Parsed::Node(Content::Param { type_name, item }))
}

fn parse_type(p: &mut Parser<'_>) -> Result<Parsed, ParseError> {
    let name = match p.peek_kind() {
        TokenKind::Int => TypeName::Int,
        TokenKind::Char => TypeName::Char,
        TokenKind::Void => TypeName::Void,
        TokenKind::Struct => {
            p.advance();
            let name = p.pop(TokenKind::Ident)?.content;
            return Ok(Parsed::Node(Content::Type(TypeName::Struct(name))));
        }
        _ => return Err(p.unexpected("a type")),
    };
    p.advance();
    Ok(Parsed::Node(Content::Type(name)))
}

/// Run the `type` production and unwrap its payload
pub(super) fn type_name(p: &mut Parser<'_>) -> Result<TypeName, ParseError> {
    let node = p.parse(names::TYPE)?;
    match node.content {
        Content::Type(name) => Ok(name),
        _ => Err(ParseError::new("expected a type", node.starts_at)),
    }
}

fn parse_var_dec(p: &mut Parser<'_>) -> Result<Parsed, ParseError> {
    let type_name = type_name(p)?;
    let mut items = vec![p.parse(names::VAR_ITEM)?];
    while p.pop_if_is(TokenKind::Comma) {
        items.push(p.parse(names::VAR_ITEM)?);
    }
    p.pop(TokenKind::Semicolon)?;
    Ok(Parsed::Node(Content::VarDec { type_name, items }))
}

fn parse_var_item(p: &mut Parser<'_>) -> Result<Parsed, ParseError> {
    let pointers = p.pop_many(TokenKind::Star).len();
    let name = p.pop(TokenKind::Ident)?.content;

    let array = if p.pop_if_is(TokenKind::LBracket) {
        if p.pop_if_is(TokenKind::RBracket) {
            Some(ArrayDeclarator::Unsized)
        } else {
            let size = p.parse(names::EXPR)?;
            p.pop(TokenKind::RBracket)?;
            Some(ArrayDeclarator::Sized(Box::new(size)))
        }
    } else {
        None
    };

    Ok(Parsed::Node(Content::VarItem {
        pointers,
        name,
        array,
    }))
}

// ===== Compilation =====

fn compile_program(c: &mut Compiler<'_>, node: &AstNode) -> Result<Lowered, CompileError> {
    let Content::Program { items } = &node.content else {
        return Err(mismatch(node));
    };
    for item in items {
        c.compile(item)?;
    }
    tracing::debug!(
        functions = c.program().functions().count(),
        globals = c.program().globals().len(),
        "program compiled"
    );
    Ok(Lowered::Declared)
}

fn compile_struct_def(c: &mut Compiler<'_>, node: &AstNode) -> Result<Lowered, CompileError> {
    let Content::StructDef { name, members } = &node.content else {
        return Err(mismatch(node));
    };
    if members.is_empty() {
        return Err(CompileError::new(
            format!("struct '{}' has no members", name),
            node.starts_at,
        ));
    }
    c.begin_struct(name, node.starts_at)?;
    for member in members {
        c.compile(member)?;
    }
    c.finish_struct(node.starts_at)?;
    Ok(Lowered::Declared)
}

fn compile_function_def(c: &mut Compiler<'_>, node: &AstNode) -> Result<Lowered, CompileError> {
    let Content::FunctionDef {
        return_type,
        pointers,
        name,
        params,
        body,
    } = &node.content
    else {
        return Err(mismatch(node));
    };

    let return_type = c.resolve_type(return_type, *pointers, node.starts_at)?;
    if return_type.struct_name().is_some() {
        return Err(CompileError::new(
            format!("function '{}' cannot return '{}' by value", name, return_type),
            node.starts_at,
        ));
    }

    c.begin_function(name, return_type, node.starts_at)?;
    for param in params {
        c.compile(param)?;
    }
    let body = c.compile_stmt(body)?;
    c.finish_function(body)?;
    Ok(Lowered::Declared)
}

fn compile_param(c: &mut Compiler<'_>, node: &AstNode) -> Result<Lowered, CompileError> {
    let Content::Param { type_name, item } = &node.content else {
        return Err(mismatch(node));
    };
    let Content::VarItem {
        pointers,
        name,
        array,
    } = &item.content
    else {
        return Err(mismatch(item));
    };

    // `int v[]` and `int v[N]` both decay to `int *v`
    let pointers = pointers + usize::from(array.is_some());
    let ty = c.resolve_type(type_name, pointers, item.starts_at)?;
    if ty.is_void() {
        return Err(CompileError::new(
            format!("parameter '{}' declared void", name),
            item.starts_at,
        ));
    }
    if ty.struct_name().is_some() {
        return Err(CompileError::new(
            format!("parameter '{}' cannot take '{}' by value", name, ty),
            item.starts_at,
        ));
    }
    let size = c.size_of(&ty, item.starts_at)?;
    c.declare(name, ty, size, None, true, item.starts_at)?;
    Ok(Lowered::Declared)
}

fn compile_var_dec(c: &mut Compiler<'_>, node: &AstNode) -> Result<Lowered, CompileError> {
    let Content::VarDec { type_name, items } = &node.content else {
        return Err(mismatch(node));
    };

    for item in items {
        let Content::VarItem {
            pointers,
            name,
            array,
        } = &item.content
        else {
            return Err(mismatch(item));
        };
        let at = item.starts_at;

        let ty = c.resolve_type(type_name, *pointers, at)?;
        if ty.is_void() {
            return Err(CompileError::new(
                format!("variable '{}' declared void", name),
                at,
            ));
        }

        match array {
            None => {
                let size = c.size_of(&ty, at)?;
                c.declare(name, ty, size, None, false, at)?;
            }
            Some(ArrayDeclarator::Unsized) => {
                return Err(CompileError::new(
                    format!("array size missing in '{}'", name),
                    at,
                ));
            }
            Some(ArrayDeclarator::Sized(size_node)) => {
                let length_expr = c.compile_expr(size_node)?;
                if !length_expr.ty.is_arithmetic() {
                    return Err(CompileError::new(
                        format!("size of array '{}' has non-integer type", name),
                        at,
                    ));
                }
                let length = constant::evaluate(&length_expr).ok_or_else(|| {
                    CompileError::new("array size must be a constant integer expression", at)
                })?;
                if length <= 0 {
                    return Err(CompileError::new(
                        format!("array size must be positive, got {}", length),
                        at,
                    ));
                }
                let length = length as u32;
                let element_size = c.size_of(&ty, at)?;
                let size = length.checked_mul(element_size).ok_or_else(|| {
                    CompileError::new(format!("size of array '{}' is too large", name), at)
                })?;
                let spec = ArraySpec {
                    length,
                    length_expr,
                };
                c.declare(name, ty.with_pointer(), size, Some(spec), false, at)?;
            }
        }
    }
    Ok(Lowered::Declared)
}

fn mismatch(node: &AstNode) -> CompileError {
    CompileError::new(
        format!("malformed '{}' node", node.production),
        node.starts_at,
    )
}

#[cfg(test)]
mod tests {
    use crate::compiler::symbols::Program;
    use crate::compiler::types::Type;
    use crate::compiler::{compile_program, CompileError};
    use crate::grammar::{names, GrammarRegistry};
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
    fn test_symbol_sizes() {
        let program = build("int a; char c; int *p; char **q; int arr[10]; char s[3];").unwrap();
        let sizes: Vec<(String, u32)> = program
            .globals()
            .iter()
            .map(|id| {
                let symbol = program.symbol(*id);
                (symbol.name.clone(), symbol.size)
            })
            .collect();
        assert_eq!(
            sizes,
            vec![
                ("a".to_string(), 4),
                ("c".to_string(), 1),
                ("p".to_string(), 4),
                ("q".to_string(), 4),
                ("arr".to_string(), 40),
                ("s".to_string(), 3),
            ]
        );
    }

    #[test]
    fn test_array_symbol_is_pointer_to_element() {
        let program = build("int arr[2 * 3];").unwrap();
        let arr = program.symbol(program.global("arr").unwrap());
        assert_eq!(arr.ty, Type::int().with_pointer());
        assert_eq!(arr.element_type(), Some(Type::int()));
        assert_eq!(arr.array.as_ref().map(|a| a.length), Some(6));
    }

    #[test]
    fn test_negative_array_size() {
        let err = build("int a[-1];").unwrap_err();
        assert_eq!(err.message, "array size must be positive, got -1");
    }

    #[test]
    fn test_zero_and_non_constant_sizes() {
        assert!(build("int a[0];").is_err());
        let err = build("int n; int a[n];").unwrap_err();
        assert_eq!(err.message, "array size must be a constant integer expression");
    }

    #[test]
    fn test_struct_offsets_follow_member_order() {
        let program = build("struct S { char tag; int value; struct S *next; int xs[3]; };")
            .unwrap();
        let layout = program.struct_named("S").unwrap();
        let offsets: Vec<u32> = layout.members.iter().map(|m| m.offset).collect();
        assert_eq!(offsets, vec![0, 1, 5, 9]);
        assert_eq!(layout.total_size, 21);
        assert_eq!(layout.member("xs").and_then(|m| m.array_length), Some(3));
        assert!(program.globals().is_empty());
    }

    #[test]
    fn test_struct_cannot_contain_itself() {
        let err = build("struct S { struct S inner; };").unwrap_err();
        assert!(err.message.contains("incomplete type"), "{}", err.message);
    }

    #[test]
    fn test_void_variable_rejected() {
        let err = build("void v;").unwrap_err();
        assert_eq!(err.message, "variable 'v' declared void");
        assert!(build("void *v;").is_ok());
    }

    #[test]
    fn test_unsized_array_only_as_parameter() {
        let err = build("int a[];").unwrap_err();
        assert_eq!(err.message, "array size missing in 'a'");

        let program = build("int sum(int v[], int n) { return n; }").unwrap();
        let sum = program.function(program.function_by_name("sum").unwrap());
        let v = program.symbol(sum.params[0]);
        assert_eq!(v.ty, Type::int().with_pointer());
        assert!(!v.is_array());
        assert_eq!(v.size, 4);
    }

    #[test]
    fn test_locals_include_nested_blocks_in_order() {
        let program = build(
            "int f(int n) { int a; if (n) { int b; } { int a; } return 0; }",
        )
        .unwrap();
        let f = program.function(program.function_by_name("f").unwrap());
        let names: Vec<&str> = f
            .locals
            .iter()
            .map(|id| program.symbol(*id).name.as_str())
            .collect();
        assert_eq!(names, vec!["n", "a", "b", "a"]);
        assert_eq!(f.params.len(), 1);
    }

    #[test]
    fn test_redeclaration_in_same_block() {
        let err = build("int main() { int a; int a; return 0; }").unwrap_err();
        assert_eq!(err.message, "redeclaration of 'a'");
    }

    #[test]
    fn test_unknown_struct() {
        let err = build("struct Missing *p;").unwrap_err();
        assert_eq!(err.message, "unknown type 'struct Missing'");
    }
}
