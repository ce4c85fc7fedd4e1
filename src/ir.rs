//! Instruction nodes produced by the compiler and interpreted by the runtime
//!
//! An [`Expr`] is either already-available data (a constant, a string
//! literal, a variable binding) or a pending instruction (arithmetic, a call,
//! an assignment...). The interpreter reduces either kind to a concrete
//! value through its resolver. [`Stmt`] covers control flow.
//!
//! IR is immutable once compiled and shared between every call of the
//! function that owns it.

use crate::compiler::symbols::{FunctionId, StringId, StructId, SymbolId};
use crate::compiler::types::Type;
use crate::compiler::NameScope;
use crate::memory::Word;
use crate::parser::ast::{AstNode, BinOp, SourceLocation, UnOp};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: Type,
    pub location: SourceLocation,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    /// Literal or folded constant
    Const(Word),
    /// Address of an interned string literal
    Str(StringId),
    /// The current binding of a variable
    Var(SymbolId),
    /// Field of a struct-typed place; `array` is the element count of array fields
    Member {
        object: Box<Expr>,
        offset: u32,
        array: Option<u32>,
    },
    /// `*pointer`
    Deref(Box<Expr>),
    /// `base[index]`, element size precomputed in `scale`
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
        scale: u32,
    },
    /// `&operand`
    AddrOf(Box<Expr>),
    /// `-x`, `!x`
    Unary { op: UnOp, operand: Box<Expr> },
    /// Integer arithmetic, comparisons, and short-circuit logic
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `pointer ± offset`, scaled by the pointee size
    PointerOffset {
        pointer: Box<Expr>,
        offset: Box<Expr>,
        scale: u32,
        subtract: bool,
    },
    /// `p - q`, in elements
    PointerDiff {
        left: Box<Expr>,
        right: Box<Expr>,
        scale: u32,
    },
    Call {
        function: FunctionId,
        args: Vec<Expr>,
        /// Set for `malloc(sizeof(struct S))` so the visualizer can track the instance
        struct_allocation: Option<StructId>,
    },
    Assign { dst: Box<Expr>, src: Box<Expr> },
    /// `array = { v1, v2, ... }`; values are lowered one at a time when executed,
    /// resolving names against the locals visible at the assignment
    ArrayAssign {
        dst: Box<Expr>,
        values: Vec<AstNode>,
        scope: Arc<NameScope>,
    },
}

impl Expr {
    pub fn new(kind: ExprKind, ty: Type, location: SourceLocation) -> Self {
        Expr { kind, ty, location }
    }

    pub fn constant(value: Word, ty: Type, location: SourceLocation) -> Self {
        Expr::new(ExprKind::Const(value), ty, location)
    }

    pub fn var(symbol: SymbolId, ty: Type, location: SourceLocation) -> Self {
        Expr::new(ExprKind::Var(symbol), ty, location)
    }

    pub fn assign(dst: Expr, src: Expr) -> Self {
        let ty = dst.ty.clone();
        let location = dst.location;
        Expr::new(
            ExprKind::Assign {
                dst: Box::new(dst),
                src: Box::new(src),
            },
            ty,
            location,
        )
    }

    pub fn array_assign(dst: Expr, values: Vec<AstNode>, scope: Arc<NameScope>) -> Self {
        let ty = dst.ty.clone();
        let location = dst.location;
        Expr::new(
            ExprKind::ArrayAssign {
                dst: Box::new(dst),
                values,
                scope,
            },
            ty,
            location,
        )
    }

    /// Whether this expression designates a memory location
    pub fn is_place(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Var(_) | ExprKind::Member { .. } | ExprKind::Deref(_) | ExprKind::Index { .. }
        )
    }
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub location: SourceLocation,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Expr(Expr),
    Block(Vec<Stmt>),
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        condition: Expr,
    },
    For {
        init: Option<Expr>,
        condition: Option<Expr>,
        increment: Option<Expr>,
        body: Box<Stmt>,
    },
    Return(Option<Expr>),
    Break,
    Continue,
    Empty,
}

impl Stmt {
    pub fn new(kind: StmtKind, location: SourceLocation) -> Self {
        Stmt { kind, location }
    }
}

/// Terminal instruction forming the whole body of a builtin function
///
/// Each variant names the parameter symbols it reads its arguments from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinOp {
    HighlightIndex {
        array: SymbolId,
        index: SymbolId,
        color: SymbolId,
    },
    ClearHighlight {
        array: SymbolId,
    },
    Malloc {
        size: SymbolId,
    },
    Free {
        pointer: SymbolId,
    },
}
