//! Compile-time constant evaluation
//!
//! Array sizes must reduce to a constant without running anything, so this
//! walks an already-lowered expression and folds literals, `sizeof`, unary
//! and binary integer operators. Anything that would read memory or call a
//! function is not constant. Overflow and division by zero are not constant
//! either; the runtime reports those.

use crate::ir::{Expr, ExprKind};
use crate::memory::Word;
use crate::parser::ast::{BinOp, UnOp};

pub fn evaluate(expr: &Expr) -> Option<Word> {
    match &expr.kind {
        ExprKind::Const(value) => Some(*value),
        ExprKind::Unary { op, operand } => {
            let value = evaluate(operand)?;
            match op {
                UnOp::Neg => value.checked_neg(),
                UnOp::Not => Some((value == 0) as Word),
                UnOp::Deref | UnOp::AddrOf => None,
            }
        }
        ExprKind::Binary { op, left, right } => {
            let lhs = evaluate(left)?;
            match op {
                BinOp::And if lhs == 0 => return Some(0),
                BinOp::Or if lhs != 0 => return Some(1),
                _ => {}
            }
            let rhs = evaluate(right)?;
            fold_binary(*op, lhs, rhs)
        }
        _ => None,
    }
}

/// Integer semantics shared with the runtime: `None` on overflow or division by zero
pub fn fold_binary(op: BinOp, lhs: Word, rhs: Word) -> Option<Word> {
    match op {
        BinOp::Add => lhs.checked_add(rhs),
        BinOp::Sub => lhs.checked_sub(rhs),
        BinOp::Mul => lhs.checked_mul(rhs),
        BinOp::Div => lhs.checked_div(rhs),
        BinOp::Mod => lhs.checked_rem(rhs),
        BinOp::Eq => Some((lhs == rhs) as Word),
        BinOp::Ne => Some((lhs != rhs) as Word),
        BinOp::Lt => Some((lhs < rhs) as Word),
        BinOp::Le => Some((lhs <= rhs) as Word),
        BinOp::Gt => Some((lhs > rhs) as Word),
        BinOp::Ge => Some((lhs >= rhs) as Word),
        BinOp::And => Some((lhs != 0 && rhs != 0) as Word),
        BinOp::Or => Some((lhs != 0 || rhs != 0) as Word),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::symbols::SymbolId;
    use crate::compiler::types::Type;
    use crate::parser::ast::SourceLocation;

    fn int(value: Word) -> Expr {
        Expr::constant(value, Type::int(), SourceLocation::default())
    }

    fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
        Expr::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            Type::int(),
            SourceLocation::default(),
        )
    }

    #[test]
    fn test_folds_nested_arithmetic() {
        let expr = binary(BinOp::Mul, binary(BinOp::Add, int(2), int(3)), int(4));
        assert_eq!(evaluate(&expr), Some(20));
    }

    #[test]
    fn test_negation() {
        let expr = Expr::new(
            ExprKind::Unary {
                op: UnOp::Neg,
                operand: Box::new(int(1)),
            },
            Type::int(),
            SourceLocation::default(),
        );
        assert_eq!(evaluate(&expr), Some(-1));
    }

    #[test]
    fn test_variables_are_not_constant() {
        let var = Expr::var(SymbolId(0), Type::int(), SourceLocation::default());
        assert_eq!(evaluate(&binary(BinOp::Add, var, int(1))), None);
    }

    #[test]
    fn test_division_by_zero_is_not_constant() {
        assert_eq!(evaluate(&binary(BinOp::Div, int(1), int(0))), None);
        assert_eq!(evaluate(&binary(BinOp::Add, int(Word::MAX), int(1))), None);
    }

    #[test]
    fn test_short_circuit() {
        let var = Expr::var(SymbolId(0), Type::int(), SourceLocation::default());
        assert_eq!(evaluate(&binary(BinOp::And, int(0), var.clone())), Some(0));
        assert_eq!(evaluate(&binary(BinOp::Or, int(2), var)), Some(1));
    }
}
