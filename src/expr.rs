//! Expression module for representing parsed single-variable expressions.
//!
//! This module defines the tree produced by the parser and the two ways of
//! evaluating it:
//!
//! - `Expr`: A recursive enum of numeric leaves, the variable leaf and binary operations
//! - `FlattenedExpr`: The same tree lowered to a postfix program for the sampling loop
//!
//! Each operation exclusively owns its two children through `Box<Expr>`. The
//! variable is not bound at parse time: its value is passed to `eval`, so a tree
//! can be evaluated at any number of sample points without being rebuilt.
//!
//! # Expression Tree Structure
//! The expression tree is built bottom-up by the parser, each node being one of:
//! - Leaf nodes: Constants and the variable `x`
//! - Operations: an `Operator` with a left and a right operand
//!
//! Named functions are operations too. Their left operand is the placeholder
//! `0` inserted by the parser, and they evaluate as `left + f(right)`.
//!
//! # Flattening
//! `Expr::flatten` walks the tree once and emits a linear sequence of stack
//! operations. Evaluating that sequence avoids recursion in the hot path and
//! performs exactly the same floating point operations in the same order, so
//! both evaluation routes give identical results.

use crate::operators::Operator;

/// An expression tree node.
///
/// The tree is immutable once built. Evaluation is a pure function of the tree
/// and the value of `x` passed in.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A constant floating point value
    Const(f64),
    /// The free variable `x`
    Var,
    /// An operator applied to a left and a right operand
    Op(Operator, Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Builds an operation node from its operator and operands.
    pub fn op(operator: Operator, left: Expr, right: Expr) -> Expr {
        Expr::Op(operator, Box::new(left), Box::new(right))
    }

    /// Evaluates the expression with the variable bound to `x`.
    ///
    /// # Example
    /// ```
    /// use plot_expr::parse;
    ///
    /// let expr = parse("2*x+1").unwrap();
    /// assert_eq!(expr.eval(3.0), 7.0);
    /// assert_eq!(expr.eval(-1.0), -1.0);
    /// ```
    pub fn eval(&self, x: f64) -> f64 {
        match self {
            Expr::Const(value) => *value,
            Expr::Var => x,
            Expr::Op(operator, left, right) => operator.apply(left.eval(x), right.eval(x)),
        }
    }

    /// Returns true if the expression reads the variable anywhere.
    pub fn depends_on_x(&self) -> bool {
        match self {
            Expr::Const(_) => false,
            Expr::Var => true,
            Expr::Op(_, left, right) => left.depends_on_x() || right.depends_on_x(),
        }
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        match self {
            Expr::Const(_) | Expr::Var => 1,
            Expr::Op(_, left, right) => 1 + left.node_count() + right.node_count(),
        }
    }

    /// Lowers the tree into a postfix program.
    ///
    /// Operands are emitted left before right, followed by the operator, which
    /// preserves the evaluation order of `eval`. The maximum stack depth is
    /// recorded so the evaluator can allocate its stack once.
    pub fn flatten(&self) -> FlattenedExpr {
        let mut ops = Vec::with_capacity(self.node_count());
        let max_stack = self.flatten_recursive(&mut ops, 0);

        FlattenedExpr { ops, max_stack }
    }

    /// Emits the program for this subtree and returns the deepest stack it reaches,
    /// given `depth` values already on the stack.
    fn flatten_recursive(&self, ops: &mut Vec<LinearOp>, depth: usize) -> usize {
        match self {
            Expr::Const(value) => {
                ops.push(LinearOp::LoadConst(*value));
                depth + 1
            }
            Expr::Var => {
                ops.push(LinearOp::LoadVar);
                depth + 1
            }
            Expr::Op(operator, left, right) => {
                let left_max = left.flatten_recursive(ops, depth);
                let right_max = right.flatten_recursive(ops, depth + 1);
                ops.push(LinearOp::Apply(*operator));
                left_max.max(right_max)
            }
        }
    }
}

/// Formats the tree in fully parenthesized notation.
///
/// - Constants are formatted as numbers
/// - The variable is formatted as `x`
/// - Arithmetic and power operations are wrapped in parentheses, power as `'`
/// - Named functions show their additive form, e.g. `(0 + sin(x))`
///
/// The output parses back to an equivalent tree as long as every constant is
/// finite. Overflowed literals print as `inf`, which is not part of the grammar.
impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Const(val) => write!(f, "{val}"),
            Expr::Var => write!(f, "x"),
            Expr::Op(Operator::Pow, left, right) => write!(f, "({left}'{right})"),
            Expr::Op(operator, left, right) if operator.is_function() => {
                write!(f, "({left} + {operator}({right}))")
            }
            Expr::Op(operator, left, right) => write!(f, "({left} {operator} {right})"),
        }
    }
}

/// Linear operation for flattened expression evaluation
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum LinearOp {
    /// Push a constant value
    LoadConst(f64),
    /// Push the current value of `x`
    LoadVar,
    /// Pop the right then the left operand and push the operator's result
    Apply(Operator),
}

/// Flattened expression representation for efficient evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedExpr {
    ops: Vec<LinearOp>,
    max_stack: usize,
}

impl FlattenedExpr {
    /// The postfix operation sequence.
    pub fn ops(&self) -> &[LinearOp] {
        &self.ops
    }

    /// Deepest value stack the program needs.
    pub fn max_stack(&self) -> usize {
        self.max_stack
    }

    /// Evaluates the program with the variable bound to `x`.
    ///
    /// Allocates a fresh stack; use `eval_with` inside loops.
    pub fn eval(&self, x: f64) -> f64 {
        let mut stack = Vec::with_capacity(self.max_stack);
        self.eval_with(x, &mut stack)
    }

    /// Evaluates the program reusing `stack` as scratch space.
    ///
    /// The stack is cleared before use, so callers can pass the same buffer for
    /// every sample point.
    #[inline]
    pub fn eval_with(&self, x: f64, stack: &mut Vec<f64>) -> f64 {
        stack.clear();
        for op in &self.ops {
            match op {
                LinearOp::LoadConst(value) => stack.push(*value),
                LinearOp::LoadVar => stack.push(x),
                LinearOp::Apply(operator) => {
                    // Programs only come from `Expr::flatten`, so both operands are present.
                    let right = stack.pop().unwrap_or(f64::NAN);
                    let left = stack.pop().unwrap_or(f64::NAN);
                    stack.push(operator.apply(left, right));
                }
            }
        }
        stack.pop().unwrap_or(f64::NAN)
    }
}

impl From<&Expr> for FlattenedExpr {
    fn from(expr: &Expr) -> Self {
        expr.flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(value: f64) -> Expr {
        Expr::Const(value)
    }

    #[test]
    fn test_eval_leaves() {
        assert_eq!(num(4.5).eval(100.0), 4.5);
        assert_eq!(Expr::Var.eval(5.0), 5.0);
        assert_eq!(Expr::Var.eval(-2.0), -2.0);
    }

    #[test]
    fn test_eval_operations() {
        // 2 * 3 + 4
        let expr = Expr::op(
            Operator::Add,
            Expr::op(Operator::Mul, num(2.0), num(3.0)),
            num(4.0),
        );
        assert_eq!(expr.eval(0.0), 10.0);

        // 0 + cos(x)
        let expr = Expr::op(Operator::Cos, num(0.0), Expr::Var);
        assert_eq!(expr.eval(0.0), 1.0);

        // x ' 3
        let expr = Expr::op(Operator::Pow, Expr::Var, num(3.0));
        assert_eq!(expr.eval(2.0), 8.0);
    }

    #[test]
    fn test_same_tree_different_x() {
        let expr = Expr::op(Operator::Sub, Expr::Var, num(1.0));
        assert_eq!(expr.eval(5.0), 4.0);
        assert_eq!(expr.eval(-2.0), -3.0);
        assert_eq!(expr.eval(5.0), 4.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", num(5.0)), "5");
        assert_eq!(format!("{}", Expr::Var), "x");

        let sum = Expr::op(Operator::Add, Expr::Var, num(2.0));
        assert_eq!(format!("{sum}"), "(x + 2)");

        let power = Expr::op(Operator::Pow, Expr::Var, num(2.0));
        assert_eq!(format!("{power}"), "(x'2)");

        let sine = Expr::op(Operator::Sin, num(0.0), Expr::Var);
        assert_eq!(format!("{sine}"), "(0 + sin(x))");

        let complex = Expr::op(
            Operator::Div,
            Expr::op(Operator::Add, power, sine),
            num(3.0),
        );
        assert_eq!(format!("{complex}"), "(((x'2) + (0 + sin(x))) / 3)");
    }

    #[test]
    fn test_depends_on_x() {
        assert!(!num(1.0).depends_on_x());
        assert!(Expr::op(Operator::Log, num(0.0), Expr::Var).depends_on_x());
        assert!(!Expr::op(Operator::Mul, num(2.0), num(3.0)).depends_on_x());
    }

    #[test]
    fn test_flatten_order() {
        // (x - 1) / 2
        let expr = Expr::op(
            Operator::Div,
            Expr::op(Operator::Sub, Expr::Var, num(1.0)),
            num(2.0),
        );
        let flat = expr.flatten();
        assert_eq!(
            flat.ops(),
            &[
                LinearOp::LoadVar,
                LinearOp::LoadConst(1.0),
                LinearOp::Apply(Operator::Sub),
                LinearOp::LoadConst(2.0),
                LinearOp::Apply(Operator::Div),
            ]
        );
        assert_eq!(flat.max_stack(), 2);
        assert_eq!(flat.eval(5.0), 2.0);
    }

    #[test]
    fn test_flatten_stack_depth() {
        assert_eq!(num(1.0).flatten().max_stack(), 1);

        // 1 + (2 * (3 - x)) keeps four values live at the deepest point
        let expr = Expr::op(
            Operator::Add,
            num(1.0),
            Expr::op(
                Operator::Mul,
                num(2.0),
                Expr::op(Operator::Sub, num(3.0), Expr::Var),
            ),
        );
        let flat = FlattenedExpr::from(&expr);
        assert_eq!(flat.max_stack(), 4);
        assert_eq!(flat.eval(1.0), 5.0);
    }

    #[test]
    fn test_flatten_matches_tree() {
        let expr = Expr::op(
            Operator::Add,
            Expr::op(Operator::Sin, num(0.0), Expr::Var),
            Expr::op(
                Operator::Div,
                Expr::op(Operator::Pow, Expr::Var, num(2.0)),
                Expr::op(Operator::Ctg, num(0.0), Expr::Var),
            ),
        );
        let flat = expr.flatten();
        let mut stack = Vec::new();
        for i in -50..50 {
            let x = i as f64 * 0.37;
            let expected = expr.eval(x);
            let actual = flat.eval_with(x, &mut stack);
            assert!(
                expected.to_bits() == actual.to_bits() || (expected.is_nan() && actual.is_nan()),
                "mismatch at x = {x}: {expected} vs {actual}"
            );
        }
    }
}
