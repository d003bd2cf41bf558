//! Expression parser turning one line of text into an `Expr` tree.
//!
//! The parser makes a single left-to-right pass with two stacks: an operand
//! stack of finished subtrees and an operator stack of pending operators, each
//! carrying the precedence rank it was given when pushed. Before an operator is
//! pushed, every pending operator of equal or higher rank is resolved: its two
//! operands are popped (right first), combined into an `Expr::Op` and pushed
//! back as a single operand. When the input is exhausted everything left is
//! resolved and the single remaining operand is the root.
//!
//! # Grammar
//!
//! - Numbers: decimal digits with an optional fractional part (`12`, `0.5`)
//! - Constants: `e` and `pi`
//! - The variable `x`
//! - Binary operators `+ - * /` and the power operator `'`
//! - Named functions `sin cos tg ctg log`, written before their argument
//! - Parentheses, which raise the precedence of everything inside them
//!
//! Whitespace is skipped and does not end a number, so `1 2` reads as `12`.
//!
//! # Grouping
//!
//! Parentheses do not create nodes. Each `(` adds `PAREN_BIAS` to the rank of
//! every operator pushed until the matching `)`. With `Grouping::Nested` the
//! bias grows with the nesting depth. `Grouping::Flat` keeps a single bias
//! level: `(` sets it, `)` clears it, no matter how deeply groups are nested.

use log::{debug, trace};

use crate::errors::ParseError;
use crate::expr::Expr;
use crate::operators::{match_keyword, Keyword, Operator, PAREN_BIAS};

/// How parentheses affect operator precedence.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum Grouping {
    /// Bias proportional to nesting depth; parentheses must balance
    #[default]
    Nested,
    /// A single bias level with no depth tracking and no balance checks
    Flat,
}

/// Parses expressions with a fixed grouping mode.
///
/// # Example
/// ```
/// use plot_expr::{Grouping, Parser};
///
/// let parser = Parser::with_grouping(Grouping::Nested);
/// let expr = parser.parse("(1+x)*3").unwrap();
/// assert_eq!(expr.eval(1.0), 6.0);
/// ```
#[derive(Debug, Copy, Clone, Default)]
pub struct Parser {
    grouping: Grouping,
}

/// Parses an expression with the default (nested) grouping.
///
/// Empty or blank input yields the constant `0`.
pub fn parse(input: &str) -> Result<Expr, ParseError> {
    Parser::default().parse(input)
}

impl Parser {
    pub fn with_grouping(grouping: Grouping) -> Self {
        Self { grouping }
    }

    /// Parses one expression line into a tree.
    ///
    /// # Errors
    /// Returns `ParseError` if:
    /// - The input contains a character outside of the grammar
    /// - An operator lacks one of its operands
    /// - The input leaves more than one operand, e.g. `2x`
    /// - A number has two decimal points
    /// - Parentheses do not balance (nested grouping only)
    pub fn parse(&self, input: &str) -> Result<Expr, ParseError> {
        if input.trim().is_empty() {
            return Ok(Expr::Const(0.0));
        }

        let mut state = ParseState::new(self.grouping);
        let mut chars = input.char_indices();

        while let Some((position, c)) = chars.next() {
            match c {
                '0'..='9' => state.push_digit(c as u8 - b'0'),
                '.' => state.push_decimal_point(position)?,
                c if c.is_whitespace() => {}
                '(' => state.open_group(position),
                ')' => state.close_group(position)?,
                _ => {
                    if let Some(operator) = Operator::from_char(c) {
                        state.push_operator(operator, position)?;
                        continue;
                    }

                    let (keyword, len) = match_keyword(&input[position..])
                        .ok_or(ParseError::UnexpectedChar { ch: c, position })?;
                    // Keywords are ASCII, so the remaining bytes are single chars.
                    for _ in 1..len {
                        chars.next();
                    }

                    match keyword {
                        Keyword::Constant(value) => state.push_operand(Expr::Const(value)),
                        Keyword::Variable => state.push_operand(Expr::Var),
                        Keyword::Function(operator) => state.push_function(operator, position)?,
                    }
                }
            }
        }

        let root = state.finish()?;
        debug!("Parsed '{}' into {}", input, root);
        Ok(root)
    }
}

/// An operator waiting on the operator stack.
#[derive(Debug, Copy, Clone)]
struct PendingOp {
    operator: Operator,
    precedence: u32,
    position: usize,
}

/// The numeric literal currently being scanned.
///
/// Digits accumulate into an integer mantissa; the literal's value is the
/// mantissa divided by ten to the number of fractional digits seen.
#[derive(Debug, Copy, Clone)]
struct Literal {
    mantissa: f64,
    decimals: Option<i32>,
}

impl Literal {
    fn value(&self) -> f64 {
        match self.decimals {
            Some(decimals) if decimals > 0 => self.mantissa / 10f64.powi(decimals),
            _ => self.mantissa,
        }
    }
}

struct ParseState {
    grouping: Grouping,
    operands: Vec<Expr>,
    operators: Vec<PendingOp>,
    literal: Option<Literal>,
    bias: u32,
    open_groups: Vec<usize>,
}

impl ParseState {
    fn new(grouping: Grouping) -> Self {
        Self {
            grouping,
            operands: Vec::new(),
            operators: Vec::new(),
            literal: None,
            bias: 0,
            open_groups: Vec::new(),
        }
    }

    fn push_operand(&mut self, expr: Expr) {
        self.operands.push(expr);
        self.literal = None;
    }

    /// Starts a new literal or shifts the current one by one decimal place.
    fn push_digit(&mut self, digit: u8) {
        let digit = f64::from(digit);
        match self.literal.as_mut() {
            Some(literal) => {
                literal.mantissa = literal.mantissa * 10.0 + digit;
                if let Some(decimals) = literal.decimals.as_mut() {
                    *decimals += 1;
                }
                let value = literal.value();
                if let Some(Expr::Const(top)) = self.operands.last_mut() {
                    *top = value;
                }
            }
            None => {
                self.operands.push(Expr::Const(digit));
                self.literal = Some(Literal {
                    mantissa: digit,
                    decimals: None,
                });
            }
        }
    }

    fn push_decimal_point(&mut self, position: usize) -> Result<(), ParseError> {
        match self.literal.as_mut() {
            Some(literal) if literal.decimals.is_some() => {
                Err(ParseError::MalformedNumber { position })
            }
            Some(literal) => {
                literal.decimals = Some(0);
                Ok(())
            }
            None => {
                self.operands.push(Expr::Const(0.0));
                self.literal = Some(Literal {
                    mantissa: 0.0,
                    decimals: Some(0),
                });
                Ok(())
            }
        }
    }

    fn push_operator(&mut self, operator: Operator, position: usize) -> Result<(), ParseError> {
        let precedence = operator.precedence() + self.bias;
        self.resolve(precedence)?;
        self.operators.push(PendingOp {
            operator,
            precedence,
            position,
        });
        self.literal = None;
        Ok(())
    }

    /// Named functions get a `0` left operand so they fit the binary shape.
    fn push_function(&mut self, operator: Operator, position: usize) -> Result<(), ParseError> {
        let precedence = operator.precedence() + self.bias;
        self.resolve(precedence)?;
        self.operands.push(Expr::Const(0.0));
        self.operators.push(PendingOp {
            operator,
            precedence,
            position,
        });
        self.literal = None;
        Ok(())
    }

    fn open_group(&mut self, position: usize) {
        match self.grouping {
            Grouping::Nested => {
                self.open_groups.push(position);
                self.bias = self.open_groups.len() as u32 * PAREN_BIAS;
            }
            Grouping::Flat => self.bias = PAREN_BIAS,
        }
        self.literal = None;
    }

    fn close_group(&mut self, position: usize) -> Result<(), ParseError> {
        match self.grouping {
            Grouping::Nested => {
                self.open_groups
                    .pop()
                    .ok_or(ParseError::UnbalancedParen { position })?;
                self.bias = self.open_groups.len() as u32 * PAREN_BIAS;
            }
            Grouping::Flat => self.bias = 0,
        }
        self.literal = None;
        Ok(())
    }

    /// Resolves pending operators whose rank is at least `threshold`.
    fn resolve(&mut self, threshold: u32) -> Result<(), ParseError> {
        while let Some(pending) = self.operators.last().copied() {
            if pending.precedence < threshold {
                break;
            }
            self.operators.pop();

            let missing = ParseError::MissingOperand {
                operator: pending.operator,
                position: pending.position,
            };
            let right = self.operands.pop().ok_or_else(|| missing.clone())?;
            let left = self.operands.pop().ok_or(missing)?;

            trace!(
                "Resolving '{}' (precedence {}) at position {}",
                pending.operator,
                pending.precedence,
                pending.position
            );
            self.operands.push(Expr::op(pending.operator, left, right));
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Expr, ParseError> {
        if let Some(&position) = self.open_groups.last() {
            return Err(ParseError::UnclosedParen { position });
        }

        self.resolve(0)?;

        match self.operands.len() {
            1 => self
                .operands
                .pop()
                .ok_or(ParseError::DanglingOperands { count: 0 }),
            count => Err(ParseError::DanglingOperands { count }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{E, PI};

    fn eval(input: &str, x: f64) -> f64 {
        parse(input).unwrap().eval(x)
    }

    #[test]
    fn test_literals() {
        assert_eq!(eval("7", 0.0), 7.0);
        assert_eq!(eval("123", 0.0), 123.0);
        assert_eq!(eval("9876543210", 0.0), 9876543210.0);
        assert_eq!(eval("007", 0.0), 7.0);
        assert_eq!(parse("42").unwrap(), Expr::Const(42.0));
    }

    #[test]
    fn test_decimal_literals() {
        assert_eq!(eval("0.5", 0.0), 0.5);
        assert_eq!(eval("1.25", 0.0), 1.25);
        assert_eq!(eval(".5", 0.0), 0.5);
        assert_eq!(eval("3.", 0.0), 3.0);
        assert_eq!(eval("0.1*x", 3.0), 0.1 * 3.0);
    }

    #[test]
    fn test_whitespace_inside_literal() {
        assert_eq!(eval("1 2", 0.0), 12.0);
        assert_eq!(eval("  2 * 3 + 4  ", 0.0), 10.0);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse("").unwrap(), Expr::Const(0.0));
        assert_eq!(eval("   ", 3.0), 0.0);
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval("2*3+4", 0.0), 10.0);
        assert_eq!(eval("2+3*4", 0.0), 14.0);
        assert_eq!(eval("8/2/2", 0.0), 2.0);
        assert_eq!(eval("10-2-3", 0.0), 5.0);
        assert_eq!(eval("2*3'2", 0.0), 18.0);
    }

    #[test]
    fn test_power() {
        assert_eq!(eval("2'3", 0.0), 8.0);
        assert_eq!(eval("x'2", -3.0), 9.0);
        // Equal ranks resolve left to right, power included
        assert_eq!(eval("2'3'2", 0.0), 64.0);
    }

    #[test]
    fn test_variable_rebinding() {
        let expr = parse("x").unwrap();
        assert_eq!(expr.eval(5.0), 5.0);
        assert_eq!(expr.eval(-2.0), -2.0);
    }

    #[test]
    fn test_constants() {
        assert_eq!(eval("pi", 0.0), PI);
        assert_eq!(eval("e", 0.0), E);
        assert_eq!(eval("2*pi", 0.0), 2.0 * PI);
        assert!((eval("log e", 0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_functions_are_additive() {
        assert_eq!(eval("cos0", 0.0), 1.0);
        assert_eq!(eval("sin0", 0.0), 0.0);
        assert_eq!(eval("1+cos0", 0.0), 2.0);
        assert_eq!(eval("cos0+1", 0.0), 2.0);
        assert_eq!(eval("tgx", 0.0), 0.0);
        assert_eq!(eval("log1", 0.0), 0.0);

        let expr = parse("cosx").unwrap();
        assert_eq!(
            expr,
            Expr::op(Operator::Cos, Expr::Const(0.0), Expr::Var)
        );
    }

    #[test]
    fn test_function_binds_tighter_than_product() {
        // sin x * 2 is (sin x) * 2
        let x = 0.7;
        assert_eq!(eval("sinx*2", x), x.sin() * 2.0);
        assert_eq!(eval("2*sinx", x), 2.0 * (0.0 + x.sin()));
        // Without parentheses the argument stops at the next operator
        assert_eq!(eval("ctgpi/4", 0.0), (1.0 / PI.tan()) / 4.0);
        assert!((eval("ctg(pi/4)", 0.0) - 1.0).abs() < 1e-12);
        assert!((eval("sin(pi/2)", 0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_parentheses() {
        assert_eq!(eval("(1+2)*3", 0.0), 9.0);
        assert_eq!(eval("2*(x+1)", 4.0), 10.0);
        assert_eq!(eval("(x-1)/(x+1)", 3.0), 0.5);
        assert_eq!(eval("2'(1+2)", 0.0), 8.0);
    }

    #[test]
    fn test_nested_grouping() {
        assert_eq!(eval("2*((1+2)*3+1)", 0.0), 20.0);
        assert_eq!(eval("((x))", 7.0), 7.0);
    }

    #[test]
    fn test_flat_grouping() {
        let flat = Parser::with_grouping(Grouping::Flat);
        // The first ')' drops the bias for the rest of the outer group
        assert_eq!(flat.parse("2*((1+2)*3+1)").unwrap().eval(0.0), 19.0);
        // A single level behaves like ordinary grouping
        assert_eq!(flat.parse("(1+2)*3").unwrap().eval(0.0), 9.0);
        // No balance checks
        assert_eq!(flat.parse("1+2)").unwrap().eval(0.0), 3.0);
        assert_eq!(flat.parse("(1+2").unwrap().eval(0.0), 3.0);
    }

    #[test]
    fn test_idempotent_evaluation() {
        let expr = parse("sinx+x'2/3-log x").unwrap();
        let first = expr.eval(1.3);
        let second = expr.eval(1.3);
        assert_eq!(first.to_bits(), second.to_bits());
    }

    #[test]
    fn test_display_reparses() -> Result<(), Box<dyn std::error::Error>> {
        for source in ["2+3*x", "x'2-4/x", "cos x*2", "(x+1)*(x-1)"] {
            let expr = parse(source)?;
            let reparsed = parse(&expr.to_string())?;
            for x in [-2.0, 0.5, 3.0] {
                assert_eq!(expr.eval(x), reparsed.eval(x), "{source} at {x}");
            }
        }
        Ok(())
    }

    #[test]
    fn test_overflowed_literal_does_not_reparse() -> Result<(), Box<dyn std::error::Error>> {
        let source = format!("1{}", "0".repeat(400));
        let expr = parse(&source)?;
        assert_eq!(expr, Expr::Const(f64::INFINITY));
        assert_eq!(expr.to_string(), "inf");
        assert_eq!(
            parse(&expr.to_string()),
            Err(ParseError::UnexpectedChar { ch: 'i', position: 0 })
        );
        Ok(())
    }

    #[test]
    fn test_unexpected_char() {
        assert_eq!(
            parse("y+1"),
            Err(ParseError::UnexpectedChar { ch: 'y', position: 0 })
        );
        assert_eq!(
            parse("2^3"),
            Err(ParseError::UnexpectedChar { ch: '^', position: 1 })
        );
        assert_eq!(
            parse("cot x"),
            Err(ParseError::UnexpectedChar { ch: 'c', position: 0 })
        );
    }

    #[test]
    fn test_missing_operand() {
        assert_eq!(
            parse("2+"),
            Err(ParseError::MissingOperand {
                operator: Operator::Add,
                position: 1
            })
        );
        assert_eq!(
            parse("-x"),
            Err(ParseError::MissingOperand {
                operator: Operator::Sub,
                position: 0
            })
        );
        assert_eq!(
            parse("sin"),
            Err(ParseError::MissingOperand {
                operator: Operator::Sin,
                position: 0
            })
        );
    }

    #[test]
    fn test_dangling_operands() {
        assert_eq!(parse("2x"), Err(ParseError::DanglingOperands { count: 2 }));
        assert_eq!(parse("()"), Err(ParseError::DanglingOperands { count: 0 }));
    }

    #[test]
    fn test_unbalanced_parentheses() {
        assert_eq!(
            parse("1+2)"),
            Err(ParseError::UnbalancedParen { position: 3 })
        );
        assert_eq!(parse("(1+2"), Err(ParseError::UnclosedParen { position: 0 }));
        assert_eq!(
            parse("((1+2)"),
            Err(ParseError::UnclosedParen { position: 0 })
        );
    }

    #[test]
    fn test_malformed_number() {
        assert_eq!(
            parse("1.2.3"),
            Err(ParseError::MalformedNumber { position: 3 })
        );
    }

    #[test]
    fn test_trailing_operator() {
        assert_eq!(
            parse("x*"),
            Err(ParseError::MissingOperand {
                operator: Operator::Mul,
                position: 1
            })
        );
    }
}
