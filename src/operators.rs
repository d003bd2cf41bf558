//! Operator table for the expression grammar.
//!
//! Defines the closed set of operators an expression may contain, their
//! precedence ranks and how each one combines its two operands. Named
//! functions (`sin`, `cos`, `tg`, `ctg`, `log`) are binary as well: the parser
//! gives them a placeholder left operand of `0` and they evaluate as
//! `left + f(right)`.
//!
//! | Operator            | Symbol              | Precedence |
//! |---------------------|---------------------|------------|
//! | Power               | `'`                 | 4          |
//! | Named functions     | `sin cos tg ctg log`| 3          |
//! | Multiply, divide    | `* /`               | 2          |
//! | Add, subtract       | `+ -`               | 1          |

use std::f64::consts::{E, PI};

/// Precedence bias added per open parenthesis.
///
/// Must exceed the largest base precedence so that anything inside a group
/// resolves before anything outside of it.
pub const PAREN_BIAS: u32 = 5;

/// An operator appearing in an expression tree.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Addition `+`
    Add,
    /// Subtraction `-`
    Sub,
    /// Multiplication `*`
    Mul,
    /// Division `/`
    Div,
    /// Exponentiation `'` (`2'3` is `2^3`)
    Pow,
    /// `left + sin(right)`
    Sin,
    /// `left + cos(right)`
    Cos,
    /// `left + tan(right)`
    Tg,
    /// `left + 1 / tan(right)`
    Ctg,
    /// `left + ln(right)`
    Log,
}

impl Operator {
    /// Base precedence rank, before any parenthesis bias is applied.
    pub fn precedence(&self) -> u32 {
        match self {
            Operator::Pow => 4,
            Operator::Sin | Operator::Cos | Operator::Tg | Operator::Ctg | Operator::Log => 3,
            Operator::Mul | Operator::Div => 2,
            Operator::Add | Operator::Sub => 1,
        }
    }

    /// Returns true for the named functions, which take a placeholder left operand.
    pub fn is_function(&self) -> bool {
        self.precedence() == 3
    }

    /// Textual form of the operator as written in an expression.
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Pow => "'",
            Operator::Sin => "sin",
            Operator::Cos => "cos",
            Operator::Tg => "tg",
            Operator::Ctg => "ctg",
            Operator::Log => "log",
        }
    }

    /// Combines two already evaluated operands.
    ///
    /// No domain checks are made: `1/0` is infinite and `log` of a negative
    /// number is NaN.
    #[inline]
    pub fn apply(&self, left: f64, right: f64) -> f64 {
        match self {
            Operator::Add => left + right,
            Operator::Sub => left - right,
            Operator::Mul => left * right,
            Operator::Div => left / right,
            Operator::Pow => left.powf(right),
            Operator::Sin => left + right.sin(),
            Operator::Cos => left + right.cos(),
            Operator::Tg => left + right.tan(),
            Operator::Ctg => left + 1.0 / right.tan(),
            Operator::Log => left + right.ln(),
        }
    }

    /// Maps a single-character operator to its variant.
    pub fn from_char(c: char) -> Option<Operator> {
        match c {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Sub),
            '*' => Some(Operator::Mul),
            '/' => Some(Operator::Div),
            '\'' => Some(Operator::Pow),
            _ => None,
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A word recognized by the scanner.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Keyword {
    /// A named function such as `sin`
    Function(Operator),
    /// A named constant such as `pi`
    Constant(f64),
    /// The free variable `x`
    Variable,
}

/// Keyword table consulted at every alphabetic character.
///
/// `cos` and `ctg` share their first letter and are told apart by the second.
/// No entry is a prefix of another, so the first match is the only match.
pub const KEYWORDS: &[(&str, Keyword)] = &[
    ("cos", Keyword::Function(Operator::Cos)),
    ("ctg", Keyword::Function(Operator::Ctg)),
    ("sin", Keyword::Function(Operator::Sin)),
    ("tg", Keyword::Function(Operator::Tg)),
    ("log", Keyword::Function(Operator::Log)),
    ("pi", Keyword::Constant(PI)),
    ("e", Keyword::Constant(E)),
    ("x", Keyword::Variable),
];

/// Finds the keyword the input starts with, returning it with its length in bytes.
pub fn match_keyword(input: &str) -> Option<(Keyword, usize)> {
    KEYWORDS
        .iter()
        .find(|(word, _)| input.starts_with(word))
        .map(|(word, keyword)| (*keyword, word.len()))
}
