//! Single-variable expression parser and evaluator for plotting.
//!
//! This crate parses one-line mathematical expressions in the free variable `x`
//! into expression trees and evaluates them over a sweep of `x` values,
//! producing `(x, y)` pairs for an external renderer to draw.
//!
//! # Features
//!
//! - Precedence-climbing parser with `+ - * /`, power `'`, `sin cos tg ctg log`,
//!   the constants `e` and `pi`, and parentheses
//! - Trees that are parsed once and evaluated at any number of points
//! - Flattened postfix programs for the sampling hot loop
//! - Sequential and parallel sampling of several graphs over one sweep
//!
//! # Example
//!
//! ```rust
//! use plot_expr::{parse, Sweep};
//!
//! let expr = parse("x'2 + cos0").unwrap();
//! assert_eq!(expr.eval(3.0), 10.0);
//!
//! let program = expr.flatten();
//! let sweep = Sweep::new(0.0, 2.0, 1.0).unwrap();
//! let ys: Vec<f64> = sweep.iter().map(|x| program.eval(x)).collect();
//! assert_eq!(ys, vec![1.0, 2.0]);
//! ```

pub use errors::{ParseError, PlotError, SweepError};
pub use expr::{Expr, FlattenedExpr};
pub use parser::{parse, Grouping, Parser};
pub use plot::{Graph, PlotSet, Sample};
pub use sweep::{Sweep, Viewport};

pub mod prelude {
    pub use crate::expr::{Expr, FlattenedExpr, LinearOp};
    pub use crate::operators::Operator;
    pub use crate::parser::{parse, Grouping, Parser};
    pub use crate::plot::{read_expressions, Graph, PlotSet, Sample};
    pub use crate::sweep::{Sweep, Viewport};
}

/// Error types for the various failure modes
pub mod errors;
/// Expression tree representation and evaluation
pub mod expr;
/// Operators, precedence ranks and the keyword table
pub mod operators;
/// Conversion from expression text to trees
pub mod parser;
/// Graph sets sampled over a sweep
pub mod plot;
/// Sampling ranges and drawing surfaces
pub mod sweep;
