//! Error types for the plot-expr crate.
//!
//! This module defines the failure modes of the three fallible stages:
//!
//! - `ParseError`: Errors while scanning an expression line into a tree
//! - `SweepError`: Invalid sampling ranges or step sizes
//! - `PlotError`: High-level errors when reading and building a set of graphs
//!
//! Evaluation itself never fails. Division by zero and out-of-domain inputs to
//! `log`, `tg` and `ctg` follow IEEE-754 and yield infinities or NaN.

use thiserror::Error;

use crate::operators::Operator;

/// Errors that can occur while parsing an expression line.
///
/// Every variant carries the byte offset in the input where the problem was
/// detected, so callers can point at the offending character.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// A character that is not part of the expression grammar
    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedChar { ch: char, position: usize },
    /// An operator was resolved without two operands available
    #[error("operator '{operator}' is missing an operand (at position {position})")]
    MissingOperand { operator: Operator, position: usize },
    /// More than one operand remained once every operator was resolved
    #[error("expression does not reduce to a single root ({count} operands left)")]
    DanglingOperands { count: usize },
    /// A closing parenthesis without a matching opening one
    #[error("unbalanced ')' at position {position}")]
    UnbalancedParen { position: usize },
    /// An opening parenthesis that was never closed
    #[error("unclosed '(' at position {position}")]
    UnclosedParen { position: usize },
    /// A numeric literal with more than one decimal point
    #[error("malformed number at position {position}")]
    MalformedNumber { position: usize },
}

/// Errors that can occur when describing a sampling sweep.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SweepError {
    /// The step is zero, negative or not finite
    #[error("sweep step must be a positive finite number, got {0}")]
    InvalidStep(f64),
    /// The bounds are not finite or the end lies before the start
    #[error("invalid sweep range: start {start}, end {end}")]
    InvalidRange { start: f64, end: f64 },
    /// The step is too small to move away from `start` in `f64`
    #[error("sweep step {step} is below the resolution of start {start}")]
    StepBelowResolution { start: f64, step: f64 },
    /// The range holds more samples than a sweep may have
    #[error("sweep from {start} to {end} by {step} exceeds {max} samples")]
    TooManySamples {
        start: f64,
        end: f64,
        step: f64,
        max: usize,
    },
    /// The viewport scale is zero, negative or not finite
    #[error("viewport scale must be a positive finite number, got {0}")]
    InvalidScale(f64),
}

/// High-level errors that can occur when building or sampling a plot set.
#[derive(Error, Debug)]
pub enum PlotError {
    /// The expression at zero-based index `line` failed to parse
    #[error("failed to parse expression {line}")]
    Parse {
        line: usize,
        #[source]
        source: ParseError,
    },
    /// Reading the expression stream failed
    #[error("failed to read expressions")]
    Io(#[from] std::io::Error),
    /// The requested sweep is invalid
    #[error("invalid sweep")]
    Sweep(#[from] SweepError),
    /// A graph index outside of the plot set
    #[error("graph index {index} out of range ({len} graphs)")]
    GraphNotFound { index: usize, len: usize },
}
