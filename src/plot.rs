//! Sets of graphs sampled together over one sweep.
//!
//! This module ties parsing and sampling together. A `PlotSet` holds one
//! `Graph` per expression line; every graph is parsed and flattened once and
//! then evaluated at each sample position of a `Sweep`.
//!
//! # Ordering
//!
//! For every sample, all graphs are evaluated at the same `x` before the sweep
//! advances. `sample_parallel` splits the sweep into contiguous chunks across
//! threads but returns the samples in the same order as `sample`.
//!
//! # Example
//!
//! ```
//! use plot_expr::{Grouping, PlotSet, Sweep};
//!
//! let input = "x\n2*x\n|\n";
//! let plot = PlotSet::from_reader(input.as_bytes(), Grouping::Nested).unwrap();
//! let samples = plot.sample(&Sweep::new(0.0, 2.0, 1.0).unwrap());
//!
//! assert_eq!(samples[1].x, 1.0);
//! assert_eq!(samples[1].ys, vec![1.0, 2.0]);
//! ```

use std::io::BufRead;

use colored::Colorize;
use log::debug;
use rayon::prelude::*;

use crate::errors::{ParseError, PlotError};
use crate::expr::{Expr, FlattenedExpr};
use crate::parser::{Grouping, Parser};
use crate::sweep::{Sweep, Viewport};

/// Line prefix that ends the expression stream.
pub const SENTINEL: char = '|';

/// Reads expression lines until a line starting with `|` or the end of input.
///
/// Trailing line terminators are stripped. Empty lines are kept and plot as
/// `y = 0`.
pub fn read_expressions<R: BufRead>(reader: R) -> std::io::Result<Vec<String>> {
    let mut expressions = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.starts_with(SENTINEL) {
            break;
        }
        expressions.push(line.to_string());
    }
    Ok(expressions)
}

/// A single parsed expression ready for sampling.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    source: String,
    expr: Expr,
    program: FlattenedExpr,
}

impl Graph {
    /// Parses `source` with the default grouping.
    pub fn new(source: impl Into<String>) -> Result<Self, ParseError> {
        Self::with_parser(source, &Parser::default())
    }

    /// Parses `source` with the given parser.
    pub fn with_parser(source: impl Into<String>, parser: &Parser) -> Result<Self, ParseError> {
        let source = source.into();
        let expr = parser.parse(&source)?;
        let program = expr.flatten();
        Ok(Self {
            source,
            expr,
            program,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn program(&self) -> &FlattenedExpr {
        &self.program
    }

    /// Evaluates the graph at `x`.
    pub fn eval(&self, x: f64) -> f64 {
        self.program.eval(x)
    }

    /// A graph that never reads `x` plots as a horizontal line.
    pub fn is_constant(&self) -> bool {
        !self.expr.depends_on_x()
    }
}

impl std::fmt::Display for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.source.cyan(), "=>".dimmed(), self.expr)?;
        if self.is_constant() {
            write!(f, " {}", "(constant)".dimmed())?;
        }
        Ok(())
    }
}

/// The values of every graph at one sample position.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub x: f64,
    /// One value per graph, in graph order
    pub ys: Vec<f64>,
}

impl Sample {
    /// Replaces every value whose point falls off the viewport with NaN.
    pub fn clip_to(&mut self, viewport: &Viewport) {
        for y in &mut self.ys {
            if !viewport.contains(self.x, *y) {
                *y = f64::NAN;
            }
        }
    }
}

/// A collection of graphs evaluated against a shared `x`.
#[derive(Debug, Clone, Default)]
pub struct PlotSet {
    graphs: Vec<Graph>,
}

impl PlotSet {
    /// Parses every expression in `sources`.
    ///
    /// # Errors
    /// Returns `PlotError::Parse` naming the zero-based index of the first
    /// expression that fails to parse.
    pub fn new<S: AsRef<str>>(sources: &[S], grouping: Grouping) -> Result<Self, PlotError> {
        let parser = Parser::with_grouping(grouping);
        let graphs = sources
            .iter()
            .enumerate()
            .map(|(line, source)| {
                Graph::with_parser(source.as_ref(), &parser)
                    .map_err(|source| PlotError::Parse { line, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            "Built plot set of {} graphs with {:?} grouping",
            graphs.len(),
            grouping
        );
        Ok(Self { graphs })
    }

    /// Reads expressions up to the `|` sentinel and parses them.
    pub fn from_reader<R: BufRead>(reader: R, grouping: Grouping) -> Result<Self, PlotError> {
        let sources = read_expressions(reader)?;
        Self::new(sources.as_slice(), grouping)
    }

    pub fn graphs(&self) -> &[Graph] {
        &self.graphs
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    /// Evaluates every graph at `x`.
    pub fn eval(&self, x: f64) -> Vec<f64> {
        self.graphs.iter().map(|graph| graph.eval(x)).collect()
    }

    /// Evaluates every graph at every position of the sweep, in sweep order.
    pub fn sample(&self, sweep: &Sweep) -> Vec<Sample> {
        let mut stack = Vec::with_capacity(self.max_stack());
        sweep
            .iter()
            .map(|x| self.sample_at(x, &mut stack))
            .collect()
    }

    /// Same result as `sample`, computed in parallel chunks of the sweep.
    pub fn sample_parallel(&self, sweep: &Sweep) -> Vec<Sample> {
        let num_threads = rayon::current_num_threads();
        let chunk_size = (sweep.len() / (num_threads * 4)).max(1);
        let positions = sweep.positions();

        positions
            .par_chunks(chunk_size)
            .map(|chunk| {
                let mut stack = Vec::with_capacity(self.max_stack());
                chunk
                    .iter()
                    .map(|&x| self.sample_at(x, &mut stack))
                    .collect::<Vec<_>>()
            })
            .flatten()
            .collect()
    }

    /// The `(x, y)` points of a single graph over the sweep.
    pub fn points(&self, index: usize, sweep: &Sweep) -> Result<Vec<(f64, f64)>, PlotError> {
        let graph = self.graphs.get(index).ok_or(PlotError::GraphNotFound {
            index,
            len: self.graphs.len(),
        })?;
        let mut stack = Vec::with_capacity(graph.program.max_stack());
        Ok(sweep
            .iter()
            .map(|x| (x, graph.program.eval_with(x, &mut stack)))
            .collect())
    }

    fn sample_at(&self, x: f64, stack: &mut Vec<f64>) -> Sample {
        Sample {
            x,
            ys: self
                .graphs
                .iter()
                .map(|graph| graph.program.eval_with(x, stack))
                .collect(),
        }
    }

    fn max_stack(&self) -> usize {
        self.graphs
            .iter()
            .map(|graph| graph.program.max_stack())
            .max()
            .unwrap_or(0)
    }
}
