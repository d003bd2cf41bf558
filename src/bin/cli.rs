use clap::Parser;
use colored::Colorize;
use itertools::Itertools;
use log::info;
use plot_expr::{Grouping, PlotSet, Sweep, Viewport};
use std::io::{self, BufWriter, Write};
use std::process;

#[derive(Parser)]
#[command(name = "plot-expr")]
#[command(about = "Sample expressions in x read from stdin (ended by a '|' line) and print the points as CSV")]
#[command(version)]
struct Args {
    /// Surface width in pixels
    #[arg(long, default_value_t = 640)]
    width: u32,
    /// Surface height in pixels
    #[arg(long, default_value_t = 480)]
    height: u32,
    /// Pixels per unit
    #[arg(long, default_value_t = 20.0)]
    scale: f64,
    /// First x to sample (overrides the viewport)
    #[arg(long, requires_all = ["end", "step"])]
    start: Option<f64>,
    /// Sampling stops before this x
    #[arg(long, requires_all = ["start", "step"])]
    end: Option<f64>,
    /// Distance between samples
    #[arg(long, requires_all = ["start", "end"])]
    step: Option<f64>,
    /// Let ')' reset the precedence bias regardless of nesting depth
    #[arg(long)]
    flat_parens: bool,
    /// Print the parsed trees instead of sampling
    #[arg(long)]
    tree: bool,
    /// Sample on all cores
    #[arg(long)]
    parallel: bool,
    /// Write NaN for points that fall off the surface
    #[arg(long)]
    clip: bool,
}

fn main() {
    pretty_env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        let mut source = std::error::Error::source(e.as_ref());
        while let Some(cause) = source {
            eprintln!("  {} {}", "caused by:".red(), cause);
            source = cause.source();
        }
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let grouping = if args.flat_parens {
        Grouping::Flat
    } else {
        Grouping::Nested
    };

    // Expressions are read up to the sentinel line before anything is sampled
    let plot = PlotSet::from_reader(io::stdin().lock(), grouping)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if args.tree {
        for (i, graph) in plot.graphs().iter().enumerate() {
            writeln!(out, "{} {}", format!("y{i}:").bold(), graph)?;
        }
        out.flush()?;
        return Ok(());
    }

    let viewport = Viewport::new(args.width, args.height, args.scale);
    let sweep = match (args.start, args.end, args.step) {
        (Some(start), Some(end), Some(step)) => Sweep::new(start, end, step)?,
        _ => viewport.sweep()?,
    };
    info!(
        "Sampling {} graphs at {} points from {} to {}",
        plot.len(),
        sweep.len(),
        sweep.start(),
        sweep.end()
    );

    let mut samples = if args.parallel {
        plot.sample_parallel(&sweep)
    } else {
        plot.sample(&sweep)
    };
    if args.clip {
        samples
            .iter_mut()
            .for_each(|sample| sample.clip_to(&viewport));
    }

    let header = std::iter::once("x".to_string()).chain((0..plot.len()).map(|i| format!("y{i}")));
    writeln!(out, "{}", header.format(","))?;
    for sample in &samples {
        let row = std::iter::once(sample.x).chain(sample.ys.iter().copied());
        writeln!(out, "{}", row.format(","))?;
    }
    out.flush()?;

    Ok(())
}
