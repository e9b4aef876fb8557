//! polyengine command line interface
//!
//! Usage:
//!   polyengine [OPTIONS] <COMMAND> <input-file>
//!   polyengine --help
//!
//! Examples:
//!   polyengine hull pieces.json                      # Convex hull of all pieces
//!   polyengine hull --strategy=fm pieces.json        # Pairwise elimination
//!   polyengine simple-hull --bounded pieces.json     # Cheap bounded over-approximation
//!   polyengine minimize --objective=0,1,1 box.json   # Integer minimum of x + y
//!   polyengine --json simplify - < pieces.json       # Read stdin, JSON output
//!
//! Input is a JSON document of the form
//!
//! ```text
//! { "dims": 2, "params": 0, "rational": false,
//!   "pieces": [ { "divs": [ { "denom": 2, "expr": [0, 1, 0] } ],
//!                 "eqs": [], "ineqs": [[0, 1, 0, 0]] } ] }
//! ```
//!
//! where every row is `[constant, params.., dims.., divs..]` and a div
//! expression has the width of the rows before that div is added.

use anyhow::{bail, Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, info};
use num_bigint::BigInt;
use polyengine::prelude::*;
use polyengine::polyhedral::operations;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Read;
use std::path::PathBuf;

/// polyengine - exact polyhedral constraint engine
#[derive(Parser, Debug)]
#[command(name = "polyengine")]
#[command(version)]
#[command(about = "Convex hulls, simplification and integer optimization over polyhedra", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE", global = true)]
    output: Option<PathBuf>,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Node limit of the integer sampler
    #[arg(long, global = true)]
    max_sample_nodes: Option<usize>,

    /// Pivot limit per LP solve
    #[arg(long, global = true)]
    max_pivots: Option<usize>,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress warnings)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convex hull of all pieces
    Hull {
        /// Input file, `-` for stdin
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Hull strategy
        #[arg(long, default_value = "wrap")]
        strategy: StrategyArg,
    },
    /// Simple hull of all pieces
    SimpleHull {
        /// Input file, `-` for stdin
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Also bound every dimension the pieces bound
        #[arg(long)]
        bounded: bool,
    },
    /// Simplify every piece and remove redundant constraints
    Simplify {
        /// Input file, `-` for stdin
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
    /// Integer optimum of an affine objective over the first piece
    Minimize {
        /// Input file, `-` for stdin
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Objective row `[constant, coefficients..]` (comma-separated)
        #[arg(long, value_delimiter = ',', num_args = 1.., allow_hyphen_values = true, required = true)]
        objective: Vec<i64>,

        /// Maximize instead
        #[arg(long)]
        maximize: bool,
    },
    /// An integer point of every piece
    Sample {
        /// Input file, `-` for stdin
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    /// Facet wrapping
    Wrap,
    /// Pairwise Fourier-Motzkin elimination
    Fm,
}

impl From<StrategyArg> for HullStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Wrap => HullStrategy::Wrap,
            StrategyArg::Fm => HullStrategy::FourierMotzkin,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SetInput {
    dims: usize,
    #[serde(default)]
    params: usize,
    #[serde(default)]
    rational: bool,
    pieces: Vec<PieceInput>,
}

#[derive(Debug, Deserialize)]
struct PieceInput {
    #[serde(default)]
    divs: Vec<DivInput>,
    #[serde(default)]
    eqs: Vec<Vec<i64>>,
    #[serde(default)]
    ineqs: Vec<Vec<i64>>,
}

#[derive(Debug, Deserialize)]
struct DivInput {
    denom: i64,
    expr: Vec<i64>,
}

#[derive(Debug, Serialize)]
struct PieceOutput {
    empty: bool,
    rational: bool,
    divs: Vec<DivOutput>,
    eqs: Vec<Vec<String>>,
    ineqs: Vec<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct DivOutput {
    denom: String,
    expr: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum OptimumOutput {
    Ok { value: String, point: Vec<String> },
    Empty,
    Unbounded,
}

fn strings(row: &[BigInt]) -> Vec<String> {
    row.iter().map(|v| v.to_string()).collect()
}

impl From<&BasicSet> for PieceOutput {
    fn from(bset: &BasicSet) -> Self {
        Self {
            empty: bset.is_marked_empty(),
            rational: bset.is_rational(),
            divs: bset
                .divs()
                .iter()
                .map(|d| DivOutput {
                    denom: d.denom.to_string(),
                    expr: strings(&d.expr),
                })
                .collect(),
            eqs: bset.eqs().iter().map(|r| strings(r)).collect(),
            ineqs: bset.ineqs().iter().map(|r| strings(r)).collect(),
        }
    }
}

impl From<IlpResult> for OptimumOutput {
    fn from(res: IlpResult) -> Self {
        match res {
            IlpResult::Ok { value, point } => OptimumOutput::Ok {
                value: value.to_string(),
                point: strings(&point),
            },
            IlpResult::Empty => OptimumOutput::Empty,
            IlpResult::Unbounded => OptimumOutput::Unbounded,
        }
    }
}

fn to_row(v: &[i64]) -> Vec<BigInt> {
    v.iter().map(|&x| BigInt::from(x)).collect()
}

fn build_piece(space: &Space, input: &PieceInput, rational: bool) -> Result<BasicSet> {
    let mut bset = BasicSet::universe(space.clone());
    for (i, div) in input.divs.iter().enumerate() {
        bset.add_div(BigInt::from(div.denom), to_row(&div.expr))
            .with_context(|| format!("Invalid div {}", i))?;
    }
    for row in &input.eqs {
        bset.add_equality(to_row(row))
            .with_context(|| format!("Invalid equality {:?}", row))?;
    }
    for row in &input.ineqs {
        bset.add_inequality(to_row(row))
            .with_context(|| format!("Invalid inequality {:?}", row))?;
    }
    Ok(if rational { bset.into_rational() } else { bset })
}

fn build_set(input: &SetInput) -> Result<Set> {
    let space = Space::set_with_params(input.dims, input.params);
    let mut set = Set::empty(space.clone());
    for (i, piece) in input.pieces.iter().enumerate() {
        let bset = build_piece(&space, piece, input.rational)
            .with_context(|| format!("Failed to build piece {}", i))?;
        set.add_piece(bset)?;
    }
    Ok(set)
}

fn read_input(path: &PathBuf) -> Result<Set> {
    let source = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        buf
    } else {
        fs::read_to_string(path).with_context(|| format!("Failed to read input file: {:?}", path))?
    };
    let input: SetInput = serde_json::from_str(&source).with_context(|| "Failed to parse input")?;
    debug!("Read {} pieces over {} dims", input.pieces.len(), input.dims);
    build_set(&input)
}

fn render_piece(bset: &BasicSet, json: bool) -> Result<String> {
    if json {
        Ok(serde_json::to_string_pretty(&PieceOutput::from(bset))?)
    } else {
        Ok(bset.to_string())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet {
        log::LevelFilter::Error
    } else {
        match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    info!("polyengine v{}", polyengine::VERSION);

    let mut options = Options::default();
    if let Some(n) = cli.max_sample_nodes {
        options.max_sample_nodes = n;
    }
    if let Some(n) = cli.max_pivots {
        options.max_pivots = n;
    }

    let output = match &cli.command {
        Command::Hull { input, strategy } => {
            let set = read_input(input)?;
            let ctx = Context::with_options(options).with_hull_strategy((*strategy).into());
            info!("Computing the hull of {} pieces...", set.n_pieces());
            let hull = convex_hull(&set, &ctx).context("Convex hull failed")?;
            render_piece(&hull, cli.json)?
        }
        Command::SimpleHull { input, bounded } => {
            let set = read_input(input)?;
            let ctx = Context::with_options(options);
            let hull = if *bounded {
                bounded_simple_hull(&set, &ctx)
            } else {
                simple_hull(&set, &ctx)
            }
            .context("Simple hull failed")?;
            render_piece(&hull, cli.json)?
        }
        Command::Simplify { input } => {
            let mut set = read_input(input)?;
            set.finalize(&options).context("Simplification failed")?;
            if cli.json {
                let pieces: Vec<PieceOutput> = set.pieces().iter().map(|p| PieceOutput::from(&**p)).collect();
                serde_json::to_string_pretty(&pieces)?
            } else {
                set.to_string()
            }
        }
        Command::Minimize {
            input,
            objective,
            maximize: max,
        } => {
            let set = read_input(input)?;
            let Some(piece) = set.pieces().first() else {
                bail!("Input has no nonempty piece");
            };
            let obj = to_row(objective);
            let res = if *max {
                maximize(piece, &obj, &options)
            } else {
                minimize(piece, &obj, &options)
            }
            .context("Optimization failed")?;
            if cli.json {
                serde_json::to_string_pretty(&OptimumOutput::from(res))?
            } else {
                match res {
                    IlpResult::Ok { value, point } => format!("{} at {:?}", value, strings(&point)),
                    IlpResult::Empty => "empty".to_string(),
                    IlpResult::Unbounded => "unbounded".to_string(),
                }
            }
        }
        Command::Sample { input } => {
            let set = read_input(input)?;
            let mut lines = Vec::with_capacity(set.n_pieces());
            for (i, piece) in set.pieces().iter().enumerate() {
                let point = operations::sample(piece, &options)
                    .with_context(|| format!("Sampling piece {} failed", i))?;
                lines.push(point.map(|p| strings(&p)));
            }
            if cli.json {
                serde_json::to_string_pretty(&lines)?
            } else {
                lines
                    .iter()
                    .map(|p| match p {
                        Some(p) => format!("[{}]", p.join(", ")),
                        None => "empty".to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
    };

    write_output(&cli.output, &output)
}

fn write_output(path: &Option<PathBuf>, content: &str) -> Result<()> {
    match path {
        Some(p) => {
            fs::write(p, content)
                .with_context(|| format!("Failed to write output file: {:?}", p))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
