// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use clap::{Parser, ValueEnum};
use sectioning_model::synthetic::{SyntheticParams, generate_with};
use sectioning_search::{config::SectioningConfig, properties::Properties};
use sectioning_solver::{RunError, SolverBuilder};
use std::{path::PathBuf, process::ExitCode, time::Duration};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Size {
    Small,
    Medium,
}

/// Sections a synthetic student body and prints what the solver did.
#[derive(Debug, Parser)]
#[command(name = "sectioning-demo", version, about)]
struct Args {
    /// Seed of the instance generator and of the solver.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[arg(long, value_enum, default_value_t = Size::Small)]
    size: Size,

    /// Overrides the number of students of the chosen size.
    #[arg(long)]
    students: Option<usize>,

    /// `key = value` properties file (Neighbour.*, Sectioning.*, Weights.*).
    #[arg(long)]
    properties: Option<PathBuf>,

    #[arg(long, default_value_t = 1)]
    threads: usize,

    /// Time limit in seconds; overrides `Sectioning.TimeLimit`.
    #[arg(long)]
    time_limit: Option<f64>,

    /// Give every request an initial value and solve with minimal
    /// perturbation.
    #[arg(long)]
    mpp: bool,

    /// Construct with the epsilon-constrained online selection.
    #[arg(long)]
    online: bool,
}

fn enable_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

fn run(args: &Args) -> Result<(), RunError> {
    let properties = match &args.properties {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|source| RunError::Properties {
                path: path.clone(),
                source,
            })?;
            Properties::parse(&text)
        }
        None => Properties::new(),
    };
    let mut config = SectioningConfig::from_properties(&properties);
    if !properties.contains("Sectioning.Seed") {
        config.with_seed(args.seed);
    }
    if let Some(seconds) = args.time_limit {
        config.with_time_limit(Duration::from_secs_f64(seconds.max(0.0)));
    }
    if args.mpp {
        config.mpp = true;
    }

    let mut params = match args.size {
        Size::Small => SyntheticParams::small(args.seed),
        Size::Medium => SyntheticParams::medium(args.seed),
    };
    if let Some(students) = args.students {
        params.students = students;
    }
    if args.mpp {
        params = params.with_initial_assignments();
    }

    let instance = generate_with(&params, |b| config.configure(b))?;
    tracing::info!(
        students = instance.model.students().len(),
        requests = instance.model.requests().len(),
        sections = instance.model.sections().len(),
        "instance generated"
    );

    let solver = SolverBuilder::new(config)
        .with_threads(args.threads)
        .with_online(args.online)
        .build();
    let outcome = solver.solve(&instance.model);
    println!("{}", outcome.report);
    Ok(())
}

fn main() -> ExitCode {
    enable_tracing();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "run failed");
            ExitCode::FAILURE
        }
    }
}
