use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser};
use log::{info, warn};

use planecolor::conflict::{first_fit_coloring, Optimizer};
use planecolor::heuristics::{Algorithm, Color as _};
use planecolor::instance::{read_clique, Instance};
use planecolor::params::Parameters;
use planecolor::solution::{read_labels, StatsFile, Writer};
use planecolor::{Clock, Coloring, Core, Error};

/// Partition line segments into plane subgraphs.
#[derive(Parser, Debug)]
#[command(name = "planecolor", version)]
struct Cli {
    /// Instance file name (required).
    #[arg(short, long)]
    instance: Option<String>,

    /// Solution file name, for warm-starting the conflict optimizer.
    #[arg(short, long)]
    solution: Option<String>,

    /// Algorithm name: greedy, angle, bad, dsatur, dsathull, conflict.
    #[arg(short, long)]
    algorithm: Option<String>,

    /// Maximum time to start a new repetition, in seconds.
    #[arg(short, long)]
    time: Option<i64>,

    /// Maximum number of repetitions; negative means unbounded.
    #[arg(short, long, default_value_t = 100)]
    repetitions: i64,

    /// Parameters file name.
    #[arg(short, long)]
    parameters: Option<PathBuf>,
}

fn gather_parameters(cli: &Cli) -> anyhow::Result<Parameters> {
    let mut params = Parameters::default();
    if let Some(instance) = &cli.instance {
        params.instance = instance.clone();
    }
    if let Some(solution) = &cli.solution {
        params.solution = solution.clone();
    }
    if let Some(algorithm) = &cli.algorithm {
        params.algorithm = algorithm.clone();
    }
    // The file wins over the flags, like it always has.
    if let Some(path) = &cli.parameters {
        params.merge_file(path)?;
    }
    Ok(params)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut params = gather_parameters(&cli)?;
    if params.instance.is_empty() {
        Cli::command().print_help()?;
        std::process::exit(1);
    }
    let algorithm: Algorithm = match params.algorithm.parse() {
        Ok(algorithm) => algorithm,
        Err(msg) => {
            eprintln!("{msg}");
            Cli::command().print_help()?;
            std::process::exit(2);
        }
    };

    let instance = Instance::read(Path::new(&params.instance))?;
    let n = instance.crossings.len();
    params.finalize(n);

    let mut core = match params.seed {
        Some(seed) => Core::seeded(instance.segments, instance.crossings, seed),
        None => Core::new(instance.segments, instance.crossings),
    };
    if !params.info.is_empty() {
        core = core.with_clique(read_clique(Path::new(&params.info), n)?);
    }

    let writer = Writer::new(&instance.id, &params.instance, algorithm.name());

    match algorithm.constructive() {
        Some(mut heuristic) => {
            // Greedy is deterministic, so repeating it is pointless.
            let repetitions = match algorithm {
                Algorithm::Greedy => 1,
                _ if cli.repetitions < 0 => i64::MAX,
                _ => cli.repetitions,
            };
            let budget = match cli.time {
                Some(t) if t >= 0 => t as u64,
                _ => u64::MAX,
            };
            let clock = Clock::new(budget);

            let mut best = usize::MAX;
            for _ in 0..repetitions {
                if clock.expired() {
                    break;
                }
                let coloring = heuristic.color(&mut core)?;
                let num_colors = coloring.num_colors();
                info!("colors: {num_colors}");
                if num_colors < best {
                    writer.write(&coloring, clock.elapsed())?;
                    best = num_colors;
                }
            }
        }
        None => {
            let clock = Clock::new(params.max_run_time);
            let initial = if params.solution.is_empty() {
                first_fit_coloring(&core)
            } else {
                let labels = read_labels(Path::new(&params.solution))?;
                if labels.len() != n {
                    return Err(Error::Malformed(format!(
                        "warm-start solution labels {} segments, instance has {n}",
                        labels.len()
                    ))
                    .into());
                }
                Coloring::from_labels(&labels)
            };
            info!("starting from {} colors", initial.num_colors());

            let mut stats = StatsFile::new(&params, &instance.id);
            let mut optimizer = Optimizer::new(&mut core, initial, &params, clock)?;
            let outcome = optimizer.run(|coloring, elapsed| {
                if let Err(e) = writer.write(coloring, elapsed) {
                    warn!("could not persist the improvement: {e}");
                }
                if let Err(e) = stats.record(elapsed, coloring.num_colors()) {
                    warn!("could not update {}: {e}", stats.path().display());
                }
            });
            // Running out of time mid-elimination is a clean stop: the last
            // improvement is already on disk.
            if outcome.is_err() {
                info!("wall-clock budget exhausted");
            }
        }
    }

    Ok(())
}
