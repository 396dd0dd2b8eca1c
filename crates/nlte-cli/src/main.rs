//! NLTE rate-equation command-line interface.
//!
//! ```sh
//! nlte run problem.json --output solution.json
//! nlte validate problem.json
//! nlte index problem.json
//! ```

mod report;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nlte_solver::{NlteRateEquationSolver, PlasmaFile, PlasmaState, SolutionFile, SolverConfig};

#[derive(Parser)]
#[command(name = "nlte")]
#[command(about = "NLTE ionization balance solver", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve the rate equations of every shell.
    Run {
        /// Problem file (JSON).
        problem: PathBuf,
        /// Solver configuration file (JSON); defaults otherwise.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write the solution to this file.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Start from a previous solution file instead of the default guess.
        #[arg(long, value_name = "SOLUTION")]
        initial: Option<PathBuf>,
        /// Solve shells one after another.
        #[arg(long)]
        sequential: bool,
    },
    /// Check a problem file and build every shell's inputs without solving.
    Validate {
        /// Problem file (JSON).
        problem: PathBuf,
    },
    /// Print the rate-matrix index of a problem.
    Index {
        /// Problem file (JSON).
        problem: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            problem,
            config,
            output,
            initial,
            sequential,
        } => {
            let plasma = load_problem(&problem)?;
            let mut config = match config {
                Some(path) => SolverConfig::from_json_file(&path)
                    .with_context(|| format!("Failed to read config: {}", path.display()))?,
                None => SolverConfig::default(),
            };
            if sequential {
                config.parallel = false;
            }

            let solver = NlteRateEquationSolver::new(config);
            let solution = match initial {
                Some(path) => {
                    let previous = SolutionFile::load(&path)
                        .and_then(SolutionFile::into_solution)
                        .with_context(|| format!("Failed to read solution: {}", path.display()))?;
                    solver.solve_from(&plasma, &previous)?
                }
                None => solver.solve(&plasma)?,
            };

            report::print_solution(&solution);

            if let Some(path) = output {
                SolutionFile::from(&solution)
                    .save(&path)
                    .with_context(|| format!("Failed to write solution: {}", path.display()))?;
                println!("Solution written to {}", path.display());
            }
            Ok(())
        }
        Commands::Validate { problem } => {
            let plasma = load_problem(&problem)?;
            let solver = NlteRateEquationSolver::default();
            let index = solver.build_index(&plasma)?;
            let inputs = solver.shell_inputs(&plasma, &index)?;
            println!(
                "Problem is valid: {} ({} shells, {} unknowns per shell)",
                problem.display(),
                inputs.len(),
                index.len()
            );
            Ok(())
        }
        Commands::Index { problem } => {
            let plasma = load_problem(&problem)?;
            let index = NlteRateEquationSolver::default().build_index(&plasma)?;
            println!("{index}");
            if !index.excitation_species().is_empty() {
                let species: Vec<String> = index
                    .excitation_species()
                    .iter()
                    .map(|s| s.to_string())
                    .collect();
                println!("NLTE excitation: {}", species.join(", "));
            }
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn load_problem(path: &Path) -> Result<PlasmaState> {
    let file = PlasmaFile::load(path)
        .with_context(|| format!("Failed to read problem: {}", path.display()))?;
    let plasma = file
        .into_state()
        .with_context(|| format!("Invalid problem: {}", path.display()))?;
    log::debug!(
        "Loaded {} with {} elements over {} shells",
        path.display(),
        plasma.atomic_numbers().len(),
        plasma.num_shells()
    );
    Ok(plasma)
}
