#[cfg(feature = "native")]
use std::path::PathBuf;

#[cfg(feature = "native")]
use clap::{Parser, Subcommand};
#[cfg(feature = "native")]
use neurouq::{ModelKind, RunOptions, SchemeKind, commands, init_logging};
#[cfg(feature = "native")]
use neurouq_core::config::DEFAULT_SEED;
#[cfg(feature = "native")]
use neurouq_core::{RunConfig, TimeGrid};

#[cfg(feature = "native")]
#[derive(Parser, Debug)]
#[command(name = "neurouq")]
#[command(about = "Uncertainty quantification for neuron models")]
struct Args {
    /// Directory for results and the log file (default: ~/.neurouq/)
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[cfg(feature = "native")]
#[derive(Subcommand, Debug)]
enum Command {
    /// Propagate parameter uncertainty through one model
    Run {
        #[arg(long, value_enum, default_value_t = ModelKind::Izhikevich)]
        model: ModelKind,
        #[arg(long, value_enum, default_value_t = SchemeKind::Pc)]
        scheme: SchemeKind,
        /// Polynomial order for polynomial chaos
        #[arg(long, default_value_t = 3)]
        order: usize,
        /// Sample count for Monte Carlo
        #[arg(long, default_value_t = 1000)]
        samples: usize,
        /// Saltelli sampling for Sobol indices (Monte Carlo only)
        #[arg(long)]
        sobol: bool,
        #[arg(long)]
        workers: Option<usize>,
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
        /// Resample every sample onto the first sample's time axis
        #[arg(long)]
        first_sample_grid: bool,
        /// Abort the sweep after this many seconds
        #[arg(long)]
        timeout: Option<f64>,
        /// Result name (default: <model>_<scheme>)
        #[arg(long)]
        name: Option<String>,
    },
    /// Run every scenario of a YAML exploration file
    Explore { file: PathBuf },
    /// Describe a saved result
    Inspect { file: PathBuf },
}

#[cfg(feature = "native")]
fn default_output_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".neurouq")
}

#[cfg(feature = "native")]
fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let output_dir = args.output_dir.unwrap_or_else(default_output_dir);

    let _guard = init_logging(&output_dir, &args.log_level)?;

    match args.command {
        Command::Run {
            model,
            scheme,
            order,
            samples,
            sobol,
            workers,
            seed,
            first_sample_grid,
            timeout,
            name,
        } => {
            let options = RunOptions {
                model,
                scheme: scheme.scheme(order, samples, sobol),
                config: RunConfig {
                    workers,
                    grid: if first_sample_grid {
                        TimeGrid::FirstSample
                    } else {
                        TimeGrid::Auto
                    },
                    seed,
                    timeout_secs: timeout,
                },
                name,
                output_dir,
            };
            let output = commands::run(&options)?;
            println!("{}", output.data_path.display());
            for path in output.reports {
                println!("{}", path.display());
            }
        }
        Command::Explore { file } => {
            let outcomes = commands::explore(&file, &output_dir)?;
            for outcome in outcomes {
                match outcome.result {
                    Ok(data) => println!(
                        "{}: ok ({} quantities, {} failed)",
                        outcome.name,
                        data.quantities.len(),
                        data.failures.len()
                    ),
                    Err(err) => println!("{}: failed: {err}", outcome.name),
                }
            }
        }
        Command::Inspect { file } => {
            print!("{}", commands::inspect(&file)?);
        }
    }

    tracing::info!("neurouq finished");
    Ok(())
}

#[cfg(not(feature = "native"))]
fn main() {
    // The binary target requires the native feature
    panic!("This binary requires the 'native' feature.");
}
