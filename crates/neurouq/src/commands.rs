//! The work behind each subcommand, independent of argument parsing.

use std::path::{Path, PathBuf};

use color_eyre::eyre::WrapErr;
use neurouq_core::exploration::save_outcomes;
use neurouq_core::storage::{self, sanitize_filename};
use neurouq_core::{RunConfig, RunContext, RunControl, Scheme, ScenarioOutcome, propagate};

use crate::exploration_file::ExplorationFile;
use crate::models::ModelKind;
use crate::report::{self, Summary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "native", derive(clap::ValueEnum))]
pub enum SchemeKind {
    /// Polynomial chaos
    Pc,
    /// Monte Carlo
    Mc,
}

impl SchemeKind {
    pub fn scheme(self, order: usize, samples: usize, sobol: bool) -> Scheme {
        match (self, sobol) {
            (SchemeKind::Pc, _) => Scheme::polynomial_chaos(order),
            (SchemeKind::Mc, false) => Scheme::monte_carlo(samples),
            (SchemeKind::Mc, true) => Scheme::monte_carlo_sobol(samples),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub model: ModelKind,
    pub scheme: Scheme,
    pub config: RunConfig,
    /// Defaults to `<model>_<scheme>`.
    pub name: Option<String>,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunOutput {
    pub data_path: PathBuf,
    pub reports: Vec<PathBuf>,
}

/// Propagate one model, then save `<output>/<name>.json` and its CSV reports
/// under `<output>/<name>/`.
pub fn run(options: &RunOptions) -> color_eyre::Result<RunOutput> {
    let name = options
        .name
        .clone()
        .unwrap_or_else(|| format!("{}_{}", options.model, options.scheme.label()));
    let parameters = options.model.parameters()?;
    let model = options.model.build();
    let ctx = RunContext::new(name.clone(), options.config.clone());

    let data = propagate(
        &*model,
        &options.model.features(),
        &parameters,
        &options.scheme,
        &ctx,
    )?;

    let data_path = storage::path_for(&options.output_dir, &name);
    storage::save(&data, &data_path)?;
    let reports = report::export(&data, &options.output_dir.join(sanitize_filename(&name)))?;
    tracing::info!(path = %data_path.display(), reports = reports.len(), "run saved");

    Ok(RunOutput { data_path, reports })
}

/// Run every scenario of an exploration file and save the successful ones
/// under `<output>/<exploration name>/`.
pub fn explore(file: &Path, output_dir: &Path) -> color_eyre::Result<Vec<ScenarioOutcome>> {
    let study = ExplorationFile::load(file)?;
    let exploration = study.exploration()?;
    let model = study.model.build();
    let features = study.model.features();

    let outcomes = exploration.run(&*model, &features, &RunControl::new());

    let dir = output_dir.join(sanitize_filename(&study.name));
    save_outcomes(&outcomes, &dir)
        .wrap_err_with(|| format!("Failed to save outcomes to {}", dir.display()))?;
    for outcome in &outcomes {
        if let Ok(data) = &outcome.result {
            report::export(data, &dir.join(sanitize_filename(&outcome.name)))?;
        }
    }
    Ok(outcomes)
}

/// Load saved data and describe it.
pub fn inspect(path: &Path) -> color_eyre::Result<String> {
    let data = storage::load(path)
        .wrap_err_with(|| format!("Failed to load {}", path.display()))?;
    Ok(Summary(&data).to_string())
}
