//! Run orchestration: evaluate every sample on a worker pool, then assemble.
//!
//! Results are collected into index-addressed storage, so the ensemble rows
//! line up with sample generation order no matter which worker finishes first.

use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::{RunContext, TimeGrid};
use crate::ensemble::Ensemble;
use crate::error::{Result, UqError};
use crate::evaluate::{GridMap, NodeEvaluator, NodeRecord};
use crate::features::{FeatureOutput, FeatureSet};
use crate::model::{Model, Response};
use crate::parameters::Sample;

/// Evaluate `samples` and assemble the ensemble.
///
/// Model failures are absorbed per sample. Cancellation through the
/// context's [`crate::RunControl`] or an expired timeout stops dispatching
/// new samples and discards everything evaluated so far.
pub fn run<M: Model + ?Sized>(
    model: &M,
    features: &FeatureSet,
    samples: &[Sample],
    ctx: &RunContext,
) -> Result<Ensemble> {
    ctx.config.validate()?;
    let span = ctx.span();
    let _guard = span.enter();

    let mut evaluator = NodeEvaluator::new(model, features);
    if let TimeGrid::Fixed(grid) = &ctx.config.grid {
        evaluator = evaluator.with_fixed_grid(grid);
    }
    let names = evaluator.quantity_names();

    tracing::info!(
        model = model.name(),
        samples = samples.len(),
        quantities = names.len(),
        "evaluating samples"
    );
    let start = Instant::now();
    let mut records = evaluate_all(&evaluator, samples, ctx, start)?;

    let derive_grid = match ctx.config.grid {
        TimeGrid::Auto => model.adaptive(),
        TimeGrid::FirstSample => true,
        TimeGrid::Fixed(_) => false,
    };
    if derive_grid {
        let grids = derive_grids(&records, &names);
        for record in &mut records {
            record.resample(&grids);
        }
    }

    let ensemble = Ensemble::assemble(&records, &names);
    if !ensemble.failed_samples.is_empty() {
        tracing::warn!(
            failed = ensemble.failed_samples.len(),
            total = samples.len(),
            "model failed on some samples, they are excluded from every quantity"
        );
    }
    tracing::info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        kept = ensemble.quantities.len(),
        dropped = ensemble.failures.len(),
        "ensemble assembled"
    );
    Ok(ensemble)
}

fn evaluate_all<M: Model + ?Sized>(
    evaluator: &NodeEvaluator<'_, M>,
    samples: &[Sample],
    ctx: &RunContext,
    start: Instant,
) -> Result<Vec<NodeRecord>> {
    let control = &ctx.control;
    let deadline = ctx.deadline(start);
    control.reset(samples.len());

    let task = |(index, sample): (usize, &Sample)| -> Option<NodeRecord> {
        if control.is_cancelled() || deadline.is_some_and(|d| Instant::now() >= d) {
            return None;
        }
        let record = evaluator.evaluate(sample);
        if let Some(error) = &record.failure {
            tracing::debug!(index, %error, "sample failed");
        }
        control.increment();
        Some(record)
    };

    #[cfg(feature = "parallel")]
    let records: Vec<Option<NodeRecord>> = {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(ctx.config.workers.unwrap_or(0))
            .build()
            .map_err(|e| UqError::WorkerPool(e.to_string()))?;
        pool.install(|| samples.par_iter().enumerate().map(task).collect())
    };

    #[cfg(not(feature = "parallel"))]
    let records: Vec<Option<NodeRecord>> = samples.iter().enumerate().map(task).collect();

    match records.into_iter().collect::<Option<Vec<_>>>() {
        Some(records) => Ok(records),
        None if control.is_cancelled() => {
            tracing::warn!(completed = control.completed(), "run cancelled");
            Err(UqError::Cancelled)
        }
        None => {
            tracing::warn!(completed = control.completed(), "run timed out");
            Err(UqError::TimedOut)
        }
    }
}

/// Time axis of the lowest-index valid 1-D output, per quantity.
fn derive_grids(records: &[NodeRecord], names: &[String]) -> GridMap {
    let mut grids = GridMap::default();
    for name in names {
        let first = records.iter().find_map(|record| match record.get(name) {
            Some(FeatureOutput::Valid {
                time: Some(time),
                response: Response::Series(_),
            }) => Some(time.clone()),
            _ => None,
        });
        if let Some(grid) = first {
            grids.insert(name.clone(), grid);
        }
    }
    grids
}
