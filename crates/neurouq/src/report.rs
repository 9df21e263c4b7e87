//! CSV export and text summaries of uncertainty results.
//!
//! Directory structure written by [`export`]:
//! <dir>/
//!   features_0d.csv      # one row per 0-D quantity
//!   direct_comparison.csv
//!   <feature>.csv        # one file per 1-D quantity, one row per time point

use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use color_eyre::eyre::WrapErr;
use neurouq_core::storage::sanitize_filename;
use neurouq_core::{DataOrigin, Statistic, UncertaintyData};

pub const SUMMARY_FILE: &str = "features_0d.csv";

fn sensitivity_header(data: &UncertaintyData) -> String {
    data.uncertain_parameters
        .iter()
        .map(|p| format!(",sensitivity_{p}"))
        .collect()
}

/// Value at `i`, or an empty CSV field when the array is short.
fn cell(values: &[f64], i: usize) -> String {
    values.get(i).map(f64::to_string).unwrap_or_default()
}

/// Write one statistic row per time point of a 1-D quantity.
pub fn write_series(data: &UncertaintyData, name: &str, path: &Path) -> color_eyre::Result<()> {
    let columns = Statistic::ALL
        .iter()
        .map(|&s| data.series(name, s).map(|view| view.values))
        .collect::<Result<Vec<_>, _>>()?;
    let view = data.series(name, Statistic::Mean)?;
    let sensitivity = data.sensitivity(name)?;

    let mut out = BufWriter::new(File::create(path)?);
    write!(out, "time")?;
    for statistic in Statistic::ALL {
        write!(out, ",{}", statistic.label())?;
    }
    if sensitivity.is_some() {
        write!(out, "{}", sensitivity_header(data))?;
    }
    writeln!(out)?;

    for i in 0..view.values.len() {
        match view.time.and_then(|time| time.get(i)) {
            Some(t) => write!(out, "{t}")?,
            None => write!(out, "{i}")?,
        }
        for column in &columns {
            write!(out, ",{}", cell(column, i))?;
        }
        for (_, indices) in sensitivity.iter().flatten() {
            write!(out, ",{}", cell(indices, i))?;
        }
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

/// Write one row per 0-D quantity.
pub fn write_scalars(data: &UncertaintyData, path: &Path) -> color_eyre::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write!(out, "quantity")?;
    for statistic in Statistic::ALL {
        write!(out, ",{}", statistic.label())?;
    }
    writeln!(out, ",evaluated,excluded{}", sensitivity_header(data))?;

    for name in &data.features_0d {
        write!(out, "{name}")?;
        for statistic in Statistic::ALL {
            write!(out, ",{}", data.scalar(name, statistic)?)?;
        }
        let stats = data.get(name)?;
        write!(out, ",{},{}", stats.evaluated, stats.excluded)?;
        match data.sensitivity(name)? {
            Some(indices) => {
                for (_, values) in indices {
                    write!(out, ",{}", cell(values, 0))?;
                }
            }
            None => {
                for _ in &data.uncertain_parameters {
                    write!(out, ",")?;
                }
            }
        }
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

/// Export every 0-D and 1-D quantity under `dir`. Higher-dimensional
/// quantities are skipped.
pub fn export(data: &UncertaintyData, dir: &Path) -> color_eyre::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .wrap_err_with(|| format!("Failed to create report directory {}", dir.display()))?;
    let mut written = Vec::new();

    if !data.features_0d.is_empty() {
        let path = dir.join(SUMMARY_FILE);
        write_scalars(data, &path)?;
        written.push(path);
    }
    for name in &data.features_1d {
        let path = dir.join(format!("{}.csv", sanitize_filename(name)));
        write_series(data, name, &path)
            .wrap_err_with(|| format!("Failed to export {name}"))?;
        written.push(path);
    }

    tracing::debug!(dir = %dir.display(), files = written.len(), "exported reports");
    Ok(written)
}

/// Human-readable overview of a result.
pub struct Summary<'a>(pub &'a UncertaintyData);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0;
        let origin = match data.origin {
            DataOrigin::Computed => "computed",
            DataOrigin::Loaded => "loaded",
        };
        writeln!(f, "{} ({origin})", data.name)?;
        writeln!(
            f,
            "  scheme: {}, samples: {}, failed samples: {}",
            data.scheme.label(),
            data.sample_count,
            data.failed_samples
        )?;
        writeln!(
            f,
            "  uncertain parameters: {}",
            data.uncertain_parameters.join(", ")
        )?;

        if !data.features_0d.is_empty() {
            writeln!(f, "  0-D quantities:")?;
        }
        for name in &data.features_0d {
            let scalar = |statistic| data.scalar(name, statistic).ok();
            if let (Some(mean), Some(variance), Some(p5), Some(p95)) = (
                scalar(Statistic::Mean),
                scalar(Statistic::Variance),
                scalar(Statistic::Percentile5),
                scalar(Statistic::Percentile95),
            ) {
                writeln!(
                    f,
                    "    {name}: mean {mean:.6}, variance {variance:.6}, 90% band [{p5:.6}, {p95:.6}]"
                )?;
            }
        }

        if !data.features_1d.is_empty() {
            writeln!(f, "  1-D quantities:")?;
        }
        for name in &data.features_1d {
            if let Ok(stats) = data.get(name) {
                let peak = stats.variance.iter().copied().fold(0.0, f64::max);
                writeln!(
                    f,
                    "    {name}: {} points, peak variance {peak:.6}",
                    stats.mean.len()
                )?;
            }
        }

        for (name, stats) in &data.quantities {
            if stats.ndim() > 1 {
                writeln!(f, "  {name}: shape {:?} (not exported)", stats.shape)?;
            }
        }
        for failure in &data.failures {
            writeln!(f, "  failed {}: {}", failure.quantity, failure.reason)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neurouq_core::testing::{FEATURE_0D, FEATURE_1D, FEATURE_2D, TestingModel, testing_features};
    use neurouq_core::{
        DIRECT_COMPARISON, Distribution, Parameter, ParameterSet, RunConfig, RunContext, Scheme,
        propagate,
    };
    use tempfile::TempDir;

    fn data() -> UncertaintyData {
        let parameters = ParameterSet::new()
            .with(Parameter::uncertain("a", 1.0, Distribution::uniform(0.5, 1.5).unwrap()))
            .unwrap()
            .with(Parameter::uncertain("b", 2.0, Distribution::uniform(1.5, 2.5).unwrap()))
            .unwrap();
        let features = testing_features()
            .with_only(&[FEATURE_0D, FEATURE_1D, FEATURE_2D])
            .unwrap();
        propagate(
            &TestingModel::one_d(),
            &features,
            &parameters,
            &Scheme::polynomial_chaos(2),
            &RunContext::new("report", RunConfig::default()),
        )
        .unwrap()
    }

    #[test]
    fn test_export_writes_0d_and_1d_only() {
        let dir = TempDir::new().unwrap();
        let data = data();
        let written = export(&data, dir.path()).unwrap();

        assert_eq!(
            written,
            vec![
                dir.path().join(SUMMARY_FILE),
                dir.path().join("direct_comparison.csv"),
                dir.path().join("feature1d.csv"),
            ]
        );
        assert!(!dir.path().join("feature2d.csv").exists());
    }

    #[test]
    fn test_series_csv_layout() {
        let dir = TempDir::new().unwrap();
        let data = data();
        let path = dir.path().join("direct.csv");
        write_series(&data, DIRECT_COMPARISON, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            "time,mean,variance,percentile_5,percentile_95,sensitivity_a,sensitivity_b"
        );
        assert_eq!(lines.len(), 11);
        let first: Vec<f64> = lines[1].split(',').map(|v| v.parse().unwrap()).collect();
        assert_eq!(first[0], 0.0);
        assert!((first[1] - 3.0).abs() < 1e-9);
        assert!((first[5] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_scalar_csv_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SUMMARY_FILE);
        write_scalars(&data(), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            "quantity,mean,variance,percentile_5,percentile_95,evaluated,excluded,sensitivity_a,sensitivity_b"
        );
        let fields: Vec<&str> = lines[1].split(',').collect();
        assert_eq!(fields[0], "feature0d");
        assert_eq!(&fields[5..7], &["9", "0"]);
        let mean: f64 = fields[1].parse().unwrap();
        assert!((mean - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_series_rejects_scalar_quantity() {
        let dir = TempDir::new().unwrap();
        assert!(write_series(&data(), FEATURE_0D, &dir.path().join("x.csv")).is_err());
    }

    #[test]
    fn test_summary_lists_every_bucket() {
        let text = Summary(&data()).to_string();
        assert!(text.starts_with("report (computed)"));
        assert!(text.contains("feature0d: mean 1.000000"));
        assert!(text.contains("direct_comparison: 10 points"));
        assert!(text.contains("feature2d: shape [2, 10] (not exported)"));
    }

    #[test]
    fn test_short_arrays_do_not_panic() {
        let dir = TempDir::new().unwrap();
        let mut data = data();
        if let Some(stats) = data.quantities.get_mut(DIRECT_COMPARISON) {
            stats.time = Some(vec![0.0, 1.0]);
            stats.variance.truncate(3);
        }
        if let Some(stats) = data.quantities.get_mut(FEATURE_0D) {
            stats.mean.clear();
        }

        let path = dir.path().join("direct.csv");
        write_series(&data, DIRECT_COMPARISON, &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 11);
        assert!(lines[3].starts_with("2,"));
        assert_eq!(lines[5].split(',').nth(2), Some(""));

        let text = Summary(&data).to_string();
        assert!(!text.contains("feature0d: mean"));
    }
}
