//! JSON persistence for [`UncertaintyData`].
//!
//! The stored 0-D/1-D lists are informational: on load they are re-derived
//! from the quantity shapes and must agree with what the file says.

use std::fs;
use std::path::{Path, PathBuf};

use crate::data::{DataOrigin, QuantityStatistics, UncertaintyData};
use crate::error::StorageError;

pub const EXTENSION: &str = "json";

pub fn to_json(data: &UncertaintyData) -> Result<String, StorageError> {
    for (name, stats) in &data.quantities {
        let all_finite = [
            &stats.mean,
            &stats.variance,
            &stats.percentile_5,
            &stats.percentile_95,
        ]
        .into_iter()
        .chain(stats.time.as_ref())
        .chain(stats.sensitivity.iter().flatten())
        .flatten()
        .all(|v| v.is_finite());
        if !all_finite {
            return Err(StorageError::NonFinite(name.clone()));
        }
    }
    serde_json::to_string_pretty(data).map_err(StorageError::Serialize)
}

pub fn from_json(json: &str) -> Result<UncertaintyData, StorageError> {
    let mut data: UncertaintyData = serde_json::from_str(json).map_err(StorageError::Parse)?;

    let (zero, one) = data.classify();
    if zero != data.features_0d {
        return Err(StorageError::ClassificationMismatch {
            bucket: "0-D",
            stored: data.features_0d,
            derived: zero,
        });
    }
    if one != data.features_1d {
        return Err(StorageError::ClassificationMismatch {
            bucket: "1-D",
            stored: data.features_1d,
            derived: one,
        });
    }

    for (name, stats) in &data.quantities {
        check_lengths(name, stats, data.uncertain_parameters.len())?;
    }

    data.origin = DataOrigin::Loaded;
    Ok(data)
}

/// Every statistic array must hold one value per point of `shape`.
fn check_lengths(
    name: &str,
    stats: &QuantityStatistics,
    parameters: usize,
) -> Result<(), StorageError> {
    let expected = stats.shape.iter().product::<usize>();
    let mismatch = |field, expected, actual| StorageError::ShapeMismatch {
        quantity: name.to_string(),
        field,
        expected,
        actual,
    };

    let arrays = [
        ("mean", &stats.mean),
        ("variance", &stats.variance),
        ("percentile_5", &stats.percentile_5),
        ("percentile_95", &stats.percentile_95),
    ];
    for (field, values) in arrays {
        if values.len() != expected {
            return Err(mismatch(field, expected, values.len()));
        }
    }

    if let Some(sensitivity) = &stats.sensitivity {
        if sensitivity.len() != parameters {
            return Err(mismatch("sensitivity rows", parameters, sensitivity.len()));
        }
        if let Some(row) = sensitivity.iter().find(|row| row.len() != expected) {
            return Err(mismatch("sensitivity", expected, row.len()));
        }
    }
    Ok(())
}

pub fn save(data: &UncertaintyData, path: &Path) -> Result<(), StorageError> {
    let json = to_json(data)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| io_error(parent, source))?;
    }
    fs::write(path, json).map_err(|source| io_error(path, source))?;
    tracing::debug!(path = %path.display(), "saved uncertainty data");
    Ok(())
}

pub fn load(path: &Path) -> Result<UncertaintyData, StorageError> {
    let json = fs::read_to_string(path).map_err(|source| io_error(path, source))?;
    from_json(&json)
}

/// `<dir>/<name>.json` with characters unsafe in file names replaced.
pub fn path_for(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.{EXTENSION}", sanitize_filename(name)))
}

/// Replace characters unsafe in file names with `_`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tests::sample_data;
    use tempfile::TempDir;

    #[test]
    fn test_round_trip_through_file() {
        let dir = TempDir::new().unwrap();
        let data = sample_data();
        let path = path_for(&dir.path().join("nested"), &data.name);

        save(&data, &path).unwrap();
        let loaded = load(&path).unwrap();

        assert!(loaded.is_loaded());
        assert!(!data.is_loaded());
        assert_eq!(loaded.quantities, data.quantities);
        assert_eq!(loaded.features_0d, data.features_0d);
        assert_eq!(loaded.features_1d, data.features_1d);
        assert_eq!(loaded.uncertain_parameters, data.uncertain_parameters);
    }

    #[test]
    fn test_tampered_classification_rejected() {
        let mut data = sample_data();
        data.features_1d.push("image".into());
        let json = to_json(&data).unwrap();
        assert!(matches!(
            from_json(&json),
            Err(StorageError::ClassificationMismatch { bucket: "1-D", .. })
        ));
    }

    #[test]
    fn test_non_finite_statistics_rejected() {
        let mut data = sample_data();
        if let Some(stats) = data.quantities.get_mut("trace") {
            stats.variance[1] = f64::NAN;
        }
        assert!(matches!(to_json(&data), Err(StorageError::NonFinite(name)) if name == "trace"));
    }

    #[test]
    fn test_non_finite_time_rejected() {
        let mut data = sample_data();
        if let Some(time) = data.quantities.get_mut("trace").and_then(|s| s.time.as_mut()) {
            time[0] = f64::INFINITY;
        }
        assert!(matches!(to_json(&data), Err(StorageError::NonFinite(name)) if name == "trace"));
    }

    #[test]
    fn test_short_sensitivity_row_rejected() {
        let mut data = sample_data();
        let json = to_json(&data).unwrap();
        assert!(from_json(&json).is_ok());

        if let Some(rows) = data.quantities.get_mut("trace").and_then(|s| s.sensitivity.as_mut()) {
            rows[0].pop();
        }
        let json = to_json(&data).unwrap();
        assert!(matches!(
            from_json(&json),
            Err(StorageError::ShapeMismatch { quantity, field: "sensitivity", .. }) if quantity == "trace"
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            load(&dir.path().join("absent.json")),
            Err(StorageError::Io { .. })
        ));
    }

    #[test]
    fn test_path_for_sanitizes() {
        let path = path_for(Path::new("out"), "a/b c");
        assert_eq!(path, Path::new("out").join("a_b_c.json"));
    }
}
