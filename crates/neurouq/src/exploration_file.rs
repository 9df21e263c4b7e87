//! Exploration descriptions stored as YAML.
//!
//! ```yaml
//! name: izhikevich_study
//! model: izhikevich
//! run:
//!   seed: 3
//! parameters:
//!   c:
//!     distribution: { type: uniform, low: -70, high: -60 }
//! scenarios:
//!   - name: pc_order_2
//!     scheme: { type: polynomial_chaos, order: 2 }
//!   - name: d_fixed
//!     scheme: { type: monte_carlo, samples: 200 }
//!     parameters:
//!       d: { fixed: true }
//! single_parameter: { type: polynomial_chaos, order: 3 }
//! sample_counts: [100, 1000]
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use color_eyre::eyre::WrapErr;
use neurouq_core::exploration::{
    IntervalKind, interval_scenarios, sample_count_scenarios, single_parameter_scenarios,
};
use neurouq_core::{
    ConfigurationError, Distribution, Exploration, ParameterSet, RunConfig, Scenario, Scheme,
};
use serde::{Deserialize, Serialize};

use crate::models::ModelKind;

/// Change to one parameter of the model's defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution: Option<Distribution>,
    /// Fix at the nominal value. Wins over `distribution`.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fixed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioData {
    pub name: String,
    pub scheme: Scheme,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, ParameterOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<RunConfig>,
}

fn default_interval_kind() -> IntervalKind {
    IntervalKind::Uniform
}

/// Every parameter re-derived from its nominal value at each interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalStudy {
    pub values: Vec<f64>,
    #[serde(default = "default_interval_kind")]
    pub kind: IntervalKind,
    pub scheme: Scheme,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorationFile {
    /// Output sub-directory for the saved outcomes.
    pub name: String,
    pub model: ModelKind,
    #[serde(default)]
    pub run: RunConfig,
    /// Applied to the model defaults before any scenario is built.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, ParameterOverride>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scenarios: Vec<ScenarioData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single_parameter: Option<Scheme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intervals: Option<IntervalStudy>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sample_counts: Vec<usize>,
}

impl ExplorationFile {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_saphyr::Error> {
        serde_saphyr::from_str(yaml)
    }

    /// Save to YAML string
    pub fn to_yaml(&self) -> Result<String, serde_saphyr::ser::Error> {
        serde_saphyr::to_string(self)
    }

    pub fn load(path: &Path) -> color_eyre::Result<Self> {
        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read exploration file {}", path.display()))?;
        Self::from_yaml(&content)
            .wrap_err_with(|| format!("Failed to parse exploration file {}", path.display()))
    }

    /// Model defaults with the file-level overrides applied.
    pub fn base_parameters(&self) -> Result<ParameterSet, ConfigurationError> {
        let mut parameters = self.model.parameters()?;
        apply_overrides(&mut parameters, &self.parameters)?;
        Ok(parameters)
    }

    /// Scenarios in file order: explicit ones, then single-parameter,
    /// interval and sample-count studies.
    pub fn exploration(&self) -> Result<Exploration, ConfigurationError> {
        let base = self.base_parameters()?;
        let mut exploration = Exploration::new(self.run.clone());

        for data in &self.scenarios {
            let mut parameters = base.clone();
            apply_overrides(&mut parameters, &data.parameters)?;
            exploration.push(Scenario {
                config: data.run.clone(),
                ..Scenario::new(data.name.clone(), parameters, data.scheme.clone())
            });
        }
        if let Some(scheme) = &self.single_parameter {
            exploration.extend(single_parameter_scenarios(&base, scheme)?);
        }
        if let Some(study) = &self.intervals {
            exploration.extend(interval_scenarios(
                &base,
                &study.values,
                study.kind,
                &study.scheme,
            )?);
        }
        exploration.extend(sample_count_scenarios(&base, &self.sample_counts)?);

        tracing::debug!(
            name = %self.name,
            scenarios = exploration.scenarios.len(),
            "built exploration"
        );
        Ok(exploration)
    }
}

fn apply_overrides(
    parameters: &mut ParameterSet,
    overrides: &BTreeMap<String, ParameterOverride>,
) -> Result<(), ConfigurationError> {
    for (name, change) in overrides {
        match (change.fixed, change.distribution) {
            (true, _) => parameters.fix(name)?,
            (false, Some(distribution)) => parameters.set_distribution(name, distribution)?,
            (false, None) if parameters.get(name).is_none() => {
                return Err(ConfigurationError::UnknownParameter(name.clone()));
            }
            (false, None) => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const STUDY: &str = r#"
name: izhikevich_study
model: izhikevich
run:
  seed: 3
parameters:
  c:
    distribution:
      type: uniform
      low: -70.0
      high: -60.0
scenarios:
  - name: pc_order_2
    scheme:
      type: polynomial_chaos
      order: 2
  - name: d_fixed
    scheme:
      type: monte_carlo
      samples: 200
    parameters:
      d:
        fixed: true
    run:
      workers: 2
single_parameter:
  type: polynomial_chaos
  order: 3
sample_counts: [100, 1000]
"#;

    #[test]
    fn test_parse_and_build() {
        let file = ExplorationFile::from_yaml(STUDY).unwrap();
        assert_eq!(file.model, ModelKind::Izhikevich);
        assert_eq!(file.run.seed, 3);
        assert_eq!(file.scenarios[1].scheme, Scheme::monte_carlo(200));

        let exploration = file.exploration().unwrap();
        let names: Vec<&str> = exploration.scenarios.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "pc_order_2",
                "d_fixed",
                "single_parameter_a",
                "single_parameter_b",
                "single_parameter_c",
                "single_parameter_d",
                "mc_100",
                "mc_1000",
            ]
        );

        let d_fixed = &exploration.scenarios[1];
        assert_eq!(d_fixed.parameters.uncertain_names(), vec!["a", "b", "c"]);
        assert_eq!(d_fixed.config.as_ref().and_then(|c| c.workers), Some(2));
        assert!(exploration.scenarios[0].config.is_none());
        assert_eq!(exploration.config.seed, 3);
    }

    #[test]
    fn test_interval_study() {
        let yaml = r#"
name: widths
model: coffee-cup
intervals:
  values: [0.01, 0.05]
  kind: normal
  scheme:
    type: monte_carlo
    samples: 50
"#;
        let exploration = ExplorationFile::from_yaml(yaml).unwrap().exploration().unwrap();
        let names: Vec<&str> = exploration.scenarios.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["normal_0.01", "normal_0.05"]);
        assert_eq!(
            exploration.scenarios[0].parameters.get("u_env").unwrap().distribution,
            Some(Distribution::Normal {
                mean: 20.0,
                std_dev: 0.2
            })
        );
    }

    #[test]
    fn test_unknown_parameter_rejected() {
        let mut file = ExplorationFile::from_yaml(STUDY).unwrap();
        file.parameters.insert(
            "tau".into(),
            ParameterOverride {
                fixed: true,
                ..ParameterOverride::default()
            },
        );
        assert_eq!(
            file.exploration().unwrap_err(),
            ConfigurationError::UnknownParameter("tau".into())
        );
    }

    #[test]
    fn test_yaml_round_trip() {
        let file = ExplorationFile::from_yaml(STUDY).unwrap();
        let yaml = file.to_yaml().unwrap();
        assert_eq!(ExplorationFile::from_yaml(&yaml).unwrap(), file);
    }

    #[test]
    fn test_load_reports_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("missing.yaml");
        let error = ExplorationFile::load(&missing).unwrap_err();
        assert!(format!("{error}").contains("missing.yaml"));

        let path = dir.path().join("study.yaml");
        fs::write(&path, STUDY).unwrap();
        assert_eq!(ExplorationFile::load(&path).unwrap().name, "izhikevich_study");
    }
}
