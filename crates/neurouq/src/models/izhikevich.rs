//! Izhikevich spiking neuron driven by a step current.
//!
//! ```text
//! v' = 0.04 v^2 + 5 v + 140 - u + I
//! u' = a (b v - u)
//! if v >= 30 mV: v <- c, u <- u + d
//! ```
//!
//! Integrated with forward Euler. A spike is recorded as a single point at
//! the 30 mV apex before the reset.

use neurouq_core::{
    ConfigurationError, Distribution, Model, Parameter, ParameterSet, RawResult, Response, Sample,
    SimulationError,
};

const APEX: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Izhikevich {
    /// Simulated time in ms.
    pub duration: f64,
    /// Euler step in ms.
    pub dt: f64,
    /// Injected current once the stimulus is on.
    pub current: f64,
    pub stimulus_start: f64,
    pub initial_voltage: f64,
}

impl Default for Izhikevich {
    fn default() -> Self {
        Self {
            duration: 100.0,
            dt: 0.25,
            current: 10.0,
            stimulus_start: 10.0,
            initial_voltage: -65.0,
        }
    }
}

impl Izhikevich {
    /// Regular-spiking defaults, with `c` fixed.
    pub fn parameters() -> Result<ParameterSet, ConfigurationError> {
        ParameterSet::new()
            .with(Parameter::uncertain("a", 0.02, Distribution::uniform(0.015, 0.025)?))?
            .with(Parameter::uncertain("b", 0.2, Distribution::uniform(0.15, 0.25)?))?
            .with(Parameter::fixed("c", -65.0))?
            .with(Parameter::uncertain("d", 8.0, Distribution::uniform(6.0, 10.0)?))
    }

    fn steps(&self) -> usize {
        (self.duration / self.dt).round() as usize
    }
}

impl Model for Izhikevich {
    fn name(&self) -> &str {
        "izhikevich"
    }

    fn run(&self, sample: &Sample) -> Result<RawResult, SimulationError> {
        let a = sample.get_or("a", 0.02);
        let b = sample.get_or("b", 0.2);
        let c = sample.get_or("c", -65.0);
        let d = sample.get_or("d", 8.0);

        let steps = self.steps();
        let mut time = Vec::with_capacity(steps + 1);
        let mut voltage = Vec::with_capacity(steps + 1);

        let mut v = self.initial_voltage;
        let mut u = b * v;
        time.push(0.0);
        voltage.push(v);

        for step in 1..=steps {
            let t = step as f64 * self.dt;
            let input = if t > self.stimulus_start { self.current } else { 0.0 };

            let dv = 0.04 * v * v + 5.0 * v + 140.0 - u + input;
            let du = a * (b * v - u);
            v += self.dt * dv;
            u += self.dt * du;

            if !v.is_finite() || !u.is_finite() {
                return Err(SimulationError::Failed {
                    model: self.name().to_string(),
                    reason: format!("membrane potential diverged at t = {t} ms"),
                });
            }

            time.push(t);
            if v >= APEX {
                voltage.push(APEX);
                v = c;
                u += d;
            } else {
                voltage.push(v);
            }
        }

        RawResult::new(Some(time), Response::Series(voltage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neurouq_core::features::{NR_SPIKES, SpikeConfig};
    use neurouq_core::{FeatureOutput, FeatureSet};

    #[test]
    fn test_rests_without_stimulus() {
        let model = Izhikevich {
            current: 0.0,
            ..Izhikevich::default()
        };
        let raw = model.run(&Izhikevich::parameters().unwrap().nominal()).unwrap();
        assert_eq!(raw.response.values().len(), 401);
        assert!(raw.response.values().iter().all(|v| *v < -50.0));
    }

    #[test]
    fn test_spikes_under_step_current() {
        let model = Izhikevich::default();
        let raw = model.run(&Izhikevich::parameters().unwrap().nominal()).unwrap();

        assert!(raw.response.values().contains(&APEX));
        let features = FeatureSet::spike_features(SpikeConfig::default());
        let FeatureOutput::Valid { response, .. } = features.evaluate(NR_SPIKES, &raw).unwrap()
        else {
            panic!("spike count is always defined");
        };
        assert!(response.values()[0] >= 2.0);
    }

    #[test]
    fn test_divergence_is_a_simulation_error() {
        let model = Izhikevich {
            dt: 50.0,
            current: -1.0e160,
            stimulus_start: 0.0,
            ..Izhikevich::default()
        };
        let sample = Izhikevich::parameters().unwrap().nominal();
        assert!(matches!(model.run(&sample), Err(SimulationError::Failed { .. })));
    }
}
