//! Newton cooling of a cup of coffee.
//!
//! `T(t) = u_env + (T0 - u_env) * exp(kappa * t)`, the closed form of
//! `dT/dt = kappa * (T - u_env)`.

use neurouq_core::{
    ConfigurationError, Distribution, Model, Parameter, ParameterSet, RawResult, Response, Sample,
    SimulationError,
};

pub const KAPPA: &str = "kappa";
pub const U_ENV: &str = "u_env";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoffeeCup {
    /// Temperature at `t = 0`, degrees Celsius.
    pub initial_temperature: f64,
    /// End of the time axis in minutes.
    pub duration: f64,
    pub points: usize,
}

impl Default for CoffeeCup {
    fn default() -> Self {
        Self {
            initial_temperature: 95.0,
            duration: 200.0,
            points: 150,
        }
    }
}

impl CoffeeCup {
    pub fn parameters() -> Result<ParameterSet, ConfigurationError> {
        ParameterSet::new()
            .with(Parameter::uncertain(
                KAPPA,
                -0.05,
                Distribution::uniform(-0.075, -0.025)?,
            ))?
            .with(Parameter::uncertain(U_ENV, 20.0, Distribution::uniform(15.0, 25.0)?))
    }

    fn time(&self) -> Vec<f64> {
        let last = self.points.saturating_sub(1).max(1) as f64;
        (0..self.points)
            .map(|i| self.duration * i as f64 / last)
            .collect()
    }
}

impl Model for CoffeeCup {
    fn name(&self) -> &str {
        "coffee_cup"
    }

    fn run(&self, sample: &Sample) -> Result<RawResult, SimulationError> {
        let kappa = sample.get_or(KAPPA, -0.05);
        let u_env = sample.get_or(U_ENV, 20.0);

        let time = self.time();
        let temperature = time
            .iter()
            .map(|t| u_env + (self.initial_temperature - u_env) * (kappa * t).exp())
            .collect();
        RawResult::new(Some(time), Response::Series(temperature))
    }
}
