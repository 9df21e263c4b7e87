use std::sync::Arc;

use crate::model::{RawResult, Response};

use super::spikes::{SpikeConfig, Spikes};
use super::{FeatureFn, FeatureOutput, FeatureSet};

pub const NR_SPIKES: &str = "nr_spikes";
pub const SPIKE_RATE: &str = "spike_rate";
pub const TIME_BEFORE_FIRST_SPIKE: &str = "time_before_first_spike";
pub const AVERAGE_AP_OVERSHOOT: &str = "average_ap_overshoot";
pub const AVERAGE_AHP_DEPTH: &str = "average_ahp_depth";
pub const AVERAGE_AP_WIDTH: &str = "average_ap_width";
pub const ACCOMMODATION_INDEX: &str = "accommodation_index";

pub(super) fn spike_feature_set(config: SpikeConfig) -> FeatureSet {
    type Feature = fn(&RawResult, &Spikes) -> FeatureOutput;

    let table: [(&str, Feature); 7] = [
        (NR_SPIKES, nr_spikes),
        (SPIKE_RATE, spike_rate),
        (TIME_BEFORE_FIRST_SPIKE, time_before_first_spike),
        (AVERAGE_AP_OVERSHOOT, average_ap_overshoot),
        (AVERAGE_AHP_DEPTH, average_ahp_depth),
        (AVERAGE_AP_WIDTH, average_ap_width),
        (ACCOMMODATION_INDEX, accommodation_index),
    ];

    let entries = table
        .into_iter()
        .map(|(name, feature)| {
            let f: FeatureFn = Arc::new(move |raw: &RawResult| match voltage(raw) {
                Some(v) => feature(raw, &Spikes::detect(raw.time.as_deref(), v, &config)),
                None => FeatureOutput::Invalid,
            });
            (name, f)
        })
        .collect();
    FeatureSet::from_static(entries)
}

fn voltage(raw: &RawResult) -> Option<&[f64]> {
    match &raw.response {
        Response::Series(values) => Some(values),
        _ => None,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

fn nr_spikes(_raw: &RawResult, spikes: &Spikes) -> FeatureOutput {
    FeatureOutput::scalar(spikes.len() as f64)
}

fn spike_rate(raw: &RawResult, spikes: &Spikes) -> FeatureOutput {
    let duration = raw
        .time
        .as_ref()
        .and_then(|t| Some(t.last()? - t.first()?))
        .filter(|d| *d > 0.0);
    FeatureOutput::scalar_or_invalid(duration.map(|d| spikes.len() as f64 / d))
}

fn time_before_first_spike(_raw: &RawResult, spikes: &Spikes) -> FeatureOutput {
    FeatureOutput::scalar_or_invalid(spikes.spikes.first().and_then(|s| s.onset_time()))
}

fn average_ap_overshoot(_raw: &RawResult, spikes: &Spikes) -> FeatureOutput {
    FeatureOutput::scalar_or_invalid(mean(spikes.iter().map(|s| s.peak_voltage)))
}

/// Mean of the trace minimum between each spike and the next (or the trace end).
fn average_ahp_depth(raw: &RawResult, spikes: &Spikes) -> FeatureOutput {
    let Some(v) = voltage(raw) else {
        return FeatureOutput::Invalid;
    };
    let troughs = spikes.spikes.iter().enumerate().filter_map(|(i, spike)| {
        let end = spikes.spikes.get(i + 1).map_or(v.len(), |next| next.onset);
        v[spike.offset..end]
            .iter()
            .copied()
            .reduce(f64::min)
    });
    FeatureOutput::scalar_or_invalid(mean(troughs))
}

fn average_ap_width(_raw: &RawResult, spikes: &Spikes) -> FeatureOutput {
    let widths: Option<Vec<f64>> = spikes.iter().map(|s| s.width()).collect();
    FeatureOutput::scalar_or_invalid(widths.and_then(|w| mean(w.into_iter())))
}

/// Average relative change between consecutive inter-spike intervals,
/// skipping the first `min(4, round((N - 1) / 5))` intervals.
fn accommodation_index(_raw: &RawResult, spikes: &Spikes) -> FeatureOutput {
    let peaks: Option<Vec<f64>> = spikes.iter().map(|s| s.peak_time()).collect();
    let Some(peaks) = peaks else {
        return FeatureOutput::Invalid;
    };
    let n = peaks.len();
    if n < 3 {
        return FeatureOutput::Invalid;
    }

    let isi: Vec<f64> = peaks.windows(2).map(|w| w[1] - w[0]).collect();
    let k = ((n - 1) as f64 / 5.0).round().min(4.0) as usize;
    let terms = n - k - 1;
    if terms == 0 {
        return FeatureOutput::Invalid;
    }

    let total: f64 = (k + 1..n - 1)
        .map(|i| (isi[i] - isi[i - 1]) / (isi[i] + isi[i - 1]))
        .sum();
    FeatureOutput::scalar_or_invalid(Some(total / terms as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Square pulses peaking at 20 mV with the given inter-spike gaps (in points).
    fn pulse_train(gaps: &[usize]) -> RawResult {
        let mut voltage = vec![-65.0; 5];
        for &gap in gaps {
            voltage.extend([-40.0, 0.0, 20.0, 0.0, -40.0, -75.0]);
            voltage.extend(std::iter::repeat_n(-65.0, gap));
        }
        let time = (0..voltage.len()).map(|i| i as f64 * 0.1).collect();
        RawResult::new(Some(time), Response::Series(voltage)).unwrap()
    }

    fn value(set: &FeatureSet, name: &str, raw: &RawResult) -> Option<f64> {
        match set.evaluate(name, raw).unwrap() {
            FeatureOutput::Valid {
                response: Response::Scalar(v),
                ..
            } => Some(v),
            _ => None,
        }
    }

    #[test]
    fn test_spike_features_on_pulse_train() {
        let set = FeatureSet::spike_features(SpikeConfig {
            threshold: -30.0,
            window: 3,
        });
        let raw = pulse_train(&[10, 10, 10]);

        assert_eq!(value(&set, NR_SPIKES, &raw), Some(3.0));
        assert_eq!(value(&set, AVERAGE_AP_OVERSHOOT, &raw), Some(20.0));
        assert_eq!(value(&set, AVERAGE_AHP_DEPTH, &raw), Some(-75.0));

        let first_onset = value(&set, TIME_BEFORE_FIRST_SPIKE, &raw).unwrap();
        assert!((first_onset - 0.6).abs() < 1e-9);

        let duration = raw.time.as_ref().unwrap().last().unwrap();
        let rate = value(&set, SPIKE_RATE, &raw).unwrap();
        assert!((rate - 3.0 / duration).abs() < 1e-12);

        assert!(value(&set, AVERAGE_AP_WIDTH, &raw).unwrap() > 0.0);

        // Equal intervals: no accommodation.
        assert!(value(&set, ACCOMMODATION_INDEX, &raw).unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_accommodation_with_growing_intervals() {
        let set = FeatureSet::spike_features(SpikeConfig::default());
        let raw = pulse_train(&[5, 10, 20, 40]);
        assert!(value(&set, ACCOMMODATION_INDEX, &raw).unwrap() > 0.0);
    }

    #[test]
    fn test_quiet_trace() {
        let set = FeatureSet::spike_features(SpikeConfig::default());
        let raw = pulse_train(&[]);

        // Count is defined even without spikes.
        assert_eq!(value(&set, NR_SPIKES, &raw), Some(0.0));
        assert_eq!(value(&set, SPIKE_RATE, &raw), Some(0.0));
        for name in [
            TIME_BEFORE_FIRST_SPIKE,
            AVERAGE_AP_OVERSHOOT,
            AVERAGE_AHP_DEPTH,
            AVERAGE_AP_WIDTH,
            ACCOMMODATION_INDEX,
        ] {
            assert_eq!(set.evaluate(name, &raw).unwrap(), FeatureOutput::Invalid, "{name}");
        }
    }

    #[test]
    fn test_time_dependent_features_invalid_without_time() {
        let set = FeatureSet::spike_features(SpikeConfig::default());
        let mut raw = pulse_train(&[10, 10]);
        raw.time = None;

        assert_eq!(value(&set, NR_SPIKES, &raw), Some(2.0));
        assert_eq!(set.evaluate(SPIKE_RATE, &raw).unwrap(), FeatureOutput::Invalid);
        assert_eq!(
            set.evaluate(TIME_BEFORE_FIRST_SPIKE, &raw).unwrap(),
            FeatureOutput::Invalid
        );
        assert_eq!(set.evaluate(AVERAGE_AP_WIDTH, &raw).unwrap(), FeatureOutput::Invalid);
    }

    #[test]
    fn test_non_series_response_is_invalid() {
        let set = FeatureSet::spike_features(SpikeConfig::default());
        let raw = RawResult::new(None, Response::Scalar(1.0)).unwrap();
        assert_eq!(set.evaluate(NR_SPIKES, &raw).unwrap(), FeatureOutput::Invalid);
    }
}
