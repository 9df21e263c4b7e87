//! Threshold-crossing spike segmentation.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpikeConfig {
    /// Voltage at or above which the trace counts as spiking.
    pub threshold: f64,
    /// Extra points kept on each side of an above-threshold excursion.
    pub window: usize,
}

impl Default for SpikeConfig {
    fn default() -> Self {
        Self {
            threshold: -30.0,
            window: 10,
        }
    }
}

/// One above-threshold excursion plus its surrounding window.
#[derive(Debug, Clone, PartialEq)]
pub struct Spike {
    /// First index at or above threshold.
    pub onset: usize,
    /// First index back below threshold (exclusive end of the excursion).
    pub offset: usize,
    /// Absolute index of the first sample of `voltage`.
    pub window_start: usize,
    pub time: Option<Vec<f64>>,
    pub voltage: Vec<f64>,
    pub peak_index: usize,
    pub peak_voltage: f64,
}

impl Spike {
    pub fn peak_time(&self) -> Option<f64> {
        self.time
            .as_ref()
            .map(|t| t[self.peak_index - self.window_start])
    }

    pub fn onset_time(&self) -> Option<f64> {
        self.time.as_ref().map(|t| t[self.onset - self.window_start])
    }

    /// Duration above half amplitude, measured from the window minimum to the peak.
    pub fn width(&self) -> Option<f64> {
        let time = self.time.as_ref()?;
        let base = self.voltage.iter().copied().fold(f64::INFINITY, f64::min);
        let half = 0.5 * (self.peak_voltage + base);
        let peak = self.peak_index - self.window_start;

        let mut left = peak;
        while left > 0 && self.voltage[left - 1] >= half {
            left -= 1;
        }
        let rise = if left > 0 {
            crossing(time, &self.voltage, left - 1, left, half)
        } else {
            time[0]
        };

        let mut right = peak;
        while right + 1 < self.voltage.len() && self.voltage[right + 1] >= half {
            right += 1;
        }
        let fall = if right + 1 < self.voltage.len() {
            crossing(time, &self.voltage, right, right + 1, half)
        } else {
            time[right]
        };

        Some(fall - rise)
    }
}

/// Linear interpolation of the time at which the trace passes `level` between `i` and `j`.
fn crossing(time: &[f64], voltage: &[f64], i: usize, j: usize, level: f64) -> f64 {
    let dv = voltage[j] - voltage[i];
    if dv == 0.0 {
        return time[i];
    }
    time[i] + (level - voltage[i]) / dv * (time[j] - time[i])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Below,
    Above { onset: usize },
}

/// Spikes extracted from a single voltage trace.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Spikes {
    pub spikes: Vec<Spike>,
}

impl Spikes {
    /// Scan the trace once: `below -> above -> below` emits one spike.
    ///
    /// Samples exactly at threshold count as above. An excursion still above
    /// threshold at the end of the trace is not a complete spike and is dropped.
    pub fn detect(time: Option<&[f64]>, voltage: &[f64], config: &SpikeConfig) -> Self {
        let mut spikes = Vec::new();
        let mut state = ScanState::Below;

        for (i, &v) in voltage.iter().enumerate() {
            match state {
                ScanState::Below if v >= config.threshold => {
                    state = ScanState::Above { onset: i };
                }
                ScanState::Above { onset } if v < config.threshold => {
                    spikes.push(extract(time, voltage, onset, i, config.window));
                    state = ScanState::Below;
                }
                _ => {}
            }
        }

        Self { spikes }
    }

    pub fn len(&self) -> usize {
        self.spikes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spikes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Spike> {
        self.spikes.iter()
    }
}

fn extract(time: Option<&[f64]>, voltage: &[f64], onset: usize, offset: usize, window: usize) -> Spike {
    let window_start = onset.saturating_sub(window);
    let window_end = (offset + window).min(voltage.len());

    let (peak_index, peak_voltage) = voltage[onset..offset]
        .iter()
        .copied()
        .enumerate()
        .fold((onset, f64::NEG_INFINITY), |best, (k, v)| {
            if v > best.1 { (onset + k, v) } else { best }
        });

    Spike {
        onset,
        offset,
        window_start,
        time: time.map(|t| t[window_start..window_end].to_vec()),
        voltage: voltage[window_start..window_end].to_vec(),
        peak_index,
        peak_voltage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace() -> (Vec<f64>, Vec<f64>) {
        let voltage = vec![
            -65.0, -65.0, -40.0, 10.0, 30.0, 0.0, -50.0, -70.0, -66.0, -65.0, -30.0, 20.0, -45.0,
            -65.0,
        ];
        let time = (0..voltage.len()).map(|i| i as f64 * 0.5).collect();
        (time, voltage)
    }

    #[test]
    fn test_detects_each_full_excursion() {
        let (time, voltage) = trace();
        let spikes = Spikes::detect(Some(&time), &voltage, &SpikeConfig::default());

        assert_eq!(spikes.len(), 2);
        let first = &spikes.spikes[0];
        assert_eq!(first.onset, 3);
        assert_eq!(first.offset, 6);
        assert_eq!(first.peak_index, 4);
        assert_eq!(first.peak_voltage, 30.0);
        assert_eq!(first.peak_time(), Some(2.0));

        // -30.0 sits exactly on the threshold and counts as above.
        let second = &spikes.spikes[1];
        assert_eq!(second.onset, 10);
        assert_eq!(second.onset_time(), Some(5.0));
        assert_eq!(second.peak_voltage, 20.0);
    }

    #[test]
    fn test_window_is_clamped_to_trace() {
        let (time, voltage) = trace();
        let config = SpikeConfig {
            threshold: -30.0,
            window: 2,
        };
        let spikes = Spikes::detect(Some(&time), &voltage, &config);

        let first = &spikes.spikes[0];
        assert_eq!(first.window_start, 1);
        assert_eq!(first.voltage.len(), 7);

        let second = &spikes.spikes[1];
        assert_eq!(second.window_start, 8);
        assert_eq!(second.voltage.len(), 6);
    }

    #[test]
    fn test_unfinished_excursion_dropped() {
        let voltage = vec![-70.0, -20.0, 10.0];
        let spikes = Spikes::detect(None, &voltage, &SpikeConfig::default());
        assert!(spikes.is_empty());
    }

    #[test]
    fn test_width_at_half_amplitude() {
        // Symmetric triangle from -70 to 30 over 1 ms steps; half level is -20.
        let voltage = vec![-70.0, -45.0, -20.0, 5.0, 30.0, 5.0, -20.0, -45.0, -70.0];
        let time: Vec<f64> = (0..voltage.len()).map(|i| i as f64).collect();
        let config = SpikeConfig {
            threshold: -30.0,
            window: 4,
        };
        let spikes = Spikes::detect(Some(&time), &voltage, &config);
        assert_eq!(spikes.len(), 1);
        assert!((spikes.spikes[0].width().unwrap() - 4.0).abs() < 1e-12);

        let spikes = Spikes::detect(None, &voltage, &config);
        assert_eq!(spikes.spikes[0].width(), None);
    }
}
