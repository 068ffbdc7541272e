use serde::{Deserialize, Serialize};

use crate::measurement::{NoiseMeasurementResult, SourceTemperatures};
use crate::power::{db_to_linear, linear_to_db};

/// One sweep as returned by the analyzer.
#[derive(Clone, Debug, PartialEq)]
pub struct Trace {
    pub frequencies_hz: Vec<f64>,
    pub amplitudes_db: Vec<f64>,
}

impl Trace {
    /// Build a trace with a linearly spaced frequency axis, like the analyzer
    /// sweeps from start to stop.
    pub fn from_sweep(start_hz: f64, stop_hz: f64, amplitudes_db: Vec<f64>) -> Trace {
        let n = amplitudes_db.len();
        let frequencies_hz = match n {
            0 => Vec::new(),
            1 => vec![start_hz],
            _ => {
                let step = (stop_hz - start_hz) / (n - 1) as f64;
                (0..n).map(|i| start_hz + step * i as f64).collect()
            }
        };
        Trace {
            frequencies_hz,
            amplitudes_db,
        }
    }

    pub fn len(&self) -> usize {
        self.amplitudes_db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amplitudes_db.is_empty()
    }

    /// Mean power across the sweep, averaged in the linear power domain.
    pub fn band_power_db(&self) -> f64 {
        if self.is_empty() {
            return f64::NAN;
        }
        let total: f64 = self.amplitudes_db.iter().map(|p| db_to_linear(*p)).sum();
        linear_to_db(total / self.len() as f64)
    }

    /// Point-wise mean of the traces in dB.
    ///
    /// Returns `None` for an empty slice or traces of different lengths.
    pub fn average(traces: &[Trace]) -> Option<Trace> {
        let first = traces.first()?;
        if traces.iter().any(|t| t.len() != first.len()) {
            return None;
        }
        let count = traces.len() as f64;
        let mut amplitudes_db = vec![0.0; first.len()];
        for trace in traces {
            for (sum, value) in amplitudes_db.iter_mut().zip(&trace.amplitudes_db) {
                *sum += value;
            }
        }
        for value in amplitudes_db.iter_mut() {
            *value /= count;
        }
        Some(Trace {
            frequencies_hz: first.frequencies_hz.clone(),
            amplitudes_db,
        })
    }
}

/// Mean, standard deviation and range of a set of values.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl Statistics {
    pub fn of(values: &[f64]) -> Option<Statistics> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        // population standard deviation
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        Some(Statistics {
            mean,
            std: variance.sqrt(),
            min,
            max,
        })
    }
}

/// Y-factor evaluated at every point of a hot and a cold trace.
#[derive(Clone, Debug)]
pub struct YFactorSpectrum {
    pub frequencies_hz: Vec<f64>,
    pub points: Vec<NoiseMeasurementResult>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpectrumSummary {
    pub points: usize,
    pub non_physical_points: usize,
    pub y_factor: Statistics,
    // over the points where T_sys is defined
    pub system_noise_temperature_kelvin: Option<Statistics>,
}

impl YFactorSpectrum {
    /// `None` when the traces differ in length or are empty.
    pub fn from_traces(
        hot: &Trace,
        cold: &Trace,
        temperatures: &SourceTemperatures,
    ) -> Option<YFactorSpectrum> {
        if hot.is_empty() || hot.len() != cold.len() {
            return None;
        }
        let points = hot
            .amplitudes_db
            .iter()
            .zip(&cold.amplitudes_db)
            .map(|(h, c)| {
                let y_factor = db_to_linear(*h) / db_to_linear(*c);
                NoiseMeasurementResult::from_y_factor(y_factor, temperatures)
            })
            .collect();
        Some(YFactorSpectrum {
            frequencies_hz: hot.frequencies_hz.clone(),
            points,
        })
    }

    pub fn summary(&self) -> Option<SpectrumSummary> {
        let y_factors: Vec<f64> = self.points.iter().map(|p| p.y_factor).collect();
        let temperatures: Vec<f64> = self
            .points
            .iter()
            .filter_map(|p| p.system_noise_temperature_kelvin)
            .collect();
        Some(SpectrumSummary {
            points: self.points.len(),
            non_physical_points: self.points.iter().filter(|p| !p.is_physical()).count(),
            y_factor: Statistics::of(&y_factors)?,
            system_noise_temperature_kelvin: Statistics::of(&temperatures),
        })
    }
}
