use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::frequency::format_frequency;
use crate::instrument::SweepSettings;
use crate::measurement::{NoiseMeasurementInput, NoiseMeasurementResult, Validity};
use crate::procedure::YFactorMeasurement;
use crate::spectrum::SpectrumSummary;

pub const MEASUREMENT_TYPE: &str = "yfactor_noise_temperature";

/// What gets written to disk for one run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub measurement_type: String,
    pub timestamp: String,
    pub instrument: String,
    pub averages: usize,
    pub sweep: SweepSettings,
    pub input: NoiseMeasurementInput,
    pub result: NoiseMeasurementResult,
    pub spectrum: Option<SpectrumSummary>,
}

impl MeasurementRecord {
    pub fn new(measurement: &YFactorMeasurement, timestamp: String) -> MeasurementRecord {
        MeasurementRecord {
            measurement_type: MEASUREMENT_TYPE.to_string(),
            timestamp,
            instrument: measurement.instrument.clone(),
            averages: measurement.averages,
            sweep: measurement.sweep.clone(),
            input: measurement.input,
            result: measurement.result,
            spectrum: measurement.spectrum.as_ref().and_then(|s| s.summary()),
        }
    }

    /// Stamp the record with the local time, colons replaced so it can name a file.
    pub fn now(measurement: &YFactorMeasurement) -> MeasurementRecord {
        let timestamp = Local::now().format("%Y-%m-%dT%H-%M-%S").to_string();
        MeasurementRecord::new(measurement, timestamp)
    }

    pub fn file_stem(&self, name: &str) -> String {
        let name: String = name
            .trim()
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}_yfactor_{}", self.timestamp, name)
    }

    /// Write `<timestamp>_yfactor_<name>.toml` into `directory`.
    pub fn save(&self, directory: &Path, name: &str) -> Result<PathBuf> {
        let path = directory.join(format!("{}.toml", self.file_stem(name)));
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        info!("saved measurement record to {}", path.display());
        Ok(path)
    }

    pub fn load(path: &Path) -> Result<MeasurementRecord> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

/// Console summary of a finished run.
pub fn summary(measurement: &YFactorMeasurement) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "\nResults Summary:");
    let _ = writeln!(text, "----------------");
    text.push_str(&result_lines(&measurement.input, &measurement.result));
    if let Some(summary) = measurement.spectrum.as_ref().and_then(|s| s.summary()) {
        text.push_str(&spectrum_lines(&summary));
    }
    text
}

/// Console listing of a saved record, as `--read` prints it.
pub fn record_summary(record: &MeasurementRecord) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "\n--- Metadata ---");
    let _ = writeln!(text, "Instrument: {}", record.instrument);
    let _ = writeln!(text, "Measurement Type: {}", record.measurement_type);
    let _ = writeln!(
        text,
        "Frequency Range: {} to {}",
        format_frequency(record.sweep.start_frequency_hz()),
        format_frequency(record.sweep.stop_frequency_hz())
    );
    let _ = writeln!(
        text,
        "Resolution Bandwidth: {}",
        format_frequency(record.sweep.resolution_bandwidth_hz)
    );
    let _ = writeln!(
        text,
        "Preamp: {}",
        match record.sweep.preamp {
            Some(true) => "ON",
            Some(false) => "OFF",
            None => "N/A",
        }
    );
    let _ = writeln!(
        text,
        "Attenuation: {}",
        match record.sweep.attenuation_db {
            Some(att) => format!("{} dB", att),
            None => "N/A".to_string(),
        }
    );
    let _ = writeln!(text, "Number of Averages: {}", record.averages);
    let _ = writeln!(text, "Timestamp: {}", record.timestamp);
    text.push_str(&result_lines(&record.input, &record.result));
    if let Some(summary) = &record.spectrum {
        text.push_str(&spectrum_lines(summary));
    }
    text
}

fn result_lines(input: &NoiseMeasurementInput, result: &NoiseMeasurementResult) -> String {
    let mut text = String::new();
    // `{:>10.2}` lines up positive and negative numbers on the decimal
    let _ = writeln!(text, "T_hot:\t\t{:>10.2} K", input.hot_temperature_kelvin);
    let _ = writeln!(text, "T_cold:\t\t{:>10.2} K", input.cold_temperature_kelvin);
    let _ = writeln!(text, "P_hot:\t\t{:>10.2} dB", input.hot_power_db);
    let _ = writeln!(text, "P_cold:\t\t{:>10.2} dB", input.cold_power_db);
    let _ = writeln!(text, "Y-factor:\t{:>10.4} ({:.3} dB)", result.y_factor, result.y_factor_db());
    match result.system_noise_temperature_kelvin {
        Some(t) => {
            let _ = writeln!(text, "T_sys:\t\t{:>10.1} K", t);
        }
        None => {
            let _ = writeln!(text, "T_sys:\t\t undefined (Y = 1)");
        }
    }
    if let Some(nf) = result.noise_figure_db() {
        let _ = writeln!(text, "Noise Figure:\t{:>10.2} dB", nf);
    }
    if let Some(n0) = result.noise_spectral_density_dbm_per_hz() {
        let _ = writeln!(text, "Noise Floor:\t{:>10.2} dBm/Hz", n0);
    }
    if let Validity::NonPhysical(reason) = result.validity {
        let _ = writeln!(text, "WARNING: non-physical result, {}", reason);
        let _ = writeln!(
            text,
            "         check the source connections and run the measurement again"
        );
    }
    text
}

fn spectrum_lines(summary: &SpectrumSummary) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "\nAcross {} points:", summary.points);
    let _ = writeln!(
        text,
        "Mean Y-factor: {:.3} (std {:.3})",
        summary.y_factor.mean, summary.y_factor.std
    );
    if let Some(t_sys) = &summary.system_noise_temperature_kelvin {
        let _ = writeln!(
            text,
            "Mean T_sys: {:.1} K (std {:.1} K)",
            t_sys.mean, t_sys.std
        );
        let _ = writeln!(text, "T_sys range: {:.1} - {:.1} K", t_sys.min, t_sys.max);
    }
    if summary.non_physical_points > 0 {
        let _ = writeln!(
            text,
            "{} of {} points are non-physical",
            summary.non_physical_points, summary.points
        );
    }
    text
}
