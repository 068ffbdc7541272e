use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use crate::constants::{DEFAULT_TIMEOUT_MS, MAX_AVERAGES};
use crate::error::{Error, Result};
use crate::frequency::parse_frequency;
use crate::instrument::SweepSettings;
use crate::measurement::SourceTemperatures;

/// Measurement settings read from a TOML file.
///
/// A missing `[sweep]` or `[sources]` table leaves those settings to be
/// prompted for; keys missing inside a table take their defaults.
#[derive(Deserialize, Debug, Default)]
pub struct MeasurementConfig {
    #[serde(default)]
    pub instrument: InstrumentConfig,
    pub sweep: Option<SweepConfig>,
    pub sources: Option<SourcesConfig>,
}

#[derive(Deserialize, Debug, Default)]
pub struct InstrumentConfig {
    pub resource: Option<String>,
    pub timeout_ms: Option<u64>,
}

#[derive(Deserialize, Debug, Default)]
pub struct SweepConfig {
    pub center_frequency: Option<FrequencyConfig>,
    pub span: Option<FrequencyConfig>,
    pub resolution_bandwidth: Option<FrequencyConfig>,
    pub sweep_points: Option<usize>,
    pub preamp: Option<bool>,
    pub attenuation_db: Option<f64>,
    pub averages: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
pub struct SourcesConfig {
    pub hot_temperature_kelvin: Option<f64>,
    pub cold_temperature_kelvin: Option<f64>,
}

/// `"437.5MHz"` or a plain number of Hz.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum FrequencyConfig {
    Hz(f64),
    Text(String),
}

impl FrequencyConfig {
    pub fn to_hz(&self) -> Result<f64> {
        match self {
            FrequencyConfig::Hz(hz) => Ok(*hz),
            FrequencyConfig::Text(text) => parse_frequency(text),
        }
    }
}

fn frequency_or(value: &Option<FrequencyConfig>, default: f64) -> Result<f64> {
    match value {
        Some(frequency) => frequency.to_hz(),
        None => Ok(default),
    }
}

impl SweepConfig {
    pub fn to_settings(&self) -> Result<SweepSettings> {
        let defaults = SweepSettings::default();
        let sweep = SweepSettings {
            center_frequency_hz: frequency_or(
                &self.center_frequency,
                defaults.center_frequency_hz,
            )?,
            span_hz: frequency_or(&self.span, defaults.span_hz)?,
            resolution_bandwidth_hz: frequency_or(
                &self.resolution_bandwidth,
                defaults.resolution_bandwidth_hz,
            )?,
            sweep_points: self.sweep_points.unwrap_or(defaults.sweep_points),
            preamp: self.preamp,
            attenuation_db: self.attenuation_db,
        };
        sweep.validate()?;
        Ok(sweep)
    }

    pub fn averages(&self) -> Result<usize> {
        match self.averages {
            Some(0) => Err(Error::invalid("averages must be at least 1")),
            Some(averages) if averages > MAX_AVERAGES => Err(Error::invalid(format!(
                "averages must be at most {}, got {}",
                MAX_AVERAGES, averages
            ))),
            Some(averages) => Ok(averages),
            None => Ok(1),
        }
    }
}

impl SourcesConfig {
    pub fn to_temperatures(&self) -> Result<SourceTemperatures> {
        let defaults = SourceTemperatures::default();
        SourceTemperatures::new(
            self.hot_temperature_kelvin.unwrap_or(defaults.hot_kelvin),
            self.cold_temperature_kelvin.unwrap_or(defaults.cold_kelvin),
        )
    }
}

impl InstrumentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS))
    }
}

pub fn parse_config(content: &str) -> Result<MeasurementConfig> {
    let config: MeasurementConfig = toml::from_str(content)?;
    debug!("config: {:?}", config);
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<MeasurementConfig> {
    info!("loading config {}", path.display());
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}
