use std::default::Default;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{
    BOLTZMANN, DEFAULT_COLD_TEMPERATURE_KELVIN, DEFAULT_HOT_TEMPERATURE_KELVIN,
};
use crate::error::{Error, Result};
use crate::power::db_to_linear;

/// Physical temperatures of the two noise sources.
///
/// The values are taken as given by the operator: a "cold" load may be a
/// cryogenic reference or just a cooler ambient termination.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceTemperatures {
    pub hot_kelvin: f64,
    pub cold_kelvin: f64,
}

impl Default for SourceTemperatures {
    fn default() -> Self {
        Self {
            hot_kelvin: DEFAULT_HOT_TEMPERATURE_KELVIN,
            cold_kelvin: DEFAULT_COLD_TEMPERATURE_KELVIN,
        }
    }
}

impl fmt::Display for SourceTemperatures {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "T_hot = {}K, T_cold = {}K", self.hot_kelvin, self.cold_kelvin)
    }
}

impl SourceTemperatures {
    /// Checked constructor, requires `hot > cold > 0`.
    pub fn new(hot_kelvin: f64, cold_kelvin: f64) -> Result<SourceTemperatures> {
        let temperatures = SourceTemperatures {
            hot_kelvin,
            cold_kelvin,
        };
        temperatures.validate()?;
        Ok(temperatures)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.hot_kelvin.is_finite() || !self.cold_kelvin.is_finite() {
            return Err(Error::invalid(format!(
                "source temperatures must be finite, got {}",
                self
            )));
        }
        if self.cold_kelvin <= 0.0 {
            return Err(Error::invalid(format!(
                "cold source temperature must be above 0K, got {}K",
                self.cold_kelvin
            )));
        }
        if self.cold_kelvin >= self.hot_kelvin {
            return Err(Error::invalid(format!(
                "cold source must be colder than hot source, got {}",
                self
            )));
        }
        Ok(())
    }

    /// Largest Y-factor a noiseless receiver could show with these sources.
    pub fn y_factor_limit(&self) -> f64 {
        self.hot_kelvin / self.cold_kelvin
    }
}

/// The four raw numbers that go into one Y-factor evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoiseMeasurementInput {
    pub hot_temperature_kelvin: f64,
    pub cold_temperature_kelvin: f64,
    pub hot_power_db: f64,  // dB-relative, as reported by the analyzer
    pub cold_power_db: f64, // dB-relative, as reported by the analyzer
}

impl fmt::Display for NoiseMeasurementInput {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "NoiseMeasurementInput {{ T_hot: {} K, T_cold: {} K, P_hot: {} dB, P_cold: {} dB }}",
            self.hot_temperature_kelvin,
            self.cold_temperature_kelvin,
            self.hot_power_db,
            self.cold_power_db
        )
    }
}

impl NoiseMeasurementInput {
    pub fn new(
        temperatures: SourceTemperatures,
        hot_power_db: f64,
        cold_power_db: f64,
    ) -> NoiseMeasurementInput {
        NoiseMeasurementInput {
            hot_temperature_kelvin: temperatures.hot_kelvin,
            cold_temperature_kelvin: temperatures.cold_kelvin,
            hot_power_db,
            cold_power_db,
        }
    }

    pub fn temperatures(&self) -> SourceTemperatures {
        SourceTemperatures {
            hot_kelvin: self.hot_temperature_kelvin,
            cold_kelvin: self.cold_temperature_kelvin,
        }
    }

    pub fn hot_power_linear(&self) -> f64 {
        db_to_linear(self.hot_power_db)
    }

    pub fn cold_power_linear(&self) -> f64 {
        db_to_linear(self.cold_power_db)
    }

    /// Evaluate the Y-factor and system noise temperature.
    ///
    /// Fails only when the temperatures are unusable or a power reading is not
    /// a number. A measurement that makes no physical sense still evaluates and
    /// comes back flagged through [`NoiseMeasurementResult::validity`].
    pub fn evaluate(&self) -> Result<NoiseMeasurementResult> {
        let temperatures = self.temperatures();
        temperatures.validate()?;
        if !self.hot_power_db.is_finite() || !self.cold_power_db.is_finite() {
            return Err(Error::invalid(format!(
                "power readings must be finite, got {}",
                self
            )));
        }

        let y_factor = self.hot_power_linear() / self.cold_power_linear();
        Ok(NoiseMeasurementResult::from_y_factor(y_factor, &temperatures))
    }
}

/// `T_sys = (T_hot - Y * T_cold) / (Y - 1)`, undefined at `Y == 1`.
pub fn system_noise_temperature(
    y_factor: f64,
    hot_temperature_kelvin: f64,
    cold_temperature_kelvin: f64,
) -> Option<f64> {
    let denominator = y_factor - 1.0;
    if denominator == 0.0 {
        return None;
    }
    Some((hot_temperature_kelvin - y_factor * cold_temperature_kelvin) / denominator)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonPhysicalReason {
    /// `Y <= 1`: the hot source did not read above the cold one.
    HotNotAboveCold,
    /// `Y` above `T_hot / T_cold`, which would need a receiver colder than 0K.
    NegativeNoiseTemperature,
}

impl fmt::Display for NonPhysicalReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NonPhysicalReason::HotNotAboveCold => {
                write!(f, "hot measurement is not above cold measurement (Y <= 1)")
            }
            NonPhysicalReason::NegativeNoiseTemperature => write!(
                f,
                "Y-factor exceeds T_hot / T_cold, noise temperature is negative"
            ),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Validity {
    Physical,
    NonPhysical(NonPhysicalReason),
}

impl Validity {
    pub fn classify(y_factor: f64, system_noise_temperature_kelvin: Option<f64>) -> Validity {
        if y_factor.is_nan() || y_factor <= 1.0 {
            return Validity::NonPhysical(NonPhysicalReason::HotNotAboveCold);
        }
        match system_noise_temperature_kelvin {
            Some(t) if t >= 0.0 => Validity::Physical,
            _ => Validity::NonPhysical(NonPhysicalReason::NegativeNoiseTemperature),
        }
    }

    pub fn is_physical(&self) -> bool {
        matches!(self, Validity::Physical)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoiseMeasurementResult {
    pub y_factor: f64, // linear
    // None only where the formula divides by zero
    pub system_noise_temperature_kelvin: Option<f64>,
    pub validity: Validity,
}

impl fmt::Display for NoiseMeasurementResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let t_sys = match self.system_noise_temperature_kelvin {
            Some(t) => format!("{:.1} K", t),
            None => "undefined".to_string(),
        };
        write!(
            f,
            "NoiseMeasurementResult {{ Y: {:.4}, T_sys: {}, validity: {:?} }}",
            self.y_factor, t_sys, self.validity
        )
    }
}

impl NoiseMeasurementResult {
    pub fn from_y_factor(
        y_factor: f64,
        temperatures: &SourceTemperatures,
    ) -> NoiseMeasurementResult {
        let system_noise_temperature_kelvin =
            system_noise_temperature(y_factor, temperatures.hot_kelvin, temperatures.cold_kelvin);
        NoiseMeasurementResult {
            y_factor,
            validity: Validity::classify(y_factor, system_noise_temperature_kelvin),
            system_noise_temperature_kelvin,
        }
    }

    pub fn is_physical(&self) -> bool {
        self.validity.is_physical()
    }

    /// Y-factor in dB, the form most noise source datasheets quote.
    pub fn y_factor_db(&self) -> f64 {
        crate::power::linear_to_db(self.y_factor)
    }

    /// Receiver noise figure in dB, only for a physical result.
    pub fn noise_figure_db(&self) -> Option<f64> {
        let t = self.physical_noise_temperature()?;
        Some(rfconversions::noise::noise_figure_from_noise_temperature(t))
    }

    /// Receiver-referred noise floor `k * T_sys` in dBm/Hz, only for a physical result.
    pub fn noise_spectral_density_dbm_per_hz(&self) -> Option<f64> {
        let t = self.physical_noise_temperature()?;
        Some(rfconversions::power::watts_to_dbm(BOLTZMANN * t))
    }

    fn physical_noise_temperature(&self) -> Option<f64> {
        if self.is_physical() {
            self.system_noise_temperature_kelvin
        } else {
            None
        }
    }
}
