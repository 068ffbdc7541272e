//! Y-factor noise temperature measurements with a networked spectrum analyzer.
//!
//! The noise power is measured once with a hot and once with a cold source
//! connected to the receiver input. Their ratio, the Y-factor, gives the system
//! noise temperature:
//!
//! ```text
//! Y     = P_hot / P_cold                      (linear power)
//! T_sys = (T_hot - Y * T_cold) / (Y - 1)
//! ```
//!
//! ```
//! use yfactor::{NoiseMeasurementInput, SourceTemperatures};
//!
//! let input = NoiseMeasurementInput::new(SourceTemperatures::default(), -40.0, -43.0);
//! let result = input.evaluate().unwrap();
//! assert!(result.is_physical());
//! assert!((result.system_noise_temperature_kelvin.unwrap() - 142.04).abs() < 0.01);
//! ```

pub mod cli;
pub mod config;
pub mod constants;
mod error;
pub mod frequency;
#[cfg(feature = "report")]
pub mod html;
pub mod instrument;
pub mod measurement;
pub mod operator;
pub mod power;
pub mod procedure;
pub mod report;
pub mod spectrum;

pub use error::{Error, Result, Stage};
pub use instrument::{
    InstrumentError, InstrumentSession, Resource, ScpiSession, SimulatedAnalyzer, SweepSettings,
};
pub use measurement::{
    system_noise_temperature, NoiseMeasurementInput, NoiseMeasurementResult, NonPhysicalReason,
    SourceTemperatures, Validity,
};
pub use operator::{ConsoleOperator, Operator};
pub use procedure::{State, YFactorMeasurement, YFactorProcedure};
pub use report::MeasurementRecord;
pub use spectrum::{SpectrumSummary, Statistics, Trace, YFactorSpectrum};
