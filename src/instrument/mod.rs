//! Instrument session - the analyzer as seen by the measurement procedure
//!
//! The procedure only needs to configure a sweep and take readings, so any
//! analyzer (a LAN instrument, the simulator, a test double) plugs in through
//! [`InstrumentSession`].

mod resource;
mod scpi;
mod simulated;

pub use resource::Resource;
pub use scpi::ScpiSession;
pub use simulated::SimulatedAnalyzer;

use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_CENTER_FREQUENCY_HZ, DEFAULT_RESOLUTION_BANDWIDTH_HZ, DEFAULT_SPAN_HZ,
    DEFAULT_SWEEP_POINTS, MAX_SWEEP_POINTS,
};
use crate::error::{Error, Result};
use crate::frequency::format_frequency;
use crate::spectrum::Trace;

/// Error type for instrument operations
#[derive(Debug, Error)]
pub enum InstrumentError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("timed out waiting for the instrument")]
    Timeout,

    #[error("malformed response to `{command}`: {response:?}")]
    MalformedResponse { command: String, response: String },

    #[error("instrument returned an empty trace")]
    EmptyTrace,

    #[error("unsupported resource `{0}`")]
    UnsupportedResource(String),
}

impl InstrumentError {
    /// Sort socket errors into timeouts and everything else.
    pub fn from_io(err: io::Error) -> InstrumentError {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => InstrumentError::Timeout,
            _ => InstrumentError::Io(err),
        }
    }
}

/// Acquisition settings applied before measuring.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SweepSettings {
    pub center_frequency_hz: f64,
    pub span_hz: f64,
    pub resolution_bandwidth_hz: f64,
    pub sweep_points: usize,
    /// Leave the preamp alone when `None`.
    pub preamp: Option<bool>,
    /// Leave the input attenuator alone when `None`.
    pub attenuation_db: Option<f64>,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            center_frequency_hz: DEFAULT_CENTER_FREQUENCY_HZ,
            span_hz: DEFAULT_SPAN_HZ,
            resolution_bandwidth_hz: DEFAULT_RESOLUTION_BANDWIDTH_HZ,
            sweep_points: DEFAULT_SWEEP_POINTS,
            preamp: None,
            attenuation_db: None,
        }
    }
}

impl fmt::Display for SweepSettings {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} to {}, RBW {}, {} points",
            format_frequency(self.start_frequency_hz()),
            format_frequency(self.stop_frequency_hz()),
            format_frequency(self.resolution_bandwidth_hz),
            self.sweep_points
        )
    }
}

impl SweepSettings {
    pub fn start_frequency_hz(&self) -> f64 {
        self.center_frequency_hz - self.span_hz / 2.0
    }

    pub fn stop_frequency_hz(&self) -> f64 {
        self.center_frequency_hz + self.span_hz / 2.0
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("center frequency", self.center_frequency_hz),
            ("span", self.span_hz),
            ("resolution bandwidth", self.resolution_bandwidth_hz),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::invalid(format!(
                    "{} must be a positive frequency, got {}",
                    name, value
                )));
            }
        }
        if self.start_frequency_hz() < 0.0 {
            return Err(Error::invalid(format!(
                "span {} reaches below 0 Hz around center {}",
                format_frequency(self.span_hz),
                format_frequency(self.center_frequency_hz)
            )));
        }
        if self.sweep_points == 0 {
            return Err(Error::invalid("sweep points must be at least 1"));
        }
        if self.sweep_points > MAX_SWEEP_POINTS {
            return Err(Error::invalid(format!(
                "sweep points must be at most {}, got {}",
                MAX_SWEEP_POINTS, self.sweep_points
            )));
        }
        if let Some(attenuation) = self.attenuation_db {
            if !attenuation.is_finite() || attenuation < 0.0 {
                return Err(Error::invalid(format!(
                    "attenuation must be 0 dB or more, got {} dB",
                    attenuation
                )));
            }
        }
        Ok(())
    }
}

/// Port for a connected spectrum analyzer
///
/// Every call blocks until the instrument answers or the session's own
/// timeout expires.
pub trait InstrumentSession {
    /// Identification string, `*IDN?` on SCPI instruments.
    fn identify(&mut self) -> std::result::Result<String, InstrumentError>;

    fn configure(&mut self, sweep: &SweepSettings) -> std::result::Result<(), InstrumentError>;

    /// Trigger one sweep, wait for it to complete and read it back.
    fn acquire_trace(&mut self) -> std::result::Result<Trace, InstrumentError>;

    /// One power reading in dB: the band power of a fresh sweep.
    fn measure_power(&mut self) -> std::result::Result<f64, InstrumentError> {
        let trace = self.acquire_trace()?;
        if trace.is_empty() {
            return Err(InstrumentError::EmptyTrace);
        }
        Ok(trace.band_power_db())
    }
}

impl<S: InstrumentSession + ?Sized> InstrumentSession for Box<S> {
    fn identify(&mut self) -> std::result::Result<String, InstrumentError> {
        (**self).identify()
    }

    fn configure(&mut self, sweep: &SweepSettings) -> std::result::Result<(), InstrumentError> {
        (**self).configure(sweep)
    }

    fn acquire_trace(&mut self) -> std::result::Result<Trace, InstrumentError> {
        (**self).acquire_trace()
    }

    fn measure_power(&mut self) -> std::result::Result<f64, InstrumentError> {
        (**self).measure_power()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlatAnalyzer {
        level_db: f64,
        points: usize,
    }

    impl InstrumentSession for FlatAnalyzer {
        fn identify(&mut self) -> std::result::Result<String, InstrumentError> {
            Ok("Flat,0,0,0".to_string())
        }

        fn configure(&mut self, _: &SweepSettings) -> std::result::Result<(), InstrumentError> {
            Ok(())
        }

        fn acquire_trace(&mut self) -> std::result::Result<Trace, InstrumentError> {
            Ok(Trace::from_sweep(0.0, 1.0, vec![self.level_db; self.points]))
        }
    }

    #[test]
    fn measure_power_is_band_power() {
        let mut analyzer = FlatAnalyzer {
            level_db: -72.5,
            points: 101,
        };
        let power = analyzer.measure_power().unwrap();
        assert!((power - -72.5).abs() < 1e-9);
    }

    #[test]
    fn measure_power_rejects_empty_trace() {
        let mut analyzer: Box<dyn InstrumentSession> = Box::new(FlatAnalyzer {
            level_db: -72.5,
            points: 0,
        });
        assert!(matches!(
            analyzer.measure_power(),
            Err(InstrumentError::EmptyTrace)
        ));
    }

    #[test]
    fn default_sweep_is_375_to_500_mhz() {
        let sweep = SweepSettings::default();
        assert_eq!(sweep.start_frequency_hz(), 375.0e6);
        assert_eq!(sweep.stop_frequency_hz(), 500.0e6);
        assert!(sweep.validate().is_ok());
    }

    #[test]
    fn sweep_validation() {
        let below_zero = SweepSettings {
            center_frequency_hz: 10.0e6,
            span_hz: 40.0e6,
            ..SweepSettings::default()
        };
        assert!(below_zero.validate().is_err());

        let no_points = SweepSettings {
            sweep_points: 0,
            ..SweepSettings::default()
        };
        assert!(no_points.validate().is_err());

        let too_many_points = SweepSettings {
            sweep_points: MAX_SWEEP_POINTS + 1,
            ..SweepSettings::default()
        };
        assert!(too_many_points.validate().is_err());
        let most_points = SweepSettings {
            sweep_points: MAX_SWEEP_POINTS,
            ..SweepSettings::default()
        };
        assert!(most_points.validate().is_ok());

        let zero_rbw = SweepSettings {
            resolution_bandwidth_hz: 0.0,
            ..SweepSettings::default()
        };
        assert!(zero_rbw.validate().is_err());

        let negative_attenuation = SweepSettings {
            attenuation_db: Some(-10.0),
            ..SweepSettings::default()
        };
        assert!(negative_attenuation.validate().is_err());
    }

    #[test]
    fn timeouts_are_told_apart() {
        let err = InstrumentError::from_io(io::Error::new(io::ErrorKind::TimedOut, "slow"));
        assert!(matches!(err, InstrumentError::Timeout));
        let err = InstrumentError::from_io(io::Error::new(io::ErrorKind::ConnectionRefused, "no"));
        assert!(matches!(err, InstrumentError::Io(_)));
    }
}
