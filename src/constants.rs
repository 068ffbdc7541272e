/// Boltzmann constant in J/K (SI units).
pub const BOLTZMANN: f64 = 1.380649e-23;

/// Room temperature hot load, K.
pub const DEFAULT_HOT_TEMPERATURE_KELVIN: f64 = 295.0;

/// Liquid nitrogen cold load, K.
pub const DEFAULT_COLD_TEMPERATURE_KELVIN: f64 = 77.0;

/// Raw SCPI socket port used by most LAN-attached analyzers.
pub const DEFAULT_SCPI_PORT: u16 = 5025;

pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

// 375 MHz to 500 MHz window
pub const DEFAULT_CENTER_FREQUENCY_HZ: f64 = 437.5e6;
pub const DEFAULT_SPAN_HZ: f64 = 125.0e6;
pub const DEFAULT_RESOLUTION_BANDWIDTH_HZ: f64 = 10.0e3;
pub const DEFAULT_SWEEP_POINTS: usize = 1001;

/// Receiver noise temperature the `--simulate` analyzer is built with, K.
pub const DEFAULT_SIMULATED_RECEIVER_KELVIN: f64 = 100.0;

/// Upper bound on sweep points; larger than any bench analyzer offers.
pub const MAX_SWEEP_POINTS: usize = 100_001;

/// Upper bound on traces averaged per source.
pub const MAX_AVERAGES: usize = 10_000;
