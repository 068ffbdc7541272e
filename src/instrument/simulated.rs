use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::constants::BOLTZMANN;
use crate::instrument::{InstrumentError, InstrumentSession, SweepSettings};
use crate::measurement::SourceTemperatures;
use crate::spectrum::Trace;

/// Analyzer stand-in that sees thermal noise through a receiver of known
/// noise temperature.
///
/// Each point reads `k * (T_source + T_receiver) * RBW` plus the chain gain,
/// with a little uniform jitter. The connected source follows a fixed schedule:
/// `traces_per_source` sweeps of the hot source, then as many of the cold one,
/// and around again.
#[derive(Clone, Debug)]
pub struct SimulatedAnalyzer {
    pub receiver_temperature_kelvin: f64,
    pub gain_db: f64,
    pub jitter_db: f64,
    pub traces_per_source: usize,
    sources: SourceTemperatures,
    sweep: SweepSettings,
    traces_taken: usize,
    rng: StdRng,
}

impl SimulatedAnalyzer {
    pub fn new(receiver_temperature_kelvin: f64, sources: SourceTemperatures) -> Self {
        Self {
            receiver_temperature_kelvin,
            gain_db: 30.0,
            jitter_db: 0.05,
            traces_per_source: 1,
            sources,
            sweep: SweepSettings::default(),
            traces_taken: 0,
            rng: StdRng::seed_from_u64(0),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_jitter_db(mut self, jitter_db: f64) -> Self {
        self.jitter_db = jitter_db.abs();
        self
    }

    pub fn with_traces_per_source(mut self, traces_per_source: usize) -> Self {
        self.traces_per_source = traces_per_source.max(1);
        self
    }

    /// Temperature of the source connected for the next sweep.
    pub fn connected_source_kelvin(&self) -> f64 {
        if (self.traces_taken / self.traces_per_source) % 2 == 0 {
            self.sources.hot_kelvin
        } else {
            self.sources.cold_kelvin
        }
    }

    fn noise_level_dbm(&self, source_kelvin: f64) -> f64 {
        let noise_watts = BOLTZMANN
            * (source_kelvin + self.receiver_temperature_kelvin)
            * self.sweep.resolution_bandwidth_hz;
        rfconversions::power::watts_to_dbm(noise_watts) + self.gain_db
    }
}

impl InstrumentSession for SimulatedAnalyzer {
    fn identify(&mut self) -> Result<String, InstrumentError> {
        Ok(format!(
            "yfactor,SimulatedAnalyzer,{:.0}K,{}",
            self.receiver_temperature_kelvin,
            env!("CARGO_PKG_VERSION")
        ))
    }

    fn configure(&mut self, sweep: &SweepSettings) -> Result<(), InstrumentError> {
        self.sweep = sweep.clone();
        Ok(())
    }

    fn acquire_trace(&mut self) -> Result<Trace, InstrumentError> {
        let source_kelvin = self.connected_source_kelvin();
        let level_dbm = self.noise_level_dbm(source_kelvin);
        debug!(
            "simulated sweep with {}K source, {:.2} dBm per point",
            source_kelvin, level_dbm
        );

        let jitter = self.jitter_db;
        let rng = &mut self.rng;
        let amplitudes = (0..self.sweep.sweep_points)
            .map(|_| level_dbm + rng.gen_range(-jitter..=jitter))
            .collect();

        self.traces_taken += 1;
        Ok(Trace::from_sweep(
            self.sweep.start_frequency_hz(),
            self.sweep.stop_frequency_hz(),
            amplitudes,
        ))
    }
}
