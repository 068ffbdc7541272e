use tracing::{debug, info, warn};

use crate::constants::MAX_AVERAGES;
use crate::error::{Error, Result, Stage};
use crate::instrument::{InstrumentError, InstrumentSession, SweepSettings};
use crate::measurement::{NoiseMeasurementInput, NoiseMeasurementResult, SourceTemperatures};
use crate::operator::Operator;
use crate::report;
use crate::spectrum::{Trace, YFactorSpectrum};

/// Where a Y-factor run stands. Runs only ever move one step forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum State {
    Idle,
    Configuring,
    AwaitingHotMeasurement,
    HotMeasured,
    AwaitingOperatorSwap,
    AwaitingColdMeasurement,
    ColdMeasured,
    Computed,
    Reported,
}

impl State {
    pub fn next(self) -> Option<State> {
        let next = match self {
            State::Idle => State::Configuring,
            State::Configuring => State::AwaitingHotMeasurement,
            State::AwaitingHotMeasurement => State::HotMeasured,
            State::HotMeasured => State::AwaitingOperatorSwap,
            State::AwaitingOperatorSwap => State::AwaitingColdMeasurement,
            State::AwaitingColdMeasurement => State::ColdMeasured,
            State::ColdMeasured => State::Computed,
            State::Computed => State::Reported,
            State::Reported => return None,
        };
        Some(next)
    }
}

/// Everything one completed run produced.
#[derive(Clone, Debug)]
pub struct YFactorMeasurement {
    pub instrument: String,
    pub sweep: SweepSettings,
    pub averages: usize,
    pub input: NoiseMeasurementInput,
    pub result: NoiseMeasurementResult,
    pub hot_trace: Trace,
    pub cold_trace: Trace,
    pub spectrum: Option<YFactorSpectrum>,
}

/// Guided hot/cold measurement against one analyzer session.
///
/// The session is only touched after the source temperatures and sweep have
/// been checked, and no step is ever retried: if a reading looks wrong the
/// operator runs the procedure again.
pub struct YFactorProcedure<'a, S: InstrumentSession + ?Sized> {
    session: &'a mut S,
    temperatures: SourceTemperatures,
    sweep: SweepSettings,
    averages: usize,
    state: State,
}

impl<'a, S: InstrumentSession + ?Sized> YFactorProcedure<'a, S> {
    pub fn new(
        session: &'a mut S,
        temperatures: SourceTemperatures,
        sweep: SweepSettings,
    ) -> YFactorProcedure<'a, S> {
        YFactorProcedure {
            session,
            temperatures,
            sweep,
            averages: 1,
            state: State::Idle,
        }
    }

    /// Average `averages` sweeps per source, clamped to 1..=[`MAX_AVERAGES`].
    pub fn with_averages(mut self, averages: usize) -> Self {
        self.averages = averages.clamp(1, MAX_AVERAGES);
        self
    }

    pub fn state(&self) -> State {
        self.state
    }

    fn advance(&mut self, to: State) -> Result<()> {
        if self.state.next() != Some(to) {
            return Err(Error::InvalidTransition {
                from: self.state,
                to,
            });
        }
        debug!("y-factor procedure: {:?} -> {:?}", self.state, to);
        self.state = to;
        Ok(())
    }

    /// Run the whole sequence: configure, hot, swap, cold, compute, report.
    pub fn run(&mut self, operator: &mut dyn Operator) -> Result<YFactorMeasurement> {
        if self.state != State::Idle {
            return Err(Error::InvalidTransition {
                from: self.state,
                to: State::Configuring,
            });
        }
        // nothing below may run on a bad configuration
        self.temperatures.validate()?;
        self.sweep.validate()?;

        self.advance(State::Configuring)?;
        let instrument = self
            .session
            .identify()
            .map_err(|err| Error::instrument(Stage::Identify, err))?;
        info!("measuring with {}", instrument);
        self.session
            .configure(&self.sweep)
            .map_err(|err| Error::instrument(Stage::Configure, err))?;
        say(operator, &format!("Sweep: {}", self.sweep))?;

        self.advance(State::AwaitingHotMeasurement)?;
        say(
            operator,
            &format!(
                "\nHot Source Measurement ({}K)",
                self.temperatures.hot_kelvin
            ),
        )?;
        operator
            .wait_for("Connect HOT noise source and press Enter to measure...")
            .map_err(Error::Operator)?;
        let hot_trace = self.measure(Stage::HotMeasurement)?;

        self.advance(State::HotMeasured)?;
        say(
            operator,
            &format!(
                "Hot measurement complete: {} points acquired",
                hot_trace.len()
            ),
        )?;

        self.advance(State::AwaitingOperatorSwap)?;
        say(
            operator,
            &format!(
                "\nCold Source Measurement ({}K)",
                self.temperatures.cold_kelvin
            ),
        )?;
        operator
            .wait_for("Connect COLD noise source and press Enter to measure...")
            .map_err(Error::Operator)?;

        self.advance(State::AwaitingColdMeasurement)?;
        let cold_trace = self.measure(Stage::ColdMeasurement)?;

        self.advance(State::ColdMeasured)?;
        say(
            operator,
            &format!(
                "Cold measurement complete: {} points acquired",
                cold_trace.len()
            ),
        )?;

        let input = NoiseMeasurementInput::new(
            self.temperatures,
            hot_trace.band_power_db(),
            cold_trace.band_power_db(),
        );
        let result = input.evaluate()?;
        let spectrum = YFactorSpectrum::from_traces(&hot_trace, &cold_trace, &self.temperatures);
        self.advance(State::Computed)?;
        if result.is_physical() {
            info!("{}", result);
        } else {
            warn!("non-physical result: {}", result);
        }

        let measurement = YFactorMeasurement {
            instrument,
            sweep: self.sweep.clone(),
            averages: self.averages,
            input,
            result,
            hot_trace,
            cold_trace,
            spectrum,
        };
        say(operator, &report::summary(&measurement))?;
        self.advance(State::Reported)?;
        Ok(measurement)
    }

    fn measure(&mut self, stage: Stage) -> Result<Trace> {
        let mut traces = Vec::new();
        for i in 0..self.averages {
            if self.averages > 1 {
                debug!("{}: trace {}/{}", stage, i + 1, self.averages);
            }
            let trace = self
                .session
                .acquire_trace()
                .map_err(|err| Error::instrument(stage, err))?;
            if trace.is_empty() {
                return Err(Error::instrument(stage, InstrumentError::EmptyTrace));
            }
            traces.push(trace);
        }
        let trace = Trace::average(&traces).ok_or_else(|| {
            Error::instrument(
                stage,
                InstrumentError::MalformedResponse {
                    command: "TRAC? TRACE1".to_string(),
                    response: "trace length changed between sweeps".to_string(),
                },
            )
        })?;
        // extreme levels under- or overflow the linear sum
        let band_power_db = trace.band_power_db();
        if !band_power_db.is_finite() {
            return Err(Error::instrument(
                stage,
                InstrumentError::MalformedResponse {
                    command: "TRAC? TRACE1".to_string(),
                    response: format!("band power is {} dB", band_power_db),
                },
            ));
        }
        Ok(trace)
    }
}

fn say(operator: &mut dyn Operator, message: &str) -> Result<()> {
    operator.say(message).map_err(Error::Operator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::ConsoleOperator;

    /// Returns flat traces at the scripted levels, one per sweep.
    struct ScriptedAnalyzer {
        levels_db: Vec<f64>,
        calls: Vec<&'static str>,
    }

    impl ScriptedAnalyzer {
        fn new(levels_db: &[f64]) -> Self {
            ScriptedAnalyzer {
                levels_db: levels_db.to_vec(),
                calls: Vec::new(),
            }
        }
    }

    impl InstrumentSession for ScriptedAnalyzer {
        fn identify(&mut self) -> std::result::Result<String, InstrumentError> {
            self.calls.push("identify");
            Ok("Scripted,SA,0,1.0".to_string())
        }

        fn configure(&mut self, _: &SweepSettings) -> std::result::Result<(), InstrumentError> {
            self.calls.push("configure");
            Ok(())
        }

        fn acquire_trace(&mut self) -> std::result::Result<Trace, InstrumentError> {
            self.calls.push("acquire_trace");
            if self.levels_db.is_empty() {
                return Err(InstrumentError::Timeout);
            }
            let level = self.levels_db.remove(0);
            Ok(Trace::from_sweep(375.0e6, 500.0e6, vec![level; 5]))
        }
    }

    fn operator() -> ConsoleOperator<&'static [u8], Vec<u8>> {
        ConsoleOperator::new(&b"\n\n"[..], Vec::new())
    }

    #[test]
    fn states_move_forward_one_at_a_time() {
        let mut state = State::Idle;
        let mut visited = vec![state];
        while let Some(next) = state.next() {
            assert!(next > state);
            state = next;
            visited.push(state);
        }
        assert_eq!(visited.len(), 9);
        assert_eq!(state, State::Reported);
    }

    #[test]
    fn full_run() {
        let mut analyzer = ScriptedAnalyzer::new(&[-40.0, -43.0]);
        let mut operator = operator();
        let mut procedure = YFactorProcedure::new(
            &mut analyzer,
            SourceTemperatures::default(),
            SweepSettings::default(),
        );
        let measurement = procedure.run(&mut operator).unwrap();
        assert_eq!(procedure.state(), State::Reported);

        assert!((measurement.input.hot_power_db - -40.0).abs() < 1e-9);
        assert!((measurement.input.cold_power_db - -43.0).abs() < 1e-9);
        assert!((measurement.result.y_factor - 1.9952623149688795).abs() < 1e-9);
        let t_sys = measurement.result.system_noise_temperature_kelvin.unwrap();
        assert!((t_sys - 142.04).abs() < 0.01);
        assert!(measurement.result.is_physical());
        assert_eq!(measurement.instrument, "Scripted,SA,0,1.0");
        assert_eq!(measurement.spectrum.unwrap().points.len(), 5);

        assert_eq!(
            analyzer.calls,
            vec!["identify", "configure", "acquire_trace", "acquire_trace"]
        );
        let transcript = String::from_utf8(operator.into_output()).unwrap();
        let hot = transcript.find("Connect HOT").unwrap();
        let cold = transcript.find("Connect COLD").unwrap();
        assert!(hot < cold);
    }

    #[test]
    fn invalid_temperatures_never_touch_the_instrument() {
        let mut analyzer = ScriptedAnalyzer::new(&[-40.0, -43.0]);
        let temperatures = SourceTemperatures {
            hot_kelvin: 77.0,
            cold_kelvin: 295.0,
        };
        let mut procedure =
            YFactorProcedure::new(&mut analyzer, temperatures, SweepSettings::default());
        let result = procedure.run(&mut operator());
        assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
        assert_eq!(procedure.state(), State::Idle);
        assert!(analyzer.calls.is_empty());
    }

    #[test]
    fn equal_readings_are_reported_non_physical() {
        let mut analyzer = ScriptedAnalyzer::new(&[-40.0, -40.0]);
        let mut procedure = YFactorProcedure::new(
            &mut analyzer,
            SourceTemperatures::default(),
            SweepSettings::default(),
        );
        let measurement = procedure.run(&mut operator()).unwrap();
        assert!(!measurement.result.is_physical());
        assert_eq!(procedure.state(), State::Reported);
    }

    #[test]
    fn cold_failure_names_the_cold_measurement() {
        let mut analyzer = ScriptedAnalyzer::new(&[-40.0]);
        let mut procedure = YFactorProcedure::new(
            &mut analyzer,
            SourceTemperatures::default(),
            SweepSettings::default(),
        );
        match procedure.run(&mut operator()) {
            Err(Error::Instrument { stage, source }) => {
                assert_eq!(stage, Stage::ColdMeasurement);
                assert!(matches!(source, InstrumentError::Timeout));
            }
            other => panic!(
                "expected cold measurement failure, got {:?}",
                other.map(|m| m.result)
            ),
        }
        assert_eq!(procedure.state(), State::AwaitingColdMeasurement);
        // no retry happened
        assert_eq!(analyzer.calls.len(), 4);
    }

    #[test]
    fn unusable_band_power_names_the_measurement() {
        let mut analyzer = ScriptedAnalyzer::new(&[-1.0e6, -43.0]);
        let mut procedure = YFactorProcedure::new(
            &mut analyzer,
            SourceTemperatures::default(),
            SweepSettings::default(),
        );
        match procedure.run(&mut operator()) {
            Err(Error::Instrument { stage, source }) => {
                assert_eq!(stage, Stage::HotMeasurement);
                assert!(matches!(source, InstrumentError::MalformedResponse { .. }));
            }
            other => panic!(
                "expected hot measurement failure, got {:?}",
                other.map(|m| m.result)
            ),
        }
        assert_eq!(analyzer.calls.len(), 3);

        let mut analyzer = ScriptedAnalyzer::new(&[-40.0, 1.0e6]);
        let mut procedure = YFactorProcedure::new(
            &mut analyzer,
            SourceTemperatures::default(),
            SweepSettings::default(),
        );
        assert!(matches!(
            procedure.run(&mut operator()),
            Err(Error::Instrument {
                stage: Stage::ColdMeasurement,
                ..
            })
        ));
    }

    #[test]
    fn averages_are_clamped() {
        let mut analyzer = ScriptedAnalyzer::new(&[]);
        let procedure = YFactorProcedure::new(
            &mut analyzer,
            SourceTemperatures::default(),
            SweepSettings::default(),
        )
        .with_averages(usize::MAX);
        assert_eq!(procedure.averages, MAX_AVERAGES);
    }

    #[test]
    fn averages_each_source() {
        let mut analyzer = ScriptedAnalyzer::new(&[-40.0, -42.0, -43.0, -45.0]);
        let mut procedure = YFactorProcedure::new(
            &mut analyzer,
            SourceTemperatures::default(),
            SweepSettings::default(),
        )
        .with_averages(2);
        let measurement = procedure.run(&mut operator()).unwrap();
        assert!((measurement.input.hot_power_db - -41.0).abs() < 1e-9);
        assert!((measurement.input.cold_power_db - -44.0).abs() < 1e-9);
        assert_eq!(measurement.averages, 2);
    }

    #[test]
    fn a_finished_run_cannot_be_resumed() {
        let mut analyzer = ScriptedAnalyzer::new(&[-40.0, -43.0, -40.0, -43.0]);
        let mut procedure = YFactorProcedure::new(
            &mut analyzer,
            SourceTemperatures::default(),
            SweepSettings::default(),
        );
        procedure.run(&mut operator()).unwrap();
        assert!(matches!(
            procedure.run(&mut operator()),
            Err(Error::InvalidTransition {
                from: State::Reported,
                ..
            })
        ));
    }

    #[test]
    fn operator_leaving_stops_before_the_cold_measurement() {
        let mut analyzer = ScriptedAnalyzer::new(&[-40.0, -43.0]);
        let mut operator = ConsoleOperator::new(&b"\n"[..], Vec::new());
        let mut procedure = YFactorProcedure::new(
            &mut analyzer,
            SourceTemperatures::default(),
            SweepSettings::default(),
        );
        assert!(matches!(
            procedure.run(&mut operator),
            Err(Error::Operator(_))
        ));
        assert_eq!(procedure.state(), State::AwaitingOperatorSwap);
        assert_eq!(analyzer.calls.len(), 3);
    }
}
