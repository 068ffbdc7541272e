//! Operator port - the person at the bench
//!
//! The procedure asks questions and waits for physical source swaps through
//! [`Operator`], so it runs the same against a terminal or a scripted test.

use std::io::{self, BufRead, Write};

use crate::constants::{MAX_AVERAGES, MAX_SWEEP_POINTS};
use crate::error::{Error, Result};
use crate::frequency::{format_frequency, parse_frequency};
use crate::instrument::SweepSettings;
use crate::measurement::SourceTemperatures;

pub trait Operator {
    /// Ask a question, returning the trimmed answer (empty for no answer).
    fn prompt(&mut self, question: &str) -> io::Result<String>;

    /// Block until the operator acknowledges the instruction.
    fn wait_for(&mut self, instruction: &str) -> io::Result<()>;

    fn say(&mut self, message: &str) -> io::Result<()>;
}

/// Operator on a terminal, or on any reader/writer pair.
pub struct ConsoleOperator<R, W> {
    input: R,
    output: W,
}

impl ConsoleOperator<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        ConsoleOperator::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsoleOperator<R, W> {
    pub fn new(input: R, output: W) -> Self {
        ConsoleOperator { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn read_answer(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

impl<R: BufRead, W: Write> Operator for ConsoleOperator<R, W> {
    fn prompt(&mut self, question: &str) -> io::Result<String> {
        write!(self.output, "{} ", question)?;
        self.output.flush()?;
        // end of input answers every remaining question with its default
        Ok(self.read_answer()?.unwrap_or_default())
    }

    fn wait_for(&mut self, instruction: &str) -> io::Result<()> {
        write!(self.output, "{} ", instruction)?;
        self.output.flush()?;
        match self.read_answer()? {
            Some(_) => Ok(()),
            None => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed before the operator confirmed",
            )),
        }
    }

    fn say(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.output, "{}", message)
    }
}

fn prompt_f64(operator: &mut dyn Operator, question: &str, default: f64) -> io::Result<f64> {
    let answer = operator.prompt(&format!("{} [default: {}]:", question, default))?;
    if answer.is_empty() {
        return Ok(default);
    }
    match answer.parse::<f64>() {
        Ok(value) => Ok(value),
        Err(_) => {
            operator.say(&format!("Invalid number, using default {}", default))?;
            Ok(default)
        }
    }
}

fn prompt_frequency(operator: &mut dyn Operator, question: &str, default: f64) -> io::Result<f64> {
    let default_text = format_frequency(default).replace(' ', "");
    let answer = operator.prompt(&format!("{} [default: {}]:", question, default_text))?;
    if answer.is_empty() {
        return Ok(default);
    }
    match parse_frequency(&answer) {
        Ok(value) => Ok(value),
        Err(_) => {
            operator.say(&format!("Invalid frequency, using default {}", default_text))?;
            Ok(default)
        }
    }
}

/// Ask for both source temperatures in Kelvin and check them.
///
/// Blank or unparsable answers fall back to the defaults; a pair that fails
/// `hot > cold > 0` is an [`Error::InvalidConfiguration`].
pub fn prompt_source_temperatures(
    operator: &mut dyn Operator,
    defaults: SourceTemperatures,
) -> Result<SourceTemperatures> {
    operator
        .say("\nNoise Source Temperature Setup")
        .map_err(Error::Operator)?;
    operator
        .say("Enter temperatures in Kelvin (K)")
        .map_err(Error::Operator)?;
    let hot_kelvin = prompt_f64(operator, "Hot source temperature", defaults.hot_kelvin)
        .map_err(Error::Operator)?;
    let cold_kelvin = prompt_f64(operator, "Cold source temperature", defaults.cold_kelvin)
        .map_err(Error::Operator)?;
    let temperatures = SourceTemperatures::new(hot_kelvin, cold_kelvin)?;
    operator
        .say(&format!("Using {}", temperatures))
        .map_err(Error::Operator)?;
    Ok(temperatures)
}

/// Ask for the analyzer sweep, starting from `defaults`.
pub fn prompt_sweep_settings(
    operator: &mut dyn Operator,
    defaults: &SweepSettings,
) -> Result<SweepSettings> {
    let center_frequency_hz =
        prompt_frequency(operator, "Center frequency", defaults.center_frequency_hz)
            .map_err(Error::Operator)?;
    let span_hz =
        prompt_frequency(operator, "Span", defaults.span_hz).map_err(Error::Operator)?;
    let resolution_bandwidth_hz = prompt_frequency(
        operator,
        "Resolution bandwidth",
        defaults.resolution_bandwidth_hz,
    )
    .map_err(Error::Operator)?;
    let sweep_points = prompt_f64(operator, "Sweep points", defaults.sweep_points as f64)
        .map_err(Error::Operator)?;
    if sweep_points < 1.0 || sweep_points.fract() != 0.0 {
        return Err(Error::invalid(format!(
            "sweep points must be a whole number of at least 1, got {}",
            sweep_points
        )));
    }
    // checked before the cast, which saturates
    if sweep_points > MAX_SWEEP_POINTS as f64 {
        return Err(Error::invalid(format!(
            "sweep points must be at most {}, got {}",
            MAX_SWEEP_POINTS, sweep_points
        )));
    }

    let preamp = match operator
        .prompt("Enable preamp? (y/n, blank to skip):")
        .map_err(Error::Operator)?
        .to_ascii_lowercase()
        .as_str()
    {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => defaults.preamp,
    };

    let attenuation_answer = operator
        .prompt("Set attenuation in dB (blank to skip):")
        .map_err(Error::Operator)?;
    let attenuation_db = if attenuation_answer.is_empty() {
        defaults.attenuation_db
    } else {
        match attenuation_answer.parse::<f64>() {
            Ok(value) => Some(value),
            Err(_) => {
                operator
                    .say("Invalid attenuation value. Skipping.")
                    .map_err(Error::Operator)?;
                defaults.attenuation_db
            }
        }
    };

    let sweep = SweepSettings {
        center_frequency_hz,
        span_hz,
        resolution_bandwidth_hz,
        sweep_points: sweep_points as usize,
        preamp,
        attenuation_db,
    };
    sweep.validate()?;
    Ok(sweep)
}

/// Number of traces to average per source, from 1 to [`MAX_AVERAGES`].
pub fn prompt_averages(operator: &mut dyn Operator, default: usize) -> Result<usize> {
    let answer = prompt_f64(operator, "Number of traces to average", default as f64)
        .map_err(Error::Operator)?;
    if answer < 1.0 || answer.fract() != 0.0 || answer > MAX_AVERAGES as f64 {
        operator
            .say(&format!("Invalid number, using default of {}.", default))
            .map_err(Error::Operator)?;
        return Ok(default);
    }
    Ok(answer as usize)
}
