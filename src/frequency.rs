use crate::error::{Error, Result};

/// Parse a frequency such as `375MHz`, `10 kHz`, `1.5e9` or `2GHz` into Hz.
///
/// Units are case-insensitive; a bare number is taken as Hz.
pub fn parse_frequency(text: &str) -> Result<f64> {
    let trimmed = text.trim();
    let lower = trimmed.to_ascii_lowercase();
    let (number, multiplier) = if let Some(n) = lower.strip_suffix("ghz") {
        (n, 1.0e9)
    } else if let Some(n) = lower.strip_suffix("mhz") {
        (n, 1.0e6)
    } else if let Some(n) = lower.strip_suffix("khz") {
        (n, 1.0e3)
    } else if let Some(n) = lower.strip_suffix("hz") {
        (n, 1.0)
    } else {
        (lower.as_str(), 1.0)
    };

    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| Error::invalid(format!("cannot parse frequency `{}`", trimmed)))?;
    if !value.is_finite() || value < 0.0 {
        return Err(Error::invalid(format!(
            "frequency must be a non-negative number, got `{}`",
            trimmed
        )));
    }
    Ok(value * multiplier)
}

/// Scale a frequency in Hz to the largest unit that keeps it above 1.
pub fn frequency_with_unit(frequency: f64) -> (f64, &'static str) {
    if frequency >= 1e12 {
        (frequency / 1e12, "THz")
    } else if frequency >= 1e9 {
        (frequency / 1e9, "GHz")
    } else if frequency >= 1e6 {
        (frequency / 1e6, "MHz")
    } else if frequency >= 1e3 {
        (frequency / 1e3, "kHz")
    } else {
        (frequency, "Hz")
    }
}

pub fn format_frequency(frequency: f64) -> String {
    let (value, unit) = frequency_with_unit(frequency);
    format!("{} {}", trim_float(value), unit)
}

// 437.500000 -> 437.5
fn trim_float(value: f64) -> String {
    let text = format!("{:.6}", value);
    let text = text.trim_end_matches('0');
    text.trim_end_matches('.').to_string()
}
