use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::frequency::frequency_with_unit;
use crate::measurement::Validity;
use crate::report::MeasurementRecord;
use crate::spectrum::YFactorSpectrum;

// keeps the page readable for 10001-point sweeps
const MAX_SPECTRUM_ROWS: usize = 201;

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn write_row(file: &mut File, parameter: &str, value: &str, unit: &str) -> std::io::Result<()> {
    writeln!(file, "<tr>")?;
    writeln!(file, "<td>{}</td>", parameter)?;
    writeln!(file, "<td>{}</td>", value)?;
    writeln!(file, "<td>{}</td>", unit)?;
    writeln!(file, "</tr>")
}

pub fn generate_html_report(
    record: &MeasurementRecord,
    spectrum: Option<&YFactorSpectrum>,
    output_path: &Path,
) -> Result<(), std::io::Error> {
    let mut file = File::create(output_path)?;

    writeln!(file, "<!DOCTYPE html>")?;
    writeln!(file, "<html>")?;
    writeln!(file, "<head>")?;
    writeln!(file, "<title>Y-Factor Noise Temperature</title>")?;
    writeln!(file, "<style>")?;
    writeln!(file, "table {{ border-collapse: collapse; }}")?;
    writeln!(file, ".spectrum {{ width: 100%; }}")?;
    writeln!(file, ".parameters {{ width: auto; }}")?;
    writeln!(file, ".parameters td:nth-child(2) {{ text-align: right; }}")?;
    writeln!(
        file,
        "th, td {{ border: 1px solid #ddd; padding: 8px; text-align: left; }}"
    )?;
    writeln!(file, "th {{ background-color: #f2f2f2; }}")?;
    writeln!(file, "tr:nth-child(even) {{ background-color: #f9f9f9; }}")?;
    writeln!(file, ".warning {{ color: #b00020; font-weight: bold; }}")?;
    writeln!(file, "</style>")?;
    writeln!(file, "</head>")?;
    writeln!(file, "<body>")?;
    writeln!(file, "<h1>Y-Factor Noise Temperature</h1>")?;
    writeln!(
        file,
        "<p>{} &middot; {}</p>",
        escape_html(&record.instrument),
        escape_html(&record.timestamp)
    )?;

    writeln!(file, "<h2>Sweep</h2>")?;
    writeln!(file, "<table class=\"parameters\">")?;
    writeln!(file, "<tr><th>Parameter</th><th>Value</th><th>Unit</th></tr>")?;
    for (name, frequency) in [
        ("Center Frequency", record.sweep.center_frequency_hz),
        ("Span", record.sweep.span_hz),
        ("Resolution Bandwidth", record.sweep.resolution_bandwidth_hz),
    ] {
        let (value, unit) = frequency_with_unit(frequency);
        write_row(&mut file, name, &format!("{:.2}", value), unit)?;
    }
    write_row(
        &mut file,
        "Sweep Points",
        &record.sweep.sweep_points.to_string(),
        "",
    )?;
    let preamp = match record.sweep.preamp {
        Some(true) => "ON",
        Some(false) => "OFF",
        None => "-",
    };
    write_row(&mut file, "Preamp", preamp, "")?;
    let attenuation = record
        .sweep
        .attenuation_db
        .map(|att| format!("{:.1}", att))
        .unwrap_or_else(|| "-".to_string());
    write_row(&mut file, "Attenuation", &attenuation, "dB")?;
    write_row(&mut file, "Averages", &record.averages.to_string(), "")?;
    writeln!(file, "</table>")?;
    writeln!(file, "<br>")?;

    let input = &record.input;
    let result = &record.result;
    writeln!(file, "<h2>Result</h2>")?;
    writeln!(file, "<table class=\"parameters\">")?;
    writeln!(file, "<tr><th>Parameter</th><th>Value</th><th>Unit</th></tr>")?;
    write_row(
        &mut file,
        "T_hot",
        &format!("{:.2}", input.hot_temperature_kelvin),
        "K",
    )?;
    write_row(
        &mut file,
        "T_cold",
        &format!("{:.2}", input.cold_temperature_kelvin),
        "K",
    )?;
    write_row(&mut file, "P_hot", &format!("{:.2}", input.hot_power_db), "dB")?;
    write_row(&mut file, "P_cold", &format!("{:.2}", input.cold_power_db), "dB")?;
    write_row(&mut file, "Y-factor", &format!("{:.4}", result.y_factor), "")?;
    write_row(&mut file, "Y-factor", &format!("{:.3}", result.y_factor_db()), "dB")?;
    let t_sys = result
        .system_noise_temperature_kelvin
        .map(|t| format!("{:.1}", t))
        .unwrap_or_else(|| "undefined".to_string());
    write_row(&mut file, "T_sys", &t_sys, "K")?;
    if let Some(nf) = result.noise_figure_db() {
        write_row(&mut file, "Noise Figure", &format!("{:.2}", nf), "dB")?;
    }
    writeln!(file, "</table>")?;
    if let Validity::NonPhysical(reason) = result.validity {
        writeln!(file, "<p class=\"warning\">Non-physical result: {}</p>", reason)?;
    }

    if let Some(spectrum) = spectrum {
        let step = spectrum.points.len().div_ceil(MAX_SPECTRUM_ROWS).max(1);
        writeln!(file, "<h2>Spectrum</h2>")?;
        if step > 1 {
            writeln!(
                file,
                "<p>Every {} of {} points shown.</p>",
                step,
                spectrum.points.len()
            )?;
        }
        writeln!(file, "<table class=\"spectrum\">")?;
        writeln!(file, "<tr>")?;
        writeln!(file, "<th>Frequency (MHz)</th>")?;
        writeln!(file, "<th>Y-factor</th>")?;
        writeln!(file, "<th>Y-factor (dB)</th>")?;
        writeln!(file, "<th>T_sys (K)</th>")?;
        writeln!(file, "<th>NF (dB)</th>")?;
        writeln!(file, "</tr>")?;
        for (frequency, point) in spectrum
            .frequencies_hz
            .iter()
            .zip(&spectrum.points)
            .step_by(step)
        {
            writeln!(file, "<tr>")?;
            writeln!(file, "<td>{:.3}</td>", frequency / 1e6)?;
            writeln!(file, "<td>{:.4}</td>", point.y_factor)?;
            writeln!(file, "<td>{:.3}</td>", point.y_factor_db())?;
            match point.system_noise_temperature_kelvin {
                Some(t) if point.is_physical() => writeln!(file, "<td>{:.1}</td>", t)?,
                Some(t) => writeln!(file, "<td class=\"warning\">{:.1}</td>", t)?,
                None => writeln!(file, "<td class=\"warning\">-</td>")?,
            }
            match point.noise_figure_db() {
                Some(nf) => writeln!(file, "<td>{:.2}</td>", nf)?,
                None => writeln!(file, "<td>-</td>")?,
            }
            writeln!(file, "</tr>")?;
        }
        writeln!(file, "</table>")?;
    }

    writeln!(file, "</body>")?;
    writeln!(file, "</html>")?;

    Ok(())
}
