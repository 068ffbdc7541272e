//! Integration tests: Y-factor arithmetic on bench-style readings.
//!
//! Readings are what an analyzer would report in dB with the hot and the cold
//! source connected; the expected temperatures come from the closed form
//! `T_sys = (T_hot - Y T_cold) / (Y - 1)`.

use yfactor::{
    system_noise_temperature, Error, NoiseMeasurementInput, NonPhysicalReason, SourceTemperatures,
    Validity,
};

/// Helper: assert float equality within tolerance
fn assert_approx(actual: f64, expected: f64, tol: f64, msg: &str) {
    assert!(
        (actual - expected).abs() < tol,
        "{msg}: expected {expected:.4}, got {actual:.4}"
    );
}

/// Ambient hot load against liquid nitrogen, 3 dB apart.
#[test]
fn ambient_and_liquid_nitrogen_three_db_apart() {
    let input = NoiseMeasurementInput::new(SourceTemperatures::default(), -40.0, -43.0);
    let result = input.evaluate().unwrap();

    assert_approx(input.hot_power_linear(), 1.0e-4, 1e-12, "P_hot linear");
    assert_approx(input.cold_power_linear(), 5.0119e-5, 1e-8, "P_cold linear");
    assert_approx(result.y_factor, 1.99526, 1e-4, "Y");
    assert_approx(result.y_factor_db(), 3.0, 1e-9, "Y in dB");
    assert_approx(
        result.system_noise_temperature_kelvin.unwrap(),
        142.04,
        0.01,
        "T_sys",
    );
    assert_eq!(result.validity, Validity::Physical);
    assert_approx(result.noise_figure_db().unwrap(), 1.7312, 0.001, "NF");
}

/// Identical readings: the source swap did nothing.
#[test]
fn identical_readings_are_flagged_not_rejected() {
    let input = NoiseMeasurementInput::new(SourceTemperatures::default(), -40.0, -40.0);
    let result = input.evaluate().unwrap();

    assert_approx(result.y_factor, 1.0, 1e-12, "Y");
    assert_eq!(result.system_noise_temperature_kelvin, None);
    assert_eq!(
        result.validity,
        Validity::NonPhysical(NonPhysicalReason::HotNotAboveCold)
    );
    assert_eq!(result.noise_figure_db(), None);
}

/// Sources swapped: the "hot" reading is the lower one.
#[test]
fn swapped_sources_give_y_below_one() {
    let input = NoiseMeasurementInput::new(SourceTemperatures::default(), -43.0, -40.0);
    let result = input.evaluate().unwrap();

    assert!(result.y_factor < 1.0);
    assert_eq!(
        result.validity,
        Validity::NonPhysical(NonPhysicalReason::HotNotAboveCold)
    );
    // the raw formula value is kept for the operator to look at
    assert!(result.system_noise_temperature_kelvin.unwrap() < 0.0);
    assert_eq!(result.noise_figure_db(), None);
}

/// More contrast than the sources can produce means a negative temperature.
#[test]
fn y_beyond_source_ratio_is_negative_temperature() {
    let temperatures = SourceTemperatures::default();
    // 295 / 77 is about 5.83 dB
    let input = NoiseMeasurementInput::new(temperatures, -34.0, -40.0);
    let result = input.evaluate().unwrap();

    assert!(result.y_factor > temperatures.y_factor_limit());
    assert!(result.system_noise_temperature_kelvin.unwrap() < 0.0);
    assert_eq!(
        result.validity,
        Validity::NonPhysical(NonPhysicalReason::NegativeNoiseTemperature)
    );
}

/// Receivers from a cooled LNA up to a bare mixer, measured with the
/// readings they would produce.
#[test]
fn recovers_receiver_temperatures() {
    let temperatures = SourceTemperatures::new(290.0, 77.0).unwrap();
    for receiver in [20.0, 35.0, 100.0, 290.0, 1500.0] {
        let y = (temperatures.hot_kelvin + receiver) / (temperatures.cold_kelvin + receiver);
        let hot_db = -60.0 + 10.0 * y.log10();
        let input = NoiseMeasurementInput::new(temperatures, hot_db, -60.0);
        let result = input.evaluate().unwrap();
        assert!(result.is_physical());
        assert_approx(
            result.system_noise_temperature_kelvin.unwrap(),
            receiver,
            1e-6 * receiver.max(1.0),
            &format!("{receiver}K receiver"),
        );
    }
}

/// T_sys only depends on the reading difference, not the absolute level.
#[test]
fn absolute_level_does_not_matter() {
    let temperatures = SourceTemperatures::default();
    let reference = NoiseMeasurementInput::new(temperatures, -40.0, -43.0)
        .evaluate()
        .unwrap();
    for offset in [-60.0, -10.0, 25.0] {
        let shifted = NoiseMeasurementInput::new(temperatures, -40.0 + offset, -43.0 + offset)
            .evaluate()
            .unwrap();
        assert_approx(
            shifted.system_noise_temperature_kelvin.unwrap(),
            reference.system_noise_temperature_kelvin.unwrap(),
            1e-6,
            &format!("offset {offset} dB"),
        );
    }
}

#[test]
fn closed_form_at_the_edges() {
    assert_eq!(system_noise_temperature(1.0, 295.0, 77.0), None);
    // Y = T_hot / T_cold is a noiseless receiver
    assert_approx(
        system_noise_temperature(295.0 / 77.0, 295.0, 77.0).unwrap(),
        0.0,
        1e-9,
        "noiseless",
    );
}

#[test]
fn bad_source_temperatures_are_rejected() {
    for (hot, cold) in [(77.0, 295.0), (295.0, 295.0), (295.0, 0.0), (295.0, -5.0)] {
        assert!(
            matches!(
                SourceTemperatures::new(hot, cold),
                Err(Error::InvalidConfiguration(_))
            ),
            "T_hot = {hot}, T_cold = {cold} should be rejected"
        );
    }
    assert!(SourceTemperatures::new(f64::NAN, 77.0).is_err());
    assert!(SourceTemperatures::new(f64::INFINITY, 77.0).is_err());
}
