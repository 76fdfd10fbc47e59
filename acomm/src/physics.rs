//! Closed-form underwater acoustic propagation.
//!
//! All levels are in the power domain: a ratio of `x` dB is
//! `10^(x/10)` linear. Spreading loss therefore uses `10·n·log10(r)`
//! rather than the pressure-referenced `20·log10(r)`.
//!
//! These functions do not validate their inputs. Distances must be
//! strictly positive.
//!
//! # References
//!
//! 1. Thorp, W. H. (1967). Analytic description of the low-frequency
//!    attenuation coefficient. JASA 42(1).
//! 1. Stojanovic, M. (2007). On the relationship between capacity and
//!    distance in an underwater acoustic communication channel.

use num_traits::{AsPrimitive, Float};

/// Converts a power level in dB to a linear ratio.
pub fn db_to_linear<T>(db: T) -> T
where
    T: Float + 'static,
    f64: AsPrimitive<T>,
{
    let ten: T = 10.0_f64.as_();
    ten.powf(db / ten)
}

/// Converts a linear power ratio to dB.
pub fn linear_to_db<T>(ratio: T) -> T
where
    T: Float + 'static,
    f64: AsPrimitive<T>,
{
    let ten: T = 10.0_f64.as_();
    ten * ratio.log10()
}

/// Returns Thorp's absorption coefficient in dB per meter.
///
/// ```text
/// α(f) = 0.11·f²/(1+f²) + 44·f²/(4100+f²) + 2.75e-4·f² + 0.003   [dB/km]
/// ```
///
/// where `f` is in kHz.
pub fn absorption_coefficient<T>(frequency_khz: T) -> T
where
    T: Float + 'static,
    f64: AsPrimitive<T>,
{
    let [a, b, c, d, e, per_km]: [T; 6] =
        [0.11, 44.0, 4100.0, 2.75e-4, 0.003, 1000.0].map(AsPrimitive::as_);
    let f2 = frequency_khz * frequency_khz;
    let db_per_km = a * f2 / (T::one() + f2) + b * f2 / (c + f2) + d * f2 + e;
    db_per_km / per_km
}

/// Geometric spreading loss in dB.
///
/// `spreading_exp` is 1.0 for cylindrical and 2.0 for spherical
/// spreading.
pub fn spreading_loss<T>(distance_m: T, spreading_exp: T) -> T
where
    T: Float + 'static,
    f64: AsPrimitive<T>,
{
    let ten: T = 10.0_f64.as_();
    ten * spreading_exp * distance_m.log10()
}

/// Total transmission loss in dB: spreading, absorption, and a
/// constant site anomaly.
pub fn transmission_loss<T>(distance_m: T, frequency_khz: T, spreading_exp: T, anomaly_db: T) -> T
where
    T: Float + 'static,
    f64: AsPrimitive<T>,
{
    spreading_loss(distance_m, spreading_exp)
        + absorption_coefficient(frequency_khz) * distance_m
        + anomaly_db
}

/// Converts a loss in dB to the fraction of power that survives it.
pub fn linear_attenuation<T>(loss_db: T) -> T
where
    T: Float + 'static,
    f64: AsPrimitive<T>,
{
    db_to_linear(-loss_db)
}

/// Mean (fading-free) linear SNR at `distance_m`.
pub fn mean_channel_gain<T>(
    distance_m: T,
    source_power: T,
    noise_power: T,
    frequency_khz: T,
    spreading_exp: T,
    anomaly_db: T,
) -> T
where
    T: Float + 'static,
    f64: AsPrimitive<T>,
{
    let loss_db = transmission_loss(distance_m, frequency_khz, spreading_exp, anomaly_db);
    (source_power / noise_power) * linear_attenuation(loss_db)
}

/// Probability that an exponentially distributed gain with mean
/// `mean_gain` falls below `required_gain`.
///
/// Evaluated with `exp_m1` so strong links keep their small loss
/// probability instead of rounding to zero.
pub fn outage_probability<T: Float>(required_gain: T, mean_gain: T) -> T {
    -(-(required_gain / mean_gain)).exp_m1()
}

/// Packet loss probability over a Rayleigh fading channel.
///
/// ```text
/// P_loss = 1 − exp(−γ_req / γ̄(d))
/// ```
#[allow(clippy::too_many_arguments)]
pub fn rayleigh_loss_probability<T>(
    distance_m: T,
    source_power: T,
    noise_power: T,
    frequency_khz: T,
    required_gain: T,
    spreading_exp: T,
    anomaly_db: T,
) -> T
where
    T: Float + 'static,
    f64: AsPrimitive<T>,
{
    let mean_gain = mean_channel_gain(
        distance_m,
        source_power,
        noise_power,
        frequency_khz,
        spreading_exp,
        anomaly_db,
    );
    outage_probability(required_gain, mean_gain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_absorption_positive_and_monotonic() {
        let mut prev = 0.0;
        for step in 0..=1000 {
            let f_khz = f64::from(step) / 10.0;
            let alpha = absorption_coefficient(f_khz);
            assert!(alpha > 0.0);
            assert!(alpha >= prev, "α({f_khz}) decreased");
            prev = alpha;
        }
    }

    #[test]
    fn test_absorption_at_12khz() {
        assert_relative_eq!(
            absorption_coefficient(12.0_f64),
            0.001_644_772_576_294_322_2,
            max_relative = 1e-12
        );
        assert_relative_eq!(absorption_coefficient(0.0_f64), 3e-6);
    }

    #[test]
    fn test_absorption_f32() {
        let alpha: f32 = absorption_coefficient(12.0_f32);
        assert_relative_eq!(alpha, 0.001_644_772_6, max_relative = 1e-5);
    }

    #[test]
    fn test_transmission_loss_increases_with_range() {
        let mut prev = f64::NEG_INFINITY;
        for d in [1.0, 2.0, 10.0, 100.0, 500.0, 1e3, 1e4, 1e5] {
            let tl = transmission_loss(d, 12.0, 1.5, 0.0);
            assert!(tl > prev);
            prev = tl;
        }
    }

    #[test]
    fn test_transmission_loss_terms() {
        // 1 m has no spreading loss, only absorption and anomaly.
        assert_relative_eq!(
            transmission_loss(1.0, 12.0, 2.0, 3.0),
            absorption_coefficient(12.0) + 3.0
        );
        assert_relative_eq!(
            transmission_loss(500.0, 12.0, 1.5, 0.0),
            41.306_936_353_187_44,
            max_relative = 1e-12
        );
        // Cylindrical vs spherical over a decade of range.
        assert_relative_eq!(spreading_loss(10.0, 1.0), 10.0);
        assert_relative_eq!(spreading_loss(10.0, 2.0), 20.0);
    }

    #[test]
    fn test_linear_attenuation() {
        assert_eq!(linear_attenuation(0.0), 1.0);
        assert_relative_eq!(linear_attenuation(10.0), 0.1);
        assert_relative_eq!(linear_attenuation(30.0), 0.001);
        let mut prev = 1.0;
        for x in 1..200 {
            let att = linear_attenuation(f64::from(x));
            assert!(att > 0.0 && att < prev);
            prev = att;
        }
    }

    #[test]
    fn test_db_conversions() {
        assert_relative_eq!(db_to_linear(170.0), 1e17, max_relative = 1e-12);
        assert_relative_eq!(linear_to_db(1e5), 50.0);
        assert_relative_eq!(linear_to_db(db_to_linear(-7.5)), -7.5, epsilon = 1e-12);
    }

    #[test]
    fn test_mean_channel_gain_at_500m() {
        let gain = mean_channel_gain(500.0, 1e17, 1e5, 12.0, 1.5, 0.0);
        assert_relative_eq!(gain, 74_012_719.942_981_17, max_relative = 1e-9);
    }

    #[test]
    fn test_rayleigh_probability_bounds() {
        for d in [1.0, 10.0, 1e3, 1e4, 2e4] {
            let p = rayleigh_loss_probability(d, 1e17, 1e5, 12.0, 10.0, 1.5, 0.0);
            assert!((0.0..1.0).contains(&p), "p({d}) = {p}");
        }
        // Far enough out the result saturates at 1.0 in f64.
        for d in [5e4, 1e5] {
            let p = rayleigh_loss_probability(d, 1e17, 1e5, 12.0, 10.0, 1.5, 0.0);
            assert!((0.0..=1.0).contains(&p), "p({d}) = {p}");
        }
    }

    #[test]
    fn test_outage_limits() {
        assert_relative_eq!(outage_probability(1e-12, 1.0), 0.0, epsilon = 1e-11);
        assert_relative_eq!(outage_probability(1e3, 1.0), 1.0);
        // γ_req == γ̄ gives 1 - 1/e.
        assert_relative_eq!(
            outage_probability(4.0, 4.0),
            1.0 - (-1.0_f64).exp(),
            max_relative = 1e-12
        );
        // Tiny ratios keep their precision.
        assert_relative_eq!(outage_probability(1e-20, 1.0), 1e-20, max_relative = 1e-12);
        assert!(outage_probability(1e-20_f32, 1.0) > 0.0);
    }

    #[test]
    fn test_rayleigh_at_500m() {
        let p = rayleigh_loss_probability(500.0, 1e17, 1e5, 12.0, 10.0, 1.5, 0.0);
        assert_relative_eq!(p, 1.351_119_014_447_732_5e-7, max_relative = 1e-6);
    }
}
