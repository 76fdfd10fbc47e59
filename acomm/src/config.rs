use crate::{error::ChannelError, physics::db_to_linear};
use std::{fmt, str::FromStr};

/// Acoustic link parameters.
///
/// Levels are in dB and converted to linear power ratios on demand.
/// Nothing here is validated: a configuration whose noise floor
/// underflows to zero in linear form, for example, is accepted and
/// surfaces later as a calculation error in the loss computation.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsConfiguration {
    /// Source level (dB re 1 μPa at 1 m).
    pub source_level_db: f64,

    /// Carrier frequency (Hz).
    pub frequency_hz: f64,

    /// Ambient noise floor (dB re 1 μPa).
    pub noise_floor_db: f64,

    /// Minimum channel gain for decoding (dB).
    pub required_gain_db: f64,

    /// Geometric spreading exponent; 1.0 is cylindrical, 2.0 is
    /// spherical.
    pub spreading_exponent: f64,

    /// Additive site-specific propagation anomaly (dB).
    pub site_anomaly_db: f64,

    /// Packet size with no size penalty (bytes).
    pub baseline_packet_size: u32,

    /// Loss multiplier increase per byte above the baseline.
    pub size_penalty_slope: f64,

    /// Upper bound on the size-based loss multiplier.
    pub max_size_penalty: f64,

    /// Range beyond which the link is not considered reliable (meters).
    pub max_reliable_range_m: f64,

    /// Nominal modem bit rate (bits/s).
    pub bit_rate_bps: f64,
}

impl Default for PhysicsConfiguration {
    fn default() -> Self {
        Self {
            source_level_db: 170.0,
            frequency_hz: 12_000.0,
            noise_floor_db: 50.0,
            required_gain_db: 10.0,
            spreading_exponent: 1.5,
            site_anomaly_db: 0.0,
            baseline_packet_size: 50,
            size_penalty_slope: 1.0 / 500.0,
            max_size_penalty: 2.0,
            max_reliable_range_m: 1_000.0,
            bit_rate_bps: 1_200.0,
        }
    }
}

impl PhysicsConfiguration {
    /// Returns the configuration for a catalog preset.
    pub fn preset(preset: Preset) -> Self {
        let base = Self::default();
        match preset {
            Preset::Default => base,
            Preset::ShallowWater => Self {
                source_level_db: 165.0,
                frequency_hz: 25_000.0,
                spreading_exponent: 1.0,
                site_anomaly_db: -5.0,
                ..base
            },
            Preset::DeepWater => Self {
                source_level_db: 175.0,
                frequency_hz: 8_000.0,
                spreading_exponent: 2.0,
                site_anomaly_db: 3.0,
                ..base
            },
            Preset::HighNoise => Self {
                noise_floor_db: 65.0,
                required_gain_db: 15.0,
                source_level_db: 180.0,
                ..base
            },
            Preset::LowPower => Self {
                source_level_db: 160.0,
                required_gain_db: 8.0,
                frequency_hz: 15_000.0,
                ..base
            },
            Preset::Harsh => Self {
                source_level_db: 165.0,
                noise_floor_db: 60.0,
                required_gain_db: 12.0,
                frequency_hz: 10_000.0,
                spreading_exponent: 2.0,
                site_anomaly_db: 5.0,
                ..base
            },
            Preset::RealisticTesting => Self {
                source_level_db: 155.0,
                noise_floor_db: 65.0,
                required_gain_db: 15.0,
                frequency_hz: 15_000.0,
                spreading_exponent: 2.0,
                site_anomaly_db: 10.0,
                ..base
            },
        }
    }

    pub fn frequency_khz(&self) -> f64 {
        self.frequency_hz / 1000.0
    }

    pub fn source_power(&self) -> f64 {
        db_to_linear(self.source_level_db)
    }

    pub fn noise_power(&self) -> f64 {
        db_to_linear(self.noise_floor_db)
    }

    pub fn required_gain(&self) -> f64 {
        db_to_linear(self.required_gain_db)
    }

    /// Loss multiplier for a packet of `packet_size` bytes, in
    /// `[1.0, max_size_penalty]`.
    pub fn size_factor(&self, packet_size: u32) -> f64 {
        let excess = f64::from(packet_size) - f64::from(self.baseline_packet_size);
        (1.0 + excess * self.size_penalty_slope)
            .min(self.max_size_penalty)
            .max(1.0)
    }

    /// Seconds needed to clock `payload_bytes` onto the channel at the
    /// nominal bit rate.
    pub fn airtime(&self, payload_bytes: u32) -> f64 {
        f64::from(payload_bytes) * 8.0 / self.bit_rate_bps
    }

    pub fn summary(&self) -> ConfigurationSummary {
        ConfigurationSummary {
            frequency_hz: self.frequency_hz,
            frequency_khz: self.frequency_khz(),
            source_level_db: self.source_level_db,
            source_power: self.source_power(),
            noise_floor_db: self.noise_floor_db,
            noise_power: self.noise_power(),
            required_gain_db: self.required_gain_db,
            required_gain: self.required_gain(),
            spreading_exponent: self.spreading_exponent,
            site_anomaly_db: self.site_anomaly_db,
            baseline_packet_size: self.baseline_packet_size,
            size_penalty_slope: self.size_penalty_slope,
            max_size_penalty: self.max_size_penalty,
            max_reliable_range_m: self.max_reliable_range_m,
            bit_rate_bps: self.bit_rate_bps,
        }
    }
}

/// Flat view of a [`PhysicsConfiguration`] with derived linear
/// values next to their dB sources.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationSummary {
    pub frequency_hz: f64,
    pub frequency_khz: f64,
    pub source_level_db: f64,
    pub source_power: f64,
    pub noise_floor_db: f64,
    pub noise_power: f64,
    pub required_gain_db: f64,
    pub required_gain: f64,
    pub spreading_exponent: f64,
    pub site_anomaly_db: f64,
    pub baseline_packet_size: u32,
    pub size_penalty_slope: f64,
    pub max_size_penalty: f64,
    pub max_reliable_range_m: f64,
    pub bit_rate_bps: f64,
}

/// Catalog of stock configurations.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    /// Typical small modem.
    #[default]
    Default,
    /// Short range, higher frequency, cylindrical spreading.
    ShallowWater,
    /// Long range, lower frequency, spherical spreading.
    DeepWater,
    /// Heavy shipping noise compensated by a louder source.
    HighNoise,
    LowPower,
    Harsh,
    /// Quiet source in loud water; loses packets at moderate ranges.
    RealisticTesting,
}

impl Preset {
    pub const ALL: [Preset; 7] = [
        Preset::Default,
        Preset::ShallowWater,
        Preset::DeepWater,
        Preset::HighNoise,
        Preset::LowPower,
        Preset::Harsh,
        Preset::RealisticTesting,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::ShallowWater => "shallow_water",
            Self::DeepWater => "deep_water",
            Self::HighNoise => "high_noise",
            Self::LowPower => "low_power",
            Self::Harsh => "harsh",
            Self::RealisticTesting => "realistic_testing",
        }
    }

    pub fn config(self) -> PhysicsConfiguration {
        PhysicsConfiguration::preset(self)
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = ChannelError;

    fn from_str(s: &str) -> Result<Self, ChannelError> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|preset| preset.name() == normalized)
            .ok_or_else(|| ChannelError::UnknownPreset(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::{PhysicsConfiguration, Preset};
    use approx::assert_relative_eq;

    #[test]
    fn test_derived_linear_values() {
        let config = PhysicsConfiguration::default();
        assert_relative_eq!(config.frequency_khz(), 12.0);
        assert_relative_eq!(config.source_power(), 1e17, max_relative = 1e-12);
        assert_relative_eq!(config.noise_power(), 1e5, max_relative = 1e-12);
        assert_relative_eq!(config.required_gain(), 10.0, max_relative = 1e-12);
    }

    #[test]
    fn test_size_factor_clamped() {
        let config = PhysicsConfiguration::default();
        assert_eq!(config.size_factor(0), 1.0);
        assert_eq!(config.size_factor(50), 1.0);
        assert_relative_eq!(config.size_factor(300), 1.5);
        assert_eq!(config.size_factor(550), 2.0);
        assert_eq!(config.size_factor(10_000), 2.0);
    }

    #[test]
    fn test_airtime() {
        let config = PhysicsConfiguration::default();
        assert_relative_eq!(config.airtime(150), 1.0);
        assert_eq!(config.airtime(0), 0.0);
    }

    #[test]
    fn test_presets_round_trip_names() {
        for preset in Preset::ALL {
            assert_eq!(preset.name().parse::<Preset>().unwrap(), preset);
        }
        assert_eq!("Shallow-Water".parse::<Preset>().unwrap(), Preset::ShallowWater);
        assert!("arctic".parse::<Preset>().is_err());
    }

    #[test]
    fn test_presets_differ_from_default() {
        let default = PhysicsConfiguration::default();
        assert_eq!(Preset::Default.config(), default);
        for preset in &Preset::ALL[1..] {
            assert_ne!(preset.config(), default, "{preset}");
        }
        let harsh = Preset::Harsh.config();
        assert_eq!(harsh.spreading_exponent, 2.0);
        assert_eq!(harsh.baseline_packet_size, default.baseline_packet_size);
    }

    #[test]
    fn test_summary_pairs_db_with_linear() {
        let summary = Preset::HighNoise.config().summary();
        assert_eq!(summary.noise_floor_db, 65.0);
        assert_relative_eq!(summary.noise_power, 10f64.powf(6.5), max_relative = 1e-12);
        assert_relative_eq!(summary.required_gain, 10f64.powf(1.5), max_relative = 1e-12);
    }
}
