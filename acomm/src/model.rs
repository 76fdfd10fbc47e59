//! Stateful acoustic channel between two underwater nodes.
//!
//! [`CommunicationModel`] owns a configuration, an environment, a
//! transmission counter and a random source. Every mutating call takes
//! `&mut self`; callers that drive several links concurrently give each
//! one its own model.
//!
//! There are two independent loss estimators here:
//!
//! - [`CommunicationModel::loss_probability`] is the Rayleigh fading
//!   outage model and the only thing that decides delivery.
//! - [`CommunicationModel::advisory_propagation_loss`] is a simpler
//!   Thorp-like estimate reported by
//!   [`CommunicationModel::communication_quality`] for display.
//!
//! Their numbers do not agree and are not meant to.

use crate::{
    config::PhysicsConfiguration,
    environment::Environment,
    error::ArithmeticFault,
    physics::{
        absorption_coefficient, linear_attenuation, linear_to_db, outage_probability,
        spreading_loss,
    },
    transmission::{PacketTransmission, TransmissionRequest},
};
use log::{debug, trace, warn};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::fmt;

/// Loss probability for separations below this range (meters).
const NEAR_FIELD_M: f64 = 1.0;
const NEAR_FIELD_LOSS: f64 = 0.01;

/// Loss probability reported when the computation fails.
const FALLBACK_LOSS: f64 = 0.95;

/// Probabilities are capped here so loss is never certain.
const MAX_LOSS: f64 = 0.99;

/// Mean gain thresholds at 0, 5, 10 and 15 dB.
const VERY_LOW_SNR: f64 = 1.0;
const LOW_SNR: f64 = 3.16;
const MODERATE_SNR: f64 = 10.0;
const ACCEPTABLE_SNR: f64 = 31.6;

/// Assumed water column depth for the bottom bounce (meters).
const BOTTOM_DEPTH_M: f64 = 100.0;

/// Interference factor range for combined direct and reflected rays.
const INTERFERENCE_MIN: f64 = 0.9;
const INTERFERENCE_MAX: f64 = 1.0;

/// Sea state that adds the full 20% to the advisory loss.
const ADVISORY_SEA_STATE_SCALE: f64 = 6.0;

/// Channel classification, and the tag recorded on lost packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossReason {
    ZeroDistance,
    CloseRange,
    VeryLowSnr,
    LowSnr,
    ModerateSnr,
    AcceptableSnr,
    GoodSnr,
    CalculationError(ArithmeticFault),
}

impl LossReason {
    /// Classifies a linear mean channel gain.
    pub fn from_mean_gain(mean_gain: f64) -> Self {
        if mean_gain < VERY_LOW_SNR {
            Self::VeryLowSnr
        } else if mean_gain < LOW_SNR {
            Self::LowSnr
        } else if mean_gain < MODERATE_SNR {
            Self::ModerateSnr
        } else if mean_gain < ACCEPTABLE_SNR {
            Self::AcceptableSnr
        } else {
            Self::GoodSnr
        }
    }

}

impl fmt::Display for LossReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::ZeroDistance => "zero_distance",
            Self::CloseRange => "close_range",
            Self::VeryLowSnr => "very_low_snr",
            Self::LowSnr => "low_snr",
            Self::ModerateSnr => "moderate_snr",
            Self::AcceptableSnr => "acceptable_snr",
            Self::GoodSnr => "good_snr",
            Self::CalculationError(fault) => return write!(f, "calculation_error_{fault}"),
        };
        f.write_str(tag)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for LossReason {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Loss probability of a link and its classification.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkAssessment {
    pub probability: f64,
    pub reason: LossReason,
}

impl LinkAssessment {
    fn new(probability: f64, reason: LossReason) -> Self {
        Self {
            probability,
            reason,
        }
    }
}

/// Advisory channel health snapshot.
///
/// `propagation_loss_db` and `snr_db` come from the simplified
/// estimator and must not be compared against `loss_probability`.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelQuality {
    pub distance_m: f64,
    pub propagation_loss_db: f64,
    pub snr_db: f64,
    /// Fading-free SNR of the Rayleigh model in dB; `None` inside the
    /// near field or when the computation fails.
    pub mean_snr_db: Option<f64>,
    pub loss_probability: f64,
    pub reason: LossReason,
    pub max_reliable_range_m: f64,
    pub within_reliable_range: bool,
    pub sound_velocity_mps: f64,
    /// Airtime of a baseline-size packet (seconds).
    pub baseline_airtime_s: f64,
}

/// Scalars derived from the configuration, refreshed on replacement.
#[derive(Debug, Clone, Copy)]
struct ChannelCache {
    frequency_khz: f64,
    absorption_db_per_m: f64,
    anomaly_factor: f64,
    source_power: f64,
    noise_power: f64,
    required_gain: f64,
}

impl ChannelCache {
    fn new(config: &PhysicsConfiguration) -> Self {
        let frequency_khz = config.frequency_khz();
        Self {
            frequency_khz,
            absorption_db_per_m: absorption_coefficient(frequency_khz),
            anomaly_factor: linear_attenuation(config.site_anomaly_db),
            source_power: config.source_power(),
            noise_power: config.noise_power(),
            required_gain: config.required_gain(),
        }
    }
}

pub struct CommunicationModel<R = StdRng> {
    config: PhysicsConfiguration,
    environment: Environment,
    cache: ChannelCache,
    transmissions: u64,
    rng: R,
}

impl CommunicationModel<StdRng> {
    /// Returns a model drawing from an entropy-seeded generator.
    pub fn new(config: PhysicsConfiguration) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Returns a reproducible model.
    pub fn seeded(config: PhysicsConfiguration, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl Default for CommunicationModel<StdRng> {
    fn default() -> Self {
        Self::new(PhysicsConfiguration::default())
    }
}

impl<R: Rng> CommunicationModel<R> {
    pub fn with_rng(config: PhysicsConfiguration, rng: R) -> Self {
        let cache = ChannelCache::new(&config);
        Self {
            config,
            environment: Environment::default(),
            cache,
            transmissions: 0,
            rng,
        }
    }

    /// Replaces the default environment.
    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn configuration(&self) -> &PhysicsConfiguration {
        &self.config
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Number of transmissions simulated so far.
    pub fn transmissions_sent(&self) -> u64 {
        self.transmissions
    }

    /// Swaps the configuration and its derived caches in one step.
    pub fn replace_configuration(&mut self, config: PhysicsConfiguration) {
        debug!(
            "replacing configuration: {} Hz, SL {} dB, NL {} dB",
            config.frequency_hz, config.source_level_db, config.noise_floor_db
        );
        self.cache = ChannelCache::new(&config);
        self.config = config;
    }

    pub fn update_environment(&mut self, sea_state: Option<i32>, temperature_c: Option<f64>) {
        if let Some(sea_state) = sea_state {
            self.environment.set_sea_state(sea_state);
        }
        if let Some(temperature_c) = temperature_c {
            self.environment.set_temperature(temperature_c);
        }
    }

    /// Direct path travel time in seconds.
    ///
    /// Sound velocity is evaluated at the mean of the two depths, using
    /// the surface temperature extrapolated down to that depth.
    pub fn propagation_delay(&self, distance_m: f64, sender_depth: f64, receiver_depth: f64) -> f64 {
        let avg_depth = (sender_depth + receiver_depth) / 2.0;
        let temperature = self.environment.temperature_at_depth(avg_depth);
        distance_m / self.environment.sound_velocity(avg_depth, temperature)
    }

    /// Excess delay of the earliest reflected arrival in seconds.
    ///
    /// Considers one surface bounce and one bottom bounce off a flat
    /// bottom at 100 m.
    pub fn multipath_delay(&self, distance_m: f64, depth_difference_m: f64) -> f64 {
        let velocity = self.environment.current_sound_velocity();
        let surface_path = distance_m.hypot(2.0 * depth_difference_m);
        let bottom_path = distance_m.hypot(2.0 * (BOTTOM_DEPTH_M - depth_difference_m));
        let surface_delay = (surface_path - distance_m) / velocity;
        let bottom_delay = (bottom_path - distance_m) / velocity;
        surface_delay.min(bottom_delay)
    }

    /// Returns `(delay_s, interference_factor)`.
    ///
    /// The interference factor is drawn uniformly from `[0.9, 1.0)`.
    pub fn multipath_effect(&mut self, distance_m: f64, depth_difference_m: f64) -> (f64, f64) {
        let delay = self.multipath_delay(distance_m, depth_difference_m);
        let interference = self.rng.gen_range(INTERFERENCE_MIN..INTERFERENCE_MAX);
        (delay, interference)
    }

    /// Probability that a packet of `packet_size` bytes is lost over
    /// `distance_m`, and why.
    ///
    /// Depths are accepted for interface symmetry with
    /// [`Self::propagation_delay`] but do not enter the loss formula.
    /// Numeric failures never escape; they yield a 0.95 loss
    /// probability tagged `calculation_error_<kind>`.
    pub fn loss_probability(
        &self,
        distance_m: f64,
        _sender_depth: f64,
        _receiver_depth: f64,
        packet_size: u32,
    ) -> LinkAssessment {
        if distance_m <= 0.0 {
            return LinkAssessment::new(0.0, LossReason::ZeroDistance);
        }
        if distance_m < NEAR_FIELD_M {
            return LinkAssessment::new(NEAR_FIELD_LOSS, LossReason::CloseRange);
        }
        match self.rayleigh_assessment(distance_m, packet_size) {
            Ok(assessment) => assessment,
            Err(fault) => {
                warn!("loss computation failed at {distance_m} m: {fault}");
                LinkAssessment::new(FALLBACK_LOSS, LossReason::CalculationError(fault))
            }
        }
    }

    /// Linear mean channel gain from the cached configuration.
    fn mean_gain(&self, distance_m: f64) -> Result<f64, ArithmeticFault> {
        let ChannelCache {
            absorption_db_per_m,
            anomaly_factor,
            source_power,
            noise_power,
            ..
        } = self.cache;
        let source_power = ArithmeticFault::check(source_power)?;
        let noise_power = ArithmeticFault::check_divisor(noise_power)?;
        let loss_db = ArithmeticFault::check(
            spreading_loss(distance_m, self.config.spreading_exponent)
                + absorption_db_per_m * distance_m,
        )?;
        ArithmeticFault::check_divisor(
            (source_power / noise_power) * linear_attenuation(loss_db) * anomaly_factor,
        )
    }

    fn rayleigh_assessment(
        &self,
        distance_m: f64,
        packet_size: u32,
    ) -> Result<LinkAssessment, ArithmeticFault> {
        let mean_gain = self.mean_gain(distance_m)?;
        let raw = ArithmeticFault::check(outage_probability(self.cache.required_gain, mean_gain))?;
        let probability = (raw * self.config.size_factor(packet_size)).min(MAX_LOSS);
        Ok(LinkAssessment::new(
            probability,
            LossReason::from_mean_gain(mean_gain),
        ))
    }

    /// Simplified Thorp-like loss estimate in dB, for display only.
    ///
    /// Pressure-referenced spherical spreading beyond 1 m plus a
    /// low-frequency absorption approximation, scaled up slightly with
    /// depth and sea state. Never used for delivery decisions.
    pub fn advisory_propagation_loss(&self, distance_m: f64, depth_m: f64) -> f64 {
        if distance_m <= 0.0 {
            return 0.0;
        }
        let f = self.cache.frequency_khz;
        let alpha_db_per_km = 0.002 + 0.11 * f.powi(2) / (1.0 + f.powi(2)) + 0.011 * f.powi(2);
        let geometric = if distance_m > 1.0 {
            20.0 * distance_m.log10()
        } else {
            0.0
        };
        let absorption = alpha_db_per_km * distance_m / 1000.0;
        let depth_factor = 1.0 + depth_m / 1000.0 * 0.1;
        let sea_state_factor =
            1.0 + f64::from(self.environment.sea_state()) / ADVISORY_SEA_STATE_SCALE * 0.2;
        (geometric + absorption) * depth_factor * sea_state_factor
    }

    /// Read-only channel health snapshot for dashboards.
    pub fn communication_quality(&self, distance_m: f64, depth_m: f64) -> ChannelQuality {
        let propagation_loss_db = self.advisory_propagation_loss(distance_m, depth_m);
        let snr_db = self.config.source_level_db - propagation_loss_db - self.config.noise_floor_db;
        let LinkAssessment {
            probability,
            reason,
        } = self.loss_probability(distance_m, depth_m, depth_m, self.config.baseline_packet_size);
        let mean_snr_db = if distance_m < NEAR_FIELD_M {
            None
        } else {
            self.mean_gain(distance_m).ok().map(linear_to_db)
        };
        ChannelQuality {
            distance_m,
            propagation_loss_db,
            snr_db,
            mean_snr_db,
            loss_probability: probability,
            reason,
            max_reliable_range_m: self.config.max_reliable_range_m,
            within_reliable_range: distance_m <= self.config.max_reliable_range_m,
            sound_velocity_mps: self
                .environment
                .sound_velocity(depth_m, self.environment.temperature_c()),
            baseline_airtime_s: self.config.airtime(self.config.baseline_packet_size),
        }
    }

    /// Simulates one packet crossing the channel.
    ///
    /// Draws the interference factor, then a single uniform value that
    /// delivers the packet when it falls below `1 − P_loss`.
    pub fn simulate_transmission(&mut self, request: &TransmissionRequest) -> PacketTransmission {
        self.transmissions += 1;
        let id = format!(
            "{}_{}_{}",
            request.sender, request.packet_type, self.transmissions
        );

        let distance = request.distance();
        let sender_depth = request.sender_position.depth;
        let receiver_depth = request.receiver_position.depth;

        let propagation_delay = self.propagation_delay(distance, sender_depth, receiver_depth);
        let (multipath_delay, interference) =
            self.multipath_effect(distance, (sender_depth - receiver_depth).abs());
        let assessment =
            self.loss_probability(distance, sender_depth, receiver_depth, request.payload_size);

        let draw: f64 = self.rng.gen();
        let delivered = draw < 1.0 - assessment.probability;

        trace!(
            "{id}: {distance:.1} m, p_loss {:.4} ({}), {}",
            assessment.probability,
            assessment.reason,
            if delivered { "delivered" } else { "lost" }
        );

        PacketTransmission::new(
            id,
            request,
            distance,
            (propagation_delay, multipath_delay),
            interference,
            assessment,
            delivered,
        )
    }
}
