//! # Underwater Acoustic Links
//!
//! `acomm` models delivery of a single acoustic packet between two
//! underwater nodes: propagation delay, multipath, and a Rayleigh
//! fading outage decision.

pub mod config;
pub mod environment;
mod error;
pub mod model;
pub mod physics;
pub mod transmission;

pub use crate::{
    config::{ConfigurationSummary, PhysicsConfiguration, Preset},
    environment::Environment,
    error::{ArithmeticFault, ChannelError},
    model::{ChannelQuality, CommunicationModel, LinkAssessment, LossReason},
    transmission::{PacketTransmission, Position, TransmissionRequest},
};
