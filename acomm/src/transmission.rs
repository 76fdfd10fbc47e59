use crate::{
    error::ChannelError,
    model::{LinkAssessment, LossReason},
};
use std::{
    str::FromStr,
    time::{SystemTime, UNIX_EPOCH},
};

/// Node position in meters; `depth` grows downward from the surface.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub depth: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, depth: f64) -> Self {
        Self { x, y, depth }
    }

    /// Straight-line distance to `other` in meters.
    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.depth - other.depth;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl FromStr for Position {
    type Err = ChannelError;

    /// Parses `"x,y,depth"`.
    fn from_str(s: &str) -> Result<Self, ChannelError> {
        let err = || ChannelError::Position(s.to_owned());
        let mut parts = s.split(',').map(|part| part.trim().parse::<f64>());
        let mut next = || -> Result<f64, ChannelError> {
            parts.next().ok_or_else(err)?.map_err(|_| err())
        };
        let pos = Position::new(next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(err());
        }
        Ok(pos)
    }
}

/// One packet handed to the channel.
#[derive(Debug, Clone, PartialEq)]
pub struct TransmissionRequest {
    pub sender: String,
    pub receiver: String,
    pub packet_type: String,
    pub payload_size: u32,
    pub sender_position: Position,
    pub receiver_position: Position,
    /// Send time, seconds since the Unix epoch.
    pub sent_at: f64,
}

impl TransmissionRequest {
    pub fn builder() -> TransmissionRequestBuilder {
        TransmissionRequestBuilder::default()
    }

    /// Distance between the two nodes in meters.
    pub fn distance(&self) -> f64 {
        self.sender_position.distance_to(&self.receiver_position)
    }
}

#[derive(Debug, Default)]
pub struct TransmissionRequestBuilder {
    /// Sending node id (required).
    sender: Option<String>,

    /// Receiving node id (required).
    receiver: Option<String>,

    /// Packet type tag (required).
    packet_type: Option<String>,

    /// Payload size in bytes (required).
    payload_size: Option<u32>,

    /// Sender position (required).
    from: Option<Position>,

    /// Receiver position (required).
    to: Option<Position>,

    /// Send time (defaults to now).
    sent_at: Option<f64>,
}

impl TransmissionRequestBuilder {
    /// Sending node id (required).
    #[must_use]
    pub fn sender(mut self, id: impl Into<String>) -> Self {
        self.sender = Some(id.into());
        self
    }

    /// Receiving node id (required).
    #[must_use]
    pub fn receiver(mut self, id: impl Into<String>) -> Self {
        self.receiver = Some(id.into());
        self
    }

    /// Packet type tag, e.g. "command" or "status" (required).
    #[must_use]
    pub fn packet_type(mut self, tag: impl Into<String>) -> Self {
        self.packet_type = Some(tag.into());
        self
    }

    /// Payload size in bytes (required).
    #[must_use]
    pub fn payload_size(mut self, bytes: u32) -> Self {
        self.payload_size = Some(bytes);
        self
    }

    /// Sender position (required).
    #[must_use]
    pub fn from(mut self, pos: Position) -> Self {
        self.from = Some(pos);
        self
    }

    /// Receiver position (required).
    #[must_use]
    pub fn to(mut self, pos: Position) -> Self {
        self.to = Some(pos);
        self
    }

    /// Send time in seconds since the Unix epoch (defaults to the
    /// wall clock at `build`).
    #[must_use]
    pub fn sent_at(mut self, seconds: f64) -> Self {
        self.sent_at = Some(seconds);
        self
    }

    pub fn build(self) -> Result<TransmissionRequest, ChannelError> {
        let sender = self.sender.ok_or(ChannelError::Builder("sender"))?;
        let receiver = self.receiver.ok_or(ChannelError::Builder("receiver"))?;
        let packet_type = self.packet_type.ok_or(ChannelError::Builder("packet_type"))?;
        let payload_size = self.payload_size.ok_or(ChannelError::Builder("payload_size"))?;
        let sender_position = self.from.ok_or(ChannelError::Builder("from"))?;
        let receiver_position = self.to.ok_or(ChannelError::Builder("to"))?;
        let sent_at = self.sent_at.unwrap_or_else(unix_now);

        Ok(TransmissionRequest {
            sender,
            receiver,
            packet_type,
            payload_size,
            sender_position,
            receiver_position,
            sent_at,
        })
    }
}

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0.0, |elapsed| elapsed.as_secs_f64())
}

/// Outcome of one simulated transmission.
///
/// Built once by [`CommunicationModel::simulate_transmission`] and
/// never modified.
///
/// [`CommunicationModel::simulate_transmission`]: crate::CommunicationModel::simulate_transmission
#[derive(Debug, Clone, PartialEq)]
pub struct PacketTransmission {
    id: String,
    sender: String,
    receiver: String,
    packet_type: String,
    payload_size: u32,
    sent_at: f64,
    arrival_at: Option<f64>,
    distance_m: f64,
    propagation_delay: f64,
    multipath_delay: f64,
    is_lost: bool,
    signal_strength: f64,
    assessment: LinkAssessment,
}

impl PacketTransmission {
    pub(crate) fn new(
        id: String,
        request: &TransmissionRequest,
        distance_m: f64,
        (propagation_delay, multipath_delay): (f64, f64),
        signal_strength: f64,
        assessment: LinkAssessment,
        delivered: bool,
    ) -> Self {
        let total_delay = propagation_delay + multipath_delay;
        let arrival_at = delivered.then(|| request.sent_at + total_delay);
        Self {
            id,
            sender: request.sender.clone(),
            receiver: request.receiver.clone(),
            packet_type: request.packet_type.clone(),
            payload_size: request.payload_size,
            sent_at: request.sent_at,
            arrival_at,
            distance_m,
            propagation_delay,
            multipath_delay,
            is_lost: !delivered,
            signal_strength,
            assessment,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn receiver(&self) -> &str {
        &self.receiver
    }

    pub fn packet_type(&self) -> &str {
        &self.packet_type
    }

    /// Payload size in bytes.
    pub fn payload_size(&self) -> u32 {
        self.payload_size
    }

    /// Send time, seconds since the Unix epoch.
    pub fn sent_at(&self) -> f64 {
        self.sent_at
    }

    /// Arrival time; `None` when the packet was lost.
    pub fn arrival_at(&self) -> Option<f64> {
        self.arrival_at
    }

    /// Sender to receiver distance in meters.
    pub fn distance_m(&self) -> f64 {
        self.distance_m
    }

    /// Direct path delay (seconds).
    pub fn propagation_delay(&self) -> f64 {
        self.propagation_delay
    }

    /// Extra delay of the earliest reflected path (seconds).
    pub fn multipath_delay(&self) -> f64 {
        self.multipath_delay
    }

    pub fn total_delay(&self) -> f64 {
        self.propagation_delay + self.multipath_delay
    }

    pub fn is_lost(&self) -> bool {
        self.is_lost
    }

    pub fn is_received(&self) -> bool {
        self.arrival_at.is_some() && !self.is_lost
    }

    /// Multipath interference factor in `(0, 1]`.
    pub fn signal_strength(&self) -> f64 {
        self.signal_strength
    }

    /// Why the packet was lost; `None` when it was delivered.
    pub fn loss_reason(&self) -> Option<LossReason> {
        self.is_lost.then_some(self.assessment.reason)
    }

    /// Loss probability and channel classification the delivery draw
    /// was made against.
    pub fn assessment(&self) -> LinkAssessment {
        self.assessment
    }
}

/// Serializes the stored fields plus the derived `total_delay` and
/// `loss_reason` (null when delivered).
#[cfg(feature = "serde")]
impl serde::Serialize for PacketTransmission {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("PacketTransmission", 15)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("sender", &self.sender)?;
        state.serialize_field("receiver", &self.receiver)?;
        state.serialize_field("packet_type", &self.packet_type)?;
        state.serialize_field("payload_size", &self.payload_size)?;
        state.serialize_field("sent_at", &self.sent_at)?;
        state.serialize_field("arrival_at", &self.arrival_at)?;
        state.serialize_field("distance_m", &self.distance_m)?;
        state.serialize_field("propagation_delay", &self.propagation_delay)?;
        state.serialize_field("multipath_delay", &self.multipath_delay)?;
        state.serialize_field("total_delay", &self.total_delay())?;
        state.serialize_field("is_lost", &self.is_lost)?;
        state.serialize_field("signal_strength", &self.signal_strength)?;
        state.serialize_field("loss_reason", &self.loss_reason())?;
        state.serialize_field("assessment", &self.assessment)?;
        state.end()
    }
}
