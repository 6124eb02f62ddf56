//! Messages exchanged over the real-time channel
//!
//! Every message is a JSON object tagged with its `event` name, with the
//! payload under `data`, one message per line.
use serde::{Deserialize, Serialize};

use crate::{Coordinates, PeerId};

/// Position of another peer, as relayed by the channel
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeerLocation {
    pub id: PeerId,
    pub latitude: f64,
    pub longitude: f64,
}

impl PeerLocation {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// Everything the tracker consumes: local position samples and channel events
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum InboundMessage {
    /// A sample from the local location service
    Position(Coordinates),
    /// The location service reported an error instead of a sample
    PositionError(String),
    ReceiveLocation(PeerLocation),
    UserDisconnected(PeerId),
}

/// Messages the tracker publishes to the channel
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum OutboundMessage {
    SendLocation(Coordinates),
}
