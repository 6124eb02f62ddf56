//! Markers for peers seen on the real-time channel
use std::collections::BTreeMap;

use tracing::debug;
use waypresence_api::{Coordinates, PeerId, PeerLocation};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MarkerUpdate {
    Created,
    Moved,
}

/// Outcome of a peer disconnect
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Disconnected {
    /// The peer had a marker, which is now gone
    pub marker_removed: bool,
    /// The peer is the locally tracked user; pending presence must be flushed
    pub is_tracked: bool,
}

/// Last known position of every connected peer
#[derive(Debug, Default)]
pub struct PeerMirror {
    tracked: Option<PeerId>,
    markers: BTreeMap<PeerId, Coordinates>,
    /// Where the view was last centred (on the latest peer update)
    center: Option<Coordinates>,
}

impl PeerMirror {
    pub fn new(tracked: Option<PeerId>) -> Self {
        Self {
            tracked,
            ..Self::default()
        }
    }

    pub fn update(&mut self, peer: &PeerLocation) -> MarkerUpdate {
        let coordinates = peer.coordinates();
        self.center = Some(coordinates);
        match self.markers.insert(peer.id.clone(), coordinates) {
            Some(_) => MarkerUpdate::Moved,
            None => {
                debug!(peer = %peer.id, %coordinates, "New peer marker");
                MarkerUpdate::Created
            }
        }
    }

    pub fn disconnect(&mut self, id: &PeerId) -> Disconnected {
        let marker_removed = self.markers.remove(id).is_some();
        let is_tracked = self.tracked.as_ref() == Some(id);
        debug!(peer = %id, marker_removed, is_tracked, "Peer disconnected");
        Disconnected {
            marker_removed,
            is_tracked,
        }
    }

    pub fn marker(&self, id: &PeerId) -> Option<Coordinates> {
        self.markers.get(id).copied()
    }

    pub fn markers(&self) -> impl Iterator<Item = (&PeerId, &Coordinates)> {
        self.markers.iter()
    }

    pub fn center(&self) -> Option<Coordinates> {
        self.center
    }
}
