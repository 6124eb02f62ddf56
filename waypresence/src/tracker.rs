//! Presence state machine
use derive_more::Display;
use tracing::{debug, info, trace, warn};
use waypresence_api::{Coordinates, LocationNotification, PresenceStatus, Waypoint};

use crate::geo;
use crate::notify::Notifier;
use crate::state::{PendingQueue, PresenceState};
use crate::store::KeyValueStore;
use crate::Result;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Display)]
pub enum PresenceEventKind {
    #[display(fmt = "enter")]
    Enter,
    #[display(fmt = "leave")]
    Leave,
}

impl PresenceEventKind {
    pub fn status(self) -> PresenceStatus {
        match self {
            PresenceEventKind::Enter => PresenceStatus::Start,
            PresenceEventKind::Leave => PresenceStatus::Stop,
        }
    }
}

/// A presence transition emitted by [`PresenceTracker`]
#[derive(Clone, Debug, PartialEq)]
pub struct PresenceEvent {
    pub kind: PresenceEventKind,
    pub waypoint: Waypoint,
}

impl PresenceEvent {
    pub fn enter(waypoint: Waypoint) -> Self {
        Self {
            kind: PresenceEventKind::Enter,
            waypoint,
        }
    }

    pub fn leave(waypoint: Waypoint) -> Self {
        Self {
            kind: PresenceEventKind::Leave,
            waypoint,
        }
    }

    pub fn notification(&self) -> LocationNotification {
        self.waypoint.notification(self.kind.status())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Presence<'a> {
    Away,
    Present(&'a str),
}

/// Tracks which waypoint the user is at, based on position samples
///
/// Owns the presence state: it is loaded from `store` once on creation and
/// committed back after every transition, before any notification goes out.
pub struct PresenceTracker<S, N> {
    waypoints: Vec<Waypoint>,
    state: PresenceState,
    store: S,
    notifier: N,
}

impl<S, N> PresenceTracker<S, N>
where
    S: KeyValueStore,
    N: Notifier,
{
    pub fn new(waypoints: Vec<Waypoint>, store: S, notifier: N) -> Result<Self> {
        let state = PresenceState::load(&store)?;
        debug!(
            waypoints = waypoints.len(),
            area = state.area().unwrap_or("-"),
            pending = state.queue().len(),
            "Loaded presence state"
        );
        Ok(Self {
            waypoints,
            state,
            store,
            notifier,
        })
    }

    pub fn presence(&self) -> Presence<'_> {
        match self.state.area() {
            Some(name) => Presence::Present(name),
            None => Presence::Away,
        }
    }

    pub fn pending(&self) -> &PendingQueue {
        self.state.queue()
    }

    pub fn into_parts(self) -> (S, N) {
        (self.store, self.notifier)
    }

    /// Process a position sample, returning the transitions it caused
    ///
    /// A `leave` of the previous waypoint always comes before the `enter` of
    /// the new one. Malformed samples are ignored.
    pub fn on_position(&mut self, sample: Coordinates) -> Vec<PresenceEvent> {
        if !sample.is_valid() {
            debug!(%sample, "Ignoring malformed position sample");
            return vec![];
        }

        let nearest = match geo::nearest_with_distance(sample, &self.waypoints) {
            Some((nearest, distance)) => {
                trace!(%sample, nearest = %nearest.name, distance, "Nearest waypoint");
                if self.state.area() == Some(nearest.name.as_str()) {
                    return vec![];
                }
                nearest.clone()
            }
            None => return vec![],
        };

        let mut events = Vec::with_capacity(2);

        if let Some(prev) = self.state.leave() {
            match self.find_waypoint(&prev) {
                Some(waypoint) => events.push(PresenceEvent::leave(waypoint.clone())),
                None => warn!(area = %prev, "Dropping presence at unknown waypoint"),
            }
        }

        self.state.enter(&nearest.name);
        events.push(PresenceEvent::enter(nearest));

        self.commit();
        self.send(&events);
        events
    }

    /// Emit a `leave` for everything still pending and reset to [`Presence::Away`]
    ///
    /// Used on session end. Pending names that no longer match any waypoint
    /// are dropped silently.
    pub fn flush(&mut self) -> Vec<PresenceEvent> {
        if self.state.queue().is_empty() {
            return vec![];
        }

        let events: Vec<_> = self
            .state
            .take_pending()
            .iter()
            .filter_map(|name| self.find_waypoint(name))
            .map(|waypoint| PresenceEvent::leave(waypoint.clone()))
            .collect();

        info!(left = events.len(), "Flushed pending presence");

        self.commit();
        self.send(&events);
        events
    }

    fn find_waypoint(&self, name: &str) -> Option<&Waypoint> {
        self.waypoints.iter().find(|w| w.name == name)
    }

    fn commit(&mut self) {
        if let Err(e) = self.state.commit(&mut self.store) {
            warn!(error = %e, "Could not persist presence state");
        }
    }

    fn send(&self, events: &[PresenceEvent]) {
        for event in events {
            debug!(kind = %event.kind, waypoint = %event.waypoint.name, "Presence event");
            self.notifier.notify(event.notification());
        }
    }
}
