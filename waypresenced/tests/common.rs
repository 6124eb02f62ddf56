#![allow(unused)]

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use waypresence::notify::RecordingNotifier;
use waypresence::store::FileStore;
use waypresence::{Coordinates, PeerId, Waypoint};
use waypresence_api::{InboundMessage, OutboundMessage, PeerLocation, PresenceStatus};
use waypresenced::{Parameters, Session, SessionCtrl};

pub const TRACKED: &str = "me";

pub fn waypoints() -> Vec<Waypoint> {
    vec![
        Waypoint::new("esp_a", "A", 0.0, 0.0),
        Waypoint::new("esp_b", "B", 1.0, 1.0),
    ]
}

pub fn position(latitude: f64, longitude: f64) -> InboundMessage {
    InboundMessage::Position(Coordinates::new(latitude, longitude))
}

pub fn peer(id: &str, latitude: f64, longitude: f64) -> InboundMessage {
    InboundMessage::ReceiveLocation(PeerLocation {
        id: PeerId::from(id),
        latitude,
        longitude,
    })
}

pub fn disconnected(id: &str) -> InboundMessage {
    InboundMessage::UserDisconnected(PeerId::from(id))
}

/// A session persisting into a temporary directory
pub struct TestSession {
    data_dir: tempfile::TempDir,
    notifier: Arc<RecordingNotifier>,
    session: Option<Session>,
    outbound: Option<flume::Receiver<OutboundMessage>>,
}

impl TestSession {
    pub fn new() -> Result<Self> {
        let mut s = Self::not_started()?;
        s.start()?;
        Ok(s)
    }

    pub fn not_started() -> Result<Self> {
        Ok(Self {
            data_dir: tempfile::tempdir()?,
            notifier: Arc::new(RecordingNotifier::new()),
            session: None,
            outbound: None,
        })
    }

    /// (Re)start the session on top of whatever is already persisted
    pub fn start(&mut self) -> Result<()> {
        let params = Parameters::builder()
            .waypoints(waypoints())
            .tracked_peer(Some(PeerId::from(TRACKED)))
            .build();
        self.start_with(params)?;
        self.outbound = self.session_mut().take_outbound();
        Ok(())
    }

    /// Start with custom parameters, leaving the outbound channel untaken
    pub fn start_with(&mut self, params: Parameters) -> Result<()> {
        assert!(self.session.is_none());
        let store = FileStore::open_in(self.data_dir.path())?;
        self.session = Some(Session::new(
            params,
            Box::new(store),
            self.notifier.clone(),
        )?);
        Ok(())
    }

    /// Stop reading the outbound channel
    pub fn close_outbound(&mut self) {
        self.outbound = None;
    }

    pub fn ctrl(&self) -> SessionCtrl {
        self.session().get_ctrl()
    }

    pub fn send_all(&self, msgs: impl IntoIterator<Item = InboundMessage>) -> Result<()> {
        let ctrl = self.ctrl();
        for msg in msgs {
            ctrl.send(msg)?;
        }
        Ok(())
    }

    /// Stop the session and wait for it to flush
    pub fn stop(&mut self) -> Vec<OutboundMessage> {
        let session = self.session.take().expect("Session was already stopped");
        session.get_ctrl().stop();
        session.wait();
        self.outbound
            .take()
            .map(|outbound| outbound.drain().collect())
            .unwrap_or_default()
    }

    /// Everything notified so far, as `(esp32_id, status)`
    pub fn notified(&self) -> Vec<(String, PresenceStatus)> {
        self.notifier
            .sent()
            .into_iter()
            .map(|n| (n.esp32_id, n.status))
            .collect()
    }

    pub fn session(&self) -> &Session {
        self.session.as_ref().expect("Session was already stopped")
    }

    pub fn session_mut(&mut self) -> &mut Session {
        self.session.as_mut().expect("Session was already stopped")
    }

    pub fn data_dir(&self) -> &Path {
        self.data_dir.path()
    }
}

impl Drop for TestSession {
    fn drop(&mut self) {
        self.session.take(); // drop before tmp directory is cleaned
    }
}

pub fn start(id: &str) -> (String, PresenceStatus) {
    (id.to_owned(), PresenceStatus::Start)
}

pub fn stop(id: &str) -> (String, PresenceStatus) {
    (id.to_owned(), PresenceStatus::Stop)
}
