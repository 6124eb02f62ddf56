use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use flume::{RecvTimeoutError, TrySendError};
use signal_hook::consts::TERM_SIGNALS;
use signal_hook::flag;
use thiserror::Error;
use tracing::{debug, info, trace, warn};
use typed_builder::TypedBuilder;
use waypresence::mirror::PeerMirror;
use waypresence::{KeyValueStore, Notifier, PeerId, PresenceTracker, Waypoint};
use waypresence_api::{builtin_waypoints, InboundMessage, OutboundMessage};

use crate::task::AutoJoinHandle;

pub type SharedNotifier = Arc<dyn Notifier + Send + Sync>;
pub type BoxedStore = Box<dyn KeyValueStore + Send>;

/// Runtime parameters of a [`Session`]
#[derive(TypedBuilder, Debug, Clone)]
pub struct Parameters {
    #[builder(default = builtin_waypoints())]
    pub waypoints: Vec<Waypoint>,

    /// Channel id of the local user; its disconnect ends the presence session
    #[builder(default)]
    pub tracked_peer: Option<PeerId>,

    /// Inbound messages buffered before senders block
    #[builder(default = Parameters::DEFAULT_INBOUND_CAPACITY)]
    pub inbound_capacity: usize,

    /// Outbound messages buffered for a slow (or absent) reader before new
    /// ones get dropped
    #[builder(default = Parameters::DEFAULT_OUTBOUND_CAPACITY)]
    pub outbound_capacity: usize,
}

impl Parameters {
    pub const DEFAULT_INBOUND_CAPACITY: usize = 64;
    pub const DEFAULT_OUTBOUND_CAPACITY: usize = 64;
    /// How often the session checks for a shutdown request while idle
    pub const POLL_INTERVAL: Duration = Duration::from_millis(100);
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("presence state error: {0}")]
    State(#[from] waypresence::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("session is closed")]
    Closed,
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;

#[derive(Clone)]
pub struct SessionCtrl {
    tx: flume::Sender<InboundMessage>,
    is_session_shutting_down: Arc<AtomicBool>,
}

impl SessionCtrl {
    /// Queue a message for the session, blocking if it is falling behind
    pub fn send(&self, msg: InboundMessage) -> SessionResult<()> {
        self.tx.send(msg).map_err(|_| SessionError::Closed)
    }

    /// Ask the session to flush and finish once queued messages are handled
    pub fn stop(&self) {
        self.is_session_shutting_down.store(true, Ordering::SeqCst);
    }

    pub fn install_signal_handler(&self) -> anyhow::Result<()> {
        debug!("Installing signal handler");
        for sig in TERM_SIGNALS {
            trace!(sig, "Installing signal handler");
            flag::register(*sig, Arc::clone(&self.is_session_shutting_down))?;
        }
        Ok(())
    }
}

/// A presence tracking session
///
/// The tracker and the peer mirror are owned by a single session thread;
/// everything else talks to it through [`SessionCtrl`].
pub struct Session {
    stop_on_drop: bool,
    // Dropped before `join_handle`, so a session with no other senders left
    // can notice and finish.
    ctrl: SessionCtrl,
    /// Handed out once by [`Session::take_outbound`]
    outbound_rx: Option<flume::Receiver<OutboundMessage>>,
    #[allow(unused)]
    join_handle: AutoJoinHandle,
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.stop_on_drop {
            self.ctrl.stop();
        }
    }
}

impl Session {
    pub fn new(
        params: Parameters,
        store: BoxedStore,
        notifier: SharedNotifier,
    ) -> SessionResult<Self> {
        info!(
            waypoints = params.waypoints.len(),
            tracked_peer = ?params.tracked_peer,
            "Starting presence session"
        );

        let tracker = PresenceTracker::new(params.waypoints, store, notifier)?;
        let mirror = PeerMirror::new(params.tracked_peer);

        let is_session_shutting_down = Arc::new(AtomicBool::new(false));
        let (tx, rx) = flume::bounded(params.inbound_capacity);
        let (outbound_tx, outbound_rx) = flume::bounded(params.outbound_capacity);

        let actor = SessionActor {
            tracker,
            mirror,
            rx,
            outbound_tx: Some(outbound_tx),
            is_session_shutting_down: is_session_shutting_down.clone(),
        };

        let join_handle = AutoJoinHandle::spawn("session", move || {
            let _guard = scopeguard::guard((), |_| {
                info!("Session is done");
            });
            actor.run()
        })?;

        Ok(Self {
            stop_on_drop: true,
            ctrl: SessionCtrl {
                tx,
                is_session_shutting_down,
            },
            outbound_rx: Some(outbound_rx),
            join_handle,
        })
    }

    pub fn get_ctrl(&self) -> SessionCtrl {
        self.ctrl.clone()
    }

    /// Take the messages to publish on the real-time channel
    ///
    /// Only the first call returns the receiver. Once it is dropped, the
    /// session stops producing outbound messages.
    pub fn take_outbound(&mut self) -> Option<flume::Receiver<OutboundMessage>> {
        self.outbound_rx.take()
    }

    /// Block until the session finishes (stopped, or all inputs gone)
    pub fn wait(mut self) {
        self.stop_on_drop = false;
        drop(self);
        info!("Session finished");
    }
}

struct SessionActor {
    tracker: PresenceTracker<BoxedStore, SharedNotifier>,
    mirror: PeerMirror,
    rx: flume::Receiver<InboundMessage>,
    outbound_tx: Option<flume::Sender<OutboundMessage>>,
    is_session_shutting_down: Arc<AtomicBool>,
}

impl SessionActor {
    fn run(mut self) {
        loop {
            match self.rx.recv_timeout(Parameters::POLL_INTERVAL) {
                Ok(msg) => self.handle(msg),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("All session inputs are gone");
                    break;
                }
            }

            if self.is_session_shutting_down.load(Ordering::SeqCst) {
                let pending: Vec<_> = self.rx.drain().collect();
                debug!(pending = pending.len(), "Session stop requested");
                for msg in pending {
                    self.handle(msg);
                }
                break;
            }
        }

        self.tracker.flush();
    }

    fn publish(&mut self, msg: OutboundMessage) {
        let Some(outbound_tx) = self.outbound_tx.as_ref() else {
            return;
        };
        match outbound_tx.try_send(msg) {
            Ok(()) => {}
            Err(TrySendError::Full(msg)) => {
                debug!(?msg, "Outbound reader is falling behind, dropping message");
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!("No outbound reader left, no longer publishing");
                self.outbound_tx = None;
            }
        }
    }

    fn handle(&mut self, msg: InboundMessage) {
        match msg {
            InboundMessage::Position(sample) => {
                if !sample.is_valid() {
                    debug!(%sample, "Dropping malformed position sample");
                    return;
                }
                self.publish(OutboundMessage::SendLocation(sample));

                for event in self.tracker.on_position(sample) {
                    info!(kind = %event.kind, waypoint = %event.waypoint.name, "Presence changed");
                }
            }
            InboundMessage::PositionError(error) => {
                warn!(%error, "Location service error");
            }
            InboundMessage::ReceiveLocation(peer) => {
                self.mirror.update(&peer);
            }
            InboundMessage::UserDisconnected(id) => {
                if self.mirror.disconnect(&id).is_tracked {
                    info!(peer = %id, "Tracked user disconnected, flushing presence");
                    self.tracker.flush();
                }
            }
        }
    }
}
