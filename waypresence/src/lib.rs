pub mod geo;
#[cfg(feature = "http")]
pub mod http;
pub mod mirror;
pub mod notify;
pub mod state;
pub mod store;
pub mod tracker;

pub use waypresence_api as api;
pub use waypresence_api::{Coordinates, PeerId, Waypoint};

mod error {
    use ::std::io;
    use thiserror::Error;
    #[derive(Error, Debug)]
    pub enum Error {
        #[error("io error: {0}")]
        Io(#[from] io::Error),
        #[error("json error: {0}")]
        Json(#[from] serde_json::Error),
    }
}

pub use self::error::Error;
pub type Result<T> = ::std::result::Result<T, Error>;

pub use self::notify::Notifier;
pub use self::store::KeyValueStore;
pub use self::tracker::{Presence, PresenceEvent, PresenceEventKind, PresenceTracker};
