use derive_more::Display;
use serde::{Deserialize, Serialize};

mod net;
pub use self::net::*;

mod notification;
pub use self::notification::*;

/// A single position sample, in degrees
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, Display)]
#[display(fmt = "({}, {})", latitude, longitude)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Does this look like something a location service could have produced?
    ///
    /// Samples failing this check are dropped without touching presence state.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Identifier of a peer on the real-time channel
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display)]
#[serde(transparent)]
pub struct PeerId(pub String);

impl From<&str> for PeerId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// A fixed, named point of interest with a device watching it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Device identifier (`esp32_id` on the wire)
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Waypoint {
    pub fn new(id: impl Into<String>, name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            latitude,
            longitude,
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    /// Build the notification body reporting `status` for this waypoint
    pub fn notification(&self, status: PresenceStatus) -> LocationNotification {
        LocationNotification {
            esp32_id: self.id.clone(),
            name: self.name.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            status,
        }
    }
}

/// Waypoints compiled into the binary
pub fn builtin_waypoints() -> Vec<Waypoint> {
    vec![
        Waypoint::new(
            "esp32_001",
            "Arcot Road",
            13.0418592823117,
            80.17641308680929,
        ),
        Waypoint::new("esp32_002", "Besant Nagar", 12.9960874, 80.2676685),
        Waypoint::new(
            "esp32_003",
            "Anna Nagar Roundabout",
            13.084663299999999,
            80.21796674973545,
        ),
        Waypoint::new("esp32_004", "Infosys", 12.8925236, 80.2275312),
    ]
}

#[test]
fn coordinates_validity() {
    assert!(Coordinates::new(0.0, 0.0).is_valid());
    assert!(Coordinates::new(-90.0, 180.0).is_valid());
    assert!(!Coordinates::new(90.5, 0.0).is_valid());
    assert!(!Coordinates::new(0.0, -180.1).is_valid());
    assert!(!Coordinates::new(f64::NAN, 0.0).is_valid());
    assert!(!Coordinates::new(0.0, f64::INFINITY).is_valid());
}

#[test]
fn builtin_waypoints_are_unique() {
    let waypoints = builtin_waypoints();
    assert_eq!(waypoints.len(), 4);
    for (i, a) in waypoints.iter().enumerate() {
        for b in &waypoints[i + 1..] {
            assert_ne!(a.name, b.name);
            assert_ne!(a.id, b.id);
        }
    }
}
