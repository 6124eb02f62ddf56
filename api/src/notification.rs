use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Presence transition reported to the notification endpoint
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    /// User entered the waypoint
    #[display(fmt = "start")]
    Start,
    /// User left the waypoint
    #[display(fmt = "stop")]
    Stop,
}

/// Body of `POST /location`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationNotification {
    pub esp32_id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: PresenceStatus,
}

#[test]
fn notification_wire_format() {
    let n = LocationNotification {
        esp32_id: "esp32_002".into(),
        name: "Besant Nagar".into(),
        latitude: 12.5,
        longitude: 80.25,
        status: PresenceStatus::Stop,
    };

    assert_eq!(
        serde_json::to_value(&n).unwrap(),
        serde_json::json!({
            "esp32_id": "esp32_002",
            "name": "Besant Nagar",
            "latitude": 12.5,
            "longitude": 80.25,
            "status": "stop",
        })
    );
}
