//! [`Notifier`] posting to an HTTP endpoint
use std::sync::Mutex;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use waypresence_api::LocationNotification;

use crate::notify::Notifier;

/// Posts every notification as JSON to `endpoint`, each in its own task
///
/// No retries. The outcome of each request is only logged.
pub struct HttpNotifier {
    client: reqwest::Client,
    endpoint: reqwest::Url,
    runtime: Handle,
    in_flight: Mutex<JoinSet<()>>,
}

impl HttpNotifier {
    pub fn new(endpoint: reqwest::Url, runtime: Handle) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            runtime,
            in_flight: Mutex::new(JoinSet::new()),
        }
    }

    pub fn endpoint(&self) -> &reqwest::Url {
        &self.endpoint
    }

    /// Give sends that are still in flight up to `grace` to finish
    ///
    /// Whatever did not complete by then is aborted. Must not be called from
    /// within the runtime.
    pub fn drain(&self, grace: Duration) {
        let mut in_flight = std::mem::take(&mut *self.in_flight.lock().expect("locking failed"));
        if in_flight.is_empty() {
            return;
        }

        debug!(pending = in_flight.len(), ?grace, "Waiting for notifications");
        let done = self.runtime.block_on(async {
            tokio::time::timeout(grace, async {
                while in_flight.join_next().await.is_some() {}
            })
            .await
        });

        if done.is_err() {
            warn!(
                abandoned = in_flight.len(),
                "Notifications did not complete in time"
            );
        }
    }
}

impl Notifier for HttpNotifier {
    fn notify(&self, notification: LocationNotification) {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();

        let mut in_flight = self.in_flight.lock().expect("locking failed");
        // reap whatever already finished
        while in_flight.try_join_next().is_some() {}

        in_flight.spawn_on(
            async move {
                let res = client
                    .post(endpoint)
                    .json(&notification)
                    .send()
                    .await
                    .and_then(reqwest::Response::error_for_status);

                match res {
                    Ok(response) => match response.json::<serde_json::Value>().await {
                        Ok(body) => info!(
                            name = %notification.name,
                            status = %notification.status,
                            %body,
                            "Location notification sent"
                        ),
                        Err(e) => warn!(
                            name = %notification.name,
                            error = %e,
                            "Invalid location notification response"
                        ),
                    },
                    Err(e) => warn!(
                        name = %notification.name,
                        status = %notification.status,
                        error = %e,
                        "Could not send location notification"
                    ),
                }
            },
            &self.runtime,
        );
    }
}
