//! Persisted presence state
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::store::KeyValueStore;
use crate::Result;

pub const AREA_KEY: &str = "area";
pub const QUEUE_KEY: &str = "queue";
/// Stored under [`AREA_KEY`] when not present at any waypoint
pub const NO_AREA: &str = "None";

/// Names of waypoints that were announced as entered, but not yet as left
///
/// Ordered by insertion, never holds duplicates.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PendingQueue(Vec<String>);

impl PendingQueue {
    /// Returns `false` if `name` was already queued
    pub fn insert(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.0.push(name.to_owned());
        true
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let len = self.0.len();
        self.0.retain(|n| n != name);
        len != self.0.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn take(&mut self) -> Vec<String> {
        std::mem::take(&mut self.0)
    }
}

impl FromIterator<String> for PendingQueue {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        let mut queue = Self::default();
        for name in iter {
            queue.insert(&name);
        }
        queue
    }
}

/// Current area and pending queue, as loaded from and committed to a [`KeyValueStore`]
///
/// `area` is always either `None` or an entry of `queue`.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct PresenceState {
    area: Option<String>,
    queue: PendingQueue,
}

impl PresenceState {
    pub fn load<S>(store: &S) -> Result<Self>
    where
        S: KeyValueStore + ?Sized,
    {
        let area = store
            .get(AREA_KEY)?
            .filter(|area| area != NO_AREA && !area.is_empty());

        let queue: PendingQueue = match store.get(QUEUE_KEY)? {
            Some(raw) => match serde_json::from_str::<Vec<String>>(&raw) {
                // dedup anything a previous version might have left behind
                Ok(names) => names.into_iter().collect(),
                Err(e) => {
                    warn!(error = %e, "Invalid stored queue, resetting");
                    PendingQueue::default()
                }
            },
            None => PendingQueue::default(),
        };

        let mut state = Self { area, queue };
        if let Some(area) = state.area.as_deref() {
            if state.queue.insert(area) {
                warn!(area, "Stored area was not pending, queueing it");
            }
        }
        Ok(state)
    }

    pub fn commit<S>(&self, store: &mut S) -> Result<()>
    where
        S: KeyValueStore + ?Sized,
    {
        store.set(AREA_KEY, self.area.as_deref().unwrap_or(NO_AREA))?;
        store.set(QUEUE_KEY, &serde_json::to_string(&self.queue)?)?;
        Ok(())
    }

    pub fn area(&self) -> Option<&str> {
        self.area.as_deref()
    }

    pub fn queue(&self) -> &PendingQueue {
        &self.queue
    }

    /// Become present at `name`
    pub fn enter(&mut self, name: &str) {
        debug_assert!(self.area.is_none());
        self.queue.insert(name);
        self.area = Some(name.to_owned());
    }

    /// Stop being present anywhere, returning where we were
    pub fn leave(&mut self) -> Option<String> {
        let area = self.area.take()?;
        self.queue.remove(&area);
        Some(area)
    }

    /// Reset to empty, returning everything that was pending
    pub fn take_pending(&mut self) -> Vec<String> {
        self.area = None;
        self.queue.take()
    }
}
