#![deny(clippy::as_conversions)]

mod relay;
mod session;
mod task;

pub use relay::*;
pub use session::*;
pub use task::AutoJoinHandle;

use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context};
use tracing::{info, warn};
use waypresence::Waypoint;

/// Load waypoints from a JSON file, or fall back to the builtin table
pub fn load_waypoints(path: Option<&Path>) -> anyhow::Result<Vec<Waypoint>> {
    let Some(path) = path else {
        return Ok(waypresence_api::builtin_waypoints());
    };

    let bytes = std::fs::read(path)
        .with_context(|| format!("reading waypoints from {}", path.display()))?;
    let waypoints: Vec<Waypoint> = serde_json::from_slice(&bytes)
        .with_context(|| format!("parsing waypoints from {}", path.display()))?;

    let mut names = HashSet::new();
    for waypoint in &waypoints {
        if !waypoint.coordinates().is_valid() {
            bail!(
                "waypoint {} in {} has invalid coordinates {}",
                waypoint.name,
                path.display(),
                waypoint.coordinates()
            );
        }
        if !names.insert(waypoint.name.as_str()) {
            bail!(
                "waypoint name {} is used more than once in {}",
                waypoint.name,
                path.display()
            );
        }
    }

    if waypoints.is_empty() {
        warn!(path = %path.display(), "No waypoints, presence will never change");
    }
    info!(path = %path.display(), waypoints = waypoints.len(), "Loaded waypoints");
    Ok(waypoints)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_waypoints_from_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("waypoints.json");
        std::fs::write(
            &path,
            r#"[{"id":"esp32_900","name":"Depot","latitude":1.5,"longitude":-2.5}]"#,
        )?;

        let waypoints = load_waypoints(Some(&path))?;
        assert_eq!(
            waypoints,
            [Waypoint::new("esp32_900", "Depot", 1.5, -2.5)]
        );

        assert_eq!(load_waypoints(None)?.len(), 4);
        assert!(load_waypoints(Some(&dir.path().join("missing.json"))).is_err());
        Ok(())
    }

    #[test]
    fn load_waypoints_rejects_bad_entries() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("waypoints.json");

        std::fs::write(
            &path,
            r#"[{"id":"esp32_1","name":"Depot","latitude":1.0,"longitude":1.0},
                {"id":"esp32_2","name":"Depot","latitude":2.0,"longitude":2.0}]"#,
        )?;
        let err = load_waypoints(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("more than once"), "{err}");

        std::fs::write(
            &path,
            r#"[{"id":"esp32_1","name":"Depot","latitude":91.0,"longitude":1.0}]"#,
        )?;
        let err = load_waypoints(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("invalid coordinates"), "{err}");

        // same device under different names is fine
        std::fs::write(
            &path,
            r#"[{"id":"esp32_1","name":"Depot","latitude":1.0,"longitude":1.0},
                {"id":"esp32_1","name":"Gate","latitude":2.0,"longitude":2.0}]"#,
        )?;
        assert_eq!(load_waypoints(Some(&path))?.len(), 2);
        Ok(())
    }
}
