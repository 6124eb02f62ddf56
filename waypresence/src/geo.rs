//! Surface distances and nearest-waypoint lookup
use waypresence_api::{Coordinates, Waypoint};

/// Radius of the sphere distances are measured on
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between `a` and `b` in meters
pub fn haversine_distance(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);

    2.0 * h.sqrt().atan2((1.0 - h).sqrt()) * EARTH_RADIUS_M
}

/// Nearest waypoint to `sample`, along with its distance in meters
///
/// There is no cutoff: any non-empty list yields a result, no matter how far.
/// On equal distances the waypoint listed first wins.
pub fn nearest_with_distance(
    sample: Coordinates,
    waypoints: &[Waypoint],
) -> Option<(&Waypoint, f64)> {
    let mut nearest: Option<(&Waypoint, f64)> = None;

    for waypoint in waypoints {
        let distance = haversine_distance(sample, waypoint.coordinates());
        match nearest {
            Some((_, min)) if min <= distance => {}
            _ => nearest = Some((waypoint, distance)),
        }
    }

    nearest
}

/// See [`nearest_with_distance`]
pub fn nearest_waypoint(sample: Coordinates, waypoints: &[Waypoint]) -> Option<&Waypoint> {
    nearest_with_distance(sample, waypoints).map(|(waypoint, _)| waypoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Meters per degree along a meridian
    const M_PER_DEG: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6 * expected.max(1.0),
            "{actual} != {expected}"
        );
    }

    #[test]
    fn distance_along_axes() {
        let origin = Coordinates::new(0.0, 0.0);

        assert_eq!(haversine_distance(origin, origin), 0.0);
        assert_close(
            haversine_distance(origin, Coordinates::new(1.0, 0.0)),
            M_PER_DEG,
        );
        assert_close(
            haversine_distance(origin, Coordinates::new(0.0, 1.0)),
            M_PER_DEG,
        );
        assert_close(
            haversine_distance(origin, Coordinates::new(0.0, 180.0)),
            EARTH_RADIUS_M * std::f64::consts::PI,
        );
        assert_close(
            haversine_distance(Coordinates::new(90.0, 0.0), Coordinates::new(-90.0, 0.0)),
            EARTH_RADIUS_M * std::f64::consts::PI,
        );
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Coordinates::new(13.0418592823117, 80.17641308680929);
        let b = Coordinates::new(12.8925236, 80.2275312);
        assert_close(haversine_distance(a, b), haversine_distance(b, a));
        // Arcot Road to Infosys, Chennai
        let d = haversine_distance(a, b);
        assert!(17_000.0 < d && d < 18_000.0, "{d}");
    }

    #[test]
    fn nearest_at_known_bearings() {
        let reference = Waypoint::new("r", "reference", 10.0, 20.0);
        let far = Waypoint::new("f", "far", 10.0 + 5_000.0 / M_PER_DEG, 20.0);
        let waypoints = vec![far.clone(), reference.clone()];

        // 500m north, south and (roughly) east of the reference point
        for sample in [
            Coordinates::new(10.0 + 500.0 / M_PER_DEG, 20.0),
            Coordinates::new(10.0 - 500.0 / M_PER_DEG, 20.0),
            Coordinates::new(10.0, 20.0 + 500.0 / (M_PER_DEG * 10f64.to_radians().cos())),
        ] {
            let (nearest, distance) = nearest_with_distance(sample, &waypoints).unwrap();
            assert_eq!(nearest, &reference);
            assert!((distance - 500.0).abs() < 1.0, "{distance}");
        }

        // 4km north is closer to `far`
        let sample = Coordinates::new(10.0 + 4_000.0 / M_PER_DEG, 20.0);
        assert_eq!(nearest_waypoint(sample, &waypoints), Some(&far));
    }

    #[test]
    fn nearest_has_no_cutoff() {
        let waypoints = vec![Waypoint::new("a", "a", 0.0, 0.0)];
        let antipode = Coordinates::new(0.0, 180.0);
        assert_eq!(
            nearest_waypoint(antipode, &waypoints).map(|w| w.name.as_str()),
            Some("a")
        );
    }

    #[test]
    fn nearest_tie_goes_to_first() {
        let waypoints = vec![
            Waypoint::new("e", "east", 0.0, 1.0),
            Waypoint::new("w", "west", 0.0, -1.0),
        ];
        let sample = Coordinates::new(0.0, 0.0);
        assert_eq!(
            nearest_waypoint(sample, &waypoints).map(|w| w.name.as_str()),
            Some("east")
        );

        let reversed: Vec<_> = waypoints.into_iter().rev().collect();
        assert_eq!(
            nearest_waypoint(sample, &reversed).map(|w| w.name.as_str()),
            Some("west")
        );
    }

    #[test]
    fn nearest_of_nothing() {
        assert!(nearest_waypoint(Coordinates::new(0.0, 0.0), &[]).is_none());
    }
}
