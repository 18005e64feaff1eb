//! Assigning positions to zones

use crate::types::Zone;

impl Zone {
    /// Whether the position lies inside the zone, edges included
    pub fn contains(&self, x: i32, y: i32) -> bool {
        let (left, top) = (self.x as i32, self.y as i32);
        let (right, bottom) = (left + self.width as i32, top + self.height as i32);
        (left..=right).contains(&x) && (top..=bottom).contains(&y)
    }

    /// Euclidean distance from the position to the closest point of the zone
    pub fn distance_to(&self, x: i32, y: i32) -> f64 {
        let (left, top) = (self.x as i32, self.y as i32);
        let (right, bottom) = (left + self.width as i32, top + self.height as i32);

        let dx = (left - x).max(x - right).max(0) as f64;
        let dy = (top - y).max(y - bottom).max(0) as f64;
        dx.hypot(dy)
    }
}

/// Id of the zone a position belongs to
///
/// The first zone containing the position wins. Otherwise the closest zone is used, the earliest
/// one on ties. Returns `None` when there are no zones.
pub fn zone_for_position(zones: &[Zone], x: i32, y: i32) -> Option<u8> {
    if let Some(zone) = zones.iter().find(|zone| zone.contains(x, y)) {
        return Some(zone.id);
    }

    let mut best: Option<(&Zone, f64)> = None;
    for zone in zones {
        let distance = zone.distance_to(x, y);
        if best.map_or(true, |(_, closest)| distance < closest) {
            best = Some((zone, distance));
        }
    }
    best.map(|(zone, _)| zone.id)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::types::Zone;
    use crate::zone::zone_for_position;

    fn zone(id: u8, x: u16, y: u16, width: u16, height: u16) -> Zone {
        Zone {
            id,
            x,
            y,
            width,
            height,
            ..Default::default()
        }
    }

    #[test]
    fn inside_zone() {
        let zones = [zone(0, 0, 0, 100, 100), zone(1, 200, 0, 100, 100)];
        assert_eq!(zone_for_position(&zones, 250, 50), Some(1));
        assert_eq!(zone_for_position(&zones, 10, 10), Some(0));
    }

    #[test]
    fn edges_are_inside() {
        let zones = [zone(3, 16, 16, 64, 32)];
        assert!(zones[0].contains(16, 16));
        assert!(zones[0].contains(80, 48));
        assert!(!zones[0].contains(81, 48));
    }

    #[test]
    fn overlap_uses_first_zone() {
        let zones = [zone(4, 0, 0, 100, 100), zone(5, 50, 50, 100, 100)];
        assert_eq!(zone_for_position(&zones, 75, 75), Some(4));
    }

    #[test]
    fn outside_uses_nearest_zone() {
        let zones = [zone(0, 0, 0, 100, 100), zone(1, 400, 0, 100, 100)];
        assert_eq!(zone_for_position(&zones, 350, 50), Some(1));
        assert_eq!(zone_for_position(&zones, 120, 300), Some(0));
    }

    #[test]
    fn ties_use_first_zone() {
        let zones = [zone(7, 0, 0, 100, 100), zone(2, 200, 0, 100, 100)];
        assert_eq!(zone_for_position(&zones, 150, 50), Some(7));
    }

    #[test]
    fn distance_to_corner() {
        let zone = zone(0, 0, 0, 10, 10);
        assert_eq!(zone.distance_to(13, 14), 5.0);
        assert_eq!(zone.distance_to(5, 5), 0.0);
    }

    #[test]
    fn no_zones() {
        assert_eq!(zone_for_position(&[], 0, 0), None);
    }
}
