use arcturus_shared::StarSystem;

use crate::fleet::DrawnFleet;

/// Pointer hit radius in world units. Deliberately not scaled by zoom: click
/// precision loosens when zoomed out and tightens when zoomed in, matching
/// the game's established feel.
pub const HIT_RADIUS: f64 = 20.0;

/// Nearest system within `HIT_RADIUS` of a world-space point, by linear scan.
/// System counts are a few hundred at most; a spatial index would be noise.
pub fn system_at(systems: &[StarSystem], wx: f64, wy: f64) -> Option<&StarSystem> {
    nearest_within(systems.iter().map(|s| (s.x, s.y)), wx, wy).map(|idx| &systems[idx])
}

/// Nearest fleet within `HIT_RADIUS`, tested against this frame's rendered
/// positions rather than the stored system coordinates, so a fleet mid-lane
/// is clickable where it is drawn.
pub fn fleet_at(drawn: &[DrawnFleet], wx: f64, wy: f64) -> Option<&DrawnFleet> {
    nearest_within(drawn.iter().map(|f| (f.x, f.y)), wx, wy).map(|idx| &drawn[idx])
}

fn nearest_within(points: impl Iterator<Item = (f64, f64)>, wx: f64, wy: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, (x, y)) in points.enumerate() {
        let d2 = (x - wx).powi(2) + (y - wy).powi(2);
        if d2 <= HIT_RADIUS * HIT_RADIUS && best.is_none_or(|(_, bd2)| d2 < bd2) {
            best = Some((idx, d2));
        }
    }
    best.map(|(idx, _)| idx)
}

/// Index of the nearest candidate whose direction from `origin` falls within
/// the 45° octant around `dir` (a screen-space arrow direction). Drives
/// arrow-key navigation between connected systems in the app layer.
pub fn nearest_in_octant(
    candidates: &[(f64, f64)],
    origin: (f64, f64),
    dir: (f64, f64),
) -> Option<usize> {
    let dir_len = (dir.0 * dir.0 + dir.1 * dir.1).sqrt();
    if dir_len == 0.0 {
        return None;
    }
    let (ux, uy) = (dir.0 / dir_len, dir.1 / dir_len);
    // cos(22.5°): candidates within the octant's half-angle on either side.
    const COS_HALF_OCTANT: f64 = 0.923_879_532_511_286_7;

    let mut best: Option<(usize, f64)> = None;
    for (idx, &(x, y)) in candidates.iter().enumerate() {
        let (ox, oy) = (x - origin.0, y - origin.1);
        let dist = (ox * ox + oy * oy).sqrt();
        if dist == 0.0 {
            continue;
        }
        let alignment = (ox * ux + oy * uy) / dist;
        if alignment >= COS_HALF_OCTANT && best.is_none_or(|(_, bd)| dist < bd) {
            best = Some((idx, dist));
        }
    }
    best.map(|(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sys(id: &str, x: f64, y: f64) -> StarSystem {
        StarSystem {
            id: id.into(),
            x,
            y,
            name: None,
            owner_id: None,
        }
    }

    #[test]
    fn miss_beyond_hit_radius() {
        let systems = [sys("a", 0.0, 0.0), sys("b", 500.0, 0.0)];
        assert!(system_at(&systems, 100.0, 100.0).is_none());
        // Just outside the radius along one axis.
        assert!(system_at(&systems, 20.5, 0.0).is_none());
    }

    #[test]
    fn hit_returns_the_nearest_system_in_range() {
        let systems = [sys("a", 0.0, 0.0), sys("b", 25.0, 0.0)];
        // 13.0 is within 20 of both; "b" is closer.
        let hit = system_at(&systems, 13.0, 0.0).expect("within radius");
        assert_eq!(hit.id, "b");
    }

    #[test]
    fn boundary_distance_counts_as_a_hit() {
        let systems = [sys("a", 0.0, 0.0)];
        assert!(system_at(&systems, 20.0, 0.0).is_some());
    }

    #[test]
    fn fleets_are_hit_at_their_rendered_position() {
        let drawn = [DrawnFleet {
            fleet_id: "f1".into(),
            x: 250.0,
            y: -40.0,
        }];
        let hit = fleet_at(&drawn, 255.0, -38.0).expect("within radius");
        assert_eq!(hit.fleet_id, "f1");
        assert!(fleet_at(&drawn, 0.0, 0.0).is_none());
    }

    #[test]
    fn octant_pick_respects_direction_and_distance() {
        let candidates = [
            (100.0, 0.0),   // east, near
            (300.0, 10.0),  // east, far
            (0.0, -100.0),  // north
            (-80.0, -80.0), // northwest
        ];
        let east = nearest_in_octant(&candidates, (0.0, 0.0), (1.0, 0.0));
        assert_eq!(east, Some(0));
        let north = nearest_in_octant(&candidates, (0.0, 0.0), (0.0, -1.0));
        assert_eq!(north, Some(2));
        // Nothing to the south.
        assert_eq!(nearest_in_octant(&candidates, (0.0, 0.0), (0.0, 1.0)), None);
    }
}
