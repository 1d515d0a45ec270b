use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::camera::Camera;
use crate::influence::InfluenceField;

/// Cells above this influence value belong to a player's territory.
pub const INFLUENCE_THRESHOLD: f64 = 0.2;
/// Boundary point sets smaller than this are grid noise, not territory.
pub const MIN_CONTOUR_POINTS: usize = 5;
/// View-offset bucket size for the cache key, screen-ish world units.
const VIEW_QUANT: f64 = 50.0;

/// One closed territorial outline, screen-space points in angular order.
pub type Contour = Vec<(f64, f64)>;
/// All outlines for one player, shared so cache hits hand out the same
/// allocation (pointer equality is the cache-hit contract).
pub type ContourSet = Rc<Vec<Contour>>;

/// Cache key for one player's contours: ownership topology (CRC32 over the
/// sorted owned-system coordinates) plus the quantized viewport signature.
/// Any ownership or coarse viewport change produces a different key.
pub fn cache_key(player_id: &str, owned_positions: &[(f64, f64)], camera: &Camera) -> String {
    let mut sorted: Vec<(f64, f64)> = owned_positions.to_vec();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));

    let mut hasher = crc32fast::Hasher::new();
    for (x, y) in &sorted {
        hasher.update(&x.to_bits().to_be_bytes());
        hasher.update(&y.to_bits().to_be_bytes());
    }
    let ownership_sig = hasher.finalize();

    format!(
        "{player_id}:{ownership_sig:08x}:{}:{}:{}",
        (camera.view_x / VIEW_QUANT).floor() as i64,
        (camera.view_y / VIEW_QUANT).floor() as i64,
        (camera.zoom * 10.0).floor() as i64,
    )
}

const NEIGHBORS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Flood-fill every above-threshold region of the field and return one
/// closed polygon per region, projected to screen space through the camera:
///
/// 1. 4-connected BFS from any unvisited cell above the threshold.
/// 2. Filled cells with an out-of-grid or at-or-below-threshold neighbor are
///    boundary cells.
/// 3. Boundary cell centers go grid → world → screen.
/// 4. Points are ordered by angle around their centroid.
/// 5. Regions with fewer than `MIN_CONTOUR_POINTS` boundary points are
///    dropped as noise.
///
/// The angular sort assumes near-convex regions; a deeply concave or
/// multi-lobed region produces a self-intersecting outline.
pub fn extract_contours(field: &InfluenceField, camera: &Camera) -> Vec<Contour> {
    let cols = field.cols();
    let rows = field.rows();
    let mut visited = vec![false; cols * rows];
    let mut contours = Vec::new();

    for start in 0..cols * rows {
        if visited[start] || field.value(start % cols, start / cols) <= INFLUENCE_THRESHOLD {
            continue;
        }

        let mut boundary: Vec<(usize, usize)> = Vec::new();
        let mut queue = VecDeque::new();
        queue.push_back(start);
        visited[start] = true;

        while let Some(idx) = queue.pop_front() {
            let col = (idx % cols) as i32;
            let row = (idx / cols) as i32;

            let mut on_boundary = false;
            for (dc, dr) in NEIGHBORS {
                let nc = col + dc;
                let nr = row + dr;
                if nc < 0 || nr < 0 || nc >= cols as i32 || nr >= rows as i32 {
                    on_boundary = true;
                    continue;
                }
                let nidx = nr as usize * cols + nc as usize;
                if field.value(nc as usize, nr as usize) <= INFLUENCE_THRESHOLD {
                    on_boundary = true;
                    continue;
                }
                if !visited[nidx] {
                    visited[nidx] = true;
                    queue.push_back(nidx);
                }
            }
            if on_boundary {
                boundary.push((col as usize, row as usize));
            }
        }

        if boundary.len() < MIN_CONTOUR_POINTS {
            continue;
        }

        let mut points: Vec<(f64, f64)> = boundary
            .into_iter()
            .map(|(col, row)| {
                let (wx, wy) = field.cell_center(col, row);
                camera.world_to_screen(wx, wy)
            })
            .collect();

        let n = points.len() as f64;
        let (cx, cy) = points
            .iter()
            .fold((0.0, 0.0), |(ax, ay), (x, y)| (ax + x / n, ay + y / n));
        points.sort_by(|a, b| {
            let aa = (a.1 - cy).atan2(a.0 - cx);
            let ab = (b.1 - cy).atan2(b.0 - cx);
            aa.total_cmp(&ab)
        });

        contours.push(points);
    }

    contours
}

struct CacheEntry {
    key: String,
    contours: ContourSet,
}

/// Per-player contour cache. A hit returns the stored `Rc` untouched; a miss
/// runs the build closure (field computation + extraction) and replaces the
/// entry. Keys fold in ownership and viewport state, so invalidation is
/// entirely key-driven.
#[derive(Default)]
pub struct ContourCache {
    entries: HashMap<String, CacheEntry>,
}

impl ContourCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute(
        &mut self,
        player_id: &str,
        key: String,
        build: impl FnOnce() -> Vec<Contour>,
    ) -> ContourSet {
        if let Some(entry) = self.entries.get(player_id)
            && entry.key == key
        {
            return entry.contours.clone();
        }
        let contours: ContourSet = Rc::new(build());
        self.entries.insert(
            player_id.to_string(),
            CacheEntry {
                key,
                contours: contours.clone(),
            },
        );
        contours
    }

    /// Drop cached entries for players that no longer own anything.
    pub fn retain_players(&mut self, alive: impl Fn(&str) -> bool) {
        self.entries.retain(|player, _| alive(player));
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use arcturus_shared::StarSystem;

    use super::*;
    use crate::influence::WorldRect;

    fn sys(id: &str, x: f64, y: f64, owner: &str) -> StarSystem {
        StarSystem {
            id: id.into(),
            x,
            y,
            name: None,
            owner_id: Some(owner.into()),
        }
    }

    fn field_for(systems: &[StarSystem], rect: WorldRect) -> InfluenceField {
        InfluenceField::compute("red", rect, systems, &HashSet::new())
    }

    const RECT: WorldRect = WorldRect {
        min_x: 0.0,
        min_y: 0.0,
        max_x: 800.0,
        max_y: 800.0,
    };

    #[test]
    fn single_system_yields_one_angularly_ordered_polygon() {
        let systems = [sys("a", 400.0, 400.0, "red")];
        let camera = Camera::new(800.0, 600.0);
        let contours = extract_contours(&field_for(&systems, RECT), &camera);
        assert_eq!(contours.len(), 1);

        let poly = &contours[0];
        assert!(poly.len() >= MIN_CONTOUR_POINTS);

        // Points come out sorted by angle around the centroid.
        let n = poly.len() as f64;
        let (cx, cy) = poly
            .iter()
            .fold((0.0, 0.0), |(ax, ay), (x, y)| (ax + x / n, ay + y / n));
        let angles: Vec<f64> = poly.iter().map(|(x, y)| (y - cy).atan2(x - cx)).collect();
        assert!(angles.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn disjoint_regions_yield_separate_polygons() {
        let systems = [sys("a", 150.0, 150.0, "red"), sys("b", 650.0, 650.0, "red")];
        let camera = Camera::new(800.0, 600.0);
        let contours = extract_contours(&field_for(&systems, RECT), &camera);
        assert_eq!(contours.len(), 2);
    }

    #[test]
    fn empty_field_yields_no_contours() {
        let camera = Camera::new(800.0, 600.0);
        let contours = extract_contours(&field_for(&[], RECT), &camera);
        assert!(contours.is_empty());
    }

    #[test]
    fn cache_hit_returns_the_same_allocation_without_rebuilding() {
        let systems = [sys("a", 400.0, 400.0, "red")];
        let camera = Camera::new(800.0, 600.0);
        let owned = [(400.0, 400.0)];
        let mut cache = ContourCache::new();
        let mut builds = 0;

        let first = cache.get_or_compute("red", cache_key("red", &owned, &camera), || {
            builds += 1;
            extract_contours(&field_for(&systems, RECT), &camera)
        });
        let second = cache.get_or_compute("red", cache_key("red", &owned, &camera), || {
            builds += 1;
            extract_contours(&field_for(&systems, RECT), &camera)
        });

        assert_eq!(builds, 1);
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn ownership_change_invalidates_the_cached_entry() {
        let camera = Camera::new(800.0, 600.0);
        let mut cache = ContourCache::new();
        let mut builds = 0;

        let before = [(400.0, 400.0)];
        let after = [(400.0, 400.0), (440.0, 400.0)]; // captured one more system
        let k1 = cache_key("red", &before, &camera);
        let k2 = cache_key("red", &after, &camera);
        assert_ne!(k1, k2);

        let first = cache.get_or_compute("red", k1, || {
            builds += 1;
            Vec::new()
        });
        let second = cache.get_or_compute("red", k2, || {
            builds += 1;
            Vec::new()
        });
        assert_eq!(builds, 2);
        assert!(!Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn key_quantizes_the_viewport() {
        let owned = [(400.0, 400.0)];
        let mut camera = Camera::new(800.0, 600.0);
        let base = cache_key("red", &owned, &camera);

        // A nudge inside the 50-unit bucket keeps the key.
        camera.view_x += 10.0;
        assert_eq!(cache_key("red", &owned, &camera), base);

        // Crossing the bucket boundary changes it.
        camera.view_x += 60.0;
        assert_ne!(cache_key("red", &owned, &camera), base);

        // So does a zoom step of 0.1.
        let mut zoomed = Camera::new(800.0, 600.0);
        zoomed.zoom += 0.1;
        assert_ne!(cache_key("red", &owned, &zoomed), base);
    }

    #[test]
    fn keys_are_namespaced_per_player() {
        let owned = [(400.0, 400.0)];
        let camera = Camera::new(800.0, 600.0);
        assert_ne!(
            cache_key("red", &owned, &camera),
            cache_key("blue", &owned, &camera)
        );
    }

    #[test]
    fn retain_players_drops_stale_entries() {
        let camera = Camera::new(800.0, 600.0);
        let mut cache = ContourCache::new();
        cache.get_or_compute("red", cache_key("red", &[], &camera), Vec::new);
        cache.get_or_compute("blue", cache_key("blue", &[], &camera), Vec::new);
        cache.retain_players(|player| player == "red");
        assert_eq!(cache.len(), 1);
    }
}
