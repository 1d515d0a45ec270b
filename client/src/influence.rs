use std::collections::HashSet;

use arcturus_shared::StarSystem;

/// Grid resolution of the influence field, world units per cell.
pub const CELL_SIZE: f64 = 40.0;
/// Systems exert pressure out to this world-unit distance, then nothing.
pub const FALLOFF_RADIUS: f64 = 150.0;
/// Rival systems subtract at this fraction of their falloff weight.
pub const RIVAL_WEIGHT: f64 = 0.6;

/// Axis-aligned world-space rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldRect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl WorldRect {
    /// Grow the rect by `margin` on every side.
    pub fn padded(self, margin: f64) -> Self {
        Self {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }
}

/// Scalar "ownership pressure" of one player over a coarse grid. Values are
/// unbounded; an isolated owned system peaks near 1.0 at its own cell and
/// clustered ownership stacks higher. Recomputed only on contour-cache miss.
#[derive(Debug, Clone)]
pub struct InfluenceField {
    cols: usize,
    rows: usize,
    origin_x: f64,
    origin_y: f64,
    values: Vec<f64>,
}

impl InfluenceField {
    /// Compute the field for `player_id` over `rect`. Positive pressure from
    /// the player's own systems, `RIVAL_WEIGHT`-scaled negative pressure from
    /// systems of `active_rivals` (players holding at least one colonized
    /// planet). Unowned systems and inactive owners exert nothing.
    pub fn compute(
        player_id: &str,
        rect: WorldRect,
        systems: &[StarSystem],
        active_rivals: &HashSet<String>,
    ) -> Self {
        let cols = (((rect.max_x - rect.min_x) / CELL_SIZE).ceil() as usize).max(1);
        let rows = (((rect.max_y - rect.min_y) / CELL_SIZE).ceil() as usize).max(1);
        let mut field = Self {
            cols,
            rows,
            origin_x: rect.min_x,
            origin_y: rect.min_y,
            values: vec![0.0; cols * rows],
        };

        for system in systems {
            let Some(owner) = system.owner_id.as_deref() else {
                continue;
            };
            let weight = if owner == player_id {
                1.0
            } else if active_rivals.contains(owner) {
                -RIVAL_WEIGHT
            } else {
                continue;
            };
            field.stamp(system.x, system.y, weight);
        }
        field
    }

    /// Add one system's quadratic falloff disc into the grid. Equivalent to
    /// summing per cell over all systems, but only touches cells inside the
    /// disc's bounding box.
    fn stamp(&mut self, sx: f64, sy: f64, weight: f64) {
        let col_min = (((sx - FALLOFF_RADIUS - self.origin_x) / CELL_SIZE).floor()).max(0.0) as usize;
        let row_min = (((sy - FALLOFF_RADIUS - self.origin_y) / CELL_SIZE).floor()).max(0.0) as usize;
        let col_max =
            ((((sx + FALLOFF_RADIUS - self.origin_x) / CELL_SIZE).ceil()) as usize).min(self.cols);
        let row_max =
            ((((sy + FALLOFF_RADIUS - self.origin_y) / CELL_SIZE).ceil()) as usize).min(self.rows);

        for row in row_min..row_max {
            for col in col_min..col_max {
                let (cx, cy) = self.cell_center(col, row);
                let dist = ((cx - sx).powi(2) + (cy - sy).powi(2)).sqrt();
                if dist >= FALLOFF_RADIUS {
                    continue;
                }
                let falloff = 1.0 - dist / FALLOFF_RADIUS;
                self.values[row * self.cols + col] += weight * falloff * falloff;
            }
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn value(&self, col: usize, row: usize) -> f64 {
        self.values[row * self.cols + col]
    }

    /// World coordinates of a cell's center.
    pub fn cell_center(&self, col: usize, row: usize) -> (f64, f64) {
        (
            self.origin_x + (col as f64 + 0.5) * CELL_SIZE,
            self.origin_y + (row as f64 + 0.5) * CELL_SIZE,
        )
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        let diff = (actual - expected).abs();
        assert!(
            diff < 1e-9,
            "expected {expected}, got {actual} (diff: {diff})"
        );
    }

    fn sys(id: &str, x: f64, y: f64, owner: Option<&str>) -> StarSystem {
        StarSystem {
            id: id.into(),
            x,
            y,
            name: None,
            owner_id: owner.map(Into::into),
        }
    }

    const RECT: WorldRect = WorldRect {
        min_x: 0.0,
        min_y: 0.0,
        max_x: 400.0,
        max_y: 400.0,
    };

    #[test]
    fn owned_system_peaks_at_its_own_cell() {
        // (100, 100) is exactly the center of cell (2, 2).
        let systems = [sys("a", 100.0, 100.0, Some("red"))];
        let field = InfluenceField::compute("red", RECT, &systems, &HashSet::new());
        assert_close(field.value(2, 2), 1.0);
    }

    #[test]
    fn pressure_is_zero_at_and_beyond_the_falloff_radius() {
        let systems = [sys("a", 100.0, 100.0, Some("red"))];
        let field = InfluenceField::compute("red", RECT, &systems, &HashSet::new());
        // Cell (7, 2) center is (300, 100): 200 units away.
        assert_close(field.value(7, 2), 0.0);
    }

    #[test]
    fn active_rival_subtracts_at_rival_weight() {
        let systems = [
            sys("mine", 140.0, 100.0, Some("red")),
            sys("theirs", 100.0, 100.0, Some("blue")),
        ];
        let rivals: HashSet<String> = ["blue".to_string()].into();
        let field = InfluenceField::compute("red", RECT, &systems, &rivals);

        let own = (1.0 - 40.0 / FALLOFF_RADIUS).powi(2);
        assert_close(field.value(2, 2), own - RIVAL_WEIGHT);
        assert!(field.value(2, 2) < 0.0);
    }

    #[test]
    fn inactive_owners_and_unowned_systems_exert_nothing() {
        let systems = [
            sys("neutral", 100.0, 100.0, None),
            sys("dormant", 100.0, 100.0, Some("green")), // not in active_rivals
        ];
        let field = InfluenceField::compute("red", RECT, &systems, &HashSet::new());
        assert_close(field.value(2, 2), 0.0);
    }

    #[test]
    fn clustered_ownership_stacks_above_one() {
        let systems = [
            sys("a", 100.0, 100.0, Some("red")),
            sys("b", 140.0, 100.0, Some("red")),
        ];
        let field = InfluenceField::compute("red", RECT, &systems, &HashSet::new());
        assert!(field.value(2, 2) > 1.0);
    }

}
