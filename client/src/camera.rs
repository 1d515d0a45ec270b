/// Camera maps world coordinates to screen pixels: pan offset in world units,
/// zoom, and an eased target the view glides toward over successive frames.
#[derive(Debug, Clone)]
pub struct Camera {
    pub view_x: f64,
    pub view_y: f64,
    pub zoom: f64,
    pub target_view_x: f64,
    pub target_view_y: f64,
    /// Drawing surface size in CSS pixels; transforms center on W/2, H/2.
    pub width: f64,
    pub height: f64,
}

pub const MIN_ZOOM: f64 = 0.05;
pub const MAX_ZOOM: f64 = 4.0;
const ZOOM_SENSITIVITY: f64 = 0.001;
/// Fraction of the remaining distance covered per 16ms of easing.
const EASE_SPEED: f64 = 0.15;
/// Within this many world units of the target, the view snaps — keeps
/// `is_moving` from ringing forever on sub-pixel residue.
const SNAP_DISTANCE: f64 = 0.1;
/// World-unit margin added on each side when fitting to the system bounds.
const FIT_PADDING: f64 = 500.0;
/// First-load ceiling: fitting never zooms in past this.
const FIT_ZOOM_CEILING: f64 = 0.25;

impl Default for Camera {
    fn default() -> Self {
        Self::new(1200.0, 800.0)
    }
}

impl Camera {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            view_x: 0.0,
            view_y: 0.0,
            zoom: 0.25,
            target_view_x: 0.0,
            target_view_y: 0.0,
            width,
            height,
        }
    }

    pub fn set_surface_size(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    /// Convert screen coordinates to world coordinates.
    pub fn screen_to_world(&self, sx: f64, sy: f64) -> (f64, f64) {
        (
            (sx - self.width / 2.0) / self.zoom - self.view_x,
            (sy - self.height / 2.0) / self.zoom - self.view_y,
        )
    }

    /// Convert world coordinates to screen coordinates. Exact inverse of
    /// `screen_to_world` up to floating-point error.
    pub fn world_to_screen(&self, wx: f64, wy: f64) -> (f64, f64) {
        (
            (wx + self.view_x) * self.zoom + self.width / 2.0,
            (wy + self.view_y) * self.zoom + self.height / 2.0,
        )
    }

    /// Wheel zoom toward a focus point. The world point under the cursor is
    /// the same before and after the zoom change.
    pub fn zoom_at(&mut self, delta: f64, sx: f64, sy: f64) {
        let (wx, wy) = self.screen_to_world(sx, sy);
        let factor = (-delta * ZOOM_SENSITIVITY).exp();
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.view_x = (sx - self.width / 2.0) / self.zoom - wx;
        self.view_y = (sy - self.height / 2.0) / self.zoom - wy;
        self.sync_targets();
    }

    /// Pan by a screen-pixel drag delta. Cancels any easing in flight.
    pub fn pan_screen(&mut self, dx: f64, dy: f64) {
        self.view_x += dx / self.zoom;
        self.view_y += dy / self.zoom;
        self.sync_targets();
    }

    /// Begin an eased glide that ends with the given world point centered.
    pub fn center_on(&mut self, wx: f64, wy: f64) {
        self.target_view_x = -wx;
        self.target_view_y = -wy;
    }

    /// Advance easing by `dt_ms`. Covers `EASE_SPEED` of the remaining
    /// distance per 16ms, snapping once within `SNAP_DISTANCE`.
    pub fn ease(&mut self, dt_ms: f64) {
        let step = (EASE_SPEED * dt_ms / 16.0).min(1.0);
        self.view_x = ease_axis(self.view_x, self.target_view_x, step);
        self.view_y = ease_axis(self.view_y, self.target_view_y, step);
    }

    pub fn is_moving(&self) -> bool {
        self.view_x != self.target_view_x || self.view_y != self.target_view_y
    }

    /// Frame the given world-space bounding box: pad each side, pick the zoom
    /// that fits both axes (never past the first-load ceiling), and center
    /// the view on the box centroid. Jumps immediately, no easing.
    pub fn fit_to_bounds(&mut self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) {
        if self.width <= 0.0 || self.height <= 0.0 {
            return;
        }
        let world_w = (max_x - min_x) + FIT_PADDING * 2.0;
        let world_h = (max_y - min_y) + FIT_PADDING * 2.0;
        self.zoom = (self.width / world_w)
            .min(self.height / world_h)
            .min(MAX_ZOOM)
            .min(FIT_ZOOM_CEILING)
            .max(MIN_ZOOM);
        self.view_x = -(min_x + max_x) / 2.0;
        self.view_y = -(min_y + max_y) / 2.0;
        self.sync_targets();
    }

    fn sync_targets(&mut self) {
        self.target_view_x = self.view_x;
        self.target_view_y = self.view_y;
    }
}

fn ease_axis(view: f64, target: f64, step: f64) -> f64 {
    let d = target - view;
    if d.abs() <= SNAP_DISTANCE {
        target
    } else {
        view + d * step
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

    #[test]
    fn world_screen_round_trip_is_identity() {
        let mut cam = Camera::new(800.0, 600.0);
        cam.view_x = 312.5;
        cam.view_y = -77.25;
        cam.zoom = 0.6180339887;

        for (wx, wy) in [(0.0, 0.0), (1000.0, 500.0), (-4321.0, 987.6)] {
            let (sx, sy) = cam.world_to_screen(wx, wy);
            let (bx, by) = cam.screen_to_world(sx, sy);
            assert_close(bx, wx);
            assert_close(by, wy);
            // And back out to the same screen point.
            let (rx, ry) = cam.world_to_screen(bx, by);
            assert_close(rx, sx);
            assert_close(ry, sy);
        }
    }

    #[test]
    fn center_on_sets_negated_targets() {
        let mut cam = Camera::new(800.0, 600.0);
        cam.center_on(1000.0, 500.0);
        assert_close(cam.target_view_x, -1000.0);
        assert_close(cam.target_view_y, -500.0);
    }

    #[test]
    fn easing_converges_and_snaps() {
        let mut cam = Camera::new(800.0, 600.0);
        cam.center_on(1000.0, 500.0);
        assert!(cam.is_moving());
        for _ in 0..600 {
            cam.ease(16.0);
        }
        assert_eq!(cam.view_x, -1000.0);
        assert_eq!(cam.view_y, -500.0);
        assert!(!cam.is_moving());
    }

    #[test]
    fn fit_is_capped_at_first_load_ceiling_and_centered() {
        let mut cam = Camera::new(800.0, 600.0);
        cam.fit_to_bounds(-500.0, -500.0, 500.0, 500.0);
        assert_close(cam.zoom, 0.25);
        // Centered: the bbox centroid lands mid-screen.
        let (sx, sy) = cam.world_to_screen(0.0, 0.0);
        assert_close(sx, 400.0);
        assert_close(sy, 300.0);
        assert!(!cam.is_moving());
    }

    #[test]
    fn fit_uses_padded_extent_when_uncapped() {
        let mut cam = Camera::new(800.0, 600.0);
        cam.fit_to_bounds(-5000.0, -5000.0, 5000.0, 5000.0);
        assert_close(cam.zoom, 600.0 / 11_000.0);
    }

    #[test]
    fn zoom_keeps_the_cursor_point_anchored() {
        let mut cam = Camera::new(800.0, 600.0);
        cam.view_x = 150.0;
        cam.view_y = -90.0;
        let before = cam.screen_to_world(613.0, 205.0);
        cam.zoom_at(-240.0, 613.0, 205.0);
        let after = cam.screen_to_world(613.0, 205.0);
        assert_close(after.0, before.0);
        assert_close(after.1, before.1);
        assert!(cam.zoom > 0.25);
    }

    #[test]
    fn zoom_is_clamped_to_range() {
        let mut cam = Camera::new(800.0, 600.0);
        cam.zoom_at(-1.0e9, 400.0, 300.0);
        assert_close(cam.zoom, MAX_ZOOM);
        cam.zoom_at(1.0e9, 400.0, 300.0);
        assert_close(cam.zoom, MIN_ZOOM);
    }
}
