use arcturus_shared::{Fleet, FleetOrder};

/// Offset applied to idle fleets so their glyph does not sit exactly on the
/// system glyph.
pub const STATIONARY_OFFSET: (f64, f64) = (14.0, -12.0);

/// Route previews drawn after a move is issued expire this long after
/// creation; expiry is a per-frame timestamp filter, not a timer.
pub const ROUTE_PREVIEW_TTL_MS: f64 = 4_000.0;

/// A fleet's position as rendered this frame, in world units. Rebuilt from
/// scratch every frame (derived, never stored across frames) and used only
/// for hit-testing within the same frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawnFleet {
    pub fleet_id: String,
    pub x: f64,
    pub y: f64,
}

/// Visual state of one hop of a multi-hop route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopState {
    /// Already traveled: rendered solid and faint.
    Completed,
    /// The segment the fleet is currently on: pulsing dashed stroke.
    Active,
    /// Not yet reached: dimmed.
    Upcoming,
}

pub fn hop_state(hop_index: usize, current_hop: usize) -> HopState {
    if hop_index < current_hop {
        HopState::Completed
    } else if hop_index == current_hop {
        HopState::Active
    } else {
        HopState::Upcoming
    }
}

/// Label for a route node, or `None` for unlabeled intermediate stops.
pub fn route_node_label(
    node_index: usize,
    current_hop: usize,
    path_len: usize,
) -> Option<&'static str> {
    if path_len < 2 {
        return None;
    }
    if node_index == 0 {
        Some("START")
    } else if node_index == path_len - 1 {
        Some("DEST")
    } else if node_index == current_hop + 1 {
        Some("NEXT")
    } else {
        None
    }
}

/// The active segment endpoints for an order: the hop the fleet is currently
/// traversing for multi-hop routes, else current system → destination.
pub fn segment_endpoints<'a>(fleet: &'a Fleet, order: &'a FleetOrder) -> (&'a str, Option<&'a str>) {
    if let Some(path) = order.route_path.as_deref()
        && path.len() > 1
    {
        let hop = order.current_hop.unwrap_or(0).min(path.len() - 2);
        return (&path[hop], Some(&path[hop + 1]));
    }
    let dest = order
        .final_destination_id
        .as_deref()
        .or(fleet.destination_system.as_deref());
    (&fleet.current_system, dest)
}

/// World-space draw position for a fleet. `resolve` maps a system id to its
/// position; an unresolvable id yields `None` and the caller skips the fleet
/// for this frame.
pub fn draw_position(
    fleet: &Fleet,
    active_order: Option<&FleetOrder>,
    current_tick: i64,
    resolve: impl Fn(&str) -> Option<(f64, f64)>,
) -> Option<(f64, f64)> {
    let Some(order) = active_order else {
        let (x, y) = resolve(&fleet.current_system)?;
        return Some((x + STATIONARY_OFFSET.0, y + STATIONARY_OFFSET.1));
    };

    let (origin_id, dest_id) = segment_endpoints(fleet, order);
    let (ox, oy) = resolve(origin_id)?;
    let Some(dest_id) = dest_id else {
        // Order without a destination behaves like an idle fleet.
        return Some((ox + STATIONARY_OFFSET.0, oy + STATIONARY_OFFSET.1));
    };
    let (dx, dy) = resolve(dest_id)?;
    let t = order.progress(current_tick);
    Some((ox + (dx - ox) * t, oy + (dy - oy) * t))
}

/// An ephemeral route overlay created when the player issues a move.
#[derive(Debug, Clone)]
pub struct RoutePreview {
    pub path: Vec<String>,
    pub created_at_ms: f64,
}

impl RoutePreview {
    pub fn age_fraction(&self, now_ms: f64) -> f64 {
        ((now_ms - self.created_at_ms) / ROUTE_PREVIEW_TTL_MS).clamp(0.0, 1.0)
    }
}

/// Drop previews older than the TTL. Called once per frame; overlapping
/// previews supersede each other naturally through this filter.
pub fn prune_expired(previews: &mut Vec<RoutePreview>, now_ms: f64) {
    previews.retain(|p| now_ms - p.created_at_ms < ROUTE_PREVIEW_TTL_MS);
}
