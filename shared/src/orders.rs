use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fallback travel time when an order arrives without one, so progress math
/// never divides by zero.
pub const DEFAULT_TRAVEL_TICKS: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

/// A movement order driving fleet interpolation and multi-hop route display.
/// `route_path` holds the full ordered system-id list for multi-hop routes;
/// `route_path.len() - 1` is the total hop count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetOrder {
    pub fleet_id: String,
    pub status: OrderStatus,
    pub execute_at_tick: i64,
    #[serde(default)]
    pub travel_time_ticks: Option<i64>,
    #[serde(default)]
    pub route_path: Option<Vec<String>>,
    #[serde(default)]
    pub current_hop: Option<usize>,
    #[serde(default)]
    pub final_destination_id: Option<String>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl FleetOrder {
    /// An order still driving movement. Completed/failed/cancelled orders are
    /// kept in the feed for a while but no longer animate anything.
    pub fn is_active(&self) -> bool {
        matches!(self.status, OrderStatus::Pending | OrderStatus::Processing)
    }

    /// Travel time with the non-positive/missing fallback applied.
    pub fn effective_travel_ticks(&self) -> i64 {
        match self.travel_time_ticks {
            Some(t) if t > 0 => t,
            _ => DEFAULT_TRAVEL_TICKS,
        }
    }

    pub fn ticks_remaining(&self, current_tick: i64) -> i64 {
        (self.execute_at_tick - current_tick).max(0)
    }

    /// Fraction of the active hop already traveled, in `[0, 1]`. Clamped even
    /// when a stale tick has overshot `execute_at_tick`.
    pub fn progress(&self, current_tick: i64) -> f64 {
        let travel = self.effective_travel_ticks();
        let remaining = self.ticks_remaining(current_tick);
        ((travel - remaining) as f64 / travel as f64).clamp(0.0, 1.0)
    }

    pub fn total_hops(&self) -> usize {
        match &self.route_path {
            Some(path) if path.len() > 1 => path.len() - 1,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(execute_at_tick: i64, travel_time_ticks: Option<i64>) -> FleetOrder {
        FleetOrder {
            fleet_id: "f1".into(),
            status: OrderStatus::Processing,
            execute_at_tick,
            travel_time_ticks,
            route_path: None,
            current_hop: None,
            final_destination_id: None,
            created_at: None,
        }
    }

    #[test]
    fn progress_clamps_when_tick_overshoots_arrival() {
        let o = order(10, Some(2));
        assert_eq!(o.progress(50), 1.0);
    }

    #[test]
    fn progress_at_departure_and_midpoint() {
        let o = order(20, Some(4));
        assert_eq!(o.progress(16), 0.0);
        assert_eq!(o.progress(18), 0.5);
        assert_eq!(o.progress(20), 1.0);
    }

    #[test]
    fn missing_travel_time_defaults_to_two_ticks() {
        let o = order(10, None);
        assert_eq!(o.effective_travel_ticks(), DEFAULT_TRAVEL_TICKS);
        // Never a division by zero, even for a nonsense payload.
        let zero = order(10, Some(0));
        assert_eq!(zero.effective_travel_ticks(), DEFAULT_TRAVEL_TICKS);
        assert!(zero.progress(9).is_finite());
    }

    #[test]
    fn total_hops_counts_route_segments() {
        let mut o = order(10, Some(2));
        assert_eq!(o.total_hops(), 1);
        o.route_path = Some(vec!["a".into(), "b".into(), "c".into(), "d".into()]);
        assert_eq!(o.total_hops(), 3);
    }

    #[test]
    fn status_uses_lowercase_wire_names() {
        let o: FleetOrder = serde_json::from_str(
            r#"{"fleet_id":"f1","status":"pending","execute_at_tick":12}"#,
        )
        .expect("minimal order");
        assert_eq!(o.status, OrderStatus::Pending);
        assert!(o.is_active());
        assert_eq!(o.travel_time_ticks, None);
    }
}
