use serde::{Deserialize, Serialize};

use crate::entities::{Fleet, Hyperlane, Planet, StarSystem, TradeRoute};
use crate::orders::FleetOrder;

/// Full galaxy state as served by the backend snapshot endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GalaxySnapshot {
    #[serde(default)]
    pub tick: i64,
    pub systems: Vec<StarSystem>,
    #[serde(default)]
    pub planets: Vec<Planet>,
    #[serde(default)]
    pub hyperlanes: Vec<Hyperlane>,
    #[serde(default)]
    pub fleets: Vec<Fleet>,
    #[serde(default)]
    pub orders: Vec<FleetOrder>,
    #[serde(default)]
    pub trades: Vec<TradeRoute>,
}

/// Incremental update: fleets/orders are replaced wholesale (they are small
/// and churn every tick), systems/planets carry only changed entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GalaxyDelta {
    #[serde(default)]
    pub tick: i64,
    #[serde(default)]
    pub systems: Vec<StarSystem>,
    #[serde(default)]
    pub planets: Vec<Planet>,
    #[serde(default)]
    pub fleets: Vec<Fleet>,
    #[serde(default)]
    pub orders: Vec<FleetOrder>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GalaxyEvent {
    Snapshot {
        #[serde(default)]
        seq: u64,
        state: GalaxySnapshot,
        timestamp: String,
    },
    Update {
        #[serde(default)]
        seq: u64,
        changes: GalaxyDelta,
        timestamp: String,
    },
}

/// Body of the order-submission POST. A single-hop move carries a two-entry
/// `route_path`; multi-hop routes list every system in travel order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveOrderRequest {
    pub fleet_id: String,
    pub route_path: Vec<String>,
    pub final_destination_id: String,
}
