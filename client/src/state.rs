use std::collections::{HashMap, HashSet};

use arcturus_shared::{
    Fleet, FleetOrder, GalaxyDelta, GalaxySnapshot, Hyperlane, Planet, StarSystem, TradeRoute,
};

use crate::pathfind;

/// All entity data the renderer reads, pushed in through setters by the sync
/// collaborator (or a host app). The renderer itself never mutates entities;
/// every field is private and read through narrow accessors so draw passes
/// can take `&GalaxyState` without reaching into ambient globals.
#[derive(Clone, Default)]
pub struct GalaxyState {
    systems: Vec<StarSystem>,
    system_index: HashMap<String, usize>,
    planets: Vec<Planet>,
    hyperlanes: Vec<Hyperlane>,
    adjacency: HashMap<String, Vec<String>>,
    fleets: Vec<Fleet>,
    orders: Vec<FleetOrder>,
    active_order_index: HashMap<String, usize>,
    trades: Vec<TradeRoute>,
    current_tick: i64,
    current_user_id: Option<String>,
}

impl GalaxyState {
    // --- setters (the external input surface) ---

    pub fn set_systems(&mut self, systems: Vec<StarSystem>) {
        self.system_index = systems
            .iter()
            .enumerate()
            .map(|(idx, s)| (s.id.clone(), idx))
            .collect();
        self.systems = systems;
    }

    pub fn set_planets(&mut self, planets: Vec<Planet>) {
        self.planets = planets;
    }

    pub fn set_hyperlanes(&mut self, hyperlanes: Vec<Hyperlane>) {
        self.adjacency = pathfind::build_adjacency(&hyperlanes);
        self.hyperlanes = hyperlanes;
    }

    pub fn set_fleets(&mut self, fleets: Vec<Fleet>) {
        self.fleets = fleets;
    }

    pub fn set_orders(&mut self, orders: Vec<FleetOrder>) {
        // First active order per fleet wins; finished orders stay in the
        // list for route-history display but never drive movement.
        self.active_order_index.clear();
        for (idx, order) in orders.iter().enumerate() {
            if order.is_active() && !self.active_order_index.contains_key(&order.fleet_id) {
                self.active_order_index.insert(order.fleet_id.clone(), idx);
            }
        }
        self.orders = orders;
    }

    pub fn set_trades(&mut self, trades: Vec<TradeRoute>) {
        self.trades = trades;
    }

    pub fn set_current_tick(&mut self, tick: i64) {
        self.current_tick = tick;
    }

    pub fn set_current_user_id(&mut self, user_id: Option<String>) {
        self.current_user_id = user_id;
    }

    /// Replace everything from a full snapshot.
    pub fn apply_snapshot(&mut self, snapshot: GalaxySnapshot) {
        self.set_systems(snapshot.systems);
        self.set_planets(snapshot.planets);
        self.set_hyperlanes(snapshot.hyperlanes);
        self.set_fleets(snapshot.fleets);
        self.set_orders(snapshot.orders);
        self.set_trades(snapshot.trades);
        self.set_current_tick(snapshot.tick);
    }

    /// Apply an incremental update: fleets and orders are replaced wholesale,
    /// systems and planets are merged by id.
    pub fn apply_delta(&mut self, delta: GalaxyDelta) {
        self.set_current_tick(delta.tick);
        for system in delta.systems {
            match self.system_index.get(&system.id) {
                Some(&idx) => self.systems[idx] = system,
                None => {
                    self.system_index.insert(system.id.clone(), self.systems.len());
                    self.systems.push(system);
                }
            }
        }
        for planet in delta.planets {
            match self.planets.iter_mut().find(|p| p.id == planet.id) {
                Some(existing) => *existing = planet,
                None => self.planets.push(planet),
            }
        }
        self.set_fleets(delta.fleets);
        self.set_orders(delta.orders);
    }

    // --- accessors ---

    pub fn systems(&self) -> &[StarSystem] {
        &self.systems
    }

    pub fn system(&self, id: &str) -> Option<&StarSystem> {
        self.system_index.get(id).map(|&idx| &self.systems[idx])
    }

    pub fn system_position(&self, id: &str) -> Option<(f64, f64)> {
        self.system(id).map(StarSystem::position)
    }

    pub fn fleets(&self) -> &[Fleet] {
        &self.fleets
    }

    pub fn fleet(&self, id: &str) -> Option<&Fleet> {
        self.fleets.iter().find(|f| f.id == id)
    }

    pub fn hyperlanes(&self) -> &[Hyperlane] {
        &self.hyperlanes
    }

    pub fn trades(&self) -> &[TradeRoute] {
        &self.trades
    }

    pub fn adjacency(&self) -> &HashMap<String, Vec<String>> {
        &self.adjacency
    }

    pub fn neighbors(&self, system_id: &str) -> &[String] {
        self.adjacency
            .get(system_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn active_order_for(&self, fleet_id: &str) -> Option<&FleetOrder> {
        self.active_order_index
            .get(fleet_id)
            .map(|&idx| &self.orders[idx])
    }

    pub fn planets_of<'a>(&'a self, system_id: &'a str) -> impl Iterator<Item = &'a Planet> {
        self.planets.iter().filter(move |p| p.system_id == system_id)
    }

    pub fn current_tick(&self) -> i64 {
        self.current_tick
    }

    pub fn current_user_id(&self) -> Option<&str> {
        self.current_user_id.as_deref()
    }

    /// Players holding at least one colonized planet — the set eligible to
    /// exert negative influence pressure.
    pub fn players_with_colonies(&self) -> HashSet<String> {
        self.planets
            .iter()
            .filter_map(|p| p.colonized_by.clone())
            .collect()
    }

    /// Distinct system owners, sorted for a stable border draw order.
    pub fn owners(&self) -> Vec<String> {
        let mut owners: Vec<String> = self
            .systems
            .iter()
            .filter_map(|s| s.owner_id.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        owners.sort();
        owners
    }

    pub fn owned_positions(&self, player_id: &str) -> Vec<(f64, f64)> {
        self.systems
            .iter()
            .filter(|s| s.owner_id.as_deref() == Some(player_id))
            .map(StarSystem::position)
            .collect()
    }

    /// World-space bounding box of all systems, or `None` when empty.
    pub fn bounding_box(&self) -> Option<(f64, f64, f64, f64)> {
        let first = self.systems.first()?;
        let mut bounds = (first.x, first.y, first.x, first.y);
        for s in &self.systems[1..] {
            bounds.0 = bounds.0.min(s.x);
            bounds.1 = bounds.1.min(s.y);
            bounds.2 = bounds.2.max(s.x);
            bounds.3 = bounds.3.max(s.y);
        }
        Some(bounds)
    }
}

#[cfg(test)]
mod tests {
    use arcturus_shared::OrderStatus;

    use super::*;

    fn sys(id: &str, x: f64, y: f64, owner: Option<&str>) -> StarSystem {
        StarSystem {
            id: id.into(),
            x,
            y,
            name: None,
            owner_id: owner.map(Into::into),
        }
    }

    fn order(fleet_id: &str, status: OrderStatus) -> FleetOrder {
        FleetOrder {
            fleet_id: fleet_id.into(),
            status,
            execute_at_tick: 10,
            travel_time_ticks: Some(2),
            route_path: None,
            current_hop: None,
            final_destination_id: None,
            created_at: None,
        }
    }

    #[test]
    fn system_lookup_goes_through_the_index() {
        let mut state = GalaxyState::default();
        state.set_systems(vec![sys("a", 1.0, 2.0, None), sys("b", 3.0, 4.0, None)]);
        assert_eq!(state.system("b").map(|s| s.position()), Some((3.0, 4.0)));
        assert_eq!(state.system_position("missing"), None);
    }

    #[test]
    fn active_order_skips_finished_ones() {
        let mut state = GalaxyState::default();
        state.set_orders(vec![
            order("f1", OrderStatus::Completed),
            order("f1", OrderStatus::Pending),
            order("f2", OrderStatus::Cancelled),
        ]);
        let active = state.active_order_for("f1").expect("pending order");
        assert_eq!(active.status, OrderStatus::Pending);
        assert!(state.active_order_for("f2").is_none());
    }

    #[test]
    fn players_with_colonies_come_from_planets_only() {
        let mut state = GalaxyState::default();
        state.set_systems(vec![sys("a", 0.0, 0.0, Some("red"))]);
        state.set_planets(vec![
            Planet {
                id: "p1".into(),
                system_id: "a".into(),
                colonized_by: Some("blue".into()),
            },
            Planet {
                id: "p2".into(),
                system_id: "a".into(),
                colonized_by: None,
            },
        ]);
        let active = state.players_with_colonies();
        assert!(active.contains("blue"));
        // Owning a system without a colonized planet is not enough.
        assert!(!active.contains("red"));
    }

    #[test]
    fn delta_merges_systems_and_replaces_fleets() {
        let mut state = GalaxyState::default();
        state.apply_snapshot(GalaxySnapshot {
            tick: 5,
            systems: vec![sys("a", 0.0, 0.0, None), sys("b", 10.0, 0.0, Some("red"))],
            fleets: vec![Fleet {
                id: "f1".into(),
                current_system: "a".into(),
                destination_system: None,
                owner_id: None,
            }],
            ..Default::default()
        });

        state.apply_delta(GalaxyDelta {
            tick: 6,
            systems: vec![sys("b", 10.0, 0.0, Some("blue")), sys("c", 20.0, 0.0, None)],
            fleets: Vec::new(),
            ..Default::default()
        });

        assert_eq!(state.current_tick(), 6);
        assert_eq!(state.systems().len(), 3);
        assert_eq!(
            state.system("b").and_then(|s| s.owner_id.as_deref()),
            Some("blue")
        );
        assert!(state.fleets().is_empty());
    }

    #[test]
    fn owners_are_distinct_and_sorted() {
        let mut state = GalaxyState::default();
        state.set_systems(vec![
            sys("a", 0.0, 0.0, Some("zeta")),
            sys("b", 1.0, 0.0, Some("alpha")),
            sys("c", 2.0, 0.0, Some("zeta")),
            sys("d", 3.0, 0.0, None),
        ]);
        assert_eq!(state.owners(), vec!["alpha".to_string(), "zeta".to_string()]);
        assert_eq!(state.owned_positions("zeta").len(), 2);
    }

    #[test]
    fn bounding_box_spans_all_systems() {
        let mut state = GalaxyState::default();
        assert_eq!(state.bounding_box(), None);
        state.set_systems(vec![
            sys("a", -500.0, 200.0, None),
            sys("b", 300.0, -100.0, None),
        ]);
        assert_eq!(state.bounding_box(), Some((-500.0, -100.0, 300.0, 200.0)));
    }
}
