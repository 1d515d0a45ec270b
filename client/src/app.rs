use std::cell::RefCell;

use gloo_storage::Storage;
use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;

use arcturus_shared::MoveOrderRequest;

use crate::camera::Camera;
use crate::canvas::MapCanvas;
use crate::events::{EventHub, MapEvent};
use crate::fleet::RoutePreview;
use crate::pathfind;
use crate::spatial;
use crate::state::GalaxyState;
use crate::sync::{self, ConnectionStatus};

/// Newtype wrappers so same-shaped signals stay distinct in Leptos context.
#[derive(Clone, Copy)]
pub(crate) struct HoveredSystem(pub RwSignal<Option<String>>);
#[derive(Clone, Copy)]
pub(crate) struct SelectedSystem(pub RwSignal<Option<String>>);
#[derive(Clone, Copy)]
pub(crate) struct SelectedFleet(pub RwSignal<Option<String>>);
#[derive(Clone, Copy)]
pub(crate) struct RoutePreviews(pub RwSignal<Vec<RoutePreview>>);
#[derive(Clone, Copy)]
pub(crate) struct ShowLanes(pub RwSignal<bool>);
#[derive(Clone, Copy)]
pub(crate) struct ShowTrades(pub RwSignal<bool>);
#[derive(Clone, Copy)]
pub(crate) struct ShowBorders(pub RwSignal<bool>);
#[derive(Clone, Copy)]
pub(crate) struct ShowNames(pub RwSignal<bool>);

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
struct Settings {
    show_lanes: bool,
    show_trades: bool,
    show_borders: bool,
    show_names: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_lanes: true,
            show_trades: false,
            show_borders: true,
            show_names: true,
        }
    }
}

struct KeydownBinding {
    window: web_sys::Window,
    _handler: wasm_bindgen::closure::Closure<dyn Fn(web_sys::KeyboardEvent)>,
}

thread_local! {
    static KEYDOWN_BINDING: RefCell<Option<KeydownBinding>> = const { RefCell::new(None) };
    static CLOCK_INTERVAL: RefCell<Option<gloo_timers::callback::Interval>> =
        const { RefCell::new(None) };
}

/// Current player identity from the host page's query string, e.g.
/// `?player=empire-7`. Stands in for the auth collaborator.
fn player_from_query(search: &str) -> Option<String> {
    search
        .trim_start_matches('?')
        .split('&')
        .find_map(|pair| pair.strip_prefix("player="))
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// The connected neighbor of `from_id` lying in the screen-space octant of
/// the given arrow direction, nearest first.
fn octant_neighbor(
    state: &GalaxyState,
    camera: &Camera,
    from_id: &str,
    dir: (f64, f64),
) -> Option<String> {
    let (wx, wy) = state.system_position(from_id)?;
    let origin = camera.world_to_screen(wx, wy);

    let mut ids: Vec<&String> = Vec::new();
    let mut points: Vec<(f64, f64)> = Vec::new();
    for neighbor in state.neighbors(from_id) {
        let Some((nx, ny)) = state.system_position(neighbor) else {
            continue;
        };
        ids.push(neighbor);
        points.push(camera.world_to_screen(nx, ny));
    }

    spatial::nearest_in_octant(&points, origin, dir).map(|idx| ids[idx].clone())
}

/// Pathfind and submit a movement order, leaving an ephemeral route preview
/// behind. An unreachable target is reported, never retried.
fn handle_move_request(
    state: RwSignal<GalaxyState>,
    route_previews: RwSignal<Vec<RoutePreview>>,
    status_note: RwSignal<Option<String>>,
    fleet_id: &str,
    from_system: &str,
    to_system_id: &str,
    to_label: &str,
) {
    // A directly-connected target is a single-hop order; anything else goes
    // through BFS for a minimum-hop route.
    let path = state.with_untracked(|st| {
        if pathfind::are_connected(st.hyperlanes(), from_system, to_system_id) {
            Some(vec![from_system.to_string(), to_system_id.to_string()])
        } else {
            pathfind::find_path(st.adjacency(), from_system, to_system_id)
        }
    });
    let Some(path) = path else {
        status_note.set(Some(format!("No route to {to_label}")));
        web_sys::console::warn_1(
            &format!("no route from {from_system} to {to_system_id} within hop bound").into(),
        );
        return;
    };
    if path.len() < 2 {
        return;
    }

    route_previews.update(|previews| {
        previews.push(RoutePreview {
            path: path.clone(),
            created_at_ms: js_sys::Date::now(),
        });
    });
    status_note.set(Some(format!(
        "Moving to {to_label} ({} hops)",
        path.len() - 1
    )));

    let request = MoveOrderRequest {
        fleet_id: fleet_id.to_string(),
        final_destination_id: to_system_id.to_string(),
        route_path: path,
    };
    spawn_local(async move {
        if let Err(e) = sync::submit_move_order(request).await {
            web_sys::console::warn_1(&format!("fleet order submission failed: {e}").into());
        }
    });
}

/// Root component: owns the global signals, wires the sync collaborator and
/// event-hub consumers, and binds keyboard shortcuts.
#[component]
pub fn App() -> impl IntoView {
    let state: RwSignal<GalaxyState> = RwSignal::new(GalaxyState::default());
    let camera: RwSignal<Camera> = RwSignal::new(Camera::default());
    let hovered: RwSignal<Option<String>> = RwSignal::new(None);
    let selected_system: RwSignal<Option<String>> = RwSignal::new(None);
    let selected_fleet: RwSignal<Option<String>> = RwSignal::new(None);
    let route_previews: RwSignal<Vec<RoutePreview>> = RwSignal::new(Vec::new());
    let connection: RwSignal<ConnectionStatus> = RwSignal::new(ConnectionStatus::Connecting);
    let status_note: RwSignal<Option<String>> = RwSignal::new(None);
    let last_sync_at: RwSignal<Option<i64>> = RwSignal::new(None);
    // Epoch-second clock driving the "synced Ns ago" readout.
    let clock: RwSignal<i64> = RwSignal::new(chrono::Utc::now().timestamp());

    let saved: Settings = gloo_storage::LocalStorage::get("arcturus_settings").unwrap_or_default();
    let show_lanes: RwSignal<bool> = RwSignal::new(saved.show_lanes);
    let show_trades: RwSignal<bool> = RwSignal::new(saved.show_trades);
    let show_borders: RwSignal<bool> = RwSignal::new(saved.show_borders);
    let show_names: RwSignal<bool> = RwSignal::new(saved.show_names);

    let events = EventHub::new();

    provide_context(state);
    provide_context(camera);
    provide_context(HoveredSystem(hovered));
    provide_context(SelectedSystem(selected_system));
    provide_context(SelectedFleet(selected_fleet));
    provide_context(RoutePreviews(route_previews));
    provide_context(ShowLanes(show_lanes));
    provide_context(ShowTrades(show_trades));
    provide_context(ShowBorders(show_borders));
    provide_context(ShowNames(show_names));
    provide_context(events.clone());

    // Consume map events: selection feedback and order submission.
    events.subscribe(move |event| match event {
        MapEvent::SystemSelected {
            system, planets, ..
        } => {
            status_note.set(Some(format!(
                "{} — {} planet(s)",
                system.label(),
                planets.len()
            )));
        }
        MapEvent::FleetSelected { fleet, .. } => {
            status_note.set(Some(format!("Fleet {} selected", fleet.id)));
        }
        MapEvent::FleetMoveRequested {
            fleet, to_system, ..
        } => {
            handle_move_request(
                state,
                route_previews,
                status_note,
                &fleet.id,
                &fleet.current_system,
                &to_system.id,
                to_system.label(),
            );
        }
        MapEvent::MapClickedEmpty => {
            status_note.set(None);
        }
        MapEvent::SystemContextRequested { system, .. } => {
            status_note.set(Some(format!("Context: {}", system.label())));
        }
    });

    // Persist settings to localStorage on any change
    Effect::new(move || {
        let settings = Settings {
            show_lanes: show_lanes.get(),
            show_trades: show_trades.get(),
            show_borders: show_borders.get(),
            show_names: show_names.get(),
        };
        let _ = gloo_storage::LocalStorage::set("arcturus_settings", &settings);
    });

    // Connect the data feed on mount
    Effect::new(move || {
        sync::connect(state, connection, last_sync_at);
        on_cleanup(|| {
            sync::disconnect();
        });
    });

    // 1-second wall-clock interval; replaced wholesale on re-run.
    Effect::new(move || {
        let interval = gloo_timers::callback::Interval::new(1_000, move || {
            clock.set(chrono::Utc::now().timestamp());
        });
        CLOCK_INTERVAL.with(|slot| {
            *slot.borrow_mut() = Some(interval);
        });
    });

    // Player identity from the page URL, until auth hands over a real one.
    Effect::new(move || {
        let player = web_sys::window()
            .and_then(|w| w.location().search().ok())
            .and_then(|search| player_from_query(&search));
        if player.is_some() {
            state.update(|st| st.set_current_user_id(player.clone()));
        }
    });

    // Global keyboard shortcuts
    let key_events = events.clone();
    Effect::new(move || {
        use wasm_bindgen::prelude::*;

        let Some(window) = web_sys::window() else {
            return;
        };

        KEYDOWN_BINDING.with(|slot| {
            if let Some(old) = slot.borrow_mut().take() {
                let _ = old.window.remove_event_listener_with_callback(
                    "keydown",
                    old._handler.as_ref().unchecked_ref(),
                );
            }
        });

        let key_events = key_events.clone();
        let handler = Closure::<dyn Fn(web_sys::KeyboardEvent)>::new(
            move |e: web_sys::KeyboardEvent| {
                let key = e.key();
                match key.as_str() {
                    "Escape" => {
                        selected_system.set(None);
                        selected_fleet.set(None);
                        hovered.set(None);
                        status_note.set(None);
                    }
                    "l" => show_lanes.update(|v| *v = !*v),
                    "t" => show_trades.update(|v| *v = !*v),
                    "b" => show_borders.update(|v| *v = !*v),
                    "n" => show_names.update(|v| *v = !*v),
                    "+" | "=" => {
                        e.prevent_default();
                        camera.update(|cam| {
                            let (cx, cy) = (cam.width / 2.0, cam.height / 2.0);
                            cam.zoom_at(-120.0, cx, cy);
                        });
                    }
                    "-" => {
                        e.prevent_default();
                        camera.update(|cam| {
                            let (cx, cy) = (cam.width / 2.0, cam.height / 2.0);
                            cam.zoom_at(120.0, cx, cy);
                        });
                    }
                    "r" | "0" => {
                        let bbox = state.with_untracked(|st| st.bounding_box());
                        if let Some((min_x, min_y, max_x, max_y)) = bbox {
                            camera.update(|cam| cam.fit_to_bounds(min_x, min_y, max_x, max_y));
                        }
                    }
                    "ArrowLeft" | "ArrowRight" | "ArrowUp" | "ArrowDown" => {
                        e.prevent_default();
                        let dir = match key.as_str() {
                            "ArrowLeft" => (-1.0, 0.0),
                            "ArrowRight" => (1.0, 0.0),
                            "ArrowUp" => (0.0, -1.0),
                            _ => (0.0, 1.0),
                        };
                        let Some(from_id) = selected_system.get_untracked() else {
                            return;
                        };
                        let cam = camera.get_untracked();
                        let target = state
                            .with_untracked(|st| octant_neighbor(st, &cam, &from_id, dir));
                        let Some(target) = target else {
                            return;
                        };

                        // With a fleet selected, shift+arrow requests a move
                        // along that lane; plain arrows walk the selection.
                        if e.shift_key()
                            && let Some(fleet_id) = selected_fleet.get_untracked()
                        {
                            let pair = state.with_untracked(|st| {
                                st.fleet(&fleet_id).cloned().zip(st.system(&target).cloned())
                            });
                            if let Some((fleet, to_system)) = pair {
                                key_events.emit(&MapEvent::FleetMoveRequested {
                                    fleet,
                                    to_system,
                                    shift_key: true,
                                });
                            }
                            return;
                        }

                        let pos = state.with_untracked(|st| st.system_position(&target));
                        if let Some((wx, wy)) = pos {
                            selected_system.set(Some(target));
                            camera.update(|cam| cam.center_on(wx, wy));
                        }
                    }
                    _ => {}
                }
            },
        );

        if window
            .add_event_listener_with_callback("keydown", handler.as_ref().unchecked_ref())
            .is_ok()
        {
            KEYDOWN_BINDING.with(|slot| {
                *slot.borrow_mut() = Some(KeydownBinding {
                    window: window.clone(),
                    _handler: handler,
                });
            });
        }
    });

    view! {
        <div style="width: 100%; height: 100%; position: relative; overflow: hidden; background: #0b0e1a;">
            <MapCanvas />
            <div style="position: absolute; top: 10px; left: 12px; z-index: 5; pointer-events: none; font-family: 'JetBrains Mono', monospace; font-size: 0.72rem; color: #9a9fae; display: flex; gap: 12px; align-items: center;">
                <span style=move || format!(
                    "width: 8px; height: 8px; border-radius: 50%; background: {};",
                    match connection.get() {
                        ConnectionStatus::Live => "#57c76b",
                        ConnectionStatus::Connecting => "#f5c542",
                        ConnectionStatus::Reconnecting => "#d84a42",
                    }
                ) />
                <span>{move || format!("tick {}", state.with(|st| st.current_tick()))}</span>
                <span>{move || match last_sync_at.get() {
                    Some(at) => format!("synced {}s ago", (clock.get() - at).max(0)),
                    None => "awaiting data".to_string(),
                }}</span>
                {move || status_note.get().map(|note| view! {
                    <span style="color: #e2e0d8;">{note}</span>
                })}
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use arcturus_shared::{Hyperlane, StarSystem};

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

    fn lane(from: &str, to: &str) -> Hyperlane {
        Hyperlane {
            from_system: from.into(),
            to_system: to.into(),
        }
    }

    #[test]
    fn player_query_parsing() {
        assert_eq!(
            player_from_query("?player=empire-7"),
            Some("empire-7".to_string())
        );
        assert_eq!(
            player_from_query("?debug=1&player=empire-7"),
            Some("empire-7".to_string())
        );
        assert_eq!(player_from_query("?player="), None);
        assert_eq!(player_from_query(""), None);
    }

    #[test]
    fn octant_neighbor_walks_connected_systems_only() {
        let mut state = GalaxyState::default();
        state.set_systems(vec![
            sys("center", 0.0, 0.0),
            sys("east", 400.0, 0.0),
            sys("north", 0.0, -400.0),
            sys("unlinked-east", 200.0, 0.0),
        ]);
        state.set_hyperlanes(vec![lane("center", "east"), lane("center", "north")]);
        let camera = Camera::new(800.0, 600.0);

        // The nearer unlinked system is ignored; lanes decide reachability.
        assert_eq!(
            octant_neighbor(&state, &camera, "center", (1.0, 0.0)),
            Some("east".to_string())
        );
        assert_eq!(
            octant_neighbor(&state, &camera, "center", (0.0, -1.0)),
            Some("north".to_string())
        );
        assert_eq!(octant_neighbor(&state, &camera, "center", (0.0, 1.0)), None);
        assert_eq!(octant_neighbor(&state, &camera, "missing", (1.0, 0.0)), None);
    }
}
