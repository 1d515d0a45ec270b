use std::cell::{Cell, RefCell};

use gloo_timers::callback::Interval;
use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use arcturus_shared::{GalaxyEvent, GalaxySnapshot, MoveOrderRequest};

use crate::state::GalaxyState;

/// The backend ticks every few seconds; polling at 2s keeps fleet progress
/// visibly smooth without hammering the API.
pub const POLL_INTERVAL_MS: u32 = 2_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Live,
    Reconnecting,
}

thread_local! {
    static POLL_HANDLE: RefCell<Option<Interval>> = const { RefCell::new(None) };
    static LAST_SEQ: Cell<u64> = const { Cell::new(0) };
}

/// Fetch the initial snapshot and start the update poll. Replaces any
/// previous polling interval (dropping an `Interval` cancels it).
/// `last_sync_at` receives the epoch second of each successful fetch.
pub fn connect(
    state: RwSignal<GalaxyState>,
    connection: RwSignal<ConnectionStatus>,
    last_sync_at: RwSignal<Option<i64>>,
) {
    connection.set(ConnectionStatus::Connecting);
    LAST_SEQ.set(0);

    spawn_local(async move {
        match fetch_snapshot().await {
            Ok(snapshot) => {
                state.update(|s| s.apply_snapshot(snapshot));
                connection.set(ConnectionStatus::Live);
                last_sync_at.set(Some(chrono::Utc::now().timestamp()));
            }
            Err(e) => {
                connection.set(ConnectionStatus::Reconnecting);
                web_sys::console::warn_1(&format!("galaxy snapshot fetch failed: {e}").into());
            }
        }
    });

    let interval = Interval::new(POLL_INTERVAL_MS, move || {
        poll_updates(state, connection, last_sync_at);
    });
    POLL_HANDLE.with(|slot| {
        *slot.borrow_mut() = Some(interval);
    });
}

pub fn disconnect() {
    POLL_HANDLE.with(|slot| {
        slot.borrow_mut().take();
    });
}

fn poll_updates(
    state: RwSignal<GalaxyState>,
    connection: RwSignal<ConnectionStatus>,
    last_sync_at: RwSignal<Option<i64>>,
) {
    let since_tick = state.with_untracked(|s| s.current_tick());
    spawn_local(async move {
        match fetch_updates(since_tick).await {
            Ok(event) => {
                apply_event(state, event);
                connection.set(ConnectionStatus::Live);
                last_sync_at.set(Some(chrono::Utc::now().timestamp()));
            }
            Err(e) => {
                connection.set(ConnectionStatus::Reconnecting);
                web_sys::console::warn_1(&format!("galaxy update poll failed: {e}").into());
            }
        }
    });
}

/// Apply a wire event, dropping responses that arrive out of order
/// (`seq` below the last applied one; `seq == 0` means an unsequenced feed
/// and is always applied).
fn apply_event(state: RwSignal<GalaxyState>, event: GalaxyEvent) {
    let seq = match &event {
        GalaxyEvent::Snapshot { seq, .. } | GalaxyEvent::Update { seq, .. } => *seq,
    };
    if seq > 0 && seq < LAST_SEQ.get() {
        return;
    }
    if seq > 0 {
        LAST_SEQ.set(seq);
    }

    match event {
        GalaxyEvent::Snapshot { state: snapshot, .. } => {
            state.update(|s| s.apply_snapshot(snapshot));
        }
        GalaxyEvent::Update { changes, .. } => {
            state.update(|s| s.apply_delta(changes));
        }
    }
}

async fn fetch_snapshot() -> Result<GalaxySnapshot, String> {
    let resp = gloo_net::http::Request::get("/api/galaxy/state")
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;
    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }
    resp.json::<GalaxySnapshot>()
        .await
        .map_err(|e| format!("parse error: {e}"))
}

/// The updates endpoint answers with an `Update` delta, or a full `Snapshot`
/// when the client's tick is too far behind to delta against.
async fn fetch_updates(since_tick: i64) -> Result<GalaxyEvent, String> {
    let url = format!("/api/galaxy/updates?since_tick={since_tick}");
    let resp = gloo_net::http::Request::get(&url)
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;
    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }
    resp.json::<GalaxyEvent>()
        .await
        .map_err(|e| format!("parse error: {e}"))
}

/// Submit a movement order. The route is an ordered system-id list from the
/// pathfinder; a two-entry route is a direct order. The backend answers with
/// updated orders on the next poll, so there is nothing to apply here.
pub async fn submit_move_order(request: MoveOrderRequest) -> Result<(), String> {
    let resp = gloo_net::http::Request::post("/api/fleet/orders")
        .json(&request)
        .map_err(|e| format!("encode error: {e}"))?
        .send()
        .await
        .map_err(|e| format!("submit error: {e}"))?;
    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }
    Ok(())
}
