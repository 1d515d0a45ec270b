use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, PointerEvent, WheelEvent};

use arcturus_shared::colors::{hsl_to_rgb, mix_hsl, rgb_to_hsl};
use arcturus_shared::FleetOrder;

use crate::app::{
    HoveredSystem, RoutePreviews, SelectedFleet, SelectedSystem, ShowBorders, ShowLanes,
    ShowNames, ShowTrades,
};
use crate::camera::Camera;
use crate::colors::{brighten, rgba_css, PaletteCache};
use crate::contour::{cache_key, extract_contours, ContourCache};
use crate::events::{EventHub, MapEvent};
use crate::fleet::{self, DrawnFleet, HopState, RoutePreview};
use crate::influence::{InfluenceField, WorldRect, FALLOFF_RADIUS};
use crate::render_loop::RenderScheduler;
use crate::spatial;
use crate::state::GalaxyState;

/// Click vs drag discrimination threshold, screen pixels.
const CLICK_SLOP_PX: f64 = 5.0;
/// World-unit period of the procedural starfield tiling.
const STAR_CELL: f64 = 250.0;
/// Skip the starfield entirely past this many visible cells (extreme zoom-out).
const STAR_CELL_BUDGET: i64 = 40_000;
/// Zoom level above which system name labels appear.
const NAME_LABEL_MIN_ZOOM: f64 = 0.35;
/// Period of the active-hop route pulse, milliseconds.
const ROUTE_PULSE_PERIOD_MS: f64 = 900.0;

fn render_scale() -> f64 {
    web_sys::window()
        .map(|w| w.device_pixel_ratio())
        .unwrap_or(1.0)
        .max(1.0)
}

/// Quick FNV-style hash for starfield cells and lane-edge dedup.
fn hash_pair(a: u64, b: u64) -> u64 {
    let mut h: u64 = 0xcbf2_9ce4_8422_2325;
    for word in [a, b] {
        for byte in word.to_le_bytes() {
            h ^= byte as u64;
            h = h.wrapping_mul(1_099_511_628_211);
        }
    }
    h
}

fn hash_id(id: &str) -> u64 {
    let mut h: u64 = 5381;
    for b in id.bytes() {
        h = h.wrapping_mul(33).wrapping_add(b as u64);
    }
    h
}

fn set_dash(ctx: &CanvasRenderingContext2d, on: f64, off: f64) {
    let segments = js_sys::Array::new();
    segments.push(&JsValue::from_f64(on));
    segments.push(&JsValue::from_f64(off));
    ctx.set_line_dash(&segments).ok();
}

fn clear_dash(ctx: &CanvasRenderingContext2d) {
    ctx.set_line_dash(&js_sys::Array::new()).ok();
}

/// The single-canvas map renderer. Owns the 2D context exclusively: every
/// draw call happens inside the scheduler's render function, in fixed pass
/// order (background → lanes → borders → systems → fleets → overlay).
#[component]
pub fn MapCanvas() -> impl IntoView {
    let state: RwSignal<GalaxyState> = expect_context();
    let camera: RwSignal<Camera> = expect_context();
    let HoveredSystem(hovered) = expect_context();
    let SelectedSystem(selected_system) = expect_context();
    let SelectedFleet(selected_fleet) = expect_context();
    let RoutePreviews(route_previews) = expect_context();
    let ShowLanes(show_lanes) = expect_context();
    let ShowTrades(show_trades) = expect_context();
    let ShowBorders(show_borders) = expect_context();
    let ShowNames(show_names) = expect_context();
    let events: EventHub = expect_context();

    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();

    // Drag state
    let is_dragging = Rc::new(Cell::new(false));
    let drag_start_x = Rc::new(Cell::new(0.0f64));
    let drag_start_y = Rc::new(Cell::new(0.0f64));
    let last_x = Rc::new(Cell::new(0.0f64));
    let last_y = Rc::new(Cell::new(0.0f64));

    // Frame-local and cross-frame render caches
    let contour_cache: Rc<RefCell<ContourCache>> = Rc::new(RefCell::new(ContourCache::new()));
    let palettes: Rc<RefCell<PaletteCache>> = Rc::new(RefCell::new(PaletteCache::default()));
    let drawn_fleets: Rc<RefCell<Vec<DrawnFleet>>> = Rc::new(RefCell::new(Vec::new()));
    let drawn_for_click = drawn_fleets.clone();
    // Ids already reported as unresolvable, so a broken fleet warns once,
    // not sixty times a second.
    let missing_warned: Rc<RefCell<HashSet<String>>> = Rc::new(RefCell::new(HashSet::new()));
    let missing_warned_state = missing_warned.clone();

    // Cached Canvas 2D context (invalidated on canvas resize)
    let cached_ctx: Rc<RefCell<Option<CanvasRenderingContext2d>>> = Rc::new(RefCell::new(None));

    // Fit bounds on first data load
    let fitted = Rc::new(Cell::new(false));
    let fitted_render = fitted.clone();

    let scheduler = {
        let contour_cache = contour_cache.clone();
        let palettes = palettes.clone();
        let drawn_fleets = drawn_fleets.clone();
        let missing_warned = missing_warned.clone();
        let cached_ctx = cached_ctx.clone();
        RenderScheduler::new(move |dt_ms| {
            let Some(canvas_el) = canvas_ref.get_untracked() else {
                return false;
            };
            let canvas: &HtmlCanvasElement = &canvas_el;
            let Some(parent) = canvas.parent_element() else {
                return false;
            };
            let w = parent.client_width() as f64;
            let h = parent.client_height() as f64;
            if w <= 0.0 || h <= 0.0 {
                return false;
            }

            let scale = render_scale();
            let pw = (w * scale).round().max(1.0) as u32;
            let ph = (h * scale).round().max(1.0) as u32;
            if canvas.width() != pw || canvas.height() != ph {
                canvas.set_width(pw);
                canvas.set_height(ph);
                // Canvas resize resets 2D context state — invalidate cache
                *cached_ctx.borrow_mut() = None;
            }

            let ctx = {
                let mut ctx_cache = cached_ctx.borrow_mut();
                if ctx_cache.is_none() {
                    let Some(ctx) = canvas
                        .get_context("2d")
                        .ok()
                        .flatten()
                        .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
                    else {
                        return false;
                    };
                    // All drawing stays in CSS pixel coordinates.
                    ctx.scale(scale, scale).ok();
                    *ctx_cache = Some(ctx);
                }
                let Some(ctx) = ctx_cache.clone() else {
                    return false;
                };
                ctx
            };

            // Camera update happens-before drawing.
            camera.update_untracked(|cam| {
                cam.set_surface_size(w, h);
                cam.ease(dt_ms);
            });

            // Auto-fit on first data load
            if !fitted_render.get() {
                let bbox = state.with_untracked(|st| st.bounding_box());
                if let Some((min_x, min_y, max_x, max_y)) = bbox {
                    fitted_render.set(true);
                    camera.update_untracked(|cam| cam.fit_to_bounds(min_x, min_y, max_x, max_y));
                }
            }

            let now_ms = js_sys::Date::now();
            // Expire route previews by timestamp; this per-frame filter is
            // the only cancellation mechanism they have.
            route_previews.update_untracked(|p| fleet::prune_expired(p, now_ms));

            let cam = camera.get_untracked();
            let hov = hovered.get_untracked();
            let sel_system = selected_system.get_untracked();
            let sel_fleet = selected_fleet.get_untracked();

            let mut pulsing = false;
            state.with_untracked(|st| {
                render_background(&ctx, w, h, &cam);
                if show_lanes.get_untracked() {
                    render_hyperlanes(&ctx, w, h, &cam, st);
                }
                if show_trades.get_untracked() {
                    render_trade_routes(&ctx, &cam, st);
                }
                if show_borders.get_untracked() {
                    render_borders(
                        &ctx,
                        &cam,
                        st,
                        &mut contour_cache.borrow_mut(),
                        &mut palettes.borrow_mut(),
                    );
                }
                render_systems(&ctx, w, h, &cam, st, SystemPassStyle {
                    hovered: hov.as_deref(),
                    selected: sel_system.as_deref(),
                    show_names: show_names.get_untracked(),
                    palettes: &mut palettes.borrow_mut(),
                });
                let mut drawn = drawn_fleets.borrow_mut();
                drawn.clear();
                pulsing = render_fleets(FleetPassInput {
                    ctx: &ctx,
                    w,
                    h,
                    cam: &cam,
                    state: st,
                    selected_fleet: sel_fleet.as_deref(),
                    now_ms,
                    drawn: &mut drawn,
                    missing_warned: &mut missing_warned.borrow_mut(),
                    palettes: &mut palettes.borrow_mut(),
                });
                drop(drawn);
                route_previews.with_untracked(|previews| {
                    render_previews(&ctx, &cam, st, previews, now_ms);
                    pulsing = pulsing || !previews.is_empty();
                });
            });

            camera.with_untracked(|cam| cam.is_moving()) || pulsing
        })
    };
    let scheduler = Rc::new(scheduler);
    scheduler.start();
    {
        let scheduler = scheduler.clone();
        on_cleanup(move || scheduler.stop());
    }

    // Entity/settings changes invalidate the frame (contour invalidation is
    // key-driven inside the border pass, nothing to flush here).
    let sched_state = scheduler.clone();
    Effect::new(move || {
        state.track();
        show_lanes.track();
        show_trades.track();
        show_borders.track();
        show_names.track();
        missing_warned_state.borrow_mut().clear();
        sched_state.mark_dirty();
    });

    let sched_cam = scheduler.clone();
    Effect::new(move || {
        camera.track();
        sched_cam.mark_dirty();
    });

    let sched_sel = scheduler.clone();
    Effect::new(move || {
        hovered.track();
        selected_system.track();
        selected_fleet.track();
        sched_sel.mark_dirty();
    });

    let sched_previews = scheduler.clone();
    Effect::new(move || {
        route_previews.track();
        sched_previews.mark_dirty();
    });

    // --- Input handlers ---

    let on_wheel = move |e: WheelEvent| {
        e.prevent_default();
        let delta = e.delta_y();
        let x = e.offset_x() as f64;
        let y = e.offset_y() as f64;
        camera.update(|cam| cam.zoom_at(delta, x, y));
    };

    let on_pointer_down = {
        let is_dragging = is_dragging.clone();
        let drag_start_x = drag_start_x.clone();
        let drag_start_y = drag_start_y.clone();
        let last_x = last_x.clone();
        let last_y = last_y.clone();
        move |e: PointerEvent| {
            if e.button() != 0 {
                return;
            }
            is_dragging.set(true);
            hovered.set(None);
            drag_start_x.set(e.client_x() as f64);
            drag_start_y.set(e.client_y() as f64);
            last_x.set(e.client_x() as f64);
            last_y.set(e.client_y() as f64);

            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.set_pointer_capture(e.pointer_id()).ok();
                el.style().set_property("cursor", "grabbing").ok();
            }
        }
    };

    let on_pointer_move = {
        let is_dragging = is_dragging.clone();
        let last_x = last_x.clone();
        let last_y = last_y.clone();
        move |e: PointerEvent| {
            if is_dragging.get() {
                let dx = e.client_x() as f64 - last_x.get();
                let dy = e.client_y() as f64 - last_y.get();
                last_x.set(e.client_x() as f64);
                last_y.set(e.client_y() as f64);
                camera.update(|cam| cam.pan_screen(dx, dy));
            } else {
                let cam = camera.get_untracked();
                let (wx, wy) = cam.screen_to_world(e.offset_x() as f64, e.offset_y() as f64);
                let hit = state.with_untracked(|st| {
                    spatial::system_at(st.systems(), wx, wy).map(|s| s.id.clone())
                });
                if hit != hovered.get_untracked() {
                    hovered.set(hit);
                }
            }
        }
    };

    let on_pointer_up = {
        let is_dragging = is_dragging.clone();
        move |e: PointerEvent| {
            is_dragging.set(false);
            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.style().set_property("cursor", "grab").ok();
            }
        }
    };

    let on_pointer_leave = move |_: PointerEvent| {
        if hovered.get_untracked().is_some() {
            hovered.set(None);
        }
    };

    let on_click = {
        let drag_start_x = drag_start_x.clone();
        let drag_start_y = drag_start_y.clone();
        let events = events.clone();
        move |e: MouseEvent| {
            let dx = (e.client_x() as f64 - drag_start_x.get()).abs();
            let dy = (e.client_y() as f64 - drag_start_y.get()).abs();
            if dx >= CLICK_SLOP_PX || dy >= CLICK_SLOP_PX {
                return;
            }

            let cam = camera.get_untracked();
            let (wx, wy) = cam.screen_to_world(e.offset_x() as f64, e.offset_y() as f64);
            let screen_x = e.client_x() as f64;
            let screen_y = e.client_y() as f64;

            let system_hit =
                state.with_untracked(|st| spatial::system_at(st.systems(), wx, wy).cloned());

            // Shift-click with a fleet selected: movement request, not selection.
            if e.shift_key()
                && let Some(fleet_id) = selected_fleet.get_untracked()
                && let Some(to_system) = system_hit.clone()
            {
                let fleet = state.with_untracked(|st| st.fleet(&fleet_id).cloned());
                if let Some(fleet) = fleet {
                    events.emit(&MapEvent::FleetMoveRequested {
                        fleet,
                        to_system,
                        shift_key: true,
                    });
                    return;
                }
            }

            let fleet_hit = spatial::fleet_at(&drawn_for_click.borrow(), wx, wy)
                .map(|d| d.fleet_id.clone());
            if let Some(fleet_id) = fleet_hit {
                let fleet = state.with_untracked(|st| st.fleet(&fleet_id).cloned());
                if let Some(fleet) = fleet {
                    selected_fleet.set(Some(fleet.id.clone()));
                    events.emit(&MapEvent::FleetSelected {
                        fleet,
                        screen_x,
                        screen_y,
                    });
                    return;
                }
            }

            if let Some(system) = system_hit {
                let planets =
                    state.with_untracked(|st| st.planets_of(&system.id).cloned().collect());
                selected_system.set(Some(system.id.clone()));
                events.emit(&MapEvent::SystemSelected {
                    system,
                    planets,
                    screen_x,
                    screen_y,
                });
                return;
            }

            selected_system.set(None);
            selected_fleet.set(None);
            events.emit(&MapEvent::MapClickedEmpty);
        }
    };

    let on_context_menu = {
        let events = events.clone();
        move |e: MouseEvent| {
            e.prevent_default();
            let cam = camera.get_untracked();
            let (wx, wy) = cam.screen_to_world(e.offset_x() as f64, e.offset_y() as f64);
            let hit = state.with_untracked(|st| spatial::system_at(st.systems(), wx, wy).cloned());
            if let Some(system) = hit {
                events.emit(&MapEvent::SystemContextRequested {
                    system,
                    screen_x: e.client_x() as f64,
                    screen_y: e.client_y() as f64,
                });
            }
        }
    };

    view! {
        <div
            style="position: relative; width: 100%; height: 100%; overflow: hidden;"
            on:wheel=on_wheel
            on:pointerdown=on_pointer_down
            on:pointermove=on_pointer_move
            on:pointerup=on_pointer_up
            on:pointerleave=on_pointer_leave
            on:click=on_click
            on:contextmenu=on_context_menu
        >
            <canvas
                node_ref=canvas_ref
                style="position: absolute; inset: 0; width: 100%; height: 100%; touch-action: none; cursor: grab;"
            />
        </div>
    }
}

// --- Draw passes ---

/// Deep-space backdrop with a deterministic parallax starfield: star
/// placement hashes the world-space star cell, so stars stay put as the
/// camera moves.
fn render_background(ctx: &CanvasRenderingContext2d, w: f64, h: f64, cam: &Camera) {
    ctx.set_fill_style_str("#0b0e1a");
    ctx.fill_rect(0.0, 0.0, w, h);

    let (min_wx, min_wy) = cam.screen_to_world(0.0, 0.0);
    let (max_wx, max_wy) = cam.screen_to_world(w, h);
    let col_min = (min_wx / STAR_CELL).floor() as i64;
    let col_max = (max_wx / STAR_CELL).ceil() as i64;
    let row_min = (min_wy / STAR_CELL).floor() as i64;
    let row_max = (max_wy / STAR_CELL).ceil() as i64;
    if (col_max - col_min) * (row_max - row_min) > STAR_CELL_BUDGET {
        return;
    }

    for row in row_min..row_max {
        for col in col_min..col_max {
            let hash = hash_pair(col as u64, row as u64);
            let fx = ((hash >> 8) & 0xff) as f64 / 255.0;
            let fy = ((hash >> 16) & 0xff) as f64 / 255.0;
            let alpha = 0.18 + ((hash >> 24) & 0x3f) as f64 / 63.0 * 0.45;
            let wx = (col as f64 + fx) * STAR_CELL;
            let wy = (row as f64 + fy) * STAR_CELL;
            let (sx, sy) = cam.world_to_screen(wx, wy);
            ctx.set_fill_style_str(&rgba_css(210, 218, 236, alpha));
            ctx.fill_rect(sx, sy, 1.0, 1.0);
        }
    }
}

/// Hyperlanes as one batched stroke path: dedup each undirected edge, skip
/// lanes whose endpoints are off the same screen side.
fn render_hyperlanes(
    ctx: &CanvasRenderingContext2d,
    w: f64,
    h: f64,
    cam: &Camera,
    state: &GalaxyState,
) {
    let mut drawn_edges: HashSet<u64> = HashSet::new();

    ctx.set_stroke_style_str("rgba(130,150,190,0.16)");
    ctx.set_line_width(1.0);
    ctx.begin_path();

    for lane in state.hyperlanes() {
        let ha = hash_id(&lane.from_system);
        let hb = hash_id(&lane.to_system);
        let edge = if ha < hb {
            hash_pair(ha, hb)
        } else {
            hash_pair(hb, ha)
        };
        if !drawn_edges.insert(edge) {
            continue;
        }

        let (Some((ax, ay)), Some((bx, by))) = (
            state.system_position(&lane.from_system),
            state.system_position(&lane.to_system),
        ) else {
            continue;
        };
        let (ax, ay) = cam.world_to_screen(ax, ay);
        let (bx, by) = cam.world_to_screen(bx, by);

        let margin = 50.0;
        if (ax < -margin && bx < -margin)
            || (ay < -margin && by < -margin)
            || (ax > w + margin && bx > w + margin)
            || (ay > h + margin && by > h + margin)
        {
            continue;
        }

        ctx.move_to(ax, ay);
        ctx.line_to(bx, by);
    }

    ctx.stroke();
}

fn render_trade_routes(ctx: &CanvasRenderingContext2d, cam: &Camera, state: &GalaxyState) {
    if state.trades().is_empty() {
        return;
    }
    ctx.set_stroke_style_str("rgba(245,197,66,0.22)");
    ctx.set_line_width(1.0);
    set_dash(ctx, 3.0, 7.0);
    ctx.begin_path();
    for trade in state.trades() {
        let (Some((ax, ay)), Some((bx, by))) = (
            state.system_position(&trade.from_system),
            state.system_position(&trade.to_system),
        ) else {
            continue;
        };
        let (ax, ay) = cam.world_to_screen(ax, ay);
        let (bx, by) = cam.world_to_screen(bx, by);
        ctx.move_to(ax, ay);
        ctx.line_to(bx, by);
    }
    ctx.stroke();
    clear_dash(ctx);
}

/// Territorial borders: per owner, pull the contour set from the cache (key
/// misses recompute the influence field and re-extract) and draw each closed
/// polygon. Cached polygons are already in screen space for their key's
/// viewport bucket.
fn render_borders(
    ctx: &CanvasRenderingContext2d,
    cam: &Camera,
    state: &GalaxyState,
    cache: &mut ContourCache,
    palettes: &mut PaletteCache,
) {
    let own_id = state.current_user_id().map(str::to_string);
    let owners = state.owners();
    if owners.is_empty() {
        if !cache.is_empty() {
            cache.retain_players(|_| false);
        }
        return;
    }
    let alive: HashSet<&str> = owners.iter().map(String::as_str).collect();
    cache.retain_players(|player| alive.contains(player));

    let (min_wx, min_wy) = cam.screen_to_world(0.0, 0.0);
    let (max_wx, max_wy) = cam.screen_to_world(cam.width, cam.height);
    let visible = WorldRect {
        min_x: min_wx,
        min_y: min_wy,
        max_x: max_wx,
        max_y: max_wy,
    }
    .padded(FALLOFF_RADIUS);
    let rivals = state.players_with_colonies();

    for owner in &owners {
        let owned = state.owned_positions(owner);
        if owned.is_empty() {
            continue;
        }
        let key = cache_key(owner, &owned, cam);
        let contours = cache.get_or_compute(owner, key, || {
            let field = InfluenceField::compute(owner, visible, state.systems(), &rivals);
            extract_contours(&field, cam)
        });

        let palette = palettes.get(owner);
        for polygon in contours.iter() {
            let Some(&(first_x, first_y)) = polygon.first() else {
                continue;
            };
            ctx.begin_path();
            ctx.move_to(first_x, first_y);
            for &(x, y) in &polygon[1..] {
                ctx.line_to(x, y);
            }
            ctx.close_path();
            ctx.set_fill_style_str(&palette.territory_fill);
            ctx.fill();
            ctx.set_stroke_style_str(&palette.territory_border);
            // The viewing player's own border reads slightly heavier.
            ctx.set_line_width(if own_id.as_deref() == Some(owner.as_str()) {
                2.5
            } else {
                1.5
            });
            ctx.stroke();
        }
    }
}

struct SystemPassStyle<'a> {
    hovered: Option<&'a str>,
    selected: Option<&'a str>,
    show_names: bool,
    palettes: &'a mut PaletteCache,
}

fn render_systems(
    ctx: &CanvasRenderingContext2d,
    w: f64,
    h: f64,
    cam: &Camera,
    state: &GalaxyState,
    style: SystemPassStyle<'_>,
) {
    let radius = (14.0 * cam.zoom).clamp(2.5, 7.0);
    let tau = std::f64::consts::TAU;

    for system in state.systems() {
        let (sx, sy) = cam.world_to_screen(system.x, system.y);
        if sx < -30.0 || sy < -30.0 || sx > w + 30.0 || sy > h + 30.0 {
            continue;
        }

        let is_selected = style.selected == Some(system.id.as_str());
        let is_hovered = style.hovered == Some(system.id.as_str());

        // Ownership ring sits outside the glyph.
        if let Some(owner) = system.owner_id.as_deref() {
            let ring = if is_hovered {
                let (r, g, b) = style.palettes.get(owner).rgb;
                let (r, g, b) = brighten(r, g, b, 1.5);
                rgba_css(r, g, b, 1.0)
            } else {
                style.palettes.get(owner).system_ring.clone()
            };
            ctx.begin_path();
            ctx.arc(sx, sy, radius + 3.0, 0.0, tau).ok();
            ctx.set_stroke_style_str(&ring);
            ctx.set_line_width(1.5);
            ctx.stroke();
        }

        ctx.begin_path();
        ctx.arc(sx, sy, radius, 0.0, tau).ok();
        ctx.set_fill_style_str(if is_hovered {
            "rgba(240,240,234,0.95)"
        } else {
            "rgba(214,216,222,0.85)"
        });
        ctx.fill();

        if is_selected {
            ctx.begin_path();
            ctx.arc(sx, sy, radius + 7.0, 0.0, tau).ok();
            ctx.set_stroke_style_str("rgba(245,197,66,0.9)");
            ctx.set_line_width(2.0);
            ctx.stroke();
        }

        if style.show_names && cam.zoom >= NAME_LABEL_MIN_ZOOM {
            draw_haloed_text(
                ctx,
                system.label(),
                sx,
                sy + radius + 12.0,
                "11px 'JetBrains Mono', monospace",
                "rgba(220,224,232,0.85)",
            );
        }
    }
}

/// Text halo: thick dark stroke under a bright fill, for contrast over any
/// backdrop without shadow blur.
fn draw_haloed_text(
    ctx: &CanvasRenderingContext2d,
    text: &str,
    x: f64,
    y: f64,
    font: &str,
    fill: &str,
) {
    ctx.set_font(font);
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    ctx.set_line_join("round");
    ctx.set_line_width(3.0);
    ctx.set_stroke_style_str("rgba(8,10,18,0.9)");
    ctx.stroke_text(text, x, y).ok();
    ctx.set_fill_style_str(fill);
    ctx.fill_text(text, x, y).ok();
}

struct FleetPassInput<'a> {
    ctx: &'a CanvasRenderingContext2d,
    w: f64,
    h: f64,
    cam: &'a Camera,
    state: &'a GalaxyState,
    selected_fleet: Option<&'a str>,
    now_ms: f64,
    drawn: &'a mut Vec<DrawnFleet>,
    missing_warned: &'a mut HashSet<String>,
    palettes: &'a mut PaletteCache,
}

/// Fleet glyphs plus multi-hop route overlays. Returns `true` when anything
/// pulsing was drawn (keeps the scheduler animating).
fn render_fleets(input: FleetPassInput<'_>) -> bool {
    let FleetPassInput {
        ctx,
        w,
        h,
        cam,
        state,
        selected_fleet,
        now_ms,
        drawn,
        missing_warned,
        palettes,
    } = input;

    let tick = state.current_tick();
    let mut pulsing = false;

    for fleet_entry in state.fleets() {
        let order = state.active_order_for(&fleet_entry.id);
        let Some((wx, wy)) =
            fleet::draw_position(fleet_entry, order, tick, |id| state.system_position(id))
        else {
            // Unknown system reference: skip this frame, warn once per fleet.
            if missing_warned.insert(fleet_entry.id.clone()) {
                web_sys::console::warn_1(
                    &format!(
                        "fleet {} references an unknown system; skipping draw",
                        fleet_entry.id
                    )
                    .into(),
                );
            }
            continue;
        };
        drawn.push(DrawnFleet {
            fleet_id: fleet_entry.id.clone(),
            x: wx,
            y: wy,
        });

        let owner_rgb = fleet_entry
            .owner_id
            .as_deref()
            .map(|owner| palettes.get(owner).rgb)
            .unwrap_or((150, 180, 230));

        let (sx, sy) = cam.world_to_screen(wx, wy);
        if sx < -40.0 || sy < -40.0 || sx > w + 40.0 || sy > h + 40.0 {
            // Route overlays can still cross the screen even when the glyph
            // itself is outside it.
            if let Some(order) = order
                && draw_route_overlay(ctx, cam, state, order, owner_rgb, now_ms)
            {
                pulsing = true;
            }
            continue;
        }

        let color = fleet_entry
            .owner_id
            .as_deref()
            .map(|owner| palettes.get(owner).fleet.clone())
            .unwrap_or_else(|| "rgba(214,216,222,0.85)".to_string());

        // Point the glyph along the active segment.
        let heading = order
            .map(|o| fleet::segment_endpoints(fleet_entry, o))
            .and_then(|(origin, dest)| {
                let (ox, oy) = state.system_position(origin)?;
                let (dx, dy) = state.system_position(dest?)?;
                Some((dy - oy).atan2(dx - ox))
            })
            .unwrap_or(-std::f64::consts::FRAC_PI_2);

        ctx.save();
        ctx.translate(sx, sy).ok();
        ctx.rotate(heading).ok();
        ctx.begin_path();
        ctx.move_to(6.0, 0.0);
        ctx.line_to(-4.0, 4.0);
        ctx.line_to(-4.0, -4.0);
        ctx.close_path();
        ctx.set_fill_style_str(&color);
        ctx.fill();
        ctx.restore();

        if selected_fleet == Some(fleet_entry.id.as_str()) {
            ctx.begin_path();
            ctx.arc(sx, sy, 9.0, 0.0, std::f64::consts::TAU).ok();
            ctx.set_stroke_style_str("rgba(245,197,66,0.9)");
            ctx.set_line_width(1.5);
            ctx.stroke();
        }

        if let Some(order) = order
            && draw_route_overlay(ctx, cam, state, order, owner_rgb, now_ms)
        {
            pulsing = true;
        }
    }

    pulsing
}

/// Multi-hop route overlay: completed hops faint and solid, the active hop a
/// pulsing dashed stroke, upcoming hops dimmed; nodes labeled START / NEXT /
/// DEST. Returns whether a pulsing segment was drawn.
fn draw_route_overlay(
    ctx: &CanvasRenderingContext2d,
    cam: &Camera,
    state: &GalaxyState,
    order: &FleetOrder,
    owner_rgb: (u8, u8, u8),
    now_ms: f64,
) -> bool {
    let Some(path) = order.route_path.as_deref() else {
        return false;
    };
    if path.len() < 3 {
        return false;
    }
    let current_hop = order.current_hop.unwrap_or(0).min(path.len() - 2);
    let (r, g, b) = owner_rgb;

    let pulse = 0.5 + 0.5 * (now_ms / ROUTE_PULSE_PERIOD_MS * std::f64::consts::TAU).sin();
    let base_hsl = rgb_to_hsl(r, g, b);
    let bright_hsl = (base_hsl.0, base_hsl.1, (base_hsl.2 + 0.25).min(0.9));
    let (pr, pg, pb) = {
        let mixed = mix_hsl(base_hsl, bright_hsl, pulse);
        hsl_to_rgb(mixed.0, mixed.1, mixed.2)
    };

    let mut drew_active = false;
    for hop in 0..path.len() - 1 {
        let (Some((ax, ay)), Some((bx, by))) = (
            state.system_position(&path[hop]),
            state.system_position(&path[hop + 1]),
        ) else {
            continue;
        };
        let (ax, ay) = cam.world_to_screen(ax, ay);
        let (bx, by) = cam.world_to_screen(bx, by);

        match fleet::hop_state(hop, current_hop) {
            HopState::Completed => {
                clear_dash(ctx);
                ctx.set_stroke_style_str(&rgba_css(r, g, b, 0.25));
                ctx.set_line_width(1.5);
            }
            HopState::Active => {
                set_dash(ctx, 6.0, 6.0);
                ctx.set_stroke_style_str(&rgba_css(pr, pg, pb, 0.5 + 0.4 * pulse));
                ctx.set_line_width(2.0);
                drew_active = true;
            }
            HopState::Upcoming => {
                set_dash(ctx, 3.0, 6.0);
                ctx.set_stroke_style_str(&rgba_css(r, g, b, 0.16));
                ctx.set_line_width(1.0);
            }
        }
        ctx.begin_path();
        ctx.move_to(ax, ay);
        ctx.line_to(bx, by);
        ctx.stroke();
    }
    clear_dash(ctx);

    for (idx, system_id) in path.iter().enumerate() {
        let Some((wx, wy)) = state.system_position(system_id) else {
            continue;
        };
        let (sx, sy) = cam.world_to_screen(wx, wy);
        ctx.begin_path();
        ctx.arc(sx, sy, 2.5, 0.0, std::f64::consts::TAU).ok();
        ctx.set_fill_style_str(&rgba_css(r, g, b, 0.6));
        ctx.fill();

        if let Some(label) = fleet::route_node_label(idx, current_hop, path.len()) {
            draw_haloed_text(
                ctx,
                label,
                sx,
                sy - 14.0,
                "700 9px 'JetBrains Mono', monospace",
                "rgba(245,197,66,0.9)",
            );
        }
    }

    drew_active
}

/// Ephemeral route previews, fading out over their lifetime.
fn render_previews(
    ctx: &CanvasRenderingContext2d,
    cam: &Camera,
    state: &GalaxyState,
    previews: &[RoutePreview],
    now_ms: f64,
) {
    for preview in previews {
        let alpha = (1.0 - preview.age_fraction(now_ms)) * 0.8;
        ctx.set_stroke_style_str(&rgba_css(90, 200, 240, alpha));
        ctx.set_line_width(1.5);
        set_dash(ctx, 5.0, 5.0);
        ctx.begin_path();
        let mut started = false;
        for system_id in &preview.path {
            let Some((wx, wy)) = state.system_position(system_id) else {
                continue;
            };
            let (sx, sy) = cam.world_to_screen(wx, wy);
            if started {
                ctx.line_to(sx, sy);
            } else {
                ctx.move_to(sx, sy);
                started = true;
            }
        }
        ctx.stroke();
    }
    clear_dash(ctx);
}
