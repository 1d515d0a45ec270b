use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;

/// Frame lifecycle of the scheduler. Exactly one transition cycle per frame:
/// `Idle → Dirty` (something changed) `→ Drawing` (render function runs)
/// `→ Idle` (or back to `Dirty` when animation continues).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FramePhase {
    Idle,
    Dirty,
    Drawing,
}

/// Owns the single `requestAnimationFrame` handle and drives redraws.
///
/// `mark_dirty()` is cheap and coalescing: any number of setter calls within
/// one frame produce one redraw. The render function receives the elapsed
/// milliseconds since the previous frame (camera easing consumes it) and
/// returns `true` while animation is still in flight, which re-dirties and
/// reschedules without external help. Nothing runs until `start()`; `stop()`
/// cancels the pending frame but keeps the dirty mark for a later restart.
pub struct RenderScheduler {
    inner: Rc<Inner>,
}

struct Inner {
    window: Option<web_sys::Window>,
    phase: Cell<FramePhase>,
    running: Cell<bool>,
    /// A mark_dirty that arrived while the render function was running.
    redirty: Cell<bool>,
    raf_id: Cell<Option<i32>>,
    last_frame_ms: Cell<f64>,
    callback: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl Inner {
    fn schedule(inner: &Rc<Inner>) {
        if inner.raf_id.get().is_some() {
            return;
        }
        let cb_ref = inner.callback.borrow();
        let Some(cb) = cb_ref.as_ref() else {
            return;
        };
        let Some(window) = inner.window.as_ref() else {
            return;
        };
        if let Ok(id) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
            inner.raf_id.set(Some(id));
        }
    }

    fn cancel(&self) {
        if let Some(raf_id) = self.raf_id.replace(None)
            && let Some(window) = self.window.as_ref()
        {
            let _ = window.cancel_animation_frame(raf_id);
        }
    }
}

impl RenderScheduler {
    pub fn new(render_fn: impl Fn(f64) -> bool + 'static) -> Self {
        let inner = Rc::new(Inner {
            window: web_sys::window(),
            phase: Cell::new(FramePhase::Idle),
            running: Cell::new(false),
            redirty: Cell::new(false),
            raf_id: Cell::new(None),
            last_frame_ms: Cell::new(0.0),
            callback: RefCell::new(None),
        });

        let inner_cb = inner.clone();
        let cb = Closure::<dyn FnMut()>::new(move || {
            inner_cb.raf_id.set(None);
            if !inner_cb.running.get() || inner_cb.phase.get() != FramePhase::Dirty {
                return;
            }
            inner_cb.phase.set(FramePhase::Drawing);

            let now = js_sys::Date::now();
            let last = inner_cb.last_frame_ms.replace(now);
            // First frame after idle has no meaningful delta; assume a vsync.
            let dt_ms = if last > 0.0 {
                (now - last).clamp(1.0, 100.0)
            } else {
                16.0
            };

            let animating = render_fn(dt_ms);

            if animating || inner_cb.redirty.replace(false) {
                inner_cb.phase.set(FramePhase::Dirty);
                Inner::schedule(&inner_cb);
            } else {
                inner_cb.phase.set(FramePhase::Idle);
                inner_cb.last_frame_ms.set(0.0);
            }
        });
        *inner.callback.borrow_mut() = Some(cb);

        Self { inner }
    }

    /// Begin servicing frames. A dirty mark set before start is honored.
    pub fn start(&self) {
        self.inner.running.set(true);
        if self.inner.phase.get() == FramePhase::Dirty {
            Inner::schedule(&self.inner);
        }
    }

    /// Cancel any pending frame. The phase machine keeps its dirty mark so a
    /// later `start()` resumes where it left off.
    pub fn stop(&self) {
        self.inner.running.set(false);
        self.inner.cancel();
        self.inner.last_frame_ms.set(0.0);
    }

    /// Request a repaint. Idle → Dirty plus one scheduled frame; during a
    /// draw the request is parked and re-applied when the frame ends.
    pub fn mark_dirty(&self) {
        match self.inner.phase.get() {
            FramePhase::Drawing => self.inner.redirty.set(true),
            _ => {
                self.inner.phase.set(FramePhase::Dirty);
                if self.inner.running.get() {
                    Inner::schedule(&self.inner);
                }
            }
        }
    }

}

impl Drop for RenderScheduler {
    fn drop(&mut self) {
        self.inner.cancel();
        self.inner.running.set(false);
        self.inner.phase.set(FramePhase::Idle);
        // Break the callback->inner reference cycle on teardown.
        self.inner.callback.borrow_mut().take();
    }
}
