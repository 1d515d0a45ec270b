use std::cell::RefCell;
use std::rc::Rc;

use arcturus_shared::{Fleet, Planet, StarSystem};

/// Domain events the map emits toward the consuming app. A typed observer
/// interface instead of a DOM event bus: consumers subscribe with plain
/// closures and never touch the canvas element.
#[derive(Debug, Clone)]
pub enum MapEvent {
    /// Left-click landed on a system.
    SystemSelected {
        system: StarSystem,
        planets: Vec<Planet>,
        screen_x: f64,
        screen_y: f64,
    },
    /// Left-click landed on a fleet's rendered position.
    FleetSelected {
        fleet: Fleet,
        screen_x: f64,
        screen_y: f64,
    },
    /// Shift-click on a system while a fleet is selected.
    FleetMoveRequested {
        fleet: Fleet,
        to_system: StarSystem,
        shift_key: bool,
    },
    /// Left-click over empty space; a pan gesture may follow.
    MapClickedEmpty,
    /// Right-click on a system; the host app owns whatever menu appears.
    SystemContextRequested {
        system: StarSystem,
        screen_x: f64,
        screen_y: f64,
    },
}

type Listener = Rc<dyn Fn(&MapEvent)>;

/// Shared dispatch point between the canvas (producer) and app-layer
/// consumers. Clones share the same listener list.
#[derive(Clone, Default)]
pub struct EventHub {
    listeners: Rc<RefCell<Vec<Listener>>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: impl Fn(&MapEvent) + 'static) {
        self.listeners.borrow_mut().push(Rc::new(listener));
    }

    /// Deliver to every subscriber in registration order. The listener list
    /// is snapshotted first so a listener may subscribe re-entrantly.
    pub fn emit(&self, event: &MapEvent) {
        let snapshot: Vec<Listener> = self.listeners.borrow().clone();
        for listener in snapshot {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn emit_reaches_all_subscribers_in_order() {
        let hub = EventHub::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for tag in ["first", "second"] {
            let log = log.clone();
            hub.subscribe(move |event| {
                if matches!(event, MapEvent::MapClickedEmpty) {
                    log.borrow_mut().push(tag);
                }
            });
        }

        hub.emit(&MapEvent::MapClickedEmpty);
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn clones_share_the_listener_list() {
        let hub = EventHub::new();
        let seen = Rc::new(Cell::new(0));
        let seen_cb = seen.clone();
        hub.clone()
            .subscribe(move |_| seen_cb.set(seen_cb.get() + 1));
        hub.emit(&MapEvent::MapClickedEmpty);
        assert_eq!(seen.get(), 1);
    }

    #[test]
    fn a_listener_may_subscribe_during_dispatch() {
        let hub = EventHub::new();
        let inner_hub = hub.clone();
        hub.subscribe(move |_| {
            inner_hub.subscribe(|_| {});
        });
        hub.emit(&MapEvent::MapClickedEmpty);
    }
}
