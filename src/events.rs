//! Memory event bus for passive observers

use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// One memory-system event.
///
/// `Fetch` fires once per instruction fetch; `Hit`/`Miss` fire for data
/// accesses (LOAD, STORE and the PRINT operand read); `WriteCache` fires
/// whenever a cache way is filled or overwritten.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemEvent {
    Fetch { addr: u16 },
    Hit { addr: u16 },
    Miss { addr: u16 },
    WriteCache { set: u8, way: u8 },
}

/// Observer of memory events. Listeners never mutate CPU state.
pub trait EventListener {
    fn on_event(&mut self, event: MemEvent);
}

/// A minimal event bus with a fixed set of event kinds.
///
/// Listeners are held weakly: dropping the owning `Rc` unsubscribes on the
/// next emission, so a scope-bound observer detaches on every exit path.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Weak<RefCell<dyn EventListener>>>,
}

impl EventBus {
    pub fn subscribe(&mut self, listener: &Rc<RefCell<dyn EventListener>>) {
        self.listeners.push(Rc::downgrade(listener));
    }

    pub fn emit(&mut self, event: MemEvent) {
        self.listeners.retain(|weak| match weak.upgrade() {
            Some(listener) => {
                listener.borrow_mut().on_event(event);
                true
            }
            None => false,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder {
        events: Vec<MemEvent>,
    }

    impl EventListener for Recorder {
        fn on_event(&mut self, event: MemEvent) {
            self.events.push(event);
        }
    }

    #[test]
    fn test_subscribe_and_emit() {
        let mut bus = EventBus::default();
        let recorder = Rc::new(RefCell::new(Recorder { events: Vec::new() }));
        bus.subscribe(&(recorder.clone() as Rc<RefCell<dyn EventListener>>));

        bus.emit(MemEvent::Fetch { addr: 7 });
        bus.emit(MemEvent::Miss { addr: 7 });
        assert_eq!(
            recorder.borrow().events,
            vec![MemEvent::Fetch { addr: 7 }, MemEvent::Miss { addr: 7 }]
        );
    }

    #[test]
    fn test_dropped_listener_is_unsubscribed() {
        let mut bus = EventBus::default();
        let recorder = Rc::new(RefCell::new(Recorder { events: Vec::new() }));
        bus.subscribe(&(recorder.clone() as Rc<RefCell<dyn EventListener>>));

        drop(recorder);
        // Must not panic, and the dead listener is pruned
        bus.emit(MemEvent::Fetch { addr: 0 });
        assert!(bus.listeners.is_empty());
    }
}
