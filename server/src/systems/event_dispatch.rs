//! Phase 1 (PreUpdate): the only place the event bus swaps buffers. Runs
//! before every other Update-phase system, so an event published earlier in
//! the *same* tick (e.g. Combat's Death at Phase::Update) is never visible
//! until this system runs again next tick — exactly once per tick, always
//! first.

use crate::event_bus;
use crate::tick::{Phase, System};

#[derive(Default)]
pub struct EventDispatchSystem;

impl EventDispatchSystem {
    pub fn new() -> Self {
        Self
    }
}

impl System for EventDispatchSystem {
    fn name(&self) -> &'static str {
        "event_dispatch"
    }

    fn phase(&self) -> Phase {
        Phase::PreUpdate
    }

    fn run(&mut self, _current_tick: u64) {
        event_bus::with_mut(|events| {
            events.swap();
            events.dispatch_all();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_cleanly_with_no_events() {
        let mut system = EventDispatchSystem::new();
        system.run(1);
    }

    #[test]
    fn subscriber_sees_event_published_the_previous_tick() {
        use parking_lot::Mutex;
        use std::sync::Arc;

        let seen = Arc::new(Mutex::new(0usize));
        let seen_clone = seen.clone();
        event_bus::with_mut(|events| {
            events.subscribe(move |_event| {
                *seen_clone.lock() += 1;
            });
            events.publish(event_bus::GameEvent::PlayerLeft { player_id: 999_901 });
        });

        let mut system = EventDispatchSystem::new();
        system.run(1);

        assert_eq!(*seen.lock(), 1);
    }
}
