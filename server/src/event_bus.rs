//! Double-buffered typed event bus.
//!
//! Publishers write into the back buffer all tick long; `swap()` (called
//! once, at the phase boundary between PostUpdate and Output) makes those
//! events visible to subscribers starting next tick. This guarantees events
//! emitted during tick N are never observed until tick N+1, so a system
//! can't be re-entered by an event it just published.

#[derive(Clone, Debug)]
pub enum GameEvent {
    PlayerEntered { player_id: u64 },
    PlayerLeft { player_id: u64 },
    Damage { attacker_id: u64, target_id: u64, amount: i32 },
    Death { entity_id: u64, killer_id: Option<u64> },
    ItemDropped { item_id: u64, map: u16, x: i32, y: i32 },
    BuffExpired { entity_id: u64, buff_index: usize },
    ChatMessage { speaker_id: u64, channel: ChatChannel, text: String },
    WeatherChanged { weather: Weather },
    ItemExpired { item_id: u64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatChannel {
    Say,
    Clan,
    Party,
    Global,
}

/// World-wide weather state, rolled once per in-world hour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Weather {
    Clear,
    Snow(u8),
    Rain(u8),
}

type Subscriber = Box<dyn Fn(&GameEvent) + Send + Sync>;

#[derive(Default)]
pub struct EventBus {
    front: Vec<GameEvent>,
    back: Vec<GameEvent>,
    subscribers: Vec<Subscriber>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("front", &self.front)
            .field("back", &self.back)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `event` for delivery starting next tick.
    pub fn publish(&mut self, event: GameEvent) {
        self.back.push(event);
    }

    /// Events published up through the previous swap; read-only during a tick.
    pub fn drain_visible(&self) -> &[GameEvent] {
        &self.front
    }

    /// Moves the back buffer into view and starts a fresh back buffer.
    /// Must be called exactly once per tick, at the phase boundary.
    pub fn swap(&mut self) {
        self.front.clear();
        std::mem::swap(&mut self.front, &mut self.back);
    }

    /// Registers a handler invoked once per event by [`Self::dispatch_all`].
    /// Handlers run in registration order; a handler that itself publishes
    /// an event only makes it visible next tick, never this one.
    pub fn subscribe<F>(&mut self, handler: F)
    where
        F: Fn(&GameEvent) + Send + Sync + 'static,
    {
        self.subscribers.push(Box::new(handler));
    }

    /// Delivers every front-buffer event to each subscriber, in registration
    /// order. Called once per tick, immediately after [`Self::swap`].
    pub fn dispatch_all(&self) {
        for event in &self.front {
            for subscriber in &self.subscribers {
                subscriber(event);
            }
        }
    }
}

static EVENT_BUS: std::sync::OnceLock<parking_lot::RwLock<EventBus>> = std::sync::OnceLock::new();

fn global() -> &'static parking_lot::RwLock<EventBus> {
    EVENT_BUS.get_or_init(|| parking_lot::RwLock::new(EventBus::new()))
}

/// One process-wide bus, same singleton discipline as `crate::world`: a
/// single owner reached only through these accessors, so handlers (which
/// only get a session and a reader, no injected dependency bundle) can
/// still publish events reachable by the Output system.
pub fn with<F, R>(f: F) -> R
where
    F: FnOnce(&EventBus) -> R,
{
    f(&global().read())
}

pub fn with_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut EventBus) -> R,
{
    f(&mut global().write())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn published_events_are_invisible_until_swap() {
        let mut bus = EventBus::new();
        bus.publish(GameEvent::PlayerEntered { player_id: 1 });
        assert!(bus.drain_visible().is_empty());
        bus.swap();
        assert_eq!(bus.drain_visible().len(), 1);
    }

    #[test]
    fn events_published_during_the_visible_tick_wait_one_more_swap() {
        let mut bus = EventBus::new();
        bus.publish(GameEvent::PlayerEntered { player_id: 1 });
        bus.swap();
        bus.publish(GameEvent::PlayerLeft { player_id: 1 });
        assert_eq!(bus.drain_visible().len(), 1);
        bus.swap();
        assert_eq!(bus.drain_visible().len(), 1);
    }

    #[test]
    fn swap_with_no_new_events_clears_the_view() {
        let mut bus = EventBus::new();
        bus.publish(GameEvent::PlayerEntered { player_id: 1 });
        bus.swap();
        bus.swap();
        assert!(bus.drain_visible().is_empty());
    }
}
