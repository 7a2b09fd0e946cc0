//! Phase 3 (PostUpdate): expires dropped items once their TTL lapses,
//! taking over the sweep `CleanupSystem` used to do inline so cleanup is
//! left with only session/entity reaping.

use crate::event_bus::{self, GameEvent};
use crate::tick::{Phase, System};
use crate::world;

#[derive(Default)]
pub struct GroundItemSystem;

impl GroundItemSystem {
    pub fn new() -> Self {
        Self
    }
}

impl System for GroundItemSystem {
    fn name(&self) -> &'static str {
        "ground_item"
    }

    fn phase(&self) -> Phase {
        Phase::PostUpdate
    }

    fn run(&mut self, current_tick: u64) {
        let expired: Vec<u64> = world::with_mut(|state| {
            let expired: Vec<u64> = state
                .ground_items
                .values()
                .filter(|g| g.is_expired(current_tick))
                .map(|g| g.id)
                .collect();
            for id in &expired {
                state.ground_items.remove(id);
            }
            expired
        });

        if expired.is_empty() {
            return;
        }

        event_bus::with_mut(|events| {
            for item_id in expired {
                events.publish(GameEvent::ItemExpired { item_id });
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::types::GroundItem;

    fn item(id: u64, expires_at_tick: u64) -> GroundItem {
        GroundItem {
            id,
            template_id: 1,
            count: 1,
            map: 0,
            x: 0,
            y: 0,
            owner_id: None,
            dropped_at_tick: 0,
            expires_at_tick,
        }
    }

    #[test]
    fn runs_cleanly_with_no_items() {
        let mut system = GroundItemSystem::new();
        system.run(1);
    }

    #[test]
    fn expired_item_is_removed() {
        world::with_mut(|state| {
            state.ground_items.insert(501, item(501, 10));
        });

        let mut system = GroundItemSystem::new();
        system.run(9);
        assert!(world::with(|state| state.ground_items.contains_key(&501)));

        system.run(10);
        assert!(!world::with(|state| state.ground_items.contains_key(&501)));
    }
}
