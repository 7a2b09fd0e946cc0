//! Phase 6: reaps closed sessions — the last phase of a tick, after
//! everything else has settled. Ground-item expiry and NPC respawn
//! scheduling live in their own systems (`GroundItemSystem`, `DeathSystem`).

use crate::session::registry::SessionRegistry;
use crate::tick::{Phase, System};
use crate::world;
use parking_lot::RwLock;
use std::sync::Arc;

pub struct CleanupSystem {
    registry: Arc<RwLock<SessionRegistry>>,
}

impl CleanupSystem {
    pub fn new(registry: Arc<RwLock<SessionRegistry>>) -> Self {
        Self { registry }
    }
}

impl System for CleanupSystem {
    fn name(&self) -> &'static str {
        "cleanup"
    }

    fn phase(&self) -> Phase {
        Phase::Cleanup
    }

    fn run(&mut self, _current_tick: u64) {
        let closed_ids = self.registry.write().reap_closed();
        if !closed_ids.is_empty() {
            world::with_mut(|state| {
                for id in &closed_ids {
                    state.remove_player(*id);
                }
            });
        }
    }
}
