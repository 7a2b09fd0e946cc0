//! Phase 2 (Update): ticks every active buff down by one and expires it
//! when it hits zero, emitting a BuffExpired event per removal.

use crate::event_bus::{self, GameEvent};
use crate::tick::{Phase, System};
use crate::world;

#[derive(Default)]
pub struct BuffTickSystem;

impl BuffTickSystem {
    pub fn new() -> Self {
        Self
    }
}

impl System for BuffTickSystem {
    fn name(&self) -> &'static str {
        "buffs"
    }

    fn phase(&self) -> Phase {
        Phase::Update
    }

    fn run(&mut self, _current_tick: u64) {
        let mut expired: Vec<(u64, usize)> = Vec::new();

        world::with_mut(|state| {
            for (id, player) in state.players.iter_mut() {
                for (i, buff) in player.buffs.iter_mut().enumerate() {
                    buff.tick();
                    if buff.is_expired() {
                        expired.push((*id, i));
                    }
                }
                player.buffs.retain(|b| !b.is_expired());
            }
            for (id, npc) in state.npcs.iter_mut() {
                for (i, buff) in npc.buffs.iter_mut().enumerate() {
                    buff.tick();
                    if buff.is_expired() {
                        expired.push((*id, i));
                    }
                }
                npc.buffs.retain(|b| !b.is_expired());
            }
        });

        event_bus::with_mut(|events| {
            for (entity_id, buff_index) in expired {
                events.publish(GameEvent::BuffExpired { entity_id, buff_index });
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_cleanly_with_empty_world() {
        let mut system = BuffTickSystem::new();
        system.run(1);
    }
}
