//! Phase 2 (Update): despawns summoned NPCs once their lifetime lapses.
//! Creation is invoked from handlers, not a per-tick sweep — [`spawn`] is
//! the mechanism a cast-summon-skill handler would call; nothing in this
//! tree calls it yet, so every summon currently observed here exists only
//! in tests.

use core::types::NpcKind;

use crate::tick::{Phase, System};
use crate::world;

#[derive(Default)]
pub struct SummonSystem;

impl SummonSystem {
    pub fn new() -> Self {
        Self
    }
}

impl System for SummonSystem {
    fn name(&self) -> &'static str {
        "summon"
    }

    fn phase(&self) -> Phase {
        Phase::Update
    }

    fn run(&mut self, current_tick: u64) {
        world::with_mut(|state| {
            let expired: Vec<u64> = state
                .npcs
                .iter()
                .filter_map(|(id, npc)| match npc.kind {
                    NpcKind::Summon { expires_at_tick, .. } if current_tick >= expires_at_tick => Some(*id),
                    _ => None,
                })
                .collect();

            for id in expired {
                if let Some(npc) = state.npcs.get(&id) {
                    state.occupancy.vacate(npc.map, npc.x, npc.y);
                }
                state.npc_aoi.remove(id);
                state.npcs.remove(&id);
            }
        });
    }
}

/// Creates a summoned NPC owned by `owner_id`, alive for `ttl_ticks` from
/// `current_tick`. Allocates its id from the NPC partition the same way
/// `world`'s own allocators would, since summons share that id space with
/// every other NPC kind.
pub fn spawn(
    owner_id: u64,
    template_id: u32,
    map: u16,
    x: i32,
    y: i32,
    hp: i32,
    ttl_ticks: u64,
    current_tick: u64,
) -> Option<u64> {
    world::with_mut(|state| {
        if state.occupancy.is_blocked(map, x, y) {
            return None;
        }
        let slot = state.npc_allocator.allocate()?;
        let id = core::constants::NPC_ID_MIN + slot.slot() as u64;
        let npc = core::types::Npc {
            id,
            template_id,
            kind: NpcKind::Summon { owner_id, expires_at_tick: current_tick + ttl_ticks },
            map,
            x,
            y,
            heading: 0,
            hp,
            max_hp: hp,
            buffs: Vec::new(),
            aggro_target: None,
            spawn_point: Some((map, x, y)),
            respawn_at_tick: None,
            attack_cooldown: 0,
            move_cooldown: 0,
            companion_mode: Some(core::types::CompanionMode::Aggressive),
        };
        state.occupancy.try_occupy(id, map, x, y);
        state.npc_aoi.insert(id, map, x, y);
        state.npcs.insert(id, npc);
        Some(id)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_cleanly_with_no_npcs() {
        let mut system = SummonSystem::new();
        system.run(1);
    }

    #[test]
    fn expired_summon_is_removed() {
        let id = spawn(1, 50, 0, 3, 3, 10, 5, 1).expect("spawn should succeed on an empty tile");

        let mut system = SummonSystem::new();
        system.run(5);
        assert!(world::with(|state| state.npcs.contains_key(&id)));

        system.run(6);
        assert!(!world::with(|state| state.npcs.contains_key(&id)));
    }
}
