//! Phase 2 (Update): the back half of NPC liveness — once `DeathSystem` has
//! parked a dead NPC's respawn timer, this system restores it when the
//! timer lapses: `RemovedFromAOI -> (timer 0) -> Alive`.

use crate::tick::{Phase, System};
use crate::world;

#[derive(Default)]
pub struct NpcRespawnSystem;

impl NpcRespawnSystem {
    pub fn new() -> Self {
        Self
    }
}

impl System for NpcRespawnSystem {
    fn name(&self) -> &'static str {
        "npc_respawn"
    }

    fn phase(&self) -> Phase {
        Phase::Update
    }

    fn run(&mut self, current_tick: u64) {
        world::with_mut(|state| {
            let due: Vec<u64> = state
                .npcs
                .iter()
                .filter(|(_, n)| !n.is_alive() && n.respawn_at_tick.map(|t| current_tick >= t).unwrap_or(false))
                .map(|(id, _)| *id)
                .collect();

            for id in due {
                let Some(spawn) = state.npcs.get(&id).and_then(|n| n.spawn_point) else {
                    continue;
                };
                let (spawn_map, sx, sy) = spawn;
                if !state.occupancy.try_occupy(id, spawn_map, sx, sy) {
                    // Spawn tile is occupied this tick; try again next tick.
                    continue;
                }

                state.npc_aoi.insert(id, spawn_map, sx, sy);
                if let Some(npc) = state.npcs.get_mut(&id) {
                    npc.hp = npc.max_hp;
                    npc.map = spawn_map;
                    npc.x = sx;
                    npc.y = sy;
                    npc.heading = 0;
                    npc.aggro_target = None;
                    npc.attack_cooldown = 0;
                    npc.move_cooldown = 0;
                    npc.respawn_at_tick = None;
                }
            }
        });
    }
}
