//! Phase 2 (Update): reacts to `Death` events one tick after they're
//! published (the event bus's own next-tick guarantee), applying the
//! liveness transition `Alive -> Dead+DeleteTimer -> RemovedFromAOI` for
//! NPCs and the respawn/exp-penalty sequence for players.

use core::constants::NPC_RESPAWN_TICKS;

use crate::event_bus::{self, GameEvent};
use crate::script_bridge::ScriptBridge;
use crate::tick::{Phase, System};
use crate::world;
use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};

static PENDING_DEATHS: OnceLock<Mutex<Vec<u64>>> = OnceLock::new();

fn queue() -> &'static Mutex<Vec<u64>> {
    PENDING_DEATHS.get_or_init(|| Mutex::new(Vec::new()))
}

pub struct DeathSystem {
    bridge: Arc<ScriptBridge>,
}

impl DeathSystem {
    /// Subscribes to the event bus once at construction; every `Death`
    /// event queues its victim for this system's own `run` to drain,
    /// reusing the same global-queue bridge the combat system uses to get
    /// work from one place in the loop to another.
    pub fn new(bridge: Arc<ScriptBridge>) -> Self {
        event_bus::with_mut(|events| {
            events.subscribe(|event| {
                if let GameEvent::Death { entity_id, .. } = event {
                    queue().lock().push(*entity_id);
                }
            });
        });
        Self { bridge }
    }
}

impl System for DeathSystem {
    fn name(&self) -> &'static str {
        "death"
    }

    fn phase(&self) -> Phase {
        Phase::Update
    }

    fn run(&mut self, current_tick: u64) {
        let dead: Vec<u64> = std::mem::take(&mut *queue().lock());
        for entity_id in dead {
            self.process(entity_id, current_tick);
        }
    }
}

impl DeathSystem {
    fn process(&self, entity_id: u64, current_tick: u64) {
        let npc_snapshot =
            world::with(|state| state.npcs.get(&entity_id).map(|n| (n.is_alive(), n.map, n.x, n.y)));

        if let Some((false, map, x, y)) = npc_snapshot {
            world::with_mut(|state| {
                state.occupancy.vacate(map, x, y);
                state.npc_aoi.remove(entity_id);
                if let Some(npc) = state.npcs.get_mut(&entity_id) {
                    if npc.respawn_at_tick.is_none() {
                        npc.respawn_at_tick = Some(current_tick + NPC_RESPAWN_TICKS);
                    }
                    npc.aggro_target = None;
                }
            });
            return;
        }

        let player_snapshot =
            world::with(|state| state.players.get(&entity_id).map(|p| (p.is_alive(), p.level, p.map, p.x, p.y)));

        if let Some((false, level, map, x, y)) = player_snapshot {
            let outcome = self.bridge.on_player_death(entity_id, level, map, x, y);
            world::with_mut(|state| {
                let from = state.players.get(&entity_id).map(|p| (p.map, p.x, p.y));

                if let Some(player) = state.players.get_mut(&entity_id) {
                    player.experience = player.experience.saturating_sub(outcome.exp_penalty);
                    player.hp = player.max_hp;
                    player.map = outcome.respawn_map;
                    player.x = outcome.respawn_x;
                    player.y = outcome.respawn_y;
                }
                if let Some((from_map, from_x, from_y)) = from {
                    state.occupancy.vacate(from_map, from_x, from_y);
                }
                state.player_aoi.relocate(entity_id, outcome.respawn_map, outcome.respawn_x, outcome.respawn_y);
                state.occupancy.try_occupy(entity_id, outcome.respawn_map, outcome.respawn_x, outcome.respawn_y);
            });
        }
    }
}
