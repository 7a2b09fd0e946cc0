//! Phase 2 (Update): a gameplay effect invoked from handlers or other
//! systems (never a per-tick sweep on its own), queued the same way
//! `CombatSystem` takes attacks — something calls [`enqueue`], this system
//! applies the shape change and reverts it when the duration lapses.
//!
//! Nothing in this tree calls [`enqueue`] yet; no handler implements a
//! polymorph skill/item effect. The mechanism is complete and exercised by
//! its own tests, waiting on that content.

use crate::tick::{Phase, System};
use crate::world;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::OnceLock;

pub struct PolymorphRequest {
    pub npc_id: u64,
    pub new_template_id: u32,
    pub duration_ticks: u64,
}

static PENDING: OnceLock<Mutex<Vec<PolymorphRequest>>> = OnceLock::new();

fn queue() -> &'static Mutex<Vec<PolymorphRequest>> {
    PENDING.get_or_init(|| Mutex::new(Vec::new()))
}

pub fn enqueue(request: PolymorphRequest) {
    queue().lock().push(request);
}

#[derive(Default)]
pub struct PolymorphSystem {
    /// npc_id -> (template_id before the first active polymorph, revert tick)
    active: HashMap<u64, (u32, u64)>,
}

impl PolymorphSystem {
    pub fn new() -> Self {
        Self::default()
    }
}

impl System for PolymorphSystem {
    fn name(&self) -> &'static str {
        "polymorph"
    }

    fn phase(&self) -> Phase {
        Phase::Update
    }

    fn run(&mut self, current_tick: u64) {
        let requests: Vec<PolymorphRequest> = std::mem::take(&mut *queue().lock());
        world::with_mut(|state| {
            for request in requests {
                let Some(npc) = state.npcs.get_mut(&request.npc_id) else { continue };
                let original = self
                    .active
                    .get(&request.npc_id)
                    .map(|(orig, _)| *orig)
                    .unwrap_or(npc.template_id);
                self.active
                    .insert(request.npc_id, (original, current_tick + request.duration_ticks));
                npc.template_id = request.new_template_id;
            }
        });

        let expired: Vec<u64> = self
            .active
            .iter()
            .filter(|(_, (_, revert_at))| current_tick >= *revert_at)
            .map(|(id, _)| *id)
            .collect();

        if expired.is_empty() {
            return;
        }

        world::with_mut(|state| {
            for id in &expired {
                if let Some((original, _)) = self.active.remove(id) {
                    if let Some(npc) = state.npcs.get_mut(id) {
                        npc.template_id = original;
                    }
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::types::{Npc, NpcKind};

    fn npc(id: u64, template_id: u32) -> Npc {
        Npc {
            id,
            template_id,
            kind: NpcKind::Hostile,
            map: 0,
            x: 0,
            y: 0,
            heading: 0,
            hp: 10,
            max_hp: 10,
            buffs: Vec::new(),
            aggro_target: None,
            spawn_point: None,
            respawn_at_tick: None,
            attack_cooldown: 0,
            move_cooldown: 0,
            companion_mode: None,
        }
    }

    #[test]
    fn runs_cleanly_with_nothing_queued() {
        let mut system = PolymorphSystem::new();
        system.run(1);
    }

    #[test]
    fn polymorph_applies_then_reverts_after_duration() {
        world::with_mut(|state| {
            state.npcs.insert(601, npc(601, 10));
        });

        let mut system = PolymorphSystem::new();
        enqueue(PolymorphRequest { npc_id: 601, new_template_id: 99, duration_ticks: 5 });
        system.run(1);
        assert_eq!(world::with(|state| state.npcs.get(&601).unwrap().template_id), 99);

        system.run(5);
        assert_eq!(world::with(|state| state.npcs.get(&601).unwrap().template_id), 99);

        system.run(6);
        assert_eq!(world::with(|state| state.npcs.get(&601).unwrap().template_id), 10);

        world::with_mut(|state| {
            state.npcs.remove(&601);
        });
    }
}
