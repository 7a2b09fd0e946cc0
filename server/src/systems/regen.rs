//! Phase 3 (PostUpdate): natural HP/MP recovery. Accumulates whole seconds
//! of elapsed ticks per player and, once a full second has passed, asks the
//! script bridge for this tick's regen amount rather than hardcoding a
//! formula here.

use crate::script_bridge::ScriptBridge;
use crate::tick::{Phase, System};
use crate::world;
use std::collections::HashMap;
use std::sync::Arc;

pub struct RegenSystem {
    bridge: Arc<ScriptBridge>,
    ticks_per_second: u64,
    /// player_id -> ticks accumulated since its last regen application.
    accumulated: HashMap<u64, u64>,
}

impl RegenSystem {
    pub fn new(bridge: Arc<ScriptBridge>, ticks_per_second: u64) -> Self {
        Self { bridge, ticks_per_second: ticks_per_second.max(1), accumulated: HashMap::new() }
    }
}

impl System for RegenSystem {
    fn name(&self) -> &'static str {
        "regen"
    }

    fn phase(&self) -> Phase {
        Phase::PostUpdate
    }

    fn run(&mut self, _current_tick: u64) {
        let ids: Vec<u64> = world::with(|state| state.players.keys().copied().collect());
        let live: std::collections::HashSet<u64> = ids.iter().copied().collect();
        self.accumulated.retain(|id, _| live.contains(id));

        let due: Vec<u64> = ids
            .into_iter()
            .filter(|id| {
                let acc = self.accumulated.entry(*id).or_insert(0);
                *acc += 1;
                if *acc >= self.ticks_per_second {
                    *acc = 0;
                    true
                } else {
                    false
                }
            })
            .collect();

        if due.is_empty() {
            return;
        }

        world::with_mut(|state| {
            for id in due {
                let Some(player) = state.players.get_mut(&id) else { continue };
                if !player.is_alive() {
                    continue;
                }
                let hp_delta = self.bridge.on_regen(id, 1);
                player.heal(hp_delta);
                let mp_delta = self.bridge.on_regen(id, 1);
                player.mp = (player.mp + mp_delta.max(0)).min(player.max_mp);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::types::Player;

    fn player(id: u64, hp: i32, max_hp: i32) -> Player {
        Player {
            id,
            account_id: 1,
            name: format!("p{id}"),
            map: 0,
            x: 0,
            y: 0,
            heading: 0,
            level: 1,
            experience: 0,
            hp,
            max_hp,
            mp: 0,
            max_mp: 10,
            alignment: 0,
            pk_count: 0,
            buffs: Vec::new(),
            known_spells: Vec::new(),
            bookmarks: Vec::new(),
            clan_id: None,
            party_id: None,
            inventory: Vec::new(),
        }
    }

    #[test]
    fn runs_cleanly_with_no_players() {
        let bridge = Arc::new(ScriptBridge::new_without_scripts());
        let mut system = RegenSystem::new(bridge, 10);
        system.run(1);
    }

    #[test]
    fn regen_applies_only_once_the_interval_elapses() {
        world::with_mut(|state| state.insert_player(player(1001, 40, 50)));

        let bridge = Arc::new(ScriptBridge::new_without_scripts());
        let mut system = RegenSystem::new(bridge, 3);

        system.run(1);
        system.run(2);
        assert_eq!(world::with(|state| state.players.get(&1001).unwrap().hp), 40);

        system.run(3);
        assert_eq!(world::with(|state| state.players.get(&1001).unwrap().hp), 41);

        world::with_mut(|state| state.remove_player(1001));
    }
}
