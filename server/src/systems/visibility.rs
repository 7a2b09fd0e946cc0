//! Phase 3 (PostUpdate): diffs each player's known-entity set against what's
//! now in their AOI neighborhood, producing enter/leave notifications that
//! the Output system serializes to the wire.

use crate::tick::{Phase, System};
use crate::world;
use std::collections::{HashMap, HashSet};

#[derive(Default)]
pub struct VisibilitySystem {
    known: HashMap<u64, HashSet<u64>>,
    pub enters: Vec<(u64, u64)>,
    pub leaves: Vec<(u64, u64)>,
}

impl VisibilitySystem {
    pub fn new() -> Self {
        Self::default()
    }
}

impl System for VisibilitySystem {
    fn name(&self) -> &'static str {
        "visibility"
    }

    fn phase(&self) -> Phase {
        Phase::PostUpdate
    }

    fn run(&mut self, _current_tick: u64) {
        self.enters.clear();
        self.leaves.clear();

        let snapshot: Vec<(u64, u16, i32, i32)> =
            world::with(|state| state.players.values().map(|p| (p.id, p.map, p.x, p.y)).collect());

        world::with(|state| {
            for (player_id, map, x, y) in &snapshot {
                let mut visible = state.player_aoi.nearby(*map, *x, *y);
                visible.extend(state.npc_aoi.nearby(*map, *x, *y));
                visible.remove(player_id);

                let previously_known = self.known.entry(*player_id).or_default();

                for &entity_id in visible.difference(previously_known) {
                    self.enters.push((*player_id, entity_id));
                }
                for &entity_id in previously_known.difference(&visible) {
                    self.leaves.push((*player_id, entity_id));
                }

                *previously_known = visible;
            }
        });

        let live_players: HashSet<u64> = snapshot.iter().map(|(id, ..)| *id).collect();
        self.known.retain(|id, _| live_players.contains(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_world_produces_no_diffs() {
        let mut system = VisibilitySystem::new();
        system.run(1);
        assert!(system.enters.is_empty());
        assert!(system.leaves.is_empty());
    }
}
