//! Phase 2 (Update): the simpler counterpart to `NpcAiSystem` for owned
//! NPCs (pets/summons/dolls/followers). Policy is keyed off
//! `companion_mode` rather than scripted perception — owners set the mode
//! directly through their pet-command packet, so there's no decision to
//! delegate to the bridge here, just a movement/engagement rule per mode.

use core::types::CompanionMode;

use crate::tick::{Phase, System};
use crate::world;

#[derive(Default)]
pub struct CompanionAiSystem;

impl CompanionAiSystem {
    pub fn new() -> Self {
        Self
    }
}

impl System for CompanionAiSystem {
    fn name(&self) -> &'static str {
        "companion_ai"
    }

    fn phase(&self) -> Phase {
        Phase::Update
    }

    fn run(&mut self, _current_tick: u64) {
        let companions: Vec<(u64, Option<u64>, CompanionMode)> = world::with(|state| {
            state
                .npcs
                .iter()
                .filter(|(_, n)| n.is_owned() && n.is_alive())
                .filter_map(|(id, n)| Some((*id, n.owner_id(), n.companion_mode?)))
                .collect()
        });

        for (npc_id, owner_id, mode) in companions {
            match mode {
                CompanionMode::Dismiss => self.dismiss(npc_id),
                CompanionMode::Rest => {}
                CompanionMode::Whistle | CompanionMode::Extend => self.follow(npc_id, owner_id),
                CompanionMode::Alert | CompanionMode::Aggressive | CompanionMode::Defensive => {
                    // No hostile-aggro acquisition pass yet distinct from
                    // `NpcAiSystem`'s; a companion with nothing to fight
                    // just stays near its owner.
                    self.follow(npc_id, owner_id);
                }
            }
        }
    }
}

impl CompanionAiSystem {
    fn dismiss(&self, npc_id: u64) {
        world::with_mut(|state| {
            if let Some(npc) = state.npcs.get(&npc_id) {
                state.occupancy.vacate(npc.map, npc.x, npc.y);
            }
            state.npc_aoi.remove(npc_id);
            state.npcs.remove(&npc_id);
        });
    }

    /// Single-tile greedy step toward the owner's current tile. Not
    /// pathfinding: a companion that gets stuck behind an obstacle just
    /// waits for its owner to come back into a straight line, which is an
    /// acceptable shortcut for a following pet rather than a hunting mob.
    fn follow(&self, npc_id: u64, owner_id: Option<u64>) {
        let Some(owner_id) = owner_id else { return };

        world::with_mut(|state| {
            let Some((map, x, y)) = state.npcs.get(&npc_id).map(|n| (n.map, n.x, n.y)) else { return };
            let Some((owner_map, ox, oy)) = state.players.get(&owner_id).map(|p| (p.map, p.x, p.y)) else {
                return;
            };
            if map != owner_map {
                return;
            }

            let dx = (ox - x).signum();
            let dy = (oy - y).signum();
            if dx == 0 && dy == 0 {
                return;
            }
            // Stay adjacent rather than stacking on the owner's own tile.
            if (ox - x).abs() <= 1 && (oy - y).abs() <= 1 {
                return;
            }

            let (nx, ny) = (x + dx, y + dy);
            if state.occupancy.is_blocked(map, nx, ny) {
                return;
            }
            state.occupancy.vacate(map, x, y);
            state.occupancy.try_occupy(npc_id, map, nx, ny);
            state.npc_aoi.relocate(npc_id, map, nx, ny);
            if let Some(npc) = state.npcs.get_mut(&npc_id) {
                npc.x = nx;
                npc.y = ny;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::types::{Npc, NpcKind, Player};

    fn companion(id: u64, owner_id: u64, x: i32, y: i32, mode: CompanionMode) -> Npc {
        Npc {
            id,
            template_id: 1,
            kind: NpcKind::Pet { owner_id },
            map: 0,
            x,
            y,
            heading: 0,
            hp: 10,
            max_hp: 10,
            buffs: Vec::new(),
            aggro_target: None,
            spawn_point: None,
            respawn_at_tick: None,
            attack_cooldown: 0,
            move_cooldown: 0,
            companion_mode: Some(mode),
        }
    }

    fn owner(id: u64, x: i32, y: i32) -> Player {
        Player {
            id,
            account_id: 1,
            name: "owner".into(),
            map: 0,
            x,
            y,
            heading: 0,
            level: 1,
            experience: 0,
            hp: 10,
            max_hp: 10,
            mp: 10,
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
    fn runs_cleanly_with_no_npcs() {
        let mut system = CompanionAiSystem::new();
        system.run(1);
    }

    #[test]
    fn whistle_steps_companion_toward_owner() {
        world::with_mut(|state| {
            state.insert_player(owner(2001, 10, 10));
            state.npcs.insert(2002, companion(2002, 2001, 0, 0, CompanionMode::Whistle));
        });

        let mut system = CompanionAiSystem::new();
        system.run(1);

        let (x, y) = world::with(|state| {
            let n = state.npcs.get(&2002).unwrap();
            (n.x, n.y)
        });
        assert_eq!((x, y), (1, 1));

        world::with_mut(|state| {
            state.npcs.remove(&2002);
            state.remove_player(2001);
        });
    }

    #[test]
    fn dismiss_removes_the_companion() {
        world::with_mut(|state| {
            state.insert_player(owner(2003, 5, 5));
            state.npcs.insert(2004, companion(2004, 2003, 5, 6, CompanionMode::Dismiss));
            state.npc_aoi.insert(2004, 0, 5, 6);
        });

        let mut system = CompanionAiSystem::new();
        system.run(1);

        assert!(!world::with(|state| state.npcs.contains_key(&2004)));

        world::with_mut(|state| state.remove_player(2003));
    }
}
