//! Phase 2 (Update): NPC AI loop for hostile mobs — the system the original
//! design calls out as the hard part. Perception (who's nearby, what state
//! am I in) and command execution (actually moving/attacking) stay in the
//! engine; only the decision of what to do with that information is
//! delegated to the script bridge. Owned NPCs (pets/summons/dolls/
//! followers) run their own, simpler loop in `CompanionAiSystem`.

use core::constants::{NPC_ATTACK_COOLDOWN_TICKS, NPC_MOVE_COOLDOWN_TICKS, NPC_PERCEPTION_RADIUS};
use core::types::NpcKind;

use crate::event_bus::{self, GameEvent};
use crate::path_finding::{self, PathFinder};
use crate::script_bridge::{AiAction, NpcAiContext, ScriptBridge};
use crate::tick::{Phase, System};
use crate::world;
use parking_lot::Mutex;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;

fn chebyshev(ax: i32, ay: i32, bx: i32, by: i32) -> i32 {
    (ax - bx).abs().max((ay - by).abs())
}

pub struct NpcAiSystem {
    bridge: Arc<ScriptBridge>,
    pathfinder: Mutex<PathFinder>,
    /// Last heading picked for an NPC's undirected wander, so `dir: -1`
    /// ("continue") has something to continue.
    wander_heading: Mutex<HashMap<u64, u8>>,
}

impl NpcAiSystem {
    pub fn new(bridge: Arc<ScriptBridge>) -> Self {
        Self {
            bridge,
            pathfinder: Mutex::new(PathFinder::new()),
            wander_heading: Mutex::new(HashMap::new()),
        }
    }
}

impl System for NpcAiSystem {
    fn name(&self) -> &'static str {
        "npc_ai"
    }

    fn phase(&self) -> Phase {
        Phase::Update
    }

    fn run(&mut self, current_tick: u64) {
        // Step 1: cooldown decrement, for every living hostile NPC.
        let npc_ids: Vec<u64> = world::with_mut(|state| {
            let mut ids = Vec::new();
            for (id, npc) in state.npcs.iter_mut() {
                if !matches!(npc.kind, NpcKind::Hostile) || !npc.is_alive() {
                    continue;
                }
                npc.attack_cooldown = npc.attack_cooldown.saturating_sub(1);
                npc.move_cooldown = npc.move_cooldown.saturating_sub(1);
                ids.push(*id);
            }
            ids
        });

        for npc_id in npc_ids {
            self.run_one(npc_id, current_tick);
        }
    }
}

impl NpcAiSystem {
    fn run_one(&self, npc_id: u64, current_tick: u64) {
        // Step 2: perception. Drop a stale target, then scan for a fresh one
        // if the NPC doesn't have one.
        let acquired_nearby = world::with_mut(|state| {
            let (map, x, y, mut target) = {
                let Some(npc) = state.npcs.get(&npc_id) else { return None };
                (npc.map, npc.x, npc.y, npc.aggro_target)
            };

            if let Some(target_id) = target {
                let still_valid = state
                    .players
                    .get(&target_id)
                    .map(|p| p.is_alive() && p.map == map)
                    .unwrap_or(false);
                if !still_valid {
                    target = None;
                }
            }

            let mut nearby_any = false;
            if target.is_none() {
                let mut closest: Option<(u64, i32)> = None;
                for candidate_id in state.player_aoi.nearby(map, x, y) {
                    let Some(player) = state.players.get(&candidate_id) else { continue };
                    if !player.is_alive() {
                        continue;
                    }
                    nearby_any = true;
                    let dist = chebyshev(x, y, player.x, player.y);
                    if dist > NPC_PERCEPTION_RADIUS {
                        continue;
                    }
                    if closest.map(|(_, d)| dist < d).unwrap_or(true) {
                        closest = Some((candidate_id, dist));
                    }
                }
                target = closest.map(|(id, _)| id);
            }

            if let Some(npc) = state.npcs.get_mut(&npc_id) {
                npc.aggro_target = target;
            }
            Some((target.is_some(), nearby_any))
        });

        let Some((has_target, nearby_any)) = acquired_nearby else { return };

        // Step 3: nothing to react to and no target — skip the script call.
        if !has_target && !nearby_any {
            return;
        }

        // Step 4: pack the context record and ask the script what to do.
        let Some(ctx) = self.build_context(npc_id) else { return };
        let decision = self.bridge.on_npc_ai(&ctx);

        // Step 5: execute the one command the script chose.
        match decision.action {
            AiAction::Idle => {}
            AiAction::LoseAggro => {
                world::with_mut(|state| {
                    if let Some(npc) = state.npcs.get_mut(&npc_id) {
                        npc.aggro_target = None;
                    }
                });
            }
            AiAction::MoveToward { x, y } => self.move_toward(npc_id, x, y, current_tick),
            AiAction::Wander { dir } => self.wander(npc_id, dir, current_tick),
            AiAction::Attack { target_id } => self.attack(npc_id, target_id, false),
            AiAction::RangedAttack { target_id } => self.attack(npc_id, target_id, true),
            AiAction::Skill { skill_id, target_id } => self.cast_skill(npc_id, skill_id, target_id),
        }
    }

    fn build_context(&self, npc_id: u64) -> Option<NpcAiContext> {
        world::with(|state| {
            let npc = state.npcs.get(&npc_id)?;
            let target_distance = npc.aggro_target.and_then(|target_id| {
                state.players.get(&target_id).map(|p| chebyshev(npc.x, npc.y, p.x, p.y))
            });
            let distance_from_spawn = npc
                .spawn_point
                .map(|(_, sx, sy)| chebyshev(npc.x, npc.y, sx, sy))
                .unwrap_or(0);
            Some(NpcAiContext {
                npc_id,
                template_id: npc.template_id,
                hp: npc.hp,
                max_hp: npc.max_hp,
                map: npc.map,
                x: npc.x,
                y: npc.y,
                attack_cooldown: npc.attack_cooldown,
                move_cooldown: npc.move_cooldown,
                target_id: npc.aggro_target,
                target_distance,
                distance_from_spawn,
            })
        })
    }

    /// Deals melee or ranged damage to `target_id` and resets the attack
    /// cooldown. Still a no-op while the cooldown hasn't lapsed — the
    /// script is allowed to ask for an attack it can't yet make; the engine
    /// is what actually gates it.
    fn attack(&self, npc_id: u64, target_id: u64, ranged: bool) {
        let ready = world::with(|state| {
            state.npcs.get(&npc_id).map(|n| n.attack_cooldown == 0).unwrap_or(false)
        });
        if !ready {
            return;
        }

        let outcome = self.bridge.on_melee_damage(npc_id, target_id);
        if !outcome.is_hit {
            world::with_mut(|state| {
                if let Some(npc) = state.npcs.get_mut(&npc_id) {
                    npc.attack_cooldown = NPC_ATTACK_COOLDOWN_TICKS;
                }
            });
            return;
        }

        let died = world::with_mut(|state| {
            if let Some(npc) = state.npcs.get_mut(&npc_id) {
                npc.attack_cooldown = NPC_ATTACK_COOLDOWN_TICKS;
            }
            if let Some(target) = state.players.get_mut(&target_id) {
                target.apply_damage(outcome.damage);
                !target.is_alive()
            } else {
                false
            }
        });

        event_bus::with_mut(|events| {
            events.publish(GameEvent::Damage {
                attacker_id: npc_id,
                target_id,
                amount: outcome.damage,
            });
            if died {
                events.publish(GameEvent::Death { entity_id: target_id, killer_id: Some(npc_id) });
            }
        });

        let _ = ranged; // no distinct projectile packet yet; same damage path
    }

    fn cast_skill(&self, npc_id: u64, skill_id: u32, target_id: Option<u64>) {
        let outcome = self.bridge.on_skill_effect(npc_id, skill_id, target_id);
        let Some(target_id) = target_id else { return };

        if let Some(damage) = outcome.damage {
            let died = world::with_mut(|state| {
                if let Some(target) = state.players.get_mut(&target_id) {
                    target.apply_damage(damage);
                    !target.is_alive()
                } else {
                    false
                }
            });
            event_bus::with_mut(|events| {
                events.publish(GameEvent::Damage { attacker_id: npc_id, target_id, amount: damage });
                if died {
                    events.publish(GameEvent::Death { entity_id: target_id, killer_id: Some(npc_id) });
                }
            });
        }
    }

    /// Takes one tile step toward `(tx, ty)`, or none if the pathfinder
    /// finds no way forward this tick. NPC movement is never a teleport:
    /// every tick advances at most one tile, same as a player's move.
    fn move_toward(&self, npc_id: u64, tx: i32, ty: i32, current_tick: u64) {
        let ready = world::with(|state| {
            state.npcs.get(&npc_id).map(|n| n.move_cooldown == 0).unwrap_or(false)
        });
        if !ready {
            return;
        }
        if self.step_toward(npc_id, tx, ty, current_tick) {
            world::with_mut(|state| {
                if let Some(npc) = state.npcs.get_mut(&npc_id) {
                    npc.move_cooldown = NPC_MOVE_COOLDOWN_TICKS;
                }
            });
        }
    }

    /// `dir == -1` continues the last wander heading, `-2` biases a step
    /// back toward spawn, otherwise `dir` is an explicit heading.
    fn wander(&self, npc_id: u64, dir: i32, current_tick: u64) {
        let ready = world::with(|state| {
            state.npcs.get(&npc_id).map(|n| n.move_cooldown == 0).unwrap_or(false)
        });
        if !ready {
            return;
        }

        if dir == -2 {
            let spawn = world::with(|state| state.npcs.get(&npc_id).and_then(|n| n.spawn_point));
            if let Some((_, sx, sy)) = spawn {
                if self.step_toward(npc_id, sx, sy, current_tick) {
                    world::with_mut(|state| {
                        if let Some(npc) = state.npcs.get_mut(&npc_id) {
                            npc.move_cooldown = NPC_MOVE_COOLDOWN_TICKS;
                        }
                    });
                }
            }
            return;
        }

        let heading = if (1..=8).contains(&dir) {
            dir as u8
        } else {
            let mut headings = self.wander_heading.lock();
            *headings.entry(npc_id).or_insert_with(|| {
                rand::thread_rng().gen_range(path_finding::DIR_RIGHT..=path_finding::DIR_RIGHTUP)
            })
        };

        let Some((dx, dy)) = path_finding::direction_delta(heading) else { return };
        let stepped = world::with_mut(|state| {
            let Some((map, x, y)) = state.npcs.get(&npc_id).map(|n| (n.map, n.x, n.y)) else {
                return false;
            };
            let (nx, ny) = (x + dx, y + dy);
            if state.occupancy.is_blocked(map, nx, ny) {
                return false;
            }
            state.occupancy.vacate(map, x, y);
            state.occupancy.try_occupy(npc_id, map, nx, ny);
            state.npc_aoi.relocate(npc_id, map, nx, ny);
            if let Some(npc) = state.npcs.get_mut(&npc_id) {
                npc.x = nx;
                npc.y = ny;
                npc.heading = heading;
            }
            true
        });

        if stepped {
            self.wander_heading.lock().insert(npc_id, heading);
            world::with_mut(|state| {
                if let Some(npc) = state.npcs.get_mut(&npc_id) {
                    npc.move_cooldown = NPC_MOVE_COOLDOWN_TICKS;
                }
            });
        } else {
            self.wander_heading.lock().remove(&npc_id);
        }
    }

    /// Shared single-tile-step primitive used by both `move_toward` and the
    /// spawn-biased wander. Returns whether a step was actually taken.
    fn step_toward(&self, npc_id: u64, tx: i32, ty: i32, current_tick: u64) -> bool {
        let Some((map, x, y, heading)) =
            world::with(|state| state.npcs.get(&npc_id).map(|n| (n.map, n.x, n.y, n.heading)))
        else {
            return false;
        };

        let dir = world::with(|state| {
            self.pathfinder
                .lock()
                .find_path(&state.occupancy, map, x, y, heading, tx, ty, true, current_tick)
        });
        let Some(dir) = dir else { return false };
        let Some((dx, dy)) = path_finding::direction_delta(dir) else { return false };

        world::with_mut(|state| {
            let (nx, ny) = (x + dx, y + dy);
            if state.occupancy.is_blocked(map, nx, ny) {
                return false;
            }
            state.occupancy.vacate(map, x, y);
            state.occupancy.try_occupy(npc_id, map, nx, ny);
            state.npc_aoi.relocate(npc_id, map, nx, ny);
            if let Some(npc) = state.npcs.get_mut(&npc_id) {
                npc.x = nx;
                npc.y = ny;
                npc.heading = dir;
            }
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script_bridge::ScriptBridge;
    use core::types::{Npc, NpcKind, Player};

    fn npc(id: u64, x: i32, y: i32) -> Npc {
        Npc {
            id,
            template_id: 1,
            kind: NpcKind::Hostile,
            map: 7,
            x,
            y,
            heading: 0,
            hp: 10,
            max_hp: 10,
            buffs: Vec::new(),
            aggro_target: None,
            spawn_point: Some((7, x, y)),
            respawn_at_tick: None,
            attack_cooldown: 0,
            move_cooldown: 0,
            companion_mode: None,
        }
    }

    fn player(id: u64, x: i32, y: i32) -> Player {
        Player {
            id,
            account_id: 1,
            name: format!("p{id}"),
            map: 7,
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
        let bridge = Arc::new(ScriptBridge::new_without_scripts());
        let mut system = NpcAiSystem::new(bridge);
        system.run(1);
    }

    #[test]
    fn move_toward_steps_npc_one_tile_toward_target() {
        world::with_mut(|state| {
            state.npcs.insert(501, npc(501, 0, 0));
            state.npc_aoi.insert(501, 7, 0, 0);
        });

        let bridge = Arc::new(ScriptBridge::new_without_scripts());
        let system = NpcAiSystem::new(bridge);
        assert!(system.step_toward(501, 5, 0, 1));

        let (x, y) = world::with(|state| {
            let npc = state.npcs.get(&501).unwrap();
            (npc.x, npc.y)
        });
        assert_eq!((x, y), (1, 0));

        world::with_mut(|state| {
            state.npcs.remove(&501);
            state.npc_aoi.remove(501);
        });
    }

    #[test]
    fn perception_acquires_the_closest_player_in_range() {
        world::with_mut(|state| {
            state.npcs.insert(502, npc(502, 0, 0));
            state.npc_aoi.insert(502, 7, 0, 0);
            state.insert_player(player(900_502, 3, 0));
        });

        let bridge = Arc::new(ScriptBridge::new_without_scripts());
        let mut system = NpcAiSystem::new(bridge);
        system.run(1);

        let target = world::with(|state| state.npcs.get(&502).unwrap().aggro_target);
        assert_eq!(target, Some(900_502));

        world::with_mut(|state| {
            state.npcs.remove(&502);
            state.npc_aoi.remove(502);
            state.remove_player(900_502);
        });
    }

    #[test]
    fn idle_npc_with_no_nearby_players_is_skipped_without_calling_the_script() {
        world::with_mut(|state| {
            state.npcs.insert(503, npc(503, 0, 0));
            state.npc_aoi.insert(503, 7, 0, 0);
        });

        let bridge = Arc::new(ScriptBridge::new_without_scripts());
        let mut system = NpcAiSystem::new(bridge);
        system.run(1);

        let (x, y) = world::with(|state| {
            let n = state.npcs.get(&503).unwrap();
            (n.x, n.y)
        });
        assert_eq!((x, y), (0, 0));

        world::with_mut(|state| {
            state.npcs.remove(&503);
            state.npc_aoi.remove(503);
        });
    }
}
