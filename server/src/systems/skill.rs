//! Phase 2 (Update): resolves queued skill casts — a gameplay effect
//! invoked from handlers, the same pending-queue shape `CombatSystem` uses
//! for attacks, not a per-tick sweep. Deducts MP, then applies whatever mix
//! of damage and buff the script bridge returns for the skill.

use core::types::{Buff, BuffKind};

use crate::event_bus::{self, GameEvent};
use crate::script_bridge::ScriptBridge;
use crate::tick::{Phase, System};
use crate::world;
use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};

pub struct PendingSkill {
    pub caster_id: u64,
    pub skill_id: u32,
    pub target_id: Option<u64>,
}

static PENDING_SKILLS: OnceLock<Mutex<Vec<PendingSkill>>> = OnceLock::new();

fn queue() -> &'static Mutex<Vec<PendingSkill>> {
    PENDING_SKILLS.get_or_init(|| Mutex::new(Vec::new()))
}

/// Queues a skill cast for resolution in the next Update phase. Nothing in
/// this tree calls this yet — no handler decodes a cast-skill packet — the
/// same known gap `PolymorphSystem::enqueue` documents.
pub fn enqueue(skill: PendingSkill) {
    queue().lock().push(skill);
}

pub struct SkillSystem {
    bridge: Arc<ScriptBridge>,
}

impl SkillSystem {
    pub fn new(bridge: Arc<ScriptBridge>) -> Self {
        Self { bridge }
    }
}

impl System for SkillSystem {
    fn name(&self) -> &'static str {
        "skill"
    }

    fn phase(&self) -> Phase {
        Phase::Update
    }

    fn run(&mut self, _current_tick: u64) {
        let casts: Vec<PendingSkill> = std::mem::take(&mut *queue().lock());
        for cast in casts {
            let has_mp = world::with(|state| {
                state.players.get(&cast.caster_id).map(|p| p.mp).unwrap_or(0)
            });

            let outcome = self.bridge.on_skill_effect(cast.caster_id, cast.skill_id, cast.target_id);
            if has_mp < outcome.mp_cost {
                continue;
            }

            let died = world::with_mut(|state| {
                if let Some(caster) = state.players.get_mut(&cast.caster_id) {
                    caster.mp -= outcome.mp_cost;
                }

                let Some(target_id) = cast.target_id else { return false };

                if let (Some(magnitude), Some(ticks)) = (outcome.buff_magnitude, outcome.buff_ticks) {
                    if let Some(target) = state.players.get_mut(&target_id) {
                        target.buffs.push(Buff {
                            kind: BuffKind::StatModifier,
                            magnitude,
                            ticks_remaining: ticks,
                            source_id: cast.caster_id,
                        });
                    } else if let Some(target) = state.npcs.get_mut(&target_id) {
                        target.buffs.push(Buff {
                            kind: BuffKind::StatModifier,
                            magnitude,
                            ticks_remaining: ticks,
                            source_id: cast.caster_id,
                        });
                    }
                }

                let Some(damage) = outcome.damage else { return false };
                if let Some(target) = state.players.get_mut(&target_id) {
                    target.apply_damage(damage);
                    !target.is_alive()
                } else if let Some(target) = state.npcs.get_mut(&target_id) {
                    target.hp = (target.hp - damage.max(0)).max(0);
                    !target.is_alive()
                } else {
                    false
                }
            });

            let Some(target_id) = cast.target_id else { continue };
            if outcome.damage.is_none() {
                continue;
            }

            event_bus::with_mut(|events| {
                events.publish(GameEvent::Damage {
                    attacker_id: cast.caster_id,
                    target_id,
                    amount: outcome.damage.unwrap_or(0),
                });
                if died {
                    events.publish(GameEvent::Death { entity_id: target_id, killer_id: Some(cast.caster_id) });
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_cleanly_with_nothing_queued() {
        let bridge = Arc::new(ScriptBridge::new_without_scripts());
        let mut system = SkillSystem::new(bridge);
        system.run(1);
    }

    #[test]
    fn cast_against_unknown_target_is_a_no_op() {
        let bridge = Arc::new(ScriptBridge::new_without_scripts());
        let mut system = SkillSystem::new(bridge);
        enqueue(PendingSkill { caster_id: 1, skill_id: 10, target_id: Some(999_999) });
        system.run(1);
    }
}
