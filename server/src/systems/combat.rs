//! Phase 2 (Update): resolves queued attacks, applies damage, and emits
//! Death/Damage events. Combat math itself is delegated to the script
//! bridge so content authors can tune it without a rebuild.

use crate::event_bus::{self, GameEvent};
use crate::script_bridge::ScriptBridge;
use crate::tick::{Phase, System};
use crate::world;
use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};

pub struct PendingAttack {
    pub attacker_id: u64,
    pub target_id: u64,
}

static PENDING_ATTACKS: OnceLock<Mutex<Vec<PendingAttack>>> = OnceLock::new();

fn queue() -> &'static Mutex<Vec<PendingAttack>> {
    PENDING_ATTACKS.get_or_init(|| Mutex::new(Vec::new()))
}

/// Queues an attack for resolution in the next Combat phase. Called from
/// the Attack handler (Phase 0, Input), drained here (Phase 2, Update) —
/// the same global-queue pattern the event bus uses to bridge opcode
/// handlers, which only get a session and a reader, into game-loop state.
pub fn enqueue(attack: PendingAttack) {
    queue().lock().push(attack);
}

pub struct CombatSystem {
    bridge: Arc<ScriptBridge>,
}

impl CombatSystem {
    pub fn new(bridge: Arc<ScriptBridge>) -> Self {
        Self { bridge }
    }
}

impl System for CombatSystem {
    fn name(&self) -> &'static str {
        "combat"
    }

    fn phase(&self) -> Phase {
        Phase::Update
    }

    fn run(&mut self, _current_tick: u64) {
        let attacks: Vec<PendingAttack> = std::mem::take(&mut *queue().lock());
        for attack in attacks {
            let outcome = self
                .bridge
                .on_melee_damage(attack.attacker_id, attack.target_id);
            if !outcome.is_hit {
                continue;
            }

            let died = world::with_mut(|state| {
                if let Some(target) = state.players.get_mut(&attack.target_id) {
                    target.apply_damage(outcome.damage);
                    !target.is_alive()
                } else if let Some(target) = state.npcs.get_mut(&attack.target_id) {
                    target.hp = (target.hp - outcome.damage.max(0)).max(0);
                    !target.is_alive()
                } else {
                    false
                }
            });

            event_bus::with_mut(|events| {
                events.publish(GameEvent::Damage {
                    attacker_id: attack.attacker_id,
                    target_id: attack.target_id,
                    amount: outcome.damage,
                });
                if died {
                    events.publish(GameEvent::Death {
                        entity_id: attack.target_id,
                        killer_id: Some(attack.attacker_id),
                    });
                }
            });
        }
    }
}
