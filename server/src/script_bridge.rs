//! Bridge into an embedded Lua VM for combat, AI, regen, enchant, and
//! potion formulas. The engine owns perception and command execution;
//! scripts only decide policy, by answering well-known global functions
//! with marshalled table arguments.
//!
//! Touched only from the game-loop thread, matching the single-VM
//! constraint: `mlua::Lua` is not `Sync`, and nothing here tries to make it
//! one. A script that fails to load, or a call that errors, is logged and
//! the bridge falls back to a safe default in-process rather than letting
//! one bad script take the tick down.

use mlua::{Lua, Table};
use std::path::Path;

pub struct MeleeOutcome {
    pub is_hit: bool,
    pub damage: i32,
}

pub struct SkillOutcome {
    pub mp_cost: i32,
    /// `Some` if the skill deals damage to the target.
    pub damage: Option<i32>,
    /// `Some` if the skill applies a status-effect buff to the target
    /// instead of (or alongside) damage; magnitude/kind is left to the
    /// caller, this only carries the raw numbers the script returned.
    pub buff_magnitude: Option<i32>,
    pub buff_ticks: Option<u32>,
}

/// Everything the engine has already worked out about one NPC's situation
/// before asking the script what to do with it — perception and cooldowns
/// stay in Rust, only the decision crosses into Lua.
pub struct NpcAiContext {
    pub npc_id: u64,
    pub template_id: u32,
    pub hp: i32,
    pub max_hp: i32,
    pub map: u16,
    pub x: i32,
    pub y: i32,
    pub attack_cooldown: u32,
    pub move_cooldown: u32,
    pub target_id: Option<u64>,
    pub target_distance: Option<i32>,
    pub distance_from_spawn: i32,
}

pub struct AiDecision {
    pub action: AiAction,
}

pub enum AiAction {
    Idle,
    Attack { target_id: u64 },
    RangedAttack { target_id: u64 },
    Skill { skill_id: u32, target_id: Option<u64> },
    MoveToward { x: i32, y: i32 },
    /// `-1` continues whatever wander the NPC was already doing, `-2` biases
    /// a step back toward its spawn point, `0..=7` is an explicit heading.
    Wander { dir: i32 },
    LoseAggro,
}

/// What to do with a player who just hit 0 HP: where they wake back up and
/// how much experience the death costs them.
pub struct DeathOutcome {
    pub respawn_map: u16,
    pub respawn_x: i32,
    pub respawn_y: i32,
    pub exp_penalty: u64,
}

pub struct ScriptBridge {
    lua: Lua,
    loaded: bool,
}

impl ScriptBridge {
    /// Loads every `*.lua` file directly under `scripts_dir`. A missing
    /// directory is not fatal: the bridge simply runs with no scripts
    /// loaded and every hook falls back to its safe default.
    pub fn load(scripts_dir: &str) -> Self {
        let lua = Lua::new();
        let mut loaded = false;

        let dir = Path::new(scripts_dir);
        if dir.is_dir() {
            if let Ok(entries) = std::fs::read_dir(dir) {
                for entry in entries.flatten() {
                    let path = entry.path();
                    if path.extension().and_then(|e| e.to_str()) != Some("lua") {
                        continue;
                    }
                    match std::fs::read_to_string(&path) {
                        Ok(source) => match lua.load(&source).exec() {
                            Ok(()) => loaded = true,
                            Err(e) => log::error!("script {path:?} failed to load: {e}"),
                        },
                        Err(e) => log::error!("script {path:?} unreadable: {e}"),
                    }
                }
            }
        } else {
            log::warn!("scripts directory {scripts_dir} not found, running with no scripts");
        }

        Self { lua, loaded }
    }

    pub fn new_without_scripts() -> Self {
        Self {
            lua: Lua::new(),
            loaded: false,
        }
    }

    fn call_table_fn(&self, name: &str, args: Vec<(&str, i64)>) -> Option<Table> {
        if !self.loaded {
            return None;
        }
        let globals = self.lua.globals();
        let func: mlua::Function = globals.get(name).ok()?;
        let table = self.lua.create_table().ok()?;
        for (k, v) in args {
            let _ = table.set(k, v);
        }
        match func.call::<_, Table>(table) {
            Ok(result) => Some(result),
            Err(e) => {
                log::error!("script call {name} failed: {e}");
                None
            }
        }
    }

    pub fn on_melee_damage(&self, attacker_id: u64, target_id: u64) -> MeleeOutcome {
        if let Some(result) = self.call_table_fn(
            "on_melee_damage",
            vec![("attacker_id", attacker_id as i64), ("target_id", target_id as i64)],
        ) {
            let is_hit: bool = result.get("is_hit").unwrap_or(true);
            let damage: i64 = result.get("damage").unwrap_or(1);
            return MeleeOutcome {
                is_hit,
                damage: damage as i32,
            };
        }
        MeleeOutcome {
            is_hit: true,
            damage: 1,
        }
    }

    pub fn on_skill_effect(&self, caster_id: u64, skill_id: u32, target_id: Option<u64>) -> SkillOutcome {
        if let Some(result) = self.call_table_fn(
            "on_skill_effect",
            vec![
                ("caster_id", caster_id as i64),
                ("skill_id", skill_id as i64),
                ("target_id", target_id.unwrap_or(0) as i64),
            ],
        ) {
            return SkillOutcome {
                mp_cost: result.get::<_, i64>("mp_cost").unwrap_or(0) as i32,
                damage: result.get::<_, Option<i64>>("damage").ok().flatten().map(|d| d as i32),
                buff_magnitude: result
                    .get::<_, Option<i64>>("buff_magnitude")
                    .ok()
                    .flatten()
                    .map(|m| m as i32),
                buff_ticks: result
                    .get::<_, Option<i64>>("buff_ticks")
                    .ok()
                    .flatten()
                    .map(|t| t as u32),
            };
        }
        SkillOutcome {
            mp_cost: 0,
            damage: None,
            buff_magnitude: None,
            buff_ticks: None,
        }
    }

    /// Runs the 5-step NPC AI contract's decision step: the engine has
    /// already done perception and cooldown bookkeeping into `ctx`; the
    /// script only picks what to do with it.
    pub fn on_npc_ai(&self, ctx: &NpcAiContext) -> AiDecision {
        if let Some(result) = self.call_table_fn(
            "on_npc_ai",
            vec![
                ("npc_id", ctx.npc_id as i64),
                ("template_id", ctx.template_id as i64),
                ("hp", ctx.hp as i64),
                ("max_hp", ctx.max_hp as i64),
                ("attack_cooldown", ctx.attack_cooldown as i64),
                ("move_cooldown", ctx.move_cooldown as i64),
                ("target_id", ctx.target_id.unwrap_or(0) as i64),
                ("target_distance", ctx.target_distance.unwrap_or(-1) as i64),
                ("distance_from_spawn", ctx.distance_from_spawn as i64),
            ],
        ) {
            let action: String = result.get("action").unwrap_or_else(|_| "idle".to_string());
            return match action.as_str() {
                "attack" => AiDecision {
                    action: AiAction::Attack {
                        target_id: result.get::<_, i64>("target_id").unwrap_or(0) as u64,
                    },
                },
                "ranged_attack" => AiDecision {
                    action: AiAction::RangedAttack {
                        target_id: result.get::<_, i64>("target_id").unwrap_or(0) as u64,
                    },
                },
                "skill" => AiDecision {
                    action: AiAction::Skill {
                        skill_id: result.get::<_, i64>("skill_id").unwrap_or(0) as u32,
                        target_id: result
                            .get::<_, Option<i64>>("target_id")
                            .ok()
                            .flatten()
                            .map(|t| t as u64),
                    },
                },
                "move_toward" => AiDecision {
                    action: AiAction::MoveToward {
                        x: result.get::<_, i64>("x").unwrap_or(ctx.x as i64) as i32,
                        y: result.get::<_, i64>("y").unwrap_or(ctx.y as i64) as i32,
                    },
                },
                "wander" => AiDecision {
                    action: AiAction::Wander {
                        dir: result.get::<_, i64>("dir").unwrap_or(-1) as i32,
                    },
                },
                "lose_aggro" => AiDecision { action: AiAction::LoseAggro },
                _ => AiDecision { action: AiAction::Idle },
            };
        }

        // Fallback with no scripts loaded: chase and melee a known target,
        // otherwise stand still. Keeps the engine functional in tests and
        // in a deployment still missing its content scripts.
        match ctx.target_id {
            Some(target_id) if ctx.attack_cooldown == 0 && ctx.target_distance == Some(1) => {
                AiDecision { action: AiAction::Attack { target_id } }
            }
            Some(_) if ctx.move_cooldown == 0 => AiDecision {
                action: AiAction::Wander { dir: -1 },
            },
            _ => AiDecision { action: AiAction::Idle },
        }
    }

    /// Looks up where a player respawns and how much experience they lose.
    /// Falls back to the character's last-known position with no penalty —
    /// good enough to keep the server running with no death-table scripts
    /// loaded, though clearly not a balanced default.
    pub fn on_player_death(&self, player_id: u64, level: u32, map: u16, x: i32, y: i32) -> DeathOutcome {
        if let Some(result) = self.call_table_fn(
            "on_player_death",
            vec![("player_id", player_id as i64), ("level", level as i64)],
        ) {
            return DeathOutcome {
                respawn_map: result.get::<_, i64>("respawn_map").unwrap_or(map as i64) as u16,
                respawn_x: result.get::<_, i64>("respawn_x").unwrap_or(x as i64) as i32,
                respawn_y: result.get::<_, i64>("respawn_y").unwrap_or(y as i64) as i32,
                exp_penalty: result.get::<_, i64>("exp_penalty").unwrap_or(0).max(0) as u64,
            };
        }
        DeathOutcome {
            respawn_map: map,
            respawn_x: x,
            respawn_y: y,
            exp_penalty: 0,
        }
    }

    pub fn on_regen(&self, entity_id: u64, base_amount: i32) -> i32 {
        if let Some(result) =
            self.call_table_fn("on_regen", vec![("entity_id", entity_id as i64), ("base", base_amount as i64)])
        {
            return result.get::<_, i64>("amount").unwrap_or(base_amount as i64) as i32;
        }
        base_amount
    }

    pub fn on_enchant_attempt(&self, item_id: u64, base_probability: f64) -> bool {
        if let Some(result) = self.call_table_fn("on_enchant_attempt", vec![("item_id", item_id as i64)]) {
            return result.get("success").unwrap_or(false);
        }
        // Fallback: deterministic-ish coin flip against the base probability.
        (item_id % 100) as f64 / 100.0 < base_probability
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(npc_id: u64) -> NpcAiContext {
        NpcAiContext {
            npc_id,
            template_id: 1,
            hp: 10,
            max_hp: 10,
            map: 0,
            x: 0,
            y: 0,
            attack_cooldown: 0,
            move_cooldown: 0,
            target_id: None,
            target_distance: None,
            distance_from_spawn: 0,
        }
    }

    #[test]
    fn unloaded_bridge_falls_back_to_default_melee_outcome() {
        let bridge = ScriptBridge::new_without_scripts();
        let outcome = bridge.on_melee_damage(1, 2);
        assert!(outcome.is_hit);
        assert_eq!(outcome.damage, 1);
    }

    #[test]
    fn unloaded_bridge_ai_idles_with_no_target() {
        let bridge = ScriptBridge::new_without_scripts();
        matches!(bridge.on_npc_ai(&ctx(1)).action, AiAction::Idle);
    }

    #[test]
    fn unloaded_bridge_ai_attacks_adjacent_target_off_cooldown() {
        let bridge = ScriptBridge::new_without_scripts();
        let mut c = ctx(1);
        c.target_id = Some(42);
        c.target_distance = Some(1);
        match bridge.on_npc_ai(&c).action {
            AiAction::Attack { target_id } => assert_eq!(target_id, 42),
            _ => panic!("expected Attack"),
        }
    }

    #[test]
    fn unloaded_bridge_ai_wanders_toward_distant_target() {
        let bridge = ScriptBridge::new_without_scripts();
        let mut c = ctx(1);
        c.target_id = Some(42);
        c.target_distance = Some(5);
        matches!(bridge.on_npc_ai(&c).action, AiAction::Wander { .. });
    }

    #[test]
    fn missing_scripts_directory_does_not_panic() {
        let bridge = ScriptBridge::load("/nonexistent/path/for/scripts");
        assert!(!bridge.loaded);
    }

    #[test]
    fn regen_fallback_returns_base_amount() {
        let bridge = ScriptBridge::new_without_scripts();
        assert_eq!(bridge.on_regen(1, 5), 5);
    }

    #[test]
    fn skill_fallback_has_no_effect() {
        let bridge = ScriptBridge::new_without_scripts();
        let outcome = bridge.on_skill_effect(1, 7, Some(2));
        assert_eq!(outcome.mp_cost, 0);
        assert!(outcome.damage.is_none());
    }

    #[test]
    fn death_fallback_respawns_in_place_with_no_penalty() {
        let bridge = ScriptBridge::new_without_scripts();
        let outcome = bridge.on_player_death(1, 5, 3, 10, 20);
        assert_eq!(outcome.respawn_map, 3);
        assert_eq!(outcome.respawn_x, 10);
        assert_eq!(outcome.respawn_y, 20);
        assert_eq!(outcome.exp_penalty, 0);
    }
}
