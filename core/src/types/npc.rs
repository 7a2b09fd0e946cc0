//! Non-player entities: hostile mobs, player pets/summons, crafted dolls,
//! and hired followers. All share one representation; `kind` selects which
//! capability tags (and which script-bridge hooks) apply at AI time.

use super::buff::Buff;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NpcKind {
    Hostile,
    Pet { owner_id: u64 },
    Summon { owner_id: u64, expires_at_tick: u64 },
    Doll { owner_id: u64 },
    Follower { owner_id: u64 },
}

/// Owner-issued behavior mode for a Pet/Summon/Doll/Follower. These values
/// are part of the wire protocol (the client's pet-command packet) and must
/// keep their meaning even though only `CompanionAiSystem` acts on them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompanionMode {
    Aggressive,
    Defensive,
    Rest,
    Extend,
    Alert,
    Dismiss,
    Whistle,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Npc {
    pub id: u64,
    pub template_id: u32,
    pub kind: NpcKind,
    pub map: u16,
    pub x: i32,
    pub y: i32,
    pub heading: u8,
    pub hp: i32,
    pub max_hp: i32,
    pub buffs: Vec<Buff>,
    pub aggro_target: Option<u64>,
    pub spawn_point: Option<(u16, i32, i32)>,
    pub respawn_at_tick: Option<u64>,
    /// Ticks remaining before this NPC may attack again. Decremented once per
    /// AI tick; an action that attacks resets it from the script's cooldown.
    pub attack_cooldown: u32,
    /// Ticks remaining before this NPC may take its next movement step.
    pub move_cooldown: u32,
    /// `Some` only for owned kinds; `None` for `Hostile`, which has no owner
    /// to issue it a mode.
    pub companion_mode: Option<CompanionMode>,
}

impl Npc {
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn is_owned(&self) -> bool {
        !matches!(self.kind, NpcKind::Hostile)
    }

    pub fn owner_id(&self) -> Option<u64> {
        match self.kind {
            NpcKind::Hostile => None,
            NpcKind::Pet { owner_id }
            | NpcKind::Summon { owner_id, .. }
            | NpcKind::Doll { owner_id }
            | NpcKind::Follower { owner_id } => Some(owner_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn npc(kind: NpcKind) -> Npc {
        Npc {
            id: 1,
            template_id: 1,
            kind,
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
    fn hostile_has_no_owner() {
        assert_eq!(npc(NpcKind::Hostile).owner_id(), None);
        assert!(!npc(NpcKind::Hostile).is_owned());
    }

    #[test]
    fn pet_reports_its_owner() {
        let n = npc(NpcKind::Pet { owner_id: 42 });
        assert_eq!(n.owner_id(), Some(42));
        assert!(n.is_owned());
    }
}
