//! Clans (guild-like player organizations) and chat parties.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClanRank {
    Member,
    Officer,
    Leader,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Clan {
    pub id: u64,
    pub name: String,
    pub leader_character_id: u64,
    pub members: HashMap<u64, ClanRank>,
    pub announcement: Option<String>,
}

impl Clan {
    pub fn rank_of(&self, character_id: u64) -> Option<ClanRank> {
        self.members.get(&character_id).copied()
    }

    pub fn can_withdraw_warehouse(&self, character_id: u64) -> bool {
        matches!(
            self.rank_of(character_id),
            Some(ClanRank::Officer) | Some(ClanRank::Leader)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_officers_and_leaders_can_withdraw() {
        let mut members = HashMap::new();
        members.insert(1, ClanRank::Leader);
        members.insert(2, ClanRank::Member);
        let clan = Clan {
            id: 1,
            name: "Test".into(),
            leader_character_id: 1,
            members,
            announcement: None,
        };
        assert!(clan.can_withdraw_warehouse(1));
        assert!(!clan.can_withdraw_warehouse(2));
        assert!(!clan.can_withdraw_warehouse(99));
    }
}
