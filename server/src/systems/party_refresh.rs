//! Phase 3 (PostUpdate): periodically pushes each party member's current
//! position to every other member, independent of visibility/AOI — parties
//! track each other across the map, not just the local neighborhood.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::session::registry::SessionRegistry;
use crate::tick::{Phase, System};
use crate::world;

pub struct PartyRefreshSystem {
    registry: Arc<RwLock<SessionRegistry>>,
    interval_ticks: u64,
}

impl PartyRefreshSystem {
    pub fn new(registry: Arc<RwLock<SessionRegistry>>, interval_ticks: u32) -> Self {
        Self { registry, interval_ticks: (interval_ticks as u64).max(1) }
    }
}

impl System for PartyRefreshSystem {
    fn name(&self) -> &'static str {
        "party_refresh"
    }

    fn phase(&self) -> Phase {
        Phase::PostUpdate
    }

    fn run(&mut self, current_tick: u64) {
        if current_tick % self.interval_ticks != 0 {
            return;
        }

        let positions: HashMap<u64, (u16, i32, i32)> =
            world::with(|state| state.players.values().map(|p| (p.id, (p.map, p.x, p.y))).collect());
        let parties: HashMap<u64, Vec<u64>> = world::with(|state| {
            let mut parties: HashMap<u64, Vec<u64>> = HashMap::new();
            for player in state.players.values() {
                if let Some(party_id) = player.party_id {
                    parties.entry(party_id).or_default().push(player.id);
                }
            }
            parties
        });

        if parties.is_empty() {
            return;
        }

        let registry = self.registry.read();
        for session in registry.sessions() {
            let Some(player_id) = *session.player_id.lock() else { continue };
            let Some(party_id) = world::with(|state| state.players.get(&player_id).and_then(|p| p.party_id)) else {
                continue;
            };
            let Some(members) = parties.get(&party_id) else { continue };

            let mut writer = core::codec::PacketWriter::new(0x22).u8(members.len().saturating_sub(1) as u8);
            for &member_id in members {
                if member_id == player_id {
                    continue;
                }
                let Some((map, x, y)) = positions.get(&member_id) else { continue };
                writer = writer.u32(member_id as u32).u16(*map).i32(*x).i32(*y);
            }
            session.send(writer.into_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_cleanly_with_no_parties() {
        let registry = Arc::new(RwLock::new(SessionRegistry::new()));
        let mut system = PartyRefreshSystem::new(registry, 10);
        system.run(10);
    }

    #[test]
    fn skips_off_interval_ticks() {
        let registry = Arc::new(RwLock::new(SessionRegistry::new()));
        let mut system = PartyRefreshSystem::new(registry, 10);
        system.run(7); // not a multiple of 10, should be a no-op either way
    }
}
