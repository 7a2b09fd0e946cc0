//! Attack: queues a melee swing for resolution in the next Combat phase.
//! The handler itself never touches hit chance or damage — that's the
//! script bridge's job, run once per tick against everything queued here.

use core::GameResult;

use crate::session::SessionHandle;
use crate::systems::combat::{enqueue, PendingAttack};

pub fn attack(session: &SessionHandle, reader: &mut core::codec::PacketReader) -> GameResult<()> {
    let target_id = reader.u32()? as u64;

    let Some(attacker_id) = *session.player_id.lock() else {
        return Ok(());
    };
    if attacker_id == target_id {
        return Ok(());
    }

    enqueue(PendingAttack { attacker_id, target_id });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus;
    use crate::script_bridge::ScriptBridge;
    use crate::session::test_support::dummy_handle;
    use crate::tick::System;
    use core::types::SessionState;
    use std::sync::Arc;

    fn reader(bytes: &[u8]) -> core::codec::PacketReader<'_> {
        let mut r = core::codec::PacketReader::new(bytes);
        let _ = r.opcode();
        r
    }

    #[test]
    fn attack_on_self_is_ignored() {
        let session = dummy_handle();
        session.set_state(SessionState::InWorld);
        *session.player_id.lock() = Some(42);
        let bytes = core::codec::PacketWriter::new(0x11).u32(42).into_bytes();
        let mut r = reader(&bytes);
        attack(&session, &mut r).unwrap();

        let bridge = Arc::new(ScriptBridge::new_without_scripts());
        let mut system = crate::systems::combat::CombatSystem::new(bridge);
        let before = event_bus::with(|events| events.drain_visible().len());
        system.run(1);
        event_bus::with_mut(|events| events.swap());
        let after = event_bus::with(|events| events.drain_visible().len());
        assert_eq!(after, before); // nothing enqueued, nothing resolved
    }

    #[test]
    fn attack_enqueues_and_resolves_next_combat_phase() {
        let session = dummy_handle();
        session.set_state(SessionState::InWorld);
        *session.player_id.lock() = Some(901_001);
        let bytes = core::codec::PacketWriter::new(0x11).u32(901_002).into_bytes();
        let mut r = reader(&bytes);
        attack(&session, &mut r).unwrap();

        let bridge = Arc::new(ScriptBridge::new_without_scripts());
        let mut system = crate::systems::combat::CombatSystem::new(bridge);
        let before = event_bus::with(|events| events.drain_visible().len());
        system.run(1);
        event_bus::with_mut(|events| events.swap());
        let after = event_bus::with(|events| events.drain_visible().len());
        assert_eq!(after, before + 1);
    }
}
