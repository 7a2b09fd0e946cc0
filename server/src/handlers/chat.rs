//! Chat: publishes a message onto the event bus so the Output system can
//! fan it out to everyone in range (or in channel) starting next tick.

use core::GameResult;

use crate::event_bus::{self, ChatChannel, GameEvent};
use crate::session::SessionHandle;

pub fn chat(session: &SessionHandle, reader: &mut core::codec::PacketReader) -> GameResult<()> {
    let channel_byte = reader.u8()?;
    let text = reader.legacy_text()?;

    let Some(speaker_id) = *session.player_id.lock() else {
        return Ok(());
    };
    if text.trim().is_empty() {
        return Ok(());
    }

    let channel = match channel_byte {
        1 => ChatChannel::Clan,
        2 => ChatChannel::Party,
        3 => ChatChannel::Global,
        _ => ChatChannel::Say,
    };

    event_bus::with_mut(|events| {
        events.publish(GameEvent::ChatMessage {
            speaker_id,
            channel,
            text,
        });
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::test_support::dummy_handle;
    use core::types::SessionState;

    fn reader(bytes: &[u8]) -> core::codec::PacketReader<'_> {
        let mut r = core::codec::PacketReader::new(bytes);
        let _ = r.opcode();
        r
    }

    #[test]
    fn blank_message_is_dropped() {
        let session = dummy_handle();
        session.set_state(SessionState::InWorld);
        *session.player_id.lock() = Some(1);
        let bytes = core::codec::PacketWriter::new(0x13)
            .u8(0)
            .legacy_text("   ")
            .into_bytes();
        let mut r = reader(&bytes);
        let before = event_bus::with(|events| events.drain_visible().len());
        chat(&session, &mut r).unwrap();
        event_bus::with_mut(|events| events.swap());
        let after = event_bus::with(|events| events.drain_visible().len());
        assert_eq!(after, before);
    }

    #[test]
    fn non_empty_message_is_published() {
        let session = dummy_handle();
        session.set_state(SessionState::InWorld);
        *session.player_id.lock() = Some(1);
        let bytes = core::codec::PacketWriter::new(0x13)
            .u8(3)
            .legacy_text("hello world")
            .into_bytes();
        let mut r = reader(&bytes);
        let before = event_bus::with(|events| events.drain_visible().len());
        chat(&session, &mut r).unwrap();
        event_bus::with_mut(|events| events.swap());
        let after = event_bus::with(|events| events.drain_visible().len());
        assert_eq!(after, before + 1);
    }
}
