//! Small server-local enums and flag sets that don't belong in `core`
//! because they're wire/opcode concerns rather than shared data shapes.

use bitflags::bitflags;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct CharacterFlags: u32 {
        const NONE      = 0;
        const INVISIBLE = 1 << 0;
        const IMMORTAL  = 1 << 1;
        const MUTED     = 1 << 2;
        const AFK       = 1 << 3;
    }
}

/// Opcodes dispatched by [`crate::dispatch`]. Values are stable across
/// protocol versions; never renumber an existing variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    Handshake = 0x01,
    Login = 0x02,
    CharacterSelect = 0x03,
    Move = 0x10,
    Attack = 0x11,
    UseItem = 0x12,
    Chat = 0x13,
    DropItem = 0x14,
    PickupItem = 0x15,
    Trade = 0x16,
    Logout = 0x1f,
}

impl Opcode {
    pub fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            0x01 => Opcode::Handshake,
            0x02 => Opcode::Login,
            0x03 => Opcode::CharacterSelect,
            0x10 => Opcode::Move,
            0x11 => Opcode::Attack,
            0x12 => Opcode::UseItem,
            0x13 => Opcode::Chat,
            0x14 => Opcode::DropItem,
            0x15 => Opcode::PickupItem,
            0x16 => Opcode::Trade,
            0x1f => Opcode::Logout,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_opcode_byte_is_none() {
        assert!(Opcode::from_u8(0xee).is_none());
    }

    #[test]
    fn round_trips_known_opcodes() {
        assert_eq!(Opcode::from_u8(0x10), Some(Opcode::Move));
    }

    #[test]
    fn flags_compose() {
        let f = CharacterFlags::INVISIBLE | CharacterFlags::AFK;
        assert!(f.contains(CharacterFlags::AFK));
        assert!(!f.contains(CharacterFlags::MUTED));
    }
}
