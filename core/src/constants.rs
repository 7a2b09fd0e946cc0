//! Engine-wide constants: timing, buffer limits, and the entity-id partition scheme.

/// Nominal full simulation tick period, in milliseconds. Overridable via config.
pub const DEFAULT_TICK_MS: u64 = 200;

/// High-frequency input-only poll period, in milliseconds. Services phase 0 only.
pub const DEFAULT_INPUT_POLL_MS: u64 = 2;

/// Maximum frame size on the wire, header included.
pub const MAX_FRAME_LEN: usize = 65_535;

/// Minimum legal frame size: 2-byte length header plus at least one opcode byte.
pub const MIN_FRAME_LEN: usize = 3;

/// Default bounded inbound queue depth (packets), per session.
pub const DEFAULT_INBOUND_QUEUE_LEN: usize = 64;

/// Default bounded outbound queue depth (packets), per session.
pub const DEFAULT_OUTBOUND_QUEUE_LEN: usize = 256;

/// Side length, in tiles, of one spatial grid cell.
pub const CELL_SIZE: i32 = 20;

/// Minimum ticks between two accepted moves from the same player, the
/// movement handler's defense against a client that reports moves faster
/// than the protocol's walk speed allows.
pub const MIN_MOVE_INTERVAL_TICKS: u64 = 1;

/// Ticks after a drop during which only the dropper may pick an item back up.
pub const GROUND_ITEM_OWNER_PROTECTION_TICKS: u64 = 50;

/// Ticks a dropped item survives on the ground before despawning.
pub const GROUND_ITEM_TTL_TICKS: u64 = 3000;

/// Number of inventory slots a character has.
pub const INVENTORY_SLOTS: u8 = 40;

/// Chebyshev radius within which a hostile NPC may acquire a new aggro
/// target during perception.
pub const NPC_PERCEPTION_RADIUS: i32 = 8;

/// Ticks between one melee/ranged attack and the next for an NPC.
pub const NPC_ATTACK_COOLDOWN_TICKS: u32 = 5;

/// Ticks between one movement step and the next for an NPC.
pub const NPC_MOVE_COOLDOWN_TICKS: u32 = 2;

/// Ticks a dead NPC waits before its respawn timer starts counting down
/// (corpse lingers, then the respawn clock runs for this many more ticks).
pub const NPC_RESPAWN_TICKS: u64 = 500;

/// Ticks per in-world hour, the unit the weather roll advances on.
pub const TICKS_PER_GAME_HOUR: u64 = 300;

/// Handshake init-packet opcode byte, distinct from the post-handshake
/// opcode space in [`crate::codec`] (this one is never dispatched, only
/// ever written once by the session on accept).
pub const INIT_PACKET_OPCODE: u8 = 0x96;

/// Fixed trailing bytes of the plaintext handshake init frame, identifying
/// the protocol revision this server speaks.
pub const INIT_PACKET_PROTOCOL_TAG: [u8; 11] =
    [0x9D, 0xD1, 0xD6, 0x7A, 0xF4, 0x62, 0xE7, 0xA0, 0x66, 0x02, 0xFA];

/// Client protocol version the Handshake opcode handler requires a match
/// against before advancing a session past `AwaitingHandshake`.
pub const PROTOCOL_VERSION: u32 = 1;

/// Legacy double-byte text field maximum length before truncation.
pub const MAX_TEXT_FIELD_LEN: usize = 200;

// Entity id partitioning (invariant: id ranges never overlap).
pub const CHARACTER_ID_MAX: u64 = 100_000;
pub const NPC_ID_MIN: u64 = 200_000_000;
pub const NPC_ID_MAX: u64 = 500_000_000;
pub const ITEM_ID_MIN: u64 = 500_000_000;
pub const ITEM_ID_MAX: u64 = 700_000_000;
pub const GROUND_ITEM_ID_MIN: u64 = 700_000_000;

/// Returns true if `id` falls in the player-character partition.
pub fn is_character_id(id: u64) -> bool {
    id < CHARACTER_ID_MAX
}

/// Returns true if `id` falls in the NPC/pet/summon/doll/follower partition.
pub fn is_npc_id(id: u64) -> bool {
    (NPC_ID_MIN..NPC_ID_MAX).contains(&id)
}

/// Returns true if `id` falls in the item-instance partition.
pub fn is_item_id(id: u64) -> bool {
    (ITEM_ID_MIN..ITEM_ID_MAX).contains(&id)
}

/// Returns true if `id` falls in the ground-item partition.
pub fn is_ground_item_id(id: u64) -> bool {
    id >= GROUND_ITEM_ID_MIN
}
