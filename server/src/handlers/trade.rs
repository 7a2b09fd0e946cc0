//! Trade: a direct item gift between two adjacent in-world players.
//!
//! Durability follows the same discipline `crate::wal` documents for every
//! economic action: the WAL entry is appended before the in-memory transfer
//! runs, and marked processed once the transfer has actually happened. The
//! game loop is single-threaded and owns `world` exclusively, so nothing can
//! invalidate the adjacency/inventory check made here between the append
//! and the transfer.

use core::types::ItemLocation;
use core::GameResult;

use crate::repository;
use crate::session::SessionHandle;
use crate::wal::WalKind;
use crate::world;

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

pub fn trade(session: &SessionHandle, reader: &mut core::codec::PacketReader) -> GameResult<()> {
    let target_id = reader.u32()? as u64;
    let item_id = reader.u32()? as u64;

    let Some(from_id) = *session.player_id.lock() else {
        return Ok(());
    };
    if from_id == target_id {
        return Ok(());
    }

    let adjacent = world::with(|state| {
        let (Some(from), Some(to)) = (state.players.get(&from_id), state.players.get(&target_id))
        else {
            return false;
        };
        from.map == to.map && (from.x - to.x).abs() <= 1 && (from.y - to.y).abs() <= 1
    });
    if !adjacent {
        return Ok(());
    }

    let Some(item) = world::with(|state| {
        state
            .players
            .get(&from_id)
            .and_then(|p| p.inventory_item(item_id).cloned())
    }) else {
        return Ok(());
    };

    let now = now_unix();
    let wal_id = repository::wal_append(
        WalKind::Trade,
        Some(from_id as i64),
        Some(target_id as i64),
        Some(item.template_id as i64),
        Some(item.count as i64),
        Some(item.enchant as i64),
        None,
        now,
    )?;

    world::with_mut(|state| {
        let Some(removed) = state
            .players
            .get_mut(&from_id)
            .and_then(|from| from.remove_from_inventory(item_id))
        else {
            return;
        };

        let target_slot = state.players.get(&target_id).and_then(|to| to.next_free_slot());
        let Some(slot) = target_slot else {
            if let Some(from) = state.players.get_mut(&from_id) {
                from.inventory.push(removed);
            }
            return;
        };
        let Some(to) = state.players.get_mut(&target_id) else {
            if let Some(from) = state.players.get_mut(&from_id) {
                from.inventory.push(removed);
            }
            return;
        };

        let mut transferred = removed;
        transferred.location = ItemLocation::Inventory {
            owner_id: target_id,
            slot,
        };
        to.inventory.push(transferred);
    });

    repository::wal_mark_processed(&[wal_id])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::test_support::dummy_handle;
    use core::types::{ItemInstance, Player, SessionState};
    use std::sync::Once;

    static INIT: Once = Once::new();

    fn setup() {
        INIT.call_once(|| {
            let _ = repository::initialize(":memory:");
        });
    }

    fn reader(bytes: &[u8]) -> core::codec::PacketReader<'_> {
        let mut r = core::codec::PacketReader::new(bytes);
        let _ = r.opcode();
        r
    }

    fn player_at(id: u64, x: i32, y: i32, item_id: Option<u64>) -> Player {
        Player {
            id,
            account_id: 1,
            name: format!("trader{id}"),
            map: 0,
            x,
            y,
            heading: 0,
            level: 1,
            experience: 0,
            hp: 10,
            max_hp: 10,
            mp: 10,
            max_mp: 10,
            alignment: 0,
            pk_count: 0,
            buffs: Vec::new(),
            known_spells: Vec::new(),
            bookmarks: Vec::new(),
            clan_id: None,
            party_id: None,
            inventory: item_id
                .map(|item_id| {
                    vec![ItemInstance {
                        id: item_id,
                        template_id: 7,
                        count: 1,
                        enchant: 0,
                        flags: 0,
                        location: ItemLocation::Inventory { owner_id: id, slot: 0 },
                    }]
                })
                .unwrap_or_default(),
        }
    }

    #[test]
    fn trade_transfers_item_between_adjacent_players() {
        setup();
        let session = dummy_handle();
        session.set_state(SessionState::InWorld);
        *session.player_id.lock() = Some(803_001);
        world::with_mut(|state| {
            state.insert_player(player_at(803_001, 0, 0, Some(6001)));
            state.insert_player(player_at(803_002, 1, 0, None));
        });

        let bytes = core::codec::PacketWriter::new(0x16)
            .u32(803_002)
            .u32(6001)
            .into_bytes();
        let mut r = reader(&bytes);
        trade(&session, &mut r).unwrap();

        assert!(world::with(|state| state.players[&803_001]
            .inventory_item(6001)
            .is_none()));
        assert!(world::with(|state| state.players[&803_002]
            .inventory_item(6001)
            .is_some()));

        world::with_mut(|state| {
            state.remove_player(803_001);
            state.remove_player(803_002);
        });
    }

    #[test]
    fn trade_between_distant_players_is_a_no_op() {
        setup();
        let session = dummy_handle();
        session.set_state(SessionState::InWorld);
        *session.player_id.lock() = Some(803_003);
        world::with_mut(|state| {
            state.insert_player(player_at(803_003, 0, 0, Some(6002)));
            state.insert_player(player_at(803_004, 50, 50, None));
        });

        let bytes = core::codec::PacketWriter::new(0x16)
            .u32(803_004)
            .u32(6002)
            .into_bytes();
        let mut r = reader(&bytes);
        trade(&session, &mut r).unwrap();

        assert!(world::with(|state| state.players[&803_003]
            .inventory_item(6002)
            .is_some()));

        world::with_mut(|state| {
            state.remove_player(803_003);
            state.remove_player(803_004);
        });
    }
}
