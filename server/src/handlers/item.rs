//! Inventory opcodes: consume, drop to the ground, and pick back up.

use core::constants::{GROUND_ITEM_OWNER_PROTECTION_TICKS, GROUND_ITEM_TTL_TICKS};
use core::types::{GroundItem, ItemInstance, ItemLocation};
use core::GameResult;

use crate::event_bus::{self, GameEvent};
use crate::session::SessionHandle;
use crate::world;

/// Decrements the item's stack by one, removing it from the inventory once
/// exhausted. Potion/scroll effects themselves are the script bridge's
/// concern; this handler only owns the inventory bookkeeping.
pub fn use_item(session: &SessionHandle, reader: &mut core::codec::PacketReader) -> GameResult<()> {
    let item_id = reader.u32()? as u64;
    let Some(player_id) = *session.player_id.lock() else {
        return Ok(());
    };

    world::with_mut(|state| {
        let Some(player) = state.players.get_mut(&player_id) else {
            return;
        };
        let Some(item) = player.inventory.iter_mut().find(|i| i.id == item_id) else {
            return;
        };
        item.count = item.count.saturating_sub(1);
        if item.count == 0 {
            player.remove_from_inventory(item_id);
        }
    });
    Ok(())
}

pub fn drop_item(session: &SessionHandle, reader: &mut core::codec::PacketReader) -> GameResult<()> {
    let item_id = reader.u32()? as u64;
    let Some(player_id) = *session.player_id.lock() else {
        return Ok(());
    };

    let dropped = world::with_mut(|state| {
        let player = state.players.get_mut(&player_id)?;
        let item = player.remove_from_inventory(item_id)?;
        Some((item, player.map, player.x, player.y))
    });
    let Some((item, map, x, y)) = dropped else {
        return Ok(());
    };

    let current_tick = world::with(|state| state.current_tick);
    world::with_mut(|state| {
        state.ground_items.insert(
            item.id,
            GroundItem {
                id: item.id,
                template_id: item.template_id,
                count: item.count,
                map,
                x,
                y,
                owner_id: Some(player_id),
                dropped_at_tick: current_tick,
                expires_at_tick: current_tick + GROUND_ITEM_TTL_TICKS,
            },
        );
    });

    event_bus::with_mut(|events| {
        events.publish(GameEvent::ItemDropped {
            item_id: item.id,
            map,
            x,
            y,
        });
    });
    Ok(())
}

pub fn pickup_item(
    session: &SessionHandle,
    reader: &mut core::codec::PacketReader,
) -> GameResult<()> {
    let item_id = reader.u32()? as u64;
    let Some(player_id) = *session.player_id.lock() else {
        return Ok(());
    };
    let current_tick = world::with(|state| state.current_tick);

    world::with_mut(|state| {
        let Some(player) = state.players.get(&player_id) else {
            return;
        };
        let (map, x, y) = (player.map, player.x, player.y);

        let Some(ground) = state.ground_items.get(&item_id) else {
            return;
        };
        if ground.map != map || ground.x != x || ground.y != y {
            return;
        }
        if !ground.can_be_picked_up_by(player_id, current_tick, GROUND_ITEM_OWNER_PROTECTION_TICKS) {
            return;
        }

        let ground = state.ground_items.remove(&item_id).expect("checked above");
        let Some(player) = state.players.get_mut(&player_id) else {
            state.ground_items.insert(ground.id, ground);
            return;
        };
        let Some(slot) = player.next_free_slot() else {
            state.ground_items.insert(ground.id, ground);
            return;
        };
        player.inventory.push(ItemInstance {
            id: ground.id,
            template_id: ground.template_id,
            count: ground.count,
            enchant: 0,
            flags: 0,
            location: ItemLocation::Inventory {
                owner_id: player_id,
                slot,
            },
        });
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::test_support::dummy_handle;
    use core::types::{Player, SessionState};

    fn reader(bytes: &[u8]) -> core::codec::PacketReader<'_> {
        let mut r = core::codec::PacketReader::new(bytes);
        let _ = r.opcode();
        r
    }

    fn player_with_item(id: u64, item_id: u64) -> Player {
        Player {
            id,
            account_id: 1,
            name: format!("itemtest{id}"),
            map: 0,
            x: 3,
            y: 3,
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
            inventory: vec![ItemInstance {
                id: item_id,
                template_id: 55,
                count: 3,
                enchant: 0,
                flags: 0,
                location: ItemLocation::Inventory { owner_id: id, slot: 0 },
            }],
        }
    }

    #[test]
    fn use_item_decrements_stack_and_removes_when_exhausted() {
        let session = dummy_handle();
        session.set_state(SessionState::InWorld);
        *session.player_id.lock() = Some(802_001);
        world::with_mut(|state| state.insert_player(player_with_item(802_001, 5001)));

        for _ in 0..3 {
            let bytes = core::codec::PacketWriter::new(0x12).u32(5001).into_bytes();
            let mut r = reader(&bytes);
            use_item(&session, &mut r).unwrap();
        }
        let gone =
            world::with(|state| state.players[&802_001].inventory_item(5001).is_none());
        assert!(gone);

        world::with_mut(|state| {
            state.remove_player(802_001);
        });
    }

    #[test]
    fn drop_then_pickup_round_trips_the_item() {
        let session = dummy_handle();
        session.set_state(SessionState::InWorld);
        *session.player_id.lock() = Some(802_002);
        world::with_mut(|state| state.insert_player(player_with_item(802_002, 5002)));

        let drop_bytes = core::codec::PacketWriter::new(0x14).u32(5002).into_bytes();
        let mut r = reader(&drop_bytes);
        drop_item(&session, &mut r).unwrap();

        assert!(world::with(|state| state.ground_items.contains_key(&5002)));
        assert!(world::with(|state| state.players[&802_002]
            .inventory_item(5002)
            .is_none()));

        let pickup_bytes = core::codec::PacketWriter::new(0x15).u32(5002).into_bytes();
        let mut r2 = reader(&pickup_bytes);
        pickup_item(&session, &mut r2).unwrap();

        assert!(!world::with(|state| state.ground_items.contains_key(&5002)));
        assert!(world::with(|state| state.players[&802_002]
            .inventory_item(5002)
            .is_some()));

        world::with_mut(|state| {
            state.remove_player(802_002);
            state.ground_items.remove(&5002);
        });
    }

    #[test]
    fn pickup_by_non_owner_within_protection_window_fails() {
        let owner = dummy_handle();
        owner.set_state(SessionState::InWorld);
        *owner.player_id.lock() = Some(802_003);
        world::with_mut(|state| state.insert_player(player_with_item(802_003, 5003)));

        let drop_bytes = core::codec::PacketWriter::new(0x14).u32(5003).into_bytes();
        let mut r = reader(&drop_bytes);
        drop_item(&owner, &mut r).unwrap();

        let stranger = dummy_handle();
        stranger.set_state(SessionState::InWorld);
        *stranger.player_id.lock() = Some(802_004);
        world::with_mut(|state| state.insert_player(player_with_item(802_004, 9999)));
        world::with_mut(|state| {
            if let Some(p) = state.players.get_mut(&802_004) {
                p.x = 3;
                p.y = 3;
            }
        });

        let pickup_bytes = core::codec::PacketWriter::new(0x15).u32(5003).into_bytes();
        let mut r2 = reader(&pickup_bytes);
        pickup_item(&stranger, &mut r2).unwrap();

        assert!(world::with(|state| state.ground_items.contains_key(&5003)));

        world::with_mut(|state| {
            state.remove_player(802_003);
            state.remove_player(802_004);
            state.ground_items.remove(&5003);
        });
    }
}
