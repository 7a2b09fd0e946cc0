//! Relational repositories over the sqlite store.
//!
//! One process-wide connection guarded by a mutex, following the same
//! singleton discipline the in-memory world state uses: a single owner, a
//! closure-based accessor, no ambient locking sprinkled through call sites.

use core::types::{ClanRank, ItemInstance, ItemLocation};
use core::GameError;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::OnceLock;

static REPOSITORY: OnceLock<Mutex<Connection>> = OnceLock::new();

pub fn initialize(sqlite_path: &str) -> Result<(), GameError> {
    let conn = Connection::open(sqlite_path).map_err(|e| GameError::Persistence(e.to_string()))?;
    conn.pragma_update(None, "journal_mode", "WAL")
        .map_err(|e| GameError::Persistence(e.to_string()))?;
    conn.pragma_update(None, "foreign_keys", true)
        .map_err(|e| GameError::Persistence(e.to_string()))?;
    crate::migrations::run(&conn)?;
    REPOSITORY
        .set(Mutex::new(conn))
        .map_err(|_| GameError::InvalidState("repository already initialized".into()))
}

fn with<F, R>(f: F) -> Result<R, GameError>
where
    F: FnOnce(&Connection) -> Result<R, GameError>,
{
    let guard = REPOSITORY
        .get()
        .ok_or_else(|| GameError::InvalidState("repository not initialized".into()))?
        .lock();
    f(&guard)
}

#[derive(Clone, Debug)]
pub struct CharacterRecord {
    pub id: i64,
    pub account_id: i64,
    pub name: String,
    pub map: i64,
    pub x: i64,
    pub y: i64,
    pub hp: i64,
    pub max_hp: i64,
    pub mp: i64,
    pub max_mp: i64,
    pub level: i64,
    pub experience: i64,
}

/// Creates a new character owned by `account_id` with the given starting
/// stats, returning the populated record. Character names are globally
/// unique (the `characters.name` column is `UNIQUE`); a collision surfaces
/// as a persistence error for the caller to report back to the client.
#[allow(clippy::too_many_arguments)]
pub fn create_character(
    account_id: i64,
    name: &str,
    map: i64,
    x: i64,
    y: i64,
    hp: i64,
    mp: i64,
    now: i64,
) -> Result<CharacterRecord, GameError> {
    with(|conn| {
        conn.execute(
            "INSERT INTO characters
                (account_id, name, map, x, y, heading, level, experience, hp, mp, max_hp, max_mp,
                 alignment, pk_count, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, 1, 0, ?6, ?7, ?6, ?7, 0, 0, ?8)",
            params![account_id, name, map, x, y, hp, mp, now],
        )
        .map_err(|e| GameError::Persistence(e.to_string()))?;
        Ok(CharacterRecord {
            id: conn.last_insert_rowid(),
            account_id,
            name: name.to_string(),
            map,
            x,
            y,
            hp,
            max_hp: hp,
            mp,
            max_mp: mp,
            level: 1,
            experience: 0,
        })
    })
}

pub fn create_account(username: &str, password_hash: &str, now: i64) -> Result<i64, GameError> {
    with(|conn| {
        conn.execute(
            "INSERT INTO accounts (username, password_hash, created_at) VALUES (?1, ?2, ?3)",
            params![username, password_hash, now],
        )
        .map_err(|e| GameError::Persistence(e.to_string()))?;
        Ok(conn.last_insert_rowid())
    })
}

pub fn find_account_by_username(
    username: &str,
) -> Result<Option<(i64, String)>, GameError> {
    with(|conn| {
        conn.query_row(
            "SELECT id, password_hash FROM accounts WHERE username = ?1",
            params![username],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .map_err(|e| GameError::Persistence(e.to_string()))
    })
}

pub fn load_character(character_id: i64) -> Result<Option<CharacterRecord>, GameError> {
    with(|conn| {
        conn.query_row(
            "SELECT id, account_id, name, map, x, y, hp, max_hp, mp, max_mp, level, experience
             FROM characters WHERE id = ?1",
            params![character_id],
            |row| {
                Ok(CharacterRecord {
                    id: row.get(0)?,
                    account_id: row.get(1)?,
                    name: row.get(2)?,
                    map: row.get(3)?,
                    x: row.get(4)?,
                    y: row.get(5)?,
                    hp: row.get(6)?,
                    max_hp: row.get(7)?,
                    mp: row.get(8)?,
                    max_mp: row.get(9)?,
                    level: row.get(10)?,
                    experience: row.get(11)?,
                })
            },
        )
        .optional()
        .map_err(|e| GameError::Persistence(e.to_string()))
    })
}

pub fn save_character(record: &CharacterRecord, now: i64) -> Result<(), GameError> {
    with(|conn| {
        conn.execute(
            "UPDATE characters SET map=?2, x=?3, y=?4, hp=?5, max_hp=?6, mp=?7, max_mp=?8,
                level=?9, experience=?10, updated_at=?11 WHERE id=?1",
            params![
                record.id,
                record.map,
                record.x,
                record.y,
                record.hp,
                record.max_hp,
                record.mp,
                record.max_mp,
                record.level,
                record.experience,
                now
            ],
        )
        .map_err(|e| GameError::Persistence(e.to_string()))?;
        Ok(())
    })
}

/// All characters belonging to `account_id`, for the character-select screen.
pub fn characters_for_account(account_id: i64) -> Result<Vec<CharacterRecord>, GameError> {
    with(|conn| {
        let mut stmt = conn
            .prepare(
                "SELECT id, account_id, name, map, x, y, hp, max_hp, mp, max_mp, level, experience
                 FROM characters WHERE account_id = ?1 ORDER BY id ASC",
            )
            .map_err(|e| GameError::Persistence(e.to_string()))?;
        let rows = stmt
            .query_map(params![account_id], |row| {
                Ok(CharacterRecord {
                    id: row.get(0)?,
                    account_id: row.get(1)?,
                    name: row.get(2)?,
                    map: row.get(3)?,
                    x: row.get(4)?,
                    y: row.get(5)?,
                    hp: row.get(6)?,
                    max_hp: row.get(7)?,
                    mp: row.get(8)?,
                    max_mp: row.get(9)?,
                    level: row.get(10)?,
                    experience: row.get(11)?,
                })
            })
            .map_err(|e| GameError::Persistence(e.to_string()))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(|e| GameError::Persistence(e.to_string()))?);
        }
        Ok(out)
    })
}

pub fn save_item(character_id: i64, item: &ItemInstance) -> Result<(), GameError> {
    let slot = match item.location {
        ItemLocation::Inventory { slot, .. } | ItemLocation::Worn { slot, .. } => slot as i64,
        _ => -1,
    };
    with(|conn| {
        conn.execute(
            "INSERT INTO character_items (obj_id, character_id, template_id, count, enchant, flags, slot)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(obj_id) DO UPDATE SET count=excluded.count, enchant=excluded.enchant,
                flags=excluded.flags, slot=excluded.slot",
            params![
                item.id as i64,
                character_id,
                item.template_id as i64,
                item.count as i64,
                item.enchant as i64,
                item.flags as i64,
                slot
            ],
        )
        .map_err(|e| GameError::Persistence(e.to_string()))?;
        Ok(())
    })
}

/// Loads every item owned by `character_id`, reconstructed as inventory
/// items (slot < 0 in storage marks a non-inventory location, which this
/// character-scoped load never surfaces — warehouse/ground items live in
/// their own tables/in-memory stores).
pub fn load_items_for_character(character_id: i64) -> Result<Vec<ItemInstance>, GameError> {
    use core::types::ItemLocation;

    with(|conn| {
        let mut stmt = conn
            .prepare(
                "SELECT obj_id, template_id, count, enchant, flags, slot
                 FROM character_items WHERE character_id = ?1 AND slot >= 0",
            )
            .map_err(|e| GameError::Persistence(e.to_string()))?;

        let rows = stmt
            .query_map(params![character_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, i64>(5)?,
                ))
            })
            .map_err(|e| GameError::Persistence(e.to_string()))?;

        let mut items = Vec::new();
        for row in rows {
            let (obj_id, template_id, count, enchant, flags, slot) =
                row.map_err(|e| GameError::Persistence(e.to_string()))?;
            items.push(ItemInstance {
                id: obj_id as u64,
                template_id: template_id as u32,
                count: count as u32,
                enchant: enchant as i16,
                flags: flags as u32,
                location: ItemLocation::Inventory {
                    owner_id: character_id as u64,
                    slot: slot as u8,
                },
            });
        }
        Ok(items)
    })
}

/// Durably appends one economic-WAL entry. Must be called, and its result
/// committed, before the corresponding in-memory mutation is applied.
pub fn wal_append(
    kind: crate::wal::WalKind,
    from_character: Option<i64>,
    to_character: Option<i64>,
    template_id: Option<i64>,
    count: Option<i64>,
    enchant: Option<i64>,
    gold: Option<i64>,
    now: i64,
) -> Result<i64, GameError> {
    with(|conn| {
        crate::wal::append(
            conn,
            kind,
            from_character,
            to_character,
            template_id,
            count,
            enchant,
            gold,
            now,
        )
    })
}

/// Marks WAL entries processed once their in-memory mutation has taken effect.
pub fn wal_mark_processed(ids: &[i64]) -> Result<(), GameError> {
    with(|conn| crate::wal::mark_processed(conn, ids))
}

/// Replays every unprocessed economic-WAL entry against persisted
/// `character_items` rows, then marks each processed. Run once at startup,
/// before accepting any connections. `WorldState` holds no players at that
/// point — they load lazily at character-select — so replay targets the
/// sqlite rows a character will actually be loaded from, not live world
/// state. A replay failure here is fatal to boot.
pub fn recover_wal() -> Result<(), GameError> {
    with(|conn| {
        let entries = crate::wal::unprocessed(conn)?;
        let mut done = Vec::with_capacity(entries.len());
        for entry in &entries {
            match entry.kind {
                crate::wal::WalKind::Trade => replay_trade(conn, entry)?,
                crate::wal::WalKind::ShopBuy
                | crate::wal::WalKind::ShopSell
                | crate::wal::WalKind::WarehouseDeposit
                | crate::wal::WalKind::WarehouseWithdraw => {
                    log::warn!(
                        "wal entry {} ({:?}) has no replay handler yet, leaving unprocessed",
                        entry.id,
                        entry.kind
                    );
                    continue;
                }
            }
            done.push(entry.id);
        }
        if !done.is_empty() {
            crate::wal::mark_processed(conn, &done)?;
        }
        log::info!(
            "wal recovery replayed {} of {} pending entries",
            done.len(),
            entries.len()
        );
        Ok(())
    })
}

/// Moves `count` of `(template_id, enchant)` from `entry.from_character` to
/// `entry.to_character`, matching the in-memory transfer the Trade handler
/// performs. Idempotent: if the sender's row is already gone (the original
/// mutation committed before the crash), only the recipient side is
/// re-checked, never double-credited.
fn replay_trade(conn: &Connection, entry: &crate::wal::WalEntry) -> Result<(), GameError> {
    let (Some(from_id), Some(to_id), Some(template_id), Some(count)) =
        (entry.from_character, entry.to_character, entry.template_id, entry.count)
    else {
        return Err(GameError::WalReplay(format!(
            "trade entry {} missing required fields",
            entry.id
        )));
    };
    let enchant = entry.enchant.unwrap_or(0);

    let sender_row: Option<(i64, i64)> = conn
        .query_row(
            "SELECT obj_id, count FROM character_items
             WHERE character_id = ?1 AND template_id = ?2 AND enchant = ?3
             ORDER BY obj_id ASC LIMIT 1",
            params![from_id, template_id, enchant],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .map_err(|e| GameError::Persistence(e.to_string()))?;

    if let Some((obj_id, have)) = sender_row {
        if have > count {
            conn.execute(
                "UPDATE character_items SET count = count - ?2 WHERE obj_id = ?1",
                params![obj_id, count],
            )
            .map_err(|e| GameError::Persistence(e.to_string()))?;
        } else {
            conn.execute("DELETE FROM character_items WHERE obj_id = ?1", params![obj_id])
                .map_err(|e| GameError::Persistence(e.to_string()))?;
        }
    }

    let recipient_row: Option<i64> = conn
        .query_row(
            "SELECT obj_id FROM character_items
             WHERE character_id = ?1 AND template_id = ?2 AND enchant = ?3
             ORDER BY obj_id ASC LIMIT 1",
            params![to_id, template_id, enchant],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| GameError::Persistence(e.to_string()))?;

    match recipient_row {
        Some(obj_id) => {
            conn.execute(
                "UPDATE character_items SET count = count + ?2 WHERE obj_id = ?1",
                params![obj_id, count],
            )
            .map_err(|e| GameError::Persistence(e.to_string()))?;
        }
        None => {
            let next_id: i64 = conn
                .query_row(
                    "SELECT COALESCE(MAX(obj_id), 500000000) + 1 FROM character_items",
                    [],
                    |row| row.get(0),
                )
                .map_err(|e| GameError::Persistence(e.to_string()))?;
            conn.execute(
                "INSERT INTO character_items (obj_id, character_id, template_id, count, enchant, flags, slot)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0, -1)",
                params![next_id, to_id, template_id, count, enchant],
            )
            .map_err(|e| GameError::Persistence(e.to_string()))?;
        }
    }

    Ok(())
}

pub fn clan_rank(clan_id: i64, character_id: i64) -> Result<Option<ClanRank>, GameError> {
    with(|conn| {
        let rank: Option<i64> = conn
            .query_row(
                "SELECT rank FROM clan_members WHERE clan_id = ?1 AND character_id = ?2",
                params![clan_id, character_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| GameError::Persistence(e.to_string()))?;
        Ok(rank.map(|r| match r {
            2 => ClanRank::Leader,
            1 => ClanRank::Officer,
            _ => ClanRank::Member,
        }))
    })
}
