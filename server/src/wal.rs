//! Economic write-ahead log: trade, shop, and deposit actions are durably
//! recorded before the in-memory mutation happens, and replayed against
//! world state on startup so a crash between the two never loses or
//! duplicates an item or a gold balance.

use core::GameError;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalKind {
    Trade,
    ShopBuy,
    ShopSell,
    WarehouseDeposit,
    WarehouseWithdraw,
}

impl WalKind {
    fn as_str(self) -> &'static str {
        match self {
            WalKind::Trade => "trade",
            WalKind::ShopBuy => "shop_buy",
            WalKind::ShopSell => "shop_sell",
            WalKind::WarehouseDeposit => "warehouse_deposit",
            WalKind::WarehouseWithdraw => "warehouse_withdraw",
        }
    }

    fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "trade" => WalKind::Trade,
            "shop_buy" => WalKind::ShopBuy,
            "shop_sell" => WalKind::ShopSell,
            "warehouse_deposit" => WalKind::WarehouseDeposit,
            "warehouse_withdraw" => WalKind::WarehouseWithdraw,
            _ => return None,
        })
    }
}

#[derive(Clone, Debug)]
pub struct WalEntry {
    pub id: i64,
    pub kind: WalKind,
    pub from_character: Option<i64>,
    pub to_character: Option<i64>,
    pub template_id: Option<i64>,
    pub count: Option<i64>,
    pub enchant: Option<i64>,
    pub gold: Option<i64>,
}

/// Appends `entry` durably and returns its assigned row id. Must be called,
/// and committed, before the corresponding in-memory mutation is applied.
pub fn append(
    conn: &Connection,
    kind: WalKind,
    from_character: Option<i64>,
    to_character: Option<i64>,
    template_id: Option<i64>,
    count: Option<i64>,
    enchant: Option<i64>,
    gold: Option<i64>,
    now: i64,
) -> Result<i64, GameError> {
    conn.execute(
        "INSERT INTO economic_wal
            (kind, from_character, to_character, template_id, count, enchant, gold, processed, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8)",
        params![
            kind.as_str(),
            from_character,
            to_character,
            template_id,
            count,
            enchant,
            gold,
            now
        ],
    )
    .map_err(|e| GameError::Persistence(e.to_string()))?;
    Ok(conn.last_insert_rowid())
}

/// Marks a batch of entries processed after their in-memory mutation has
/// taken effect. Safe to call repeatedly with overlapping ids.
pub fn mark_processed(conn: &Connection, ids: &[i64]) -> Result<(), GameError> {
    for id in ids {
        conn.execute(
            "UPDATE economic_wal SET processed = 1 WHERE id = ?1",
            params![id],
        )
        .map_err(|e| GameError::Persistence(e.to_string()))?;
    }
    Ok(())
}

/// Loads every unprocessed entry, oldest first, for startup replay.
pub fn unprocessed(conn: &Connection) -> Result<Vec<WalEntry>, GameError> {
    let mut stmt = conn
        .prepare(
            "SELECT id, kind, from_character, to_character, template_id, count, enchant, gold
             FROM economic_wal WHERE processed = 0 ORDER BY id ASC",
        )
        .map_err(|e| GameError::Persistence(e.to_string()))?;

    let rows = stmt
        .query_map([], |row| {
            let kind_str: String = row.get(1)?;
            Ok((
                row.get::<_, i64>(0)?,
                kind_str,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
                row.get(7)?,
            ))
        })
        .map_err(|e| GameError::Persistence(e.to_string()))?;

    let mut entries = Vec::new();
    for row in rows {
        let (id, kind_str, from_character, to_character, template_id, count, enchant, gold) =
            row.map_err(|e| GameError::Persistence(e.to_string()))?;
        let kind = WalKind::from_str(&kind_str)
            .ok_or_else(|| GameError::WalReplay(format!("unknown wal kind {kind_str}")))?;
        entries.push(WalEntry {
            id,
            kind,
            from_character,
            to_character,
            template_id,
            count,
            enchant,
            gold,
        });
    }
    Ok(entries)
}

/// Looks up one entry by id, used by tests and by the admin surface to
/// inspect a specific economic action.
pub fn find(conn: &Connection, id: i64) -> Result<Option<WalEntry>, GameError> {
    conn.query_row(
        "SELECT id, kind, from_character, to_character, template_id, count, enchant, gold
         FROM economic_wal WHERE id = ?1",
        params![id],
        |row| {
            let kind_str: String = row.get(1)?;
            Ok((
                row.get::<_, i64>(0)?,
                kind_str,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
                row.get(7)?,
            ))
        },
    )
    .optional()
    .map_err(|e| GameError::Persistence(e.to_string()))?
    .map(|(id, kind_str, from_character, to_character, template_id, count, enchant, gold)| {
        Ok(WalEntry {
            id,
            kind: WalKind::from_str(&kind_str)
                .ok_or_else(|| GameError::WalReplay(format!("unknown wal kind {kind_str}")))?,
            from_character,
            to_character,
            template_id,
            count,
            enchant,
            gold,
        })
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::migrations::run(&conn).unwrap();
        conn
    }

    #[test]
    fn append_then_unprocessed_round_trips() {
        let conn = setup();
        let id = append(
            &conn,
            WalKind::Trade,
            Some(1),
            Some(2),
            Some(10),
            Some(1),
            Some(0),
            None,
            0,
        )
        .unwrap();
        let pending = unprocessed(&conn).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, id);
        assert_eq!(pending[0].kind, WalKind::Trade);
    }

    #[test]
    fn mark_processed_removes_from_replay_set() {
        let conn = setup();
        let id = append(
            &conn,
            WalKind::ShopBuy,
            None,
            Some(5),
            Some(1),
            Some(1),
            Some(0),
            Some(100),
            0,
        )
        .unwrap();
        mark_processed(&conn, &[id]).unwrap();
        assert!(unprocessed(&conn).unwrap().is_empty());
    }

    #[test]
    fn mark_processed_twice_is_idempotent() {
        let conn = setup();
        let id = append(
            &conn,
            WalKind::WarehouseDeposit,
            Some(1),
            None,
            Some(1),
            Some(1),
            Some(0),
            None,
            0,
        )
        .unwrap();
        mark_processed(&conn, &[id]).unwrap();
        mark_processed(&conn, &[id]).unwrap();
        assert!(unprocessed(&conn).unwrap().is_empty());
    }
}
