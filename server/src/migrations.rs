//! Idempotent schema migrations, applied once at startup inside a single
//! transaction guarded by `PRAGMA user_version`.

use core::GameError;
use rusqlite::Connection;

type Migration = fn(&Connection) -> rusqlite::Result<()>;

const MIGRATIONS: &[Migration] = &[m001_initial_schema, m002_economic_wal, m003_mail_and_boards];

pub fn run(conn: &Connection) -> Result<(), GameError> {
    let current: i64 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| GameError::Migration(e.to_string()))?;

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| GameError::Migration(e.to_string()))?;

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i64;
        if version <= current {
            continue;
        }
        migration(&tx).map_err(|e| GameError::Migration(format!("migration {version}: {e}")))?;
        tx.pragma_update(None, "user_version", version)
            .map_err(|e| GameError::Migration(e.to_string()))?;
    }

    tx.commit().map_err(|e| GameError::Migration(e.to_string()))
}

fn m001_initial_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS accounts (
            id INTEGER PRIMARY KEY,
            username TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS characters (
            id INTEGER PRIMARY KEY,
            account_id INTEGER NOT NULL REFERENCES accounts(id),
            name TEXT UNIQUE NOT NULL,
            map INTEGER NOT NULL,
            x INTEGER NOT NULL,
            y INTEGER NOT NULL,
            heading INTEGER NOT NULL,
            level INTEGER NOT NULL,
            experience INTEGER NOT NULL,
            hp INTEGER NOT NULL,
            mp INTEGER NOT NULL,
            max_hp INTEGER NOT NULL,
            max_mp INTEGER NOT NULL,
            alignment INTEGER NOT NULL,
            pk_count INTEGER NOT NULL,
            bookmarks TEXT NOT NULL DEFAULT '[]',
            known_spells TEXT NOT NULL DEFAULT '[]',
            buffs TEXT NOT NULL DEFAULT '[]',
            updated_at INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS character_items (
            obj_id INTEGER PRIMARY KEY,
            character_id INTEGER NOT NULL REFERENCES characters(id),
            template_id INTEGER NOT NULL,
            count INTEGER NOT NULL,
            enchant INTEGER NOT NULL,
            flags INTEGER NOT NULL,
            slot INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS warehouse_items (
            obj_id INTEGER PRIMARY KEY,
            clan_id INTEGER NOT NULL,
            template_id INTEGER NOT NULL,
            count INTEGER NOT NULL,
            enchant INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS clans (
            id INTEGER PRIMARY KEY,
            name TEXT UNIQUE NOT NULL,
            leader_character_id INTEGER NOT NULL,
            emblem_id INTEGER,
            announcement TEXT
        );
        CREATE TABLE IF NOT EXISTS clan_members (
            clan_id INTEGER NOT NULL REFERENCES clans(id),
            character_id INTEGER NOT NULL,
            rank INTEGER NOT NULL,
            PRIMARY KEY (clan_id, character_id)
        );
        ",
    )
}

fn m002_economic_wal(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS economic_wal (
            id INTEGER PRIMARY KEY,
            kind TEXT NOT NULL,
            from_character INTEGER,
            to_character INTEGER,
            template_id INTEGER,
            count INTEGER,
            enchant INTEGER,
            gold INTEGER,
            processed INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_economic_wal_processed ON economic_wal(processed);
        CREATE TABLE IF NOT EXISTS clan_warehouse_history (
            id INTEGER PRIMARY KEY,
            clan_id INTEGER NOT NULL,
            character_id INTEGER NOT NULL,
            action TEXT NOT NULL,
            template_id INTEGER,
            count INTEGER,
            at INTEGER NOT NULL
        );
        ",
    )
}

fn m003_mail_and_boards(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS mail (
            id INTEGER PRIMARY KEY,
            to_character INTEGER NOT NULL,
            from_character INTEGER,
            subject TEXT,
            body TEXT,
            read INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS board_posts (
            id INTEGER PRIMARY KEY,
            board_id INTEGER NOT NULL,
            author_character INTEGER NOT NULL,
            subject TEXT,
            body TEXT,
            created_at INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS buddies (
            character_id INTEGER NOT NULL,
            buddy_character_id INTEGER NOT NULL,
            PRIMARY KEY (character_id, buddy_character_id)
        );
        ",
    )
}
