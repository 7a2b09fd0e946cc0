//! Handshake version check, login/auto-registration, character select, and logout.

use core::types::{LogoutReason, Player, SessionState};
use core::{GameError, GameResult};

use crate::config;
use crate::event_bus::{self, GameEvent};
use crate::repository;
use crate::session::SessionHandle;
use crate::world;

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Checks the client's reported protocol version against
/// [`core::constants::PROTOCOL_VERSION`] and advances the session past
/// `AwaitingHandshake`. A mismatch closes the connection rather than erroring
/// the dispatch loop — an outdated client isn't this server's bug.
pub fn handshake(session: &SessionHandle, reader: &mut core::codec::PacketReader) -> GameResult<()> {
    let client_version = reader.u32()?;
    if client_version != core::constants::PROTOCOL_VERSION {
        session.close(LogoutReason::VersionMismatch);
        return Ok(());
    }
    session.set_state(SessionState::AwaitingLogin);
    Ok(())
}

/// Looks up the account by username, auto-registering on first sight (this
/// server doesn't gate account creation behind a separate signup flow).
/// A known username with the wrong password closes the session.
pub fn login(session: &SessionHandle, reader: &mut core::codec::PacketReader) -> GameResult<()> {
    let username = reader.legacy_text()?;
    let password = reader.legacy_text()?;

    let account_id = match repository::find_account_by_username(&username)? {
        Some((id, stored_hash)) => {
            if stored_hash != password {
                session.close(LogoutReason::PasswordIncorrect);
                return Ok(());
            }
            id
        }
        None => repository::create_account(&username, &password, now_unix())?,
    };

    *session.account_id.lock() = Some(account_id);
    session.set_state(SessionState::Authenticated);
    Ok(())
}

/// Selects an existing character (id != 0) or creates a new one (id == 0,
/// name supplied) under the session's logged-in account, loads its
/// inventory, and drops it into the world.
pub fn character_select(
    session: &SessionHandle,
    reader: &mut core::codec::PacketReader,
) -> GameResult<()> {
    let requested_id = reader.u32()?;
    let name = reader.legacy_text()?;

    let Some(account_id) = *session.account_id.lock() else {
        return Err(GameError::InvalidState(
            "character select attempted before login".into(),
        ));
    };

    let record = if requested_id == 0 {
        let defaults = &config::get().character_defaults;
        repository::create_character(
            account_id,
            &name,
            defaults.starting_map as i64,
            defaults.starting_x as i64,
            defaults.starting_y as i64,
            defaults.starting_hp as i64,
            defaults.starting_mp as i64,
            now_unix(),
        )?
    } else {
        match repository::load_character(requested_id as i64)? {
            Some(record) if record.account_id == account_id => record,
            _ => {
                session.close(LogoutReason::ParamsInvalid);
                return Ok(());
            }
        }
    };

    let inventory = repository::load_items_for_character(record.id)?;

    let player = Player {
        id: record.id as u64,
        account_id: record.account_id as u64,
        name: record.name,
        map: record.map as u16,
        x: record.x as i32,
        y: record.y as i32,
        heading: 0,
        level: record.level as u32,
        experience: record.experience as u64,
        hp: record.hp as i32,
        max_hp: record.max_hp as i32,
        mp: record.mp as i32,
        max_mp: record.max_mp as i32,
        alignment: 0,
        pk_count: 0,
        buffs: Vec::new(),
        known_spells: Vec::new(),
        bookmarks: Vec::new(),
        clan_id: None,
        party_id: None,
        inventory,
    };

    let player_id = player.id;
    *session.player_id.lock() = Some(player_id);
    world::with_mut(|state| state.insert_player(player));
    session.set_state(SessionState::InWorld);
    event_bus::with_mut(|events| events.publish(GameEvent::PlayerEntered { player_id }));
    Ok(())
}

/// Pulls the player out of the world and returns the session to the
/// character-select screen; the socket itself stays open.
pub fn logout(session: &SessionHandle, _reader: &mut core::codec::PacketReader) -> GameResult<()> {
    let Some(player_id) = session.player_id.lock().take() else {
        return Ok(());
    };
    world::with_mut(|state| {
        state.remove_player(player_id);
    });
    event_bus::with_mut(|events| events.publish(GameEvent::PlayerLeft { player_id }));
    session.set_state(SessionState::ReturningToSelect);
    Ok(())
}
