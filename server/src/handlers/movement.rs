//! Move: one tile per accepted packet, throttled to one accepted move every
//! [`core::constants::MIN_MOVE_INTERVAL_TICKS`] so a client reporting moves
//! faster than the walk speed allows can't outrun the simulation.

use core::GameResult;

use crate::path_finding::direction_delta;
use crate::session::SessionHandle;
use crate::world;

pub fn move_player(
    session: &SessionHandle,
    reader: &mut core::codec::PacketReader,
) -> GameResult<()> {
    let dir = reader.u8()?;

    let Some(player_id) = *session.player_id.lock() else {
        return Ok(());
    };

    let current_tick = world::with(|state| state.current_tick);
    if !session.try_accept_move(current_tick, core::constants::MIN_MOVE_INTERVAL_TICKS) {
        return Ok(());
    }

    let Some((dx, dy)) = direction_delta(dir) else {
        return Ok(());
    };

    world::with_mut(|state| {
        let Some(player) = state.players.get(&player_id) else {
            return;
        };
        let (map, x, y) = (player.map, player.x + dx, player.y + dy);
        if state.move_player(player_id, map, x, y) {
            if let Some(player) = state.players.get_mut(&player_id) {
                player.heading = dir;
            }
        }
    });

    Ok(())
}
