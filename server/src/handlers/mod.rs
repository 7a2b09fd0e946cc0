//! Per-opcode business logic.
//!
//! Each handler is a plain function over `(&SessionHandle, &mut PacketReader)`
//! — the dispatcher's `HandlerFn` carries no injected dependency bundle, so
//! handlers reach shared engine state exclusively through the global
//! accessors `crate::world`, `crate::repository`, `crate::event_bus`, and
//! `crate::systems::combat::enqueue`, the same singleton-plus-closure
//! discipline those modules already use elsewhere.

mod chat;
mod combat;
mod item;
mod login;
mod movement;
mod trade;

use core::types::SessionState;

use crate::dispatch::Dispatcher;
use crate::enums::Opcode;

/// Registers every opcode handler against the session states it's legal to
/// call from. Called once from `main` before the listener starts accepting.
pub fn register_all(dispatcher: &mut Dispatcher) {
    dispatcher.register(
        Opcode::Handshake,
        &[SessionState::AwaitingHandshake],
        login::handshake,
    );
    dispatcher.register(Opcode::Login, &[SessionState::AwaitingLogin], login::login);
    dispatcher.register(
        Opcode::CharacterSelect,
        &[SessionState::Authenticated, SessionState::ReturningToSelect],
        login::character_select,
    );
    dispatcher.register(Opcode::Logout, &[SessionState::InWorld], login::logout);

    dispatcher.register(Opcode::Move, &[SessionState::InWorld], movement::move_player);

    dispatcher.register(Opcode::Attack, &[SessionState::InWorld], combat::attack);

    dispatcher.register(Opcode::UseItem, &[SessionState::InWorld], item::use_item);
    dispatcher.register(Opcode::DropItem, &[SessionState::InWorld], item::drop_item);
    dispatcher.register(
        Opcode::PickupItem,
        &[SessionState::InWorld],
        item::pickup_item,
    );

    dispatcher.register(Opcode::Chat, &[SessionState::InWorld], chat::chat);

    dispatcher.register(Opcode::Trade, &[SessionState::InWorld], trade::trade);
}
