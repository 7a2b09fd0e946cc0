//! Opcode dispatch registry: maps each opcode to a handler plus the set of
//! session states it's legal to call from. Handler panics are caught at
//! this boundary so one misbehaving handler closes only its own session.

use core::types::SessionState;
use core::GameError;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::enums::Opcode;
use crate::session::SessionHandle;

pub type HandlerFn = fn(&SessionHandle, &mut core::codec::PacketReader) -> Result<(), GameError>;

struct Entry {
    handler: HandlerFn,
    allowed_states: &'static [SessionState],
}

#[derive(Default)]
pub struct Dispatcher {
    entries: HashMap<Opcode, Entry>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        opcode: Opcode,
        allowed_states: &'static [SessionState],
        handler: HandlerFn,
    ) {
        self.entries.insert(opcode, Entry { handler, allowed_states });
    }

    /// Dispatches one decoded packet. Unknown opcodes are dropped silently
    /// at debug level (not an error: future/older clients may send opcodes
    /// this build doesn't know). A state mismatch or handler panic closes
    /// the session via the returned error.
    pub fn dispatch(
        &self,
        session: &SessionHandle,
        state: SessionState,
        reader: &mut core::codec::PacketReader,
        opcode_byte: u8,
    ) -> Result<(), GameError> {
        let Some(opcode) = Opcode::from_u8(opcode_byte) else {
            log::debug!("dropping unknown opcode 0x{opcode_byte:02x}");
            return Ok(());
        };

        let Some(entry) = self.entries.get(&opcode) else {
            log::debug!("no handler registered for {opcode:?}");
            return Ok(());
        };

        if !entry.allowed_states.contains(&state) {
            return Err(GameError::InvalidState(format!(
                "{opcode:?} not allowed in state {state:?}"
            )));
        }

        let handler = entry.handler;
        match catch_unwind(AssertUnwindSafe(|| handler(session, reader))) {
            Ok(result) => result,
            Err(_) => Err(GameError::HandlerPanic(format!("{opcode:?}"))),
        }
    }
}
