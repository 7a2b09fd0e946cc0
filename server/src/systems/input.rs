//! Phase 0: drains every session's inbound queue and dispatches each
//! packet through the opcode registry. Shared by both the full tick and
//! the high-frequency input-only poller.

use crate::dispatch::Dispatcher;
use crate::session::registry::SessionRegistry;
use crate::tick::{Phase, System};
use parking_lot::RwLock;
use std::sync::Arc;

pub struct InputSystem {
    registry: Arc<RwLock<SessionRegistry>>,
    dispatcher: Arc<Dispatcher>,
    max_packets_per_tick: usize,
}

impl InputSystem {
    pub fn new(
        registry: Arc<RwLock<SessionRegistry>>,
        dispatcher: Arc<Dispatcher>,
        max_packets_per_tick: usize,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            max_packets_per_tick,
        }
    }
}

impl System for InputSystem {
    fn name(&self) -> &'static str {
        "input"
    }

    fn phase(&self) -> Phase {
        Phase::Input
    }

    fn run(&mut self, _current_tick: u64) {
        let packets = {
            let reg = self.registry.read();
            reg.drain_inbound(self.max_packets_per_tick)
        };

        for (session_id, payload) in packets {
            let handle = {
                let reg = self.registry.read();
                reg.get(session_id).cloned()
            };
            let Some(session) = handle else { continue };
            if payload.is_empty() {
                continue;
            }
            let opcode_byte = payload[0];
            let mut reader = core::codec::PacketReader::new(&payload);
            let _ = reader.opcode();
            let state = session.state();
            if let Err(e) = self
                .dispatcher
                .dispatch(&session, state, &mut reader, opcode_byte)
            {
                log::debug!("session {session_id} dispatch error: {e}");
                session.close(core::types::LogoutReason::Failure);
            }
        }
    }
}
