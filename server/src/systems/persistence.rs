//! Phase 5: hands a snapshot of dirty world state to the background saver
//! thread. This system never blocks on database I/O itself — it only
//! enqueues, matching the concurrency rule that phases 0-4 never suspend on
//! persistence.

use crate::background_saver::{BackgroundSaver, SaveJob};
use crate::tick::{Phase, System};
use crate::world;

pub struct PersistenceSystem {
    saver: std::sync::Arc<BackgroundSaver>,
    save_interval_ticks: u64,
}

impl PersistenceSystem {
    pub fn new(saver: std::sync::Arc<BackgroundSaver>, save_interval_ticks: u64) -> Self {
        Self {
            saver,
            save_interval_ticks,
        }
    }
}

impl System for PersistenceSystem {
    fn name(&self) -> &'static str {
        "persistence"
    }

    fn phase(&self) -> Phase {
        Phase::Persist
    }

    fn run(&mut self, current_tick: u64) {
        if current_tick % self.save_interval_ticks != 0 {
            return;
        }
        let players = world::with(|state| state.players.values().cloned().collect::<Vec<_>>());
        if players.is_empty() {
            return;
        }
        self.saver.send(SaveJob::Players(players));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_save_off_interval() {
        let saver = std::sync::Arc::new(BackgroundSaver::spawn_for_test());
        let mut system = PersistenceSystem::new(saver, 10);
        system.run(3);
    }
}
