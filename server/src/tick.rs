//! Phase-ordered tick scheduler.
//!
//! Each full tick runs every phase in order; the high-frequency poller runs
//! only phase 0 (Input) between full ticks, so movement/chat input latency
//! isn't bounded by the slower full-simulation period.

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Phase {
    Input = 0,
    PreUpdate = 1,
    Update = 2,
    PostUpdate = 3,
    Output = 4,
    Persist = 5,
    Cleanup = 6,
}

pub const ALL_PHASES: [Phase; 7] = [
    Phase::Input,
    Phase::PreUpdate,
    Phase::Update,
    Phase::PostUpdate,
    Phase::Output,
    Phase::Persist,
    Phase::Cleanup,
];

pub trait System {
    fn name(&self) -> &'static str;
    fn phase(&self) -> Phase;
    fn run(&mut self, current_tick: u64);
}

/// Runs registered systems in phase order for one full tick. Systems
/// registered under the same phase run in registration order.
#[derive(Default)]
pub struct Scheduler {
    systems: Vec<Box<dyn System>>,
    pub current_tick: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, system: Box<dyn System>) {
        self.systems.push(system);
        self.systems.sort_by_key(|s| s.phase());
    }

    pub fn run_full_tick(&mut self) {
        self.current_tick += 1;
        let tick = self.current_tick;
        for system in self.systems.iter_mut() {
            let started = std::time::Instant::now();
            system.run(tick);
            log::debug!(
                "system {} ran phase {:?} in {:?}",
                system.name(),
                system.phase(),
                started.elapsed()
            );
        }
    }

    /// Runs only the Input-phase systems, for the high-frequency poller.
    /// Does not advance `current_tick` — input polled between full ticks
    /// still belongs to the tick that's about to run.
    pub fn run_input_phase(&mut self) {
        for system in self.systems.iter_mut() {
            if system.phase() == Phase::Input {
                system.run(self.current_tick + 1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct RecordingSystem {
        name: &'static str,
        phase: Phase,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl System for RecordingSystem {
        fn name(&self) -> &'static str {
            self.name
        }
        fn phase(&self) -> Phase {
            self.phase
        }
        fn run(&mut self, _tick: u64) {
            self.log.lock().unwrap().push(self.name);
        }
    }

    #[test]
    fn systems_run_in_phase_order_regardless_of_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut sched = Scheduler::new();
        sched.register(Box::new(RecordingSystem {
            name: "output",
            phase: Phase::Output,
            log: log.clone(),
        }));
        sched.register(Box::new(RecordingSystem {
            name: "input",
            phase: Phase::Input,
            log: log.clone(),
        }));
        sched.run_full_tick();
        assert_eq!(*log.lock().unwrap(), vec!["input", "output"]);
    }

    #[test]
    fn run_full_tick_advances_tick_counter() {
        let mut sched = Scheduler::new();
        assert_eq!(sched.current_tick, 0);
        sched.run_full_tick();
        assert_eq!(sched.current_tick, 1);
    }

    #[test]
    fn input_phase_poll_does_not_advance_tick_counter() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut sched = Scheduler::new();
        sched.register(Box::new(RecordingSystem {
            name: "input",
            phase: Phase::Input,
            log: log.clone(),
        }));
        sched.run_input_phase();
        assert_eq!(sched.current_tick, 0);
        assert_eq!(*log.lock().unwrap(), vec!["input"]);
    }
}
