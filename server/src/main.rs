use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use signal_hook::consts::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;

use parking_lot::RwLock;

use server::background_saver::BackgroundSaver;
use server::config::{self, Config};
use server::dispatch::Dispatcher;
use server::handlers;
use server::listener::Listener;
use server::logging;
use server::repository;
use server::script_bridge::ScriptBridge;
use server::session::registry::SessionRegistry;
use server::systems::{
    BuffTickSystem, CleanupSystem, CombatSystem, CompanionAiSystem, DeathSystem,
    EventDispatchSystem, GroundItemSystem, InputSystem, NpcAiSystem, NpcRespawnSystem,
    OutputSystem, PartyRefreshSystem, PersistenceSystem, PolymorphSystem, RegenSystem,
    SkillSystem, SummonSystem, VisibilitySystem, WeatherSystem,
};
use server::tick::Scheduler;

fn setup_signal_handling(
    quit_flag: Arc<AtomicBool>,
) -> (std::thread::JoinHandle<()>, signal_hook::iterator::Handle) {
    let mut signals = Signals::new([SIGINT, SIGTERM, SIGQUIT, SIGHUP]).unwrap();
    let handle = signals.handle();

    let signal_thread = std::thread::spawn(move || {
        for sig in signals.forever() {
            match sig {
                SIGINT | SIGTERM | SIGQUIT => {
                    if !quit_flag.load(Ordering::SeqCst) {
                        log::info!("Got signal to terminate. Shutdown initiated...");
                    } else {
                        log::info!("Alright, alright, I'm already terminating!");
                    }
                    quit_flag.store(true, Ordering::SeqCst);
                }
                _ => {
                    log::warn!("Received unsupported signal: {}", sig);
                }
            }
        }
    });

    (signal_thread, handle)
}

/// Drains the accept loop into the registry. Run once per full tick, ahead
/// of the Input phase, so a connection accepted this tick can still have its
/// handshake packet picked up the same tick.
fn accept_pending(listener: &Listener, registry: &Arc<RwLock<SessionRegistry>>) {
    while let Some(new_session) = listener.try_accept() {
        log::info!("accepted session {}", new_session.handle.id);
        registry
            .write()
            .insert(new_session.handle, new_session.inbound);
    }
}

fn main() -> Result<(), String> {
    let cfg = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {e}. Exiting.");
        process::exit(1);
    });

    logging::init_from_config(&cfg).unwrap_or_else(|e| {
        eprintln!("Failed to initialize logger: {e}. Exiting.");
        process::exit(1);
    });
    config::set(cfg.clone());

    log::info!("Starting game server");
    log::info!("Process PID: {}", process::id());

    let quit_flag = Arc::new(AtomicBool::new(false));
    let (signal_thread, handle) = setup_signal_handling(quit_flag.clone());

    if let Err(e) = repository::initialize(&cfg.database.sqlite_path) {
        log::error!("Failed to initialize repository: {e}. Exiting.");
        process::exit(1);
    }

    if let Err(e) = repository::recover_wal() {
        log::error!("WAL recovery failed, refusing to start: {e}");
        process::exit(1);
    }

    let listener = match Listener::bind(
        &cfg.server.bind_address,
        cfg.server.session_id_seed as u32,
        cfg.network.inbound_queue_len,
        cfg.network.outbound_queue_len,
        Duration::from_millis(cfg.network.read_timeout_ms),
        Duration::from_millis(cfg.network.write_timeout_ms),
    ) {
        Ok(l) => l,
        Err(e) => {
            log::error!("Failed to bind {}: {e}. Exiting.", cfg.server.bind_address);
            process::exit(1);
        }
    };

    let registry = Arc::new(RwLock::new(SessionRegistry::new()));

    let mut dispatcher = Dispatcher::new();
    handlers::register_all(&mut dispatcher);
    let dispatcher = Arc::new(dispatcher);

    let saver = Arc::new(BackgroundSaver::spawn());
    let bridge = Arc::new(ScriptBridge::load(&cfg.scripts.directory));

    let save_interval_ticks = (30_000 / cfg.network.tick_ms).max(1);

    let mut scheduler = Scheduler::new();
    // Phase 0: Input
    scheduler.register(Box::new(InputSystem::new(
        registry.clone(),
        dispatcher.clone(),
        cfg.network.max_packets_per_tick,
    )));
    // Phase 1: PreUpdate
    scheduler.register(Box::new(EventDispatchSystem::new()));
    // Phase 2: Update
    scheduler.register(Box::new(CombatSystem::new(bridge.clone())));
    scheduler.register(Box::new(SkillSystem::new(bridge.clone())));
    scheduler.register(Box::new(DeathSystem::new(bridge.clone())));
    scheduler.register(Box::new(PolymorphSystem::new()));
    scheduler.register(Box::new(SummonSystem::new()));
    scheduler.register(Box::new(BuffTickSystem::new()));
    scheduler.register(Box::new(NpcRespawnSystem::new()));
    scheduler.register(Box::new(NpcAiSystem::new(bridge.clone())));
    scheduler.register(Box::new(CompanionAiSystem::new()));
    // Phase 3: PostUpdate
    scheduler.register(Box::new(RegenSystem::new(
        bridge.clone(),
        (1000 / cfg.network.tick_ms).max(1),
    )));
    scheduler.register(Box::new(WeatherSystem::new()));
    scheduler.register(Box::new(GroundItemSystem::new()));
    scheduler.register(Box::new(PartyRefreshSystem::new(
        registry.clone(),
        cfg.network.party_refresh_ticks,
    )));
    scheduler.register(Box::new(VisibilitySystem::new()));
    // Phase 4: Output
    scheduler.register(Box::new(OutputSystem::new(registry.clone())));
    // Phase 5: Persist
    scheduler.register(Box::new(PersistenceSystem::new(
        saver.clone(),
        save_interval_ticks,
    )));
    // Phase 6: Cleanup
    scheduler.register(Box::new(CleanupSystem::new(registry.clone())));

    log::info!("Entering main game loop...");

    let tick_period = Duration::from_millis(cfg.network.tick_ms);
    let input_poll_period = Duration::from_millis(cfg.network.input_poll_ms);
    let mut last_full_tick = std::time::Instant::now();

    while !quit_flag.load(Ordering::SeqCst) {
        accept_pending(&listener, &registry);

        if last_full_tick.elapsed() >= tick_period {
            last_full_tick = std::time::Instant::now();
            scheduler.run_full_tick();
        } else {
            scheduler.run_input_phase();
        }

        std::thread::sleep(input_poll_period);
    }

    log::info!("Shutdown signal received, exiting main loop...");

    for session in registry.read().sessions() {
        session.close(core::types::LogoutReason::Shutdown);
    }

    if let Err(e) = saver.flush() {
        log::error!("Final save flush failed: {e}");
    }
    saver.shutdown();

    log::info!("Server shutdown complete.");

    handle.close();
    signal_thread.join().unwrap_or_else(|e| {
        log::error!("Failed to join signal handling thread: {:?}", e);
    });

    Ok(())
}
