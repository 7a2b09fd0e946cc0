/// Background persistence thread for writing world state to sqlite.
///
/// The main game loop (single-threaded) periodically clones slices of
/// in-memory data and sends them to this background thread via an `mpsc`
/// channel. The background thread never touches the repository's process
/// connection directly from the loop thread — every write happens here, so
/// the loop's phases never block on disk I/O.
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use core::types::Player;

/// A unit of work sent to the background saver thread via
/// [`BackgroundSaver::send`].
///
/// Each variant carries the cloned data needed for one write operation so
/// the game loop can hand off ownership and continue immediately.
pub enum SaveJob {
    /// Persist a snapshot of in-world players to the `characters` table.
    Players(Vec<Player>),
    /// Request a synchronous flush — the saver thread will ack via the
    /// provided one-shot channel once every job enqueued before it has
    /// been applied.
    Flush(mpsc::Sender<Result<(), String>>),
    /// Shut down the background thread cleanly.
    Shutdown,
}

/// Handle for the background saver thread.
///
/// Returned by [`BackgroundSaver::spawn`]. Stores the `mpsc` sender and the
/// thread join handle so the owner can enqueue [`SaveJob`]s and join on
/// shutdown.
pub struct BackgroundSaver {
    tx: mpsc::Sender<SaveJob>,
    handle: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl BackgroundSaver {
    /// Spawn the background saver thread.
    ///
    /// Creates an `mpsc` channel and starts a dedicated thread listening
    /// for [`SaveJob`] messages against the process-wide repository
    /// connection.
    ///
    /// # Panics
    ///
    /// Panics if the OS thread cannot be spawned.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel::<SaveJob>();
        let handle = thread::Builder::new()
            .name("bg-saver".into())
            .spawn(move || saver_thread_main(rx))
            .expect("Failed to spawn background saver thread");
        Self {
            tx,
            handle: std::sync::Mutex::new(Some(handle)),
        }
    }

    /// Enqueue a save job on the background thread.
    ///
    /// Non-blocking — the data is sent through the `mpsc` channel and
    /// processed asynchronously.
    pub fn send(&self, job: SaveJob) {
        if let Err(e) = self.tx.send(job) {
            log::error!("Failed to send save job to background saver: {e}");
        }
    }

    /// Request a synchronous flush: blocks the caller until the background
    /// thread has drained its entire job queue.
    ///
    /// # Returns
    ///
    /// * `Ok(())` once the flush is acknowledged.
    /// * `Err` if the background thread has already exited.
    pub fn flush(&self) -> Result<(), String> {
        let (ack_tx, ack_rx) = mpsc::channel();
        self.send(SaveJob::Flush(ack_tx));
        ack_rx
            .recv()
            .map_err(|_| "Background saver flush: channel closed".to_string())?
    }

    /// Signal the background thread to stop and block until it exits.
    ///
    /// Safe to call multiple times — subsequent calls are no-ops after the
    /// join handle has been consumed. Also called automatically by the
    /// [`Drop`] implementation.
    pub fn shutdown(&self) {
        let _ = self.tx.send(SaveJob::Shutdown);
        if let Some(handle) = self.handle.lock().unwrap().take() {
            if let Err(e) = handle.join() {
                log::error!("Background saver thread panicked: {e:?}");
            }
        }
    }

    #[cfg(test)]
    pub fn spawn_for_test() -> Self {
        Self::spawn()
    }
}

impl Drop for BackgroundSaver {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ---------------------------------------------------------------------------
//  Background thread main loop
// ---------------------------------------------------------------------------

/// Entry point for the background saver thread.
///
/// Blocks on the `mpsc` receiver, processing [`SaveJob`] messages in FIFO
/// order until a [`SaveJob::Shutdown`] is received or the channel is
/// closed.
fn saver_thread_main(rx: mpsc::Receiver<SaveJob>) {
    log::info!("Background saver thread started.");

    loop {
        let job = match rx.recv() {
            Ok(job) => job,
            Err(_) => {
                log::info!("Background saver: channel closed, shutting down.");
                break;
            }
        };

        match job {
            SaveJob::Players(players) => {
                let t = std::time::Instant::now();
                let now = now_unix();
                let count = players.len();
                for player in players {
                    let record = crate::repository::CharacterRecord {
                        id: player.id as i64,
                        account_id: player.account_id as i64,
                        name: player.name,
                        map: player.map as i64,
                        x: player.x as i64,
                        y: player.y as i64,
                        hp: player.hp as i64,
                        max_hp: player.max_hp as i64,
                        mp: player.mp as i64,
                        max_mp: player.max_mp as i64,
                        level: player.level as i64,
                        experience: player.experience as i64,
                    };
                    if let Err(e) = crate::repository::save_character(&record, now) {
                        log::error!("Background save character {} failed: {e}", record.id);
                    }
                    for item in &player.inventory {
                        if let Err(e) = crate::repository::save_item(record.id, item) {
                            log::error!("Background save item {} failed: {e}", item.id);
                        }
                    }
                }
                log::debug!("Background save: {count} players in {:.2?}", t.elapsed());
            }
            SaveJob::Flush(ack) => {
                // All prior jobs have already been processed (channel is FIFO).
                let _ = ack.send(Ok(()));
            }
            SaveJob::Shutdown => {
                log::info!("Background saver: shutdown requested.");
                break;
            }
        }
    }

    log::info!("Background saver thread exiting.");
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
//  Unit Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Dropping a `BackgroundSaver` before calling `shutdown()` should not
    /// panic — the `Drop` impl calls `shutdown()` internally.
    #[test]
    fn drop_without_explicit_shutdown_does_not_panic() {
        let saver = BackgroundSaver::spawn();
        drop(saver);
    }

    /// Calling `shutdown()` twice should not panic.
    #[test]
    fn double_shutdown_does_not_panic() {
        let saver = BackgroundSaver::spawn();
        saver.shutdown();
        saver.shutdown(); // second call is a no-op
    }

    #[test]
    fn flush_round_trips_with_no_pending_jobs() {
        let saver = BackgroundSaver::spawn();
        assert!(saver.flush().is_ok());
        saver.shutdown();
    }
}
