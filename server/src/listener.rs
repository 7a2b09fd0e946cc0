//! Accept loop: binds the listening socket, allocates a monotonic session
//! id per connection, and hands each accepted stream to [`crate::session`].

use std::net::TcpListener;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Receiver;
use std::time::Duration;

use crate::session::{self, SessionHandle};

pub struct NewSession {
    pub handle: SessionHandle,
    pub inbound: Receiver<(u64, Vec<u8>)>,
}

pub struct Listener {
    listener: TcpListener,
    next_id: AtomicU64,
    seed_base: u32,
    inbound_queue_len: usize,
    outbound_queue_len: usize,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl Listener {
    pub fn bind(
        bind_address: &str,
        seed_base: u32,
        inbound_queue_len: usize,
        outbound_queue_len: usize,
        read_timeout: Duration,
        write_timeout: Duration,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(bind_address)?;
        listener.set_nonblocking(true)?;
        Ok(Self {
            listener,
            next_id: AtomicU64::new(1),
            seed_base,
            inbound_queue_len,
            outbound_queue_len,
            read_timeout,
            write_timeout,
        })
    }

    /// Non-blocking accept: returns `None` immediately if nothing is
    /// pending, so the caller's tick loop never stalls on I/O here.
    pub fn try_accept(&self) -> Option<NewSession> {
        let (stream, _addr) = self.listener.accept().ok()?;
        let _ = stream.set_nonblocking(false);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let seed = self.seed_base.wrapping_add(id as u32);
        let (handle, inbound) = session::spawn(
            id,
            stream,
            seed,
            self.inbound_queue_len,
            self.outbound_queue_len,
            self.read_timeout,
            self.write_timeout,
        );
        Some(NewSession { handle, inbound })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_accept_returns_none_with_no_pending_connection() {
        let listener = Listener::bind(
            "127.0.0.1:0",
            1,
            8,
            8,
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(listener.try_accept().is_none());
    }

    #[test]
    fn session_ids_are_monotonic() {
        let listener = Listener::bind(
            "127.0.0.1:0",
            1,
            8,
            8,
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(listener.next_id.load(Ordering::Relaxed), 1);
    }
}
