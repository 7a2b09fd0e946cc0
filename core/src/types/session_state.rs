//! Session lifecycle state machine and the reasons a session is torn down.

/// A connection's position in its handshake/play lifecycle. Each opcode is
/// only dispatchable from a subset of these states (see the server's
/// dispatch registry).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum SessionState {
    /// Just accepted, waiting for the client's init/handshake packet.
    AwaitingHandshake = 0,
    /// Handshake verified, waiting for login credentials.
    AwaitingLogin = 1,
    /// Credentials accepted, account attached, waiting for character select.
    Authenticated = 2,
    /// Player entered the simulated world and can send gameplay opcodes.
    InWorld = 3,
    /// Player left a character back to the select screen without disconnecting.
    ReturningToSelect = 4,
    /// Tearing down; no further opcodes are dispatched.
    Closing = 5,
}

impl SessionState {
    pub fn allows_gameplay(self) -> bool {
        matches!(self, SessionState::InWorld)
    }
}

/// Why a session was closed, mirrored to clients that display a disconnect reason.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum LogoutReason {
    Unknown = 0,
    ChallengeFailed = 1,
    IdleTooLong = 2,
    NoRoom = 3,
    ParamsInvalid = 4,
    PasswordIncorrect = 5,
    ClientTooSlow = 6,
    Failure = 7,
    Shutdown = 8,
    Exit = 9,
    Usurp = 10,
    Kicked = 11,
    VersionMismatch = 12,
    RateLimited = 13,
}
