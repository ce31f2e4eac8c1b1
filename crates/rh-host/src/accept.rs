//! Accept error handling shared by the coordinator and session listeners

use std::io;
use std::time::Duration;

/// First pause after an accept error that is not tied to one pending
/// connection.
///
/// Descriptor exhaustion (EMFILE/ENFILE) fails every accept until something
/// closes, so retrying immediately only spins.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Consecutive socket-level failures a session listener sits through before
/// treating the error as unrecoverable
pub(crate) const MAX_ACCEPT_RETRIES: u32 = 5;

/// Pause before retry number `failures` (1-based): doubles, capped at 1.6s
pub(crate) fn backoff(failures: u32) -> Duration {
    ACCEPT_BACKOFF * 2u32.pow(failures.saturating_sub(1).min(4))
}

/// Errors that concern a single pending connection, not the socket
pub(crate) fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
    )
}
