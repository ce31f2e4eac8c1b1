//! Session state shared between a listener and its workers
//!
//! # Ownership
//!
//! The listening socket itself lives inside the [`SessionListener`] task.
//! Workers only see a [`ListeningHandle`], which can request that the socket
//! be closed and wait until the listener has actually released it. The
//! counter is the only other shared field and is guarded by a mutex.
//!
//! # Hand-off
//!
//! A migrating worker holds the counter lock from the moment it reads the
//! value until the listening socket is released. Updates queued behind that
//! lock then observe the closed handle and are refused, so the value carried
//! to the destination is exactly the value the source ended with.
//!
//! [`SessionListener`]: super::SessionListener

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

use rh_core::HostError;

/// Non-owning view of a session's listening socket
#[derive(Debug, Default)]
pub struct ListeningHandle {
    /// Set by the first (and only effective) close request
    closed: AtomicBool,
    /// Wakes the listener out of accept
    close: CancellationToken,
    /// Cancelled by the listener once the socket has been dropped
    released: CancellationToken,
}

impl ListeningHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the listener to close its socket.
    ///
    /// Returns `true` only for the call that performed the close.
    pub fn close(&self) -> bool {
        if self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.close.cancel();
            true
        } else {
            false
        }
    }

    /// Whether a close has been requested
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Resolves once a close has been requested
    pub async fn closed(&self) {
        self.close.cancelled().await
    }

    /// Resolves once the listener has dropped its socket
    pub async fn released(&self) {
        self.released.cancelled().await
    }

    #[cfg(test)]
    pub(crate) fn is_released(&self) -> bool {
        self.released.is_cancelled()
    }

    pub(crate) fn mark_released(&self) {
        self.released.cancel();
    }
}

/// Counter and listening handle for one session
#[derive(Debug)]
pub struct SessionState {
    port: u16,
    counter: Mutex<u64>,
    listening: ListeningHandle,
}

impl SessionState {
    /// Create state for a session on `port`, seeded with `counter`
    pub fn new(port: u16, counter: u64) -> Self {
        Self {
            port,
            counter: Mutex::new(counter),
            listening: ListeningHandle::new(),
        }
    }

    /// Port this session listens on
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Current counter value
    pub async fn counter(&self) -> u64 {
        *self.counter.lock().await
    }

    /// Increment the counter and return the new value.
    ///
    /// Fails once the session has been closed, so no update is applied to a
    /// session that has already handed its state to another host.
    pub async fn increment(&self) -> Result<u64, HostError> {
        let mut counter = self.counter.lock().await;
        if self.listening.is_closed() {
            return Err(HostError::SessionClosed(self.port));
        }
        *counter = counter.saturating_add(1);
        Ok(*counter)
    }

    /// Lock the counter for a hand-off; updates wait until the guard drops.
    pub async fn lock_for_handoff(&self) -> Result<MutexGuard<'_, u64>, HostError> {
        let counter = self.counter.lock().await;
        if self.listening.is_closed() {
            return Err(HostError::SessionClosed(self.port));
        }
        Ok(counter)
    }

    /// Handle to the session's listening socket
    pub fn listening(&self) -> &ListeningHandle {
        &self.listening
    }
}
