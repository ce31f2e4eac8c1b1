//! Per-session listener
//!
//! Lifecycle: `bind` (Initializing → Bound), `announce` (report the port over
//! the coordinator connection), `run` (Accepting until the listening socket
//! is closed, then Terminated). Dropping the listener at any point releases
//! the socket and removes the session from the registry.

use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Semaphore;

use rh_core::HostError;
use rh_protocol::Page;

use super::{RequestWorker, SessionState};
use crate::accept::{backoff, is_transient, MAX_ACCEPT_RETRIES};
use crate::state::HostState;

/// Owns a session's listening socket and dispatches its requests
pub struct SessionListener {
    /// Taken by `run`; `None` once the accept loop owns it
    listener: Option<TcpListener>,
    state: Arc<SessionState>,
    host: Arc<HostState>,
}

impl SessionListener {
    /// Bind the session socket on `port` and register the session.
    pub async fn bind(host: Arc<HostState>, port: u16, seed: u64) -> Result<Self, HostError> {
        let address = host.config.session_address(port);
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| HostError::Bind { port, source })?;

        let state = Arc::new(SessionState::new(port, seed));
        host.sessions.register(Arc::clone(&state))?;

        tracing::debug!("Session socket bound on {} with state {}", address, seed);

        Ok(Self {
            listener: Some(listener),
            state,
            host,
        })
    }

    /// Port this session listens on
    pub fn port(&self) -> u16 {
        self.state.port()
    }

    /// Shared session state
    pub fn state(&self) -> &Arc<SessionState> {
        &self.state
    }

    /// Report the bound port back over the connection that asked for it.
    pub async fn announce<W>(&self, writer: &mut W, request: &str) -> Result<(), HostError>
    where
        W: AsyncWrite + Unpin,
    {
        let response = self.host.presenter.respond(&Page::Announce {
            port: self.port(),
            host: &self.host.config.advertised_host,
            request,
        });
        writer.write_all(&response).await?;
        writer.shutdown().await?;
        Ok(())
    }

    /// Accept connections until the listening socket is closed.
    pub async fn run(mut self) {
        let Some(listener) = self.listener.take() else {
            return;
        };
        let port = self.port();
        let workers = self
            .host
            .config
            .session
            .max_workers
            .map(|limit| Arc::new(Semaphore::new(limit)));

        tracing::info!("Session listener accepting on port {}", port);

        let mut failures = 0u32;
        loop {
            let permit = match &workers {
                Some(limit) => tokio::select! {
                    biased;
                    _ = self.state.listening().closed() => break,
                    permit = Arc::clone(limit).acquire_owned() => match permit {
                        Ok(permit) => Some(permit),
                        Err(_) => break,
                    },
                },
                None => None,
            };

            tokio::select! {
                biased;

                _ = self.state.listening().closed() => {
                    tracing::info!("Listening socket for port {} closed", port);
                    break;
                }

                result = listener.accept() => match result {
                    Ok((socket, peer_addr)) => {
                        failures = 0;
                        tracing::debug!("Got a connection to session {} from {}", port, peer_addr);

                        let worker = RequestWorker::new(Arc::clone(&self.state), Arc::clone(&self.host));
                        tokio::spawn(async move {
                            let _permit = permit;
                            if let Err(e) = worker.handle(socket).await {
                                tracing::warn!(
                                    "Request from {} to session {} failed: {}",
                                    peer_addr,
                                    port,
                                    e
                                );
                            }
                        });
                    }
                    Err(e) if is_transient(&e) => {
                        tracing::warn!("Transient accept error on port {}: {}", port, e);
                    }
                    Err(e) => {
                        failures += 1;
                        if failures > MAX_ACCEPT_RETRIES {
                            tracing::error!("Accept failed on port {}, stopping session: {}", port, e);
                            break;
                        }
                        tracing::warn!(
                            "Accept failed on port {} ({}/{}): {}",
                            port,
                            failures,
                            MAX_ACCEPT_RETRIES,
                            e
                        );
                        tokio::select! {
                            _ = self.state.listening().closed() => break,
                            _ = tokio::time::sleep(backoff(failures)) => {}
                        }
                    }
                }
            }
        }

        drop(listener);
        tracing::info!("Session listener on port {} terminated", port);
    }
}

impl Drop for SessionListener {
    fn drop(&mut self) {
        drop(self.listener.take());
        self.state.listening().close();
        self.host.sessions.deregister(&self.state);
        self.state.listening().mark_released();
    }
}
