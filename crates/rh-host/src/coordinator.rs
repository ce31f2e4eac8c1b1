//! Coordinator: the well-known entry point
//!
//! Accepts "start a session" and "please host me" connections. Each
//! connection is handled on its own task: read the request line, seed the
//! counter from an optional `[State=n]` token, allocate a port, bind a
//! [`SessionListener`] there and report `[Port=n]` back. The connection task
//! then becomes that session's accept loop.
//!
//! A port that cannot be bound is skipped and a fresh one allocated, up to
//! `session.max_bind_attempts` times.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::StreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;

use rh_core::HostError;
use rh_protocol::{is_favicon_request, parse_state, LineCodec, Page};

use crate::accept::{backoff, is_transient};
use crate::session::SessionListener;
use crate::state::HostState;

/// Accept loop on the coordinator port
pub struct Coordinator {
    listener: TcpListener,
    state: Arc<HostState>,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Bind the coordinator port from the host configuration
    pub async fn bind(state: Arc<HostState>, cancel: CancellationToken) -> Result<Self> {
        let address = state.config.coordinator_address();
        let listener = TcpListener::bind(&address)
            .await
            .with_context(|| format!("Failed to bind coordinator to {}", address))?;

        Ok(Self {
            listener,
            state,
            cancel,
        })
    }

    /// Address the coordinator is listening on
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Run until cancelled, then close every live session
    pub async fn run(self) -> Result<()> {
        tracing::info!("Coordinator listening on {}", self.local_addr()?);

        let mut failures = 0u32;
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("Coordinator shutting down");
                    break;
                }

                result = self.listener.accept() => {
                    match result {
                        Ok((socket, peer_addr)) => {
                            failures = 0;
                            self.dispatch(socket, peer_addr);
                        }
                        Err(e) if is_transient(&e) => {
                            tracing::warn!("Transient accept error on coordinator: {}", e);
                        }
                        Err(e) => {
                            // The coordinator never gives up its port
                            failures = failures.saturating_add(1);
                            tracing::error!("Failed to accept connection: {}", e);
                            tokio::select! {
                                _ = self.cancel.cancelled() => break,
                                _ = tokio::time::sleep(backoff(failures)) => {}
                            }
                        }
                    }
                }
            }
        }

        let closed = self.state.sessions.close_all();
        if closed > 0 {
            tracing::info!("Closed {} live session(s)", closed);
        }
        Ok(())
    }

    fn dispatch(&self, socket: TcpStream, peer_addr: SocketAddr) {
        tracing::debug!("New coordinator connection from {}", peer_addr);

        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(state, socket).await {
                tracing::warn!("Session request from {} failed: {}", peer_addr, e);
            }
        });
    }
}

async fn handle_connection(state: Arc<HostState>, socket: TcpStream) -> Result<(), HostError> {
    let (reader, mut writer) = socket.into_split();
    let mut lines = FramedRead::new(
        reader,
        LineCodec::with_max_length(state.config.max_request_line),
    );

    let request = match lines.next().await {
        None => {
            tracing::debug!("Coordinator connection closed without a request");
            return Ok(());
        }
        Some(Err(e)) if e.is_malformed_line() => {
            reply_invalid(&state, &mut writer, "", &e.to_string()).await?;
            return Err(e.into());
        }
        Some(Err(e)) => return Err(e.into()),
        Some(Ok(request)) => request,
    };

    if state.config.ignore_favicon && is_favicon_request(&request) {
        tracing::debug!("Ignoring favicon request");
        writer.write_all(&state.presenter.not_found()).await?;
        writer.shutdown().await?;
        return Ok(());
    }

    let seed = match parse_state(&request) {
        Ok(seed) => seed.unwrap_or(0),
        Err(e) => {
            reply_invalid(&state, &mut writer, &request, &e.to_string()).await?;
            return Err(e.into());
        }
    };

    let session = match start_session(&state, seed).await {
        Ok(session) => session,
        Err(e) => {
            reply_invalid(&state, &mut writer, &request, &e.to_string()).await?;
            return Err(e);
        }
    };

    session.announce(&mut writer, &request).await?;
    drop(writer);
    drop(lines);

    session.run().await;
    Ok(())
}

/// Allocate ports until one binds or the attempt budget runs out
async fn start_session(state: &Arc<HostState>, seed: u64) -> Result<SessionListener, HostError> {
    let attempts = state.config.session.max_bind_attempts;
    let mut last_error = HostError::PortsExhausted;

    for attempt in 1..=attempts {
        let port = state.allocator.next()?;
        match SessionListener::bind(Arc::clone(state), port, seed).await {
            Ok(session) => {
                tracing::info!(
                    "Starting session listener at port {} with state {} ({} live)",
                    port,
                    seed,
                    state.sessions.len()
                );
                return Ok(session);
            }
            Err(e) if e.is_bind_failure() => {
                tracing::warn!(
                    "Session port {} unavailable (attempt {}/{}): {}",
                    port,
                    attempt,
                    attempts,
                    e
                );
                last_error = e;
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_error)
}

async fn reply_invalid<W>(
    state: &HostState,
    writer: &mut W,
    request: &str,
    reason: &str,
) -> Result<(), HostError>
where
    W: AsyncWrite + Unpin,
{
    let response = state.presenter.respond(&Page::Invalid {
        port: state.config.coordinator_port,
        host: &state.config.advertised_host,
        request,
        reason,
    });
    writer.write_all(&response).await?;
    writer.shutdown().await?;
    Ok(())
}
