//! One-shot request worker

use std::sync::Arc;

use bytes::Bytes;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_util::codec::FramedRead;

use rh_core::HostError;
use rh_protocol::{LineCodec, Page, RequestKind};

use super::SessionState;
use crate::state::HostState;

/// Handles exactly one connection to a session: read one line, act, reply.
pub struct RequestWorker {
    state: Arc<SessionState>,
    host: Arc<HostState>,
}

impl RequestWorker {
    pub fn new(state: Arc<SessionState>, host: Arc<HostState>) -> Self {
        Self { state, host }
    }

    /// Serve the connection. Errors only concern this connection.
    pub async fn handle(self, socket: TcpStream) -> Result<(), HostError> {
        let (reader, mut writer) = socket.into_split();
        let mut lines = FramedRead::new(
            reader,
            LineCodec::with_max_length(self.host.config.max_request_line),
        );

        let response = match lines.next().await {
            None => {
                tracing::debug!("Connection to session {} closed without a request", self.state.port());
                return Ok(());
            }
            Some(Err(e)) if e.is_malformed_line() => {
                tracing::debug!("Malformed request on port {}: {}", self.state.port(), e);
                self.invalid("", &e.to_string())
            }
            Some(Err(e)) => return Err(e.into()),
            Some(Ok(request)) => {
                tracing::debug!("Request line on port {}: {}", self.state.port(), request);
                match RequestKind::classify(&request) {
                    RequestKind::Migrate => self.migrate(&request).await,
                    RequestKind::Update => self.update(&request).await,
                    RequestKind::Invalid => self.invalid(&request, ""),
                }
            }
        };

        writer.write_all(&response).await?;
        writer.shutdown().await?;
        Ok(())
    }

    async fn update(&self, request: &str) -> Bytes {
        match self.state.increment().await {
            Ok(counter) => {
                tracing::debug!("Session {} state is now {}", self.state.port(), counter);
                self.host.presenter.respond(&Page::Conversation {
                    port: self.state.port(),
                    host: &self.host.config.advertised_host,
                    request,
                    counter,
                })
            }
            Err(e) => self.invalid(request, &e.to_string()),
        }
    }

    /// Transfer the counter to the destination coordinator, then close this
    /// session's listening socket. On failure the session keeps running.
    async fn migrate(&self, request: &str) -> Bytes {
        let port = self.state.port();
        let counter = match self.state.lock_for_handoff().await {
            Ok(counter) => counter,
            Err(e) => return self.invalid(request, &e.to_string()),
        };

        tracing::info!(
            "Migrating session {} with state {} to {}",
            port,
            *counter,
            self.host.migration.target()
        );

        let new_port = match self.host.migration.transfer(*counter).await {
            Ok(new_port) => new_port,
            Err(e) => {
                tracing::warn!("Migration of session {} failed: {}", port, e);
                drop(counter);
                return self.invalid(request, &format!("Migration failed: {}", e));
            }
        };

        tracing::info!("Session {} now hosted on port {}, closing listener", port, new_port);
        self.state.listening().close();
        self.state.listening().released().await;
        drop(counter);

        self.host.presenter.respond(&Page::Migrated {
            port: new_port,
            host: self.host.config.migration_host(),
            request,
        })
    }

    fn invalid(&self, request: &str, reason: &str) -> Bytes {
        self.host.presenter.respond(&Page::Invalid {
            port: self.state.port(),
            host: &self.host.config.advertised_host,
            request,
            reason,
        })
    }
}
