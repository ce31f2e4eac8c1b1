//! Migration handshake against a destination coordinator

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::{FramedRead, FramedWrite};

use rh_core::{HostConfig, HostError};
use rh_protocol::token::PORT_KEY;
use rh_protocol::{host_request, parse_port, LineCodec, ProtocolError};

/// Reply lines carry echoed request text, so they get more room than requests
const REPLY_LINE_LIMIT: usize = 64 * 1024;

/// Asks a coordinator to host a session and returns the port it allocated
#[derive(Debug, Clone)]
pub struct MigrationClient {
    target: String,
    timeout: Duration,
}

impl MigrationClient {
    /// Create a client for the coordinator at `target` (`host:port`)
    pub fn new(target: impl Into<String>, timeout: Duration) -> Self {
        Self {
            target: target.into(),
            timeout,
        }
    }

    /// Client for the destination described by `config`
    pub fn from_config(config: &HostConfig) -> Self {
        Self::new(config.migration_target(), config.migration.timeout)
    }

    /// Destination coordinator address
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Reply timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send `counter` to the destination and wait for its `[Port=]` reply.
    pub async fn transfer(&self, counter: u64) -> Result<u16, HostError> {
        tokio::time::timeout(self.timeout, self.handshake(counter))
            .await
            .map_err(|_| HostError::MigrationTimeout(self.timeout))?
    }

    async fn handshake(&self, counter: u64) -> Result<u16, HostError> {
        let stream = TcpStream::connect(&self.target).await?;
        let (reader, writer) = stream.into_split();

        let mut requests = FramedWrite::new(writer, LineCodec::new());
        requests.send(host_request(counter)).await?;

        let mut replies = FramedRead::new(reader, LineCodec::with_max_length(REPLY_LINE_LIMIT));
        while let Some(line) = replies.next().await {
            let line = line?;
            if let Some(port) = parse_port(&line)? {
                tracing::debug!("Destination {} allocated port {}", self.target, port);
                return Ok(port);
            }
        }

        Err(ProtocolError::MissingToken(PORT_KEY).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    async fn fake_coordinator<F>(reply: F) -> (String, tokio::task::JoinHandle<String>)
    where
        F: FnOnce(&str) -> Option<String> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let task = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let (reader, mut writer) = socket.into_split();
            let mut line = String::new();
            BufReader::new(reader).read_line(&mut line).await.unwrap();

            match reply(&line) {
                Some(text) => {
                    writer.write_all(text.as_bytes()).await.unwrap();
                    writer.shutdown().await.unwrap();
                }
                None => {
                    // Hold the connection open without answering
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
            }
            line
        });

        (address, task)
    }

    #[tokio::test]
    async fn test_transfer_parses_port_from_reply() {
        let (address, server) = fake_coordinator(|_| {
            Some("HTTP/1.1 200 OK\r\n\r\n<html>\nready\n[Port=3009]<br/>\n</html>\n".to_string())
        })
        .await;

        let client = MigrationClient::new(address, Duration::from_secs(2));
        assert_eq!(client.transfer(6).await.unwrap(), 3009);

        let sent = server.await.unwrap();
        assert!(sent.contains("[State=6]"));
    }

    #[tokio::test]
    async fn test_transfer_without_port_token() {
        let (address, _server) =
            fake_coordinator(|_| Some("HTTP/1.1 200 OK\r\n\r\nno port here\n".to_string())).await;

        let client = MigrationClient::new(address, Duration::from_secs(2));
        let err = client.transfer(1).await.unwrap_err();
        assert!(matches!(
            err,
            HostError::Protocol(ProtocolError::MissingToken("Port"))
        ));
    }

    #[tokio::test]
    async fn test_transfer_rejects_malformed_port() {
        let (address, _server) = fake_coordinator(|_| {
            Some("HTTP/1.1 200 OK\r\n\r\n[Port=30x1]<br/>\n[Port=3001]<br/>\n".to_string())
        })
        .await;

        let client = MigrationClient::new(address, Duration::from_secs(2));
        let err = client.transfer(4).await.unwrap_err();
        assert!(matches!(
            err,
            HostError::Protocol(ProtocolError::InvalidNumber { key: "Port", .. })
        ));
    }

    #[tokio::test]
    async fn test_transfer_times_out() {
        let (address, _server) = fake_coordinator(|_| None).await;

        let client = MigrationClient::new(address, Duration::from_millis(100));
        let err = client.transfer(1).await.unwrap_err();
        assert!(matches!(err, HostError::MigrationTimeout(_)));
    }

    #[tokio::test]
    async fn test_transfer_connection_refused() {
        let probe = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = probe.local_addr().unwrap().to_string();
        drop(probe);

        let client = MigrationClient::new(address, Duration::from_secs(2));
        let err = client.transfer(1).await.unwrap_err();
        assert!(matches!(err, HostError::Connection(_)));
    }

    #[test]
    fn test_from_config() {
        let mut config = HostConfig::default();
        config.migration.port = Some(2000);
        let client = MigrationClient::from_config(&config);
        assert_eq!(client.target(), "localhost:2000");
        assert_eq!(client.timeout(), Duration::from_secs(30));
    }
}
