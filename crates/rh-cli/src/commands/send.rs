//! Send a single request line, playing the browser's part

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::output::print_info;
use rh_protocol::{parse_port, parse_state};

/// Accept a bare port as shorthand for a loopback address
pub fn normalize_address(address: &str) -> String {
    if address.parse::<u16>().is_ok() {
        format!("127.0.0.1:{}", address)
    } else {
        address.to_string()
    }
}

/// Write `line` to `address` and read the full response
pub async fn exchange(address: &str, line: &str) -> Result<String> {
    let mut stream = TcpStream::connect(address)
        .await
        .with_context(|| format!("Failed to connect to {}", address))?;

    stream.write_all(line.as_bytes()).await?;
    stream.write_all(b"\r\n").await?;

    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .context("Failed to read response")?;
    Ok(response)
}

/// Send one request line and report any session tokens in the reply
pub async fn send_command(address: &str, text: &[String], wait: Duration) -> Result<()> {
    let address = normalize_address(address);
    let line = text.join(" ");
    tracing::debug!("Sending {:?} to {}", line, address);

    let response = tokio::time::timeout(wait, exchange(&address, &line))
        .await
        .with_context(|| format!("No response from {} within {:?}", address, wait))??;

    println!("{}", response);

    if let Some(port) = response.lines().find_map(|l| parse_port(l).ok().flatten()) {
        print_info(&format!("Session port: {}", port));
    }
    if let Some(state) = response.lines().find_map(|l| parse_state(l).ok().flatten()) {
        print_info(&format!("Session state: {}", state));
    }

    Ok(())
}
