//! WebSocket server the companion extension connects to.
//!
//! # Connection Flow
//!
//! 1. Rust binds the WebSocket server (`localhost:0` picks a random port)
//! 2. The scraping panel's extension is told the WebSocket URL
//! 3. Extension connects to the WebSocket server
//! 4. Extension sends READY with its container and window
//! 5. Connection established, ready for commands

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::Connection;
use super::connection::ReadyData;

// ============================================================================
// Constants
// ============================================================================

/// Default time the extension gets to connect.
const DEFAULT_ACCEPT_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// PendingServer
// ============================================================================

/// A WebSocket server that is bound but not yet connected.
///
/// # Example
///
/// ```ignore
/// use zombie_scraper::transport::PendingServer;
///
/// let server = PendingServer::bind_localhost(0).await?;
/// println!("point the extension at {}", server.ws_url());
///
/// let (connection, ready) = server.accept().await?;
/// ```
pub struct PendingServer {
    /// TCP listener for incoming connections.
    listener: TcpListener,
    /// Address the server is bound to.
    addr: SocketAddr,
    /// How long [`accept`](Self::accept) waits for the extension.
    accept_timeout: Duration,
}

impl PendingServer {
    /// Binds a WebSocket server to the specified address and port.
    ///
    /// Use port 0 to let the OS assign a random available port.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if binding fails.
    pub async fn bind(ip: IpAddr, port: u16) -> Result<Self> {
        let listener = TcpListener::bind(SocketAddr::new(ip, port)).await?;
        let addr = listener.local_addr()?;

        debug!(%addr, "WebSocket server bound");

        Ok(Self {
            listener,
            addr,
            accept_timeout: DEFAULT_ACCEPT_TIMEOUT,
        })
    }

    /// Binds to `127.0.0.1:port`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if binding fails.
    pub async fn bind_localhost(port: u16) -> Result<Self> {
        Self::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), port).await
    }

    /// Overrides how long [`accept`](Self::accept) waits for the extension.
    #[must_use]
    pub fn with_accept_timeout(mut self, accept_timeout: Duration) -> Self {
        self.accept_timeout = accept_timeout;
        self
    }

    /// Returns the port the server is bound to.
    #[inline]
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Returns the WebSocket URL for this server.
    #[inline]
    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Returns the local socket address.
    #[inline]
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Accepts the extension's connection and completes the handshake.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] if the extension doesn't connect in time
    /// - [`Error::Connection`] if WebSocket upgrade fails
    /// - [`Error::Protocol`] if READY handshake is malformed
    pub async fn accept(self) -> Result<(Connection, ReadyData)> {
        let (stream, peer) = timeout(self.accept_timeout, self.listener.accept())
            .await
            .map_err(|_| Error::connection_timeout(self.accept_timeout.as_millis() as u64))??;

        debug!(%peer, "TCP connection accepted");

        let ws_stream = tokio_tungstenite::accept_async(stream)
            .await
            .map_err(|e| Error::connection(format!("WebSocket upgrade failed: {e}")))?;

        info!(addr = %self.addr, "WebSocket connection established");

        let connection = Connection::new(ws_stream);
        let ready = connection.wait_ready().await?;

        Ok((connection, ready))
    }
}

// ============================================================================
// Tests
// ============================================================================
