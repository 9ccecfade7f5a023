//! TCP push client for telemetry events.
//!
//! The controller hands telemetry events to a bounded channel without ever
//! waiting. This client drains that channel on its own Tokio task and writes
//! each event to the collector as one line of JSON.
//!
//! # Architecture
//!
//! ```text
//! ParkingController (tick loop)
//!     │
//!     └─> ChannelSink ──(mpsc)──> TelemetryClient ───(TCP)───> Collector
//!                                      │
//!                                      └─> LinesCodec (one JSON document per line)
//! ```
//!
//! # Delivery
//!
//! Delivery is best-effort:
//! - The connection is opened lazily on the first event, with a timeout.
//! - An event that cannot be written is dropped, together with the connection.
//! - The next event opens a fresh connection.
//!
//! Nothing is retried or buffered beyond the channel itself.
//!
//! # Example
//!
//! ```no_run
//! use parkgate_network::{TelemetryClient, TelemetryClientConfig};
//! use parkgate_core::TelemetryEvent;
//! use std::time::Duration;
//! use tokio::sync::mpsc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (tx, rx) = mpsc::channel(64);
//! let config = TelemetryClientConfig {
//!     collector_addr: "192.168.0.100:5000".parse()?,
//!     timeout: Duration::from_millis(3000),
//! };
//! let task = TelemetryClient::new(config).spawn(rx);
//!
//! tx.send(TelemetryEvent::RfidAccess {
//!     timestamp: None,
//!     card_uid: "1C:21:09:49".to_string(),
//!     authorized: true,
//!     action: "entry_granted".to_string(),
//! })
//! .await?;
//!
//! drop(tx);
//! let stats = task.await?;
//! println!("sent {} dropped {}", stats.sent, stats.dropped);
//! # Ok(())
//! # }
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use futures::SinkExt;
use parkgate_core::TelemetryEvent;
use parkgate_core::config::TelemetryConfig;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedWrite, LinesCodec, LinesCodecError};
use tracing::{debug, info, trace, warn};

/// Configuration for the telemetry client
///
/// # Example
///
/// ```
/// use parkgate_network::TelemetryClientConfig;
/// use std::time::Duration;
///
/// let config = TelemetryClientConfig {
///     collector_addr: "127.0.0.1:5000".parse().unwrap(),
///     timeout: Duration::from_millis(1000),
/// };
/// ```
#[derive(Debug, Clone)]
pub struct TelemetryClientConfig {
    /// Collector address to push events to
    pub collector_addr: SocketAddr,

    /// Timeout for connect and write operations
    pub timeout: Duration,
}

impl From<&TelemetryConfig> for TelemetryClientConfig {
    fn from(config: &TelemetryConfig) -> Self {
        Self {
            collector_addr: config.addr,
            timeout: config.connect_timeout(),
        }
    }
}

/// Errors that can occur while pushing an event
#[derive(Debug, Error)]
pub enum TelemetryClientError {
    /// Connection attempt timed out
    #[error("Connection timeout after {0}ms")]
    ConnectionTimeout(u64),

    /// Write operation timed out
    #[error("Write timeout after {0}ms")]
    WriteTimeout(u64),

    /// Event could not be serialized
    #[error("Encoding error: {0}")]
    Encode(#[from] parkgate_core::Error),

    /// Line framing failed while writing
    #[error("Codec error: {0}")]
    Codec(#[from] LinesCodecError),

    /// Low-level I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Counters reported when the client stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TelemetryStats {
    pub sent: u64,
    pub dropped: u64,
}

/// Best-effort telemetry pusher
pub struct TelemetryClient {
    collector_addr: SocketAddr,

    /// Line-framed connection (None if not connected)
    framed: Option<FramedWrite<TcpStream, LinesCodec>>,

    timeout: Duration,

    stats: TelemetryStats,
}

impl TelemetryClient {
    /// Create a client; no connection is opened until the first event.
    ///
    /// ```
    /// use parkgate_network::{TelemetryClient, TelemetryClientConfig};
    /// use std::time::Duration;
    ///
    /// let client = TelemetryClient::new(TelemetryClientConfig {
    ///     collector_addr: "127.0.0.1:5000".parse().unwrap(),
    ///     timeout: Duration::from_millis(500),
    /// });
    /// assert!(!client.is_connected());
    /// ```
    pub fn new(config: TelemetryClientConfig) -> Self {
        debug!("Creating telemetry client for collector {}", config.collector_addr);

        Self {
            collector_addr: config.collector_addr,
            framed: None,
            timeout: config.timeout,
            stats: TelemetryStats::default(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.framed.is_some()
    }

    pub fn stats(&self) -> TelemetryStats {
        self.stats
    }

    /// Connect to the collector
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is refused or times out.
    pub async fn connect(&mut self) -> Result<(), TelemetryClientError> {
        info!("Connecting to telemetry collector at {}", self.collector_addr);

        let stream = match tokio::time::timeout(
            self.timeout,
            TcpStream::connect(self.collector_addr),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                return Err(TelemetryClientError::ConnectionTimeout(
                    self.timeout.as_millis() as u64,
                ));
            }
        };

        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY: {}", e);
        }

        self.framed = Some(FramedWrite::new(stream, LinesCodec::new()));
        debug!("Telemetry client connected");
        Ok(())
    }

    /// Push one event, connecting first if needed.
    ///
    /// On failure the connection is dropped so the next call reconnects.
    ///
    /// # Errors
    ///
    /// Returns an error if the event cannot be encoded, the connection cannot
    /// be opened or the write fails or times out.
    pub async fn send(&mut self, event: &TelemetryEvent) -> Result<(), TelemetryClientError> {
        let line = event.to_json_line()?;
        trace!(kind = event.kind(), "Pushing telemetry event");

        if self.framed.is_none() {
            self.connect().await?;
        }
        let Some(framed) = self.framed.as_mut() else {
            return Ok(());
        };

        let result = match tokio::time::timeout(self.timeout, framed.send(line)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(TelemetryClientError::Codec(e)),
            Err(_) => Err(TelemetryClientError::WriteTimeout(
                self.timeout.as_millis() as u64,
            )),
        };
        if result.is_err() {
            self.framed = None;
        }
        result
    }

    /// Drain `events` until every sender is dropped.
    ///
    /// Failed events are logged and counted, never retried.
    pub async fn run(mut self, mut events: mpsc::Receiver<TelemetryEvent>) -> TelemetryStats {
        while let Some(event) = events.recv().await {
            match self.send(&event).await {
                Ok(()) => self.stats.sent += 1,
                Err(e) => {
                    self.stats.dropped += 1;
                    warn!(kind = event.kind(), error = %e, "Telemetry event dropped");
                }
            }
        }

        self.close().await;
        info!(
            sent = self.stats.sent,
            dropped = self.stats.dropped,
            "Telemetry client stopped"
        );
        self.stats
    }

    /// Run the client on a new Tokio task.
    pub fn spawn(self, events: mpsc::Receiver<TelemetryEvent>) -> JoinHandle<TelemetryStats> {
        tokio::spawn(self.run(events))
    }

    /// Flush and shut down the connection, if any.
    pub async fn close(&mut self) {
        let Some(mut framed) = self.framed.take() else {
            return;
        };

        let close_timeout = Duration::from_millis(500);
        let flush = SinkExt::<String>::flush(&mut framed);
        if let Ok(Err(e)) = tokio::time::timeout(close_timeout, flush).await {
            warn!("Error flushing during close: {}", e);
        }
        let mut stream = framed.into_inner();
        if let Ok(Err(e)) = tokio::time::timeout(close_timeout, stream.shutdown()).await {
            warn!("Error during shutdown: {}", e);
        }
        debug!("Telemetry connection closed");
    }
}
