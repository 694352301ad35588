//! Network link: startup handshake and the fire-and-forget broadcast writer.
//!
//! ## Lifecycle
//!
//! 1. [`connect`] opens a TCP connection and waits for a single greeting
//!    read (up to [`GREETING_LEN`] bytes). Both steps are bounded by the
//!    configured timeout and any failure is returned to the caller, which
//!    is expected to abort startup.
//! 2. [`Link::into_sink`] spawns a writer task and returns a
//!    [`ChannelSink`] for the frame controller. Publishing never blocks a
//!    tick: a full or closed channel drops the message with a warning.

use bytes::Bytes;
use log::{debug, info, warn};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::broadcast::BroadcastSink;
use crate::error::{Error, Result};

/// Maximum size of the greeting read during the handshake.
pub const GREETING_LEN: usize = 1024;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NetConfig {
    pub host: String,
    pub port: u16,
    /// Bound on the connect and on the greeting read, each.
    pub timeout: Duration,
    /// Messages buffered for the writer before publishes start dropping.
    pub queue_capacity: usize,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 12345,
            timeout: Duration::from_secs(5),
            queue_capacity: 64,
        }
    }
}

impl NetConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ---------------------------------------------------------------------------
// Handshake
// ---------------------------------------------------------------------------

/// An established connection whose greeting has been read.
pub struct Link {
    stream: TcpStream,
    pub greeting: Vec<u8>,
    queue_capacity: usize,
}

/// Connect and read the greeting.
pub async fn connect(config: &NetConfig) -> Result<Link> {
    let addr = config.addr();
    info!("Connecting to {}", addr);

    let mut stream = tokio::time::timeout(config.timeout, TcpStream::connect(&addr))
        .await
        .map_err(|_| Error::ConnectTimeout {
            addr: addr.clone(),
            timeout: config.timeout,
        })?
        .map_err(|source| Error::Connect {
            addr: addr.clone(),
            source,
        })?;

    let greeting = read_greeting(&mut stream, config.timeout).await?;
    info!(
        "Connected to {} – greeting: {}",
        addr,
        String::from_utf8_lossy(&greeting)
    );

    Ok(Link {
        stream,
        greeting,
        queue_capacity: config.queue_capacity,
    })
}

/// Single read of up to [`GREETING_LEN`] bytes.
pub async fn read_greeting<R>(reader: &mut R, timeout: Duration) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; GREETING_LEN];
    let n = tokio::time::timeout(timeout, reader.read(&mut buf))
        .await
        .map_err(|_| Error::HandshakeTimeout(timeout))?
        .map_err(Error::Handshake)?;

    if n == 0 {
        return Err(Error::HandshakeClosed);
    }
    buf.truncate(n);
    Ok(buf)
}

impl Link {
    /// Spawn the writer task and hand back the sink that feeds it.
    pub fn into_sink(self) -> (ChannelSink, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(self.queue_capacity.max(1));
        let handle = tokio::spawn(run_writer(self.stream, rx));
        (ChannelSink { tx }, handle)
    }
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Write every queued message until the channel closes.
///
/// Errors are logged and swallowed; a dead peer must not stop the frame
/// loop.
pub async fn run_writer<W>(mut writer: W, mut rx: mpsc::Receiver<Bytes>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(payload) = rx.recv().await {
        if let Err(e) = writer.write_all(&payload).await {
            warn!("Failed to send broadcast ({} bytes): {}", payload.len(), e);
            continue;
        }
        if let Err(e) = writer.flush().await {
            warn!("Failed to flush broadcast: {}", e);
        }
    }
    debug!("Broadcast writer finished");
}

/// [`BroadcastSink`] backed by a bounded channel to the writer task.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<Bytes>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<Bytes>) -> Self {
        Self { tx }
    }
}

impl BroadcastSink for ChannelSink {
    fn publish(&mut self, message: &str) {
        let payload = Bytes::copy_from_slice(message.as_bytes());
        if let Err(e) = self.tx.try_send(payload) {
            warn!("Dropping broadcast: {}", e);
        }
    }
}
