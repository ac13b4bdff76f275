//! Frame codec over a byte stream
//!
//! Sending writes the 4-byte big-endian header length, the JSON header, then
//! the blob verbatim. `blob_size` in the header always reflects the bytes
//! actually appended; the codec sets it, callers never do.
//!
//! Receiving is bounded: the caller-supplied wait covers only the arrival of
//! the length prefix. Once a peer has committed a frame the remainder follows
//! immediately and is read to completion, and a partially received prefix
//! survives a cancelled poll, so short poll intervals can never split a frame.
//! A declared blob is read exactly and persisted to the endpoint's blob path
//! before the header is returned.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::message::Envelope;

/// Cap on the declared header length
pub const MAX_HEADER_BYTES: u32 = 16 * 1024;

/// Cap on the declared blob length
pub const MAX_BLOB_BYTES: u32 = 64 * 1024 * 1024;

/// Why a receive produced no frame
///
/// Callers match on this: a timeout is a defined state transition, everything
/// else means the link is gone and the connection gets dropped and rebuilt.
#[derive(Debug, Error)]
pub enum RecvError {
    #[error("no frame within {0:?}")]
    Timeout(Duration),

    #[error("connection closed by peer")]
    Closed,

    #[error("malformed frame header: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("declared header length {0} exceeds {MAX_HEADER_BYTES}")]
    OversizeHeader(u32),

    #[error("declared blob length {0} exceeds {MAX_BLOB_BYTES}")]
    OversizeBlob(u32),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl RecvError {
    /// Everything except a timeout leaves the stream unusable
    pub fn is_disconnect(&self) -> bool {
        !matches!(self, RecvError::Timeout(_))
    }
}

/// Framed view of a byte stream
///
/// Inbound blobs are persisted to `blob_path`, overwriting the previous one;
/// each endpoint of the link keeps exactly one current blob.
pub struct Frames<S> {
    stream: S,
    blob_path: PathBuf,
    prefix: [u8; 4],
    prefix_filled: usize,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Frames<S> {
    pub fn new(stream: S, blob_path: impl Into<PathBuf>) -> Self {
        Self {
            stream,
            blob_path: blob_path.into(),
            prefix: [0; 4],
            prefix_filled: 0,
        }
    }

    /// Where inbound blobs land
    pub fn blob_path(&self) -> &Path {
        &self.blob_path
    }

    /// Send a frame with no blob
    pub async fn send(&mut self, mut envelope: Envelope) -> io::Result<()> {
        envelope.blob_size = 0;
        self.write_frame(&envelope, &[]).await
    }

    /// Send a frame with the given blob appended
    pub async fn send_with_blob(&mut self, mut envelope: Envelope, blob: &[u8]) -> io::Result<()> {
        envelope.blob_size = blob.len() as u32;
        self.write_frame(&envelope, blob).await
    }

    async fn write_frame(&mut self, envelope: &Envelope, blob: &[u8]) -> io::Result<()> {
        let header = serde_json::to_vec(envelope).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.stream.write_all(&(header.len() as u32).to_be_bytes()).await?;
        self.stream.write_all(&header).await?;
        if !blob.is_empty() {
            self.stream.write_all(blob).await?;
        }
        self.stream.flush().await?;
        debug!(kind = ?envelope.kind, blob_bytes = blob.len(), "write_frame: sent");
        Ok(())
    }

    /// Receive one frame, waiting at most `wait` for it to begin
    ///
    /// A declared blob is written to [`Self::blob_path`] before the header is
    /// returned.
    pub async fn recv(&mut self, wait: Duration) -> Result<Envelope, RecvError> {
        let header_len = match tokio::time::timeout(wait, self.fill_prefix()).await {
            Ok(result) => result?,
            Err(_) => return Err(RecvError::Timeout(wait)),
        };
        self.prefix_filled = 0;

        if header_len > MAX_HEADER_BYTES {
            return Err(RecvError::OversizeHeader(header_len));
        }

        let mut header = vec![0u8; header_len as usize];
        self.read_exact_or_closed(&mut header).await?;
        let envelope: Envelope = serde_json::from_slice(&header)?;
        debug!(kind = ?envelope.kind, blob_bytes = envelope.blob_size, "recv: header decoded");

        if envelope.blob_size > 0 {
            if envelope.blob_size > MAX_BLOB_BYTES {
                return Err(RecvError::OversizeBlob(envelope.blob_size));
            }
            let mut blob = vec![0u8; envelope.blob_size as usize];
            self.read_exact_or_closed(&mut blob).await?;
            tokio::fs::write(&self.blob_path, &blob).await?;
            debug!(path = %self.blob_path.display(), bytes = blob.len(), "recv: blob persisted");
        }

        Ok(envelope)
    }

    /// Read the length prefix, resuming any partial read from a cancelled poll
    async fn fill_prefix(&mut self) -> Result<u32, RecvError> {
        while self.prefix_filled < 4 {
            let n = self.stream.read(&mut self.prefix[self.prefix_filled..]).await?;
            if n == 0 {
                return Err(RecvError::Closed);
            }
            self.prefix_filled += n;
        }
        Ok(u32::from_be_bytes(self.prefix))
    }

    async fn read_exact_or_closed(&mut self, buf: &mut [u8]) -> Result<(), RecvError> {
        match self.stream.read_exact(buf).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(RecvError::Closed),
            Err(e) => Err(RecvError::Io(e)),
        }
    }
}
