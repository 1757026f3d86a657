//! Writing response bytes to a client.
//!
//! A write that fails because the peer went away ends the transfer as
//! [`Transfer::Disconnected`]. Every other failure, including a read error
//! on the source in the middle of the copy loop, comes back as a
//! [`TransferError`].

use std::io::{ErrorKind, Read, Write};

use super::error::TransferError;

pub const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    Complete { bytes: u64 },
    Disconnected { bytes: u64 },
}

impl Transfer {
    pub fn bytes(&self) -> u64 {
        match *self {
            Self::Complete { bytes } | Self::Disconnected { bytes } => bytes,
        }
    }

    pub fn is_disconnected(&self) -> bool {
        matches!(self, Self::Disconnected { .. })
    }

    /// Continue with `next` unless the client is already gone.
    pub fn and_then<F>(self, next: F) -> Result<Transfer, TransferError>
    where
        F: FnOnce() -> Result<Transfer, TransferError>,
    {
        match self {
            Self::Disconnected { .. } => Ok(self),
            Self::Complete { bytes } => Ok(match next()? {
                Self::Complete { bytes: more } => Self::Complete { bytes: bytes + more },
                Self::Disconnected { bytes: more } => Self::Disconnected { bytes: bytes + more },
            }),
        }
    }
}

/// True for the error kinds a socket write reports once the peer has closed.
pub fn is_peer_disconnect(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::BrokenPipe | ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted
    )
}

fn write_failure(err: std::io::Error, sent: u64) -> Result<Transfer, TransferError> {
    if is_peer_disconnect(&err) {
        Ok(Transfer::Disconnected { bytes: sent })
    } else {
        Err(TransferError::Write(err))
    }
}

/// Write a fully buffered chunk (response head, error page, listing).
pub fn send_all<W: Write>(client: &mut W, bytes: &[u8]) -> Result<Transfer, TransferError> {
    if let Err(e) = client.write_all(bytes) {
        return write_failure(e, 0);
    }
    match client.flush() {
        Ok(()) => Ok(Transfer::Complete {
            bytes: bytes.len() as u64,
        }),
        Err(e) => write_failure(e, bytes.len() as u64),
    }
}

/// Stream `source` to `client` in [`CHUNK_SIZE`] pieces.
pub fn copy_to_client<R: Read, W: Write>(
    source: &mut R,
    client: &mut W,
) -> Result<Transfer, TransferError> {
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut sent: u64 = 0;

    loop {
        let n = match source.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(TransferError::Read(e)),
        };

        if let Err(e) = client.write_all(&buffer[..n]) {
            return write_failure(e, sent);
        }
        sent += n as u64;
    }

    match client.flush() {
        Ok(()) => Ok(Transfer::Complete { bytes: sent }),
        Err(e) => write_failure(e, sent),
    }
}
