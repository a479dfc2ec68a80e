//! Byte-source abstraction over the serial port, so the receiver can be tested without hardware

use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::Result;

/// Source of raw bytes with a bounded wait
#[async_trait]
pub trait ByteSource: Send {
    /// Wait up to `timeout` for the next byte
    ///
    /// Returns `Ok(None)` when the timeout elapses with no data.
    async fn try_read_byte(&mut self, timeout: Duration) -> Result<Option<u8>>;
}

/// Adapts any tokio reader (a `SerialStream`, a `BufReader` around one, a test mock)
/// into a [`ByteSource`]
pub struct SerialByteSource<R> {
    reader: R,
}

impl<R> SerialByteSource<R>
where
    R: AsyncRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

#[async_trait]
impl<R> ByteSource for SerialByteSource<R>
where
    R: AsyncRead + Unpin + Send,
{
    async fn try_read_byte(&mut self, timeout: Duration) -> Result<Option<u8>> {
        match tokio::time::timeout(timeout, self.reader.read_u8()).await {
            Ok(Ok(byte)) => Ok(Some(byte)),
            Ok(Err(e)) => Err(e.into()),
            Err(_elapsed) => Ok(None),
        }
    }
}
