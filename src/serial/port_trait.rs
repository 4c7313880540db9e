//! Trait abstraction for serial port operations to enable testing

use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Write half of a serial peripheral
#[async_trait]
pub trait SerialWriter: Send {
    /// Write as much of `data` as the peripheral accepts, returning the count
    async fn write(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Flush the output buffer
    async fn flush(&mut self) -> io::Result<()>;
}

/// Read half of a serial peripheral
#[async_trait]
pub trait SerialReader: Send {
    /// Read whatever is available into `buf`, waiting until at least one byte arrives
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Adapter from any tokio writer (e.g. the write half of a `SerialStream`)
pub struct TokioSerialWriter<W> {
    inner: W,
}

impl<W> TokioSerialWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> SerialWriter for TokioSerialWriter<W> {
    async fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.inner.write(data).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.inner.flush().await
    }
}

/// Adapter from any tokio reader (e.g. the read half of a `SerialStream`)
pub struct TokioSerialReader<R> {
    inner: R,
}

impl<R> TokioSerialReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> SerialReader for TokioSerialReader<R> {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inner.read(buf).await {
            // serialport reports an idle line as TimedOut on some platforms
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            other => other,
        }
    }
}
