use bytes::{Bytes, BytesMut};
use futures::{SinkExt, StreamExt};
use std::{pin::Pin, sync::Arc, time::Duration};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio_serial::{DataBits, Parity, SerialPortBuilderExt, StopBits};
use tokio_util::codec::{Decoder, Framed};
use tracing::trace;

use super::codec::FrameCodec;
use super::{ProtoError, Result};

trait AsyncReadWrite: AsyncRead + AsyncWrite + Send {}

impl<T> AsyncReadWrite for T where T: AsyncRead + AsyncWrite + Send {}

/// A transport shared by every caller talking to the same physical port.
///
/// Holding the mutex guard is what makes an exchange exclusive.
pub type SharedTransport = Arc<Mutex<Transport>>;

/// Byte channel to the gauge with a timeout on every operation.
pub struct Transport {
    stream: Framed<Pin<Box<dyn AsyncReadWrite>>, FrameCodec>,
    timeout: Duration,
}

impl Transport {
    /// Opens a serial port with the 8N1 line settings used by the TPG 26x.
    pub fn open(com: impl AsRef<str>, baudrate: u32, timeout: Duration) -> Result<Self> {
        let mut port = tokio_serial::new(com.as_ref(), baudrate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(timeout)
            .open_native_async()?;

        #[cfg(unix)]
        port.set_exclusive(false)?;

        Ok(Self::new(port, timeout))
    }

    pub fn new<T>(io: T, timeout: Duration) -> Self
    where
        T: AsyncRead + AsyncWrite + Send + 'static,
    {
        let io: Pin<Box<dyn AsyncReadWrite>> = Box::pin(io);
        Self {
            stream: FrameCodec::default().framed(io),
            timeout,
        }
    }

    pub fn shared(self) -> SharedTransport {
        Arc::new(Mutex::new(self))
    }

    pub async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        trace!("Write {:?}", Bytes::copy_from_slice(bytes));
        timeout(
            self.timeout,
            self.stream.send(Bytes::copy_from_slice(bytes)),
        )
        .await
        .map_err(|_| ProtoError::Timeout)??;
        Ok(())
    }

    /// Reads one frame up to the `\r\n` terminator, which is stripped.
    pub async fn read_frame(&mut self) -> Result<BytesMut> {
        match timeout(self.timeout, self.stream.next()).await {
            Ok(Some(Ok(frame))) => {
                trace!("Read frame {:?}", frame);
                Ok(frame)
            }
            Ok(Some(Err(ioerr))) => Err(ioerr.into()),
            Ok(None) => Err(ProtoError::Abort),
            Err(_) => Err(ProtoError::Timeout),
        }
    }

    /// Reads at most `n` raw bytes, bypassing the framing.
    ///
    /// Bytes already buffered by the frame decoder are returned first.
    pub async fn read_bytes(&mut self, n: usize) -> Result<BytesMut> {
        let buffered = self.stream.read_buffer_mut();
        if !buffered.is_empty() {
            let len = n.min(buffered.len());
            let chunk = buffered.split_to(len);
            // The decoder's resume index refers to the bytes just removed.
            self.stream.codec_mut().reset();
            return Ok(chunk);
        }

        let mut buf = vec![0u8; n];
        let read = timeout(self.timeout, self.stream.get_mut().read(&mut buf))
            .await
            .map_err(|_| ProtoError::Timeout)??;
        if read == 0 && n > 0 {
            return Err(ProtoError::Abort);
        }
        trace!("Read {:?}", Bytes::copy_from_slice(&buf[..read]));
        Ok(BytesMut::from(&buf[..read]))
    }

    /// Reads exactly `n` raw bytes; each underlying read has its own timeout.
    pub async fn read_exact(&mut self, n: usize) -> Result<BytesMut> {
        let mut out = BytesMut::with_capacity(n);
        while out.len() < n {
            let chunk = self.read_bytes(n - out.len()).await?;
            out.extend_from_slice(&chunk);
        }
        Ok(out)
    }
}
