//! Cancellation-aware buffered byte stream over a transport.
//!
//! [`ByteStream`] is the single place line-buffering and literal-reading
//! happen; the tokenizer above it never touches the network directly. Reads
//! are suspension points: every blocking read races the caller-supplied
//! [`CancellationToken`] so commands and IDLE waits can be abandoned without
//! leaving the transport in an inconsistent state.

use async_compression::tokio::bufread::DeflateDecoder;
use async_compression::tokio::write::DeflateEncoder;
use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

const READ_CHUNK: usize = 8 * 1024;

/// The concrete transport beneath a [`ByteStream`]: a plain TCP socket, one
/// upgraded in place to TLS via STARTTLS, or one wrapped in DEFLATE framing
/// via COMPRESS.
pub enum Transport {
    /// Unencrypted TCP.
    Plain(TcpStream),
    /// TLS over TCP, established either at connect time (implicit TLS) or
    /// via an in-place STARTTLS upgrade.
    Tls(Box<TlsStream<TcpStream>>),
    /// DEFLATE-compressed framing over the previously active transport,
    /// installed via an in-place COMPRESS upgrade.
    Deflate(Box<DeflateTransport>),
}

/// The read/write halves of a transport wrapped in independent DEFLATE
/// compressor/decompressor streams.
///
/// DEFLATE is not symmetric in `async-compression`'s API: the encoder wraps
/// a writer and the decoder wraps a (buffered) reader, so the underlying
/// duplex stream must be split into owned halves before either side can be
/// wrapped.
pub struct DeflateTransport {
    reader: DeflateDecoder<BufReader<ReadHalf<Transport>>>,
    writer: DeflateEncoder<WriteHalf<Transport>>,
}

impl AsyncRead for Transport {
    fn poll_read(
        self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &mut tokio::io::ReadBuf<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        match self.get_mut() {
            Self::Plain(s) => std::pin::Pin::new(s).poll_read(cx, buf),
            Self::Tls(s) => std::pin::Pin::new(s.as_mut()).poll_read(cx, buf),
            Self::Deflate(d) => std::pin::Pin::new(&mut d.reader).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Transport {
    fn poll_write(
        self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &[u8],
    ) -> std::task::Poll<std::io::Result<usize>> {
        match self.get_mut() {
            Self::Plain(s) => std::pin::Pin::new(s).poll_write(cx, buf),
            Self::Tls(s) => std::pin::Pin::new(s.as_mut()).poll_write(cx, buf),
            Self::Deflate(d) => std::pin::Pin::new(&mut d.writer).poll_write(cx, buf),
        }
    }

    fn poll_flush(
        self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        match self.get_mut() {
            Self::Plain(s) => std::pin::Pin::new(s).poll_flush(cx),
            Self::Tls(s) => std::pin::Pin::new(s.as_mut()).poll_flush(cx),
            Self::Deflate(d) => std::pin::Pin::new(&mut d.writer).poll_flush(cx),
        }
    }

    fn poll_shutdown(
        self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        match self.get_mut() {
            Self::Plain(s) => std::pin::Pin::new(s).poll_shutdown(cx),
            Self::Tls(s) => std::pin::Pin::new(s.as_mut()).poll_shutdown(cx),
            Self::Deflate(d) => std::pin::Pin::new(&mut d.writer).poll_shutdown(cx),
        }
    }
}

/// A buffered, cancellation-aware reader/writer over any async transport.
pub struct ByteStream<S> {
    inner: S,
    read_buf: BytesMut,
}

impl<S> ByteStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a transport with an empty read buffer.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            read_buf: BytesMut::with_capacity(READ_CHUNK),
        }
    }

    async fn fill_buf(&mut self, cancel: &CancellationToken) -> Result<usize> {
        let mut chunk = [0_u8; READ_CHUNK];
        let n = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            result = self.inner.read(&mut chunk) => result?,
        };
        if n == 0 {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed by peer",
            )));
        }
        self.read_buf.extend_from_slice(&chunk[..n]);
        Ok(n)
    }

    /// Reads bytes up to and including the next CRLF, returning the line
    /// with the terminator stripped.
    pub async fn read_line(&mut self, cancel: &CancellationToken) -> Result<Vec<u8>> {
        loop {
            if let Some(pos) = find_crlf(&self.read_buf) {
                let line = self.read_buf.split_to(pos).to_vec();
                self.read_buf.advance(2); // CRLF
                return Ok(line);
            }
            self.fill_buf(cancel).await?;
        }
    }

    /// Reads exactly `length` bytes, the declared body of a literal.
    pub async fn read_literal(&mut self, length: u64, cancel: &CancellationToken) -> Result<Vec<u8>> {
        let length = usize::try_from(length)
            .map_err(|_| Error::ProtocolError("literal length overflows usize".into()))?;
        while self.read_buf.len() < length {
            self.fill_buf(cancel).await?;
        }
        Ok(self.read_buf.split_to(length).to_vec())
    }

    /// Looks at the next unconsumed byte without removing it, filling the
    /// buffer if necessary. Returns `None` only on EOF.
    pub async fn peek_byte(&mut self, cancel: &CancellationToken) -> Result<u8> {
        if self.read_buf.is_empty() {
            self.fill_buf(cancel).await?;
        }
        Ok(self.read_buf[0])
    }

    /// Writes raw bytes to the transport without flushing.
    pub async fn write(&mut self, data: &[u8]) -> Result<()> {
        self.inner.write_all(data).await?;
        Ok(())
    }

    /// Flushes any buffered writes to the transport.
    pub async fn flush(&mut self) -> Result<()> {
        self.inner.flush().await?;
        Ok(())
    }

    /// Returns `true` if bytes from a prior read are still buffered and
    /// have not yet been handed to a caller.
    #[must_use]
    pub fn has_buffered_input(&self) -> bool {
        !self.read_buf.is_empty()
    }
}

impl ByteStream<Transport> {
    /// Consumes this stream and re-wraps its underlying `TcpStream` with
    /// TLS, as part of a STARTTLS upgrade.
    ///
    /// Refuses the upgrade if bytes are still buffered from before the
    /// upgrade: a server that pipelines plaintext data past its STARTTLS
    /// `OK` is attempting a command-injection attack and must be treated
    /// as a protocol violation rather than silently accepted into the
    /// encrypted session.
    pub async fn upgrade_to_tls(self, host: &str, connector: &TlsConnector) -> Result<Self> {
        if self.has_buffered_input() {
            return Err(Error::ProtocolError(
                "plaintext data pipelined past STARTTLS response".into(),
            ));
        }
        let Transport::Plain(tcp) = self.inner else {
            return Err(Error::InvalidState("stream is already upgraded to TLS".into()));
        };
        let server_name = rustls::pki_types::ServerName::try_from(host.to_string())
            .map_err(|_| Error::InvalidDnsName(host.to_string()))?;
        let tls = connector.connect(server_name, tcp).await?;
        Ok(Self {
            inner: Transport::Tls(Box::new(tls)),
            read_buf: BytesMut::with_capacity(READ_CHUNK),
        })
    }

    /// Consumes this stream and wraps its transport in DEFLATE framing, as
    /// part of a COMPRESS upgrade.
    ///
    /// Same precondition as [`Self::upgrade_to_tls`]: no bytes may still be
    /// buffered from before the upgrade, since those bytes were read as
    /// plain (or TLS-plaintext) data and cannot retroactively be treated as
    /// compressed.
    pub async fn upgrade_to_deflate(self) -> Result<Self> {
        if self.has_buffered_input() {
            return Err(Error::ProtocolError(
                "plaintext data pipelined past COMPRESS response".into(),
            ));
        }
        let (read_half, write_half) = tokio::io::split(self.inner);
        let reader = DeflateDecoder::new(BufReader::new(read_half));
        let writer = DeflateEncoder::new(write_half);
        Ok(Self {
            inner: Transport::Deflate(Box::new(DeflateTransport { reader, writer })),
            read_buf: BytesMut::with_capacity(READ_CHUNK),
        })
    }
}

fn find_crlf(buf: &BytesMut) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}
