use std::io::{self, Write};
use std::net::{Ipv4Addr, SocketAddr};

use bytes::BytesMut;
use log::{debug, info, warn};
use tokio::io::AsyncReadExt;
use tokio::net::{TcpSocket, TcpStream};

use crate::error::StreamError;

/// Upper bound on a single read, and so on a single displayed chunk.
pub const CHUNK_SIZE: usize = 1024;

/// Where received chunks go. Each call is one read's worth of bytes.
pub trait ChunkSink {
    fn show(&mut self, chunk: &[u8]);
}

/// Writes each chunk, byte for byte, as one `Received GPS data: ` line and
/// flushes it straight away.
pub struct Console<W = io::Stdout> {
    out: W,
}

impl Console {
    pub fn stdout() -> Self {
        Console::new(io::stdout())
    }
}

impl<W: Write> Console<W> {
    pub fn new(out: W) -> Self {
        Console { out }
    }

    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.out.write_all(b"Received GPS data: ")?;
        self.out.write_all(chunk)?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }
}

impl<W: Write> ChunkSink for Console<W> {
    fn show(&mut self, chunk: &[u8]) {
        if let Err(e) = self.write_chunk(chunk) {
            warn!("Failed to write GPS data: {}", e);
        }
    }
}

#[derive(Debug)]
pub enum EndReason {
    Closed,
    Failed(io::Error),
}

/// How the read loop finished. Both reasons end the stream the same way;
/// the tag only feeds the log.
#[derive(Debug)]
pub struct StreamEnd {
    pub reason: EndReason,
    pub chunks: u64,
    pub bytes: u64,
}

pub fn local_addr(port: u16) -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, port))
}

/// A connected client and its receive buffer.
pub struct StreamSession {
    stream: TcpStream,
    buf: BytesMut,
}

impl StreamSession {
    /// One connect attempt, no retry.
    pub async fn connect(addr: SocketAddr) -> Result<Self, StreamError> {
        let socket = match addr {
            SocketAddr::V4(_) => TcpSocket::new_v4(),
            SocketAddr::V6(_) => TcpSocket::new_v6(),
        }
        .map_err(StreamError::Socket)?;

        let stream = socket
            .connect(addr)
            .await
            .map_err(|source| StreamError::Connect { addr, source })?;

        Ok(StreamSession {
            stream,
            buf: BytesMut::with_capacity(CHUNK_SIZE),
        })
    }

    /// Reads until the peer closes or a read fails, handing every non-empty
    /// read to `sink` untouched. Consumes the session so the socket is closed
    /// when this returns.
    pub async fn pump<S: ChunkSink>(mut self, sink: &mut S) -> StreamEnd {
        let mut chunks = 0u64;
        let mut bytes = 0u64;

        let reason = loop {
            self.buf.clear();
            let read = (&mut self.stream)
                .take(CHUNK_SIZE as u64)
                .read_buf(&mut self.buf)
                .await;

            match read {
                Ok(0) => break EndReason::Closed,
                Ok(n) => {
                    chunks += 1;
                    bytes += n as u64;
                    debug!("Read {} bytes", n);
                    sink.show(&self.buf[..n]);
                }
                Err(e) => break EndReason::Failed(e),
            }
        };

        StreamEnd {
            reason,
            chunks,
            bytes,
        }
    }
}

/// Connects to the forwarded port and streams it into `sink` until it ends.
pub async fn stream_gps<S: ChunkSink>(addr: SocketAddr, sink: &mut S) -> Result<StreamEnd, StreamError> {
    let session = StreamSession::connect(addr).await?;
    info!("Connected to GPS service at {}", addr);

    let end = session.pump(sink).await;
    match &end.reason {
        EndReason::Closed => info!(
            "GPS service closed the connection after {} chunks ({} bytes)",
            end.chunks, end.bytes
        ),
        EndReason::Failed(e) => warn!(
            "GPS stream ended by read error after {} chunks ({} bytes): {}",
            end.chunks, end.bytes, e
        ),
    }
    Ok(end)
}
