//! Listener abstraction.
//!
//! The server loop only needs "give me the next byte stream". Production
//! binds a tokio TCP listener; the simulation harness binds a turmoil one.

use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::{TcpListener, TcpStream},
};

use crate::ServerError;

/// Source of inbound connections.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Bidirectional byte stream of one connection.
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Wait for the next connection.
    async fn accept(&self) -> Result<(Self::Stream, SocketAddr), ServerError>;

    /// Address the listener is bound to.
    fn local_addr(&self) -> Result<SocketAddr, ServerError>;
}

/// TCP listener on the host network.
#[derive(Debug)]
pub struct TcpTransport {
    listener: TcpListener,
}

impl TcpTransport {
    /// Bind to `addr`, e.g. `127.0.0.1:8888`.
    pub async fn bind(addr: &str) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }
}

#[async_trait]
impl Transport for TcpTransport {
    type Stream = TcpStream;

    async fn accept(&self) -> Result<(Self::Stream, SocketAddr), ServerError> {
        let (stream, peer) = self.listener.accept().await?;
        stream.set_nodelay(true)?;
        Ok((stream, peer))
    }

    fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }
}
