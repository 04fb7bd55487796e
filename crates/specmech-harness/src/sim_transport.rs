//! Simulated TCP listener.

use std::net::SocketAddr;

use async_trait::async_trait;
use specmech_server::{ServerError, Transport};
use turmoil::net::{TcpListener, TcpStream};

/// Listener on turmoil's simulated network.
pub struct SimTransport {
    listener: TcpListener,
}

impl SimTransport {
    /// Bind on the current simulated host, e.g. `0.0.0.0:8888`.
    pub async fn bind(addr: &str) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }
}

#[async_trait]
impl Transport for SimTransport {
    type Stream = TcpStream;

    async fn accept(&self) -> Result<(Self::Stream, SocketAddr), ServerError> {
        Ok(self.listener.accept().await?)
    }

    fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }
}
