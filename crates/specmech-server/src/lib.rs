//! specMech controller emulator server.
//!
//! This crate provides the production server implementation using:
//! - Tokio for the async runtime and TCP transport
//! - System time for actuator delays and the controller clock
//!
//! ## Architecture
//!
//! ```text
//! specmech-server
//!   ├─ SystemEnv        (production Environment impl)
//!   ├─ TcpTransport     (tokio TCP listener)
//!   ├─ Server           (accept loop, one task per connection)
//!   └─ Session          (read, split, execute engine actions, write)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod session;
mod system_env;
mod transport;

use std::net::SocketAddr;

pub use error::ServerError;
pub use session::Session;
use specmech_core::{DeviceSeeds, Environment, ProtocolConfig, ProtocolEngine};
pub use system_env::SystemEnv;
use tracing::Instrument;
pub use transport::{TcpTransport, Transport};

/// Bytes read from a socket per receive call.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Default listen address.
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8888";

/// Server configuration for the production runtime.
#[derive(Debug, Clone)]
pub struct ServerRuntimeConfig {
    /// Address to bind to (e.g., "127.0.0.1:8888")
    pub bind_address: String,
    /// Bytes per read; also the longest unterminated fragment kept
    pub chunk_size: usize,
    /// Protocol revision and overrides
    pub protocol: ProtocolConfig,
    /// Initial device values
    pub seeds: DeviceSeeds,
}

impl Default for ServerRuntimeConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            protocol: ProtocolConfig::default(),
            seeds: DeviceSeeds::default(),
        }
    }
}

/// Emulator server.
///
/// Wraps one `ProtocolEngine` shared by every connection it accepts.
pub struct Server<T = TcpTransport, E = SystemEnv>
where
    T: Transport,
    E: Environment,
{
    engine: ProtocolEngine<E>,
    transport: T,
    chunk_size: usize,
}

impl Server {
    /// Create and bind a new server.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The protocol configuration is invalid
    /// - Binding to the address fails
    pub async fn bind(config: ServerRuntimeConfig) -> Result<Self, ServerError> {
        let transport = TcpTransport::bind(&config.bind_address).await?;
        Self::with_transport(SystemEnv::new(), transport, config)
    }
}

impl<T, E> Server<T, E>
where
    T: Transport,
    E: Environment,
{
    /// Create a server over an already-bound transport.
    ///
    /// # Errors
    ///
    /// Returns error if the protocol configuration is invalid.
    pub fn with_transport(
        env: E,
        transport: T,
        config: ServerRuntimeConfig,
    ) -> Result<Self, ServerError> {
        config.protocol.validate()?;
        let engine = ProtocolEngine::new(env, config.protocol, &config.seeds);
        Ok(Self { engine, transport, chunk_size: config.chunk_size })
    }

    /// Engine shared by all sessions.
    pub fn engine(&self) -> &ProtocolEngine<E> {
        &self.engine
    }

    /// Get the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.transport.local_addr()
    }

    /// Run the server, accepting connections until the task is dropped.
    ///
    /// A failing connection is logged and closed; it never stops the
    /// listener.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!(
            addr = %self.local_addr()?,
            revision = ?self.engine.config().revision,
            "server listening"
        );

        let mut next_id: u64 = 0;
        loop {
            match self.transport.accept().await {
                Ok((stream, peer)) => {
                    next_id = next_id.wrapping_add(1);
                    let session = Session::new(next_id, self.engine.clone(), self.chunk_size);
                    let span = tracing::info_span!("session", session = next_id, %peer);

                    tokio::spawn(
                        async move {
                            tracing::info!("connection accepted");
                            match session.run(stream).await {
                                Ok(()) => tracing::info!("connection closed"),
                                Err(e) => tracing::error!(error = %e, "connection error"),
                            }
                        }
                        .instrument(span),
                    );
                },
                Err(e) => {
                    tracing::error!(error = %e, "accept error");
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use specmech_core::ConfigError;

    use super::*;

    fn local_config() -> ServerRuntimeConfig {
        ServerRuntimeConfig { bind_address: "127.0.0.1:0".to_string(), ..Default::default() }
    }

    #[tokio::test]
    async fn bind_rejects_invalid_protocol_config() {
        let mut config = local_config();
        config.protocol.schema_digit = 'x';

        let result = Server::bind(config).await;

        assert!(matches!(result, Err(ServerError::Config(ConfigError::SchemaDigit('x')))));
    }

    #[tokio::test]
    async fn bind_accepts_default_config() {
        let server = Server::bind(local_config()).await.expect("bind");

        let addr = server.local_addr().expect("local addr");
        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
    }
}
