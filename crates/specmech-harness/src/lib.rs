//! Deterministic simulation harness for the specMech emulator.
//!
//! This crate provides Turmoil-based implementations of the `Environment`
//! and `Transport` traits, so the production server loop runs unchanged on
//! a simulated network with a virtual clock.
//!
//! # Why Deterministic Simulation?
//!
//! Door and piston transitions take real time, and the interesting bugs sit
//! in how commands on different connections interleave with them:
//!
//! - **Reproducibility**: the same seed gives the same interleaving
//! - **Speed**: a five second settle costs nothing in virtual time
//! - **Faults**: latency and host restarts are one builder call away
//!
//! # Example
//!
//! ```rust,ignore
//! use specmech_harness::{ControllerClient, serve, sim_config};
//!
//! let mut sim = turmoil::Builder::new().build();
//! sim.host("specmech", || async { serve(sim_config()).await.map_err(Into::into) });
//! sim.client("client", async {
//!     let mut client = ControllerClient::connect("specmech").await?;
//!     client.send("!\r").await?;
//!     client.expect("\r\n>").await?;
//!     Ok(())
//! });
//! sim.run().unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod sim_env;
mod sim_transport;
pub mod workload;

pub use client::ControllerClient;
pub use sim_env::SimEnv;
pub use sim_transport::SimTransport;
use specmech_server::{Server, ServerError, ServerRuntimeConfig};

/// Port the simulated controller listens on.
pub const SIM_PORT: u16 = 8888;

/// Runtime config listening on every simulated interface.
pub fn sim_config() -> ServerRuntimeConfig {
    ServerRuntimeConfig { bind_address: format!("0.0.0.0:{SIM_PORT}"), ..Default::default() }
}

/// Run the production server loop on a simulated host.
///
/// # Errors
///
/// Returns error if the configuration is invalid or the bind fails.
pub async fn serve(config: ServerRuntimeConfig) -> Result<(), ServerError> {
    let transport = SimTransport::bind(&config.bind_address).await?;
    let server = Server::with_transport(SimEnv::new(), transport, config)?;
    server.run().await
}
