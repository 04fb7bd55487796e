//! specMech emulator binary.
//!
//! # Usage
//!
//! ```bash
//! # Extended firmware on the default port
//! specmech-server
//!
//! # Legacy firmware, slow doors, strict inbound checksums
//! specmech-server --revision legacy --door-settle-ms 5000 --verify-checksums
//! ```

use std::{num::NonZeroU64, time::Duration};

use clap::{Parser, ValueEnum};
use specmech_core::{ConfigError, PistonLimits, PistonTiming, ProtocolConfig, Revision};
use specmech_server::{DEFAULT_BIND_ADDRESS, DEFAULT_CHUNK_SIZE, Server, ServerRuntimeConfig};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Firmware revision to emulate.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum RevisionArg {
    /// No command ids, no wait verb, pistons jump
    Legacy,
    /// Command ids, wait verb, slew-limited pistons
    Extended,
}

impl From<RevisionArg> for Revision {
    fn from(arg: RevisionArg) -> Self {
        match arg {
            RevisionArg::Legacy => Self::Legacy,
            RevisionArg::Extended => Self::Extended,
        }
    }
}

/// specMech controller emulator
#[derive(Parser, Debug)]
#[command(name = "specmech-server")]
#[command(about = "Emulates the specMech spectrograph mechanics controller over TCP")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(short, long, default_value = DEFAULT_BIND_ADDRESS)]
    bind: String,

    /// Firmware revision preset
    #[arg(long, value_enum, default_value_t = RevisionArg::Extended)]
    revision: RevisionArg,

    /// Door settle time in milliseconds
    #[arg(long)]
    door_settle_ms: Option<u64>,

    /// Piston slew rate in encoder steps per second
    #[arg(long, conflicts_with = "piston_fixed_ms")]
    piston_steps_per_second: Option<u64>,

    /// Fixed piston settle time in milliseconds, regardless of distance
    #[arg(long)]
    piston_fixed_ms: Option<u64>,

    /// Require `$...*HH` envelopes on inbound commands
    #[arg(long)]
    verify_checksums: bool,

    /// Lowest piston position; targets below are clamped
    #[arg(long, requires = "piston_max", allow_negative_numbers = true)]
    piston_min: Option<i64>,

    /// Highest piston position; targets above are clamped
    #[arg(long, requires = "piston_min", allow_negative_numbers = true)]
    piston_max: Option<i64>,

    /// Initial position of all three pistons
    #[arg(long, allow_negative_numbers = true)]
    piston_seed: Option<i64>,

    /// Firmware version reported by `rv`
    #[arg(long)]
    firmware_version: Option<String>,

    /// Bytes read per receive call
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn protocol(&self) -> Result<ProtocolConfig, ConfigError> {
        let mut config = ProtocolConfig::for_revision(self.revision.into());

        if let Some(ms) = self.door_settle_ms {
            config.door_settle = Duration::from_millis(ms);
        }
        if let Some(rate) = self.piston_steps_per_second {
            let steps_per_second = NonZeroU64::new(rate).ok_or(ConfigError::ZeroSlewRate)?;
            config.piston_timing = PistonTiming::Proportional { steps_per_second };
        }
        if let Some(ms) = self.piston_fixed_ms {
            config.piston_timing = PistonTiming::Fixed(Duration::from_millis(ms));
        }
        if let (Some(min), Some(max)) = (self.piston_min, self.piston_max) {
            config.piston_limits = Some(PistonLimits { min, max });
        }
        if let Some(version) = &self.firmware_version {
            config.version.clone_from(version);
        }
        config.verify_inbound_checksum = self.verify_checksums;

        config.validate()?;
        Ok(config)
    }

    fn runtime(&self) -> Result<ServerRuntimeConfig, ConfigError> {
        let mut config = ServerRuntimeConfig {
            bind_address: self.bind.clone(),
            chunk_size: self.chunk_size,
            protocol: self.protocol()?,
            ..Default::default()
        };
        if let Some(position) = self.piston_seed {
            config.seeds.pistons = [position; 3];
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let config = args.runtime()?;
    tracing::info!(
        bind = %config.bind_address,
        revision = ?config.protocol.revision,
        "specMech emulator starting"
    );

    let server = Server::bind(config).await?;

    tracing::info!("Server listening on {}", server.local_addr()?);

    server.run().await?;

    Ok(())
}
