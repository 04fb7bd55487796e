//! Protocol configuration.
//!
//! The firmware went through several revisions that differ only in surface
//! details: line ending bytes, whether command ids are echoed, whether the
//! `w` verb exists, how long actuators take to settle. All of them are one
//! protocol here, parameterised by [`ProtocolConfig`]. [`Revision`] picks a
//! preset; individual fields can still be overridden.

use std::{num::NonZeroU64, time::Duration};

use specmech_proto::{LineEnding, ParserOptions, ReplyComposer};

/// Settle time of a door in both revisions.
pub const DEFAULT_DOOR_SETTLE: Duration = Duration::from_millis(500);

/// Piston slew rate of the extended revision.
pub const DEFAULT_PISTON_STEPS_PER_SECOND: NonZeroU64 = match NonZeroU64::new(100_000) {
    Some(rate) => rate,
    None => NonZeroU64::MIN,
};

/// Firmware version string reported by `rv`.
pub const DEFAULT_FIRMWARE_VERSION: &str = "2020-12-16";

/// Known firmware revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Revision {
    /// Firmware as first delivered: no command ids, no `w`, pistons jump.
    Legacy,
    /// Command ids, `w`, slew-limited pistons, detailed `TIM` report.
    #[default]
    Extended,
}

/// How long a piston takes to reach its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PistonTiming {
    /// Same delay for every move.
    Fixed(Duration),
    /// Delay proportional to distance travelled.
    Proportional {
        /// Encoder steps covered per second.
        steps_per_second: NonZeroU64,
    },
}

impl PistonTiming {
    /// Settle delay for a move of `distance` encoder steps.
    pub fn delay(&self, distance: u64) -> Duration {
        match self {
            Self::Fixed(delay) => *delay,
            Self::Proportional { steps_per_second } => {
                let nanos =
                    u128::from(distance) * 1_000_000_000 / u128::from(steps_per_second.get());
                Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
            },
        }
    }
}

/// Inclusive travel range for pistons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PistonLimits {
    /// Lowest allowed position.
    pub min: i64,
    /// Highest allowed position.
    pub max: i64,
}

impl PistonLimits {
    /// Clamp a target into range.
    pub fn clamp(&self, position: i64) -> i64 {
        position.clamp(self.min, self.max)
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// `min` is above `max`.
    #[error("piston limits inverted: min {min} > max {max}")]
    InvertedLimits {
        /// Configured minimum.
        min: i64,
        /// Configured maximum.
        max: i64,
    },

    /// Schema digit must be a single ASCII digit.
    #[error("schema digit must be 0-9, got {0:?}")]
    SchemaDigit(char),

    /// Proportional timing needs a positive rate.
    #[error("piston slew rate must be positive")]
    ZeroSlewRate,

    /// Version string would break report framing.
    #[error("firmware version {0:?} contains a reserved character")]
    Version(String),
}

/// Everything about the protocol that is fixed per deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolConfig {
    /// Preset these values started from.
    pub revision: Revision,
    /// The `?` in `S?XXX` report bodies.
    pub schema_digit: char,
    /// Line ending of every outbound sentence.
    pub line_ending: LineEnding,
    /// Split and echo `;id` command suffixes.
    pub command_ids: bool,
    /// Accept the `w` verb.
    pub wait_verb: bool,
    /// Append set time, boot time and command id to `TIM` reports.
    pub time_detail: bool,
    /// Door settle delay.
    pub door_settle: Duration,
    /// Piston settle delay rule.
    pub piston_timing: PistonTiming,
    /// Require `$...*HH` envelopes on inbound commands.
    pub verify_inbound_checksum: bool,
    /// Clamp piston targets into this range. `None` accepts any integer.
    pub piston_limits: Option<PistonLimits>,
    /// Reported firmware version.
    pub version: String,
}

impl ProtocolConfig {
    /// Preset for a firmware revision.
    pub fn for_revision(revision: Revision) -> Self {
        match revision {
            Revision::Legacy => Self {
                revision,
                schema_digit: '2',
                line_ending: LineEnding::CrLf,
                command_ids: false,
                wait_verb: false,
                time_detail: false,
                door_settle: DEFAULT_DOOR_SETTLE,
                piston_timing: PistonTiming::Fixed(Duration::ZERO),
                verify_inbound_checksum: false,
                piston_limits: None,
                version: DEFAULT_FIRMWARE_VERSION.to_string(),
            },
            Revision::Extended => Self {
                revision,
                schema_digit: '2',
                line_ending: LineEnding::CrLf,
                command_ids: true,
                wait_verb: true,
                time_detail: true,
                door_settle: DEFAULT_DOOR_SETTLE,
                piston_timing: PistonTiming::Proportional {
                    steps_per_second: DEFAULT_PISTON_STEPS_PER_SECOND,
                },
                verify_inbound_checksum: false,
                piston_limits: None,
                version: DEFAULT_FIRMWARE_VERSION.to_string(),
            },
        }
    }

    /// Check field combinations the type system does not rule out.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.schema_digit.is_ascii_digit() {
            return Err(ConfigError::SchemaDigit(self.schema_digit));
        }

        if let Some(PistonLimits { min, max }) = self.piston_limits {
            if min > max {
                return Err(ConfigError::InvertedLimits { min, max });
            }
        }

        if self.version.contains(['$', '*', ',', '\r', '\n']) {
            return Err(ConfigError::Version(self.version.clone()));
        }

        Ok(())
    }

    /// Grammar switches for the frame parser.
    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            command_ids: self.command_ids,
            wait_verb: self.wait_verb,
            verify_checksum: self.verify_inbound_checksum,
        }
    }

    /// Reply composer for this deployment.
    pub fn composer(&self) -> ReplyComposer {
        ReplyComposer::new(self.line_ending, self.schema_digit)
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self::for_revision(Revision::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extended_is_the_default() {
        let config = ProtocolConfig::default();

        assert_eq!(config.revision, Revision::Extended);
        assert!(config.command_ids);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn legacy_matches_observed_firmware() {
        let config = ProtocolConfig::for_revision(Revision::Legacy);

        assert!(!config.command_ids);
        assert!(!config.wait_verb);
        assert_eq!(config.door_settle, Duration::from_millis(500));
        assert_eq!(config.piston_timing.delay(1_000_000), Duration::ZERO);
        assert_eq!(config.composer().error(), "$S2ERR*24\r\n");
    }

    #[test]
    fn proportional_delay_scales_with_distance() {
        let timing = ProtocolConfig::default().piston_timing;

        assert_eq!(timing.delay(0), Duration::ZERO);
        assert_eq!(timing.delay(50_000), Duration::from_millis(500));
        assert_eq!(timing.delay(234_224), Duration::from_nanos(2_342_240_000));
    }

    #[test]
    fn proportional_delay_saturates() {
        let timing = PistonTiming::Proportional { steps_per_second: NonZeroU64::MIN };
        assert_eq!(timing.delay(u64::MAX), Duration::from_nanos(u64::MAX));
    }

    #[test]
    fn validate_rejects_bad_fields() {
        let mut config = ProtocolConfig::default();
        config.piston_limits = Some(PistonLimits { min: 10, max: -10 });
        assert_eq!(config.validate(), Err(ConfigError::InvertedLimits { min: 10, max: -10 }));

        let mut config = ProtocolConfig::default();
        config.schema_digit = 'x';
        assert_eq!(config.validate(), Err(ConfigError::SchemaDigit('x')));

        let mut config = ProtocolConfig::default();
        config.version = "1*2".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Version(_))));
    }

    #[test]
    fn limits_clamp() {
        let limits = PistonLimits { min: -100, max: 100 };
        assert_eq!(limits.clamp(500), 100);
        assert_eq!(limits.clamp(-500), -100);
        assert_eq!(limits.clamp(5), 5);
    }
}
