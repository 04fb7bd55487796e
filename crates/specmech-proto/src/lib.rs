//! specMech controller wire protocol.
//!
//! Pure encoding and decoding for the compact text protocol the spectrograph
//! mechanics controller speaks: no I/O, no async, no device state.
//!
//! ## Inbound
//!
//! ```text
//! <verb><object>[<argument>][;<commandId>]<CR | CRLF>
//! ```
//!
//! [`SentenceBuffer`] cuts a byte stream into lines, [`parse_sentence`]
//! validates one line against [`GRAMMAR`] and types its argument.
//!
//! ## Outbound
//!
//! ```text
//! $<BODY>*<HH><ending>      report sentence, HH = XOR of BODY
//! [;id]<ending>>            acknowledgment
//! ```
//!
//! [`ReplyComposer`] builds both from [`Report`] values.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod checksum;
pub mod command;
pub mod errors;
pub mod parser;
pub mod reply;
pub mod report;
pub mod splitter;

pub use checksum::{checksum, frame, open_envelope, verify};
pub use command::{
    Action, Command, DoorId, ExposeMode, GRAMMAR, Inbound, PistonId, PistonSelector, ReportTarget,
    Verb,
};
pub use errors::FrameError;
pub use parser::{ParserOptions, parse_sentence, parse_timestamp};
pub use reply::{PROMPT, ReplyComposer, WAKE_MARKER};
pub use report::{ClimateReading, ClockDetail, DoorState, Report, timestamp};
pub use splitter::SentenceBuffer;

/// `strftime` profile of every timestamp on the wire.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Line ending used by a protocol revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineEnding {
    /// `\r`
    Cr,
    /// `\r\n`
    #[default]
    CrLf,
}

impl LineEnding {
    /// Literal bytes as text.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cr => "\r",
            Self::CrLf => "\r\n",
        }
    }

    /// Literal bytes.
    pub fn as_bytes(self) -> &'static [u8] {
        self.as_str().as_bytes()
    }
}
