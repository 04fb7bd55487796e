//! Reply composer.
//!
//! Every reply is plain text built from three pieces: checksummed report
//! sentences, the configured line ending, and the `>` prompt marker.
//!
//! | reply | bytes |
//! |-------|-------|
//! | ack | `[;id]` + ending + `>` |
//! | report | `$BODY*HH` + ending, per sentence, then the ack |
//! | error | `$S?ERR*HH` + ending |
//! | wake prompt | ending + `!` |

use crate::{LineEnding, checksum::frame, report::Report};

/// Prompt marker that closes every acknowledgment.
pub const PROMPT: char = '>';

/// Marker sent while the controller waits for the wake sentence.
pub const WAKE_MARKER: char = '!';

/// Builds outbound sentences for one deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyComposer {
    ending: LineEnding,
    schema: char,
}

impl ReplyComposer {
    /// Create a composer for a line ending and schema digit.
    pub fn new(ending: LineEnding, schema: char) -> Self {
        Self { ending, schema }
    }

    /// Line ending used for every outbound sentence.
    pub fn ending(&self) -> LineEnding {
        self.ending
    }

    /// Immediate acknowledgment, echoing the command id when present.
    pub fn ack(&self, command_id: Option<&str>) -> String {
        let mut out = String::new();
        if let Some(id) = command_id {
            out.push(';');
            out.push_str(id);
        }
        out.push_str(self.ending.as_str());
        out.push(PROMPT);
        out
    }

    /// Fixed error sentence for any framing failure.
    pub fn error(&self) -> String {
        frame(&format!("S{}ERR", self.schema), self.ending)
    }

    /// Reply to anything but the wake sentence after a reboot.
    pub fn wake_prompt(&self) -> String {
        format!("{}{WAKE_MARKER}", self.ending.as_str())
    }

    /// One checksummed report sentence.
    pub fn sentence(&self, report: &Report) -> String {
        frame(&report.body(self.schema), self.ending)
    }

    /// Report sentences followed by the acknowledgment.
    pub fn report(&self, reports: &[Report], command_id: Option<&str>) -> String {
        let mut out: String = reports.iter().map(|r| self.sentence(r)).collect();
        out.push_str(&self.ack(command_id));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::PistonId;

    #[test]
    fn legacy_replies_match_firmware() {
        let composer = ReplyComposer::new(LineEnding::CrLf, '2');

        assert_eq!(composer.ack(None), "\r\n>");
        assert_eq!(composer.error(), "$S2ERR*24\r\n");
        assert_eq!(composer.wake_prompt(), "\r\n!");
    }

    #[test]
    fn ack_echoes_command_id() {
        let composer = ReplyComposer::new(LineEnding::Cr, '2');
        assert_eq!(composer.ack(Some("42")), ";42\r>");
    }

    #[test]
    fn report_sentences_then_ack() {
        let composer = ReplyComposer::new(LineEnding::CrLf, '2');
        let reply = composer.report(
            &[
                Report::Piston { piston: PistonId::A, position: 100 },
                Report::Version("2020-12-16".to_string()),
            ],
            Some("9"),
        );

        assert_eq!(reply, "$S2MRA,100*22\r\n$S2VER,2020-12-16*08\r\n;9\r\n>");
    }

    #[test]
    fn schema_digit_changes_error_checksum() {
        let composer = ReplyComposer::new(LineEnding::Cr, '4');
        assert_eq!(composer.error(), "$S4ERR*22\r");
    }
}
