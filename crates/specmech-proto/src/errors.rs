//! Framing and validation errors.

use thiserror::Error;

/// A malformed inbound sentence.
///
/// Every variant is answered with the fixed error sentence. None of them end
/// the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Nothing but a line ending (or nothing at all).
    #[error("empty sentence")]
    Empty,

    /// Sentence bytes are not UTF-8.
    #[error("sentence is not valid UTF-8")]
    NotUtf8,

    /// Sentence does not end with CR or CRLF.
    #[error("sentence has no CR or CRLF terminator")]
    MissingTerminator,

    /// First character is not a known verb.
    #[error("unknown verb {0:?}")]
    UnknownVerb(char),

    /// Verb present but no object follows it.
    #[error("verb {verb:?} requires an object")]
    MissingObject {
        /// The verb that was given.
        verb: char,
    },

    /// Object is not in the verb's allowed list.
    #[error("object {object:?} is not valid for verb {verb:?}")]
    InvalidObject {
        /// The verb that was given.
        verb: char,
        /// The rejected object.
        object: char,
    },

    /// Move argument does not parse as a signed integer.
    #[error("argument {argument:?} is not an integer")]
    NotAnInteger {
        /// The offending argument.
        argument: String,
    },

    /// Set-time argument is not `YYYY-MM-DDTHH:MM:SSZ`.
    #[error("argument {argument:?} is not a YYYY-MM-DDTHH:MM:SSZ timestamp")]
    BadTimestamp {
        /// The offending argument.
        argument: String,
    },

    /// Wait argument is not a non-negative integer.
    #[error("argument {argument:?} is not a non-negative duration")]
    NotADuration {
        /// The offending argument.
        argument: String,
    },

    /// Verb takes no argument but one was given.
    #[error("verb {verb:?} takes no argument, got {argument:?}")]
    UnexpectedArgument {
        /// The verb that was given.
        verb: char,
        /// The unexpected remainder.
        argument: String,
    },

    /// `;` separator present but the id after it is empty.
    #[error("empty command id")]
    EmptyCommandId,

    /// Checksum verification is on and the sentence has no `$...*HH` wrapper.
    #[error("sentence is not wrapped in a $...*HH envelope")]
    MissingEnvelope,

    /// Checksum verification is on and the digits do not match.
    #[error("checksum mismatch: expected {expected:02X}, got {actual}")]
    BadChecksum {
        /// Checksum computed over the body.
        expected: u8,
        /// Digits carried by the sentence.
        actual: String,
    },
}

impl FrameError {
    /// Framing errors never terminate a session.
    pub fn is_fatal(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framing_errors_are_not_fatal() {
        assert!(!FrameError::MissingTerminator.is_fatal());
        assert!(!FrameError::UnknownVerb('Z').is_fatal());
    }

    #[test]
    fn error_display() {
        let err = FrameError::InvalidObject { verb: 'o', object: 'x' };
        assert_eq!(err.to_string(), "object 'x' is not valid for verb 'o'");

        let err = FrameError::BadChecksum { expected: 0x1D, actual: "00".to_string() };
        assert_eq!(err.to_string(), "checksum mismatch: expected 1D, got 00");
    }
}
