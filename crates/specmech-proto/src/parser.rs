//! Frame parser and validator.
//!
//! Turns one terminated inbound line into an [`Inbound`] or a
//! [`FrameError`]. Parsing is pure: it never looks at device state, so a
//! rejected sentence can never have a partial side effect.
//!
//! ## Order of checks
//!
//! 1. Line ending (CR or CRLF, anything else is `MissingTerminator`)
//! 2. Session sentences: `!` (wake) and `q` (quit)
//! 3. Optional `$...*HH` envelope when checksum verification is on
//! 4. Verb, then object against [`GRAMMAR`](crate::GRAMMAR)
//! 5. Optional `;id` suffix when command ids are on
//! 6. Verb-specific argument typing

use std::time::Duration;

use chrono::NaiveDateTime;

use crate::{
    LineEnding, TIMESTAMP_FORMAT,
    checksum::open_envelope,
    command::{Action, Command, Inbound, Verb},
    errors::FrameError,
};

/// Length of a `YYYY-MM-DDTHH:MM:SSZ` timestamp.
const TIMESTAMP_LEN: usize = 20;

/// Grammar switches that differ between protocol revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParserOptions {
    /// Split a `;id` suffix off the argument.
    pub command_ids: bool,
    /// Accept the `w` verb.
    pub wait_verb: bool,
    /// Require every command to be wrapped in a `$...*HH` envelope.
    pub verify_checksum: bool,
}

/// Parse one inbound line, line ending included.
pub fn parse_sentence(raw: &[u8], options: &ParserOptions) -> Result<Inbound, FrameError> {
    if raw.is_empty() {
        return Err(FrameError::Empty);
    }

    let (body, terminator) = split_terminator(raw)?;
    let body = std::str::from_utf8(body).map_err(|_| FrameError::NotUtf8)?;

    match body {
        "" => return Err(FrameError::Empty),
        "!" => return Ok(Inbound::Wake),
        "q" => return Ok(Inbound::Quit),
        _ => {},
    }

    let body = if options.verify_checksum {
        let inner = open_envelope(body.as_bytes())?;
        std::str::from_utf8(inner).map_err(|_| FrameError::NotUtf8)?
    } else {
        body
    };

    parse_command(body, terminator, options).map(Inbound::Command)
}

/// Split the trailing CR or CRLF off a line.
fn split_terminator(raw: &[u8]) -> Result<(&[u8], LineEnding), FrameError> {
    if let Some(body) = raw.strip_suffix(b"\r\n") {
        Ok((body, LineEnding::CrLf))
    } else if let Some(body) = raw.strip_suffix(b"\r") {
        Ok((body, LineEnding::Cr))
    } else {
        Err(FrameError::MissingTerminator)
    }
}

fn parse_command(
    body: &str,
    terminator: LineEnding,
    options: &ParserOptions,
) -> Result<Command, FrameError> {
    let mut chars = body.chars();

    let verb_char = chars.next().ok_or(FrameError::Empty)?;
    let verb = Verb::from_char(verb_char)
        .filter(|v| *v != Verb::Wait || options.wait_verb)
        .ok_or(FrameError::UnknownVerb(verb_char))?;

    if verb == Verb::Reboot {
        let (argument, command_id) = split_command_id(chars.as_str(), options)?;
        if !argument.is_empty() {
            return Err(FrameError::UnexpectedArgument {
                verb: verb_char,
                argument: argument.to_string(),
            });
        }
        return Ok(Command {
            verb,
            object: None,
            argument: String::new(),
            command_id,
            terminator,
            action: Action::Reboot,
        });
    }

    let object = chars.next().ok_or(FrameError::MissingObject { verb: verb_char })?;
    if !verb.accepts(object) {
        return Err(FrameError::InvalidObject { verb: verb_char, object });
    }

    let (argument, command_id) = split_command_id(chars.as_str(), options)?;
    let action = type_argument(verb, object, argument)?;

    Ok(Command {
        verb,
        object: Some(object),
        argument: argument.to_string(),
        command_id,
        terminator,
        action,
    })
}

fn split_command_id<'a>(
    rest: &'a str,
    options: &ParserOptions,
) -> Result<(&'a str, Option<String>), FrameError> {
    if !options.command_ids {
        return Ok((rest, None));
    }

    match rest.split_once(';') {
        Some((_, "")) => Err(FrameError::EmptyCommandId),
        Some((argument, id)) => Ok((argument, Some(id.to_string()))),
        None => Ok((rest, None)),
    }
}

fn type_argument(verb: Verb, object: char, argument: &str) -> Result<Action, FrameError> {
    match verb {
        Verb::MoveAbsolute | Verb::MoveRelative if object == 'H' => {
            expect_empty(verb, argument)?;
            Ok(Action::Home)
        },
        Verb::MoveAbsolute | Verb::MoveRelative => {
            let value: i64 = argument
                .parse()
                .map_err(|_| FrameError::NotAnInteger { argument: argument.to_string() })?;
            let pistons = Action::pistons(object)
                .ok_or(FrameError::InvalidObject { verb: verb.as_char(), object })?;

            if verb == Verb::MoveAbsolute {
                Ok(Action::MoveAbsolute { pistons, position: value })
            } else {
                Ok(Action::MoveRelative { pistons, delta: value })
            }
        },
        Verb::SetTime => parse_timestamp(argument).map(Action::SetTime),
        Verb::Wait => argument
            .parse::<u64>()
            .map(|ms| Action::Wait(Duration::from_millis(ms)))
            .map_err(|_| FrameError::NotADuration { argument: argument.to_string() }),
        Verb::Expose | Verb::Open | Verb::Close | Verb::Report | Verb::Reboot => {
            expect_empty(verb, argument)?;
            Action::for_object(verb, object)
                .ok_or(FrameError::InvalidObject { verb: verb.as_char(), object })
        },
    }
}

fn expect_empty(verb: Verb, argument: &str) -> Result<(), FrameError> {
    if argument.is_empty() {
        Ok(())
    } else {
        Err(FrameError::UnexpectedArgument { verb: verb.as_char(), argument: argument.to_string() })
    }
}

/// Parse a `YYYY-MM-DDTHH:MM:SSZ` timestamp as UTC.
pub fn parse_timestamp(argument: &str) -> Result<chrono::DateTime<chrono::Utc>, FrameError> {
    if argument.len() != TIMESTAMP_LEN {
        return Err(FrameError::BadTimestamp { argument: argument.to_string() });
    }

    NaiveDateTime::parse_from_str(argument, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| FrameError::BadTimestamp { argument: argument.to_string() })
}
