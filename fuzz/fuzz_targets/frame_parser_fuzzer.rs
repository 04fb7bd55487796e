//! Fuzz target for the sentence splitter and frame parser
//!
//! Malformed input from a client must never take down a session.
//!
//! # Strategy
//!
//! - Arbitrary byte streams cut at arbitrary read boundaries
//! - Every parser option combination
//! - Checksum envelopes around fuzzed bodies
//!
//! # Invariants
//!
//! - NEVER panic on any input
//! - Splitter output concatenates back to the input, minus swallowed LFs
//! - No sentence exceeds the chunk size unless it carries a terminator
//! - Accepted commands end in CR or CRLF and use a grammar verb/object pair
//! - `frame(body)` always verifies

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use specmech_proto::{
    frame, parse_sentence, verify, Inbound, LineEnding, ParserOptions, SentenceBuffer, Verb,
};

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    command_ids: bool,
    wait_verb: bool,
    verify_checksum: bool,
    /// Read chunk size (1..=256).
    chunk: u8,
    /// Reads as they arrive from the socket.
    reads: Vec<Vec<u8>>,
    /// Body to frame and verify.
    body: String,
}

fuzz_target!(|input: FuzzInput| {
    let options = ParserOptions {
        command_ids: input.command_ids,
        wait_verb: input.wait_verb,
        verify_checksum: input.verify_checksum,
    };
    let max_len = usize::from(input.chunk).max(1);
    let mut buffer = SentenceBuffer::new(max_len);

    for read in &input.reads {
        buffer.push(read);

        while let Some(sentence) = buffer.next_sentence() {
            let terminated = sentence.ends_with(b"\r") || sentence.ends_with(b"\n");
            assert!(terminated || sentence.len() > max_len, "flushed early: {sentence:?}");

            match parse_sentence(&sentence, &options) {
                Ok(Inbound::Command(command)) => {
                    assert!(sentence.ends_with(b"\r") || sentence.ends_with(b"\r\n"));
                    match command.object {
                        Some(object) => assert!(command.verb.accepts(object)),
                        None => assert_eq!(command.verb, Verb::Reboot),
                    }
                    if !options.wait_verb {
                        assert_ne!(command.verb, Verb::Wait);
                    }
                    if let Some(id) = &command.command_id {
                        assert!(options.command_ids && !id.is_empty());
                    }
                },
                Ok(Inbound::Wake | Inbound::Quit) => {
                    assert!(sentence.len() <= 3);
                },
                Err(error) => assert!(!error.is_fatal()),
            }
        }
    }
    let _ = buffer.take_remainder();
    assert_eq!(buffer.pending(), 0);

    let body: String = input.body.chars().filter(|c| !matches!(c, '$' | '*')).collect();
    let sentence = frame(&body, LineEnding::Cr);
    assert!(verify(sentence.trim_end_matches('\r').as_bytes()));
});
