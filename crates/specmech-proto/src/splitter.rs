//! Splits a byte stream into terminated sentences.
//!
//! Reads from a stream socket do not line up with sentences: one read can
//! carry several commands, or half of one. `SentenceBuffer` keeps the
//! partial tail between reads and hands out complete lines, line ending
//! included, for [`parse_sentence`](crate::parse_sentence).
//!
//! # Invariants
//!
//! - A CRLF pair is one terminator, even when the CR and LF arrive in
//!   different reads.
//! - A bare LF ends a line; the parser then rejects it as unterminated.
//! - A fragment longer than `max_len` without any terminator is flushed as
//!   is, so a client that never sends CR still gets an error reply.

use bytes::{Buf, Bytes, BytesMut};

/// Partial-read buffer for one session.
#[derive(Debug)]
pub struct SentenceBuffer {
    buf: BytesMut,
    max_len: usize,
    /// Last line ended with a CR at the very end of a read.
    swallow_lf: bool,
}

impl SentenceBuffer {
    /// Create a buffer that flushes unterminated fragments past `max_len`.
    pub fn new(max_len: usize) -> Self {
        Self { buf: BytesMut::with_capacity(max_len.max(1) * 2), max_len, swallow_lf: false }
    }

    /// Append bytes from a read.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Bytes waiting for a terminator.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Take the next complete line, if any.
    pub fn next_sentence(&mut self) -> Option<Bytes> {
        if self.swallow_lf && !self.buf.is_empty() {
            if self.buf[0] == b'\n' {
                self.buf.advance(1);
            }
            self.swallow_lf = false;
        }

        match self.buf.iter().position(|&b| b == b'\r' || b == b'\n') {
            Some(i) if self.buf[i] == b'\r' => {
                let end = match self.buf.get(i + 1) {
                    Some(b'\n') => i + 2,
                    Some(_) => i + 1,
                    None => {
                        self.swallow_lf = true;
                        i + 1
                    },
                };
                Some(self.buf.split_to(end).freeze())
            },
            Some(i) => Some(self.buf.split_to(i + 1).freeze()),
            None if self.buf.len() > self.max_len => Some(self.buf.split().freeze()),
            None => None,
        }
    }

    /// Drain whatever is left, terminated or not. Used when the peer closes.
    pub fn take_remainder(&mut self) -> Option<Bytes> {
        self.swallow_lf = false;
        if self.buf.is_empty() { None } else { Some(self.buf.split().freeze()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(buffer: &mut SentenceBuffer) -> Vec<Bytes> {
        std::iter::from_fn(|| buffer.next_sentence()).collect()
    }

    #[test]
    fn splits_several_sentences_in_one_read() {
        let mut buffer = SentenceBuffer::new(100);
        buffer.push(b"os\rMa100\r\nra\r");

        assert_eq!(drain(&mut buffer), vec![&b"os\r"[..], b"Ma100\r\n", b"ra\r"]);
        assert_eq!(buffer.pending(), 0);
    }

    #[test]
    fn keeps_partial_sentence_between_reads() {
        let mut buffer = SentenceBuffer::new(100);
        buffer.push(b"Ma1");
        assert!(buffer.next_sentence().is_none());

        buffer.push(b"00\r");
        assert_eq!(buffer.next_sentence().as_deref(), Some(&b"Ma100\r"[..]));
    }

    #[test]
    fn crlf_split_across_reads_is_one_terminator() {
        let mut buffer = SentenceBuffer::new(100);
        buffer.push(b"os\r");
        assert_eq!(buffer.next_sentence().as_deref(), Some(&b"os\r"[..]));

        buffer.push(b"\ncs\r\n");
        assert_eq!(drain(&mut buffer), vec![&b"cs\r\n"[..]]);
    }

    #[test]
    fn swallowed_lf_leaves_nothing_pending() {
        let mut buffer = SentenceBuffer::new(100);
        buffer.push(b"os\r");
        let _ = buffer.next_sentence();

        buffer.push(b"\n");
        assert!(buffer.next_sentence().is_none());
        assert_eq!(buffer.pending(), 0);
        assert!(buffer.take_remainder().is_none());
    }

    #[test]
    fn swallow_waits_for_next_read() {
        let mut buffer = SentenceBuffer::new(100);
        buffer.push(b"os\r");
        let _ = buffer.next_sentence();
        assert!(buffer.next_sentence().is_none());

        buffer.push(b"\n");
        assert!(buffer.next_sentence().is_none());
        assert_eq!(buffer.pending(), 0);
    }

    #[test]
    fn bare_lf_ends_a_line() {
        let mut buffer = SentenceBuffer::new(100);
        buffer.push(b"os\nra\r");

        assert_eq!(drain(&mut buffer), vec![&b"os\n"[..], b"ra\r"]);
    }

    #[test]
    fn overlong_fragment_is_flushed() {
        let mut buffer = SentenceBuffer::new(4);
        buffer.push(b"Ma12");
        assert!(buffer.next_sentence().is_none());

        buffer.push(b"3");
        assert_eq!(buffer.next_sentence().as_deref(), Some(&b"Ma123"[..]));
    }

    #[test]
    fn remainder_on_close() {
        let mut buffer = SentenceBuffer::new(100);
        buffer.push(b"os");

        assert!(buffer.next_sentence().is_none());
        assert_eq!(buffer.take_remainder().as_deref(), Some(&b"os"[..]));
        assert!(buffer.take_remainder().is_none());
    }
}
