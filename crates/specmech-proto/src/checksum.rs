//! XOR checksum codec for `$BODY*HH` sentences.
//!
//! The controller frames every status sentence as `$` + body + `*` + two
//! uppercase hex digits + line ending. The checksum is the XOR of every byte
//! of the body. It detects single-byte corruption on a serial line and
//! nothing more; it is not a hash.

use crate::{LineEnding, errors::FrameError};

/// XOR-fold every byte of `body`.
pub fn checksum(body: &[u8]) -> u8 {
    body.iter().fold(0, |acc, byte| acc ^ byte)
}

/// Wrap `body` into a complete `$BODY*HH` sentence followed by `ending`.
pub fn frame(body: &str, ending: LineEnding) -> String {
    format!("${body}*{:02X}{}", checksum(body.as_bytes()), ending.as_str())
}

/// Check a `$BODY*HH` sentence (without line ending).
///
/// The hex digits are compared case-insensitively.
pub fn verify(sentence: &[u8]) -> bool {
    open_envelope(sentence).is_ok()
}

/// Strip the `$...*HH` envelope, returning the body if the checksum matches.
///
/// # Errors
///
/// - `FrameError::MissingEnvelope` if the sentence does not start with `$`
///   or does not end with `*` and exactly two hex digits
/// - `FrameError::BadChecksum` if the digits do not match the body
pub fn open_envelope(sentence: &[u8]) -> Result<&[u8], FrameError> {
    let Some(inner) = sentence.strip_prefix(b"$") else {
        return Err(FrameError::MissingEnvelope);
    };

    let star = inner.iter().rposition(|&b| b == b'*').ok_or(FrameError::MissingEnvelope)?;
    let (body, digits) = (&inner[..star], &inner[star + 1..]);

    if digits.len() != 2 || !digits.iter().all(u8::is_ascii_hexdigit) {
        return Err(FrameError::MissingEnvelope);
    }

    let actual = std::str::from_utf8(digits).map_err(|_| FrameError::MissingEnvelope)?;
    let parsed = u8::from_str_radix(actual, 16).map_err(|_| FrameError::MissingEnvelope)?;
    let expected = checksum(body);

    if parsed != expected {
        return Err(FrameError::BadChecksum { expected, actual: actual.to_string() });
    }

    Ok(body)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn error_body_matches_firmware_constant() {
        assert_eq!(frame("S2ERR", LineEnding::CrLf), "$S2ERR*24\r\n");
    }

    #[test]
    fn single_digit_checksums_are_zero_padded() {
        assert_eq!(frame("S2VER,2020-12-16", LineEnding::Cr), "$S2VER,2020-12-16*08\r");
    }

    #[test]
    fn verify_accepts_lowercase_digits() {
        assert!(verify(b"$Ma100*1d"));
        assert!(verify(b"$Ma100*1D"));
    }

    #[test]
    fn verify_rejects_wrong_digits() {
        assert_eq!(
            open_envelope(b"$Ma100*1E"),
            Err(FrameError::BadChecksum { expected: 0x1D, actual: "1E".to_string() })
        );
    }

    #[test]
    fn verify_rejects_malformed_envelopes() {
        for sentence in
            [&b"Ma100*1D"[..], b"$Ma100", b"$Ma100*1", b"$Ma100*1DD", b"$Ma100*ZZ", b""]
        {
            assert_eq!(open_envelope(sentence), Err(FrameError::MissingEnvelope), "{sentence:?}");
        }
    }

    #[test]
    fn empty_body_checksum_is_zero() {
        assert_eq!(checksum(b""), 0);
        assert_eq!(frame("", LineEnding::CrLf), "$*00\r\n");
    }

    fn printable_body() -> impl Strategy<Value = String> {
        "[ -#%-)+-~]{0,64}"
    }

    proptest! {
        #[test]
        fn framed_sentences_verify(body in printable_body()) {
            let sentence = frame(&body, LineEnding::CrLf);
            let without_ending = sentence.trim_end_matches("\r\n");

            prop_assert!(verify(without_ending.as_bytes()));
            prop_assert_eq!(open_envelope(without_ending.as_bytes()), Ok(body.as_bytes()));
        }

        #[test]
        fn checksum_is_its_own_inverse(body in printable_body()) {
            let mut extended = body.clone().into_bytes();
            extended.push(checksum(body.as_bytes()));

            prop_assert_eq!(checksum(&extended), 0);
        }
    }

    #[test]
    fn checksum_does_not_see_byte_order() {
        // XOR is commutative: transposed bytes go undetected.
        assert_eq!(checksum(b"S2MRA,100"), 0x22);
        assert_eq!(checksum(b"S2MRA,010"), 0x22);
        assert_ne!(checksum(b"S2MRA,100"), checksum(b"S2MRA,101"));
    }
}
