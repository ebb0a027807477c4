//! # Base85 Codec
//!
//! ASCII85-style binary ↔ text codec. The RIS config key is delivered to
//! merchants in this form and decoded once at start-up.
//!
//! ## Block Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        4 bytes → 5 characters                           │
//! │                                                                         │
//! │   bytes:   0x54 0x68 0x69 0x73          ("This")                        │
//! │              │                                                          │
//! │              ▼  big-endian u32                                          │
//! │   tuple:   1416128883                                                   │
//! │              │                                                          │
//! │              ▼  ÷85 five times, remainder + 33, most significant first  │
//! │   chars:   '<' '+' 'o' 'u' 'e'                                          │
//! │                                                                         │
//! │   Special cases                                                         │
//! │   ─────────────                                                         │
//! │   • four zero bytes        → 'z'                                        │
//! │   • trailing n < 4 bytes   → n + 1 characters (zero padded tuple)       │
//! │   • decode skips \n \r \t NUL \f \b                                     │
//! │   • a newline follows every 75th character when wrapping is on          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use ris_core::base85;
//!
//! let text = base85::encode(b"This is sample text for testing purposes.");
//! assert_eq!(text, "<+oue+DGm>F(&p)Ch4`2AU&;>AoD]4FCfN8Bl7Q+E-62?Df]K2/c");
//! assert_eq!(base85::decode(&text).unwrap(), b"This is sample text for testing purposes.");
//! ```

use crate::error::{CoreError, CoreResult};

/// Characters emitted per line before a newline is inserted.
pub const DEFAULT_LINE_LENGTH: usize = 75;

const ASCII_OFFSET: u8 = b'!';
const ZERO_BLOCK: char = 'z';
const BLOCK_BYTES: usize = 4;
const BLOCK_CHARS: usize = 5;
const MAX_DIGIT: u32 = 84;
const POW85: [u32; BLOCK_CHARS] = [85 * 85 * 85 * 85, 85 * 85 * 85, 85 * 85, 85, 1];

// =============================================================================
// Encoder
// =============================================================================

/// Base85 encoder with configurable line wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Base85Encoder {
    line_length: usize,
}

impl Default for Base85Encoder {
    fn default() -> Self {
        Base85Encoder::new()
    }
}

impl Base85Encoder {
    /// Encoder wrapping every [`DEFAULT_LINE_LENGTH`] characters.
    pub const fn new() -> Self {
        Base85Encoder {
            line_length: DEFAULT_LINE_LENGTH,
        }
    }

    /// Encoder wrapping every `line_length` characters; `0` disables wrapping.
    pub const fn with_line_length(line_length: usize) -> Self {
        Base85Encoder { line_length }
    }

    pub const fn line_length(&self) -> usize {
        self.line_length
    }

    /// Encodes `bytes` into Base85 text.
    pub fn encode(&self, bytes: &[u8]) -> String {
        let mut out = LineWriter::new(self.line_length, bytes.len());

        for block in bytes.chunks(BLOCK_BYTES) {
            let mut padded = [0u8; BLOCK_BYTES];
            padded[..block.len()].copy_from_slice(block);
            let tuple = u32::from_be_bytes(padded);

            if block.len() == BLOCK_BYTES && tuple == 0 {
                out.push(ZERO_BLOCK);
                continue;
            }

            let digits = encode_tuple(tuple);
            // A partial block of n bytes needs n + 1 characters
            let keep = if block.len() == BLOCK_BYTES {
                BLOCK_CHARS
            } else {
                block.len() + 1
            };
            for &digit in &digits[..keep] {
                out.push(digit as char);
            }
        }

        out.finish()
    }
}

fn encode_tuple(mut tuple: u32) -> [u8; BLOCK_CHARS] {
    let mut digits = [0u8; BLOCK_CHARS];
    for slot in digits.iter_mut().rev() {
        *slot = (tuple % 85) as u8 + ASCII_OFFSET;
        tuple /= 85;
    }
    digits
}

/// Appends characters and breaks lines at a fixed width.
struct LineWriter {
    buf: String,
    line_length: usize,
    line_pos: usize,
}

impl LineWriter {
    fn new(line_length: usize, input_len: usize) -> Self {
        LineWriter {
            buf: String::with_capacity(input_len / BLOCK_BYTES * BLOCK_CHARS + BLOCK_CHARS),
            line_length,
            line_pos: 0,
        }
    }

    fn push(&mut self, c: char) {
        self.buf.push(c);
        self.line_pos += 1;
        if self.line_length > 0 && self.line_pos >= self.line_length {
            self.line_pos = 0;
            self.buf.push('\n');
        }
    }

    fn finish(self) -> String {
        self.buf
    }
}

/// Encodes `bytes` with the default line width.
pub fn encode(bytes: &[u8]) -> String {
    Base85Encoder::new().encode(bytes)
}

// =============================================================================
// Decoder
// =============================================================================

/// Decodes Base85 text back into bytes.
///
/// ## Errors
/// - [`CoreError::InvalidBase85Character`] for anything outside `'!'..='u'`
///   that is not `z` or skippable whitespace
/// - [`CoreError::MisplacedZeroBlock`] for `z` inside a partial block
/// - [`CoreError::TrailingSingleCharacter`] when one character is left over
pub fn decode(text: &str) -> CoreResult<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len() / BLOCK_CHARS * BLOCK_BYTES + BLOCK_BYTES);
    let mut tuple: u32 = 0;
    let mut count = 0usize;

    for (offset, c) in text.char_indices() {
        match c {
            ZERO_BLOCK => {
                if count != 0 {
                    return Err(CoreError::MisplacedZeroBlock { offset });
                }
                out.extend_from_slice(&[0u8; BLOCK_BYTES]);
            }
            '\n' | '\r' | '\t' | '\0' | '\x0c' | '\x08' => {}
            '!'..='u' => {
                let digit = (c as u32) - ASCII_OFFSET as u32;
                // Out-of-range blocks wrap modulo 2^32
                tuple = tuple.wrapping_add(digit.wrapping_mul(POW85[count]));
                count += 1;
                if count == BLOCK_CHARS {
                    out.extend_from_slice(&tuple.to_be_bytes());
                    tuple = 0;
                    count = 0;
                }
            }
            character => {
                return Err(CoreError::InvalidBase85Character { character, offset });
            }
        }
    }

    if count == 1 {
        return Err(CoreError::TrailingSingleCharacter);
    }
    if count > 1 {
        for pow in &POW85[count..] {
            tuple = tuple.wrapping_add(MAX_DIGIT.wrapping_mul(*pow));
        }
        out.extend_from_slice(&tuple.to_be_bytes()[..count - 1]);
    }

    Ok(out)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PLAIN_TEXT: &str = "This is sample text for testing purposes.";
    const ENCODED_TEXT: &str = "<+oue+DGm>F(&p)Ch4`2AU&;>AoD]4FCfN8Bl7Q+E-62?Df]K2/c";

    #[test]
    fn test_encode_reference_vector() {
        assert_eq!(encode(PLAIN_TEXT.as_bytes()), ENCODED_TEXT);
    }

    #[test]
    fn test_decode_reference_vector() {
        let decoded = decode(ENCODED_TEXT).unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), PLAIN_TEXT);
    }

    #[test]
    fn test_zero_block_shortcut() {
        let bytes = b"\0\0\0\0abc\0\0\0\0\0";
        let text = encode(bytes);
        assert_eq!(text, "z@:E^Hz");
        assert_eq!(decode(&text).unwrap(), bytes);
    }

    #[test]
    fn test_partial_blocks() {
        assert_eq!(encode(b""), "");
        assert_eq!(encode(b"\0"), "!!");
        assert_eq!(encode(b"a"), "@/");
        assert_eq!(encode(b"ab"), "@:B");
        assert_eq!(decode("@/").unwrap(), b"a");
        assert_eq!(decode("@:B").unwrap(), b"ab");
        // A trailing zero-only partial block is not a 'z'
        assert_eq!(encode(b"\0\0\0"), "!!!!");
    }

    #[test]
    fn test_decode_skips_whitespace_controls() {
        let noisy = "<+oue\n+DGm>\r\nF(&p)\tCh4`2\0AU&;>\x0cAoD]4\x08FCfN8Bl7Q+E-62?Df]K2/c";
        assert_eq!(decode(noisy).unwrap(), PLAIN_TEXT.as_bytes());
    }

    #[test]
    fn test_decode_rejects_bad_character() {
        let err = decode("<+o~e").unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidBase85Character { character: '~', offset: 3 }
        ));
        // Space is not one of the skipped controls
        assert!(decode("<+ oue").is_err());
    }

    #[test]
    fn test_decode_rejects_z_inside_block() {
        let err = decode("<+zue").unwrap_err();
        assert!(matches!(err, CoreError::MisplacedZeroBlock { offset: 2 }));
    }

    #[test]
    fn test_decode_rejects_single_trailing_character() {
        let err = decode("<+oue+").unwrap_err();
        assert!(matches!(err, CoreError::TrailingSingleCharacter));
    }

    #[test]
    fn test_line_wrapping() {
        let bytes = vec![0x41u8; 120];
        let wrapped = Base85Encoder::with_line_length(20).encode(&bytes);
        let unwrapped = Base85Encoder::with_line_length(0).encode(&bytes);

        assert!(!unwrapped.contains('\n'));
        assert_eq!(unwrapped.len(), 150);
        assert!(wrapped.lines().all(|line| line.len() <= 20));
        assert_eq!(wrapped.replace('\n', ""), unwrapped);
        assert_eq!(decode(&wrapped).unwrap(), bytes);
    }

    #[test]
    fn test_default_wrapping_breaks_after_75_characters() {
        let bytes = vec![0x41u8; 60];
        let text = encode(&bytes);
        // 60 bytes → 75 characters, then the newline
        assert_eq!(text.len(), 76);
        assert!(text.ends_with('\n'));
        assert_eq!(decode(&text).unwrap(), bytes);
    }

    fn bytes_with_zero_runs() -> impl Strategy<Value = Vec<u8>> {
        prop::collection::vec(prop_oneof![3 => Just(0u8), 7 => any::<u8>()], 0..1000)
    }

    proptest! {
        #[test]
        fn prop_round_trip(bytes in bytes_with_zero_runs()) {
            let text = encode(&bytes);
            prop_assert_eq!(decode(&text).unwrap(), bytes);
        }

        #[test]
        fn prop_round_trip_any_line_length(bytes in bytes_with_zero_runs(), width in 0usize..100) {
            let text = Base85Encoder::with_line_length(width).encode(&bytes);
            prop_assert_eq!(decode(&text).unwrap(), bytes);
        }
    }
}
