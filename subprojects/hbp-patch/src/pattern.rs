//! Hex-with-wildcards byte signatures.
//!
//! Some patch sites embed operands that vary between builds, such as
//! statically relocated addresses. Wildcard positions let one signature
//! match every build, and [`Pattern::apply_at`] leaves the bytes at those
//! positions untouched when the replacement is written.

use std::fmt;

/// Mask value for a significant position.
const MASK_MATCH: u8 = 0xff;
/// Mask value for a wildcard position.
const MASK_ANY: u8 = 0x00;

/// A compiled match template: byte values plus a parallel mask marking
/// which positions are significant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    bytes: Vec<u8>,
    mask: Vec<u8>,
}

impl Pattern {
    /// Compile a textual pattern.
    ///
    /// The text is whitespace-separated two-hex-digit byte tokens, where
    /// the literal token `??` denotes a wildcard:
    ///
    /// ```
    /// use hbp_patch::pattern::Pattern;
    ///
    /// let pattern = Pattern::parse("B5 22 04 91 ?? ?? ?? ??").unwrap();
    /// assert_eq!(pattern.len(), 8);
    /// ```
    pub fn parse(text: &str) -> Result<Self, PatternError> {
        let clean: Vec<u8> = text
            .bytes()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        if clean.len() % 2 != 0 {
            return Err(PatternError::OddLength);
        }

        let mut bytes = Vec::with_capacity(clean.len() / 2);
        let mut mask = Vec::with_capacity(clean.len() / 2);
        for token in clean.chunks_exact(2) {
            if token == b"??" {
                bytes.push(0);
                mask.push(MASK_ANY);
            } else {
                let (hi, lo) = (hex_digit(token[0]), hex_digit(token[1]));
                match (hi, lo) {
                    (Some(hi), Some(lo)) => {
                        bytes.push(hi << 4 | lo);
                        mask.push(MASK_MATCH);
                    }
                    _ => {
                        return Err(PatternError::InvalidToken {
                            token: String::from_utf8_lossy(token).into_owned(),
                        });
                    }
                }
            }
        }

        Ok(Self { bytes, mask })
    }

    /// Number of byte positions in the pattern.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the pattern has no positions at all.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Expected byte values (wildcard positions carry zero).
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Parallel mask: 0xff significant, 0x00 wildcard.
    pub fn mask(&self) -> &[u8] {
        &self.mask
    }

    /// Whether any position is a wildcard.
    pub fn has_wildcards(&self) -> bool {
        self.mask.iter().any(|&m| m != MASK_MATCH)
    }

    /// Find the lowest offset in `haystack` where every significant byte
    /// of the pattern matches. Wildcard positions match any byte.
    pub fn find(&self, haystack: &[u8]) -> Option<usize> {
        if self.bytes.is_empty() || haystack.len() < self.bytes.len() {
            return None;
        }
        if self.has_wildcards() {
            self.find_masked(haystack)
        } else {
            // Pure equality scan when no position is masked out.
            self.find_exact(haystack)
        }
    }

    fn find_exact(&self, haystack: &[u8]) -> Option<usize> {
        haystack
            .windows(self.bytes.len())
            .position(|window| window == self.bytes)
    }

    fn find_masked(&self, haystack: &[u8]) -> Option<usize> {
        let end = haystack.len() - self.bytes.len();
        (0..=end).find(|&start| self.matches_at(haystack, start))
    }

    fn matches_at(&self, haystack: &[u8], start: usize) -> bool {
        self.bytes
            .iter()
            .zip(&self.mask)
            .zip(&haystack[start..])
            .all(|((&byte, &mask), &actual)| mask == MASK_ANY || byte == actual)
    }

    /// Write the pattern's significant bytes into `buf` starting at
    /// `offset`, preserving the existing bytes at wildcard positions.
    ///
    /// Clamps to the end of the buffer; never writes past it.
    pub fn apply_at(&self, buf: &mut [u8], offset: usize) {
        if offset >= buf.len() {
            return;
        }
        let len = self.bytes.len().min(buf.len() - offset);
        for i in 0..len {
            if self.mask[i] == MASK_MATCH {
                buf[offset + i] = self.bytes[i];
            }
        }
    }

    /// Re-derive the textual form: uppercase hex tokens, `??` wildcards.
    pub fn to_hex_string(&self) -> String {
        self.bytes
            .iter()
            .zip(&self.mask)
            .map(|(byte, &mask)| {
                if mask == MASK_MATCH {
                    format!("{byte:02X}")
                } else {
                    "??".to_owned()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex_string())
    }
}

fn hex_digit(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}

/// Errors that can occur when compiling a textual pattern.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    /// The text has an odd number of hex digits after removing whitespace.
    #[error("pattern has odd length after removing whitespace")]
    OddLength,
    /// A token is neither two hex digits nor `??`.
    #[error("invalid pattern token {token:?}: expected two hex digits or \"??\"")]
    InvalidToken {
        /// The offending two-character token
        token: String,
    },
}
