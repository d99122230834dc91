//! Integer <-> string codec over a configurable character alphabet.
//!
//! # Purpose
//! Compacts numbers (permission codes, study ids, dictionary indices) into
//! short strings so that hundreds of grants fit inside a signed token.
//!
//! # How it fits
//! The permission catalog and the compact permission codec both encode with
//! an instance of this type; decoded tokens are mapped back to numbers with
//! the same instance.
//!
//! # Key invariants
//! - `decode(encode(v)) == v` for every `v` and every valid alphabet.
//! - The alphabet is sorted ascending exactly once, at construction, and the
//!   same sorted table is used for both encode and decode.
//! - No alphabet may contain the claim delimiters `;`, `|`, `~` or `.`.
//!
//! # Common pitfalls
//! - Encoding with one alphabet and decoding with another produces garbage
//!   without failing; always keep a single encoder per wire format.
use crate::{AuthzError, AuthzResult};

/// 62-character alphanumeric alphabet. One character covers codes 0..=61.
const ALPHANUMERIC: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Extended 117-character alphabet. Symbol characters pack roughly seven
/// bits per character, shortening large study ids.
const EXTENDED: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyzœ∑´†¥¨ˆπ“‘åß∂ƒ©˙∆˚¬…Ω≈ç√∫˜≤≥µ¡™£¢∞§¶•ªº≠`!@#$%^&*+'?<>:";

/// Characters that delimit fields inside compact permission claims. They are
/// reserved and rejected when a caller supplies a custom alphabet.
const RESERVED_DELIMITERS: [char; 4] = [';', '|', '~', '.'];

/// Bidirectional number/string codec over a sorted character alphabet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlphabetEncoder {
    alphabet: Vec<char>,
}

impl AlphabetEncoder {
    /// Build an encoder from an arbitrary character set.
    ///
    /// The characters are deduplicated-checked and sorted ascending once;
    /// both directions of the codec use the sorted order, so the order the
    /// caller supplies carries no meaning.
    ///
    /// # Errors
    /// - [`AuthzError::InvalidAlphabet`] if fewer than two characters are
    ///   given, a character repeats, or a reserved delimiter is present.
    pub fn new(chars: impl IntoIterator<Item = char>) -> AuthzResult<Self> {
        let mut alphabet: Vec<char> = chars.into_iter().collect();
        alphabet.sort_unstable();
        if alphabet.len() < 2 {
            return Err(AuthzError::InvalidAlphabet(
                "an alphabet needs at least two characters".to_string(),
            ));
        }
        if alphabet.windows(2).any(|pair| pair[0] == pair[1]) {
            return Err(AuthzError::InvalidAlphabet(
                "alphabet characters must be unique".to_string(),
            ));
        }
        if let Some(ch) = alphabet
            .iter()
            .copied()
            .find(|ch| RESERVED_DELIMITERS.contains(ch))
        {
            return Err(AuthzError::InvalidAlphabet(format!(
                "character {ch:?} is reserved as a claim delimiter"
            )));
        }
        Ok(Self { alphabet })
    }

    /// The standard 62-character alphanumeric alphabet.
    pub fn alphanumeric() -> Self {
        Self::from_known(ALPHANUMERIC)
    }

    /// The standard extended alphabet used for production tokens.
    pub fn extended() -> Self {
        Self::from_known(EXTENDED)
    }

    // The standard literals are unique and delimiter-free; skip validation.
    fn from_known(alphabet: &str) -> Self {
        let mut alphabet: Vec<char> = alphabet.chars().collect();
        alphabet.sort_unstable();
        Self { alphabet }
    }

    /// Number of characters in the alphabet, i.e. the numeric base.
    pub fn base(&self) -> usize {
        self.alphabet.len()
    }

    /// Encode a number into its compact alphabetic representation.
    ///
    /// Digits are collected least-significant first and reversed at the end;
    /// zero encodes to a single digit.
    pub fn encode(&self, mut value: u64) -> String {
        let base = self.alphabet.len() as u64;
        let mut digits = Vec::new();
        loop {
            digits.push(self.alphabet[(value % base) as usize]);
            value /= base;
            if value == 0 {
                break;
            }
        }
        digits.iter().rev().collect()
    }

    /// Decode a compact alphabetic representation back into a number.
    ///
    /// Characters are ranked by binary search over the sorted alphabet and
    /// folded left to right with Horner's rule.
    ///
    /// # Errors
    /// - [`AuthzError::InvalidCharacter`] for a character outside the
    ///   alphabet.
    /// - [`AuthzError::ValueOverflow`] when the input encodes a value larger
    ///   than `u64::MAX`.
    pub fn decode(&self, encoded: &str) -> AuthzResult<u64> {
        let base = self.alphabet.len() as u64;
        let mut acc: u64 = 0;
        for ch in encoded.chars() {
            let rank = self
                .alphabet
                .binary_search(&ch)
                .map_err(|_| AuthzError::InvalidCharacter { ch })? as u64;
            acc = acc
                .checked_mul(base)
                .and_then(|shifted| shifted.checked_add(rank))
                .ok_or_else(|| AuthzError::ValueOverflow(encoded.to_string()))?;
        }
        Ok(acc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_standard_alphabets() {
        let values = [0u64, 1, 61, 62, 1_000_000_000, u64::MAX];
        for encoder in [AlphabetEncoder::alphanumeric(), AlphabetEncoder::extended()] {
            for value in values {
                let encoded = encoder.encode(value);
                assert!(!encoded.is_empty());
                assert_eq!(encoder.decode(&encoded).expect("decode"), value);
            }
        }
    }

    #[test]
    fn zero_encodes_to_single_digit() {
        let encoder = AlphabetEncoder::alphanumeric();
        assert_eq!(encoder.encode(0).chars().count(), 1);
    }

    #[test]
    fn alphanumeric_digits_are_positional() {
        // 0-9A-Za-z is already sorted ascending by code point, so the
        // encoding matches ordinary base-62 with that digit order.
        let encoder = AlphabetEncoder::alphanumeric();
        assert_eq!(encoder.encode(0), "0");
        assert_eq!(encoder.encode(61), "z");
        assert_eq!(encoder.encode(62), "10");
        assert_eq!(encoder.decode("10").expect("decode"), 62);
    }

    #[test]
    fn decode_rejects_foreign_characters() {
        let encoder = AlphabetEncoder::alphanumeric();
        let err = encoder.decode("ab;cd").expect_err("reject delimiter");
        assert!(matches!(err, AuthzError::InvalidCharacter { ch: ';' }));
    }

    #[test]
    fn decode_rejects_overflowing_input() {
        let encoder = AlphabetEncoder::alphanumeric();
        let mut too_long = encoder.encode(u64::MAX);
        too_long.push('z');
        let err = encoder.decode(&too_long).expect_err("overflow");
        assert!(matches!(err, AuthzError::ValueOverflow(_)));
    }

    #[test]
    fn custom_alphabet_round_trip_regardless_of_input_order() {
        // The constructor sorts, so a shuffled alphabet behaves identically.
        let shuffled = AlphabetEncoder::new("zxa0f".chars()).expect("alphabet");
        let sorted = AlphabetEncoder::new("0afxz".chars()).expect("alphabet");
        for value in [0u64, 4, 5, 24, 625, 9999] {
            assert_eq!(shuffled.encode(value), sorted.encode(value));
            assert_eq!(shuffled.decode(&shuffled.encode(value)).expect("decode"), value);
        }
    }

    #[test]
    fn custom_alphabet_rejects_reserved_delimiters() {
        for delimiter in [';', '|', '~', '.'] {
            let err = AlphabetEncoder::new(['a', 'b', delimiter])
                .expect_err("reserved delimiter");
            assert!(matches!(err, AuthzError::InvalidAlphabet(_)));
        }
    }

    #[test]
    fn custom_alphabet_rejects_duplicates_and_tiny_sets() {
        assert!(matches!(
            AlphabetEncoder::new(['a', 'b', 'a']),
            Err(AuthzError::InvalidAlphabet(_))
        ));
        assert!(matches!(
            AlphabetEncoder::new(['a']),
            Err(AuthzError::InvalidAlphabet(_))
        ));
    }

    #[test]
    fn standard_alphabets_have_expected_sizes() {
        assert_eq!(AlphabetEncoder::alphanumeric().base(), 62);
        assert_eq!(AlphabetEncoder::extended().base(), 117);
    }
}
