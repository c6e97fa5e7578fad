//! Fixed-alphabet multisets of tokens.
//!
//! A [`Multiset`] maps each of the eight tokens to a small non-negative
//! count. The representation is a fixed `[u8; 8]` rather than a general
//! map: add, subtract and containment reduce to eight checked arithmetic
//! operations, and the canonical encoding used as a hash and equality key
//! is the raw count array in alphabet order.
//!
//! # Invariants
//! - Counts are never negative; subtraction below zero is an error, not a
//!   wrap.
//! - Per-token counts are capped at 255; exceeding the cap is an error,
//!   not a wrap.

use crate::token::{Polarity, Token};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str;

/// Error produced by multiset arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MultisetError {
    /// A count would exceed the representable maximum.
    Overflow,
    /// A count would drop below zero.
    Underflow,
}

impl fmt::Display for MultisetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overflow => write!(f, "multiset count overflow"),
            Self::Underflow => write!(f, "multiset count underflow"),
        }
    }
}

impl std::error::Error for MultisetError {}

/// A multiset over the eight-token alphabet.
///
/// Equality, hashing and ordering all follow the canonical count array,
/// so equal multisets are interchangeable as map keys and sort keys.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Multiset {
    counts: [u8; Token::COUNT],
}

impl Multiset {
    /// Creates an empty multiset.
    #[inline]
    pub const fn new() -> Self {
        Self {
            counts: [0; Token::COUNT],
        }
    }

    /// Creates a multiset holding each listed token once per occurrence.
    pub const fn from_tokens<const N: usize>(tokens: [Token; N]) -> Self {
        let mut counts = [0u8; Token::COUNT];

        let mut i = 0;
        while i < N {
            counts[tokens[i].index()] += 1;
            i += 1;
        }

        Self { counts }
    }

    /// Returns the count of a single token.
    #[inline]
    pub const fn count(&self, token: Token) -> u8 {
        self.counts[token.index()]
    }

    /// Returns the total number of tokens, counting multiplicity.
    pub fn len(&self) -> usize {
        self.counts.iter().map(|&n| n as usize).sum()
    }

    /// Returns whether the multiset holds no tokens.
    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&n| n == 0)
    }

    /// Returns whether every count in `other` is covered by `self`.
    pub fn contains(&self, other: &Self) -> bool {
        self.counts
            .iter()
            .zip(&other.counts)
            .all(|(&s, &o)| s >= o)
    }

    /// Pointwise sum. Fails with [`MultisetError::Overflow`] if any count
    /// would exceed 255.
    pub fn checked_add(&self, other: &Self) -> Result<Self, MultisetError> {
        let mut counts = [0u8; Token::COUNT];

        for i in 0..Token::COUNT {
            counts[i] = self.counts[i]
                .checked_add(other.counts[i])
                .ok_or(MultisetError::Overflow)?;
        }

        Ok(Self { counts })
    }

    /// Pointwise difference. Fails with [`MultisetError::Underflow`]
    /// unless `self.contains(other)`.
    pub fn checked_sub(&self, other: &Self) -> Result<Self, MultisetError> {
        let mut counts = [0u8; Token::COUNT];

        for i in 0..Token::COUNT {
            counts[i] = self.counts[i]
                .checked_sub(other.counts[i])
                .ok_or(MultisetError::Underflow)?;
        }

        Ok(Self { counts })
    }

    /// Pointwise difference clamped at zero.
    pub fn saturating_sub(&self, other: &Self) -> Self {
        let mut counts = [0u8; Token::COUNT];

        for i in 0..Token::COUNT {
            counts[i] = self.counts[i].saturating_sub(other.counts[i]);
        }

        Self { counts }
    }

    /// Multiplies every count by `factor`. Fails with
    /// [`MultisetError::Overflow`] if any product exceeds 255.
    pub fn checked_scale(&self, factor: u8) -> Result<Self, MultisetError> {
        let mut counts = [0u8; Token::COUNT];

        for i in 0..Token::COUNT {
            counts[i] = self.counts[i]
                .checked_mul(factor)
                .ok_or(MultisetError::Overflow)?;
        }

        Ok(Self { counts })
    }

    /// Adds one occurrence of `token`.
    pub fn insert(&mut self, token: Token) -> Result<(), MultisetError> {
        let slot = &mut self.counts[token.index()];
        *slot = slot.checked_add(1).ok_or(MultisetError::Overflow)?;
        Ok(())
    }

    /// Removes one occurrence of `token`.
    pub fn remove(&mut self, token: Token) -> Result<(), MultisetError> {
        let slot = &mut self.counts[token.index()];
        *slot = slot.checked_sub(1).ok_or(MultisetError::Underflow)?;
        Ok(())
    }

    /// Returns the number of tokens of the given polarity class.
    pub fn polarity_count(&self, polarity: Polarity) -> usize {
        Token::ALPHABET
            .into_iter()
            .filter(|t| t.polarity() == polarity)
            .map(|t| self.count(t) as usize)
            .sum()
    }

    /// Returns the `(negative, positive)` token totals.
    pub fn polarity_counts(&self) -> (usize, usize) {
        (
            self.polarity_count(Polarity::Negative),
            self.polarity_count(Polarity::Positive),
        )
    }

    /// Returns the canonical byte encoding: the eight counts in alphabet
    /// order. Equal multisets produce identical byte strings.
    #[inline]
    pub const fn canonical_bytes(&self) -> [u8; Token::COUNT] {
        self.counts
    }

    /// Iterates the tokens in canonical order, repeating each one per its
    /// count.
    pub fn iter(&self) -> impl Iterator<Item = Token> + '_ {
        Token::ALPHABET
            .into_iter()
            .flat_map(move |t| std::iter::repeat(t).take(self.count(t) as usize))
    }
}

impl FromIterator<Token> for Multiset {
    /// Collects tokens into a multiset.
    ///
    /// # Panics
    ///
    /// If any single count exceeds 255. Use [`Multiset::insert`] when the
    /// input is not known to be small.
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Token>,
    {
        let mut result = Self::new();

        for token in iter {
            result
                .insert(token)
                .expect("token iterators collected into a multiset stay below 256 per token");
        }

        result
    }
}

impl fmt::Display for Multiset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use fmt::Write;

        for token in self.iter() {
            f.write_char(token.symbol())?;
        }

        Ok(())
    }
}

/// Error produced when parsing a multiset from text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultisetParseError {
    /// A character does not name an alphabet token.
    UnknownToken(char),
    /// A token occurred more than 255 times.
    CountOverflow(Token),
}

impl fmt::Display for MultisetParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownToken(c) => write!(f, "unknown token {c:?}"),
            Self::CountOverflow(t) => write!(f, "more than 255 occurrences of {t}"),
        }
    }
}

impl std::error::Error for MultisetParseError {}

impl str::FromStr for Multiset {
    type Err = MultisetParseError;

    /// Parses concatenated uppercase token letters, e.g. `"EGLO"`.
    ///
    /// Letters may appear in any order; the parsed value is canonical
    /// regardless. Whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut result = Multiset::new();

        for c in s.chars() {
            if c.is_whitespace() {
                continue;
            }

            let token = Token::from_symbol(c).ok_or(MultisetParseError::UnknownToken(c))?;

            result
                .insert(token)
                .map_err(|_| MultisetParseError::CountOverflow(token))?;
        }

        Ok(result)
    }
}
