//! Validated solve inputs and their precomputed invariants.
//!
//! A [`Problem`] bundles the source and target multisets, the rule
//! catalog and the repetition factor, and derives the arithmetic facts
//! the rest of the engine relies on: the polarity delta, the minimum
//! number of inversions any solution must contain, and an admissible
//! lower bound on path length. Problems are constructed once per solve
//! and never mutated.

use crate::multiset::{Multiset, MultisetError};
use crate::recipe::Catalog;
use crate::token::Polarity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error produced when assembling a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemError {
    /// The repetition factor must be at least 1.
    ZeroRepetitions,
    /// Scaling the source or target by the repetition factor overflowed.
    ScaleOverflow(MultisetError),
}

impl fmt::Display for ProblemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroRepetitions => write!(f, "repetition factor must be at least 1"),
            Self::ScaleOverflow(e) => write!(f, "repetition scaling failed: {e}"),
        }
    }
}

impl std::error::Error for ProblemError {}

/// A validated `(source, target, catalog, repetitions)` bundle.
///
/// # Invariants
/// - `repetitions >= 1`.
/// - `scaled_source == repetitions · source`, likewise for the target.
/// - Derived quantities are consistent with the scaled multisets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    source: Multiset,
    target: Multiset,
    catalog: Catalog,
    repetitions: u8,
    scaled_source: Multiset,
    scaled_target: Multiset,
    polarity_delta: i32,
}

impl Problem {
    /// Validates the inputs and precomputes the scaled multisets and the
    /// polarity delta.
    pub fn new(
        source: Multiset,
        target: Multiset,
        catalog: Catalog,
        repetitions: u8,
    ) -> Result<Self, ProblemError> {
        if repetitions == 0 {
            return Err(ProblemError::ZeroRepetitions);
        }

        let scaled_source = source
            .checked_scale(repetitions)
            .map_err(ProblemError::ScaleOverflow)?;
        let scaled_target = target
            .checked_scale(repetitions)
            .map_err(ProblemError::ScaleOverflow)?;

        let polarity_delta = scaled_target.polarity_count(Polarity::Negative) as i32
            - scaled_source.polarity_count(Polarity::Negative) as i32;

        Ok(Self {
            source,
            target,
            catalog,
            repetitions,
            scaled_source,
            scaled_target,
            polarity_delta,
        })
    }

    /// The per-repetition source.
    #[inline]
    pub const fn source(&self) -> &Multiset {
        &self.source
    }

    /// The per-repetition target.
    #[inline]
    pub const fn target(&self) -> &Multiset {
        &self.target
    }

    /// The rule catalog.
    #[inline]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The repetition factor.
    #[inline]
    pub const fn repetitions(&self) -> u8 {
        self.repetitions
    }

    /// `repetitions · source`.
    #[inline]
    pub const fn scaled_source(&self) -> &Multiset {
        &self.scaled_source
    }

    /// `repetitions · target`.
    #[inline]
    pub const fn scaled_target(&self) -> &Multiset {
        &self.scaled_target
    }

    /// `negative(scaled target) − negative(scaled source)`.
    ///
    /// Foldings leave this quantity untouched and every inversion moves
    /// it by exactly 4, so `polarity_delta % 4 == 0` is necessary for a
    /// solution to exist.
    #[inline]
    pub const fn polarity_delta(&self) -> i32 {
        self.polarity_delta
    }

    /// Whether the polarity delta can be resolved by whole inversions.
    #[inline]
    pub const fn has_balanced_polarity(&self) -> bool {
        self.polarity_delta % 4 == 0
    }

    /// Whether the scaled source and target hold the same number of
    /// tokens. Recipes conserve tokens and catalysts augment both ends
    /// equally, so unequal sizes admit no solution.
    pub fn has_balanced_sizes(&self) -> bool {
        self.scaled_source.len() == self.scaled_target.len()
    }

    /// The number of inversion steps any solution must contain.
    #[inline]
    pub const fn min_inversions(&self) -> u32 {
        self.polarity_delta.unsigned_abs() / 4
    }

    /// An admissible lower bound on solution length.
    ///
    /// When no inversions are needed, every folding raises at most two
    /// token counts, so at least `ceil(surplus / 2)` foldings are needed
    /// to build up the target surplus. Inversion-bearing problems count
    /// only their inversions; the bound stays admissible.
    pub fn length_lower_bound(&self) -> u32 {
        let min_inversions = self.min_inversions();

        if min_inversions > 0 {
            return min_inversions;
        }

        let surplus: u32 = self
            .scaled_target
            .canonical_bytes()
            .iter()
            .zip(self.scaled_source.canonical_bytes())
            .map(|(&t, s)| (t.saturating_sub(s)) as u32)
            .sum();

        surplus.div_ceil(2)
    }

    /// The smallest repetition factor under which the per-repetition
    /// polarity delta becomes a whole number of inversions.
    ///
    /// Inversion parity may force batching several source → target
    /// conversions into a single path; this is the least viable batch.
    pub fn minimum_repetitions(source: &Multiset, target: &Multiset) -> u8 {
        let unit_delta = target.polarity_count(Polarity::Negative) as i32
            - source.polarity_count(Polarity::Negative) as i32;

        match unit_delta.rem_euclid(4) {
            0 => 1,
            2 => 2,
            _ => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(s: &str) -> Multiset {
        s.parse().unwrap()
    }

    fn problem(source: &str, target: &str, repetitions: u8) -> Problem {
        Problem::new(ms(source), ms(target), Catalog::standard(), repetitions).unwrap()
    }

    /// Test validation failures.
    #[test]
    fn rejects_bad_inputs() {
        assert_eq!(
            Problem::new(ms("E"), ms("L"), Catalog::standard(), 0),
            Err(ProblemError::ZeroRepetitions)
        );

        let mut big = Multiset::new();
        for _ in 0..200 {
            big.insert(crate::token::Token::E).unwrap();
        }
        assert!(matches!(
            Problem::new(big, big, Catalog::standard(), 2),
            Err(ProblemError::ScaleOverflow(_))
        ));
    }

    /// Test scaling and the polarity delta.
    #[test]
    fn scaling_and_delta() {
        let p = problem("EP", "LX", 2);

        assert_eq!(p.scaled_source(), &ms("EEPP"));
        assert_eq!(p.scaled_target(), &ms("LLXX"));
        // Both sides fully negative: delta 0, no inversions.
        assert_eq!(p.polarity_delta(), 0);
        assert!(p.has_balanced_polarity());
        assert!(p.has_balanced_sizes());
        assert_eq!(p.min_inversions(), 0);
    }

    /// Test a problem whose delta demands exactly one inversion.
    #[test]
    fn inversion_demand() {
        // GOTZ (0 negatives) -> ELPX (4 negatives): delta 4.
        let p = problem("GOTZ", "ELPX", 1);

        assert_eq!(p.polarity_delta(), 4);
        assert!(p.has_balanced_polarity());
        assert_eq!(p.min_inversions(), 1);
        assert_eq!(p.length_lower_bound(), 1);
    }

    /// Test an unbalanceable delta.
    #[test]
    fn unbalanced_polarity() {
        // E (1 negative) -> G (0 negatives): delta -1.
        let p = problem("E", "G", 1);

        assert_eq!(p.polarity_delta(), -1);
        assert!(!p.has_balanced_polarity());
    }

    /// Test the folding lower bound on a pure-folding problem.
    #[test]
    fn folding_lower_bound() {
        // EP -> LX: surplus is L + X = 2, so at least one folding; the
        // true minimum is 2 and the bound must not exceed it.
        let p = problem("EP", "LX", 1);
        assert_eq!(p.length_lower_bound(), 1);

        // A problem already at its target needs nothing.
        let p = problem("EG", "EG", 1);
        assert_eq!(p.length_lower_bound(), 0);
    }

    /// Test minimum repetitions against delta parity.
    #[test]
    fn minimum_repetitions() {
        // delta 0: a single conversion balances.
        assert_eq!(Problem::minimum_repetitions(&ms("EP"), &ms("LX")), 1);
        // delta -1: only a batch of four balances.
        assert_eq!(Problem::minimum_repetitions(&ms("E"), &ms("G")), 4);
        // delta 2: a pair balances.
        assert_eq!(Problem::minimum_repetitions(&ms("GO"), &ms("EL")), 2);
        // delta 4: already whole.
        assert_eq!(Problem::minimum_repetitions(&ms("GOTZ"), &ms("ELPX")), 1);
    }
}
