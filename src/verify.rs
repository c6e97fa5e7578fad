//! Stateless replay verification of paths.
//!
//! Verification checks that every step of a path names a catalog recipe,
//! that each step's inputs are present in the running multiset, and that
//! the replay ends at the scaled target with the catalysts recovered
//! intact. All failures carry the step index and the offending state.

use crate::multiset::Multiset;
use crate::path::Path;
use crate::recipe::{Catalog, Recipe, RuleSet};
use std::fmt;

/// Why a path failed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// A step names a recipe outside the catalog.
    UnknownRecipe {
        /// Index of the step in the path.
        index: usize,
        /// The unrecognized recipe.
        recipe: Recipe,
    },
    /// A step's inputs are not contained in the running multiset.
    Underflow {
        /// Index of the step in the path.
        index: usize,
        /// State just before the step.
        state: Multiset,
    },
    /// The replay did not reach the scaled target.
    TargetMismatch {
        /// Final state of the replay.
        result: Multiset,
    },
    /// The replay reached the target but did not hand the catalysts
    /// back.
    CatalystsNotRecovered {
        /// What was left after removing the scaled target.
        remainder: Multiset,
    },
    /// A multiset count exceeded its representable range during replay.
    Overflow,
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownRecipe { index, recipe } => {
                write!(f, "unknown recipe {recipe} at step {index}")
            }
            Self::Underflow { index, state } => {
                write!(f, "failed to apply step {index} on {state}")
            }
            Self::TargetMismatch { result } => {
                write!(f, "failed to reach the target, reached {result} instead")
            }
            Self::CatalystsNotRecovered { remainder } => {
                write!(f, "failed to recover the catalysts, {remainder} left over")
            }
            Self::Overflow => write!(f, "a token count overflowed during replay"),
        }
    }
}

impl std::error::Error for VerifyError {}

/// Replays `path` against its own source and catalyst and checks it
/// reaches the scaled target with the catalysts recovered.
pub fn verify(path: &Path, catalog: &Catalog) -> Result<(), VerifyError> {
    for (index, recipe) in path.steps.iter().enumerate() {
        if !catalog.contains(recipe) {
            return Err(VerifyError::UnknownRecipe {
                index,
                recipe: *recipe,
            });
        }
    }

    let mut state = path
        .source
        .checked_scale(path.repetitions)
        .and_then(|scaled| scaled.checked_add(&path.catalyst))
        .map_err(|_| VerifyError::Overflow)?;

    for (index, recipe) in path.steps.iter().enumerate() {
        if !state.contains(recipe.inputs()) {
            return Err(VerifyError::Underflow { index, state });
        }

        state = catalog
            .apply(recipe, &state)
            .map_err(|_| VerifyError::Overflow)?;
    }

    let target = path
        .target
        .checked_scale(path.repetitions)
        .map_err(|_| VerifyError::Overflow)?;

    if !state.contains(&target) {
        return Err(VerifyError::TargetMismatch { result: state });
    }

    let remainder = state.saturating_sub(&target);

    if remainder != path.catalyst {
        return Err(VerifyError::CatalystsNotRecovered { remainder });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> Path {
        s.parse().unwrap()
    }

    fn check(s: &str) -> Result<(), VerifyError> {
        verify(&path(s), &Catalog::standard())
    }

    /// Test a valid two-step path with a catalyst.
    #[test]
    fn valid_path() {
        assert_eq!(check("EP -> LX + O => EO -> GL | GP -> OX"), Ok(()));
    }

    /// Test the empty path over identical endpoints.
    #[test]
    fn valid_empty_path() {
        assert_eq!(check("EG -> EG =>"), Ok(()));
    }

    /// Test a batched path replays against the scaled endpoints.
    #[test]
    fn valid_batched_path() {
        assert_eq!(check("EO -> GL x2 => EO -> GL | EO -> GL"), Ok(()));
        assert!(matches!(
            check("EO -> GL x2 => EO -> GL"),
            Err(VerifyError::TargetMismatch { .. })
        ));
    }

    /// Test recipes outside the catalog are rejected with their index.
    #[test]
    fn unknown_recipe() {
        let restricted = Catalog::standard().without(&"GP -> OX".parse().unwrap());
        let p = path("EP -> LX + O => EO -> GL | GP -> OX");

        assert_eq!(
            verify(&p, &restricted),
            Err(VerifyError::UnknownRecipe {
                index: 1,
                recipe: "GP -> OX".parse().unwrap(),
            })
        );
    }

    /// Test an out-of-order step fails at its index with the state.
    #[test]
    fn inapplicable_step() {
        // GP cannot fire before EO has produced the G.
        let result = check("EP -> LX + O => GP -> OX | EO -> GL");

        assert_eq!(
            result,
            Err(VerifyError::Underflow {
                index: 0,
                state: "EOP".parse().unwrap(),
            })
        );
    }

    /// Test a replay that ends away from the target.
    #[test]
    fn target_mismatch() {
        assert!(matches!(
            check("EP -> LT + O => EO -> GL | GP -> OX"),
            Err(VerifyError::TargetMismatch { .. })
        ));
    }

    /// Test a replay that reaches the target but eats the catalysts.
    #[test]
    fn catalysts_not_recovered() {
        // EO -> GL reaches a superset of the declared target L, but the
        // leftover G is not the declared (empty) catalyst.
        assert_eq!(
            check("EO -> L => EO -> GL"),
            Err(VerifyError::CatalystsNotRecovered {
                remainder: "G".parse().unwrap(),
            })
        );
    }
}
