//! Staging a flat path into concurrently executable groups.
//!
//! The scheduler walks a verified path left to right and greedily folds
//! the longest prefix of remaining steps whose inputs are pairwise
//! token-disjoint and jointly covered by the pending multiset into one
//! stage. Each stage reports three multisets alongside its recipes:
//!
//! - *reserved*: pending tokens the stage leaves untouched;
//! - *working*: tokens the stage's recipes consume;
//! - *released*: tokens of the post-stage state that no remaining step
//!   needs; the hand-back is cumulative, so the final stage releases the
//!   whole scaled target plus catalysts.
//!
//! Flattening the stages reproduces the input step sequence verbatim.

use crate::multiset::{Multiset, MultisetError};
use crate::path::Path;
use crate::recipe::{Catalog, Recipe};
use crate::token::Token;
use crate::verify::{verify, VerifyError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One group of concurrently executable recipes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    /// Pending tokens preserved for later stages.
    pub reserved: Multiset,
    /// Tokens consumed by this stage's recipes.
    pub working: Multiset,
    /// Tokens no remaining step needs, handed back to the caller.
    pub released: Multiset,
    /// The recipes of the stage, in path order.
    pub recipes: Vec<Recipe>,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] + [{}] + [{}] |",
            self.reserved, self.working, self.released
        )?;

        for (i, recipe) in self.recipes.iter().enumerate() {
            if i > 0 {
                write!(f, " //")?;
            }
            write!(f, " {recipe}")?;
        }

        Ok(())
    }
}

/// An ordered list of stages for one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    start: Multiset,
    stages: Vec<Stage>,
}

impl Schedule {
    /// The state the plan starts from: scaled source plus catalysts.
    #[inline]
    pub const fn start(&self) -> &Multiset {
        &self.start
    }

    /// The stages, in execution order.
    #[inline]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Reconstitutes the flat step sequence the schedule was built from.
    pub fn flatten_steps(&self) -> Vec<Recipe> {
        self.stages
            .iter()
            .flat_map(|stage| stage.recipes.iter().copied())
            .collect()
    }
}

impl fmt::Display for Schedule {
    /// One line per stage, numbered from 1.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stage) in self.stages.iter().enumerate() {
            writeln!(f, "  {}. {stage}", i + 1)?;
        }

        Ok(())
    }
}

/// Why a path could not be scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// The path does not replay; scheduling is refused, not repaired.
    Invalid(VerifyError),
    /// Multiset arithmetic failed after verification passed; this is a
    /// bug, not a property of the inputs.
    Internal(MultisetError),
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(e) => write!(f, "path is not schedulable: {e}"),
            Self::Internal(e) => write!(f, "internal scheduler invariant violated: {e}"),
        }
    }
}

impl std::error::Error for ScheduleError {}

impl From<VerifyError> for ScheduleError {
    fn from(value: VerifyError) -> Self {
        Self::Invalid(value)
    }
}

/// Groups a verified path into the fewest greedy left-to-right stages.
pub fn schedule(path: &Path, catalog: &Catalog) -> Result<Schedule, ScheduleError> {
    verify(path, catalog)?;

    let start = path
        .source
        .checked_scale(path.repetitions)
        .and_then(|scaled| scaled.checked_add(&path.catalyst))
        .map_err(ScheduleError::Internal)?;

    let mut pending = start;
    let mut remaining = path.steps.as_slice();
    let mut stages = Vec::new();

    while !remaining.is_empty() {
        let take = stage_prefix(&pending, remaining).map_err(ScheduleError::Internal)?;

        let recipes = remaining[..take].to_vec();
        let working = joined_inputs(&recipes).map_err(ScheduleError::Internal)?;
        let produced = joined_outputs(&recipes).map_err(ScheduleError::Internal)?;

        let reserved = pending
            .checked_sub(&working)
            .map_err(ScheduleError::Internal)?;
        let post = reserved
            .checked_add(&produced)
            .map_err(ScheduleError::Internal)?;

        remaining = &remaining[take..];

        let released = post.saturating_sub(&demand(remaining));

        stages.push(Stage {
            reserved,
            working,
            released,
            recipes,
        });

        pending = post;
    }

    Ok(Schedule { start, stages })
}

/// Length of the longest stageable prefix: inputs pairwise
/// token-disjoint and jointly contained in `pending`. At least one step
/// always qualifies on a verified path.
fn stage_prefix(pending: &Multiset, remaining: &[Recipe]) -> Result<usize, MultisetError> {
    let mut working = Multiset::new();
    let mut take = 0;

    for recipe in remaining {
        let inputs = recipe.inputs();

        if take > 0 && shares_token_kind(&working, inputs) {
            break;
        }

        let joint = working.checked_add(inputs)?;

        if !pending.contains(&joint) {
            break;
        }

        working = joint;
        take += 1;
    }

    Ok(take.max(1))
}

fn shares_token_kind(a: &Multiset, b: &Multiset) -> bool {
    let a = a.canonical_bytes();
    let b = b.canonical_bytes();

    (0..Token::COUNT).any(|i| a[i] > 0 && b[i] > 0)
}

fn joined_inputs(recipes: &[Recipe]) -> Result<Multiset, MultisetError> {
    recipes.iter().try_fold(Multiset::new(), |acc, recipe| {
        acc.checked_add(recipe.inputs())
    })
}

fn joined_outputs(recipes: &[Recipe]) -> Result<Multiset, MultisetError> {
    recipes.iter().try_fold(Multiset::new(), |acc, recipe| {
        acc.checked_add(recipe.outputs())
    })
}

/// Per-token demand of all remaining steps, clamped to the count range.
fn demand(remaining: &[Recipe]) -> Multiset {
    let mut totals = [0u16; Token::COUNT];

    for recipe in remaining {
        for (slot, count) in totals.iter_mut().zip(recipe.inputs().canonical_bytes()) {
            *slot += count as u16;
        }
    }

    let mut result = Multiset::new();

    for (i, total) in totals.into_iter().enumerate() {
        let token = Token::from_index(i).expect("demand totals are indexed by the alphabet");
        for _ in 0..total.min(u8::MAX as u16) {
            result
                .insert(token)
                .expect("clamped demand counts stay within the count range");
        }
    }

    result
}
