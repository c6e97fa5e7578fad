//! Catafold: a minimum-catalyst path solver for polarity-balanced
//! multiset rewriting.
//!
//! This crate implements a solver over a fixed eight-token alphabet,
//! providing:
//! - multiset algebra with canonical byte encodings and checked
//!   arithmetic;
//! - an immutable recipe catalog of polarity-preserving foldings and
//!   polarity-flipping inversions;
//! - a two-level search: an outer minimization over catalyst multisets
//!   of increasing size, and an inner bounded breadth-first search for
//!   all shortest rewrite sequences;
//! - a replay verifier and a stage scheduler turning flat paths into
//!   concurrently executable plans.
//!
//! A *catalyst* is a multiset injected into the start state and
//! recovered at the end; smaller catalysts are strictly preferred, and
//! among equal catalysts shorter paths win. For identical inputs the
//! solver produces byte-identical output, with or without worker
//! parallelism.
//!
//! # Example
//!
//! ```
//! use catafold::{solve, Catalog, Multiset, SolveOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let source: Multiset = "EP".parse()?;
//! let target: Multiset = "LX".parse()?;
//!
//! let solution = solve(source, target, &Catalog::standard(), &SolveOptions::default())?;
//!
//! assert_eq!(solution.catalyst_size(), 1);
//! assert_eq!(solution.path_length(), 2);
//! # Ok(())
//! # }
//! ```

pub mod catalyst;
pub mod fingerprint;
pub mod multiset;
pub mod path;
pub mod problem;
pub mod recipe;
pub mod schedule;
pub mod search;
pub mod solver;
pub mod token;
pub mod verify;

pub use crate::fingerprint::HashValue;
pub use crate::multiset::{Multiset, MultisetError, MultisetParseError};
pub use crate::path::{Path, PathParseError};
pub use crate::problem::{Problem, ProblemError};
pub use crate::recipe::{Catalog, Recipe, RecipeError, RecipeId, RecipeKind, RuleSet};
pub use crate::schedule::{schedule, Schedule, ScheduleError, Stage};
pub use crate::search::{CancelToken, Cap, SearchLimits};
pub use crate::solver::{solve, Solution, SolveError, SolveOptions};
pub use crate::token::{Polarity, Token};
pub use crate::verify::{verify, VerifyError};

/// Prelude for convenient usage.
pub mod prelude {
    pub use crate::fingerprint::HashValue;
    pub use crate::multiset::{Multiset, MultisetError};
    pub use crate::path::Path;
    pub use crate::problem::Problem;
    pub use crate::recipe::{Catalog, Recipe, RecipeId, RecipeKind, RuleSet};
    pub use crate::schedule::{schedule, Schedule, Stage};
    pub use crate::search::{CancelToken, SearchLimits};
    pub use crate::solver::{solve, Solution, SolveOptions};
    pub use crate::token::{Polarity, Token};
    pub use crate::verify::verify;
}
