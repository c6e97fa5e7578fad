//! The outer minimization: smallest catalyst first, then fewest steps.
//!
//! The solver drives the catalyst enumerator through the bounded path
//! searcher. The first candidate size that yields any path fixes the
//! catalyst-size floor; the remaining candidates of that size are still
//! searched, and the surviving paths are filtered to the global minimum
//! length. Candidates of one size are independent, so they may fan out
//! over a rayon worker pool; results are merged in candidate order and
//! sorted, making the output byte-identical regardless of worker count.

use crate::catalyst::CatalystEnumerator;
use crate::fingerprint::HashValue;
use crate::multiset::{Multiset, MultisetError};
use crate::path::Path;
use crate::problem::{Problem, ProblemError};
use crate::recipe::{Catalog, Recipe};
use crate::search::{CancelToken, Cap, SearchError, SearchLimits, SearchOutcome, Searcher};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Caps and toggles for one solve.
#[derive(Clone, Debug)]
pub struct SolveOptions {
    /// Largest catalyst size to enumerate.
    pub max_catalyst_size: u8,
    /// BFS depth cap per candidate; raised to the problem's length
    /// lower bound when smaller.
    pub max_depth: u32,
    /// BFS visited-state cap per candidate.
    pub max_nodes: usize,
    /// Number of source → target conversions batched into the problem.
    pub repetitions: u8,
    /// Whether to fan candidates out over the rayon pool.
    pub parallel: bool,
    /// Cooperative cancellation flag, polled between BFS levels.
    pub cancel: CancelToken,
}

impl Default for SolveOptions {
    fn default() -> Self {
        let limits = SearchLimits::default();

        Self {
            max_catalyst_size: 8,
            max_depth: limits.max_depth,
            max_nodes: limits.max_nodes,
            repetitions: 1,
            parallel: false,
            cancel: CancelToken::new(),
        }
    }
}

/// Failure of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveError {
    /// The problem inputs were rejected.
    Problem(ProblemError),
    /// Exhaustive enumeration within the caps found nothing; raising
    /// `max_catalyst_size` may help.
    NoSolution,
    /// At least one search tripped a cap and no path was found; raising
    /// the named cap may help.
    Truncated(Cap),
    /// Cancellation was requested.
    Cancelled,
    /// A multiset operation failed on a non-user-triggered code path.
    Internal(MultisetError),
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Problem(e) => write!(f, "{e}"),
            Self::NoSolution => write!(f, "no path exists within the configured caps"),
            Self::Truncated(cap) => write!(f, "search truncated by the {cap} cap"),
            Self::Cancelled => write!(f, "solve cancelled"),
            Self::Internal(e) => write!(f, "internal solver invariant violated: {e}"),
        }
    }
}

impl std::error::Error for SolveError {}

impl From<ProblemError> for SolveError {
    fn from(value: ProblemError) -> Self {
        Self::Problem(value)
    }
}

/// The catalyst-minimal, then step-minimal set of paths for one problem.
///
/// All contained paths share the same catalyst size and the same length
/// and are sorted by (catalyst canonical bytes, canonical text).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    catalyst_size: usize,
    path_length: usize,
    paths: Vec<Path>,
}

impl Solution {
    /// Total size of the catalyst shared by every path.
    #[inline]
    pub const fn catalyst_size(&self) -> usize {
        self.catalyst_size
    }

    /// Step count shared by every path.
    #[inline]
    pub const fn path_length(&self) -> usize {
        self.path_length
    }

    /// The paths, in canonical order.
    #[inline]
    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    /// Deterministic fingerprint of the canonical text of the solution.
    ///
    /// Two solves of equal inputs produce equal fingerprints, whatever
    /// the worker scheduling.
    pub fn fingerprint(&self) -> HashValue {
        let mut text = String::new();

        for path in &self.paths {
            text.push_str(&path.to_string());
            text.push('\n');
        }

        HashValue::hash_with_domain(b"SOLUTION", text.as_bytes())
    }

    /// Serializes the solution to CBOR bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_cbor::Error> {
        serde_cbor::to_vec(self)
    }

    /// Deserializes a solution from CBOR bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_cbor::Error> {
        serde_cbor::from_slice(bytes)
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for path in &self.paths {
            writeln!(f, "{path}")?;
        }

        Ok(())
    }
}

/// Solves for the catalyst-minimal, step-minimal paths from `source` to
/// `target` under `catalog`.
pub fn solve(
    source: Multiset,
    target: Multiset,
    catalog: &Catalog,
    options: &SolveOptions,
) -> Result<Solution, SolveError> {
    let problem = Problem::new(source, target, catalog.clone(), options.repetitions)?;

    solve_problem(&problem, options)
}

/// Solves an already-validated problem.
pub fn solve_problem(problem: &Problem, options: &SolveOptions) -> Result<Solution, SolveError> {
    // Nothing to rewrite: one empty path, empty catalyst.
    if problem.scaled_source() == problem.scaled_target() {
        return Ok(Solution {
            catalyst_size: 0,
            path_length: 0,
            paths: vec![Path {
                source: *problem.source(),
                target: *problem.target(),
                repetitions: problem.repetitions(),
                catalyst: Multiset::new(),
                steps: Vec::new(),
            }],
        });
    }

    // Catalysts augment both ends equally: neither the polarity delta
    // nor the size imbalance can be repaired by any candidate.
    if !problem.has_balanced_polarity() || !problem.has_balanced_sizes() {
        return Err(SolveError::NoSolution);
    }

    // A depth cap below the admissible length lower bound could never
    // see a path; raise it to the first depth a solution can exist at.
    let limits = SearchLimits {
        max_depth: options.max_depth.max(problem.length_lower_bound()),
        max_nodes: options.max_nodes,
    };

    let mut stream = CatalystEnumerator::new(problem, options.max_catalyst_size).peekable();
    let mut first_trip: Option<Cap> = None;

    while let Some(candidate) = stream.peek() {
        let size = candidate.len();

        let mut batch = Vec::new();
        while let Some(candidate) = stream.next_if(|c| c.len() == size) {
            batch.push(candidate);
        }

        if options.cancel.is_cancelled() {
            return Err(SolveError::Cancelled);
        }

        let outcomes = search_batch(problem, &batch, limits, options);

        let mut found: Vec<(Multiset, Vec<Vec<Recipe>>)> = Vec::new();

        for (catalyst, outcome) in batch.into_iter().zip(outcomes) {
            match outcome {
                Ok(SearchOutcome::Found(paths)) if !paths.is_empty() => {
                    found.push((catalyst, paths));
                }
                Ok(SearchOutcome::Found(_)) | Ok(SearchOutcome::NoPath) => {}
                Err(SearchError::Truncated(cap)) => {
                    first_trip.get_or_insert(cap);
                }
                Err(SearchError::Cancelled) => return Err(SolveError::Cancelled),
                Err(SearchError::Internal(e)) => return Err(SolveError::Internal(e)),
            }
        }

        if !found.is_empty() {
            return Ok(assemble(problem, size, found));
        }
    }

    match first_trip {
        Some(cap) => Err(SolveError::Truncated(cap)),
        None => Err(SolveError::NoSolution),
    }
}

/// Searches every candidate of one size, optionally on the rayon pool.
///
/// The output is index-aligned with `batch`, so merging is independent
/// of scheduling.
fn search_batch(
    problem: &Problem,
    batch: &[Multiset],
    limits: SearchLimits,
    options: &SolveOptions,
) -> Vec<Result<SearchOutcome, SearchError>> {
    let run = |catalyst: &Multiset| -> Result<SearchOutcome, SearchError> {
        let start = problem
            .scaled_source()
            .checked_add(catalyst)
            .map_err(SearchError::Internal)?;
        let goal = problem
            .scaled_target()
            .checked_add(catalyst)
            .map_err(SearchError::Internal)?;

        Searcher::new(problem.catalog(), limits, options.cancel.clone()).run(start, goal)
    };

    if options.parallel {
        batch.par_iter().map(run).collect()
    } else {
        batch.iter().map(run).collect()
    }
}

/// Filters the found paths to the global minimum length and packages the
/// result in canonical order.
fn assemble(
    problem: &Problem,
    catalyst_size: usize,
    found: Vec<(Multiset, Vec<Vec<Recipe>>)>,
) -> Solution {
    let path_length = found
        .iter()
        .flat_map(|(_, paths)| paths.iter().map(Vec::len))
        .min()
        .unwrap_or(0);

    let mut paths: Vec<Path> = found
        .into_iter()
        .flat_map(|(catalyst, sequences)| {
            sequences
                .into_iter()
                .filter(|steps| steps.len() == path_length)
                .map(move |steps| Path {
                    source: *problem.source(),
                    target: *problem.target(),
                    repetitions: problem.repetitions(),
                    catalyst,
                    steps,
                })
        })
        .collect();

    paths.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    Solution {
        catalyst_size,
        path_length,
        paths,
    }
}
