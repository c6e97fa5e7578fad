//! Bounded breadth-first search for all shortest rewrite sequences.
//!
//! For one `(start, goal)` pair of multiset states, the searcher explores
//! the rewrite graph level by level, recording every predecessor edge of
//! every newly discovered state, and stops at the first level containing
//! the goal. Walking the predecessor edges back to the start then yields
//! the complete set of shortest sequences.
//!
//! Sequences that differ only by swapping adjacent independent steps are
//! one logical path; the searcher keeps the representative whose
//! independent neighbours appear in rule order and discards the rest.
//!
//! # References
//! - Level-synchronous BFS: Moore, "The shortest path through a maze"
//!   (1959)
//! - Equivalence of schedules up to commuting independent steps:
//!   Mazurkiewicz, "Trace theory" (1987)

use crate::multiset::{Multiset, MultisetError};
use crate::recipe::{Recipe, RecipeId, RuleSet};
use crate::token::Token;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag, shared between a caller and any number
/// of search workers. Cloning shares the flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Searches observe the flag between levels.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Which termination cap tripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cap {
    /// The level count exceeded `max_depth`.
    Depth,
    /// The visited-state count exceeded `max_nodes`.
    Nodes,
}

impl fmt::Display for Cap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Depth => write!(f, "depth"),
            Self::Nodes => write!(f, "nodes"),
        }
    }
}

/// Caps bounding one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    /// Maximum number of BFS levels to expand.
    pub max_depth: u32,
    /// Maximum number of distinct states to retain.
    pub max_nodes: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_depth: 10,
            max_nodes: 1 << 20,
        }
    }
}

/// Failure of one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchError {
    /// A cap tripped before the search completed.
    Truncated(Cap),
    /// Cancellation was requested.
    Cancelled,
    /// Multiset arithmetic failed mid-search; this is a bug, not a
    /// property of the inputs.
    Internal(MultisetError),
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated(cap) => write!(f, "search truncated by the {cap} cap"),
            Self::Cancelled => write!(f, "search cancelled"),
            Self::Internal(e) => write!(f, "internal search invariant violated: {e}"),
        }
    }
}

impl std::error::Error for SearchError {}

/// Successful completion of one search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Every shortest rewrite sequence, one per equivalence class, in
    /// deterministic order.
    Found(Vec<Vec<Recipe>>),
    /// The reachable state space was exhausted without meeting the goal.
    NoPath,
}

/// One predecessor edge of a discovered state.
type Edge = (Multiset, Recipe, RecipeId);

/// Bounded all-shortest-paths searcher over one rule set.
#[derive(Debug, Clone)]
pub struct Searcher<'a, R> {
    rules: &'a R,
    limits: SearchLimits,
    cancel: CancelToken,
}

impl<'a, R> Searcher<'a, R>
where
    R: RuleSet,
{
    /// Creates a searcher over `rules` with the given caps and flag.
    pub fn new(rules: &'a R, limits: SearchLimits, cancel: CancelToken) -> Self {
        Self {
            rules,
            limits,
            cancel,
        }
    }

    /// Runs the search from `start` to `goal`.
    pub fn run(&self, start: Multiset, goal: Multiset) -> Result<SearchOutcome, SearchError> {
        if start == goal {
            return Ok(SearchOutcome::Found(vec![Vec::new()]));
        }

        let mut depth_of: HashMap<Multiset, u32> = HashMap::from([(start, 0)]);
        let mut preds: HashMap<Multiset, Vec<Edge>> = HashMap::new();
        let mut frontier = vec![start];

        for depth in 1..=self.limits.max_depth {
            if self.cancel.is_cancelled() {
                return Err(SearchError::Cancelled);
            }

            // BTreeMap keeps the next frontier sorted by canonical bytes,
            // which keeps edge ordering independent of hash iteration.
            let mut next: BTreeMap<Multiset, Vec<Edge>> = BTreeMap::new();

            for state in &frontier {
                for (id, recipe) in self.rules.applicable_recipes(state) {
                    let successor = self
                        .rules
                        .apply(recipe, state)
                        .map_err(SearchError::Internal)?;

                    if depth_of.contains_key(&successor) {
                        continue;
                    }

                    next.entry(successor).or_default().push((*state, *recipe, id));
                }
            }

            if next.is_empty() {
                return Ok(SearchOutcome::NoPath);
            }

            if depth_of.len() + next.len() > self.limits.max_nodes {
                return Err(SearchError::Truncated(Cap::Nodes));
            }

            let reached_goal = next.contains_key(&goal);

            frontier = next.keys().copied().collect();

            for (successor, edges) in next {
                depth_of.insert(successor, depth);
                preds.insert(successor, edges);
            }

            if reached_goal {
                return self.reconstruct(start, goal, &preds);
            }
        }

        Err(SearchError::Truncated(Cap::Depth))
    }

    /// Walks the predecessor edges backward from the goal, emitting every
    /// distinct edge sequence, then keeps one canonical representative
    /// per equivalence class.
    fn reconstruct(
        &self,
        start: Multiset,
        goal: Multiset,
        preds: &HashMap<Multiset, Vec<Edge>>,
    ) -> Result<SearchOutcome, SearchError> {
        let mut sequences: Vec<Vec<(Recipe, RecipeId)>> = Vec::new();
        let mut suffix: Vec<(Recipe, RecipeId)> = Vec::new();

        Self::walk(goal, start, preds, &mut suffix, &mut sequences);

        sequences.sort_by(|a, b| {
            let ids = |s: &[(Recipe, RecipeId)]| s.iter().map(|(_, id)| *id).collect::<Vec<_>>();
            ids(a).cmp(&ids(b))
        });

        let mut paths = Vec::new();

        for sequence in sequences {
            if self.is_canonical(start, &sequence)? {
                paths.push(sequence.into_iter().map(|(recipe, _)| recipe).collect());
            }
        }

        Ok(SearchOutcome::Found(paths))
    }

    fn walk(
        state: Multiset,
        start: Multiset,
        preds: &HashMap<Multiset, Vec<Edge>>,
        suffix: &mut Vec<(Recipe, RecipeId)>,
        out: &mut Vec<Vec<(Recipe, RecipeId)>>,
    ) {
        let Some(edges) = preds.get(&state) else {
            // Only the start state has no predecessors.
            debug_assert_eq!(state, start);

            out.push(suffix.iter().rev().copied().collect());
            return;
        };

        for (previous, recipe, id) in edges {
            suffix.push((*recipe, *id));
            Self::walk(*previous, start, preds, suffix, out);
            suffix.pop();
        }
    }

    /// A sequence is canonical when every adjacent pair of steps that is
    /// independent at its position appears in rule order. For each
    /// equivalence class of sequences under such swaps, exactly one
    /// member is canonical; dependent neighbours are never reordered, so
    /// genuinely distinct orderings all survive.
    fn is_canonical(
        &self,
        start: Multiset,
        steps: &[(Recipe, RecipeId)],
    ) -> Result<bool, SearchError> {
        let mut state = start;

        for (i, (recipe, id)) in steps.iter().enumerate() {
            if let Some((follower, follower_id)) = steps.get(i + 1) {
                if follower_id < id && jointly_contained(&state, recipe, follower) {
                    return Ok(false);
                }
            }

            state = self
                .rules
                .apply(recipe, &state)
                .map_err(SearchError::Internal)?;
        }

        Ok(true)
    }
}

/// Whether `state` can feed both recipes at once, which makes the two
/// steps order-independent.
fn jointly_contained(state: &Multiset, first: &Recipe, second: &Recipe) -> bool {
    let state = state.canonical_bytes();
    let a = first.inputs().canonical_bytes();
    let b = second.inputs().canonical_bytes();

    (0..Token::COUNT).all(|i| state[i] as u16 >= a[i] as u16 + b[i] as u16)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::Catalog;

    fn ms(s: &str) -> Multiset {
        s.parse().unwrap()
    }

    fn run(start: &str, goal: &str) -> Result<SearchOutcome, SearchError> {
        let catalog = Catalog::standard();
        Searcher::new(&catalog, SearchLimits::default(), CancelToken::new())
            .run(ms(start), ms(goal))
    }

    fn texts(outcome: SearchOutcome) -> Vec<Vec<String>> {
        match outcome {
            SearchOutcome::Found(paths) => paths
                .into_iter()
                .map(|p| p.into_iter().map(|r| r.to_string()).collect())
                .collect(),
            SearchOutcome::NoPath => panic!("expected paths"),
        }
    }

    /// Test the zero-step case.
    #[test]
    fn trivial_goal() {
        assert_eq!(
            run("EG", "EG").unwrap(),
            SearchOutcome::Found(vec![Vec::new()])
        );
    }

    /// Test a forced two-step chain: EP plus catalyst O.
    #[test]
    fn forced_chain() {
        let paths = texts(run("EOP", "LOX").unwrap());

        assert_eq!(paths, vec![vec!["EO -> GL", "GP -> OX"]]);
    }

    /// Test the mirrored chain with catalyst G keeps its own order: the
    /// steps are dependent, so no canonicalization interferes.
    #[test]
    fn forced_chain_dependent_order() {
        let paths = texts(run("EGP", "GLX").unwrap());

        assert_eq!(paths, vec![vec!["GP -> OX", "EO -> GL"]]);
    }

    /// Test independent steps collapse to one canonical ordering.
    #[test]
    fn equivalence_folding() {
        // EO -> GL and XZ -> PT touch disjoint tokens of EOXZ; both
        // orders reach GLPT, and exactly one representative survives,
        // with the rule-order-smaller step first.
        let paths = texts(run("EOXZ", "GLPT").unwrap());

        assert_eq!(paths, vec![vec!["XZ -> PT", "EO -> GL"]]);
    }

    /// Test exhaustion reports no path.
    #[test]
    fn no_path() {
        // EP holds no positive token: nothing is applicable.
        assert_eq!(run("EP", "LX").unwrap(), SearchOutcome::NoPath);
    }

    /// Test the depth cap trips as truncation.
    #[test]
    fn depth_cap() {
        let catalog = Catalog::standard();
        let limits = SearchLimits {
            max_depth: 1,
            ..SearchLimits::default()
        };
        let searcher = Searcher::new(&catalog, limits, CancelToken::new());

        assert_eq!(
            searcher.run(ms("EOP"), ms("LOX")),
            Err(SearchError::Truncated(Cap::Depth))
        );
    }

    /// Test the node cap trips as truncation.
    #[test]
    fn node_cap() {
        let catalog = Catalog::standard();
        let limits = SearchLimits {
            max_nodes: 1,
            ..SearchLimits::default()
        };
        let searcher = Searcher::new(&catalog, limits, CancelToken::new());

        assert_eq!(
            searcher.run(ms("EOP"), ms("LOX")),
            Err(SearchError::Truncated(Cap::Nodes))
        );
    }

    /// Test a pre-cancelled token aborts before any expansion.
    #[test]
    fn cancellation() {
        let catalog = Catalog::standard();
        let cancel = CancelToken::new();
        cancel.cancel();

        let searcher = Searcher::new(&catalog, SearchLimits::default(), cancel);

        assert_eq!(
            searcher.run(ms("EOP"), ms("LOX")),
            Err(SearchError::Cancelled)
        );
    }

    /// Test an inversion-only problem: the negative quartet flips in one
    /// step.
    #[test]
    fn inversion_only() {
        let paths = texts(run("ELPX", "GOTZ").unwrap());

        assert_eq!(paths, vec![vec!["ELPX -> GOTZ"]]);
    }
}
