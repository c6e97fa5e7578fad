//! Transformation paths and their canonical text format.
//!
//! A [`Path`] records one solution of a solve: the source and target
//! multisets, the repetition factor, the catalyst augmentation, and the
//! ordered recipe steps. The text format is stable and round-trips:
//!
//! ```text
//! <SOURCE> -> <TARGET> [xN] [+ <CATALYST>] => <step> [| <step>]*
//! ```
//!
//! where each `<step>` is one or more `//`-separated recipes. Parsing
//! flattens a multi-recipe step in place: recipes grouped into a stage
//! are concurrent, so any linearization replays identically.

use crate::multiset::{Multiset, MultisetParseError};
use crate::recipe::{Recipe, RecipeParseError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str;

/// An ordered recipe sequence transforming `n·source + catalyst` into
/// `n·target + catalyst`.
///
/// The value itself is plain data; validity is established by
/// [`crate::verify::verify`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Path {
    /// Source multiset (per repetition).
    pub source: Multiset,
    /// Target multiset (per repetition).
    pub target: Multiset,
    /// Number of source → target conversions batched into the path.
    pub repetitions: u8,
    /// Catalyst injected into the start state and recovered at the end.
    pub catalyst: Multiset,
    /// Recipe applications, in order.
    pub steps: Vec<Recipe>,
}

impl Path {
    /// Creates a catalyst-free single-repetition path.
    pub fn direct(source: Multiset, target: Multiset, steps: Vec<Recipe>) -> Self {
        Self {
            source,
            target,
            repetitions: 1,
            catalyst: Multiset::new(),
            steps,
        }
    }

    /// Number of steps.
    #[inline]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the path performs no rewrite at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The ordering key paths are ranked and emitted by: step count,
    /// then catalyst canonical bytes, then canonical text.
    pub fn sort_key(&self) -> (usize, [u8; 8], String) {
        (
            self.steps.len(),
            self.catalyst.canonical_bytes(),
            self.to_string(),
        )
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)?;

        if self.repetitions > 1 {
            write!(f, " x{}", self.repetitions)?;
        }

        if !self.catalyst.is_empty() {
            write!(f, " + {}", self.catalyst)?;
        }

        write!(f, " =>")?;

        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                write!(f, " |")?;
            }
            write!(f, " {step}")?;
        }

        Ok(())
    }
}

/// Error produced when parsing a path from text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathParseError {
    /// The `=>` separator between header and steps is missing.
    MissingSteps,
    /// The `->` separator between source and target is missing.
    MissingArrow,
    /// The repetition factor is not a positive integer.
    BadRepetitions,
    /// A multiset in the header is malformed.
    Multiset(MultisetParseError),
    /// A recipe in the step list is malformed.
    Recipe(RecipeParseError),
}

impl fmt::Display for PathParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSteps => write!(f, "path is missing the `=>` separator"),
            Self::MissingArrow => write!(f, "path header is missing the `->` separator"),
            Self::BadRepetitions => write!(f, "repetition factor must be an integer in 1..=255"),
            Self::Multiset(e) => write!(f, "{e}"),
            Self::Recipe(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for PathParseError {}

impl From<MultisetParseError> for PathParseError {
    fn from(value: MultisetParseError) -> Self {
        Self::Multiset(value)
    }
}

impl From<RecipeParseError> for PathParseError {
    fn from(value: RecipeParseError) -> Self {
        Self::Recipe(value)
    }
}

impl str::FromStr for Path {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (header, tail) = s.split_once("=>").ok_or(PathParseError::MissingSteps)?;

        let (source_text, rest) = header
            .split_once("->")
            .ok_or(PathParseError::MissingArrow)?;

        let source: Multiset = source_text.trim().parse()?;

        // The remainder of the header is `<TARGET> [xN] [+ <CATALYST>]`.
        let (rest, catalyst) = match rest.split_once('+') {
            Some((left, catalyst_text)) => (left, catalyst_text.trim().parse()?),
            None => (rest, Multiset::new()),
        };

        let (target_text, repetitions) = match rest.split_once('x') {
            Some((left, count_text)) => {
                let count: u8 = count_text
                    .trim()
                    .parse()
                    .map_err(|_| PathParseError::BadRepetitions)?;

                if count == 0 {
                    return Err(PathParseError::BadRepetitions);
                }

                (left, count)
            }
            None => (rest, 1),
        };

        let target: Multiset = target_text.trim().parse()?;

        let mut steps = Vec::new();

        for step_text in tail.split('|') {
            let step_text = step_text.trim();

            if step_text.is_empty() {
                continue;
            }

            // A stage of concurrent recipes flattens in place.
            for recipe_text in step_text.split("//") {
                steps.push(recipe_text.trim().parse::<Recipe>()?);
            }
        }

        Ok(Self {
            source,
            target,
            repetitions,
            catalyst,
            steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(s: &str) -> Multiset {
        s.parse().unwrap()
    }

    fn path(s: &str) -> Path {
        s.parse().unwrap()
    }

    /// Test the full header grammar parses and round-trips.
    #[test]
    fn parse_full_header() {
        let p = path("EP -> LX x2 + O => EO -> GL | GP -> OX");

        assert_eq!(p.source, ms("EP"));
        assert_eq!(p.target, ms("LX"));
        assert_eq!(p.repetitions, 2);
        assert_eq!(p.catalyst, ms("O"));
        assert_eq!(p.len(), 2);
        assert_eq!(p.to_string(), "EP -> LX x2 + O => EO -> GL | GP -> OX");
    }

    /// Test optional header parts default correctly.
    #[test]
    fn parse_minimal_header() {
        let p = path("EO -> GL => EO -> GL");

        assert_eq!(p.repetitions, 1);
        assert!(p.catalyst.is_empty());
        assert_eq!(p.to_string(), "EO -> GL => EO -> GL");
    }

    /// Test an empty step list parses to the empty path.
    #[test]
    fn parse_empty_steps() {
        let p = path("EL -> EL =>");

        assert!(p.is_empty());
        assert_eq!(p.to_string(), "EL -> EL =>");
    }

    /// Test concurrent `//` groups flatten in order.
    #[test]
    fn parse_flattens_stages() {
        let staged = path("EGOP -> GGLX + Z => EO -> GL // GP -> OX | XZ -> PT");
        let flat = path("EGOP -> GGLX + Z => EO -> GL | GP -> OX | XZ -> PT");

        assert_eq!(staged, flat);
    }

    /// Test bracket grouping inside recipes is accepted and ignored.
    #[test]
    fn parse_bracket_grouping() {
        let p = path("EP -> LX + O => [EO] -> [GL] | [GP] -> [OX]");
        assert_eq!(p.to_string(), "EP -> LX + O => EO -> GL | GP -> OX");
    }

    /// Test serialization is idempotent: parse, print, parse again.
    #[test]
    fn round_trip_idempotent() {
        let text = "LGZ -> LOT + P => GP -> OX | XZ -> PT";
        let once = path(text);
        let twice = path(&once.to_string());

        assert_eq!(once, twice);
        assert_eq!(once.to_string(), twice.to_string());
    }

    /// Test parse failures.
    #[test]
    fn parse_errors() {
        assert_eq!(
            "EP -> LX".parse::<Path>(),
            Err(PathParseError::MissingSteps)
        );
        assert_eq!(
            "EP LX => EO -> GL".parse::<Path>(),
            Err(PathParseError::MissingArrow)
        );
        assert_eq!(
            "EP -> LX x0 => EO -> GL".parse::<Path>(),
            Err(PathParseError::BadRepetitions)
        );
        assert!(matches!(
            "EP -> LQ => EO -> GL".parse::<Path>(),
            Err(PathParseError::Multiset(_))
        ));
        assert!(matches!(
            "EP -> LX => EO GL".parse::<Path>(),
            Err(PathParseError::Recipe(_))
        ));
    }

    /// Test path ordering: step count first, then catalyst, then text.
    #[test]
    fn sort_keys() {
        let short = path("EP -> LX + O => EO -> GL");
        let long = path("EP -> LX + G => EO -> GL | GP -> OX");
        assert!(short.sort_key() < long.sort_key());

        // Canonical catalyst bytes order {O} = [0,0,0,1,..] before
        // {G} = [0,1,..].
        let with_g = path("EP -> LX + G => GP -> OX | EO -> GL");
        let with_o = path("EP -> LX + O => EO -> GL | GP -> OX");
        assert!(with_o.sort_key() < with_g.sort_key());
    }
}
