//! Rewrite rules and the immutable rule catalog.
//!
//! A [`Recipe`] transforms one multiset into another of the same size.
//! Exactly two shapes exist:
//!
//! - *folding*: one negative and one positive token on each side; the
//!   polarity composition of the state is preserved;
//! - *inversion*: a complete polarity quartet on one side and the
//!   complete opposite quartet on the other; four tokens flip class.
//!
//! A [`Catalog`] is a sorted, deduplicated collection of recipes. Problem
//! flavours with restricted rule sets are distinct catalog values, not
//! subtypes; the search engine only sees the [`RuleSet`] seam.

use crate::multiset::{Multiset, MultisetError, MultisetParseError};
use crate::token::Token;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str;

/// The complete negative quartet {E, L, P, X}.
pub const NEGATIVE_QUARTET: Multiset =
    Multiset::from_tokens([Token::E, Token::L, Token::P, Token::X]);

/// The complete positive quartet {G, O, T, Z}.
pub const POSITIVE_QUARTET: Multiset =
    Multiset::from_tokens([Token::G, Token::O, Token::T, Token::Z]);

/// Shape of a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecipeKind {
    /// Polarity-preserving 2 → 2 rule.
    Folding,
    /// Polarity-flipping 4 → 4 rule.
    Inversion,
}

/// Error produced when a recipe fails shape validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeError {
    /// The token count differs between the two sides.
    LengthMismatch {
        /// Total tokens on the input side.
        inputs: usize,
        /// Total tokens on the output side.
        outputs: usize,
    },
    /// The sides match neither the folding nor the inversion shape.
    MalformedShape,
}

impl fmt::Display for RecipeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch { inputs, outputs } => {
                write!(f, "recipe does not conserve tokens: {inputs} in, {outputs} out")
            }
            Self::MalformedShape => write!(f, "recipe is neither a folding nor an inversion"),
        }
    }
}

impl std::error::Error for RecipeError {}

/// A validated rewrite rule.
///
/// Construction classifies the rule; the kind can never disagree with the
/// sides. Ordering follows (inputs, outputs) canonical bytes, which is
/// the recipe total order used for search canonicalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Recipe {
    inputs: Multiset,
    outputs: Multiset,
    kind: RecipeKind,
}

impl Recipe {
    /// Validates and classifies a rule.
    pub fn new(inputs: Multiset, outputs: Multiset) -> Result<Self, RecipeError> {
        if inputs.len() != outputs.len() {
            return Err(RecipeError::LengthMismatch {
                inputs: inputs.len(),
                outputs: outputs.len(),
            });
        }

        let kind = if Self::is_folding_side(&inputs) && Self::is_folding_side(&outputs) {
            RecipeKind::Folding
        } else if (inputs == NEGATIVE_QUARTET && outputs == POSITIVE_QUARTET)
            || (inputs == POSITIVE_QUARTET && outputs == NEGATIVE_QUARTET)
        {
            RecipeKind::Inversion
        } else {
            return Err(RecipeError::MalformedShape);
        };

        Ok(Self {
            inputs,
            outputs,
            kind,
        })
    }

    fn is_folding_side(side: &Multiset) -> bool {
        side.len() == 2 && side.polarity_counts() == (1, 1)
    }

    /// The consumed multiset.
    #[inline]
    pub const fn inputs(&self) -> &Multiset {
        &self.inputs
    }

    /// The produced multiset.
    #[inline]
    pub const fn outputs(&self) -> &Multiset {
        &self.outputs
    }

    /// The shape of the rule.
    #[inline]
    pub const fn kind(&self) -> RecipeKind {
        self.kind
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.inputs, self.outputs)
    }
}

/// Error produced when parsing a recipe from text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeParseError {
    /// The `->` separator is missing.
    MissingArrow,
    /// One side is not a valid multiset.
    Multiset(MultisetParseError),
    /// The sides do not form a valid recipe.
    Invalid(RecipeError),
}

impl fmt::Display for RecipeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingArrow => write!(f, "recipe is missing the `->` separator"),
            Self::Multiset(e) => write!(f, "{e}"),
            Self::Invalid(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for RecipeParseError {}

impl From<MultisetParseError> for RecipeParseError {
    fn from(value: MultisetParseError) -> Self {
        Self::Multiset(value)
    }
}

impl From<RecipeError> for RecipeParseError {
    fn from(value: RecipeError) -> Self {
        Self::Invalid(value)
    }
}

impl str::FromStr for Recipe {
    type Err = RecipeParseError;

    /// Parses `<inputs> -> <outputs>`.
    ///
    /// Grouping brackets `[`/`]` around either side are accepted and
    /// ignored; whitespace is flexible.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped: String = s.chars().filter(|c| *c != '[' && *c != ']').collect();

        let (left, right) = stripped
            .split_once("->")
            .ok_or(RecipeParseError::MissingArrow)?;

        let inputs: Multiset = left.trim().parse()?;
        let outputs: Multiset = right.trim().parse()?;

        Ok(Recipe::new(inputs, outputs)?)
    }
}

impl TryFrom<String> for Recipe {
    type Error = RecipeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Recipe> for String {
    fn from(value: Recipe) -> String {
        value.to_string()
    }
}

/// Index of a recipe inside its catalog.
///
/// Because catalogs are sorted, the index order coincides with the recipe
/// total order.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeId(pub u8);

impl RecipeId {
    /// Returns the index as a `usize`.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// The seam the search engine depends on: rule applicability and rule
/// application over multiset states.
pub trait RuleSet {
    /// Yields the recipes whose inputs are contained in `state`, in the
    /// recipe total order.
    fn applicable_recipes<'a>(
        &'a self,
        state: &'a Multiset,
    ) -> impl Iterator<Item = (RecipeId, &'a Recipe)> + 'a;

    /// Applies a recipe to a state.
    ///
    /// Fails with [`MultisetError::Underflow`] when the recipe inputs are
    /// not contained in the state.
    fn apply(&self, recipe: &Recipe, state: &Multiset) -> Result<Multiset, MultisetError> {
        state
            .checked_sub(recipe.inputs())?
            .checked_add(recipe.outputs())
    }
}

/// An immutable, sorted, deduplicated collection of recipes.
///
/// The sorted order doubles as the recipe total order, so serialization
/// funnels through [`Catalog::new`] to keep the invariant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Recipe>", into = "Vec<Recipe>")]
pub struct Catalog {
    recipes: Vec<Recipe>,
}

impl From<Vec<Recipe>> for Catalog {
    fn from(recipes: Vec<Recipe>) -> Self {
        Self::new(recipes)
    }
}

impl From<Catalog> for Vec<Recipe> {
    fn from(value: Catalog) -> Self {
        value.recipes
    }
}

impl Catalog {
    /// Builds a catalog from arbitrary recipes, sorting and deduplicating.
    pub fn new(mut recipes: Vec<Recipe>) -> Self {
        recipes.sort();
        recipes.dedup();

        Self { recipes }
    }

    /// The default ten-rule catalog: eight foldings and both inversions.
    pub fn standard() -> Self {
        type T = Token;

        let rules = [
            (
                Multiset::from_tokens([T::E, T::O]),
                Multiset::from_tokens([T::G, T::L]),
            ),
            (
                Multiset::from_tokens([T::E, T::T]),
                Multiset::from_tokens([T::O, T::P]),
            ),
            (
                Multiset::from_tokens([T::L, T::O]),
                Multiset::from_tokens([T::T, T::X]),
            ),
            (
                Multiset::from_tokens([T::L, T::T]),
                Multiset::from_tokens([T::E, T::Z]),
            ),
            (
                Multiset::from_tokens([T::G, T::P]),
                Multiset::from_tokens([T::O, T::X]),
            ),
            (
                Multiset::from_tokens([T::P, T::Z]),
                Multiset::from_tokens([T::E, T::G]),
            ),
            (
                Multiset::from_tokens([T::G, T::X]),
                Multiset::from_tokens([T::L, T::Z]),
            ),
            (
                Multiset::from_tokens([T::X, T::Z]),
                Multiset::from_tokens([T::P, T::T]),
            ),
            (NEGATIVE_QUARTET, POSITIVE_QUARTET),
            (POSITIVE_QUARTET, NEGATIVE_QUARTET),
        ];

        let recipes = rules
            .into_iter()
            .map(|(inputs, outputs)| {
                Recipe::new(inputs, outputs).expect("the standard rule table is well formed")
            })
            .collect();

        Self::new(recipes)
    }

    /// The recipes in total order.
    #[inline]
    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    /// Number of recipes.
    #[inline]
    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    /// Whether the catalog holds no recipes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Returns the recipe at `id`, if any.
    #[inline]
    pub fn get(&self, id: RecipeId) -> Option<&Recipe> {
        self.recipes.get(id.index())
    }

    /// Returns the id of `recipe` in this catalog, if present.
    pub fn position(&self, recipe: &Recipe) -> Option<RecipeId> {
        self.recipes
            .binary_search(recipe)
            .ok()
            .map(|i| RecipeId(i as u8))
    }

    /// Whether `recipe` is part of this catalog.
    pub fn contains(&self, recipe: &Recipe) -> bool {
        self.position(recipe).is_some()
    }

    /// Returns a copy of this catalog without the given recipe.
    ///
    /// Restricted problem flavours are built this way; the result is an
    /// ordinary catalog value.
    pub fn without(&self, recipe: &Recipe) -> Self {
        let recipes = self
            .recipes
            .iter()
            .filter(|r| *r != recipe)
            .copied()
            .collect();

        Self { recipes }
    }
}

impl RuleSet for Catalog {
    fn applicable_recipes<'a>(
        &'a self,
        state: &'a Multiset,
    ) -> impl Iterator<Item = (RecipeId, &'a Recipe)> + 'a {
        self.recipes
            .iter()
            .enumerate()
            .filter(move |(_, r)| state.contains(r.inputs()))
            .map(|(i, r)| (RecipeId(i as u8), r))
    }
}
