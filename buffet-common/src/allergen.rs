//! Allergen vocabulary
//!
//! The fourteen allergen labels recognised by every entry point. Input
//! matching is case-insensitive; the canonical spelling is the variant name.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Single member of the fixed allergen vocabulary
///
/// Declaration order is the vocabulary order and drives `Ord`, so sets
/// always list their members in the same sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Allergen {
    Celery,
    Gluten,
    Crustaceans,
    Eggs,
    Fish,
    Lupin,
    Milk,
    Molluscs,
    Mustard,
    Nuts,
    Peanuts,
    Sesame,
    Soy,
    Sulphite,
}

impl Allergen {
    /// Every allergen in vocabulary order
    pub const ALL: [Allergen; 14] = [
        Allergen::Celery,
        Allergen::Gluten,
        Allergen::Crustaceans,
        Allergen::Eggs,
        Allergen::Fish,
        Allergen::Lupin,
        Allergen::Milk,
        Allergen::Molluscs,
        Allergen::Mustard,
        Allergen::Nuts,
        Allergen::Peanuts,
        Allergen::Sesame,
        Allergen::Soy,
        Allergen::Sulphite,
    ];

    /// Canonical label
    pub fn label(&self) -> &'static str {
        match self {
            Allergen::Celery => "Celery",
            Allergen::Gluten => "Gluten",
            Allergen::Crustaceans => "Crustaceans",
            Allergen::Eggs => "Eggs",
            Allergen::Fish => "Fish",
            Allergen::Lupin => "Lupin",
            Allergen::Milk => "Milk",
            Allergen::Molluscs => "Molluscs",
            Allergen::Mustard => "Mustard",
            Allergen::Nuts => "Nuts",
            Allergen::Peanuts => "Peanuts",
            Allergen::Sesame => "Sesame",
            Allergen::Soy => "Soy",
            Allergen::Sulphite => "Sulphite",
        }
    }

    /// Comma-separated list of every canonical label, for usage hints
    pub fn vocabulary() -> String {
        Self::ALL
            .iter()
            .map(Allergen::label)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Allergen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Allergen {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|a| a.label().eq_ignore_ascii_case(token))
            .ok_or_else(|| token.to_string())
    }
}

/// Set of allergens
///
/// Membership is what matters; iteration and serialization follow
/// vocabulary order regardless of input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllergenSet(BTreeSet<Allergen>);

impl AllergenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate free-text user input, all or nothing
    ///
    /// Blank input or `none` (any case) is the empty set. Otherwise the text
    /// is split on commas and every non-empty token must name a vocabulary
    /// member. On failure the offending tokens are returned as typed.
    pub fn parse_input(text: &str) -> Result<Self, Vec<String>> {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
            return Ok(Self::new());
        }

        let tokens: Vec<&str> = trimmed
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();
        Self::from_tokens(&tokens)
    }

    /// Validate an already split token list, all or nothing
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Self, Vec<String>> {
        let mut set = BTreeSet::new();
        let mut invalid = Vec::new();

        for token in tokens {
            match token.as_ref().parse::<Allergen>() {
                Ok(allergen) => {
                    set.insert(allergen);
                }
                Err(bad) => invalid.push(bad),
            }
        }

        if invalid.is_empty() {
            Ok(Self(set))
        } else {
            Err(invalid)
        }
    }

    /// Read the stored comma-joined form leniently
    ///
    /// Tokens outside the vocabulary can only come from rows written by
    /// older tooling; they are dropped with a warning.
    pub fn from_stored(text: &str) -> Self {
        let mut set = BTreeSet::new();
        for token in text.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match token.parse::<Allergen>() {
                Ok(allergen) => {
                    set.insert(allergen);
                }
                Err(bad) => warn!(token = %bad, "Ignoring unknown allergen in catalog row"),
            }
        }
        Self(set)
    }

    /// Comma-joined form written to the catalog (`"Milk,Nuts"`, or `""`)
    pub fn to_stored(&self) -> String {
        self.labels().join(",")
    }

    /// Canonical labels in vocabulary order
    pub fn labels(&self) -> Vec<&'static str> {
        self.0.iter().map(Allergen::label).collect()
    }

    pub fn insert(&mut self, allergen: Allergen) -> bool {
        self.0.insert(allergen)
    }

    pub fn contains(&self, allergen: Allergen) -> bool {
        self.0.contains(&allergen)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Allergen> + '_ {
        self.0.iter().copied()
    }
}

impl fmt::Display for AllergenSet {
    /// `Milk, Nuts`, or `None` for the empty set
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("None")
        } else {
            f.write_str(&self.labels().join(", "))
        }
    }
}

impl FromIterator<Allergen> for AllergenSet {
    fn from_iter<I: IntoIterator<Item = Allergen>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("milk".parse::<Allergen>(), Ok(Allergen::Milk));
        assert_eq!("  SULPHITE ".parse::<Allergen>(), Ok(Allergen::Sulphite));
        assert_eq!("Soya".parse::<Allergen>(), Err("Soya".to_string()));
    }

    #[test]
    fn test_vocabulary_has_fourteen_distinct_labels() {
        let labels: BTreeSet<&str> = Allergen::ALL.iter().map(Allergen::label).collect();
        assert_eq!(labels.len(), 14);
    }

    #[test]
    fn test_parse_input_canonicalizes() {
        let set = AllergenSet::parse_input("soy, GLUTEN ,milk").unwrap();
        assert_eq!(set.labels(), vec!["Gluten", "Milk", "Soy"]);
    }

    #[test]
    fn test_parse_input_none_and_blank_are_empty() {
        assert!(AllergenSet::parse_input("None").unwrap().is_empty());
        assert!(AllergenSet::parse_input("   ").unwrap().is_empty());
        assert!(AllergenSet::parse_input(" , ,").unwrap().is_empty());
    }

    #[test]
    fn test_parse_input_rejects_whole_step() {
        let err = AllergenSet::parse_input("Milk, Peanut, Soya, Fish").unwrap_err();
        assert_eq!(err, vec!["Peanut".to_string(), "Soya".to_string()]);
    }

    #[test]
    fn test_validation_is_idempotent() {
        let canonical = "Celery, Eggs, Sesame";
        let first = AllergenSet::parse_input(canonical).unwrap();
        assert_eq!(first.to_string(), canonical);

        let second = AllergenSet::parse_input(&first.to_string()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_set_equality_ignores_order() {
        let a = AllergenSet::parse_input("Nuts, Milk").unwrap();
        let b = AllergenSet::parse_input("Milk, Nuts, milk").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_stored_form() {
        let set: AllergenSet = [Allergen::Nuts, Allergen::Milk].into_iter().collect();
        assert_eq!(set.to_stored(), "Milk,Nuts");
        assert_eq!(AllergenSet::from_stored("Milk,Nuts"), set);
        assert_eq!(AllergenSet::new().to_stored(), "");
    }

    #[test]
    fn test_from_stored_drops_unknown_tokens() {
        let set = AllergenSet::from_stored("fish, Sesame seeds,EGGS");
        assert_eq!(set.labels(), vec!["Eggs", "Fish"]);
    }

    #[test]
    fn test_display_empty_is_none() {
        assert_eq!(AllergenSet::new().to_string(), "None");
    }
}
