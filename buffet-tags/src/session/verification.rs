//! Verification and edit loop
//!
//! The user reviews every resolved item before generation and may replace an
//! item's allergens. Edits only change the session's snapshot; the catalog is
//! never written from here.

use crate::validation::ValidationError;
use buffet_common::{AllergenSet, FoodItem};

/// Words that finish the review, any case
pub const FINALIZE_WORDS: [&str; 4] = ["ok", "generate", "yes", "done"];

const EDIT_KEYWORD: &str = "change";
const EDIT_USAGE: &str = "Usage: change <number> <allergens>";
/// Command reminder shown with the review list
pub const REVIEW_HINT: &str = "Type 'ok' to generate or 'change <n> <allergens>' to edit.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationCommand {
    Finalize,
    Edit { position: usize, allergens: String },
}

/// Parse a review command
pub fn parse_command(input: &str) -> Result<VerificationCommand, ValidationError> {
    let text = input.trim();
    let lower = text.to_lowercase();

    if FINALIZE_WORDS.contains(&lower.as_str()) {
        return Ok(VerificationCommand::Finalize);
    }

    let mut parts = text.splitn(3, char::is_whitespace);
    let is_edit = parts
        .next()
        .map(|word| word.eq_ignore_ascii_case(EDIT_KEYWORD))
        .unwrap_or(false);
    if !is_edit {
        return Err(ValidationError::Malformed {
            usage: format!("Unknown command. {}", REVIEW_HINT),
        });
    }

    let malformed = || ValidationError::Malformed {
        usage: EDIT_USAGE.to_string(),
    };
    let number = parts.next().filter(|p| !p.is_empty()).ok_or_else(malformed)?;
    let allergens = parts.next().map(str::trim).ok_or_else(malformed)?;
    let position = number.parse::<usize>().map_err(|_| malformed())?;

    Ok(VerificationCommand::Edit {
        position,
        allergens: allergens.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutput {
    /// Generate from the snapshot and end the session
    Finalize,
    Edited { position: usize, item: FoodItem },
    Rejected(ValidationError),
}

/// Snapshot under review
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationState {
    items: Vec<FoodItem>,
}

impl VerificationState {
    pub fn new(items: Vec<FoodItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[FoodItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<FoodItem> {
        self.items
    }

    pub fn transition(mut self, input: &str) -> (VerificationState, VerificationOutput) {
        let command = match parse_command(input) {
            Ok(command) => command,
            Err(err) => return (self, VerificationOutput::Rejected(err)),
        };

        match command {
            VerificationCommand::Finalize => (self, VerificationOutput::Finalize),
            VerificationCommand::Edit {
                position,
                allergens,
            } => {
                let len = self.items.len();
                if position == 0 || position > len {
                    return (
                        self,
                        VerificationOutput::Rejected(ValidationError::InvalidPosition {
                            position,
                            len,
                        }),
                    );
                }

                match AllergenSet::parse_input(&allergens) {
                    Ok(set) => {
                        let item = &mut self.items[position - 1];
                        item.allergens = set;
                        let item = item.clone();
                        (self, VerificationOutput::Edited { position, item })
                    }
                    Err(invalid) => (
                        self,
                        VerificationOutput::Rejected(ValidationError::InvalidAllergens { invalid }),
                    ),
                }
            }
        }
    }
}

/// `N. NAME [Allergen, Allergen]`, one line per item
pub fn render_items(items: &[FoodItem]) -> Vec<String> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {} [{}]", i + 1, item.name, item.allergens))
        .collect()
}
