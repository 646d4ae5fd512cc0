//! Recoverable input errors
//!
//! These never end a session. They travel inside replies so the front end
//! can re-prompt with the offending input named; only the rejected input is
//! lost.

use buffet_common::Allergen;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("\"{input}\" is not a valid number of calories. Please enter a whole number.")]
    InvalidCalories { input: String },

    #[error(
        "Invalid allergen(s): {}. Valid options are: {}",
        .invalid.join(", "),
        Allergen::vocabulary()
    )]
    InvalidAllergens { invalid: Vec<String> },

    #[error("Invalid item number {position}. Choose a number from 1 to {len}.")]
    InvalidPosition { position: usize, len: usize },

    #[error("{usage}")]
    Malformed { usage: String },

    #[error("Invalid file type \"{file_name}\". Please upload .xlsx")]
    WrongUploadType { file_name: String },
}

impl From<ValidationError> for buffet_common::Error {
    fn from(err: ValidationError) -> Self {
        buffet_common::Error::InvalidInput(err.to_string())
    }
}

/// Parse a calorie answer: a non-negative whole number, nothing else
pub fn parse_calories(input: &str) -> Result<u32, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidCalories {
            input: trimmed.to_string(),
        });
    }

    trimmed.parse::<u32>().map_err(|_| ValidationError::InvalidCalories {
        input: trimmed.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_calories_accepts_digits() {
        assert_eq!(parse_calories("0"), Ok(0));
        assert_eq!(parse_calories(" 250 "), Ok(250));
    }

    #[test]
    fn test_parse_calories_rejects_everything_else() {
        for bad in ["", "-5", "+5", "12.5", "abc", "1 2", "99999999999"] {
            assert!(parse_calories(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_invalid_allergens_message_names_tokens() {
        let err = ValidationError::InvalidAllergens {
            invalid: vec!["Soya".into(), "Peanut".into()],
        };
        let message = err.to_string();
        assert!(message.contains("Soya, Peanut"));
        assert!(message.contains("Celery"));
    }
}
