//! Missing-item collection state machine
//!
//! Walks the missing-name queue asking for calories, then allergens, for each
//! name. Transitions are pure; catalog writes are handed back to the caller
//! as [`CollectionOutput::Commit`].

use crate::validation::{parse_calories, ValidationError};
use buffet_common::{AllergenSet, FoodItem};

/// Missing names with a cursor at the one being collected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingQueue {
    names: Vec<String>,
    cursor: usize,
}

impl MissingQueue {
    pub fn new(names: Vec<String>) -> Self {
        Self { names, cursor: 0 }
    }

    pub fn current(&self) -> Option<&str> {
        self.names.get(self.cursor).map(String::as_str)
    }

    /// 1-based position of the current name
    pub fn position(&self) -> usize {
        self.cursor + 1
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    fn advance(&mut self) {
        self.cursor += 1;
    }

    fn is_exhausted(&self) -> bool {
        self.cursor >= self.names.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionState {
    AwaitingCalories { queue: MissingQueue },
    AwaitingAllergens { queue: MissingQueue, calories: u32 },
    Completed,
}

/// What a transition asks the caller to do or show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionOutput {
    /// Input rejected; state unchanged
    Reprompt(ValidationError),
    CaloriesAccepted { name: String, calories: u32 },
    /// Item complete; insert it into the catalog
    Commit(FoodItem),
    /// Input arrived after the queue was exhausted
    Finished,
}

impl CollectionState {
    /// Initial state for a list of missing names
    pub fn start(missing: Vec<String>) -> Self {
        let queue = MissingQueue::new(missing);
        if queue.is_empty() {
            CollectionState::Completed
        } else {
            CollectionState::AwaitingCalories { queue }
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, CollectionState::Completed)
    }

    /// Name currently being collected
    pub fn current_name(&self) -> Option<&str> {
        match self {
            CollectionState::AwaitingCalories { queue }
            | CollectionState::AwaitingAllergens { queue, .. } => queue.current(),
            CollectionState::Completed => None,
        }
    }

    /// Apply one user input
    pub fn transition(self, input: &str) -> (CollectionState, CollectionOutput) {
        match self {
            CollectionState::AwaitingCalories { queue } => match parse_calories(input) {
                Ok(calories) => {
                    let name = queue.current().unwrap_or_default().to_string();
                    (
                        CollectionState::AwaitingAllergens { queue, calories },
                        CollectionOutput::CaloriesAccepted { name, calories },
                    )
                }
                Err(err) => (
                    CollectionState::AwaitingCalories { queue },
                    CollectionOutput::Reprompt(err),
                ),
            },

            CollectionState::AwaitingAllergens { mut queue, calories } => {
                match AllergenSet::parse_input(input) {
                    Ok(allergens) => {
                        let item =
                            FoodItem::new(queue.current().unwrap_or_default(), calories, allergens);
                        queue.advance();
                        let next = if queue.is_exhausted() {
                            CollectionState::Completed
                        } else {
                            CollectionState::AwaitingCalories { queue }
                        };
                        (next, CollectionOutput::Commit(item))
                    }
                    Err(invalid) => (
                        CollectionState::AwaitingAllergens { queue, calories },
                        CollectionOutput::Reprompt(ValidationError::InvalidAllergens { invalid }),
                    ),
                }
            }

            CollectionState::Completed => (CollectionState::Completed, CollectionOutput::Finished),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_start_with_nothing_missing_is_completed() {
        assert!(CollectionState::start(Vec::new()).is_completed());
    }

    #[test]
    fn test_bad_calories_reprompt_without_advancing() {
        let state = CollectionState::start(names(&["APPLE"]));

        let (state, output) = state.transition("fifty");

        assert_eq!(
            output,
            CollectionOutput::Reprompt(ValidationError::InvalidCalories {
                input: "fifty".into()
            })
        );
        assert!(matches!(state, CollectionState::AwaitingCalories { .. }));
        assert_eq!(state.current_name(), Some("APPLE"));
    }

    #[test]
    fn test_bad_allergens_reject_whole_step() {
        let state = CollectionState::start(names(&["APPLE"]));
        let (state, _) = state.transition("50");

        let (state, output) = state.transition("Milk, Peanut");

        assert_eq!(
            output,
            CollectionOutput::Reprompt(ValidationError::InvalidAllergens {
                invalid: vec!["Peanut".into()]
            })
        );
        assert_eq!(
            state,
            CollectionState::AwaitingAllergens {
                queue: MissingQueue::new(names(&["APPLE"])),
                calories: 50
            }
        );
    }

    #[test]
    fn test_full_walk_commits_each_item() {
        let mut state = CollectionState::start(names(&["APPLE", "KIWI"]));
        let mut committed = Vec::new();

        for input in ["50", "milk, NUTS", "42", "none"] {
            let (next, output) = state.transition(input);
            if let CollectionOutput::Commit(item) = output {
                committed.push(item);
            }
            state = next;
        }

        assert!(state.is_completed());
        assert_eq!(
            committed,
            vec![
                FoodItem::new("APPLE", 50, AllergenSet::parse_input("Milk, Nuts").unwrap()),
                FoodItem::new("KIWI", 42, AllergenSet::new()),
            ]
        );
    }

    #[test]
    fn test_input_after_completion_is_finished() {
        let (state, output) = CollectionState::Completed.transition("anything");
        assert!(state.is_completed());
        assert_eq!(output, CollectionOutput::Finished);
    }
}
