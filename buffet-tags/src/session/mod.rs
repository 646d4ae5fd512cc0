//! Reconciliation sessions
//!
//! A session is either collecting data for missing names or reviewing the
//! resolved list before generation.

pub mod collection;
pub mod store;
pub mod verification;

pub use collection::{CollectionOutput, CollectionState, MissingQueue};
pub use store::{SessionStore, UserKey};
pub use verification::{VerificationOutput, VerificationState};

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Filling in missing catalog entries for `names`
    Collecting {
        /// Full normalized name list of this pass, resolved again once
        /// collection completes
        names: Vec<String>,
        collection: CollectionState,
    },
    Verifying(VerificationState),
}

#[derive(Debug, Clone)]
pub struct Session {
    pub user: UserKey,
    pub state: SessionState,
    pub created_at: DateTime<Utc>,
    pub touched_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user: UserKey, state: SessionState) -> Self {
        let now = Utc::now();
        Self {
            user,
            state,
            created_at: now,
            touched_at: now,
        }
    }
}
