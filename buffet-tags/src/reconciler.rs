//! Reconciliation driver
//!
//! Ties the resolver, the session state machines, the catalog and the tag
//! generator together behind three calls: [`Reconciler::begin`] with a name
//! list, [`Reconciler::step`] with each user reply, and
//! [`Reconciler::cancel`]. Any front end (chat, web, CLI) only needs to
//! render the returned [`Reply`].

use crate::catalog::{CatalogStore, InsertOutcome};
use crate::generator::{GeneratedDocument, TagGenerator};
use crate::resolver::{normalize_names, resolve, Resolution};
use crate::session::verification::{render_items, REVIEW_HINT};
use crate::session::{
    CollectionOutput, CollectionState, Session, SessionState, SessionStore, UserKey,
    VerificationOutput, VerificationState,
};
use crate::validation::ValidationError;
use buffet_common::{Allergen, Error, FoodItem, Result};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// What the front end should show next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    NeedCalories {
        name: String,
        position: usize,
        total: usize,
    },
    NeedAllergens {
        name: String,
    },
    /// Input refused; `retry` repeats the pending question, if any
    Rejected {
        error: ValidationError,
        retry: Option<Box<Reply>>,
    },
    Review {
        items: Vec<FoodItem>,
    },
    Edited {
        position: usize,
        item: FoodItem,
    },
    /// Session finished
    Generated(GeneratedDocument),
}

impl Reply {
    /// `true` once the session behind this reply has ended
    pub fn is_final(&self) -> bool {
        matches!(self, Reply::Generated(_))
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::NeedCalories {
                name,
                position,
                total,
            } => write!(
                f,
                "Item '{}' not found ({} of {}). Please enter calories:",
                name, position, total
            ),
            Reply::NeedAllergens { name } => write!(
                f,
                "Enter allergens for '{}' (comma separated, or 'none').\nValid: {}",
                name,
                Allergen::vocabulary()
            ),
            Reply::Rejected { error, retry } => {
                write!(f, "{}", error)?;
                if let Some(retry) = retry {
                    write!(f, "\n{}", retry)?;
                }
                Ok(())
            }
            Reply::Review { items } => {
                writeln!(f, "Review allergens (session only):")?;
                for line in render_items(items) {
                    writeln!(f, "{}", line)?;
                }
                write!(f, "\n{}", REVIEW_HINT)
            }
            Reply::Edited { item, .. } => write!(
                f,
                "Updated {} to: [{}]\nType 'ok' to finish or modify another.",
                item.name, item.allergens
            ),
            Reply::Generated(doc) => {
                write!(
                    f,
                    "Generated {} tag(s): {}",
                    doc.rows_written,
                    doc.path.display()
                )?;
                if !doc.missing.is_empty() {
                    let missing: Vec<&str> = doc.missing.iter().map(String::as_str).collect();
                    write!(f, "\nNo data for: {}", missing.join(", "))?;
                }
                Ok(())
            }
        }
    }
}

/// Question for a collection state; `None` once collection is complete
fn collection_prompt(state: &CollectionState) -> Option<Reply> {
    match state {
        CollectionState::AwaitingCalories { queue } => Some(Reply::NeedCalories {
            name: queue.current()?.to_string(),
            position: queue.position(),
            total: queue.len(),
        }),
        CollectionState::AwaitingAllergens { queue, .. } => Some(Reply::NeedAllergens {
            name: queue.current()?.to_string(),
        }),
        CollectionState::Completed => None,
    }
}

/// Next session state (`None` ends the session) and the reply to show
type Advance = (Option<SessionState>, Reply);

pub struct Reconciler<C: CatalogStore + ?Sized> {
    catalog: Arc<C>,
    sessions: SessionStore,
    generator: TagGenerator,
}

impl<C: CatalogStore + ?Sized> Reconciler<C> {
    pub fn new(catalog: Arc<C>, sessions: SessionStore, generator: TagGenerator) -> Self {
        Self {
            catalog,
            sessions,
            generator,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Start a pass over `raw_names`, replacing any session the user had
    pub async fn begin<S: AsRef<str>>(&self, user: &UserKey, raw_names: &[S]) -> Result<Reply> {
        let names = normalize_names(raw_names);
        if names.is_empty() {
            return Err(Error::InvalidInput("No food names given".to_string()));
        }

        self.sessions.purge_expired().await;
        info!(user = %user, names = names.len(), "Starting reconciliation");

        let (state, reply) = self.enter(names).await?;
        if let Some(state) = state {
            self.sessions.insert(Session::new(user.clone(), state)).await;
        }
        Ok(reply)
    }

    /// Feed one user input to the user's session
    ///
    /// A session-ending error is returned as `Err` and the session is gone;
    /// recoverable input problems come back as [`Reply::Rejected`].
    pub async fn step(&self, user: &UserKey, input: &str) -> Result<Reply> {
        let mut session = self.sessions.checkout(user).await?;

        match self.advance(session.state, input).await {
            Ok((Some(state), reply)) => {
                session.state = state;
                self.sessions.checkin(session).await;
                Ok(reply)
            }
            Ok((None, reply)) => {
                info!(user = %user, "Session finished");
                Ok(reply)
            }
            Err(e) => {
                warn!(user = %user, error = %e, "Session ended by error");
                Err(e)
            }
        }
    }

    /// Abandon the user's session; `true` if one existed
    pub async fn cancel(&self, user: &UserKey) -> bool {
        let existed = self.sessions.remove(user).await;
        if existed {
            info!(user = %user, "Session cancelled");
        }
        existed
    }

    /// Resolve the full list and pick the state that follows
    async fn enter(&self, names: Vec<String>) -> Result<Advance> {
        match resolve(self.catalog.as_ref(), &names).await? {
            Resolution::Resolved(items) => Ok((
                Some(SessionState::Verifying(VerificationState::new(items.clone()))),
                Reply::Review { items },
            )),
            Resolution::Missing(missing) => {
                info!(missing = missing.len(), "Collecting missing items");
                let collection = CollectionState::start(missing);
                let reply = collection_prompt(&collection)
                    .ok_or_else(|| Error::Internal("Missing list was empty".to_string()))?;
                Ok((
                    Some(SessionState::Collecting { names, collection }),
                    reply,
                ))
            }
        }
    }

    async fn advance(&self, state: SessionState, input: &str) -> Result<Advance> {
        match state {
            SessionState::Collecting { names, collection } => {
                let (next, output) = collection.transition(input);
                match output {
                    CollectionOutput::Reprompt(error) => {
                        let retry = collection_prompt(&next).map(Box::new);
                        Ok((
                            Some(SessionState::Collecting {
                                names,
                                collection: next,
                            }),
                            Reply::Rejected { error, retry },
                        ))
                    }
                    CollectionOutput::CaloriesAccepted { name, .. } => Ok((
                        Some(SessionState::Collecting {
                            names,
                            collection: next,
                        }),
                        Reply::NeedAllergens { name },
                    )),
                    CollectionOutput::Commit(item) => {
                        if self.catalog.insert(&item).await? == InsertOutcome::AlreadyExists {
                            info!(name = %item.name, "Item was added elsewhere meanwhile; keeping stored entry");
                        }
                        match collection_prompt(&next) {
                            Some(reply) => Ok((
                                Some(SessionState::Collecting {
                                    names,
                                    collection: next,
                                }),
                                reply,
                            )),
                            None => self.enter(names).await,
                        }
                    }
                    CollectionOutput::Finished => self.enter(names).await,
                }
            }

            SessionState::Verifying(verification) => {
                let (next, output) = verification.transition(input);
                match output {
                    VerificationOutput::Finalize => {
                        // One row per snapshot position, so an edit to a
                        // repeated name only changes its own tag
                        let items = next.into_items();
                        let generator = self.generator.clone();
                        let document = tokio::task::spawn_blocking(move || generator.generate(&items))
                            .await
                            .map_err(|e| Error::Internal(format!("Generation task failed: {}", e)))??;
                        Ok((None, Reply::Generated(document)))
                    }
                    VerificationOutput::Edited { position, item } => Ok((
                        Some(SessionState::Verifying(next)),
                        Reply::Edited { position, item },
                    )),
                    VerificationOutput::Rejected(error) => Ok((
                        Some(SessionState::Verifying(next)),
                        Reply::Rejected { error, retry: None },
                    )),
                }
            }
        }
    }
}
