use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::config::{DomainCheckMode, Settings};
use crate::db::Database;
use crate::demo_store::{JsonFileRepository, LocalRepository, MemoryRepository};
use crate::domain_check::{DomainChecker, ResolvingDomainChecker, SimulatedDomainChecker};
use crate::session::{SessionManager, SessionRejected};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub session_manager: SessionManager,
    pub domain_checker: Arc<dyn DomainChecker>,
    pub demo_store: Arc<dyn LocalRepository>,
}

impl AppState {
    /// State with an instant simulated domain checker and in-memory demo store
    pub fn new(db: Database) -> Self {
        let session_manager = SessionManager::new(db.clone());
        Self {
            db,
            session_manager,
            domain_checker: Arc::new(SimulatedDomainChecker::new(Duration::ZERO)),
            demo_store: Arc::new(MemoryRepository::new()),
        }
    }

    pub fn from_settings(db: Database, settings: &Settings) -> Result<Self> {
        let check = &settings.domain_check;
        let domain_checker: Arc<dyn DomainChecker> = match check.mode {
            DomainCheckMode::Simulated => Arc::new(SimulatedDomainChecker::new(check.simulated_delay())),
            DomainCheckMode::Resolving => Arc::new(ResolvingDomainChecker::new(
                check.attempts,
                check.backoff(),
                check.timeout(),
            )?),
        };

        let demo_store: Arc<dyn LocalRepository> = if settings.demo_store.path.trim().is_empty() {
            Arc::new(MemoryRepository::new())
        } else {
            Arc::new(JsonFileRepository::new(settings.demo_store.path.trim()))
        };

        tracing::info!("Domain checks are {:?}", check.mode);
        Ok(Self {
            domain_checker,
            demo_store,
            ..Self::new(db)
        })
    }

    pub fn with_domain_checker(mut self, checker: Arc<dyn DomainChecker>) -> Self {
        self.domain_checker = checker;
        self
    }

    pub fn with_demo_store(mut self, store: Arc<dyn LocalRepository>) -> Self {
        self.demo_store = store;
        self
    }

    /// Profile ID behind a session token, `None` if the token is unknown or
    /// expired. Storage failures are returned as errors.
    pub fn authenticated_profile(&self, token: &str) -> Result<Option<uuid::Uuid>> {
        match self.session_manager.validate_session(token) {
            Ok(profile_id) => Ok(Some(profile_id)),
            Err(e) => match e.downcast_ref::<SessionRejected>() {
                Some(reason) => {
                    tracing::debug!("Rejected session token: {}", reason);
                    Ok(None)
                }
                None => Err(e),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_state() -> AppState {
        let db = Database::in_memory().unwrap();
        db.initialize().unwrap();
        db.seed_test_data().unwrap();
        AppState::new(db)
    }

    #[test]
    fn test_unknown_token_is_unauthenticated() {
        let state = seeded_state();
        assert_eq!(state.authenticated_profile("no-such-token").unwrap(), None);
    }

    #[test]
    fn test_storage_failure_is_not_an_auth_failure() {
        let state = seeded_state();
        state
            .db
            .connection()
            .unwrap()
            .execute_batch("DROP TABLE sessions;")
            .unwrap();

        assert!(state.authenticated_profile("any-token").is_err());
    }
}
