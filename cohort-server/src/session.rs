use crate::db::row::timestamp;
use crate::db::Database;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rusqlite::OptionalExtension;
use thiserror::Error;
use uuid::Uuid;

/// How long a login stays valid
pub const SESSION_LIFETIME_DAYS: i64 = 30;

/// A token that does not name a live session
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionRejected {
    #[error("Session not found")]
    NotFound,
    #[error("Session has expired")]
    Expired,
}

/// Database-backed session manager for persistent authentication
///
/// Tokens are UUID v4 strings stored in the `sessions` table with a 30-day expiry.
/// An expired token is removed the first time it is presented.
#[derive(Clone)]
pub struct SessionManager {
    db: Database,
}

impl SessionManager {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a new session for a profile and return its token
    pub fn create_session(&self, profile_id: Uuid) -> Result<String> {
        let token = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let expires_at = created_at + Duration::days(SESSION_LIFETIME_DAYS);

        let conn = self.db.connection()?;
        conn.execute(
            "INSERT INTO sessions (token, profile_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                token,
                profile_id.to_string(),
                timestamp(&created_at),
                timestamp(&expires_at),
            ],
        )
        .context("Failed to create session")?;

        tracing::info!("Created session for profile {}", profile_id);
        Ok(token)
    }

    /// Validate a session token and return the profile it belongs to.
    ///
    /// Unknown and expired tokens fail with [`SessionRejected`]; any other
    /// error is a storage failure.
    pub fn validate_session(&self, token: &str) -> Result<Uuid> {
        let found: Option<(String, String)> = {
            let conn = self.db.connection()?;
            conn.query_row(
                "SELECT profile_id, expires_at FROM sessions WHERE token = ?1",
                rusqlite::params![token],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .context("Failed to look up session")?
        };
        let (profile_id, expires_at) = found.ok_or(SessionRejected::NotFound)?;

        let expires_at = DateTime::parse_from_rfc3339(&expires_at)
            .context("Failed to parse expiry time")?
            .with_timezone(&Utc);

        if Utc::now() > expires_at {
            self.delete_session(token)?;
            return Err(SessionRejected::Expired.into());
        }

        Uuid::parse_str(&profile_id).context("Failed to parse profile ID")
    }

    /// Delete a session (logout)
    pub fn delete_session(&self, token: &str) -> Result<()> {
        let conn = self.db.connection()?;
        let rows_affected = conn
            .execute("DELETE FROM sessions WHERE token = ?1", rusqlite::params![token])
            .context("Failed to delete session")?;

        if rows_affected > 0 {
            tracing::info!("Deleted session");
        }

        Ok(())
    }

    /// Remove every session past its expiry. Returns how many were removed.
    pub fn cleanup_expired_sessions(&self) -> Result<usize> {
        let conn = self.db.connection()?;
        let rows_affected = conn
            .execute(
                "DELETE FROM sessions WHERE expires_at < ?1",
                rusqlite::params![timestamp(&Utc::now())],
            )
            .context("Failed to cleanup expired sessions")?;

        if rows_affected > 0 {
            tracing::info!("Cleaned up {} expired sessions", rows_affected);
        }

        Ok(rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{seeded_db, SAM};

    fn expire(db: &Database, token: &str) {
        let conn = db.connection().expect("Failed to get connection");
        conn.execute(
            "UPDATE sessions SET expires_at = ?1 WHERE token = ?2",
            rusqlite::params![timestamp(&(Utc::now() - Duration::days(1))), token],
        )
        .expect("Failed to expire session");
    }

    #[test]
    fn test_create_and_validate_session() {
        let manager = SessionManager::new(seeded_db());

        let token = manager.create_session(SAM).expect("Failed to create session");
        assert!(Uuid::parse_str(&token).is_ok(), "Token should be a valid UUID");
        assert_eq!(manager.validate_session(&token).unwrap(), SAM);
    }

    #[test]
    fn test_validate_invalid_session() {
        let manager = SessionManager::new(seeded_db());
        let err = manager.validate_session("invalid-token").unwrap_err();
        assert_eq!(err.downcast_ref::<SessionRejected>(), Some(&SessionRejected::NotFound));
    }

    #[test]
    fn test_delete_session() {
        let manager = SessionManager::new(seeded_db());

        let token = manager.create_session(SAM).unwrap();
        manager.delete_session(&token).unwrap();
        assert!(manager.validate_session(&token).is_err(), "Session should be invalid after logout");
    }

    #[test]
    fn test_expired_session_is_rejected_and_removed() {
        let db = seeded_db();
        let manager = SessionManager::new(db.clone());

        let token = manager.create_session(SAM).unwrap();
        expire(&db, &token);

        let err = manager.validate_session(&token).unwrap_err();
        assert_eq!(err.downcast_ref::<SessionRejected>(), Some(&SessionRejected::Expired));
        assert_eq!(manager.cleanup_expired_sessions().unwrap(), 0, "already removed on validation");
    }

    #[test]
    fn test_cleanup_expired_sessions() {
        let db = seeded_db();
        let manager = SessionManager::new(db.clone());

        let stale = manager.create_session(SAM).unwrap();
        let fresh = manager.create_session(SAM).unwrap();
        assert_ne!(stale, fresh);
        expire(&db, &stale);

        assert_eq!(manager.cleanup_expired_sessions().unwrap(), 1);
        assert!(manager.validate_session(&fresh).is_ok());
    }
}
