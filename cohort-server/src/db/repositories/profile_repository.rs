use anyhow::Result;
use rusqlite::{OptionalExtension, Row};
use uuid::Uuid;

use cohort_types::{Profile, ProfileRole};

use crate::db::row::{get_enum, get_timestamp, get_uuid};
use crate::db::DbPool;

const PROFILE_COLUMNS: &str = "id, full_name, email, avatar_url, role, created_at";

pub struct ProfileRepository {
    pool: DbPool,
}

impl ProfileRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Profile> {
        Ok(Profile {
            id: get_uuid(row, 0)?,
            full_name: row.get(1)?,
            email: row.get(2)?,
            avatar_url: row.get(3)?,
            role: get_enum(row, 4, ProfileRole::parse)?,
            created_at: get_timestamp(row, 5)?,
        })
    }

    /// Get all seeded profiles that can log in without credentials
    pub fn get_test_profiles(&self) -> Result<Vec<Profile>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM profiles ORDER BY role, full_name",
            PROFILE_COLUMNS
        ))?;

        let profiles = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(profiles)
    }

    /// Get profile by ID
    pub fn get_by_id(&self, profile_id: &Uuid) -> Result<Option<Profile>> {
        let conn = self.pool.get()?;
        let profile = conn
            .query_row(
                &format!("SELECT {} FROM profiles WHERE id = ?", PROFILE_COLUMNS),
                [profile_id.to_string()],
                Self::map_row,
            )
            .optional()?;

        Ok(profile)
    }

    /// Get profile by email (case-insensitive)
    pub fn get_by_email(&self, email: &str) -> Result<Option<Profile>> {
        let conn = self.pool.get()?;
        let profile = conn
            .query_row(
                &format!(
                    "SELECT {} FROM profiles WHERE LOWER(email) = LOWER(?)",
                    PROFILE_COLUMNS
                ),
                [email.trim()],
                Self::map_row,
            )
            .optional()?;

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{seeded_db, MAYA, SAM};

    #[test]
    fn test_get_by_email_ignores_case() {
        let db = seeded_db();
        let repo = ProfileRepository::new(db.pool.clone());

        let profile = repo
            .get_by_email("  MAYA@cohort.dev ")
            .expect("query failed")
            .expect("profile should exist");
        assert_eq!(profile.id, MAYA);
        assert_eq!(profile.role, ProfileRole::Instructor);
    }

    #[test]
    fn test_get_by_id() {
        let db = seeded_db();
        let repo = ProfileRepository::new(db.pool.clone());

        let profile = repo.get_by_id(&SAM).unwrap().unwrap();
        assert_eq!(profile.full_name, "Sam Lindqvist");
        assert_eq!(profile.role, ProfileRole::Student);
        assert!(repo.get_by_id(&Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_get_test_profiles_lists_everyone() {
        let db = seeded_db();
        let repo = ProfileRepository::new(db.pool.clone());

        let profiles = repo.get_test_profiles().unwrap();
        assert_eq!(profiles.len(), 4);
        assert_eq!(profiles[0].role, ProfileRole::Instructor);
    }
}
