use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::OptionalExtension;
use uuid::Uuid;

use cohort_types::{CommunityMember, MemberRole};

use crate::db::row::{get_enum, get_timestamp, get_uuid, timestamp};
use crate::db::DbPool;

pub struct MemberRepository {
    pool: DbPool,
}

impl MemberRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Add a member. Returns false if the profile already belongs to the community.
    pub fn add(&self, community_id: &Uuid, profile_id: &Uuid, role: MemberRole) -> Result<bool> {
        let conn = self.pool.get()?;
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO community_members (community_id, profile_id, role, joined_at)
                 VALUES (?, ?, ?, ?)",
                (
                    community_id.to_string(),
                    profile_id.to_string(),
                    role.as_str(),
                    timestamp(&Utc::now()),
                ),
            )
            .context("Failed to add community member")?;
        Ok(inserted > 0)
    }

    /// Remove a member. Returns false if the profile was not a member.
    pub fn remove(&self, community_id: &Uuid, profile_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let removed = conn
            .execute(
                "DELETE FROM community_members WHERE community_id = ? AND profile_id = ?",
                (community_id.to_string(), profile_id.to_string()),
            )
            .context("Failed to remove community member")?;
        Ok(removed > 0)
    }

    /// Role of a profile within a community, if any
    pub fn get_role(&self, community_id: &Uuid, profile_id: &Uuid) -> Result<Option<MemberRole>> {
        let conn = self.pool.get()?;
        let role = conn
            .query_row(
                "SELECT role FROM community_members WHERE community_id = ? AND profile_id = ?",
                (community_id.to_string(), profile_id.to_string()),
                |row| get_enum(row, 0, MemberRole::parse),
            )
            .optional()?;
        Ok(role)
    }

    /// List members, owner first, then by join date
    pub fn get_by_community(&self, community_id: &Uuid) -> Result<Vec<CommunityMember>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT mb.community_id, mb.profile_id, pr.full_name, mb.role, mb.joined_at
             FROM community_members mb
             JOIN profiles pr ON pr.id = mb.profile_id
             WHERE mb.community_id = ?
             ORDER BY mb.role = 'owner' DESC, mb.joined_at ASC",
        )?;

        let members = stmt
            .query_map([community_id.to_string()], |row| {
                Ok(CommunityMember {
                    community_id: get_uuid(row, 0)?,
                    profile_id: get_uuid(row, 1)?,
                    full_name: row.get(2)?,
                    role: get_enum(row, 3, MemberRole::parse)?,
                    joined_at: get_timestamp(row, 4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{seeded_db, LAUNCHPAD_COMMUNITY, MAYA, PRIYA, SAM};

    #[test]
    fn test_join_twice_is_noop() {
        let db = seeded_db();
        let repo = MemberRepository::new(db.pool.clone());

        assert!(repo.add(&LAUNCHPAD_COMMUNITY, &PRIYA, MemberRole::Member).unwrap());
        assert!(!repo.add(&LAUNCHPAD_COMMUNITY, &PRIYA, MemberRole::Member).unwrap());
        assert_eq!(repo.get_by_community(&LAUNCHPAD_COMMUNITY).unwrap().len(), 3);
    }

    #[test]
    fn test_roles_and_ordering() {
        let db = seeded_db();
        let repo = MemberRepository::new(db.pool.clone());

        assert_eq!(repo.get_role(&LAUNCHPAD_COMMUNITY, &MAYA).unwrap(), Some(MemberRole::Owner));
        assert_eq!(repo.get_role(&LAUNCHPAD_COMMUNITY, &SAM).unwrap(), Some(MemberRole::Member));
        assert_eq!(repo.get_role(&LAUNCHPAD_COMMUNITY, &PRIYA).unwrap(), None);

        let members = repo.get_by_community(&LAUNCHPAD_COMMUNITY).unwrap();
        assert_eq!(members[0].profile_id, MAYA);
        assert_eq!(members[0].full_name, "Maya Okafor");
    }

    #[test]
    fn test_remove() {
        let db = seeded_db();
        let repo = MemberRepository::new(db.pool.clone());

        assert!(repo.remove(&LAUNCHPAD_COMMUNITY, &SAM).unwrap());
        assert!(!repo.remove(&LAUNCHPAD_COMMUNITY, &SAM).unwrap());
    }
}
