use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use cohort_types::{Community, MemberRole};

use crate::db::row::{get_bool, get_opt_uuid, get_timestamp, get_uuid, timestamp};
use crate::db::DbPool;

/// Communities with course names and counts, aggregated in one pass
const COMMUNITY_SELECT: &str =
    "SELECT c.id, c.instructor_id, c.name, c.description, c.course_id, co.title, c.is_active,
            COALESCE(mc.total, 0), COALESCE(mb.total, 0), c.created_at, c.updated_at
     FROM communities c
     LEFT JOIN courses co ON co.id = c.course_id
     LEFT JOIN (SELECT community_id, COUNT(*) AS total FROM community_messages GROUP BY community_id) mc
            ON mc.community_id = c.id
     LEFT JOIN (SELECT community_id, COUNT(*) AS total FROM community_members GROUP BY community_id) mb
            ON mb.community_id = c.id";

pub struct CommunityRepository {
    pool: DbPool,
}

impl CommunityRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Community> {
        Ok(Community {
            id: get_uuid(row, 0)?,
            instructor_id: get_uuid(row, 1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            course_id: get_opt_uuid(row, 4)?,
            course_name: row.get(5)?,
            is_active: get_bool(row, 6)?,
            message_count: row.get(7)?,
            member_count: row.get(8)?,
            created_at: get_timestamp(row, 9)?,
            updated_at: get_timestamp(row, 10)?,
        })
    }

    /// Create a community and enroll its instructor as owner
    pub fn create(&self, community: &Community) -> Result<()> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO communities (id, instructor_id, name, description, course_id, is_active, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                community.id.to_string(),
                community.instructor_id.to_string(),
                community.name,
                community.description,
                community.course_id.map(|id| id.to_string()),
                community.is_active,
                timestamp(&community.created_at),
                timestamp(&community.updated_at),
            ],
        )
        .context("Failed to create community")?;

        tx.execute(
            "INSERT INTO community_members (community_id, profile_id, role, joined_at) VALUES (?, ?, ?, ?)",
            (
                community.id.to_string(),
                community.instructor_id.to_string(),
                MemberRole::Owner.as_str(),
                timestamp(&community.created_at),
            ),
        )
        .context("Failed to add community owner")?;

        tx.commit()?;
        Ok(())
    }

    /// Get a single community by ID
    pub fn get_by_id(&self, community_id: &Uuid) -> Result<Option<Community>> {
        let conn = self.pool.get()?;
        let community = conn
            .query_row(
                &format!("{} WHERE c.id = ?", COMMUNITY_SELECT),
                [community_id.to_string()],
                Self::map_row,
            )
            .optional()?;
        Ok(community)
    }

    /// Get every community owned by an instructor, newest first
    pub fn get_by_instructor(&self, instructor_id: &Uuid) -> Result<Vec<Community>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE c.instructor_id = ? ORDER BY c.created_at DESC, c.rowid DESC",
            COMMUNITY_SELECT
        ))?;

        let communities = stmt
            .query_map([instructor_id.to_string()], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(communities)
    }

    /// Overwrite the editable fields of a community
    pub fn update(&self, community: &Community) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE communities
             SET name = ?, description = ?, course_id = ?, is_active = ?, updated_at = ?
             WHERE id = ?",
            params![
                community.name,
                community.description,
                community.course_id.map(|id| id.to_string()),
                community.is_active,
                timestamp(&community.updated_at),
                community.id.to_string(),
            ],
        )
        .context("Failed to update community")?;
        Ok(())
    }

    /// Delete a community with its messages and memberships atomically.
    ///
    /// Returns the number of messages removed, or `None` if the community did not exist.
    pub fn delete(&self, community_id: &Uuid) -> Result<Option<usize>> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        let id = community_id.to_string();

        let messages_removed = tx
            .execute("DELETE FROM community_messages WHERE community_id = ?", [&id])
            .context("Failed to delete community messages")?;
        tx.execute("DELETE FROM community_members WHERE community_id = ?", [&id])
            .context("Failed to delete community members")?;
        let removed = tx
            .execute("DELETE FROM communities WHERE id = ?", [&id])
            .context("Failed to delete community")?;

        if removed == 0 {
            tx.rollback()?;
            return Ok(None);
        }

        tx.commit()?;
        Ok(Some(messages_removed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{
        new_community, seeded_db, LAUNCHPAD_COMMUNITY, LAUNCHPAD_COURSE, MAYA,
    };
    use crate::db::repositories::MessageRepository;

    #[test]
    fn test_create_then_list_has_zero_messages() {
        let db = seeded_db();
        let repo = CommunityRepository::new(db.pool.clone());

        let community = new_community(MAYA, "Alumni Circle", "For graduates");
        repo.create(&community).unwrap();

        let listed = repo.get_by_instructor(&MAYA).unwrap();
        let matches: Vec<_> = listed.iter().filter(|c| c.name == "Alumni Circle").collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].description, "For graduates");
        assert_eq!(matches[0].message_count, 0);
        assert_eq!(matches[0].member_count, 1);
        assert_eq!(listed[0].id, community.id, "newest community first");
    }

    #[test]
    fn test_seeded_community_counts_and_course_name() {
        let db = seeded_db();
        let repo = CommunityRepository::new(db.pool.clone());

        let community = repo.get_by_id(&LAUNCHPAD_COMMUNITY).unwrap().unwrap();
        assert_eq!(community.message_count, 2);
        assert_eq!(community.member_count, 2);
        assert_eq!(community.course_id, Some(LAUNCHPAD_COURSE));
        assert_eq!(community.course_name.as_deref(), Some("Creator Launchpad"));
    }

    #[test]
    fn test_update_overwrites_fields() {
        let db = seeded_db();
        let repo = CommunityRepository::new(db.pool.clone());

        let mut community = repo.get_by_id(&LAUNCHPAD_COMMUNITY).unwrap().unwrap();
        community.name = "Launchpad Alumni".to_string();
        community.course_id = None;
        community.is_active = false;
        repo.update(&community).unwrap();

        let reloaded = repo.get_by_id(&LAUNCHPAD_COMMUNITY).unwrap().unwrap();
        assert_eq!(reloaded.name, "Launchpad Alumni");
        assert_eq!(reloaded.course_name, None);
        assert!(!reloaded.is_active);
    }

    #[test]
    fn test_delete_removes_messages() {
        let db = seeded_db();
        let repo = CommunityRepository::new(db.pool.clone());

        assert_eq!(repo.delete(&LAUNCHPAD_COMMUNITY).unwrap(), Some(2));
        assert!(repo.get_by_id(&LAUNCHPAD_COMMUNITY).unwrap().is_none());

        let messages = MessageRepository::new(db.pool.clone())
            .get_by_community(&LAUNCHPAD_COMMUNITY)
            .unwrap();
        assert!(messages.is_empty());

        assert_eq!(repo.delete(&LAUNCHPAD_COMMUNITY).unwrap(), None);
    }
}
