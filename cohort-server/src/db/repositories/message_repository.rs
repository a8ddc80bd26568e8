use anyhow::{Context, Result};
use rusqlite::{OptionalExtension, Row};
use uuid::Uuid;

use cohort_types::CommunityMessage;

use crate::db::row::{get_timestamp, get_uuid, timestamp};
use crate::db::DbPool;

const MESSAGE_SELECT: &str =
    "SELECT m.id, m.community_id, m.author_id, pr.full_name, m.content, m.created_at, m.updated_at
     FROM community_messages m
     JOIN profiles pr ON pr.id = m.author_id";

pub struct MessageRepository {
    pool: DbPool,
}

impl MessageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<CommunityMessage> {
        Ok(CommunityMessage {
            id: get_uuid(row, 0)?,
            community_id: get_uuid(row, 1)?,
            author_id: get_uuid(row, 2)?,
            author_name: row.get(3)?,
            content: row.get(4)?,
            created_at: get_timestamp(row, 5)?,
            updated_at: get_timestamp(row, 6)?,
        })
    }

    /// Create a new community message
    pub fn create(&self, message: &CommunityMessage) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO community_messages (id, community_id, author_id, content, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                message.id.to_string(),
                message.community_id.to_string(),
                message.author_id.to_string(),
                &message.content,
                timestamp(&message.created_at),
                timestamp(&message.updated_at),
            ),
        )
        .context("Failed to create community message")?;
        Ok(())
    }

    /// Get a single message by ID
    pub fn get_by_id(&self, message_id: &Uuid) -> Result<Option<CommunityMessage>> {
        let conn = self.pool.get()?;
        let message = conn
            .query_row(
                &format!("{} WHERE m.id = ?", MESSAGE_SELECT),
                [message_id.to_string()],
                Self::map_row,
            )
            .optional()?;
        Ok(message)
    }

    /// Get all messages of a community in conversation order.
    ///
    /// An unknown community simply has no messages.
    pub fn get_by_community(&self, community_id: &Uuid) -> Result<Vec<CommunityMessage>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE m.community_id = ? ORDER BY m.created_at ASC, m.rowid ASC",
            MESSAGE_SELECT
        ))?;

        let messages = stmt
            .query_map([community_id.to_string()], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(messages)
    }

    /// Replace a message's content
    pub fn update_content(&self, message: &CommunityMessage) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE community_messages SET content = ?, updated_at = ? WHERE id = ?",
            (
                &message.content,
                timestamp(&message.updated_at),
                message.id.to_string(),
            ),
        )
        .context("Failed to update community message")?;
        Ok(())
    }

    /// Delete a message
    pub fn delete(&self, message_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let removed = conn
            .execute(
                "DELETE FROM community_messages WHERE id = ?",
                [message_id.to_string()],
            )
            .context("Failed to delete community message")?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{seeded_db, LAUNCHPAD_COMMUNITY, SAM};
    use chrono::Utc;

    #[test]
    fn test_messages_in_conversation_order() {
        let db = seeded_db();
        let repo = MessageRepository::new(db.pool.clone());

        let messages = repo.get_by_community(&LAUNCHPAD_COMMUNITY).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "Share one goal for this week.");
        assert_eq!(messages[1].author_name, "Sam Lindqvist");
    }

    #[test]
    fn test_unknown_community_has_no_messages() {
        let db = seeded_db();
        let repo = MessageRepository::new(db.pool.clone());
        assert!(repo.get_by_community(&Uuid::new_v4()).unwrap().is_empty());
    }

    #[test]
    fn test_create_update_delete() {
        let db = seeded_db();
        let repo = MessageRepository::new(db.pool.clone());
        let now = Utc::now();

        let mut message = CommunityMessage {
            id: Uuid::new_v4(),
            community_id: LAUNCHPAD_COMMUNITY,
            author_id: SAM,
            author_name: String::new(),
            content: "Outline done, starting scripts".to_string(),
            created_at: now,
            updated_at: now,
        };
        repo.create(&message).unwrap();

        message.content = "Outline done, scripts next week".to_string();
        repo.update_content(&message).unwrap();
        let reloaded = repo.get_by_id(&message.id).unwrap().unwrap();
        assert_eq!(reloaded.content, "Outline done, scripts next week");

        assert!(repo.delete(&message.id).unwrap());
        assert!(repo.get_by_id(&message.id).unwrap().is_none());
    }

    #[test]
    fn test_message_requires_existing_community() {
        let db = seeded_db();
        let repo = MessageRepository::new(db.pool.clone());
        let now = Utc::now();

        let orphan = CommunityMessage {
            id: Uuid::new_v4(),
            community_id: Uuid::new_v4(),
            author_id: SAM,
            author_name: String::new(),
            content: "lost".to_string(),
            created_at: now,
            updated_at: now,
        };
        assert!(repo.create(&orphan).is_err());
    }
}
