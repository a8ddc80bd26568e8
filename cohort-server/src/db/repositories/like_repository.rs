use anyhow::{Context, Result};
use chrono::Utc;
use uuid::Uuid;

use crate::db::row::timestamp;
use crate::db::DbPool;

pub struct LikeRepository {
    pool: DbPool,
}

impl LikeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Record a like and bump the post's counter in one transaction.
    ///
    /// Returns false when the profile had already liked the post.
    pub fn like(&self, post_id: &Uuid, profile_id: &Uuid) -> Result<bool> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        let inserted = tx
            .execute(
                "INSERT OR IGNORE INTO post_likes (post_id, profile_id, created_at) VALUES (?, ?, ?)",
                (post_id.to_string(), profile_id.to_string(), timestamp(&Utc::now())),
            )
            .context("Failed to record like")?;

        if inserted > 0 {
            tx.execute(
                "UPDATE community_posts SET like_count = like_count + 1 WHERE id = ?",
                [post_id.to_string()],
            )
            .context("Failed to increment like count")?;
        }

        tx.commit()?;
        Ok(inserted > 0)
    }

    /// Remove a like and decrement the counter. Returns false when there was nothing to remove.
    pub fn unlike(&self, post_id: &Uuid, profile_id: &Uuid) -> Result<bool> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        let removed = tx
            .execute(
                "DELETE FROM post_likes WHERE post_id = ? AND profile_id = ?",
                (post_id.to_string(), profile_id.to_string()),
            )
            .context("Failed to remove like")?;

        if removed > 0 {
            tx.execute(
                "UPDATE community_posts SET like_count = MAX(like_count - 1, 0) WHERE id = ?",
                [post_id.to_string()],
            )
            .context("Failed to decrement like count")?;
        }

        tx.commit()?;
        Ok(removed > 0)
    }

    /// Current like count for a post, if it exists
    pub fn count(&self, post_id: &Uuid) -> Result<Option<i64>> {
        use rusqlite::OptionalExtension;

        let conn = self.pool.get()?;
        let count = conn
            .query_row(
                "SELECT like_count FROM community_posts WHERE id = ?",
                [post_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{seeded_db, MAYA, PRIYA, SAM, WELCOME_POST};

    #[test]
    fn test_double_like_counts_once() {
        let db = seeded_db();
        let repo = LikeRepository::new(db.pool.clone());

        assert_eq!(repo.count(&WELCOME_POST).unwrap(), Some(1));
        assert!(repo.like(&WELCOME_POST, &PRIYA).unwrap());
        assert!(!repo.like(&WELCOME_POST, &PRIYA).unwrap());
        assert_eq!(repo.count(&WELCOME_POST).unwrap(), Some(2));
    }

    #[test]
    fn test_unlike_decrements_and_never_goes_negative() {
        let db = seeded_db();
        let repo = LikeRepository::new(db.pool.clone());

        assert!(repo.unlike(&WELCOME_POST, &SAM).unwrap());
        assert_eq!(repo.count(&WELCOME_POST).unwrap(), Some(0));

        assert!(!repo.unlike(&WELCOME_POST, &SAM).unwrap());
        assert!(!repo.unlike(&WELCOME_POST, &MAYA).unwrap());
        assert_eq!(repo.count(&WELCOME_POST).unwrap(), Some(0));
    }

    #[test]
    fn test_count_for_missing_post() {
        let db = seeded_db();
        let repo = LikeRepository::new(db.pool.clone());
        assert_eq!(repo.count(&Uuid::new_v4()).unwrap(), None);
    }
}
