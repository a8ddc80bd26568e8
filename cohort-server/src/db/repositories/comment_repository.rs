use anyhow::{Context, Result};
use uuid::Uuid;

use cohort_types::PostComment;

use crate::db::row::{get_timestamp, get_uuid, timestamp};
use crate::db::DbPool;

pub struct CommentRepository {
    pool: DbPool,
}

impl CommentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Store a comment and bump the post's comment counter
    pub fn create(&self, comment: &PostComment) -> Result<()> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO comments (id, post_id, author_id, content, created_at) VALUES (?, ?, ?, ?, ?)",
            (
                comment.id.to_string(),
                comment.post_id.to_string(),
                comment.author_id.to_string(),
                &comment.content,
                timestamp(&comment.created_at),
            ),
        )
        .context("Failed to create comment")?;

        tx.execute(
            "UPDATE community_posts SET comment_count = comment_count + 1 WHERE id = ?",
            [comment.post_id.to_string()],
        )
        .context("Failed to increment comment count")?;

        tx.commit()?;
        Ok(())
    }

    /// Get comments for a post, oldest first
    pub fn get_by_post(&self, post_id: &Uuid) -> Result<Vec<PostComment>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT c.id, c.post_id, c.author_id, pr.full_name, c.content, c.created_at
             FROM comments c
             JOIN profiles pr ON pr.id = c.author_id
             WHERE c.post_id = ?
             ORDER BY c.created_at ASC, c.rowid ASC",
        )?;

        let comments = stmt
            .query_map([post_id.to_string()], |row| {
                Ok(PostComment {
                    id: get_uuid(row, 0)?,
                    post_id: get_uuid(row, 1)?,
                    author_id: get_uuid(row, 2)?,
                    author_name: row.get(3)?,
                    content: row.get(4)?,
                    created_at: get_timestamp(row, 5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(comments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{seeded_db, PRIYA, WELCOME_POST};
    use crate::db::repositories::PostRepository;
    use chrono::Utc;

    #[test]
    fn test_create_comment_increments_counter() {
        let db = seeded_db();
        let repo = CommentRepository::new(db.pool.clone());

        let comment = PostComment {
            id: Uuid::new_v4(),
            post_id: WELCOME_POST,
            author_id: PRIYA,
            author_name: String::new(),
            content: "Hello from the podcast crowd".to_string(),
            created_at: Utc::now(),
        };
        repo.create(&comment).unwrap();

        let comments = repo.get_by_post(&WELCOME_POST).unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[1].author_name, "Priya Natarajan");

        let post = PostRepository::new(db.pool.clone())
            .get_by_id(&WELCOME_POST, None)
            .unwrap()
            .unwrap();
        assert_eq!(post.comment_count, 2);
    }

    #[test]
    fn test_comment_on_missing_post_fails() {
        let db = seeded_db();
        let repo = CommentRepository::new(db.pool.clone());

        let comment = PostComment {
            id: Uuid::new_v4(),
            post_id: Uuid::new_v4(),
            author_id: PRIYA,
            author_name: String::new(),
            content: "orphan".to_string(),
            created_at: Utc::now(),
        };
        assert!(repo.create(&comment).is_err());
    }
}
