use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use cohort_types::{CommunityPost, FeedSort, PostCategory};

use crate::db::row::{
    get_bool, get_enum, get_opt_uuid, get_string_list, get_timestamp, get_uuid, timestamp,
};
use crate::db::DbPool;
use crate::legacy::{METADATA_TAG, MESSAGE_TAG_PREFIX};

/// Hard cap on how many posts one feed request may return
pub const MAX_FEED_LIMIT: i64 = 200;

/// Selects a post joined with its author and the viewer's like.
/// `?1` is the viewer id (NULL when anonymous).
const POST_SELECT: &str =
    "SELECT p.id, p.instructor_id, p.author_id, pr.full_name, pr.avatar_url, p.course_id,
            p.category, p.title, p.content, p.image_urls, p.video_url, p.is_pinned,
            p.like_count, p.comment_count, p.created_at, p.updated_at,
            EXISTS(SELECT 1 FROM post_likes l WHERE l.post_id = p.id AND l.profile_id = ?1)
     FROM community_posts p
     JOIN profiles pr ON pr.id = p.author_id";

/// Filters applied to the community feed
#[derive(Debug, Clone, Default)]
pub struct FeedFilter {
    pub instructor_id: Option<Uuid>,
    pub course_id: Option<Uuid>,
    pub category: Option<PostCategory>,
    pub sort: FeedSort,
    pub limit: i64,
}

pub struct PostRepository {
    pool: DbPool,
}

impl PostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<CommunityPost> {
        Ok(CommunityPost {
            id: get_uuid(row, 0)?,
            instructor_id: get_uuid(row, 1)?,
            author_id: get_uuid(row, 2)?,
            author_name: row.get(3)?,
            author_avatar_url: row.get(4)?,
            course_id: get_opt_uuid(row, 5)?,
            category: get_enum(row, 6, PostCategory::parse)?,
            title: row.get(7)?,
            content: row.get(8)?,
            image_urls: get_string_list(row, 9)?,
            video_url: row.get(10)?,
            is_pinned: get_bool(row, 11)?,
            like_count: row.get(12)?,
            comment_count: row.get(13)?,
            created_at: get_timestamp(row, 14)?,
            updated_at: get_timestamp(row, 15)?,
            viewer_has_liked: get_bool(row, 16)?,
        })
    }

    /// Create a new post
    pub fn create(&self, post: &CommunityPost) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO community_posts (id, instructor_id, author_id, course_id, category, title, content,
                                          image_urls, video_url, is_pinned, like_count, comment_count,
                                          created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 0, ?, ?)",
            params![
                post.id.to_string(),
                post.instructor_id.to_string(),
                post.author_id.to_string(),
                post.course_id.map(|id| id.to_string()),
                post.category.as_str(),
                post.title,
                post.content,
                serde_json::to_string(&post.image_urls)?,
                post.video_url,
                post.is_pinned,
                timestamp(&post.created_at),
                timestamp(&post.updated_at),
            ],
        )
        .context("Failed to create post")?;
        Ok(())
    }

    /// Get feed posts, excluding rows that still carry a legacy community tag
    pub fn get_feed(&self, filter: &FeedFilter, viewer: Option<&Uuid>) -> Result<Vec<CommunityPost>> {
        let conn = self.pool.get()?;

        let order_clause = match filter.sort {
            FeedSort::Newest => "ORDER BY p.created_at DESC, p.rowid DESC",
            FeedSort::PinnedFirst => "ORDER BY p.is_pinned DESC, p.created_at DESC, p.rowid DESC",
        };

        let query = format!(
            "{}
             WHERE (p.title IS NULL OR (instr(p.title, ?2) != 1 AND instr(p.title, ?3) != 1))
               AND (?4 IS NULL OR p.instructor_id = ?4)
               AND (?5 IS NULL OR p.course_id = ?5)
               AND (?6 IS NULL OR p.category = ?6)
             {}
             LIMIT ?7",
            POST_SELECT, order_clause
        );

        let mut stmt = conn.prepare(&query)?;
        let posts = stmt
            .query_map(
                params![
                    viewer.map(|id| id.to_string()),
                    METADATA_TAG,
                    MESSAGE_TAG_PREFIX,
                    filter.instructor_id.map(|id| id.to_string()),
                    filter.course_id.map(|id| id.to_string()),
                    filter.category.map(|c| c.as_str()),
                    filter.limit.clamp(1, MAX_FEED_LIMIT),
                ],
                Self::map_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(posts)
    }

    /// Get a single post by ID
    pub fn get_by_id(&self, post_id: &Uuid, viewer: Option<&Uuid>) -> Result<Option<CommunityPost>> {
        let conn = self.pool.get()?;
        let post = conn
            .query_row(
                &format!("{} WHERE p.id = ?2", POST_SELECT),
                params![viewer.map(|id| id.to_string()), post_id.to_string()],
                Self::map_row,
            )
            .optional()?;

        Ok(post)
    }

    /// Overwrite the editable fields of a post
    pub fn update(&self, post: &CommunityPost) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE community_posts
             SET category = ?, title = ?, content = ?, image_urls = ?, video_url = ?, updated_at = ?
             WHERE id = ?",
            params![
                post.category.as_str(),
                post.title,
                post.content,
                serde_json::to_string(&post.image_urls)?,
                post.video_url,
                timestamp(&post.updated_at),
                post.id.to_string(),
            ],
        )
        .context("Failed to update post")?;
        Ok(())
    }

    /// Delete a post; likes and comments cascade
    pub fn delete(&self, post_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let removed = conn
            .execute("DELETE FROM community_posts WHERE id = ?", [post_id.to_string()])
            .context("Failed to delete post")?;
        Ok(removed > 0)
    }

    /// Flip the pinned flag in place and return the new value.
    ///
    /// The category column is left untouched.
    pub fn toggle_pin(&self, post_id: &Uuid) -> Result<Option<bool>> {
        let conn = self.pool.get()?;
        let pinned = conn
            .query_row(
                "UPDATE community_posts SET is_pinned = 1 - is_pinned WHERE id = ? RETURNING is_pinned",
                [post_id.to_string()],
                |row| get_bool(row, 0),
            )
            .optional()
            .context("Failed to toggle pin")?;
        Ok(pinned)
    }
}
