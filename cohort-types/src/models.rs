use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::enums::{DomainStatus, MemberRole, PostCategory, ProfileRole, VideoProvider};

/// Maximum characters allowed in a feed post body
pub const MAX_POST_CONTENT_CHARS: usize = 5000;
/// Maximum characters allowed in a community message
pub const MAX_MESSAGE_CONTENT_CHARS: usize = 4000;
/// Maximum characters allowed in a community name
pub const MAX_COMMUNITY_NAME_CHARS: usize = 120;

// Custom serde module for DateTime to ensure RFC3339 string format
mod datetime_format {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<DateTime<Utc>>().map_err(serde::de::Error::custom)
    }
}

/// Distinguishes an absent field from an explicit `null` in partial updates.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub role: ProfileRole,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub instructor_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub is_published: bool,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityPost {
    pub id: Uuid,
    pub instructor_id: Uuid,
    pub author_id: Uuid,
    /// Joined from the author's profile
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_avatar_url: Option<String>,
    pub course_id: Option<Uuid>,
    pub category: PostCategory,
    pub title: Option<String>,
    pub content: String,
    #[serde(default)]
    pub image_urls: Vec<String>,
    pub video_url: Option<String>,
    pub is_pinned: bool,
    pub like_count: i64,
    pub comment_count: i64,
    /// Whether the requesting profile liked this post (false when anonymous)
    #[serde(default)]
    pub viewer_has_liked: bool,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "datetime_format")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostComment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    #[serde(default)]
    pub author_name: String,
    pub content: String,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Community {
    pub id: Uuid,
    pub instructor_id: Uuid,
    pub name: String,
    pub description: String,
    pub course_id: Option<Uuid>,
    /// Joined from the linked course
    #[serde(default)]
    pub course_name: Option<String>,
    pub is_active: bool,
    #[serde(default)]
    pub message_count: i64,
    #[serde(default)]
    pub member_count: i64,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "datetime_format")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityMessage {
    pub id: Uuid,
    pub community_id: Uuid,
    pub author_id: Uuid,
    #[serde(default)]
    pub author_name: String,
    pub content: String,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "datetime_format")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityMember {
    pub community_id: Uuid,
    pub profile_id: Uuid,
    #[serde(default)]
    pub full_name: String,
    pub role: MemberRole,
    #[serde(with = "datetime_format")]
    pub joined_at: DateTime<Utc>,
}

/// A recognized video link with the URLs needed to render it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoLink {
    pub provider: VideoProvider,
    pub video_id: String,
    pub embed_url: String,
    pub thumbnail_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainCheckResult {
    pub domain: String,
    pub status: DomainStatus,
    pub dns_configured: bool,
    pub ssl_active: bool,
    pub message: String,
}

// Request/Response types for API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub category: PostCategory,
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
    #[serde(default)]
    pub course_id: Option<Uuid>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub video_url: Option<String>,
}

impl CreatePostRequest {
    /// Whether the composer may submit this post.
    ///
    /// The category never makes an empty body acceptable.
    pub fn can_submit(&self) -> bool {
        let trimmed = self.content.trim();
        !trimmed.is_empty() && trimmed.chars().count() <= MAX_POST_CONTENT_CHARS
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub category: Option<PostCategory>,
    /// `null` clears the title, absence leaves it unchanged
    #[serde(default, deserialize_with = "nullable")]
    pub title: Option<Option<String>>,
    pub content: String,
    #[serde(default)]
    pub image_urls: Option<Vec<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub video_url: Option<Option<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommunityRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub course_id: Option<Uuid>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCommunityRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// `null` unlinks the course, absence leaves it unchanged
    #[serde(default, deserialize_with = "nullable")]
    pub course_id: Option<Option<Uuid>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageRequest {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub profile: Profile,
    pub session_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ParseVideoRequest {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DomainCheckRequest {
    pub domain: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_request(content: &str, category: PostCategory) -> CreatePostRequest {
        CreatePostRequest {
            category,
            title: None,
            content: content.to_string(),
            course_id: None,
            image_urls: Vec::new(),
            video_url: None,
        }
    }

    #[test]
    fn test_empty_content_cannot_submit_even_with_category() {
        assert!(!post_request("", PostCategory::Announcement).can_submit());
        assert!(!post_request("   \n\t", PostCategory::Question).can_submit());
    }

    #[test]
    fn test_non_empty_content_can_submit() {
        assert!(post_request("Welcome to week one!", PostCategory::Discussion).can_submit());
    }

    #[test]
    fn test_oversized_content_cannot_submit() {
        let body = "a".repeat(MAX_POST_CONTENT_CHARS + 1);
        assert!(!post_request(&body, PostCategory::General).can_submit());
    }

    #[test]
    fn test_update_community_distinguishes_null_from_absent() {
        let absent: UpdateCommunityRequest = serde_json::from_str(r#"{"name":"Alumni"}"#).unwrap();
        assert_eq!(absent.course_id, None);

        let cleared: UpdateCommunityRequest =
            serde_json::from_str(r#"{"course_id":null}"#).unwrap();
        assert_eq!(cleared.course_id, Some(None));
    }

    #[test]
    fn test_update_post_title_null_clears() {
        let absent: UpdatePostRequest = serde_json::from_str(r#"{"content":"hi"}"#).unwrap();
        assert_eq!(absent.title, None);

        let cleared: UpdatePostRequest = serde_json::from_str(r#"{"content":"hi","title":null}"#).unwrap();
        assert_eq!(cleared.title, Some(None));

        let set: UpdatePostRequest = serde_json::from_str(r#"{"content":"hi","title":"Recap"}"#).unwrap();
        assert_eq!(set.title, Some(Some("Recap".to_string())));
    }

    #[test]
    fn test_create_community_defaults_to_active() {
        let req: CreateCommunityRequest = serde_json::from_str(r#"{"name":"Cohort 7"}"#).unwrap();
        assert!(req.is_active);
        assert!(req.description.is_empty());
    }
}
