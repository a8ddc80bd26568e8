use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    api::auth::{optional_actor, require_actor},
    api::{ApiError, ApiResult},
    api::ensure_course_owner,
    db::repositories::{CommentRepository, FeedFilter, LikeRepository, PostRepository, ProfileRepository},
    legacy::{MESSAGE_TAG_PREFIX, METADATA_TAG},
    state::AppState,
    video::parse_video_url,
};
use cohort_types::{
    CommunityPost, CreateCommentRequest, CreatePostRequest, FeedSort, PostCategory, PostComment,
    UpdatePostRequest, MAX_POST_CONTENT_CHARS,
};

#[derive(Deserialize)]
pub struct GetPostsQuery {
    #[serde(default)]
    instructor_id: Option<Uuid>,
    #[serde(default)]
    course_id: Option<Uuid>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    sort: Option<String>,
    #[serde(default = "default_limit")]
    limit: i64,
}

fn default_limit() -> i64 {
    50
}

#[derive(Serialize, Deserialize)]
pub struct PinResponse {
    pub id: Uuid,
    pub is_pinned: bool,
}

#[derive(Serialize, Deserialize)]
pub struct LikeResponse {
    pub post_id: Uuid,
    pub liked: bool,
    pub like_count: i64,
}

fn validate_content(content: &str) -> ApiResult<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest("Content cannot be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_POST_CONTENT_CHARS {
        return Err(ApiError::BadRequest(format!(
            "Content exceeds {} characters",
            MAX_POST_CONTENT_CHARS
        )));
    }
    Ok(trimmed.to_string())
}

/// Blank means no video; anything else must be a recognized link
fn validate_video_url(video_url: Option<&str>) -> ApiResult<Option<String>> {
    match video_url.map(str::trim) {
        None | Some("") => Ok(None),
        Some(url) => {
            parse_video_url(url)?;
            Ok(Some(url.to_string()))
        }
    }
}

/// Blank means no title. Community tags are reserved: the feed hides
/// tagged rows and the migration tool treats them as community data.
fn validate_title(title: Option<&str>) -> ApiResult<Option<String>> {
    let Some(title) = title.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    if title.starts_with(METADATA_TAG) || title.starts_with(MESSAGE_TAG_PREFIX) {
        return Err(ApiError::BadRequest(format!(
            "Titles may not start with '{}' or '{}'",
            METADATA_TAG, MESSAGE_TAG_PREFIX
        )));
    }
    Ok(Some(title.to_string()))
}

fn load_post(repo: &PostRepository, post_id: &Uuid, viewer: Option<&Uuid>) -> ApiResult<CommunityPost> {
    repo.get_by_id(post_id, viewer)?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))
}

/// GET /posts - Community feed
pub async fn get_posts(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<GetPostsQuery>,
) -> ApiResult<Json<Vec<CommunityPost>>> {
    let category = match query.category.as_deref() {
        Some(raw) => Some(
            PostCategory::parse(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown category '{}'", raw)))?,
        ),
        None => None,
    };
    let sort = match query.sort.as_deref() {
        Some(raw) => FeedSort::parse(raw)
            .ok_or_else(|| ApiError::BadRequest(format!("Unknown sort '{}'", raw)))?,
        None => FeedSort::default(),
    };

    let filter = FeedFilter {
        instructor_id: query.instructor_id,
        course_id: query.course_id,
        category,
        sort,
        limit: query.limit,
    };

    let viewer = optional_actor(&state, &headers);
    let posts = PostRepository::new(state.db.pool.clone()).get_feed(&filter, viewer.as_ref())?;
    Ok(Json(posts))
}

/// POST /posts - Publish a post as the acting instructor
pub async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreatePostRequest>,
) -> ApiResult<(StatusCode, Json<CommunityPost>)> {
    let actor = require_actor(&state, &headers)?;

    if !payload.can_submit() {
        return Err(ApiError::BadRequest(format!(
            "Post content must be between 1 and {} characters",
            MAX_POST_CONTENT_CHARS
        )));
    }
    let content = payload.content.trim().to_string();
    let title = validate_title(payload.title.as_deref())?;
    let video_url = validate_video_url(payload.video_url.as_deref())?;
    ensure_course_owner(&state, payload.course_id.as_ref(), &actor)?;

    let now = Utc::now();
    let post = CommunityPost {
        id: Uuid::new_v4(),
        instructor_id: actor,
        author_id: actor,
        author_name: String::new(),
        author_avatar_url: None,
        course_id: payload.course_id,
        category: payload.category,
        title,
        content,
        image_urls: payload.image_urls,
        video_url,
        is_pinned: false,
        like_count: 0,
        comment_count: 0,
        viewer_has_liked: false,
        created_at: now,
        updated_at: now,
    };

    let repo = PostRepository::new(state.db.pool.clone());
    repo.create(&post)?;
    tracing::info!("Post {} created by {}", post.id, actor);

    let created = load_post(&repo, &post.id, Some(&actor))?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /posts/:id - Get a single post
pub async fn get_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<Uuid>,
) -> ApiResult<Json<CommunityPost>> {
    let viewer = optional_actor(&state, &headers);
    let repo = PostRepository::new(state.db.pool.clone());
    Ok(Json(load_post(&repo, &post_id, viewer.as_ref())?))
}

/// PUT /posts/:id - Edit a post (author only)
pub async fn update_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<Uuid>,
    Json(payload): Json<UpdatePostRequest>,
) -> ApiResult<Json<CommunityPost>> {
    let actor = require_actor(&state, &headers)?;
    let repo = PostRepository::new(state.db.pool.clone());

    let mut post = load_post(&repo, &post_id, Some(&actor))?;
    if post.author_id != actor {
        return Err(ApiError::Forbidden("Only the author can edit this post".to_string()));
    }

    post.content = validate_content(&payload.content)?;
    if let Some(category) = payload.category {
        post.category = category;
    }
    if let Some(title) = payload.title {
        post.title = validate_title(title.as_deref())?;
    }
    if let Some(image_urls) = payload.image_urls {
        post.image_urls = image_urls;
    }
    if let Some(video_url) = payload.video_url {
        post.video_url = validate_video_url(video_url.as_deref())?;
    }
    post.updated_at = Utc::now();

    repo.update(&post)?;
    Ok(Json(load_post(&repo, &post_id, Some(&actor))?))
}

/// DELETE /posts/:id - Delete a post with its likes and comments (author only)
pub async fn delete_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let actor = require_actor(&state, &headers)?;
    let repo = PostRepository::new(state.db.pool.clone());

    let post = load_post(&repo, &post_id, None)?;
    if post.author_id != actor {
        return Err(ApiError::Forbidden("Only the author can delete this post".to_string()));
    }

    repo.delete(&post_id)?;
    tracing::info!("Post {} deleted", post_id);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /posts/:id/pin - Toggle the pinned flag (post's instructor only)
pub async fn toggle_pin(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<Uuid>,
) -> ApiResult<Json<PinResponse>> {
    let actor = require_actor(&state, &headers)?;
    let repo = PostRepository::new(state.db.pool.clone());

    let post = load_post(&repo, &post_id, None)?;
    if post.instructor_id != actor {
        return Err(ApiError::Forbidden("Only the instructor can pin posts".to_string()));
    }

    let is_pinned = repo
        .toggle_pin(&post_id)?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    Ok(Json(PinResponse { id: post_id, is_pinned }))
}

async fn set_like(state: AppState, headers: HeaderMap, post_id: Uuid, liked: bool) -> ApiResult<Json<LikeResponse>> {
    let actor = require_actor(&state, &headers)?;
    let likes = LikeRepository::new(state.db.pool.clone());

    if likes.count(&post_id)?.is_none() {
        return Err(ApiError::NotFound("Post not found".to_string()));
    }

    if liked {
        likes.like(&post_id, &actor)?;
    } else {
        likes.unlike(&post_id, &actor)?;
    }

    let like_count = likes
        .count(&post_id)?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    Ok(Json(LikeResponse {
        post_id,
        liked,
        like_count,
    }))
}

/// POST /posts/:id/like
pub async fn like_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<Uuid>,
) -> ApiResult<Json<LikeResponse>> {
    set_like(state, headers, post_id, true).await
}

/// DELETE /posts/:id/like
pub async fn unlike_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<Uuid>,
) -> ApiResult<Json<LikeResponse>> {
    set_like(state, headers, post_id, false).await
}

/// GET /posts/:id/comments - Comments, oldest first
pub async fn get_comments(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> ApiResult<Json<Vec<PostComment>>> {
    let pool = state.db.pool.clone();
    load_post(&PostRepository::new(pool.clone()), &post_id, None)?;

    let comments = CommentRepository::new(pool).get_by_post(&post_id)?;
    Ok(Json(comments))
}

/// POST /posts/:id/comments - Comment on a post
pub async fn add_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<Uuid>,
    Json(payload): Json<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<PostComment>)> {
    let actor = require_actor(&state, &headers)?;
    let content = validate_content(&payload.content)?;
    let pool = state.db.pool.clone();

    load_post(&PostRepository::new(pool.clone()), &post_id, None)?;
    let author = ProfileRepository::new(pool.clone())
        .get_by_id(&actor)?
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

    let comment = PostComment {
        id: Uuid::new_v4(),
        post_id,
        author_id: actor,
        author_name: author.full_name,
        content,
        created_at: Utc::now(),
    };
    CommentRepository::new(pool).create(&comment)?;

    Ok((StatusCode::CREATED, Json(comment)))
}
