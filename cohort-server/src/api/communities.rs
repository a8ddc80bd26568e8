use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    api::auth::require_actor,
    api::{ensure_course_owner, ApiError, ApiResult},
    db::repositories::{CommunityRepository, CourseRepository, MemberRepository, MessageRepository},
    state::AppState,
};
use cohort_types::{
    Community, CommunityMember, CommunityMessage, Course, CreateCommunityRequest, MemberRole,
    MessageRequest, UpdateCommunityRequest, MAX_COMMUNITY_NAME_CHARS, MAX_MESSAGE_CONTENT_CHARS,
};

#[derive(Serialize, Deserialize)]
pub struct DeleteCommunityResponse {
    pub id: Uuid,
    pub messages_removed: usize,
}

#[derive(Serialize, Deserialize)]
pub struct MembershipResponse {
    pub community_id: Uuid,
    pub is_member: bool,
    /// False when the request did not change anything
    pub changed: bool,
}

fn validate_name(name: &str) -> ApiResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest("Community name is required".to_string()));
    }
    if trimmed.chars().count() > MAX_COMMUNITY_NAME_CHARS {
        return Err(ApiError::BadRequest(format!(
            "Community name exceeds {} characters",
            MAX_COMMUNITY_NAME_CHARS
        )));
    }
    Ok(trimmed.to_string())
}

fn validate_message(content: &str) -> ApiResult<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest("Message cannot be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_MESSAGE_CONTENT_CHARS {
        return Err(ApiError::BadRequest(format!(
            "Message exceeds {} characters",
            MAX_MESSAGE_CONTENT_CHARS
        )));
    }
    Ok(trimmed.to_string())
}

fn load_community(repo: &CommunityRepository, community_id: &Uuid) -> ApiResult<Community> {
    repo.get_by_id(community_id)?
        .ok_or_else(|| ApiError::NotFound("Community not found".to_string()))
}

fn load_owned_community(state: &AppState, community_id: &Uuid, actor: &Uuid) -> ApiResult<Community> {
    let community = load_community(&CommunityRepository::new(state.db.pool.clone()), community_id)?;
    if community.instructor_id != *actor {
        return Err(ApiError::Forbidden("Only the community owner can do this".to_string()));
    }
    Ok(community)
}

fn load_message(repo: &MessageRepository, message_id: &Uuid) -> ApiResult<CommunityMessage> {
    repo.get_by_id(message_id)?
        .ok_or_else(|| ApiError::NotFound("Message not found".to_string()))
}

/// GET /instructors/:id/communities - An instructor's communities, newest first
pub async fn get_instructor_communities(
    State(state): State<AppState>,
    Path(instructor_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Community>>> {
    let communities = CommunityRepository::new(state.db.pool.clone()).get_by_instructor(&instructor_id)?;
    Ok(Json(communities))
}

/// GET /instructors/:id/courses - Courses a community or post can be linked to
pub async fn get_instructor_courses(
    State(state): State<AppState>,
    Path(instructor_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Course>>> {
    let courses = CourseRepository::new(state.db.pool.clone()).get_by_instructor(&instructor_id)?;
    Ok(Json(courses))
}

/// POST /communities - Create a community owned by the acting instructor
pub async fn create_community(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateCommunityRequest>,
) -> ApiResult<(StatusCode, Json<Community>)> {
    let actor = require_actor(&state, &headers)?;
    let name = validate_name(&payload.name)?;
    ensure_course_owner(&state, payload.course_id.as_ref(), &actor)?;

    let now = Utc::now();
    let community = Community {
        id: Uuid::new_v4(),
        instructor_id: actor,
        name,
        description: payload.description.trim().to_string(),
        course_id: payload.course_id,
        course_name: None,
        is_active: payload.is_active,
        message_count: 0,
        member_count: 0,
        created_at: now,
        updated_at: now,
    };

    let repo = CommunityRepository::new(state.db.pool.clone());
    repo.create(&community)?;
    tracing::info!("Community '{}' ({}) created by {}", community.name, community.id, actor);

    Ok((StatusCode::CREATED, Json(load_community(&repo, &community.id)?)))
}

/// GET /communities/:id
pub async fn get_community(
    State(state): State<AppState>,
    Path(community_id): Path<Uuid>,
) -> ApiResult<Json<Community>> {
    let repo = CommunityRepository::new(state.db.pool.clone());
    Ok(Json(load_community(&repo, &community_id)?))
}

/// PUT /communities/:id - Partial update (owner only)
pub async fn update_community(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(community_id): Path<Uuid>,
    Json(payload): Json<UpdateCommunityRequest>,
) -> ApiResult<Json<Community>> {
    let actor = require_actor(&state, &headers)?;
    let mut community = load_owned_community(&state, &community_id, &actor)?;

    if let Some(name) = payload.name.as_deref() {
        community.name = validate_name(name)?;
    }
    if let Some(description) = payload.description {
        community.description = description.trim().to_string();
    }
    if let Some(course_id) = payload.course_id {
        ensure_course_owner(&state, course_id.as_ref(), &actor)?;
        community.course_id = course_id;
    }
    if let Some(is_active) = payload.is_active {
        community.is_active = is_active;
    }
    community.updated_at = Utc::now();

    let repo = CommunityRepository::new(state.db.pool.clone());
    repo.update(&community)?;
    Ok(Json(load_community(&repo, &community_id)?))
}

/// DELETE /communities/:id - Remove a community with all its messages (owner only)
pub async fn delete_community(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(community_id): Path<Uuid>,
) -> ApiResult<Json<DeleteCommunityResponse>> {
    let actor = require_actor(&state, &headers)?;
    load_owned_community(&state, &community_id, &actor)?;

    let messages_removed = CommunityRepository::new(state.db.pool.clone())
        .delete(&community_id)?
        .ok_or_else(|| ApiError::NotFound("Community not found".to_string()))?;

    tracing::info!("Community {} deleted with {} messages", community_id, messages_removed);
    Ok(Json(DeleteCommunityResponse {
        id: community_id,
        messages_removed,
    }))
}

/// GET /communities/:id/messages - Conversation, oldest first
///
/// An unknown or deleted community has no messages.
pub async fn get_messages(
    State(state): State<AppState>,
    Path(community_id): Path<Uuid>,
) -> ApiResult<Json<Vec<CommunityMessage>>> {
    let messages = MessageRepository::new(state.db.pool.clone()).get_by_community(&community_id)?;
    Ok(Json(messages))
}

/// POST /communities/:id/messages - Post to an active community you belong to
pub async fn create_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(community_id): Path<Uuid>,
    Json(payload): Json<MessageRequest>,
) -> ApiResult<(StatusCode, Json<CommunityMessage>)> {
    let actor = require_actor(&state, &headers)?;
    let pool = state.db.pool.clone();

    let community = load_community(&CommunityRepository::new(pool.clone()), &community_id)?;
    if !community.is_active {
        return Err(ApiError::BadRequest("Community is not active".to_string()));
    }
    if MemberRepository::new(pool.clone()).get_role(&community_id, &actor)?.is_none() {
        return Err(ApiError::Forbidden("Join the community to post messages".to_string()));
    }
    let content = validate_message(&payload.content)?;

    let now = Utc::now();
    let message = CommunityMessage {
        id: Uuid::new_v4(),
        community_id,
        author_id: actor,
        author_name: String::new(),
        content,
        created_at: now,
        updated_at: now,
    };

    let repo = MessageRepository::new(pool);
    repo.create(&message)?;
    Ok((StatusCode::CREATED, Json(load_message(&repo, &message.id)?)))
}

/// PUT /messages/:id - Edit a message (author only)
pub async fn update_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(message_id): Path<Uuid>,
    Json(payload): Json<MessageRequest>,
) -> ApiResult<Json<CommunityMessage>> {
    let actor = require_actor(&state, &headers)?;
    let repo = MessageRepository::new(state.db.pool.clone());

    let mut message = load_message(&repo, &message_id)?;
    if message.author_id != actor {
        return Err(ApiError::Forbidden("Only the author can edit this message".to_string()));
    }

    message.content = validate_message(&payload.content)?;
    message.updated_at = Utc::now();
    repo.update_content(&message)?;

    Ok(Json(message))
}

/// DELETE /messages/:id - Remove a message (author or community owner)
pub async fn delete_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(message_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let actor = require_actor(&state, &headers)?;
    let pool = state.db.pool.clone();
    let repo = MessageRepository::new(pool.clone());

    let message = load_message(&repo, &message_id)?;
    if message.author_id != actor {
        let role = MemberRepository::new(pool).get_role(&message.community_id, &actor)?;
        if role != Some(MemberRole::Owner) {
            return Err(ApiError::Forbidden("Only the author or the owner can delete this message".to_string()));
        }
    }

    repo.delete(&message_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /communities/:id/members - Owner first, then by join date
pub async fn get_members(
    State(state): State<AppState>,
    Path(community_id): Path<Uuid>,
) -> ApiResult<Json<Vec<CommunityMember>>> {
    let pool = state.db.pool.clone();
    load_community(&CommunityRepository::new(pool.clone()), &community_id)?;

    let members = MemberRepository::new(pool).get_by_community(&community_id)?;
    Ok(Json(members))
}

/// POST /communities/:id/membership - Join; joining twice is a no-op
pub async fn join_community(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(community_id): Path<Uuid>,
) -> ApiResult<Json<MembershipResponse>> {
    let actor = require_actor(&state, &headers)?;
    let pool = state.db.pool.clone();

    let community = load_community(&CommunityRepository::new(pool.clone()), &community_id)?;
    if !community.is_active {
        return Err(ApiError::BadRequest("Community is not active".to_string()));
    }

    let changed = MemberRepository::new(pool).add(&community_id, &actor, MemberRole::Member)?;
    Ok(Json(MembershipResponse {
        community_id,
        is_member: true,
        changed,
    }))
}

/// DELETE /communities/:id/membership - Leave; the owner cannot leave
pub async fn leave_community(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(community_id): Path<Uuid>,
) -> ApiResult<Json<MembershipResponse>> {
    let actor = require_actor(&state, &headers)?;
    let pool = state.db.pool.clone();

    load_community(&CommunityRepository::new(pool.clone()), &community_id)?;
    let members = MemberRepository::new(pool);
    if members.get_role(&community_id, &actor)? == Some(MemberRole::Owner) {
        return Err(ApiError::BadRequest("The owner cannot leave their community".to_string()));
    }

    let changed = members.remove(&community_id, &actor)?;
    Ok(Json(MembershipResponse {
        community_id,
        is_member: false,
        changed,
    }))
}
