use axum::{
    extract::State,
    http::HeaderMap,
    Json,
};
use cohort_types::{LoginRequest, LoginResponse, Profile};
use serde::Serialize;
use uuid::Uuid;

use crate::db::repositories::ProfileRepository;
use crate::state::AppState;
use super::{ApiError, ApiResult};

/// Header carrying the session token on authenticated requests
pub const SESSION_HEADER: &str = "X-Session-Token";

/// Response for session validation
#[derive(Serialize)]
pub struct ValidateSessionResponse {
    pub profile: Profile,
    pub valid: bool,
}

fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok())
}

/// Resolve the acting profile, or fail with 401
pub fn require_actor(state: &AppState, headers: &HeaderMap) -> ApiResult<Uuid> {
    let not_authenticated = || ApiError::Unauthorized("Not authenticated".to_string());
    let token = session_token(headers).ok_or_else(not_authenticated)?;
    state.authenticated_profile(token)?.ok_or_else(not_authenticated)
}

/// Resolve the viewing profile when a valid session is present
pub fn optional_actor(state: &AppState, headers: &HeaderMap) -> Option<Uuid> {
    let token = session_token(headers)?;
    match state.authenticated_profile(token) {
        Ok(profile) => profile,
        Err(e) => {
            tracing::error!("Failed to resolve viewer session: {:#}", e);
            None
        }
    }
}

/// GET /profiles/test - List the seeded accounts available for login
pub async fn list_test_profiles(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Profile>>> {
    let repo = ProfileRepository::new(state.db.pool.clone());
    let profiles = repo.get_test_profiles()?;
    Ok(Json(profiles))
}

/// POST /auth/login - Log in as a seeded account by email
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let repo = ProfileRepository::new(state.db.pool.clone());

    let profile = repo
        .get_by_email(&payload.email)?
        .ok_or_else(|| ApiError::NotFound(format!("No account for '{}'", payload.email.trim())))?;

    let session_token = state.session_manager.create_session(profile.id)?;
    tracing::info!("{} logged in", profile.full_name);

    Ok(Json(LoginResponse {
        profile,
        session_token,
    }))
}

/// POST /auth/logout - End the current session
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let token = session_token(&headers)
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

    state.session_manager.delete_session(token)?;

    Ok(Json(serde_json::json!({
        "message": "Logged out successfully"
    })))
}

/// GET /auth/validate - Check the current session and return its profile
pub async fn validate_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<ValidateSessionResponse>> {
    let profile_id = require_actor(&state, &headers)?;

    let profile = ProfileRepository::new(state.db.pool.clone())
        .get_by_id(&profile_id)?
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

    Ok(Json(ValidateSessionResponse {
        profile,
        valid: true,
    }))
}
