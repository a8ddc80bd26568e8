use axum::{extract::State, http::HeaderMap, Json};

use crate::api::auth::require_actor;
use crate::api::ApiResult;
use crate::domain_check::validate_domain;
use crate::state::AppState;
use cohort_types::{DomainCheckRequest, DomainCheckResult};

/// POST /settings/domain/check - Verify a custom domain
pub async fn check_domain(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<DomainCheckRequest>,
) -> ApiResult<Json<DomainCheckResult>> {
    require_actor(&state, &headers)?;
    let domain = validate_domain(&payload.domain)?;

    let result = state.domain_checker.check(&domain).await?;
    Ok(Json(result))
}
