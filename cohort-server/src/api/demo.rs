use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::Value;

use crate::api::auth::require_actor;
use crate::api::ApiResult;
use crate::demo_store::{DemoCollection, DemoStoreError};
use crate::state::AppState;

fn collection(name: &str) -> Result<DemoCollection, DemoStoreError> {
    DemoCollection::parse(name).ok_or_else(|| DemoStoreError::UnknownCollection(name.to_string()))
}

/// GET /demo/:collection
pub async fn load_collection(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Vec<Value>>> {
    Ok(Json(state.demo_store.load(collection(&name)?)?))
}

/// PUT /demo/:collection - Replace the whole collection
pub async fn save_collection(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(name): Path<String>,
    Json(items): Json<Vec<Value>>,
) -> ApiResult<Json<Vec<Value>>> {
    require_actor(&state, &headers)?;
    let collection = collection(&name)?;

    let saved = state.demo_store.save(collection, items)?;
    tracing::debug!("Saved {} items to demo collection {}", saved.len(), collection.as_str());
    Ok(Json(saved))
}

/// DELETE /demo/:collection
pub async fn clear_collection(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> ApiResult<StatusCode> {
    require_actor(&state, &headers)?;
    state.demo_store.clear(collection(&name)?)?;
    Ok(StatusCode::NO_CONTENT)
}
