use axum::Json;

use crate::api::ApiResult;
use crate::video::parse_video_url;
use cohort_types::{ParseVideoRequest, VideoLink};

/// POST /videos/parse - Recognize a YouTube or Loom link
pub async fn parse_video(Json(payload): Json<ParseVideoRequest>) -> ApiResult<Json<VideoLink>> {
    Ok(Json(parse_video_url(&payload.url)?))
}
