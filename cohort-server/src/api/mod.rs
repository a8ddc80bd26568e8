pub mod auth;
pub mod communities;
pub mod demo;
pub mod error;
pub mod posts;
pub mod settings;
pub mod videos;

pub use error::{ApiError, ApiResult};

use uuid::Uuid;

use crate::{db::repositories::CourseRepository, state::AppState};

/// A linked course must be taught by the acting instructor
pub(crate) fn ensure_course_owner(state: &AppState, course_id: Option<&Uuid>, actor: &Uuid) -> ApiResult<()> {
    if let Some(course_id) = course_id {
        if !CourseRepository::new(state.db.pool.clone()).is_taught_by(course_id, actor)? {
            return Err(ApiError::BadRequest("Course does not belong to this instructor".to_string()));
        }
    }
    Ok(())
}
