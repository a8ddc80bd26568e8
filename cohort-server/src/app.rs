use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::rate_limit::{self, RateLimiter};
use crate::state::AppState;

/// Build the HTTP router with tracing, CORS and per-session rate limiting
pub fn router(state: AppState, rate_limiter: RateLimiter) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        // Sessions
        .route("/profiles/test", get(api::auth::list_test_profiles))
        .route("/auth/login", post(api::auth::login))
        .route("/auth/logout", post(api::auth::logout))
        .route("/auth/validate", get(api::auth::validate_session))
        // Community feed
        .route("/posts", get(api::posts::get_posts).post(api::posts::create_post))
        .route(
            "/posts/:id",
            get(api::posts::get_post)
                .put(api::posts::update_post)
                .delete(api::posts::delete_post),
        )
        .route("/posts/:id/pin", post(api::posts::toggle_pin))
        .route("/posts/:id/like", post(api::posts::like_post).delete(api::posts::unlike_post))
        .route("/posts/:id/comments", get(api::posts::get_comments).post(api::posts::add_comment))
        // Communities
        .route("/instructors/:id/communities", get(api::communities::get_instructor_communities))
        .route("/instructors/:id/courses", get(api::communities::get_instructor_courses))
        .route("/communities", post(api::communities::create_community))
        .route(
            "/communities/:id",
            get(api::communities::get_community)
                .put(api::communities::update_community)
                .delete(api::communities::delete_community),
        )
        .route(
            "/communities/:id/messages",
            get(api::communities::get_messages).post(api::communities::create_message),
        )
        .route(
            "/messages/:id",
            put(api::communities::update_message).delete(api::communities::delete_message),
        )
        .route("/communities/:id/members", get(api::communities::get_members))
        .route(
            "/communities/:id/membership",
            post(api::communities::join_community).delete(api::communities::leave_community),
        )
        // Tools
        .route("/videos/parse", post(api::videos::parse_video))
        .route("/settings/domain/check", post(api::settings::check_domain))
        .route(
            "/demo/:collection",
            get(api::demo::load_collection)
                .put(api::demo::save_collection)
                .delete(api::demo::clear_collection),
        )
        .with_state(state)
        .layer(middleware::from_fn(rate_limit::rate_limit_middleware))
        .layer(axum::Extension(rate_limiter))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn health_check() -> &'static str {
    "OK"
}
