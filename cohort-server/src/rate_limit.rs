use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::api::ApiError;
use crate::api::auth::SESSION_HEADER;

/// Fixed-window in-memory rate limiter keyed by session token
#[derive(Clone)]
pub struct RateLimiter {
    // session_token -> (request_count, window_start)
    state: Arc<Mutex<HashMap<String, (u32, Instant)>>>,
    max_requests: u32,
    window_duration: Duration,
}

impl RateLimiter {
    /// Entries beyond this count trigger a sweep of stale windows
    const SWEEP_THRESHOLD: usize = 10_000;

    pub fn new(max_requests: u32, window_seconds: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window_duration: Duration::from_secs(window_seconds),
        }
    }

    /// Record a request for `token`; `Err` carries the seconds until the window resets.
    pub fn check_rate_limit(&self, token: &str) -> Result<(), u64> {
        self.check_at(token, Instant::now())
    }

    fn check_at(&self, token: &str, now: Instant) -> Result<(), u64> {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if state.len() > Self::SWEEP_THRESHOLD {
            state.retain(|_, (_, start)| now.duration_since(*start) < self.window_duration * 2);
        }

        match state.get_mut(token) {
            Some((count, window_start)) => {
                let elapsed = now.duration_since(*window_start);
                if elapsed < self.window_duration {
                    if *count >= self.max_requests {
                        return Err((self.window_duration - elapsed).as_secs().max(1));
                    }
                    *count += 1;
                } else {
                    *window_start = now;
                    *count = 1;
                }
            }
            None => {
                state.insert(token.to_string(), (1, now));
            }
        }

        Ok(())
    }
}

/// Applies the limiter to every request that carries a session token
pub async fn rate_limit_middleware(
    axum::Extension(limiter): axum::Extension<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok());

    if let Some(token) = token {
        if let Err(retry_after) = limiter.check_rate_limit(token) {
            tracing::warn!("Rate limit exceeded for a session");
            return ApiError::TooManyRequests(format!(
                "Rate limit exceeded. Try again in {} seconds.",
                retry_after
            ))
            .into_response();
        }
    }

    next.run(request).await
}
