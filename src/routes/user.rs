use axum::http::HeaderMap;

use crate::routes::error::{ApiError, ApiResult};

/// Header carrying the authenticated username, set by the upstream auth layer.
pub const USER_HEADER: &str = "x-user";

/// Longest username the `created_by`/`owner` columns hold.
const MAX_USER_LEN: usize = 255;

/// Username of the caller, `anonymous` when the header is absent or empty.
pub fn requesting_user(headers: &HeaderMap) -> ApiResult<String> {
    let user = headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .unwrap_or("anonymous");

    if user.chars().count() > MAX_USER_LEN {
        return Err(ApiError::Validation(format!(
            "{USER_HEADER} must be at most {MAX_USER_LEN} characters"
        )));
    }
    Ok(user.to_string())
}
