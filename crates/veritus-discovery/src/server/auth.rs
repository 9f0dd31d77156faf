//! Cookie-based caller identification.
//!
//! Registration sets a long-lived HttpOnly cookie holding the user id; its presence
//! is what marks a caller as authenticated.

use axum::http::HeaderValue;
use axum_extra::extract::CookieJar;

use crate::config::USER_COOKIE;
use crate::coordinator::Caller;

/// Cookie lifetime: one year.
pub const COOKIE_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 365;

/// Identify the caller from the request cookies.
#[must_use]
pub fn caller_from_jar(jar: &CookieJar) -> Caller {
    jar.get(USER_COOKIE)
        .map(|c| c.value().trim())
        .filter(|v| !v.is_empty())
        .map_or(Caller::Anonymous, |v| Caller::User(v.to_string()))
}

/// `Set-Cookie` value for a freshly registered user.
///
/// # Errors
///
/// Returns error if the id contains characters not allowed in a header.
pub fn user_cookie(user_id: &str, secure: bool) -> Result<HeaderValue, axum::http::header::InvalidHeaderValue> {
    let secure = if secure { "; Secure" } else { "" };
    HeaderValue::from_str(&format!(
        "{USER_COOKIE}={user_id}; Path=/; Max-Age={COOKIE_MAX_AGE_SECS}; HttpOnly; SameSite=Strict{secure}"
    ))
}
