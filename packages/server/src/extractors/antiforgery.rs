use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use rand::RngCore;
use subtle::ConstantTimeEq;

use crate::config::AntiForgeryConfig;
use crate::error::AppError;
use crate::state::AppState;

/// Proof that a form post carried the anti-forgery token issued with the form.
///
/// Add this as a handler parameter on every mutating POST. The token travels
/// twice: in the cookie set by [`issue_token`] and in the request header named
/// by `antiforgery.header_name`. Both must be present and equal.
pub struct AntiForgery;

impl FromRequestParts<AppState> for AntiForgery {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let config = &state.config.antiforgery;

        let jar = CookieJar::from_headers(&parts.headers);
        let cookie = jar
            .get(&config.cookie_name)
            .map(|c| c.value().to_owned())
            .ok_or(AppError::AntiForgery)?;

        let header = parts
            .headers
            .get(config.header_name.as_str())
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::AntiForgery)?;

        if cookie.is_empty() || !tokens_match(&cookie, header) {
            tracing::warn!("Anti-forgery token mismatch");
            return Err(AppError::AntiForgery);
        }

        Ok(AntiForgery)
    }
}

/// Issue a fresh token: set it on `jar` and return it for embedding in the page.
pub fn issue_token(jar: CookieJar, config: &AntiForgeryConfig) -> (CookieJar, String) {
    let token = generate_token();
    let cookie = Cookie::build((config.cookie_name.clone(), token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(config.secure_cookie)
        .build();
    (jar.add(cookie), token)
}

fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Constant-time comparison. Unequal lengths never match.
fn tokens_match(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
