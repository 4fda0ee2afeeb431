//! Double-submit anti-forgery token: the form GET sets a cookie and renders
//! the same value in a hidden field; a POST must carry both, equal.

use super::error::WebError;
use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use uuid::Uuid;

pub const COOKIE_NAME: &str = "blogging_antiforgery";
pub const FORM_FIELD: &str = "__RequestVerificationToken";

pub fn issue() -> String {
    Uuid::new_v4().simple().to_string()
}

/// `Set-Cookie` value carrying `token`.
pub fn set_cookie(token: &str) -> String {
    format!("{COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Strict")
}

pub fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == COOKIE_NAME)
        .map(|(_, value)| value.to_string())
}

pub fn validate(headers: &HeaderMap, form_token: Option<&str>) -> Result<(), WebError> {
    match (cookie_token(headers), form_token) {
        (Some(cookie), Some(field)) if !cookie.is_empty() && cookie == field => Ok(()),
        _ => Err(WebError::AntiForgery),
    }
}
