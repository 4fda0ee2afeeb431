use super::error::WebError;
use super::{antiforgery, views, AppState};
use crate::model::NewBlog;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;
use tracing::{info, instrument};

/// Fields posted by the create form.
#[derive(Debug, Default, Deserialize)]
pub struct BlogForm {
    #[serde(rename = "Url", default)]
    pub url: Option<String>,
    #[serde(rename = "__RequestVerificationToken", default)]
    pub request_verification_token: Option<String>,
}

impl BlogForm {
    /// `Url` is required; blank counts as missing. A present value is saved as
    /// submitted.
    pub fn validate(&self) -> Result<NewBlog, Vec<&'static str>> {
        match self.url.as_deref() {
            Some(url) if !url.trim().is_empty() => Ok(NewBlog::new(url)),
            _ => Err(vec![views::URL_REQUIRED]),
        }
    }
}

#[instrument(skip_all)]
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, WebError> {
    let ctx = state.context();
    let blogs = ctx.blogs().await?;
    Ok(Html(views::blog_index(&blogs)))
}

pub async fn create_form() -> impl IntoResponse {
    let token = antiforgery::issue();
    (
        [(SET_COOKIE, antiforgery::set_cookie(&token))],
        Html(views::blog_create("", &[], &token)),
    )
}

#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<BlogForm>,
) -> Result<Response, WebError> {
    antiforgery::validate(&headers, form.request_verification_token.as_deref())?;

    match form.validate() {
        Ok(blog) => {
            let mut ctx = state.context();
            ctx.add_blog(blog);
            let saved = ctx.save_changes().await?;
            info!(saved, "blog created");
            Ok(Redirect::to("/blogs").into_response())
        }
        Err(errors) => {
            let token = form.request_verification_token.as_deref().unwrap_or_default();
            let url = form.url.as_deref().unwrap_or_default();
            Ok(Html(views::blog_create(url, &errors, token)).into_response())
        }
    }
}
