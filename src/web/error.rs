use super::views;
use crate::context::ContextError;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum WebError {
    #[error("anti-forgery token missing or invalid")]
    AntiForgery,
    #[error(transparent)]
    Context(#[from] ContextError),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            WebError::AntiForgery => {
                warn!("rejected form post without a valid anti-forgery token");
                let status = StatusCode::BAD_REQUEST;
                let page = views::error_page(
                    status,
                    "The form could not be verified. Reload it and try again.",
                );
                (status, Html(page)).into_response()
            }
            WebError::Context(err) => {
                error!(?err, "request failed");
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                let page = views::error_page(
                    status,
                    "An error occurred while processing your request.",
                );
                (status, Html(page)).into_response()
            }
        }
    }
}
