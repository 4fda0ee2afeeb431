//! Web sample: list blogs and create new ones through an HTML form.
//!
//! Every request builds its own `BloggingContext`, so tracked entities never
//! outlive the request that added them.

pub mod antiforgery;
pub mod error;
pub mod handlers;
pub mod views;

use crate::context::BloggingContext;
use crate::db::Pool;
use crate::model::SchemaVariant;
use axum::response::Redirect;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

#[derive(Debug, Clone)]
pub struct AppState {
    pool: Pool,
    variant: SchemaVariant,
}

impl AppState {
    pub fn new(pool: Pool, variant: SchemaVariant) -> Self {
        Self { pool, variant }
    }

    pub fn context(&self) -> BloggingContext {
        BloggingContext::new(self.pool.clone(), self.variant)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to("/blogs") }))
        .route("/blogs", get(handlers::index))
        .route(
            "/blogs/create",
            get(handlers::create_form).post(handlers::create),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
