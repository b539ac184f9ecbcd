//! # Page Handlers
//!
//! صفحه اصلی، درباره ما و صفحه 404 برای مسیرهای ناشناخته

use axum::{
    extract::{OriginalUri, State},
    response::Response,
};

use super::{public_context, render};
use crate::{
    api::extractors::OptionalUser,
    error::{AppError, Result},
    services::AppState,
};

/// صفحه اصلی: تازه‌ترین پست‌ها
///
/// # Endpoint
/// `GET /`
pub async fn index(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
) -> Result<Response> {
    let posts = state.blog_service.recent_posts().await?;

    let mut context = public_context(&state, user.as_ref()).await?;
    context.insert("posts", &posts);
    render(&state, "pages/index.html", &context)
}

/// # Endpoint
/// `GET /about/`
pub async fn about(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
) -> Result<Response> {
    let context = public_context(&state, user.as_ref()).await?;
    render(&state, "pages/about.html", &context)
}

/// مسیرهای ناشناخته؛ صفحه 404 توسط middleware رندر میشه
pub async fn not_found(OriginalUri(uri): OriginalUri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}
