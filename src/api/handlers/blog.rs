//! # Blog Handlers
//!
//! صفحات عمومی وبلاگ: لیست و جزئیات پست‌ها، جستجو، برچسب‌ها،
//! نویسنده‌ها و دسته‌بندی‌ها

use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use serde::Deserialize;

use super::{found, post_url, public_context, render, see_other};
use crate::{
    api::extractors::{CurrentUser, FormData, OptionalUser},
    error::{AppError, Result},
    models::{CommentForm, PageQuery, SearchQuery},
    services::AppState,
    utils::encode_query_value,
};

/// پارامتر پیام بعد از ثبت نظر
#[derive(Debug, Default, Deserialize)]
pub struct DetailQuery {
    pub comment: Option<String>,
}

// =====================================
// Post List
// =====================================
/// مسیر تنبل لیست پست‌ها
///
/// # Endpoint
/// `GET /blog/post/list/` → 302 `/blog/post/list/page/`
pub async fn post_list_redirect() -> Response {
    found("/blog/post/list/page/")
}

/// لیست صفحه‌بندی شده پست‌های قابل مشاهده
///
/// # Endpoint
/// `GET /blog/post/list/page/?page=2`
pub async fn post_list(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Query(query): Query<PageQuery>,
) -> Result<Response> {
    let page = state.blog_service.list_posts(query.page.as_deref()).await?;

    let mut context = public_context(&state, user.as_ref()).await?;
    context.insert("page", &page);
    context.insert("base_url", "/blog/post/list/page/");
    render(&state, "blog/post_list.html", &context)
}

/// پست‌های یک برچسب
///
/// # Endpoint
/// `GET /blog/post/list/tag/:tag_slug/`
pub async fn post_list_by_tag(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Path(tag_slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response> {
    let (tag, page) = state
        .blog_service
        .list_by_tag(&tag_slug, query.page.as_deref())
        .await?;

    let mut context = public_context(&state, user.as_ref()).await?;
    context.insert("base_url", &format!("/blog/post/list/tag/{}/", encode_query_value(&tag.slug)));
    context.insert("tag", &tag);
    context.insert("page", &page);
    render(&state, "blog/post_list.html", &context)
}

/// جستجو در پست‌های قابل مشاهده
///
/// # Endpoint
/// `GET /blog/post/search/list/?query=راست`
pub async fn post_search(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Query(search): Query<SearchQuery>,
) -> Result<Response> {
    let query = search.query.unwrap_or_default();
    let mut context = public_context(&state, user.as_ref()).await?;

    match state.blog_service.search(&query).await? {
        Ok(results) => context.insert("results", &results),
        Err(errors) => {
            context.insert("results", &Vec::<()>::new());
            context.insert("errors", &errors);
        }
    }
    context.insert("search", &true);
    context.insert("query", &query);
    render(&state, "blog/post_list.html", &context)
}

/// پست‌های یک نویسنده
///
/// # Endpoint
/// `GET /blog/post/list/author/:username/`
pub async fn author_posts(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response> {
    let (author, page) = state
        .blog_service
        .list_by_author(&username, query.page.as_deref())
        .await?;

    let mut context = public_context(&state, user.as_ref()).await?;
    context.insert(
        "base_url",
        &format!("/blog/post/list/author/{}/", encode_query_value(&author.username)),
    );
    context.insert("author", &author);
    context.insert("page", &page);
    render(&state, "blog/author_post_list.html", &context)
}

// =====================================
// Post Detail
// =====================================
/// جزئیات پست (شمارنده بازدید زیاد میشه)
///
/// # Endpoint
/// `GET /blog/post/detail/:slug/`
pub async fn post_detail(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Path(slug): Path<String>,
    Query(query): Query<DetailQuery>,
) -> Result<Response> {
    let detail = state.blog_service.post_detail(&slug).await?;

    let mut context = public_context(&state, user.as_ref()).await?;
    context.insert("post", &detail.post);
    context.insert("similar_posts", &detail.similar_posts);
    context.insert("comments", &detail.comments);
    context.insert("comment_sent", &(query.comment.as_deref() == Some("sent")));
    render(&state, "blog/post_detail.html", &context)
}

/// ثبت نظر برای پست
///
/// نظر غیرفعال ذخیره میشه تا نویسنده تاییدش کنه
///
/// # Endpoint
/// `POST /blog/post/detail/:slug/comment/`
pub async fn post_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(slug): Path<String>,
    FormData(form): FormData<CommentForm>,
) -> Result<Response> {
    match state.blog_service.add_comment(&slug, &user, &form).await {
        Ok(_) => Ok(see_other(format!("{}?comment=sent", post_url(&slug)))),
        Err(AppError::InvalidForm(errors)) => {
            let detail = state.blog_service.post_detail(&slug).await?;

            let mut context = public_context(&state, Some(&user)).await?;
            context.insert("post", &detail.post);
            context.insert("similar_posts", &detail.similar_posts);
            context.insert("comments", &detail.comments);
            context.insert("comment_form", &form);
            context.insert("errors", &errors);
            render(&state, "blog/post_detail.html", &context)
        }
        Err(err) => Err(err),
    }
}

// =====================================
// Categories & Tags
// =====================================
/// دسته‌بندی‌های فعال
///
/// # Endpoint
/// `GET /blog/category/list/`
pub async fn category_list(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
) -> Result<Response> {
    let categories = state.blog_service.categories().await?;

    let mut context = public_context(&state, user.as_ref()).await?;
    context.insert("categories", &categories);
    render(&state, "blog/category_list.html", &context)
}

/// دسته‌بندی و پست‌های قابل مشاهده‌اش
///
/// # Endpoint
/// `GET /blog/category/detail/:slug/`
pub async fn category_detail(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Path(slug): Path<String>,
) -> Result<Response> {
    let (category, posts) = state.blog_service.category_detail(&slug).await?;

    let mut context = public_context(&state, user.as_ref()).await?;
    context.insert("category", &category);
    context.insert("posts", &posts);
    render(&state, "blog/category_detail.html", &context)
}

/// همه برچسب‌ها
///
/// # Endpoint
/// `GET /blog/tag/list/`
pub async fn tag_list(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
) -> Result<Response> {
    let tags = state.blog_service.tags().await?;

    let mut context = public_context(&state, user.as_ref()).await?;
    context.insert("tags", &tags);
    render(&state, "blog/tag_list.html", &context)
}
