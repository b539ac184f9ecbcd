//! # Admin Portal Handlers
//!
//! پنل مدیریت نویسنده‌ها و کارمندها. همه handler‌ها `PortalUser` میگیرن:
//! مهمان به فرم ورود میره و کاربر عادی 403 میگیره.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use serde::de::DeserializeOwned;
use tracing::info;

use super::{found, portal_context, post_url, render, see_other};
use crate::{
    api::extractors::{FormData, PortalUser},
    error::{AppError, Result},
    models::{
        Category, CategoryForm, FormErrors, MiniPostForm, ModerationForm, PageQuery,
        PortalActionForm, Post, PostForm, ProfileForm, SearchQuery, User,
    },
    services::AppState,
    utils::encode_query_value,
};

/// تبدیل فیلدهای خام فرم به یک struct
///
/// فرم داشبورد چند عملیات مختلف رو با یک POST میفرسته
fn parse_fields<T: DeserializeOwned>(fields: &HashMap<String, String>) -> Result<T> {
    let value = serde_json::to_value(fields)?;
    serde_json::from_value(value).map_err(|e| AppError::BadRequest(format!("Invalid form data: {}", e)))
}

/// شناسه پست از فیلد `value`
fn parse_post_id(value: &str) -> Result<i64> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid post id '{}'", value)))
}

// =====================================
// Dashboard
// =====================================
async fn render_portal(
    state: &AppState,
    user: &User,
    raw_page: Option<&str>,
    form: &MiniPostForm,
    errors: Option<&FormErrors>,
) -> Result<Response> {
    let stats = state.admin_service.stats().await?;
    let recent_posts = state.admin_service.recent_posts(user, raw_page).await?;
    let categories = state.admin_service.category_choices().await?;

    let mut context = portal_context(state, user);
    context.insert("stats", &stats);
    context.insert("recent_posts", &recent_posts);
    context.insert("categories", &categories);
    context.insert("form", form);
    if let Some(errors) = errors {
        context.insert("errors", errors);
    }
    render(state, "admins/portal.html", &context)
}

/// داشبورد: آمار، پست‌های اخیر و فرم نوشته سریع
///
/// # Endpoint
/// `GET /admins/?page=2`
pub async fn portal(
    State(state): State<AppState>,
    PortalUser(user): PortalUser,
    Query(query): Query<PageQuery>,
) -> Result<Response> {
    render_portal(&state, &user, query.page.as_deref(), &MiniPostForm::default(), None).await
}

/// عملیات داشبورد بر اساس فیلد `requested`
///
/// - `publish_post`: انتشار فوری و رفتن به صفحه عمومی پست
/// - `deactivation`: غیرفعال کردن و برگشت به داشبورد
/// - `post_create`: ساخت پیش‌نویس از فرم سریع
///
/// # Endpoint
/// `POST /admins/`
pub async fn portal_action(
    State(state): State<AppState>,
    PortalUser(user): PortalUser,
    FormData(fields): FormData<HashMap<String, String>>,
) -> Result<Response> {
    let action: PortalActionForm = parse_fields(&fields)?;

    match action.requested.as_str() {
        "publish_post" => {
            let post = state
                .admin_service
                .publish_post(&user, parse_post_id(&action.value)?)
                .await?;
            Ok(see_other(post_url(&post.slug)))
        }
        "deactivation" => {
            state
                .admin_service
                .deactivate_post(&user, parse_post_id(&action.value)?)
                .await?;
            Ok(see_other("/admins/"))
        }
        "post_create" => {
            let form: MiniPostForm = parse_fields(&fields)?;
            match state.admin_service.quick_create_post(&user, form.clone()).await {
                Ok(post) => Ok(see_other(format!("/admins/blog/post/detail/{}/", post.id))),
                Err(AppError::InvalidForm(errors)) => {
                    render_portal(&state, &user, None, &form, Some(&errors)).await
                }
                Err(err) => Err(err),
            }
        }
        "" if !action.query.trim().is_empty() => Ok(see_other(format!(
            "/admins/blog/post/search/list/?query={}",
            encode_query_value(action.query.trim())
        ))),
        other => Err(AppError::BadRequest(format!("Unknown portal action '{}'", other))),
    }
}

// =====================================
// Profile & Terms
// =====================================
/// # Endpoint
/// `GET /admins/profile/`
pub async fn profile_page(
    State(state): State<AppState>,
    PortalUser(user): PortalUser,
) -> Result<Response> {
    let mut context = portal_context(&state, &user);
    context.insert("form", &ProfileForm::from(&user));
    render(&state, "admins/profile.html", &context)
}

/// ویرایش پروفایل
///
/// # Endpoint
/// `POST /admins/profile/`
pub async fn profile_update(
    State(state): State<AppState>,
    PortalUser(user): PortalUser,
    FormData(form): FormData<ProfileForm>,
) -> Result<Response> {
    match state.auth_service.update_profile(&user, &form).await {
        Ok(updated) => {
            let mut context = portal_context(&state, &updated);
            context.insert("form", &ProfileForm::from(&updated));
            context.insert("saved", &true);
            render(&state, "admins/profile.html", &context)
        }
        Err(AppError::InvalidForm(errors)) => {
            let mut context = portal_context(&state, &user);
            context.insert("form", &form);
            context.insert("errors", &errors);
            render(&state, "admins/profile.html", &context)
        }
        Err(err) => Err(err),
    }
}

/// # Endpoint
/// `GET /admins/terms/`
pub async fn terms(State(state): State<AppState>, PortalUser(user): PortalUser) -> Result<Response> {
    render(&state, "admins/terms.html", &portal_context(&state, &user))
}

// =====================================
// Posts
// =====================================
/// # Endpoint
/// `GET /admins/blog/post/list/` → 302 `/admins/blog/post/list/page/`
pub async fn post_list_redirect(PortalUser(_user): PortalUser) -> Response {
    found("/admins/blog/post/list/page/")
}

/// همه پست‌ها
///
/// # Endpoint
/// `GET /admins/blog/post/list/page/`
pub async fn post_list(
    State(state): State<AppState>,
    PortalUser(user): PortalUser,
    Query(query): Query<PageQuery>,
) -> Result<Response> {
    let (_, page) = state.admin_service.list_posts(None, query.page.as_deref()).await?;

    let mut context = portal_context(&state, &user);
    context.insert("posts", &page.items);
    context.insert("page", &page);
    context.insert("base_url", "/admins/blog/post/list/page/");
    render(&state, "admins/blog/post_list.html", &context)
}

/// پست‌های یک کاربر
///
/// # Endpoint
/// `GET /admins/blog/post/list/author/:username/`
pub async fn post_list_by_author(
    State(state): State<AppState>,
    PortalUser(user): PortalUser,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response> {
    let (author, page) = state
        .admin_service
        .list_posts(Some(&username), query.page.as_deref())
        .await?;

    let mut context = portal_context(&state, &user);
    context.insert("author", &author);
    context.insert("posts", &page.items);
    context.insert("page", &page);
    context.insert(
        "base_url",
        &format!("/admins/blog/post/list/author/{}/", encode_query_value(&username)),
    );
    render(&state, "admins/blog/post_list.html", &context)
}

/// جستجو در عنوان همه پست‌ها
///
/// # Endpoint
/// `GET /admins/blog/post/search/list/?query=...`
pub async fn post_search(
    State(state): State<AppState>,
    PortalUser(user): PortalUser,
    Query(search): Query<SearchQuery>,
) -> Result<Response> {
    let query = search.query.unwrap_or_default();
    let mut context = portal_context(&state, &user);

    match state.admin_service.search_posts(&query).await? {
        Ok(results) => context.insert("posts", &results),
        Err(errors) => {
            context.insert("posts", &Vec::<()>::new());
            context.insert("errors", &errors);
        }
    }
    context.insert("search", &true);
    context.insert("query", &query);
    render(&state, "admins/blog/post_list.html", &context)
}

/// # Endpoint
/// `GET /admins/blog/post/detail/:id/`
pub async fn post_detail(
    State(state): State<AppState>,
    PortalUser(user): PortalUser,
    Path(id): Path<i64>,
) -> Result<Response> {
    let post = state.admin_service.post(id).await?;

    let mut context = portal_context(&state, &user);
    context.insert("post", &post);
    render(&state, "admins/blog/post_detail.html", &context)
}

async fn render_post_form(
    state: &AppState,
    user: &User,
    form: &PostForm,
    post: Option<&Post>,
    errors: Option<&FormErrors>,
) -> Result<Response> {
    let categories = state.admin_service.category_choices().await?;
    let action_url = match post {
        Some(post) => format!("/admins/blog/post/update/{}/", post.id),
        None => "/admins/blog/post/create/".to_string(),
    };

    let mut context = portal_context(state, user);
    context.insert("form", form);
    context.insert("categories", &categories);
    context.insert("action_url", &action_url);
    if let Some(post) = post {
        context.insert("post", post);
    }
    if let Some(errors) = errors {
        context.insert("errors", errors);
    }
    render(state, "admins/blog/post_form.html", &context)
}

/// فرم پست جدید
///
/// # Endpoint
/// `GET /admins/blog/post/create/`
pub async fn post_create_page(
    State(state): State<AppState>,
    PortalUser(user): PortalUser,
) -> Result<Response> {
    let form = PostForm {
        active: true,
        ..PostForm::default()
    };
    render_post_form(&state, &user, &form, None, None).await
}

/// ساخت پست (نویسنده = کاربر فعلی)
///
/// # Endpoint
/// `POST /admins/blog/post/create/`
pub async fn post_create(
    State(state): State<AppState>,
    PortalUser(user): PortalUser,
    FormData(form): FormData<PostForm>,
) -> Result<Response> {
    match state.admin_service.create_post(&user, &form).await {
        Ok(post) => Ok(see_other(format!("/admins/blog/post/detail/{}/", post.id))),
        Err(AppError::InvalidForm(errors)) => {
            render_post_form(&state, &user, &form, None, Some(&errors)).await
        }
        Err(err) => Err(err),
    }
}

/// فرم ویرایش پست (فقط نویسنده)
///
/// # Endpoint
/// `GET /admins/blog/post/update/:id/`
pub async fn post_update_page(
    State(state): State<AppState>,
    PortalUser(user): PortalUser,
    Path(id): Path<i64>,
) -> Result<Response> {
    let post = state.admin_service.owned_post(&user, id).await?;
    let form = PostForm::from_post(&post, state.config.utc_offset_minutes);
    render_post_form(&state, &user, &form, Some(&post), None).await
}

/// ویرایش پست
///
/// # Endpoint
/// `POST /admins/blog/post/update/:id/`
pub async fn post_update(
    State(state): State<AppState>,
    PortalUser(user): PortalUser,
    Path(id): Path<i64>,
    FormData(form): FormData<PostForm>,
) -> Result<Response> {
    match state.admin_service.update_post(&user, id, &form).await {
        Ok(post) => Ok(see_other(format!("/admins/blog/post/detail/{}/", post.id))),
        Err(AppError::InvalidForm(errors)) => {
            let post = state.admin_service.owned_post(&user, id).await?;
            render_post_form(&state, &user, &form, Some(&post), Some(&errors)).await
        }
        Err(err) => Err(err),
    }
}

/// تایید حذف پست (فقط نویسنده)
///
/// # Endpoint
/// `GET /admins/blog/post/delete/:id/`
pub async fn post_delete_page(
    State(state): State<AppState>,
    PortalUser(user): PortalUser,
    Path(id): Path<i64>,
) -> Result<Response> {
    let post = state.admin_service.owned_post(&user, id).await?;

    let mut context = portal_context(&state, &user);
    context.insert("post", &post);
    render(&state, "admins/blog/post_delete.html", &context)
}

/// # Endpoint
/// `POST /admins/blog/post/delete/:id/`
pub async fn post_delete(
    State(state): State<AppState>,
    PortalUser(user): PortalUser,
    Path(id): Path<i64>,
) -> Result<Response> {
    state.admin_service.delete_post(&user, id).await?;
    info!(post_id = id, user_id = user.id, "Post deleted from portal");
    Ok(see_other("/admins/blog/post/list/page/"))
}

// =====================================
// Categories
// =====================================
/// # Endpoint
/// `GET /admins/blog/category/list/` → 302 `/admins/blog/category/list/page/`
pub async fn category_list_redirect(PortalUser(_user): PortalUser) -> Response {
    found("/admins/blog/category/list/page/")
}

/// همه دسته‌بندی‌ها
///
/// # Endpoint
/// `GET /admins/blog/category/list/page/`
pub async fn category_list(
    State(state): State<AppState>,
    PortalUser(user): PortalUser,
    Query(query): Query<PageQuery>,
) -> Result<Response> {
    let (_, page) = state.admin_service.list_categories(None, query.page.as_deref()).await?;

    let mut context = portal_context(&state, &user);
    context.insert("page", &page);
    context.insert("base_url", "/admins/blog/category/list/page/");
    render(&state, "admins/blog/category_list.html", &context)
}

/// دسته‌بندی‌های یک طراح
///
/// # Endpoint
/// `GET /admins/blog/category/list/author/:username/`
pub async fn category_list_by_designer(
    State(state): State<AppState>,
    PortalUser(user): PortalUser,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response> {
    let (designer, page) = state
        .admin_service
        .list_categories(Some(&username), query.page.as_deref())
        .await?;

    let mut context = portal_context(&state, &user);
    context.insert("designer", &designer);
    context.insert("page", &page);
    context.insert(
        "base_url",
        &format!("/admins/blog/category/list/author/{}/", encode_query_value(&username)),
    );
    render(&state, "admins/blog/category_list.html", &context)
}

/// # Endpoint
/// `GET /admins/blog/category/detail/:id/`
pub async fn category_detail(
    State(state): State<AppState>,
    PortalUser(user): PortalUser,
    Path(id): Path<i64>,
) -> Result<Response> {
    let (category, posts) = state.admin_service.category(id).await?;

    let mut context = portal_context(&state, &user);
    context.insert("category", &category);
    context.insert("posts", &posts);
    render(&state, "admins/blog/category_detail.html", &context)
}

fn render_category_form(
    state: &AppState,
    user: &User,
    form: &CategoryForm,
    category: Option<&Category>,
    errors: Option<&FormErrors>,
) -> Result<Response> {
    let action_url = match category {
        Some(category) => format!("/admins/blog/category/update/{}/", category.id),
        None => "/admins/blog/category/create/".to_string(),
    };

    let mut context = portal_context(state, user);
    context.insert("form", form);
    context.insert("action_url", &action_url);
    if let Some(category) = category {
        context.insert("category", category);
    }
    if let Some(errors) = errors {
        context.insert("errors", errors);
    }
    render(state, "admins/blog/category_form.html", &context)
}

/// # Endpoint
/// `GET /admins/blog/category/create/`
pub async fn category_create_page(
    State(state): State<AppState>,
    PortalUser(user): PortalUser,
) -> Result<Response> {
    let form = CategoryForm {
        active: true,
        ..CategoryForm::default()
    };
    render_category_form(&state, &user, &form, None, None)
}

/// ساخت دسته‌بندی (طراح = کاربر فعلی)
///
/// # Endpoint
/// `POST /admins/blog/category/create/`
pub async fn category_create(
    State(state): State<AppState>,
    PortalUser(user): PortalUser,
    FormData(form): FormData<CategoryForm>,
) -> Result<Response> {
    match state.admin_service.create_category(&user, &form).await {
        Ok(category) => Ok(see_other(format!("/admins/blog/category/detail/{}/", category.id))),
        Err(AppError::InvalidForm(errors)) => {
            render_category_form(&state, &user, &form, None, Some(&errors))
        }
        Err(err) => Err(err),
    }
}

/// فرم ویرایش دسته‌بندی (فقط طراح)
///
/// # Endpoint
/// `GET /admins/blog/category/update/:id/`
pub async fn category_update_page(
    State(state): State<AppState>,
    PortalUser(user): PortalUser,
    Path(id): Path<i64>,
) -> Result<Response> {
    let category = state.admin_service.owned_category(&user, id).await?;
    render_category_form(&state, &user, &CategoryForm::from(&category), Some(&category), None)
}

/// # Endpoint
/// `POST /admins/blog/category/update/:id/`
pub async fn category_update(
    State(state): State<AppState>,
    PortalUser(user): PortalUser,
    Path(id): Path<i64>,
    FormData(form): FormData<CategoryForm>,
) -> Result<Response> {
    match state.admin_service.update_category(&user, id, &form).await {
        Ok(category) => Ok(see_other(format!("/admins/blog/category/detail/{}/", category.id))),
        Err(AppError::InvalidForm(errors)) => {
            let category = state.admin_service.owned_category(&user, id).await?;
            render_category_form(&state, &user, &form, Some(&category), Some(&errors))
        }
        Err(err) => Err(err),
    }
}

/// # Endpoint
/// `GET /admins/blog/category/delete/:id/`
pub async fn category_delete_page(
    State(state): State<AppState>,
    PortalUser(user): PortalUser,
    Path(id): Path<i64>,
) -> Result<Response> {
    let category = state.admin_service.owned_category(&user, id).await?;

    let mut context = portal_context(&state, &user);
    context.insert("category", &category);
    render(&state, "admins/blog/category_delete.html", &context)
}

/// حذف دسته‌بندی و پست‌هاش
///
/// # Endpoint
/// `POST /admins/blog/category/delete/:id/`
pub async fn category_delete(
    State(state): State<AppState>,
    PortalUser(user): PortalUser,
    Path(id): Path<i64>,
) -> Result<Response> {
    state.admin_service.delete_category(&user, id).await?;
    info!(category_id = id, user_id = user.id, "Category deleted from portal");
    Ok(see_other("/admins/blog/category/list/page/"))
}

// =====================================
// Comments
// =====================================
/// نظرهای در انتظار بررسی (خوانده نشده‌ها اول)
///
/// # Endpoint
/// `GET /admins/blog/comment/list/page/`
pub async fn comment_list(
    State(state): State<AppState>,
    PortalUser(user): PortalUser,
    Query(query): Query<PageQuery>,
) -> Result<Response> {
    let page = state.admin_service.list_comments(&user, query.page.as_deref()).await?;

    let mut context = portal_context(&state, &user);
    context.insert("page", &page);
    render(&state, "admins/blog/comment_list.html", &context)
}

/// # Endpoint
/// `POST /admins/blog/comment/:id/moderate/`
pub async fn comment_moderate(
    State(state): State<AppState>,
    PortalUser(user): PortalUser,
    Path(id): Path<i64>,
    FormData(form): FormData<ModerationForm>,
) -> Result<Response> {
    state.admin_service.moderate_comment(&user, id, form.action).await?;
    Ok(see_other("/admins/blog/comment/list/page/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fields_into_mini_form() {
        let fields: HashMap<String, String> = [
            ("requested", "post_create"),
            ("title", "عنوان"),
            ("category", "3"),
            ("tags", "rust, وب"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let form: MiniPostForm = parse_fields(&fields).unwrap();
        assert_eq!(form.title, "عنوان");
        assert_eq!(form.category, Some(3));

        let action: PortalActionForm = parse_fields(&fields).unwrap();
        assert_eq!(action.requested, "post_create");
    }

    #[test]
    fn test_invalid_category_is_bad_request() {
        let fields: HashMap<String, String> =
            [("category".to_string(), "abc".to_string())].into_iter().collect();

        let result: Result<MiniPostForm> = parse_fields(&fields);
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_parse_post_id() {
        assert_eq!(parse_post_id(" 42 ").unwrap(), 42);
        assert!(parse_post_id("x").is_err());
    }
}
