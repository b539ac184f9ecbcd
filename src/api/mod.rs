//! # لایه API
//!
//! این ماژول HTTP handlers و routing رو مدیریت میکنه.
//!
//! ## مفاهیم Rust + Axum:
//! - **Router**: تعریف مسیرها
//! - **Handler Functions**: پردازش request‌ها
//! - **Extractors**: استخراج داده از request
//! - **State**: اشتراک state بین handlers
//! - **Middleware**: پردازش قبل/بعد از handler
//! - **Tower**: زیرساخت middleware
//!
//! ## ساختار URL‌ها:
//! - `/` و `/about/` - صفحات عمومی
//! - `/accounts/...` - ثبت‌نام، ورود، خروج، تغییر رمز
//! - `/blog/...` - پست‌ها، جستجو، برچسب‌ها، دسته‌بندی‌ها
//! - `/admins/...` - پنل مدیریت نویسنده‌ها
//! - `/media/...` و `/static/...` - فایل‌ها
//! - `GET /health` - Health check

pub mod extractors;
pub mod handlers;
pub mod middleware;

pub use extractors::*;
pub use middleware::*;

use std::time::Duration;

use axum::{
    http::Method,
    middleware as axum_middleware,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::services::AppState;

/// حداکثر زمان پردازش هر request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// =====================================
// Router Builder
// =====================================
/// ساخت Router اصلی برنامه
///
/// # مفاهیم:
/// - `.nest()`: گروه‌بندی route‌ها
/// - `.nest_service()`: سرو کردن فایل‌ها با `ServeDir`
/// - `.layer()`: اضافه کردن middleware
/// - `.with_state()`: تزریق state
pub fn create_router(state: AppState) -> Router {
    let media = ServeDir::new(&state.config.media_root);
    let assets = ServeDir::new(&state.config.static_root);

    Router::new()
        .route("/", get(handlers::pages::index))
        .route("/about/", get(handlers::pages::about))
        .nest("/accounts", account_routes())
        .nest("/blog", blog_routes())
        .route(
            "/admins/",
            get(handlers::admins::portal).post(handlers::admins::portal_action),
        )
        .nest("/admins", admin_routes())
        .route(
            "/health",
            get(handlers::health::health_check).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods([Method::GET]),
            ),
        )
        .nest_service("/media", media)
        .nest_service("/static", assets)
        .fallback(handlers::pages::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(axum_middleware::from_fn(request_id))
                .layer(TraceLayer::new_for_http())
                .layer(axum_middleware::from_fn(request_timing))
                .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
                .layer(CompressionLayer::new())
                .layer(axum_middleware::from_fn(security_headers))
                .layer(axum_middleware::from_fn_with_state(state.clone(), error_pages)),
        )
        .with_state(state)
}

/// Route‌های حساب کاربری
fn account_routes() -> Router<AppState> {
    use handlers::accounts;

    Router::new()
        .route("/signup/", get(accounts::signup_page).post(accounts::signup))
        .route("/login/", get(accounts::login_page).post(accounts::login))
        .route("/logout/", get(accounts::logout).post(accounts::logout))
        .route(
            "/password_change/",
            get(accounts::password_change_page).post(accounts::password_change),
        )
        .route("/password_change/done/", get(accounts::password_change_done))
}

/// Route‌های عمومی وبلاگ
fn blog_routes() -> Router<AppState> {
    use axum::routing::post;
    use handlers::blog;

    Router::new()
        .route("/post/list/", get(blog::post_list_redirect))
        .route("/post/list/page/", get(blog::post_list))
        .route("/post/list/tag/:tag_slug/", get(blog::post_list_by_tag))
        .route("/post/list/author/:username/", get(blog::author_posts))
        .route("/post/search/list/", get(blog::post_search))
        .route("/post/detail/:slug/", get(blog::post_detail))
        .route("/post/detail/:slug/comment/", post(blog::post_comment))
        .route("/category/list/", get(blog::category_list))
        .route("/category/detail/:slug/", get(blog::category_detail))
        .route("/tag/list/", get(blog::tag_list))
}

/// Route‌های پنل مدیریت
///
/// داشبورد (`/admins/`) روی router اصلی ثبت میشه چون `/` داخل `nest`
/// فقط با `/admins` بدون اسلش آخر match میشه
fn admin_routes() -> Router<AppState> {
    use axum::routing::post;
    use handlers::admins;

    Router::new()
        .route("/profile/", get(admins::profile_page).post(admins::profile_update))
        .route("/terms/", get(admins::terms))
        // پست‌ها
        .route("/blog/post/list/", get(admins::post_list_redirect))
        .route("/blog/post/list/page/", get(admins::post_list))
        .route("/blog/post/list/author/:username/", get(admins::post_list_by_author))
        .route("/blog/post/search/list/", get(admins::post_search))
        .route("/blog/post/detail/:id/", get(admins::post_detail))
        .route("/blog/post/create/", get(admins::post_create_page).post(admins::post_create))
        .route("/blog/post/update/:id/", get(admins::post_update_page).post(admins::post_update))
        .route("/blog/post/delete/:id/", get(admins::post_delete_page).post(admins::post_delete))
        // دسته‌بندی‌ها
        .route("/blog/category/list/", get(admins::category_list_redirect))
        .route("/blog/category/list/page/", get(admins::category_list))
        .route(
            "/blog/category/list/author/:username/",
            get(admins::category_list_by_designer),
        )
        .route("/blog/category/detail/:id/", get(admins::category_detail))
        .route(
            "/blog/category/create/",
            get(admins::category_create_page).post(admins::category_create),
        )
        .route(
            "/blog/category/update/:id/",
            get(admins::category_update_page).post(admins::category_update),
        )
        .route(
            "/blog/category/delete/:id/",
            get(admins::category_delete_page).post(admins::category_delete),
        )
        // نظرها
        .route("/blog/comment/list/page/", get(admins::comment_list))
        .route("/blog/comment/:id/moderate/", post(admins::comment_moderate))
}
