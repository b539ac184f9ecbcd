//! # ماژول سرویس‌ها (Business Logic Layer)
//!
//! این ماژول منطق کسب‌وکار برنامه رو پیاده‌سازی میکنه.
//!
//! ## لایه‌بندی معماری
//!
//! ```text
//! ┌─────────────────┐
//! │    API Layer    │  <-- HTTP handlers (axum) + قالب‌های Tera
//! ├─────────────────┤
//! │  Service Layer  │  <-- Business logic (اینجا!)
//! ├─────────────────┤
//! │ Repository Layer│  <-- Data access
//! ├─────────────────┤
//! │    Database     │  <-- SQLite
//! └─────────────────┘
//! ```
//!
//! ## مفاهیم Rust:
//! - **Dependency Injection**: تزریق وابستگی‌ها
//! - **Arc<T>**: اشتراک امن بین threads
//! - **async/await**: عملیات غیرهمزمان

mod admin_service;
mod auth_service;
mod blog_service;
mod search;

pub use admin_service::*;
pub use auth_service::*;
pub use blog_service::*;
pub use search::*;

use std::sync::Arc;

use crate::{
    api::middleware::RateLimiterState,
    config::Config,
    database::{
        CategoryRepository, CommentRepository, Database, PostFilter, PostOrder, PostRepository,
        TagRepository, UserRepository,
    },
    error::Result,
    models::{Page, Paginator, Post},
    templates::Templates,
};

// =====================================
// Application State
// =====================================
/// وضعیت برنامه که بین همه handlers اشتراک‌گذاری میشه
///
/// # مفاهیم:
/// - `Arc<T>`: Reference counting برای thread-safe sharing
/// - `Clone`: فقط Arc‌ها clone میشن، نه داده
#[derive(Clone)]
pub struct AppState {
    /// تنظیمات برنامه
    pub config: Arc<Config>,

    /// اتصال دیتابیس (برای health check)
    pub db: Database,

    /// قالب‌های HTML
    pub templates: Arc<Templates>,

    /// سرویس احراز هویت
    pub auth_service: Arc<AuthService>,

    /// سرویس بخش عمومی وبلاگ
    pub blog_service: Arc<BlogService>,

    /// سرویس پنل مدیریت
    pub admin_service: Arc<AdminService>,

    /// محدودیت تلاش‌های ورود برای هر IP
    pub login_limiter: RateLimiterState,
}

impl AppState {
    /// ساخت AppState جدید
    ///
    /// # Errors
    /// خطا برمیگردونه اگه قالب‌ها parse نشن
    pub fn new(db: Database, config: Config) -> Result<Self> {
        let users = UserRepository::new(db.clone());
        let categories = CategoryRepository::new(db.clone());
        let posts = PostRepository::new(db.clone());
        let tags = TagRepository::new(db.clone());
        let comments = CommentRepository::new(db.clone());

        let config = Arc::new(config);
        let templates = Arc::new(Templates::new(config.clone())?);

        let auth_service = Arc::new(AuthService::new(users.clone(), config.clone()));

        let blog_service = Arc::new(BlogService::new(
            posts.clone(),
            categories.clone(),
            tags,
            comments.clone(),
            users.clone(),
            config.clone(),
        ));

        let admin_service = Arc::new(AdminService::new(
            posts,
            categories,
            comments,
            users,
            config.clone(),
        ));

        let login_limiter = RateLimiterState::new(
            config.login_rate_limit,
            config.login_rate_window_seconds,
        );

        Ok(Self {
            config,
            db,
            templates,
            auth_service,
            blog_service,
            admin_service,
            login_limiter,
        })
    }

    /// دسترسی به config
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}

// =====================================
// Service Trait
// =====================================
/// Trait پایه برای services
///
/// همه services باید Send + Sync باشن تا در `Arc` بین handler‌ها share بشن
pub trait Service: Send + Sync {}

/// خوندن یک صفحه از پست‌ها با فیلتر
pub(crate) async fn paginate_posts(
    posts: &PostRepository,
    filter: &PostFilter,
    order: PostOrder,
    per_page: u32,
    raw_page: Option<&str>,
) -> Result<Page<Post>> {
    let count = posts.count_matching(filter).await?;
    let paginator = Paginator::new(count, per_page);
    let number = paginator.get_page(raw_page);

    let items = posts
        .list(filter, order, paginator.limit(), paginator.offset(number))
        .await?;

    Ok(paginator.page(items, number))
}
