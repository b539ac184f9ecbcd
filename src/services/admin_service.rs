//! # سرویس پنل مدیریت (Admin Portal Service)
//!
//! عملیات نویسنده‌ها و کارمندها: آمار داشبورد، مدیریت پست‌ها و
//! دسته‌بندی‌ها و تایید نظرها.
//!
//! # قوانین دسترسی
//! - ویرایش و حذف پست: فقط نویسنده پست
//! - ویرایش و حذف دسته‌بندی: فقط طراح دسته‌بندی
//! - انتشار/غیرفعال‌سازی سریع و مدیریت نظر: صاحب پست یا کارمند

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::{
    config::Config,
    database::{
        CategoryRepository, CommentRepository, PostFilter, PostOrder, PostRepository, Repository,
        UserRepository,
    },
    error::{AppError, Result},
    models::{
        Category, CategoryForm, CategoryInput, Comment, FormErrors, MiniPostForm, ModerationAction,
        Page, Paginator, PortalStats, Post, PostForm, PostInput, User, DEFAULT_BANNER,
        DEFAULT_READ_TIME,
    },
    utils::{is_valid_slug, jalali::parse_jalali_datetime, parse_tags, slugify},
};

use super::{paginate_posts, RankedPost, SearchRanker, SearchWeights, Service};

/// تعداد پست‌های اخیر داشبورد
pub const DASHBOARD_RECENT_POSTS: i64 = 10;

/// تعداد پست در هر صفحه داشبورد
pub const DASHBOARD_PAGE_SIZE: u32 = 3;

const TITLE_REQUIRED: &str = "عنوان را وارد کنید.";
const DESCRIPTION_REQUIRED: &str = "توضیحات را وارد کنید.";
const CONTENT_REQUIRED: &str = "محتوای پست را وارد کنید.";
const INVALID_SLUG: &str = "اسلاگ فقط میتواند شامل حروف، اعداد، خط تیره و زیرخط باشد.";

/// سرویس پنل مدیریت
#[derive(Debug, Clone)]
pub struct AdminService {
    posts: PostRepository,
    categories: CategoryRepository,
    comments: CommentRepository,
    users: UserRepository,
    config: Arc<Config>,
}

impl Service for AdminService {}

impl AdminService {
    #[must_use]
    pub fn new(
        posts: PostRepository,
        categories: CategoryRepository,
        comments: CommentRepository,
        users: UserRepository,
        config: Arc<Config>,
    ) -> Self {
        Self {
            posts,
            categories,
            comments,
            users,
            config,
        }
    }

    // =====================================
    // Dashboard
    // =====================================
    /// آمار کلی سایت
    pub async fn stats(&self) -> Result<PortalStats> {
        Ok(PortalStats {
            total_posts: self.posts.count().await?,
            total_actives_posts: self
                .posts
                .count_matching(&PostFilter::visible(Utc::now()))
                .await?,
            total_comments: self.comments.count().await?,
            total_users: self.users.count().await?,
        })
    }

    /// ۱۰ پست آخر کاربر، سه تا در هر صفحه
    pub async fn recent_posts(&self, user: &User, raw_page: Option<&str>) -> Result<Page<Post>> {
        let recent = self
            .posts
            .list(
                &PostFilter::all().by_author(user.id),
                PostOrder::Created,
                DASHBOARD_RECENT_POSTS,
                0,
            )
            .await?;

        let paginator = Paginator::new(recent.len() as i64, DASHBOARD_PAGE_SIZE);
        let number = paginator.get_page(raw_page);
        let items = recent
            .into_iter()
            .skip(usize::try_from(paginator.offset(number)).unwrap_or(0))
            .take(DASHBOARD_PAGE_SIZE as usize)
            .collect();

        Ok(paginator.page(items, number))
    }

    /// انتشار فوری پست
    ///
    /// # Errors
    /// - `AppError::NotFound` برای پست ناشناخته
    /// - `AppError::Forbidden` اگه کاربر صاحب پست یا کارمند نباشه
    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub async fn publish_post(&self, user: &User, post_id: i64) -> Result<Post> {
        let post = self.post(post_id).await?;
        ensure_owner_or_staff(user, post.author_id)?;

        self.posts.publish(post.id, Utc::now()).await?;
        info!(post_id, "Post published");
        self.post(post_id).await
    }

    /// غیرفعال کردن پست
    ///
    /// # Errors
    /// مثل `publish_post`
    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub async fn deactivate_post(&self, user: &User, post_id: i64) -> Result<()> {
        let post = self.post(post_id).await?;
        ensure_owner_or_staff(user, post.author_id)?;

        self.posts.deactivate(post.id).await?;
        info!(post_id, "Post deactivated");
        Ok(())
    }

    /// ساخت سریع پست از داشبورد
    ///
    /// # Errors
    /// `AppError::InvalidForm` برای فرم نامعتبر
    pub async fn quick_create_post(&self, user: &User, form: MiniPostForm) -> Result<Post> {
        self.create_post(user, &PostForm::from(form)).await
    }

    // =====================================
    // Posts
    // =====================================
    /// همه پست‌ها یا پست‌های یک کاربر
    ///
    /// # Errors
    /// `AppError::NotFound` برای نام کاربری ناشناخته
    pub async fn list_posts(
        &self,
        author_username: Option<&str>,
        raw_page: Option<&str>,
    ) -> Result<(Option<User>, Page<Post>)> {
        let author = match author_username {
            Some(username) => Some(
                self.users
                    .find_by_username(username)
                    .await?
                    .ok_or_else(|| AppError::user_not_found(username))?,
            ),
            None => None,
        };

        let filter = match &author {
            Some(author) => PostFilter::all().by_author(author.id),
            None => PostFilter::all(),
        };

        let page = paginate_posts(
            &self.posts,
            &filter,
            PostOrder::Updated,
            self.config.admin_posts_per_page,
            raw_page,
        )
        .await?;

        Ok((author, page))
    }

    /// جستجوی عنوان در همه پست‌ها
    pub async fn search_posts(&self, query: &str) -> Result<std::result::Result<Vec<RankedPost>, FormErrors>> {
        let ranker = match SearchRanker::parse(query, SearchWeights::TITLE_ONLY) {
            Ok(ranker) => ranker,
            Err(errors) => return Ok(Err(errors)),
        };

        let candidates = self.posts.list(&PostFilter::all(), PostOrder::Updated, -1, 0).await?;
        Ok(Ok(ranker.rank_all(candidates, |rank| rank > 0.0)))
    }

    /// پست با شناسه
    ///
    /// # Errors
    /// `AppError::NotFound` اگه پست وجود نداشته باشه
    pub async fn post(&self, id: i64) -> Result<Post> {
        self.posts
            .find_by_id(&id)
            .await?
            .ok_or_else(|| AppError::post_not_found(id))
    }

    /// پست برای ویرایش یا حذف (فقط نویسنده)
    ///
    /// # Errors
    /// `AppError::NotFound` یا `AppError::Forbidden`
    pub async fn owned_post(&self, user: &User, id: i64) -> Result<Post> {
        let post = self.post(id).await?;
        if !post.is_owned_by(user.id) {
            warn!(user_id = user.id, post_id = id, "Post access denied");
            return Err(AppError::Forbidden("Only the author can change this post".to_string()));
        }
        Ok(post)
    }

    /// ساخت پست
    ///
    /// # Errors
    /// `AppError::InvalidForm` برای فرم نامعتبر
    #[instrument(skip(self, user, form), fields(user_id = user.id))]
    pub async fn create_post(&self, user: &User, form: &PostForm) -> Result<Post> {
        let input = self.post_input(form, None).await?;
        let post = self.posts.create(&input, user.id).await?;

        info!(post_id = post.id, slug = %post.slug, "Post created");
        Ok(post)
    }

    /// ویرایش پست (فقط نویسنده)
    ///
    /// # Errors
    /// `AppError::Forbidden`، `AppError::NotFound` یا `AppError::InvalidForm`
    #[instrument(skip(self, user, form), fields(user_id = user.id))]
    pub async fn update_post(&self, user: &User, id: i64, form: &PostForm) -> Result<Post> {
        let existing = self.owned_post(user, id).await?;
        let mut input = self.post_input(form, Some(id)).await?;
        if form.banner.is_none() {
            input.banner = existing.banner;
        }

        let post = self.posts.update(id, &input).await?;
        info!(post_id = id, "Post updated");
        Ok(post)
    }

    /// حذف پست (فقط نویسنده)
    ///
    /// # Errors
    /// `AppError::Forbidden` یا `AppError::NotFound`
    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub async fn delete_post(&self, user: &User, id: i64) -> Result<()> {
        self.owned_post(user, id).await?;
        self.posts.delete(&id).await?;

        info!(post_id = id, "Post deleted");
        Ok(())
    }

    /// گزینه‌های دسته‌بندی فرم پست
    pub async fn category_choices(&self) -> Result<Vec<Category>> {
        self.categories.list_all().await
    }

    /// اعتبارسنجی فرم پست و تبدیل به داده ذخیره
    async fn post_input(&self, form: &PostForm, except_id: Option<i64>) -> Result<PostInput> {
        let mut errors = FormErrors::validate(form);
        errors.require("title", &form.title, TITLE_REQUIRED);
        errors.require("content", &form.content, CONTENT_REQUIRED);
        errors.require("description", &form.description, DESCRIPTION_REQUIRED);

        let title = form.title.trim();
        let slug = if form.slug.trim().is_empty() {
            slugify(title)
        } else {
            form.slug.trim().to_string()
        };
        if !is_valid_slug(&slug) {
            if !title.is_empty() || !form.slug.trim().is_empty() {
                errors.add("slug", INVALID_SLUG);
            }
        } else if self.posts.slug_taken(&slug, except_id).await? {
            errors.add("slug", "پستی با این اسلاگ وجود دارد.");
        }

        let description = form.description.trim();
        if !description.is_empty() && self.posts.description_taken(description, except_id).await? {
            errors.add("description", "پستی با این توضیحات وجود دارد.");
        }

        let category_id = match form.category {
            Some(id) if self.categories.find_by_id(&id).await?.is_some() => Some(id),
            Some(_) => {
                errors.add("category", "دسته بندی انتخاب شده معتبر نیست.");
                None
            }
            None => {
                errors.add("category", "یک دسته بندی انتخاب کنید.");
                None
            }
        };

        let pub_datetime = if form.pub_date.trim().is_empty() {
            Some(Utc::now())
        } else {
            let parsed = parse_jalali_datetime(&form.pub_date, &form.pub_time, self.config.utc_offset_minutes);
            if parsed.is_none() {
                errors.add("pub_date", "تاریخ یا ساعت انتشار معتبر نیست.");
            }
            parsed
        };

        errors.into_result()?;

        // بعد از into_result هر دو مقدار Some هستن
        let (Some(category_id), Some(pub_datetime)) = (category_id, pub_datetime) else {
            return Err(AppError::Internal("Validated post form is incomplete".to_string()));
        };

        Ok(PostInput {
            banner: form.banner.clone().unwrap_or_else(|| DEFAULT_BANNER.to_string()),
            title: title.to_string(),
            content: form.content.clone(),
            description: description.to_string(),
            slug,
            pub_datetime,
            category_id,
            tags: parse_tags(&form.tags),
            read_time: form.read_time.unwrap_or(DEFAULT_READ_TIME),
            status: form.status.unwrap_or_default(),
            active: form.active,
        })
    }

    // =====================================
    // Categories
    // =====================================
    /// همه دسته‌بندی‌ها یا دسته‌بندی‌های یک طراح
    ///
    /// # Errors
    /// `AppError::NotFound` برای نام کاربری ناشناخته
    pub async fn list_categories(
        &self,
        designer_username: Option<&str>,
        raw_page: Option<&str>,
    ) -> Result<(Option<User>, Page<Category>)> {
        let designer = match designer_username {
            Some(username) => Some(
                self.users
                    .find_by_username(username)
                    .await?
                    .ok_or_else(|| AppError::user_not_found(username))?,
            ),
            None => None,
        };
        let designer_id = designer.as_ref().map(|d| d.id);

        let count = self.categories.count_by_designer(designer_id).await?;
        let paginator = Paginator::new(count, self.config.admin_posts_per_page);
        let number = paginator.get_page(raw_page);
        let items = self
            .categories
            .list_page(designer_id, paginator.limit(), paginator.offset(number))
            .await?;

        Ok((designer, paginator.page(items, number)))
    }

    /// دسته‌بندی و همه پست‌هاش
    ///
    /// # Errors
    /// `AppError::NotFound` اگه دسته‌بندی وجود نداشته باشه
    pub async fn category(&self, id: i64) -> Result<(Category, Vec<Post>)> {
        let category = self
            .categories
            .find_by_id(&id)
            .await?
            .ok_or_else(|| AppError::category_not_found(id))?;

        let posts = self
            .posts
            .list(&PostFilter::all().in_category(id), PostOrder::Updated, -1, 0)
            .await?;

        Ok((category, posts))
    }

    /// دسته‌بندی برای ویرایش یا حذف (فقط طراح)
    ///
    /// # Errors
    /// `AppError::NotFound` یا `AppError::Forbidden`
    pub async fn owned_category(&self, user: &User, id: i64) -> Result<Category> {
        let category = self
            .categories
            .find_by_id(&id)
            .await?
            .ok_or_else(|| AppError::category_not_found(id))?;

        if category.designer_id != user.id {
            warn!(user_id = user.id, category_id = id, "Category access denied");
            return Err(AppError::Forbidden("Only the designer can change this category".to_string()));
        }
        Ok(category)
    }

    /// ساخت دسته‌بندی
    ///
    /// # Errors
    /// `AppError::InvalidForm` برای فرم نامعتبر
    #[instrument(skip(self, user, form), fields(user_id = user.id))]
    pub async fn create_category(&self, user: &User, form: &CategoryForm) -> Result<Category> {
        let input = self.category_input(form, None).await?;
        let category = self.categories.create(&input, user.id).await?;

        info!(category_id = category.id, "Category created");
        Ok(category)
    }

    /// ویرایش دسته‌بندی (فقط طراح)
    ///
    /// # Errors
    /// `AppError::Forbidden`، `AppError::NotFound` یا `AppError::InvalidForm`
    #[instrument(skip(self, user, form), fields(user_id = user.id))]
    pub async fn update_category(&self, user: &User, id: i64, form: &CategoryForm) -> Result<Category> {
        self.owned_category(user, id).await?;
        let input = self.category_input(form, Some(id)).await?;
        let category = self.categories.update(id, &input).await?;

        info!(category_id = id, "Category updated");
        Ok(category)
    }

    /// حذف دسته‌بندی و پست‌هاش (فقط طراح)
    ///
    /// # Errors
    /// `AppError::Forbidden` یا `AppError::NotFound`
    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub async fn delete_category(&self, user: &User, id: i64) -> Result<()> {
        self.owned_category(user, id).await?;
        self.categories.delete(&id).await?;

        info!(category_id = id, "Category deleted");
        Ok(())
    }

    async fn category_input(&self, form: &CategoryForm, except_id: Option<i64>) -> Result<CategoryInput> {
        let mut errors = FormErrors::validate(form);
        errors.require("title", &form.title, TITLE_REQUIRED);

        let title = form.title.trim();
        if !title.is_empty() && self.categories.title_taken(title, except_id).await? {
            errors.add("title", "دسته بندی با این عنوان وجود دارد.");
        }

        let slug = if form.slug.trim().is_empty() {
            slugify(title)
        } else {
            form.slug.trim().to_string()
        };
        if !is_valid_slug(&slug) {
            if !title.is_empty() || !form.slug.trim().is_empty() {
                errors.add("slug", INVALID_SLUG);
            }
        } else if self.categories.slug_taken(&slug, except_id).await? {
            errors.add("slug", "دسته بندی با این اسلاگ وجود دارد.");
        }

        errors.into_result()?;

        Ok(CategoryInput {
            title: title.to_string(),
            description: form.description.clone(),
            slug,
            active: form.active,
        })
    }

    // =====================================
    // Comments
    // =====================================
    /// نظرهای قابل مدیریت: کارمند همه، نویسنده فقط نظرهای پست‌های خودش
    pub async fn list_comments(&self, user: &User, raw_page: Option<&str>) -> Result<Page<Comment>> {
        let scope = (!user.is_staff).then_some(user.id);

        let count = self.comments.count_for_moderation(scope).await?;
        let paginator = Paginator::new(count, self.config.admin_posts_per_page);
        let number = paginator.get_page(raw_page);
        let items = self
            .comments
            .list_for_moderation(scope, paginator.limit(), paginator.offset(number))
            .await?;

        Ok(paginator.page(items, number))
    }

    /// تایید، رد، خوانده شده یا حذف نظر
    ///
    /// # Errors
    /// `AppError::NotFound` یا `AppError::Forbidden`
    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub async fn moderate_comment(&self, user: &User, id: i64, action: ModerationAction) -> Result<()> {
        let comment = self
            .comments
            .find_by_id(&id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment {} not found", id)))?;
        ensure_owner_or_staff(user, comment.post_author_id)?;

        match action {
            ModerationAction::Approve => self.comments.set_active(id, true).await?,
            ModerationAction::Reject => self.comments.set_active(id, false).await?,
            ModerationAction::Read => self.comments.mark_read(id).await?,
            ModerationAction::Delete => self.comments.delete(&id).await?,
        };

        info!(comment_id = id, ?action, "Comment moderated");
        Ok(())
    }
}

/// صاحب منبع یا کارمند
fn ensure_owner_or_staff(user: &User, owner_id: i64) -> Result<()> {
    if user.is_staff || user.id == owner_id {
        Ok(())
    } else {
        Err(AppError::Forbidden("Owner or staff access required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::models::{NewUser, PostStatus};

    struct Fixture {
        service: AdminService,
        author: User,
        other: User,
        category_id: i64,
    }

    async fn setup() -> Fixture {
        let db = Database::in_memory().await.unwrap();
        let users = UserRepository::new(db.clone());
        let author = users
            .create(&NewUser::new("writer", "password123").unwrap().with_roles(true, false))
            .await
            .unwrap();
        let other = users
            .create(&NewUser::new("other", "password123").unwrap().with_roles(true, false))
            .await
            .unwrap();

        let service = AdminService::new(
            PostRepository::new(db.clone()),
            CategoryRepository::new(db.clone()),
            CommentRepository::new(db.clone()),
            users,
            Arc::new(Config::default()),
        );

        let category = service
            .create_category(
                &author,
                &CategoryForm {
                    title: "برنامه نویسی".to_string(),
                    active: true,
                    ..CategoryForm::default()
                },
            )
            .await
            .unwrap();

        Fixture {
            service,
            author,
            other,
            category_id: category.id,
        }
    }

    fn post_form(title: &str, category: i64) -> PostForm {
        PostForm {
            title: title.to_string(),
            content: "<p>متن</p>".to_string(),
            description: format!("توضیح {}", title),
            category: Some(category),
            tags: "rust, وب".to_string(),
            active: true,
            ..PostForm::default()
        }
    }

    #[tokio::test]
    async fn test_create_post_derives_slug_and_tags() {
        let f = setup().await;
        let post = f
            .service
            .create_post(&f.author, &post_form("سلام دنیا", f.category_id))
            .await
            .unwrap();

        assert_eq!(post.slug, "سلام-دنیا");
        assert_eq!(post.status, PostStatus::Draft);
        assert_eq!(post.read_time, DEFAULT_READ_TIME);
        assert_eq!(post.tags.len(), 2);
    }

    #[tokio::test]
    async fn test_category_slug_derived_from_title() {
        let f = setup().await;
        let (category, _) = f.service.category(f.category_id).await.unwrap();
        assert_eq!(category.slug, "برنامه-نویسی");
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_field_error() {
        let f = setup().await;
        f.service.create_post(&f.author, &post_form("post", f.category_id)).await.unwrap();

        let form = PostForm {
            description: "another".to_string(),
            ..post_form("post", f.category_id)
        };
        match f.service.create_post(&f.author, &form).await {
            Err(AppError::InvalidForm(errors)) => assert!(errors.has("slug")),
            other => panic!("expected slug error, got {:?}", other.map(|p| p.id)),
        }
    }

    #[tokio::test]
    async fn test_blank_title_is_rejected_after_trim() {
        let f = setup().await;

        match f.service.create_post(&f.author, &post_form("   ", f.category_id)).await {
            Err(AppError::InvalidForm(errors)) => {
                assert_eq!(errors.get("title"), [TITLE_REQUIRED.to_string()]);
            }
            other => panic!("expected title error, got {:?}", other.map(|p| p.id)),
        }

        let form = CategoryForm {
            title: " \t ".to_string(),
            active: true,
            ..CategoryForm::default()
        };
        match f.service.create_category(&f.author, &form).await {
            Err(AppError::InvalidForm(errors)) => assert!(errors.has("title")),
            other => panic!("expected title error, got {:?}", other.map(|c| c.id)),
        }
    }

    #[tokio::test]
    async fn test_blank_content_and_description_are_rejected() {
        let f = setup().await;
        let form = PostForm {
            content: "  ".to_string(),
            description: "\n".to_string(),
            ..post_form("post", f.category_id)
        };

        match f.service.create_post(&f.author, &form).await {
            Err(AppError::InvalidForm(errors)) => {
                assert!(errors.has("content"));
                assert!(errors.has("description"));
            }
            other => panic!("expected field errors, got {:?}", other.map(|p| p.id)),
        }
    }

    #[tokio::test]
    async fn test_missing_category_is_field_error() {
        let f = setup().await;
        let form = PostForm {
            category: None,
            ..post_form("post", f.category_id)
        };

        match f.service.create_post(&f.author, &form).await {
            Err(AppError::InvalidForm(errors)) => assert!(errors.has("category")),
            other => panic!("expected category error, got {:?}", other.map(|p| p.id)),
        }
    }

    #[tokio::test]
    async fn test_non_owner_cannot_edit_or_publish() {
        let f = setup().await;
        let post = f
            .service
            .create_post(&f.author, &post_form("post", f.category_id))
            .await
            .unwrap();

        assert!(matches!(
            f.service.update_post(&f.other, post.id, &post_form("x", f.category_id)).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            f.service.delete_post(&f.other, post.id).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            f.service.publish_post(&f.other, post.id).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_publish_makes_post_visible() {
        let f = setup().await;
        let post = f
            .service
            .create_post(&f.author, &post_form("post", f.category_id))
            .await
            .unwrap();
        assert_eq!(f.service.stats().await.unwrap().total_actives_posts, 0);

        let published = f.service.publish_post(&f.author, post.id).await.unwrap();
        assert!(published.is_visible(Utc::now()));
        assert_eq!(f.service.stats().await.unwrap().total_actives_posts, 1);
    }

    #[tokio::test]
    async fn test_dashboard_recent_posts_paginated_by_three() {
        let f = setup().await;
        for i in 0..5 {
            f.service
                .create_post(&f.author, &post_form(&format!("post {}", i), f.category_id))
                .await
                .unwrap();
        }

        let page = f.service.recent_posts(&f.author, Some("2")).await.unwrap();
        assert_eq!(page.num_pages, 2);
        assert_eq!(page.items.len(), 2);
    }

    #[tokio::test]
    async fn test_jalali_publish_date() {
        let f = setup().await;
        let form = PostForm {
            pub_date: "1403/01/01".to_string(),
            pub_time: "12:00".to_string(),
            ..post_form("post", f.category_id)
        };

        let post = f.service.create_post(&f.author, &form).await.unwrap();
        assert_eq!(post.pub_datetime.to_rfc3339(), "2024-03-20T08:30:00+00:00");
    }
}
