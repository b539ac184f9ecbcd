//! # سرویس وبلاگ (Public Blog Service)
//!
//! همه خوندن‌های بخش عمومی سایت: لیست‌ها، جزئیات پست، جستجو،
//! دسته‌بندی‌ها، برچسب‌ها و sidebar. هر کوئری فقط پست‌های قابل
//! مشاهده رو برمیگردونه.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::{
    config::Config,
    database::{
        CategoryRepository, CommentRepository, PostFilter, PostOrder, PostRepository,
        TagRepository, UserRepository,
    },
    error::{AppError, OptionExt, Result},
    models::{Category, Comment, CommentForm, FormErrors, Page, Post, Sidebar, Tag, User},
};

use super::{meets_public_rank, paginate_posts, RankedPost, SearchRanker, SearchWeights, Service};

/// تعداد برچسب‌ها و دسته‌بندی‌های sidebar
pub const SIDEBAR_LIMIT: i64 = 25;

/// تعداد پست‌های صفحه اصلی
pub const RECENT_POSTS_LIMIT: i64 = 6;

/// تعداد پست‌های مشابه در صفحه جزئیات
pub const SIMILAR_POSTS_LIMIT: i64 = 2;

/// داده‌های صفحه جزئیات پست
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub post: Post,
    pub similar_posts: Vec<Post>,
    pub comments: Vec<Comment>,
}

/// سرویس بخش عمومی
#[derive(Debug, Clone)]
pub struct BlogService {
    posts: PostRepository,
    categories: CategoryRepository,
    tags: TagRepository,
    comments: CommentRepository,
    users: UserRepository,
    config: Arc<Config>,
}

impl Service for BlogService {}

impl BlogService {
    #[must_use]
    pub fn new(
        posts: PostRepository,
        categories: CategoryRepository,
        tags: TagRepository,
        comments: CommentRepository,
        users: UserRepository,
        config: Arc<Config>,
    ) -> Self {
        Self {
            posts,
            categories,
            tags,
            comments,
            users,
            config,
        }
    }

    /// sidebar صفحات عمومی
    ///
    /// برای هر درخواست از نو خونده میشه تا تغییرات فوری دیده بشن
    pub async fn sidebar(&self) -> Result<Sidebar> {
        Ok(Sidebar {
            tags_list: self.tags.list(Some(SIDEBAR_LIMIT)).await?,
            categories: self.categories.list_active(Some(SIDEBAR_LIMIT)).await?,
        })
    }

    /// آخرین پست‌های منتشر شده برای صفحه اصلی
    pub async fn recent_posts(&self) -> Result<Vec<Post>> {
        self.posts
            .list(&PostFilter::visible(Utc::now()), PostOrder::Published, RECENT_POSTS_LIMIT, 0)
            .await
    }

    /// لیست صفحه‌بندی شده پست‌های قابل مشاهده
    #[instrument(skip(self))]
    pub async fn list_posts(&self, raw_page: Option<&str>) -> Result<Page<Post>> {
        self.paginate(PostFilter::visible(Utc::now()), raw_page).await
    }

    /// پست‌های یک برچسب
    ///
    /// # Errors
    /// `AppError::NotFound` برای برچسب ناشناخته
    #[instrument(skip(self))]
    pub async fn list_by_tag(&self, tag_slug: &str, raw_page: Option<&str>) -> Result<(Tag, Page<Post>)> {
        let tag = self
            .tags
            .find_by_slug(tag_slug)
            .await?
            .ok_or_not_found(format!("Tag '{}' not found", tag_slug))?;

        let page = self
            .paginate(PostFilter::visible(Utc::now()).tagged(tag.id), raw_page)
            .await?;

        Ok((tag, page))
    }

    /// پست‌های یک نویسنده
    ///
    /// # Errors
    /// `AppError::NotFound` اگه کاربر وجود نداشته باشه یا نویسنده نباشه
    #[instrument(skip(self))]
    pub async fn list_by_author(&self, username: &str, raw_page: Option<&str>) -> Result<(User, Page<Post>)> {
        let author = self
            .users
            .find_author(username)
            .await?
            .ok_or_else(|| AppError::user_not_found(username))?;

        let page = self
            .paginate(PostFilter::visible(Utc::now()).by_author(author.id), raw_page)
            .await?;

        Ok((author, page))
    }

    /// جستجوی عمومی
    ///
    /// عبارت نامعتبر به صورت `FormErrors` برمیگرده تا فرم جستجو خطا رو نشون بده
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<std::result::Result<Vec<RankedPost>, FormErrors>> {
        let ranker = match SearchRanker::parse(query, SearchWeights::FULL) {
            Ok(ranker) => ranker,
            Err(errors) => return Ok(Err(errors)),
        };

        let candidates = self
            .posts
            .list(&PostFilter::visible(Utc::now()), PostOrder::Updated, -1, 0)
            .await?;

        let results = ranker.rank_all(candidates, meets_public_rank);
        debug!(results = results.len(), "Search completed");
        Ok(Ok(results))
    }

    /// جزئیات پست قابل مشاهده
    ///
    /// شمارنده بازدید با یک UPDATE اتمیک زیاد میشه
    ///
    /// # Errors
    /// `AppError::NotFound` اگه پست وجود نداشته باشه یا قابل مشاهده نباشه
    #[instrument(skip(self))]
    pub async fn post_detail(&self, slug: &str) -> Result<PostDetail> {
        let now = Utc::now();
        let mut post = self
            .posts
            .find_visible_by_slug(slug, now)
            .await?
            .ok_or_else(|| AppError::post_not_found(slug))?;

        self.posts.increment_views(post.id).await?;
        post.views += 1;

        let similar_posts = self.posts.similar(&post, now, SIMILAR_POSTS_LIMIT).await?;
        let comments = self.comments.list_active_for_post(post.id).await?;

        Ok(PostDetail {
            post,
            similar_posts,
            comments,
        })
    }

    /// ثبت نظر زیر پست قابل مشاهده
    ///
    /// # Errors
    /// - `AppError::NotFound` برای پست غیرقابل مشاهده
    /// - `AppError::InvalidForm` برای فرم نامعتبر
    #[instrument(skip(self, user, form), fields(user_id = user.id))]
    pub async fn add_comment(&self, slug: &str, user: &User, form: &CommentForm) -> Result<Comment> {
        let post = self
            .posts
            .find_visible_by_slug(slug, Utc::now())
            .await?
            .ok_or_else(|| AppError::post_not_found(slug))?;

        let mut errors = FormErrors::validate(form);
        errors.require("text", &form.text, "متن نظر را وارد کنید.");
        errors.into_result()?;

        let title = form.title.as_deref().map(str::trim).filter(|t| !t.is_empty());
        let comment = self
            .comments
            .create(post.id, user.id, title, form.text.trim())
            .await?;

        info!(comment_id = comment.id, post_id = post.id, "Comment submitted for moderation");
        Ok(comment)
    }

    /// دسته‌بندی‌های فعال
    pub async fn categories(&self) -> Result<Vec<Category>> {
        self.categories.list_active(None).await
    }

    /// دسته‌بندی فعال و پست‌های قابل مشاهده‌اش
    ///
    /// # Errors
    /// `AppError::NotFound` برای دسته‌بندی ناشناخته یا غیرفعال
    #[instrument(skip(self))]
    pub async fn category_detail(&self, slug: &str) -> Result<(Category, Vec<Post>)> {
        let category = self
            .categories
            .find_active_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::category_not_found(slug))?;

        let posts = self
            .posts
            .list(
                &PostFilter::visible(Utc::now()).in_category(category.id),
                PostOrder::Updated,
                -1,
                0,
            )
            .await?;

        Ok((category, posts))
    }

    /// همه برچسب‌ها
    pub async fn tags(&self) -> Result<Vec<Tag>> {
        self.tags.list(None).await
    }

    async fn paginate(&self, filter: PostFilter, raw_page: Option<&str>) -> Result<Page<Post>> {
        paginate_posts(
            &self.posts,
            &filter,
            PostOrder::Updated,
            self.config.posts_per_page,
            raw_page,
        )
        .await
    }
}
