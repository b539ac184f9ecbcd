//! # Post Repository
//!
//! همه کوئری‌های پست اینجاست. فیلترهای عمومی از `PostFilter` ساخته
//! میشن و شرط قابل مشاهده بودن فقط از `VISIBLE_POST_SQL` میاد.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use sqlx::{query::QueryAs, sqlite::SqliteArguments, FromRow, Sqlite};

use super::{map_unique_violation, Database, Repository, TagRepository};
use crate::error::{AppError, Result};
use crate::models::{Post, PostInput, PostStatus, Tag, POST_SELECT, VISIBLE_POST_SQL};

const DUPLICATE_POST: &str = "پستی با این اسلاگ یا توضیحات وجود دارد.";

/// شرط WHERE مشترک لیست‌ها
///
/// هر بخش با یک پارامتر NULL (یا false) غیرفعال میشه
static FILTER_SQL: Lazy<String> = Lazy::new(|| {
    format!(
        r#"
        WHERE (? = 0 OR ({visible}))
          AND (? IS NULL OR p.author_id = ?)
          AND (? IS NULL OR p.category_id = ?)
          AND (? IS NULL OR p.id IN (SELECT post_id FROM post_tags WHERE tag_id = ?))
        "#,
        visible = VISIBLE_POST_SQL
    )
});

// =====================================
// Filter & Order
// =====================================
/// فیلتر لیست پست‌ها
///
/// # مثال
/// ```rust
/// use chrono::Utc;
/// use qurno::database::PostFilter;
///
/// let filter = PostFilter::visible(Utc::now()).by_author(3);
/// assert_eq!(filter.author_id, Some(3));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PostFilter {
    /// فقط پست‌های قابل مشاهده در این لحظه
    pub visible_at: Option<DateTime<Utc>>,
    pub author_id: Option<i64>,
    pub category_id: Option<i64>,
    pub tag_id: Option<i64>,
}

impl PostFilter {
    /// همه پست‌ها (پنل مدیریت)
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// پست‌های قابل مشاهده برای عموم
    #[must_use]
    pub fn visible(now: DateTime<Utc>) -> Self {
        Self {
            visible_at: Some(now),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn by_author(mut self, author_id: i64) -> Self {
        self.author_id = Some(author_id);
        self
    }

    #[must_use]
    pub fn in_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn tagged(mut self, tag_id: i64) -> Self {
        self.tag_id = Some(tag_id);
        self
    }
}

/// ترتیب لیست پست‌ها
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostOrder {
    /// آخرین ویرایش (ترتیب پیش‌فرض)
    #[default]
    Updated,
    /// تاریخ انتشار
    Published,
    /// تاریخ ساخت
    Created,
}

impl PostOrder {
    fn as_sql(self) -> &'static str {
        match self {
            Self::Updated => "ORDER BY p.updated_at DESC, p.id DESC",
            Self::Published => "ORDER BY p.pub_datetime DESC, p.id DESC",
            Self::Created => "ORDER BY p.created_at DESC, p.id DESC",
        }
    }
}

type PostQuery<'q, O> = QueryAs<'q, Sqlite, O, SqliteArguments<'q>>;

fn bind_filter<'q, O>(query: PostQuery<'q, O>, filter: &PostFilter) -> PostQuery<'q, O> {
    query
        .bind(filter.visible_at.is_some())
        .bind(filter.visible_at.unwrap_or_else(Utc::now))
        .bind(filter.author_id)
        .bind(filter.author_id)
        .bind(filter.category_id)
        .bind(filter.category_id)
        .bind(filter.tag_id)
        .bind(filter.tag_id)
}

#[derive(FromRow)]
struct PostTagRow {
    post_id: i64,
    id: i64,
    name: String,
    slug: String,
}

// =====================================
// Post Repository
// =====================================
/// Repository برای مدیریت پست‌ها
#[derive(Debug, Clone)]
pub struct PostRepository {
    db: Database,
}

impl PostRepository {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// تعداد پست‌های منطبق با فیلتر
    pub async fn count_matching(&self, filter: &PostFilter) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM posts p JOIN categories c ON c.id = p.category_id {}", *FILTER_SQL);
        let (count,) = bind_filter(sqlx::query_as::<_, (i64,)>(&sql), filter)
            .fetch_one(self.db.pool())
            .await?;

        Ok(count)
    }

    /// لیست پست‌ها با برچسب‌هاشون
    ///
    /// `limit` منفی یعنی بدون محدودیت
    pub async fn list(
        &self,
        filter: &PostFilter,
        order: PostOrder,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>> {
        let sql = format!("{} {} {} LIMIT ? OFFSET ?", POST_SELECT, *FILTER_SQL, order.as_sql());
        let mut posts = bind_filter(sqlx::query_as::<_, Post>(&sql), filter)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.db.pool())
            .await?;

        self.attach_tags(&mut posts).await?;
        Ok(posts)
    }

    /// پست قابل مشاهده با اسلاگ
    pub async fn find_visible_by_slug(&self, slug: &str, now: DateTime<Utc>) -> Result<Option<Post>> {
        let sql = format!("{} WHERE p.slug = ? AND {}", POST_SELECT, VISIBLE_POST_SQL);
        let post = sqlx::query_as::<_, Post>(&sql)
            .bind(slug)
            .bind(now)
            .fetch_optional(self.db.pool())
            .await?;

        self.with_tags(post).await
    }

    /// پست‌های مشابه: قابل مشاهده، حداقل یک برچسب مشترک، به جز خود پست
    ///
    /// ترتیب: تعداد برچسب مشترک، بعد تاریخ انتشار
    pub async fn similar(&self, post: &Post, now: DateTime<Utc>, limit: i64) -> Result<Vec<Post>> {
        if post.tags.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            r#"
            {select}
            JOIN (
                SELECT pt.post_id, COUNT(*) AS same_tags
                FROM post_tags pt
                WHERE pt.tag_id IN (SELECT tag_id FROM post_tags WHERE post_id = ?)
                GROUP BY pt.post_id
            ) shared ON shared.post_id = p.id
            WHERE p.id != ? AND {visible}
            ORDER BY shared.same_tags DESC, p.pub_datetime DESC, p.id DESC
            LIMIT ?
            "#,
            select = POST_SELECT,
            visible = VISIBLE_POST_SQL
        );

        let mut posts = sqlx::query_as::<_, Post>(&sql)
            .bind(post.id)
            .bind(post.id)
            .bind(now)
            .bind(limit)
            .fetch_all(self.db.pool())
            .await?;

        self.attach_tags(&mut posts).await?;
        Ok(posts)
    }

    /// افزایش اتمیک شمارنده بازدید
    pub async fn increment_views(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE posts SET views = views + 1 WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }

    /// آیا اسلاگ توسط پست دیگه‌ای گرفته شده؟
    pub async fn slug_taken(&self, slug: &str, except_id: Option<i64>) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts WHERE slug = ? AND id != ?")
            .bind(slug)
            .bind(except_id.unwrap_or(0))
            .fetch_one(self.db.pool())
            .await?;

        Ok(count > 0)
    }

    /// آیا توضیحات توسط پست دیگه‌ای گرفته شده؟
    pub async fn description_taken(&self, description: &str, except_id: Option<i64>) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM posts WHERE description = ? AND id != ?",
        )
        .bind(description)
        .bind(except_id.unwrap_or(0))
        .fetch_one(self.db.pool())
        .await?;

        Ok(count > 0)
    }

    /// ایجاد پست همراه برچسب‌ها در یک تراکنش
    pub async fn create(&self, input: &PostInput, author_id: i64) -> Result<Post> {
        let now = Utc::now();
        let mut tx = self.db.begin().await?;

        let id = sqlx::query(
            r#"
            INSERT INTO posts (banner, title, content, description, author_id, created_at, updated_at,
                               slug, pub_datetime, category_id, read_time, status, active, views)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0)
            "#,
        )
        .bind(&input.banner)
        .bind(&input.title)
        .bind(&input.content)
        .bind(&input.description)
        .bind(author_id)
        .bind(now)
        .bind(now)
        .bind(&input.slug)
        .bind(input.pub_datetime)
        .bind(input.category_id)
        .bind(input.read_time)
        .bind(input.status)
        .bind(input.active)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, DUPLICATE_POST))?
        .last_insert_rowid();

        TagRepository::set_for_post(&mut tx, id, &input.tags).await?;
        tx.commit().await?;

        self.find_by_id(&id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to create post".to_string()))
    }

    /// ویرایش پست همراه برچسب‌ها در یک تراکنش
    pub async fn update(&self, id: i64, input: &PostInput) -> Result<Post> {
        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            UPDATE posts
            SET banner = ?, title = ?, content = ?, description = ?, slug = ?, pub_datetime = ?,
                category_id = ?, read_time = ?, status = ?, active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&input.banner)
        .bind(&input.title)
        .bind(&input.content)
        .bind(&input.description)
        .bind(&input.slug)
        .bind(input.pub_datetime)
        .bind(input.category_id)
        .bind(input.read_time)
        .bind(input.status)
        .bind(input.active)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, DUPLICATE_POST))?;

        TagRepository::set_for_post(&mut tx, id, &input.tags).await?;
        tx.commit().await?;

        self.find_by_id(&id)
            .await?
            .ok_or_else(|| AppError::post_not_found(id))
    }

    /// انتشار فوری: فعال، منتشر شده، تاریخ انتشار = الان
    pub async fn publish(&self, id: i64, now: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE posts SET active = 1, status = ?, pub_datetime = ?, updated_at = ? WHERE id = ?",
        )
        .bind(PostStatus::Published)
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// غیرفعال کردن پست
    pub async fn deactivate(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE posts SET active = 0, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn with_tags(&self, post: Option<Post>) -> Result<Option<Post>> {
        match post {
            Some(post) => {
                let mut posts = vec![post];
                self.attach_tags(&mut posts).await?;
                Ok(posts.pop())
            }
            None => Ok(None),
        }
    }

    /// پر کردن برچسب‌های چند پست با یک کوئری
    async fn attach_tags(&self, posts: &mut [Post]) -> Result<()> {
        if posts.is_empty() {
            return Ok(());
        }

        let placeholders = vec!["?"; posts.len()].join(", ");
        let sql = format!(
            r#"
            SELECT pt.post_id, t.id, t.name, t.slug
            FROM post_tags pt
            JOIN tags t ON t.id = pt.tag_id
            WHERE pt.post_id IN ({})
            ORDER BY t.name
            "#,
            placeholders
        );

        let mut query = sqlx::query_as::<_, PostTagRow>(&sql);
        for post in posts.iter() {
            query = query.bind(post.id);
        }
        let rows = query.fetch_all(self.db.pool()).await?;

        let mut by_post: HashMap<i64, Vec<Tag>> = HashMap::new();
        for row in rows {
            by_post.entry(row.post_id).or_default().push(Tag {
                id: row.id,
                name: row.name,
                slug: row.slug,
            });
        }

        for post in posts.iter_mut() {
            post.tags = by_post.remove(&post.id).unwrap_or_default();
        }

        Ok(())
    }
}

#[async_trait]
impl Repository for PostRepository {
    type Entity = Post;
    type Id = i64;

    async fn find_by_id(&self, id: &i64) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!("{} WHERE p.id = ?", POST_SELECT))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        self.with_tags(post).await
    }

    async fn delete(&self, id: &i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count)
    }
}
