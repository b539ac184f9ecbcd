//! # مدل پست (Post Model)
//!
//! پست اصلی‌ترین entity سایته. قانون «قابل مشاهده بودن» فقط یک بار
//! اینجا تعریف میشه و همه کوئری‌های عمومی ازش استفاده میکنن:
//!
//! ```text
//! visible = active AND status = published AND category.active AND pub_datetime <= now
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::Tag;
use crate::utils::jalali::format_jalali_input;
use crate::utils::{checkbox, empty_string_as_none, truncate_chars, THUMBNAIL_LENGTH};

/// بنر پیش‌فرض پست‌ها (نسبت به پوشه media)
pub const DEFAULT_BANNER: &str = "defaults/blog_post_default_banner.png";

/// زمان مطالعه پیش‌فرض (دقیقه)
pub const DEFAULT_READ_TIME: i64 = 5;

/// شرط SQL قابل مشاهده بودن پست برای عموم
///
/// با alias‌های `p` (posts) و `c` (categories) کار میکنه و یک پارامتر
/// (زمان فعلی) bind میخواد.
pub const VISIBLE_POST_SQL: &str =
    "p.active = 1 AND p.status = 'published' AND c.active = 1 AND p.pub_datetime <= ?";

/// ستون‌های مشترک همه کوئری‌های پست
pub const POST_SELECT: &str = r#"
    SELECT p.id, p.banner, p.title, p.content, p.description, p.author_id,
           u.username AS author_username,
           u.first_name AS author_first_name,
           u.last_name AS author_last_name,
           u.avatar AS author_avatar,
           p.created_at, p.updated_at, p.slug, p.pub_datetime, p.category_id,
           c.title AS category_title,
           c.slug AS category_slug,
           c.active AS category_active,
           p.read_time, p.status, p.active, p.views
    FROM posts p
    JOIN users u ON u.id = p.author_id
    JOIN categories c ON c.id = p.category_id
"#;

// =====================================
// Post Status
// =====================================
/// وضعیت انتشار پست
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PostStatus {
    /// پیش‌نویس
    #[default]
    Draft,

    /// منتشر شده
    Published,
}

impl PostStatus {
    /// برچسب فارسی برای قالب‌ها
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Draft => "پیش نویس",
            Self::Published => "منتشر شده",
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
        }
    }
}

impl std::str::FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" | "0" => Ok(Self::Draft),
            "published" | "1" => Ok(Self::Published),
            other => Err(format!("unknown post status '{}'", other)),
        }
    }
}

// =====================================
// Post Entity
// =====================================
/// Entity پست به همراه اطلاعات نویسنده و دسته‌بندی
///
/// # مفاهیم:
/// - `#[sqlx(skip)]`: فیلد `tags` از کوئری جداگانه پر میشه
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Post {
    pub id: i64,
    pub banner: String,
    pub title: String,
    pub content: String,
    pub description: String,
    pub author_id: i64,
    pub author_username: String,
    pub author_first_name: String,
    pub author_last_name: String,
    pub author_avatar: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub slug: String,
    pub pub_datetime: DateTime<Utc>,
    pub category_id: i64,
    pub category_title: String,
    pub category_slug: String,
    pub category_active: bool,
    pub read_time: i64,
    pub status: PostStatus,
    pub active: bool,
    pub views: i64,

    #[sqlx(skip)]
    pub tags: Vec<Tag>,
}

impl Post {
    /// آیا پست در لحظه `now` برای عموم قابل مشاهده است؟
    ///
    /// معادل `VISIBLE_POST_SQL` برای پستی که در حافظه است
    #[must_use]
    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        self.active
            && self.status == PostStatus::Published
            && self.category_active
            && self.pub_datetime <= now
    }

    /// آیا `user_id` نویسنده این پسته؟
    #[must_use]
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.author_id == user_id
    }

    /// اسلاگ برچسب‌ها به صورت رشته برای فرم ویرایش
    #[must_use]
    pub fn tag_names(&self) -> String {
        self.tags
            .iter()
            .map(|tag| tag.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// نمایش: عنوان کوتاه شده با `...`
impl std::fmt::Display for Post {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", truncate_chars(&self.title, THUMBNAIL_LENGTH, true))
    }
}

// =====================================
// Input & Forms
// =====================================
/// داده معتبر شده برای ذخیره پست
#[derive(Debug, Clone)]
pub struct PostInput {
    pub banner: String,
    pub title: String,
    pub content: String,
    pub description: String,
    pub slug: String,
    pub pub_datetime: DateTime<Utc>,
    pub category_id: i64,
    pub tags: Vec<String>,
    pub read_time: i64,
    pub status: PostStatus,
    pub active: bool,
}

/// فرم کامل پست (ساخت و ویرایش در پنل مدیریت)
///
/// تاریخ انتشار به صورت جلالی (`1403/01/15`) و ساعت (`14:30`) جدا وارد میشه
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct PostForm {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub banner: Option<String>,

    #[serde(default)]
    #[validate(length(min = 1, max = 225, message = "عنوان باید بین ۱ تا ۲۲۵ کاراکتر باشد."))]
    pub title: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "محتوای پست را وارد کنید."))]
    pub content: String,

    #[serde(default)]
    #[validate(length(min = 1, max = 225, message = "توضیحات باید بین ۱ تا ۲۲۵ کاراکتر باشد."))]
    pub description: String,

    #[serde(default)]
    #[validate(length(max = 225, message = "اسلاگ حداکثر ۲۲۵ کاراکتر است."))]
    pub slug: String,

    #[serde(default)]
    pub pub_date: String,

    #[serde(default)]
    pub pub_time: String,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub category: Option<i64>,

    #[serde(default)]
    pub tags: String,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(range(min = 0, max = 32767, message = "زمان مطالعه نامعتبر است."))]
    pub read_time: Option<i64>,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub status: Option<PostStatus>,

    #[serde(default, deserialize_with = "checkbox")]
    pub active: bool,
}

impl PostForm {
    /// فرم ویرایش با مقادیر فعلی پست
    ///
    /// تاریخ انتشار به وقت محلی و تقویم جلالی نمایش داده میشه
    #[must_use]
    pub fn from_post(post: &Post, offset_minutes: i32) -> Self {
        let (pub_date, pub_time) = format_jalali_input(post.pub_datetime, offset_minutes);

        Self {
            banner: Some(post.banner.clone()),
            title: post.title.clone(),
            content: post.content.clone(),
            description: post.description.clone(),
            slug: post.slug.clone(),
            pub_date,
            pub_time,
            category: Some(post.category_id),
            tags: post.tag_names(),
            read_time: Some(post.read_time),
            status: Some(post.status),
            active: post.active,
        }
    }
}

/// فرم سریع ساخت پست در داشبورد
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct MiniPostForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 225, message = "عنوان باید بین ۱ تا ۲۲۵ کاراکتر باشد."))]
    pub title: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "محتوای پست را وارد کنید."))]
    pub content: String,

    #[serde(default)]
    #[validate(length(min = 1, max = 225, message = "توضیحات باید بین ۱ تا ۲۲۵ کاراکتر باشد."))]
    pub description: String,

    #[serde(default)]
    #[validate(length(max = 225, message = "اسلاگ حداکثر ۲۲۵ کاراکتر است."))]
    pub slug: String,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub category: Option<i64>,

    #[serde(default)]
    pub tags: String,
}

impl From<MiniPostForm> for PostForm {
    /// فرم سریع با مقادیر پیش‌فرض مدل (پیش‌نویس، فعال) کامل میشه
    fn from(mini: MiniPostForm) -> Self {
        Self {
            banner: None,
            title: mini.title,
            content: mini.content,
            description: mini.description,
            slug: mini.slug,
            pub_date: String::new(),
            pub_time: String::new(),
            category: mini.category,
            tags: mini.tags,
            read_time: None,
            status: None,
            active: true,
        }
    }
}
