//! # مدل نظر (Comment Model)
//!
//! نظرها بعد از ثبت غیرفعال هستن تا نویسنده پست یا کارمند تاییدشون کنه.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::utils::{empty_string_as_none, truncate_chars, THUMBNAIL_LENGTH};

/// ستون‌های مشترک همه کوئری‌های نظر
pub const COMMENT_SELECT: &str = r#"
    SELECT m.id, m.post_id,
           p.title AS post_title,
           p.slug AS post_slug,
           p.author_id AS post_author_id,
           m.author_id,
           u.username AS author_username,
           u.avatar AS author_avatar,
           m.title, m.text, m.active, m.read, m.created_at, m.updated_at
    FROM comments m
    JOIN posts p ON p.id = m.post_id
    JOIN users u ON u.id = m.author_id
"#;

/// Entity نظر
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub post_title: String,
    pub post_slug: String,
    pub post_author_id: i64,
    pub author_id: i64,
    pub author_username: String,
    pub author_avatar: String,
    pub title: Option<String>,
    pub text: String,
    pub active: bool,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    /// خلاصه متن نظر برای لیست‌ها
    #[must_use]
    pub fn text_thumbnail(&self) -> String {
        truncate_chars(&self.text, THUMBNAIL_LENGTH, true)
    }
}

impl std::fmt::Display for Comment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text_thumbnail())
    }
}

/// فرم ثبت نظر زیر پست
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct CommentForm {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(length(max = 225, message = "عنوان حداکثر ۲۲۵ کاراکتر است."))]
    pub title: Option<String>,

    #[serde(default)]
    #[validate(length(min = 1, max = 5000, message = "متن نظر را وارد کنید."))]
    pub text: String,
}

/// عملیات مدیریت نظر
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationAction {
    /// تایید و نمایش
    Approve,
    /// عدم نمایش
    Reject,
    /// علامت خوانده شده
    Read,
    /// حذف
    Delete,
}
