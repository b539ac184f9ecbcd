//! # مدل دسته‌بندی (Category Model)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::utils::{checkbox, empty_string_as_none, truncate_chars, THUMBNAIL_LENGTH};

/// ستون‌های مشترک همه کوئری‌های دسته‌بندی
pub const CATEGORY_SELECT: &str = r#"
    SELECT c.id, c.title, c.description, c.designer_id,
           u.username AS designer_username,
           c.slug, c.active, c.created_at, c.updated_at
    FROM categories c
    JOIN users u ON u.id = c.designer_id
"#;

/// Entity دسته‌بندی
///
/// `designer_username` از جدول users join میشه
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Category {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub designer_id: i64,
    pub designer_username: String,
    pub slug: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// نمایش: عنوان کوتاه شده (بدون `...`)
impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", truncate_chars(&self.title, THUMBNAIL_LENGTH, false))
    }
}

/// داده معتبر شده برای ساخت/ویرایش دسته‌بندی
#[derive(Debug, Clone)]
pub struct CategoryInput {
    pub title: String,
    pub description: Option<String>,
    pub slug: String,
    pub active: bool,
}

/// فرم دسته‌بندی در پنل مدیریت
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct CategoryForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 225, message = "عنوان باید بین ۱ تا ۲۲۵ کاراکتر باشد."))]
    pub title: String,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub description: Option<String>,

    #[serde(default)]
    #[validate(length(max = 225, message = "اسلاگ حداکثر ۲۲۵ کاراکتر است."))]
    pub slug: String,

    #[serde(default, deserialize_with = "checkbox")]
    pub active: bool,
}

impl From<&Category> for CategoryForm {
    fn from(category: &Category) -> Self {
        Self {
            title: category.title.clone(),
            description: category.description.clone(),
            slug: category.slug.clone(),
            active: category.active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_truncates_without_ellipsis() {
        let category = Category {
            id: 1,
            title: "یک عنوان بسیار بسیار طولانی برای دسته بندی".to_string(),
            description: None,
            designer_id: 1,
            designer_username: "designer".to_string(),
            slug: "long".to_string(),
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let shown = category.to_string();
        assert_eq!(shown.chars().count(), THUMBNAIL_LENGTH);
        assert!(!shown.ends_with("..."));
    }
}
