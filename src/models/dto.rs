//! # Data Transfer Objects (DTOs)
//!
//! ساختارهایی که بین handler‌ها، سرویس‌ها و قالب‌ها جابجا میشن

use serde::{Deserialize, Serialize};

use super::{Category, Tag};

// =====================================
// Query Strings
// =====================================
/// پارامتر `?page=` لیست‌ها
///
/// به صورت رشته خونده میشه تا ورودی نامعتبر به صفحه ۱ برگرده، نه خطای 400
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// پارامتر `?query=` جستجو
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

/// پارامتر `?next=` فرم ورود
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

// =====================================
// Sidebar
// =====================================
/// داده‌های sidebar صفحات عمومی
///
/// برای هر درخواست از نو خونده میشه
#[derive(Debug, Clone, Default, Serialize)]
pub struct Sidebar {
    pub tags_list: Vec<Tag>,
    pub categories: Vec<Category>,
}

// =====================================
// Admin Portal
// =====================================
/// آمار داشبورد پنل مدیریت
#[derive(Debug, Clone, Default, Serialize)]
pub struct PortalStats {
    pub total_posts: i64,
    pub total_actives_posts: i64,
    pub total_comments: i64,
    pub total_users: i64,
}

/// فرم عملیات داشبورد
///
/// `requested` یکی از `publish_post`، `deactivation` یا `post_create` هست
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PortalActionForm {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub requested: String,
    #[serde(default)]
    pub value: String,
}

/// فرم مدیریت نظر
#[derive(Debug, Clone, Deserialize)]
pub struct ModerationForm {
    pub action: super::ModerationAction,
}

// =====================================
// Health Check
// =====================================
/// پاسخ health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: bool,
}

impl HealthResponse {
    #[must_use]
    pub fn new(database_ok: bool) -> Self {
        Self {
            status: if database_ok { "healthy" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: database_ok,
        }
    }
}
