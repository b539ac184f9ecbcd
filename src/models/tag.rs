//! # مدل برچسب (Tag Model)

use serde::Serialize;
use sqlx::FromRow;

/// برچسب پست‌ها
///
/// اسلاگ از روی نام ساخته میشه و هر دو یکتا هستن
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
