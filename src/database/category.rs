//! # Category Repository

use async_trait::async_trait;
use chrono::Utc;

use super::{map_unique_violation, Database, Repository};
use crate::error::{AppError, Result};
use crate::models::{Category, CategoryInput, CATEGORY_SELECT};

const CATEGORY_ORDER: &str = "ORDER BY c.updated_at DESC, c.id DESC";

/// Repository برای مدیریت دسته‌بندی‌ها
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    db: Database,
}

impl CategoryRepository {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// دسته‌بندی‌های فعال
    ///
    /// `limit` برای sidebar استفاده میشه
    pub async fn list_active(&self, limit: Option<i64>) -> Result<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            "{} WHERE c.active = 1 {} LIMIT ?",
            CATEGORY_SELECT, CATEGORY_ORDER
        ))
        .bind(limit.unwrap_or(-1))
        .fetch_all(self.db.pool())
        .await?;

        Ok(categories)
    }

    /// همه دسته‌بندی‌ها (گزینه‌های فرم پست)
    pub async fn list_all(&self) -> Result<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            "{} {}",
            CATEGORY_SELECT, CATEGORY_ORDER
        ))
        .fetch_all(self.db.pool())
        .await?;

        Ok(categories)
    }

    /// دسته‌بندی فعال با اسلاگ
    pub async fn find_active_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "{} WHERE c.slug = ? AND c.active = 1",
            CATEGORY_SELECT
        ))
        .bind(slug)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(category)
    }

    /// تعداد دسته‌بندی‌ها، اختیاری برای یک طراح
    pub async fn count_by_designer(&self, designer_id: Option<i64>) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM categories WHERE (? IS NULL OR designer_id = ?)",
        )
        .bind(designer_id)
        .bind(designer_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(count)
    }

    /// یک صفحه از دسته‌بندی‌ها
    pub async fn list_page(
        &self,
        designer_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            "{} WHERE (? IS NULL OR c.designer_id = ?) {} LIMIT ? OFFSET ?",
            CATEGORY_SELECT, CATEGORY_ORDER
        ))
        .bind(designer_id)
        .bind(designer_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.db.pool())
        .await?;

        Ok(categories)
    }

    /// آیا عنوان توسط دسته‌بندی دیگه‌ای گرفته شده؟
    pub async fn title_taken(&self, title: &str, except_id: Option<i64>) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM categories WHERE title = ? AND id != ?",
        )
        .bind(title)
        .bind(except_id.unwrap_or(0))
        .fetch_one(self.db.pool())
        .await?;

        Ok(count > 0)
    }

    /// آیا اسلاگ توسط دسته‌بندی دیگه‌ای گرفته شده؟
    pub async fn slug_taken(&self, slug: &str, except_id: Option<i64>) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM categories WHERE slug = ? AND id != ?",
        )
        .bind(slug)
        .bind(except_id.unwrap_or(0))
        .fetch_one(self.db.pool())
        .await?;

        Ok(count > 0)
    }

    /// ایجاد دسته‌بندی
    pub async fn create(&self, input: &CategoryInput, designer_id: i64) -> Result<Category> {
        let now = Utc::now();

        let id = sqlx::query(
            r#"
            INSERT INTO categories (title, description, designer_id, slug, active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.title)
        .bind(&input.description)
        .bind(designer_id)
        .bind(&input.slug)
        .bind(input.active)
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await
        .map_err(|e| map_unique_violation(e, "دسته بندی با این عنوان یا اسلاگ وجود دارد."))?
        .last_insert_rowid();

        self.find_by_id(&id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to create category".to_string()))
    }

    /// ویرایش دسته‌بندی
    pub async fn update(&self, id: i64, input: &CategoryInput) -> Result<Category> {
        sqlx::query(
            r#"
            UPDATE categories
            SET title = ?, description = ?, slug = ?, active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.slug)
        .bind(input.active)
        .bind(Utc::now())
        .bind(id)
        .execute(self.db.pool())
        .await
        .map_err(|e| map_unique_violation(e, "دسته بندی با این عنوان یا اسلاگ وجود دارد."))?;

        self.find_by_id(&id)
            .await?
            .ok_or_else(|| AppError::category_not_found(id))
    }
}

#[async_trait]
impl Repository for CategoryRepository {
    type Entity = Category;
    type Id = i64;

    async fn find_by_id(&self, id: &i64) -> Result<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(&format!("{} WHERE c.id = ?", CATEGORY_SELECT))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(category)
    }

    async fn delete(&self, id: &i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM categories")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count)
    }
}
