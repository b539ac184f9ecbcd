//! # Comment Repository

use async_trait::async_trait;
use chrono::Utc;

use super::{Database, Repository};
use crate::error::{AppError, Result};
use crate::models::{Comment, COMMENT_SELECT};

/// Repository برای نظرها
#[derive(Debug, Clone)]
pub struct CommentRepository {
    db: Database,
}

impl CommentRepository {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// ثبت نظر جدید (غیرفعال و خوانده نشده)
    pub async fn create(
        &self,
        post_id: i64,
        author_id: i64,
        title: Option<&str>,
        text: &str,
    ) -> Result<Comment> {
        let now = Utc::now();

        let id = sqlx::query(
            r#"
            INSERT INTO comments (post_id, author_id, title, text, active, read, created_at, updated_at)
            VALUES (?, ?, ?, ?, 0, 0, ?, ?)
            "#,
        )
        .bind(post_id)
        .bind(author_id)
        .bind(title)
        .bind(text)
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await?
        .last_insert_rowid();

        self.find_by_id(&id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to create comment".to_string()))
    }

    /// نظرهای تایید شده یک پست
    pub async fn list_active_for_post(&self, post_id: i64) -> Result<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(&format!(
            "{} WHERE m.post_id = ? AND m.active = 1 ORDER BY m.created_at DESC, m.id DESC",
            COMMENT_SELECT
        ))
        .bind(post_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(comments)
    }

    /// تعداد نظرهای قابل مدیریت
    ///
    /// `post_author_id` خالی یعنی همه نظرها (کارمند)
    pub async fn count_for_moderation(&self, post_author_id: Option<i64>) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM comments m
            JOIN posts p ON p.id = m.post_id
            WHERE (? IS NULL OR p.author_id = ?)
            "#,
        )
        .bind(post_author_id)
        .bind(post_author_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(count)
    }

    /// یک صفحه از نظرهای قابل مدیریت؛ خوانده نشده‌ها اول
    pub async fn list_for_moderation(
        &self,
        post_author_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(&format!(
            "{} WHERE (? IS NULL OR p.author_id = ?) ORDER BY m.read ASC, m.created_at DESC, m.id DESC LIMIT ? OFFSET ?",
            COMMENT_SELECT
        ))
        .bind(post_author_id)
        .bind(post_author_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.db.pool())
        .await?;

        Ok(comments)
    }

    /// تایید یا رد نظر؛ در هر دو حالت خوانده شده حساب میشه
    pub async fn set_active(&self, id: i64, active: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE comments SET active = ?, read = 1, updated_at = ? WHERE id = ?")
            .bind(active)
            .bind(Utc::now())
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// علامت خوانده شده
    pub async fn mark_read(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE comments SET read = 1, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl Repository for CommentRepository {
    type Entity = Comment;
    type Id = i64;

    async fn find_by_id(&self, id: &i64) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(&format!("{} WHERE m.id = ?", COMMENT_SELECT))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(comment)
    }

    async fn delete(&self, id: &i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count)
    }
}
