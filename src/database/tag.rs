//! # Tag Repository
//!
//! برچسب‌ها با نام وارد میشن؛ نام ناشناخته هنگام ذخیره پست ساخته میشه.

use sqlx::{Sqlite, Transaction};

use super::Database;
use crate::error::Result;
use crate::models::Tag;
use crate::utils::slugify;

/// Repository برای برچسب‌ها
#[derive(Debug, Clone)]
pub struct TagRepository {
    db: Database,
}

impl TagRepository {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// لیست برچسب‌ها، اختیاری با محدودیت تعداد (sidebar)
    pub async fn list(&self, limit: Option<i64>) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>("SELECT id, name, slug FROM tags ORDER BY id LIMIT ?")
            .bind(limit.unwrap_or(-1))
            .fetch_all(self.db.pool())
            .await?;

        Ok(tags)
    }

    /// پیدا کردن با اسلاگ
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Tag>> {
        let tag = sqlx::query_as::<_, Tag>("SELECT id, name, slug FROM tags WHERE slug = ?")
            .bind(slug)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(tag)
    }

    /// برچسب‌های یک پست
    pub async fn for_post(&self, post_id: i64) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT t.id, t.name, t.slug
            FROM tags t
            JOIN post_tags pt ON pt.tag_id = t.id
            WHERE pt.post_id = ?
            ORDER BY t.name
            "#,
        )
        .bind(post_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(tags)
    }

    /// جایگزینی برچسب‌های یک پست داخل تراکنش
    ///
    /// نام‌های جدید ساخته میشن؛ نامی که اسلاگ خالی داره نادیده گرفته میشه
    pub async fn set_for_post(
        tx: &mut Transaction<'_, Sqlite>,
        post_id: i64,
        names: &[String],
    ) -> Result<()> {
        sqlx::query("DELETE FROM post_tags WHERE post_id = ?")
            .bind(post_id)
            .execute(&mut **tx)
            .await?;

        for name in names {
            let slug = slugify(name);
            if slug.is_empty() {
                continue;
            }

            let existing = sqlx::query_scalar::<_, i64>(
                "SELECT id FROM tags WHERE name = ? OR slug = ? LIMIT 1",
            )
            .bind(name)
            .bind(&slug)
            .fetch_optional(&mut **tx)
            .await?;

            let tag_id = match existing {
                Some(id) => id,
                None => sqlx::query("INSERT INTO tags (name, slug) VALUES (?, ?)")
                    .bind(name)
                    .bind(&slug)
                    .execute(&mut **tx)
                    .await?
                    .last_insert_rowid(),
            };

            sqlx::query("INSERT OR IGNORE INTO post_tags (post_id, tag_id) VALUES (?, ?)")
                .bind(post_id)
                .bind(tag_id)
                .execute(&mut **tx)
                .await?;
        }

        Ok(())
    }
}
