//! # Repository Pattern
//!
//! یه لایه انتزاعی بین منطق برنامه و دیتابیس.
//! - سرویس‌ها SQL نمینویسن
//! - هر entity یک repository داره
//!
//! ## مفاهیم Rust:
//! - **Traits**: تعریف interface مشترک
//! - **async_trait**: امکان async در traits
//! - **Associated Types**: `type Entity` و `type Id`

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::Database;
use crate::error::{AppError, Result};
use crate::models::{NewUser, ProfileUpdate, User};

// =====================================
// Base Repository Trait
// =====================================
/// Trait پایه برای همه Repository‌ها
///
/// # مفاهیم:
/// - `#[async_trait]`: macro برای async در traits
/// - `Send + Sync`: امکان ارسال بین threads
#[async_trait]
pub trait Repository: Send + Sync {
    /// نوع Entity که این repository باهاش کار میکنه
    type Entity: Send + Sync;

    /// نوع شناسه (ID)
    type Id: Send + Sync;

    /// پیدا کردن با ID
    async fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>>;

    /// حذف با ID
    async fn delete(&self, id: &Self::Id) -> Result<bool>;

    /// شمارش کل
    async fn count(&self) -> Result<i64>;
}

/// تبدیل خطای UNIQUE دیتابیس به `Conflict`
///
/// بقیه خطاها همون خطای دیتابیس باقی میمونن
pub(crate) fn map_unique_violation(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Database(err),
    }
}

// =====================================
// User Repository
// =====================================
const USER_SELECT: &str = r#"
    SELECT id, username, email, password_hash, first_name, last_name, avatar, bio,
           is_author, is_staff, is_active, date_joined, last_login
    FROM users
"#;

/// Repository برای مدیریت کاربران
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: Database,
}

impl UserRepository {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// پیدا کردن با نام کاربری
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("{} WHERE username = ?", USER_SELECT))
            .bind(username)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(user)
    }

    /// پیدا کردن نویسنده با نام کاربری
    ///
    /// کاربری که `is_author` نداره پیدا نمیشه
    pub async fn find_author(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "{} WHERE username = ? AND is_author = 1",
            USER_SELECT
        ))
        .bind(username)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(user)
    }

    /// آیا نام کاربری توسط کاربر دیگه‌ای گرفته شده؟
    ///
    /// `except_id` برای ویرایش پروفایل: کاربر فعلی نادیده گرفته میشه
    pub async fn username_taken(&self, username: &str, except_id: Option<i64>) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE username = ? AND id != ?",
        )
        .bind(username)
        .bind(except_id.unwrap_or(0))
        .fetch_one(self.db.pool())
        .await?;

        Ok(count > 0)
    }

    /// آیا ایمیل توسط کاربر دیگه‌ای گرفته شده؟
    pub async fn email_taken(&self, email: &str, except_id: Option<i64>) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE email = ? AND id != ?",
        )
        .bind(email)
        .bind(except_id.unwrap_or(0))
        .fetch_one(self.db.pool())
        .await?;

        Ok(count > 0)
    }

    /// ایجاد کاربر جدید
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let now = Utc::now();

        let id = sqlx::query(
            r#"
            INSERT INTO users (username, email, password_hash, first_name, last_name,
                               avatar, bio, is_author, is_staff, is_active, date_joined)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?)
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.avatar)
        .bind(&new_user.bio)
        .bind(new_user.is_author)
        .bind(new_user.is_staff)
        .bind(now)
        .execute(self.db.pool())
        .await
        .map_err(|e| map_unique_violation(e, "این نام کاربری یا ایمیل قبلا ثبت شده است."))?
        .last_insert_rowid();

        self.find_by_id(&id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to create user".to_string()))
    }

    /// بروزرسانی پروفایل
    pub async fn update_profile(&self, id: i64, update: &ProfileUpdate) -> Result<User> {
        sqlx::query(
            r#"
            UPDATE users
            SET avatar = ?, username = ?, first_name = ?, last_name = ?, email = ?, bio = ?
            WHERE id = ?
            "#,
        )
        .bind(&update.avatar)
        .bind(&update.username)
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(&update.email)
        .bind(&update.bio)
        .bind(id)
        .execute(self.db.pool())
        .await
        .map_err(|e| map_unique_violation(e, "این نام کاربری یا ایمیل قبلا ثبت شده است."))?;

        self.find_by_id(&id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    /// ذخیره هش رمز عبور جدید
    pub async fn set_password(&self, id: i64, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }

    /// ثبت زمان آخرین ورود
    pub async fn touch_last_login(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
            .bind(at)
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }
}

#[async_trait]
impl Repository for UserRepository {
    type Entity = User;
    type Id = i64;

    async fn find_by_id(&self, id: &i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("{} WHERE id = ?", USER_SELECT))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(user)
    }

    async fn delete(&self, id: &i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> UserRepository {
        UserRepository::new(Database::in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let repo = setup().await;
        let new_user = NewUser::new("writer", "password123")
            .unwrap()
            .with_roles(true, false);

        let user = repo.create(&new_user).await.unwrap();
        assert_eq!(user.username, "writer");
        assert!(user.is_author);
        assert!(user.is_active);

        assert!(repo.find_author("writer").await.unwrap().is_some());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_username_is_conflict() {
        let repo = setup().await;
        let new_user = NewUser::new("writer", "password123").unwrap();
        repo.create(&new_user).await.unwrap();

        let err = repo.create(&new_user).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_username_taken_ignores_self() {
        let repo = setup().await;
        let user = repo
            .create(&NewUser::new("writer", "password123").unwrap())
            .await
            .unwrap();

        assert!(repo.username_taken("writer", None).await.unwrap());
        assert!(!repo.username_taken("writer", Some(user.id)).await.unwrap());
    }

    #[tokio::test]
    async fn test_non_author_not_found_as_author() {
        let repo = setup().await;
        repo.create(&NewUser::new("reader", "password123").unwrap())
            .await
            .unwrap();

        assert!(repo.find_author("reader").await.unwrap().is_none());
    }
}
