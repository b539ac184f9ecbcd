//! # ماژول دیتابیس (Database Layer)
//!
//! این ماژول لایه ارتباط با دیتابیس رو مدیریت میکنه.
//!
//! ## مفاهیم Rust:
//! - **Arc<T>**: Reference Counting برای اشتراک داده بین threads
//! - **async/await**: برنامه‌نویسی غیرهمزمان
//! - **Traits**: تعریف interface
//! - **async_trait**: پشتیبانی از async در traits
//!
//! ## الگوهای طراحی:
//! - Repository Pattern: هر entity یک repository داره
//! - Connection Pool: مدیریت اتصالات دیتابیس

mod category;
mod comment;
mod post;
mod repository;
mod tag;

pub use category::*;
pub use comment::*;
pub use post::*;
pub use repository::*;
pub use tag::*;

use std::str::FromStr;
use std::sync::Arc;

use sqlx::{
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
};

use crate::error::Result;

// مسیر migration‌ها
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

// =====================================
// Database Connection
// =====================================
/// اتصال به دیتابیس با Connection Pool
///
/// # مفاهیم:
/// - `#[derive(Clone)]`: هر clone فقط شمارنده `Arc` رو زیاد میکنه
/// - `Arc<SqlitePool>`: اشتراک امن pool بین handler‌ها و سرویس‌ها
#[derive(Debug, Clone)]
pub struct Database {
    pool: Arc<SqlitePool>,
}

impl Database {
    /// اتصال به دیتابیس
    ///
    /// کلیدهای خارجی فعال میشن تا حذف کاربر یا دسته‌بندی، پست‌ها و
    /// نظرهای وابسته رو هم حذف کنه.
    ///
    /// # Arguments
    /// * `database_url` - آدرس دیتابیس (مثلا `sqlite://data/qurno.db?mode=rwc`)
    ///
    /// # Errors
    /// خطا برمیگردونه اگه اتصال موفق نباشه
    pub async fn connect(database_url: impl AsRef<str>) -> Result<Self> {
        let url = database_url.as_ref();

        // ساخت پوشه فایل دیتابیس اگه وجود نداره
        if let Some(path) = url.strip_prefix("sqlite://") {
            let path = path.split('?').next().unwrap_or(path);
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .min_connections(1)
            .acquire_timeout(std::time::Duration::from_secs(5))
            .idle_timeout(std::time::Duration::from_secs(600))
            .connect_with(options)
            .await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// ساخت دیتابیس in-memory با migration‌های اجرا شده
    ///
    /// فقط یک اتصال داره چون هر اتصال `:memory:` دیتابیس جدایی میسازه.
    /// تست‌های یکپارچه و تست‌های واحد از این استفاده میکنن.
    ///
    /// # Errors
    /// خطا برمیگردونه اگه اتصال یا migration موفق نباشه
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let db = Self {
            pool: Arc::new(pool),
        };

        db.migrate().await?;
        Ok(db)
    }

    /// اجرای migration‌ها
    ///
    /// # Errors
    /// خطا برمیگردونه اگه یکی از migration‌ها fail بشه
    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&*self.pool).await?;
        Ok(())
    }

    /// دسترسی به pool
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// بررسی سلامت دیتابیس
    ///
    /// # Errors
    /// خطا برمیگردونه اگه کوئری ساده `SELECT 1` اجرا نشه
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&*self.pool).await?;
        Ok(())
    }
}

// =====================================
// Transaction Support
// =====================================
/// # مفاهیم:
/// - RAII: وقتی Transaction drop بشه، rollback میشه مگه commit شده باشه
impl Database {
    /// شروع یک تراکنش
    ///
    /// # مثال
    /// ```rust,ignore
    /// let mut tx = db.begin().await?;
    /// // عملیات‌ها
    /// tx.commit().await?;
    /// ```
    ///
    /// # Errors
    /// خطا برمیگردونه اگه اتصالی از pool گرفته نشه
    pub async fn begin(&self) -> Result<sqlx::Transaction<'_, sqlx::Sqlite>> {
        Ok(self.pool.begin().await?)
    }
}
