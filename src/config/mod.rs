//! # ماژول تنظیمات (Configuration)
//!
//! تنظیمات سایت از سه منبع خونده میشه، به ترتیب اولویت:
//! 1. متغیرهای محیطی (و فایل `.env` که `dotenvy` لود میکنه)
//! 2. فایل اختیاری `qurno.toml` در مسیر اجرا
//! 3. مقادیر پیش‌فرض `Config::default()`
//!
//! ## مفاهیم Rust:
//! - **`#[serde(default)]`**: پر کردن فیلدهای جاافتاده از `Default`
//! - **`#[serde(from = "String")]`**: دسریالایز با یک تبدیل میانی
//! - **Builder Pattern**: ساخت تدریجی آبجکت (بیشتر در تست‌ها)

use serde::{Deserialize, Serialize};
use crate::error::{AppError, Result};

/// کلید JWT پیش‌فرض که در production پذیرفته نمیشه
pub const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

/// تنظیمات اصلی برنامه
///
/// # مثال
/// ```rust
/// use qurno::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.posts_per_page, 25);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// آدرس هاست سرور
    pub host: String,

    /// پورت سرور
    pub port: u16,

    /// آدرس اتصال به دیتابیس
    pub database_url: String,

    /// کلید امضای نشست‌ها
    pub jwt_secret: String,

    /// مدت اعتبار نشست (ساعت)
    pub jwt_expiration_hours: u64,

    /// نام کوکی نشست
    pub session_cookie: String,

    /// پوشه فایل‌های آپلود شده (آواتار، بنر)
    pub media_root: String,

    /// پیشوند URL فایل‌های media
    pub media_url: String,

    /// پوشه فایل‌های استاتیک
    pub static_root: String,

    /// عنوان سایت در قالب‌ها
    pub site_title: String,

    /// تعداد پست در هر صفحه بخش عمومی
    pub posts_per_page: u32,

    /// تعداد آیتم در هر صفحه پنل مدیریت
    pub admin_posts_per_page: u32,

    /// اختلاف ساعت محلی با UTC به دقیقه (تهران: +03:30)
    pub utc_offset_minutes: i32,

    /// حداکثر تلاش ورود در هر پنجره زمانی برای هر IP
    pub login_rate_limit: u32,

    /// طول پنجره rate limit ورود (ثانیه)
    pub login_rate_window_seconds: u64,

    /// خوندن IP کلاینت از `X-Forwarded-For` / `X-Real-IP`
    ///
    /// فقط پشت reverse proxy که این header‌ها رو بازنویسی میکنه روشن بشه
    pub trust_proxy_headers: bool,

    /// محیط اجرا (development, testing, production)
    pub environment: Environment,
}

/// محیط اجرای برنامه
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Environment {
    /// محیط توسعه: فایل‌های media مستقیم سرو میشن
    #[default]
    Development,

    /// محیط تست
    Testing,

    /// محیط تولید
    Production,
}

impl Environment {
    /// آیا در محیط توسعه هستیم؟
    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    /// آیا در محیط تولید هستیم؟
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// تبدیل String به Environment
///
/// مقدار ناشناخته به Development برمیگرده
impl From<String> for Environment {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "testing" | "test" => Environment::Testing,
            _ => Environment::Development,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            database_url: "sqlite://data/qurno.db?mode=rwc".to_string(),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            jwt_expiration_hours: 24 * 14,
            session_cookie: "qurno_session".to_string(),
            media_root: "media".to_string(),
            media_url: "/media/".to_string(),
            static_root: "static".to_string(),
            site_title: "قرنو".to_string(),
            posts_per_page: 25,
            admin_posts_per_page: 25,
            utc_offset_minutes: 210,
            login_rate_limit: 10,
            login_rate_window_seconds: 300,
            trust_proxy_headers: false,
            environment: Environment::Development,
        }
    }
}

impl Config {
    /// ساخت تنظیمات از فایل `qurno.toml` (اختیاری) و متغیرهای محیطی
    ///
    /// # مفاهیم:
    /// - `config::Config::builder()`: لایه‌بندی منابع تنظیمات
    /// - `try_parsing(true)`: تبدیل `PORT=8080` به عدد
    ///
    /// # Errors
    /// خطا برمیگردونه اگه مقداری قابل تبدیل به نوع فیلد نباشه
    ///
    /// # مثال
    /// ```rust,no_run
    /// use qurno::config::Config;
    ///
    /// let config = Config::from_env().expect("Failed to load config");
    /// ```
    pub fn from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("qurno").required(false))
            .add_source(config::Environment::default().try_parsing(true))
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        settings
            .try_deserialize::<Config>()
            .map_err(|e| AppError::Config(e.to_string()))
    }

    /// اعتبارسنجی تنظیمات
    ///
    /// # Errors
    /// - کلید پیش‌فرض JWT در production
    /// - پورت صفر
    /// - تعداد صفر آیتم در صفحه
    pub fn validate(&self) -> Result<()> {
        if self.environment.is_production() && self.jwt_secret == DEFAULT_JWT_SECRET {
            return Err(AppError::Config(
                "JWT_SECRET must be changed in production".to_string()
            ));
        }

        if self.port == 0 {
            return Err(AppError::Config("PORT cannot be 0".to_string()));
        }

        if self.posts_per_page == 0 || self.admin_posts_per_page == 0 {
            return Err(AppError::Config(
                "POSTS_PER_PAGE and ADMIN_POSTS_PER_PAGE must be positive".to_string()
            ));
        }

        Ok(())
    }

    /// آدرس کامل سرور
    #[must_use]
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// آیا کوکی نشست باید `Secure` باشه؟
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.environment.is_production()
    }
}

// =====================================
// Builder Pattern
// =====================================
/// ساخت Config با Builder Pattern
///
/// # مثال
/// ```rust
/// use qurno::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .port(8080)
///     .host("0.0.0.0")
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// ساخت builder جدید
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// تنظیم پورت
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// تنظیم هاست
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// تنظیم database_url
    #[must_use]
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database_url = url.into();
        self
    }

    /// تنظیم jwt_secret
    #[must_use]
    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.jwt_secret = secret.into();
        self
    }

    #[must_use]
    pub fn site_title(mut self, title: impl Into<String>) -> Self {
        self.config.site_title = title.into();
        self
    }

    #[must_use]
    pub fn posts_per_page(mut self, per_page: u32) -> Self {
        self.config.posts_per_page = per_page;
        self
    }

    #[must_use]
    pub fn admin_posts_per_page(mut self, per_page: u32) -> Self {
        self.config.admin_posts_per_page = per_page;
        self
    }

    #[must_use]
    pub fn utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.config.utc_offset_minutes = minutes;
        self
    }

    /// تنظیم محدودیت تلاش ورود
    #[must_use]
    pub fn login_rate_limit(mut self, max_attempts: u32, window_seconds: u64) -> Self {
        self.config.login_rate_limit = max_attempts;
        self.config.login_rate_window_seconds = window_seconds;
        self
    }

    /// اعتماد به header‌های IP که reverse proxy میفرسته
    #[must_use]
    pub fn trust_proxy_headers(mut self, trust: bool) -> Self {
        self.config.trust_proxy_headers = trust;
        self
    }

    /// تنظیم محیط
    #[must_use]
    pub fn environment(mut self, env: Environment) -> Self {
        self.config.environment = env;
        self
    }

    /// ساخت Config نهایی
    #[must_use]
    pub fn build(self) -> Config {
        self.config
    }

    /// ساخت Config با اعتبارسنجی
    ///
    /// # Errors
    /// خطا برمیگردونه اگه اعتبارسنجی fail بشه
    pub fn build_validated(self) -> Result<Config> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
