//! # ماژول مدیریت خطاها (Error Handling)
//!
//! همه خطاهای برنامه در یک enum جمع شدن: `AppError`.
//!
//! ## مفاهیم Rust:
//! - **thiserror**: derive macro برای Error trait
//! - **From Trait**: تبدیل خودکار خطای کتابخانه‌ها با `?`
//! - **IntoResponse**: برگردوندن مستقیم خطا از handler
//!
//! ## صفحات خطا
//! `IntoResponse` فقط status و یک `ErrorPage` در extensions پاسخ میذاره.
//! middleware مربوط به صفحات خطا (`api::middleware::error_pages`) بعدا
//! قالب HTML مناسب (403/404/500) رو با sidebar رندر میکنه.
//! این طوری خطا به AppState و Tera وابسته نمیشه.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::models::FormErrors;

// =====================================
// Result Type Alias
// =====================================
/// نوع Result سفارشی برنامه
///
/// به جای `Result<User, AppError>` مینویسیم `Result<User>`
pub type Result<T, E = AppError> = std::result::Result<T, E>;

// =====================================
// Custom Error Enum
// =====================================
/// خطای اصلی برنامه
#[derive(Debug, Error)]
pub enum AppError {
    // ----------------------------------------
    // خطاهای کاربر (4xx)
    // ----------------------------------------

    /// درخواست نامعتبر - 400
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// احراز هویت نشده - 401
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// صفحه نیاز به ورود داره - به فرم ورود redirect میشه
    #[error("Login required")]
    LoginRequired {
        /// مسیری که بعد از ورود به اون برمیگردیم
        next: String,
    },

    /// دسترسی ممنوع - 403
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// پیدا نشد - 404
    #[error("Not found: {0}")]
    NotFound(String),

    /// تکراری - 409
    #[error("Conflict: {0}")]
    Conflict(String),

    /// محدودیت نرخ - 429
    #[error("Too many requests")]
    RateLimited,

    /// خطای اعتبارسنجی - 422
    #[error("Validation error: {0}")]
    Validation(String),

    /// خطای فیلدهای فرم
    ///
    /// handler‌ها این خطا رو میگیرن و همون فرم رو با پیام‌ها دوباره رندر میکنن
    #[error("Invalid form: {0}")]
    InvalidForm(FormErrors),

    // ----------------------------------------
    // خطاهای سرور (5xx)
    // ----------------------------------------

    /// خطای داخلی سرور - 500
    #[error("Internal server error: {0}")]
    Internal(String),

    /// خطای سرور
    #[error("Server error: {0}")]
    Server(String),

    /// خطای تنظیمات
    #[error("Configuration error: {0}")]
    Config(String),

    // ----------------------------------------
    // خطاهای تبدیل شده از کتابخانه‌ها
    // ----------------------------------------

    /// خطای دیتابیس
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// خطای migration
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// خطای IO
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// خطای JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// خطای JWT
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// خطای رندر قالب
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),
}

impl AppError {
    /// گرفتن HTTP status code متناسب با خطا
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::LoginRequired { .. } => StatusCode::SEE_OTHER,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Validation(_) | Self::InvalidForm(_) => StatusCode::UNPROCESSABLE_ENTITY,

            Self::Internal(_)
            | Self::Server(_)
            | Self::Config(_)
            | Self::Database(_)
            | Self::Migration(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Jwt(_)
            | Self::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// آیا این یه خطای سرور هست؟
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// پیام قابل نمایش به کاربر
    ///
    /// جزئیات خطاهای داخلی هیچوقت به کاربر نشون داده نمیشه
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::NotFound(_) => "صفحه مورد نظر پیدا نشد.".to_string(),
            Self::Forbidden(_) => "شما به این بخش دسترسی ندارید.".to_string(),
            Self::RateLimited => "تعداد درخواست‌ها بیش از حد مجاز است. کمی بعد دوباره تلاش کنید.".to_string(),
            Self::BadRequest(msg) | Self::Validation(msg) | Self::Conflict(msg) => msg.clone(),
            Self::Unauthorized(_) | Self::LoginRequired { .. } => "ابتدا وارد حساب کاربری شوید.".to_string(),
            Self::InvalidForm(errors) => errors.to_string(),
            _ => "خطایی در سرور رخ داد.".to_string(),
        }
    }

    /// ساخت خطای Not Found برای پست
    #[must_use]
    pub fn post_not_found(key: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("Post '{}' not found", key))
    }

    /// ساخت خطای Not Found برای کاربر
    #[must_use]
    pub fn user_not_found(username: &str) -> Self {
        Self::NotFound(format!("User '{}' not found", username))
    }

    /// ساخت خطای Not Found برای دسته‌بندی
    #[must_use]
    pub fn category_not_found(key: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("Category '{}' not found", key))
    }
}

// =====================================
// Error Page Marker
// =====================================
/// اطلاعات صفحه خطا که در extensions پاسخ قرار میگیره
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPage {
    /// کد وضعیت HTTP
    pub status: u16,

    /// پیام قابل نمایش
    pub message: String,
}

// =====================================
// IntoResponse Implementation
// =====================================
/// تبدیل AppError به Response HTTP
///
/// - `LoginRequired` به فرم ورود redirect میشه
/// - بقیه خطاها یک پاسخ متنی با `ErrorPage` میشن که بعدا به HTML تبدیل میشه
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            error!(error = %self, "Server error occurred");
        }

        if let Self::LoginRequired { next } = &self {
            let location = format!("/accounts/login/?next={}", crate::utils::encode_query_value(next));
            let mut response = StatusCode::SEE_OTHER.into_response();
            if let Ok(value) = HeaderValue::from_str(&location) {
                response.headers_mut().insert(header::LOCATION, value);
            }
            return response;
        }

        let status = self.status_code();
        let page = ErrorPage {
            status: status.as_u16(),
            message: self.public_message(),
        };

        let mut response = (status, page.message.clone()).into_response();
        response.extensions_mut().insert(page);
        response
    }
}

// =====================================
// From Implementations
// =====================================
impl From<String> for AppError {
    fn from(s: String) -> Self {
        AppError::Internal(s)
    }
}

impl From<&str> for AppError {
    fn from(s: &str) -> Self {
        AppError::Internal(s.to_string())
    }
}

// خطاهای validator به خطای فیلدهای فرم تبدیل میشن
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidForm(FormErrors::from(err))
    }
}

// =====================================
// Result Extensions
// =====================================
/// Extension trait برای Result
pub trait ResultExt<T, E> {
    /// تبدیل خطا به AppError::Internal
    fn map_internal(self) -> Result<T>;

    /// تبدیل خطا به نوع دلخواه
    fn map_app_err<F>(self, f: F) -> Result<T>
    where
        F: FnOnce(E) -> AppError;
}

impl<T, E: std::fmt::Display> ResultExt<T, E> for std::result::Result<T, E> {
    fn map_internal(self) -> Result<T> {
        self.map_err(|e| AppError::Internal(e.to_string()))
    }

    fn map_app_err<F>(self, f: F) -> Result<T>
    where
        F: FnOnce(E) -> AppError,
    {
        self.map_err(f)
    }
}

// =====================================
// Option Extensions
// =====================================
/// Extension trait برای Option
pub trait OptionExt<T> {
    /// تبدیل None به AppError::NotFound
    fn ok_or_not_found(self, message: impl Into<String>) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, message: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| AppError::NotFound(message.into()))
    }
}
