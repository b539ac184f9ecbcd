//! # HTTP Handlers
//!
//! این ماژول handler‌های HTTP رو تعریف میکنه.
//!
//! ## Handler چیه؟
//! تابعی که request میگیره و response برمیگردونه.
//! در axum، هر handler یک async function هست.
//!
//! ## قرارداد
//! handler‌ها فقط داده رو استخراج میکنن، سرویس رو صدا میزنن و قالب رو
//! رندر میکنن. `AppError::InvalidForm` گرفته میشه و همون فرم با پیام‌های
//! خطا دوباره رندر میشه.

pub mod accounts;
pub mod admins;
pub mod blog;
pub mod health;
pub mod pages;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tera::Context;

use crate::{
    config::Config,
    error::Result,
    models::User,
    services::AppState,
    utils::{
        encode_query_value,
        jalali::{get_jalali_today, local_weekday},
    },
};

// =====================================
// Template Contexts
// =====================================
/// context صفحات عمومی: کاربر فعلی و sidebar
///
/// sidebar برای هر درخواست از نو خونده میشه
pub(crate) async fn public_context(state: &AppState, user: Option<&User>) -> Result<Context> {
    let mut context = state.templates.context();
    context.insert("current_user", &user);
    context.insert("sidebar", &state.blog_service.sidebar().await?);
    Ok(context)
}

/// context صفحات پنل مدیریت: کاربر و تاریخ امروز (جلالی)
pub(crate) fn portal_context(state: &AppState, user: &User) -> Context {
    let now = Utc::now();
    let offset = state.config.utc_offset_minutes;

    let mut context = state.templates.context();
    context.insert("current_user", user);
    context.insert("today", &get_jalali_today(now, offset));
    context.insert("weekday", local_weekday(now, offset));
    context
}

/// رندر یک قالب با status 200
pub(crate) fn render(state: &AppState, name: &str, context: &Context) -> Result<Response> {
    Ok(state.templates.render(name, context)?.into_response())
}

// =====================================
// Redirects
// =====================================
/// Redirect موقت (302) برای مسیرهای تنبل لیست‌ها
pub(crate) fn found(location: impl Into<String>) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.into())]).into_response()
}

/// Redirect بعد از POST (303)
pub(crate) fn see_other(location: impl Into<String>) -> Response {
    (StatusCode::SEE_OTHER, [(header::LOCATION, location.into())]).into_response()
}

/// مسیر جزئیات عمومی پست
pub(crate) fn post_url(slug: &str) -> String {
    format!("/blog/post/detail/{}/", encode_query_value(slug))
}

// =====================================
// Session Cookie
// =====================================
/// header `Set-Cookie` برای نشست جدید
pub(crate) fn session_cookie(config: &Config, token: &str) -> String {
    let max_age = config.jwt_expiration_hours.saturating_mul(3600);
    let secure = if config.secure_cookies() { "; Secure" } else { "" };

    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}",
        config.session_cookie, token, max_age, secure
    )
}

/// header `Set-Cookie` برای پاک کردن نشست
pub(crate) fn clear_session_cookie(config: &Config) -> String {
    format!(
        "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0",
        config.session_cookie
    )
}

/// redirect همراه با تنظیم cookie
pub(crate) fn see_other_with_cookie(location: impl Into<String>, cookie: String) -> Response {
    (
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, location.into()),
            (header::SET_COOKIE, cookie),
        ],
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigBuilder, Environment};

    #[test]
    fn test_session_cookie_attributes() {
        let config = Config::default();
        let cookie = session_cookie(&config, "token");

        assert!(cookie.starts_with("qurno_session=token;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn test_session_cookie_secure_in_production() {
        let config = ConfigBuilder::new()
            .environment(Environment::Production)
            .build();
        assert!(session_cookie(&config, "token").ends_with("; Secure"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        assert!(clear_session_cookie(&Config::default()).contains("Max-Age=0"));
    }

    #[test]
    fn test_redirect_status_codes() {
        assert_eq!(found("/a/").status(), StatusCode::FOUND);
        assert_eq!(see_other("/a/").status(), StatusCode::SEE_OTHER);
        assert_eq!(post_url("سلام-دنیا"), "/blog/post/detail/%D8%B3%D9%84%D8%A7%D9%85-%D8%AF%D9%86%DB%8C%D8%A7/");
    }
}
