//! # Custom Extractors
//!
//! Extractor‌های سفارشی برای استخراج داده از request
//!
//! ## مفاهیم Rust + Axum:
//! - **Extractors**: نوع‌هایی که از request داده استخراج میکنن
//! - **FromRequestParts**: trait برای ساخت extractor
//! - **async_trait**: پشتیبانی از async در traits
//! - **Rejection**: نوع خطا برای extractors
//!
//! ## نشست کاربر
//! توکن نشست اول از cookie (`config.session_cookie`) و اگه نبود از
//! header `Authorization: Bearer` خونده میشه.

use std::net::SocketAddr;

use axum::{
    async_trait,
    body::Body,
    extract::{rejection::FormRejection, ConnectInfo, FromRequest, FromRequestParts},
    http::{header, request::Parts, HeaderMap, Request},
    Form,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    error::AppError,
    models::User,
    services::{extract_cookie, extract_token_from_header, AppState},
};

// =====================================
// Session Helpers
// =====================================
/// توکن نشست از cookie یا header Authorization
#[must_use]
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| extract_cookie(value, cookie_name))
        .filter(|token| !token.is_empty());

    from_cookie
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(extract_token_from_header)
                .filter(|token| !token.is_empty())
        })
        .map(ToString::to_string)
}

/// کاربر فعال صاحب نشست، اگه توکن معتبری وجود داشته باشه
pub async fn session_user(state: &AppState, headers: &HeaderMap) -> Option<User> {
    let token = session_token(headers, &state.config.session_cookie)?;

    match state.auth_service.user_from_token(&token).await {
        Ok(user) => Some(user),
        Err(err) => {
            debug!(error = %err, "Ignoring invalid session token");
            None
        }
    }
}

/// مسیر فعلی برای پارامتر `next` فرم ورود
fn current_path(parts: &Parts) -> String {
    parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path().to_string(), ToString::to_string)
}

// =====================================
// Current User Extractor
// =====================================
/// کاربر وارد شده
///
/// اگه نشست معتبری نباشه، به فرم ورود redirect میشه
///
/// # استفاده در handler:
/// ```rust,ignore
/// async fn handler(CurrentUser(user): CurrentUser) -> ... {
///     // user حتما وارد شده و فعاله
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        session_user(state, &parts.headers)
            .await
            .map(CurrentUser)
            .ok_or_else(|| AppError::LoginRequired {
                next: current_path(parts),
            })
    }
}

// =====================================
// Optional User Extractor
// =====================================
/// کاربر اختیاری برای صفحات عمومی
///
/// هیچوقت reject نمیکنه؛ توکن نامعتبر یعنی کاربر مهمانه
#[derive(Debug, Clone, Default)]
pub struct OptionalUser(pub Option<User>);

impl OptionalUser {
    /// آیا لاگین کرده؟
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.0.is_some()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(OptionalUser(session_user(state, &parts.headers).await))
    }
}

// =====================================
// Portal User Extractor
// =====================================
/// کاربر مجاز به پنل مدیریت (نویسنده یا کارمند)
///
/// - مهمان: redirect به فرم ورود
/// - کاربر عادی: 403
#[derive(Debug, Clone)]
pub struct PortalUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for PortalUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if !user.can_access_portal() {
            return Err(AppError::Forbidden(format!(
                "User '{}' is neither an author nor staff",
                user.username
            )));
        }

        Ok(PortalUser(user))
    }
}

// =====================================
// Request ID Extractor
// =====================================
/// Request ID که middleware `request_id` تنظیم کرده
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    /// Header name برای request ID
    pub const HEADER_NAME: &'static str = "X-Request-Id";
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequestId {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let request_id = parts
            .headers
            .get(Self::HEADER_NAME)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
            .unwrap_or_else(|| nanoid::nanoid!(12));

        Ok(RequestId(request_id))
    }
}

// =====================================
// Client IP Extractor
// =====================================
/// استخراج IP کلاینت
///
/// به صورت پیش‌فرض آدرس اتصال (`ConnectInfo`) استفاده میشه. header‌های
/// `X-Forwarded-For` و `X-Real-IP` رو هر کلاینتی میتونه بفرسته، پس فقط
/// با `config.trust_proxy_headers` خونده میشن.
#[derive(Debug, Clone)]
pub struct ClientIp(pub Option<String>);

impl ClientIp {
    /// کلید rate limiting
    #[must_use]
    pub fn key(&self) -> &str {
        self.0.as_deref().unwrap_or("unknown")
    }
}

/// IP کلاینت از header‌های proxy یا آدرس اتصال
///
/// # ترتیب (وقتی `trust_proxy` روشنه):
/// 1. `X-Forwarded-For` (اولین IP)
/// 2. `X-Real-IP`
/// 3. آدرس اتصال
#[must_use]
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> Option<String> {
    let forwarded = || {
        headers
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .or_else(|| {
                headers
                    .get("X-Real-IP")
                    .and_then(|v| v.to_str().ok())
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
            })
    };

    trust_proxy
        .then(forwarded)
        .flatten()
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}

#[async_trait]
impl FromRequestParts<AppState> for ClientIp {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Ok(ClientIp(client_ip(
            &parts.headers,
            peer,
            state.config.trust_proxy_headers,
        )))
    }
}

// =====================================
// HTML Form Extractor
// =====================================
/// بدنه فرم `application/x-www-form-urlencoded`
///
/// خطای parse به `AppError::BadRequest` تبدیل میشه تا صفحه خطای 400
/// رندر بشه. خطاهای اعتبارسنجی فیلدها کار سرویس‌هاست.
///
/// # استفاده:
/// ```rust,ignore
/// async fn handler(FormData(form): FormData<LoginForm>) -> ... {}
/// ```
#[derive(Debug, Clone)]
pub struct FormData<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for FormData<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        let Form(data) = Form::<T>::from_request(req, state)
            .await
            .map_err(|e: FormRejection| AppError::BadRequest(format!("Invalid form data: {}", e)))?;

        Ok(FormData(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_session_token_prefers_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; qurno_session=abc"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));

        assert_eq!(session_token(&headers, "qurno_session").as_deref(), Some("abc"));
    }

    #[test]
    fn test_session_token_falls_back_to_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));

        assert_eq!(session_token(&headers, "qurno_session").as_deref(), Some("xyz"));
        assert_eq!(session_token(&HeaderMap::new(), "qurno_session"), None);
    }

    #[test]
    fn test_client_ip_ignores_forwarded_headers_by_default() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Forwarded-For", HeaderValue::from_static("10.0.0.1, 10.0.0.2"));
        let peer: SocketAddr = "192.0.2.7:51000".parse().unwrap();

        assert_eq!(client_ip(&headers, Some(peer), false).as_deref(), Some("192.0.2.7"));
        assert_eq!(client_ip(&headers, None, false), None);
    }

    #[test]
    fn test_client_ip_uses_forwarded_headers_behind_proxy() {
        let peer: SocketAddr = "127.0.0.1:8000".parse().unwrap();

        let mut headers = HeaderMap::new();
        headers.insert("X-Forwarded-For", HeaderValue::from_static("10.0.0.1, 10.0.0.2"));
        assert_eq!(client_ip(&headers, Some(peer), true).as_deref(), Some("10.0.0.1"));

        let mut headers = HeaderMap::new();
        headers.insert("X-Real-IP", HeaderValue::from_static("10.0.0.9"));
        assert_eq!(client_ip(&headers, Some(peer), true).as_deref(), Some("10.0.0.9"));

        assert_eq!(client_ip(&HeaderMap::new(), Some(peer), true).as_deref(), Some("127.0.0.1"));
    }

    #[test]
    fn test_empty_cookie_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("qurno_session="));

        assert_eq!(session_token(&headers, "qurno_session"), None);
    }
}
