//! # Middleware
//!
//! Middleware‌های سفارشی برای پردازش request/response
//!
//! ## مفاهیم:
//! - **Middleware**: کد که قبل/بعد از handler اجرا میشه
//! - **Tower**: کتابخانه middleware در اکوسیستم Rust
//! - **from_fn / from_fn_with_state**: ساخت middleware از یک async fn
//!
//! ## ترتیب
//! ```text
//! request_id → request_timing → security_headers → error_pages → handler
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{header::HeaderValue, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::extractors::{session_user, RequestId};
use super::handlers::{portal_context, public_context};
use crate::{
    error::{AppError, ErrorPage, Result},
    services::AppState,
};

// =====================================
// Request Timing Middleware
// =====================================
/// اندازه‌گیری زمان پردازش request
///
/// # استفاده:
/// ```rust,ignore
/// let app = Router::new()
///     .layer(axum::middleware::from_fn(request_timing));
/// ```
pub async fn request_timing(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = %start.elapsed().as_millis(),
        "Request completed"
    );

    response
}

// =====================================
// Request ID Middleware
// =====================================
/// اضافه کردن Request ID به هر request و response
///
/// ID نامعتبر (غیر ASCII) کلاینت با یک ID تازه جایگزین میشه
pub async fn request_id(mut request: Request<Body>, next: Next) -> Response {
    let incoming = request
        .headers()
        .get(RequestId::HEADER_NAME)
        .filter(|value| value.to_str().is_ok())
        .cloned();

    let value = match incoming {
        Some(value) => value,
        None => match HeaderValue::from_str(&nanoid::nanoid!(12)) {
            Ok(value) => value,
            Err(_) => return next.run(request).await,
        },
    };

    request.headers_mut().insert(RequestId::HEADER_NAME, value.clone());
    let mut response = next.run(request).await;
    response.headers_mut().insert(RequestId::HEADER_NAME, value);
    response
}

// =====================================
// Security Headers Middleware
// =====================================
/// اضافه کردن header‌های امنیتی
pub async fn security_headers(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    // جلوگیری از MIME sniffing
    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));

    // جلوگیری از clickjacking
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));

    headers.insert("X-XSS-Protection", HeaderValue::from_static("1; mode=block"));
    headers.insert(
        "Referrer-Policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    response
}

// =====================================
// Error Pages Middleware
// =====================================
/// تبدیل پاسخ‌های خطا به صفحه HTML
///
/// `AppError` فقط یک `ErrorPage` در extensions پاسخ میذاره. اینجا قالب
/// مناسب رندر میشه: زیر `/admins` قالب پنل مدیریت، بقیه جاها قالب عمومی
/// همراه با sidebar.
pub async fn error_pages(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let in_portal = request.uri().path().starts_with("/admins");
    let headers = request.headers().clone();

    let response = next.run(request).await;

    let Some(page) = response.extensions().get::<ErrorPage>().cloned() else {
        return response;
    };

    match render_error_page(&state, &headers, &page, in_portal).await {
        Ok(body) => {
            let status = response.status();
            let mut rendered = (status, body).into_response();
            if let Some(retry_after) = response.headers().get("Retry-After") {
                rendered.headers_mut().insert("Retry-After", retry_after.clone());
            }
            rendered
        }
        Err(err) => {
            error!(error = %err, status = page.status, "Failed to render error page");
            response
        }
    }
}

/// نام قالب صفحه خطا
fn error_template(status: u16, in_portal: bool) -> &'static str {
    if in_portal {
        return "admins/errors/error.html";
    }

    match status {
        403 => "errors/403.html",
        404 => "errors/404.html",
        500..=599 => "errors/500.html",
        _ => "errors/error.html",
    }
}

async fn render_error_page(
    state: &AppState,
    headers: &HeaderMap,
    page: &ErrorPage,
    in_portal: bool,
) -> Result<axum::response::Html<String>> {
    let user = session_user(state, headers).await;
    let portal_user = user.as_ref().filter(|user| in_portal && user.can_access_portal());

    let mut context = match portal_user {
        Some(user) => portal_context(state, user),
        None => match public_context(state, user.as_ref()).await {
            Ok(context) => context,
            Err(err) => {
                // بدون sidebar هم صفحه خطا قابل نمایشه
                warn!(error = %err, "Sidebar unavailable for error page");
                let mut context = state.templates.context();
                context.insert("current_user", &user);
                context
            }
        },
    };
    context.insert("status", &page.status);
    context.insert("message", &page.message);

    let template = error_template(page.status, portal_user.is_some());
    state.templates.render(template, &context)
}

// =====================================
// Rate Limiting (Simple In-Memory)
// =====================================
/// Rate limiter با پنجره ثابت برای هر کلید (IP)
///
/// # مفاهیم:
/// - `RwLock`: قفل خواندن/نوشتن async
/// - `Arc`: اشتراک امن بین threads
/// - `HashMap`: نگهداری counter برای هر کلید
#[derive(Debug, Clone, Default)]
pub struct RateLimiterState {
    requests: Arc<RwLock<HashMap<String, (u32, Instant)>>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiterState {
    /// ساخت rate limiter جدید
    #[must_use]
    pub fn new(max_requests: u32, window_seconds: u64) -> Self {
        Self {
            requests: Arc::new(RwLock::new(HashMap::new())),
            max_requests,
            window: Duration::from_secs(window_seconds),
        }
    }

    /// ثبت یک تلاش برای `key`
    ///
    /// # Errors
    /// `AppError::RateLimited` اگه سهمیه پنجره فعلی تموم شده باشه
    pub async fn check(&self, key: &str) -> Result<(), AppError> {
        let now = Instant::now();
        let mut requests = self.requests.write().await;

        let entry = requests.entry(key.to_string()).or_insert((0, now));

        if now.duration_since(entry.1) > self.window {
            *entry = (1, now);
            return Ok(());
        }

        if entry.0 >= self.max_requests {
            warn!(key = %key, "Rate limit exceeded");
            return Err(AppError::RateLimited);
        }

        entry.0 += 1;
        Ok(())
    }

    /// پاک کردن شمارنده یک کلید (مثلا بعد از ورود موفق)
    pub async fn reset(&self, key: &str) {
        self.requests.write().await.remove(key);
    }

    /// پاکسازی entry‌های قدیمی
    pub async fn cleanup(&self) {
        let now = Instant::now();
        let window = self.window;
        self.requests
            .write()
            .await
            .retain(|_, (_, started)| now.duration_since(*started) <= window);
    }

    /// تعداد کلیدهای در حال پیگیری
    pub async fn tracked(&self) -> usize {
        self.requests.read().await.len()
    }
}

/// وضعیت 429 همراه با `Retry-After`
#[must_use]
pub fn too_many_requests(window_seconds: u64) -> Response {
    let mut response = AppError::RateLimited.into_response();
    if let Ok(value) = HeaderValue::from_str(&window_seconds.to_string()) {
        response.headers_mut().insert("Retry-After", value);
    }
    response
}
