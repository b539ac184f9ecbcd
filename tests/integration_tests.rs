//! # تست‌های Integration
//!
//! این فایل تست‌های end-to-end رو شامل میشه.
//!
//! ## مفاهیم Rust در تست‌ها:
//! - `#[tokio::test]`: تست‌های async
//! - `tower::ServiceExt::oneshot`: ارسال request به router بدون سرور واقعی
//! - `Database::in_memory()`: دیتابیس جدا برای هر تست
//! - `proptest!`: تست با ورودی‌های تصادفی
//!
//! ## اجرای تست‌ها:
//! ```bash
//! cargo test                    # همه تست‌ها
//! cargo test --lib              # فقط تست‌های unit
//! cargo test --test integration_tests  # فقط این فایل
//! cargo test admin_             # تست‌هایی که با admin_ شروع میشن
//! ```

use std::net::SocketAddr;

use axum::{
    body::{to_bytes, Body},
    extract::ConnectInfo,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use tower::ServiceExt;

use qurno::{
    api::create_router,
    config::{Config, ConfigBuilder},
    database::{CategoryRepository, CommentRepository, Database, PostRepository},
    models::{Category, CategoryInput, LoginForm, Post, PostInput, PostStatus, User},
    services::AppState,
};

// =====================================
// Test Helpers
// =====================================
const PASSWORD: &str = "secret-password-1";

struct TestApp {
    state: AppState,
    router: Router,
}

impl TestApp {
    async fn new() -> Self {
        Self::with_config(Config::default()).await
    }

    async fn with_config(config: Config) -> Self {
        let db = Database::in_memory().await.unwrap();
        let state = AppState::new(db, config).unwrap();
        let router = create_router(state.clone());
        Self { state, router }
    }

    /// ساخت کاربر و گرفتن cookie نشست
    async fn user(&self, username: &str, is_author: bool) -> (User, String) {
        self.user_with_roles(username, is_author, false).await
    }

    async fn user_with_roles(&self, username: &str, is_author: bool, is_staff: bool) -> (User, String) {
        self.state
            .auth_service
            .create_user(username, PASSWORD, None, is_author, is_staff)
            .await
            .unwrap();

        let form = LoginForm {
            username: username.to_string(),
            password: PASSWORD.to_string(),
            next: None,
        };
        let (user, token) = self.state.auth_service.login(&form).await.unwrap();
        (user, format!("qurno_session={token}"))
    }

    async fn category(&self, designer: &User, slug: &str, active: bool) -> Category {
        CategoryRepository::new(self.state.db.clone())
            .create(
                &CategoryInput {
                    title: format!("Category {slug}"),
                    description: None,
                    slug: slug.to_string(),
                    active,
                },
                designer.id,
            )
            .await
            .unwrap()
    }

    async fn post(&self, author: &User, category: &Category, slug: &str, customize: impl FnOnce(&mut PostInput)) -> Post {
        let mut input = PostInput {
            banner: "blog/banners/rust.png".to_string(),
            title: format!("Title {slug}"),
            content: format!("<p>Body of {slug}</p>"),
            description: format!("Description {slug}"),
            slug: slug.to_string(),
            pub_datetime: Utc::now() - Duration::hours(1),
            category_id: category.id,
            tags: Vec::new(),
            read_time: 7,
            status: PostStatus::Published,
            active: true,
        };
        customize(&mut input);

        PostRepository::new(self.state.db.clone())
            .create(&input, author.id)
            .await
            .unwrap()
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, String) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> (StatusCode, HeaderMap, String) {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> (StatusCode, HeaderMap, String) {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }
}

/// تلاش ورود ناموفق از یک آدرس اتصال با `X-Forwarded-For` دلخواه
fn failed_login(peer: SocketAddr, forwarded_for: &str) -> Request<Body> {
    let mut request = Request::builder()
        .method(Method::POST)
        .uri("/accounts/login/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header("X-Forwarded-For", forwarded_for)
        .body(Body::from("username=nobody&password=wrong-one"))
        .unwrap();
    request.extensions_mut().insert(ConnectInfo(peer));
    request
}

fn location(headers: &HeaderMap) -> &str {
    headers
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

// =====================================
// تست‌های وبلاگ عمومی
// =====================================
mod blog_tests {
    use super::*;

    /// فقط پست‌های منتشر شده، فعال، با دسته فعال و زمان گذشته در لیست میان
    #[tokio::test]
    async fn test_post_list_shows_only_visible_posts() {
        let app = TestApp::new().await;
        let (author, _) = app.user("writer", true).await;
        let active = app.category(&author, "rust", true).await;
        let hidden = app.category(&author, "hidden", false).await;

        app.post(&author, &active, "visible-post", |_| {}).await;
        app.post(&author, &active, "draft-post", |p| p.status = PostStatus::Draft).await;
        app.post(&author, &active, "inactive-post", |p| p.active = false).await;
        app.post(&author, &active, "future-post", |p| {
            p.pub_datetime = Utc::now() + Duration::days(2);
        })
        .await;
        app.post(&author, &hidden, "hidden-category-post", |_| {}).await;

        let (status, _, body) = app.get("/blog/post/list/page/", None).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Title visible-post"));
        for slug in ["draft-post", "inactive-post", "future-post", "hidden-category-post"] {
            assert!(!body.contains(&format!("Title {slug}")), "{slug} should be hidden");
        }
    }

    /// مسیر تنبل به صفحه اول میره
    #[tokio::test]
    async fn test_post_list_lazy_redirect() {
        let app = TestApp::new().await;

        let (status, headers, _) = app.get("/blog/post/list/", None).await;

        assert_eq!(status, StatusCode::FOUND);
        assert_eq!(location(&headers), "/blog/post/list/page/");
    }

    /// صفحه جزئیات همه اطلاعات پست رو نشون میده و بازدید رو زیاد میکنه
    #[tokio::test]
    async fn test_post_detail_renders_and_counts_views() {
        let app = TestApp::new().await;
        let (author, _) = app.user("writer", true).await;
        let category = app.category(&author, "rust", true).await;
        app.post(&author, &category, "ownership", |p| {
            p.tags = vec!["rust".to_string()];
        })
        .await;

        let (status, _, body) = app.get("/blog/post/detail/ownership/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Title ownership"));
        assert!(body.contains("<p>Body of ownership</p>"));
        assert!(body.contains("rust.png"));
        assert!(body.contains("user_default_avatar.png"));
        assert!(body.contains("writer"));
        assert!(body.contains("7 دقیقه مطالعه"));
        assert!(body.contains("1 بازدید"));
        assert!(body.contains("#rust"));

        let (_, _, body) = app.get("/blog/post/detail/ownership/", None).await;
        assert!(body.contains("2 بازدید"));
    }

    /// پست پیش‌نویس یا ناموجود 404 میده
    #[tokio::test]
    async fn test_post_detail_not_found_for_hidden_posts() {
        let app = TestApp::new().await;
        let (author, _) = app.user("writer", true).await;
        let category = app.category(&author, "rust", true).await;
        app.post(&author, &category, "draft", |p| p.status = PostStatus::Draft).await;

        let (status, _, body) = app.get("/blog/post/detail/draft/", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("<html"));

        let (status, _, _) = app.get("/blog/post/detail/missing/", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    /// جستجو فقط پست‌های مرتبط رو برمیگردونه
    #[tokio::test]
    async fn test_search_finds_matching_titles() {
        let app = TestApp::new().await;
        let (author, _) = app.user("writer", true).await;
        let category = app.category(&author, "rust", true).await;
        app.post(&author, &category, "lifetimes", |p| p.title = "Rust lifetimes".to_string()).await;
        app.post(&author, &category, "cooking", |p| p.title = "Persian cooking".to_string()).await;

        let (status, _, body) = app.get("/blog/post/search/list/?query=lifetimes", None).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Rust lifetimes"));
        assert!(!body.contains("Persian cooking"));
    }

    /// لیست پست‌های یک برچسب
    #[tokio::test]
    async fn test_tag_listing() {
        let app = TestApp::new().await;
        let (author, _) = app.user("writer", true).await;
        let category = app.category(&author, "rust", true).await;
        app.post(&author, &category, "tagged", |p| p.tags = vec!["async".to_string()]).await;
        app.post(&author, &category, "untagged", |_| {}).await;

        let (status, _, body) = app.get("/blog/post/list/tag/async/", None).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Title tagged"));
        assert!(!body.contains("Title untagged"));

        let (status, _, _) = app.get("/blog/post/list/tag/unknown/", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    /// ثبت نظر نیاز به ورود داره و نظر تا تایید نمایش داده نمیشه
    #[tokio::test]
    async fn test_comment_requires_login_and_waits_for_approval() {
        let app = TestApp::new().await;
        let (author, _) = app.user("writer", true).await;
        let (_, reader_cookie) = app.user("reader", false).await;
        let category = app.category(&author, "rust", true).await;
        app.post(&author, &category, "commented", |_| {}).await;

        let uri = "/blog/post/detail/commented/comment/";
        let (status, headers, _) = app.post_form(uri, "text=Great+post", None).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert!(location(&headers).starts_with("/accounts/login/?next="));

        let (status, headers, _) = app.post_form(uri, "text=Great+post", Some(&reader_cookie)).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location(&headers), "/blog/post/detail/commented/?comment=sent");

        let (_, _, body) = app.get(location(&headers), Some(&reader_cookie)).await;
        assert!(!body.contains("Great post"));
    }

    /// متن نظر که فقط فاصله باشه خطای فرم میده
    #[tokio::test]
    async fn test_blank_comment_rerenders_form() {
        let app = TestApp::new().await;
        let (author, _) = app.user("writer", true).await;
        let (_, reader_cookie) = app.user("reader", false).await;
        let category = app.category(&author, "rust", true).await;
        let post = app.post(&author, &category, "commented", |_| {}).await;

        let (status, _, body) = app
            .post_form("/blog/post/detail/commented/comment/", "text=+++", Some(&reader_cookie))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("errorlist"));
        let comments = CommentRepository::new(app.state.db.clone())
            .count_for_moderation(Some(post.author_id))
            .await
            .unwrap();
        assert_eq!(comments, 0);
    }

    /// مسیر ناشناخته صفحه 404 رندر میکنه
    #[tokio::test]
    async fn test_unknown_route_renders_not_found_page() {
        let app = TestApp::new().await;

        let (status, headers, _) = app.get("/no/such/page/", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(content_type.starts_with("text/html"));
    }
}

// =====================================
// تست‌های حساب کاربری
// =====================================
mod account_tests {
    use super::*;

    #[tokio::test]
    async fn test_login_sets_session_cookie() {
        let app = TestApp::new().await;
        app.user("writer", true).await;

        let body = format!("username=writer&password={PASSWORD}&next=%2Fadmins%2F");
        let (status, headers, _) = app.post_form("/accounts/login/", &body, None).await;

        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location(&headers), "/admins/");
        let cookie = headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(cookie.starts_with("qurno_session="));
        assert!(cookie.contains("HttpOnly"));
    }

    #[tokio::test]
    async fn test_login_with_wrong_password_rerenders_form() {
        let app = TestApp::new().await;
        app.user("writer", true).await;

        let (status, headers, body) = app
            .post_form("/accounts/login/", "username=writer&password=wrong-one", None)
            .await;

        assert_eq!(status, StatusCode::OK);
        assert!(headers.get(header::SET_COOKIE).is_none());
        assert!(body.contains("errorlist"));
    }

    /// بعد از چند تلاش ناموفق 429 برمیگرده
    #[tokio::test]
    async fn test_login_rate_limit() {
        let config = ConfigBuilder::new().login_rate_limit(2, 60).build();
        let app = TestApp::with_config(config).await;

        let body = "username=nobody&password=wrong-one";
        for _ in 0..2 {
            let (status, _, _) = app.post_form("/accounts/login/", body, None).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, headers, _) = app.post_form("/accounts/login/", body, None).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert!(headers.get("Retry-After").is_some());
    }

    /// عوض کردن `X-Forwarded-For` محدودیت رو دور نمیزنه
    #[tokio::test]
    async fn test_login_rate_limit_ignores_spoofed_forwarded_for() {
        let config = ConfigBuilder::new().login_rate_limit(2, 60).build();
        let app = TestApp::with_config(config).await;
        let peer: SocketAddr = "203.0.113.5:40000".parse().unwrap();

        let mut statuses = Vec::new();
        for i in 0..4 {
            let (status, _, _) = app.send(failed_login(peer, &format!("10.0.0.{i}"))).await;
            statuses.push(status);
        }

        assert_eq!(
            statuses,
            vec![
                StatusCode::OK,
                StatusCode::OK,
                StatusCode::TOO_MANY_REQUESTS,
                StatusCode::TOO_MANY_REQUESTS,
            ]
        );
    }

    /// پشت proxy مورد اعتماد هر IP واقعی شمارنده جدا داره
    #[tokio::test]
    async fn test_login_rate_limit_per_forwarded_ip_behind_proxy() {
        let config = ConfigBuilder::new()
            .login_rate_limit(2, 60)
            .trust_proxy_headers(true)
            .build();
        let app = TestApp::with_config(config).await;
        let proxy: SocketAddr = "127.0.0.1:9000".parse().unwrap();

        for i in 0..4 {
            let (status, _, _) = app.send(failed_login(proxy, &format!("10.0.0.{i}"))).await;
            assert_eq!(status, StatusCode::OK);
        }

        app.send(failed_login(proxy, "10.0.0.1")).await;
        let (status, _, _) = app.send(failed_login(proxy, "10.0.0.1")).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_signup_creates_session() {
        let app = TestApp::new().await;

        let body = "username=newcomer&email=new%40example.com&password1=long-password-9&password2=long-password-9";
        let (status, headers, _) = app.post_form("/accounts/signup/", body, None).await;

        assert_eq!(status, StatusCode::SEE_OTHER);
        assert!(headers.get(header::SET_COOKIE).is_some());
    }
}

// =====================================
// تست‌های پنل مدیریت
// =====================================
mod admin_tests {
    use super::*;

    #[tokio::test]
    async fn test_admin_requires_login() {
        let app = TestApp::new().await;

        let (status, headers, _) = app.get("/admins/", None).await;

        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location(&headers), "/accounts/login/?next=%2Fadmins%2F");
    }

    #[tokio::test]
    async fn test_admin_forbidden_for_readers() {
        let app = TestApp::new().await;
        let (_, cookie) = app.user("reader", false).await;

        let (status, _, _) = app.get("/admins/", Some(&cookie)).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_portal_for_authors() {
        let app = TestApp::new().await;
        let (author, cookie) = app.user("writer", true).await;
        let category = app.category(&author, "rust", true).await;
        app.post(&author, &category, "mine", |p| p.status = PostStatus::Draft).await;

        let (status, _, body) = app.get("/admins/", Some(&cookie)).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Title mine"));
    }

    /// انتشار فوری از داشبورد و رفتن به صفحه عمومی پست
    #[tokio::test]
    async fn test_dashboard_publish_post() {
        let app = TestApp::new().await;
        let (author, cookie) = app.user("writer", true).await;
        let (_, other_cookie) = app.user("other", true).await;
        let category = app.category(&author, "rust", true).await;
        let post = app.post(&author, &category, "draft-one", |p| p.status = PostStatus::Draft).await;

        let body = format!("requested=publish_post&value={}", post.id);

        let (status, _, _) = app.post_form("/admins/", &body, Some(&other_cookie)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, headers, _) = app.post_form("/admins/", &body, Some(&cookie)).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location(&headers), "/blog/post/detail/draft-one/");

        let (status, _, _) = app.get("/blog/post/detail/draft-one/", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    /// غیرفعال کردن پست از داشبورد
    #[tokio::test]
    async fn test_dashboard_deactivation() {
        let app = TestApp::new().await;
        let (author, cookie) = app.user("writer", true).await;
        let category = app.category(&author, "rust", true).await;
        let post = app.post(&author, &category, "live", |_| {}).await;

        let body = format!("requested=deactivation&value={}", post.id);
        let (status, headers, _) = app.post_form("/admins/", &body, Some(&cookie)).await;

        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location(&headers), "/admins/");
        let (status, _, _) = app.get("/blog/post/detail/live/", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    /// فرم سریع داشبورد پیش‌نویس میسازه
    #[tokio::test]
    async fn test_dashboard_quick_create() {
        let app = TestApp::new().await;
        let (author, cookie) = app.user("writer", true).await;
        let category = app.category(&author, "rust", true).await;

        let body = format!(
            "requested=post_create&value=&title=Quick+note&content=Body&description=Short+note&slug=&category={}&tags=rust",
            category.id
        );
        let (status, headers, _) = app.post_form("/admins/", &body, Some(&cookie)).await;

        assert_eq!(status, StatusCode::SEE_OTHER);
        assert!(location(&headers).starts_with("/admins/blog/post/detail/"));

        let (status, _, body) = app.get(location(&headers), Some(&cookie)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Quick note"));

        // پیش‌نویس در صفحه عمومی نیست
        let (status, _, _) = app.get("/blog/post/detail/quick-note/", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    /// فرم سریع نامعتبر همون داشبورد رو با خطا نشون میده
    #[tokio::test]
    async fn test_dashboard_quick_create_blank_title() {
        let app = TestApp::new().await;
        let (author, cookie) = app.user("writer", true).await;
        let category = app.category(&author, "rust", true).await;

        let body = format!(
            "requested=post_create&title=+++&content=Body&description=Short&category={}",
            category.id
        );
        let (status, _, body) = app.post_form("/admins/", &body, Some(&cookie)).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("errorlist"));
    }

    /// جستجو از داشبورد به صفحه جستجوی پنل میره
    #[tokio::test]
    async fn test_dashboard_search_shortcut() {
        let app = TestApp::new().await;
        let (_, cookie) = app.user("writer", true).await;

        let (status, headers, _) = app
            .post_form("/admins/", "requested=&value=&query=rust", Some(&cookie))
            .await;

        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location(&headers), "/admins/blog/post/search/list/?query=rust");
    }

    /// مدیریت نظر فقط برای نویسنده پست یا کارمند
    #[tokio::test]
    async fn test_comment_moderation_permissions() {
        let app = TestApp::new().await;
        let (owner, owner_cookie) = app.user("owner", true).await;
        let (_, other_cookie) = app.user("other", true).await;
        let (_, staff_cookie) = app.user_with_roles("staff", false, true).await;
        let (reader, _) = app.user("reader", false).await;
        let category = app.category(&owner, "rust", true).await;
        let post = app.post(&owner, &category, "discussed", |_| {}).await;

        let comments = CommentRepository::new(app.state.db.clone());
        let first = comments.create(post.id, reader.id, None, "First thoughts").await.unwrap();
        let second = comments.create(post.id, reader.id, None, "Second thoughts").await.unwrap();

        let uri = format!("/admins/blog/comment/{}/moderate/", first.id);
        let (status, _, _) = app.post_form(&uri, "action=approve", Some(&other_cookie)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, headers, _) = app.post_form(&uri, "action=approve", Some(&staff_cookie)).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location(&headers), "/admins/blog/comment/list/page/");

        let uri = format!("/admins/blog/comment/{}/moderate/", second.id);
        let (status, _, _) = app.post_form(&uri, "action=delete", Some(&owner_cookie)).await;
        assert_eq!(status, StatusCode::SEE_OTHER);

        let (_, _, body) = app.get("/blog/post/detail/discussed/", None).await;
        assert!(body.contains("First thoughts"));
        assert!(!body.contains("Second thoughts"));

        let (status, _, body) = app.get("/admins/blog/comment/list/page/", Some(&owner_cookie)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("First thoughts"));
    }

    #[tokio::test]
    async fn test_admin_post_list_lazy_redirect() {
        let app = TestApp::new().await;
        let (_, cookie) = app.user("writer", true).await;

        let (status, headers, _) = app.get("/admins/blog/category/list/", Some(&cookie)).await;

        assert_eq!(status, StatusCode::FOUND);
        assert_eq!(location(&headers), "/admins/blog/category/list/page/");
    }

    /// فقط نویسنده پست میتونه حذفش کنه
    #[tokio::test]
    async fn test_admin_delete_requires_ownership() {
        let app = TestApp::new().await;
        let (owner, owner_cookie) = app.user("owner", true).await;
        let (_, other_cookie) = app.user("other", true).await;
        let category = app.category(&owner, "rust", true).await;
        let post = app.post(&owner, &category, "owned", |_| {}).await;

        let uri = format!("/admins/blog/post/delete/{}/", post.id);

        let (status, _, _) = app.post_form(&uri, "", Some(&other_cookie)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _, _) = app.get("/blog/post/detail/owned/", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, headers, _) = app.post_form(&uri, "", Some(&owner_cookie)).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location(&headers), "/admins/blog/post/list/page/");
        let (status, _, _) = app.get("/blog/post/detail/owned/", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    /// ساخت دسته‌بندی و redirect به جزئیات همون دسته
    #[tokio::test]
    async fn test_admin_category_create_redirects_to_detail() {
        let app = TestApp::new().await;
        let (_, cookie) = app.user("designer", true).await;

        let (status, headers, _) = app
            .post_form(
                "/admins/blog/category/create/",
                "title=Systems&slug=systems&active=on",
                Some(&cookie),
            )
            .await;

        assert_eq!(status, StatusCode::SEE_OTHER);
        assert!(location(&headers).starts_with("/admins/blog/category/detail/"));

        let (status, _, body) = app.get("/blog/category/list/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Systems"));
    }
}

// =====================================
// تست Health
// =====================================
mod health_tests {
    use super::*;
    use qurno::models::HealthResponse;

    #[tokio::test]
    async fn test_health_check() {
        let app = TestApp::new().await;

        let (status, _, body) = app.get("/health", None).await;

        assert_eq!(status, StatusCode::OK);
        let health: HealthResponse = serde_json::from_str(&body).unwrap();
        assert!(health.database);
        assert_eq!(health.status, "healthy");
    }
}

// =====================================
// Property-Based Tests
// =====================================
mod property_tests {
    use proptest::prelude::*;
    use qurno::models::{PageLink, Paginator};
    use qurno::utils::{self, jalali};

    proptest! {
        /// تبدیل تاریخ میلادی به جلالی و برعکس همون روز رو میده
        #[test]
        fn jalali_roundtrip(days in 0i64..80_000) {
            let base = chrono::NaiveDate::from_ymd_opt(1900, 1, 1).unwrap();
            let date = base + chrono::Duration::days(days);
            let j = jalali::gregorian_to_jalali(
                chrono::Datelike::year(&date),
                chrono::Datelike::month(&date),
                chrono::Datelike::day(&date),
            );
            prop_assert_eq!(jalali::jalali_to_gregorian(j.year, j.month, j.day), Some(date));
        }

        /// خروجی slugify یا خالیه یا اسلاگ معتبر
        #[test]
        fn slugify_output_is_valid(text in "[a-zA-Z0-9 آ-ی!?.,-]{0,60}") {
            let slug = utils::slugify(&text);
            prop_assert!(slug.is_empty() || utils::is_valid_slug(&slug));
        }

        /// شماره صفحه همیشه در محدوده است
        #[test]
        fn page_number_is_clamped(count in 0i64..10_000, per_page in 1u32..50, raw in any::<i64>()) {
            let paginator = Paginator::new(count, per_page);
            let number = paginator.get_page(Some(&raw.to_string()));
            prop_assert!(number >= 1 && number <= paginator.num_pages());
        }

        /// صفحه فعلی همیشه در نوار صفحه‌بندی هست
        #[test]
        fn elided_range_contains_current(count in 1i64..5_000, number in 1u32..200) {
            let paginator = Paginator::new(count, 10);
            let current = paginator.clamp(i64::from(number));
            let links = paginator.elided_page_range(current, 1, 2);
            prop_assert!(links.contains(&PageLink::Page(current)));
        }
    }
}
