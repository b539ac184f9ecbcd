//! # Qurno - نقطه ورود برنامه
//!
//! این فایل نقطه شروع اجرای برنامه است.
//! در Rust، `main.rs` برای باینری‌ها و `lib.rs` برای کتابخانه‌ها استفاده میشه.
//!
//! ## دستورها:
//! - `qurno` یا `qurno serve`: اجرای سرور وب
//! - `qurno create-user --username ali --password ... --author`: ساخت کاربر
//!
//! ## مفاهیم Rust در این فایل:
//! - `clap::Parser`: تعریف رابط خط فرمان با derive
//! - `anyhow::Context`: اضافه کردن توضیح به خطاها
//! - `async fn main()`: تابع اصلی غیرهمزمان با tokio

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use qurno::{api::create_router, config::Config, database::Database, services::AppState};

/// وبلاگ فارسی با پنل نویسنده‌ها
#[derive(Debug, Parser)]
#[command(name = "qurno", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// اجرای سرور وب (پیش‌فرض)
    Serve,

    /// ساخت کاربر جدید از خط فرمان
    CreateUser {
        #[arg(long)]
        username: String,

        #[arg(long)]
        password: String,

        #[arg(long)]
        email: Option<String>,

        /// دسترسی نویسندگی (ورود به پنل)
        #[arg(long)]
        author: bool,

        /// کارمند سایت
        #[arg(long)]
        staff: bool,
    },
}

/// نقطه ورود اصلی برنامه
///
/// # Errors
/// خطا برمیگردونه اگه:
/// - تنظیمات لود نشن یا نامعتبر باشن
/// - دیتابیس متصل نشه
/// - سرور استارت نشه
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // اگه فایل .env نباشه اوکیه
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();

    let config = Config::from_env().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;
    info!(environment = ?config.environment, "Configuration loaded");

    let database = Database::connect(&config.database_url)
        .await
        .with_context(|| format!("failed to connect to {}", config.database_url))?;
    database
        .migrate()
        .await
        .context("failed to run database migrations")?;
    info!("Database ready");

    let state = AppState::new(database, config.clone()).context("failed to build application state")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(state, &config).await,
        Command::CreateUser {
            username,
            password,
            email,
            author,
            staff,
        } => {
            let user = state
                .auth_service
                .create_user(&username, &password, email, author, staff)
                .await
                .context("failed to create user")?;
            info!(user_id = user.id, username = %user.username, "User created");
            Ok(())
        }
    }
}

/// اجرای سرور HTTP تا زمان خاموش شدن
async fn serve(state: AppState, config: &Config) -> anyhow::Result<()> {
    // پاکسازی دوره‌ای شمارنده‌های ورود
    let limiter = state.login_limiter.clone();
    let period = Duration::from_secs(config.login_rate_window_seconds.max(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            limiter.cleanup().await;
        }
    });

    let app = create_router(state);

    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("🌐 Server listening on http://{}", addr);

    // ConnectInfo برای محدودیت تلاش ورود بر اساس IP
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    info!("Server stopped");
    Ok(())
}

/// منتظر Ctrl+C
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
    }
}

/// راه‌اندازی سیستم tracing برای لاگینگ
///
/// # مفاهیم:
/// - EnvFilter: فیلتر کردن لاگ‌ها بر اساس `RUST_LOG`
/// - `LOG_FORMAT=json`: خروجی JSON برای محیط production
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("qurno=debug,tower_http=debug"));

    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    if json {
        registry.with(fmt::layer().json().with_target(true)).init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_level(true),
            )
            .init();
    }
}
