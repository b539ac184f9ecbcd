//! # Account Handlers
//!
//! ثبت‌نام، ورود، خروج و تغییر رمز عبور

use axum::{
    extract::{Query, State},
    response::Response,
};
use tracing::info;

use super::{
    clear_session_cookie, public_context, render, see_other, see_other_with_cookie,
    session_cookie,
};
use crate::{
    api::{
        extractors::{ClientIp, CurrentUser, FormData, OptionalUser},
        middleware::too_many_requests,
    },
    error::{AppError, Result},
    models::{LoginForm, NextQuery, PasswordChangeForm, SignupForm},
    services::AppState,
    utils::safe_next_path,
};

// =====================================
// Signup
// =====================================
/// فرم ثبت‌نام
///
/// # Endpoint
/// `GET /accounts/signup/`
pub async fn signup_page(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
) -> Result<Response> {
    let mut context = public_context(&state, user.as_ref()).await?;
    context.insert("form", &SignupForm::default());
    render(&state, "accounts/signup.html", &context)
}

/// ثبت‌نام و ورود خودکار
///
/// # Endpoint
/// `POST /accounts/signup/`
pub async fn signup(
    State(state): State<AppState>,
    FormData(form): FormData<SignupForm>,
) -> Result<Response> {
    match state.auth_service.signup(&form).await {
        Ok((user, token)) => {
            info!(user_id = user.id, "Signed up and logged in");
            Ok(see_other_with_cookie("/", session_cookie(&state.config, &token)))
        }
        Err(AppError::InvalidForm(errors)) => {
            let mut context = public_context(&state, None).await?;
            context.insert("form", &form);
            context.insert("errors", &errors);
            render(&state, "accounts/signup.html", &context)
        }
        Err(err) => Err(err),
    }
}

// =====================================
// Login
// =====================================
/// فرم ورود
///
/// # Endpoint
/// `GET /accounts/login/?next=/admins/`
pub async fn login_page(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Query(query): Query<NextQuery>,
) -> Result<Response> {
    let mut context = public_context(&state, user.as_ref()).await?;
    context.insert("form", &LoginForm::default());
    context.insert("next", &query.next);
    render(&state, "accounts/login.html", &context)
}

/// ورود و تنظیم cookie نشست
///
/// تلاش‌های ورود برای هر IP محدود هستن
///
/// # Endpoint
/// `POST /accounts/login/`
pub async fn login(
    State(state): State<AppState>,
    client_ip: ClientIp,
    FormData(form): FormData<LoginForm>,
) -> Result<Response> {
    if state.login_limiter.check(client_ip.key()).await.is_err() {
        return Ok(too_many_requests(state.config.login_rate_window_seconds));
    }

    match state.auth_service.login(&form).await {
        Ok((user, token)) => {
            state.login_limiter.reset(client_ip.key()).await;
            info!(user_id = user.id, "Logged in");

            let next = safe_next_path(form.next.as_deref());
            Ok(see_other_with_cookie(next, session_cookie(&state.config, &token)))
        }
        Err(AppError::InvalidForm(errors)) => {
            let mut context = public_context(&state, None).await?;
            context.insert("form", &form);
            context.insert("next", &form.next);
            context.insert("errors", &errors);
            render(&state, "accounts/login.html", &context)
        }
        Err(err) => Err(err),
    }
}

// =====================================
// Logout
// =====================================
/// خروج و پاک کردن cookie
///
/// # Endpoint
/// `GET|POST /accounts/logout/`
pub async fn logout(State(state): State<AppState>) -> Response {
    see_other_with_cookie("/", clear_session_cookie(&state.config))
}

// =====================================
// Password Change
// =====================================
/// فرم تغییر رمز عبور
///
/// # Endpoint
/// `GET /accounts/password_change/`
pub async fn password_change_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Response> {
    let context = public_context(&state, Some(&user)).await?;
    render(&state, "accounts/password_change.html", &context)
}

/// تغییر رمز عبور
///
/// # Endpoint
/// `POST /accounts/password_change/`
pub async fn password_change(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    FormData(form): FormData<PasswordChangeForm>,
) -> Result<Response> {
    match state.auth_service.change_password(&user, &form).await {
        Ok(()) => Ok(see_other("/accounts/password_change/done/")),
        Err(AppError::InvalidForm(errors)) => {
            let mut context = public_context(&state, Some(&user)).await?;
            context.insert("errors", &errors);
            render(&state, "accounts/password_change.html", &context)
        }
        Err(err) => Err(err),
    }
}

/// پیام موفقیت تغییر رمز
///
/// # Endpoint
/// `GET /accounts/password_change/done/`
pub async fn password_change_done(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Response> {
    let context = public_context(&state, Some(&user)).await?;
    render(&state, "accounts/password_change_done.html", &context)
}
