//! # سرویس احراز هویت (Authentication Service)
//!
//! ثبت‌نام، ورود، نشست‌ها، تغییر رمز و پروفایل کاربر
//!
//! ## مفاهیم Rust:
//! - Password Hashing: هش کردن رمز عبور با Argon2
//! - JWT: توکن نشست که در کوکی ذخیره میشه
//! - خطاهای فرم: پیام هر فیلد جدا برمیگرده تا فرم دوباره رندر بشه

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::{info, instrument, warn};

use crate::{
    config::Config,
    database::{Repository, UserRepository},
    error::{AppError, OptionExt, Result},
    models::{
        hash_password, Claims, FormErrors, LoginForm, NewUser, PasswordChangeForm, ProfileForm,
        ProfileUpdate, SignupForm, User, DEFAULT_AVATAR,
    },
    utils::is_valid_username,
};

use super::Service;

const INVALID_CREDENTIALS: &str = "نام کاربری یا رمز عبور اشتباه است.";
const INACTIVE_ACCOUNT: &str = "این حساب کاربری غیرفعال است.";
const INVALID_USERNAME: &str =
    "نام کاربری فقط میتواند شامل حروف، اعداد و کاراکترهای @/./+/-/_ باشد.";
const USERNAME_TAKEN: &str = "کاربری با این نام کاربری وجود دارد.";
const EMAIL_TAKEN: &str = "کاربری با این ایمیل وجود دارد.";
const PASSWORD_MISMATCH: &str = "دو رمز عبور وارد شده یکسان نیستند.";

// =====================================
// Auth Service
// =====================================
/// سرویس احراز هویت
///
/// # مسئولیت‌ها:
/// - ثبت‌نام و ورود کاربر
/// - صدور و اعتبارسنجی توکن نشست
/// - تغییر رمز عبور و ویرایش پروفایل
#[derive(Debug, Clone)]
pub struct AuthService {
    repo: UserRepository,
    config: Arc<Config>,
}

impl Service for AuthService {}

impl AuthService {
    /// ساخت سرویس جدید
    #[must_use]
    pub fn new(repo: UserRepository, config: Arc<Config>) -> Self {
        Self { repo, config }
    }

    /// ثبت‌نام کاربر جدید
    ///
    /// کاربر بعد از ثبت‌نام وارد میشه؛ توکن نشست همراه کاربر برمیگرده
    ///
    /// # Errors
    /// `AppError::InvalidForm` با خطای هر فیلد
    #[instrument(skip(self, form), fields(username = %form.username))]
    pub async fn signup(&self, form: &SignupForm) -> Result<(User, String)> {
        let mut errors = FormErrors::validate(form);

        let username = form.username.trim();
        if !username.is_empty() && !is_valid_username(username) {
            errors.add("username", INVALID_USERNAME);
        }
        if self.repo.username_taken(username, None).await? {
            errors.add("username", USERNAME_TAKEN);
        }
        if let Some(email) = form.email.as_deref() {
            if self.repo.email_taken(email, None).await? {
                errors.add("email", EMAIL_TAKEN);
            }
        }
        if form.password1 != form.password2 {
            errors.add("password2", PASSWORD_MISMATCH);
        }
        errors.into_result()?;

        let mut new_user = NewUser::new(username, &form.password1)?.with_email(form.email.clone());
        new_user.first_name = form.first_name.trim().to_string();
        new_user.last_name = form.last_name.trim().to_string();
        new_user.bio = form.bio.clone();
        if let Some(avatar) = &form.avatar {
            new_user.avatar = avatar.clone();
        }

        let user = self.repo.create(&new_user).await?;
        info!(user_id = user.id, "New user registered");

        let token = self.generate_token(&user)?;
        Ok((user, token))
    }

    /// ورود کاربر
    ///
    /// # Errors
    /// `AppError::InvalidForm` برای اطلاعات اشتباه یا حساب غیرفعال
    #[instrument(skip(self, form), fields(username = %form.username))]
    pub async fn login(&self, form: &LoginForm) -> Result<(User, String)> {
        FormErrors::validate(form).into_result()?;

        let user = match self.repo.find_by_username(form.username.trim()).await? {
            Some(user) => user,
            None => return Err(AppError::InvalidForm(FormErrors::non_field(INVALID_CREDENTIALS))),
        };

        if !user.verify_password(&form.password)? {
            warn!(username = %user.username, "Failed login attempt");
            return Err(AppError::InvalidForm(FormErrors::non_field(INVALID_CREDENTIALS)));
        }

        if !user.is_active {
            return Err(AppError::InvalidForm(FormErrors::non_field(INACTIVE_ACCOUNT)));
        }

        self.repo.touch_last_login(user.id, Utc::now()).await?;
        let token = self.generate_token(&user)?;

        info!(user_id = user.id, "User logged in");
        Ok((user, token))
    }

    /// اعتبارسنجی توکن نشست
    ///
    /// # Errors
    /// `AppError::Unauthorized` اگه امضا یا زمان انقضا معتبر نباشه
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let decoding_key = DecodingKey::from_secret(self.config.jwt_secret.as_bytes());
        let validation = Validation::new(Algorithm::HS256);

        let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
            warn!(error = %e, "Token verification failed");
            AppError::Unauthorized("Invalid token".to_string())
        })?;

        if token_data.claims.is_expired() {
            return Err(AppError::Unauthorized("Token expired".to_string()));
        }

        Ok(token_data.claims)
    }

    /// کاربر فعال صاحب توکن
    ///
    /// # Errors
    /// `AppError::Unauthorized` اگه توکن نامعتبر یا کاربر حذف/غیرفعال شده باشه
    pub async fn user_from_token(&self, token: &str) -> Result<User> {
        let claims = self.verify_token(token)?;
        let user_id = claims
            .user_id()
            .ok_or_else(|| AppError::Unauthorized("Invalid token subject".to_string()))?;

        match self.repo.find_by_id(&user_id).await? {
            Some(user) if user.is_active => Ok(user),
            _ => Err(AppError::Unauthorized("Session user not available".to_string())),
        }
    }

    /// تغییر رمز عبور
    ///
    /// # Errors
    /// `AppError::InvalidForm` اگه رمز فعلی اشتباه باشه یا رمزهای جدید یکسان نباشن
    #[instrument(skip(self, user, form), fields(user_id = user.id))]
    pub async fn change_password(&self, user: &User, form: &PasswordChangeForm) -> Result<()> {
        let mut errors = FormErrors::validate(form);

        if !form.old_password.is_empty() && !user.verify_password(&form.old_password)? {
            errors.add("old_password", "رمز عبور فعلی اشتباه است.");
        }
        if form.new_password1 != form.new_password2 {
            errors.add("new_password2", PASSWORD_MISMATCH);
        }
        errors.into_result()?;

        let password_hash = hash_password(&form.new_password1)?;
        self.repo.set_password(user.id, &password_hash).await?;

        info!("Password changed");
        Ok(())
    }

    /// ویرایش پروفایل
    ///
    /// # Errors
    /// `AppError::InvalidForm` برای نام کاربری یا ایمیل تکراری
    #[instrument(skip(self, user, form), fields(user_id = user.id))]
    pub async fn update_profile(&self, user: &User, form: &ProfileForm) -> Result<User> {
        let mut errors = FormErrors::validate(form);

        let username = form.username.trim();
        if !username.is_empty() && !is_valid_username(username) {
            errors.add("username", INVALID_USERNAME);
        }
        if self.repo.username_taken(username, Some(user.id)).await? {
            errors.add("username", USERNAME_TAKEN);
        }
        if let Some(email) = form.email.as_deref() {
            if self.repo.email_taken(email, Some(user.id)).await? {
                errors.add("email", EMAIL_TAKEN);
            }
        }
        errors.into_result()?;

        let update = ProfileUpdate {
            avatar: form.avatar.clone().unwrap_or_else(|| DEFAULT_AVATAR.to_string()),
            username: username.to_string(),
            first_name: form.first_name.trim().to_string(),
            last_name: form.last_name.trim().to_string(),
            email: form.email.clone(),
            bio: form.bio.clone(),
        };

        let updated = self.repo.update_profile(user.id, &update).await?;
        info!("Profile updated");
        Ok(updated)
    }

    /// ساخت کاربر از خط فرمان (نویسنده یا کارمند)
    ///
    /// # Errors
    /// `AppError::Validation` برای نام کاربری یا رمز نامعتبر،
    /// `AppError::Conflict` برای نام کاربری تکراری
    #[instrument(skip(self, password))]
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        email: Option<String>,
        is_author: bool,
        is_staff: bool,
    ) -> Result<User> {
        if !is_valid_username(username) {
            return Err(AppError::Validation(INVALID_USERNAME.to_string()));
        }
        if password.chars().count() < 8 {
            return Err(AppError::Validation(
                "رمز عبور باید حداقل ۸ کاراکتر باشد.".to_string(),
            ));
        }

        let new_user = NewUser::new(username, password)?
            .with_email(email)
            .with_roles(is_author, is_staff);
        let user = self.repo.create(&new_user).await?;

        info!(user_id = user.id, "User created from command line");
        Ok(user)
    }

    /// گرفتن کاربر با ID
    ///
    /// # Errors
    /// `AppError::NotFound` اگه کاربر وجود نداشته باشه
    pub async fn get_user(&self, user_id: i64) -> Result<User> {
        self.repo
            .find_by_id(&user_id)
            .await?
            .ok_or_not_found(format!("User {} not found", user_id))
    }

    /// تولید توکن نشست
    fn generate_token(&self, user: &User) -> Result<String> {
        let claims = Claims::new(user.id, &user.username, self.config.jwt_expiration_hours);
        let encoding_key = EncodingKey::from_secret(self.config.jwt_secret.as_bytes());

        Ok(encode(&Header::default(), &claims, &encoding_key)?)
    }
}

// =====================================
// Token Utilities
// =====================================
/// استخراج توکن از header Authorization
///
/// # Format
/// `Authorization: Bearer <token>`
#[must_use]
pub fn extract_token_from_header(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// خوندن یک کوکی از header `Cookie`
#[must_use]
pub fn extract_cookie<'a>(header_value: &'a str, name: &str) -> Option<&'a str> {
    header_value.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name && !value.is_empty()).then_some(value)
    })
}

// =====================================
// Tests
// =====================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;

    async fn service() -> AuthService {
        let db = Database::in_memory().await.unwrap();
        AuthService::new(UserRepository::new(db), Arc::new(Config::default()))
    }

    fn signup_form(username: &str) -> SignupForm {
        SignupForm {
            username: username.to_string(),
            password1: "strong-password".to_string(),
            password2: "strong-password".to_string(),
            ..SignupForm::default()
        }
    }

    #[test]
    fn test_extract_token() {
        assert_eq!(extract_token_from_header("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_token_from_header("Basic abc123"), None);
        assert_eq!(extract_token_from_header("Bearer "), None);
    }

    #[test]
    fn test_extract_cookie() {
        let header = "theme=dark; qurno_session=abc.def; other=1";
        assert_eq!(extract_cookie(header, "qurno_session"), Some("abc.def"));
        assert_eq!(extract_cookie(header, "missing"), None);
    }

    #[tokio::test]
    async fn test_signup_then_login() {
        let auth = service().await;
        let (user, token) = auth.signup(&signup_form("writer")).await.unwrap();
        assert_eq!(auth.user_from_token(&token).await.unwrap().id, user.id);

        let login = LoginForm {
            username: "writer".to_string(),
            password: "strong-password".to_string(),
            next: None,
        };
        let (logged_in, _) = auth.login(&login).await.unwrap();
        assert!(logged_in.last_login.is_none());
        assert!(auth.get_user(user.id).await.unwrap().last_login.is_some());
    }

    #[tokio::test]
    async fn test_signup_collects_field_errors() {
        let auth = service().await;
        auth.signup(&signup_form("writer")).await.unwrap();

        let form = SignupForm {
            password2: "different-password".to_string(),
            ..signup_form("writer")
        };
        match auth.signup(&form).await {
            Err(AppError::InvalidForm(errors)) => {
                assert!(errors.has("username"));
                assert!(errors.has("password2"));
            }
            other => panic!("expected form errors, got {:?}", other.map(|(u, _)| u)),
        }
    }

    #[tokio::test]
    async fn test_wrong_password_is_form_error() {
        let auth = service().await;
        auth.signup(&signup_form("writer")).await.unwrap();

        let login = LoginForm {
            username: "writer".to_string(),
            password: "wrong-password".to_string(),
            next: None,
        };
        assert!(matches!(auth.login(&login).await, Err(AppError::InvalidForm(_))));
    }

    #[tokio::test]
    async fn test_change_password() {
        let auth = service().await;
        let (user, _) = auth.signup(&signup_form("writer")).await.unwrap();

        let form = PasswordChangeForm {
            old_password: "strong-password".to_string(),
            new_password1: "another-password".to_string(),
            new_password2: "another-password".to_string(),
        };
        auth.change_password(&user, &form).await.unwrap();

        let user = auth.get_user(user.id).await.unwrap();
        assert!(user.verify_password("another-password").unwrap());
    }

    #[tokio::test]
    async fn test_tampered_token_rejected() {
        let auth = service().await;
        let claims = Claims::new(1, "writer", 1);
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"some-other-secret"),
        )
        .unwrap();

        assert!(auth.verify_token(&token).is_err());
    }
}
