//! # مدل کاربر (User Model)
//!
//! کاربر سفارشی سایت: علاوه بر فیلدهای معمول، آواتار، بیوگرافی و
//! نقش نویسندگی (`is_author`) داره.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::utils::empty_string_as_none;

/// آواتار پیش‌فرض کاربرها (نسبت به پوشه media)
pub const DEFAULT_AVATAR: &str = "defaults/user_default_avatar.png";

// =====================================
// User Entity
// =====================================
/// Entity کاربر
///
/// # مفاهیم:
/// - `FromRow`: تبدیل از ردیف دیتابیس
/// - `#[serde(skip_serializing)]`: هش رمز هیچوقت به قالب‌ها نمیرسه
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,

    #[serde(skip_serializing)]
    pub password_hash: String,

    pub first_name: String,
    pub last_name: String,
    pub avatar: String,
    pub bio: Option<String>,
    pub is_author: bool,
    pub is_staff: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// بررسی رمز عبور
    ///
    /// # Errors
    /// خطا برمیگردونه اگه هش ذخیره شده قابل parse نباشه
    pub fn verify_password(&self, password: &str) -> Result<bool> {
        use argon2::{Argon2, PasswordHash, PasswordVerifier};

        let parsed_hash = PasswordHash::new(&self.password_hash)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// نام نمایشی: نام و نام خانوادگی، یا نام کاربری
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }

    /// اجازه ورود به پنل مدیریت
    #[must_use]
    pub fn can_access_portal(&self) -> bool {
        self.is_author || self.is_staff
    }
}

impl std::fmt::Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.username)
    }
}

/// هش کردن رمز عبور با Argon2 و salt تصادفی
///
/// # Errors
/// خطا برمیگردونه اگه hashing fail بشه
pub fn hash_password(password: &str) -> Result<String> {
    use argon2::{
        password_hash::{rand_core::OsRng, SaltString},
        Argon2, PasswordHasher,
    };

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(e.to_string()))
}

// =====================================
// Create User DTO
// =====================================
/// داده برای ساخت کاربر (داخلی)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: String,
    pub bio: Option<String>,
    pub is_author: bool,
    pub is_staff: bool,
}

impl NewUser {
    /// ساخت کاربر جدید با هش کردن رمز عبور
    ///
    /// # Errors
    /// خطا برمیگردونه اگه hashing fail بشه
    pub fn new(username: impl Into<String>, password: &str) -> Result<Self> {
        Ok(Self {
            username: username.into(),
            email: None,
            password_hash: hash_password(password)?,
            first_name: String::new(),
            last_name: String::new(),
            avatar: DEFAULT_AVATAR.to_string(),
            bio: None,
            is_author: false,
            is_staff: false,
        })
    }

    #[must_use]
    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }

    /// تنظیم نقش‌ها
    #[must_use]
    pub fn with_roles(mut self, is_author: bool, is_staff: bool) -> Self {
        self.is_author = is_author;
        self.is_staff = is_staff;
        self
    }
}

/// تغییرات پروفایل
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub avatar: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub bio: Option<String>,
}

// =====================================
// Form DTOs
// =====================================
/// فرم ثبت‌نام
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct SignupForm {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub avatar: Option<String>,

    #[serde(default)]
    #[validate(length(max = 150, message = "نام حداکثر ۱۵۰ کاراکتر است."))]
    pub first_name: String,

    #[serde(default)]
    #[validate(length(max = 150, message = "نام خانوادگی حداکثر ۱۵۰ کاراکتر است."))]
    pub last_name: String,

    #[serde(default)]
    #[validate(length(min = 1, max = 150, message = "نام کاربری باید بین ۱ تا ۱۵۰ کاراکتر باشد."))]
    pub username: String,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(email(message = "یک آدرس ایمیل معتبر وارد کنید."), length(max = 225))]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub bio: Option<String>,

    #[serde(default, skip_serializing)]
    #[validate(length(min = 8, message = "رمز عبور باید حداقل ۸ کاراکتر باشد."))]
    pub password1: String,

    #[serde(default, skip_serializing)]
    pub password2: String,
}

/// فرم ورود
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "نام کاربری را وارد کنید."))]
    pub username: String,

    #[serde(default, skip_serializing)]
    #[validate(length(min = 1, message = "رمز عبور را وارد کنید."))]
    pub password: String,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub next: Option<String>,
}

/// فرم تغییر رمز عبور
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PasswordChangeForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "رمز عبور فعلی را وارد کنید."))]
    pub old_password: String,

    #[serde(default)]
    #[validate(length(min = 8, message = "رمز عبور باید حداقل ۸ کاراکتر باشد."))]
    pub new_password1: String,

    #[serde(default)]
    pub new_password2: String,
}

/// فرم پروفایل در پنل مدیریت
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct ProfileForm {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub avatar: Option<String>,

    #[serde(default)]
    #[validate(length(min = 1, max = 150, message = "نام کاربری باید بین ۱ تا ۱۵۰ کاراکتر باشد."))]
    pub username: String,

    #[serde(default)]
    #[validate(length(max = 150))]
    pub first_name: String,

    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: String,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(email(message = "یک آدرس ایمیل معتبر وارد کنید."), length(max = 225))]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub bio: Option<String>,
}

impl From<&User> for ProfileForm {
    fn from(user: &User) -> Self {
        Self {
            avatar: Some(user.avatar.clone()),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            bio: user.bio.clone(),
        }
    }
}

// =====================================
// Session Claims
// =====================================
/// محتویات توکن نشست
///
/// - `sub`: شناسه کاربر
/// - `exp`: زمان انقضا (Unix timestamp)
/// - `iat`: زمان صدور
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    /// ساخت claims جدید
    #[must_use]
    pub fn new(user_id: i64, username: &str, expiration_hours: u64) -> Self {
        let now = Utc::now();
        let hours = i64::try_from(expiration_hours).unwrap_or(i64::MAX / 3600);
        let exp = now + chrono::Duration::hours(hours);

        Self {
            sub: user_id.to_string(),
            username: username.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        }
    }

    /// آیا توکن منقضی شده؟
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    /// شناسه عددی کاربر
    #[must_use]
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}
