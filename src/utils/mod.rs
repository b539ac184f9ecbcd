//! # ماژول توابع کمکی (Utilities)
//!
//! توابع کوچک و بدون state که در چند لایه استفاده میشن.
//!
//! ## مفاهیم Rust:
//! - **once_cell::Lazy**: کامپایل یک‌باره regex‌ها
//! - **Unicode-aware strings**: کار با `chars()` به جای بایت
//! - **serde helpers**: تبدیل فیلد خالی فرم به `None`

pub mod jalali;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer};

// =====================================
// Constants
// =====================================
/// حداکثر طول عنوان، توضیحات و اسلاگ
pub const MAX_FIELD_LENGTH: usize = 225;

/// حداکثر طول نام کاربری
pub const MAX_USERNAME_LENGTH: usize = 150;

/// طول خلاصه متن‌ها در لیست‌ها و پنل مدیریت
pub const THUMBNAIL_LENGTH: usize = 25;

// =====================================
// Lazy Statics (Regex patterns)
// =====================================
/// اسلاگ معتبر: حروف (از جمله فارسی)، عدد، `_` و `-`
pub static VALID_SLUG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-\w]+$").expect("Invalid regex pattern")
});

/// نام کاربری معتبر: حروف، عدد و `@ . + - _`
pub static VALID_USERNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\w.@+-]+$").expect("Invalid regex pattern")
});

static SLUG_STRIP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^\w\s-]").expect("Invalid regex pattern")
});

static SLUG_HYPHENATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[-\s]+").expect("Invalid regex pattern")
});

static HTML_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<[^>]*>").expect("Invalid regex pattern")
});

// =====================================
// Slugs
// =====================================
/// ساخت اسلاگ از متن با حفظ حروف یونیکد
///
/// # مثال
/// ```rust
/// use qurno::utils::slugify;
///
/// assert_eq!(slugify("Hello, World!"), "hello-world");
/// assert_eq!(slugify("  آموزش  راست "), "آموزش-راست");
/// ```
#[must_use]
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let cleaned = SLUG_STRIP.replace_all(&lowered, "");
    SLUG_HYPHENATE
        .replace_all(&cleaned, "-")
        .trim_matches(|c| c == '-' || c == '_')
        .to_string()
}

/// اعتبارسنجی اسلاگ
#[must_use]
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && slug.chars().count() <= MAX_FIELD_LENGTH && VALID_SLUG.is_match(slug)
}

/// اعتبارسنجی نام کاربری
#[must_use]
pub fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username.chars().count() <= MAX_USERNAME_LENGTH
        && VALID_USERNAME.is_match(username)
}

// =====================================
// String Utilities
// =====================================
/// کوتاه کردن متن بر اساس تعداد کاراکتر (نه بایت)
///
/// اگه `ellipsis` باشه و متن کوتاه شده باشه، `...` اضافه میشه
///
/// # مثال
/// ```rust
/// use qurno::utils::truncate_chars;
///
/// assert_eq!(truncate_chars("سلام دنیا", 4, true), "سلام...");
/// assert_eq!(truncate_chars("سلام", 10, true), "سلام");
/// ```
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize, ellipsis: bool) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => {
            let head = &text[..byte_index];
            if ellipsis {
                format!("{}...", head)
            } else {
                head.to_string()
            }
        }
        None => text.to_string(),
    }
}

/// تمیز کردن whitespace‌های اضافی
#[must_use]
pub fn clean_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// حذف تگ‌های HTML و تبدیل چند entity رایج
#[must_use]
pub fn strip_html(html: &str) -> String {
    let text = HTML_TAG.replace_all(html, " ");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&zwnj;", "\u{200c}")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    clean_whitespace(&text)
}

/// یکسان‌سازی متن فارسی برای جستجو
///
/// «ي» و «ك» عربی به «ی» و «ک» فارسی تبدیل میشن و حروف لاتین کوچک میشن
#[must_use]
pub fn normalize_persian(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'ي' | 'ى' => 'ی',
            'ك' => 'ک',
            'ة' => 'ه',
            _ => c,
        })
        .flat_map(char::to_lowercase)
        .collect()
}

/// جدا کردن لیست برچسب‌ها
///
/// با ویرگول لاتین یا فارسی جدا میشن، تکراری‌ها حذف میشن
///
/// # مثال
/// ```rust
/// use qurno::utils::parse_tags;
///
/// assert_eq!(parse_tags("rust، وب , rust,"), vec!["rust", "وب"]);
/// ```
#[must_use]
pub fn parse_tags(input: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for raw in input.split([',', '،']) {
        let tag = clean_whitespace(raw);
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

// =====================================
// URL Utilities
// =====================================
/// انکد کردن یک مقدار برای query string
#[must_use]
pub fn encode_query_value(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// مسیر امن برای redirect بعد از ورود
///
/// فقط مسیرهای محلی پذیرفته میشن؛ بقیه به `/` برمیگردن
#[must_use]
pub fn safe_next_path(next: Option<&str>) -> String {
    match next.map(str::trim) {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.contains(['\r', '\n']) =>
        {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}

// =====================================
// Serde Helpers
// =====================================
/// فیلد خالی فرم HTML رو `None` میکنه
///
/// فرم‌ها فیلدهای خالی رو به صورت `field=` میفرستن؛ این تابع
/// برای فیلدهای عددی و اختیاری استفاده میشه.
///
/// # Errors
/// خطا برمیگردونه اگه مقدار غیرخالی قابل parse نباشه
pub fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let value = Option::<String>::deserialize(deserializer)?;
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse::<T>().map(Some).map_err(serde::de::Error::custom),
    }
}

/// checkbox فرم HTML: وجود فیلد یعنی true
///
/// # Errors
/// هیچوقت خطا برنمیگردونه مگه ورودی رشته نباشه
pub fn checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(matches!(
        value.as_deref().map(str::trim),
        Some("on" | "true" | "1" | "yes")
    ))
}

// =====================================
// Tests
// =====================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Rust & Axum -- 2024"), "rust-axum-2024");
        assert_eq!(slugify("برنامه نویسی با راست"), "برنامه-نویسی-با-راست");
        assert_eq!(slugify("--_trim_--"), "trim");
    }

    #[test]
    fn test_valid_slug() {
        assert!(is_valid_slug("rust-web"));
        assert!(is_valid_slug("آموزش-راست"));
        assert!(!is_valid_slug("rust web"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("a/b"));
    }

    #[test]
    fn test_valid_username() {
        assert!(is_valid_username("ali.rezaei+1@x"));
        assert!(!is_valid_username("ali rezaei"));
        assert!(!is_valid_username(&"a".repeat(151)));
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10, true), "short");
        assert_eq!(truncate_chars("exactly-25-characters-abc", 25, true), "exactly-25-characters-abc");
        assert_eq!(truncate_chars("this is a long text", 7, true), "this is...");
        assert_eq!(truncate_chars("this is a long text", 7, false), "this is");
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(strip_html("<p>سلام <b>دنیا</b></p>&nbsp;!"), "سلام دنیا !");
        assert_eq!(strip_html("a &amp;lt; b"), "a &lt; b");
    }

    #[test]
    fn test_normalize_persian() {
        assert_eq!(normalize_persian("كتاب علي"), "کتاب علی");
        assert_eq!(normalize_persian("Rust"), "rust");
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!(parse_tags(""), Vec::<String>::new());
        assert_eq!(parse_tags(" a ,b،  a , "), vec!["a", "b"]);
    }

    #[test]
    fn test_safe_next_path() {
        assert_eq!(safe_next_path(Some("/admins/")), "/admins/");
        assert_eq!(safe_next_path(Some("//evil.com")), "/");
        assert_eq!(safe_next_path(Some("https://evil.com")), "/");
        assert_eq!(safe_next_path(None), "/");
    }

    #[test]
    fn test_encode_query_value() {
        assert_eq!(encode_query_value("/blog/post/?a=1"), "%2Fblog%2Fpost%2F%3Fa%3D1");
    }
}
