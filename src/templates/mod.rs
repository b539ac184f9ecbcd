//! # ماژول قالب‌ها (HTML Templates)
//!
//! قالب‌های Tera هنگام کامپایل با `include_str!` داخل باینری قرار میگیرن
//! و یک بار هنگام شروع برنامه parse میشن.
//!
//! ## فیلترها و توابع اضافه
//! - `jalali`: تاریخ و ساعت شمسی (`۱۵ فروردین ۱۴۰۳ - ساعت ۱۴ و ۳۰ دقیقه`)
//! - `jalali_date`: فقط تاریخ شمسی
//! - `media(path=...)`: آدرس کامل فایل‌های آپلود شده

use std::collections::HashMap;
use std::sync::Arc;

use axum::response::Html;
use chrono::{DateTime, Utc};
use tera::{Context, Tera, Value};

use crate::config::Config;
use crate::error::Result;
use crate::models::FormErrors;
use crate::utils::jalali::{get_jalali_date, get_jalali_today};

/// همه قالب‌ها: (نام، محتوا)
const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../../templates/base.html")),
    ("_macros.html", include_str!("../../templates/_macros.html")),
    ("pages/index.html", include_str!("../../templates/pages/index.html")),
    ("pages/about.html", include_str!("../../templates/pages/about.html")),
    ("blog/post_list.html", include_str!("../../templates/blog/post_list.html")),
    ("blog/post_detail.html", include_str!("../../templates/blog/post_detail.html")),
    ("blog/author_post_list.html", include_str!("../../templates/blog/author_post_list.html")),
    ("blog/category_list.html", include_str!("../../templates/blog/category_list.html")),
    ("blog/category_detail.html", include_str!("../../templates/blog/category_detail.html")),
    ("blog/tag_list.html", include_str!("../../templates/blog/tag_list.html")),
    ("accounts/signup.html", include_str!("../../templates/accounts/signup.html")),
    ("accounts/login.html", include_str!("../../templates/accounts/login.html")),
    ("accounts/password_change.html", include_str!("../../templates/accounts/password_change.html")),
    ("accounts/password_change_done.html", include_str!("../../templates/accounts/password_change_done.html")),
    ("admins/base.html", include_str!("../../templates/admins/base.html")),
    ("admins/portal.html", include_str!("../../templates/admins/portal.html")),
    ("admins/profile.html", include_str!("../../templates/admins/profile.html")),
    ("admins/terms.html", include_str!("../../templates/admins/terms.html")),
    ("admins/blog/post_list.html", include_str!("../../templates/admins/blog/post_list.html")),
    ("admins/blog/post_detail.html", include_str!("../../templates/admins/blog/post_detail.html")),
    ("admins/blog/post_form.html", include_str!("../../templates/admins/blog/post_form.html")),
    ("admins/blog/post_delete.html", include_str!("../../templates/admins/blog/post_delete.html")),
    ("admins/blog/category_list.html", include_str!("../../templates/admins/blog/category_list.html")),
    ("admins/blog/category_detail.html", include_str!("../../templates/admins/blog/category_detail.html")),
    ("admins/blog/category_form.html", include_str!("../../templates/admins/blog/category_form.html")),
    ("admins/blog/category_delete.html", include_str!("../../templates/admins/blog/category_delete.html")),
    ("admins/blog/comment_list.html", include_str!("../../templates/admins/blog/comment_list.html")),
    ("admins/errors/error.html", include_str!("../../templates/admins/errors/error.html")),
    ("errors/error.html", include_str!("../../templates/errors/error.html")),
    ("errors/403.html", include_str!("../../templates/errors/403.html")),
    ("errors/404.html", include_str!("../../templates/errors/404.html")),
    ("errors/500.html", include_str!("../../templates/errors/500.html")),
];

/// موتور قالب برنامه
#[derive(Debug)]
pub struct Templates {
    tera: Tera,
    config: Arc<Config>,
}

impl Templates {
    /// parse همه قالب‌ها و ثبت فیلترها
    ///
    /// # Errors
    /// `AppError::Template` اگه یکی از قالب‌ها خطای نحوی داشته باشه
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.iter().copied())?;

        let offset = config.utc_offset_minutes;
        tera.register_filter(
            "jalali",
            move |value: &Value, _: &HashMap<String, Value>| -> tera::Result<Value> {
                Ok(Value::String(get_jalali_date(parse_datetime(value)?, offset)))
            },
        );
        tera.register_filter(
            "jalali_date",
            move |value: &Value, _: &HashMap<String, Value>| -> tera::Result<Value> {
                Ok(Value::String(get_jalali_today(parse_datetime(value)?, offset)))
            },
        );

        let media_url = config.media_url.clone();
        tera.register_function(
            "media",
            move |args: &HashMap<String, Value>| -> tera::Result<Value> {
                let path = args
                    .get("path")
                    .and_then(Value::as_str)
                    .ok_or_else(|| tera::Error::msg("media() requires a `path` argument"))?;
                Ok(Value::String(media_path(&media_url, path)))
            },
        );

        Ok(Self { tera, config })
    }

    /// context پایه همه صفحات
    ///
    /// `errors` همیشه وجود داره تا macro خطاهای فرم به متغیر تعریف نشده نخوره
    #[must_use]
    pub fn context(&self) -> Context {
        let mut context = Context::new();
        context.insert("site_title", &self.config.site_title);
        context.insert("media_url", &self.config.media_url);
        context.insert("errors", &FormErrors::new());
        context
    }

    /// رندر یک قالب
    ///
    /// # Errors
    /// `AppError::Template` اگه قالب پیدا نشه یا رندر fail بشه
    pub fn render(&self, name: &str, context: &Context) -> Result<Html<String>> {
        Ok(Html(self.tera.render(name, context)?))
    }

    /// آیا قالبی با این نام وجود داره؟
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }
}

/// آدرس فایل media؛ آدرس‌های مطلق دست‌نخورده برمیگردن
#[must_use]
pub fn media_path(media_url: &str, path: &str) -> String {
    if path.starts_with('/') || path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else {
        format!("{}/{}", media_url.trim_end_matches('/'), path)
    }
}

fn parse_datetime(value: &Value) -> tera::Result<DateTime<Utc>> {
    let raw = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("jalali filters expect a datetime string"))?;

    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| tera::Error::msg(format!("invalid datetime '{}': {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn templates() -> Templates {
        Templates::new(Arc::new(Config::default())).unwrap()
    }

    #[test]
    fn test_all_templates_parse() {
        let templates = templates();
        assert!(templates.has("base.html"));
        assert!(templates.has("errors/404.html"));
    }

    #[test]
    fn test_media_path() {
        assert_eq!(media_path("/media/", "avatars/a.png"), "/media/avatars/a.png");
        assert_eq!(media_path("/media", "avatars/a.png"), "/media/avatars/a.png");
        assert_eq!(media_path("/media/", "https://cdn.example/a.png"), "https://cdn.example/a.png");
    }

    #[test]
    fn test_error_page_renders_message() {
        let templates = templates();
        let mut context = templates.context();
        context.insert("status", &404);
        context.insert("message", "صفحه مورد نظر پیدا نشد.");

        let Html(body) = templates.render("errors/404.html", &context).unwrap();
        assert!(body.contains("404"));
        assert!(body.contains("صفحه مورد نظر پیدا نشد."));
    }

    #[test]
    fn test_form_errors_are_rendered_next_to_fields() {
        let templates = templates();
        let mut errors = FormErrors::new();
        errors.add("username", "این نام کاربری قبلا ثبت شده است.");

        let mut context = templates.context();
        context.insert("errors", &errors);

        let Html(body) = templates.render("accounts/signup.html", &context).unwrap();
        assert!(body.contains("این نام کاربری قبلا ثبت شده است."));
    }

    #[test]
    fn test_jalali_filter() {
        let mut tera = templates().tera;
        tera.add_raw_template("t", "{{ when | jalali_date }}").unwrap();

        let mut context = Context::new();
        context.insert("when", &Utc.with_ymd_and_hms(2024, 3, 20, 8, 30, 0).unwrap());
        assert_eq!(tera.render("t", &context).unwrap(), "1 فروردین 1403");
    }
}
