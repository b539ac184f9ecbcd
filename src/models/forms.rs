//! # خطاهای فرم (Form Errors)
//!
//! پیام‌های خطا برای هر فیلد فرم جمع میشن تا قالب بتونه کنار
//! همون فیلد نمایششون بده. کلید `__all__` برای خطاهای کلی فرمه.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{AppError, Result};

/// کلید خطاهایی که به یک فیلد خاص تعلق ندارن
pub const NON_FIELD_ERRORS: &str = "__all__";

/// پیام‌های خطا به تفکیک فیلد
///
/// # مثال
/// ```rust
/// use qurno::models::FormErrors;
///
/// let mut errors = FormErrors::new();
/// errors.add("slug", "این اسلاگ قبلا استفاده شده است.");
/// assert!(errors.has("slug"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// خطاهای validator یک فرم
    ///
    /// بررسی‌های بعدی (مثلا یکتا بودن) به همین مجموعه اضافه میشن
    #[must_use]
    pub fn validate<T: validator::Validate>(form: &T) -> Self {
        form.validate().map_or_else(Self::from, |()| Self::new())
    }

    /// فرم با یک خطای کلی
    #[must_use]
    pub fn non_field(message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(NON_FIELD_ERRORS, message);
        errors
    }

    /// اضافه کردن پیام خطا برای یک فیلد
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// فیلد اجباری: مقدار فقط فاصله هم خالی حساب میشه
    ///
    /// اگه validator قبلا برای فیلد خطا داده باشه پیام تکراری اضافه نمیشه
    pub fn require(&mut self, field: &str, value: &str, message: &str) {
        if value.trim().is_empty() && !self.has(field) {
            self.add(field, message);
        }
    }

    /// ادغام خطاهای یک فرم دیگه
    pub fn merge(&mut self, other: FormErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// آیا فیلد خطا داره؟
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// پیام‌های یک فیلد
    #[must_use]
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// اگه خطایی هست `AppError::InvalidForm` برمیگردونه
    ///
    /// # Errors
    /// وقتی حداقل یک خطا ثبت شده باشه
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::InvalidForm(self))
        }
    }
}

impl std::fmt::Display for FormErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .0
            .iter()
            .flat_map(|(field, messages)| messages.iter().map(move |m| format!("{}: {}", field, m)))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{}", joined)
    }
}

impl From<validator::ValidationErrors> for FormErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut form_errors = Self::new();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| format!("مقدار این فیلد نامعتبر است ({}).", error.code));
                form_errors.add(field.to_string(), message);
            }
        }
        form_errors
    }
}
