//! # ماژول مدل‌ها (Domain Models)
//!
//! این ماژول مدل‌های داده برنامه رو تعریف میکنه.
//!
//! ## مفاهیم Rust:
//! - **Structs**: ساختار داده
//! - **Enums**: نوع‌های شمارشی (وضعیت پست، عملیات مدیریت نظر)
//! - **FromRow**: تبدیل از ردیف دیتابیس
//! - **Serialize/Deserialize**: context قالب‌ها و فرم‌های HTML
//! - **Validation**: اعتبارسنجی فرم‌ها با `validator`
//!
//! ## تفاوت انواع مدل:
//! - **Entity**: داده‌ای که در دیتابیس ذخیره میشه (`Post`, `Category`, ...)
//! - **Form**: داده‌ای که از فرم HTML میاد (`PostForm`, `LoginForm`, ...)
//! - **Input**: داده معتبر شده که به repository میره (`PostInput`, ...)

mod category;
mod comment;
mod dto;
mod forms;
mod post;
mod tag;
mod user;

// Re-export همه مدل‌ها
pub use category::*;
pub use comment::*;
pub use dto::*;
pub use forms::*;
pub use post::*;
pub use tag::*;
pub use user::*;

use serde::Serialize;

// =====================================
// Pagination
// =====================================
/// تعداد صفحه‌های دو طرف صفحه فعلی در لینک‌ها
pub const ON_EACH_SIDE: u32 = 1;

/// تعداد صفحه‌های ابتدا و انتهای لینک‌ها
pub const ON_ENDS: u32 = 2;

/// صفحه‌بندی لیست‌ها
///
/// # قوانین انتخاب صفحه
/// - ورودی خالی یا غیرعددی: صفحه ۱
/// - کمتر از ۱ یا بیشتر از آخرین صفحه: آخرین صفحه
/// - لیست خالی هم یک صفحه (خالی) داره
///
/// # مثال
/// ```rust
/// use qurno::models::Paginator;
///
/// let paginator = Paginator::new(51, 25);
/// assert_eq!(paginator.num_pages(), 3);
/// assert_eq!(paginator.get_page(Some("abc")), 1);
/// assert_eq!(paginator.get_page(Some("99")), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    count: i64,
    per_page: u32,
}

impl Paginator {
    /// `per_page` صفر به ۱ تبدیل میشه
    #[must_use]
    pub fn new(count: i64, per_page: u32) -> Self {
        Self {
            count: count.max(0),
            per_page: per_page.max(1),
        }
    }

    #[must_use]
    pub fn count(&self) -> i64 {
        self.count
    }

    #[must_use]
    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// تعداد صفحات (حداقل ۱)
    #[must_use]
    pub fn num_pages(&self) -> u32 {
        let per_page = i64::from(self.per_page);
        let pages = (self.count + per_page - 1) / per_page;
        u32::try_from(pages.max(1)).unwrap_or(u32::MAX)
    }

    /// شماره صفحه معتبر از مقدار خام `?page=`
    #[must_use]
    pub fn get_page(&self, raw: Option<&str>) -> u32 {
        match raw.and_then(parse_page_number) {
            None => 1,
            Some(number) => self.clamp(number),
        }
    }

    /// شماره خارج از محدوده به آخرین صفحه میره
    #[must_use]
    pub fn clamp(&self, number: i64) -> u32 {
        let last = self.num_pages();
        if number < 1 || number > i64::from(last) {
            last
        } else {
            u32::try_from(number).unwrap_or(last)
        }
    }

    /// offset برای SQL
    #[must_use]
    pub fn offset(&self, number: u32) -> i64 {
        i64::from(number.saturating_sub(1)) * i64::from(self.per_page)
    }

    /// limit برای SQL
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    /// لینک صفحات با حذف میانی (`1 2 … 5 6 7 … 19 20`)
    #[must_use]
    pub fn elided_page_range(&self, number: u32, on_each_side: u32, on_ends: u32) -> Vec<PageLink> {
        let num_pages = self.num_pages();
        let number = self.clamp(i64::from(number));

        if num_pages <= (on_each_side + on_ends) * 2 {
            return (1..=num_pages).map(PageLink::Page).collect();
        }

        let mut links = Vec::new();
        if number > 1 + on_each_side + on_ends + 1 {
            links.extend((1..=on_ends).map(PageLink::Page));
            links.push(PageLink::Ellipsis);
            links.extend((number - on_each_side..=number).map(PageLink::Page));
        } else {
            links.extend((1..=number).map(PageLink::Page));
        }

        if i64::from(number) < i64::from(num_pages) - i64::from(on_each_side + on_ends) - 1 {
            links.extend((number + 1..=number + on_each_side).map(PageLink::Page));
            links.push(PageLink::Ellipsis);
            links.extend((num_pages - on_ends + 1..=num_pages).map(PageLink::Page));
        } else {
            links.extend((number + 1..=num_pages).map(PageLink::Page));
        }

        links
    }

    /// ساخت صفحه از آیتم‌های خونده شده
    #[must_use]
    pub fn page<T>(&self, items: Vec<T>, number: u32) -> Page<T> {
        let number = self.clamp(i64::from(number));
        let num_pages = self.num_pages();

        Page {
            items,
            number,
            num_pages,
            count: self.count,
            has_previous: number > 1,
            has_next: number < num_pages,
            previous_page_number: (number > 1).then(|| number - 1),
            next_page_number: (number < num_pages).then(|| number + 1),
            links: self.elided_page_range(number, ON_EACH_SIDE, ON_ENDS),
        }
    }
}

/// مقدار عددی `?page=`؛ `"2.0"` هم قبول میشه
fn parse_page_number(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(number) = raw.parse::<i64>() {
        return Some(number);
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value.fract() == 0.0 => Some(value as i64),
        _ => None,
    }
}

/// یک لینک در نوار صفحه‌بندی
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "number", rename_all = "lowercase")]
pub enum PageLink {
    Page(u32),
    Ellipsis,
}

/// یک صفحه از لیست
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u32,
    pub num_pages: u32,
    pub count: i64,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_page_number: Option<u32>,
    pub next_page_number: Option<u32>,
    pub links: Vec<PageLink>,
}

impl<T> Page<T> {
    /// صفحه بدون آیتم (مثلا جستجوی نامعتبر)
    #[must_use]
    pub fn empty() -> Self {
        Paginator::new(0, 1).page(Vec::new(), 1)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
