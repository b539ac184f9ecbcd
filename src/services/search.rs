//! # رتبه‌بندی جستجو (Search Ranking)
//!
//! جستجوی متنی وزن‌دار روی پست‌ها:
//!
//! | فیلد | وزن |
//! |------|-----|
//! | عنوان | 1.0 |
//! | توضیحات | 0.4 |
//! | محتوا (بدون HTML) | 0.2 |
//!
//! پست فقط وقتی منطبقه که همه کلمات جستجو حداقل در یکی از فیلدها باشن.
//! رتبه = مجموع `وزن × (کلمات منطبق در فیلد / کل کلمات)`.

use std::cmp::Ordering;

use serde::Serialize;

use crate::models::{FormErrors, Post};
use crate::utils::{normalize_persian, strip_html, MAX_FIELD_LENGTH};

/// وزن عنوان
pub const TITLE_WEIGHT: f64 = 1.0;

/// وزن توضیحات
pub const DESCRIPTION_WEIGHT: f64 = 0.4;

/// وزن محتوا
pub const CONTENT_WEIGHT: f64 = 0.2;

/// حداقل رتبه نتایج جستجوی عمومی
pub const PUBLIC_MIN_RANK: f64 = 0.2;

/// خطای مجاز مقایسه رتبه‌ها (جمع اعشاری دقیق نیست)
pub const RANK_EPSILON: f64 = 1e-9;

/// آیا رتبه به حد نتایج جستجوی عمومی میرسه؟
#[must_use]
pub fn meets_public_rank(rank: f64) -> bool {
    rank + RANK_EPSILON >= PUBLIC_MIN_RANK
}

/// وزن فیلدها
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchWeights {
    pub title: f64,
    pub description: f64,
    pub content: f64,
}

impl SearchWeights {
    /// همه فیلدها (جستجوی عمومی)
    pub const FULL: Self = Self {
        title: TITLE_WEIGHT,
        description: DESCRIPTION_WEIGHT,
        content: CONTENT_WEIGHT,
    };

    /// فقط عنوان (جستجوی پنل مدیریت)
    pub const TITLE_ONLY: Self = Self {
        title: TITLE_WEIGHT,
        description: 0.0,
        content: 0.0,
    };
}

/// نتیجه جستجو با رتبه
#[derive(Debug, Clone, Serialize)]
pub struct RankedPost {
    #[serde(flatten)]
    pub post: Post,
    pub rank: f64,
}

/// عبارت جستجو که به کلمات یکسان‌سازی شده شکسته شده
#[derive(Debug, Clone)]
pub struct SearchRanker {
    terms: Vec<String>,
    weights: SearchWeights,
}

impl SearchRanker {
    /// ساخت از عبارت خام
    ///
    /// # Errors
    /// `FormErrors` برای عبارت خالی یا طولانی‌تر از ۲۲۵ کاراکتر
    pub fn parse(query: &str, weights: SearchWeights) -> Result<Self, FormErrors> {
        let query = query.trim();
        let mut errors = FormErrors::new();

        if query.is_empty() {
            errors.add("query", "عبارت جستجو را وارد کنید.");
        } else if query.chars().count() > MAX_FIELD_LENGTH {
            errors.add("query", "عبارت جستجو حداکثر ۲۲۵ کاراکتر است.");
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let terms = normalize_persian(query)
            .split_whitespace()
            .map(str::to_string)
            .collect();

        Ok(Self { terms, weights })
    }

    #[must_use]
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// رتبه یک پست؛ `None` یعنی همه کلمات پیدا نشدن
    #[must_use]
    pub fn rank(&self, post: &Post) -> Option<f64> {
        let mut fields = vec![(normalize_persian(&post.title), self.weights.title)];
        if self.weights.description > 0.0 {
            fields.push((normalize_persian(&post.description), self.weights.description));
        }
        if self.weights.content > 0.0 {
            fields.push((normalize_persian(&strip_html(&post.content)), self.weights.content));
        }

        let all_found = self
            .terms
            .iter()
            .all(|term| fields.iter().any(|(text, _)| text.contains(term.as_str())));
        if !all_found {
            return None;
        }

        let total = self.terms.len() as f64;
        let rank = fields
            .iter()
            .map(|(text, weight)| {
                let matched = self.terms.iter().filter(|term| text.contains(term.as_str())).count();
                weight * matched as f64 / total
            })
            .sum();

        Some(rank)
    }

    /// رتبه‌بندی و مرتب‌سازی پست‌ها (رتبه نزولی)
    ///
    /// فقط نتایجی که `keep(rank)` براشون true باشه میمونن
    pub fn rank_all<F>(&self, posts: Vec<Post>, keep: F) -> Vec<RankedPost>
    where
        F: Fn(f64) -> bool,
    {
        let mut ranked: Vec<RankedPost> = posts
            .into_iter()
            .filter_map(|post| {
                let rank = self.rank(&post)?;
                keep(rank).then_some(RankedPost { post, rank })
            })
            .collect();

        ranked.sort_by(|a, b| b.rank.partial_cmp(&a.rank).unwrap_or(Ordering::Equal));
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PostStatus, DEFAULT_BANNER};
    use chrono::Utc;

    fn post(title: &str, description: &str, content: &str) -> Post {
        Post {
            id: 1,
            banner: DEFAULT_BANNER.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            description: description.to_string(),
            author_id: 1,
            author_username: "writer".to_string(),
            author_first_name: String::new(),
            author_last_name: String::new(),
            author_avatar: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            slug: title.to_string(),
            pub_datetime: Utc::now(),
            category_id: 1,
            category_title: String::new(),
            category_slug: String::new(),
            category_active: true,
            read_time: 5,
            status: PostStatus::Published,
            active: true,
            views: 0,
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_parse_rejects_empty_and_long() {
        assert!(SearchRanker::parse("   ", SearchWeights::FULL).is_err());
        assert!(SearchRanker::parse(&"a".repeat(226), SearchWeights::FULL).is_err());
        assert!(SearchRanker::parse(&"a".repeat(225), SearchWeights::FULL).is_ok());
    }

    #[test]
    fn test_weights() {
        let ranker = SearchRanker::parse("rust", SearchWeights::FULL).unwrap();
        assert_eq!(ranker.rank(&post("Rust", "", "")), Some(1.0));
        assert_eq!(ranker.rank(&post("x", "about rust", "")), Some(0.4));
        assert_eq!(ranker.rank(&post("x", "", "<p>rust</p>")), Some(0.2));
        assert_eq!(ranker.rank(&post("x", "y", "z")), None);
    }

    #[test]
    fn test_all_terms_required() {
        let ranker = SearchRanker::parse("rust axum", SearchWeights::FULL).unwrap();
        assert!(ranker.rank(&post("rust", "", "")).is_none());

        let rank = ranker.rank(&post("rust", "axum", "")).unwrap();
        assert!((rank - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_persian_normalization() {
        let ranker = SearchRanker::parse("كتاب", SearchWeights::FULL).unwrap();
        assert!(ranker.rank(&post("معرفی کتاب", "", "")).is_some());
    }

    #[test]
    fn test_title_only_ignores_other_fields() {
        let ranker = SearchRanker::parse("rust", SearchWeights::TITLE_ONLY).unwrap();
        assert!(ranker.rank(&post("x", "rust", "rust")).is_none());
    }

    #[test]
    fn test_rank_all_orders_and_filters() {
        let ranker = SearchRanker::parse("rust", SearchWeights::FULL).unwrap();
        let posts = vec![
            post("a", "", "rust"),
            post("b", "rust", ""),
            post("rust", "", ""),
        ];

        let ranked = ranker.rank_all(posts, meets_public_rank);
        let titles: Vec<_> = ranked.iter().map(|r| r.post.title.as_str()).collect();
        assert_eq!(titles, vec!["rust", "b", "a"]);

        let strict = ranker.rank_all(vec![post("a", "", "rust")], |rank| rank > 0.2);
        assert!(strict.is_empty());
    }

    #[test]
    fn test_many_terms_in_content_reach_public_rank() {
        let terms: Vec<String> = (0..43).map(|i| format!("w{}x", i)).collect();
        let query = terms.join(" ");
        let ranker = SearchRanker::parse(&query, SearchWeights::FULL).unwrap();

        let body = format!("<p>{}</p>", query);
        let ranked = ranker.rank_all(vec![post("a", "", &body)], meets_public_rank);

        assert_eq!(ranked.len(), 1);
        assert!((ranked[0].rank - PUBLIC_MIN_RANK).abs() < RANK_EPSILON);
    }
}
