//! # تقویم جلالی (هجری شمسی)
//!
//! تبدیل تاریخ میلادی به جلالی و برعکس، و قالب‌بندی تاریخ‌ها برای نمایش.
//!
//! الگوریتم تبدیل از چرخه‌های ۳۳ ساله تقویم جلالی استفاده میکنه و
//! فقط با عملیات صحیح کار میکنه، پس برای هر تاریخی بین سال‌های
//! ۱ تا ۳۰۰۰ میلادی دقیقه.
//!
//! همه تاریخ‌ها در دیتابیس UTC هستن؛ قبل از تبدیل، به وقت محلی
//! (پیش‌فرض تهران، +03:30) منتقل میشن.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Timelike, Utc, Weekday};

/// نام ماه‌های جلالی
pub const JALALI_MONTHS: [&str; 12] = [
    "فروردین",
    "اردیبهشت",
    "خرداد",
    "تیر",
    "مرداد",
    "شهریور",
    "مهر",
    "آبان",
    "آذر",
    "دی",
    "بهمن",
    "اسفند",
];

/// روزهای گذشته از سال میلادی تا ابتدای هر ماه (سال غیرکبیسه)
const GREGORIAN_DAYS_BEFORE_MONTH: [i64; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

/// یک تاریخ جلالی
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct JalaliDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl JalaliDate {
    /// نام ماه
    #[must_use]
    pub fn month_name(&self) -> &'static str {
        jalali_month_name(self.month)
    }
}

impl std::fmt::Display for JalaliDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}/{:02}/{:02}", self.year, self.month, self.day)
    }
}

/// تبدیل تاریخ میلادی به جلالی
///
/// # مثال
/// ```rust
/// use qurno::utils::jalali::{gregorian_to_jalali, JalaliDate};
///
/// assert_eq!(
///     gregorian_to_jalali(2024, 3, 20),
///     JalaliDate { year: 1403, month: 1, day: 1 }
/// );
/// ```
#[must_use]
pub fn gregorian_to_jalali(gy: i32, gm: u32, gd: u32) -> JalaliDate {
    let gy = i64::from(gy);
    let gm = i64::from(gm.clamp(1, 12));
    let gd = i64::from(gd);

    let gy2 = if gm > 2 { gy + 1 } else { gy };
    let mut days = 355_666 + 365 * gy + (gy2 + 3) / 4 - (gy2 + 99) / 100 + (gy2 + 399) / 400
        + gd
        + GREGORIAN_DAYS_BEFORE_MONTH[(gm - 1) as usize];

    let mut jy = -1595 + 33 * (days / 12_053);
    days %= 12_053;
    jy += 4 * (days / 1461);
    days %= 1461;
    if days > 365 {
        jy += (days - 1) / 365;
        days = (days - 1) % 365;
    }

    let (jm, jd) = if days < 186 {
        (1 + days / 31, 1 + days % 31)
    } else {
        (7 + (days - 186) / 30, 1 + (days - 186) % 30)
    };

    JalaliDate {
        year: jy as i32,
        month: jm as u32,
        day: jd as u32,
    }
}

/// تبدیل تاریخ جلالی به میلادی
///
/// خروجی `None` یعنی ورودی تاریخ معتبری نیست (مثلا ۳۱ مهر)
#[must_use]
pub fn jalali_to_gregorian(jy: i32, jm: u32, jd: u32) -> Option<NaiveDate> {
    if !(1..=12).contains(&jm) || jd == 0 || jd > jalali_month_length(jy, jm) {
        return None;
    }
    convert_to_gregorian(jy, jm, jd)
}

// بدون بررسی طول ماه؛ روز اضافه به ماه بعد منتقل میشه
fn convert_to_gregorian(jy: i32, jm: u32, jd: u32) -> Option<NaiveDate> {
    let jy = i64::from(jy) + 1595;
    let jm = i64::from(jm);
    let jd = i64::from(jd);

    let mut days = -355_668 + 365 * jy + (jy / 33) * 8 + ((jy % 33) + 3) / 4 + jd
        + if jm < 7 { (jm - 1) * 31 } else { (jm - 7) * 30 + 186 };

    let mut gy = 400 * (days / 146_097);
    days %= 146_097;
    if days > 36_524 {
        days -= 1;
        gy += 100 * (days / 36_524);
        days %= 36_524;
        if days >= 365 {
            days += 1;
        }
    }
    gy += 4 * (days / 1461);
    days %= 1461;
    if days > 365 {
        gy += (days - 1) / 365;
        days = (days - 1) % 365;
    }

    let leap = (gy % 4 == 0 && gy % 100 != 0) || gy % 400 == 0;
    let month_lengths = [31, if leap { 29 } else { 28 }, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

    let mut gd = days + 1;
    let mut gm = 1u32;
    for length in month_lengths {
        if gd <= length {
            break;
        }
        gd -= length;
        gm += 1;
    }

    NaiveDate::from_ymd_opt(i32::try_from(gy).ok()?, gm, u32::try_from(gd).ok()?)
}

/// آیا سال جلالی کبیسه است؟
///
/// در سال غیرکبیسه «۳۰ اسفند» همون ۱ فروردین سال بعد میشه
#[must_use]
pub fn is_jalali_leap_year(jy: i32) -> bool {
    convert_to_gregorian(jy, 12, 30)
        .map(|d| gregorian_to_jalali(d.year(), d.month(), d.day()))
        .is_some_and(|date| date == JalaliDate { year: jy, month: 12, day: 30 })
}

/// تعداد روزهای یک ماه جلالی
#[must_use]
pub fn jalali_month_length(jy: i32, jm: u32) -> u32 {
    match jm {
        1..=6 => 31,
        7..=11 => 30,
        12 if is_jalali_leap_year(jy) => 30,
        _ => 29,
    }
}

/// نام ماه جلالی (۱ تا ۱۲)
#[must_use]
pub fn jalali_month_name(month: u32) -> &'static str {
    JALALI_MONTHS
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("")
}

/// نام فارسی روز هفته
#[must_use]
pub fn persian_weekday(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Sat => "شنبه",
        Weekday::Sun => "یک شنبه",
        Weekday::Mon => "دو شنبه",
        Weekday::Tue => "سه شنبه",
        Weekday::Wed => "چهار شنبه",
        Weekday::Thu => "پنج شنبه",
        Weekday::Fri => "جمعه",
    }
}

/// منطقه زمانی ثابت از روی اختلاف دقیقه‌ای با UTC
#[must_use]
pub fn fixed_offset(offset_minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(offset_minutes * 60).unwrap_or_else(|| Utc.fix())
}

/// تبدیل زمان UTC به وقت محلی
#[must_use]
pub fn to_local(time: DateTime<Utc>, offset_minutes: i32) -> NaiveDateTime {
    time.with_timezone(&fixed_offset(offset_minutes)).naive_local()
}

/// تاریخ جلالی یک لحظه به وقت محلی
#[must_use]
pub fn jalali_of(time: DateTime<Utc>, offset_minutes: i32) -> JalaliDate {
    let local = to_local(time, offset_minutes);
    gregorian_to_jalali(local.year(), local.month(), local.day())
}

/// تاریخ و ساعت کامل به فارسی
///
/// خروجی: `"{روز} {ماه} {سال} - ساعت {ساعت} و {دقیقه} دقیقه"`
#[must_use]
pub fn get_jalali_date(time: DateTime<Utc>, offset_minutes: i32) -> String {
    let local = to_local(time, offset_minutes);
    let date = gregorian_to_jalali(local.year(), local.month(), local.day());

    format!(
        "{} {} {} - ساعت {} و {} دقیقه",
        date.day,
        date.month_name(),
        date.year,
        local.hour(),
        local.minute(),
    )
}

/// تاریخ امروز به فارسی: `"{روز} {ماه} {سال}"`
#[must_use]
pub fn get_jalali_today(time: DateTime<Utc>, offset_minutes: i32) -> String {
    let date = jalali_of(time, offset_minutes);
    format!("{} {} {}", date.day, date.month_name(), date.year)
}

/// روز هفته امروز به وقت محلی
#[must_use]
pub fn local_weekday(time: DateTime<Utc>, offset_minutes: i32) -> &'static str {
    persian_weekday(to_local(time, offset_minutes).weekday())
}

/// خوندن تاریخ و ساعت جلالی از فرم
///
/// تاریخ با فرمت `1403/01/15` یا `1403-01-15` و ساعت با فرمت `14:30`
/// (یا خالی برای نیمه‌شب). خروجی به UTC برمیگرده.
#[must_use]
pub fn parse_jalali_datetime(date: &str, time: &str, offset_minutes: i32) -> Option<DateTime<Utc>> {
    let parts: Vec<&str> = date.trim().split(['/', '-']).collect();
    let [y, m, d] = parts.as_slice() else {
        return None;
    };
    let gregorian = jalali_to_gregorian(y.parse().ok()?, m.parse().ok()?, d.parse().ok()?)?;

    let time = time.trim();
    let clock = if time.is_empty() {
        NaiveTime::from_hms_opt(0, 0, 0)?
    } else {
        NaiveTime::parse_from_str(time, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
            .ok()?
    };

    fixed_offset(offset_minutes)
        .from_local_datetime(&gregorian.and_time(clock))
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// مقدار پیش‌فرض فیلدهای تاریخ و ساعت فرم (به وقت محلی)
#[must_use]
pub fn format_jalali_input(time: DateTime<Utc>, offset_minutes: i32) -> (String, String) {
    let local = to_local(time, offset_minutes);
    let date = gregorian_to_jalali(local.year(), local.month(), local.day());
    (date.to_string(), format!("{:02}:{:02}", local.hour(), local.minute()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const KNOWN_DATES: [((i32, u32, u32), (i32, u32, u32)); 8] = [
        ((2024, 3, 20), (1403, 1, 1)),
        ((2023, 3, 21), (1402, 1, 1)),
        ((2022, 12, 31), (1401, 10, 10)),
        ((2000, 1, 1), (1378, 10, 11)),
        ((2025, 10, 19), (1404, 7, 27)),
        ((1979, 2, 11), (1357, 11, 22)),
        ((2024, 3, 19), (1402, 12, 29)),
        ((2025, 3, 20), (1403, 12, 30)),
    ];

    #[test]
    fn test_known_gregorian_to_jalali() {
        for ((gy, gm, gd), (jy, jm, jd)) in KNOWN_DATES {
            assert_eq!(
                gregorian_to_jalali(gy, gm, gd),
                JalaliDate { year: jy, month: jm, day: jd },
                "{gy}-{gm}-{gd}"
            );
        }
    }

    #[test]
    fn test_known_jalali_to_gregorian() {
        for ((gy, gm, gd), (jy, jm, jd)) in KNOWN_DATES {
            assert_eq!(jalali_to_gregorian(jy, jm, jd), NaiveDate::from_ymd_opt(gy, gm, gd));
        }
    }

    #[test]
    fn test_leap_years() {
        assert!(is_jalali_leap_year(1403));
        assert!(!is_jalali_leap_year(1402));
        assert_eq!(jalali_month_length(1403, 12), 30);
        assert_eq!(jalali_month_length(1402, 12), 29);
        assert_eq!(jalali_to_gregorian(1402, 12, 30), None);
    }

    #[test]
    fn test_invalid_jalali_dates() {
        assert_eq!(jalali_to_gregorian(1403, 7, 31), None);
        assert_eq!(jalali_to_gregorian(1403, 13, 1), None);
        assert_eq!(jalali_to_gregorian(1403, 1, 0), None);
    }

    #[test]
    fn test_get_jalali_date_uses_local_time() {
        // 20:45 UTC در تهران 00:15 روز بعده
        let time = Utc.with_ymd_and_hms(2024, 3, 19, 20, 45, 0).unwrap();
        assert_eq!(get_jalali_date(time, 210), "1 فروردین 1403 - ساعت 0 و 15 دقیقه");
        assert_eq!(get_jalali_today(time, 210), "1 فروردین 1403");
    }

    #[test]
    fn test_weekday_names() {
        assert_eq!(persian_weekday(Weekday::Sat), "شنبه");
        assert_eq!(persian_weekday(Weekday::Fri), "جمعه");
        let time = Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap();
        assert_eq!(local_weekday(time, 210), "چهار شنبه");
    }

    #[test]
    fn test_parse_jalali_datetime() {
        let parsed = parse_jalali_datetime("1403/01/01", "03:30", 210).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 3, 20, 0, 0, 0).unwrap());

        assert!(parse_jalali_datetime("1403-01-01", "", 210).is_some());
        assert!(parse_jalali_datetime("not a date", "", 210).is_none());
        assert!(parse_jalali_datetime("1403/01/01", "25:00", 210).is_none());
    }

    #[test]
    fn test_format_jalali_input_round_trips() {
        let time = Utc.with_ymd_and_hms(2025, 10, 19, 9, 5, 0).unwrap();
        let (date, clock) = format_jalali_input(time, 210);
        assert_eq!(date, "1404/07/27");
        assert_eq!(clock, "12:35");
        assert_eq!(parse_jalali_datetime(&date, &clock, 210), Some(time));
    }
}
