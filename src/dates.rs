//! Russian-locale date strings for person and meeting pages.

use chrono::{Datelike as _, NaiveDate, Weekday};

/// Prefix used when only the birth date is known.
pub const BORN_PREFIX: &str = "род.";
/// Marker of dates before the common era; such values are shown verbatim.
pub const ERA_MARKER: &str = "до н.э";
/// Marker of a value that is already a range.
pub const RANGE_MARKER: &str = " - ";

const MONTHS_GENITIVE: [&str; 12] = [
    "января",
    "февраля",
    "марта",
    "апреля",
    "мая",
    "июня",
    "июля",
    "августа",
    "сентября",
    "октября",
    "ноября",
    "декабря",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParsedDate {
    Day(NaiveDate),
    Year(i32),
}

/// `1961-04-12` → `12 апреля 1961 г.`; a bare year stays a year.
///
/// Strings that do not look like a date are returned unchanged.
pub fn format_date(raw: &str) -> String {
    match parse(raw) {
        Some(ParsedDate::Day(date)) => long_date(date),
        Some(ParsedDate::Year(year)) => year.to_string(),
        None => raw.trim().to_owned(),
    }
}

/// Like [`format_date`] with the weekday in front: `среда, 12 апреля 1961 г.`
pub fn format_meeting_date(raw: &str) -> String {
    match parse(raw) {
        Some(ParsedDate::Day(date)) => {
            format!("{}, {}", weekday_name(date.weekday()), long_date(date))
        }
        Some(ParsedDate::Year(year)) => year.to_string(),
        None => raw.trim().to_owned(),
    }
}

/// Subtitle for a life span.
///
/// Values containing a range or era marker are considered pre-formatted and
/// are never re-parsed. Returns `None` without a birth date.
pub fn format_life_dates(birth: Option<&str>, death: Option<&str>) -> Option<String> {
    let birth = non_blank(birth)?;
    let death = non_blank(death);

    if is_preformatted(birth) {
        return Some(match death {
            Some(death) => format!("{birth} — {death}"),
            None => birth.to_owned(),
        });
    }

    let birth = format_date(birth);
    Some(match death {
        Some(death) => format!("{birth} — {}", format_date(death)),
        None => format!("{BORN_PREFIX} {birth}"),
    })
}

pub fn is_preformatted(value: &str) -> bool {
    value.contains(RANGE_MARKER) || value.contains(ERA_MARKER)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse(raw: &str) -> Option<ParsedDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if raw.len() <= 4 && raw.chars().all(|c| c.is_ascii_digit()) {
        return raw.parse().ok().map(ParsedDate::Year);
    }

    // Timestamps such as `1961-04-12T09:07:00Z` keep only their date part.
    let date_part = match raw.get(..10) {
        Some(head) if raw[10..].starts_with(['T', ' ']) => head,
        _ => raw,
    };

    ["%Y-%m-%d", "%d.%m.%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
        .map(ParsedDate::Day)
}

fn long_date(date: NaiveDate) -> String {
    format!(
        "{} {} {} г.",
        date.day(),
        MONTHS_GENITIVE[date.month0() as usize],
        date.year()
    )
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "понедельник",
        Weekday::Tue => "вторник",
        Weekday::Wed => "среда",
        Weekday::Thu => "четверг",
        Weekday::Fri => "пятница",
        Weekday::Sat => "суббота",
        Weekday::Sun => "воскресенье",
    }
}
