//! Formatting of backend timestamps for people
//!
//! The school runs on Moscow time. Moscow has had a fixed UTC+03:00 offset
//! without daylight saving since 2014, so a `FixedOffset` is exact.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use gradebook_client::models::TeacherRef;

/// Name of the display timezone.
pub const DISPLAY_TIMEZONE: &str = "Europe/Moscow";

const DISPLAY_OFFSET_SECS: i32 = 3 * 3600;

pub fn display_offset() -> FixedOffset {
    // in range by construction; the fallback is unreachable
    FixedOffset::east_opt(DISPLAY_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Convert a UTC instant to the display timezone.
pub fn to_display(at: DateTime<Utc>) -> DateTime<FixedOffset> {
    at.with_timezone(&display_offset())
}

/// Current calendar date in the display timezone.
pub fn today() -> NaiveDate {
    to_display(Utc::now()).date_naive()
}

/// `HH:MM`
pub fn format_time(at: DateTime<Utc>) -> String {
    to_display(at).format("%H:%M").to_string()
}

/// `HH:MM - HH:MM`
pub fn format_time_range(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> String {
    format!("{} - {}", format_time(starts_at), format_time(ends_at))
}

/// `dd.MM.yyyy`
pub fn format_date(at: DateTime<Utc>) -> String {
    to_display(at).format("%d.%m.%Y").to_string()
}

/// Compact teacher name on lesson cards: "Smirnova O.P."
pub fn lesson_teacher_name(teacher: &TeacherRef) -> String {
    let mut name = format!("{} ", teacher.last_name);
    if let Some(initial) = teacher.first_name.chars().next() {
        name.push(initial);
        name.push('.');
    }
    if let Some(initial) = teacher.middle_name.as_deref().and_then(|m| m.chars().next()) {
        name.push(initial);
        name.push('.');
    }
    name.trim_end().to_string()
}
