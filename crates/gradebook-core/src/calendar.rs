//! Today's date and the Monday-first school week

use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::display;

const WEEKDAY_SHORT: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
const WEEKDAY_FULL: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Lessons only run Monday to Friday.
const WORKING_DAYS: usize = 5;

/// 0..=4 for Monday..Friday, `None` on weekends.
pub fn working_day_index(date: NaiveDate) -> Option<usize> {
    let index = date.weekday().num_days_from_monday() as usize;
    (index < WORKING_DAYS).then_some(index)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodayInfo {
    pub date: NaiveDate,
    /// `YYYY-MM-DD`
    pub iso_date: String,
    pub day_of_month: u32,
    pub weekday_short: &'static str,
    pub weekday_full: &'static str,
    pub working_day_index: Option<usize>,
}

impl TodayInfo {
    pub fn for_date(date: NaiveDate) -> Self {
        let index = date.weekday().num_days_from_monday() as usize;
        Self {
            date,
            iso_date: date.format("%Y-%m-%d").to_string(),
            day_of_month: date.day(),
            weekday_short: WEEKDAY_SHORT[index],
            weekday_full: WEEKDAY_FULL[index],
            working_day_index: working_day_index(date),
        }
    }

    /// Today in the display timezone.
    pub fn now() -> Self {
        Self::for_date(display::today())
    }
}

/// One day of the week strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingDay {
    /// 0 = Monday
    pub index: usize,
    pub date: NaiveDate,
    pub iso_date: String,
    pub short_label: &'static str,
    pub full_label: &'static str,
    pub day_of_month: u32,
    /// Saturday and Sunday
    pub is_disabled: bool,
}

/// The seven days of the week containing `reference`, starting Monday.
pub fn build_calendar_week(reference: NaiveDate) -> Vec<WorkingDay> {
    let monday = reference.week(Weekday::Mon).first_day();
    (0..7)
        .filter_map(|index| {
            let date = monday.checked_add_days(Days::new(index as u64))?;
            Some(WorkingDay {
                index,
                date,
                iso_date: date.format("%Y-%m-%d").to_string(),
                short_label: WEEKDAY_SHORT[index],
                full_label: WEEKDAY_FULL[index],
                day_of_month: date.day(),
                is_disabled: index >= WORKING_DAYS,
            })
        })
        .collect()
}
