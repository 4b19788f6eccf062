use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherRef {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
}

/// Class room reference; the dashboard only sends `id` and `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRoomRef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub course: Option<u8>,
    #[serde(default)]
    pub group_name: Option<String>,
}

/// One lesson in the week/day schedule or the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonItem {
    pub id: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(default)]
    pub room: Option<String>,
    pub subject: SubjectRef,
    #[serde(default)]
    pub class_room: Option<ClassRoomRef>,
    pub teacher: TeacherRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub average_grade: Option<f64>,
    pub lessons_today: u32,
    pub unread_notifications: u32,
    #[serde(default)]
    pub today_schedule: Vec<LessonItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleWeekResponse {
    pub items: Vec<LessonItem>,
    #[serde(default)]
    pub week_start: Option<String>,
    #[serde(default)]
    pub week_end: Option<String>,
}

/// Optional filters for the schedule endpoints (the date is passed separately).
#[derive(Debug, Clone, Default)]
pub struct ScheduleQuery {
    pub class_room_id: Option<String>,
    pub teacher_id: Option<String>,
}

/// `YYYY-MM-DD` as the schedule endpoints expect it.
pub(crate) fn query_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
