use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::schedule::TeacherRef;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectClassRoom {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectListItem {
    pub id: String,
    pub name: String,
    pub class_room_id: String,
    pub teacher_id: String,
    #[serde(default)]
    pub class_room: Option<SubjectClassRoom>,
    #[serde(default)]
    pub teacher: Option<TeacherRef>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Filters for `GET /subjects`.
#[derive(Debug, Clone, Default)]
pub struct SubjectsQuery {
    pub class_room_id: Option<String>,
    pub teacher_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRef {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeItem {
    pub id: String,
    pub subject_id: String,
    pub student_id: String,
    pub created_by_id: String,
    /// 1 to 5
    pub value: u8,
    #[serde(default)]
    pub comment: Option<String>,
    pub graded_at: DateTime<Utc>,
    #[serde(default)]
    pub student: Option<StudentRef>,
    #[serde(default)]
    pub created_by: Option<TeacherRef>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body of `POST /subjects/{id}/grades`. The backend defaults
/// `graded_at` to now.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGradeRequest {
    pub student_id: String,
    pub value: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graded_at: Option<DateTime<Utc>>,
}
