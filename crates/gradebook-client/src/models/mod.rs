//! Wire types for the `/api/v1` backend
//!
//! Field names follow the backend's camelCase JSON. Timestamps are UTC.

mod auth;
mod grades;
mod notifications;
mod schedule;
mod settings;
mod user;

pub use auth::{AuthResponse, Credentials, LogoutResponse, MIN_PASSWORD_CHARS, RefreshRequest};
pub use grades::{
    CreateGradeRequest, GradeItem, StudentRef, SubjectClassRoom, SubjectListItem, SubjectsQuery,
};
pub use notifications::{
    NotificationFilterStatus, NotificationItem, NotificationStatus, NotificationType,
    NotificationsListResponse, NotificationsQuery, NotificationsReadAllResponse,
};
pub use schedule::{
    ClassRoomRef, DashboardResponse, LessonItem, ScheduleQuery, ScheduleWeekResponse, SubjectRef,
    TeacherRef,
};
pub(crate) use schedule::query_date;
pub use settings::{NotificationsSettings, SettingsResponse, ThemeMode, UpdateSettingsRequest};
pub use user::{ClassRoom, Role, UpdateMeRequest, User};
