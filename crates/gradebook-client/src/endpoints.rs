//! Typed wrappers, one per backend endpoint

use chrono::NaiveDate;

use crate::client::ApiClient;
use crate::constants::{
    DASHBOARD_ENDPOINT, ME_ENDPOINT, NOTIFICATIONS_ENDPOINT, NOTIFICATIONS_READ_ALL_ENDPOINT,
    SCHEDULE_DAY_ENDPOINT, SCHEDULE_WEEK_ENDPOINT, SETTINGS_ENDPOINT, SUBJECTS_ENDPOINT,
    notification_read_endpoint, subject_grades_endpoint,
};
use crate::error::Result;
use crate::models::{
    CreateGradeRequest, DashboardResponse, GradeItem, LessonItem, NotificationItem,
    NotificationsListResponse, NotificationsQuery, NotificationsReadAllResponse, ScheduleQuery,
    ScheduleWeekResponse, SettingsResponse, SubjectListItem, SubjectsQuery,
    UpdateMeRequest, UpdateSettingsRequest, User, query_date,
};
use crate::transport::RequestOptions;

fn schedule_options(date: NaiveDate, query: &ScheduleQuery) -> RequestOptions {
    RequestOptions::get()
        .query("date", query_date(date))
        .query_opt("classRoomId", query.class_room_id.as_deref())
        .query_opt("teacherId", query.teacher_id.as_deref())
}

impl ApiClient {
    pub async fn me(&self) -> Result<User> {
        self.request(ME_ENDPOINT, RequestOptions::get()).await
    }

    pub async fn update_me(&self, update: &UpdateMeRequest) -> Result<User> {
        self.request(ME_ENDPOINT, RequestOptions::patch().json(update)?)
            .await
    }

    pub async fn dashboard(&self) -> Result<DashboardResponse> {
        self.request(DASHBOARD_ENDPOINT, RequestOptions::get()).await
    }

    pub async fn subjects(&self, query: &SubjectsQuery) -> Result<Vec<SubjectListItem>> {
        let options = RequestOptions::get()
            .query_opt("classRoomId", query.class_room_id.as_deref())
            .query_opt("teacherId", query.teacher_id.as_deref());
        self.request(SUBJECTS_ENDPOINT, options).await
    }

    pub async fn subject_grades(&self, subject_id: &str) -> Result<Vec<GradeItem>> {
        self.request(&subject_grades_endpoint(subject_id)?, RequestOptions::get())
            .await
    }

    /// Teachers only.
    pub async fn create_grade(
        &self,
        subject_id: &str,
        grade: &CreateGradeRequest,
    ) -> Result<GradeItem> {
        self.request(
            &subject_grades_endpoint(subject_id)?,
            RequestOptions::post().json(grade)?,
        )
        .await
    }

    /// Lessons of the week containing `date`.
    pub async fn week_schedule(
        &self,
        date: NaiveDate,
        query: &ScheduleQuery,
    ) -> Result<ScheduleWeekResponse> {
        self.request(SCHEDULE_WEEK_ENDPOINT, schedule_options(date, query))
            .await
    }

    pub async fn day_schedule(&self, date: NaiveDate, query: &ScheduleQuery) -> Result<Vec<LessonItem>> {
        self.request(SCHEDULE_DAY_ENDPOINT, schedule_options(date, query))
            .await
    }

    pub async fn notifications(&self, query: &NotificationsQuery) -> Result<NotificationsListResponse> {
        let options = RequestOptions::get()
            .query_opt("status", query.status)
            .query_opt("page", query.page)
            .query_opt("limit", query.limit);
        self.request(NOTIFICATIONS_ENDPOINT, options).await
    }

    pub async fn mark_notification_read(&self, notification_id: &str) -> Result<NotificationItem> {
        self.request(
            &notification_read_endpoint(notification_id)?,
            RequestOptions::patch(),
        )
        .await
    }

    pub async fn mark_all_notifications_read(&self) -> Result<NotificationsReadAllResponse> {
        self.request(NOTIFICATIONS_READ_ALL_ENDPOINT, RequestOptions::patch())
            .await
    }

    pub async fn settings(&self) -> Result<SettingsResponse> {
        self.request(SETTINGS_ENDPOINT, RequestOptions::get()).await
    }

    pub async fn update_settings(&self, update: &UpdateSettingsRequest) -> Result<SettingsResponse> {
        self.request(SETTINGS_ENDPOINT, RequestOptions::patch().json(update)?)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::models::{NotificationFilterStatus, ThemeMode};
    use crate::test_support::spawn_backend;
    use crate::transport::HttpTransport;
    use axum::Json;
    use axum::extract::{Path, RawQuery};
    use axum::routing::{get, patch, post};
    use gradebook_auth::MemoryTokenStore;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::time::Duration;

    async fn client_for(router: axum::Router) -> ApiClient {
        let base = spawn_backend(router).await;
        let transport = HttpTransport::new(base, Duration::from_secs(5)).unwrap();
        ApiClient::new(transport, Arc::new(MemoryTokenStore::with_tokens("at", "rt")))
    }

    fn lesson(id: &str) -> Value {
        json!({
            "id": id,
            "startsAt": "2025-03-03T05:30:00.000Z",
            "endsAt": "2025-03-03T07:00:00.000Z",
            "room": "214",
            "subject": {"id": "s1", "name": "Mathematics"},
            "teacher": {"id": "t1", "firstName": "Olga", "lastName": "Smirnova", "middleName": "Petrovna"}
        })
    }

    #[tokio::test]
    async fn schedule_passes_date_and_filters() {
        let router = axum::Router::new()
            .route(
                SCHEDULE_DAY_ENDPOINT,
                get(|RawQuery(query): RawQuery| async move {
                    assert_eq!(query.as_deref(), Some("date=2025-03-03&classRoomId=c1"));
                    Json(json!([lesson("l1")]))
                }),
            )
            .route(
                SCHEDULE_WEEK_ENDPOINT,
                get(|RawQuery(query): RawQuery| async move {
                    assert_eq!(query.as_deref(), Some("date=2025-03-05"));
                    Json(json!({"items": [lesson("l1"), lesson("l2")], "weekStart": "2025-03-03"}))
                }),
            );
        let client = client_for(router).await;

        let filter = ScheduleQuery {
            class_room_id: Some("c1".into()),
            teacher_id: None,
        };
        let day = client
            .day_schedule(NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(), &filter)
            .await
            .unwrap();
        assert_eq!(day.len(), 1);
        assert_eq!(day[0].room.as_deref(), Some("214"));

        let week = client
            .week_schedule(NaiveDate::from_ymd_opt(2025, 3, 5).unwrap(), &ScheduleQuery::default())
            .await
            .unwrap();
        assert_eq!(week.items.len(), 2);
        assert_eq!(week.week_start.as_deref(), Some("2025-03-03"));
    }

    #[tokio::test]
    async fn notifications_query_and_mark_read() {
        let router = axum::Router::new()
            .route(
                NOTIFICATIONS_ENDPOINT,
                get(|RawQuery(query): RawQuery| async move {
                    assert_eq!(query.as_deref(), Some("status=unread&limit=20"));
                    Json(json!({"items": [], "page": 1, "limit": 20, "total": 0, "totalPages": 0}))
                }),
            )
            .route(
                "/api/v1/notifications/{id}/read",
                patch(|Path(id): Path<String>| async move {
                    Json(json!({
                        "id": id, "userId": "u1", "title": "t", "body": "b",
                        "type": "system", "status": "read",
                        "readAt": "2025-03-01T10:05:00Z",
                        "createdAt": "2025-03-01T10:00:00Z", "updatedAt": "2025-03-01T10:05:00Z"
                    }))
                }),
            )
            .route(
                NOTIFICATIONS_READ_ALL_ENDPOINT,
                patch(|| async { Json(json!({"updated": 4})) }),
            );
        let client = client_for(router).await;

        let list = client
            .notifications(&NotificationsQuery {
                status: Some(NotificationFilterStatus::Unread),
                page: None,
                limit: Some(20),
            })
            .await
            .unwrap();
        assert_eq!(list.limit, 20);

        let item = client.mark_notification_read("n7").await.unwrap();
        assert_eq!(item.id, "n7");
        assert!(!item.is_unread());

        assert_eq!(client.mark_all_notifications_read().await.unwrap().updated, 4);
    }

    #[tokio::test]
    async fn settings_update_sends_partial_body() {
        let router = axum::Router::new().route(
            SETTINGS_ENDPOINT,
            patch(|Json(body): Json<Value>| async move {
                assert_eq!(body, json!({"themeMode": "dark"}));
                Json(json!({"themeMode": "dark", "notifications": {"enabled": true}}))
            }),
        );
        let client = client_for(router).await;

        let updated = client
            .update_settings(&UpdateSettingsRequest {
                theme_mode: Some(ThemeMode::Dark),
                notifications: None,
            })
            .await
            .unwrap();
        assert_eq!(updated.theme_mode, ThemeMode::Dark);
        assert_eq!(updated.notifications.enabled, Some(true));
    }

    #[tokio::test]
    async fn subject_grades_uses_subject_path() {
        let router = axum::Router::new().route(
            "/api/v1/subjects/{id}/grades",
            get(|Path(id): Path<String>| async move {
                Json(json!([{
                    "id": "g1", "subjectId": id, "studentId": "u1", "createdById": "t1",
                    "value": 4, "gradedAt": "2025-02-14T06:00:00.000Z"
                }]))
            }),
        );
        let client = client_for(router).await;

        let grades = client.subject_grades("s42").await.unwrap();
        assert_eq!(grades[0].subject_id, "s42");
        assert_eq!(grades[0].value, 4);
    }

    #[tokio::test]
    async fn create_grade_posts_to_encoded_subject_path() {
        let router = axum::Router::new().route(
            "/api/v1/subjects/{id}/grades",
            post(|Path(id): Path<String>, Json(body): Json<Value>| async move {
                assert_eq!(id, "math/10a");
                assert_eq!(body, json!({"studentId": "u1", "value": 5, "comment": "oral"}));
                Json(json!({
                    "id": "g9", "subjectId": id, "studentId": "u1", "createdById": "t1",
                    "value": 5, "comment": "oral", "gradedAt": "2025-02-14T06:00:00.000Z"
                }))
            }),
        );
        let client = client_for(router).await;

        let grade = client
            .create_grade(
                "math/10a",
                &CreateGradeRequest {
                    student_id: "u1".into(),
                    value: 5,
                    comment: Some("oral".into()),
                    graded_at: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(grade.id, "g9");
        assert_eq!(grade.subject_id, "math/10a");
        assert_eq!(grade.comment.as_deref(), Some("oral"));
    }

    #[tokio::test]
    async fn dot_segment_ids_never_reach_the_backend() {
        let client = client_for(axum::Router::new()).await;
        let err = client.mark_notification_read("..").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn update_me_patches_only_given_fields() {
        let router = axum::Router::new().route(
            ME_ENDPOINT,
            patch(|Json(body): Json<Value>| async move {
                assert_eq!(body, json!({"firstName": "Anna"}));
                Json(json!({
                    "id": "u1", "login": "anna", "role": "student",
                    "firstName": "Anna", "lastName": "Ivanova",
                    "createdAt": "2025-01-01T00:00:00.000Z",
                    "updatedAt": "2025-02-01T00:00:00.000Z"
                }))
            }),
        );
        let client = client_for(router).await;

        let user = client
            .update_me(&UpdateMeRequest {
                first_name: Some("Anna".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(user.first_name, "Anna");
        assert_eq!(user.full_name(), "Ivanova Anna");
    }
}
