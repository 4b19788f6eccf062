//! Grade cache and derived statistics
//!
//! `GradesCache` holds the last grades fetched per subject. Everything
//! shown on the grades screens (averages, counts, labels) is computed from
//! it by pure functions.

use std::collections::{BTreeMap, HashSet};

use futures_util::future::join_all;
use gradebook_client::ApiClient;
use gradebook_client::models::{GradeItem, SubjectListItem, TeacherRef};
use tracing::{debug, warn};

use crate::display::format_date;

/// Average and distribution of a list of grades.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GradeStats {
    /// 0 when there are no grades
    pub average: f64,
    pub total: usize,
    pub fives: usize,
    pub fours: usize,
    pub threes: usize,
}

impl GradeStats {
    pub fn from_grades<'a>(grades: impl IntoIterator<Item = &'a GradeItem>) -> Self {
        let mut stats = GradeStats::default();
        let mut sum = 0u64;
        for grade in grades {
            sum += u64::from(grade.value);
            stats.total += 1;
            match grade.value {
                5 => stats.fives += 1,
                4 => stats.fours += 1,
                3 => stats.threes += 1,
                _ => {}
            }
        }
        if stats.total > 0 {
            stats.average = sum as f64 / stats.total as f64;
        }
        stats
    }
}

/// Performance band of an average or a single grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeTier {
    Excellent,
    Good,
    Satisfactory,
    Poor,
}

impl GradeTier {
    pub fn from_average(average: f64) -> Self {
        if average >= 4.5 {
            GradeTier::Excellent
        } else if average >= 3.5 {
            GradeTier::Good
        } else if average >= 2.5 {
            GradeTier::Satisfactory
        } else {
            GradeTier::Poor
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GradeTier::Excellent => "excellent",
            GradeTier::Good => "good",
            GradeTier::Satisfactory => "satisfactory",
            GradeTier::Poor => "poor",
        }
    }
}

/// Word for a grade, rounded to the nearest mark; "—" outside 2..=5.
pub fn grade_label(grade: f64) -> &'static str {
    match grade.round() as i64 {
        5 => "Excellent",
        4 => "Good",
        3 => "Satisfactory",
        2 => "Unsatisfactory",
        _ => "—",
    }
}

/// "Lastname F. M." for subject lists; "—" when the teacher is unknown.
pub fn format_teacher_short(teacher: Option<&TeacherRef>) -> String {
    let Some(teacher) = teacher else {
        return "—".to_string();
    };
    let initial = teacher
        .first_name
        .chars()
        .next()
        .map(String::from)
        .unwrap_or_default();
    let middle = teacher
        .middle_name
        .as_deref()
        .and_then(|m| m.chars().next())
        .map(|c| format!(" {c}."))
        .unwrap_or_default();
    format!("{} {initial}.{middle}", teacher.last_name)
        .trim()
        .to_string()
}

/// One row of a subject's grade history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeEntry {
    pub id: String,
    pub grade: u8,
    /// `dd.MM.yyyy` in the display timezone
    pub date: String,
    pub comment: Option<String>,
}

pub fn grade_entries(grades: &[GradeItem]) -> Vec<GradeEntry> {
    grades
        .iter()
        .map(|g| GradeEntry {
            id: g.id.clone(),
            grade: g.value,
            date: format_date(g.graded_at),
            comment: g.comment.clone().filter(|c| !c.is_empty()),
        })
        .collect()
}

/// A subject joined with its cached grades.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectWithGrades {
    pub subject: SubjectListItem,
    pub grades: Vec<u8>,
    pub average: f64,
    pub teacher: String,
}

/// Grades fetched per subject, replaced wholesale on every fetch.
#[derive(Debug, Default)]
pub struct GradesCache {
    by_subject: BTreeMap<String, Vec<GradeItem>>,
    loading: HashSet<String>,
    is_loading: bool,
    error: Option<String>,
}

impl GradesCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grades(&self, subject_id: &str) -> &[GradeItem] {
        self.by_subject
            .get(subject_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn set_grades(&mut self, subject_id: &str, grades: Vec<GradeItem>) {
        self.by_subject.insert(subject_id.to_string(), grades);
        self.error = None;
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading || !self.loading.is_empty()
    }

    pub fn is_loading_subject(&self, subject_id: &str) -> bool {
        self.loading.contains(subject_id)
    }

    /// Message of the last failed single-subject fetch.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Fetch one subject. On failure the error is recorded and the
    /// subject's grades are emptied rather than left stale.
    pub async fn fetch_subject(&mut self, client: &ApiClient, subject_id: &str) {
        self.loading.insert(subject_id.to_string());
        self.error = None;
        match client.subject_grades(subject_id).await {
            Ok(grades) => {
                debug!(subject_id, count = grades.len(), "grades loaded");
                self.set_grades(subject_id, grades);
            }
            Err(e) => {
                warn!(subject_id, error = %e, "failed to load grades");
                self.error = Some(e.user_message());
                self.by_subject.insert(subject_id.to_string(), Vec::new());
            }
        }
        self.loading.remove(subject_id);
    }

    /// Fetch all `subjects` concurrently. A subject that fails to load is
    /// cached as empty; the others are unaffected.
    pub async fn fetch_subjects(&mut self, client: &ApiClient, subjects: &[SubjectListItem]) {
        self.is_loading = true;
        self.error = None;
        let fetches = subjects.iter().map(|subject| async move {
            (subject.id.as_str(), client.subject_grades(&subject.id).await)
        });
        for (subject_id, result) in join_all(fetches).await {
            let grades = result.unwrap_or_else(|e| {
                warn!(subject_id, error = %e, "failed to load grades, showing none");
                Vec::new()
            });
            self.by_subject.insert(subject_id.to_string(), grades);
        }
        self.is_loading = false;
    }

    /// Statistics over every cached grade.
    pub fn overall(&self) -> GradeStats {
        GradeStats::from_grades(self.by_subject.values().flatten())
    }

    pub fn subjects_with_grades(&self, subjects: &[SubjectListItem]) -> Vec<SubjectWithGrades> {
        subjects
            .iter()
            .map(|subject| {
                let list = self.grades(&subject.id);
                SubjectWithGrades {
                    subject: subject.clone(),
                    grades: list.iter().map(|g| g.value).collect(),
                    average: GradeStats::from_grades(list).average,
                    teacher: format_teacher_short(subject.teacher.as_ref()),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{client_for, grade_json, subject};
    use axum::Json;
    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::routing::get;
    use serde_json::json;

    fn grade(id: &str, value: u8) -> GradeItem {
        serde_json::from_value(grade_json(id, "s1", value)).unwrap()
    }

    #[test]
    fn stats_for_empty_and_mixed_lists() {
        assert_eq!(GradeStats::from_grades(&Vec::<GradeItem>::new()), GradeStats::default());

        let grades = [grade("a", 5), grade("b", 4), grade("c", 5), grade("d", 2)];
        let stats = GradeStats::from_grades(&grades);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.fives, 2);
        assert_eq!(stats.fours, 1);
        assert_eq!(stats.threes, 0);
        assert!((stats.average - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn tiers_and_labels() {
        assert_eq!(GradeTier::from_average(4.5), GradeTier::Excellent);
        assert_eq!(GradeTier::from_average(4.49), GradeTier::Good);
        assert_eq!(GradeTier::from_average(2.5), GradeTier::Satisfactory);
        assert_eq!(GradeTier::from_average(0.0), GradeTier::Poor);

        assert_eq!(grade_label(4.6), "Excellent");
        assert_eq!(grade_label(3.5), "Good");
        assert_eq!(grade_label(2.0), "Unsatisfactory");
        assert_eq!(grade_label(1.0), "—");
    }

    #[test]
    fn teacher_short_name() {
        let teacher = TeacherRef {
            id: "t1".into(),
            first_name: "Anna".into(),
            last_name: "Petrova".into(),
            middle_name: Some("Ivanovna".into()),
        };
        assert_eq!(format_teacher_short(Some(&teacher)), "Petrova A. I.");
        let no_middle = TeacherRef {
            middle_name: None,
            ..teacher
        };
        assert_eq!(format_teacher_short(Some(&no_middle)), "Petrova A.");
        assert_eq!(format_teacher_short(None), "—");
    }

    #[test]
    fn entries_use_display_dates() {
        let mut item = grade("g1", 5);
        item.graded_at = "2025-02-14T22:00:00Z".parse().unwrap();
        item.comment = Some(String::new());
        let entries = grade_entries(&[item]);
        assert_eq!(entries[0].date, "15.02.2025");
        assert_eq!(entries[0].comment, None);
    }

    #[tokio::test]
    async fn failed_subject_is_cached_empty() {
        let router = axum::Router::new().route(
            "/api/v1/subjects/{id}/grades",
            get(|Path(id): Path<String>| async move {
                if id == "broken" {
                    Err((
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({"statusCode": 500, "message": "boom"})),
                    ))
                } else {
                    Ok(Json(json!([grade_json("g1", &id, 5), grade_json("g2", &id, 4)])))
                }
            }),
        );
        let client = client_for(router).await;
        let subjects = [subject("math", None), subject("broken", None)];

        let mut cache = GradesCache::new();
        cache.set_grades("broken", vec![grade("stale", 3)]);
        cache.fetch_subjects(&client, &subjects).await;

        assert!(!cache.is_loading());
        assert_eq!(cache.grades("math").len(), 2);
        assert!(cache.grades("broken").is_empty());
        let overall = cache.overall();
        assert_eq!(overall.total, 2);
        assert!((overall.average - 4.5).abs() < f64::EPSILON);

        let rows = cache.subjects_with_grades(&subjects);
        assert_eq!(rows[0].grades, vec![5, 4]);
        assert_eq!(rows[1].average, 0.0);
        assert_eq!(rows[1].teacher, "—");
    }

    #[tokio::test]
    async fn single_fetch_records_error() {
        let router = axum::Router::new().route(
            "/api/v1/subjects/{id}/grades",
            get(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({"statusCode": 404, "message": "Subject not found"})),
                )
            }),
        );
        let client = client_for(router).await;

        let mut cache = GradesCache::new();
        cache.set_grades("gone", vec![grade("old", 5)]);
        cache.fetch_subject(&client, "gone").await;

        assert_eq!(cache.error(), Some("Subject not found"));
        assert!(cache.grades("gone").is_empty());
        assert!(!cache.is_loading_subject("gone"));
        cache.clear_error();
        assert!(cache.error().is_none());
    }
}
