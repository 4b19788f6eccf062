//! Command execution and terminal output

use std::io::Write;
use std::sync::Arc;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use common::Secret;
use gradebook_auth::{FileTokenStore, LocalStorage};
use gradebook_client::models::{
    Credentials, LessonItem, NotificationFilterStatus, NotificationsQuery, ScheduleQuery,
    SubjectsQuery,
};
use gradebook_client::{ApiClient, HttpTransport};
use gradebook_core::calendar::build_calendar_week;
use gradebook_core::display::{self, format_date, format_time_range, lesson_teacher_name};
use gradebook_core::grades::{grade_entries, grade_label};
use gradebook_core::{GradeStats, GradeTier, GradesCache, Session, SettingsStore, TodayInfo};
use tracing::debug;

use crate::cli::{Command, ScheduleScope, SettingsAction, USAGE};
use crate::config::Config;

/// Env var consulted before prompting for a password.
pub const PASSWORD_ENV: &str = "GRADEBOOK_PASSWORD";

/// Shared handles for one invocation.
pub struct App {
    client: ApiClient,
    storage: Arc<LocalStorage>,
}

impl App {
    pub async fn open(config: &Config) -> Result<Self> {
        let storage = Arc::new(LocalStorage::open(config.storage_path()?).await?);
        let transport = HttpTransport::new(config.api.base_url.clone(), config.timeout())?;
        Ok(Self::new(transport, storage))
    }

    pub fn new(transport: HttpTransport, storage: Arc<LocalStorage>) -> Self {
        let tokens = Arc::new(FileTokenStore::new(storage.clone()));
        Self {
            client: ApiClient::new(transport, tokens),
            storage,
        }
    }

    pub async fn run(&self, command: Command, out: &mut dyn Write) -> Result<()> {
        debug!(?command, "running command");
        match command {
            Command::Help => writeln!(out, "{USAGE}")?,
            Command::Login { login } => {
                let password = read_password()?;
                self.login(&login, password, out).await?;
            }
            Command::Logout => self.logout(out).await?,
            Command::Whoami => self.whoami(out).await?,
            Command::Dashboard => self.dashboard(out).await?,
            Command::Subjects => self.subjects(out).await?,
            Command::Grades { subject_id } => self.grades(&subject_id, out).await?,
            Command::Schedule { scope, date } => {
                let date = date.unwrap_or_else(display::today);
                match scope {
                    ScheduleScope::Day => self.day_schedule(date, out).await?,
                    ScheduleScope::Week => self.week_schedule(date, out).await?,
                }
            }
            Command::Notifications { filter } => self.notifications(filter, out).await?,
            Command::Read { notification_id } => {
                let item = self.client.mark_notification_read(&notification_id).await?;
                writeln!(out, "Marked as read: {}", item.title)?;
            }
            Command::ReadAll => {
                let result = self.client.mark_all_notifications_read().await?;
                writeln!(out, "Marked {} notifications as read", result.updated)?;
            }
            Command::Settings(action) => self.settings(action, out).await?,
        }
        Ok(())
    }

    pub async fn login(&self, login: &str, password: Secret<String>, out: &mut dyn Write) -> Result<()> {
        let mut session = Session::new(self.client.clone());
        let user = session.login(&Credentials::new(login, password)).await?;
        writeln!(out, "Signed in as {} ({})", user.full_name(), user.role.as_str())?;
        Ok(())
    }

    async fn logout(&self, out: &mut dyn Write) -> Result<()> {
        Session::new(self.client.clone()).logout().await;
        writeln!(out, "Signed out")?;
        Ok(())
    }

    async fn whoami(&self, out: &mut dyn Write) -> Result<()> {
        if !self.client.is_authenticated().await {
            writeln!(out, "Not signed in")?;
            return Ok(());
        }
        let mut session = Session::new(self.client.clone());
        let user = session.refresh_user().await?;
        writeln!(out, "{}", user.full_name())?;
        writeln!(out, "login: {}", user.login)?;
        writeln!(out, "role:  {}", user.role.as_str())?;
        if let Some(class_name) = user.class_name.as_deref().or(user.class_id.as_deref()) {
            writeln!(out, "class: {class_name}")?;
        }
        Ok(())
    }

    async fn dashboard(&self, out: &mut dyn Write) -> Result<()> {
        let dashboard = self.client.dashboard().await?;
        let today = TodayInfo::now();
        writeln!(
            out,
            "{}, {}",
            today.weekday_full,
            today.date.format("%d.%m.%Y")
        )?;
        match dashboard.average_grade {
            Some(avg) => writeln!(out, "Average grade: {avg:.2} ({})", grade_label(avg))?,
            None => writeln!(out, "Average grade: —")?,
        }
        writeln!(out, "Lessons today: {}", dashboard.lessons_today)?;
        writeln!(out, "Unread notifications: {}", dashboard.unread_notifications)?;
        if !dashboard.today_schedule.is_empty() {
            writeln!(out)?;
            write_lessons(out, &dashboard.today_schedule)?;
        }
        Ok(())
    }

    async fn subjects(&self, out: &mut dyn Write) -> Result<()> {
        let subjects = self.client.subjects(&SubjectsQuery::default()).await?;
        if subjects.is_empty() {
            writeln!(out, "No subjects")?;
            return Ok(());
        }
        let mut cache = GradesCache::new();
        cache.fetch_subjects(&self.client, &subjects).await;

        for row in cache.subjects_with_grades(&subjects) {
            let grades: Vec<String> = row.grades.iter().map(u8::to_string).collect();
            writeln!(
                out,
                "{:<10} {:<24} {:>5}  {:<20} {}",
                row.subject.id,
                row.subject.name,
                format_average(row.average, row.grades.len()),
                row.teacher,
                grades.join(" ")
            )?;
        }
        let overall = cache.overall();
        writeln!(out)?;
        writeln!(
            out,
            "Overall: {} over {} grades (5: {}, 4: {}, 3: {})",
            format_average(overall.average, overall.total),
            overall.total,
            overall.fives,
            overall.fours,
            overall.threes
        )?;
        Ok(())
    }

    async fn grades(&self, subject_id: &str, out: &mut dyn Write) -> Result<()> {
        let mut cache = GradesCache::new();
        cache.fetch_subject(&self.client, subject_id).await;
        if let Some(message) = cache.error() {
            bail!("{message}");
        }
        let grades = cache.grades(subject_id);
        if grades.is_empty() {
            writeln!(out, "No grades yet")?;
            return Ok(());
        }
        for entry in grade_entries(grades) {
            match entry.comment {
                Some(comment) => writeln!(out, "{}  {}  {comment}", entry.date, entry.grade)?,
                None => writeln!(out, "{}  {}", entry.date, entry.grade)?,
            }
        }
        let stats = GradeStats::from_grades(grades);
        writeln!(
            out,
            "Average: {} ({})",
            format_average(stats.average, stats.total),
            GradeTier::from_average(stats.average).label()
        )?;
        Ok(())
    }

    async fn day_schedule(&self, date: NaiveDate, out: &mut dyn Write) -> Result<()> {
        let lessons = self
            .client
            .day_schedule(date, &ScheduleQuery::default())
            .await?;
        writeln!(out, "{}", date.format("%d.%m.%Y"))?;
        if lessons.is_empty() {
            writeln!(out, "No lessons")?;
        } else {
            write_lessons(out, &lessons)?;
        }
        Ok(())
    }

    async fn week_schedule(&self, date: NaiveDate, out: &mut dyn Write) -> Result<()> {
        let week = self
            .client
            .week_schedule(date, &ScheduleQuery::default())
            .await?;
        for day in build_calendar_week(date) {
            let lessons: Vec<LessonItem> = week
                .items
                .iter()
                .filter(|l| display::to_display(l.starts_at).date_naive() == day.date)
                .cloned()
                .collect();
            if day.is_disabled && lessons.is_empty() {
                continue;
            }
            writeln!(out, "{} {}", day.short_label, day.date.format("%d.%m"))?;
            if lessons.is_empty() {
                writeln!(out, "  no lessons")?;
            } else {
                write_lessons(out, &lessons)?;
            }
        }
        Ok(())
    }

    async fn notifications(&self, filter: NotificationFilterStatus, out: &mut dyn Write) -> Result<()> {
        let query = NotificationsQuery {
            status: (filter != NotificationFilterStatus::All).then_some(filter),
            page: None,
            limit: None,
        };
        let list = self.client.notifications(&query).await?;
        if list.items.is_empty() {
            writeln!(out, "No notifications")?;
            return Ok(());
        }
        for item in &list.items {
            let marker = if item.is_unread() { "*" } else { " " };
            writeln!(
                out,
                "{marker} {}  {}  {}",
                format_date(item.created_at),
                item.id,
                item.title
            )?;
            if !item.body.is_empty() {
                writeln!(out, "    {}", item.body)?;
            }
        }
        writeln!(out, "Page {} of {}, {} total", list.page, list.total_pages.max(1), list.total)?;
        Ok(())
    }

    async fn settings(&self, action: SettingsAction, out: &mut dyn Write) -> Result<()> {
        let mut store = SettingsStore::load(self.storage.clone()).await;
        let signed_in = self.client.is_authenticated().await;
        match action {
            SettingsAction::Show => {}
            SettingsAction::Sync => {
                if !signed_in {
                    bail!("Sign in to sync settings");
                }
                store.sync_from_server(&self.client).await?;
            }
            SettingsAction::Theme(mode) => {
                store.set_theme_mode(mode).await?;
                if signed_in {
                    store.push_to_server(&self.client).await?;
                }
            }
            SettingsAction::Notifications(enabled) => {
                store.set_notifications_enabled(enabled).await?;
                if signed_in {
                    store.push_to_server(&self.client).await?;
                }
            }
        }
        let settings = store.current();
        let toggles = settings.notifications;
        writeln!(out, "theme:         {}", settings.theme_mode)?;
        writeln!(out, "notifications: {}", on_off(toggles.enabled))?;
        writeln!(out, "  grades:        {}", on_off(toggles.grades))?;
        writeln!(out, "  homework:      {}", on_off(toggles.homework))?;
        writeln!(out, "  announcements: {}", on_off(toggles.announcements))?;
        Ok(())
    }
}

fn write_lessons(out: &mut dyn Write, lessons: &[LessonItem]) -> Result<()> {
    for lesson in lessons {
        let room = lesson.room.as_deref().unwrap_or("—");
        writeln!(
            out,
            "  {}  {:<24} room {:<6} {}",
            format_time_range(lesson.starts_at, lesson.ends_at),
            lesson.subject.name,
            room,
            lesson_teacher_name(&lesson.teacher)
        )?;
    }
    Ok(())
}

fn format_average(average: f64, count: usize) -> String {
    if count == 0 {
        "—".to_string()
    } else {
        format!("{average:.2}")
    }
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

fn read_password() -> Result<Secret<String>> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(Secret::new(password));
    }
    let password = rpassword::prompt_password("Password: ")?;
    Ok(Secret::new(password))
}
