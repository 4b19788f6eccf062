//! User settings persisted in local storage
//!
//! Settings live under `settings-storage` in the shared storage file and are
//! written back after every change. The backend keeps its own copy;
//! `sync_from_server` and `push_to_server` reconcile the two explicitly.

use std::sync::Arc;

use gradebook_auth::{LocalStorage, SETTINGS_KEY};
use gradebook_client::ApiClient;
use gradebook_client::models::{
    NotificationsSettings, SettingsResponse, ThemeMode, UpdateSettingsRequest,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationToggles {
    pub enabled: bool,
    pub grades: bool,
    pub homework: bool,
    pub announcements: bool,
}

impl Default for NotificationToggles {
    fn default() -> Self {
        Self {
            enabled: true,
            grades: true,
            homework: true,
            announcements: true,
        }
    }
}

impl NotificationToggles {
    /// Overwrite the fields present in `patch`.
    pub fn apply(&mut self, patch: &NotificationsSettings) {
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
        if let Some(grades) = patch.grades {
            self.grades = grades;
        }
        if let Some(homework) = patch.homework {
            self.homework = homework;
        }
        if let Some(announcements) = patch.announcements {
            self.announcements = announcements;
        }
    }

    pub fn is_enabled(&self, kind: NotificationKind) -> bool {
        self.enabled
            && match kind {
                NotificationKind::Grades => self.grades,
                NotificationKind::Homework => self.homework,
                NotificationKind::Announcements => self.announcements,
            }
    }
}

impl From<NotificationToggles> for NotificationsSettings {
    fn from(toggles: NotificationToggles) -> Self {
        Self {
            enabled: Some(toggles.enabled),
            grades: Some(toggles.grades),
            homework: Some(toggles.homework),
            announcements: Some(toggles.announcements),
        }
    }
}

/// Notification category with its own toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Grades,
    Homework,
    Announcements,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub theme_mode: ThemeMode,
    pub notifications: NotificationToggles,
}

impl Settings {
    fn merge_server(&mut self, server: &SettingsResponse) {
        self.theme_mode = server.theme_mode;
        self.notifications.apply(&server.notifications);
    }
}

impl From<&Settings> for UpdateSettingsRequest {
    fn from(settings: &Settings) -> Self {
        Self {
            theme_mode: Some(settings.theme_mode),
            notifications: Some(settings.notifications.into()),
        }
    }
}

/// Current settings plus the storage they persist to.
pub struct SettingsStore {
    storage: Arc<LocalStorage>,
    current: Settings,
}

impl SettingsStore {
    /// Load persisted settings. A missing or unreadable entry yields the
    /// defaults.
    pub async fn load(storage: Arc<LocalStorage>) -> Self {
        let current = match storage.get_json::<Settings>(SETTINGS_KEY).await {
            Ok(Some(settings)) => settings,
            Ok(None) => Settings::default(),
            Err(e) => {
                warn!(error = %e, "ignoring unreadable settings, using defaults");
                Settings::default()
            }
        };
        Self { storage, current }
    }

    pub fn current(&self) -> &Settings {
        &self.current
    }

    async fn persist(&self) -> Result<()> {
        self.storage.set_json(SETTINGS_KEY, &self.current).await?;
        debug!(theme = %self.current.theme_mode, "settings saved");
        Ok(())
    }

    pub async fn set_theme_mode(&mut self, mode: ThemeMode) -> Result<()> {
        self.current.theme_mode = mode;
        self.persist().await
    }

    pub async fn set_notifications_enabled(&mut self, enabled: bool) -> Result<()> {
        self.current.notifications.enabled = enabled;
        self.persist().await
    }

    pub async fn set_notification_kind(&mut self, kind: NotificationKind, enabled: bool) -> Result<()> {
        let toggles = &mut self.current.notifications;
        match kind {
            NotificationKind::Grades => toggles.grades = enabled,
            NotificationKind::Homework => toggles.homework = enabled,
            NotificationKind::Announcements => toggles.announcements = enabled,
        }
        self.persist().await
    }

    pub async fn patch_notifications(&mut self, patch: &NotificationsSettings) -> Result<()> {
        self.current.notifications.apply(patch);
        self.persist().await
    }

    /// Back to defaults: system theme, every notification on.
    pub async fn reset(&mut self) -> Result<()> {
        self.current = Settings::default();
        self.persist().await
    }

    /// Adopt the backend's settings; fields it omits keep their local value.
    pub async fn sync_from_server(&mut self, client: &ApiClient) -> Result<&Settings> {
        let server = client.settings().await?;
        self.current.merge_server(&server);
        self.persist().await?;
        info!(theme = %self.current.theme_mode, "settings synced from server");
        Ok(&self.current)
    }

    /// Send the local settings to the backend and keep what it stored.
    pub async fn push_to_server(&mut self, client: &ApiClient) -> Result<&Settings> {
        let server = client
            .update_settings(&UpdateSettingsRequest::from(&self.current))
            .await?;
        self.current.merge_server(&server);
        self.persist().await?;
        info!("settings pushed to server");
        Ok(&self.current)
    }
}
