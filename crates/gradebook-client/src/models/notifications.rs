use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Grade,
    Homework,
    Announcement,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Unread,
    Read,
}

/// `status` filter of the notification list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NotificationFilterStatus {
    #[default]
    All,
    Read,
    Unread,
}

impl NotificationFilterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationFilterStatus::All => "all",
            NotificationFilterStatus::Read => "read",
            NotificationFilterStatus::Unread => "unread",
        }
    }
}

impl fmt::Display for NotificationFilterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationFilterStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "read" => Ok(Self::Read),
            "unread" => Ok(Self::Unread),
            other => Err(format!("unknown notification filter: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationItem {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub body: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub status: NotificationStatus,
    #[serde(default)]
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NotificationItem {
    pub fn is_unread(&self) -> bool {
        self.status == NotificationStatus::Unread
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsListResponse {
    pub items: Vec<NotificationItem>,
    pub page: u32,
    pub limit: u32,
    pub total: u32,
    pub total_pages: u32,
}

/// Query for `GET /notifications`. The backend caps `limit` at 100.
#[derive(Debug, Clone, Default)]
pub struct NotificationsQuery {
    pub status: Option<NotificationFilterStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct NotificationsReadAllResponse {
    pub updated: u32,
}
