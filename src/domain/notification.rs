//! Mini-app notification records and lifecycle events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Key under which a user's push token is stored
pub fn notification_key(miniapp_id: &str, fid: u64) -> String {
    format!("notification:{}:{}", miniapp_id, fid)
}

/// Key pattern matching every record of one mini-app
pub fn notification_key_pattern(miniapp_id: &str) -> String {
    format!("notification:{}:*", miniapp_id)
}

/// Stored push-notification token for one (mini-app, user) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationTokenData {
    pub token: String,
    pub url: String,
    pub miniapp_id: String,
    pub fid: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NotificationTokenData {
    pub fn new(miniapp_id: &str, fid: u64, details: &NotificationDetails, now: DateTime<Utc>) -> Self {
        Self {
            token: details.token.clone(),
            url: details.url.clone(),
            miniapp_id: miniapp_id.to_string(),
            fid,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace token and url, keeping the original creation time
    pub fn refreshed(mut self, details: &NotificationDetails, now: DateTime<Utc>) -> Self {
        self.token = details.token.clone();
        self.url = details.url.clone();
        self.updated_at = now;
        self
    }

    pub fn key(&self) -> String {
        notification_key(&self.miniapp_id, self.fid)
    }
}

/// Token and delivery URL handed out by the host when notifications are on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationDetails {
    pub url: String,
    pub token: String,
}

/// Lifecycle event carried in a signed webhook payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MiniAppEvent {
    #[serde(alias = "frame_added")]
    MiniappAdded {
        #[serde(rename = "notificationDetails", default, skip_serializing_if = "Option::is_none")]
        notification_details: Option<NotificationDetails>,
    },
    #[serde(alias = "frame_removed")]
    MiniappRemoved,
    NotificationsEnabled {
        #[serde(rename = "notificationDetails")]
        notification_details: NotificationDetails,
    },
    NotificationsDisabled,
    #[serde(other)]
    Unknown,
}

impl MiniAppEvent {
    pub fn name(&self) -> &'static str {
        match self {
            MiniAppEvent::MiniappAdded { .. } => "miniapp_added",
            MiniAppEvent::MiniappRemoved => "miniapp_removed",
            MiniAppEvent::NotificationsEnabled { .. } => "notifications_enabled",
            MiniAppEvent::NotificationsDisabled => "notifications_disabled",
            MiniAppEvent::Unknown => "unknown",
        }
    }
}

/// Event whose signature and app key have been checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedEvent {
    /// User that triggered the event
    pub fid: u64,
    /// Fid owning the app key that signed it
    pub app_fid: u64,
    pub event: MiniAppEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details() -> NotificationDetails {
        NotificationDetails { url: "https://api.example.com/notify".into(), token: "tok-1".into() }
    }

    #[test]
    fn test_key_format() {
        assert_eq!(notification_key("basebubbles", 42), "notification:basebubbles:42");
        assert_eq!(notification_key_pattern("basebubbles"), "notification:basebubbles:*");
    }

    #[test]
    fn test_refresh_keeps_created_at() {
        let t0 = DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
        let t1 = DateTime::parse_from_rfc3339("2025-02-01T00:00:00Z").unwrap().with_timezone(&Utc);
        let record = NotificationTokenData::new("app", 7, &details(), t0);

        let next = NotificationDetails { url: "https://other".into(), token: "tok-2".into() };
        let refreshed = record.refreshed(&next, t1);

        assert_eq!(refreshed.created_at, t0);
        assert_eq!(refreshed.updated_at, t1);
        assert_eq!(refreshed.token, "tok-2");
    }

    #[test]
    fn test_event_parsing() {
        let added: MiniAppEvent = serde_json::from_str(
            r#"{"event":"miniapp_added","notificationDetails":{"url":"https://u","token":"t"}}"#,
        )
        .unwrap();
        assert!(matches!(added, MiniAppEvent::MiniappAdded { notification_details: Some(_) }));

        let bare: MiniAppEvent = serde_json::from_str(r#"{"event":"miniapp_added"}"#).unwrap();
        assert_eq!(bare, MiniAppEvent::MiniappAdded { notification_details: None });

        let legacy: MiniAppEvent = serde_json::from_str(r#"{"event":"frame_removed"}"#).unwrap();
        assert_eq!(legacy, MiniAppEvent::MiniappRemoved);

        let disabled: MiniAppEvent = serde_json::from_str(r#"{"event":"notifications_disabled"}"#).unwrap();
        assert_eq!(disabled.name(), "notifications_disabled");

        let other: MiniAppEvent = serde_json::from_str(r#"{"event":"something_new"}"#).unwrap();
        assert_eq!(other, MiniAppEvent::Unknown);
    }

    #[test]
    fn test_enabled_requires_details() {
        let result = serde_json::from_str::<MiniAppEvent>(r#"{"event":"notifications_enabled"}"#);
        assert!(result.is_err());
    }
}
