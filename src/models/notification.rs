use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::{NotificationType, Priority};

/// Fire-and-forget message row. Nothing delivers it anywhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub notification_id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub message: String,
    pub sent_date: NaiveDateTime,
    pub is_read: bool,
    pub priority: Priority,
}
