//! Notification rows. Writing one is the whole delivery story.

use rusqlite::Connection;
use serde::Deserialize;

use crate::db;
use crate::error::{ServiceError, ValidationErrors};
use crate::ids;
use crate::models::enums::{NotificationType, Priority};
use crate::models::{timestamp_now, Notification};
use crate::validation::{optional_text, required_choice, required_text};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationInput {
    pub notification_id: Option<String>,
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub notification_type: Option<String>,
    pub message: Option<String>,
    pub priority: Option<String>,
    pub is_read: Option<bool>,
}

/// Insert an unread notification for `user_id`.
///
/// Callers pass their own transaction so the notification commits or rolls
/// back with the write that triggered it.
pub fn notify(
    conn: &Connection,
    user_id: &str,
    notification_type: NotificationType,
    priority: Priority,
    message: String,
) -> Result<Notification, ServiceError> {
    let notification = Notification {
        notification_id: ids::generate(ids::NOTIFICATION),
        user_id: user_id.to_string(),
        notification_type,
        message,
        sent_date: timestamp_now(),
        is_read: false,
        priority,
    };
    db::insert_notification(conn, &notification)?;
    tracing::debug!(
        notification_id = %notification.notification_id,
        user_id,
        kind = %notification_type,
        "Notification queued"
    );
    Ok(notification)
}

pub fn create_notification(
    conn: &Connection,
    input: NotificationInput,
) -> Result<Notification, ServiceError> {
    let mut errors = ValidationErrors::new();
    let user_id = required_text(&mut errors, "user_id", input.user_id);
    let notification_type = required_choice::<NotificationType>(
        &mut errors,
        "type",
        input.notification_type,
        NotificationType::choices(),
    );
    let message = required_text(&mut errors, "message", input.message);
    let priority = match optional_text(input.priority) {
        None => Some(Priority::default()),
        Some(raw) => required_choice::<Priority>(&mut errors, "priority", Some(raw), Priority::choices()),
    };

    let (Some(user_id), Some(notification_type), Some(message), Some(priority)) =
        (user_id, notification_type, message, priority)
    else {
        return Err(ServiceError::Validation(errors));
    };

    let notification = Notification {
        notification_id: ids::or_generate(input.notification_id, ids::NOTIFICATION),
        user_id,
        notification_type,
        message,
        sent_date: timestamp_now(),
        is_read: input.is_read.unwrap_or(false),
        priority,
    };
    db::insert_notification(conn, &notification).map_err(|e| {
        if e.is_unique_violation() {
            ServiceError::field("notification_id", "A notification with this id already exists.")
        } else {
            ServiceError::Database(e)
        }
    })?;
    Ok(notification)
}

pub fn get_notification(conn: &Connection, notification_id: &str) -> Result<Notification, ServiceError> {
    db::get_notification(conn, notification_id)?
        .ok_or_else(|| ServiceError::not_found("Notification", notification_id))
}

/// Notifications addressed to `user_id`, newest first.
pub fn user_notifications(
    conn: &Connection,
    user_id: Option<&str>,
) -> Result<Vec<Notification>, ServiceError> {
    let user_id = user_id.map(str::trim).filter(|u| !u.is_empty()).ok_or_else(|| {
        ServiceError::field("user_id", "The user_id query parameter is required.")
    })?;
    Ok(db::list_notifications_for_user(conn, user_id)?)
}

pub fn mark_read(conn: &Connection, notification_id: &str) -> Result<Notification, ServiceError> {
    if !db::mark_notification_read(conn, notification_id)? {
        return Err(ServiceError::not_found("Notification", notification_id));
    }
    get_notification(conn, notification_id)
}

pub fn update_notification(
    conn: &Connection,
    notification_id: &str,
    input: NotificationInput,
) -> Result<Notification, ServiceError> {
    let mut notification = get_notification(conn, notification_id)?;
    let mut errors = ValidationErrors::new();

    if input.user_id.is_some() {
        if let Some(user_id) = required_text(&mut errors, "user_id", input.user_id) {
            notification.user_id = user_id;
        }
    }
    if input.notification_type.is_some() {
        if let Some(kind) = required_choice(
            &mut errors,
            "type",
            input.notification_type,
            NotificationType::choices(),
        ) {
            notification.notification_type = kind;
        }
    }
    if input.message.is_some() {
        if let Some(message) = required_text(&mut errors, "message", input.message) {
            notification.message = message;
        }
    }
    if input.priority.is_some() {
        if let Some(priority) =
            required_choice(&mut errors, "priority", input.priority, Priority::choices())
        {
            notification.priority = priority;
        }
    }
    if let Some(is_read) = input.is_read {
        notification.is_read = is_read;
    }
    errors.into_result()?;

    db::update_notification(conn, &notification)?;
    Ok(notification)
}

pub fn delete_notification(conn: &Connection, notification_id: &str) -> Result<(), ServiceError> {
    if db::delete_notification(conn, notification_id)? {
        Ok(())
    } else {
        Err(ServiceError::not_found("Notification", notification_id))
    }
}
