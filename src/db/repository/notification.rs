use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::enums::{NotificationType, Priority};
use crate::models::*;

const NOTIFICATION_COLUMNS: &str =
    "notification_id, user_id, type, message, sent_date, is_read, priority";

pub fn insert_notification(conn: &Connection, n: &Notification) -> Result<(), DatabaseError> {
    conn.execute(
        &format!(
            "INSERT INTO notifications ({NOTIFICATION_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
        ),
        params![
            n.notification_id,
            n.user_id,
            n.notification_type.as_str(),
            n.message,
            n.sent_date,
            n.is_read,
            n.priority.as_str(),
        ],
    )?;
    Ok(())
}

pub fn get_notification(
    conn: &Connection,
    notification_id: &str,
) -> Result<Option<Notification>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE notification_id = ?1"),
            params![notification_id],
            notification_row,
        )
        .optional()?;
    row.map(notification_from_row).transpose()
}

pub fn list_notifications(conn: &Connection) -> Result<Vec<Notification>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM notifications ORDER BY sent_date DESC, rowid DESC"
    ))?;
    let rows = stmt
        .query_map([], notification_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(notification_from_row).collect()
}

/// Notifications for one user, newest first.
pub fn list_notifications_for_user(
    conn: &Connection,
    user_id: &str,
) -> Result<Vec<Notification>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE user_id = ?1
         ORDER BY sent_date DESC, rowid DESC"
    ))?;
    let rows = stmt
        .query_map(params![user_id], notification_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(notification_from_row).collect()
}

pub fn update_notification(conn: &Connection, n: &Notification) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE notifications SET user_id = ?2, type = ?3, message = ?4, is_read = ?5, priority = ?6
         WHERE notification_id = ?1",
        params![
            n.notification_id,
            n.user_id,
            n.notification_type.as_str(),
            n.message,
            n.is_read,
            n.priority.as_str(),
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Notification".into(),
            id: n.notification_id.clone(),
        });
    }
    Ok(())
}

pub fn mark_notification_read(conn: &Connection, notification_id: &str) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE notifications SET is_read = 1 WHERE notification_id = ?1",
        params![notification_id],
    )?;
    Ok(changed > 0)
}

pub fn delete_notification(conn: &Connection, notification_id: &str) -> Result<bool, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM notifications WHERE notification_id = ?1",
        params![notification_id],
    )?;
    Ok(deleted > 0)
}

pub fn count_unread_notifications(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM notifications WHERE is_read = 0",
        [],
        |row| row.get(0),
    )?)
}

struct NotificationRow {
    notification_id: String,
    user_id: String,
    notification_type: String,
    message: String,
    sent_date: NaiveDateTime,
    is_read: bool,
    priority: String,
}

fn notification_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<NotificationRow> {
    Ok(NotificationRow {
        notification_id: row.get(0)?,
        user_id: row.get(1)?,
        notification_type: row.get(2)?,
        message: row.get(3)?,
        sent_date: row.get(4)?,
        is_read: row.get(5)?,
        priority: row.get(6)?,
    })
}

fn notification_from_row(row: NotificationRow) -> Result<Notification, DatabaseError> {
    Ok(Notification {
        notification_id: row.notification_id,
        user_id: row.user_id,
        notification_type: NotificationType::from_str(&row.notification_type)?,
        message: row.message,
        sent_date: row.sent_date,
        is_read: row.is_read,
        priority: Priority::from_str(&row.priority)?,
    })
}
