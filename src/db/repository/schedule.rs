use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::*;

use super::time_slot::time_slot_from_row;

/// Insert the schedule row. Linked slots are added with [`link_schedule_slot`].
pub fn insert_schedule(conn: &Connection, schedule: &Schedule) -> Result<(), DatabaseError> {
    let working_days = serde_json::to_string(&schedule.working_days).map_err(|e| {
        DatabaseError::InvalidJson {
            column: "working_days".into(),
            reason: e.to_string(),
        }
    })?;
    conn.execute(
        "INSERT INTO schedules (schedule_id, doctor_id, working_days, start_time, end_time)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            schedule.schedule_id,
            schedule.doctor_id,
            working_days,
            schedule.start_time,
            schedule.end_time,
        ],
    )?;
    Ok(())
}

pub fn get_schedule(conn: &Connection, schedule_id: &str) -> Result<Option<Schedule>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT schedule_id, doctor_id, working_days, start_time, end_time
             FROM schedules WHERE schedule_id = ?1",
            params![schedule_id],
            schedule_row,
        )
        .optional()?;
    match row {
        Some(row) => Ok(Some(schedule_from_row(conn, row)?)),
        None => Ok(None),
    }
}

pub fn list_schedules_for_doctor(
    conn: &Connection,
    doctor_id: &str,
) -> Result<Vec<Schedule>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT schedule_id, doctor_id, working_days, start_time, end_time
         FROM schedules WHERE doctor_id = ?1 ORDER BY rowid",
    )?;
    let rows = stmt
        .query_map(params![doctor_id], schedule_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter()
        .map(|row| schedule_from_row(conn, row))
        .collect()
}

pub fn link_schedule_slot(
    conn: &Connection,
    schedule_id: &str,
    slot_id: &str,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT OR IGNORE INTO schedule_slots (schedule_id, slot_id) VALUES (?1, ?2)",
        params![schedule_id, slot_id],
    )?;
    Ok(())
}

/// Linked slots that are still open for booking.
pub fn get_available_schedule_slots(
    conn: &Connection,
    schedule_id: &str,
) -> Result<Vec<TimeSlot>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT t.slot_id, t.start_time, t.end_time, t.is_available
         FROM schedule_slots s JOIN time_slots t ON t.slot_id = s.slot_id
         WHERE s.schedule_id = ?1 AND t.is_available = 1
         ORDER BY t.start_time, t.slot_id",
    )?;
    let rows = stmt.query_map(params![schedule_id], time_slot_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

struct ScheduleRow {
    schedule_id: String,
    doctor_id: String,
    working_days: String,
    start_time: chrono::NaiveTime,
    end_time: chrono::NaiveTime,
}

fn schedule_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ScheduleRow> {
    Ok(ScheduleRow {
        schedule_id: row.get(0)?,
        doctor_id: row.get(1)?,
        working_days: row.get(2)?,
        start_time: row.get(3)?,
        end_time: row.get(4)?,
    })
}

fn schedule_from_row(conn: &Connection, row: ScheduleRow) -> Result<Schedule, DatabaseError> {
    let working_days: Vec<String> =
        serde_json::from_str(&row.working_days).map_err(|e| DatabaseError::InvalidJson {
            column: "working_days".into(),
            reason: e.to_string(),
        })?;
    let available_slots = get_available_schedule_slots(conn, &row.schedule_id)?;
    Ok(Schedule {
        schedule_id: row.schedule_id,
        doctor_id: row.doctor_id,
        working_days,
        start_time: row.start_time,
        end_time: row.end_time,
        available_slots,
    })
}
