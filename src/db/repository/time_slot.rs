use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_time_slot(conn: &Connection, slot: &TimeSlot) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO time_slots (slot_id, start_time, end_time, is_available)
         VALUES (?1, ?2, ?3, ?4)",
        params![slot.slot_id, slot.start_time, slot.end_time, slot.is_available],
    )?;
    Ok(())
}

pub fn get_time_slot(conn: &Connection, slot_id: &str) -> Result<Option<TimeSlot>, DatabaseError> {
    let slot = conn
        .query_row(
            "SELECT slot_id, start_time, end_time, is_available FROM time_slots WHERE slot_id = ?1",
            params![slot_id],
            time_slot_from_row,
        )
        .optional()?;
    Ok(slot)
}

pub fn list_time_slots(conn: &Connection) -> Result<Vec<TimeSlot>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT slot_id, start_time, end_time, is_available FROM time_slots
         ORDER BY start_time, slot_id",
    )?;
    let rows = stmt.query_map([], time_slot_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn list_available_time_slots(conn: &Connection) -> Result<Vec<TimeSlot>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT slot_id, start_time, end_time, is_available FROM time_slots
         WHERE is_available = 1 ORDER BY start_time, slot_id",
    )?;
    let rows = stmt.query_map([], time_slot_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn update_time_slot(conn: &Connection, slot: &TimeSlot) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE time_slots SET start_time = ?2, end_time = ?3, is_available = ?4 WHERE slot_id = ?1",
        params![slot.slot_id, slot.start_time, slot.end_time, slot.is_available],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "TimeSlot".into(),
            id: slot.slot_id.clone(),
        });
    }
    Ok(())
}

pub fn delete_time_slot(conn: &Connection, slot_id: &str) -> Result<bool, DatabaseError> {
    let deleted = conn.execute("DELETE FROM time_slots WHERE slot_id = ?1", params![slot_id])?;
    Ok(deleted > 0)
}

/// Claim a slot only if it is still available.
///
/// Returns `false` when the slot is missing or already taken. The check and
/// the write are one statement, so two callers can never both win.
pub fn try_reserve_time_slot(conn: &Connection, slot_id: &str) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE time_slots SET is_available = 0 WHERE slot_id = ?1 AND is_available = 1",
        params![slot_id],
    )?;
    Ok(changed == 1)
}

/// Mark a slot available again. Idempotent.
pub fn release_time_slot(conn: &Connection, slot_id: &str) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE time_slots SET is_available = 1 WHERE slot_id = ?1",
        params![slot_id],
    )?;
    Ok(())
}

pub fn count_available_time_slots(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM time_slots WHERE is_available = 1",
        [],
        |row| row.get(0),
    )?)
}

pub(super) fn time_slot_from_row(row: &Row<'_>) -> rusqlite::Result<TimeSlot> {
    Ok(TimeSlot {
        slot_id: row.get(0)?,
        start_time: row.get(1)?,
        end_time: row.get(2)?,
        is_available: row.get(3)?,
    })
}
