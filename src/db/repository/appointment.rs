use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::enums::AppointmentStatus;
use crate::models::*;

const APPOINTMENT_COLUMNS: &str =
    "appointment_id, patient_id, doctor_id, appointment_date, time_slot_id, specialty,
     reason_for_visit, status, notes, created_at, updated_at";

pub fn insert_appointment(conn: &Connection, appt: &Appointment) -> Result<(), DatabaseError> {
    conn.execute(
        &format!(
            "INSERT INTO appointments ({APPOINTMENT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
        ),
        params![
            appt.appointment_id,
            appt.patient_id,
            appt.doctor_id,
            appt.appointment_date,
            appt.time_slot_id,
            appt.specialty,
            appt.reason_for_visit,
            appt.status.as_str(),
            appt.notes,
            appt.created_at,
            appt.updated_at,
        ],
    )?;
    Ok(())
}

pub fn get_appointment(
    conn: &Connection,
    appointment_id: &str,
) -> Result<Option<Appointment>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE appointment_id = ?1"),
            params![appointment_id],
            appointment_row,
        )
        .optional()?;
    row.map(appointment_from_row).transpose()
}

pub fn list_appointments(conn: &Connection) -> Result<Vec<Appointment>, DatabaseError> {
    query_appointments(
        conn,
        &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments ORDER BY appointment_date, rowid"),
        None,
    )
}

pub fn list_appointments_for_patient(
    conn: &Connection,
    patient_id: &str,
) -> Result<Vec<Appointment>, DatabaseError> {
    query_appointments(
        conn,
        &format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE patient_id = ?1
             ORDER BY appointment_date, rowid"
        ),
        Some(patient_id),
    )
}

pub fn list_appointments_for_doctor(
    conn: &Connection,
    doctor_id: &str,
) -> Result<Vec<Appointment>, DatabaseError> {
    query_appointments(
        conn,
        &format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE doctor_id = ?1
             ORDER BY appointment_date, rowid"
        ),
        Some(doctor_id),
    )
}

/// Persist every mutable column of an appointment.
pub fn update_appointment(conn: &Connection, appt: &Appointment) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET patient_id = ?2, doctor_id = ?3, appointment_date = ?4,
         time_slot_id = ?5, specialty = ?6, reason_for_visit = ?7, status = ?8, notes = ?9,
         updated_at = ?10
         WHERE appointment_id = ?1",
        params![
            appt.appointment_id,
            appt.patient_id,
            appt.doctor_id,
            appt.appointment_date,
            appt.time_slot_id,
            appt.specialty,
            appt.reason_for_visit,
            appt.status.as_str(),
            appt.notes,
            appt.updated_at,
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Appointment".into(),
            id: appt.appointment_id.clone(),
        });
    }
    Ok(())
}

pub fn update_appointment_status(
    conn: &Connection,
    appointment_id: &str,
    status: AppointmentStatus,
    updated_at: NaiveDateTime,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET status = ?2, updated_at = ?3 WHERE appointment_id = ?1",
        params![appointment_id, status.as_str(), updated_at],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Appointment".into(),
            id: appointment_id.into(),
        });
    }
    Ok(())
}

pub fn delete_appointment(conn: &Connection, appointment_id: &str) -> Result<bool, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM appointments WHERE appointment_id = ?1",
        params![appointment_id],
    )?;
    Ok(deleted > 0)
}

pub fn count_appointments(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM appointments", [], |row| row.get(0))?)
}

pub fn count_appointments_by_status(
    conn: &Connection,
    status: AppointmentStatus,
) -> Result<i64, DatabaseError> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM appointments WHERE status = ?1",
        params![status.as_str()],
        |row| row.get(0),
    )?)
}

/// Whether a pending or confirmed appointment references the slot.
pub fn slot_has_active_appointment(conn: &Connection, slot_id: &str) -> Result<bool, DatabaseError> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM appointments
         WHERE time_slot_id = ?1 AND status IN (?2, ?3))",
        params![
            slot_id,
            AppointmentStatus::Pending.as_str(),
            AppointmentStatus::Confirmed.as_str()
        ],
        |row| row.get(0),
    )?)
}

fn query_appointments(
    conn: &Connection,
    sql: &str,
    filter: Option<&str>,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = match filter {
        Some(value) => stmt
            .query_map(params![value], appointment_row)?
            .collect::<Result<Vec<_>, _>>()?,
        None => stmt
            .query_map([], appointment_row)?
            .collect::<Result<Vec<_>, _>>()?,
    };
    rows.into_iter().map(appointment_from_row).collect()
}

// Internal row type; status is parsed outside the rusqlite closure
struct AppointmentRow {
    appointment_id: String,
    patient_id: String,
    doctor_id: String,
    appointment_date: NaiveDateTime,
    time_slot_id: String,
    specialty: String,
    reason_for_visit: String,
    status: String,
    notes: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

fn appointment_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AppointmentRow> {
    Ok(AppointmentRow {
        appointment_id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        appointment_date: row.get(3)?,
        time_slot_id: row.get(4)?,
        specialty: row.get(5)?,
        reason_for_visit: row.get(6)?,
        status: row.get(7)?,
        notes: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn appointment_from_row(row: AppointmentRow) -> Result<Appointment, DatabaseError> {
    Ok(Appointment {
        appointment_id: row.appointment_id,
        patient_id: row.patient_id,
        doctor_id: row.doctor_id,
        appointment_date: row.appointment_date,
        time_slot_id: row.time_slot_id,
        specialty: row.specialty,
        reason_for_visit: row.reason_for_visit,
        status: AppointmentStatus::from_str(&row.status)?,
        notes: row.notes,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}
