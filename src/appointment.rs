//! Appointment booking and lifecycle.
//!
//! An active appointment (pending or confirmed) holds its time slot. Every
//! operation that claims or frees a slot runs in one transaction and claims
//! with a conditional update, so a slot can never back two active bookings.

use rusqlite::Connection;
use serde::Deserialize;

use crate::db;
use crate::error::{ServiceError, ValidationErrors};
use crate::ids;
use crate::models::enums::{AppointmentStatus, NotificationType, Priority};
use crate::models::{timestamp_now, Appointment, AppointmentView, TimeSlot};
use crate::notifications::notify;
use crate::validation::{optional_text, required_choice, required_datetime, required_text};

const SLOT_TAKEN: &str = "This time slot is not available.";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentInput {
    pub appointment_id: Option<String>,
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
    pub appointment_date: Option<String>,
    pub time_slot_id: Option<String>,
    pub specialty: Option<String>,
    pub reason_for_visit: Option<String>,
    pub notes: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RescheduleInput {
    pub time_slot_id: Option<String>,
    /// Defaults to the new slot's start time.
    pub appointment_date: Option<String>,
}

/// Book a slot for a patient. The new appointment starts out pending.
pub fn book_appointment(
    conn: &Connection,
    input: AppointmentInput,
) -> Result<AppointmentView, ServiceError> {
    let mut errors = ValidationErrors::new();
    let patient_id = required_text(&mut errors, "patient_id", input.patient_id);
    let doctor_id = required_text(&mut errors, "doctor_id", input.doctor_id);
    let appointment_date = required_datetime(&mut errors, "appointment_date", input.appointment_date);
    let time_slot_id = required_text(&mut errors, "time_slot_id", input.time_slot_id);
    let specialty = required_text(&mut errors, "specialty", input.specialty);
    let reason_for_visit = required_text(&mut errors, "reason_for_visit", input.reason_for_visit);

    if let Some(id) = patient_id.as_deref() {
        if !db::patient_exists(conn, id)? {
            errors.add("patient_id", format!("Patient \"{id}\" does not exist."));
        }
    }
    if let Some(id) = doctor_id.as_deref() {
        if !db::doctor_exists(conn, id)? {
            errors.add("doctor_id", format!("Doctor \"{id}\" does not exist."));
        }
    }
    if let Some(id) = time_slot_id.as_deref() {
        if db::get_time_slot(conn, id)?.is_none() {
            errors.add("time_slot_id", format!("Time slot \"{id}\" does not exist."));
        }
    }

    let (
        Some(patient_id),
        Some(doctor_id),
        Some(appointment_date),
        Some(time_slot_id),
        Some(specialty),
        Some(reason_for_visit),
    ) = (patient_id, doctor_id, appointment_date, time_slot_id, specialty, reason_for_visit)
    else {
        return Err(ServiceError::Validation(errors));
    };
    errors.into_result()?;

    let now = timestamp_now();
    let appointment = Appointment {
        appointment_id: ids::or_generate(input.appointment_id, ids::APPOINTMENT),
        patient_id,
        doctor_id,
        appointment_date,
        time_slot_id,
        specialty,
        reason_for_visit,
        status: AppointmentStatus::Pending,
        notes: optional_text(input.notes),
        created_at: now,
        updated_at: now,
    };

    let tx = conn.unchecked_transaction()?;
    if !db::try_reserve_time_slot(&tx, &appointment.time_slot_id)? {
        return Err(ServiceError::field("time_slot_id", SLOT_TAKEN));
    }
    db::insert_appointment(&tx, &appointment).map_err(|e| {
        if e.is_unique_violation() {
            ServiceError::field("appointment_id", "An appointment with this id already exists.")
        } else {
            ServiceError::Database(e)
        }
    })?;
    notify(
        &tx,
        &appointment.patient_id,
        NotificationType::AppointmentConfirmation,
        Priority::High,
        format!("Your appointment has been booked for {}", appointment.appointment_date),
    )?;
    let view = view_of(&tx, appointment)?;
    tx.commit()?;

    tracing::info!(
        appointment_id = %view.appointment_id,
        slot_id = view.time_slot.as_ref().map(|s| s.slot_id.as_str()).unwrap_or_default(),
        "Appointment booked"
    );
    Ok(view)
}

pub fn get_appointment(conn: &Connection, appointment_id: &str) -> Result<AppointmentView, ServiceError> {
    let appointment = load(conn, appointment_id)?;
    view_of(conn, appointment)
}

pub fn list_appointments(conn: &Connection) -> Result<Vec<AppointmentView>, ServiceError> {
    views_of(conn, db::list_appointments(conn)?)
}

pub fn patient_appointments(
    conn: &Connection,
    patient_id: &str,
) -> Result<Vec<AppointmentView>, ServiceError> {
    if !db::patient_exists(conn, patient_id)? {
        return Err(ServiceError::not_found("Patient", patient_id));
    }
    views_of(conn, db::list_appointments_for_patient(conn, patient_id)?)
}

pub fn doctor_appointments(
    conn: &Connection,
    doctor_id: &str,
) -> Result<Vec<AppointmentView>, ServiceError> {
    if !db::doctor_exists(conn, doctor_id)? {
        return Err(ServiceError::not_found("Doctor", doctor_id));
    }
    views_of(conn, db::list_appointments_for_doctor(conn, doctor_id)?)
}

pub fn confirm(conn: &Connection, appointment_id: &str) -> Result<Appointment, ServiceError> {
    transition(conn, appointment_id, AppointmentStatus::Confirmed)
}

/// Cancel and hand the slot back.
pub fn cancel(conn: &Connection, appointment_id: &str) -> Result<Appointment, ServiceError> {
    transition(conn, appointment_id, AppointmentStatus::Cancelled)
}

pub fn complete(conn: &Connection, appointment_id: &str) -> Result<Appointment, ServiceError> {
    transition(conn, appointment_id, AppointmentStatus::Completed)
}

fn transition(
    conn: &Connection,
    appointment_id: &str,
    next: AppointmentStatus,
) -> Result<Appointment, ServiceError> {
    let tx = conn.unchecked_transaction()?;
    let mut appointment = load(&tx, appointment_id)?;
    let from = appointment.status;
    apply_transition(&tx, &mut appointment, next)?;
    appointment.updated_at = timestamp_now();
    db::update_appointment_status(&tx, appointment_id, appointment.status, appointment.updated_at)?;
    tx.commit()?;

    tracing::info!(appointment_id, %from, to = %next, "Appointment status changed");
    Ok(appointment)
}

/// Move an active appointment to another slot.
pub fn reschedule(
    conn: &Connection,
    appointment_id: &str,
    input: RescheduleInput,
) -> Result<AppointmentView, ServiceError> {
    let mut errors = ValidationErrors::new();
    let time_slot_id = required_text(&mut errors, "time_slot_id", input.time_slot_id);
    let appointment_date = match optional_text(input.appointment_date) {
        Some(raw) => required_datetime(&mut errors, "appointment_date", Some(raw)),
        None => None,
    };
    let Some(time_slot_id) = time_slot_id else {
        return Err(ServiceError::Validation(errors));
    };
    errors.into_result()?;

    let tx = conn.unchecked_transaction()?;
    let mut appointment = load(&tx, appointment_id)?;
    let slot = move_to_slot(&tx, &mut appointment, &time_slot_id)?;
    appointment.appointment_date = appointment_date.unwrap_or(slot.start_time);
    appointment.updated_at = timestamp_now();
    db::update_appointment(&tx, &appointment)?;
    let view = view_of(&tx, appointment)?;
    tx.commit()?;

    tracing::info!(appointment_id, slot_id = %time_slot_id, "Appointment rescheduled");
    Ok(view)
}

/// Partial update. A new `time_slot_id` moves the booking and a new
/// `status` goes through the same lifecycle checks as the actions.
pub fn update_appointment(
    conn: &Connection,
    appointment_id: &str,
    input: AppointmentInput,
) -> Result<AppointmentView, ServiceError> {
    let tx = conn.unchecked_transaction()?;
    let mut appointment = load(&tx, appointment_id)?;
    let mut errors = ValidationErrors::new();

    if input.patient_id.is_some() {
        if let Some(id) = required_text(&mut errors, "patient_id", input.patient_id) {
            if db::patient_exists(&tx, &id)? {
                appointment.patient_id = id;
            } else {
                errors.add("patient_id", format!("Patient \"{id}\" does not exist."));
            }
        }
    }
    if input.doctor_id.is_some() {
        if let Some(id) = required_text(&mut errors, "doctor_id", input.doctor_id) {
            if db::doctor_exists(&tx, &id)? {
                appointment.doctor_id = id;
            } else {
                errors.add("doctor_id", format!("Doctor \"{id}\" does not exist."));
            }
        }
    }
    if input.appointment_date.is_some() {
        if let Some(date) = required_datetime(&mut errors, "appointment_date", input.appointment_date) {
            appointment.appointment_date = date;
        }
    }
    if input.specialty.is_some() {
        if let Some(specialty) = required_text(&mut errors, "specialty", input.specialty) {
            appointment.specialty = specialty;
        }
    }
    if input.reason_for_visit.is_some() {
        if let Some(reason) = required_text(&mut errors, "reason_for_visit", input.reason_for_visit) {
            appointment.reason_for_visit = reason;
        }
    }
    if input.notes.is_some() {
        appointment.notes = optional_text(input.notes);
    }
    let next_status = match input.status {
        Some(raw) => required_choice::<AppointmentStatus>(
            &mut errors,
            "status",
            Some(raw),
            AppointmentStatus::choices(),
        ),
        None => None,
    };
    let new_slot = match input.time_slot_id {
        Some(raw) => required_text(&mut errors, "time_slot_id", Some(raw)),
        None => None,
    };
    errors.into_result()?;

    if let Some(slot_id) = new_slot.filter(|id| *id != appointment.time_slot_id) {
        move_to_slot(&tx, &mut appointment, &slot_id)?;
    }
    if let Some(next) = next_status.filter(|s| *s != appointment.status) {
        apply_transition(&tx, &mut appointment, next)?;
    }

    appointment.updated_at = timestamp_now();
    db::update_appointment(&tx, &appointment)?;
    let view = view_of(&tx, appointment)?;
    tx.commit()?;
    Ok(view)
}

/// Delete an appointment, releasing its slot if it still held one.
pub fn delete_appointment(conn: &Connection, appointment_id: &str) -> Result<(), ServiceError> {
    let tx = conn.unchecked_transaction()?;
    let appointment = load(&tx, appointment_id)?;
    if appointment.status.holds_slot() {
        db::release_time_slot(&tx, &appointment.time_slot_id)?;
    }
    db::delete_appointment(&tx, appointment_id)?;
    tx.commit()?;

    tracing::info!(appointment_id, "Appointment deleted");
    Ok(())
}

// ── Internals ───────────────────────────────────────────────

fn load(conn: &Connection, appointment_id: &str) -> Result<Appointment, ServiceError> {
    db::get_appointment(conn, appointment_id)?
        .ok_or_else(|| ServiceError::not_found("Appointment", appointment_id))
}

/// Check the lifecycle and apply the side effects of entering `next`.
/// The caller persists the new status.
fn apply_transition(
    conn: &Connection,
    appointment: &mut Appointment,
    next: AppointmentStatus,
) -> Result<(), ServiceError> {
    let from = appointment.status;
    if !from.can_transition_to(next) {
        return Err(ServiceError::InvalidTransition { from, to: next });
    }
    if next == AppointmentStatus::Cancelled {
        db::release_time_slot(conn, &appointment.time_slot_id)?;
        notify(
            conn,
            &appointment.patient_id,
            NotificationType::AppointmentCancellation,
            Priority::Medium,
            format!("Your appointment on {} has been cancelled", appointment.appointment_date),
        )?;
    }
    appointment.status = next;
    Ok(())
}

/// Claim `slot_id` and release the current slot. Only active appointments move.
fn move_to_slot(
    conn: &Connection,
    appointment: &mut Appointment,
    slot_id: &str,
) -> Result<TimeSlot, ServiceError> {
    if !appointment.status.holds_slot() {
        return Err(ServiceError::field(
            "time_slot_id",
            format!("A {} appointment cannot be moved to another slot.", appointment.status),
        ));
    }
    let Some(slot) = db::get_time_slot(conn, slot_id)? else {
        return Err(ServiceError::field(
            "time_slot_id",
            format!("Time slot \"{slot_id}\" does not exist."),
        ));
    };
    if slot.slot_id == appointment.time_slot_id {
        return Ok(slot);
    }
    if !db::try_reserve_time_slot(conn, slot_id)? {
        return Err(ServiceError::field("time_slot_id", SLOT_TAKEN));
    }
    db::release_time_slot(conn, &appointment.time_slot_id)?;
    appointment.time_slot_id = slot.slot_id.clone();
    Ok(slot)
}

fn view_of(conn: &Connection, appointment: Appointment) -> Result<AppointmentView, ServiceError> {
    let slot = db::get_time_slot(conn, &appointment.time_slot_id)?;
    Ok(AppointmentView::new(appointment, slot))
}

fn views_of(
    conn: &Connection,
    appointments: Vec<Appointment>,
) -> Result<Vec<AppointmentView>, ServiceError> {
    appointments.into_iter().map(|a| view_of(conn, a)).collect()
}
