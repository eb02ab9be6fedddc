//! Doctor schedules and bookable time slots.

use chrono::{Duration, NaiveDate, NaiveTime};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db;
use crate::error::{ServiceError, ValidationErrors};
use crate::ids;
use crate::models::{Schedule, TimeSlot};
use crate::validation::{optional_text, parse_time, required_date, required_datetime, required_time};

/// Longest range `create_slots` accepts, in days.
pub const MAX_SLOT_RANGE_DAYS: i64 = 366;

const SLOT_HELD: &str = "This time slot is held by a pending or confirmed appointment.";

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleInput {
    pub schedule_id: Option<String>,
    pub working_days: Option<Vec<String>>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeSlotInput {
    pub slot_id: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub is_available: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateSlotsInput {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub schedule_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedSlots {
    pub message: String,
    pub slot_ids: Vec<String>,
}

// ── Schedules ───────────────────────────────────────────────

pub fn set_schedule(
    conn: &Connection,
    doctor_id: &str,
    input: ScheduleInput,
) -> Result<Schedule, ServiceError> {
    if !db::doctor_exists(conn, doctor_id)? {
        return Err(ServiceError::not_found("Doctor", doctor_id));
    }

    let mut errors = ValidationErrors::new();
    let working_days = normalize_working_days(&mut errors, input.working_days.unwrap_or_default());
    let start_time = required_time(&mut errors, "start_time", input.start_time);
    let end_time = required_time(&mut errors, "end_time", input.end_time);
    if let (Some(start), Some(end)) = (start_time, end_time) {
        if end <= start {
            errors.add("end_time", "End time must be after start time.");
        }
    }
    let (Some(start_time), Some(end_time)) = (start_time, end_time) else {
        return Err(ServiceError::Validation(errors));
    };
    errors.into_result()?;

    let schedule = Schedule {
        schedule_id: ids::or_generate(input.schedule_id, ids::SCHEDULE),
        doctor_id: doctor_id.to_string(),
        working_days,
        start_time,
        end_time,
        available_slots: Vec::new(),
    };
    db::insert_schedule(conn, &schedule).map_err(|e| {
        if e.is_unique_violation() {
            ServiceError::field("schedule_id", "A schedule with this id already exists.")
        } else {
            ServiceError::Database(e)
        }
    })?;

    tracing::info!(doctor_id, schedule_id = %schedule.schedule_id, "Schedule created");
    Ok(schedule)
}

pub fn doctor_schedules(conn: &Connection, doctor_id: &str) -> Result<Vec<Schedule>, ServiceError> {
    if !db::doctor_exists(conn, doctor_id)? {
        return Err(ServiceError::not_found("Doctor", doctor_id));
    }
    Ok(db::list_schedules_for_doctor(conn, doctor_id)?)
}

fn normalize_working_days(errors: &mut ValidationErrors, days: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(days.len());
    for day in days {
        match WEEKDAYS.iter().find(|w| w.eq_ignore_ascii_case(day.trim())) {
            Some(w) if !normalized.iter().any(|d| d.as_str() == *w) => normalized.push(w.to_string()),
            Some(_) => {}
            None => errors.add("working_days", format!("\"{day}\" is not a day of the week.")),
        }
    }
    normalized
}

// ── Time slots ──────────────────────────────────────────────

pub fn create_time_slot(conn: &Connection, input: TimeSlotInput) -> Result<TimeSlot, ServiceError> {
    let mut errors = ValidationErrors::new();
    let start_time = required_datetime(&mut errors, "start_time", input.start_time);
    let end_time = required_datetime(&mut errors, "end_time", input.end_time);
    let (Some(start_time), Some(end_time)) = (start_time, end_time) else {
        return Err(ServiceError::Validation(errors));
    };
    if end_time <= start_time {
        return Err(ServiceError::field("end_time", "End time must be after start time."));
    }

    let slot = TimeSlot {
        slot_id: ids::or_generate(input.slot_id, ids::TIME_SLOT),
        start_time,
        end_time,
        is_available: input.is_available.unwrap_or(true),
    };
    db::insert_time_slot(conn, &slot).map_err(|e| {
        if e.is_unique_violation() {
            ServiceError::field("slot_id", "A time slot with this id already exists.")
        } else {
            ServiceError::Database(e)
        }
    })?;
    Ok(slot)
}

pub fn get_time_slot(conn: &Connection, slot_id: &str) -> Result<TimeSlot, ServiceError> {
    db::get_time_slot(conn, slot_id)?.ok_or_else(|| ServiceError::not_found("TimeSlot", slot_id))
}

pub fn update_time_slot(
    conn: &Connection,
    slot_id: &str,
    input: TimeSlotInput,
) -> Result<TimeSlot, ServiceError> {
    let mut slot = get_time_slot(conn, slot_id)?;
    let mut errors = ValidationErrors::new();
    if input.start_time.is_some() {
        if let Some(start) = required_datetime(&mut errors, "start_time", input.start_time) {
            slot.start_time = start;
        }
    }
    if input.end_time.is_some() {
        if let Some(end) = required_datetime(&mut errors, "end_time", input.end_time) {
            slot.end_time = end;
        }
    }
    if let Some(available) = input.is_available {
        slot.is_available = available;
    }
    errors.into_result()?;
    if slot.end_time <= slot.start_time {
        return Err(ServiceError::field("end_time", "End time must be after start time."));
    }

    // A held slot only becomes free again through cancel, reschedule or delete.
    let tx = conn.unchecked_transaction()?;
    if slot.is_available && db::slot_has_active_appointment(&tx, slot_id)? {
        return Err(ServiceError::field("is_available", SLOT_HELD));
    }
    db::update_time_slot(&tx, &slot)?;
    tx.commit()?;
    Ok(slot)
}

/// Delete a slot that no active appointment holds.
///
/// Cancelled and completed appointments on the slot are deleted with it.
pub fn delete_time_slot(conn: &Connection, slot_id: &str) -> Result<(), ServiceError> {
    let tx = conn.unchecked_transaction()?;
    if db::slot_has_active_appointment(&tx, slot_id)? {
        return Err(ServiceError::field("slot_id", SLOT_HELD));
    }
    if !db::delete_time_slot(&tx, slot_id)? {
        return Err(ServiceError::not_found("TimeSlot", slot_id));
    }
    tx.commit()?;
    Ok(())
}

pub fn available_slots(conn: &Connection) -> Result<Vec<TimeSlot>, ServiceError> {
    Ok(db::list_available_time_slots(conn)?)
}

/// Create one slot per day from `start_date` to `end_date` inclusive.
///
/// Every slot spans `start_time`..`end_time` (09:00..17:00 by default). When
/// `schedule_id` names a schedule, each new slot is linked to it.
pub fn create_slots(conn: &Connection, input: CreateSlotsInput) -> Result<CreatedSlots, ServiceError> {
    let mut errors = ValidationErrors::new();
    let start_date = required_date(&mut errors, "start_date", input.start_date);
    let end_date = required_date(&mut errors, "end_date", input.end_date);
    let start_time = time_or_default(&mut errors, "start_time", input.start_time, (9, 0));
    let end_time = time_or_default(&mut errors, "end_time", input.end_time, (17, 0));
    let schedule_id = optional_text(input.schedule_id);

    if let (Some(start), Some(end)) = (start_time, end_time) {
        if end <= start {
            errors.add("end_time", "End time must be after start time.");
        }
    }
    if let (Some(first), Some(last)) = (start_date, end_date) {
        let span = (last - first).num_days();
        if span < 0 {
            errors.add("end_date", "End date must not be before start date.");
        } else if span >= MAX_SLOT_RANGE_DAYS {
            errors.add(
                "end_date",
                format!("Date range may cover at most {MAX_SLOT_RANGE_DAYS} days."),
            );
        }
    }
    if let Some(id) = schedule_id.as_deref() {
        if db::get_schedule(conn, id)?.is_none() {
            errors.add("schedule_id", format!("Schedule \"{id}\" does not exist."));
        }
    }

    let (Some(first), Some(last), Some(start_time), Some(end_time)) =
        (start_date, end_date, start_time, end_time)
    else {
        return Err(ServiceError::Validation(errors));
    };
    errors.into_result()?;

    let tx = conn.unchecked_transaction()?;
    let mut slot_ids = Vec::new();
    for day in days_inclusive(first, last) {
        let slot = TimeSlot {
            slot_id: ids::generate(ids::TIME_SLOT),
            start_time: day.and_time(start_time),
            end_time: day.and_time(end_time),
            is_available: true,
        };
        db::insert_time_slot(&tx, &slot)?;
        if let Some(id) = schedule_id.as_deref() {
            db::link_schedule_slot(&tx, id, &slot.slot_id)?;
        }
        slot_ids.push(slot.slot_id);
    }
    tx.commit()?;

    tracing::info!(count = slot_ids.len(), %first, %last, "Time slots created");
    Ok(CreatedSlots {
        message: format!("{} time slots created", slot_ids.len()),
        slot_ids,
    })
}

fn time_or_default(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<String>,
    (hour, minute): (u32, u32),
) -> Option<NaiveTime> {
    match optional_text(value) {
        None => NaiveTime::from_hms_opt(hour, minute, 0),
        Some(raw) => {
            let parsed = parse_time(&raw);
            if parsed.is_none() {
                errors.add(field, "Time has wrong format. Use HH:MM or HH:MM:SS.");
            }
            parsed
        }
    }
}

fn days_inclusive(first: NaiveDate, last: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let count = (last - first).num_days() + 1;
    (0..count).map(move |offset| first + Duration::days(offset))
}
