use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::AppointmentStatus;
use super::scheduling::TimeSlot;

/// Stored appointment row. `time_slot_id` references `time_slots`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub appointment_id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub appointment_date: NaiveDateTime,
    pub time_slot_id: String,
    pub specialty: String,
    pub reason_for_visit: String,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Appointment with its slot expanded, as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentView {
    pub appointment_id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub appointment_date: NaiveDateTime,
    pub time_slot: Option<TimeSlot>,
    pub specialty: String,
    pub reason_for_visit: String,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl AppointmentView {
    pub fn new(appointment: Appointment, time_slot: Option<TimeSlot>) -> Self {
        Self {
            appointment_id: appointment.appointment_id,
            patient_id: appointment.patient_id,
            doctor_id: appointment.doctor_id,
            appointment_date: appointment.appointment_date,
            time_slot,
            specialty: appointment.specialty,
            reason_for_visit: appointment.reason_for_visit,
            status: appointment.status,
            notes: appointment.notes,
            created_at: appointment.created_at,
            updated_at: appointment.updated_at,
        }
    }
}
