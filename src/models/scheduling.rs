use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// A fixed window a doctor can be booked into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub slot_id: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub is_available: bool,
}

/// Weekly availability window for a doctor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub schedule_id: String,
    pub doctor_id: String,
    pub working_days: Vec<String>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// Linked slots that are still open for booking.
    pub available_slots: Vec<TimeSlot>,
}
