use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::ReportType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub report_id: String,
    pub report_type: ReportType,
    pub generated_date: NaiveDateTime,
    /// Opaque, human-readable summary computed at generation time.
    pub data: String,
    pub generated_by: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analytics {
    pub analytics_id: String,
    pub metric_type: String,
    pub value: String,
    pub period: serde_json::Value,
}

/// Live counts shown on the analytics dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardCounts {
    pub total_patients: i64,
    pub total_doctors: i64,
    pub total_appointments: i64,
    pub pending_appointments: i64,
    pub confirmed_appointments: i64,
    pub cancelled_appointments: i64,
    pub completed_appointments: i64,
    pub available_slots: i64,
    pub unread_notifications: i64,
}
