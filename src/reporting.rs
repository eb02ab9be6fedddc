//! On-demand reports, stored analytics rows and the live dashboard.

use rusqlite::Connection;
use serde::Deserialize;

use crate::db;
use crate::error::{ServiceError, ValidationErrors};
use crate::ids;
use crate::models::enums::{AppointmentStatus, ReportType};
use crate::models::{timestamp_now, Analytics, DashboardCounts, Report};
use crate::validation::{required_choice, required_text};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportInput {
    pub report_id: Option<String>,
    pub report_type: Option<String>,
    pub generated_by: Option<String>,
    /// Only honoured on update; generation always computes it.
    pub data: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyticsInput {
    pub analytics_id: Option<String>,
    pub metric_type: Option<String>,
    pub value: Option<serde_json::Value>,
    pub period: Option<serde_json::Value>,
}

// ── Reports ─────────────────────────────────────────────────

/// Count the relevant rows now and store the summary as a report.
pub fn generate_report(conn: &Connection, input: ReportInput) -> Result<Report, ServiceError> {
    let mut errors = ValidationErrors::new();
    let report_type = required_choice::<ReportType>(
        &mut errors,
        "report_type",
        input.report_type,
        ReportType::choices(),
    );
    let generated_by = required_text(&mut errors, "generated_by", input.generated_by);
    let (Some(report_type), Some(generated_by)) = (report_type, generated_by) else {
        return Err(ServiceError::Validation(errors));
    };

    let report = Report {
        report_id: ids::or_generate(input.report_id, ids::REPORT),
        report_type,
        generated_date: timestamp_now(),
        data: report_data(conn, report_type)?,
        generated_by,
    };
    db::insert_report(conn, &report).map_err(|e| {
        if e.is_unique_violation() {
            ServiceError::field("report_id", "A report with this id already exists.")
        } else {
            ServiceError::Database(e)
        }
    })?;

    tracing::info!(report_id = %report.report_id, kind = %report_type, "Report generated");
    Ok(report)
}

fn report_data(conn: &Connection, report_type: ReportType) -> Result<String, ServiceError> {
    let text = match report_type {
        ReportType::AppointmentStatistics => {
            let mut lines = vec![format!("Total Appointments: {}", db::count_appointments(conn)?)];
            for status in [
                AppointmentStatus::Pending,
                AppointmentStatus::Confirmed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::Completed,
            ] {
                let count = db::count_appointments_by_status(conn, status)?;
                lines.push(format!("{}: {count}", capitalize(status.as_str())));
            }
            lines.join("\n")
        }
        ReportType::PatientDemographics => {
            let total = db::count_patients(conn)?;
            let active = db::count_active_patients(conn)?;
            format!(
                "Total Patients: {total}\nActive: {active}\nInactive: {}",
                total - active
            )
        }
        ReportType::DoctorPerformance => format!(
            "Total Doctors: {}\nCompleted Appointments: {}",
            db::count_doctors(conn)?,
            db::count_appointments_by_status(conn, AppointmentStatus::Completed)?
        ),
        ReportType::SystemUsage => "Report data placeholder".to_string(),
    };
    Ok(text)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn get_report(conn: &Connection, report_id: &str) -> Result<Report, ServiceError> {
    db::get_report(conn, report_id)?.ok_or_else(|| ServiceError::not_found("Report", report_id))
}

pub fn update_report(
    conn: &Connection,
    report_id: &str,
    input: ReportInput,
) -> Result<Report, ServiceError> {
    let mut report = get_report(conn, report_id)?;
    let mut errors = ValidationErrors::new();
    if input.report_type.is_some() {
        if let Some(kind) =
            required_choice(&mut errors, "report_type", input.report_type, ReportType::choices())
        {
            report.report_type = kind;
        }
    }
    if input.generated_by.is_some() {
        if let Some(by) = required_text(&mut errors, "generated_by", input.generated_by) {
            report.generated_by = by;
        }
    }
    if let Some(data) = input.data {
        report.data = data;
    }
    errors.into_result()?;

    db::update_report(conn, &report)?;
    Ok(report)
}

pub fn delete_report(conn: &Connection, report_id: &str) -> Result<(), ServiceError> {
    if db::delete_report(conn, report_id)? {
        Ok(())
    } else {
        Err(ServiceError::not_found("Report", report_id))
    }
}

// ── Dashboard ───────────────────────────────────────────────

/// Live row counts, computed on every call.
pub fn dashboard_counts(conn: &Connection) -> Result<DashboardCounts, ServiceError> {
    Ok(DashboardCounts {
        total_patients: db::count_patients(conn)?,
        total_doctors: db::count_doctors(conn)?,
        total_appointments: db::count_appointments(conn)?,
        pending_appointments: db::count_appointments_by_status(conn, AppointmentStatus::Pending)?,
        confirmed_appointments: db::count_appointments_by_status(conn, AppointmentStatus::Confirmed)?,
        cancelled_appointments: db::count_appointments_by_status(conn, AppointmentStatus::Cancelled)?,
        completed_appointments: db::count_appointments_by_status(conn, AppointmentStatus::Completed)?,
        available_slots: db::count_available_time_slots(conn)?,
        unread_notifications: db::count_unread_notifications(conn)?,
    })
}

// ── Analytics rows ──────────────────────────────────────────

pub fn create_analytics(conn: &Connection, input: AnalyticsInput) -> Result<Analytics, ServiceError> {
    let mut errors = ValidationErrors::new();
    let metric_type = required_text(&mut errors, "metric_type", input.metric_type);
    let value = metric_value(&mut errors, input.value, true);
    let period = period_object(&mut errors, input.period);
    let (Some(metric_type), Some(value), Some(period)) = (metric_type, value, period) else {
        return Err(ServiceError::Validation(errors));
    };

    let analytics = Analytics {
        analytics_id: ids::or_generate(input.analytics_id, ids::ANALYTICS),
        metric_type,
        value,
        period,
    };
    db::insert_analytics(conn, &analytics).map_err(|e| {
        if e.is_unique_violation() {
            ServiceError::field("analytics_id", "An analytics row with this id already exists.")
        } else {
            ServiceError::Database(e)
        }
    })?;
    Ok(analytics)
}

pub fn get_analytics(conn: &Connection, analytics_id: &str) -> Result<Analytics, ServiceError> {
    db::get_analytics(conn, analytics_id)?
        .ok_or_else(|| ServiceError::not_found("Analytics", analytics_id))
}

pub fn update_analytics(
    conn: &Connection,
    analytics_id: &str,
    input: AnalyticsInput,
) -> Result<Analytics, ServiceError> {
    let mut analytics = get_analytics(conn, analytics_id)?;
    let mut errors = ValidationErrors::new();
    if input.metric_type.is_some() {
        if let Some(metric) = required_text(&mut errors, "metric_type", input.metric_type) {
            analytics.metric_type = metric;
        }
    }
    if let Some(value) = metric_value(&mut errors, input.value, false) {
        analytics.value = value;
    }
    if input.period.is_some() {
        if let Some(period) = period_object(&mut errors, input.period) {
            analytics.period = period;
        }
    }
    errors.into_result()?;

    db::update_analytics(conn, &analytics)?;
    Ok(analytics)
}

pub fn delete_analytics(conn: &Connection, analytics_id: &str) -> Result<(), ServiceError> {
    if db::delete_analytics(conn, analytics_id)? {
        Ok(())
    } else {
        Err(ServiceError::not_found("Analytics", analytics_id))
    }
}

/// Metric values arrive as JSON strings or numbers and are stored as text.
fn metric_value(
    errors: &mut ValidationErrors,
    value: Option<serde_json::Value>,
    required: bool,
) -> Option<String> {
    match value {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        None if !required => None,
        None => {
            errors.add("value", crate::validation::REQUIRED);
            None
        }
        Some(_) => {
            errors.add("value", "A non-blank string or a number is required.");
            None
        }
    }
}

fn period_object(
    errors: &mut ValidationErrors,
    period: Option<serde_json::Value>,
) -> Option<serde_json::Value> {
    match period {
        None | Some(serde_json::Value::Null) => Some(serde_json::json!({})),
        Some(v @ serde_json::Value::Object(_)) => Some(v),
        Some(_) => {
            errors.add("period", "Expected a JSON object.");
            None
        }
    }
}
