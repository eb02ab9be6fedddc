use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::enums::ReportType;
use crate::models::*;

// ── Reports ─────────────────────────────────────────────────

pub fn insert_report(conn: &Connection, report: &Report) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO reports (report_id, report_type, generated_date, data, generated_by)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            report.report_id,
            report.report_type.as_str(),
            report.generated_date,
            report.data,
            report.generated_by,
        ],
    )?;
    Ok(())
}

pub fn get_report(conn: &Connection, report_id: &str) -> Result<Option<Report>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT report_id, report_type, generated_date, data, generated_by
             FROM reports WHERE report_id = ?1",
            params![report_id],
            report_row,
        )
        .optional()?;
    row.map(report_from_row).transpose()
}

pub fn list_reports(conn: &Connection) -> Result<Vec<Report>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT report_id, report_type, generated_date, data, generated_by
         FROM reports ORDER BY generated_date DESC, rowid DESC",
    )?;
    let rows = stmt.query_map([], report_row)?.collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(report_from_row).collect()
}

pub fn update_report(conn: &Connection, report: &Report) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE reports SET report_type = ?2, data = ?3, generated_by = ?4 WHERE report_id = ?1",
        params![
            report.report_id,
            report.report_type.as_str(),
            report.data,
            report.generated_by,
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Report".into(),
            id: report.report_id.clone(),
        });
    }
    Ok(())
}

pub fn delete_report(conn: &Connection, report_id: &str) -> Result<bool, DatabaseError> {
    let deleted = conn.execute("DELETE FROM reports WHERE report_id = ?1", params![report_id])?;
    Ok(deleted > 0)
}

type ReportRow = (String, String, chrono::NaiveDateTime, String, String);

fn report_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReportRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn report_from_row(row: ReportRow) -> Result<Report, DatabaseError> {
    let (report_id, report_type, generated_date, data, generated_by) = row;
    Ok(Report {
        report_id,
        report_type: ReportType::from_str(&report_type)?,
        generated_date,
        data,
        generated_by,
    })
}

// ── Analytics ───────────────────────────────────────────────

pub fn insert_analytics(conn: &Connection, analytics: &Analytics) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO analytics (analytics_id, metric_type, value, period) VALUES (?1, ?2, ?3, ?4)",
        params![
            analytics.analytics_id,
            analytics.metric_type,
            analytics.value,
            analytics.period.to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_analytics(conn: &Connection, analytics_id: &str) -> Result<Option<Analytics>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT analytics_id, metric_type, value, period FROM analytics WHERE analytics_id = ?1",
            params![analytics_id],
            analytics_row,
        )
        .optional()?;
    row.map(analytics_from_row).transpose()
}

pub fn list_analytics(conn: &Connection) -> Result<Vec<Analytics>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT analytics_id, metric_type, value, period FROM analytics ORDER BY rowid",
    )?;
    let rows = stmt.query_map([], analytics_row)?.collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(analytics_from_row).collect()
}

pub fn update_analytics(conn: &Connection, analytics: &Analytics) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE analytics SET metric_type = ?2, value = ?3, period = ?4 WHERE analytics_id = ?1",
        params![
            analytics.analytics_id,
            analytics.metric_type,
            analytics.value,
            analytics.period.to_string(),
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Analytics".into(),
            id: analytics.analytics_id.clone(),
        });
    }
    Ok(())
}

pub fn delete_analytics(conn: &Connection, analytics_id: &str) -> Result<bool, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM analytics WHERE analytics_id = ?1",
        params![analytics_id],
    )?;
    Ok(deleted > 0)
}

type AnalyticsRow = (String, String, String, String);

fn analytics_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AnalyticsRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn analytics_from_row(row: AnalyticsRow) -> Result<Analytics, DatabaseError> {
    let (analytics_id, metric_type, value, period) = row;
    let period = serde_json::from_str(&period).map_err(|e| DatabaseError::InvalidJson {
        column: "period".into(),
        reason: e.to_string(),
    })?;
    Ok(Analytics {
        analytics_id,
        metric_type,
        value,
        period,
    })
}
