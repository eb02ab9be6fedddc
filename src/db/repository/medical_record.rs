use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::*;

// ── Medical records ─────────────────────────────────────────

pub fn insert_medical_record(conn: &Connection, record: &MedicalRecord) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO medical_records (record_id, patient_id, doctor_id, visit_date, diagnosis,
         treatment_plan, visit_type)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            record.record_id,
            record.patient_id,
            record.doctor_id,
            record.visit_date,
            record.diagnosis,
            record.treatment_plan,
            record.visit_type,
        ],
    )?;
    Ok(())
}

pub fn get_medical_record(
    conn: &Connection,
    record_id: &str,
) -> Result<Option<MedicalRecord>, DatabaseError> {
    let record = conn
        .query_row(
            "SELECT record_id, patient_id, doctor_id, visit_date, diagnosis, treatment_plan, visit_type
             FROM medical_records WHERE record_id = ?1",
            params![record_id],
            medical_record_from_row,
        )
        .optional()?;
    Ok(record)
}

pub fn list_medical_records(conn: &Connection) -> Result<Vec<MedicalRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT record_id, patient_id, doctor_id, visit_date, diagnosis, treatment_plan, visit_type
         FROM medical_records ORDER BY visit_date, rowid",
    )?;
    let rows = stmt.query_map([], medical_record_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn list_medical_records_for_patient(
    conn: &Connection,
    patient_id: &str,
) -> Result<Vec<MedicalRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT record_id, patient_id, doctor_id, visit_date, diagnosis, treatment_plan, visit_type
         FROM medical_records WHERE patient_id = ?1 ORDER BY visit_date, rowid",
    )?;
    let rows = stmt.query_map(params![patient_id], medical_record_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn update_medical_record(conn: &Connection, record: &MedicalRecord) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE medical_records SET patient_id = ?2, doctor_id = ?3, visit_date = ?4,
         diagnosis = ?5, treatment_plan = ?6, visit_type = ?7
         WHERE record_id = ?1",
        params![
            record.record_id,
            record.patient_id,
            record.doctor_id,
            record.visit_date,
            record.diagnosis,
            record.treatment_plan,
            record.visit_type,
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "MedicalRecord".into(),
            id: record.record_id.clone(),
        });
    }
    Ok(())
}

/// Delete a record. Link rows cascade; medications and test results stay.
pub fn delete_medical_record(conn: &Connection, record_id: &str) -> Result<bool, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM medical_records WHERE record_id = ?1",
        params![record_id],
    )?;
    Ok(deleted > 0)
}

fn medical_record_from_row(row: &Row<'_>) -> rusqlite::Result<MedicalRecord> {
    Ok(MedicalRecord {
        record_id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        visit_date: row.get(3)?,
        diagnosis: row.get(4)?,
        treatment_plan: row.get(5)?,
        visit_type: row.get(6)?,
    })
}

// ── Medications ─────────────────────────────────────────────

pub fn insert_medication(conn: &Connection, med: &Medication) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO medications (medication_id, name, dosage, frequency, duration, prescribed_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            med.medication_id,
            med.name,
            med.dosage,
            med.frequency,
            med.duration,
            med.prescribed_date,
        ],
    )?;
    Ok(())
}

pub fn link_record_medication(
    conn: &Connection,
    record_id: &str,
    medication_id: &str,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT OR IGNORE INTO medical_record_medications (record_id, medication_id) VALUES (?1, ?2)",
        params![record_id, medication_id],
    )?;
    Ok(())
}

pub fn get_record_medications(
    conn: &Connection,
    record_id: &str,
) -> Result<Vec<Medication>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT m.medication_id, m.name, m.dosage, m.frequency, m.duration, m.prescribed_date
         FROM medical_record_medications l JOIN medications m ON m.medication_id = l.medication_id
         WHERE l.record_id = ?1 ORDER BY m.prescribed_date, m.rowid",
    )?;
    let rows = stmt.query_map(params![record_id], |row| {
        Ok(Medication {
            medication_id: row.get(0)?,
            name: row.get(1)?,
            dosage: row.get(2)?,
            frequency: row.get(3)?,
            duration: row.get(4)?,
            prescribed_date: row.get(5)?,
        })
    })?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

// ── Test results ────────────────────────────────────────────

pub fn insert_test_result(conn: &Connection, test: &TestResult) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO test_results (test_id, test_name, test_date, results, status, normal_ranges)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            test.test_id,
            test.test_name,
            test.test_date,
            test.results,
            test.status,
            test.normal_ranges,
        ],
    )?;
    Ok(())
}

pub fn link_record_test_result(
    conn: &Connection,
    record_id: &str,
    test_id: &str,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT OR IGNORE INTO medical_record_test_results (record_id, test_id) VALUES (?1, ?2)",
        params![record_id, test_id],
    )?;
    Ok(())
}

pub fn get_record_test_results(
    conn: &Connection,
    record_id: &str,
) -> Result<Vec<TestResult>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT t.test_id, t.test_name, t.test_date, t.results, t.status, t.normal_ranges
         FROM medical_record_test_results l JOIN test_results t ON t.test_id = l.test_id
         WHERE l.record_id = ?1 ORDER BY t.test_date, t.rowid",
    )?;
    let rows = stmt.query_map(params![record_id], |row| {
        Ok(TestResult {
            test_id: row.get(0)?,
            test_name: row.get(1)?,
            test_date: row.get(2)?,
            results: row.get(3)?,
            status: row.get(4)?,
            normal_ranges: row.get(5)?,
        })
    })?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn count_medical_records(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM medical_records", [], |row| row.get(0))?)
}
