//! Medical records with their prescribed medications and test results.

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Deserialize;

use crate::db;
use crate::error::{ServiceError, ValidationErrors};
use crate::ids;
use crate::models::enums::{NotificationType, Priority};
use crate::models::{timestamp_now, MedicalRecord, MedicalRecordView, Medication, TestResult};
use crate::notifications::notify;
use crate::validation::{optional_date, optional_text, required_text};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MedicalRecordInput {
    pub record_id: Option<String>,
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
    pub visit_date: Option<String>,
    pub diagnosis: Option<String>,
    pub treatment_plan: Option<String>,
    pub visit_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MedicationInput {
    pub medication_id: Option<String>,
    pub name: Option<String>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub duration: Option<String>,
    pub prescribed_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestResultInput {
    pub test_id: Option<String>,
    pub test_name: Option<String>,
    pub test_date: Option<String>,
    pub results: Option<String>,
    pub status: Option<String>,
    pub normal_ranges: Option<String>,
}

fn today() -> NaiveDate {
    timestamp_now().date()
}

/// Create a record and tell the patient about it.
pub fn create_record(
    conn: &Connection,
    input: MedicalRecordInput,
) -> Result<MedicalRecordView, ServiceError> {
    let mut errors = ValidationErrors::new();
    let patient_id = required_text(&mut errors, "patient_id", input.patient_id);
    let doctor_id = required_text(&mut errors, "doctor_id", input.doctor_id);
    let visit_date = optional_date(&mut errors, "visit_date", input.visit_date);
    let diagnosis = required_text(&mut errors, "diagnosis", input.diagnosis);
    let treatment_plan = required_text(&mut errors, "treatment_plan", input.treatment_plan);
    let visit_type = required_text(&mut errors, "visit_type", input.visit_type);
    check_participants(conn, &mut errors, patient_id.as_deref(), doctor_id.as_deref())?;

    let (Some(patient_id), Some(doctor_id), Some(diagnosis), Some(treatment_plan), Some(visit_type)) =
        (patient_id, doctor_id, diagnosis, treatment_plan, visit_type)
    else {
        return Err(ServiceError::Validation(errors));
    };
    errors.into_result()?;

    let record = MedicalRecord {
        record_id: ids::or_generate(input.record_id, ids::MEDICAL_RECORD),
        patient_id,
        doctor_id,
        visit_date: visit_date.unwrap_or_else(today),
        diagnosis,
        treatment_plan,
        visit_type,
    };

    let tx = conn.unchecked_transaction()?;
    db::insert_medical_record(&tx, &record).map_err(|e| {
        if e.is_unique_violation() {
            ServiceError::field("record_id", "A medical record with this id already exists.")
        } else {
            ServiceError::Database(e)
        }
    })?;
    notify(
        &tx,
        &record.patient_id,
        NotificationType::TestResultsAvailable,
        Priority::Medium,
        format!("New medical record created for your visit on {}", record.visit_date),
    )?;
    tx.commit()?;

    tracing::info!(record_id = %record.record_id, patient_id = %record.patient_id, "Medical record created");
    Ok(MedicalRecordView {
        record,
        medications: Vec::new(),
        test_results: Vec::new(),
    })
}

pub fn get_record(conn: &Connection, record_id: &str) -> Result<MedicalRecordView, ServiceError> {
    let record = load(conn, record_id)?;
    view_of(conn, record)
}

pub fn list_records(conn: &Connection) -> Result<Vec<MedicalRecordView>, ServiceError> {
    db::list_medical_records(conn)?
        .into_iter()
        .map(|r| view_of(conn, r))
        .collect()
}

pub fn patient_records(
    conn: &Connection,
    patient_id: &str,
) -> Result<Vec<MedicalRecordView>, ServiceError> {
    if !db::patient_exists(conn, patient_id)? {
        return Err(ServiceError::not_found("Patient", patient_id));
    }
    db::list_medical_records_for_patient(conn, patient_id)?
        .into_iter()
        .map(|r| view_of(conn, r))
        .collect()
}

pub fn update_record(
    conn: &Connection,
    record_id: &str,
    input: MedicalRecordInput,
) -> Result<MedicalRecordView, ServiceError> {
    let mut record = load(conn, record_id)?;
    let mut errors = ValidationErrors::new();

    let patient_id = input
        .patient_id
        .and_then(|v| required_text(&mut errors, "patient_id", Some(v)));
    let doctor_id = input
        .doctor_id
        .and_then(|v| required_text(&mut errors, "doctor_id", Some(v)));
    check_participants(conn, &mut errors, patient_id.as_deref(), doctor_id.as_deref())?;
    if let Some(id) = patient_id {
        record.patient_id = id;
    }
    if let Some(id) = doctor_id {
        record.doctor_id = id;
    }
    if let Some(date) = optional_date(&mut errors, "visit_date", input.visit_date) {
        record.visit_date = date;
    }
    for (field, value, target) in [
        ("diagnosis", input.diagnosis, &mut record.diagnosis),
        ("treatment_plan", input.treatment_plan, &mut record.treatment_plan),
        ("visit_type", input.visit_type, &mut record.visit_type),
    ] {
        if let Some(v) = value.and_then(|v| required_text(&mut errors, field, Some(v))) {
            *target = v;
        }
    }
    errors.into_result()?;

    db::update_medical_record(conn, &record)?;
    view_of(conn, record)
}

pub fn delete_record(conn: &Connection, record_id: &str) -> Result<(), ServiceError> {
    if db::delete_medical_record(conn, record_id)? {
        Ok(())
    } else {
        Err(ServiceError::not_found("MedicalRecord", record_id))
    }
}

/// Prescribe a medication under an existing record.
pub fn add_medication(
    conn: &Connection,
    record_id: &str,
    input: MedicationInput,
) -> Result<MedicalRecordView, ServiceError> {
    let record = load(conn, record_id)?;
    let mut errors = ValidationErrors::new();
    let name = required_text(&mut errors, "name", input.name);
    let dosage = required_text(&mut errors, "dosage", input.dosage);
    let frequency = required_text(&mut errors, "frequency", input.frequency);
    let duration = required_text(&mut errors, "duration", input.duration);
    let prescribed_date = optional_date(&mut errors, "prescribed_date", input.prescribed_date);

    let (Some(name), Some(dosage), Some(frequency), Some(duration)) = (name, dosage, frequency, duration)
    else {
        return Err(ServiceError::Validation(errors));
    };
    errors.into_result()?;

    let medication = Medication {
        medication_id: ids::or_generate(input.medication_id, ids::MEDICATION),
        name,
        dosage,
        frequency,
        duration,
        prescribed_date: prescribed_date.unwrap_or_else(today),
    };

    let tx = conn.unchecked_transaction()?;
    db::insert_medication(&tx, &medication).map_err(|e| {
        if e.is_unique_violation() {
            ServiceError::field("medication_id", "A medication with this id already exists.")
        } else {
            ServiceError::Database(e)
        }
    })?;
    db::link_record_medication(&tx, record_id, &medication.medication_id)?;
    tx.commit()?;

    tracing::info!(record_id, medication_id = %medication.medication_id, "Medication prescribed");
    view_of(conn, record)
}

/// Attach a test result to an existing record.
pub fn add_test_result(
    conn: &Connection,
    record_id: &str,
    input: TestResultInput,
) -> Result<MedicalRecordView, ServiceError> {
    let record = load(conn, record_id)?;
    let mut errors = ValidationErrors::new();
    let test_name = required_text(&mut errors, "test_name", input.test_name);
    let results = required_text(&mut errors, "results", input.results);
    let status = required_text(&mut errors, "status", input.status);
    let test_date = optional_date(&mut errors, "test_date", input.test_date);

    let (Some(test_name), Some(results), Some(status)) = (test_name, results, status) else {
        return Err(ServiceError::Validation(errors));
    };
    errors.into_result()?;

    let test = TestResult {
        test_id: ids::or_generate(input.test_id, ids::TEST_RESULT),
        test_name,
        test_date: test_date.unwrap_or_else(today),
        results,
        status,
        normal_ranges: optional_text(input.normal_ranges),
    };

    let tx = conn.unchecked_transaction()?;
    db::insert_test_result(&tx, &test).map_err(|e| {
        if e.is_unique_violation() {
            ServiceError::field("test_id", "A test result with this id already exists.")
        } else {
            ServiceError::Database(e)
        }
    })?;
    db::link_record_test_result(&tx, record_id, &test.test_id)?;
    tx.commit()?;

    tracing::info!(record_id, test_id = %test.test_id, "Test result attached");
    view_of(conn, record)
}

fn load(conn: &Connection, record_id: &str) -> Result<MedicalRecord, ServiceError> {
    db::get_medical_record(conn, record_id)?
        .ok_or_else(|| ServiceError::not_found("MedicalRecord", record_id))
}

fn view_of(conn: &Connection, record: MedicalRecord) -> Result<MedicalRecordView, ServiceError> {
    let medications = db::get_record_medications(conn, &record.record_id)?;
    let test_results = db::get_record_test_results(conn, &record.record_id)?;
    Ok(MedicalRecordView {
        record,
        medications,
        test_results,
    })
}

fn check_participants(
    conn: &Connection,
    errors: &mut ValidationErrors,
    patient_id: Option<&str>,
    doctor_id: Option<&str>,
) -> Result<(), ServiceError> {
    if let Some(id) = patient_id {
        if !db::patient_exists(conn, id)? {
            errors.add("patient_id", format!("Patient \"{id}\" does not exist."));
        }
    }
    if let Some(id) = doctor_id {
        if !db::doctor_exists(conn, id)? {
            errors.add("doctor_id", format!("Doctor \"{id}\" does not exist."));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::registration::{register_doctor, register_patient, DoctorInput, PatientInput};

    fn setup() -> (Connection, String, String) {
        let conn = open_memory_database().unwrap();
        let patient_id = register_patient(
            &conn,
            PatientInput {
                full_name: Some("Ada Obi".into()),
                email: Some("ada@example.com".into()),
                ..Default::default()
            },
            None,
        )
        .unwrap()
        .patient_id;
        let doctor_id = register_doctor(
            &conn,
            DoctorInput {
                full_name: Some("Dr. Lee".into()),
                email: Some("lee@example.com".into()),
                specialty: Some("Cardiology".into()),
                license_number: Some("LIC-1".into()),
                department: Some("Heart".into()),
                ..Default::default()
            },
            None,
        )
        .unwrap()
        .doctor_id;
        (conn, patient_id, doctor_id)
    }

    fn record_input(patient_id: &str, doctor_id: &str) -> MedicalRecordInput {
        MedicalRecordInput {
            patient_id: Some(patient_id.into()),
            doctor_id: Some(doctor_id.into()),
            visit_date: Some("2024-03-03".into()),
            diagnosis: Some("Hypertension Stage 1".into()),
            treatment_plan: Some("Lifestyle changes".into()),
            visit_type: Some("Follow-up".into()),
            ..Default::default()
        }
    }

    #[test]
    fn create_record_notifies_patient() {
        let (conn, patient_id, doctor_id) = setup();
        let view = create_record(&conn, record_input(&patient_id, &doctor_id)).unwrap();
        assert!(view.record.record_id.starts_with("MR-"));
        assert!(view.medications.is_empty());

        let notes = db::list_notifications_for_user(&conn, &patient_id).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].notification_type, NotificationType::TestResultsAvailable);
        assert_eq!(notes[0].priority, Priority::Medium);
        assert_eq!(notes[0].message, "New medical record created for your visit on 2024-03-03");
    }

    #[test]
    fn create_record_requires_known_participants() {
        let (conn, _, doctor_id) = setup();
        match create_record(&conn, record_input("PAT-NOPE", &doctor_id)) {
            Err(ServiceError::Validation(errors)) => assert!(errors.contains("patient_id")),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(db::count_medical_records(&conn).unwrap(), 0);
    }

    #[test]
    fn visit_date_defaults_to_today() {
        let (conn, patient_id, doctor_id) = setup();
        let mut input = record_input(&patient_id, &doctor_id);
        input.visit_date = None;
        let view = create_record(&conn, input).unwrap();
        assert_eq!(view.record.visit_date, today());
    }

    #[test]
    fn attach_medication_and_test_result() {
        let (conn, patient_id, doctor_id) = setup();
        let id = create_record(&conn, record_input(&patient_id, &doctor_id))
            .unwrap()
            .record
            .record_id;

        add_medication(
            &conn,
            &id,
            MedicationInput {
                name: Some("Lisinopril".into()),
                dosage: Some("10mg".into()),
                frequency: Some("Once daily".into()),
                duration: Some("30 days".into()),
                ..Default::default()
            },
        )
        .unwrap();
        let view = add_test_result(
            &conn,
            &id,
            TestResultInput {
                test_name: Some("Lipid panel".into()),
                results: Some("LDL 130".into()),
                status: Some("final".into()),
                test_date: Some("2024-03-03".into()),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(view.medications.len(), 1);
        assert!(view.medications[0].medication_id.starts_with("MED-"));
        assert_eq!(view.test_results.len(), 1);
        assert!(view.test_results[0].test_id.starts_with("TR-"));
        assert_eq!(patient_records(&conn, &patient_id).unwrap().len(), 1);
    }

    #[test]
    fn medication_needs_fields_and_record() {
        let (conn, patient_id, doctor_id) = setup();
        let id = create_record(&conn, record_input(&patient_id, &doctor_id))
            .unwrap()
            .record
            .record_id;
        assert!(matches!(
            add_medication(&conn, &id, MedicationInput::default()),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            add_medication(&conn, "MR-NOPE", MedicationInput::default()),
            Err(ServiceError::NotFound { .. })
        ));
    }

    #[test]
    fn partial_update_and_delete() {
        let (conn, patient_id, doctor_id) = setup();
        let id = create_record(&conn, record_input(&patient_id, &doctor_id))
            .unwrap()
            .record
            .record_id;
        let view = update_record(
            &conn,
            &id,
            MedicalRecordInput {
                diagnosis: Some("Hypertension Stage 2".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(view.record.diagnosis, "Hypertension Stage 2");
        assert_eq!(view.record.visit_type, "Follow-up");

        delete_record(&conn, &id).unwrap();
        assert!(matches!(get_record(&conn, &id), Err(ServiceError::NotFound { .. })));
    }
}
