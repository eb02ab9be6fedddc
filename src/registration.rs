//! Patient, doctor and administrator registration and profile maintenance.
//!
//! Each role is a base `users` row plus one role row. Inputs are partial:
//! create requires the identity fields, update only touches what is sent.

use rusqlite::Connection;
use serde::Deserialize;

use crate::crypto;
use crate::db::{self, DatabaseError};
use crate::error::{ServiceError, ValidationErrors};
use crate::ids;
use crate::models::{timestamp_now, Doctor, Patient, SystemAdmin};
use crate::validation::{optional_date, optional_text, required_email, required_text};

const EMAIL_TAKEN: &str = "A user with this email already exists.";
const LICENSE_TAKEN: &str = "A doctor with this license number already exists.";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientInput {
    pub patient_id: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<String>,
    pub insurance_info: Option<String>,
    pub emergency_contact: Option<String>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorInput {
    pub doctor_id: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub specialty: Option<String>,
    pub license_number: Option<String>,
    pub department: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminInput {
    pub admin_id: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub access_level: Option<String>,
    pub is_active: Option<bool>,
}

/// Request body of a registration or profile update: the profile fields
/// plus an optional plaintext password.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WithPassword<T> {
    #[serde(flatten)]
    pub profile: T,
    pub password: Option<String>,
}

impl<T> WithPassword<T> {
    /// Split off the password, hashed on the blocking thread pool.
    ///
    /// Call this before locking the database; key derivation is slow.
    /// An empty password counts as none.
    pub async fn into_parts(self) -> Result<(T, Option<String>), ServiceError> {
        let hash = match self.password.filter(|p| !p.is_empty()) {
            Some(password) => Some(crypto::hash_password_blocking(password).await?),
            None => None,
        };
        Ok((self.profile, hash))
    }
}

// ── Patients ────────────────────────────────────────────────

pub fn register_patient(
    conn: &Connection,
    input: PatientInput,
    password_hash: Option<&str>,
) -> Result<Patient, ServiceError> {
    let mut errors = ValidationErrors::new();
    let full_name = required_text(&mut errors, "full_name", input.full_name);
    let email = required_email(&mut errors, "email", input.email);
    let date_of_birth = optional_date(&mut errors, "date_of_birth", input.date_of_birth);
    check_email_free(conn, &mut errors, email.as_deref(), None)?;

    let (Some(full_name), Some(email)) = (full_name, email) else {
        return Err(ServiceError::Validation(errors));
    };
    errors.into_result()?;

    let now = timestamp_now();
    let patient = Patient {
        user_id: ids::generate(ids::USER),
        patient_id: ids::or_generate(input.patient_id, ids::PATIENT),
        full_name,
        email,
        phone_number: optional_text(input.phone_number),
        date_of_birth,
        insurance_info: optional_text(input.insurance_info),
        emergency_contact: optional_text(input.emergency_contact),
        address: optional_text(input.address),
        is_active: input.is_active.unwrap_or(true),
        created_at: now,
        updated_at: now,
    };
    let tx = conn.unchecked_transaction()?;
    db::insert_patient(&tx, &patient, password_hash)
        .map_err(|e| duplicate_as_field(e, "patient_id", "A patient with this id already exists."))?;
    tx.commit()?;

    tracing::info!(patient_id = %patient.patient_id, "Patient registered");
    Ok(patient)
}

pub fn get_patient(conn: &Connection, patient_id: &str) -> Result<Patient, ServiceError> {
    db::get_patient(conn, patient_id)?.ok_or_else(|| ServiceError::not_found("Patient", patient_id))
}

pub fn update_patient(
    conn: &Connection,
    patient_id: &str,
    input: PatientInput,
    password_hash: Option<&str>,
) -> Result<Patient, ServiceError> {
    let mut patient = get_patient(conn, patient_id)?;
    let mut errors = ValidationErrors::new();

    if let Some(name) = patched_text(&mut errors, "full_name", input.full_name) {
        patient.full_name = name;
    }
    if let Some(email) = patched_email(conn, &mut errors, input.email, &patient.user_id)? {
        patient.email = email;
    }
    if input.date_of_birth.is_some() {
        patient.date_of_birth = optional_date(&mut errors, "date_of_birth", input.date_of_birth);
    }
    if input.phone_number.is_some() {
        patient.phone_number = optional_text(input.phone_number);
    }
    if input.insurance_info.is_some() {
        patient.insurance_info = optional_text(input.insurance_info);
    }
    if input.emergency_contact.is_some() {
        patient.emergency_contact = optional_text(input.emergency_contact);
    }
    if input.address.is_some() {
        patient.address = optional_text(input.address);
    }
    if let Some(active) = input.is_active {
        patient.is_active = active;
    }
    errors.into_result()?;

    patient.updated_at = timestamp_now();
    let tx = conn.unchecked_transaction()?;
    db::update_patient(&tx, &patient).map_err(|e| duplicate_as_field(e, "email", EMAIL_TAKEN))?;
    if let Some(hash) = password_hash {
        db::set_password_hash(&tx, &patient.user_id, hash)?;
    }
    tx.commit()?;
    Ok(patient)
}

pub fn delete_patient(conn: &Connection, patient_id: &str) -> Result<(), ServiceError> {
    if db::delete_patient(conn, patient_id)? {
        tracing::info!(patient_id, "Patient deleted");
        Ok(())
    } else {
        Err(ServiceError::not_found("Patient", patient_id))
    }
}

// ── Doctors ─────────────────────────────────────────────────

pub fn register_doctor(
    conn: &Connection,
    input: DoctorInput,
    password_hash: Option<&str>,
) -> Result<Doctor, ServiceError> {
    let mut errors = ValidationErrors::new();
    let full_name = required_text(&mut errors, "full_name", input.full_name);
    let email = required_email(&mut errors, "email", input.email);
    let specialty = required_text(&mut errors, "specialty", input.specialty);
    let license_number = required_text(&mut errors, "license_number", input.license_number);
    let department = required_text(&mut errors, "department", input.department);
    check_email_free(conn, &mut errors, email.as_deref(), None)?;
    if let Some(license) = license_number.as_deref() {
        if db::license_taken(conn, license, None)? {
            errors.add("license_number", LICENSE_TAKEN);
        }
    }

    let (Some(full_name), Some(email), Some(specialty), Some(license_number), Some(department)) =
        (full_name, email, specialty, license_number, department)
    else {
        return Err(ServiceError::Validation(errors));
    };
    errors.into_result()?;

    let now = timestamp_now();
    let doctor = Doctor {
        user_id: ids::generate(ids::USER),
        doctor_id: ids::or_generate(input.doctor_id, ids::DOCTOR),
        full_name,
        email,
        phone_number: optional_text(input.phone_number),
        specialty,
        license_number,
        department,
        is_active: input.is_active.unwrap_or(true),
        created_at: now,
        updated_at: now,
    };
    let tx = conn.unchecked_transaction()?;
    db::insert_doctor(&tx, &doctor, password_hash)
        .map_err(|e| duplicate_as_field(e, "doctor_id", "A doctor with this id already exists."))?;
    tx.commit()?;

    tracing::info!(doctor_id = %doctor.doctor_id, "Doctor registered");
    Ok(doctor)
}

pub fn get_doctor(conn: &Connection, doctor_id: &str) -> Result<Doctor, ServiceError> {
    db::get_doctor(conn, doctor_id)?.ok_or_else(|| ServiceError::not_found("Doctor", doctor_id))
}

pub fn update_doctor(
    conn: &Connection,
    doctor_id: &str,
    input: DoctorInput,
    password_hash: Option<&str>,
) -> Result<Doctor, ServiceError> {
    let mut doctor = get_doctor(conn, doctor_id)?;
    let mut errors = ValidationErrors::new();

    if let Some(name) = patched_text(&mut errors, "full_name", input.full_name) {
        doctor.full_name = name;
    }
    if let Some(email) = patched_email(conn, &mut errors, input.email, &doctor.user_id)? {
        doctor.email = email;
    }
    if let Some(specialty) = patched_text(&mut errors, "specialty", input.specialty) {
        doctor.specialty = specialty;
    }
    if let Some(license) = patched_text(&mut errors, "license_number", input.license_number) {
        if db::license_taken(conn, &license, Some(doctor_id))? {
            errors.add("license_number", LICENSE_TAKEN);
        }
        doctor.license_number = license;
    }
    if let Some(department) = patched_text(&mut errors, "department", input.department) {
        doctor.department = department;
    }
    if input.phone_number.is_some() {
        doctor.phone_number = optional_text(input.phone_number);
    }
    if let Some(active) = input.is_active {
        doctor.is_active = active;
    }
    errors.into_result()?;

    doctor.updated_at = timestamp_now();
    let tx = conn.unchecked_transaction()?;
    db::update_doctor(&tx, &doctor)
        .map_err(|e| duplicate_as_field(e, "license_number", LICENSE_TAKEN))?;
    if let Some(hash) = password_hash {
        db::set_password_hash(&tx, &doctor.user_id, hash)?;
    }
    tx.commit()?;
    Ok(doctor)
}

pub fn delete_doctor(conn: &Connection, doctor_id: &str) -> Result<(), ServiceError> {
    if db::delete_doctor(conn, doctor_id)? {
        tracing::info!(doctor_id, "Doctor deleted");
        Ok(())
    } else {
        Err(ServiceError::not_found("Doctor", doctor_id))
    }
}

// ── Administrators ──────────────────────────────────────────

pub fn register_admin(
    conn: &Connection,
    input: AdminInput,
    password_hash: Option<&str>,
) -> Result<SystemAdmin, ServiceError> {
    let mut errors = ValidationErrors::new();
    let full_name = required_text(&mut errors, "full_name", input.full_name);
    let email = required_email(&mut errors, "email", input.email);
    let access_level = required_text(&mut errors, "access_level", input.access_level);
    check_email_free(conn, &mut errors, email.as_deref(), None)?;

    let (Some(full_name), Some(email), Some(access_level)) = (full_name, email, access_level) else {
        return Err(ServiceError::Validation(errors));
    };
    errors.into_result()?;

    let now = timestamp_now();
    let admin = SystemAdmin {
        user_id: ids::generate(ids::USER),
        admin_id: ids::or_generate(input.admin_id, ids::ADMIN),
        full_name,
        email,
        access_level,
        is_active: input.is_active.unwrap_or(true),
        created_at: now,
        updated_at: now,
    };
    let tx = conn.unchecked_transaction()?;
    db::insert_admin(&tx, &admin, password_hash)
        .map_err(|e| duplicate_as_field(e, "admin_id", "An admin with this id already exists."))?;
    tx.commit()?;

    tracing::info!(admin_id = %admin.admin_id, "Admin created");
    Ok(admin)
}

pub fn get_admin(conn: &Connection, admin_id: &str) -> Result<SystemAdmin, ServiceError> {
    db::get_admin(conn, admin_id)?.ok_or_else(|| ServiceError::not_found("SystemAdmin", admin_id))
}

pub fn delete_admin(conn: &Connection, admin_id: &str) -> Result<(), ServiceError> {
    if db::delete_admin(conn, admin_id)? {
        Ok(())
    } else {
        Err(ServiceError::not_found("SystemAdmin", admin_id))
    }
}

// ── Helpers ─────────────────────────────────────────────────

fn check_email_free(
    conn: &Connection,
    errors: &mut ValidationErrors,
    email: Option<&str>,
    exclude_user_id: Option<&str>,
) -> Result<(), ServiceError> {
    if let Some(email) = email {
        if db::email_taken(conn, email, exclude_user_id)? {
            errors.add("email", EMAIL_TAKEN);
        }
    }
    Ok(())
}

/// A field present in a partial update must not be blank.
fn patched_text(errors: &mut ValidationErrors, field: &str, value: Option<String>) -> Option<String> {
    value.and_then(|v| required_text(errors, field, Some(v)))
}

fn patched_email(
    conn: &Connection,
    errors: &mut ValidationErrors,
    value: Option<String>,
    user_id: &str,
) -> Result<Option<String>, ServiceError> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let email = required_email(errors, "email", Some(raw));
    check_email_free(conn, errors, email.as_deref(), Some(user_id))?;
    Ok(email)
}

/// Turn a UNIQUE violation that slipped past the pre-checks into a field error.
fn duplicate_as_field(err: DatabaseError, field: &str, message: &str) -> ServiceError {
    if err.is_unique_violation() {
        ServiceError::field(field, message)
    } else {
        ServiceError::Database(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn patient_input(email: &str) -> PatientInput {
        PatientInput {
            full_name: Some("Ada Obi".into()),
            email: Some(email.into()),
            date_of_birth: Some("1990-04-12".into()),
            ..Default::default()
        }
    }

    fn doctor_input(email: &str, license: &str) -> DoctorInput {
        DoctorInput {
            full_name: Some("Dr. Grace Lee".into()),
            email: Some(email.into()),
            specialty: Some("Cardiology".into()),
            license_number: Some(license.into()),
            department: Some("Heart".into()),
            ..Default::default()
        }
    }

    #[test]
    fn register_patient_generates_codes() {
        let conn = open_memory_database().unwrap();
        let patient = register_patient(&conn, patient_input("ada@example.com"), None).unwrap();
        assert!(patient.patient_id.starts_with("PAT-"));
        assert!(patient.user_id.starts_with("USR-"));
        assert!(patient.is_active);
        assert_eq!(get_patient(&conn, &patient.patient_id).unwrap().full_name, "Ada Obi");
    }

    #[test]
    fn client_supplied_patient_id_is_kept() {
        let conn = open_memory_database().unwrap();
        let mut input = patient_input("ada@example.com");
        input.patient_id = Some("PAT-CUSTOM01".into());
        let patient = register_patient(&conn, input, None).unwrap();
        assert_eq!(patient.patient_id, "PAT-CUSTOM01");

        let mut dup = patient_input("other@example.com");
        dup.patient_id = Some("PAT-CUSTOM01".into());
        match register_patient(&conn, dup, None) {
            Err(ServiceError::Validation(errors)) => assert!(errors.contains("patient_id")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_email_is_rejected_across_roles() {
        let conn = open_memory_database().unwrap();
        register_patient(&conn, patient_input("ada@example.com"), None).unwrap();

        match register_patient(&conn, patient_input("ADA@example.com"), None) {
            Err(ServiceError::Validation(errors)) => {
                assert_eq!(errors.messages("email"), [EMAIL_TAKEN])
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(matches!(
            register_doctor(&conn, doctor_input("ada@example.com", "LIC-1"), None),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let conn = open_memory_database().unwrap();
        match register_doctor(&conn, DoctorInput::default(), None) {
            Err(ServiceError::Validation(errors)) => {
                for field in ["full_name", "email", "specialty", "license_number", "department"] {
                    assert!(errors.contains(field), "missing error for {field}");
                }
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn bad_email_and_date_are_field_errors() {
        let conn = open_memory_database().unwrap();
        let mut input = patient_input("not-an-email");
        input.date_of_birth = Some("12/04/1990".into());
        match register_patient(&conn, input, None) {
            Err(ServiceError::Validation(errors)) => {
                assert!(errors.contains("email"));
                assert!(errors.contains("date_of_birth"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_license_is_rejected() {
        let conn = open_memory_database().unwrap();
        register_doctor(&conn, doctor_input("a@example.com", "LIC-1"), None).unwrap();
        match register_doctor(&conn, doctor_input("b@example.com", "LIC-1"), None) {
            Err(ServiceError::Validation(errors)) => assert!(errors.contains("license_number")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn partial_update_touches_only_sent_fields() {
        let conn = open_memory_database().unwrap();
        let patient = register_patient(&conn, patient_input("ada@example.com"), None).unwrap();

        let updated = update_patient(
            &conn,
            &patient.patient_id,
            PatientInput {
                address: Some("12 Harbour Rd".into()),
                ..Default::default()
            },
            None,
        )
        .unwrap();
        assert_eq!(updated.address.as_deref(), Some("12 Harbour Rd"));
        assert_eq!(updated.full_name, "Ada Obi");
        assert_eq!(updated.email, "ada@example.com");
    }

    #[test]
    fn update_rejects_blank_name_and_taken_email() {
        let conn = open_memory_database().unwrap();
        let a = register_patient(&conn, patient_input("a@example.com"), None).unwrap();
        register_patient(&conn, patient_input("b@example.com"), None).unwrap();

        let result = update_patient(
            &conn,
            &a.patient_id,
            PatientInput {
                full_name: Some("  ".into()),
                email: Some("b@example.com".into()),
                ..Default::default()
            },
            None,
        );
        match result {
            Err(ServiceError::Validation(errors)) => {
                assert!(errors.contains("full_name"));
                assert!(errors.contains("email"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        // Keeping one's own email is fine
        update_patient(
            &conn,
            &a.patient_id,
            PatientInput {
                email: Some("a@example.com".into()),
                ..Default::default()
            },
            None,
        )
        .unwrap();
    }

    #[tokio::test]
    async fn password_is_hashed_before_storage() {
        let body: WithPassword<PatientInput> = serde_json::from_value(serde_json::json!({
            "full_name": "Ada Obi",
            "email": "ada@example.com",
            "password": "s3cret-pass",
        }))
        .unwrap();
        let (input, hash) = body.into_parts().await.unwrap();
        let hash = hash.unwrap();
        assert!(!hash.contains("s3cret-pass"));
        assert!(crypto::verify_password("s3cret-pass", &hash).unwrap());

        let conn = open_memory_database().unwrap();
        register_patient(&conn, input, Some(&hash)).unwrap();
        let stored = db::get_user_by_email(&conn, "ada@example.com").unwrap().unwrap();
        assert_eq!(stored.password_hash.as_deref(), Some(hash.as_str()));
    }

    #[tokio::test]
    async fn empty_password_means_no_hash() {
        let body = WithPassword {
            profile: patient_input("ada@example.com"),
            password: Some(String::new()),
        };
        let (_, hash) = body.into_parts().await.unwrap();
        assert!(hash.is_none());
    }

    #[test]
    fn update_replaces_password_hash() {
        let conn = open_memory_database().unwrap();
        let doctor = register_doctor(&conn, doctor_input("lee@example.com", "LIC-9"), None).unwrap();
        update_doctor(&conn, &doctor.doctor_id, DoctorInput::default(), Some("pbkdf2_sha256$1$a$b"))
            .unwrap();
        let stored = db::get_user_by_email(&conn, "lee@example.com").unwrap().unwrap();
        assert_eq!(stored.password_hash.as_deref(), Some("pbkdf2_sha256$1$a$b"));
    }

    #[test]
    fn delete_missing_is_not_found() {
        let conn = open_memory_database().unwrap();
        assert!(matches!(
            delete_patient(&conn, "PAT-NOPE0000"),
            Err(ServiceError::NotFound { .. })
        ));
        assert!(matches!(
            get_doctor(&conn, "DOC-NOPE0000"),
            Err(ServiceError::NotFound { .. })
        ));
    }

    #[test]
    fn admin_lifecycle() {
        let conn = open_memory_database().unwrap();
        let admin = register_admin(
            &conn,
            AdminInput {
                full_name: Some("Root".into()),
                email: Some("root@example.com".into()),
                access_level: Some("full".into()),
                ..Default::default()
            },
            None,
        )
        .unwrap();
        assert!(admin.admin_id.starts_with("ADM-"));
        let user = db::get_user_by_email(&conn, "root@example.com").unwrap().unwrap();
        assert_eq!(user.user_type, crate::models::enums::UserType::Admin);
        delete_admin(&conn, &admin.admin_id).unwrap();
        assert!(matches!(
            get_admin(&conn, &admin.admin_id),
            Err(ServiceError::NotFound { .. })
        ));
    }
}
