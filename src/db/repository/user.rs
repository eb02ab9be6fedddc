use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::enums::UserType;
use crate::models::*;

const PATIENT_SELECT: &str =
    "SELECT u.user_id, p.patient_id, p.full_name, u.email, u.phone_number, u.date_of_birth,
     p.insurance_info, p.emergency_contact, p.address, u.is_active, u.created_at, u.updated_at
     FROM patients p JOIN users u ON u.user_id = p.user_id";

const DOCTOR_SELECT: &str =
    "SELECT u.user_id, d.doctor_id, d.full_name, u.email, u.phone_number, d.specialty,
     d.license_number, d.department, u.is_active, u.created_at, u.updated_at
     FROM doctors d JOIN users u ON u.user_id = d.user_id";

const ADMIN_SELECT: &str =
    "SELECT u.user_id, a.admin_id, a.full_name, u.email, a.access_level,
     u.is_active, u.created_at, u.updated_at
     FROM system_admins a JOIN users u ON u.user_id = a.user_id";

// ── Base users ──────────────────────────────────────────────

pub fn insert_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (user_id, email, password_hash, phone_number, date_of_birth,
         user_type, is_active, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            user.user_id,
            user.email,
            user.password_hash,
            user.phone_number,
            user.date_of_birth,
            user.user_type.as_str(),
            user.is_active,
            user.created_at,
            user.updated_at,
        ],
    )?;
    Ok(())
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT user_id, email, password_hash, phone_number, date_of_birth, user_type,
             is_active, created_at, updated_at
             FROM users WHERE email = ?1",
            params![email],
            |row| {
                Ok((
                    User {
                        user_id: row.get(0)?,
                        email: row.get(1)?,
                        password_hash: row.get(2)?,
                        phone_number: row.get(3)?,
                        date_of_birth: row.get(4)?,
                        user_type: UserType::Patient,
                        is_active: row.get(6)?,
                        created_at: row.get(7)?,
                        updated_at: row.get(8)?,
                    },
                    row.get::<_, String>(5)?,
                ))
            },
        )
        .optional()?;

    match row {
        Some((mut user, user_type)) => {
            user.user_type = UserType::from_str(&user_type)?;
            Ok(Some(user))
        }
        None => Ok(None),
    }
}

/// Whether another user already owns `email` (case-insensitive).
pub fn email_taken(
    conn: &Connection,
    email: &str,
    exclude_user_id: Option<&str>,
) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE email = ?1 AND user_id != COALESCE(?2, '')",
        params![email, exclude_user_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Update the shared identity columns of a user.
fn update_user_columns(
    conn: &Connection,
    user_id: &str,
    email: &str,
    phone_number: Option<&str>,
    date_of_birth: Option<chrono::NaiveDate>,
    is_active: bool,
    updated_at: chrono::NaiveDateTime,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE users SET email = ?2, phone_number = ?3, date_of_birth = ?4,
         is_active = ?5, updated_at = ?6
         WHERE user_id = ?1",
        params![user_id, email, phone_number, date_of_birth, is_active, updated_at],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "User".into(),
            id: user_id.into(),
        });
    }
    Ok(())
}

/// Replace the stored password hash of a user.
pub fn set_password_hash(conn: &Connection, user_id: &str, hash: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE users SET password_hash = ?2 WHERE user_id = ?1",
        params![user_id, hash],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "User".into(),
            id: user_id.into(),
        });
    }
    Ok(())
}

/// Delete a base user; the role row goes with it via ON DELETE CASCADE.
fn delete_user(conn: &Connection, user_id: &str) -> Result<bool, DatabaseError> {
    let deleted = conn.execute("DELETE FROM users WHERE user_id = ?1", params![user_id])?;
    Ok(deleted > 0)
}

// ── Patients ────────────────────────────────────────────────

pub fn insert_patient(
    conn: &Connection,
    patient: &Patient,
    password_hash: Option<&str>,
) -> Result<(), DatabaseError> {
    insert_user(
        conn,
        &User {
            user_id: patient.user_id.clone(),
            email: patient.email.clone(),
            password_hash: password_hash.map(str::to_string),
            phone_number: patient.phone_number.clone(),
            date_of_birth: patient.date_of_birth,
            user_type: UserType::Patient,
            is_active: patient.is_active,
            created_at: patient.created_at,
            updated_at: patient.updated_at,
        },
    )?;
    conn.execute(
        "INSERT INTO patients (patient_id, user_id, full_name, insurance_info, emergency_contact, address)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            patient.patient_id,
            patient.user_id,
            patient.full_name,
            patient.insurance_info,
            patient.emergency_contact,
            patient.address,
        ],
    )?;
    Ok(())
}

pub fn get_patient(conn: &Connection, patient_id: &str) -> Result<Option<Patient>, DatabaseError> {
    let sql = format!("{PATIENT_SELECT} WHERE p.patient_id = ?1");
    let patient = conn
        .query_row(&sql, params![patient_id], patient_from_row)
        .optional()?;
    Ok(patient)
}

pub fn list_patients(conn: &Connection) -> Result<Vec<Patient>, DatabaseError> {
    let sql = format!("{PATIENT_SELECT} ORDER BY u.created_at, p.patient_id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], patient_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn patient_exists(conn: &Connection, patient_id: &str) -> Result<bool, DatabaseError> {
    exists(conn, "SELECT COUNT(*) FROM patients WHERE patient_id = ?1", patient_id)
}

pub fn update_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    update_user_columns(
        conn,
        &patient.user_id,
        &patient.email,
        patient.phone_number.as_deref(),
        patient.date_of_birth,
        patient.is_active,
        patient.updated_at,
    )?;
    conn.execute(
        "UPDATE patients SET full_name = ?2, insurance_info = ?3, emergency_contact = ?4, address = ?5
         WHERE patient_id = ?1",
        params![
            patient.patient_id,
            patient.full_name,
            patient.insurance_info,
            patient.emergency_contact,
            patient.address,
        ],
    )?;
    Ok(())
}

pub fn delete_patient(conn: &Connection, patient_id: &str) -> Result<bool, DatabaseError> {
    match get_patient(conn, patient_id)? {
        Some(patient) => delete_user(conn, &patient.user_id),
        None => Ok(false),
    }
}

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        user_id: row.get(0)?,
        patient_id: row.get(1)?,
        full_name: row.get(2)?,
        email: row.get(3)?,
        phone_number: row.get(4)?,
        date_of_birth: row.get(5)?,
        insurance_info: row.get(6)?,
        emergency_contact: row.get(7)?,
        address: row.get(8)?,
        is_active: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

// ── Doctors ─────────────────────────────────────────────────

pub fn insert_doctor(
    conn: &Connection,
    doctor: &Doctor,
    password_hash: Option<&str>,
) -> Result<(), DatabaseError> {
    insert_user(
        conn,
        &User {
            user_id: doctor.user_id.clone(),
            email: doctor.email.clone(),
            password_hash: password_hash.map(str::to_string),
            phone_number: doctor.phone_number.clone(),
            date_of_birth: None,
            user_type: UserType::Doctor,
            is_active: doctor.is_active,
            created_at: doctor.created_at,
            updated_at: doctor.updated_at,
        },
    )?;
    conn.execute(
        "INSERT INTO doctors (doctor_id, user_id, full_name, specialty, license_number, department)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            doctor.doctor_id,
            doctor.user_id,
            doctor.full_name,
            doctor.specialty,
            doctor.license_number,
            doctor.department,
        ],
    )?;
    Ok(())
}

pub fn get_doctor(conn: &Connection, doctor_id: &str) -> Result<Option<Doctor>, DatabaseError> {
    let sql = format!("{DOCTOR_SELECT} WHERE d.doctor_id = ?1");
    let doctor = conn
        .query_row(&sql, params![doctor_id], doctor_from_row)
        .optional()?;
    Ok(doctor)
}

pub fn list_doctors(conn: &Connection) -> Result<Vec<Doctor>, DatabaseError> {
    let sql = format!("{DOCTOR_SELECT} ORDER BY u.created_at, d.doctor_id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], doctor_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn doctor_exists(conn: &Connection, doctor_id: &str) -> Result<bool, DatabaseError> {
    exists(conn, "SELECT COUNT(*) FROM doctors WHERE doctor_id = ?1", doctor_id)
}

/// Whether another doctor already holds `license_number`.
pub fn license_taken(
    conn: &Connection,
    license_number: &str,
    exclude_doctor_id: Option<&str>,
) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM doctors WHERE license_number = ?1 AND doctor_id != COALESCE(?2, '')",
        params![license_number, exclude_doctor_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn update_doctor(conn: &Connection, doctor: &Doctor) -> Result<(), DatabaseError> {
    update_user_columns(
        conn,
        &doctor.user_id,
        &doctor.email,
        doctor.phone_number.as_deref(),
        None,
        doctor.is_active,
        doctor.updated_at,
    )?;
    conn.execute(
        "UPDATE doctors SET full_name = ?2, specialty = ?3, license_number = ?4, department = ?5
         WHERE doctor_id = ?1",
        params![
            doctor.doctor_id,
            doctor.full_name,
            doctor.specialty,
            doctor.license_number,
            doctor.department,
        ],
    )?;
    Ok(())
}

pub fn delete_doctor(conn: &Connection, doctor_id: &str) -> Result<bool, DatabaseError> {
    match get_doctor(conn, doctor_id)? {
        Some(doctor) => delete_user(conn, &doctor.user_id),
        None => Ok(false),
    }
}

fn doctor_from_row(row: &Row<'_>) -> rusqlite::Result<Doctor> {
    Ok(Doctor {
        user_id: row.get(0)?,
        doctor_id: row.get(1)?,
        full_name: row.get(2)?,
        email: row.get(3)?,
        phone_number: row.get(4)?,
        specialty: row.get(5)?,
        license_number: row.get(6)?,
        department: row.get(7)?,
        is_active: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

// ── System admins ───────────────────────────────────────────

pub fn insert_admin(
    conn: &Connection,
    admin: &SystemAdmin,
    password_hash: Option<&str>,
) -> Result<(), DatabaseError> {
    insert_user(
        conn,
        &User {
            user_id: admin.user_id.clone(),
            email: admin.email.clone(),
            password_hash: password_hash.map(str::to_string),
            phone_number: None,
            date_of_birth: None,
            user_type: UserType::Admin,
            is_active: admin.is_active,
            created_at: admin.created_at,
            updated_at: admin.updated_at,
        },
    )?;
    conn.execute(
        "INSERT INTO system_admins (admin_id, user_id, full_name, access_level)
         VALUES (?1, ?2, ?3, ?4)",
        params![admin.admin_id, admin.user_id, admin.full_name, admin.access_level],
    )?;
    Ok(())
}

pub fn get_admin(conn: &Connection, admin_id: &str) -> Result<Option<SystemAdmin>, DatabaseError> {
    let sql = format!("{ADMIN_SELECT} WHERE a.admin_id = ?1");
    let admin = conn
        .query_row(&sql, params![admin_id], admin_from_row)
        .optional()?;
    Ok(admin)
}

pub fn list_admins(conn: &Connection) -> Result<Vec<SystemAdmin>, DatabaseError> {
    let sql = format!("{ADMIN_SELECT} ORDER BY u.created_at, a.admin_id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], admin_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn admin_exists(conn: &Connection, admin_id: &str) -> Result<bool, DatabaseError> {
    exists(conn, "SELECT COUNT(*) FROM system_admins WHERE admin_id = ?1", admin_id)
}

pub fn delete_admin(conn: &Connection, admin_id: &str) -> Result<bool, DatabaseError> {
    match get_admin(conn, admin_id)? {
        Some(admin) => delete_user(conn, &admin.user_id),
        None => Ok(false),
    }
}

fn admin_from_row(row: &Row<'_>) -> rusqlite::Result<SystemAdmin> {
    Ok(SystemAdmin {
        user_id: row.get(0)?,
        admin_id: row.get(1)?,
        full_name: row.get(2)?,
        email: row.get(3)?,
        access_level: row.get(4)?,
        is_active: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

// ── Counts ──────────────────────────────────────────────────

pub fn count_patients(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))?)
}

/// Patients whose base user row is flagged active.
pub fn count_active_patients(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM patients p JOIN users u ON u.user_id = p.user_id WHERE u.is_active = 1",
        [],
        |row| row.get(0),
    )?)
}

pub fn count_doctors(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM doctors", [], |row| row.get(0))?)
}

pub(super) fn exists(conn: &Connection, sql: &str, id: &str) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(sql, params![id], |row| row.get(0))?;
    Ok(count > 0)
}
