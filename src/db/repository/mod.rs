//! Repository layer: entity-scoped database operations.
//!
//! One sub-module per table family. Functions take a borrowed
//! `Connection` so callers can run them inside a transaction.

mod appointment;
mod medical_record;
mod notification;
mod report;
mod schedule;
mod time_slot;
mod user;

pub use appointment::*;
pub use medical_record::*;
pub use notification::*;
pub use report::*;
pub use schedule::*;
pub use time_slot::*;
pub use user::*;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
    use crate::db::sqlite::open_memory_database;
    use crate::db::DatabaseError;
    use crate::models::*;
    use crate::models::enums::*;
    use rusqlite::Connection;

    fn test_db() -> Connection {
        open_memory_database().unwrap()
    }

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn make_patient(conn: &Connection, patient_id: &str, email: &str) -> Patient {
        let patient = Patient {
            user_id: format!("USR-{patient_id}"),
            patient_id: patient_id.into(),
            full_name: "John Doe".into(),
            email: email.into(),
            phone_number: Some("+1-555-0123".into()),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 15),
            insurance_info: Some("Blue Cross".into()),
            emergency_contact: None,
            address: None,
            is_active: true,
            created_at: ts("2024-01-15 10:00:00"),
            updated_at: ts("2024-01-15 10:00:00"),
        };
        insert_patient(conn, &patient, Some("hash")).unwrap();
        patient
    }

    fn make_doctor(conn: &Connection, doctor_id: &str, license: &str) -> Doctor {
        let doctor = Doctor {
            user_id: format!("USR-{doctor_id}"),
            doctor_id: doctor_id.into(),
            full_name: "Dr. Sarah Johnson".into(),
            email: format!("{doctor_id}@hospital.com").to_lowercase(),
            phone_number: None,
            specialty: "Cardiology".into(),
            license_number: license.into(),
            department: "Cardiology Department".into(),
            is_active: true,
            created_at: ts("2024-01-15 10:00:00"),
            updated_at: ts("2024-01-15 10:00:00"),
        };
        insert_doctor(conn, &doctor, None).unwrap();
        doctor
    }

    fn make_slot(conn: &Connection, slot_id: &str, day: u32) -> TimeSlot {
        let slot = TimeSlot {
            slot_id: slot_id.into(),
            start_time: ts(&format!("2024-03-{day:02} 09:00:00")),
            end_time: ts(&format!("2024-03-{day:02} 17:00:00")),
            is_available: true,
        };
        insert_time_slot(conn, &slot).unwrap();
        slot
    }

    fn make_appointment(conn: &Connection, id: &str, slot_id: &str, status: AppointmentStatus) {
        insert_appointment(conn, &Appointment {
            appointment_id: id.into(),
            patient_id: "PAT-1".into(),
            doctor_id: "DOC-1".into(),
            appointment_date: ts("2024-03-01 09:00:00"),
            time_slot_id: slot_id.into(),
            specialty: "Cardiology".into(),
            reason_for_visit: "Checkup".into(),
            status,
            notes: None,
            created_at: ts("2024-02-01 08:00:00"),
            updated_at: ts("2024-02-01 08:00:00"),
        })
        .unwrap();
    }

    #[test]
    fn patient_insert_and_retrieve_joins_user_columns() {
        let conn = test_db();
        make_patient(&conn, "PAT-1", "john@example.com");

        let patient = get_patient(&conn, "PAT-1").unwrap().unwrap();
        assert_eq!(patient.full_name, "John Doe");
        assert_eq!(patient.email, "john@example.com");
        assert_eq!(patient.date_of_birth, NaiveDate::from_ymd_opt(1990, 5, 15));
        assert!(patient.is_active);

        assert!(get_patient(&conn, "PAT-404").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_is_unique_violation() {
        let conn = test_db();
        make_patient(&conn, "PAT-1", "john@example.com");
        assert!(email_taken(&conn, "JOHN@example.com", None).unwrap());
        assert!(!email_taken(&conn, "john@example.com", Some("USR-PAT-1")).unwrap());

        let mut clash = get_patient(&conn, "PAT-1").unwrap().unwrap();
        clash.patient_id = "PAT-2".into();
        clash.user_id = "USR-PAT-2".into();
        let err = insert_patient(&conn, &clash, None).unwrap_err();
        assert!(err.is_unique_violation(), "unexpected error: {err}");
    }

    #[test]
    fn delete_patient_cascades_to_user_row() {
        let conn = test_db();
        make_patient(&conn, "PAT-1", "john@example.com");
        assert!(delete_patient(&conn, "PAT-1").unwrap());
        assert!(!delete_patient(&conn, "PAT-1").unwrap());
        assert!(get_user_by_email(&conn, "john@example.com").unwrap().is_none());
        assert_eq!(count_patients(&conn).unwrap(), 0);
    }

    #[test]
    fn user_lookup_by_email_parses_type() {
        let conn = test_db();
        make_doctor(&conn, "DOC-1", "MD-1");
        let user = get_user_by_email(&conn, "doc-1@hospital.com").unwrap().unwrap();
        assert_eq!(user.user_type, UserType::Doctor);
        assert!(user.password_hash.is_none());
    }

    #[test]
    fn set_password_hash_replaces_stored_hash() {
        let conn = test_db();
        make_doctor(&conn, "DOC-1", "MD-1");
        set_password_hash(&conn, "USR-DOC-1", "pbkdf2_sha256$1$c2FsdA$aGFzaA").unwrap();
        let user = get_user_by_email(&conn, "doc-1@hospital.com").unwrap().unwrap();
        assert_eq!(user.password_hash.as_deref(), Some("pbkdf2_sha256$1$c2FsdA$aGFzaA"));

        assert!(matches!(
            set_password_hash(&conn, "USR-NOPE", "x"),
            Err(DatabaseError::NotFound { .. })
        ));
    }

    #[test]
    fn doctor_update_and_license_check() {
        let conn = test_db();
        let mut doctor = make_doctor(&conn, "DOC-1", "MD-1");
        make_doctor(&conn, "DOC-2", "MD-2");
        assert!(license_taken(&conn, "MD-2", Some("DOC-1")).unwrap());
        assert!(!license_taken(&conn, "MD-1", Some("DOC-1")).unwrap());

        doctor.department = "Cardiac Surgery".into();
        update_doctor(&conn, &doctor).unwrap();
        let reloaded = get_doctor(&conn, "DOC-1").unwrap().unwrap();
        assert_eq!(reloaded.department, "Cardiac Surgery");
        assert_eq!(list_doctors(&conn).unwrap().len(), 2);
        assert_eq!(count_doctors(&conn).unwrap(), 2);
    }

    #[test]
    fn admin_round_trip() {
        let conn = test_db();
        let admin = SystemAdmin {
            user_id: "USR-A".into(),
            admin_id: "ADM-1".into(),
            full_name: "Root".into(),
            email: "root@hospital.com".into(),
            access_level: "FULL".into(),
            is_active: true,
            created_at: ts("2024-01-01 00:00:00"),
            updated_at: ts("2024-01-01 00:00:00"),
        };
        insert_admin(&conn, &admin, None).unwrap();
        assert!(admin_exists(&conn, "ADM-1").unwrap());
        assert_eq!(list_admins(&conn).unwrap()[0].access_level, "FULL");
        assert!(delete_admin(&conn, "ADM-1").unwrap());
        assert!(get_admin(&conn, "ADM-1").unwrap().is_none());
    }

    #[test]
    fn reserve_is_conditional() {
        let conn = test_db();
        make_slot(&conn, "TS-1", 1);

        assert!(try_reserve_time_slot(&conn, "TS-1").unwrap());
        assert!(!try_reserve_time_slot(&conn, "TS-1").unwrap(), "second claim must lose");
        assert!(!try_reserve_time_slot(&conn, "TS-404").unwrap());
        assert!(!get_time_slot(&conn, "TS-1").unwrap().unwrap().is_available);

        release_time_slot(&conn, "TS-1").unwrap();
        assert!(get_time_slot(&conn, "TS-1").unwrap().unwrap().is_available);
    }

    #[test]
    fn active_appointment_lookup_ignores_terminal_states() {
        let conn = test_db();
        make_slot(&conn, "TS-1", 1);
        make_slot(&conn, "TS-2", 2);
        make_slot(&conn, "TS-3", 3);
        make_appointment(&conn, "APT-1", "TS-1", AppointmentStatus::Confirmed);
        make_appointment(&conn, "APT-2", "TS-2", AppointmentStatus::Cancelled);
        make_appointment(&conn, "APT-3", "TS-2", AppointmentStatus::Completed);

        assert!(slot_has_active_appointment(&conn, "TS-1").unwrap());
        assert!(!slot_has_active_appointment(&conn, "TS-2").unwrap());
        assert!(!slot_has_active_appointment(&conn, "TS-3").unwrap());
    }

    #[test]
    fn available_slots_filter() {
        let conn = test_db();
        make_slot(&conn, "TS-1", 1);
        make_slot(&conn, "TS-2", 2);
        try_reserve_time_slot(&conn, "TS-1").unwrap();

        let available = list_available_time_slots(&conn).unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].slot_id, "TS-2");
        assert_eq!(count_available_time_slots(&conn).unwrap(), 1);
        assert_eq!(list_time_slots(&conn).unwrap().len(), 2);
    }

    #[test]
    fn schedule_with_linked_slots() {
        let conn = test_db();
        make_doctor(&conn, "DOC-1", "MD-1");
        make_slot(&conn, "TS-1", 1);
        make_slot(&conn, "TS-2", 2);
        insert_schedule(&conn, &Schedule {
            schedule_id: "SCH-1".into(),
            doctor_id: "DOC-1".into(),
            working_days: vec!["Monday".into(), "Friday".into()],
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            available_slots: Vec::new(),
        })
        .unwrap();
        link_schedule_slot(&conn, "SCH-1", "TS-1").unwrap();
        link_schedule_slot(&conn, "SCH-1", "TS-2").unwrap();
        link_schedule_slot(&conn, "SCH-1", "TS-2").unwrap();
        try_reserve_time_slot(&conn, "TS-2").unwrap();

        let schedule = get_schedule(&conn, "SCH-1").unwrap().unwrap();
        assert_eq!(schedule.working_days, vec!["Monday", "Friday"]);
        assert_eq!(schedule.available_slots.len(), 1, "reserved slot is not available");
        assert_eq!(list_schedules_for_doctor(&conn, "DOC-1").unwrap().len(), 1);
    }

    #[test]
    fn schedule_requires_existing_doctor() {
        let conn = test_db();
        let result = insert_schedule(&conn, &Schedule {
            schedule_id: "SCH-1".into(),
            doctor_id: "DOC-404".into(),
            working_days: Vec::new(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            available_slots: Vec::new(),
        });
        assert!(matches!(result, Err(DatabaseError::Sqlite(_))));
    }

    #[test]
    fn appointment_status_counts() {
        let conn = test_db();
        make_slot(&conn, "TS-1", 1);
        make_appointment(&conn, "APT-1", "TS-1", AppointmentStatus::Pending);
        make_appointment(&conn, "APT-2", "TS-1", AppointmentStatus::Cancelled);
        make_appointment(&conn, "APT-3", "TS-1", AppointmentStatus::Pending);

        assert_eq!(count_appointments(&conn).unwrap(), 3);
        assert_eq!(count_appointments_by_status(&conn, AppointmentStatus::Pending).unwrap(), 2);
        assert_eq!(count_appointments_by_status(&conn, AppointmentStatus::Completed).unwrap(), 0);

        update_appointment_status(&conn, "APT-1", AppointmentStatus::Confirmed, ts("2024-02-02 08:00:00")).unwrap();
        let appt = get_appointment(&conn, "APT-1").unwrap().unwrap();
        assert_eq!(appt.status, AppointmentStatus::Confirmed);
        assert_eq!(appt.updated_at, ts("2024-02-02 08:00:00"));

        assert_eq!(list_appointments_for_patient(&conn, "PAT-1").unwrap().len(), 3);
        assert!(list_appointments_for_doctor(&conn, "DOC-404").unwrap().is_empty());
    }

    #[test]
    fn status_update_on_missing_appointment_is_not_found() {
        let conn = test_db();
        let err = update_appointment_status(&conn, "APT-404", AppointmentStatus::Confirmed, ts("2024-02-02 08:00:00"))
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn deleting_slot_cascades_to_appointments() {
        let conn = test_db();
        make_slot(&conn, "TS-1", 1);
        make_appointment(&conn, "APT-1", "TS-1", AppointmentStatus::Pending);
        assert!(delete_time_slot(&conn, "TS-1").unwrap());
        assert!(get_appointment(&conn, "APT-1").unwrap().is_none());
    }

    #[test]
    fn medical_record_links_medications_and_tests() {
        let conn = test_db();
        insert_medical_record(&conn, &MedicalRecord {
            record_id: "MR-1".into(),
            patient_id: "PAT-1".into(),
            doctor_id: "DOC-1".into(),
            visit_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            diagnosis: "Hypertension Stage 1".into(),
            treatment_plan: "Lifestyle modifications".into(),
            visit_type: "Follow-up".into(),
        })
        .unwrap();
        insert_medication(&conn, &Medication {
            medication_id: "MED-1".into(),
            name: "Lisinopril".into(),
            dosage: "10mg".into(),
            frequency: "daily".into(),
            duration: "30 days".into(),
            prescribed_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        })
        .unwrap();
        insert_test_result(&conn, &TestResult {
            test_id: "TR-1".into(),
            test_name: "Lipid panel".into(),
            test_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            results: "LDL 130".into(),
            status: "final".into(),
            normal_ranges: Some("LDL < 100".into()),
        })
        .unwrap();
        link_record_medication(&conn, "MR-1", "MED-1").unwrap();
        link_record_test_result(&conn, "MR-1", "TR-1").unwrap();

        assert_eq!(get_record_medications(&conn, "MR-1").unwrap()[0].name, "Lisinopril");
        assert_eq!(get_record_test_results(&conn, "MR-1").unwrap()[0].test_name, "Lipid panel");
        assert_eq!(list_medical_records_for_patient(&conn, "PAT-1").unwrap().len(), 1);

        assert!(delete_medical_record(&conn, "MR-1").unwrap());
        assert!(get_record_medications(&conn, "MR-1").unwrap().is_empty());
        assert_eq!(count_medical_records(&conn).unwrap(), 0);
    }

    #[test]
    fn notifications_newest_first_and_mark_read() {
        let conn = test_db();
        for (id, sent) in [("NOT-1", "2024-03-01 09:00:00"), ("NOT-2", "2024-03-02 09:00:00")] {
            insert_notification(&conn, &Notification {
                notification_id: id.into(),
                user_id: "PAT-1".into(),
                notification_type: NotificationType::General,
                message: "hello".into(),
                sent_date: ts(sent),
                is_read: false,
                priority: Priority::Low,
            })
            .unwrap();
        }

        let list = list_notifications_for_user(&conn, "PAT-1").unwrap();
        assert_eq!(list[0].notification_id, "NOT-2");
        assert_eq!(count_unread_notifications(&conn).unwrap(), 2);

        assert!(mark_notification_read(&conn, "NOT-1").unwrap());
        assert!(!mark_notification_read(&conn, "NOT-404").unwrap());
        assert!(get_notification(&conn, "NOT-1").unwrap().unwrap().is_read);
        assert_eq!(count_unread_notifications(&conn).unwrap(), 1);
    }

    #[test]
    fn analytics_period_is_json() {
        let conn = test_db();
        insert_analytics(&conn, &Analytics {
            analytics_id: "ANL-1".into(),
            metric_type: "no_show_rate".into(),
            value: "0.04".into(),
            period: serde_json::json!({"start": "2024-01-01", "end": "2024-01-31"}),
        })
        .unwrap();
        let stored = get_analytics(&conn, "ANL-1").unwrap().unwrap();
        assert_eq!(stored.period["start"], "2024-01-01");
        assert_eq!(list_analytics(&conn).unwrap().len(), 1);
    }

    #[test]
    fn report_round_trip() {
        let conn = test_db();
        insert_report(&conn, &Report {
            report_id: "RPT-1".into(),
            report_type: ReportType::AppointmentStatistics,
            generated_date: ts("2024-03-01 09:00:00"),
            data: "Total Appointments: 0".into(),
            generated_by: "ADM-1".into(),
        })
        .unwrap();
        let report = get_report(&conn, "RPT-1").unwrap().unwrap();
        assert_eq!(report.report_type, ReportType::AppointmentStatistics);
        assert!(delete_report(&conn, "RPT-1").unwrap());
        assert!(list_reports(&conn).unwrap().is_empty());
    }
}
