use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medication {
    pub medication_id: String,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    pub prescribed_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub test_id: String,
    pub test_name: String,
    pub test_date: NaiveDate,
    pub results: String,
    pub status: String,
    pub normal_ranges: Option<String>,
}

/// Stored medical record row without its linked clinical items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalRecord {
    pub record_id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub visit_date: NaiveDate,
    pub diagnosis: String,
    pub treatment_plan: String,
    pub visit_type: String,
}

/// Medical record with medications and test results expanded.
#[derive(Debug, Clone, Serialize)]
pub struct MedicalRecordView {
    #[serde(flatten)]
    pub record: MedicalRecord,
    pub medications: Vec<Medication>,
    pub test_results: Vec<TestResult>,
}
