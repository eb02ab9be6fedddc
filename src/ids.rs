//! Opaque identifier codes: `PREFIX-XXXXXXXX`.
//!
//! The suffix is the first eight hex digits of a v4 UUID, upper-cased.

use uuid::Uuid;

pub const USER: &str = "USR";
pub const PATIENT: &str = "PAT";
pub const DOCTOR: &str = "DOC";
pub const ADMIN: &str = "ADM";
pub const SCHEDULE: &str = "SCH";
pub const TIME_SLOT: &str = "TS";
pub const APPOINTMENT: &str = "APT";
pub const MEDICAL_RECORD: &str = "MR";
pub const MEDICATION: &str = "MED";
pub const TEST_RESULT: &str = "TR";
pub const NOTIFICATION: &str = "NOT";
pub const REPORT: &str = "RPT";
pub const ANALYTICS: &str = "ANL";

/// Generate a new code with the given prefix.
pub fn generate(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", hex[..8].to_uppercase())
}

/// Use the caller's code when present and non-blank, otherwise generate one.
pub fn or_generate(supplied: Option<String>, prefix: &str) -> String {
    supplied
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| generate(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_code_shape() {
        let id = generate(APPOINTMENT);
        assert_eq!(id.len(), "APT-".len() + 8);
        assert!(id.starts_with("APT-"));
        assert!(id[4..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn codes_are_unique() {
        assert_ne!(generate(TIME_SLOT), generate(TIME_SLOT));
    }

    #[test]
    fn supplied_code_wins_unless_blank() {
        assert_eq!(or_generate(Some("PAT-1234".into()), PATIENT), "PAT-1234");
        assert!(or_generate(Some("  ".into()), PATIENT).starts_with("PAT-"));
        assert!(or_generate(None, DOCTOR).starts_with("DOC-"));
    }
}
