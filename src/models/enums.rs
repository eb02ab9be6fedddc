use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The string form doubles as the serde wire value.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }

            /// Every accepted wire value, in declaration order.
            pub fn choices() -> &'static [&'static str] {
                &[$($s),+]
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(UserType {
    Patient => "PATIENT",
    Doctor => "DOCTOR",
    Admin => "ADMIN",
});

str_enum!(AppointmentStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    Cancelled => "cancelled",
    Completed => "completed",
});

str_enum!(NotificationType {
    AppointmentConfirmation => "APPOINTMENT_CONFIRMATION",
    AppointmentReminder => "APPOINTMENT_REMINDER",
    AppointmentCancellation => "APPOINTMENT_CANCELLATION",
    TestResultsAvailable => "TEST_RESULTS_AVAILABLE",
    General => "GENERAL",
});

str_enum!(Priority {
    Low => "LOW",
    Medium => "MEDIUM",
    High => "HIGH",
    Urgent => "URGENT",
});

str_enum!(ReportType {
    AppointmentStatistics => "APPOINTMENT_STATISTICS",
    PatientDemographics => "PATIENT_DEMOGRAPHICS",
    DoctorPerformance => "DOCTOR_PERFORMANCE",
    SystemUsage => "SYSTEM_USAGE",
});

impl AppointmentStatus {
    /// Pending and confirmed appointments hold their time slot.
    pub fn holds_slot(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// Cancelled and completed are terminal.
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Pending, Completed)
                | (Confirmed, Cancelled)
                | (Confirmed, Completed)
        )
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}
