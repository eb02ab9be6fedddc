pub mod appointment;
pub mod clinical;
pub mod enums;
pub mod notification;
pub mod report;
pub mod scheduling;
pub mod user;

pub use appointment::*;
pub use clinical::*;
pub use notification::*;
pub use report::*;
pub use scheduling::*;
pub use user::*;

use chrono::{NaiveDateTime, Timelike};

/// Current UTC time truncated to whole seconds, as stored in every timestamp column.
pub fn timestamp_now() -> NaiveDateTime {
    let now = chrono::Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}
