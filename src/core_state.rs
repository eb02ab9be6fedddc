//! Shared application state handed to every request handler.
//!
//! One SQLite connection behind a `Mutex`. Handlers lock it for the
//! duration of one domain operation and never across an `.await`.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;

use crate::db;

pub struct CoreState {
    db: Mutex<Connection>,
}

impl CoreState {
    /// Open (and migrate) the database file at `path`.
    pub fn open(path: &Path) -> Result<Self, CoreError> {
        Ok(Self::with_connection(db::open_database(path)?))
    }

    /// Fresh migrated in-memory database. Used by tests and demos.
    pub fn in_memory() -> Result<Self, CoreError> {
        Ok(Self::with_connection(db::open_memory_database()?))
    }

    pub fn with_connection(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
        }
    }

    /// Lock the connection for one unit of work.
    pub fn lock_db(&self) -> Result<MutexGuard<'_, Connection>, CoreError> {
        self.db.lock().map_err(|_| CoreError::LockPoisoned)
    }
}

/// Errors from CoreState operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_state_is_migrated() {
        let state = CoreState::in_memory().unwrap();
        let conn = state.lock_db().unwrap();
        assert_eq!(db::count_tables(&conn).unwrap(), 17);
    }

    #[test]
    fn file_state_persists_between_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("harms.db");
        {
            let state = CoreState::open(&path).unwrap();
            let conn = state.lock_db().unwrap();
            conn.execute(
                "INSERT INTO time_slots (slot_id, start_time, end_time, is_available)
                 VALUES ('TS-1', '2024-03-01 09:00:00', '2024-03-01 17:00:00', 1)",
                [],
            )
            .unwrap();
        }
        let state = CoreState::open(&path).unwrap();
        let conn = state.lock_db().unwrap();
        assert_eq!(db::count_available_time_slots(&conn).unwrap(), 1);
    }

    #[test]
    fn poisoned_lock_is_reported() {
        let state = std::sync::Arc::new(CoreState::in_memory().unwrap());
        let clone = state.clone();
        let _ = std::thread::spawn(move || {
            let _guard = clone.lock_db().unwrap();
            panic!("poison");
        })
        .join();
        assert!(matches!(state.lock_db(), Err(CoreError::LockPoisoned)));
    }
}
