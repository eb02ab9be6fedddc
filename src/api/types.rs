//! Shared types for the HTTP API layer.

use std::sync::Arc;

use axum::extract::FromRequest;
use rusqlite::Connection;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::core_state::CoreState;
use crate::error::ServiceError;

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }

    /// Run one domain operation against the shared connection.
    ///
    /// The lock is released before the handler returns, so it is never
    /// held across an await point.
    pub fn with_db<T>(
        &self,
        op: impl FnOnce(&Connection) -> Result<T, ServiceError>,
    ) -> Result<T, ApiError> {
        let conn = self.core.lock_db()?;
        Ok(op(&conn)?)
    }
}

/// JSON body extractor whose rejections render as [`ApiError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `{message, data}` envelope for custom create actions.
#[derive(Debug, Serialize)]
pub struct MessageData<T> {
    pub message: &'static str,
    pub data: T,
}

/// `{message, status}` body for lifecycle actions.
#[derive(Debug, Serialize)]
pub struct StatusMessage<S> {
    pub message: &'static str,
    pub status: S,
}
