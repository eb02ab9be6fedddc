//! JSON REST API.
//!
//! Every resource lives under `/api/`. Handlers are thin: they lock the
//! shared connection, call one domain operation and map its errors
//! through [`error::ApiError`].

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::{api_router, api_service};
pub use server::{start_api_server_on, ApiServer, ServerError};
pub use types::ApiContext;
