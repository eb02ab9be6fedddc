//! HTTP router.
//!
//! Returns a composable `Router` with every resource nested under `/api/`.
//! `api_service` wraps it so that a trailing slash is accepted on any route.
//!
//! Middleware stack (outermost → innermost): CORS → audit logger → handler.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower::Layer;
use tower_http::cors::CorsLayer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the API router over shared state.
pub fn api_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

/// The router with trailing slashes trimmed before routing.
///
/// Path normalization has to run before the router picks a route, so it
/// wraps the finished `Router` instead of being added with `.layer()`.
pub fn api_service(core: Arc<CoreState>) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(api_router(core))
}

fn build_router(ctx: ApiContext) -> Router {
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    // Static segments such as `/patients/register` win over `/patients/:id`.
    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        // Patients
        .route(
            "/patients",
            get(endpoints::patients::list).post(endpoints::patients::create),
        )
        .route("/patients/register", post(endpoints::patients::register))
        .route(
            "/patients/:id",
            get(endpoints::patients::retrieve)
                .put(endpoints::patients::update)
                .patch(endpoints::patients::update)
                .delete(endpoints::patients::destroy),
        )
        .route(
            "/patients/:id/appointments",
            get(endpoints::patients::appointments),
        )
        .route(
            "/patients/:id/medical_records",
            get(endpoints::patients::medical_records),
        )
        // Doctors
        .route(
            "/doctors",
            get(endpoints::doctors::list).post(endpoints::doctors::create),
        )
        .route("/doctors/register", post(endpoints::doctors::register))
        .route(
            "/doctors/:id",
            get(endpoints::doctors::retrieve)
                .put(endpoints::doctors::update)
                .patch(endpoints::doctors::update)
                .delete(endpoints::doctors::destroy),
        )
        .route("/doctors/:id/schedule", get(endpoints::doctors::schedule))
        .route(
            "/doctors/:id/set_schedule",
            post(endpoints::doctors::set_schedule),
        )
        .route(
            "/doctors/:id/appointments",
            get(endpoints::doctors::appointments),
        )
        // Admins
        .route(
            "/admins",
            get(endpoints::admins::list).post(endpoints::admins::create),
        )
        .route(
            "/admins/:id",
            get(endpoints::admins::retrieve).delete(endpoints::admins::destroy),
        )
        // Time slots
        .route(
            "/time-slots",
            get(endpoints::time_slots::list).post(endpoints::time_slots::create),
        )
        .route("/time-slots/available", get(endpoints::time_slots::available))
        .route(
            "/time-slots/create_slots",
            post(endpoints::time_slots::create_slots),
        )
        .route(
            "/time-slots/:id",
            get(endpoints::time_slots::retrieve)
                .put(endpoints::time_slots::update)
                .patch(endpoints::time_slots::update)
                .delete(endpoints::time_slots::destroy),
        )
        // Appointments
        .route(
            "/appointments",
            get(endpoints::appointments::list).post(endpoints::appointments::book),
        )
        .route(
            "/appointments/:id",
            get(endpoints::appointments::retrieve)
                .put(endpoints::appointments::update)
                .patch(endpoints::appointments::update)
                .delete(endpoints::appointments::destroy),
        )
        .route(
            "/appointments/:id/confirm",
            post(endpoints::appointments::confirm),
        )
        .route(
            "/appointments/:id/cancel",
            post(endpoints::appointments::cancel),
        )
        .route(
            "/appointments/:id/complete",
            post(endpoints::appointments::complete),
        )
        .route(
            "/appointments/:id/reschedule",
            post(endpoints::appointments::reschedule),
        )
        // Medical records
        .route(
            "/medical-records",
            get(endpoints::medical_records::list).post(endpoints::medical_records::create),
        )
        .route(
            "/medical-records/:id",
            get(endpoints::medical_records::retrieve)
                .put(endpoints::medical_records::update)
                .patch(endpoints::medical_records::update)
                .delete(endpoints::medical_records::destroy),
        )
        .route(
            "/medical-records/:id/medications",
            post(endpoints::medical_records::add_medication),
        )
        .route(
            "/medical-records/:id/test_results",
            post(endpoints::medical_records::add_test_result),
        )
        // Notifications
        .route(
            "/notifications",
            get(endpoints::notifications::list).post(endpoints::notifications::create),
        )
        .route(
            "/notifications/user_notifications",
            get(endpoints::notifications::user_notifications),
        )
        .route(
            "/notifications/:id",
            get(endpoints::notifications::retrieve)
                .put(endpoints::notifications::update)
                .patch(endpoints::notifications::update)
                .delete(endpoints::notifications::destroy),
        )
        .route(
            "/notifications/:id/mark_read",
            post(endpoints::notifications::mark_read),
        )
        // Reports
        .route(
            "/reports",
            get(endpoints::reports::list).post(endpoints::reports::generate),
        )
        .route("/reports/generate", post(endpoints::reports::generate))
        .route(
            "/reports/:id",
            get(endpoints::reports::retrieve)
                .put(endpoints::reports::update)
                .patch(endpoints::reports::update)
                .delete(endpoints::reports::destroy),
        )
        // Analytics
        .route(
            "/analytics",
            get(endpoints::analytics::list).post(endpoints::analytics::create),
        )
        .route("/analytics/dashboard", get(endpoints::analytics::dashboard))
        .route(
            "/analytics/:id",
            get(endpoints::analytics::retrieve)
                .put(endpoints::analytics::update)
                .patch(endpoints::analytics::update)
                .delete(endpoints::analytics::destroy),
        )
        .with_state(ctx)
        .layer(axum::middleware::from_fn(middleware::audit::log_access));

    Router::new()
        .nest("/api", api)
        .layer(CorsLayer::permissive())
}
