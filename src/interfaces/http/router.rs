//! API Router with Swagger UI

use axum::{
    extract::FromRef,
    middleware,
    routing::{get, patch, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use super::common::ApiResponse;
use super::middleware::{auth_middleware, AuthState};
use super::modules::metrics::{http_metrics_middleware, prometheus_metrics, MetricsState};
use super::modules::request_id::request_id_middleware;
use super::modules::{admin, bookings, driver, health, owner, stations};
use super::state::AppState;
use crate::application::booking::{DailyRevenue, RevenueSummary, StationUsage};
use crate::application::{Availability, StationAvailability};
use crate::domain::{BookingStatus, RiskLevel, StationStatus, TelemetrySample};
use crate::interfaces::ws::{ws_admin_alerts, ws_owner_telemetry};

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer token"))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        bookings::create_booking,
        bookings::list_my_bookings,
        bookings::get_booking,
        bookings::cancel_booking,
        stations::get_availability,
        stations::get_station_health,
        stations::get_station_telemetry,
        driver::get_station_map,
        owner::get_revenue,
        owner::get_revenue_breakdown,
        admin::list_critical_faults,
        admin::update_station_status,
        admin::enable_user,
        admin::disable_user,
    ),
    components(
        schemas(
            ApiResponse<String>,
            health::HealthResponse,
            health::ComponentHealth,
            bookings::dto::CreateBookingRequest,
            bookings::dto::BookingDto,
            BookingStatus,
            StationAvailability,
            Availability,
            StationStatus,
            stations::dto::StationHealthDto,
            RiskLevel,
            TelemetrySample,
            driver::MapStationDto,
            RevenueSummary,
            StationUsage,
            DailyRevenue,
            admin::CriticalFaultDto,
            admin::UpdateStationStatusRequest,
            admin::StationStatusDto,
            admin::UserStatusDto,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service liveness"),
        (name = "Bookings", description = "Reserve, list and cancel charging slots"),
        (name = "Stations", description = "Availability, health and raw telemetry per station"),
        (name = "Driver", description = "Station map for drivers"),
        (name = "Owner", description = "Revenue and usage across the caller's stations"),
        (name = "Admin", description = "Fleet-wide fault overview, station status and accounts"),
    ),
    info(
        title = "EcoCharge API",
        version = "1.0.0",
        description = "Charging-station booking and telemetry backend",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Build the full HTTP surface. `/metrics` is mounted only when a
/// Prometheus recorder is installed.
pub fn create_api_router(state: AppState, prometheus: Option<PrometheusHandle>) -> Router {
    let auth = middleware::from_fn_with_state(AuthState::from_ref(&state), auth_middleware);

    let protected = Router::new()
        .route("/api/v1/bookings", post(bookings::create_booking))
        .route("/api/v1/bookings/my", get(bookings::list_my_bookings))
        .route("/api/v1/bookings/{id}", get(bookings::get_booking))
        .route("/api/v1/bookings/{id}/cancel", patch(bookings::cancel_booking))
        .route("/api/v1/stations/{id}/health", get(stations::get_station_health))
        .route("/api/v1/stations/{id}/telemetry", get(stations::get_station_telemetry))
        .route("/api/v1/driver/stations/map", get(driver::get_station_map))
        .route("/api/v1/owner/revenue", get(owner::get_revenue))
        .route("/api/v1/owner/revenue/breakdown", get(owner::get_revenue_breakdown))
        .route("/api/v1/admin/faults/critical", get(admin::list_critical_faults))
        .route("/api/v1/admin/stations/{id}/status", patch(admin::update_station_status))
        .route("/api/v1/admin/users/{id}/enable", patch(admin::enable_user))
        .route("/api/v1/admin/users/{id}/disable", patch(admin::disable_user))
        .route_layer(auth);

    // push channels authenticate through `?token=` during admission
    let public = Router::new()
        .route("/health", get(health::health_check))
        .route("/api/v1/stations/{id}/availability", get(stations::get_availability))
        .route("/ws/owner/telemetry", get(ws_owner_telemetry))
        .route("/ws/admin/alerts", get(ws_admin_alerts));

    let mut app = public
        .merge(protected)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    if let Some(handle) = prometheus {
        app = app.route(
            "/metrics",
            get(prometheus_metrics).with_state(MetricsState { handle }),
        );
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // outermost first; Cors needs a defaultable body so it sits inside Trace
    app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .layer(middleware::from_fn(request_id_middleware))
            .layer(middleware::from_fn(http_metrics_middleware)),
    )
}
