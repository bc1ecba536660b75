//! HTTP layer: route handlers, DTOs, OpenAPI document, and router
//! composition.

pub mod dto;
pub mod handlers;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI description of every public endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "lead-gateway",
        description = "Ingests payment-platform webhooks and serves the stored leads."
    ),
    paths(
        handlers::webhook::receive_webhook,
        handlers::leads::list_leads,
        handlers::system::health_handler,
    ),
    components(schemas(
        crate::domain::Lead,
        crate::domain::LeadType,
        crate::domain::LeadStatus,
        crate::config::StorageKind,
        crate::service::IngestStatsSnapshot,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
        dto::WebhookAck,
        dto::HealthResponse,
    )),
    tags(
        (name = "Webhooks", description = "Inbound platform notifications"),
        (name = "Leads", description = "Stored lead records"),
        (name = "System", description = "Operational endpoints"),
    )
)]
pub struct ApiDoc;

/// Builds the router with every endpoint, without state or middleware.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .merge(handlers::routes())
        .merge(handlers::system::routes())
}

/// Builds the complete application: routes, optional Swagger UI, tracing
/// and CORS layers, bound to `state`.
pub fn build_app(state: AppState) -> Router {
    let router = build_router();

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
