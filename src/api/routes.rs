use axum::{
    http::{header, HeaderValue},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};

use super::handlers;
use super::AppState;
use crate::error::panic_response;
use crate::middleware::{
    cors,
    request_id::{make_span_with_request_id, request_id_middleware},
};

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    // Outermost first: preflight is answered before request ids, tracing or handlers run,
    // and every other response (panics included) still leaves with CORS headers.
    let middleware = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(cors::ALLOWED_METHODS),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(cors::ALLOWED_HEADERS),
        ))
        .layer(cors::cors_layer())
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(CatchPanicLayer::custom(panic_response));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .layer(middleware)
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new().route(
        "/recommendations",
        post(handlers::generate_recommendations).get(handlers::active_recommendations),
    )
}
