use axum::http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    HeaderName, Method,
};
use tower_http::cors::{Any, CorsLayer};

/// `Access-Control-Allow-Methods` value attached to every response
pub const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";

/// `Access-Control-Allow-Headers` value attached to every response
pub const ALLOWED_HEADERS: &str = "Content-Type, Authorization, X-Client-Info, Apikey";

/// Permissive CORS for the browser front end
///
/// Any `OPTIONS` request is answered here with 200 and an empty body, before routing,
/// authentication or configuration checks run.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ])
}
