use axum::http::{HeaderName, Method, header};
use tower_http::cors::{Any, CorsLayer};

use crate::observability::REQUEST_ID_HEADER;

/// Permissive CORS for services called directly from a browser frontend.
pub fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
}
