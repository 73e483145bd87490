pub mod cors;
pub mod security_headers;
pub mod tracing;

pub use cors::permissive_cors;
pub use security_headers::security_headers_middleware;
pub use tracing::{RequestId, http_trace_layer, request_id_middleware};
