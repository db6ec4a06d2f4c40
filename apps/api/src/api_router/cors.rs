use accessmgmt_core::AppError;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::CorsLayer;

use crate::middleware::{CHANGED_BY_HEADER, CHANGED_BY_SYSTEM_HEADER, OPERATION_ID_HEADER};

pub(super) fn build_cors_layer(frontend_url: &str) -> Result<CorsLayer, AppError> {
    Ok(CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            CONTENT_TYPE,
            HeaderName::from_static(CHANGED_BY_HEADER),
            HeaderName::from_static(CHANGED_BY_SYSTEM_HEADER),
            HeaderName::from_static(OPERATION_ID_HEADER),
        ]))
}
