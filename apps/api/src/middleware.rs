use accessmgmt_core::{AppError, AuditContext};
use axum::extract::Request;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

use crate::error::ApiResult;

pub const CHANGED_BY_HEADER: &str = "x-changed-by";
pub const CHANGED_BY_SYSTEM_HEADER: &str = "x-changed-by-system";
pub const OPERATION_ID_HEADER: &str = "x-operation-id";

/// Attaches the caller's [`AuditContext`] to mutation requests.
pub async fn require_audit_context(mut request: Request, next: Next) -> ApiResult<Response> {
    let audit = audit_context_from_headers(request.headers())?;

    request.extensions_mut().insert(audit);
    Ok(next.run(request).await)
}

fn audit_context_from_headers(headers: &HeaderMap) -> Result<AuditContext, AppError> {
    let changed_by = required_uuid_header(headers, CHANGED_BY_HEADER)?;
    let changed_by_system = required_uuid_header(headers, CHANGED_BY_SYSTEM_HEADER)?;

    match optional_uuid_header(headers, OPERATION_ID_HEADER)? {
        Some(operation_id) => Ok(AuditContext::with_operation_id(
            changed_by,
            changed_by_system,
            operation_id,
        )),
        None => Ok(AuditContext::new(changed_by, changed_by_system)),
    }
}

fn required_uuid_header(headers: &HeaderMap, name: &str) -> Result<Uuid, AppError> {
    optional_uuid_header(headers, name)?
        .ok_or_else(|| AppError::Validation(format!("header '{name}' is required")))
}

fn optional_uuid_header(headers: &HeaderMap, name: &str) -> Result<Option<Uuid>, AppError> {
    let Some(value) = headers.get(name) else {
        return Ok(None);
    };

    let value = value
        .to_str()
        .map_err(|_| AppError::Validation(format!("header '{name}' must be visible ASCII")))?;
    Uuid::parse_str(value.trim())
        .map(Some)
        .map_err(|error| AppError::Validation(format!("invalid header '{name}': {error}")))
}

#[cfg(test)]
mod tests {
    use accessmgmt_core::AppError;
    use axum::http::{HeaderMap, HeaderValue};
    use uuid::Uuid;

    use super::{
        CHANGED_BY_HEADER, CHANGED_BY_SYSTEM_HEADER, OPERATION_ID_HEADER,
        audit_context_from_headers,
    };

    fn header(value: &str) -> HeaderValue {
        match HeaderValue::from_str(value) {
            Ok(value) => value,
            Err(error) => panic!("invalid test header: {error}"),
        }
    }

    #[test]
    fn audit_context_reads_actor_system_and_operation() {
        let actor = Uuid::new_v4();
        let system = Uuid::new_v4();
        let operation = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(CHANGED_BY_HEADER, header(&actor.to_string()));
        headers.insert(CHANGED_BY_SYSTEM_HEADER, header(&system.to_string()));
        headers.insert(OPERATION_ID_HEADER, header(&operation.to_string()));

        let Ok(audit) = audit_context_from_headers(&headers) else {
            panic!("audit headers should parse");
        };

        assert_eq!(audit.changed_by(), actor);
        assert_eq!(audit.changed_by_system(), system);
        assert_eq!(audit.operation_id(), operation);
    }

    #[test]
    fn missing_system_header_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(CHANGED_BY_HEADER, header(&Uuid::new_v4().to_string()));

        let result = audit_context_from_headers(&headers);

        assert!(matches!(
            result,
            Err(AppError::Validation(message)) if message.contains(CHANGED_BY_SYSTEM_HEADER)
        ));
    }

    #[test]
    fn malformed_actor_header_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(CHANGED_BY_HEADER, header("not-a-uuid"));
        headers.insert(CHANGED_BY_SYSTEM_HEADER, header(&Uuid::new_v4().to_string()));

        assert!(matches!(
            audit_context_from_headers(&headers),
            Err(AppError::Validation(_))
        ));
    }
}
