use accessmgmt_application::MutationError;
use accessmgmt_core::AppError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

mod types;

pub use types::ErrorResponse;

/// HTTP API error wrapper around application and guarded-write errors.
#[derive(Debug)]
pub enum ApiError {
    App(AppError),
    Mutation(MutationError),
}

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self::App(value)
    }
}

impl From<MutationError> for ApiError {
    fn from(value: MutationError) -> Self {
        match value {
            MutationError::App(error) => Self::App(error),
            other => Self::Mutation(other),
        }
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::App(AppError::Validation(_)) => StatusCode::BAD_REQUEST,
            Self::App(AppError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::App(AppError::Conflict(_)) => StatusCode::CONFLICT,
            Self::App(AppError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::App(AppError::Internal(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Mutation(MutationError::Validation(_)) => StatusCode::BAD_REQUEST,
            Self::Mutation(
                MutationError::InheritedAssignment(_) | MutationError::DependentGrants(_),
            ) => StatusCode::CONFLICT,
            Self::Mutation(MutationError::App(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn into_payload(self) -> ErrorResponse {
        match self {
            Self::App(error) => ErrorResponse::new(error.to_string()),
            Self::Mutation(error) => {
                let mut payload = ErrorResponse::new(error.to_string());
                match error {
                    MutationError::Validation(violations) => {
                        payload.violations = violations.into_iter().map(Into::into).collect();
                    }
                    MutationError::InheritedAssignment(relations) => {
                        payload.relations = relations.into_iter().map(Into::into).collect();
                    }
                    MutationError::DependentGrants(dependents) => {
                        payload.dependents = Some(dependents.into());
                    }
                    MutationError::App(_) => {}
                }
                payload
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let payload = Json(self.into_payload());

        (status, payload).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use accessmgmt_application::{DependentGrants, MutationError};
    use accessmgmt_core::{AppError, Violation};
    use accessmgmt_domain::{DelegationId, EntityId, Relation, RelationReason, RoleId};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    use super::ApiError;

    #[test]
    fn app_errors_map_to_status_codes() {
        let cases = [
            (AppError::Validation("bad".to_owned()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("gone".to_owned()), StatusCode::NOT_FOUND),
            (AppError::Conflict("taken".to_owned()), StatusCode::CONFLICT),
            (
                AppError::Unavailable("timed out".to_owned()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AppError::Internal("boom".to_owned()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(ApiError::from(error).into_response().status(), expected);
        }
    }

    #[test]
    fn wrapped_app_error_keeps_its_own_status() {
        let error = ApiError::from(MutationError::App(AppError::NotFound(
            "role 'x' does not exist".to_owned(),
        )));

        assert!(matches!(error, ApiError::App(AppError::NotFound(_))));
        assert_eq!(error.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn mutation_conflicts_carry_evidence() {
        let relation = Relation::new(
            EntityId::new(),
            RoleId::new(),
            EntityId::new(),
            RelationReason::PARENT,
        );
        let inherited = ApiError::from(MutationError::InheritedAssignment(vec![relation]));
        assert_eq!(inherited.status(), StatusCode::CONFLICT);
        let payload = inherited.into_payload();
        assert_eq!(payload.relations.len(), 1);
        assert_eq!(payload.relations[0].reason, "Parent");

        let dependents = DependentGrants {
            delegations: vec![DelegationId::new()],
            ..DependentGrants::default()
        };
        let dependent = ApiError::from(MutationError::DependentGrants(dependents));
        assert_eq!(dependent.status(), StatusCode::CONFLICT);
        assert!(
            dependent
                .into_payload()
                .dependents
                .is_some_and(|grants| grants.delegations.len() == 1)
        );
    }

    #[test]
    fn violation_lists_are_bad_requests() {
        let error = ApiError::from(MutationError::Validation(vec![
            Violation::new("party_not_found", "from_id", "party does not exist"),
            Violation::new("role_not_revocable", "role_code", "role cannot be revoked here"),
        ]));

        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        let payload = error.into_payload();
        assert_eq!(payload.violations.len(), 2);
        assert_eq!(payload.violations[1].path, "role_code");
    }
}
