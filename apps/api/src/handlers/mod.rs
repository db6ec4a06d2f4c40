pub mod assignments;
pub mod delegations;
pub mod health;
pub mod parties;
pub mod relations;

use accessmgmt_core::AppError;
use uuid::Uuid;

fn parse_id<T>(field: &str, value: &str, wrap: fn(Uuid) -> T) -> Result<T, AppError> {
    Uuid::parse_str(value.trim())
        .map(wrap)
        .map_err(|error| AppError::Validation(format!("invalid {field} '{value}': {error}")))
}

fn parse_optional_id<T>(
    field: &str,
    value: Option<&str>,
    wrap: fn(Uuid) -> T,
) -> Result<Option<T>, AppError> {
    value
        .filter(|value| !value.trim().is_empty())
        .map(|value| parse_id(field, value, wrap))
        .transpose()
}

fn parse_id_list<T>(field: &str, value: &str, wrap: fn(Uuid) -> T) -> Result<Vec<T>, AppError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| parse_id(field, value, wrap))
        .collect()
}

#[cfg(test)]
mod tests {
    use accessmgmt_core::AppError;
    use accessmgmt_domain::PackageId;
    use proptest::prelude::*;
    use uuid::Uuid;

    use super::{parse_id_list, parse_optional_id};

    #[test]
    fn blank_optional_id_is_absent() {
        assert!(matches!(
            parse_optional_id("from", Some("  "), PackageId::from_uuid),
            Ok(None)
        ));
        assert!(matches!(
            parse_optional_id("from", Some("nope"), PackageId::from_uuid),
            Err(AppError::Validation(message)) if message.contains("from")
        ));
    }

    proptest! {
        #[test]
        fn id_list_parses_every_non_empty_segment(
            raw in prop::collection::vec(any::<u128>(), 0..8),
            padding in "[ ]{0,2}",
        ) {
            let ids: Vec<Uuid> = raw.into_iter().map(Uuid::from_u128).collect();
            let joined = ids
                .iter()
                .map(|id| format!("{padding}{id}{padding}"))
                .collect::<Vec<_>>()
                .join(",");

            let parsed = parse_id_list("packages", &format!("{joined},"), PackageId::from_uuid);

            prop_assert_eq!(
                parsed.ok(),
                Some(ids.into_iter().map(PackageId::from_uuid).collect::<Vec<_>>())
            );
        }
    }
}
