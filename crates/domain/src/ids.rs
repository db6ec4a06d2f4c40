use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID value.
            #[must_use]
            pub fn from_uuid(value: Uuid) -> Self {
                Self(value)
            }

            /// Returns the underlying UUID value.
            #[must_use]
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
                write!(formatter, "{}", self.0)
            }
        }
    };
}

uuid_identifier!(
    /// Party identifier (organization, person, system user).
    EntityId
);
uuid_identifier!(
    /// Entity type identifier.
    EntityTypeId
);
uuid_identifier!(
    /// Entity variant identifier.
    EntityVariantId
);
uuid_identifier!(
    /// Role identifier.
    RoleId
);
uuid_identifier!(
    /// Provider owning roles and resources.
    ProviderId
);
uuid_identifier!(
    /// Assignment identifier.
    AssignmentId
);
uuid_identifier!(
    /// Delegation identifier.
    DelegationId
);
uuid_identifier!(
    /// Access package identifier.
    PackageId
);
uuid_identifier!(
    /// Resource identifier.
    ResourceId
);
uuid_identifier!(
    /// Assignment-level package grant identifier.
    AssignmentPackageId
);
uuid_identifier!(
    /// Delegation-level package grant identifier.
    DelegationPackageId
);
uuid_identifier!(
    /// Assignment-level resource grant identifier.
    AssignmentResourceId
);
uuid_identifier!(
    /// Delegation-level resource grant identifier.
    DelegationResourceId
);

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{EntityId, RoleId};

    #[test]
    fn identifiers_format_as_uuid() {
        let entity_id = EntityId::new();
        assert_eq!(entity_id.to_string().len(), 36);
    }

    #[test]
    fn identifiers_with_same_uuid_compare_equal_per_type() {
        let value = Uuid::new_v4();
        assert_eq!(RoleId::from_uuid(value), RoleId::from_uuid(value));
        assert_eq!(RoleId::from_uuid(value).as_uuid(), value);
    }
}
