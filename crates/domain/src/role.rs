use serde::{Deserialize, Serialize};

use crate::ids::{EntityTypeId, ProviderId, RoleId};

/// Role definition.
///
/// `code` is unique within a `(provider_id, entity_type_id)` scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Stable role id.
    pub id: RoleId,
    /// Short code, e.g. `daglig-leder`.
    pub code: String,
    /// Role urn.
    pub urn: String,
    /// Display name.
    pub name: String,
    /// Provider publishing the role.
    pub provider_id: ProviderId,
    /// Party type the role applies to.
    pub entity_type_id: EntityTypeId,
    /// Holding this role over another party forwards the holder's inbound relations there.
    pub is_key_role: bool,
    /// Whether assignments of this role may be created and revoked through the mutation service.
    pub is_assignable: bool,
}

/// Holding `has_role_id` implicitly grants `get_role_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleMap {
    /// Role held.
    pub has_role_id: RoleId,
    /// Role implied.
    pub get_role_id: RoleId,
}
