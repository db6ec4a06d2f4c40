use std::str::FromStr;

use accessmgmt_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::ids::{EntityId, EntityTypeId, EntityVariantId};

/// Broad category of a party type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Registered organization or organizational subunit.
    Organization,
    /// Natural person.
    Person,
    /// Machine identity acting on behalf of an organization.
    SystemUser,
    /// Internal bookkeeping party, e.g. the sync system itself.
    Internal,
}

impl EntityKind {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Organization => "organization",
            Self::Person => "person",
            Self::SystemUser => "system_user",
            Self::Internal => "internal",
        }
    }
}

impl FromStr for EntityKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "organization" => Ok(Self::Organization),
            "person" => Ok(Self::Person),
            "system_user" => Ok(Self::SystemUser),
            "internal" => Ok(Self::Internal),
            _ => Err(AppError::Validation(format!(
                "unknown entity kind '{value}'"
            ))),
        }
    }
}

/// Party type definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityType {
    /// Stable type id.
    pub id: EntityTypeId,
    /// Display name as published by the registry, e.g. `Organisasjon`.
    pub name: String,
    /// Category used by validation rules.
    pub kind: EntityKind,
}

/// A party that can hold or grant roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Stable party id.
    pub id: EntityId,
    /// Display name.
    pub name: String,
    /// External registry key.
    pub ref_id: String,
    /// Party type.
    pub type_id: EntityTypeId,
    /// Party variant within the type.
    pub variant_id: EntityVariantId,
    /// Immediate organizational parent, if this party is a subunit.
    pub parent_id: Option<EntityId>,
}

impl Entity {
    /// Creates a top-level party with the given type.
    pub fn new(
        id: EntityId,
        name: impl Into<String>,
        type_id: EntityTypeId,
        variant_id: EntityVariantId,
    ) -> AppResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "entity '{id}' must have a non-empty name"
            )));
        }

        Ok(Self {
            id,
            name,
            ref_id: String::new(),
            type_id,
            variant_id,
            parent_id: None,
        })
    }

    /// Sets the external registry key.
    #[must_use]
    pub fn with_ref_id(mut self, ref_id: impl Into<String>) -> Self {
        self.ref_id = ref_id.into();
        self
    }

    /// Sets the immediate organizational parent.
    #[must_use]
    pub fn with_parent(mut self, parent_id: EntityId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// External-key lookup attached to a party (e.g. organization number).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityLookup {
    /// Party the key belongs to.
    pub entity_id: EntityId,
    /// Lookup key name.
    pub key: String,
    /// Lookup value.
    pub value: String,
}
