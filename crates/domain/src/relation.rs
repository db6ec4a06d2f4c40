//! Computed relations and their provenance.
//!
//! A [`Relation`] is never persisted by the core. It is re-derived on every query from the
//! reference stores and tagged with a [`RelationReason`] describing the derivation path.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use accessmgmt_core::AppError;
use serde::{Deserialize, Serialize};

use crate::ids::{EntityId, PackageId, ResourceId, RoleId};

/// Base rule that produced a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RelationOrigin {
    /// An explicit assignment.
    Direct,
    /// An assignment held by the party's immediate parent.
    Parent,
    /// A delegation between two assignments.
    Delegation,
}

impl RelationOrigin {
    /// Returns stable reason prefix.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "Direct",
            Self::Parent => "Parent",
            Self::Delegation => "Delegation",
        }
    }
}

/// Provenance tag of a relation.
///
/// Role-map and key-role augmentation each apply at most once, so reasons such as
/// `DirectMapMap` or `ParentKeyKey` cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RelationReason {
    origin: RelationOrigin,
    mapped: bool,
    keyed: bool,
}

impl RelationReason {
    /// Reason for explicit assignments.
    pub const DIRECT: Self = Self::base(RelationOrigin::Direct);
    /// Reason for subunit inheritance.
    pub const PARENT: Self = Self::base(RelationOrigin::Parent);
    /// Reason for delegations.
    pub const DELEGATION: Self = Self::base(RelationOrigin::Delegation);

    const fn base(origin: RelationOrigin) -> Self {
        Self {
            origin,
            mapped: false,
            keyed: false,
        }
    }

    /// Returns this reason with the role-map suffix.
    #[must_use]
    pub fn with_role_map(self) -> Self {
        Self {
            mapped: true,
            ..self
        }
    }

    /// Returns this reason with the key-role suffix.
    #[must_use]
    pub fn with_key_role(self) -> Self {
        Self {
            keyed: true,
            ..self
        }
    }

    /// Returns the base rule.
    #[must_use]
    pub fn origin(self) -> RelationOrigin {
        self.origin
    }

    /// Returns whether role-map augmentation was applied.
    #[must_use]
    pub fn is_mapped(self) -> bool {
        self.mapped
    }

    /// Returns whether key-role augmentation was applied.
    #[must_use]
    pub fn is_keyed(self) -> bool {
        self.keyed
    }

    /// Returns whether this is a first-class, explicitly assigned relation.
    #[must_use]
    pub fn is_direct(self) -> bool {
        self == Self::DIRECT
    }
}

impl Display for RelationReason {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.origin.as_str())?;
        if self.mapped {
            formatter.write_str("Map")?;
        }
        if self.keyed {
            formatter.write_str("Key")?;
        }
        Ok(())
    }
}

impl FromStr for RelationReason {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (origin, rest) = [
            RelationOrigin::Direct,
            RelationOrigin::Parent,
            RelationOrigin::Delegation,
        ]
        .into_iter()
        .find_map(|origin| {
            value
                .strip_prefix(origin.as_str())
                .map(|rest| (origin, rest))
        })
        .ok_or_else(|| AppError::Validation(format!("unknown relation reason '{value}'")))?;

        let reason = Self::base(origin);
        match rest {
            "" => Ok(reason),
            "Map" => Ok(reason.with_role_map()),
            "Key" => Ok(reason.with_key_role()),
            "MapKey" => Ok(reason.with_role_map().with_key_role()),
            _ => Err(AppError::Validation(format!(
                "unknown relation reason '{value}'"
            ))),
        }
    }
}

impl From<RelationReason> for String {
    fn from(value: RelationReason) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for RelationReason {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Where an overlaid package grant came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageSource {
    /// Attached to the originating assignment or delegation.
    Direct,
    /// Default grant of the relation's role.
    Role,
}

impl PackageSource {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Role => "role",
        }
    }
}

impl FromStr for PackageSource {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "direct" => Ok(Self::Direct),
            "role" => Ok(Self::Role),
            _ => Err(AppError::Validation(format!(
                "unknown package source '{value}'"
            ))),
        }
    }
}

/// Effective grant with provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    /// Party granting access.
    pub from_id: EntityId,
    /// Effective role.
    pub role_id: RoleId,
    /// Intermediate party the relation passes through.
    pub via_id: Option<EntityId>,
    /// Role held at the intermediate party.
    pub via_role_id: Option<RoleId>,
    /// Party receiving access.
    pub to_id: EntityId,
    /// Overlaid package.
    pub package_id: Option<PackageId>,
    /// Overlaid resource.
    pub resource_id: Option<ResourceId>,
    /// Derivation path.
    pub reason: RelationReason,
    /// Source of the overlaid package.
    pub package_source: Option<PackageSource>,
}

impl Relation {
    /// Creates a relation without via, package or resource.
    #[must_use]
    pub fn new(from_id: EntityId, role_id: RoleId, to_id: EntityId, reason: RelationReason) -> Self {
        Self {
            from_id,
            role_id,
            via_id: None,
            via_role_id: None,
            to_id,
            package_id: None,
            resource_id: None,
            reason,
            package_source: None,
        }
    }

    /// Returns this relation routed through `via_id`, optionally holding `via_role_id`.
    #[must_use]
    pub fn via(mut self, via_id: EntityId, via_role_id: Option<RoleId>) -> Self {
        self.via_id = Some(via_id);
        self.via_role_id = via_role_id;
        self
    }

    /// Returns this relation carrying an overlaid package.
    #[must_use]
    pub fn with_package(mut self, package_id: PackageId, source: PackageSource) -> Self {
        self.package_id = Some(package_id);
        self.package_source = Some(source);
        self
    }

    /// Returns this relation carrying an overlaid resource.
    #[must_use]
    pub fn with_resource(mut self, resource_id: ResourceId) -> Self {
        self.resource_id = Some(resource_id);
        self
    }

    /// Returns the uniqueness key. `package_source` is not part of it.
    #[must_use]
    pub fn key(&self) -> RelationKey {
        RelationKey {
            from_id: self.from_id,
            role_id: self.role_id,
            via_id: self.via_id,
            via_role_id: self.via_role_id,
            to_id: self.to_id,
            package_id: self.package_id,
            resource_id: self.resource_id,
            reason: self.reason,
        }
    }
}

/// Uniqueness key of a relation in a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationKey {
    /// Party granting access.
    pub from_id: EntityId,
    /// Effective role.
    pub role_id: RoleId,
    /// Intermediate party.
    pub via_id: Option<EntityId>,
    /// Role at the intermediate party.
    pub via_role_id: Option<RoleId>,
    /// Party receiving access.
    pub to_id: EntityId,
    /// Overlaid package.
    pub package_id: Option<PackageId>,
    /// Overlaid resource.
    pub resource_id: Option<ResourceId>,
    /// Derivation path.
    pub reason: RelationReason,
}
