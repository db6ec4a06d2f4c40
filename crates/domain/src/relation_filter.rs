use serde::{Deserialize, Serialize};

use crate::ids::{EntityId, PackageId, ResourceId, RoleId};
use crate::relation::Relation;

/// One equality predicate on a comparable relation field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum RelationPredicate {
    /// Granting party.
    From(EntityId),
    /// Receiving party.
    To(EntityId),
    /// Effective role.
    Role(RoleId),
    /// Overlaid package.
    Package(PackageId),
    /// Overlaid resource.
    Resource(ResourceId),
    /// Facilitator of the underlying delegation.
    Facilitator(EntityId),
}

/// Conjunction of relation predicates. Absent fields match any value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationFilter {
    from_id: Option<EntityId>,
    to_id: Option<EntityId>,
    role_id: Option<RoleId>,
    package_id: Option<PackageId>,
    resource_id: Option<ResourceId>,
    facilitator_id: Option<EntityId>,
}

impl RelationFilter {
    /// Creates a filter that matches every relation.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Creates a filter from a list of predicates. Later predicates on the same field win.
    pub fn from_predicates(predicates: impl IntoIterator<Item = RelationPredicate>) -> Self {
        predicates
            .into_iter()
            .fold(Self::default(), |filter, predicate| filter.with(predicate))
    }

    /// Adds one predicate.
    #[must_use]
    pub fn with(mut self, predicate: RelationPredicate) -> Self {
        match predicate {
            RelationPredicate::From(value) => self.from_id = Some(value),
            RelationPredicate::To(value) => self.to_id = Some(value),
            RelationPredicate::Role(value) => self.role_id = Some(value),
            RelationPredicate::Package(value) => self.package_id = Some(value),
            RelationPredicate::Resource(value) => self.resource_id = Some(value),
            RelationPredicate::Facilitator(value) => self.facilitator_id = Some(value),
        }
        self
    }

    /// Adds an optional predicate built from `value`.
    #[must_use]
    pub fn with_optional<T>(self, value: Option<T>, predicate: fn(T) -> RelationPredicate) -> Self {
        match value {
            Some(value) => self.with(predicate(value)),
            None => self,
        }
    }

    /// Returns the predicates this filter holds.
    #[must_use]
    pub fn predicates(&self) -> Vec<RelationPredicate> {
        [
            self.from_id.map(RelationPredicate::From),
            self.to_id.map(RelationPredicate::To),
            self.role_id.map(RelationPredicate::Role),
            self.package_id.map(RelationPredicate::Package),
            self.resource_id.map(RelationPredicate::Resource),
            self.facilitator_id.map(RelationPredicate::Facilitator),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Granting party predicate.
    #[must_use]
    pub fn from_id(&self) -> Option<EntityId> {
        self.from_id
    }

    /// Receiving party predicate.
    #[must_use]
    pub fn to_id(&self) -> Option<EntityId> {
        self.to_id
    }

    /// Role predicate.
    #[must_use]
    pub fn role_id(&self) -> Option<RoleId> {
        self.role_id
    }

    /// Package predicate.
    #[must_use]
    pub fn package_id(&self) -> Option<PackageId> {
        self.package_id
    }

    /// Resource predicate.
    #[must_use]
    pub fn resource_id(&self) -> Option<ResourceId> {
        self.resource_id
    }

    /// Facilitator predicate.
    #[must_use]
    pub fn facilitator_id(&self) -> Option<EntityId> {
        self.facilitator_id
    }

    /// Returns whether the filter constrains the package/resource overlay.
    #[must_use]
    pub fn constrains_overlay(&self) -> bool {
        self.package_id.is_some() || self.resource_id.is_some()
    }

    /// Returns a copy with the package and resource predicates removed.
    #[must_use]
    pub fn without_overlay(mut self) -> Self {
        self.package_id = None;
        self.resource_id = None;
        self
    }

    /// Returns whether the relation satisfies every field predicate.
    ///
    /// The facilitator predicate is not visible on a relation; generators enforce it.
    #[must_use]
    pub fn matches(&self, relation: &Relation) -> bool {
        self.from_id.is_none_or(|value| relation.from_id == value)
            && self.to_id.is_none_or(|value| relation.to_id == value)
            && self.role_id.is_none_or(|value| relation.role_id == value)
            && self
                .package_id
                .is_none_or(|value| relation.package_id == Some(value))
            && self
                .resource_id
                .is_none_or(|value| relation.resource_id == Some(value))
    }
}
