use std::str::FromStr;
use std::sync::Arc;

use accessmgmt_application::{
    AssignmentQuery, AssignmentRepository, DelegationQuery, DelegationRepository, EntityQuery,
    EntityRepository, PackageRepository, ReferenceData, ReferenceSnapshot,
    ReferenceSnapshotSource, RelationSupplementRepository, ResourceRepository, RolePackageQuery,
    RoleRepository,
};
use accessmgmt_core::{AppError, AppResult, AuditContext};
use accessmgmt_domain::{
    Assignment, AssignmentId, AssignmentKey, AssignmentPackage, AssignmentPackageId,
    AssignmentResource, AssignmentResourceId, Delegation, DelegationId, DelegationPackage,
    DelegationPackageId, DelegationResource, DelegationResourceId, Entity, EntityId, EntityKind,
    EntityType, EntityTypeId, EntityVariantId, Package, PackageId, PackageSource, ProviderId,
    Relation, RelationFilter, RelationReason, Resource, ResourceId, Role, RoleId, RoleMap,
    RolePackage,
};
use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::warn;
use uuid::Uuid;

mod assignments;
mod delegations;
mod grants;
mod parties;
mod snapshot;


/// PostgreSQL-backed reference stores: parties, roles, grants and the relation supplement.
#[derive(Clone)]
pub struct PostgresReferenceStore {
    pool: PgPool,
}

impl PostgresReferenceStore {
    /// Creates a store with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self, purpose: &str) -> AppResult<Transaction<'static, Postgres>> {
        self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to start {purpose} transaction: {error}"))
        })
    }
}

async fn commit(transaction: Transaction<'static, Postgres>, purpose: &str) -> AppResult<()> {
    transaction.commit().await.map_err(|error| {
        AppError::Internal(format!("failed to commit {purpose} transaction: {error}"))
    })
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(database_error)
        if database_error.code().as_deref() == Some("23505"))
}

fn is_foreign_key_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(database_error)
        if database_error.code().as_deref() == Some("23503"))
}

fn uuids<T: Copy>(ids: &[T], as_uuid: fn(&T) -> Uuid) -> Vec<Uuid> {
    ids.iter().map(as_uuid).collect()
}

#[derive(Debug, FromRow)]
struct EntityTypeRow {
    id: Uuid,
    name: String,
    kind: String,
}

impl TryFrom<EntityTypeRow> for EntityType {
    type Error = AppError;

    fn try_from(row: EntityTypeRow) -> Result<Self, Self::Error> {
        let kind = EntityKind::from_str(row.kind.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "failed to decode kind of entity type '{}': {error}",
                row.id
            ))
        })?;

        Ok(Self {
            id: EntityTypeId::from_uuid(row.id),
            name: row.name,
            kind,
        })
    }
}

#[derive(Debug, FromRow)]
struct EntityRow {
    id: Uuid,
    name: String,
    ref_id: String,
    type_id: Uuid,
    variant_id: Uuid,
    parent_id: Option<Uuid>,
}

impl From<EntityRow> for Entity {
    fn from(row: EntityRow) -> Self {
        Self {
            id: EntityId::from_uuid(row.id),
            name: row.name,
            ref_id: row.ref_id,
            type_id: EntityTypeId::from_uuid(row.type_id),
            variant_id: EntityVariantId::from_uuid(row.variant_id),
            parent_id: row.parent_id.map(EntityId::from_uuid),
        }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: Uuid,
    code: String,
    urn: String,
    name: String,
    provider_id: Uuid,
    entity_type_id: Uuid,
    is_key_role: bool,
    is_assignable: bool,
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Self {
            id: RoleId::from_uuid(row.id),
            code: row.code,
            urn: row.urn,
            name: row.name,
            provider_id: ProviderId::from_uuid(row.provider_id),
            entity_type_id: EntityTypeId::from_uuid(row.entity_type_id),
            is_key_role: row.is_key_role,
            is_assignable: row.is_assignable,
        }
    }
}

#[derive(Debug, FromRow)]
struct RoleMapRow {
    has_role_id: Uuid,
    get_role_id: Uuid,
}

impl From<RoleMapRow> for RoleMap {
    fn from(row: RoleMapRow) -> Self {
        Self {
            has_role_id: RoleId::from_uuid(row.has_role_id),
            get_role_id: RoleId::from_uuid(row.get_role_id),
        }
    }
}

#[derive(Debug, FromRow)]
struct AssignmentRow {
    id: Uuid,
    from_id: Uuid,
    to_id: Uuid,
    role_id: Uuid,
}

impl From<AssignmentRow> for Assignment {
    fn from(row: AssignmentRow) -> Self {
        Self {
            id: AssignmentId::from_uuid(row.id),
            from_id: EntityId::from_uuid(row.from_id),
            to_id: EntityId::from_uuid(row.to_id),
            role_id: RoleId::from_uuid(row.role_id),
        }
    }
}

#[derive(Debug, FromRow)]
struct DelegationRow {
    id: Uuid,
    from_id: Uuid,
    to_id: Uuid,
    facilitator_id: Uuid,
}

impl From<DelegationRow> for Delegation {
    fn from(row: DelegationRow) -> Self {
        Self {
            id: DelegationId::from_uuid(row.id),
            from_id: AssignmentId::from_uuid(row.from_id),
            to_id: AssignmentId::from_uuid(row.to_id),
            facilitator_id: EntityId::from_uuid(row.facilitator_id),
        }
    }
}

#[derive(Debug, FromRow)]
struct PackageRow {
    id: Uuid,
    urn: String,
    name: String,
    is_assignable: bool,
    is_delegable: bool,
}

impl From<PackageRow> for Package {
    fn from(row: PackageRow) -> Self {
        Self {
            id: PackageId::from_uuid(row.id),
            urn: row.urn,
            name: row.name,
            is_assignable: row.is_assignable,
            is_delegable: row.is_delegable,
        }
    }
}

#[derive(Debug, FromRow)]
struct ResourceRow {
    id: Uuid,
    ref_id: String,
    provider_id: Uuid,
    name: String,
}

impl From<ResourceRow> for Resource {
    fn from(row: ResourceRow) -> Self {
        Self {
            id: ResourceId::from_uuid(row.id),
            ref_id: row.ref_id,
            provider_id: ProviderId::from_uuid(row.provider_id),
            name: row.name,
        }
    }
}

#[derive(Debug, FromRow)]
struct RolePackageRow {
    role_id: Uuid,
    package_id: Uuid,
    has_access: bool,
    can_delegate: bool,
}

impl From<RolePackageRow> for RolePackage {
    fn from(row: RolePackageRow) -> Self {
        Self {
            role_id: RoleId::from_uuid(row.role_id),
            package_id: PackageId::from_uuid(row.package_id),
            has_access: row.has_access,
            can_delegate: row.can_delegate,
        }
    }
}

/// Row of any of the four `(id, owner, granted)` grant tables.
#[derive(Debug, FromRow)]
struct GrantRow {
    id: Uuid,
    owner_id: Uuid,
    granted_id: Uuid,
}

impl From<GrantRow> for AssignmentPackage {
    fn from(row: GrantRow) -> Self {
        Self {
            id: AssignmentPackageId::from_uuid(row.id),
            assignment_id: AssignmentId::from_uuid(row.owner_id),
            package_id: PackageId::from_uuid(row.granted_id),
        }
    }
}

impl From<GrantRow> for DelegationPackage {
    fn from(row: GrantRow) -> Self {
        Self {
            id: DelegationPackageId::from_uuid(row.id),
            delegation_id: DelegationId::from_uuid(row.owner_id),
            package_id: PackageId::from_uuid(row.granted_id),
        }
    }
}

impl From<GrantRow> for AssignmentResource {
    fn from(row: GrantRow) -> Self {
        Self {
            id: AssignmentResourceId::from_uuid(row.id),
            assignment_id: AssignmentId::from_uuid(row.owner_id),
            resource_id: ResourceId::from_uuid(row.granted_id),
        }
    }
}

impl From<GrantRow> for DelegationResource {
    fn from(row: GrantRow) -> Self {
        Self {
            id: DelegationResourceId::from_uuid(row.id),
            delegation_id: DelegationId::from_uuid(row.owner_id),
            resource_id: ResourceId::from_uuid(row.granted_id),
        }
    }
}

#[derive(Debug, FromRow)]
struct SupplementRow {
    from_id: Uuid,
    role_id: Uuid,
    via_id: Option<Uuid>,
    via_role_id: Option<Uuid>,
    to_id: Uuid,
    package_id: Option<Uuid>,
    resource_id: Option<Uuid>,
    reason: String,
    package_source: Option<String>,
}

/// Decodes supplement rows. Rows whose reason or package source cannot be decoded are logged
/// and skipped.
fn decode_supplement_rows(rows: Vec<SupplementRow>) -> Vec<Relation> {
    rows.into_iter()
        .filter_map(|row| {
            let (from_id, to_id) = (row.from_id, row.to_id);
            match Relation::try_from(row) {
                Ok(relation) => Some(relation),
                Err(error) => {
                    warn!(%from_id, %to_id, %error, "skipping undecodable supplement relation");
                    None
                }
            }
        })
        .collect()
}

impl TryFrom<SupplementRow> for Relation {
    type Error = AppError;

    fn try_from(row: SupplementRow) -> Result<Self, Self::Error> {
        let reason = RelationReason::from_str(row.reason.as_str()).map_err(|error| {
            AppError::Internal(format!("failed to decode supplement relation: {error}"))
        })?;
        let package_source = row
            .package_source
            .as_deref()
            .map(PackageSource::from_str)
            .transpose()
            .map_err(|error| {
                AppError::Internal(format!("failed to decode supplement relation: {error}"))
            })?;

        Ok(Self {
            from_id: EntityId::from_uuid(row.from_id),
            role_id: RoleId::from_uuid(row.role_id),
            via_id: row.via_id.map(EntityId::from_uuid),
            via_role_id: row.via_role_id.map(RoleId::from_uuid),
            to_id: EntityId::from_uuid(row.to_id),
            package_id: row.package_id.map(PackageId::from_uuid),
            resource_id: row.resource_id.map(ResourceId::from_uuid),
            reason,
            package_source,
        })
    }
}
