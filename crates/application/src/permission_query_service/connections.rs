use std::collections::{BTreeMap, BTreeSet};

use accessmgmt_domain::{PackageId, RoleId};

use super::*;

#[derive(Debug, Default)]
struct ConnectionGroup {
    direct: bool,
    roles: BTreeSet<RoleId>,
    packages: BTreeSet<PackageId>,
}

fn group_by_counterpart<'a>(
    relations: impl Iterator<Item = &'a Relation>,
    direction: PermissionDirection,
) -> BTreeMap<EntityId, ConnectionGroup> {
    let mut groups: BTreeMap<EntityId, ConnectionGroup> = BTreeMap::new();
    for relation in relations {
        let group = groups.entry(direction.counterpart(relation)).or_default();
        group.direct |= relation.reason.is_direct();
        group.roles.insert(relation.role_id);
        group.packages.extend(relation.package_id);
    }
    groups
}

impl PermissionQueryService {
    /// Lists parties the queried party has granted access to.
    pub async fn connections_from(&self, query: ConnectionQuery) -> AppResult<Vec<PartyConnection>> {
        self.connections(query, PermissionDirection::FromParty)
            .await
    }

    /// Lists parties the queried party has received access from.
    pub async fn connections_to(&self, query: ConnectionQuery) -> AppResult<Vec<PartyConnection>> {
        self.connections(query, PermissionDirection::ToParty).await
    }

    async fn connections(
        &self,
        query: ConnectionQuery,
        direction: PermissionDirection,
    ) -> AppResult<Vec<PartyConnection>> {
        self.require_party(query.party_id).await?;

        let filter = direction
            .filter(query.party_id, query.counterpart_id)
            .with_optional(query.role_id, RelationPredicate::Role);
        let relations = if query.include_packages {
            self.resolver
                .resolve_relations_with_packages(filter)
                .await?
        } else {
            self.resolver.resolve_relations(filter).await?
        }
        .into_vec();

        let catalog = self.catalog_for(&relations).await?;

        group_by_counterpart(relations.iter(), direction)
            .into_iter()
            .map(|(counterpart_id, group)| {
                let sub_connections = if query.include_sub_connections {
                    let routed = relations.iter().filter(|relation| {
                        !relation.reason.is_direct() && relation.via_id == Some(counterpart_id)
                    });
                    group_by_counterpart(routed, direction)
                        .into_iter()
                        .map(|(sub_id, sub_group)| {
                            connection(&catalog, sub_id, sub_group, Vec::new())
                        })
                        .collect::<AppResult<Vec<_>>>()?
                } else {
                    Vec::new()
                };

                connection(&catalog, counterpart_id, group, sub_connections)
            })
            .collect()
    }
}

fn connection(
    catalog: &Catalog,
    party_id: EntityId,
    group: ConnectionGroup,
    sub_connections: Vec<PartyConnection>,
) -> AppResult<PartyConnection> {
    Ok(PartyConnection {
        party: catalog.entity(party_id)?,
        direct: group.direct,
        roles: group
            .roles
            .into_iter()
            .map(|role_id| catalog.role(role_id))
            .collect::<AppResult<_>>()?,
        packages: group
            .packages
            .into_iter()
            .map(|package_id| catalog.package(package_id))
            .collect::<AppResult<_>>()?,
        sub_connections,
    })
}
