use std::fmt::Debug;
use std::hash::Hash;

use crate::grant::{Assignment, Resource};
use crate::ids::{EntityId, ProviderId, RoleId};
use crate::party::{Entity, EntityLookup};

/// Merge/deduplication key shared with batch ingestion.
///
/// `MATCH_COLUMNS` names the storage columns the key maps to and must stay in sync with the
/// unique constraints of the reference schema.
pub trait MatchKey {
    /// Key value type.
    type Key: Clone + Eq + Hash + Debug + Send + Sync;

    /// Storage columns forming the key, in merge order.
    const MATCH_COLUMNS: &'static [&'static str];

    /// Returns the key value of this row.
    fn match_key(&self) -> Self::Key;
}

impl MatchKey for Assignment {
    type Key = (EntityId, RoleId, EntityId);

    const MATCH_COLUMNS: &'static [&'static str] = &["fromid", "roleid", "toid"];

    fn match_key(&self) -> Self::Key {
        (self.from_id, self.role_id, self.to_id)
    }
}

impl MatchKey for Entity {
    type Key = EntityId;

    const MATCH_COLUMNS: &'static [&'static str] = &["id"];

    fn match_key(&self) -> Self::Key {
        self.id
    }
}

impl MatchKey for EntityLookup {
    type Key = (EntityId, String);

    const MATCH_COLUMNS: &'static [&'static str] = &["entityid", "key"];

    fn match_key(&self) -> Self::Key {
        (self.entity_id, self.key.clone())
    }
}

impl MatchKey for Resource {
    type Key = (String, ProviderId);

    const MATCH_COLUMNS: &'static [&'static str] = &["refid", "providerid"];

    fn match_key(&self) -> Self::Key {
        (self.ref_id.clone(), self.provider_id)
    }
}

#[cfg(test)]
mod tests {
    use super::MatchKey;
    use crate::{Assignment, EntityId, EntityLookup, ProviderId, Resource, ResourceId, RoleId};

    #[test]
    fn assignment_match_key_ignores_row_id() {
        let from_id = EntityId::new();
        let to_id = EntityId::new();
        let role_id = RoleId::new();

        let first = Assignment::new(from_id, to_id, role_id);
        let second = Assignment::new(from_id, to_id, role_id);

        assert_ne!(first.id, second.id);
        assert_eq!(first.match_key(), second.match_key());
        assert_eq!(Assignment::MATCH_COLUMNS, &["fromid", "roleid", "toid"]);
    }

    #[test]
    fn resource_and_lookup_keys_follow_ingestion_contract() {
        let provider_id = ProviderId::new();
        let resource = Resource {
            id: ResourceId::new(),
            ref_id: "app_skd_mva".to_owned(),
            provider_id,
            name: "VAT return".to_owned(),
        };
        let lookup = EntityLookup {
            entity_id: EntityId::new(),
            key: "OrganizationIdentifier".to_owned(),
            value: "910000001".to_owned(),
        };

        assert_eq!(resource.match_key(), ("app_skd_mva".to_owned(), provider_id));
        assert_eq!(Resource::MATCH_COLUMNS, &["refid", "providerid"]);
        assert_eq!(lookup.match_key().1, "OrganizationIdentifier");
        assert_eq!(EntityLookup::MATCH_COLUMNS, &["entityid", "key"]);
    }
}
