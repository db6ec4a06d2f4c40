use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use accessmgmt_domain::{PackageSource, Relation, RelationKey};

/// Set of relations unique on [`RelationKey`].
///
/// When the same key is produced by an instance-level and a role-level package grant, the
/// instance-level row is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationSet {
    rows: BTreeMap<RelationKey, Relation>,
}

impl RelationSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a relation, returning whether its key was new.
    pub fn insert(&mut self, relation: Relation) -> bool {
        match self.rows.entry(relation.key()) {
            Entry::Vacant(entry) => {
                entry.insert(relation);
                true
            }
            Entry::Occupied(mut entry) => {
                if relation.package_source == Some(PackageSource::Direct) {
                    entry.get_mut().package_source = Some(PackageSource::Direct);
                }
                false
            }
        }
    }

    /// Returns the number of relations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns whether a relation with the same key is present.
    #[must_use]
    pub fn contains(&self, relation: &Relation) -> bool {
        self.rows.contains_key(&relation.key())
    }

    /// Iterates relations in key order.
    pub fn iter(&self) -> impl Iterator<Item = &Relation> {
        self.rows.values()
    }

    /// Consumes the set into a vector in key order.
    #[must_use]
    pub fn into_vec(self) -> Vec<Relation> {
        self.rows.into_values().collect()
    }
}

impl Extend<Relation> for RelationSet {
    fn extend<T: IntoIterator<Item = Relation>>(&mut self, iter: T) {
        for relation in iter {
            self.insert(relation);
        }
    }
}

impl FromIterator<Relation> for RelationSet {
    fn from_iter<T: IntoIterator<Item = Relation>>(iter: T) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl IntoIterator for RelationSet {
    type Item = Relation;
    type IntoIter = std::collections::btree_map::IntoValues<RelationKey, Relation>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_values()
    }
}
