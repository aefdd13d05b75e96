//! Relationship lookup tables, rebuilt from scratch for every snapshot.

use std::collections::HashMap;

use tracing::{instrument, warn};

use crate::domain::entities::{Person, PersonId, Relationship, RelationshipKind};

/// Lookup structures over a flat relationship list.
///
/// Child lists are sorted ascending by birth date (missing dates first); the sort is
/// stable, so siblings with equal dates keep their relationship-list order.
#[derive(Debug, Default)]
pub struct RelationshipIndex {
    spouse_of: HashMap<PersonId, PersonId>,
    children_of: HashMap<PersonId, Vec<PersonId>>,
    parent_of: HashMap<PersonId, PersonId>,
}

impl RelationshipIndex {
    #[instrument(level = "debug", skip_all, fields(relationships = relationships.len()))]
    pub fn build(members: &[Person], relationships: &[Relationship]) -> Self {
        let mut index = Self::default();

        for rel in relationships {
            match rel.kind {
                RelationshipKind::Spouse => {
                    if index.spouse_of.contains_key(&rel.person1)
                        || index.spouse_of.contains_key(&rel.person2)
                    {
                        warn!(
                            "multiple spouses detected for {} or {}",
                            rel.person1, rel.person2
                        );
                    }
                    // last assignment wins
                    index.spouse_of.insert(rel.person1.clone(), rel.person2.clone());
                    index.spouse_of.insert(rel.person2.clone(), rel.person1.clone());
                }
                RelationshipKind::ParentChild => {
                    index
                        .children_of
                        .entry(rel.person1.clone())
                        .or_default()
                        .push(rel.person2.clone());
                    index.parent_of.insert(rel.person2.clone(), rel.person1.clone());
                }
            }
        }

        let birth_dates: HashMap<&PersonId, _> =
            members.iter().map(|m| (&m.id, m.birth_date)).collect();
        for children in index.children_of.values_mut() {
            children.sort_by_key(|id| birth_dates.get(id).copied().flatten());
        }

        index
    }

    pub fn spouse_of(&self, id: &PersonId) -> Option<&PersonId> {
        self.spouse_of.get(id)
    }

    /// Children of `id`, oldest first.
    pub fn children_of(&self, id: &PersonId) -> &[PersonId] {
        self.children_of.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn parent_of(&self, id: &PersonId) -> Option<&PersonId> {
        self.parent_of.get(id)
    }
}
