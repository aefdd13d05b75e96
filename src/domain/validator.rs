//! Structural rule checks (single spouse, everyone connected to the root).
//!
//! Violations are reported, never repaired and never raised as errors.

use std::collections::{HashMap, HashSet};
use std::fmt;

use itertools::Itertools;
use serde::Serialize;
use tracing::instrument;

use crate::domain::arena::FamilyTree;
use crate::domain::entities::{Person, PersonId, Relationship, RelationshipKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// No tree could be built
    NoRoot,
    /// Person appears in more than one spouse relationship
    MultipleSpouses { person: PersonId, name: String },
    /// Member not present in the tree
    Disconnected { person: PersonId, name: String },
    /// More than one member carries the root flag; the first one was used
    AmbiguousRoot { chosen: PersonId, ignored: Vec<PersonId> },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::NoRoot => write!(f, "No root node"),
            Violation::MultipleSpouses { name, .. } => {
                write!(f, "Phase 1 violation: {name} has multiple spouses")
            }
            Violation::Disconnected { name, .. } => {
                write!(f, "Member {name} is not connected to root")
            }
            Violation::AmbiguousRoot { chosen, ignored } => write!(
                f,
                "Multiple root persons flagged; using {chosen}, ignoring {}",
                ignored.iter().join(", ")
            ),
        }
    }
}

/// Check a built tree against the flat snapshot it was built from.
///
/// Order of results: spouse violations (first appearance order), disconnected
/// members (member order), then root ambiguity. `None` yields only `NoRoot`.
#[instrument(level = "debug", skip_all)]
pub fn validate(
    tree: Option<&FamilyTree>,
    members: &[Person],
    relationships: &[Relationship],
) -> Vec<Violation> {
    let Some(tree) = tree.filter(|t| t.root().is_some()) else {
        return vec![Violation::NoRoot];
    };

    let by_id: HashMap<&PersonId, &Person> = members.iter().map(|m| (&m.id, m)).collect();
    let mut violations = Vec::new();

    let spouse_ids = relationships
        .iter()
        .filter(|r| r.kind == RelationshipKind::Spouse)
        .flat_map(|r| [&r.person1, &r.person2]);
    let counts = spouse_ids.clone().counts();
    for id in spouse_ids.unique().filter(|id| counts[id] > 1) {
        let name = by_id
            .get(id)
            .map(|m| m.first_name.clone())
            .unwrap_or_else(|| id.to_string());
        violations.push(Violation::MultipleSpouses {
            person: id.clone(),
            name,
        });
    }

    // attached spouses count as connected through their partner's node
    let in_tree: HashSet<&PersonId> = tree
        .flatten()
        .into_iter()
        .flat_map(|n| std::iter::once(n.id()).chain(n.spouse.as_ref().map(|s| &s.id)))
        .collect();
    for member in members.iter().filter(|m| !in_tree.contains(&m.id)) {
        violations.push(Violation::Disconnected {
            person: member.id.clone(),
            name: format!("{} {}", member.first_name, member.last_name),
        });
    }

    let mut flagged = members.iter().filter(|m| m.is_root).map(|m| m.id.clone());
    if let Some(chosen) = flagged.next() {
        let ignored: Vec<PersonId> = flagged.collect();
        if !ignored.is_empty() {
            violations.push(Violation::AmbiguousRoot { chosen, ignored });
        }
    }

    violations
}
