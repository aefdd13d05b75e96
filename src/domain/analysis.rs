//! Whole-snapshot statistics that do not need a built tree.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::instrument;

use crate::domain::entities::{Person, PersonId, Relationship, RelationshipKind};

/// Number of generations in the snapshot.
///
/// 0 without members, 1 without relationships, otherwise the longest
/// parent-to-child chain starting at any member that has no parent. A member
/// already on the current path is not revisited, so cyclic data terminates.
#[instrument(level = "debug", skip_all)]
pub fn calculate_generations(members: &[Person], relationships: &[Relationship]) -> usize {
    if members.is_empty() {
        return 0;
    }
    if relationships.is_empty() {
        return 1;
    }

    let mut children_of: HashMap<&PersonId, Vec<&PersonId>> = HashMap::new();
    let mut has_parent: HashSet<&PersonId> = HashSet::new();
    for rel in relationships
        .iter()
        .filter(|r| r.kind == RelationshipKind::ParentChild)
    {
        children_of.entry(&rel.person1).or_default().push(&rel.person2);
        has_parent.insert(&rel.person2);
    }

    let mut max_depth = 1;
    for top in members.iter().map(|m| &m.id).filter(|id| !has_parent.contains(id)) {
        // (person, depth, path so far)
        let mut stack: Vec<(&PersonId, usize, Vec<&PersonId>)> = vec![(top, 1, vec![top])];
        while let Some((id, depth, path)) = stack.pop() {
            max_depth = max_depth.max(depth);
            for &child in children_of.get(id).map(Vec::as_slice).unwrap_or(&[]) {
                if path.contains(&child) {
                    continue;
                }
                let mut next = path.clone();
                next.push(child);
                stack.push((child, depth + 1, next));
            }
        }
    }
    max_depth
}

/// Everyone reachable from `root` through any relationship, in either direction.
///
/// The root itself is included even when it has no relationships.
#[instrument(level = "debug", skip(relationships))]
pub fn connected_members(relationships: &[Relationship], root: &PersonId) -> HashSet<PersonId> {
    let mut neighbours: HashMap<&PersonId, Vec<&PersonId>> = HashMap::new();
    for rel in relationships {
        neighbours.entry(&rel.person1).or_default().push(&rel.person2);
        neighbours.entry(&rel.person2).or_default().push(&rel.person1);
    }

    let mut seen: HashSet<PersonId> = HashSet::from([root.clone()]);
    let mut queue: VecDeque<&PersonId> = VecDeque::from([root]);
    while let Some(id) = queue.pop_front() {
        for &next in neighbours.get(id).map(Vec::as_slice).unwrap_or(&[]) {
            if seen.insert(next.clone()) {
                queue.push_back(next);
            }
        }
    }
    seen
}

/// Members with no relationship path to the first root-flagged member, in member
/// order. Empty when no member is flagged as root.
pub fn disconnected_members<'a>(
    members: &'a [Person],
    relationships: &[Relationship],
) -> Vec<&'a Person> {
    let Some(root) = members.iter().find(|m| m.is_root) else {
        return Vec::new();
    };
    let connected = connected_members(relationships, &root.id);
    members
        .iter()
        .filter(|m| !connected.contains(&m.id))
        .collect()
}
