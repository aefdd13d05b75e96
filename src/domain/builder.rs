//! Hierarchy builder: turns flat members and relationships into a rooted family tree.

use std::collections::{HashMap, HashSet};

use generational_arena::Index;
use tracing::{debug, instrument, warn};

use crate::domain::arena::FamilyTree;
use crate::domain::entities::{Person, PersonId, Relationship};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::index::RelationshipIndex;

/// Constructs a `FamilyTree` from the root-flagged member downwards.
///
/// The walk is iterative and guarded: a child that is already an ancestor on the
/// current path fails the build with `CycleDetected`, and a person reached a second
/// time through another parent edge is skipped (first placement in pre-order wins).
#[derive(Debug, Default)]
pub struct HierarchyBuilder {
    placed: HashSet<PersonId>,
}

impl HierarchyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(
        level = "debug",
        skip_all,
        fields(members = members.len(), relationships = relationships.len())
    )]
    pub fn build(
        &mut self,
        members: &[Person],
        relationships: &[Relationship],
    ) -> DomainResult<FamilyTree> {
        if members.is_empty() {
            return Err(DomainError::NoMembers);
        }

        let root = find_root(members)?;
        let member_map: HashMap<&PersonId, &Person> = members.iter().map(|m| (&m.id, m)).collect();
        let index = RelationshipIndex::build(members, relationships);

        // Reset state for a fresh build
        self.placed.clear();

        let mut tree = FamilyTree::new();
        let mut stack: Vec<(&PersonId, Option<Index>)> = vec![(&root.id, None)];

        while let Some((current_id, parent_idx)) = stack.pop() {
            if let Some(parent) = parent_idx {
                if tree.is_on_path(parent, current_id) {
                    return Err(DomainError::CycleDetected(current_id.clone()));
                }
            }
            if !self.placed.insert(current_id.clone()) {
                warn!("{} already placed in tree, skipping additional parent edge", current_id);
                continue;
            }
            let Some(person) = member_map.get(current_id) else {
                continue;
            };

            let spouse = index
                .spouse_of(current_id)
                .and_then(|s| member_map.get(s))
                .map(|s| (*s).clone());
            let current_idx = tree.insert_node((*person).clone(), spouse, parent_idx);

            // Reverse push keeps the oldest child on top of the stack
            for child in index
                .children_of(current_id)
                .iter()
                .rev()
                .filter(|c| member_map.contains_key(*c))
            {
                stack.push((child, Some(current_idx)));
            }
        }

        debug!("built tree with {} nodes, depth {}", tree.len(), tree.depth());
        Ok(tree)
    }
}

/// First root-flagged member in list order.
fn find_root(members: &[Person]) -> DomainResult<&Person> {
    let mut roots = members.iter().filter(|m| m.is_root);
    let root = roots.next().ok_or(DomainError::NoRootPerson)?;
    let extra: Vec<&PersonId> = roots.map(|m| &m.id).collect();
    if !extra.is_empty() {
        warn!("multiple root persons flagged, using {} and ignoring {:?}", root.id, extra);
    }
    Ok(root)
}

/// Build a tree with a fresh builder.
pub fn build_hierarchy(members: &[Person], relationships: &[Relationship]) -> DomainResult<FamilyTree> {
    HierarchyBuilder::new().build(members, relationships)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn born(id: &str, year: i32) -> Person {
        Person::new(id, id, "X").born(NaiveDate::from_ymd_opt(year, 1, 1).unwrap())
    }

    fn child_ids(tree: &FamilyTree, id: &str) -> Vec<String> {
        let idx = tree.find(&id.into()).unwrap();
        tree.get_node(idx)
            .unwrap()
            .children
            .iter()
            .map(|c| tree.get_node(*c).unwrap().id().to_string())
            .collect()
    }

    #[test]
    fn given_root_with_spouse_and_children_when_building_then_orders_children_by_birth() {
        // Arrange
        let members = vec![
            Person::new("A", "A", "X").as_root(),
            Person::new("B", "B", "X"),
            born("C", 2000),
            born("D", 1998),
        ];
        let rels = vec![
            Relationship::spouse("r1", "A", "B"),
            Relationship::parent_child("r2", "A", "C"),
            Relationship::parent_child("r3", "A", "D"),
            Relationship::parent_child("r4", "B", "C"),
            Relationship::parent_child("r5", "B", "D"),
        ];

        // Act
        let tree = build_hierarchy(&members, &rels).unwrap();

        // Assert
        let root = tree.root_node().unwrap();
        assert_eq!(root.id().as_str(), "A");
        assert_eq!(root.spouse.as_ref().map(|s| s.id.as_str()), Some("B"));
        assert_eq!(child_ids(&tree, "A"), vec!["D", "C"]);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn given_no_members_when_building_then_errors() {
        assert_eq!(build_hierarchy(&[], &[]).unwrap_err(), DomainError::NoMembers);
    }

    #[test]
    fn given_no_root_flag_when_building_then_errors() {
        let members = vec![Person::new("a", "A", "X")];
        assert_eq!(build_hierarchy(&members, &[]).unwrap_err(), DomainError::NoRootPerson);
    }

    #[test]
    fn given_multiple_root_flags_when_building_then_uses_first_in_list() {
        let members = vec![
            Person::new("second", "S", "X"),
            Person::new("first", "F", "X").as_root(),
            Person::new("third", "T", "X").as_root(),
        ];

        let tree = build_hierarchy(&members, &[]).unwrap();

        assert_eq!(tree.root_node().unwrap().id().as_str(), "first");
    }

    #[test]
    fn given_child_not_in_members_when_building_then_drops_edge() {
        let members = vec![Person::new("a", "A", "X").as_root()];
        let rels = vec![Relationship::parent_child("r1", "a", "ghost")];

        let tree = build_hierarchy(&members, &rels).unwrap();

        assert_eq!(tree.len(), 1);
        assert!(tree.root_node().unwrap().is_leaf());
    }

    #[test]
    fn given_spouse_not_in_members_when_building_then_has_no_spouse() {
        let members = vec![Person::new("a", "A", "X").as_root()];
        let rels = vec![Relationship::spouse("r1", "a", "ghost")];

        let tree = build_hierarchy(&members, &rels).unwrap();

        assert!(tree.root_node().unwrap().spouse.is_none());
    }

    #[test]
    fn given_cycle_when_building_then_errors() {
        let members = vec![
            Person::new("a", "A", "X").as_root(),
            Person::new("b", "B", "X"),
            Person::new("c", "C", "X"),
        ];
        let rels = vec![
            Relationship::parent_child("r1", "a", "b"),
            Relationship::parent_child("r2", "b", "c"),
            Relationship::parent_child("r3", "c", "a"),
        ];

        let result = build_hierarchy(&members, &rels);

        assert_eq!(result.unwrap_err(), DomainError::CycleDetected("a".into()));
    }

    #[test]
    fn given_descendant_reached_through_two_parents_when_building_then_places_once() {
        //     a
        //    / \
        //   b   c
        //    \ /
        //     d
        let members = vec![
            Person::new("a", "A", "X").as_root(),
            born("b", 1950),
            born("c", 1952),
            born("d", 1980),
        ];
        let rels = vec![
            Relationship::parent_child("r1", "a", "b"),
            Relationship::parent_child("r2", "a", "c"),
            Relationship::parent_child("r3", "b", "d"),
            Relationship::parent_child("r4", "c", "d"),
        ];

        let tree = build_hierarchy(&members, &rels).unwrap();

        assert_eq!(tree.len(), 4);
        assert_eq!(child_ids(&tree, "b"), vec!["d"]);
        assert!(child_ids(&tree, "c").is_empty());
    }

    #[test]
    fn given_same_input_when_building_twice_then_shapes_match() {
        let members = vec![
            Person::new("a", "A", "X").as_root(),
            born("b", 1950),
            born("c", 1950),
            born("d", 1949),
        ];
        let rels = vec![
            Relationship::parent_child("r1", "a", "b"),
            Relationship::parent_child("r2", "a", "c"),
            Relationship::parent_child("r3", "a", "d"),
        ];
        let mut builder = HierarchyBuilder::new();

        let first = builder.build(&members, &rels).unwrap();
        let second = builder.build(&members, &rels).unwrap();

        // equal dates keep relationship order
        assert_eq!(child_ids(&first, "a"), vec!["d", "b", "c"]);
        assert_eq!(child_ids(&first, "a"), child_ids(&second, "a"));
    }
}
