use std::collections::{HashMap, VecDeque};
use std::fmt;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::entities::{Person, PersonId};

/// Tree node in the arena-based family hierarchy.
///
/// Geometry lives in a separate `Layout` side-table keyed by the node's arena index.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// The person this node stands for; the node's identity is the person's id
    pub person: Person,
    /// Partner drawn next to this node, never a subtree root of its own
    pub spouse: Option<Person>,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena, oldest first
    pub children: Vec<Index>,
    /// Generation depth, root = 0
    pub level: usize,
}

impl TreeNode {
    pub fn id(&self) -> &PersonId {
        &self.person.id
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.person.full_name())?;
        if let Some(year) = self.person.birth_year() {
            write!(f, " (b. {year})")?;
        }
        if let Some(spouse) = &self.spouse {
            write!(f, " m. {}", spouse.full_name())?;
        }
        Ok(())
    }
}

/// Rooted family tree stored in a generational arena.
///
/// Each person appears at most once; `find` maps a person id back to its node.
#[derive(Debug, Default)]
pub struct FamilyTree {
    arena: Arena<TreeNode>,
    root: Option<Index>,
    by_person: HashMap<PersonId, Index>,
}

impl FamilyTree {
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(level = "trace", skip(self, person, spouse), fields(person = %person.id))]
    pub fn insert_node(
        &mut self,
        person: Person,
        spouse: Option<Person>,
        parent: Option<Index>,
    ) -> Index {
        let level = parent
            .and_then(|p| self.arena.get(p))
            .map(|p| p.level + 1)
            .unwrap_or(0);
        let id = person.id.clone();
        let node = TreeNode {
            person,
            spouse,
            parent,
            children: Vec::new(),
            level,
        };
        let node_idx = self.arena.insert(node);
        self.by_person.insert(id, node_idx);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.root = Some(node_idx);
        }

        node_idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    pub fn root_node(&self) -> Option<&TreeNode> {
        self.root.and_then(|r| self.arena.get(r))
    }

    pub fn find(&self, id: &PersonId) -> Option<Index> {
        self.by_person.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// True if `id` is the person at `idx` or one of its ancestors.
    pub fn is_on_path(&self, idx: Index, id: &PersonId) -> bool {
        let mut current = Some(idx);
        while let Some(i) = current {
            match self.arena.get(i) {
                Some(node) if node.id() == id => return true,
                Some(node) => current = node.parent,
                None => return false,
            }
        }
        false
    }

    /// Pre-order, left-to-right.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self)
    }

    /// Root first, then each generation left to right.
    pub fn iter_breadth_first(&self) -> BreadthFirstIterator<'_> {
        BreadthFirstIterator::new(self)
    }

    /// All nodes in breadth-first order.
    #[instrument(level = "debug", skip(self))]
    pub fn flatten(&self) -> Vec<&TreeNode> {
        self.iter_breadth_first().map(|(_, node)| node).collect()
    }

    /// Number of generations in the tree, 0 for an empty tree.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.iter().map(|(_, node)| node.level + 1).max().unwrap_or(0)
    }

    /// Ids of all childless nodes, left to right.
    pub fn leaf_nodes(&self) -> Vec<&PersonId> {
        self.iter()
            .filter(|(_, node)| node.is_leaf())
            .map(|(_, node)| node.id())
            .collect()
    }
}

/// Flatten an optional tree; `None` yields an empty list.
pub fn flatten(tree: Option<&FamilyTree>) -> Vec<&TreeNode> {
    tree.map(|t| t.flatten()).unwrap_or_default()
}

pub struct TreeIterator<'a> {
    tree: &'a FamilyTree,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a FamilyTree) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = tree.root() {
            stack.push(root);
        }
        Self { tree, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        let current_idx = self.stack.pop()?;
        let node = self.tree.get_node(current_idx)?;
        // Push children in reverse order for left-to-right traversal
        for &child in node.children.iter().rev() {
            self.stack.push(child);
        }
        Some((current_idx, node))
    }
}

pub struct PostOrderIterator<'a> {
    tree: &'a FamilyTree,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(tree: &'a FamilyTree) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = tree.root() {
            stack.push((root, false));
        }
        Self { tree, stack }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}

pub struct BreadthFirstIterator<'a> {
    tree: &'a FamilyTree,
    queue: VecDeque<Index>,
}

impl<'a> BreadthFirstIterator<'a> {
    fn new(tree: &'a FamilyTree) -> Self {
        let mut queue = VecDeque::new();
        if let Some(root) = tree.root() {
            queue.push_back(root);
        }
        Self { tree, queue }
    }
}

impl<'a> Iterator for BreadthFirstIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        let current_idx = self.queue.pop_front()?;
        let node = self.tree.get_node(current_idx)?;
        self.queue.extend(node.children.iter().copied());
        Some((current_idx, node))
    }
}
