use std::collections::HashMap;

use termtree::Tree;
use tracing::instrument;

use crate::domain::arena::FamilyTree;

/// Render a hierarchy as an indented text tree.
pub trait TreeDisplay {
    fn to_tree_string(&self) -> Tree<String>;
}

impl TreeDisplay for FamilyTree {
    /// Built bottom-up from the post-order walk, so deep trees need no recursion.
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        let mut built: HashMap<_, Tree<String>> = HashMap::with_capacity(self.len());
        for (idx, node) in self.iter_postorder() {
            let leaves: Vec<Tree<String>> = node
                .children
                .iter()
                .filter_map(|c| built.remove(c))
                .collect();
            built.insert(idx, Tree::new(node.to_string()).with_leaves(leaves));
        }
        self.root()
            .and_then(|r| built.remove(&r))
            .unwrap_or_else(|| Tree::new("Empty tree".to_string()))
    }
}
