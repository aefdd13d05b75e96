//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod analysis;
pub mod arena;
pub mod builder;
pub mod entities;
pub mod error;
pub mod index;
pub mod layout;
pub mod tree_display;
pub mod validator;
pub mod viewport;

pub use analysis::{calculate_generations, connected_members, disconnected_members};
pub use arena::{flatten, FamilyTree, TreeNode};
pub use builder::{build_hierarchy, HierarchyBuilder};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use index::RelationshipIndex;
pub use layout::{
    layout, render_nodes, Connector, Layout, LayoutConfig, LayoutEngine, Point, Rect, RenderNode,
};
pub use tree_display::TreeDisplay;
pub use validator::{validate, Violation};
pub use viewport::{
    PointerButton, Size, ViewportController, ViewportEvent, ViewportSettings, ViewportState,
};
