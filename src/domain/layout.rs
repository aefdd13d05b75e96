//! Two-pass tidy layout: subtree widths bottom-up, then positions top-down.
//!
//! Positions are written to a `Layout` side-table keyed by arena index; the tree
//! itself is never mutated. Both passes are iterative, so depth is bounded only by
//! memory, not by the call stack.

use std::collections::HashMap;

use generational_arena::Index;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::arena::FamilyTree;
use crate::domain::entities::{Person, PersonId};
use crate::domain::error::{DomainError, DomainResult};

/// Layout dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub node_width: f64,
    pub node_height: f64,
    /// Space between sibling subtrees
    pub horizontal_gap: f64,
    /// Distance between generations
    pub vertical_gap: f64,
    /// Space between a node and its spouse
    pub pair_gap: f64,
    /// y of the root node
    pub top_margin: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 140.0,
            node_height: 80.0,
            horizontal_gap: 180.0,
            vertical_gap: 180.0,
            pair_gap: 20.0,
            top_margin: 100.0,
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> DomainResult<()> {
        let positive = [("node_width", self.node_width), ("node_height", self.node_height)];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(DomainError::InvalidConfig(format!(
                    "layout.{name} must be a positive number, got {value}"
                )));
            }
        }
        let non_negative = [
            ("horizontal_gap", self.horizontal_gap),
            ("vertical_gap", self.vertical_gap),
            ("pair_gap", self.pair_gap),
            ("top_margin", self.top_margin),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(DomainError::InvalidConfig(format!(
                    "layout.{name} must be zero or positive, got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle; used for node geometry and bounding boxes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }
}

/// Line segments a renderer draws between nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Connector {
    /// Elbow from the parent's bottom center to the child's top center
    ParentChild {
        parent: PersonId,
        child: PersonId,
        points: [Point; 4],
    },
    /// Horizontal line from a node to its spouse
    Marriage {
        person: PersonId,
        spouse: PersonId,
        from: Point,
        to: Point,
    },
}

/// Computed geometry for one `FamilyTree`. Valid until the tree is rebuilt.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    positions: HashMap<Index, Rect>,
    spouses: HashMap<Index, Rect>,
    subtree_widths: HashMap<Index, f64>,
    total_width: f64,
}

impl Layout {
    pub fn get(&self, idx: Index) -> Option<Rect> {
        self.positions.get(&idx).copied()
    }

    /// Rectangle of the spouse drawn beside the node at `idx`, if it has one.
    pub fn spouse_geometry(&self, idx: Index) -> Option<Rect> {
        self.spouses.get(&idx).copied()
    }

    /// Width of the whole tree (the root's subtree width).
    pub fn total_width(&self) -> f64 {
        self.total_width
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Smallest rectangle enclosing every node rectangle.
    pub fn bounding_box(&self) -> Option<Rect> {
        let mut rects = self.positions.values();
        let first = *rects.next()?;
        let (min_x, min_y, max_x, max_y) = rects.fold(
            (first.x, first.y, first.right(), first.bottom()),
            |(min_x, min_y, max_x, max_y), r| {
                (
                    min_x.min(r.x),
                    min_y.min(r.y),
                    max_x.max(r.right()),
                    max_y.max(r.bottom()),
                )
            },
        );
        Some(Rect::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    /// Parent-child elbows and marriage lines, breadth-first.
    pub fn connectors(&self, tree: &FamilyTree) -> Vec<Connector> {
        let mut connectors = Vec::new();
        for (idx, node) in tree.iter_breadth_first() {
            let Some(parent) = self.get(idx) else {
                continue;
            };
            for &child_idx in &node.children {
                let (Some(child), Some(child_node)) = (self.get(child_idx), tree.get_node(child_idx))
                else {
                    continue;
                };
                let (px, py) = (parent.center_x(), parent.bottom());
                let (cx, cy) = (child.center_x(), child.y);
                let mid_y = (py + cy) / 2.0;
                connectors.push(Connector::ParentChild {
                    parent: node.id().clone(),
                    child: child_node.id().clone(),
                    points: [
                        Point::new(px, py),
                        Point::new(px, mid_y),
                        Point::new(cx, mid_y),
                        Point::new(cx, cy),
                    ],
                });
            }
            if let (Some(spouse), Some(spouse_rect)) = (&node.spouse, self.spouse_geometry(idx)) {
                let y = parent.y + parent.height / 2.0;
                connectors.push(Connector::Marriage {
                    person: node.id().clone(),
                    spouse: spouse.id.clone(),
                    from: Point::new(parent.right(), y),
                    to: Point::new(spouse_rect.x, y),
                });
            }
        }
        connectors
    }
}

/// Lays out trees with a validated configuration.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> DomainResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Position every node; the root is centered in `viewport_width` but never
    /// starts left of 0.
    #[instrument(level = "debug", skip(self, tree), fields(nodes = tree.len()))]
    pub fn layout(&self, tree: &FamilyTree, viewport_width: f64) -> Layout {
        let subtree_widths = self.subtree_widths(tree);
        let total_width = tree
            .root()
            .and_then(|r| subtree_widths.get(&r).copied())
            .unwrap_or(0.0);

        let mut layout = Layout {
            positions: HashMap::with_capacity(tree.len()),
            spouses: HashMap::new(),
            subtree_widths,
            total_width,
        };
        let Some(root) = tree.root() else {
            return layout;
        };

        let start_x = ((viewport_width - total_width) / 2.0).max(0.0);
        let cfg = &self.config;
        let mut stack = vec![(root, start_x, cfg.top_margin)];

        while let Some((idx, x, y)) = stack.pop() {
            let Some(node) = tree.get_node(idx) else {
                continue;
            };
            let width = layout.subtree_widths.get(&idx).copied().unwrap_or(cfg.node_width);
            let node_x = if node.is_leaf() {
                x
            } else {
                x + width / 2.0 - cfg.node_width / 2.0
            };
            layout
                .positions
                .insert(idx, Rect::new(node_x, y, cfg.node_width, cfg.node_height));
            if node.spouse.is_some() {
                layout.spouses.insert(
                    idx,
                    Rect::new(
                        node_x + cfg.node_width + cfg.pair_gap,
                        y,
                        cfg.node_width,
                        cfg.node_height,
                    ),
                );
            }

            let mut child_x = x;
            for &child in &node.children {
                stack.push((child, child_x, y + cfg.vertical_gap));
                let child_width = layout
                    .subtree_widths
                    .get(&child)
                    .copied()
                    .unwrap_or(cfg.node_width);
                child_x += child_width + cfg.horizontal_gap;
            }
        }

        debug!("layout: total_width={}, nodes={}", total_width, layout.len());
        layout
    }

    /// Post-order pass: a leaf is one node wide, an inner node spans its children
    /// plus the gaps between them, never less than one node.
    fn subtree_widths(&self, tree: &FamilyTree) -> HashMap<Index, f64> {
        let cfg = &self.config;
        let mut widths: HashMap<Index, f64> = HashMap::with_capacity(tree.len());
        for (idx, node) in tree.iter_postorder() {
            let width = if node.is_leaf() {
                cfg.node_width
            } else {
                let children: f64 = node
                    .children
                    .iter()
                    .map(|c| widths.get(c).copied().unwrap_or(cfg.node_width) + cfg.horizontal_gap)
                    .sum();
                (children - cfg.horizontal_gap).max(cfg.node_width)
            };
            widths.insert(idx, width);
        }
        widths
    }
}

/// Lay out an optional tree; `None` passes through.
pub fn layout(
    tree: Option<&FamilyTree>,
    config: LayoutConfig,
    viewport_width: f64,
) -> DomainResult<Option<Layout>> {
    let engine = LayoutEngine::new(config)?;
    Ok(tree.map(|t| engine.layout(t, viewport_width)))
}

/// Node data handed to a rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderNode {
    pub id: PersonId,
    pub person: Person,
    pub spouse: Option<Person>,
    pub children: Vec<PersonId>,
    pub level: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Where the spouse card goes, if any
    pub spouse_rect: Option<Rect>,
}

/// Join tree and layout into render records, in breadth-first order.
pub fn render_nodes(tree: &FamilyTree, layout: &Layout) -> Vec<RenderNode> {
    tree.iter_breadth_first()
        .map(|(idx, node)| {
            let rect = layout.get(idx).unwrap_or_default();
            RenderNode {
                id: node.id().clone(),
                person: node.person.clone(),
                spouse: node.spouse.clone(),
                children: node
                    .children
                    .iter()
                    .filter_map(|c| tree.get_node(*c))
                    .map(|c| c.id().clone())
                    .collect(),
                level: node.level,
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
                spouse_rect: layout.spouse_geometry(idx),
            }
        })
        .collect()
}
