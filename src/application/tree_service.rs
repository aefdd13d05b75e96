//! Tree rendering pipeline
//!
//! build -> validate -> layout -> flatten, re-run from scratch for every snapshot.

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::application::ApplicationResult;
use crate::config::{RenderSettings, Settings};
use crate::domain::{
    build_hierarchy, calculate_generations, render_nodes, validate, Connector, DomainError,
    LayoutEngine, Person, Rect, Relationship, RenderNode, Size, ViewportController,
    ViewportSettings, ViewportState, Violation,
};

/// What a presentation layer needs to draw one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TreeView {
    /// No tree can be drawn; `reason` says why (no members, no root, cycle)
    Unbuildable { reason: String },
    Ready {
        nodes: Vec<RenderNode>,
        connectors: Vec<Connector>,
        bounds: Option<Rect>,
        violations: Vec<Violation>,
        generations: usize,
    },
}

impl TreeView {
    pub fn violations(&self) -> &[Violation] {
        match self {
            TreeView::Ready { violations, .. } => violations,
            TreeView::Unbuildable { .. } => &[],
        }
    }

    pub fn bounds(&self) -> Option<Rect> {
        match self {
            TreeView::Ready { bounds, .. } => *bounds,
            TreeView::Unbuildable { .. } => None,
        }
    }
}

/// Outcome of a structural check without layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StructureCheck {
    /// A root exists but no tree can be built from it (a cycle)
    Unbuildable { reason: String },
    /// Violations found; `NoRoot` alone when there is nothing to build from
    Checked { violations: Vec<Violation> },
}

/// Service producing `TreeView`s with a fixed layout and viewport configuration.
pub struct TreeService {
    engine: LayoutEngine,
    viewport: ViewportSettings,
    render: RenderSettings,
}

impl TreeService {
    pub fn new(settings: &Settings) -> ApplicationResult<Self> {
        settings.viewport.validate()?;
        Ok(Self {
            engine: LayoutEngine::new(settings.layout)?,
            viewport: settings.viewport,
            render: settings.render,
        })
    }

    /// Same pipeline with a different centering width.
    pub fn with_viewport_width(mut self, width: f64) -> Self {
        self.render.viewport_width = width;
        self
    }

    #[instrument(
        level = "debug",
        skip_all,
        fields(members = members.len(), relationships = relationships.len())
    )]
    pub fn render(
        &self,
        members: &[Person],
        relationships: &[Relationship],
    ) -> ApplicationResult<TreeView> {
        let tree = match build_hierarchy(members, relationships) {
            Ok(tree) => tree,
            Err(e) if e.is_build_fatal() => {
                warn!("cannot build tree: {}", e);
                return Ok(TreeView::Unbuildable {
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let violations = validate(Some(&tree), members, relationships);
        for v in &violations {
            warn!("{}", v);
        }
        let layout = self.engine.layout(&tree, self.render.viewport_width);
        let view = TreeView::Ready {
            nodes: render_nodes(&tree, &layout),
            connectors: layout.connectors(&tree),
            bounds: layout.bounding_box(),
            violations,
            generations: calculate_generations(members, relationships),
        };
        info!("rendered {} nodes", tree.len());
        Ok(view)
    }

    /// Run the structure rules without laying anything out.
    #[instrument(level = "debug", skip_all)]
    pub fn check(
        &self,
        members: &[Person],
        relationships: &[Relationship],
    ) -> ApplicationResult<StructureCheck> {
        let tree = match build_hierarchy(members, relationships) {
            Ok(tree) => Some(tree),
            Err(e @ DomainError::CycleDetected(_)) => {
                warn!("cannot build tree: {}", e);
                return Ok(StructureCheck::Unbuildable {
                    reason: e.to_string(),
                });
            }
            Err(e) if e.is_build_fatal() => None,
            Err(e) => return Err(e.into()),
        };
        Ok(StructureCheck::Checked {
            violations: validate(tree.as_ref(), members, relationships),
        })
    }

    /// Viewport that fits the view's bounds into the configured surface.
    pub fn fit(&self, view: &TreeView) -> ViewportState {
        self.fit_to_surface(view, Size::new(self.render.surface_width, self.render.surface_height))
    }

    pub fn fit_to_surface(&self, view: &TreeView, surface: Size) -> ViewportState {
        let mut controller = ViewportController::new(self.viewport).unwrap_or_default();
        if let Some(bounds) = view.bounds() {
            controller.fit_to_bounds(bounds, surface);
        }
        controller.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TreeService {
        TreeService::new(&Settings::default()).unwrap()
    }

    #[test]
    fn given_no_root_when_rendering_then_view_is_unbuildable() {
        let members = vec![Person::new("a", "A", "X")];

        let view = service().render(&members, &[]).unwrap();

        assert_eq!(
            view,
            TreeView::Unbuildable {
                reason: "No root person found (is_root must be set for one member)".into()
            }
        );
        assert_eq!(service().fit(&view), ViewportState::default());
    }

    #[test]
    fn given_parent_child_cycle_when_checking_then_reports_cycle_not_missing_root() {
        // Arrange
        let members = vec![Person::new("a", "A", "X").as_root(), Person::new("b", "B", "X")];
        let rels = vec![
            Relationship::parent_child("r1", "a", "b"),
            Relationship::parent_child("r2", "b", "a"),
        ];

        // Act
        let check = service().check(&members, &rels).unwrap();

        // Assert
        let StructureCheck::Unbuildable { reason } = check else {
            panic!("expected unbuildable, got {check:?}");
        };
        assert_eq!(reason, "cycle detected in hierarchy at: a");
    }

    #[test]
    fn given_no_root_flag_when_checking_then_reports_no_root() {
        let members = vec![Person::new("a", "A", "X")];

        let check = service().check(&members, &[]).unwrap();

        assert_eq!(
            check,
            StructureCheck::Checked {
                violations: vec![Violation::NoRoot]
            }
        );
    }

    #[test]
    fn given_small_family_when_rendering_then_view_is_ready() {
        let members = vec![
            Person::new("a", "A", "X").as_root(),
            Person::new("b", "B", "X"),
            Person::new("c", "C", "X"),
        ];
        let rels = vec![
            Relationship::spouse("r1", "a", "b"),
            Relationship::parent_child("r2", "a", "c"),
        ];

        let view = service().render(&members, &rels).unwrap();

        let TreeView::Ready {
            nodes,
            connectors,
            bounds,
            violations,
            generations,
        } = view
        else {
            panic!("expected ready view");
        };
        assert_eq!(nodes.len(), 2);
        assert_eq!(connectors.len(), 2);
        assert_eq!(bounds, Some(Rect::new(530.0, 100.0, 140.0, 260.0)));
        assert!(violations.is_empty());
        assert_eq!(generations, 2);
    }
}
