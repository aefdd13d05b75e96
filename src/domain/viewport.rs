//! Zoom and pan state for one render surface.
//!
//! The transform is `screen = translate + scale * content` on both axes.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::layout::{Point, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSettings {
    pub min_scale: f64,
    pub max_scale: f64,
    /// Scale change per wheel notch or zoom button press
    pub zoom_step: f64,
    /// Padding on every side when fitting a box into the surface
    pub fit_padding: f64,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            min_scale: 0.5,
            max_scale: 1.5,
            zoom_step: 0.1,
            fit_padding: 50.0,
        }
    }
}

impl ViewportSettings {
    pub fn validate(&self) -> DomainResult<()> {
        let all_finite = [self.min_scale, self.max_scale, self.zoom_step, self.fit_padding]
            .iter()
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(DomainError::InvalidConfig(
                "viewport values must be finite numbers".into(),
            ));
        }
        if self.min_scale <= 0.0 || self.min_scale > self.max_scale {
            return Err(DomainError::InvalidConfig(format!(
                "viewport.min_scale must be positive and not above max_scale ({} > {})",
                self.min_scale, self.max_scale
            )));
        }
        if self.zoom_step <= 0.0 {
            return Err(DomainError::InvalidConfig(format!(
                "viewport.zoom_step must be positive, got {}",
                self.zoom_step
            )));
        }
        if self.fit_padding < 0.0 {
            return Err(DomainError::InvalidConfig(format!(
                "viewport.fit_padding must be zero or positive, got {}",
                self.fit_padding
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate_x: 0.0,
            translate_y: 0.0,
        }
    }
}

impl ViewportState {
    pub fn to_screen(&self, content: Point) -> Point {
        Point::new(
            self.translate_x + self.scale * content.x,
            self.translate_y + self.scale * content.y,
        )
    }

    pub fn to_content(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.translate_x) / self.scale,
            (screen.y - self.translate_y) / self.scale,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    /// Reserved for selection, never pans
    Primary,
    Middle,
    Secondary,
}

/// Input the controller reacts to. Positions are relative to the render surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportEvent {
    Wheel { delta_y: f64, cursor: Point },
    PointerDown { button: PointerButton, position: Point },
    PointerMove { position: Point },
    PointerUp,
    PointerLeave,
    ZoomIn,
    ZoomOut,
    Reset,
    Fit { bounds: Rect, surface: Size },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    pointer: Point,
    translate_x: f64,
    translate_y: f64,
}

/// Owns the viewport state of a single surface; all updates go through here.
#[derive(Debug, Clone)]
pub struct ViewportController {
    settings: ViewportSettings,
    state: ViewportState,
    drag: Option<Drag>,
}

impl Default for ViewportController {
    fn default() -> Self {
        Self {
            settings: ViewportSettings::default(),
            state: ViewportState::default(),
            drag: None,
        }
    }
}

impl ViewportController {
    pub fn new(settings: ViewportSettings) -> DomainResult<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            ..Default::default()
        })
    }

    pub fn state(&self) -> ViewportState {
        self.state
    }

    pub fn settings(&self) -> &ViewportSettings {
        &self.settings
    }

    pub fn is_panning(&self) -> bool {
        self.drag.is_some()
    }

    /// Single entry point for input; returns the state after the event.
    #[instrument(level = "trace", skip(self))]
    pub fn handle(&mut self, event: ViewportEvent) -> ViewportState {
        match event {
            ViewportEvent::Wheel { delta_y, cursor } => {
                if delta_y < 0.0 {
                    self.zoom(1.0, cursor);
                } else if delta_y > 0.0 {
                    self.zoom(-1.0, cursor);
                }
            }
            ViewportEvent::PointerDown { button, position } => self.begin_pan(button, position),
            ViewportEvent::PointerMove { position } => self.pan_to(position),
            ViewportEvent::PointerUp | ViewportEvent::PointerLeave => self.end_pan(),
            ViewportEvent::ZoomIn => self.zoom(1.0, Point::default()),
            ViewportEvent::ZoomOut => self.zoom(-1.0, Point::default()),
            ViewportEvent::Reset => self.reset(),
            ViewportEvent::Fit { bounds, surface } => self.fit_to_bounds(bounds, surface),
        }
        self.state
    }

    /// Step the scale by `direction * zoom_step`, keeping the content point under
    /// `cursor` at the same screen position.
    pub fn zoom(&mut self, direction: f64, cursor: Point) {
        let old = self.state.scale;
        let new = (old + direction.signum() * self.settings.zoom_step)
            .clamp(self.settings.min_scale, self.settings.max_scale);
        if new == old {
            return;
        }
        let ratio = new / old;
        self.state = ViewportState {
            scale: new,
            translate_x: cursor.x - ratio * (cursor.x - self.state.translate_x),
            translate_y: cursor.y - ratio * (cursor.y - self.state.translate_y),
        };
        trace!("zoom: scale {} -> {}", old, new);
    }

    pub fn begin_pan(&mut self, button: PointerButton, position: Point) {
        if button == PointerButton::Primary || self.drag.is_some() {
            return;
        }
        self.drag = Some(Drag {
            pointer: position,
            translate_x: self.state.translate_x,
            translate_y: self.state.translate_y,
        });
    }

    pub fn pan_to(&mut self, position: Point) {
        if let Some(drag) = self.drag {
            self.state.translate_x = drag.translate_x + (position.x - drag.pointer.x);
            self.state.translate_y = drag.translate_y + (position.y - drag.pointer.y);
        }
    }

    pub fn end_pan(&mut self) {
        self.drag = None;
    }

    pub fn reset(&mut self) {
        self.state = ViewportState::default();
        self.drag = None;
    }

    /// Fit `bounds` into `surface` minus padding, centered, never above max scale.
    ///
    /// A zero-size box axis does not constrain the scale. Without a positive padded
    /// area the state is left untouched.
    #[instrument(level = "debug", skip(self))]
    pub fn fit_to_bounds(&mut self, bounds: Rect, surface: Size) {
        let padding = self.settings.fit_padding;
        let available_w = surface.width - 2.0 * padding;
        let available_h = surface.height - 2.0 * padding;
        if available_w <= 0.0 || available_h <= 0.0 {
            debug!("surface too small to fit bounds, keeping viewport");
            return;
        }

        let axis_scale = |available: f64, extent: f64| {
            if extent > 0.0 {
                available / extent
            } else {
                f64::INFINITY
            }
        };
        let scale = axis_scale(available_w, bounds.width)
            .min(axis_scale(available_h, bounds.height))
            .min(self.settings.max_scale);

        self.state = ViewportState {
            scale,
            translate_x: padding - bounds.x * scale + (available_w - bounds.width * scale) / 2.0,
            translate_y: padding - bounds.y * scale + (available_h - bounds.height * scale) / 2.0,
        };
        self.drag = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const EPS: f64 = 1e-9;

    #[test]
    fn given_initial_state_when_wheel_zooming_in_then_cursor_point_stays_fixed() {
        // Arrange
        let mut vc = ViewportController::default();
        let cursor = Point::new(100.0, 100.0);
        let content_before = vc.state().to_content(cursor);

        // Act
        let state = vc.handle(ViewportEvent::Wheel {
            delta_y: -120.0,
            cursor,
        });

        // Assert
        assert!((state.scale - 1.1).abs() < EPS);
        assert!((state.translate_x + 10.0).abs() < EPS);
        let screen_after = state.to_screen(content_before);
        assert!((screen_after.x - cursor.x).abs() < EPS);
        assert!((screen_after.y - cursor.y).abs() < EPS);
    }

    #[rstest]
    #[case::clamped_high(-1.0, 20, 1.5)]
    #[case::clamped_low(1.0, 20, 0.5)]
    fn given_repeated_wheel_when_zooming_then_scale_is_clamped(
        #[case] delta_y: f64,
        #[case] times: usize,
        #[case] expected: f64,
    ) {
        let mut vc = ViewportController::default();

        for _ in 0..times {
            vc.handle(ViewportEvent::Wheel {
                delta_y,
                cursor: Point::new(10.0, 10.0),
            });
        }

        assert!((vc.state().scale - expected).abs() < EPS);
    }

    #[test]
    fn given_zero_delta_when_wheeling_then_nothing_changes() {
        let mut vc = ViewportController::default();

        let state = vc.handle(ViewportEvent::Wheel {
            delta_y: 0.0,
            cursor: Point::new(5.0, 5.0),
        });

        assert_eq!(state, ViewportState::default());
    }

    #[test]
    fn given_middle_button_drag_when_moving_then_translates_by_pointer_delta() {
        let mut vc = ViewportController::default();

        vc.handle(ViewportEvent::PointerDown {
            button: PointerButton::Middle,
            position: Point::new(10.0, 10.0),
        });
        vc.handle(ViewportEvent::PointerMove {
            position: Point::new(40.0, 0.0),
        });
        vc.handle(ViewportEvent::PointerUp);
        let state = vc.handle(ViewportEvent::PointerMove {
            position: Point::new(500.0, 500.0),
        });

        assert_eq!((state.translate_x, state.translate_y), (30.0, -10.0));
        assert!(!vc.is_panning());
    }

    #[test]
    fn given_primary_button_when_dragging_then_does_not_pan() {
        let mut vc = ViewportController::default();

        vc.handle(ViewportEvent::PointerDown {
            button: PointerButton::Primary,
            position: Point::new(0.0, 0.0),
        });
        let state = vc.handle(ViewportEvent::PointerMove {
            position: Point::new(50.0, 50.0),
        });

        assert_eq!(state, ViewportState::default());
    }

    #[test]
    fn given_active_drag_when_second_button_pressed_then_keeps_first_drag() {
        let mut vc = ViewportController::default();

        vc.begin_pan(PointerButton::Secondary, Point::new(0.0, 0.0));
        vc.begin_pan(PointerButton::Middle, Point::new(100.0, 100.0));
        vc.pan_to(Point::new(10.0, 10.0));

        assert_eq!(vc.state().translate_x, 10.0);
    }

    #[test]
    fn given_large_box_when_fitting_into_small_surface_then_scales_and_centers() {
        let mut vc = ViewportController::default();

        let state = vc.handle(ViewportEvent::Fit {
            bounds: Rect::new(0.0, 0.0, 1000.0, 800.0),
            surface: Size::new(500.0, 500.0),
        });

        assert!((state.scale - 0.4).abs() < EPS);
        assert!((state.translate_x - 50.0).abs() < EPS);
        assert!((state.translate_y - 90.0).abs() < EPS);
    }

    #[test]
    fn given_tiny_box_when_fitting_then_caps_at_max_scale() {
        let mut vc = ViewportController::default();

        vc.fit_to_bounds(Rect::new(10.0, 10.0, 10.0, 0.0), Size::new(1000.0, 1000.0));

        assert_eq!(vc.state().scale, 1.5);
    }

    #[test]
    fn given_surface_smaller_than_padding_when_fitting_then_keeps_state() {
        let mut vc = ViewportController::default();

        vc.fit_to_bounds(Rect::new(0.0, 0.0, 10.0, 10.0), Size::new(80.0, 500.0));

        assert_eq!(vc.state(), ViewportState::default());
    }

    #[test]
    fn given_zoomed_and_panned_when_resetting_then_returns_to_identity() {
        let mut vc = ViewportController::default();
        vc.handle(ViewportEvent::ZoomIn);
        vc.begin_pan(PointerButton::Middle, Point::new(0.0, 0.0));
        vc.pan_to(Point::new(3.0, 4.0));

        let state = vc.handle(ViewportEvent::Reset);

        assert_eq!(state, ViewportState::default());
        assert!(!vc.is_panning());
    }

    #[test]
    fn given_min_above_max_when_creating_controller_then_rejects_settings() {
        let settings = ViewportSettings {
            min_scale: 2.0,
            ..Default::default()
        };

        assert!(ViewportController::new(settings).is_err());
    }
}
