//! Viewport controller driven by event sequences

use rstest::rstest;

use kinlayout::domain::{
    Point, PointerButton, Rect, Size, ViewportController, ViewportEvent, ViewportSettings,
    ViewportState,
};

const EPS: f64 = 1e-9;

#[rstest]
#[case(Point::new(100.0, 100.0))]
#[case(Point::new(0.0, 0.0))]
#[case(Point::new(731.5, 42.25))]
fn given_any_cursor_when_zooming_in_and_out_then_content_under_cursor_stays_put(
    #[case] cursor: Point,
) {
    // Arrange
    let mut vc = ViewportController::default();
    vc.handle(ViewportEvent::PointerDown {
        button: PointerButton::Secondary,
        position: Point::new(0.0, 0.0),
    });
    vc.handle(ViewportEvent::PointerMove {
        position: Point::new(-35.0, 12.0),
    });
    vc.handle(ViewportEvent::PointerLeave);
    let anchor = vc.state().to_content(cursor);

    // Act / Assert
    for delta_y in [-1.0, -1.0, 1.0, -1.0] {
        let state = vc.handle(ViewportEvent::Wheel { delta_y, cursor });
        let screen = state.to_screen(anchor);
        assert!((screen.x - cursor.x).abs() < EPS, "{state:?}");
        assert!((screen.y - cursor.y).abs() < EPS, "{state:?}");
    }
}

#[test]
fn given_fit_scenario_when_fitting_then_box_is_centered_in_padded_surface() {
    let mut vc = ViewportController::new(ViewportSettings::default()).unwrap();
    let bounds = Rect::new(0.0, 0.0, 1000.0, 800.0);

    let state = vc.handle(ViewportEvent::Fit {
        bounds,
        surface: Size::new(500.0, 500.0),
    });

    let top_left = state.to_screen(Point::new(bounds.x, bounds.y));
    let bottom_right = state.to_screen(Point::new(bounds.right(), bounds.bottom()));
    assert!((state.scale - 0.4).abs() < EPS);
    assert!((top_left.x - 50.0).abs() < EPS);
    assert!((bottom_right.x - 450.0).abs() < EPS);
    // vertical slack is split evenly
    assert!((top_left.y - (500.0 - bottom_right.y)).abs() < EPS);
}

#[test]
fn given_zoom_buttons_when_pressed_then_step_scale_and_reset_restores() {
    let mut vc = ViewportController::default();

    vc.handle(ViewportEvent::ZoomOut);
    let zoomed = vc.handle(ViewportEvent::ZoomOut);
    let reset = vc.handle(ViewportEvent::Reset);

    assert!((zoomed.scale - 0.8).abs() < EPS);
    assert_eq!(reset, ViewportState::default());
}
