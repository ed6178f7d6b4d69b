//! Direct gestures, taps and clicks through the engine facade.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{engine, screen_gesture, MockDriver, WINDOW};

use swipehound_core::direction::Direction;
use swipehound_core::driver::DriverError;
use swipehound_core::element::{ElementHandle, Locator, Point, Rect};
use swipehound_core::engine::LONG_PRESS_DURATION;
use swipehound_core::error::EngineError;
use swipehound_core::gesture::{DEFAULT_SWIPE_DURATION, STABLE_SWIPE_DURATION};
use swipehound_core::resolver::SwipeArea;

fn carousel() -> Locator {
    Locator::id("com.example:id/carousel")
}

fn button() -> Locator {
    Locator::accessibility_id("submit")
}

const CAROUSEL_RECT: Rect = Rect::new(100, 300, 800, 200);
const BUTTON_RECT: Rect = Rect::new(40, 1600, 200, 100);

// ---------------------------------------------------------------------------
// Swipes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_single_swipe_uses_stable_duration() {
    let mock = Arc::new(MockDriver::new());
    let engine = engine(&mock);

    engine.swipe(Direction::Up).await.unwrap();

    let gestures = mock.gestures();
    assert_eq!(gestures, vec![screen_gesture(Direction::Up, STABLE_SWIPE_DURATION)]);
    assert_eq!(gestures[0].start(), Point::new(WINDOW.width / 2, WINDOW.height / 2));
}

#[tokio::test]
async fn test_single_swipe_rejects_compound_direction() {
    let mock = Arc::new(MockDriver::new());
    let engine = engine(&mock);

    let err = engine.swipe(Direction::Horizontal).await.unwrap_err();
    assert_eq!(err, EngineError::UnsupportedDirection { direction: Direction::Horizontal, area: SwipeArea::Screen });
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn test_swipe_times_repeats_and_propagates_failures() {
    let mock = Arc::new(MockDriver::new());
    let engine = engine(&mock);

    engine
        .swipe_times(Direction::Down, 3, Duration::from_millis(800))
        .await
        .unwrap();
    assert_eq!(mock.gestures(), vec![screen_gesture(Direction::Down, Duration::from_millis(800)); 3]);

    let failing = Arc::new(MockDriver::new().with_failing_gestures(1));
    let err = common::engine(&failing)
        .swipe_times(Direction::Down, 3, Duration::from_millis(800))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Driver(DriverError::CommandFailed(_))));
    assert_eq!(failing.gestures().len(), 1);
}

#[tokio::test]
async fn test_coordinate_swipe_defaults_to_one_second() {
    let mock = Arc::new(MockDriver::new());
    let engine = engine(&mock);

    engine
        .swipe_coords(Point::new(10, 20), Point::new(300, 400), None)
        .await
        .unwrap();
    engine
        .swipe_coords(Point::new(10, 20), Point::new(300, 400), Some(Duration::from_millis(250)))
        .await
        .unwrap();

    let gestures = mock.gestures();
    assert_eq!(gestures[0].duration(), DEFAULT_SWIPE_DURATION);
    assert_eq!(gestures[0].end(), Point::new(300, 400));
    assert_eq!(gestures[1].duration_ms(), 250);
}

#[tokio::test]
async fn test_swipe_inside_container_uses_container_rect() {
    let mock = Arc::new(MockDriver::new().with_element(carousel(), "carousel", CAROUSEL_RECT));
    let engine = engine(&mock);

    engine.swipe_inside_container(carousel(), Direction::Left).await.unwrap();

    let gestures = mock.gestures();
    assert_eq!(gestures.len(), 1);
    assert_eq!(gestures[0].start(), Point::new(820, 400));
    assert_eq!(gestures[0].end(), Point::new(180, 400));
    assert_eq!(gestures[0].duration(), STABLE_SWIPE_DURATION);
}

#[tokio::test]
async fn test_swipe_inside_missing_container_fails() {
    let mock = Arc::new(MockDriver::new());
    let engine = engine(&mock);

    let err = engine
        .swipe_inside_container(carousel(), Direction::Right)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ElementNotFound(carousel()));
}

#[tokio::test]
async fn test_repeated_container_swipes_skip_failures() {
    let mock = Arc::new(
        MockDriver::new()
            .with_element(carousel(), "carousel", CAROUSEL_RECT)
            .with_failing_gestures(2),
    );
    let engine = engine(&mock);

    engine
        .swipe_in_container(carousel(), Direction::Right, 3, STABLE_SWIPE_DURATION)
        .await
        .unwrap();

    assert_eq!(mock.gestures().len(), 3);
}

#[tokio::test]
async fn test_container_swipes_decline_vertical_and_compound() {
    let mock = Arc::new(MockDriver::new().with_element(carousel(), "carousel", CAROUSEL_RECT));
    let engine = engine(&mock);

    for direction in [Direction::Down, Direction::Horizontal] {
        let err = engine
            .swipe_in_container(carousel(), direction, 2, STABLE_SWIPE_DURATION)
            .await
            .unwrap_err();
        assert!(err.is_invalid_request(), "{direction}");
    }
    assert_eq!(mock.calls(), 0);
}

// ---------------------------------------------------------------------------
// Taps, presses and clicks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_tap_element_hits_center() {
    let mock = Arc::new(MockDriver::new().with_element(button(), "submit", BUTTON_RECT));
    let engine = engine(&mock);

    engine.tap_element(button()).await.unwrap();

    let gestures = mock.gestures();
    assert_eq!(gestures.len(), 1);
    assert!(gestures[0].is_stationary());
    assert_eq!(gestures[0].start(), Point::new(140, 1650));
    assert_eq!(gestures[0].duration(), Duration::ZERO);
}

#[tokio::test]
async fn test_tap_times_taps_repeatedly() {
    let mock = Arc::new(MockDriver::new());
    let engine = engine(&mock);

    engine.tap_times(Point::new(5, 5), 3).await.unwrap();
    engine.tap(Point::new(7, 7)).await.unwrap();

    let gestures = mock.gestures();
    assert_eq!(gestures.len(), 4);
    assert!(gestures.iter().all(|g| g.is_stationary()));
    assert_eq!(gestures[3].start(), Point::new(7, 7));
}

#[tokio::test]
async fn test_long_press_holds_center() {
    let mock = Arc::new(MockDriver::new().with_element(button(), "submit", BUTTON_RECT));
    let engine = engine(&mock);

    assert!(engine.long_press(button()).await);

    let gestures = mock.gestures();
    assert_eq!(gestures.len(), 1);
    assert!(gestures[0].is_stationary());
    assert_eq!(gestures[0].duration(), LONG_PRESS_DURATION);
}

#[tokio::test]
async fn test_long_press_on_missing_element_reports_false() {
    let mock = Arc::new(MockDriver::new());
    let engine = engine(&mock);

    assert!(!engine.long_press(button()).await);
    assert!(mock.gestures().is_empty());
}

#[tokio::test]
async fn test_hide_keyboard_ignores_unsupported_backend() {
    let mock = Arc::new(MockDriver::new());
    let engine = engine(&mock);

    engine.hide_keyboard().await;
}

#[tokio::test]
async fn test_click_resolves_locators_and_handles() {
    let mock = Arc::new(MockDriver::new().with_element(button(), "submit", BUTTON_RECT));
    let engine = engine(&mock);

    engine.click(button()).await.unwrap();
    engine.click(ElementHandle::new("raw-handle")).await.unwrap();

    assert_eq!(
        mock.clicks(),
        vec![ElementHandle::new("submit"), ElementHandle::new("raw-handle")]
    );

    let err = engine.click(Locator::id("missing")).await.unwrap_err();
    assert_eq!(err, EngineError::ElementNotFound(Locator::id("missing")));
}
