//! Shared test helpers for swipehound-core integration tests.
//!
//! [`MockDriver`] is an in-memory [`MobileDriver`] whose elements appear after
//! a number of gestures, vanish after a number of lookups, or move along a
//! scripted path. Every call is recorded so tests can assert on exactly what
//! the engine sent.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use swipehound_core::config::EngineConfig;
use swipehound_core::direction::Direction;
use swipehound_core::driver::{DriverError, MobileDriver};
use swipehound_core::element::{ElementHandle, Locator, Point, Rect, Size};
use swipehound_core::engine::GestureEngine;
use swipehound_core::gesture::GestureSpec;
use swipehound_core::resolver::{resolve, SwipeBounds};

/// Window size used unless a test overrides it.
pub const WINDOW: Size = Size::new(1080, 1920);

/// The implicit wait a fresh mock session reports.
pub const SESSION_IMPLICIT_WAIT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Scripted elements
// ---------------------------------------------------------------------------

struct ScriptedElement {
    handle: ElementHandle,
    /// Matches only once this many gestures succeeded. `None` means always.
    appear_after_gestures: Option<usize>,
    /// Stops matching after this many lookups. `None` means never.
    vanish_after_finds: Option<usize>,
    finds: usize,
}

#[derive(Default)]
struct MockState {
    window: Option<Size>,
    elements: HashMap<Locator, ScriptedElement>,
    rects: HashMap<ElementHandle, Rect>,
    paths: HashMap<ElementHandle, VecDeque<Point>>,

    implicit_wait: Duration,
    implicit_sets: Vec<Duration>,
    fail_implicit_read: bool,

    fail_window: bool,
    fail_finds: bool,
    find_delay: Option<Duration>,
    failing_gestures: usize,

    gestures: Vec<GestureSpec>,
    successful_gestures: usize,
    clicks: Vec<ElementHandle>,
    window_queries: usize,
    calls: usize,
}

// ---------------------------------------------------------------------------
// MockDriver
// ---------------------------------------------------------------------------

/// A scriptable in-memory driver session.
pub struct MockDriver {
    state: Mutex<MockState>,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDriver {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                window: Some(WINDOW),
                implicit_wait: SESSION_IMPLICIT_WAIT,
                ..MockState::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    fn script(self, locator: Locator, id: &str, appear: Option<usize>, vanish: Option<usize>) -> Self {
        self.lock().elements.insert(
            locator,
            ScriptedElement {
                handle: ElementHandle::new(id),
                appear_after_gestures: appear,
                vanish_after_finds: vanish,
                finds: 0,
            },
        );
        self
    }

    // -- Builders ------------------------------------------------------------

    /// An element that is always present, with the given rectangle.
    pub fn with_element(self, locator: Locator, id: &str, rect: Rect) -> Self {
        self.lock().rects.insert(ElementHandle::new(id), rect);
        self.script(locator, id, None, None)
    }

    /// An element that appears once `gestures` gestures have succeeded.
    pub fn with_target_after(self, locator: Locator, gestures: usize) -> Self {
        self.script(locator, "target", Some(gestures), None)
    }

    /// An element that never appears, however much the engine swipes.
    pub fn with_absent_target(self, locator: Locator) -> Self {
        self.script(locator, "target", Some(usize::MAX), None)
    }

    /// An element present for the first `finds` lookups, then gone.
    pub fn with_vanishing(self, locator: Locator, finds: usize) -> Self {
        self.script(locator, "vanishing", None, Some(finds))
    }

    /// Locations reported for `id`, one per query. The last one repeats.
    pub fn with_path(self, id: &str, path: Vec<Point>) -> Self {
        self.lock().paths.insert(ElementHandle::new(id), path.into());
        self
    }

    pub fn with_implicit_wait(self, wait: Duration) -> Self {
        self.lock().implicit_wait = wait;
        self
    }

    /// The first `n` gestures fail with a command error.
    pub fn with_failing_gestures(self, n: usize) -> Self {
        self.lock().failing_gestures = n;
        self
    }

    pub fn with_failing_window(self) -> Self {
        self.lock().fail_window = true;
        self
    }

    pub fn with_failing_finds(self) -> Self {
        self.lock().fail_finds = true;
        self
    }

    pub fn with_failing_implicit_read(self) -> Self {
        self.lock().fail_implicit_read = true;
        self
    }

    /// Every lookup takes `delay` before answering.
    pub fn with_find_delay(self, delay: Duration) -> Self {
        self.lock().find_delay = Some(delay);
        self
    }

    // -- Inspection ------------------------------------------------------------

    pub fn gestures(&self) -> Vec<GestureSpec> {
        self.lock().gestures.clone()
    }

    pub fn clicks(&self) -> Vec<ElementHandle> {
        self.lock().clicks.clone()
    }

    pub fn implicit_sets(&self) -> Vec<Duration> {
        self.lock().implicit_sets.clone()
    }

    pub fn current_implicit_wait(&self) -> Duration {
        self.lock().implicit_wait
    }

    pub fn window_queries(&self) -> usize {
        self.lock().window_queries
    }

    /// Total number of remote calls received.
    pub fn calls(&self) -> usize {
        self.lock().calls
    }
}

#[async_trait]
impl MobileDriver for MockDriver {
    async fn window_size(&self) -> Result<Size, DriverError> {
        let mut state = self.lock();
        state.calls += 1;
        state.window_queries += 1;
        if state.fail_window {
            return Err(DriverError::ConnectionLost("window query dropped".to_string()));
        }
        state.window.ok_or(DriverError::NotConnected)
    }

    async fn find_elements(&self, locator: &Locator) -> Result<Vec<ElementHandle>, DriverError> {
        let delay = {
            let mut state = self.lock();
            state.calls += 1;
            state.find_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.lock();
        if state.fail_finds {
            return Err(DriverError::CommandFailed("lookup failed".to_string()));
        }
        let gestures = state.successful_gestures;
        let Some(element) = state.elements.get_mut(locator) else {
            return Ok(Vec::new());
        };
        element.finds += 1;
        let appeared = element.appear_after_gestures.map_or(true, |n| gestures >= n);
        let vanished = element.vanish_after_finds.is_some_and(|n| element.finds > n);
        if appeared && !vanished {
            Ok(vec![element.handle.clone()])
        } else {
            Ok(Vec::new())
        }
    }

    async fn element_location(&self, element: &ElementHandle) -> Result<Point, DriverError> {
        let mut state = self.lock();
        state.calls += 1;
        if let Some(path) = state.paths.get_mut(element) {
            let point = if path.len() > 1 { path.pop_front() } else { path.front().copied() };
            if let Some(point) = point {
                return Ok(point);
            }
        }
        state
            .rects
            .get(element)
            .map(|r| Point::new(r.x, r.y))
            .ok_or_else(|| DriverError::NoSuchElement(element.to_string()))
    }

    async fn element_size(&self, element: &ElementHandle) -> Result<Size, DriverError> {
        let mut state = self.lock();
        state.calls += 1;
        state
            .rects
            .get(element)
            .map(|r| Size::new(r.width, r.height))
            .ok_or_else(|| DriverError::NoSuchElement(element.to_string()))
    }

    async fn perform_gesture(&self, gesture: &GestureSpec) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.calls += 1;
        state.gestures.push(*gesture);
        if state.gestures.len() <= state.failing_gestures {
            return Err(DriverError::CommandFailed("gesture rejected".to_string()));
        }
        state.successful_gestures += 1;
        Ok(())
    }

    async fn implicit_wait(&self) -> Result<Duration, DriverError> {
        let mut state = self.lock();
        state.calls += 1;
        if state.fail_implicit_read {
            return Err(DriverError::CommandFailed("timeouts unavailable".to_string()));
        }
        Ok(state.implicit_wait)
    }

    async fn set_implicit_wait(&self, wait: Duration) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.calls += 1;
        state.implicit_sets.push(wait);
        state.implicit_wait = wait;
        Ok(())
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.calls += 1;
        state.clicks.push(element.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Engine fixtures
// ---------------------------------------------------------------------------

/// Builds an engine over `mock` with the default configuration.
pub fn engine(mock: &Arc<MockDriver>) -> GestureEngine {
    engine_with(mock, EngineConfig::default())
}

pub fn engine_with(mock: &Arc<MockDriver>, config: EngineConfig) -> GestureEngine {
    let driver: Arc<dyn MobileDriver> = mock.clone();
    GestureEngine::new(driver, config)
}

/// The full-screen gesture the engine should send for `direction`.
pub fn screen_gesture(direction: Direction, duration: Duration) -> GestureSpec {
    resolve(direction, SwipeBounds::Screen(Rect::from_size(WINDOW)), duration).unwrap()
}
