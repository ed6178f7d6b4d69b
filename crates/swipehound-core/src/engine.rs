//! The engine facade.
//!
//! [`GestureEngine`] bundles a driver session with the configured timeouts and
//! exposes every gesture, search and wait operation as an `async fn`. Page
//! objects hold it by reference (or behind an `Arc`) instead of inheriting
//! helpers from a shared base.
//!
//! Build one engine per session and clone it where more handles are needed.
//! Clones share the lock that serializes implicit-wait overrides; separate
//! engines on one session do not.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use swipehound_core::driver::MobileDriver;
//! use swipehound_core::config::EngineConfig;
//! use swipehound_core::direction::Direction;
//! use swipehound_core::element::Locator;
//! use swipehound_core::engine::GestureEngine;
//!
//! # async fn demo(driver: Arc<dyn MobileDriver>) -> Result<(), swipehound_core::error::EngineError> {
//! let engine = GestureEngine::new(driver, EngineConfig::load());
//! let row = Locator::accessibility_id("settings-row");
//! if engine.swipe_until_visible(row.clone(), Direction::VerticalDownFirst).await? {
//!     engine.click(row).await?;
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

use crate::config::EngineConfig;
use crate::direction::Direction;
use crate::driver::{bounded, MobileDriver};
use crate::element::{ElementHandle, Locator, Point, Target};
use crate::error::EngineError;
use crate::gesture::{GestureExecutor, DEFAULT_SWIPE_DURATION, SEEK_SWIPE_DURATION, STABLE_SWIPE_DURATION};
use crate::implicit_wait::{with_implicit_wait, OverrideLock};
use crate::probe::PresenceProbe;
use crate::resolver::resolve;
use crate::search::{
    element_rect, find_handle, ErrorPolicy, RetryLoop, SearchOptions, SearchReport, SwipeRegion, SwipeUntilPresent,
    INITIAL_PROBE_TIMEOUT,
};
use crate::wait::{Disappearance, Disappeared, PollingWait, Settled, WaitOutcome, SETTLE_INTERVAL, SETTLE_TIMEOUT};

/// Default timeout of [`GestureEngine::swipe_to_element`].
pub const SWIPE_TO_ELEMENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default poll interval of [`GestureEngine::swipe_to_element`].
pub const SWIPE_TO_ELEMENT_INTERVAL: Duration = Duration::from_millis(2500);

/// Implicit wait applied while waiting for an element to disappear.
pub const DISAPPEARANCE_IMPLICIT_WAIT: Duration = Duration::from_secs(1);

/// Default poll interval of disappearance waits.
pub const DISAPPEARANCE_INTERVAL: Duration = Duration::from_millis(500);

/// Hold time of [`GestureEngine::long_press`].
pub const LONG_PRESS_DURATION: Duration = Duration::from_secs(1);

/// Attempt budget of the deprecated [`GestureEngine::scroll_to`].
const SCROLL_TO_ATTEMPTS: u32 = 10;

/// Gesture, search and wait operations over one driver session.
#[derive(Clone)]
pub struct GestureEngine {
    driver: Arc<dyn MobileDriver>,
    config: EngineConfig,
    overrides: OverrideLock,
    executor: GestureExecutor,
    probe: PresenceProbe,
    search: RetryLoop,
    cancel: Option<CancellationToken>,
}

impl GestureEngine {
    pub fn new(driver: Arc<dyn MobileDriver>, config: EngineConfig) -> Self {
        let call_timeout = config.call_timeout();
        let executor = GestureExecutor::new(driver.clone(), call_timeout);
        let overrides = OverrideLock::default();
        let probe = PresenceProbe::new(driver.clone(), overrides.clone(), config.implicit_timeout(), call_timeout);
        let search = RetryLoop::new(driver.clone(), executor.clone(), probe.clone(), call_timeout);
        Self { driver, config, overrides, executor, probe, search, cancel: None }
    }

    /// Lets `token` stop searches and waits between iterations.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn driver(&self) -> &Arc<dyn MobileDriver> {
        &self.driver
    }

    pub fn executor(&self) -> &GestureExecutor {
        &self.executor
    }

    pub fn probe(&self) -> &PresenceProbe {
        &self.probe
    }

    fn call_timeout(&self) -> Duration {
        self.config.call_timeout()
    }

    fn polling(&self, timeout: Duration, interval: Duration) -> PollingWait {
        let wait = PollingWait::new(timeout, interval);
        match &self.cancel {
            Some(token) => wait.with_cancellation(token.clone()),
            None => wait,
        }
    }

    // -- Presence --------------------------------------------------------

    /// Returns true if `target` is present within `timeout`. Never errors.
    pub async fn is_present(&self, target: impl Into<Target>, timeout: Duration) -> bool {
        self.probe.is_present(&target.into(), timeout).await
    }

    /// Resolves `target` to a handle.
    pub async fn element(&self, target: impl Into<Target>) -> Result<ElementHandle, EngineError> {
        find_handle(self.driver.as_ref(), &target.into(), self.call_timeout()).await
    }

    // -- Searches --------------------------------------------------------

    /// Runs one swipe search with explicit options.
    ///
    /// The engine's cancellation token applies unless `options` carries its
    /// own.
    pub async fn search(
        &self,
        target: &Target,
        region: &SwipeRegion,
        mut options: SearchOptions,
    ) -> Result<SearchReport, EngineError> {
        if options.cancel.is_none() {
            options.cancel = self.cancel.clone();
        }
        self.search.run(target, region, &options).await
    }

    /// Swipes the full screen until `target` is present, using the configured
    /// attempt budget per phase.
    pub async fn swipe_until_visible(&self, target: impl Into<Target>, direction: Direction) -> Result<bool, EngineError> {
        let options = SearchOptions::new(direction, self.config.swipe_attempts);
        let report = self.search(&target.into(), &SwipeRegion::Screen, options).await?;
        Ok(report.found())
    }

    /// Swipes inside `container` until `target` is present.
    ///
    /// Only horizontal directions are accepted.
    pub async fn swipe_until_visible_in_container(
        &self,
        target: impl Into<Target>,
        container: impl Into<Target>,
        direction: Direction,
    ) -> Result<bool, EngineError> {
        let region = SwipeRegion::Container(container.into());
        let options = SearchOptions::new(direction, self.config.swipe_attempts);
        let report = self.search(&target.into(), &region, options).await?;
        Ok(report.found())
    }

    /// Down-then-up full-screen search with 20 attempts per phase and quick
    /// swipes.
    pub async fn swipe_until_element_presence(&self, target: impl Into<Target>) -> Result<bool, EngineError> {
        let options = SearchOptions::new(Direction::VerticalDownFirst, 20).with_gesture_duration(SEEK_SWIPE_DURATION);
        let report = self.search(&target.into(), &SwipeRegion::Screen, options).await?;
        Ok(report.found())
    }

    /// Down-then-up full-screen search with 10 slow swipes per phase.
    ///
    /// Driver errors end the search and report the target as found.
    #[deprecated(note = "reports driver errors as found; use `swipe_until_visible`")]
    pub async fn scroll_to(&self, target: impl Into<Target>) -> bool {
        let options = SearchOptions::new(Direction::VerticalDownFirst, SCROLL_TO_ATTEMPTS)
            .with_gesture_duration(STABLE_SWIPE_DURATION)
            .with_error_policy(ErrorPolicy::LegacyLenient);
        match self.search(&target.into(), &SwipeRegion::Screen, options).await {
            Ok(report) => report.found(),
            Err(e) => {
                warn!(error = %e, "scroll_to declined");
                false
            }
        }
    }

    /// Container search with an explicit attempt budget.
    ///
    /// Driver errors end the search and report the target as found.
    #[deprecated(note = "reports driver errors as found; use `swipe_until_visible_in_container`")]
    pub async fn swipe_in_container_to_element(
        &self,
        target: impl Into<Target>,
        container: impl Into<Target>,
        direction: Direction,
        duration: Duration,
        times: u32,
    ) -> Result<bool, EngineError> {
        let region = SwipeRegion::Container(container.into());
        let options = SearchOptions::new(direction, times)
            .with_gesture_duration(duration)
            .with_error_policy(ErrorPolicy::LegacyLenient);
        let report = self.search(&target.into(), &region, options).await?;
        Ok(report.found())
    }

    /// Swipes the full screen once per poll until `target` shows up or
    /// `timeout` passes.
    ///
    /// Unlike [`swipe_until_visible`](Self::swipe_until_visible) the budget
    /// is wall-clock time. Only primitive directions are accepted.
    pub async fn swipe_to_element(
        &self,
        target: impl Into<Target>,
        direction: Direction,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<bool, EngineError> {
        self.swipe_to(target.into(), SwipeRegion::Screen, direction, timeout, poll_interval)
            .await
    }

    /// Container counterpart of [`swipe_to_element`](Self::swipe_to_element).
    pub async fn swipe_to_element_in_container(
        &self,
        target: impl Into<Target>,
        container: impl Into<Target>,
        direction: Direction,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<bool, EngineError> {
        let region = SwipeRegion::Container(container.into());
        self.swipe_to(target.into(), region, direction, timeout, poll_interval)
            .await
    }

    async fn swipe_to(
        &self,
        target: Target,
        region: SwipeRegion,
        direction: Direction,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<bool, EngineError> {
        let area = region.area();
        let primitive = direction
            .as_primitive()
            .ok_or(EngineError::UnsupportedDirection { direction, area })?;
        area.check(direction)?;

        let span = info_span!("swipe_to_element", element = %target, direction = %direction, area = %area);
        async {
            if self.probe.is_present(&target, INITIAL_PROBE_TIMEOUT).await {
                info!("element already present");
                return Ok(true);
            }

            let mut condition = SwipeUntilPresent::new(&self.search, target, region, primitive, STABLE_SWIPE_DURATION);
            let outcome = self.polling(timeout, poll_interval).poll(&mut condition).await;
            info!(outcome = ?outcome, swipes = condition.swipes(), "swipe to element finished");
            Ok(outcome.is_satisfied())
        }
        .instrument(span)
        .await
    }

    // -- Direct gestures ---------------------------------------------------

    /// One full-screen swipe at the stable duration.
    pub async fn swipe(&self, direction: Direction) -> Result<(), EngineError> {
        self.swipe_times(direction, 1, STABLE_SWIPE_DURATION).await
    }

    /// `times` full-screen swipes. The first failure is returned.
    pub async fn swipe_times(&self, direction: Direction, times: u32, duration: Duration) -> Result<(), EngineError> {
        self.check_single(&SwipeRegion::Screen, direction)?;
        for i in 0..times {
            let bounds = SwipeRegion::Screen.bounds(self.driver.as_ref(), self.call_timeout()).await?;
            let gesture = resolve(direction, bounds, duration)?;
            self.executor.perform(&gesture).await?;
            info!(direction = %direction, swipe = i + 1, times, "swipe was executed");
        }
        Ok(())
    }

    /// Swipes between two coordinates. `duration` defaults to one second.
    pub async fn swipe_coords(&self, start: Point, end: Point, duration: Option<Duration>) -> Result<(), EngineError> {
        self.executor
            .swipe(start, end, duration.unwrap_or(DEFAULT_SWIPE_DURATION))
            .await?;
        Ok(())
    }

    /// One container swipe at the stable duration.
    pub async fn swipe_inside_container(&self, container: impl Into<Target>, direction: Direction) -> Result<(), EngineError> {
        let region = SwipeRegion::Container(container.into());
        self.check_single(&region, direction)?;
        let bounds = region.bounds(self.driver.as_ref(), self.call_timeout()).await?;
        let gesture = resolve(direction, bounds, STABLE_SWIPE_DURATION)?;
        self.executor.perform(&gesture).await?;
        Ok(())
    }

    /// `times` container swipes. Individual failures are logged and skipped.
    pub async fn swipe_in_container(
        &self,
        container: impl Into<Target>,
        direction: Direction,
        times: u32,
        duration: Duration,
    ) -> Result<(), EngineError> {
        let region = SwipeRegion::Container(container.into());
        self.check_single(&region, direction)?;

        for i in 0..times {
            let swiped = match region.bounds(self.driver.as_ref(), self.call_timeout()).await {
                Ok(bounds) => {
                    let gesture = resolve(direction, bounds, duration)?;
                    self.executor.perform(&gesture).await.map_err(EngineError::from)
                }
                Err(e) => Err(e),
            };
            match swiped {
                Ok(()) => info!(direction = %direction, swipe = i + 1, times, "swipe was executed"),
                Err(e) => warn!(error = %e, direction = %direction, swipe = i + 1, "container swipe failed, continuing"),
            }
        }
        Ok(())
    }

    fn check_single(&self, region: &SwipeRegion, direction: Direction) -> Result<(), EngineError> {
        let area = region.area();
        if direction.is_compound() {
            return Err(EngineError::UnsupportedDirection { direction, area });
        }
        area.check(direction)
    }

    // -- Taps and keyboard -------------------------------------------------

    pub async fn tap(&self, point: Point) -> Result<(), EngineError> {
        self.executor.tap(point).await?;
        Ok(())
    }

    /// Taps the same point `times` times.
    pub async fn tap_times(&self, point: Point, times: u32) -> Result<(), EngineError> {
        for i in 0..times {
            info!(tap = i + 1, x = point.x, y = point.y, "tap");
            self.executor.tap(point).await?;
        }
        Ok(())
    }

    /// Taps the center of `target`.
    pub async fn tap_element(&self, target: impl Into<Target>) -> Result<(), EngineError> {
        let rect = element_rect(self.driver.as_ref(), &target.into(), self.call_timeout()).await?;
        self.executor.tap(rect.center()).await?;
        Ok(())
    }

    /// Presses and holds the center of `target`. Failures are logged and
    /// reported as `false`.
    pub async fn long_press(&self, target: impl Into<Target>) -> bool {
        let target = target.into();
        let pressed = async {
            let rect = element_rect(self.driver.as_ref(), &target, self.call_timeout()).await?;
            self.executor.long_press(rect.center(), LONG_PRESS_DURATION).await?;
            Ok::<_, EngineError>(())
        }
        .await;

        match pressed {
            Ok(()) => true,
            Err(e) => {
                info!(element = %target, error = %e, "long press failed");
                false
            }
        }
    }

    /// Hides the soft keyboard if the backend can. Never fails.
    pub async fn hide_keyboard(&self) {
        if let Err(e) = bounded(self.call_timeout(), self.driver.hide_keyboard()).await {
            info!(error = %e, "keyboard was already hidden or could not be hidden");
        }
    }

    /// Clicks `target`.
    pub async fn click(&self, target: impl Into<Target>) -> Result<(), EngineError> {
        let handle = self.element(target).await?;
        bounded(self.call_timeout(), self.driver.click(&handle)).await?;
        Ok(())
    }

    // -- Waits -----------------------------------------------------------

    /// Waits up to the configured explicit timeout for `locator` to match
    /// nothing.
    pub async fn wait_until_gone(&self, locator: &Locator) -> Disappearance {
        self.wait_until_gone_within(locator, self.config.explicit_timeout(), DISAPPEARANCE_INTERVAL)
            .await
    }

    /// Waits up to `timeout` for `locator` to match nothing.
    ///
    /// The implicit wait is narrowed to one second for the duration of the
    /// wait. Running out of time yields [`Disappearance::StillPresent`].
    pub async fn wait_until_gone_within(&self, locator: &Locator, timeout: Duration, poll_interval: Duration) -> Disappearance {
        let span = info_span!("wait_until_gone", locator = %locator, timeout_ms = timeout.as_millis() as u64);
        async {
            let mut condition = Disappeared::new(self.driver.clone(), locator.clone(), self.call_timeout());
            let wait = self.polling(timeout, poll_interval);
            let outcome = with_implicit_wait(
                &self.driver,
                &self.overrides,
                DISAPPEARANCE_IMPLICIT_WAIT,
                self.config.implicit_timeout(),
                self.call_timeout(),
                wait.poll(&mut condition),
            )
            .await;

            if outcome == WaitOutcome::Satisfied {
                info!("element not present");
                Disappearance::Gone
            } else {
                info!(outcome = ?outcome, "element is still present");
                Disappearance::StillPresent
            }
        }
        .instrument(span)
        .await
    }

    /// Waits for `target` to stop moving, with the default 5 s / 500 ms
    /// cadence.
    pub async fn wait_until_settled(&self, target: impl Into<Target>) -> Result<bool, EngineError> {
        self.wait_until_settled_within(target, SETTLE_TIMEOUT, SETTLE_INTERVAL)
            .await
    }

    /// Waits for `target` to report the same location on two consecutive
    /// polls.
    pub async fn wait_until_settled_within(
        &self,
        target: impl Into<Target>,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<bool, EngineError> {
        let handle = self.element(target).await?;
        let mut condition = Settled::new(self.driver.clone(), handle, self.call_timeout());
        let settled = self.polling(timeout, poll_interval).until(&mut condition).await;
        info!(settled, position = ?condition.last_position(), "settle wait finished");
        Ok(settled)
    }
}
