//! Swipe-until-visible search.
//!
//! [`RetryLoop`] is the engine's core: it alternates swipes and presence
//! probes until the target shows up or the attempt budget runs out.
//!
//! # Algorithm
//!
//! 1. Reject directions the swipe area cannot resolve (container + vertical)
//!    before any remote call.
//! 2. Probe once. If the target is already there, stop: no gesture is sent.
//! 3. For each phase of the direction (one for primitives, two for compound
//!    policies), with a fresh budget of `attempts` per phase:
//!    re-query the area bounds, resolve the gesture, perform it, re-probe.
//! 4. Stop with [`SearchOutcome::Found`] as soon as a probe succeeds, or with
//!    [`SearchOutcome::Exhausted`] once every phase is spent.
//!
//! The budget counts attempts, not time. A stalled gesture is bounded by the
//! executor's per-call timeout, but the loop as a whole has no deadline;
//! callers that need one cancel through [`SearchOptions::with_cancellation`]
//! (checked between attempts) or wrap the call in `tokio::time::timeout`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::direction::{Direction, PrimitiveDirection};
use crate::driver::{bounded, MobileDriver};
use crate::element::{ElementHandle, Rect, Target};
use crate::error::EngineError;
use crate::gesture::{GestureExecutor, SEEK_SWIPE_DURATION};
use crate::probe::PresenceProbe;
use crate::resolver::{resolve, SwipeArea, SwipeBounds};
use crate::wait::Condition;

/// Timeout of the probe issued before the first swipe.
pub const INITIAL_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Timeout of the probe issued after each swipe.
pub const ATTEMPT_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// What to swipe on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwipeRegion {
    /// The whole application window.
    Screen,
    /// A scrollable element; its rectangle is looked up before every swipe.
    Container(Target),
}

impl SwipeRegion {
    pub fn area(&self) -> SwipeArea {
        match self {
            SwipeRegion::Screen => SwipeArea::Screen,
            SwipeRegion::Container(_) => SwipeArea::Container,
        }
    }

    /// Queries the region's current rectangle.
    ///
    /// # Errors
    ///
    /// [`EngineError::ElementNotFound`] when a container locator matches
    /// nothing, [`EngineError::Driver`] for failed geometry queries.
    pub async fn bounds(&self, driver: &dyn MobileDriver, call_timeout: Duration) -> Result<SwipeBounds, EngineError> {
        match self {
            SwipeRegion::Screen => {
                let size = bounded(call_timeout, driver.window_size()).await?;
                Ok(SwipeBounds::Screen(Rect::from_size(size)))
            }
            SwipeRegion::Container(target) => {
                let rect = element_rect(driver, target, call_timeout).await?;
                Ok(SwipeBounds::Container(rect))
            }
        }
    }
}

/// Resolves `target` to a handle, taking the first match of a locator.
pub(crate) async fn find_handle(
    driver: &dyn MobileDriver,
    target: &Target,
    call_timeout: Duration,
) -> Result<ElementHandle, EngineError> {
    match target {
        Target::Element(handle) => Ok(handle.clone()),
        Target::Locator(locator) => bounded(call_timeout, driver.find_elements(locator))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::ElementNotFound(locator.clone())),
    }
}

/// Queries the current rectangle of `target`.
pub(crate) async fn element_rect(
    driver: &dyn MobileDriver,
    target: &Target,
    call_timeout: Duration,
) -> Result<Rect, EngineError> {
    let handle = find_handle(driver, target, call_timeout).await?;
    let origin = bounded(call_timeout, driver.element_location(&handle)).await?;
    let size = bounded(call_timeout, driver.element_size(&handle)).await?;
    Ok(Rect::from_origin_size(origin, size))
}

/// How a search treats unexpected driver errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Failed swipes and geometry queries use up an attempt; the search
    /// reports what it actually saw.
    #[default]
    Strict,
    /// Backward-compatible behavior of the old scroll-to helpers: a driver
    /// error aborts the search and reports the target as found.
    ///
    /// This is a false positive by construction. It exists only for callers
    /// that depended on it.
    LegacyLenient,
}

/// Parameters of one search.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub direction: Direction,
    /// Attempt budget per phase.
    pub attempts: u32,
    pub gesture_duration: Duration,
    pub initial_probe: Duration,
    pub probe_timeout: Duration,
    pub error_policy: ErrorPolicy,
    pub cancel: Option<CancellationToken>,
}

impl SearchOptions {
    /// Options with the seek swipe duration and one-second probes.
    pub fn new(direction: Direction, attempts: u32) -> Self {
        Self {
            direction,
            attempts,
            gesture_duration: SEEK_SWIPE_DURATION,
            initial_probe: INITIAL_PROBE_TIMEOUT,
            probe_timeout: ATTEMPT_PROBE_TIMEOUT,
            error_policy: ErrorPolicy::Strict,
            cancel: None,
        }
    }

    pub fn with_gesture_duration(mut self, duration: Duration) -> Self {
        self.gesture_duration = duration;
        self
    }

    pub fn with_probe_timeouts(mut self, initial: Duration, per_attempt: Duration) -> Self {
        self.initial_probe = initial;
        self.probe_timeout = per_attempt;
        self
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Lets the caller stop the search between attempts.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|t| t.is_cancelled())
    }
}

/// Final state of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchOutcome {
    Found,
    Exhausted,
    Cancelled,
}

/// Gestures sent during one phase of a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseReport {
    pub direction: PrimitiveDirection,
    /// Gestures handed to the driver, successful or not.
    pub gestures: u32,
    /// Attempts whose geometry query or gesture failed.
    pub failures: u32,
}

/// Record of one search, suitable for logging or persisting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchReport {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub target: String,
    pub direction: Direction,
    pub area: SwipeArea,
    pub outcome: SearchOutcome,
    pub phases: Vec<PhaseReport>,
    pub elapsed_ms: u64,
    /// Set when [`ErrorPolicy::LegacyLenient`] turned an error into "found".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lenient_error: Option<String>,
}

impl SearchReport {
    fn new(target: &Target, direction: Direction, area: SwipeArea) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            target: target.to_string(),
            direction,
            area,
            outcome: SearchOutcome::Exhausted,
            phases: Vec::new(),
            elapsed_ms: 0,
            lenient_error: None,
        }
    }

    pub fn found(&self) -> bool {
        self.outcome == SearchOutcome::Found
    }

    /// Total gestures across all phases.
    pub fn gestures(&self) -> u32 {
        self.phases.iter().map(|p| p.gestures).sum()
    }
}

enum PhaseEnd {
    Found,
    Exhausted,
    Cancelled,
}

/// Runs swipe-until-visible searches against one driver.
#[derive(Clone)]
pub struct RetryLoop {
    driver: Arc<dyn MobileDriver>,
    executor: GestureExecutor,
    probe: PresenceProbe,
    call_timeout: Duration,
}

impl RetryLoop {
    pub fn new(
        driver: Arc<dyn MobileDriver>,
        executor: GestureExecutor,
        probe: PresenceProbe,
        call_timeout: Duration,
    ) -> Self {
        Self { driver, executor, probe, call_timeout }
    }

    /// Swipes over `region` until `target` is present.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnsupportedDirection`] when `options.direction` has a
    /// phase the region cannot resolve. Driver failures never surface here:
    /// under [`ErrorPolicy::Strict`] they cost an attempt, under
    /// [`ErrorPolicy::LegacyLenient`] they end the search as found.
    pub async fn run(
        &self,
        target: &Target,
        region: &SwipeRegion,
        options: &SearchOptions,
    ) -> Result<SearchReport, EngineError> {
        region.area().check(options.direction)?;

        let mut report = SearchReport::new(target, options.direction, region.area());
        let span = info_span!(
            "swipe_search",
            search_id = %report.id,
            element = %target,
            direction = %options.direction,
            area = %region.area(),
        );

        async {
            let start = Instant::now();
            let result = self.search(target, region, options, &mut report).await;
            report.elapsed_ms = start.elapsed().as_millis() as u64;

            match result {
                Ok(outcome) => report.outcome = outcome,
                Err(e) if options.error_policy == ErrorPolicy::LegacyLenient && !e.is_invalid_request() => {
                    warn!(error = %e, "error during swipe search, reporting found for legacy callers");
                    report.outcome = SearchOutcome::Found;
                    report.lenient_error = Some(e.to_string());
                }
                Err(e) => return Err(e),
            }

            info!(
                outcome = ?report.outcome,
                gestures = report.gestures(),
                elapsed_ms = report.elapsed_ms,
                "swipe search complete"
            );
            Ok(report)
        }
        .instrument(span)
        .await
    }

    async fn search(
        &self,
        target: &Target,
        region: &SwipeRegion,
        options: &SearchOptions,
        report: &mut SearchReport,
    ) -> Result<SearchOutcome, EngineError> {
        if self.probe.is_present(target, options.initial_probe).await {
            info!("element already present");
            return Ok(SearchOutcome::Found);
        }

        for (phase, direction) in options.direction.primitives().enumerate() {
            if phase > 0 {
                info!(direction = %direction, "swiping in opposite direction");
            }
            report.phases.push(PhaseReport { direction, gestures: 0, failures: 0 });
            let Some(current) = report.phases.last_mut() else {
                continue;
            };

            match self.sweep(target, region, direction, options, current).await? {
                PhaseEnd::Found => return Ok(SearchOutcome::Found),
                PhaseEnd::Cancelled => return Ok(SearchOutcome::Cancelled),
                PhaseEnd::Exhausted => {}
            }
        }
        Ok(SearchOutcome::Exhausted)
    }

    async fn sweep(
        &self,
        target: &Target,
        region: &SwipeRegion,
        direction: PrimitiveDirection,
        options: &SearchOptions,
        phase: &mut PhaseReport,
    ) -> Result<PhaseEnd, EngineError> {
        let mut remaining = options.attempts;

        while remaining > 0 {
            if options.is_cancelled() {
                info!(remaining, "swipe search cancelled");
                return Ok(PhaseEnd::Cancelled);
            }
            remaining -= 1;

            match region.bounds(self.driver.as_ref(), self.call_timeout).await {
                Ok(bounds) => {
                    let gesture = resolve(direction.into(), bounds, options.gesture_duration)?;
                    phase.gestures += 1;
                    match self.executor.perform(&gesture).await {
                        Ok(()) => {}
                        Err(e) if options.error_policy == ErrorPolicy::LegacyLenient => {
                            phase.failures += 1;
                            return Err(e.into());
                        }
                        Err(e) => {
                            warn!(error = %e, direction = %direction, "swipe failed, continuing");
                            phase.failures += 1;
                        }
                    }
                }
                Err(e) if options.error_policy == ErrorPolicy::LegacyLenient => return Err(e),
                Err(e) => {
                    warn!(error = %e, "could not measure swipe area, skipping attempt");
                    phase.failures += 1;
                }
            }

            info!(direction = %direction, remaining, "swipe was executed");
            let present = self.probe.is_present(target, options.probe_timeout).await;
            debug!(present, "probe after swipe");
            if present {
                return Ok(PhaseEnd::Found);
            }
        }
        Ok(PhaseEnd::Exhausted)
    }
}

/// A [`Condition`] that swipes once and then probes for the target.
///
/// Drives the time-bounded swipe-to-element waits: each poll of the
/// surrounding [`PollingWait`](crate::wait::PollingWait) costs one gesture.
pub struct SwipeUntilPresent {
    driver: Arc<dyn MobileDriver>,
    executor: GestureExecutor,
    probe: PresenceProbe,
    call_timeout: Duration,
    target: Target,
    region: SwipeRegion,
    direction: PrimitiveDirection,
    gesture_duration: Duration,
    probe_timeout: Duration,
    swipes: u32,
}

impl SwipeUntilPresent {
    pub(crate) fn new(
        search: &RetryLoop,
        target: Target,
        region: SwipeRegion,
        direction: PrimitiveDirection,
        gesture_duration: Duration,
    ) -> Self {
        Self {
            driver: search.driver.clone(),
            executor: search.executor.clone(),
            probe: search.probe.clone(),
            call_timeout: search.call_timeout,
            target,
            region,
            direction,
            gesture_duration,
            probe_timeout: ATTEMPT_PROBE_TIMEOUT,
            swipes: 0,
        }
    }

    /// Gestures sent so far.
    pub fn swipes(&self) -> u32 {
        self.swipes
    }

    async fn swipe_once(&mut self) -> Result<(), EngineError> {
        let bounds = self.region.bounds(self.driver.as_ref(), self.call_timeout).await?;
        let gesture = resolve(self.direction.into(), bounds, self.gesture_duration)?;
        self.swipes += 1;
        self.executor.perform(&gesture).await?;
        Ok(())
    }
}

#[async_trait]
impl Condition for SwipeUntilPresent {
    async fn check(&mut self) -> bool {
        if let Err(e) = self.swipe_once().await {
            warn!(error = %e, direction = %self.direction, "swipe failed, continuing");
        }
        self.probe.is_present(&self.target, self.probe_timeout).await
    }

    fn describe(&self) -> String {
        format!("{} appears after swiping {}", self.target, self.direction)
    }
}
