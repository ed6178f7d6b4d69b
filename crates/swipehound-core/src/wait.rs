//! Time-bounded condition polling.
//!
//! [`PollingWait`] evaluates a [`Condition`] immediately and then once per
//! poll interval until it holds or the timeout passes. Its budget is wall-clock
//! time, unlike the attempt-count budget of the [`search`](crate::search)
//! loop, and its cadence is independent of any gesture cadence.
//!
//! Timing out is an ordinary outcome: the caller gets
//! [`WaitOutcome::TimedOut`] (or `false`), never an error.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::driver::{bounded, MobileDriver};
use crate::element::{ElementHandle, Locator, Point};

/// Floor for poll intervals, so a zero interval cannot spin.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Default timeout for motion-settle waits.
pub const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default poll interval for motion-settle waits.
pub const SETTLE_INTERVAL: Duration = Duration::from_millis(500);

/// A condition evaluated once per poll.
#[async_trait]
pub trait Condition: Send {
    /// Samples the condition. Errors inside a check read as "not yet".
    async fn check(&mut self) -> bool;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// How a [`PollingWait`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitOutcome {
    Satisfied,
    TimedOut,
    Cancelled,
}

impl WaitOutcome {
    pub fn is_satisfied(self) -> bool {
        self == WaitOutcome::Satisfied
    }
}

/// Result of waiting for an element to disappear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disappearance {
    Gone,
    StillPresent,
}

/// Polls a condition with a fixed interval until a timeout.
#[derive(Debug, Clone)]
pub struct PollingWait {
    timeout: Duration,
    interval: Duration,
    cancel: Option<CancellationToken>,
}

impl PollingWait {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout,
            interval: interval.max(MIN_POLL_INTERVAL),
            cancel: None,
        }
    }

    /// Stops the wait early when `token` is cancelled.
    ///
    /// Cancellation is honored between checks; a check already in progress
    /// runs to completion.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Polls `condition` and reports whether it held before the timeout.
    pub async fn until<C>(&self, condition: &mut C) -> bool
    where
        C: Condition + ?Sized,
    {
        self.poll(condition).await.is_satisfied()
    }

    /// Polls `condition` and reports how the wait ended.
    pub async fn poll<C>(&self, condition: &mut C) -> WaitOutcome
    where
        C: Condition + ?Sized,
    {
        let start = Instant::now();
        let mut polls: u32 = 0;

        loop {
            if self.is_cancelled() {
                debug!(condition = %condition.describe(), polls, "wait cancelled");
                return WaitOutcome::Cancelled;
            }

            polls += 1;
            if condition.check().await {
                debug!(
                    condition = %condition.describe(),
                    polls,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "condition satisfied"
                );
                return WaitOutcome::Satisfied;
            }

            let elapsed = start.elapsed();
            if elapsed >= self.timeout {
                debug!(
                    condition = %condition.describe(),
                    polls,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "wait timed out"
                );
                return WaitOutcome::TimedOut;
            }

            let pause = self.interval.min(self.timeout - elapsed);
            match &self.cancel {
                Some(token) => {
                    tokio::select! {
                        _ = tokio::time::sleep(pause) => {}
                        _ = token.cancelled() => {}
                    }
                }
                None => tokio::time::sleep(pause).await,
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|t| t.is_cancelled())
    }
}

/// A [`Condition`] backed by a closure returning a future.
pub struct FromFn<F> {
    description: String,
    check: F,
}

/// Wraps a closure as a [`Condition`].
pub fn from_fn<F, Fut>(description: impl Into<String>, check: F) -> FromFn<F>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = bool> + Send + 'static,
{
    FromFn { description: description.into(), check }
}

#[async_trait]
impl<F, Fut> Condition for FromFn<F>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = bool> + Send + 'static,
{
    async fn check(&mut self) -> bool {
        (self.check)().await
    }

    fn describe(&self) -> String {
        self.description.clone()
    }
}

/// Holds once `locator` matches nothing.
///
/// A failed lookup is inconclusive and reads as "still there", so a flaky
/// session never reports a false disappearance.
pub struct Disappeared {
    driver: Arc<dyn MobileDriver>,
    locator: Locator,
    call_timeout: Duration,
}

impl Disappeared {
    pub fn new(driver: Arc<dyn MobileDriver>, locator: Locator, call_timeout: Duration) -> Self {
        Self { driver, locator, call_timeout }
    }
}

#[async_trait]
impl Condition for Disappeared {
    async fn check(&mut self) -> bool {
        match bounded(self.call_timeout, self.driver.find_elements(&self.locator)).await {
            Ok(elements) => elements.is_empty(),
            Err(e) => {
                debug!(locator = %self.locator, error = %e, "lookup failed during disappearance wait");
                false
            }
        }
    }

    fn describe(&self) -> String {
        format!("{} disappears", self.locator)
    }
}

/// Holds once an element reports the same location on two consecutive polls.
///
/// Positions are compared exactly. The first sample only seeds the
/// comparison, and a failed location query resets it.
pub struct Settled {
    driver: Arc<dyn MobileDriver>,
    element: ElementHandle,
    call_timeout: Duration,
    last: Option<Point>,
}

impl Settled {
    pub fn new(driver: Arc<dyn MobileDriver>, element: ElementHandle, call_timeout: Duration) -> Self {
        Self { driver, element, call_timeout, last: None }
    }

    /// The most recent sampled position.
    pub fn last_position(&self) -> Option<Point> {
        self.last
    }
}

#[async_trait]
impl Condition for Settled {
    async fn check(&mut self) -> bool {
        match bounded(self.call_timeout, self.driver.element_location(&self.element)).await {
            Ok(current) => {
                let settled = self.last == Some(current);
                self.last = Some(current);
                settled
            }
            Err(e) => {
                debug!(element = %self.element, error = %e, "location query failed during settle wait");
                self.last = None;
                false
            }
        }
    }

    fn describe(&self) -> String {
        format!("{} stops moving", self.element)
    }
}
