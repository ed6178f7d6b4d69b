//! Bounded presence checks.
//!
//! [`PresenceProbe`] answers "is this on screen right now?" within a short,
//! caller-chosen timeout. A probe never fails: "not found", transport errors
//! and expired calls all read as absent, so a retry loop can probe freely
//! without each miss costing the session's full implicit wait.
//!
//! The timeout bounds the whole probe, including the implicit-wait override
//! and restore around a lookup. A restore cut short by the timeout is
//! finished in the background by the guard.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::driver::{bounded, MobileDriver};
use crate::element::{ElementHandle, Locator, Target};
use crate::implicit_wait::{with_implicit_wait, OverrideLock};

/// Checks whether targets are currently present.
#[derive(Clone)]
pub struct PresenceProbe {
    driver: Arc<dyn MobileDriver>,
    overrides: OverrideLock,
    implicit_fallback: Duration,
    call_timeout: Duration,
}

impl PresenceProbe {
    /// Creates a probe.
    ///
    /// `overrides` must be the lock every other implicit-wait override on
    /// this session uses. `implicit_fallback` is the implicit wait restored
    /// when the session's current value cannot be read; `call_timeout` bounds
    /// the restore when it outlives the probe.
    pub fn new(
        driver: Arc<dyn MobileDriver>,
        overrides: OverrideLock,
        implicit_fallback: Duration,
        call_timeout: Duration,
    ) -> Self {
        Self { driver, overrides, implicit_fallback, call_timeout }
    }

    /// Returns true if `target` is present within `timeout`.
    pub async fn is_present(&self, target: &Target, timeout: Duration) -> bool {
        let present = match target {
            Target::Locator(locator) => self.locate(locator, timeout).await.is_some(),
            Target::Element(handle) => self.is_displayed(handle, timeout).await,
        };
        debug!(element = %target, timeout_ms = timeout.as_millis() as u64, present, "probe");
        present
    }

    /// Returns the first element matching `locator` within `timeout`.
    ///
    /// The implicit wait is narrowed to `timeout` for the duration of the
    /// lookup and restored afterwards.
    pub async fn locate(&self, locator: &Locator, timeout: Duration) -> Option<ElementHandle> {
        let guarded = with_implicit_wait(
            &self.driver,
            &self.overrides,
            timeout,
            self.implicit_fallback,
            self.call_timeout,
            self.driver.find_elements(locator),
        );

        match tokio::time::timeout(timeout, guarded).await {
            Ok(Ok(elements)) => elements.into_iter().next(),
            Ok(Err(e)) => {
                debug!(locator = %locator, error = %e, "lookup failed, treating as absent");
                None
            }
            Err(_) => {
                debug!(locator = %locator, "lookup timed out, treating as absent");
                None
            }
        }
    }

    async fn is_displayed(&self, handle: &ElementHandle, timeout: Duration) -> bool {
        match bounded(timeout, self.driver.is_displayed(handle)).await {
            Ok(displayed) => displayed,
            Err(e) => {
                debug!(element = %handle, error = %e, "visibility query failed, treating as absent");
                false
            }
        }
    }
}
