//! Scoped overrides of the session's implicit wait.
//!
//! The implicit wait is shared by every lookup on a session, so an override
//! that outlives the operation that set it silently slows down (or speeds up)
//! everything after it. [`ImplicitWaitGuard`] saves the current value, applies
//! the override, and puts the saved value back:
//!
//! - explicitly, via [`ImplicitWaitGuard::restore`], on normal and error paths;
//! - from `Drop`, when the owning future is cancelled or panics before
//!   restoring. The restore is then spawned onto the current tokio runtime.
//!
//! Overrides on one session must share one [`OverrideLock`]. The guard holds
//! it from the read of the current value until the restore has been sent, so
//! a second override never saves the first one's temporary value.
//!
//! [`with_implicit_wait`] wraps the whole lock → set → run → restore sequence.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

use crate::driver::{bounded, DriverError, MobileDriver};

/// Serializes implicit-wait overrides on one session.
pub type OverrideLock = Arc<Mutex<()>>;

/// Restores the session's previous implicit wait when released.
#[must_use = "dropping the guard immediately restores the previous implicit wait"]
pub struct ImplicitWaitGuard {
    driver: Arc<dyn MobileDriver>,
    previous: Duration,
    call_timeout: Duration,
    armed: bool,
    held: Option<OwnedMutexGuard<()>>,
}

impl ImplicitWaitGuard {
    /// Overrides the implicit wait with `wait`.
    ///
    /// Waits for `lock` first. `fallback` is used as the value to restore
    /// when the current wait cannot be read. When the current wait already
    /// equals `wait`, no override is sent and the guard restores nothing, but
    /// it still holds the lock until released.
    ///
    /// # Errors
    ///
    /// Returns the driver error if the override itself fails. A rejected
    /// override needs no restoring; an unanswered one is restored on drop.
    pub async fn narrow(
        driver: Arc<dyn MobileDriver>,
        lock: &OverrideLock,
        wait: Duration,
        fallback: Duration,
        call_timeout: Duration,
    ) -> Result<Self, DriverError> {
        let held = lock.clone().lock_owned().await;

        let previous = match bounded(call_timeout, driver.implicit_wait()).await {
            Ok(previous) => previous,
            Err(e) => {
                warn!(error = %e, fallback_ms = fallback.as_millis() as u64, "could not read implicit wait, using configured default");
                fallback
            }
        };

        let mut guard = Self { driver, previous, call_timeout, armed: false, held: Some(held) };
        if previous == wait {
            return Ok(guard);
        }

        // Armed before sending, so a cancelled or unanswered set is undone.
        guard.armed = true;
        let sent = bounded(call_timeout, guard.driver.set_implicit_wait(wait)).await;
        if let Err(e) = sent {
            guard.armed = e == DriverError::Timeout;
            return Err(e);
        }
        debug!(
            wait_ms = wait.as_millis() as u64,
            previous_ms = previous.as_millis() as u64,
            "implicit wait overridden"
        );
        Ok(guard)
    }

    /// Puts the previous implicit wait back and releases the lock.
    pub async fn restore(mut self) -> Result<(), DriverError> {
        if !self.armed {
            return Ok(());
        }
        // Still armed while in flight, so a dropped restore is retried from `Drop`.
        let restored = bounded(self.call_timeout, self.driver.set_implicit_wait(self.previous)).await;
        self.armed = false;
        restored?;
        debug!(wait_ms = self.previous.as_millis() as u64, "implicit wait restored");
        Ok(())
    }
}

impl Drop for ImplicitWaitGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let driver = self.driver.clone();
        let previous = self.previous;
        let call_timeout = self.call_timeout;
        let held = self.held.take();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!(wait_ms = previous.as_millis() as u64, "restoring implicit wait after early exit");
                handle.spawn(async move {
                    if let Err(e) = bounded(call_timeout, driver.set_implicit_wait(previous)).await {
                        warn!(error = %e, "failed to restore implicit wait");
                    }
                    drop(held);
                });
            }
            Err(_) => {
                warn!(
                    wait_ms = previous.as_millis() as u64,
                    "implicit wait left overridden: no runtime to restore it on"
                );
            }
        }
    }
}

/// Runs `body` with the implicit wait set to `wait`, then restores it.
///
/// A failed override is logged and `body` still runs under the ambient
/// wait; callers bound their own remote calls, so the result stays correct
/// and only the timing changes. A failed restore is logged, not returned.
///
/// `lock` is held for the whole sequence, `body` included, so `body` must not
/// start another override on the same lock.
pub async fn with_implicit_wait<T, F>(
    driver: &Arc<dyn MobileDriver>,
    lock: &OverrideLock,
    wait: Duration,
    fallback: Duration,
    call_timeout: Duration,
    body: F,
) -> T
where
    F: Future<Output = T>,
{
    let guard = match ImplicitWaitGuard::narrow(driver.clone(), lock, wait, fallback, call_timeout).await {
        Ok(guard) => Some(guard),
        Err(e) => {
            warn!(error = %e, "could not override implicit wait");
            None
        }
    };

    let output = body.await;

    if let Some(guard) = guard {
        if let Err(e) = guard.restore().await {
            warn!(error = %e, "failed to restore implicit wait");
        }
    }
    output
}
