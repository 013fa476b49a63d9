//! Bounded work pool with a per-unit cool-down.

use crate::error::{Error, Result};
use crate::settings::Throttle;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Limits how many units run at once and spaces out their requests.
///
/// A unit holds its slot while it runs and for `cooldown` after it finishes,
/// whether it succeeded or not. Clones share the same slots.
#[derive(Clone)]
pub struct WorkPool {
    slots: Arc<Semaphore>,
    cooldown: Duration,
}

impl WorkPool {
    pub fn new(capacity: usize, cooldown: Duration) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(capacity.max(1))),
            cooldown,
        }
    }

    pub fn from_throttle(throttle: Throttle) -> Self {
        Self::new(throttle.concurrency_limit, throttle.request_delay())
    }

    /// Run one unit inside a slot.
    pub async fn run<F>(&self, unit: F) -> Result<F::Output>
    where
        F: Future,
    {
        let _permit = self
            .slots
            .acquire()
            .await
            .map_err(|e| Error::Other(anyhow::anyhow!("Work pool closed: {}", e)))?;
        let output = unit.await;
        if !self.cooldown.is_zero() {
            tokio::time::sleep(self.cooldown).await;
        }
        Ok(output)
    }
}
