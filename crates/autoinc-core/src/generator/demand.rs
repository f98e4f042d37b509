use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Demand gate for unbuffered generators.
///
/// A consumer raises one unit of demand while it waits for a value; the
/// producer claims a unit before it hands a value over. Without demand the
/// producer does not run ahead of its consumers.
#[derive(Debug, Clone)]
pub(crate) struct Demand(Arc<Semaphore>);

impl Demand {
    pub(crate) fn new() -> Self {
        Self(Arc::new(Semaphore::new(0)))
    }

    /// Signal a waiting consumer.
    ///
    /// Dropping the guard withdraws the signal unless the producer already claimed it.
    pub(crate) fn raise(&self) -> DemandGuard<'_> {
        self.0.add_permits(1);
        DemandGuard(&self.0)
    }

    /// Wait for a consumer.
    ///
    /// The permit must be forgotten once the value was enqueued; dropping it instead
    /// returns the demand to the gate.
    pub(crate) async fn claim(&self) -> Option<OwnedSemaphorePermit> {
        Arc::clone(&self.0).acquire_owned().await.ok()
    }

    /// Fail every pending and future claim.
    pub(crate) fn close(&self) {
        self.0.close();
    }
}

pub(crate) struct DemandGuard<'a>(&'a Semaphore);

impl Drop for DemandGuard<'_> {
    fn drop(&mut self) {
        if let Ok(unclaimed) = self.0.try_acquire() {
            unclaimed.forget();
        }
    }
}
