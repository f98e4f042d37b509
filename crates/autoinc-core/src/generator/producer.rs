use std::sync::{Arc, OnceLock};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use autoinc_model::Step;

use crate::generator::{StopReason, demand::Demand};
use crate::metrics::MetricsHandle;

/// New counter state sent by `SequenceGenerator::reset`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Restart {
    pub(crate) start: i64,
    pub(crate) step: Step,
}

/// Background half of a generator.
///
/// Sole owner of the counter: it is advanced here and nowhere else.
pub(crate) struct Producer {
    pub(crate) name: Arc<str>,
    pub(crate) current: i64,
    pub(crate) step: Step,
    pub(crate) tx: mpsc::Sender<i64>,
    pub(crate) demand: Option<Demand>,
    pub(crate) resets: mpsc::UnboundedReceiver<Restart>,
    pub(crate) cancel: CancellationToken,
    pub(crate) metrics: MetricsHandle,
    pub(crate) reason: Arc<OnceLock<StopReason>>,
}

impl Producer {
    /// Fill the queue until cancelled, overflowed or detached.
    ///
    /// The stop reason is published before the sender is dropped, so a
    /// consumer that observed the end of the stream always sees a reason.
    pub(crate) async fn run(self) -> StopReason {
        let Producer {
            name,
            mut current,
            mut step,
            tx,
            demand,
            mut resets,
            cancel,
            metrics,
            reason,
        } = self;

        debug!(start = current, step = %step, "producer started");

        let stopped = loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break StopReason::Cancelled,

                slot = reserve_slot(&tx, demand.as_ref()) => {
                    let Some(permit) = slot else {
                        break StopReason::Closed;
                    };

                    // Resets queued so far apply to the value about to be enqueued.
                    for _ in 0..resets.len() {
                        let Ok(restart) = resets.try_recv() else { break };
                        debug!(start = restart.start, step = %restart.step, "counter reset");
                        current = restart.start;
                        step = restart.step;
                        metrics.record_reset(&name);
                    }

                    permit.send(current);
                    metrics.record_value_produced(&name);
                    trace!(value = current, "value enqueued");

                    match step.advance(current) {
                        Some(next) => current = next,
                        None => {
                            let bound = if step.is_ascending() { i64::MAX } else { i64::MIN };
                            info!(last = current, step = %step, bound, "sequence reached the i64 bound");
                            break StopReason::Overflow;
                        }
                    }
                }
            }
        };

        resets.close();
        let _ = reason.set(stopped);
        drop(tx);

        metrics.record_generator_stopped(&name, stopped);
        debug!(reason = %stopped, "producer stopped");
        stopped
    }
}

/// Wait until the queue can take one more value.
///
/// For unbuffered generators this also waits for a consumer; the claimed
/// demand is only consumed once the slot is secured, so a dropped future
/// gives the demand back.
async fn reserve_slot<'a>(
    tx: &'a mpsc::Sender<i64>,
    demand: Option<&Demand>,
) -> Option<mpsc::Permit<'a, i64>> {
    let claimed = match demand {
        Some(demand) => Some(demand.claim().await?),
        None => None,
    };
    let permit = tx.reserve().await.ok()?;
    if let Some(claimed) = claimed {
        claimed.forget();
    }
    Some(permit)
}
