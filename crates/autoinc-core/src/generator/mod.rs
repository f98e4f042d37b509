//! Sequence generator: one background producer, many consumers.
//!
//! The producer keeps a bounded queue filled with the next values of an
//! arithmetic sequence. Consumers drain it through [`SequenceGenerator::next`].
//! Production ends on cancellation, on `i64` overflow, or when the generator
//! is dropped; buffered values are still delivered afterwards.
mod demand;
mod producer;

mod reason;
pub use reason::StopReason;

use std::{
    fmt,
    sync::{
        Arc, OnceLock,
        atomic::{AtomicBool, Ordering},
    },
};

use tokio::{
    runtime::Handle,
    sync::{Mutex, Semaphore, mpsc},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, debug_span, trace};

use autoinc_model::{GeneratorSpec, ModelError, Step};

use crate::{
    context::GeneratorContext,
    error::{CoreError, CoreResult},
};
use demand::Demand;
use producer::{Producer, Restart};

/// Concurrent, cancellable generator of an arithmetic `i64` sequence.
///
/// Values are precomputed by a background task into a queue of `buffer_size`
/// slots. Every method takes `&self`; share the generator between tasks or
/// threads through an [`Arc`].
///
/// Each value is delivered to exactly one consumer, in production order.
pub struct SequenceGenerator {
    name: Arc<str>,
    capacity: usize,
    rx: Mutex<mpsc::Receiver<i64>>,
    demand: Option<Demand>,
    resets: mpsc::UnboundedSender<Restart>,
    cancel: CancellationToken,
    stopping: AtomicBool,
    reason: Arc<OnceLock<StopReason>>,
    task: Mutex<Option<JoinHandle<StopReason>>>,
}

impl SequenceGenerator {
    /// Start a generator producing `start, start+step, ...`.
    ///
    /// `buffer_size == 0` hands values over only when a consumer is waiting.
    ///
    /// # Panics
    /// If `step` is zero, or if called outside a tokio runtime.
    pub fn new(start: i64, step: i64, buffer_size: usize) -> Self {
        match Self::try_new(start, step, buffer_size) {
            Ok(generator) => generator,
            Err(e) => panic!("cannot construct sequence generator: {e}"),
        }
    }

    /// Fallible form of [`SequenceGenerator::new`].
    pub fn try_new(start: i64, step: i64, buffer_size: usize) -> CoreResult<Self> {
        let spec = GeneratorSpec::new(start, Step::new(step)?, buffer_size);
        Self::spawn(&spec, &GeneratorContext::default())
    }

    /// Start a generator described by `spec`, wired to the shared `ctx`.
    ///
    /// The producer listens on a child of the context's cancellation token.
    pub fn spawn(spec: &GeneratorSpec, ctx: &GeneratorContext) -> CoreResult<Self> {
        spec.validate()?;
        if spec.buffer_size > Semaphore::MAX_PERMITS {
            return Err(ModelError::Invalid(format!(
                "buffer size {} exceeds {}",
                spec.buffer_size,
                Semaphore::MAX_PERMITS
            ))
            .into());
        }
        let runtime =
            Handle::try_current().map_err(|_| CoreError::NoRuntime(spec.name.clone()))?;

        let name: Arc<str> = Arc::from(spec.name.as_str());
        let (tx, rx) = mpsc::channel(spec.buffer_size.max(1));
        let (resets_tx, resets_rx) = mpsc::unbounded_channel();
        let demand = (spec.buffer_size == 0).then(Demand::new);
        let cancel = ctx.cancel_token().child_token();
        let reason = Arc::new(OnceLock::new());

        let producer = Producer {
            name: Arc::clone(&name),
            current: spec.start,
            step: spec.step,
            tx,
            demand: demand.clone(),
            resets: resets_rx,
            cancel: cancel.clone(),
            metrics: Arc::clone(ctx.metrics()),
            reason: Arc::clone(&reason),
        };
        let span = debug_span!("autoinc", generator = %name);
        let task = runtime.spawn(producer.run().instrument(span));

        debug!(
            generator = %name,
            start = spec.start,
            step = %spec.step,
            capacity = spec.buffer_size,
            "generator spawned",
        );
        Ok(Self {
            name,
            capacity: spec.buffer_size,
            rx: Mutex::new(rx),
            demand,
            resets: resets_tx,
            cancel,
            stopping: AtomicBool::new(false),
            reason,
            task: Mutex::new(Some(task)),
        })
    }

    /// Generator name used in logs and metrics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configured queue capacity (`0` for unbuffered hand-off).
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Wait for the next value.
    ///
    /// Returns `None` once production has ended and the queue is drained;
    /// every later call returns `None` as well. Cancel-safe: a dropped call
    /// never consumes a value.
    pub async fn next(&self) -> Option<i64> {
        let mut rx = self.rx.lock().await;
        let _demand = self.demand.as_ref().map(Demand::raise);
        rx.recv().await
    }

    /// Blocking form of [`SequenceGenerator::next`] for plain threads.
    ///
    /// # Panics
    /// If called from within an asynchronous execution context.
    pub fn blocking_next(&self) -> Option<i64> {
        let mut rx = self.rx.blocking_lock();
        let _demand = self.demand.as_ref().map(Demand::raise);
        rx.blocking_recv()
    }

    /// Wait for the next value, panicking if the sequence is exhausted.
    pub async fn must_next(&self) -> i64 {
        match self.next().await {
            Some(value) => value,
            None => panic!("sequence generator '{}' is exhausted", self.name),
        }
    }

    /// Blocking form of [`SequenceGenerator::must_next`].
    ///
    /// # Panics
    /// If the sequence is exhausted, or if called from within an asynchronous execution context.
    pub fn blocking_must_next(&self) -> i64 {
        match self.blocking_next() {
            Some(value) => value,
            None => panic!("sequence generator '{}' is exhausted", self.name),
        }
    }

    /// Request the producer to stop.
    ///
    /// Returns immediately; values already buffered stay available. Only the
    /// first call has an effect.
    pub fn stop(&self) {
        if self.stopping.swap(true, Ordering::AcqRel) {
            trace!(generator = %self.name, "stop already requested");
            return;
        }
        debug!(generator = %self.name, "stop requested");
        self.cancel.cancel();
    }

    /// Stop the producer and wait for it to finish.
    ///
    /// Returns why production ended, which may be an overflow that happened
    /// before the call.
    pub async fn shutdown(&self) -> CoreResult<StopReason> {
        self.stop();

        let mut task = self.task.lock().await;
        if let Some(handle) = task.take() {
            handle
                .await
                .map_err(|e| CoreError::Producer(e.to_string()))?;
        }
        self.stop_reason().ok_or_else(|| {
            CoreError::Producer(format!("generator '{}' ended without a reason", self.name))
        })
    }

    /// Restart the sequence at `start` with a new `step`.
    ///
    /// Applies to values not yet enqueued; already buffered values are
    /// delivered first.
    pub fn reset(&self, start: i64, step: i64) -> CoreResult<()> {
        let step = Step::new(step)?;
        if self.is_stopped() || self.cancel.is_cancelled() {
            return Err(CoreError::Exhausted(self.name.to_string()));
        }
        self.resets
            .send(Restart { start, step })
            .map_err(|_| CoreError::Exhausted(self.name.to_string()))
    }

    /// Why production ended, or `None` while the producer is running.
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.reason.get().copied()
    }

    /// Returns `true` once the producer has ended.
    pub fn is_stopped(&self) -> bool {
        self.reason.get().is_some()
    }
}

impl Drop for SequenceGenerator {
    fn drop(&mut self) {
        if let Some(demand) = &self.demand {
            demand.close();
        }
    }
}

impl fmt::Debug for SequenceGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceGenerator")
            .field("name", &self.name)
            .field("capacity", &self.capacity)
            .field("stop_reason", &self.stop_reason())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc, Mutex,
            atomic::{AtomicU64, Ordering},
        },
        time::Duration,
    };

    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::MetricsBackend;

    #[derive(Default)]
    struct CountingMetrics {
        produced: AtomicU64,
        resets: AtomicU64,
        stopped: Mutex<Vec<StopReason>>,
    }

    impl MetricsBackend for CountingMetrics {
        fn record_value_produced(&self, _: &str) {
            self.produced.fetch_add(1, Ordering::SeqCst);
        }

        fn record_reset(&self, _: &str) {
            self.resets.fetch_add(1, Ordering::SeqCst);
        }

        fn record_generator_stopped(&self, _: &str, reason: StopReason) {
            self.stopped.lock().unwrap().push(reason);
        }
    }

    fn spawn_counted(start: i64, step: i64, buffer_size: usize) -> (SequenceGenerator, Arc<CountingMetrics>) {
        let metrics = Arc::new(CountingMetrics::default());
        let ctx = GeneratorContext::default().with_metrics(metrics.clone());
        let spec = GeneratorSpec::new(start, Step::new(step).unwrap(), buffer_size);
        (SequenceGenerator::spawn(&spec, &ctx).unwrap(), metrics)
    }

    async fn wait_produced(metrics: &CountingMetrics, count: u64) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while metrics.produced.load(Ordering::SeqCst) < count {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("producer must fill the queue");
    }

    async fn drain(generator: &SequenceGenerator) -> Vec<i64> {
        let mut out = Vec::new();
        while let Some(value) = generator.next().await {
            out.push(value);
        }
        out
    }

    #[tokio::test]
    async fn yields_arithmetic_sequence() {
        let ids = SequenceGenerator::new(0, 2, 2);
        for i in 0..7 {
            assert_eq!(ids.next().await, Some(i * 2));
        }
        ids.stop();
    }

    #[tokio::test]
    async fn negative_start_counts_up() {
        let ids = SequenceGenerator::new(-100, 2, 5);
        for i in 0..7 {
            assert_eq!(ids.must_next().await, -100 + i * 2);
        }
    }

    #[tokio::test]
    async fn negative_step_counts_down_unbuffered() {
        let ids = SequenceGenerator::new(-100, -3, 0);
        for i in 0..7 {
            assert_eq!(ids.must_next().await, -100 - i * 3);
        }
    }

    #[test]
    #[should_panic(expected = "step must be non-zero")]
    fn zero_step_panics() {
        let _ = SequenceGenerator::new(0, 0, 2);
    }

    #[tokio::test]
    async fn try_new_rejects_zero_step() {
        let err = SequenceGenerator::try_new(0, 0, 2).unwrap_err();
        assert!(matches!(err, CoreError::Model(ModelError::ZeroStep)));
    }

    #[test]
    fn construction_requires_runtime() {
        let err = SequenceGenerator::try_new(0, 1, 1).unwrap_err();
        assert!(matches!(err, CoreError::NoRuntime(name) if name == "autoinc"));
    }

    #[tokio::test]
    async fn spawn_rejects_blank_name() {
        let spec = GeneratorSpec::default().with_name("");
        let err = SequenceGenerator::spawn(&spec, &GeneratorContext::default()).unwrap_err();
        assert!(matches!(err, CoreError::Model(ModelError::Invalid(_))));
    }

    #[tokio::test]
    async fn overflow_ends_after_last_safe_value() {
        let ids = SequenceGenerator::new(i64::MAX - 1, 2, 4);

        assert_eq!(ids.next().await, Some(i64::MAX - 1));
        assert_eq!(ids.next().await, None);
        assert_eq!(ids.next().await, None);
        assert_eq!(ids.stop_reason(), Some(StopReason::Overflow));
    }

    #[tokio::test]
    async fn overflow_reaches_max_exactly() {
        let ids = SequenceGenerator::new(i64::MAX - 1, 1, 4);

        assert_eq!(drain(&ids).await, vec![i64::MAX - 1, i64::MAX]);
    }

    #[tokio::test]
    async fn descending_overflow_triggers_at_min() {
        let ids = SequenceGenerator::new(i64::MIN + 1, -1, 3);

        assert_eq!(drain(&ids).await, vec![i64::MIN + 1, i64::MIN]);
        assert_eq!(ids.stop_reason(), Some(StopReason::Overflow));
    }

    #[tokio::test]
    #[should_panic(expected = "is exhausted")]
    async fn must_next_panics_when_exhausted() {
        let ids = SequenceGenerator::new(i64::MAX, 1, 1);
        assert_eq!(ids.must_next().await, i64::MAX);
        ids.must_next().await;
    }

    #[tokio::test]
    async fn stop_delivers_buffered_values_then_exhausts() {
        let (ids, metrics) = spawn_counted(0, 1, 100);
        wait_produced(&metrics, 100).await;
        ids.stop();

        assert_eq!(drain(&ids).await, (0..100).collect::<Vec<_>>());
        assert_eq!(ids.next().await, None);
        assert_eq!(ids.stop_reason(), Some(StopReason::Cancelled));
        assert_eq!(metrics.produced.load(Ordering::SeqCst), 100);
    }

    #[tokio::test]
    async fn repeated_stop_is_a_noop() {
        let (ids, metrics) = spawn_counted(10, 5, 2);
        assert_eq!(ids.next().await, Some(10));
        wait_produced(&metrics, 3).await;

        ids.stop();
        ids.stop();
        ids.stop();

        assert_eq!(drain(&ids).await, vec![15, 20]);
        assert_eq!(ids.shutdown().await.unwrap(), StopReason::Cancelled);
        assert_eq!(ids.shutdown().await.unwrap(), StopReason::Cancelled);
        ids.stop();
        assert_eq!(ids.next().await, None);
    }

    #[tokio::test]
    async fn shutdown_keeps_overflow_reason() {
        let ids = SequenceGenerator::new(i64::MAX, 1, 1);
        assert_eq!(ids.next().await, Some(i64::MAX));
        assert_eq!(ids.next().await, None);

        assert_eq!(ids.shutdown().await.unwrap(), StopReason::Overflow);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_consumers_share_one_prefix() {
        let ids = Arc::new(SequenceGenerator::new(2, 2, 2));

        let mut consumers = Vec::new();
        for _ in 0..4 {
            let ids = Arc::clone(&ids);
            consumers.push(tokio::spawn(async move {
                let mut taken = Vec::with_capacity(100);
                for _ in 0..100 {
                    taken.push(ids.must_next().await);
                }
                taken
            }));
        }

        let mut all = Vec::new();
        for consumer in consumers {
            all.extend(consumer.await.unwrap());
        }
        all.sort_unstable();

        let expected: Vec<i64> = (0..400).map(|i| 2 + 2 * i).collect();
        assert_eq!(all, expected);
    }

    #[test]
    fn blocking_consumers_on_plain_threads() {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .build()
            .unwrap();
        let _entered = rt.enter();
        let ids = Arc::new(SequenceGenerator::new(0, 1, 0));

        let threads: Vec<_> = (0..4)
            .map(|_| {
                let ids = Arc::clone(&ids);
                std::thread::spawn(move || {
                    (0..50).map(|_| ids.blocking_must_next()).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all: Vec<i64> = threads
            .into_iter()
            .flat_map(|t| t.join().unwrap())
            .collect();
        all.sort_unstable();

        assert_eq!(all, (0..200).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn unbuffered_generator_does_not_run_ahead() {
        let (ids, metrics) = spawn_counted(0, 1, 0);
        assert_eq!(ids.capacity(), 0);

        for i in 0..3 {
            assert_eq!(ids.next().await, Some(i));
        }
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(metrics.produced.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn buffered_generator_prefetches_up_to_capacity() {
        let (ids, metrics) = spawn_counted(0, 1, 4);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(metrics.produced.load(Ordering::SeqCst), 4);
        assert_eq!(ids.next().await, Some(0));
    }

    #[tokio::test]
    async fn reset_restarts_sequence() {
        let (ids, metrics) = spawn_counted(-100, -3, 0);
        for i in 0..7 {
            assert_eq!(ids.must_next().await, -100 - i * 3);
        }

        ids.reset(99, 2).unwrap();
        for i in 0..7 {
            assert_eq!(ids.must_next().await, 99 + i * 2);
        }
        assert_eq!(metrics.resets.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn pending_resets_collapse_into_the_latest() {
        let (ids, metrics) = spawn_counted(0, 1, 0);

        ids.reset(10, 1).unwrap();
        ids.reset(20, -2).unwrap();

        assert_eq!(ids.next().await, Some(20));
        assert_eq!(ids.next().await, Some(18));
        assert_eq!(metrics.resets.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn reset_flood_does_not_stall_production() {
        let ids = Arc::new(SequenceGenerator::new(0, 1, 1));

        let flood = {
            let ids = Arc::clone(&ids);
            tokio::spawn(async move {
                while ids.reset(1_000, 1).is_ok() {
                    tokio::task::yield_now().await;
                }
            })
        };

        for _ in 0..50 {
            let value = tokio::time::timeout(Duration::from_secs(5), ids.next())
                .await
                .expect("resets must not starve the producer");
            assert!(value.is_some());
        }

        ids.stop();
        flood.await.unwrap();
    }

    #[tokio::test]
    async fn reset_rejects_zero_step() {
        let ids = SequenceGenerator::new(0, 1, 1);
        let err = ids.reset(5, 0).unwrap_err();
        assert!(matches!(err, CoreError::Model(ModelError::ZeroStep)));
    }

    #[tokio::test]
    async fn reset_after_exhaustion_fails() {
        let ids = SequenceGenerator::new(i64::MAX, 1, 1);
        drain(&ids).await;

        assert!(ids.is_stopped());
        let err = ids.reset(0, 1).unwrap_err();
        assert!(matches!(err, CoreError::Exhausted(_)));
    }

    #[tokio::test]
    async fn parent_token_cancels_generator() {
        let parent = CancellationToken::new();
        let metrics = Arc::new(CountingMetrics::default());
        let ctx = GeneratorContext::default()
            .with_metrics(metrics.clone())
            .with_cancel_token(parent.clone());
        let spec = GeneratorSpec::new(0, Step::ONE, 8).with_name("child");
        let ids = SequenceGenerator::spawn(&spec, &ctx).unwrap();
        wait_produced(&metrics, 8).await;

        parent.cancel();
        let values = tokio::time::timeout(Duration::from_secs(5), drain(&ids))
            .await
            .expect("generator must observe parent cancellation");

        assert_eq!(values, (0..8).collect::<Vec<_>>());
        assert_eq!(ids.stop_reason(), Some(StopReason::Cancelled));
        assert_eq!(ids.name(), "child");
    }

    #[tokio::test]
    async fn stopping_one_generator_leaves_siblings_running() {
        let ctx = GeneratorContext::default();
        let a = SequenceGenerator::spawn(&GeneratorSpec::default().with_name("a"), &ctx).unwrap();
        let b = SequenceGenerator::spawn(&GeneratorSpec::default().with_name("b"), &ctx).unwrap();

        assert_eq!(a.shutdown().await.unwrap(), StopReason::Cancelled);
        assert!(!ctx.cancel_token().is_cancelled());
        assert_eq!(b.next().await, Some(0));
        assert_eq!(b.next().await, Some(1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stop_wins_against_busy_consumer() {
        let ids = Arc::new(SequenceGenerator::new(0, 1, 1));

        let consumer = {
            let ids = Arc::clone(&ids);
            tokio::spawn(async move {
                let mut taken = 0u64;
                while ids.next().await.is_some() {
                    taken += 1;
                }
                taken
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        ids.stop();

        let taken = tokio::time::timeout(Duration::from_secs(5), consumer)
            .await
            .expect("consumer must observe the end of the stream")
            .unwrap();
        assert!(taken > 0);
        assert_eq!(ids.stop_reason(), Some(StopReason::Cancelled));
    }

    #[tokio::test]
    async fn dropping_generator_closes_producer() {
        for buffer_size in [0, 3] {
            let (ids, metrics) = spawn_counted(0, 1, buffer_size);
            tokio::time::sleep(Duration::from_millis(10)).await;
            drop(ids);

            tokio::time::timeout(Duration::from_secs(5), async {
                while metrics.stopped.lock().unwrap().is_empty() {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            })
            .await
            .expect("producer must end once the generator is dropped");

            assert_eq!(*metrics.stopped.lock().unwrap(), vec![StopReason::Closed]);
        }
    }

    #[tokio::test]
    async fn timed_out_next_does_not_lose_values() {
        let ids = SequenceGenerator::new(0, 1, 0);
        assert_eq!(ids.next().await, Some(0));

        let _ = tokio::time::timeout(Duration::from_nanos(1), ids.next()).await;

        let values: Vec<i64> = [ids.next().await, ids.next().await]
            .into_iter()
            .flatten()
            .collect();
        assert!(
            values == vec![1, 2] || values == vec![2, 3],
            "abandoned call may only hand its value to the next caller, got {values:?}"
        );
    }
}
