use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error};

use crate::error::RequestError;
use crate::retry::{RateLimitSignal, RetryableExecutor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    /// Minimum gap between one request finishing and the next one starting
    pub min_request_interval: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            min_request_interval: Duration::from_secs(15),
        }
    }
}

struct QueueItem {
    name: String,
    enqueued_at: Instant,
    job: BoxFuture<'static, ()>,
}

/// Shared FIFO throttle for every external call.
///
/// Cloning yields another handle to the same queue. A single worker task drains
/// it, so at most one request is in flight at any time. The worker stops once
/// every handle has been dropped.
#[derive(Clone)]
pub struct RequestQueue {
    sender: mpsc::UnboundedSender<QueueItem>,
    pending: Arc<AtomicUsize>,
    config: QueueConfig,
    executor: RetryableExecutor,
}

impl RequestQueue {
    /// Spawns the worker; must be called inside a tokio runtime
    pub fn new(config: QueueConfig, executor: RetryableExecutor) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));

        tokio::spawn(run_worker(receiver, config.clone(), pending.clone()));

        Self {
            sender,
            pending,
            config,
            executor,
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn executor(&self) -> &RetryableExecutor {
        &self.executor
    }

    /// Requests not yet dispatched, including one held back by the minimum interval
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Queue `action` and wait for its result.
    ///
    /// The action runs through the retry executor when its turn comes; rate
    /// limit retries keep the queue slot.
    pub async fn enqueue<T, E, F, Fut>(
        &self,
        name: impl Into<String>,
        action: F,
    ) -> Result<T, RequestError<E>>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: RateLimitSignal + Display + Send + 'static,
    {
        let name = name.into();
        let (tx, rx) = oneshot::channel();

        let executor = self.executor.clone();
        let operation = name.clone();
        let job = async move {
            let result = executor.execute(&operation, action).await;
            // Receiver gone means the caller stopped waiting
            let _ = tx.send(result);
        }
        .boxed();

        self.pending.fetch_add(1, Ordering::SeqCst);
        let item = QueueItem {
            name: name.clone(),
            enqueued_at: Instant::now(),
            job,
        };
        if self.sender.send(item).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(RequestError::QueueClosed { operation: name });
        }

        rx.await
            .unwrap_or_else(|_| Err(RequestError::QueueClosed { operation: name }))
    }
}

async fn run_worker(
    mut receiver: mpsc::UnboundedReceiver<QueueItem>,
    config: QueueConfig,
    pending: Arc<AtomicUsize>,
) {
    let mut last_completed: Option<Instant> = None;

    while let Some(item) = receiver.recv().await {
        if let Some(last) = last_completed {
            let ready_at = last + config.min_request_interval;
            let now = Instant::now();
            if ready_at > now {
                debug!(
                    operation = %item.name,
                    wait_ms = (ready_at - now).as_millis() as u64,
                    "throttling request"
                );
                sleep_until(ready_at).await;
            }
        }
        pending.fetch_sub(1, Ordering::SeqCst);

        debug!(
            operation = %item.name,
            queued_ms = item.enqueued_at.elapsed().as_millis() as u64,
            "dispatching request"
        );

        // A panicking request only loses its own caller's result
        if let Err(e) = tokio::spawn(item.job).await {
            error!(operation = %item.name, error = %e, "queued request panicked");
        }
        last_completed = Some(Instant::now());
    }

    debug!("request queue closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryConfig;
    use futures::future::join_all;
    use std::sync::Mutex;
    use tokio::time::sleep;

    #[derive(Debug, Clone, PartialEq)]
    enum TestError {
        RateLimited,
        Rejected,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{self:?}")
        }
    }

    impl std::error::Error for TestError {}

    impl RateLimitSignal for TestError {
        fn is_rate_limited(&self) -> bool {
            matches!(self, TestError::RateLimited)
        }
    }

    type Log = Arc<Mutex<Vec<(usize, Instant, Instant)>>>;

    fn make_queue(interval_secs: u64) -> RequestQueue {
        RequestQueue::new(
            QueueConfig {
                min_request_interval: Duration::from_secs(interval_secs),
            },
            RetryableExecutor::new(RetryConfig {
                max_retries: 3,
                initial_delay: Duration::from_secs(10),
                max_delay: Duration::from_secs(600),
            }),
        )
    }

    fn timed_call(
        queue: &RequestQueue,
        id: usize,
        log: Log,
    ) -> impl Future<Output = Result<usize, RequestError<TestError>>> {
        let queue = queue.clone();
        async move {
            queue
                .enqueue(format!("call-{id}"), move || {
                    let log = log.clone();
                    async move {
                        let started = Instant::now();
                        sleep(Duration::from_secs(1)).await;
                        log.lock().unwrap().push((id, started, Instant::now()));
                        Ok::<_, TestError>(id)
                    }
                })
                .await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fifo_and_min_interval() {
        let queue = make_queue(15);
        let log: Log = Arc::default();

        let calls: Vec<_> = (0..4).map(|i| timed_call(&queue, i, log.clone())).collect();
        let results = join_all(calls).await;

        assert_eq!(
            results.into_iter().map(Result::unwrap).collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );

        let log = log.lock().unwrap();
        let order: Vec<_> = log.iter().map(|(id, _, _)| *id).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);

        for pair in log.windows(2) {
            let (_, _, prev_end) = pair[0];
            let (_, next_start, _) = pair[1];
            assert!(next_start >= prev_end, "calls overlapped");
            assert!(next_start - prev_end >= Duration::from_secs(15));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_request_is_not_delayed() {
        let queue = make_queue(15);
        let start = Instant::now();

        let value = queue
            .enqueue("only", || async { Ok::<_, TestError>(7) })
            .await
            .unwrap();

        assert_eq!(value, 7);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_rejects_only_its_caller() {
        let queue = make_queue(1);

        let ok1 = queue.enqueue("a", || async { Ok::<_, TestError>(1) });
        let bad = queue.enqueue("b", || async { Err::<u32, _>(TestError::Rejected) });
        let ok2 = queue.enqueue("c", || async { Ok::<_, TestError>(3) });
        let (ok1, bad, ok2) = tokio::join!(ok1, bad, ok2);

        assert_eq!(ok1.unwrap(), 1);
        assert!(matches!(bad, Err(RequestError::Failed { source: TestError::Rejected, .. })));
        assert_eq!(ok2.unwrap(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_keep_queue_slot() {
        let queue = make_queue(1);
        let order = Arc::new(Mutex::new(Vec::new()));

        let attempts = Arc::new(AtomicUsize::new(0));
        let first = {
            let order = order.clone();
            let attempts = attempts.clone();
            queue.enqueue("limited", move || {
                let order = order.clone();
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(TestError::RateLimited)
                    } else {
                        order.lock().unwrap().push("limited");
                        Ok(())
                    }
                }
            })
        };
        let second = {
            let order = order.clone();
            queue.enqueue("later", move || {
                let order = order.clone();
                async move {
                    order.lock().unwrap().push("later");
                    Ok::<_, TestError>(())
                }
            })
        };

        let (a, b) = tokio::join!(first, second);
        a.unwrap();
        b.unwrap();

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(*order.lock().unwrap(), vec!["limited", "later"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_counts_waiting_requests() {
        let queue = make_queue(15);
        let log: Log = Arc::default();

        let handles: Vec<_> = (0..3)
            .map(|i| tokio::spawn(timed_call(&queue, i, log.clone())))
            .collect();

        sleep(Duration::from_millis(10)).await;
        assert_eq!(queue.pending(), 2);

        // first call done at 1s; the second is held back until 16s and still counts
        sleep(Duration::from_secs(5)).await;
        assert_eq!(queue.pending(), 2);

        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(queue.pending(), 0);
        assert_eq!(queue.config().min_request_interval, Duration::from_secs(15));
    }
}
