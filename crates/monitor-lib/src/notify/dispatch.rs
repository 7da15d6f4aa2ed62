//! Bounded notification dispatch
//!
//! Events are pushed onto a fixed-capacity queue and delivered by a small
//! worker pool so one slow delivery cannot delay the next scrape cycle.
//! When the queue is full the oldest pending event is dropped and the
//! drop is logged and counted: alerts are best-effort, not a durable
//! queue.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::Notifier;
use crate::models::AlertEvent;
use crate::observability::MonitorMetrics;

/// Maximum number of dispatch workers
const MAX_WORKERS: usize = 4;

/// Configuration for the dispatcher
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Number of delivery workers; clamped to 1..=4
    pub workers: usize,
    /// Queue capacity before oldest-event drop kicks in
    pub capacity: usize,
    /// Per-event delivery timeout
    pub delivery_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            capacity: 64,
            delivery_timeout: Duration::from_secs(30),
        }
    }
}

/// Fixed-capacity event queue with oldest-first eviction
pub struct DispatchQueue {
    inner: Mutex<VecDeque<AlertEvent>>,
    notify: Notify,
    capacity: usize,
    metrics: MonitorMetrics,
}

impl DispatchQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            notify: Notify::new(),
            capacity: capacity.max(1),
            metrics: MonitorMetrics::new(),
        }
    }

    /// Enqueue an event, evicting the oldest pending one when full
    pub fn push(&self, event: AlertEvent) {
        {
            let mut queue = self.inner.lock().unwrap();
            if queue.len() >= self.capacity {
                if let Some(dropped) = queue.pop_front() {
                    warn!(series = %dropped.key, kind = %dropped.kind, "Dispatch queue full, dropping oldest pending notification");
                    self.metrics.inc_notifications_dropped();
                }
            }
            queue.push_back(event);
        }
        self.notify.notify_one();
    }

    /// Wait for the next event
    pub async fn pop(&self) -> AlertEvent {
        loop {
            if let Some(event) = self.inner.lock().unwrap().pop_front() {
                return event;
            }
            self.notify.notified().await;
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Worker pool delivering queued events through a notifier
pub struct Dispatcher {
    queue: Arc<DispatchQueue>,
    handles: Vec<JoinHandle<()>>,
}

impl Dispatcher {
    /// Start the delivery workers
    pub fn start(
        notifier: Arc<dyn Notifier>,
        config: DispatchConfig,
        shutdown: &tokio::sync::broadcast::Sender<()>,
    ) -> Self {
        let queue = Arc::new(DispatchQueue::new(config.capacity));
        let workers = config.workers.clamp(1, MAX_WORKERS);
        let metrics = MonitorMetrics::new();

        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let queue = queue.clone();
            let notifier = notifier.clone();
            let metrics = metrics.clone();
            let timeout = config.delivery_timeout;
            let mut shutdown = shutdown.subscribe();

            handles.push(tokio::spawn(async move {
                loop {
                    tokio::select! {
                        event = queue.pop() => {
                            deliver_one(&*notifier, &event, timeout, &metrics).await;
                        }
                        _ = shutdown.recv() => {
                            info!(worker_id, "Shutting down dispatch worker");
                            break;
                        }
                    }
                }
            }));
        }

        Self { queue, handles }
    }

    /// Handle for pushing events
    pub fn queue(&self) -> Arc<DispatchQueue> {
        self.queue.clone()
    }

    /// Wait for all workers to exit
    pub async fn join(self) {
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

async fn deliver_one(
    notifier: &dyn Notifier,
    event: &AlertEvent,
    timeout: Duration,
    metrics: &MonitorMetrics,
) {
    match tokio::time::timeout(timeout, notifier.deliver(event)).await {
        Ok(Ok(())) => {
            metrics.inc_notifications_sent();
        }
        Ok(Err(e)) => {
            error!(series = %event.key, error = %e, "Notification delivery failed");
            metrics.inc_notification_errors();
        }
        Err(_) => {
            error!(series = %event.key, timeout_secs = timeout.as_secs(), "Notification delivery timed out");
            metrics.inc_notification_errors();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertKind, Labels, SeriesKey};
    use crate::notify::{async_trait, NotifyError};
    use crate::rules::Comparator;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn event(name: &str) -> AlertEvent {
        AlertEvent {
            key: SeriesKey::new(name, Labels::new()),
            kind: AlertKind::Firing,
            value: 1.0,
            threshold: 0.0,
            comparator: Comparator::Gt,
        }
    }

    struct CountingNotifier {
        delivered: AtomicUsize,
        fail: bool,
    }

    impl CountingNotifier {
        fn new(fail: bool) -> Self {
            Self {
                delivered: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl Notifier for CountingNotifier {
        async fn deliver(&self, _event: &AlertEvent) -> Result<(), NotifyError> {
            self.delivered.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(NotifyError::Message("boom".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_queue_drops_oldest_when_full() {
        let queue = DispatchQueue::new(2);
        queue.push(event("a"));
        queue.push(event("b"));
        queue.push(event("c"));

        assert_eq!(queue.len(), 2);
        let first = tokio_test::block_on(queue.pop());
        // "a" was evicted; "b" is now the oldest
        assert_eq!(first.key.rule, "b");
    }

    #[tokio::test]
    async fn test_queue_pop_waits_for_push() {
        let queue = Arc::new(DispatchQueue::new(8));
        let popper = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.pop().await })
        };

        tokio::task::yield_now().await;
        queue.push(event("a"));

        let popped = popper.await.unwrap();
        assert_eq!(popped.key.rule, "a");
    }

    #[tokio::test]
    async fn test_dispatcher_delivers_queued_events() {
        let notifier = Arc::new(CountingNotifier::new(false));
        let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);
        let dispatcher = Dispatcher::start(
            notifier.clone(),
            DispatchConfig {
                workers: 2,
                capacity: 16,
                delivery_timeout: Duration::from_secs(1),
            },
            &shutdown_tx,
        );

        let queue = dispatcher.queue();
        for i in 0..5 {
            queue.push(event(&format!("m{i}")));
        }

        // Give the workers a moment to drain the queue
        for _ in 0..50 {
            if notifier.delivered.load(Ordering::SeqCst) == 5 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(notifier.delivered.load(Ordering::SeqCst), 5);

        shutdown_tx.send(()).unwrap();
        dispatcher.join().await;
    }

    #[tokio::test]
    async fn test_delivery_failure_does_not_stop_workers() {
        let notifier = Arc::new(CountingNotifier::new(true));
        let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);
        let dispatcher = Dispatcher::start(
            notifier.clone(),
            DispatchConfig::default(),
            &shutdown_tx,
        );

        let queue = dispatcher.queue();
        queue.push(event("a"));
        queue.push(event("b"));

        for _ in 0..50 {
            if notifier.delivered.load(Ordering::SeqCst) == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        // Both attempts happened despite the first failing
        assert_eq!(notifier.delivered.load(Ordering::SeqCst), 2);

        shutdown_tx.send(()).unwrap();
        dispatcher.join().await;
    }

    #[tokio::test]
    async fn test_workers_exit_on_shutdown() {
        let notifier = Arc::new(CountingNotifier::new(false));
        let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);
        let dispatcher = Dispatcher::start(notifier, DispatchConfig::default(), &shutdown_tx);

        shutdown_tx.send(()).unwrap();
        // join returns promptly once the broadcast is observed
        dispatcher.join().await;
    }
}
