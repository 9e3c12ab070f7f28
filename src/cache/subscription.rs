use super::PollingCache;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Handle on the periodic refresh task. Stopping or dropping it cancels
/// the task.
pub struct Subscription {
    handle: Option<JoinHandle<()>>,
    period: Duration,
}

impl Subscription {
    pub fn start(cache: Arc<PollingCache>, period: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                cache.refresh().await;
            }
        });

        tracing::debug!(period_ms = period.as_millis() as u64, "polling started");
        Self {
            handle: Some(handle),
            period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!("polling stopped");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::tests::ProbeStore;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn polls_until_stopped() {
        let store = ProbeStore::new(Duration::ZERO);
        let cache = PollingCache::new(store.clone());

        let mut sub = cache.subscribe(Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(110)).await;
        assert!(sub.is_running());
        assert!(store.fetches.load(Ordering::SeqCst) >= 2);
        assert!(cache.snapshot().is_ready());

        sub.stop();
        assert!(!sub.is_running());
        tokio::task::yield_now().await;
        let after_stop = store.fetches.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(store.fetches.load(Ordering::SeqCst), after_stop);
    }

    #[tokio::test]
    async fn dropping_the_subscription_cancels_polling() {
        let store = ProbeStore::new(Duration::ZERO);
        let cache = PollingCache::new(store.clone());

        {
            let _sub = cache.subscribe(Duration::from_millis(20));
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        tokio::task::yield_now().await;
        let after_drop = store.fetches.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(store.fetches.load(Ordering::SeqCst), after_drop);
    }
}
