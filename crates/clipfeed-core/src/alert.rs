//! Request/response wrapper used by every independently fetched list.
//!
//! An [`AlertChannel`] runs one async producer, keeps the last successful
//! result, and turns failures into a one-shot error notification. There is
//! no retry policy: the user triggers [`AlertChannel::refetch`]. Overlapping
//! refetches are not prevented; each one runs to completion and the last to
//! resolve wins.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;

use crate::gateway::GatewayError;
use crate::models::{Notification, NotificationSlot};

type Producer<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, GatewayError>> + Send + Sync>;

struct ChannelState<T> {
    data: T,
    is_loading: bool,
    notification: NotificationSlot,
}

pub struct AlertChannel<T> {
    producer: Producer<T>,
    state: Arc<Mutex<ChannelState<T>>>,
}

impl<T> Clone for AlertChannel<T> {
    fn clone(&self) -> Self {
        Self {
            producer: self.producer.clone(),
            state: self.state.clone(),
        }
    }
}

impl<T> AlertChannel<T>
where
    T: Clone + Default + Send + 'static,
{
    /// Build a channel without running the producer. It reports
    /// `is_loading` until the first run completes.
    pub fn new<F, Fut>(producer: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, GatewayError>> + Send + 'static,
    {
        Self {
            producer: Arc::new(move || producer().boxed()),
            state: Arc::new(Mutex::new(ChannelState {
                data: T::default(),
                is_loading: true,
                notification: NotificationSlot::default(),
            })),
        }
    }

    /// Build a channel and run the producer once.
    pub async fn start<F, Fut>(producer: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, GatewayError>> + Send + 'static,
    {
        let channel = Self::new(producer);
        channel.refetch().await;
        channel
    }

    /// Run the producer again. Success overwrites `data`; failure keeps the
    /// last good value and raises an error notification.
    pub async fn refetch(&self) {
        self.state.lock().is_loading = true;

        let result = (self.producer)().await;

        let mut state = self.state.lock();
        state.is_loading = false;
        match result {
            Ok(data) => state.data = data,
            Err(err) => {
                tracing::warn!(error = %err, "alert channel fetch failed");
                state.notification.show(Notification::error(err.message()));
            }
        }
    }

    pub fn data(&self) -> T {
        self.state.lock().data.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().is_loading
    }

    pub fn notification(&self) -> Option<Notification> {
        self.state.lock().notification.current().cloned()
    }

    pub fn dismiss(&self) {
        self.state.lock().notification.dismiss();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Producer that fails on the calls listed in `failing`
    fn counting_producer(
        failing: &'static [usize],
    ) -> (Arc<AtomicUsize>, impl Fn() -> BoxFuture<'static, Result<Vec<usize>, GatewayError>>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let producer = move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if failing.contains(&n) {
                    Err(GatewayError::remote(format!("call {} failed", n)))
                } else {
                    Ok(vec![n])
                }
            }
            .boxed()
        };
        (calls, producer)
    }

    #[tokio::test]
    async fn test_start_runs_producer_once() {
        let (calls, producer) = counting_producer(&[]);
        let channel = AlertChannel::start(producer).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(channel.data(), vec![0]);
        assert!(!channel.is_loading());
        assert!(channel.notification().is_none());
    }

    #[tokio::test]
    async fn test_new_is_loading_until_first_run() {
        let (calls, producer) = counting_producer(&[]);
        let channel = AlertChannel::new(producer);
        assert!(channel.is_loading());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(channel.data().is_empty());
    }

    #[tokio::test]
    async fn test_failure_keeps_last_data_and_notifies() {
        let (_, producer) = counting_producer(&[1]);
        let channel = AlertChannel::start(producer).await;

        channel.refetch().await;
        assert_eq!(channel.data(), vec![0]);
        assert!(!channel.is_loading());
        let notification = channel.notification().unwrap();
        assert_eq!(notification.kind, NotificationKind::Error);
        assert_eq!(notification.message, "call 1 failed");

        channel.dismiss();
        assert!(channel.notification().is_none());

        // A later success overwrites the data; nothing re-raises the alert
        channel.refetch().await;
        assert_eq!(channel.data(), vec![2]);
        assert!(channel.notification().is_none());
    }

    #[tokio::test]
    async fn test_overlapping_refetches_both_run() {
        let (calls, producer) = counting_producer(&[]);
        let channel = AlertChannel::start(producer).await;

        tokio::join!(channel.refetch(), channel.refetch());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(!channel.is_loading());
    }
}
