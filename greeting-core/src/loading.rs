//! Cosmetic loading-status sequence shown while a greeting is generated.
//!
//! The animator advances through a fixed list of labels on its own timer,
//! independent of actual progress. It never wraps around and never mutates
//! its state once cancelled.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

/// Status labels shown while generating, in order.
pub const DEFAULT_LABELS: [&str; 5] = [
    "Connecting to Neural Net...",
    "Parsing Relationship Context...",
    "Compiling Sentiment...",
    "Sprinkling Holiday Magic...",
    "Wrapping your greeting...",
];

/// Default interval between labels.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1500);

/// Snapshot of the loading display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadingState {
    /// Run counter, bumped on every start.
    pub run: u64,
    /// Index of the label on display.
    pub index: usize,
    /// Label on display.
    pub label: String,
    /// Whether the loading display is up.
    pub active: bool,
}

struct Ticker {
    handle: JoinHandle<()>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl Ticker {
    fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        self.handle.abort();
    }
}

/// Cancellable, timer-driven status sequence.
pub struct LoadingAnimator {
    labels: Arc<[String]>,
    interval: Duration,
    state: Arc<watch::Sender<LoadingState>>,
    ticker: Option<Ticker>,
}

impl LoadingAnimator {
    /// Animator over `labels`, advancing every `interval`.
    ///
    /// An empty label list falls back to [`DEFAULT_LABELS`].
    #[must_use]
    pub fn new(labels: Vec<String>, interval: Duration) -> Self {
        let labels: Arc<[String]> = if labels.is_empty() {
            DEFAULT_LABELS.iter().map(|l| (*l).to_string()).collect()
        } else {
            labels.into()
        };
        let (tx, _rx) = watch::channel(LoadingState {
            run: 0,
            index: 0,
            label: labels[0].clone(),
            active: false,
        });
        Self {
            labels,
            interval,
            state: Arc::new(tx),
            ticker: None,
        }
    }

    /// Animator with the default labels and `interval`.
    #[must_use]
    pub fn with_interval(interval: Duration) -> Self {
        Self::new(Vec::new(), interval)
    }

    /// Subscribe to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<LoadingState> {
        self.state.subscribe()
    }

    /// Current snapshot.
    #[must_use]
    pub fn current(&self) -> LoadingState {
        self.state.borrow().clone()
    }

    /// Whether the loading display is up.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.borrow().active
    }

    /// Show the first label and start advancing.
    ///
    /// Cancels any previous run first.
    pub fn start(&mut self) {
        self.cancel();

        let mut run = 0;
        self.state.send_modify(|state| {
            state.run += 1;
            state.index = 0;
            state.label = self.labels[0].clone();
            state.active = true;
            run = state.run;
        });
        tracing::debug!(run, "Loading animation started");

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let labels = Arc::clone(&self.labels);
        let state = Arc::clone(&self.state);
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            let mut index = 0;
            while index + 1 < labels.len() {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    () = tokio::time::sleep(interval) => {
                        index += 1;
                        let advanced = state.send_if_modified(|s| {
                            if s.run != run || !s.active {
                                return false;
                            }
                            s.index = index;
                            s.label = labels[index].clone();
                            true
                        });
                        if !advanced {
                            break;
                        }
                    }
                }
            }
        });

        self.ticker = Some(Ticker {
            handle,
            shutdown_tx: Some(shutdown_tx),
        });
    }

    /// Stop advancing and take the loading display down.
    ///
    /// Idempotent. No state change is published for this run afterwards.
    pub fn cancel(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.stop();
        }
        self.state.send_if_modified(|state| {
            let was_active = state.active;
            state.active = false;
            was_active
        });
    }
}

impl Drop for LoadingAnimator {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn animator() -> LoadingAnimator {
        LoadingAnimator::with_interval(DEFAULT_INTERVAL)
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_shows_first_label() {
        let mut anim = animator();
        assert!(!anim.is_active());
        anim.start();
        let state = anim.current();
        assert!(state.active);
        assert_eq!(state.index, 0);
        assert_eq!(state.label, DEFAULT_LABELS[0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_advances_on_interval_without_wraparound() {
        let mut anim = animator();
        anim.start();

        tokio::time::sleep(Duration::from_millis(1600)).await;
        assert_eq!(anim.current().index, 1);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(anim.current().index, 2);

        tokio::time::sleep(Duration::from_secs(30)).await;
        let state = anim.current();
        assert_eq!(state.index, DEFAULT_LABELS.len() - 1);
        assert_eq!(state.label, DEFAULT_LABELS[4]);
        assert!(state.active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_freezes_state() {
        let mut anim = animator();
        anim.start();
        tokio::time::sleep(Duration::from_millis(1600)).await;
        anim.cancel();

        let frozen = anim.current();
        assert!(!frozen.active);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(anim.current(), frozen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_resets_to_first_label() {
        let mut anim = animator();
        anim.start();
        tokio::time::sleep(Duration::from_millis(3100)).await;
        assert_eq!(anim.current().index, 2);

        anim.start();
        let state = anim.current();
        assert_eq!(state.index, 0);
        assert_eq!(state.run, 2);
        assert!(state.active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscriber_sees_updates() {
        let mut anim = animator();
        let mut rx = anim.subscribe();
        anim.start();
        rx.changed().await.expect("start published");
        assert_eq!(rx.borrow_and_update().index, 0);

        rx.changed().await.expect("tick published");
        assert_eq!(rx.borrow_and_update().index, 1);
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent() {
        let mut anim = animator();
        anim.cancel();
        anim.start();
        anim.cancel();
        anim.cancel();
        assert!(!anim.is_active());
    }
}
