//! Concurrent fan-out with all-or-nothing join semantics.
//!
//! Composite-view builders issue several independent upstream fetches at
//! once. [`FanOut`] runs them under one shared cancellation scope and joins
//! them into a single outcome: either every sub-fetch succeeded, or the
//! first observed error is returned and the remaining siblings are
//! cancelled. No partial composite result leaves this layer.
//!
//! Sub-fetches deliver their data through caller-owned slots (for example an
//! `Arc<Mutex<Option<T>>>` per section); the builder reads the slots only
//! after [`FanOut::join`] returns `Ok`. Optional sections are skipped by not
//! spawning them, never by tolerating their failure.

use std::future::Future;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use ukiyo_types::error::GatewayError;

/// One fan-out round: a set of concurrent sub-fetches sharing a cancelable
/// scope.
pub struct FanOut {
    scope: CancellationToken,
    tasks: JoinSet<Result<(), GatewayError>>,
}

impl FanOut {
    /// Open a fan-out scope under the caller's cancellation token.
    ///
    /// Cancelling the parent cancels every sub-fetch; cancelling the child
    /// scope (on first error) leaves the parent untouched.
    pub fn new(parent: &CancellationToken) -> Self {
        Self {
            scope: parent.child_token(),
            tasks: JoinSet::new(),
        }
    }

    /// The shared scope, for passing into spawned dispatch calls.
    pub fn scope(&self) -> CancellationToken {
        self.scope.clone()
    }

    /// Schedule one sub-fetch.
    ///
    /// The future races against the shared scope, so a sibling failure
    /// aborts it even while it waits on network I/O that ignores the token.
    pub fn spawn<F>(&mut self, future: F)
    where
        F: Future<Output = Result<(), GatewayError>> + Send + 'static,
    {
        let scope = self.scope.clone();
        self.tasks.spawn(async move {
            tokio::select! {
                _ = scope.cancelled() => Err(GatewayError::Cancelled),
                result = future => result,
            }
        });
    }

    /// Wait for every sub-fetch.
    ///
    /// On the first error the shared scope is cancelled and the remaining
    /// tasks are still drained, so none outlives the join. The first
    /// observed error wins; later sibling errors (usually `Cancelled`) are
    /// dropped. Sub-fetch panics are resumed on the joining task.
    pub async fn join(mut self) -> Result<(), GatewayError> {
        let mut first_error = None;

        while let Some(joined) = self.tasks.join_next().await {
            let result = match joined {
                Ok(result) => result,
                Err(join_error) => {
                    if join_error.is_panic() {
                        self.scope.cancel();
                        std::panic::resume_unwind(join_error.into_panic());
                    }
                    Err(GatewayError::Cancelled)
                }
            };

            if let Err(error) = result {
                if first_error.is_none() {
                    tracing::debug!(%error, "fan-out sub-fetch failed, cancelling siblings");
                    self.scope.cancel();
                    first_error = Some(error);
                }
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[tokio::test]
    async fn test_all_success_yields_ok() {
        let parent = CancellationToken::new();
        let mut fanout = FanOut::new(&parent);

        let slot = Arc::new(Mutex::new(None));
        let out = slot.clone();
        fanout.spawn(async move {
            *out.lock().unwrap() = Some(42);
            Ok(())
        });
        fanout.spawn(async { Ok(()) });

        assert_eq!(fanout.join().await, Ok(()));
        assert_eq!(*slot.lock().unwrap(), Some(42));
    }

    #[tokio::test]
    async fn test_first_error_cancels_siblings() {
        let parent = CancellationToken::new();
        let mut fanout = FanOut::new(&parent);

        let sibling_finished = Arc::new(AtomicBool::new(false));
        let finished = sibling_finished.clone();
        fanout.spawn(async move {
            tokio::time::sleep(Duration::from_secs(30)).await;
            finished.store(true, Ordering::SeqCst);
            Ok(())
        });
        fanout.spawn(async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Err(GatewayError::UpstreamStatus { status: 500 })
        });

        let start = std::time::Instant::now();
        let result = fanout.join().await;

        assert_eq!(result, Err(GatewayError::UpstreamStatus { status: 500 }));
        assert!(
            start.elapsed() < Duration::from_secs(5),
            "sibling must abort early instead of running to completion"
        );
        assert!(!sibling_finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_parent_cancellation_propagates() {
        let parent = CancellationToken::new();
        let mut fanout = FanOut::new(&parent);

        fanout.spawn(async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        });

        parent.cancel();
        assert_eq!(fanout.join().await, Err(GatewayError::Cancelled));
    }

    #[tokio::test]
    async fn test_first_error_wins_over_sibling_cancellations() {
        let parent = CancellationToken::new();
        let mut fanout = FanOut::new(&parent);

        fanout.spawn(async {
            Err(GatewayError::UpstreamApi { message: "boom".to_string() })
        });
        for _ in 0..3 {
            fanout.spawn(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            });
        }

        assert_eq!(
            fanout.join().await,
            Err(GatewayError::UpstreamApi { message: "boom".to_string() })
        );
    }

    #[tokio::test]
    async fn test_empty_fanout_is_ok() {
        let parent = CancellationToken::new();
        let fanout = FanOut::new(&parent);
        assert_eq!(fanout.join().await, Ok(()));
    }
}
