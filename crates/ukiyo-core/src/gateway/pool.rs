//! Rotating credential pool.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use rand::Rng;

use ukiyo_types::models::{Credential, CredentialStatus, PoolConfig, SelectionStrategy};

/// Capability the dispatcher consumes to obtain and health-track
/// credentials. The pool exclusively owns all health state; the dispatcher
/// only reports outcomes.
pub trait CredentialPool: Send + Sync {
    /// Hand out a credential, or `None` when every credential is locked out.
    fn acquire(&self) -> Option<Credential>;

    /// Report the outcome of an upstream exchange made with `credential`.
    /// Unknown credential values (caller sessions, throwaway anonymous
    /// values) are ignored.
    fn mark_status(&self, credential: &Credential, status: CredentialStatus);

    /// Return every credential to its initial good state.
    fn reset_all(&self);

    /// Number of managed credentials.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct Slot {
    value: String,
    status: CredentialStatus,
    locked_until: Option<Instant>,
    failures: u32,
    last_used: Option<Instant>,
}

impl Slot {
    fn new(value: String) -> Self {
        Self {
            value,
            status: CredentialStatus::Good,
            locked_until: None,
            failures: 0,
            last_used: None,
        }
    }

    fn reset(&mut self) {
        self.status = CredentialStatus::Good;
        self.locked_until = None;
        self.failures = 0;
    }
}

struct PoolState {
    slots: Vec<Slot>,
    cursor: usize,
}

/// Production [`CredentialPool`]: health tracking with exponential-backoff
/// lockouts and a configurable selection strategy.
pub struct RotatingPool {
    state: Mutex<PoolState>,
    strategy: SelectionStrategy,
    base_timeout: Duration,
    max_backoff: Duration,
}

impl RotatingPool {
    pub fn new(config: &PoolConfig) -> Self {
        let slots = config.credentials.iter().cloned().map(Slot::new).collect();

        Self {
            state: Mutex::new(PoolState { slots, cursor: 0 }),
            strategy: config.strategy,
            base_timeout: config.base_timeout(),
            max_backoff: config.max_backoff(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// When no credential is healthy, reclaim the locked-out one whose
    /// lockout expired longest ago, if any lockout has expired at all.
    fn fallback(state: &mut PoolState, now: Instant) -> Option<Credential> {
        let best = state
            .slots
            .iter_mut()
            .filter(|slot| slot.status == CredentialStatus::Unhealthy)
            .min_by_key(|slot| slot.locked_until)?;

        if best.locked_until.is_some_and(|until| now >= until) {
            best.reset();
            best.last_used = Some(now);
            return Some(Credential::new(best.value.clone()));
        }

        None
    }
}

impl CredentialPool for RotatingPool {
    fn acquire(&self) -> Option<Credential> {
        let mut state = self.lock();
        let now = Instant::now();

        let healthy: Vec<usize> = state
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.status == CredentialStatus::Good)
            .map(|(idx, _)| idx)
            .collect();

        if healthy.is_empty() {
            return Self::fallback(&mut state, now);
        }

        let idx = match self.strategy {
            SelectionStrategy::RoundRobin => {
                if state.cursor >= healthy.len() {
                    state.cursor = 0;
                }
                let idx = healthy[state.cursor];
                state.cursor += 1;
                idx
            }
            SelectionStrategy::Random => {
                healthy[rand::thread_rng().gen_range(0..healthy.len())]
            }
            SelectionStrategy::LeastRecentlyUsed => healthy
                .iter()
                .copied()
                .min_by_key(|&idx| state.slots[idx].last_used)
                .unwrap_or(healthy[0]),
        };

        let slot = &mut state.slots[idx];
        slot.last_used = Some(now);

        Some(Credential::new(slot.value.clone()))
    }

    fn mark_status(&self, credential: &Credential, status: CredentialStatus) {
        let mut state = self.lock();
        let Some(slot) = state.slots.iter_mut().find(|s| s.value == credential.value) else {
            return;
        };

        slot.status = status;
        match status {
            CredentialStatus::Good => {
                slot.failures = 0;
                slot.locked_until = None;
            }
            CredentialStatus::Unhealthy => {
                slot.failures += 1;
                let exponent = (slot.failures - 1).min(16);
                let lockout = self
                    .base_timeout
                    .saturating_mul(1u32 << exponent)
                    .min(self.max_backoff);
                slot.locked_until = Some(Instant::now() + lockout);

                tracing::debug!(
                    failures = slot.failures,
                    lockout_secs = lockout.as_secs(),
                    "credential marked unhealthy"
                );
            }
        }
    }

    fn reset_all(&self) {
        let mut state = self.lock();
        for slot in &mut state.slots {
            slot.reset();
        }

        tracing::warn!(
            pool_size = state.slots.len(),
            "reset all pool credentials to their initial good state"
        );
    }

    fn len(&self) -> usize {
        self.lock().slots.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pool_with(credentials: &[&str]) -> RotatingPool {
        RotatingPool::new(&PoolConfig {
            credentials: credentials.iter().map(|s| s.to_string()).collect(),
            ..PoolConfig::default()
        })
    }

    #[test]
    fn test_round_robin_cycles() {
        let pool = pool_with(&["a", "b"]);

        assert_eq!(pool.acquire().unwrap().value, "a");
        assert_eq!(pool.acquire().unwrap().value, "b");
        assert_eq!(pool.acquire().unwrap().value, "a");
    }

    #[test]
    fn test_unhealthy_credentials_are_skipped() {
        let pool = pool_with(&["a", "b"]);

        pool.mark_status(&Credential::new("a"), CredentialStatus::Unhealthy);
        assert_eq!(pool.acquire().unwrap().value, "b");
        assert_eq!(pool.acquire().unwrap().value, "b");
    }

    #[test]
    fn test_exhaustion_returns_none() {
        let pool = pool_with(&["a"]);

        pool.mark_status(&Credential::new("a"), CredentialStatus::Unhealthy);
        assert!(pool.acquire().is_none());
    }

    #[test]
    fn test_reset_all_recovers_exhausted_pool() {
        let pool = pool_with(&["a", "b"]);

        pool.mark_status(&Credential::new("a"), CredentialStatus::Unhealthy);
        pool.mark_status(&Credential::new("b"), CredentialStatus::Unhealthy);
        assert!(pool.acquire().is_none());

        pool.reset_all();
        assert!(pool.acquire().is_some());
    }

    #[test]
    fn test_expired_lockout_is_reclaimed() {
        let pool = RotatingPool::new(&PoolConfig {
            credentials: vec!["a".to_string()],
            base_timeout_secs: 0,
            ..PoolConfig::default()
        });

        pool.mark_status(&Credential::new("a"), CredentialStatus::Unhealthy);

        // Zero base timeout: the lockout has already expired.
        let reclaimed = pool.acquire().unwrap();
        assert_eq!(reclaimed.value, "a");

        // Reclaiming resets health, so the next acquire also succeeds.
        assert!(pool.acquire().is_some());
    }

    #[test]
    fn test_good_mark_clears_failures() {
        let pool = pool_with(&["a"]);
        let cred = Credential::new("a");

        pool.mark_status(&cred, CredentialStatus::Unhealthy);
        pool.mark_status(&cred, CredentialStatus::Good);
        assert_eq!(pool.acquire().unwrap().value, "a");
    }

    #[test]
    fn test_unknown_credential_is_ignored() {
        let pool = pool_with(&["a"]);

        pool.mark_status(&Credential::new("caller-session"), CredentialStatus::Unhealthy);
        assert_eq!(pool.acquire().unwrap().value, "a");
    }

    #[test]
    fn test_least_recently_used_prefers_unused() {
        let pool = RotatingPool::new(&PoolConfig {
            credentials: vec!["a".to_string(), "b".to_string()],
            strategy: SelectionStrategy::LeastRecentlyUsed,
            ..PoolConfig::default()
        });

        let first = pool.acquire().unwrap().value;
        let second = pool.acquire().unwrap().value;
        assert_ne!(first, second);
    }
}
