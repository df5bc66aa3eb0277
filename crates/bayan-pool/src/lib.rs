// SPDX-FileCopyrightText: 2026 Bayan Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rotating credential pool with explicit states and transitions.
//!
//! The pool owns the set of interchangeable model-access credentials and is
//! the only shared mutable resource in the pipeline. All `acquire`/`release`
//! transitions are serialized behind a single async mutex so two concurrent
//! turns can never hold the same credential.
//!
//! Lifecycle per credential: loaded at process start from configuration,
//! status mutated on use and failure, never persisted.

use std::time::{Duration, Instant};

use bayan_config::model::PoolConfig;
use bayan_core::{BayanError, Credential};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Status of one credential in the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CredentialStatus {
    /// Ready to be handed out.
    Available,
    /// Currently held by a turn.
    InUse,
    /// Rate-limited; becomes available again once the deadline passes.
    CoolingDown { until: Instant },
    /// Permanently removed from rotation (auth failure or repeated failures).
    Exhausted,
}

/// How a turn ended from the credential's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The credential worked (or was never exercised against the provider).
    Success,
    /// The provider rejected the call with a quota/rate-limit error.
    RateLimited,
    /// The provider rejected the credential itself.
    AuthFailed,
    /// Any other provider failure.
    Failed,
}

/// Snapshot of pool occupancy for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub available: usize,
    pub in_use: usize,
    pub cooling_down: usize,
    pub exhausted: usize,
}

struct Entry {
    credential: Credential,
    status: CredentialStatus,
    last_used: Option<Instant>,
    consecutive_failures: u32,
}

struct PoolInner {
    entries: Vec<Entry>,
    /// Round-robin cursor: index after the most recently acquired entry.
    next: usize,
}

/// Pool of rotating model-access credentials.
///
/// `acquire` hands out one available credential round-robin; `release`
/// applies the status transition for the turn's outcome. Expired cooldowns
/// are promoted back to available lazily on each `acquire`.
pub struct CredentialPool {
    inner: Mutex<PoolInner>,
    cooldown: Duration,
    max_consecutive_failures: u32,
}

impl CredentialPool {
    /// Build a pool from configured API keys. Key ids are positional
    /// (`key-1`, `key-2`, ...) for diagnostics.
    pub fn from_config(config: &PoolConfig, api_keys: &[String]) -> Self {
        let credentials = api_keys
            .iter()
            .enumerate()
            .map(|(i, secret)| Credential::new(format!("key-{}", i + 1), secret.clone()))
            .collect();
        Self::new(config, credentials)
    }

    pub fn new(config: &PoolConfig, credentials: Vec<Credential>) -> Self {
        let entries = credentials
            .into_iter()
            .map(|credential| Entry {
                credential,
                status: CredentialStatus::Available,
                last_used: None,
                consecutive_failures: 0,
            })
            .collect();
        Self {
            inner: Mutex::new(PoolInner { entries, next: 0 }),
            cooldown: Duration::from_secs(config.cooldown_secs),
            max_consecutive_failures: config.max_consecutive_failures,
        }
    }

    /// Acquire one available credential, marking it in-use.
    ///
    /// Fails with [`BayanError::PoolExhausted`] when nothing is available.
    /// Fatal for the current turn only: cooldown expiry recovers the pool
    /// for later turns.
    pub async fn acquire(&self) -> Result<Credential, BayanError> {
        let now = Instant::now();
        let mut inner = self.inner.lock().await;

        // Promote expired cooldowns before scanning.
        for entry in &mut inner.entries {
            if let CredentialStatus::CoolingDown { until } = entry.status
                && now >= until
            {
                debug!(credential = entry.credential.id.as_str(), "cooldown expired");
                entry.status = CredentialStatus::Available;
            }
        }

        let len = inner.entries.len();
        let start = inner.next;
        for offset in 0..len {
            let idx = (start + offset) % len;
            if inner.entries[idx].status == CredentialStatus::Available {
                inner.next = (idx + 1) % len;
                let entry = &mut inner.entries[idx];
                entry.status = CredentialStatus::InUse;
                entry.last_used = Some(now);
                debug!(credential = entry.credential.id.as_str(), "credential acquired");
                return Ok(entry.credential.clone());
            }
        }

        warn!(
            stats = ?Self::stats_of(&inner.entries),
            "no credential available"
        );
        Err(BayanError::PoolExhausted)
    }

    /// Return a credential to the pool with the turn's outcome.
    ///
    /// Transitions: rate-limit -> cooling-down (or exhausted after repeated
    /// failures), auth failure -> exhausted, other failure -> available with
    /// the failure counted, success -> available with the count reset. A
    /// credential failing `max_consecutive_failures` times in a row is
    /// demoted to exhausted regardless of failure type.
    pub async fn release(&self, credential: &Credential, outcome: ReleaseOutcome) {
        let mut inner = self.inner.lock().await;
        let Some(entry) = inner
            .entries
            .iter_mut()
            .find(|e| e.credential.id == credential.id)
        else {
            warn!(credential = credential.id.as_str(), "release of unknown credential ignored");
            return;
        };

        if entry.status != CredentialStatus::InUse {
            warn!(
                credential = credential.id.as_str(),
                "release of credential that is not in use ignored"
            );
            return;
        }

        match outcome {
            ReleaseOutcome::Success => {
                entry.consecutive_failures = 0;
                entry.status = CredentialStatus::Available;
                debug!(credential = credential.id.as_str(), "credential released");
            }
            ReleaseOutcome::AuthFailed => {
                entry.status = CredentialStatus::Exhausted;
                warn!(
                    credential = credential.id.as_str(),
                    "credential exhausted after auth failure"
                );
            }
            ReleaseOutcome::RateLimited | ReleaseOutcome::Failed => {
                entry.consecutive_failures += 1;
                if entry.consecutive_failures >= self.max_consecutive_failures {
                    entry.status = CredentialStatus::Exhausted;
                    warn!(
                        credential = credential.id.as_str(),
                        failures = entry.consecutive_failures,
                        "credential exhausted after consecutive failures"
                    );
                } else if outcome == ReleaseOutcome::RateLimited {
                    entry.status = CredentialStatus::CoolingDown {
                        until: Instant::now() + self.cooldown,
                    };
                    debug!(
                        credential = credential.id.as_str(),
                        cooldown_secs = self.cooldown.as_secs(),
                        "credential cooling down after rate limit"
                    );
                } else {
                    entry.status = CredentialStatus::Available;
                }
            }
        }
    }

    /// Counts of credentials per status, for diagnostics.
    pub async fn stats(&self) -> PoolStats {
        let inner = self.inner.lock().await;
        Self::stats_of(&inner.entries)
    }

    fn stats_of(entries: &[Entry]) -> PoolStats {
        let mut stats = PoolStats {
            available: 0,
            in_use: 0,
            cooling_down: 0,
            exhausted: 0,
        };
        for entry in entries {
            match entry.status {
                CredentialStatus::Available => stats.available += 1,
                CredentialStatus::InUse => stats.in_use += 1,
                CredentialStatus::CoolingDown { .. } => stats.cooling_down += 1,
                CredentialStatus::Exhausted => stats.exhausted += 1,
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_config(cooldown_secs: u64, max_failures: u32) -> PoolConfig {
        PoolConfig {
            cooldown_secs,
            max_consecutive_failures: max_failures,
        }
    }

    fn keys(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("secret-{i}")).collect()
    }

    #[tokio::test]
    async fn acquire_release_cycle() {
        let pool = CredentialPool::from_config(&pool_config(60, 2), &keys(2));
        let cred = pool.acquire().await.unwrap();
        assert_eq!(pool.stats().await.in_use, 1);
        pool.release(&cred, ReleaseOutcome::Success).await;
        let stats = pool.stats().await;
        assert_eq!(stats.in_use, 0);
        assert_eq!(stats.available, 2);
    }

    #[tokio::test]
    async fn round_robin_spreads_load() {
        let pool = CredentialPool::from_config(&pool_config(60, 2), &keys(3));
        let c1 = pool.acquire().await.unwrap();
        pool.release(&c1, ReleaseOutcome::Success).await;
        let c2 = pool.acquire().await.unwrap();
        pool.release(&c2, ReleaseOutcome::Success).await;
        let c3 = pool.acquire().await.unwrap();
        pool.release(&c3, ReleaseOutcome::Success).await;
        assert_eq!(c1.id, "key-1");
        assert_eq!(c2.id, "key-2");
        assert_eq!(c3.id, "key-3");
        // Wraps back around.
        let c4 = pool.acquire().await.unwrap();
        assert_eq!(c4.id, "key-1");
    }

    #[tokio::test]
    async fn in_use_never_exceeds_pool_size() {
        let pool = CredentialPool::from_config(&pool_config(60, 2), &keys(2));
        let _a = pool.acquire().await.unwrap();
        let _b = pool.acquire().await.unwrap();
        assert!(matches!(
            pool.acquire().await,
            Err(BayanError::PoolExhausted)
        ));
        assert_eq!(pool.stats().await.in_use, 2);
    }

    #[tokio::test]
    async fn rate_limit_triggers_cooldown_and_expiry() {
        let pool = CredentialPool::from_config(&pool_config(1, 5), &keys(1));
        let cred = pool.acquire().await.unwrap();
        pool.release(&cred, ReleaseOutcome::RateLimited).await;
        assert_eq!(pool.stats().await.cooling_down, 1);
        assert!(matches!(
            pool.acquire().await,
            Err(BayanError::PoolExhausted)
        ));

        // After the cooldown the credential is promoted lazily at acquire.
        tokio::time::sleep(Duration::from_millis(1100)).await;
        let again = pool.acquire().await.unwrap();
        assert_eq!(again.id, cred.id);
    }

    #[tokio::test]
    async fn auth_failure_exhausts_credential() {
        let pool = CredentialPool::from_config(&pool_config(60, 5), &keys(2));
        let cred = pool.acquire().await.unwrap();
        pool.release(&cred, ReleaseOutcome::AuthFailed).await;
        let stats = pool.stats().await;
        assert_eq!(stats.exhausted, 1);
        assert_eq!(stats.available, 1);
        // Exhausted credentials never come back.
        let next = pool.acquire().await.unwrap();
        assert_ne!(next.id, cred.id);
    }

    #[tokio::test]
    async fn two_consecutive_failures_demote_to_exhausted() {
        let pool = CredentialPool::from_config(&pool_config(60, 2), &keys(1));
        let cred = pool.acquire().await.unwrap();
        pool.release(&cred, ReleaseOutcome::Failed).await;
        // One failure: still available.
        assert_eq!(pool.stats().await.available, 1);

        let cred = pool.acquire().await.unwrap();
        pool.release(&cred, ReleaseOutcome::Failed).await;
        // Second consecutive failure: demoted regardless of failure type.
        assert_eq!(pool.stats().await.exhausted, 1);
    }

    #[tokio::test]
    async fn success_resets_failure_count() {
        let pool = CredentialPool::from_config(&pool_config(60, 2), &keys(1));
        let cred = pool.acquire().await.unwrap();
        pool.release(&cred, ReleaseOutcome::Failed).await;

        let cred = pool.acquire().await.unwrap();
        pool.release(&cred, ReleaseOutcome::Success).await;

        let cred = pool.acquire().await.unwrap();
        pool.release(&cred, ReleaseOutcome::Failed).await;
        // The earlier failure was cleared by the success in between.
        assert_eq!(pool.stats().await.available, 1);
    }

    #[tokio::test]
    async fn release_of_unknown_credential_is_ignored() {
        let pool = CredentialPool::from_config(&pool_config(60, 2), &keys(1));
        let stranger = Credential::new("key-99", "nope");
        pool.release(&stranger, ReleaseOutcome::Success).await;
        assert_eq!(pool.stats().await.available, 1);
    }

    #[tokio::test]
    async fn double_release_is_ignored() {
        let pool = CredentialPool::from_config(&pool_config(60, 2), &keys(1));
        let cred = pool.acquire().await.unwrap();
        pool.release(&cred, ReleaseOutcome::Success).await;
        pool.release(&cred, ReleaseOutcome::AuthFailed).await;
        // The second release must not exhaust an idle credential.
        assert_eq!(pool.stats().await.available, 1);
    }

    #[tokio::test]
    async fn all_cooling_down_fails_gracefully() {
        let pool = CredentialPool::from_config(&pool_config(60, 5), &keys(2));
        for _ in 0..2 {
            let cred = pool.acquire().await.unwrap();
            pool.release(&cred, ReleaseOutcome::RateLimited).await;
        }
        let stats = pool.stats().await;
        assert_eq!(stats.cooling_down, 2);
        assert!(matches!(
            pool.acquire().await,
            Err(BayanError::PoolExhausted)
        ));
    }
}
