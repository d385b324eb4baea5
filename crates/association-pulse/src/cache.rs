//! TTL cache of comprehensive analyses keyed by organization.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio::time::Instant;

use crate::advisors::ComprehensiveAnalysis;
use crate::config::CacheConfig;
use crate::scoring::OrganizationId;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Arc<ComprehensiveAnalysis>,
    inserted_at: Instant,
}

/// Generation of an organization's cache slot, taken before a run starts.
/// Any invalidation in between makes [`AnalysisCache::put_if_current`] a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTicket {
    epoch: u64,
    generation: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<OrganizationId, CacheEntry>,
    generations: HashMap<OrganizationId, u64>,
    epoch: u64,
}

impl CacheState {
    fn ticket(&self, key: &OrganizationId) -> CacheTicket {
        CacheTicket {
            epoch: self.epoch,
            generation: self.generations.get(key).copied().unwrap_or_default(),
        }
    }
}

/// Entries are immutable once stored; a concurrent `put` for the same key is
/// last-writer-wins.
#[derive(Debug)]
pub struct AnalysisCache {
    ttl: Duration,
    state: RwLock<CacheState>,
}

impl AnalysisCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: RwLock::new(CacheState::default()),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &OrganizationId) -> Option<Arc<ComprehensiveAnalysis>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        match state.entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                tracing::debug!(organization_id = %key, "analysis cache hit");
                Some(Arc::clone(&entry.value))
            }
            Some(_) => {
                tracing::debug!(organization_id = %key, "analysis cache entry expired");
                None
            }
            None => {
                tracing::debug!(organization_id = %key, "analysis cache miss");
                None
            }
        }
    }

    pub fn ticket(&self, key: &OrganizationId) -> CacheTicket {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .ticket(key)
    }

    pub fn put(&self, key: OrganizationId, value: Arc<ComprehensiveAnalysis>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        self.insert_locked(&mut state, key, value);
    }

    /// Stores `value` only if `key` has not been invalidated since `ticket`
    /// was taken. Returns whether the value was stored.
    pub fn put_if_current(
        &self,
        key: OrganizationId,
        value: Arc<ComprehensiveAnalysis>,
        ticket: CacheTicket,
    ) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.ticket(&key) != ticket {
            tracing::debug!(organization_id = %key, "analysis cache slot invalidated during run");
            return false;
        }
        self.insert_locked(&mut state, key, value);
        true
    }

    /// Removes the entry and advances the slot's generation, so outstanding
    /// tickets for `key` go stale even when nothing was cached.
    pub fn invalidate(&self, key: &OrganizationId) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state.generations.entry(key.clone()).or_default() += 1;
        let removed = state.entries.remove(key).is_some();
        if removed {
            tracing::debug!(organization_id = %key, "analysis cache entry invalidated");
        }
        removed
    }

    pub fn clear(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.entries.clear();
        state.generations.clear();
        state.epoch += 1;
    }

    fn insert_locked(
        &self,
        state: &mut CacheState,
        key: OrganizationId,
        value: Arc<ComprehensiveAnalysis>,
    ) {
        state
            .entries
            .retain(|_, entry| entry.inserted_at.elapsed() < self.ttl);
        state.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisors::{AdvisorManager, AdvisorRegistry};
    use crate::scoring::{PerformanceEngine, QuestionFilter, Submission};
    use tokio_util::sync::CancellationToken;

    async fn analysis(org: &str) -> Arc<ComprehensiveAnalysis> {
        let snapshot = PerformanceEngine::standard().score(
            &Submission::new(OrganizationId::new(org), Default::default()),
            QuestionFilter::All,
        );
        let manager = AdvisorManager::new(Arc::new(AdvisorRegistry::standard()), None);
        Arc::new(
            manager
                .generate_comprehensive_analysis(&snapshot, &CancellationToken::new())
                .await
                .expect("analysis completes"),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = AnalysisCache::new(Duration::from_secs(300));
        let key = OrganizationId::new("ymca-ttl");
        let value = analysis("ymca-ttl").await;

        cache.put(key.clone(), Arc::clone(&value));
        assert_eq!(cache.get(&key), Some(value));

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(cache.get(&key).is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get(&key).is_none());
    }

    #[tokio::test]
    async fn invalidate_removes_only_the_named_key() {
        let cache = AnalysisCache::default();
        let first = OrganizationId::new("ymca-a");
        let second = OrganizationId::new("ymca-b");
        cache.put(first.clone(), analysis("ymca-a").await);
        cache.put(second.clone(), analysis("ymca-b").await);

        assert!(cache.invalidate(&first));
        assert!(!cache.invalidate(&first));
        assert!(cache.get(&first).is_none());
        assert!(cache.get(&second).is_some());

        cache.clear();
        assert!(cache.get(&second).is_none());
    }

    #[tokio::test]
    async fn invalidation_after_ticket_rejects_the_late_write() {
        let cache = AnalysisCache::default();
        let key = OrganizationId::new("ymca-race");
        let stale = analysis("ymca-race").await;

        let ticket = cache.ticket(&key);
        assert!(!cache.invalidate(&key));
        assert!(!cache.put_if_current(key.clone(), Arc::clone(&stale), ticket));
        assert!(cache.get(&key).is_none());

        let ticket = cache.ticket(&key);
        cache.clear();
        assert!(!cache.put_if_current(key.clone(), Arc::clone(&stale), ticket));

        let ticket = cache.ticket(&key);
        assert!(cache.put_if_current(key.clone(), Arc::clone(&stale), ticket));
        assert!(cache.get(&key).is_some());
    }

    #[tokio::test]
    async fn later_put_replaces_earlier_value() {
        let cache = AnalysisCache::default();
        let key = OrganizationId::new("ymca-a");
        let older = analysis("ymca-a").await;
        let newer = analysis("ymca-a").await;

        cache.put(key.clone(), older);
        cache.put(key.clone(), Arc::clone(&newer));
        let cached = cache.get(&key).expect("cached");
        assert!(Arc::ptr_eq(&cached, &newer));
    }
}
