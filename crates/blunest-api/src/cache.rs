//! Single-value TTL caches for hot read endpoints
//!
//! Caches are per process; with several instances each one serves its own
//! copy for at most `ttl`.

use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

pub struct TtlCache<T> {
    ttl: Duration,
    slot: RwLock<Option<(T, Instant)>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    /// Cached value if it is younger than the TTL
    pub async fn get(&self) -> Option<T> {
        let slot = self.slot.read().await;
        match slot.as_ref() {
            Some((value, stored_at)) if stored_at.elapsed() < self.ttl => Some(value.clone()),
            _ => None,
        }
    }

    pub async fn set(&self, value: T) {
        *self.slot.write().await = Some((value, Instant::now()));
    }

    pub async fn invalidate(&self) {
        *self.slot.write().await = None;
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_set_invalidate() {
        let cache = TtlCache::new(Duration::from_secs(60));
        assert_eq!(cache.get().await, None::<u32>);

        cache.set(7).await;
        assert_eq!(cache.get().await, Some(7));

        cache.invalidate().await;
        assert_eq!(cache.get().await, None);
    }

    #[tokio::test]
    async fn test_expired_value_is_not_served() {
        let cache = TtlCache::new(Duration::ZERO);
        cache.set("stale".to_string()).await;
        assert_eq!(cache.get().await, None);
    }
}
