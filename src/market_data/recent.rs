use std::collections::VecDeque;
use tokio::sync::RwLock;

use crate::types::pool::Pool;

/// Bounded buffer of pools normalized from recent creation events. Both the
/// fixed-interval discovery cycle and collaborator ranking queries merge this
/// into the provider union before canonicalization, so the event source and
/// the poller feed the same canonicalizer.
pub struct RecentPools {
    inner: RwLock<VecDeque<Pool>>,
    capacity: usize,
}

impl RecentPools {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub async fn push(&self, pool: Pool) {
        let mut inner = self.inner.write().await;
        if inner.len() == self.capacity {
            inner.pop_front();
        }
        inner.push_back(pool);
    }

    pub async fn snapshot(&self) -> Vec<Pool> {
        self.inner.read().await.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::pool::TokenInfo;

    fn pool(address: &str) -> Pool {
        Pool {
            base_token: TokenInfo {
                address: address.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn oldest_entries_are_evicted() {
        let recent = RecentPools::new(2);
        recent.push(pool("0x1")).await;
        recent.push(pool("0x2")).await;
        recent.push(pool("0x3")).await;
        let snapshot = recent.snapshot().await;
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].base_token.address, "0x2");
        assert_eq!(snapshot[1].base_token.address, "0x3");
    }
}
