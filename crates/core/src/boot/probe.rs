use crate::config::BeaconCfg;
use crate::environment::memory::MemoryPool;
use crate::types::{CapabilityProfile, SizingTier};

/// Byte pattern written across the probe block.
pub const PROBE_FILL: u8 = 0xAA;

/// Measure the expanded-memory pool and pick the sizing tier.
///
/// A pool that reports itself present still has to accept and hold a full
/// `probe_block_bytes` write before the expanded tier is chosen. Absence is a
/// valid outcome, never an error.
pub fn probe(pool: &dyn MemoryPool, cfg: &BeaconCfg) -> CapabilityProfile {
    let report = pool.report();
    tracing::info!(
        detected = report.detected,
        total_mb = report.total_mb(),
        free_mb = report.free_mb(),
        "expanded memory report"
    );

    let tier = if !report.detected {
        SizingTier::Constrained
    } else if pool.commit_test_block(cfg.probe_block_bytes, PROBE_FILL) {
        tracing::info!(block_bytes = cfg.probe_block_bytes, "probe block allocated and written");
        SizingTier::Expanded
    } else {
        tracing::warn!(
            block_bytes = cfg.probe_block_bytes,
            "capability degraded: expanded memory reported but probe block failed"
        );
        SizingTier::Constrained
    };

    let profile = cfg.profile_for(tier);
    tracing::info!(
        %tier,
        request_buffer_bytes = profile.request_buffer_bytes,
        response_buffer_bytes = profile.response_buffer_bytes,
        "sizing tier selected"
    );
    profile
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::memory::MemoryReport;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakePool {
        detected: bool,
        writable: bool,
        commits: AtomicUsize,
    }

    impl FakePool {
        fn new(detected: bool, writable: bool) -> Self {
            Self { detected, writable, commits: AtomicUsize::new(0) }
        }
    }

    impl MemoryPool for FakePool {
        fn report(&self) -> MemoryReport {
            MemoryReport { detected: self.detected, total_bytes: 8 << 20, free_bytes: 7 << 20 }
        }

        fn commit_test_block(&self, bytes: usize, fill: u8) -> bool {
            assert_eq!(bytes, 6 * 1024 * 1024);
            assert_eq!(fill, PROBE_FILL);
            self.commits.fetch_add(1, Ordering::SeqCst);
            self.writable
        }
    }

    #[test]
    fn writable_pool_selects_expanded() {
        let pool = FakePool::new(true, true);
        let p = probe(&pool, &BeaconCfg::default());
        assert_eq!(p.tier(), SizingTier::Expanded);
        assert_eq!(p.request_buffer_bytes, 8192);
        assert_eq!(p.response_buffer_bytes, 16384);
    }

    #[test]
    fn reported_but_unwritable_pool_degrades() {
        let pool = FakePool::new(true, false);
        let p = probe(&pool, &BeaconCfg::default());
        assert_eq!(p.tier(), SizingTier::Constrained);
        assert_eq!(pool.commits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn absent_pool_skips_allocation() {
        let pool = FakePool::new(false, true);
        let p = probe(&pool, &BeaconCfg::default());
        assert_eq!(p.tier(), SizingTier::Constrained);
        assert_eq!(pool.commits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn tier_is_monotonic() {
        let cfg = BeaconCfg::default();
        let good = probe(&FakePool::new(true, true), &cfg);
        let bad = probe(&FakePool::new(true, false), &cfg);
        assert!(good.request_buffer_bytes >= bad.request_buffer_bytes);
        assert!(good.response_buffer_bytes >= bad.response_buffer_bytes);
    }
}
