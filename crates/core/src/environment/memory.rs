/// Detected/total/free view of the expanded-memory pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryReport {
    /// The platform claims the pool exists. Not proof that it is usable.
    pub detected: bool,
    pub total_bytes: u64,
    pub free_bytes: u64,
}

impl MemoryReport {
    pub fn total_mb(&self) -> u64 {
        self.total_bytes / (1024 * 1024)
    }

    pub fn free_mb(&self) -> u64 {
        self.free_bytes / (1024 * 1024)
    }
}

/// The pool the capability probe measures.
pub trait MemoryPool: Send + Sync {
    /// What the platform reports about the pool.
    fn report(&self) -> MemoryReport;

    /// Allocate `bytes` from the pool, write `fill` to every byte, read it back
    /// and release it. True only if the whole block was allocated and writable.
    fn commit_test_block(&self, bytes: usize, fill: u8) -> bool;
}

/// Process heap backed by host RAM.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostMemory;

impl HostMemory {
    #[cfg(target_os = "linux")]
    fn read_meminfo() -> (u64, u64) {
        std::fs::read_to_string("/proc/meminfo")
            .ok()
            .map(|s| {
                let mut total_kb = 0u64;
                let mut avail_kb = 0u64;
                for line in s.lines() {
                    if line.starts_with("MemTotal:") {
                        total_kb = kb_field(line);
                    } else if line.starts_with("MemAvailable:") {
                        avail_kb = kb_field(line);
                    }
                }
                (total_kb * 1024, avail_kb * 1024)
            })
            .unwrap_or((0, 0))
    }

    #[cfg(not(target_os = "linux"))]
    fn read_meminfo() -> (u64, u64) {
        // No portable source; report absent and let the probe pick the small tier.
        (0, 0)
    }
}

#[cfg(target_os = "linux")]
fn kb_field(line: &str) -> u64 {
    line.split_whitespace()
        .nth(1)
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

impl MemoryPool for HostMemory {
    fn report(&self) -> MemoryReport {
        let (total, free) = Self::read_meminfo();
        MemoryReport {
            detected: total > 0,
            total_bytes: total,
            free_bytes: free,
        }
    }

    fn commit_test_block(&self, bytes: usize, fill: u8) -> bool {
        let mut block: Vec<u8> = Vec::new();
        if block.try_reserve_exact(bytes).is_err() {
            return false;
        }
        block.resize(bytes, fill);
        let block = std::hint::black_box(block);
        block.len() == bytes && block.iter().all(|&b| b == fill)
    }
}
