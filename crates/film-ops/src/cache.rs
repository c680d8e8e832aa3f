//! Bounded LRU cache for PSF kernels.
//!
//! Kernels are keyed by the exact bit pattern of their float parameters, so
//! two requests hit the same entry only when they would build identical
//! kernels. Thread-safe; entries are shared as `Arc<Kernel>`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::trace;

use crate::Kernel;

/// Default number of cached kernels.
pub const DEFAULT_KERNEL_CACHE_CAPACITY: usize = 64;

/// Cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelKey {
    /// Gaussian by `(sigma, size)`.
    Gaussian {
        /// `sigma.to_bits()`
        sigma: u32,
        /// Side length.
        size: usize,
    },
    /// Dual PSF by `(sigma, kappa, core_fraction, radius)`.
    Dual {
        /// `sigma.to_bits()`
        sigma: u32,
        /// `kappa.to_bits()`
        kappa: u32,
        /// `core_fraction.to_bits()`
        core: u32,
        /// Radius in pixels.
        radius: usize,
    },
}

impl KernelKey {
    /// Key for a Gaussian.
    pub fn gaussian(sigma: f32, size: usize) -> Self {
        Self::Gaussian {
            sigma: sigma.to_bits(),
            size,
        }
    }

    /// Key for a dual PSF.
    pub fn dual(sigma: f32, kappa: f32, core_fraction: f32, radius: usize) -> Self {
        Self::Dual {
            sigma: sigma.to_bits(),
            kappa: kappa.to_bits(),
            core: core_fraction.to_bits(),
            radius,
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of kernels evicted.
    pub evictions: u64,
    /// Kernels currently cached.
    pub len: usize,
    /// Maximum number of kernels.
    pub capacity: usize,
}

impl CacheStats {
    /// Hit rate as percentage.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

struct Entry {
    kernel: Arc<Kernel>,
    last_used: u64,
}

struct Inner {
    entries: HashMap<KernelKey, Entry>,
    tick: u64,
    stats: CacheStats,
}

/// Bounded least-recently-used kernel cache.
pub struct KernelCache {
    inner: Mutex<Inner>,
}

impl KernelCache {
    /// Creates a cache holding at most `capacity` kernels (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::with_capacity(capacity),
                tick: 0,
                stats: CacheStats {
                    capacity,
                    ..CacheStats::default()
                },
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // The cached data stays valid even if a builder panicked.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns the cached kernel for `key`, building it with `build` on a miss.
    ///
    /// The lock is not held while building.
    pub fn get_or_try_insert<E>(
        &self,
        key: KernelKey,
        build: impl FnOnce() -> Result<Kernel, E>,
    ) -> Result<Arc<Kernel>, E> {
        {
            let mut inner = self.lock();
            inner.tick += 1;
            let tick = inner.tick;
            if let Some(entry) = inner.entries.get_mut(&key) {
                entry.last_used = tick;
                let kernel = Arc::clone(&entry.kernel);
                inner.stats.hits += 1;
                return Ok(kernel);
            }
            inner.stats.misses += 1;
        }

        trace!(?key, "building kernel");
        let kernel = Arc::new(build()?);

        let mut inner = self.lock();
        inner.tick += 1;
        let tick = inner.tick;
        if !inner.entries.contains_key(&key) && inner.entries.len() >= inner.stats.capacity {
            let oldest = inner
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| *k);
            if let Some(oldest) = oldest {
                inner.entries.remove(&oldest);
                inner.stats.evictions += 1;
            }
        }
        inner.entries.insert(
            key,
            Entry {
                kernel: Arc::clone(&kernel),
                last_used: tick,
            },
        );
        inner.stats.len = inner.entries.len();
        Ok(kernel)
    }

    /// True if `key` is cached. Does not touch recency.
    pub fn contains(&self, key: &KernelKey) -> bool {
        self.lock().entries.contains_key(key)
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }

    /// Drops every cached kernel. Counters are kept.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.stats.len = 0;
    }
}

impl Default for KernelCache {
    fn default() -> Self {
        Self::new(DEFAULT_KERNEL_CACHE_CAPACITY)
    }
}

impl std::fmt::Debug for KernelCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelCache")
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn gaussian(cache: &KernelCache, sigma: f32) -> Arc<Kernel> {
        cache
            .get_or_try_insert::<Infallible>(KernelKey::gaussian(sigma, 7), || {
                Ok(Kernel::gaussian(7, sigma))
            })
            .unwrap()
    }

    #[test]
    fn test_hit_returns_same_kernel() {
        let cache = KernelCache::new(4);
        let a = gaussian(&cache, 1.0);
        let b = gaussian(&cache, 1.0);
        assert!(Arc::ptr_eq(&a, &b));
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.len), (1, 1, 1));
        assert!((stats.hit_rate() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_bounded_lru_eviction() {
        let cache = KernelCache::new(2);
        gaussian(&cache, 1.0);
        gaussian(&cache, 2.0);
        gaussian(&cache, 1.0); // 2.0 is now least recent
        gaussian(&cache, 3.0);

        assert!(cache.contains(&KernelKey::gaussian(1.0, 7)));
        assert!(!cache.contains(&KernelKey::gaussian(2.0, 7)));
        assert!(cache.contains(&KernelKey::gaussian(3.0, 7)));
        let stats = cache.stats();
        assert_eq!(stats.len, 2);
        assert_eq!(stats.evictions, 1);
    }

    #[test]
    fn test_build_error_is_not_cached() {
        let cache = KernelCache::new(2);
        let key = KernelKey::dual(1.0, 0.0, 0.5, 3);
        let r: Result<_, &str> = cache.get_or_try_insert(key, || Err("bad"));
        assert!(r.is_err());
        assert!(!cache.contains(&key));
    }

    #[test]
    fn test_distinct_keys() {
        assert_ne!(KernelKey::gaussian(1.0, 7), KernelKey::gaussian(1.0, 9));
        assert_ne!(
            KernelKey::dual(1.0, 0.1, 0.5, 10),
            KernelKey::dual(1.0, 0.1, 0.6, 10)
        );
    }
}
