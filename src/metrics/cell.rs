use std::sync::atomic::{AtomicU64, Ordering};

/// Counter that can be bumped through `&self`.
///
/// Used for the read paths of [`LfuCore`](crate::policy::lfu::LfuCore)
/// (`peek_lfu`, `frequency`) which never take `&mut self`. The cache lock
/// already serializes writers, so relaxed ordering is enough.
#[repr(transparent)]
#[derive(Debug, Default)]
pub struct MetricsCell(AtomicU64);

impl MetricsCell {
    #[inline]
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn incr(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }
}
