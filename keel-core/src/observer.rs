use std::sync::atomic::{AtomicU64, Ordering};

/// Receives notifications around the driver operations of a logical connection.
pub trait Observer {
    fn prepare_start(&self) {}
    fn prepare_end(&self) {}
    fn batch_start(&self) {}
    fn batch_end(&self) {}
    fn release_start(&self) {}
    fn release_end(&self) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl Observer for NoopObserver {}

/// Counts every notification, useful for statistics and assertions.
#[derive(Debug, Default)]
pub struct CountingObserver {
    prepare_start: AtomicU64,
    prepare_end: AtomicU64,
    batch_start: AtomicU64,
    batch_end: AtomicU64,
    release_start: AtomicU64,
    release_end: AtomicU64,
}

/// Snapshot of a [`CountingObserver`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ObserverCounts {
    pub prepare_start: u64,
    pub prepare_end: u64,
    pub batch_start: u64,
    pub batch_end: u64,
    pub release_start: u64,
    pub release_end: u64,
}

impl CountingObserver {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn counts(&self) -> ObserverCounts {
        ObserverCounts {
            prepare_start: self.prepare_start.load(Ordering::Relaxed),
            prepare_end: self.prepare_end.load(Ordering::Relaxed),
            batch_start: self.batch_start.load(Ordering::Relaxed),
            batch_end: self.batch_end.load(Ordering::Relaxed),
            release_start: self.release_start.load(Ordering::Relaxed),
            release_end: self.release_end.load(Ordering::Relaxed),
        }
    }
}

impl Observer for CountingObserver {
    fn prepare_start(&self) {
        self.prepare_start.fetch_add(1, Ordering::Relaxed);
    }
    fn prepare_end(&self) {
        self.prepare_end.fetch_add(1, Ordering::Relaxed);
    }
    fn batch_start(&self) {
        self.batch_start.fetch_add(1, Ordering::Relaxed);
    }
    fn batch_end(&self) {
        self.batch_end.fetch_add(1, Ordering::Relaxed);
    }
    fn release_start(&self) {
        self.release_start.fetch_add(1, Ordering::Relaxed);
    }
    fn release_end(&self) {
        self.release_end.fetch_add(1, Ordering::Relaxed);
    }
}
