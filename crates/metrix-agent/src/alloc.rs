//! Counting global allocator.
//!
//! Wraps the system allocator and keeps running totals that feed the
//! allocator gauges. The agent binary installs one instance with
//! `#[global_allocator]`; the library only ever reads it.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicU64, Ordering};

pub struct CountingAllocator {
    live_bytes: AtomicU64,
    total_bytes: AtomicU64,
    mallocs: AtomicU64,
    frees: AtomicU64,
}

/// Point-in-time copy of the allocator counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocStats {
    /// Bytes currently allocated.
    pub live_bytes: u64,
    /// Bytes ever allocated.
    pub total_bytes: u64,
    pub mallocs: u64,
    pub frees: u64,
}

impl AllocStats {
    pub fn live_objects(&self) -> u64 {
        self.mallocs.saturating_sub(self.frees)
    }
}

impl CountingAllocator {
    pub const fn new() -> Self {
        Self {
            live_bytes: AtomicU64::new(0),
            total_bytes: AtomicU64::new(0),
            mallocs: AtomicU64::new(0),
            frees: AtomicU64::new(0),
        }
    }

    pub fn stats(&self) -> AllocStats {
        AllocStats {
            live_bytes: self.live_bytes.load(Ordering::Relaxed),
            total_bytes: self.total_bytes.load(Ordering::Relaxed),
            mallocs: self.mallocs.load(Ordering::Relaxed),
            frees: self.frees.load(Ordering::Relaxed),
        }
    }

    fn on_alloc(&self, size: usize) {
        self.live_bytes.fetch_add(size as u64, Ordering::Relaxed);
        self.total_bytes.fetch_add(size as u64, Ordering::Relaxed);
        self.mallocs.fetch_add(1, Ordering::Relaxed);
    }

    fn on_free(&self, size: usize) {
        self.live_bytes.fetch_sub(size as u64, Ordering::Relaxed);
        self.frees.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for CountingAllocator {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: every call is forwarded unchanged to `System`; the counters are
// plain atomics and never allocate.
unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc(layout);
        if !ptr.is_null() {
            self.on_alloc(layout.size());
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc_zeroed(layout);
        if !ptr.is_null() {
            self.on_alloc(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
        self.on_free(layout.size());
    }

    /// Counted as one free of the old block plus one allocation of the new.
    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = System.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() {
            self.on_free(layout.size());
            self.on_alloc(new_size);
        }
        new_ptr
    }
}
