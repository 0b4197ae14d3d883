//! Enumerated runtime statistics.
//!
//! | gauge         | source                                  |
//! |---------------|-----------------------------------------|
//! | `Alloc`       | counting allocator, live bytes          |
//! | `HeapAlloc`   | counting allocator, live bytes          |
//! | `TotalAlloc`  | counting allocator, cumulative bytes    |
//! | `Mallocs`     | counting allocator                      |
//! | `Frees`       | counting allocator                      |
//! | `HeapObjects` | counting allocator, mallocs - frees     |
//! | `Sys`         | `/proc/self/status` VmRSS               |
//! | `NumThreads`  | `/proc/self/status` Threads             |
//! | `TotalMemory` | `/proc/meminfo` MemTotal                |
//! | `FreeMemory`  | `/proc/meminfo` MemFree                 |
//! | `NumCPU`      | `std::thread::available_parallelism`    |
//!
//! A statistic whose source is missing (no allocator installed, no `/proc`)
//! is left out of the sample.

use std::fs;

use crate::alloc::AllocStats;

pub type Sample = (&'static str, f64);

pub fn sample(alloc: Option<AllocStats>) -> Vec<Sample> {
    let mut out = Vec::with_capacity(11);
    if let Some(a) = alloc {
        out.extend(allocator_stats(a));
    }
    if let Ok(s) = fs::read_to_string("/proc/self/status") {
        out.extend(process_stats(&s));
    }
    if let Ok(s) = fs::read_to_string("/proc/meminfo") {
        out.extend(host_memory(&s));
    }
    if let Ok(n) = std::thread::available_parallelism() {
        out.push(("NumCPU", n.get() as f64));
    }
    out
}

pub fn allocator_stats(a: AllocStats) -> [Sample; 6] {
    [
        ("Alloc", a.live_bytes as f64),
        ("HeapAlloc", a.live_bytes as f64),
        ("TotalAlloc", a.total_bytes as f64),
        ("Mallocs", a.mallocs as f64),
        ("Frees", a.frees as f64),
        ("HeapObjects", a.live_objects() as f64),
    ]
}

pub fn process_stats(status: &str) -> Vec<Sample> {
    let mut out = Vec::with_capacity(2);
    if let Some(kb) = field(status, "VmRSS") {
        out.push(("Sys", (kb * 1024) as f64));
    }
    if let Some(n) = field(status, "Threads") {
        out.push(("NumThreads", n as f64));
    }
    out
}

pub fn host_memory(meminfo: &str) -> Vec<Sample> {
    let mut out = Vec::with_capacity(2);
    if let Some(kb) = field(meminfo, "MemTotal") {
        out.push(("TotalMemory", (kb * 1024) as f64));
    }
    if let Some(kb) = field(meminfo, "MemFree") {
        out.push(("FreeMemory", (kb * 1024) as f64));
    }
    out
}

/// First number of a `Key:   value [unit]` line.
fn field(text: &str, key: &str) -> Option<u64> {
    text.lines().find_map(|line| {
        line.strip_prefix(key)?
            .strip_prefix(':')?
            .split_whitespace()
            .next()?
            .parse()
            .ok()
    })
}
