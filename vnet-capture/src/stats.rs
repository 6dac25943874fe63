//! Endpoint statistics

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Kernel-side counters reported by the capture library
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KernelStats {
    /// Packets that passed the filter
    pub received: u64,
    /// Packets dropped because the capture buffer was full
    pub dropped: u64,
    /// Packets dropped by the interface or driver
    pub if_dropped: u64,
}

impl KernelStats {
    pub fn from_pcap_stats(stats: pcap::Stat) -> Self {
        Self {
            received: stats.received as u64,
            dropped: stats.dropped as u64,
            if_dropped: stats.if_dropped as u64,
        }
    }

    /// Calculate drop rate as percentage
    pub fn drop_rate(&self) -> f64 {
        if self.received == 0 {
            return 0.0;
        }
        (self.dropped as f64 / self.received as f64) * 100.0
    }
}

/// Snapshot of one endpoint's traffic
#[derive(Debug, Clone, Default)]
pub struct EndpointStats {
    pub frames_read: u64,
    pub bytes_read: u64,
    pub frames_written: u64,
    pub bytes_written: u64,
    pub write_errors: u64,
    pub duration: Duration,
}

impl EndpointStats {
    /// Format statistics as human-readable string
    pub fn format(&self) -> String {
        format!(
            "Read: {} frames ({} bytes), Written: {} frames ({} bytes), \
             Write errors: {}, Duration: {:.2}s",
            self.frames_read,
            self.bytes_read,
            self.frames_written,
            self.bytes_written,
            self.write_errors,
            self.duration.as_secs_f64()
        )
    }
}

/// Thread-safe statistics accumulator shared by an endpoint's halves
#[derive(Debug, Clone)]
pub struct StatsAccumulator {
    frames_read: Arc<AtomicU64>,
    bytes_read: Arc<AtomicU64>,
    frames_written: Arc<AtomicU64>,
    bytes_written: Arc<AtomicU64>,
    write_errors: Arc<AtomicU64>,
    start_time: Instant,
}

impl StatsAccumulator {
    pub fn new() -> Self {
        Self {
            frames_read: Arc::new(AtomicU64::new(0)),
            bytes_read: Arc::new(AtomicU64::new(0)),
            frames_written: Arc::new(AtomicU64::new(0)),
            bytes_written: Arc::new(AtomicU64::new(0)),
            write_errors: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    pub fn record_read(&self, size: usize) {
        self.frames_read.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(size as u64, Ordering::Relaxed);
    }

    pub fn record_write(&self, size: usize) {
        self.frames_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(size as u64, Ordering::Relaxed);
    }

    pub fn record_write_error(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current statistics snapshot
    pub fn snapshot(&self) -> EndpointStats {
        EndpointStats {
            frames_read: self.frames_read.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            frames_written: self.frames_written.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
            duration: self.start_time.elapsed(),
        }
    }
}

impl Default for StatsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_drop_rate() {
        let stats = KernelStats {
            received: 200,
            dropped: 10,
            if_dropped: 0,
        };
        assert_eq!(stats.drop_rate(), 5.0);
        assert_eq!(KernelStats::default().drop_rate(), 0.0);
    }

    #[test]
    fn test_accumulator_counts() {
        let acc = StatsAccumulator::new();
        acc.record_read(64);
        acc.record_read(1500);
        acc.record_write(60);
        acc.record_write_error();

        let snapshot = acc.snapshot();
        assert_eq!(snapshot.frames_read, 2);
        assert_eq!(snapshot.bytes_read, 1564);
        assert_eq!(snapshot.frames_written, 1);
        assert_eq!(snapshot.bytes_written, 60);
        assert_eq!(snapshot.write_errors, 1);
        assert!(snapshot.format().contains("1564 bytes"));
    }

    #[test]
    fn test_accumulator_shared_between_threads() {
        let acc = StatsAccumulator::new();
        let acc_clone = acc.clone();

        let handle = thread::spawn(move || {
            for _ in 0..100 {
                acc_clone.record_write(64);
            }
        });

        for _ in 0..100 {
            acc.record_write(64);
        }

        handle.join().unwrap();

        let snapshot = acc.snapshot();
        assert_eq!(snapshot.frames_written, 200);
        assert_eq!(snapshot.bytes_written, 12800);
    }
}
