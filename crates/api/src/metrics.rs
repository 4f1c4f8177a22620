use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

pub struct Metrics {
    // Counters
    total_requests: AtomicUsize,
    successful_requests: AtomicUsize,
    failed_requests: AtomicUsize,

    // Timing (in microseconds)
    total_compare_time_us: AtomicU64,
    total_analysis_time_us: AtomicU64,

    // Counts
    comparisons: AtomicUsize,
    analyses: AtomicUsize,
    documents_compared: AtomicUsize,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            total_requests: AtomicUsize::new(0),
            successful_requests: AtomicUsize::new(0),
            failed_requests: AtomicUsize::new(0),
            total_compare_time_us: AtomicU64::new(0),
            total_analysis_time_us: AtomicU64::new(0),
            comparisons: AtomicUsize::new(0),
            analyses: AtomicUsize::new(0),
            documents_compared: AtomicUsize::new(0),
        })
    }

    pub fn record_request(&self, success: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_comparison(&self, duration: Duration, documents: usize) {
        self.total_compare_time_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.comparisons.fetch_add(1, Ordering::Relaxed);
        self.documents_compared.fetch_add(documents, Ordering::Relaxed);
    }

    pub fn record_analysis(&self, duration: Duration) {
        self.total_analysis_time_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.analyses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            avg_compare_time_ms: avg_time_ms(&self.total_compare_time_us, &self.comparisons),
            avg_analysis_time_ms: avg_time_ms(&self.total_analysis_time_us, &self.analyses),
            comparisons: self.comparisons.load(Ordering::Relaxed),
            analyses: self.analyses.load(Ordering::Relaxed),
            documents_compared: self.documents_compared.load(Ordering::Relaxed),
            embeddings_cached: None,
        }
    }
}

fn avg_time_ms(total_us: &AtomicU64, count: &AtomicUsize) -> f64 {
    let total = total_us.load(Ordering::Relaxed) as f64;
    let cnt = count.load(Ordering::Relaxed) as f64;
    if cnt > 0.0 {
        total / cnt / 1000.0 // Convert to ms
    } else {
        0.0
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub avg_compare_time_ms: f64,
    pub avg_analysis_time_ms: f64,
    pub comparisons: usize,
    pub analyses: usize,
    pub documents_compared: usize,
    /// Filled in by the handler when the embedding cache is enabled.
    pub embeddings_cached: Option<usize>,
}

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_averages() {
        let metrics = Metrics::new();
        metrics.record_comparison(Duration::from_millis(10), 2);
        metrics.record_comparison(Duration::from_millis(30), 3);
        metrics.record_request(true);
        metrics.record_request(false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.comparisons, 2);
        assert_eq!(snapshot.documents_compared, 5);
        assert!((snapshot.avg_compare_time_ms - 20.0).abs() < 1e-9);
        assert_eq!(snapshot.avg_analysis_time_ms, 0.0);
        assert_eq!(snapshot.total_requests, 2);
        assert_eq!(snapshot.failed_requests, 1);
    }
}
