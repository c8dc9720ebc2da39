//! Session statistics

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Lock-free counters for one recognition session
#[derive(Clone, Default)]
pub struct SessionStats {
    inner: Arc<StatsInner>,
}

#[derive(Default)]
struct StatsInner {
    frames_polled: AtomicU64,
    observations: AtomicU64,
    emissions: AtomicU64,
    malformed: AtomicU64,
    classifier_failures: AtomicU64,
    stale_discarded: AtomicU64,
    inference_latency_us: AtomicU64,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a frame handed to the classifier
    pub fn record_frame(&self) {
        self.inner.frames_polled.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an observation fed to the engine
    pub fn record_observation(&self, latency_us: u64) {
        self.inner.observations.fetch_add(1, Ordering::Relaxed);
        self.inner
            .inference_latency_us
            .fetch_add(latency_us, Ordering::Relaxed);
    }

    pub fn record_emission(&self) {
        self.inner.emissions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_malformed(&self) {
        self.inner.malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_classifier_failure(&self) {
        self.inner.classifier_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a result dropped because a reset or stop happened mid-inference
    pub fn record_stale(&self) {
        self.inner.stale_discarded.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current stats snapshot
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames_polled: self.inner.frames_polled.load(Ordering::Relaxed),
            observations: self.inner.observations.load(Ordering::Relaxed),
            emissions: self.inner.emissions.load(Ordering::Relaxed),
            malformed: self.inner.malformed.load(Ordering::Relaxed),
            classifier_failures: self.inner.classifier_failures.load(Ordering::Relaxed),
            stale_discarded: self.inner.stale_discarded.load(Ordering::Relaxed),
            inference_latency_us: self.inner.inference_latency_us.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of session counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub frames_polled: u64,
    pub observations: u64,
    pub emissions: u64,
    pub malformed: u64,
    pub classifier_failures: u64,
    pub stale_discarded: u64,
    pub inference_latency_us: u64,
}

impl StatsSnapshot {
    /// Average classifier latency per observation
    pub fn avg_inference_latency_us(&self) -> u64 {
        if self.observations == 0 {
            0
        } else {
            self.inference_latency_us / self.observations
        }
    }

    /// Fraction of observations that produced an emission
    pub fn emission_rate(&self) -> f64 {
        if self.observations == 0 {
            0.0
        } else {
            self.emissions as f64 / self.observations as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_collection() {
        let stats = SessionStats::new();

        stats.record_frame();
        stats.record_frame();
        stats.record_observation(3000);
        stats.record_observation(1000);
        stats.record_emission();
        stats.record_classifier_failure();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.frames_polled, 2);
        assert_eq!(snapshot.observations, 2);
        assert_eq!(snapshot.avg_inference_latency_us(), 2000);
        assert_eq!(snapshot.emission_rate(), 0.5);
        assert_eq!(snapshot.classifier_failures, 1);
    }

    #[test]
    fn test_empty_snapshot_rates() {
        let snapshot = SessionStats::new().snapshot();
        assert_eq!(snapshot.avg_inference_latency_us(), 0);
        assert_eq!(snapshot.emission_rate(), 0.0);
    }
}
