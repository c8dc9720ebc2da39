//! Recognition session
//!
//! Connects the frame source, the active classifier and the stabilization
//! engine. The host decides the scheduling: call [`RecognitionSession::try_recognize`]
//! from a timer, hand frames to [`RecognitionSession::recognize_frame`] from a
//! push callback, or let [`RecognitionSession::run`] poll on a fixed cadence.
//!
//! Only one observation stream is processed at a time. A result that comes
//! back after a reset, a model switch or `stop()` is dropped instead of being
//! fed to the engine.

use crate::classifier::FrameSource;
use crate::config::EmissionMode;
use crate::events::{EventBus, RecognitionEvent};
use crate::lifecycle::ModelManager;
use crate::stabilizer::Outcome;
use crate::stats::SessionStats;
use parking_lot::Mutex;
use signstream_core::{Emission, Frame, RawObservation, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Polling cadence used by the browser revision of the recognizer
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Shortest cadence `run` accepts
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Drives frame → classifier → stabilizer for one camera stream
pub struct RecognitionSession {
    manager: Arc<ModelManager>,
    frames: Arc<dyn FrameSource>,
    events: Arc<EventBus>,
    stats: SessionStats,
    cancel: Mutex<CancellationToken>,
}

impl RecognitionSession {
    /// Create a new session
    pub fn new(manager: Arc<ModelManager>, frames: Arc<dyn FrameSource>) -> Self {
        Self {
            manager,
            frames,
            events: Arc::new(EventBus::default()),
            stats: SessionStats::new(),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    /// Use a shared event bus
    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = events;
        self
    }

    /// Poll the frame source once and feed the result through the engine.
    ///
    /// Returns `None` when no model is active, no frame is available, the
    /// session is stopped, or the observation did not stabilize.
    pub async fn try_recognize(&self) -> Option<Emission> {
        if self.is_stopped() || !self.manager.is_ready() {
            return None;
        }

        let frame = self.frames.current_frame()?;
        self.recognize_frame(frame).await
    }

    /// Classify a pushed frame and feed the result through the engine
    pub async fn recognize_frame(&self, frame: Frame) -> Option<Emission> {
        let token = self.cancel.lock().clone();
        if token.is_cancelled() {
            return None;
        }

        let checkout = self.manager.checkout()?;
        self.stats.record_frame();

        let started = Instant::now();
        let raw = tokio::select! {
            biased;

            _ = token.cancelled() => {
                debug!("Session stopped during inference on frame {}", frame.sequence);
                self.stats.record_stale();
                return None;
            }

            result = checkout.handle.predict(&frame) => match result {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("Classifier call failed on frame {}: {}", frame.sequence, e);
                    self.stats.record_classifier_failure();
                    metrics::counter!("signstream_classifier_failures_total").increment(1);
                    RawObservation::empty()
                }
            },
        };

        let latency_us = started.elapsed().as_micros() as u64;
        metrics::histogram!("signstream_inference_latency_us").record(latency_us as f64);

        let outcome = {
            let mut engine = self.manager.engine().lock();
            if engine.generation() != checkout.generation || token.is_cancelled() {
                None
            } else {
                Some(engine.observe_detailed(&raw))
            }
        };

        let Some(outcome) = outcome else {
            debug!(
                "Discarding stale result for frame {} from '{}'",
                frame.sequence,
                checkout.handle.key()
            );
            self.stats.record_stale();
            return None;
        };

        self.stats.record_observation(latency_us);
        metrics::counter!("signstream_observations_total").increment(1);

        match outcome {
            Outcome::Emitted(emission) => {
                self.stats.record_emission();
                metrics::counter!("signstream_emissions_total").increment(1);
                debug!(
                    "Sign detected: {} ({:.1}%)",
                    emission.label,
                    emission.probability * 100.0
                );
                self.events.publish(RecognitionEvent::Emitted {
                    model: checkout.handle.key().to_string(),
                    emission: emission.clone(),
                });
                Some(emission)
            }
            Outcome::Malformed => {
                self.stats.record_malformed();
                None
            }
            Outcome::Pending { .. } | Outcome::Rejected => None,
        }
    }

    /// Poll on a fixed cadence until stopped, or until `limit` ticks have run.
    ///
    /// Missed ticks are skipped rather than bursted. A period below
    /// [`MIN_POLL_INTERVAL`] is raised to it. Returns the number of ticks
    /// processed.
    pub async fn run(&self, period: Duration, limit: Option<u64>) -> u64 {
        let period = if period < MIN_POLL_INTERVAL {
            warn!("Poll interval {:?} too short, using {:?}", period, MIN_POLL_INTERVAL);
            MIN_POLL_INTERVAL
        } else {
            period
        };

        let token = self.cancel.lock().clone();
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Recognition loop started ({:?} cadence)", period);
        let mut ticks = 0u64;
        while limit.map_or(true, |limit| ticks < limit) {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    self.try_recognize().await;
                    ticks += 1;
                }
            }
        }

        info!("Recognition loop finished after {} ticks", ticks);
        ticks
    }

    /// Switch the active model and notify subscribers of the result
    pub async fn switch_model(&self, key: &str) -> Result<()> {
        match self.manager.activate(key).await {
            Ok(()) => {
                let name = self.manager.current_model_name().unwrap_or_default();
                self.events.publish(RecognitionEvent::ModelSwitched {
                    key: key.to_string(),
                    name,
                });
                Ok(())
            }
            Err(e) => {
                self.events.publish(RecognitionEvent::SwitchFailed {
                    key: key.to_string(),
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Stop the session; in-flight results are dropped
    pub fn stop(&self) {
        self.cancel.lock().cancel();
        self.manager.engine().lock().reset();
        info!("Recognition session stopped");
    }

    /// Resume a stopped session with fresh stabilization state
    pub fn resume(&self) {
        let mut cancel = self.cancel.lock();
        if cancel.is_cancelled() {
            *cancel = CancellationToken::new();
            info!("Recognition session resumed");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.lock().is_cancelled()
    }

    /// Explicitly clear stabilization state
    pub fn clear(&self) {
        self.manager.engine().lock().reset();
    }

    pub fn set_confidence_threshold(&self, threshold: f32) -> Result<()> {
        self.manager.engine().lock().set_confidence_threshold(threshold)
    }

    pub fn set_required_consecutive(&self, n: u32) -> Result<()> {
        self.manager.engine().lock().set_required_consecutive(n)
    }

    pub fn set_emission_mode(&self, mode: EmissionMode) {
        self.manager.engine().lock().set_emission_mode(mode);
    }

    /// The last accepted emission since the most recent reset
    pub fn last_emission(&self) -> Option<Emission> {
        self.manager.engine().lock().last_emission().cloned()
    }

    pub fn is_ready(&self) -> bool {
        self.manager.is_ready()
    }

    pub fn manager(&self) -> &Arc<ModelManager> {
        &self.manager
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Subscribe to emissions and model switch notifications
    pub fn subscribe(&self) -> broadcast::Receiver<RecognitionEvent> {
        self.events.subscribe()
    }
}
