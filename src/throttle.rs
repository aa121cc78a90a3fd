/// Frame throttler
///
/// Single-slot, keep-only-latest stage between the camera source and the
/// frame pipeline. One background worker runs at most one cycle at a time;
/// results travel to the render context over a channel and are applied in
/// generation order.
///
/// ## Architecture
///
/// ```text
/// camera ──submit──> [pending slot] ──worker──> FramePipeline ──Delivery──> RenderQueue ──> Overlay
///                     (replaced if                (one cycle     (bounded       (drops stale
///                      not started)                at a time)     channel)       generations)
/// ```
///
/// A frame whose cycle has already started is not cancelled by a newer one;
/// its view is delivered and the newer view supersedes it on screen.
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::detection::Frame;
use crate::error::ThrottleError;
use crate::overlay::Overlay;
use crate::pipeline::FramePipeline;
use crate::projector::ViewModel;
use crate::stats::LatencyStats;

/// Finished views that may wait for the render context
pub const DELIVERY_CAPACITY: usize = 2;

/// Throttler configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleConfig {
    /// Idle worker wake-up interval, to observe shutdown
    pub idle_poll: Duration,
    /// Log a latency report every N cycles (0 = never)
    pub report_every: usize,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for ThrottleConfig {
    fn from(config: &Config) -> Self {
        Self {
            idle_poll: Duration::from_millis(config.idle_poll_ms),
            report_every: config.report_every,
        }
    }
}

/// Snapshot of the throttler counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThrottleStats {
    /// Frames accepted by `submit`
    pub admitted: u64,
    /// Pending frames replaced before the worker picked them up
    pub replaced: u64,
    /// Cycles run to completion
    pub processed: u64,
    /// Views applied to the overlay
    pub delivered: u64,
    /// Views discarded because a newer one was already applied
    pub stale: u64,
    /// Cycles where the detector call failed
    pub failed: u64,
    /// Labels that failed to decode, over all cycles
    pub rejected_labels: u64,
}

/// A finished cycle on its way to the render context
#[derive(Debug, Clone)]
pub struct Delivery {
    pub generation: u64,
    pub view: ViewModel,
}

struct PendingFrame {
    generation: u64,
    frame: Frame,
}

#[derive(Default)]
struct Counters {
    replaced: AtomicU64,
    processed: AtomicU64,
    delivered: AtomicU64,
    stale: AtomicU64,
    failed: AtomicU64,
    rejected_labels: AtomicU64,
}

/// State shared by the camera side, the worker and the render side
///
/// `pending` is filled by `submit` and emptied by the worker or on stop;
/// `running` only changes under the `pending` lock. `delivered`/`stale` are
/// written by the render queue only.
struct ThrottleShared {
    pending: Mutex<Option<PendingFrame>>,
    wake: Condvar,
    admitted: AtomicU64,
    running: AtomicBool,
    counters: Counters,
}

impl ThrottleShared {
    fn stats(&self) -> ThrottleStats {
        let c = &self.counters;
        ThrottleStats {
            admitted: self.admitted.load(Ordering::Acquire),
            replaced: c.replaced.load(Ordering::Relaxed),
            processed: c.processed.load(Ordering::Relaxed),
            delivered: c.delivered.load(Ordering::Relaxed),
            stale: c.stale.load(Ordering::Relaxed),
            failed: c.failed.load(Ordering::Relaxed),
            rejected_labels: c.rejected_labels.load(Ordering::Relaxed),
        }
    }
}

/// Camera-side handle of the throttled pipeline
pub struct FrameThrottler {
    shared: Arc<ThrottleShared>,
    worker: Option<thread::JoinHandle<()>>,
}

impl FrameThrottler {
    /// Start the worker thread
    ///
    /// Returns the camera-side handle and the render-side queue.
    pub fn spawn(
        pipeline: FramePipeline,
        config: ThrottleConfig,
    ) -> Result<(Self, RenderQueue), ThrottleError> {
        let shared = Arc::new(ThrottleShared {
            pending: Mutex::new(None),
            wake: Condvar::new(),
            admitted: AtomicU64::new(0),
            running: AtomicBool::new(true),
            counters: Counters::default(),
        });

        let (tx, rx) = bounded(DELIVERY_CAPACITY);
        let worker_shared = Arc::clone(&shared);
        let detector_name = pipeline.detector_name();

        let handle = thread::Builder::new()
            .name("frame-worker".to_string())
            .spawn(move || run_worker(worker_shared, pipeline, tx, config))
            .map_err(ThrottleError::WorkerSpawnFailed)?;

        info!("Frame worker started ({})", detector_name);

        let queue = RenderQueue {
            rx,
            last_applied: 0,
            shared: Arc::clone(&shared),
        };

        Ok((
            Self {
                shared,
                worker: Some(handle),
            },
            queue,
        ))
    }

    /// Admit a frame, replacing any frame still waiting for the worker
    ///
    /// Returns the frame's generation. Never waits for a running cycle.
    pub fn submit(&self, frame: Frame) -> Result<u64, ThrottleError> {
        let mut slot = self.shared.pending.lock();
        if !self.shared.running.load(Ordering::Acquire) {
            return Err(ThrottleError::Stopped);
        }

        let generation = self.shared.admitted.fetch_add(1, Ordering::AcqRel) + 1;
        let sequence = frame.sequence;

        if let Some(replaced) = slot.replace(PendingFrame { generation, frame }) {
            self.shared.counters.replaced.fetch_add(1, Ordering::Relaxed);
            debug!(
                "Dropped frame {} (generation {}) for frame {}",
                replaced.frame.sequence, replaced.generation, sequence
            );
        }
        drop(slot);

        self.shared.wake.notify_one();
        Ok(generation)
    }

    /// Generation of the most recently admitted frame
    pub fn latest_generation(&self) -> u64 {
        self.shared.admitted.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> ThrottleStats {
        self.shared.stats()
    }

    /// Stop the worker and wait for it
    ///
    /// A cycle in progress runs to completion first.
    pub fn shutdown(&mut self) {
        {
            // Under the lock, so no frame is admitted once the slot is emptied
            let mut slot = self.shared.pending.lock();
            self.shared.running.store(false, Ordering::Release);
            if let Some(pending) = slot.take() {
                debug!("Discarding pending frame {} on shutdown", pending.frame.sequence);
            }
        }
        self.shared.wake.notify_all();

        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                warn!("Frame worker panicked");
            }
            info!("Frame worker stopped");
        }
    }
}

impl Drop for FrameThrottler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Marks the throttler stopped when the worker exits, including by panic
struct StopOnExit(Arc<ThrottleShared>);

impl Drop for StopOnExit {
    fn drop(&mut self) {
        if thread::panicking() {
            error!("Frame worker panicked, throttler stopped");
        }
        let mut slot = self.0.pending.lock();
        self.0.running.store(false, Ordering::Release);
        slot.take();
    }
}

fn run_worker(
    shared: Arc<ThrottleShared>,
    mut pipeline: FramePipeline,
    tx: Sender<Delivery>,
    config: ThrottleConfig,
) {
    let _stop = StopOnExit(Arc::clone(&shared));
    let mut latency = LatencyStats::new();

    loop {
        let pending = {
            let mut slot = shared.pending.lock();
            loop {
                if !shared.running.load(Ordering::Acquire) {
                    return;
                }
                if let Some(pending) = slot.take() {
                    break pending;
                }
                shared.wake.wait_for(&mut slot, config.idle_poll);
            }
        };

        let output = pipeline.run(&pending.frame);

        let counters = &shared.counters;
        counters.processed.fetch_add(1, Ordering::Relaxed);
        counters
            .rejected_labels
            .fetch_add(output.rejected as u64, Ordering::Relaxed);
        if output.detector_failed {
            counters.failed.fetch_add(1, Ordering::Relaxed);
        }

        if config.report_every > 0 {
            latency.add(output.timing);
            if latency.len() >= config.report_every {
                latency.report();
                latency.clear();
            }
        }

        let mut view = output.view;
        view.generation = pending.generation;
        let delivery = Delivery {
            generation: pending.generation,
            view,
        };

        if !deliver(&shared, &tx, delivery, config.idle_poll) {
            return;
        }
    }
}

/// Hand a view to the render context, waiting while the channel is full
///
/// Returns false when the worker should exit.
fn deliver(
    shared: &ThrottleShared,
    tx: &Sender<Delivery>,
    mut delivery: Delivery,
    idle_poll: Duration,
) -> bool {
    loop {
        match tx.send_timeout(delivery, idle_poll) {
            Ok(()) => return true,
            Err(SendTimeoutError::Timeout(returned)) => {
                if !shared.running.load(Ordering::Acquire) {
                    return false;
                }
                debug!("Render context busy, holding view for generation {}", returned.generation);
                delivery = returned;
            }
            Err(SendTimeoutError::Disconnected(_)) => {
                info!("Render queue closed, frame worker exiting");
                return false;
            }
        }
    }
}

/// Render-side end of the throttler
///
/// Must be pumped from the rendering context. Views are applied in strictly
/// increasing generation order; anything older than the last applied view is
/// discarded.
pub struct RenderQueue {
    rx: Receiver<Delivery>,
    last_applied: u64,
    shared: Arc<ThrottleShared>,
}

impl RenderQueue {
    /// Apply everything that arrived since the last pump
    ///
    /// Only the newest pending view is drawn. Returns its generation, if any.
    pub fn pump<O: Overlay + ?Sized>(&mut self, overlay: &mut O) -> Option<u64> {
        let mut newest: Option<Delivery> = None;
        while let Ok(delivery) = self.rx.try_recv() {
            // Superseded before it could be drawn
            match newest.take() {
                Some(previous) if previous.generation > delivery.generation => {
                    self.discard(&delivery);
                    newest = Some(previous);
                }
                Some(previous) => {
                    self.discard(&previous);
                    newest = Some(delivery);
                }
                None => newest = Some(delivery),
            }
        }

        newest.and_then(|delivery| self.apply(delivery, overlay))
    }

    /// Block until the next delivery arrives and apply it
    ///
    /// Returns the applied generation, or `None` on timeout, disconnect or a
    /// stale delivery.
    pub fn wait_next<O: Overlay + ?Sized>(
        &mut self,
        overlay: &mut O,
        timeout: Duration,
    ) -> Option<u64> {
        match self.rx.recv_timeout(timeout) {
            Ok(delivery) => self.apply(delivery, overlay),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Apply a delivery unless a newer view is already on screen
    pub fn apply<O: Overlay + ?Sized>(&mut self, delivery: Delivery, overlay: &mut O) -> Option<u64> {
        if delivery.generation <= self.last_applied {
            self.discard(&delivery);
            return None;
        }

        overlay.apply(&delivery.view);
        self.last_applied = delivery.generation;
        self.shared.counters.delivered.fetch_add(1, Ordering::Relaxed);
        Some(delivery.generation)
    }

    fn discard(&self, delivery: &Delivery) {
        debug!(
            "Discarding view for generation {} (last applied {})",
            delivery.generation, self.last_applied
        );
        self.shared.counters.stale.fetch_add(1, Ordering::Relaxed);
    }

    /// Generation of the view currently on screen (0 = none yet)
    pub fn last_applied(&self) -> u64 {
        self.last_applied
    }

    pub fn stats(&self) -> ThrottleStats {
        self.shared.stats()
    }
}
