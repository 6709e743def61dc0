use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::foundation::error::{RepackError, RepackResult};

/// Default tick period of the preview timer.
pub const PREVIEW_PERIOD: Duration = Duration::from_millis(100);

/// Observable state of a [`PreviewScheduler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreviewState {
    /// Nothing changed since the last recompute.
    Idle,
    /// At least one parameter changed; the next tick recomputes.
    PendingRecompute,
}

/// What a single [`PreviewScheduler::tick`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not dirty; nothing ran.
    Idle,
    /// Dirty flag was cleared and the recompute ran once.
    Recomputed,
    /// Another tick was still recomputing; this one was dropped and the dirty flag kept.
    Skipped,
}

/// Debounces parameter edits into at most one low-resolution recompute per tick.
///
/// Any number of [`PreviewScheduler::mark_dirty`] calls between two ticks collapse into a
/// single recompute. Ticks that arrive while a recompute is still running are skipped
/// rather than queued.
#[derive(Debug, Default)]
pub struct PreviewScheduler {
    dirty: AtomicBool,
    in_flight: AtomicBool,
    recomputes: AtomicU64,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl PreviewScheduler {
    /// Create an idle scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a parameter mutation. Idempotent while a recompute is pending.
    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// Current state.
    pub fn state(&self) -> PreviewState {
        if self.dirty.load(Ordering::Acquire) {
            PreviewState::PendingRecompute
        } else {
            PreviewState::Idle
        }
    }

    /// Return `true` while a recompute is running.
    pub fn is_recomputing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Number of recomputes run so far.
    pub fn recompute_count(&self) -> u64 {
        self.recomputes.load(Ordering::Relaxed)
    }

    /// Run `recompute` once if a mutation is pending.
    ///
    /// The dirty flag is cleared before `recompute` runs, so edits made during the
    /// recompute schedule another one on the next tick.
    pub fn tick<F: FnOnce()>(&self, recompute: F) -> TickOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::trace!("preview tick skipped, recompute still running");
            return TickOutcome::Skipped;
        }
        let _guard = InFlight(&self.in_flight);

        if !self.dirty.swap(false, Ordering::AcqRel) {
            return TickOutcome::Idle;
        }
        recompute();
        let n = self.recomputes.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(recomputes = n, "preview recomputed");
        TickOutcome::Recomputed
    }
}

/// Background thread that ticks a shared [`PreviewScheduler`] at a fixed period.
///
/// Stopped and joined by [`PreviewTimer::stop`] or on drop.
#[derive(Debug)]
pub struct PreviewTimer {
    stop_tx: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl PreviewTimer {
    /// Start ticking `scheduler` every [`PREVIEW_PERIOD`].
    pub fn start<F>(scheduler: Arc<PreviewScheduler>, recompute: F) -> RepackResult<Self>
    where
        F: FnMut() + Send + 'static,
    {
        Self::spawn(scheduler, PREVIEW_PERIOD, recompute)
    }

    /// Start ticking `scheduler` every `period`, calling `recompute` when dirty.
    pub fn spawn<F>(
        scheduler: Arc<PreviewScheduler>,
        period: Duration,
        mut recompute: F,
    ) -> RepackResult<Self>
    where
        F: FnMut() + Send + 'static,
    {
        if period.is_zero() {
            return Err(RepackError::validation("preview period must be non-zero"));
        }

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = std::thread::Builder::new()
            .name("texrepack-preview".to_owned())
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(period) {
                        Err(RecvTimeoutError::Timeout) => {
                            scheduler.tick(&mut recompute);
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })
            .map_err(|e| {
                RepackError::Other(anyhow::anyhow!("failed to spawn preview timer: {e}"))
            })?;

        tracing::debug!(period_ms = period.as_millis() as u64, "preview timer started");
        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Stop the timer and wait for the thread to exit.
    pub fn stop(mut self) -> RepackResult<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> RepackResult<()> {
        drop(self.stop_tx.take());
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| RepackError::Other(anyhow::anyhow!("preview timer thread panicked"))),
            None => Ok(()),
        }
    }
}

impl Drop for PreviewTimer {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            tracing::warn!(error = %e, "preview timer shutdown failed");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/preview/scheduler.rs"]
mod tests;
