//! The capture loop.
//!
//! Polls the trigger key at a fixed period. On every rising edge it reserves
//! the next frame index, captures the player region and then the opponent
//! region, and persists the pair. A failure anywhere in that sequence drops
//! the pair; the reserved index is not reused.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::capture::{RegionCapturer, RegionPair, ScreenSource};
use crate::error::TriggerError;
use crate::input::{KeyEdgeDetector, KeySource};
use crate::session::{PersistedPair, SequenceSession};

/// Shared stop request. Checked before each tick, never mid-tick.
#[derive(Clone, Debug, Default)]
pub struct StopHandle {
    requested: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

/// Counters reported when the loop stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub triggers: u32,
    pub pairs_persisted: u32,
    pub pairs_dropped: u32,
}

/// What a single tick did.
#[derive(Debug)]
pub enum TickOutcome {
    /// No rising edge this tick.
    Idle,
    Persisted(PersistedPair),
    /// A trigger fired but its pair was discarded.
    Dropped { index: u32, error: TriggerError },
}

pub struct CaptureLoop<K, S> {
    keys: K,
    detector: KeyEdgeDetector,
    capturer: RegionCapturer<S>,
    session: SequenceSession,
    regions: RegionPair,
    poll_interval: Duration,
    stop: StopHandle,
    state: LoopState,
    stats: LoopStats,
}

impl<K: KeySource, S: ScreenSource> CaptureLoop<K, S> {
    pub fn new(
        keys: K,
        screen: S,
        session: SequenceSession,
        regions: RegionPair,
        poll_interval: Duration,
        stop: StopHandle,
    ) -> Self {
        Self {
            keys,
            detector: KeyEdgeDetector::new(),
            capturer: RegionCapturer::new(screen),
            session,
            regions,
            poll_interval,
            stop,
            state: LoopState::Running,
            stats: LoopStats::default(),
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn session(&self) -> &SequenceSession {
        &self.session
    }

    /// Samples the key once and handles a trigger if one fires.
    pub fn tick(&mut self) -> TickOutcome {
        let pressed = self.keys.is_pressed();
        if !self.detector.update(pressed) {
            return TickOutcome::Idle;
        }

        self.stats.triggers += 1;
        let index = self.session.next_index();

        match self.capture_pair(index) {
            Ok(pair) => {
                self.stats.pairs_persisted += 1;
                log::info!("Pair {} saved to {}", index, self.session.dir().display());
                TickOutcome::Persisted(pair)
            }
            Err(error) => {
                self.stats.pairs_dropped += 1;
                log::warn!("Pair {} dropped: {}", index, error);
                TickOutcome::Dropped { index, error }
            }
        }
    }

    fn capture_pair(&mut self, index: u32) -> Result<PersistedPair, TriggerError> {
        // Player first; labeling tools rely on this order
        let player = self.capturer.capture(&self.regions.player)?;
        let opponent = self.capturer.capture(&self.regions.opponent)?;
        Ok(self.session.persist_pair(index, &player, &opponent)?)
    }

    /// Runs ticks until a stop is requested, then returns the counters.
    pub fn run(&mut self) -> LoopStats {
        log::info!(
            "Capture loop started (session {}, polling every {} ms)",
            self.session.id(),
            self.poll_interval.as_millis()
        );

        while !self.stop.is_stop_requested() {
            let started = Instant::now();
            self.tick();
            if let Some(remaining) = self.poll_interval.checked_sub(started.elapsed()) {
                thread::sleep(remaining);
            }
        }

        self.state = LoopState::Stopped;
        log::info!(
            "Capture loop stopped: {} triggers, {} pairs saved, {} dropped",
            self.stats.triggers,
            self.stats.pairs_persisted,
            self.stats.pairs_dropped
        );
        self.stats
    }
}

/// Watches a key on a background thread and requests a stop when it goes down.
///
/// The thread also exits once a stop has been requested by someone else.
pub fn spawn_stop_watcher<K>(mut key: K, stop: StopHandle, period: Duration) -> JoinHandle<()>
where
    K: KeySource + Send + 'static,
{
    thread::spawn(move || {
        while !stop.is_stop_requested() {
            if key.is_pressed() {
                log::info!("Stop key pressed");
                stop.request_stop();
                break;
            }
            thread::sleep(period);
        }
    })
}
