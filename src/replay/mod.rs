//! Step replay
//!
//! Applies a recorded step queue to the live sequence, one step per delay.
//! The replayer never sleeps; the owner polls [`Replayer::tick`] and waits
//! until [`Replayer::next_deadline`] in between. Dropping back to `Idle`
//! drops the deadline with it, so a cancelled replay leaves nothing behind.

use crate::sorter::{Step, StepQueue};
use crate::sound::{Tone, ToneEmitter};
use std::time::{Duration, Instant};
use tracing::debug;

/// Replayer state
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayState {
    Idle,
    Playing {
        /// Steps not yet applied
        steps: StepQueue,
        /// When the next step is due
        deadline: Instant,
    },
}

/// Result of one [`Replayer::tick`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing to do: not playing
    Idle,
    /// Playing, but the next step is not due yet
    Waiting,
    /// A step was applied; redraw
    Applied(Step),
    /// The queue ran out; back to Idle with highlights cleared
    Finished,
}

impl TickOutcome {
    /// Whether the display needs redrawing after this tick
    pub fn needs_redraw(&self) -> bool {
        matches!(self, TickOutcome::Applied(_) | TickOutcome::Finished)
    }
}

/// Timer-driven state machine replaying sort steps
#[derive(Debug, Clone)]
pub struct Replayer {
    state: ReplayState,
    step_delay: Duration,
    tone_duration: Duration,
    last_step: Option<Step>,
}

impl Replayer {
    pub fn new(step_delay: Duration, tone_duration: Duration) -> Self {
        Self {
            state: ReplayState::Idle,
            step_delay,
            tone_duration,
            last_step: None,
        }
    }

    pub fn state(&self) -> &ReplayState {
        &self.state
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, ReplayState::Playing { .. })
    }

    /// Step applied most recently in the current replay
    pub fn last_step(&self) -> Option<&Step> {
        self.last_step.as_ref()
    }

    /// Steps still queued
    pub fn remaining(&self) -> usize {
        match &self.state {
            ReplayState::Playing { steps, .. } => steps.len(),
            ReplayState::Idle => 0,
        }
    }

    /// When the next tick has work to do
    pub fn next_deadline(&self) -> Option<Instant> {
        match &self.state {
            ReplayState::Playing { deadline, .. } => Some(*deadline),
            ReplayState::Idle => None,
        }
    }

    /// Begin replaying `steps`; the first one is due at `now`.
    ///
    /// Returns false, leaving the current replay alone, when already playing.
    pub fn start(&mut self, steps: StepQueue, now: Instant) -> bool {
        if self.is_playing() {
            return false;
        }
        debug!(steps = steps.len(), "replay started");
        self.last_step = None;
        self.state = ReplayState::Playing {
            steps,
            deadline: now,
        };
        true
    }

    /// Abandon any replay in progress. Returns true if one was pending.
    pub fn cancel(&mut self) -> bool {
        let was_playing = self.is_playing();
        if was_playing {
            debug!(remaining = self.remaining(), "replay cancelled");
        }
        self.state = ReplayState::Idle;
        self.last_step = None;
        was_playing
    }

    /// Apply the next step if it is due.
    ///
    /// `values` must be the sequence the queue was recorded from, with every
    /// earlier step of the queue already applied.
    pub fn tick<E>(&mut self, now: Instant, values: &mut [f64], emitter: &mut E) -> TickOutcome
    where
        E: ToneEmitter + ?Sized,
    {
        let ReplayState::Playing { steps, deadline } = &mut self.state else {
            return TickOutcome::Idle;
        };
        if now < *deadline {
            return TickOutcome::Waiting;
        }

        let Some(step) = steps.pop_front() else {
            debug!("replay finished");
            self.state = ReplayState::Idle;
            self.last_step = None;
            return TickOutcome::Finished;
        };

        step.apply(values);
        for &index in &step.indices {
            emitter.emit(Tone::for_value(values[index], self.tone_duration));
        }
        *deadline = now + self.step_delay;
        self.last_step = Some(step);
        TickOutcome::Applied(step)
    }
}
