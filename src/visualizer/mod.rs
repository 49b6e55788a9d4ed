//! The visualizer ties the pieces together
//!
//! It owns the live sequence, the replayer, the tone emitter and the RNG,
//! and exposes the two user actions: Initialize and Start Sorting.

use crate::config::VisualizerConfig;
use crate::error::{Result, VisualizerError};
use crate::graphics::BarChart;
use crate::replay::{Replayer, TickOutcome};
use crate::sequence;
use crate::sorter::{record_bubble_sort, Step};
use crate::sound::{Synthesizer, ToneEmitter};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, info};

/// Console commands understood by the front-end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Initialize,
    StartSorting,
    Show,
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = VisualizerError;

    fn from_str(input: &str) -> Result<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "init" | "i" | "initialize" => Ok(Command::Initialize),
            "sort" | "s" | "start" => Ok(Command::StartSorting),
            "show" => Ok(Command::Show),
            "status" => Ok(Command::Status),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            _ => Err(VisualizerError::UnknownCommand(input.trim().to_string())),
        }
    }
}

/// Bubble sort visualizer
#[derive(Debug)]
pub struct Visualizer<E: ToneEmitter = Synthesizer> {
    config: VisualizerConfig,
    values: Vec<f64>,
    replayer: Replayer,
    emitter: E,
    rng: StdRng,
    chart: BarChart,
}

impl Visualizer<Synthesizer> {
    /// Visualizer with the synthesizer described by `config.audio`
    pub fn new(config: VisualizerConfig) -> Self {
        let synth = Synthesizer::new(config.audio.clone());
        Self::with_emitter(config, synth)
    }
}

impl<E: ToneEmitter> Visualizer<E> {
    /// Visualizer sounding its tones through `emitter`.
    ///
    /// A first sequence is generated straight away.
    pub fn with_emitter(config: VisualizerConfig, emitter: E) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let chart = BarChart::new(config.chart_rows).with_color(config.color);
        let replayer = Replayer::new(config.step_delay, config.audio.tone_duration);
        let mut visualizer = Self {
            config,
            values: Vec::new(),
            replayer,
            emitter,
            rng,
            chart,
        };
        visualizer.initialize();
        visualizer
    }

    /// Generate a fresh sequence, cancelling any replay in progress
    pub fn initialize(&mut self) {
        let values = sequence::generate(&mut self.rng, self.config.array_size);
        self.load(values);
    }

    /// Replace the sequence with `values`, cancelling any replay in progress
    pub fn load(&mut self, values: Vec<f64>) {
        if self.replayer.cancel() {
            info!("replay cancelled by re-initialization");
        }
        debug!(len = values.len(), "sequence loaded");
        self.values = values;
    }

    /// Start Sorting is offered only when idle with something to sort
    pub fn can_start(&self) -> bool {
        !self.replayer.is_playing() && !self.values.is_empty()
    }

    /// Record the sort of the current sequence and begin replaying it
    pub fn start_sorting(&mut self, now: Instant) -> bool {
        if !self.can_start() {
            return false;
        }
        let steps = record_bubble_sort(&self.values);
        info!(len = self.values.len(), steps = steps.len(), "sorting started");
        self.replayer.start(steps, now)
    }

    /// Advance the replay and the audio clock to `now`
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        let outcome = self.replayer.tick(now, &mut self.values, &mut self.emitter);
        if outcome == TickOutcome::Finished {
            info!("sorting finished");
        }
        self.emitter.pump(now);
        outcome
    }

    /// When the replay next needs a tick
    pub fn next_deadline(&self) -> Option<Instant> {
        self.replayer.next_deadline()
    }

    /// True while the emitter still has tones to play out
    pub fn is_sounding(&self) -> bool {
        self.emitter.is_sounding()
    }

    pub fn is_playing(&self) -> bool {
        self.replayer.is_playing()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn last_step(&self) -> Option<&Step> {
        self.replayer.last_step()
    }

    pub fn config(&self) -> &VisualizerConfig {
        &self.config
    }

    pub fn emitter(&self) -> &E {
        &self.emitter
    }

    /// Current chart
    pub fn frame(&self) -> String {
        self.chart.render(&self.values, self.last_step())
    }

    /// One-line summary of where the visualizer is
    pub fn status(&self) -> String {
        if self.replayer.is_playing() {
            format!(
                "Sorting... {} values, {} steps remaining",
                self.values.len(),
                self.replayer.remaining()
            )
        } else if sequence::is_sorted(&self.values) {
            format!("Idle: {} values, sorted", self.values.len())
        } else {
            format!("Idle: {} values, ready to sort", self.values.len())
        }
    }

    /// Cancel any replay and release the audio output
    pub fn shutdown(&mut self) {
        self.replayer.cancel();
        self.emitter.shutdown();
    }
}
