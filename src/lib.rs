//! Bubble Tones
//!
//! A terminal bar-chart animation of bubble sort. The sort runs once up front
//! and records every swap; the recorded steps are then replayed on a fixed
//! cadence, redrawing the chart and sounding two tones per step.

pub mod config;
pub mod graphics;
pub mod replay;
pub mod sequence;
pub mod sorter;
pub mod sound;
pub mod visualizer;

// Re-export core types for convenience
pub use crate::error::{Result, VisualizerError};
pub use config::{AudioConfig, VisualizerConfig};
pub use graphics::{Bar, BarChart, Highlight};
pub use replay::{ReplayState, Replayer, TickOutcome};
pub use sorter::{apply_steps, record_bubble_sort, Step, StepKind, StepQueue};
pub use sound::{RecordingEmitter, Synthesizer, Tone, ToneEmitter};
pub use visualizer::{Command, Visualizer};

/// Core error handling types for the visualizer
pub mod error {
    use std::fmt;

    /// Result type for visualizer operations
    pub type Result<T> = std::result::Result<T, VisualizerError>;

    /// Every failure the crate can report
    #[derive(Debug, Clone, PartialEq)]
    pub enum VisualizerError {
        // Audio errors (absorbed by the synthesizer, never reach the replayer)
        AudioUnavailable(String),
        AudioWrite(String),

        // Front-end errors
        InvalidConfig { key: String, value: String },
        UnknownCommand(String),
    }

    impl fmt::Display for VisualizerError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                VisualizerError::AudioUnavailable(reason) => {
                    write!(f, "Audio output unavailable: {}", reason)
                }
                VisualizerError::AudioWrite(reason) => write!(f, "Audio write failed: {}", reason),
                VisualizerError::InvalidConfig { key, value } => {
                    write!(f, "Invalid value for {}: {:?}", key, value)
                }
                VisualizerError::UnknownCommand(cmd) => write!(f, "Unknown command: {}", cmd),
            }
        }
    }

    impl std::error::Error for VisualizerError {}
}
