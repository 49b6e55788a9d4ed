//! Configuration for the visualizer and its audio output
//!
//! Array size and step delay are the two knobs of the animation itself. Audio
//! settings describe where synthesized PCM goes and how it sounds.

use crate::error::{Result, VisualizerError};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Number of bars generated by default
pub const DEFAULT_ARRAY_SIZE: usize = 50;
/// Delay between replayed steps
pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(50);
/// Default chart height in terminal rows
pub const DEFAULT_CHART_ROWS: usize = 20;

/// PCM sample rate used when none is configured
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
/// Length of each tone
pub const DEFAULT_TONE_DURATION: Duration = Duration::from_millis(100);
/// Starting gain of each tone, ramped linearly to zero
pub const DEFAULT_TONE_GAIN: f32 = 0.01;

pub const ENV_AUDIO_OUT: &str = "BUBBLE_TONES_AUDIO_OUT";
pub const ENV_SAMPLE_RATE: &str = "BUBBLE_TONES_SAMPLE_RATE";
pub const ENV_SEED: &str = "BUBBLE_TONES_SEED";
pub const ENV_NO_COLOR: &str = "BUBBLE_TONES_NO_COLOR";

/// Settings for the animation
#[derive(Debug, Clone, PartialEq)]
pub struct VisualizerConfig {
    /// Number of values generated on Initialize
    pub array_size: usize,
    /// Wait between two replayed steps
    pub step_delay: Duration,
    /// Chart height in rows
    pub chart_rows: usize,
    /// Emit ANSI colour codes when rendering
    pub color: bool,
    /// Fixed RNG seed for reproducible sequences
    pub seed: Option<u64>,
    pub audio: AudioConfig,
}

impl VisualizerConfig {
    /// Create a configuration with the two animation parameters
    pub fn new(array_size: usize, step_delay: Duration) -> Self {
        Self {
            array_size,
            step_delay,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn with_chart_rows(mut self, rows: usize) -> Self {
        self.chart_rows = rows.max(1);
        self
    }

    /// Build a configuration from the process environment
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(seed) = parse_env::<u64>(ENV_SEED)? {
            config.seed = Some(seed);
        }
        if env::var_os(ENV_NO_COLOR).is_some() {
            config.color = false;
        }
        config.audio = AudioConfig::from_env()?;
        Ok(config)
    }
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            array_size: DEFAULT_ARRAY_SIZE,
            step_delay: DEFAULT_STEP_DELAY,
            chart_rows: DEFAULT_CHART_ROWS,
            color: true,
            seed: None,
            audio: AudioConfig::default(),
        }
    }
}

/// Settings for the software synthesizer
#[derive(Debug, Clone, PartialEq)]
pub struct AudioConfig {
    /// Path of the PCM sink (file or FIFO); `None` disables audio
    pub output: Option<PathBuf>,
    pub sample_rate: u32,
    pub tone_duration: Duration,
    pub tone_gain: f32,
}

impl AudioConfig {
    /// Audio routed to the given sink path
    pub fn with_output(path: impl Into<PathBuf>) -> Self {
        Self {
            output: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn from_env() -> Result<Self> {
        let mut audio = Self {
            output: env::var_os(ENV_AUDIO_OUT).map(PathBuf::from),
            ..Self::default()
        };
        if let Some(rate) = parse_env::<u32>(ENV_SAMPLE_RATE)? {
            if rate == 0 {
                return Err(VisualizerError::InvalidConfig {
                    key: ENV_SAMPLE_RATE.to_string(),
                    value: rate.to_string(),
                });
            }
            audio.sample_rate = rate;
        }
        Ok(audio)
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            output: None,
            sample_rate: DEFAULT_SAMPLE_RATE,
            tone_duration: DEFAULT_TONE_DURATION,
            tone_gain: DEFAULT_TONE_GAIN,
        }
    }
}

/// Read and parse an optional environment variable
fn parse_env<T: FromStr>(key: &str) -> Result<Option<T>> {
    match env::var(key) {
        Ok(raw) => parse_value(key, &raw).map(Some),
        Err(_) => Ok(None),
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| VisualizerError::InvalidConfig {
            key: key.to_string(),
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cadence() {
        let config = VisualizerConfig::default();
        assert_eq!(config.array_size, 50);
        assert_eq!(config.step_delay, Duration::from_millis(50));
        assert_eq!(config.audio.tone_duration, Duration::from_millis(100));
        assert!(config.audio.output.is_none());
    }

    #[test]
    fn test_new_keeps_other_defaults() {
        let config = VisualizerConfig::new(8, Duration::from_millis(5)).with_seed(7);
        assert_eq!(config.array_size, 8);
        assert_eq!(config.step_delay, Duration::from_millis(5));
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.chart_rows, DEFAULT_CHART_ROWS);
    }

    #[test]
    fn test_chart_rows_never_zero() {
        let config = VisualizerConfig::default().with_chart_rows(0);
        assert_eq!(config.chart_rows, 1);
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value::<u32>("RATE", " 8000 ").unwrap(), 8000);
        assert_eq!(
            parse_value::<u64>("SEED", "abc"),
            Err(VisualizerError::InvalidConfig {
                key: "SEED".to_string(),
                value: "abc".to_string(),
            })
        );
    }
}
