//! Sound system for the visualizer
//!
//! Each replayed step sounds two short tones whose pitch follows the values
//! being moved. Tones go through the [`ToneEmitter`] trait; the real emitter
//! is a small software synthesizer that mixes sine voices into 16-bit PCM and
//! streams them to a configured sink (a file, or a FIFO read by a player).

use crate::config::AudioConfig;
use crate::error::{Result, VisualizerError};
use std::f64::consts::TAU;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Frequency of a tone for value 0.0
pub const BASE_FREQUENCY_HZ: f64 = 200.0;
/// Frequency added across the full [0, 1) value range
pub const FREQUENCY_SPAN_HZ: f64 = 500.0;

/// Map a sequence value to a tone frequency
pub fn frequency_for(value: f64) -> f64 {
    BASE_FREQUENCY_HZ + value * FREQUENCY_SPAN_HZ
}

/// A request to sound one tone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency_hz: f64,
    pub duration: Duration,
}

impl Tone {
    /// Tone whose pitch represents `value`
    pub fn for_value(value: f64, duration: Duration) -> Self {
        Self {
            frequency_hz: frequency_for(value),
            duration,
        }
    }
}

/// Anything that can sound tones for the replayer.
///
/// Emission is fire-and-forget: implementations never report failure back.
pub trait ToneEmitter {
    /// Start a tone immediately
    fn emit(&mut self, tone: Tone);

    /// Let the emitter advance its own clock up to `now`
    fn pump(&mut self, _now: Instant) {}

    /// True while the emitter has sound in flight and wants to be pumped
    fn is_sounding(&self) -> bool {
        false
    }

    /// Release any output resources
    fn shutdown(&mut self) {}
}

/// Emitter that only remembers what it was asked to play
#[derive(Debug, Default, Clone)]
pub struct RecordingEmitter {
    tones: Vec<Tone>,
}

impl RecordingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every tone emitted so far, in order
    pub fn tones(&self) -> &[Tone] {
        &self.tones
    }

    pub fn frequencies(&self) -> Vec<f64> {
        self.tones.iter().map(|t| t.frequency_hz).collect()
    }
}

impl ToneEmitter for RecordingEmitter {
    fn emit(&mut self, tone: Tone) {
        self.tones.push(tone);
    }
}

/// One oscillator with its gain ramp
#[derive(Debug, Clone)]
struct Voice {
    frequency_hz: f64,
    start_gain: f64,
    /// Frames already rendered
    position: u64,
    /// Frames until the scheduled stop
    length: u64,
}

impl Voice {
    fn new(tone: Tone, gain: f32, sample_rate: u32) -> Self {
        let length = (tone.duration.as_secs_f64() * f64::from(sample_rate)).round() as u64;
        Self {
            frequency_hz: tone.frequency_hz,
            start_gain: f64::from(gain),
            position: 0,
            length,
        }
    }

    fn finished(&self) -> bool {
        self.position >= self.length
    }

    /// Next sample of a sine wave whose gain falls linearly to zero
    fn next_sample(&mut self, sample_rate: u32) -> f64 {
        if self.finished() {
            return 0.0;
        }
        let t = self.position as f64 / f64::from(sample_rate);
        let gain = self.start_gain * (1.0 - self.position as f64 / self.length as f64);
        self.position += 1;
        gain * (TAU * self.frequency_hz * t).sin()
    }
}

/// A software audio output: a voice mixer bound to a PCM sink.
///
/// Audio time is measured in frames written since the context opened and
/// runs independently of the replay timer.
#[derive(Debug)]
pub struct AudioContext<W: Write> {
    sink: W,
    sample_rate: u32,
    gain: f32,
    voices: Vec<Voice>,
    opened_at: Instant,
    frames_written: u64,
}

impl AudioContext<BufWriter<File>> {
    /// Open the sink named in `config`
    pub fn open(config: &AudioConfig) -> Result<Self> {
        let path = config
            .output
            .as_ref()
            .ok_or_else(|| VisualizerError::AudioUnavailable("no output configured".to_string()))?;
        let file = open_sink(path).map_err(|e| {
            if is_no_reader(&e) {
                VisualizerError::AudioUnavailable(format!("{}: no reader attached", path.display()))
            } else {
                VisualizerError::AudioUnavailable(format!("{}: {}", path.display(), e))
            }
        })?;
        info!(path = %path.display(), sample_rate = config.sample_rate, "audio context opened");
        Ok(Self::with_sink(BufWriter::new(file), config, Instant::now()))
    }
}

/// Open a sink without waiting for a FIFO reader.
///
/// Once open the descriptor is switched back to blocking writes.
#[cfg(unix)]
fn open_sink(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    use std::os::unix::io::AsRawFd;

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .custom_flags(libc::O_NONBLOCK)
        .open(path)?;
    let fd = file.as_raw_fd();
    // SAFETY: `fd` is a valid descriptor owned by `file` for the whole block.
    let cleared = unsafe {
        let flags = libc::fcntl(fd, libc::F_GETFL);
        flags >= 0 && libc::fcntl(fd, libc::F_SETFL, flags & !libc::O_NONBLOCK) >= 0
    };
    if !cleared {
        return Err(io::Error::last_os_error());
    }
    Ok(file)
}

#[cfg(not(unix))]
fn open_sink(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

/// A write-only open of a FIFO with no reader fails with ENXIO
#[cfg(unix)]
fn is_no_reader(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::ENXIO)
}

#[cfg(not(unix))]
fn is_no_reader(_err: &io::Error) -> bool {
    false
}

impl<W: Write> AudioContext<W> {
    /// Wrap an arbitrary sink, with audio time starting at `now`
    pub fn with_sink(sink: W, config: &AudioConfig, now: Instant) -> Self {
        Self {
            sink,
            sample_rate: config.sample_rate,
            gain: config.tone_gain,
            voices: Vec::new(),
            opened_at: now,
            frames_written: 0,
        }
    }

    /// Create a voice for `tone`, started now and stopping on its own
    pub fn start_tone(&mut self, tone: Tone) {
        self.voices.push(Voice::new(tone, self.gain, self.sample_rate));
    }

    /// Number of voices still sounding
    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| !v.finished()).count()
    }

    /// Mix the next `frames` samples and retire voices that have stopped
    pub fn render(&mut self, frames: usize) -> Vec<f32> {
        let rate = self.sample_rate;
        let mut out = Vec::with_capacity(frames);
        for _ in 0..frames {
            let mixed: f64 = self.voices.iter_mut().map(|v| v.next_sample(rate)).sum();
            out.push(mixed.clamp(-1.0, 1.0) as f32);
        }
        self.voices.retain(|v| !v.finished());
        out
    }

    /// Write audio up to `now` and flush it to the sink.
    ///
    /// Only the span in which some voice still sounds is rendered; silence
    /// is never written, the stream clock simply skips ahead.
    pub fn pump(&mut self, now: Instant) -> Result<()> {
        let elapsed = now.saturating_duration_since(self.opened_at);
        let target = (elapsed.as_secs_f64() * f64::from(self.sample_rate)) as u64;
        if target <= self.frames_written {
            return Ok(());
        }
        if self.voices.is_empty() {
            self.frames_written = target;
            return Ok(());
        }

        let remaining = self
            .voices
            .iter()
            .map(|v| v.length.saturating_sub(v.position))
            .max()
            .unwrap_or(0);
        let frames = (target - self.frames_written).min(remaining) as usize;
        let samples = self.render(frames);
        let mut bytes = Vec::with_capacity(samples.len() * 2);
        for sample in samples {
            let pcm = (sample * f32::from(i16::MAX)) as i16;
            bytes.extend_from_slice(&pcm.to_le_bytes());
        }
        self.sink
            .write_all(&bytes)
            .map_err(|e| VisualizerError::AudioWrite(e.to_string()))?;
        self.frames_written = target;
        self.flush()
    }

    /// Flush pending bytes to the sink
    pub fn flush(&mut self) -> Result<()> {
        self.sink
            .flush()
            .map_err(|e| VisualizerError::AudioWrite(e.to_string()))
    }

    /// Give back the sink
    pub fn into_sink(self) -> W {
        self.sink
    }
}

/// Lifecycle of the synthesizer's output
#[derive(Debug)]
enum AudioState {
    /// Nothing opened yet; the first tone tries
    Unopened,
    Ready(AudioContext<BufWriter<File>>),
    /// Output failed or was shut down; tones are dropped
    Disabled,
}

/// Tone emitter backed by a lazily opened [`AudioContext`]
#[derive(Debug)]
pub struct Synthesizer {
    config: AudioConfig,
    state: AudioState,
}

impl Synthesizer {
    pub fn new(config: AudioConfig) -> Self {
        Self {
            config,
            state: AudioState::Unopened,
        }
    }

    /// True once output has been given up for this session
    pub fn is_disabled(&self) -> bool {
        matches!(self.state, AudioState::Disabled)
    }

    fn context(&mut self) -> Option<&mut AudioContext<BufWriter<File>>> {
        if let AudioState::Unopened = self.state {
            self.state = match AudioContext::open(&self.config) {
                Ok(ctx) => AudioState::Ready(ctx),
                Err(e) => {
                    warn!(error = %e, "audio disabled for this session");
                    AudioState::Disabled
                }
            };
        }
        match &mut self.state {
            AudioState::Ready(ctx) => Some(ctx),
            _ => None,
        }
    }
}

impl ToneEmitter for Synthesizer {
    fn emit(&mut self, tone: Tone) {
        if let Some(ctx) = self.context() {
            ctx.start_tone(tone);
        }
    }

    fn pump(&mut self, now: Instant) {
        if let AudioState::Ready(ctx) = &mut self.state {
            if let Err(e) = ctx.pump(now) {
                warn!(error = %e, "audio disabled for this session");
                self.state = AudioState::Disabled;
            }
        }
    }

    fn is_sounding(&self) -> bool {
        match &self.state {
            AudioState::Ready(ctx) => ctx.active_voices() > 0,
            _ => false,
        }
    }

    fn shutdown(&mut self) {
        if let AudioState::Ready(mut ctx) = std::mem::replace(&mut self.state, AudioState::Disabled) {
            let _ = ctx.pump(Instant::now());
            if let Err(e) = ctx.flush() {
                debug!(error = %e, "audio flush on shutdown failed");
            }
            info!("audio context released");
        }
    }
}

impl Drop for Synthesizer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AudioConfig {
        AudioConfig {
            sample_rate: 1000,
            ..AudioConfig::default()
        }
    }

    #[test]
    fn test_frequency_mapping() {
        assert_eq!(frequency_for(0.0), 200.0);
        assert_eq!(frequency_for(0.5), 450.0);
        assert!((frequency_for(0.999) - 699.5).abs() < 1e-9);
    }

    #[test]
    fn test_recording_emitter() {
        let mut rec = RecordingEmitter::new();
        rec.emit(Tone::for_value(0.2, Duration::from_millis(100)));
        assert_eq!(rec.frequencies(), vec![300.0]);
        assert_eq!(rec.tones()[0].duration, Duration::from_millis(100));
    }

    #[test]
    fn test_voice_ramps_to_silence() {
        let tone = Tone::for_value(0.5, Duration::from_millis(100));
        let mut voice = Voice::new(tone, 0.01, 1000);
        assert_eq!(voice.length, 100);
        let samples: Vec<f64> = (0..100).map(|_| voice.next_sample(1000)).collect();
        assert!(voice.finished());
        assert!(samples.iter().all(|s| s.abs() <= 0.01));
        // Gain at the tail is far below the head
        let head = samples[..10].iter().map(|s| s.abs()).fold(0.0, f64::max);
        let tail = samples[90..].iter().map(|s| s.abs()).fold(0.0, f64::max);
        assert!(tail < head);
        assert_eq!(voice.next_sample(1000), 0.0);
    }

    #[test]
    fn test_render_retires_stopped_voices() {
        let mut ctx = AudioContext::with_sink(Vec::new(), &test_config(), Instant::now());
        ctx.start_tone(Tone::for_value(0.1, Duration::from_millis(100)));
        ctx.start_tone(Tone::for_value(0.9, Duration::from_millis(100)));
        assert_eq!(ctx.active_voices(), 2);
        let samples = ctx.render(50);
        assert_eq!(samples.len(), 50);
        assert_eq!(ctx.active_voices(), 2);
        ctx.render(50);
        assert_eq!(ctx.active_voices(), 0);
    }

    #[test]
    fn test_pump_writes_pcm_frames() {
        let start = Instant::now();
        let mut ctx = AudioContext::with_sink(Vec::new(), &test_config(), start);
        ctx.start_tone(Tone::for_value(0.5, Duration::from_secs(1)));
        ctx.pump(start + Duration::from_millis(500)).unwrap();
        let sink = ctx.into_sink();
        // 500 frames at 1 kHz, two bytes each
        assert_eq!(sink.len(), 1000);
    }

    #[test]
    fn test_pump_skips_silence() {
        let start = Instant::now();
        let mut ctx = AudioContext::with_sink(Vec::new(), &test_config(), start);
        ctx.pump(start + Duration::from_secs(5)).unwrap();
        assert!(ctx.into_sink().is_empty());
    }

    #[test]
    fn test_pump_renders_only_sounding_span() {
        let start = Instant::now();
        let mut ctx = AudioContext::with_sink(Vec::new(), &test_config(), start);
        ctx.start_tone(Tone::for_value(0.5, Duration::from_millis(100)));
        // A long gap renders the 100 frames of the tone and nothing more
        ctx.pump(start + Duration::from_secs(60)).unwrap();
        assert_eq!(ctx.active_voices(), 0);
        assert_eq!(ctx.into_sink().len(), 200);
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("bubble-tones-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_synthesizer_flushes_tone_before_shutdown() {
        let path = temp_path("flush.pcm");
        let config = AudioConfig {
            sample_rate: 1000,
            ..AudioConfig::with_output(&path)
        };
        let mut synth = Synthesizer::new(config);
        synth.emit(Tone::for_value(0.5, Duration::from_millis(100)));
        assert!(matches!(synth.state, AudioState::Ready(_)));

        let mut now = Instant::now();
        while synth.is_sounding() {
            now += Duration::from_millis(20);
            synth.pump(now);
        }
        // The whole tone is on disk while the synthesizer is still open
        let written = std::fs::metadata(&path).unwrap().len();
        assert_eq!(written, 200);

        synth.shutdown();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), written);
        let _ = std::fs::remove_file(&path);
    }

    #[cfg(unix)]
    #[test]
    fn test_fifo_without_reader_does_not_block() {
        use std::ffi::CString;
        use std::os::unix::ffi::OsStrExt;
        use std::sync::mpsc;

        let path = temp_path("no-reader.fifo");
        let _ = std::fs::remove_file(&path);
        let c_path = CString::new(path.as_os_str().as_bytes()).unwrap();
        assert_eq!(unsafe { libc::mkfifo(c_path.as_ptr(), 0o600) }, 0);

        let (tx, rx) = mpsc::channel();
        let fifo = path.clone();
        std::thread::spawn(move || {
            let mut synth = Synthesizer::new(AudioConfig::with_output(fifo));
            synth.emit(Tone::for_value(0.3, Duration::from_millis(100)));
            let _ = tx.send(synth.is_disabled());
        });

        let disabled = rx.recv_timeout(Duration::from_secs(2));
        let _ = std::fs::remove_file(&path);
        assert_eq!(disabled, Ok(true));
    }

    #[test]
    fn test_synthesizer_without_output_disables_quietly() {
        let mut synth = Synthesizer::new(AudioConfig::default());
        assert!(!synth.is_disabled());
        synth.emit(Tone::for_value(0.3, Duration::from_millis(100)));
        assert!(synth.is_disabled());
        assert!(!synth.is_sounding());
        // Further tones are dropped without error
        synth.emit(Tone::for_value(0.4, Duration::from_millis(100)));
        synth.pump(Instant::now());
    }

    #[test]
    fn test_synthesizer_unwritable_path_disables() {
        let config = AudioConfig::with_output("/nonexistent-dir/bubble-tones.pcm");
        let mut synth = Synthesizer::new(config);
        synth.emit(Tone::for_value(0.3, Duration::from_millis(100)));
        assert!(synth.is_disabled());
    }
}
