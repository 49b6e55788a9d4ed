use bubble_tones::{Command, TickOutcome, Visualizer, VisualizerConfig};
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// How often the audio clock is advanced while tones are sounding
const AUDIO_PUMP_INTERVAL: Duration = Duration::from_millis(20);

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let config = match VisualizerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("Bubble Tones v0.1.0");
    println!("Type 'SORT' to start, 'INIT' for new values, 'HELP' for help\n");

    let mut visualizer = Visualizer::new(config);
    let lines = spawn_stdin_reader();

    redraw(&visualizer);
    prompt();
    run(&mut visualizer, &lines);
    visualizer.shutdown();
    println!("Goodbye!");
    ExitCode::SUCCESS
}

/// Forward stdin lines over a channel so the main loop can wait on both
/// input and the replay deadline
fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn run(visualizer: &mut Visualizer, lines: &Receiver<String>) {
    loop {
        let now = Instant::now();
        let outcome = visualizer.tick(now);
        if outcome.needs_redraw() {
            redraw(visualizer);
            if outcome == TickOutcome::Finished {
                println!("{}", visualizer.status());
                prompt();
            }
        }

        let input = match wait_deadline(visualizer, now) {
            Some(deadline) => match lines.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                Ok(line) => line,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return,
            },
            None => match lines.recv() {
                Ok(line) => line,
                Err(_) => return,
            },
        };

        if input.trim().is_empty() {
            if !visualizer.is_playing() {
                prompt();
            }
            continue;
        }

        match input.parse::<Command>() {
            Ok(Command::Quit) => return,
            Ok(command) => handle_command(visualizer, command),
            Err(e) => println!("Error: {}", e),
        }
        if !visualizer.is_playing() {
            prompt();
        }
    }
}

/// Earliest instant the loop must wake without input
fn wait_deadline(visualizer: &Visualizer, now: Instant) -> Option<Instant> {
    let audio = visualizer.is_sounding().then(|| now + AUDIO_PUMP_INTERVAL);
    match (visualizer.next_deadline(), audio) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn handle_command(visualizer: &mut Visualizer, command: Command) {
    match command {
        Command::Initialize => {
            visualizer.initialize();
            redraw(visualizer);
        }
        Command::StartSorting => {
            if !visualizer.start_sorting(Instant::now()) {
                if visualizer.is_playing() {
                    println!("Already sorting");
                } else {
                    println!("Nothing to sort");
                }
            }
        }
        Command::Show => redraw(visualizer),
        Command::Status => println!("{}", visualizer.status()),
        Command::Help => print_help(),
        Command::Quit => {}
    }
}

fn redraw(visualizer: &Visualizer) {
    // Clear screen and home the cursor before each frame
    println!("\x1b[2J\x1b[H{}", visualizer.frame());
    let _ = io::stdout().flush();
}

fn prompt() {
    print!("> ");
    let _ = io::stdout().flush();
}

fn print_help() {
    println!("Bubble Tones - Available Commands:");
    println!();
    println!("  INIT (I)                 - Generate a new random sequence");
    println!("  SORT (S)                 - Animate bubble sort on the sequence");
    println!("  SHOW                     - Redraw the chart");
    println!("  STATUS                   - Show what the visualizer is doing");
    println!("  HELP                     - Show this help");
    println!("  EXIT                     - Quit");
    println!();
    println!("Environment:");
    println!("  BUBBLE_TONES_AUDIO_OUT   - File or FIFO receiving s16le mono PCM");
    println!("  BUBBLE_TONES_SAMPLE_RATE - PCM sample rate (default 44100)");
    println!("  BUBBLE_TONES_SEED        - Fixed seed for reproducible sequences");
    println!("  BUBBLE_TONES_NO_COLOR    - Disable coloured highlights");
    println!("  RUST_LOG                 - Log filter (logs go to stderr)");
    println!();
    println!("Example audio setup:");
    println!("  mkfifo /tmp/tones && aplay -f S16_LE -r 44100 -c 1 /tmp/tones &");
    println!("  BUBBLE_TONES_AUDIO_OUT=/tmp/tones bubble-tones");
    println!();
}
