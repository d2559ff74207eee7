//! `run` subcommand — drive the LED worker, writing frames to stdout.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use livegcode_lib::sink::FixedActivity;

use super::lighting::{LedWorker, WorkerState};
use super::{ConfigChannel, RUNNING, Result, WriterSink};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

pub(super) fn cmd_run(
    config_path: Option<&Path>,
    printing: bool,
    frames: Option<u64>,
) -> Result<()> {
    let config = super::load_config(config_path);
    let channel = Arc::new(ConfigChannel::from_config(&config));
    let probe = Arc::new(FixedActivity::new(printing));
    let sink = Arc::new(WriterSink::new(std::io::stdout()));

    let mut worker = LedWorker::spawn_limited(channel, probe, sink, config.worker, frames)?;
    log::info!(
        "[run] LED worker started ({} LEDs, mode {}, printing: {printing})",
        config.lighting.led_count,
        config.lighting.mode
    );
    if frames.is_none() {
        eprintln!("Running. Press Ctrl+C to stop.");
    }

    // The worker enforces the frame limit itself and stops when it is reached
    while RUNNING.load(Ordering::SeqCst) && worker.state() != WorkerState::Stopped {
        std::thread::sleep(POLL_INTERVAL);
    }

    worker.stop();
    log::info!("[run] stopped after {} frame(s)", worker.frames_sent());
    Ok(())
}
