//! LED worker — background thread emitting lighting frames into the command sink.
//!
//! The worker owns its [`WorkerState`]; callers change it only through
//! [`LedWorker::pause`], [`LedWorker::resume`] and [`LedWorker::stop`]. Every
//! sleep in the loop waits on a condition variable tied to that state, so a
//! control call wakes the thread at once instead of after the current delay.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::render::render_frame;
use crate::channel::ConfigChannel;
use crate::sink::{ActivityProbe, CommandBatch, CommandSink};

/// Worker lifecycle. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Running,
    Paused,
    Stopped,
}

/// Loop cadence, configurable from the `[worker]` settings section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerTiming {
    /// Delay between frames while idle. Short, for smooth animation.
    #[serde(default = "default_idle_ms")]
    pub idle_interval_ms: u64,
    /// Delay between frames while printing. Long, to leave the serial line
    /// to the print job.
    #[serde(default = "default_printing_ms")]
    pub printing_interval_ms: u64,
    /// Re-check interval while paused.
    #[serde(default = "default_paused_ms")]
    pub paused_interval_ms: u64,
    /// Delay after a failed frame.
    #[serde(default = "default_backoff_ms")]
    pub error_backoff_ms: u64,
}

fn default_idle_ms() -> u64 {
    50
}
fn default_printing_ms() -> u64 {
    500
}
fn default_paused_ms() -> u64 {
    100
}
fn default_backoff_ms() -> u64 {
    1000
}

impl Default for WorkerTiming {
    fn default() -> Self {
        WorkerTiming {
            idle_interval_ms: default_idle_ms(),
            printing_interval_ms: default_printing_ms(),
            paused_interval_ms: default_paused_ms(),
            error_backoff_ms: default_backoff_ms(),
        }
    }
}

impl WorkerTiming {
    /// Delay after a successful frame.
    pub fn frame_interval(&self, is_printing: bool) -> Duration {
        if is_printing {
            Duration::from_millis(self.printing_interval_ms)
        } else {
            Duration::from_millis(self.idle_interval_ms)
        }
    }

    pub fn paused_interval(&self) -> Duration {
        Duration::from_millis(self.paused_interval_ms)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }
}

/// State shared between the worker thread and its handle.
struct Control {
    state: Mutex<WorkerState>,
    changed: Condvar,
    frames: AtomicU64,
}

impl Control {
    fn new() -> Self {
        Self {
            state: Mutex::new(WorkerState::Running),
            changed: Condvar::new(),
            frames: AtomicU64::new(0),
        }
    }

    fn state(&self) -> WorkerState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move from `from` to `to`. Returns false if the worker was not in `from`.
    fn transition(&self, from: WorkerState, to: WorkerState) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != from {
            return false;
        }
        *state = to;
        self.changed.notify_all();
        true
    }

    fn stop(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *state = WorkerState::Stopped;
        self.changed.notify_all();
    }

    /// Sleep up to `timeout`, returning early once the state leaves `observed`.
    fn wait_while(&self, observed: WorkerState, timeout: Duration) {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = self
            .changed
            .wait_timeout_while(state, timeout, |s| *s == observed)
            .unwrap_or_else(PoisonError::into_inner);
    }
}

fn now_ms() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

/// One frame: query activity, render, push. Returns the activity flag.
fn run_frame(
    channel: &ConfigChannel,
    probe: &impl ActivityProbe,
    sink: &impl CommandSink,
) -> crate::error::Result<bool> {
    let printing = probe.is_printing()?;
    let lighting = channel.snapshot_lighting();
    let commands = render_frame(&lighting, now_ms(), printing)?;
    log::debug!(
        "LED frame: {} commands ({})",
        commands.len(),
        if printing { "printing" } else { "idle" }
    );
    sink.send_batch(&CommandBatch::quiet(commands))?;
    Ok(printing)
}

fn run_loop(
    control: &Control,
    channel: &ConfigChannel,
    probe: &impl ActivityProbe,
    sink: &impl CommandSink,
    timing: WorkerTiming,
    frame_limit: Option<u64>,
) {
    log::info!("LED worker started");
    if frame_limit == Some(0) {
        control.stop();
    }
    loop {
        let state = control.state();
        let delay = match state {
            WorkerState::Stopped => break,
            WorkerState::Paused => timing.paused_interval(),
            WorkerState::Running => match run_frame(channel, probe, sink) {
                Ok(printing) => {
                    let sent = control.frames.fetch_add(1, Ordering::Relaxed) + 1;
                    if frame_limit.is_some_and(|limit| sent >= limit) {
                        log::debug!("LED frame limit reached after {sent} frame(s)");
                        control.stop();
                        break;
                    }
                    timing.frame_interval(printing)
                }
                Err(e) => {
                    log::warn!(
                        "LED frame failed: {e} (retry in {:.1}s)",
                        timing.error_backoff().as_secs_f64()
                    );
                    timing.error_backoff()
                }
            },
        };
        control.wait_while(state, delay);
    }
    log::info!("LED worker stopped");
}

/// Handle to the background lighting thread.
///
/// Dropping the handle stops the worker and joins the thread.
pub struct LedWorker {
    control: Arc<Control>,
    handle: Option<JoinHandle<()>>,
}

impl LedWorker {
    /// Start the worker thread in the `Running` state.
    pub fn spawn<P, S>(
        channel: Arc<ConfigChannel>,
        probe: Arc<P>,
        sink: Arc<S>,
        timing: WorkerTiming,
    ) -> crate::error::Result<Self>
    where
        P: ActivityProbe + 'static,
        S: CommandSink + 'static,
    {
        Self::spawn_limited(channel, probe, sink, timing, None)
    }

    /// Like [`LedWorker::spawn`], but the worker stops itself once
    /// `frame_limit` frames have been sent. No frame past the limit is
    /// rendered.
    pub fn spawn_limited<P, S>(
        channel: Arc<ConfigChannel>,
        probe: Arc<P>,
        sink: Arc<S>,
        timing: WorkerTiming,
        frame_limit: Option<u64>,
    ) -> crate::error::Result<Self>
    where
        P: ActivityProbe + 'static,
        S: CommandSink + 'static,
    {
        let control = Arc::new(Control::new());
        let thread_control = Arc::clone(&control);
        let handle = std::thread::Builder::new()
            .name("led-worker".into())
            .spawn(move || {
                run_loop(
                    &thread_control,
                    &channel,
                    probe.as_ref(),
                    sink.as_ref(),
                    timing,
                    frame_limit,
                );
            })?;
        Ok(Self {
            control,
            handle: Some(handle),
        })
    }

    /// Running → Paused. Returns false from any other state.
    pub fn pause(&self) -> bool {
        self.control
            .transition(WorkerState::Running, WorkerState::Paused)
    }

    /// Paused → Running. Returns false from any other state.
    pub fn resume(&self) -> bool {
        self.control
            .transition(WorkerState::Paused, WorkerState::Running)
    }

    /// Stop the worker and wait for the thread to exit.
    ///
    /// A frame already being rendered is finished first; a sleeping worker
    /// wakes immediately.
    pub fn stop(&mut self) {
        self.control.stop();
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            log::warn!("LED worker thread panicked");
        }
    }

    pub fn state(&self) -> WorkerState {
        self.control.state()
    }

    /// Frames successfully pushed to the sink so far.
    pub fn frames_sent(&self) -> u64 {
        self.control.frames.load(Ordering::Relaxed)
    }
}

impl Drop for LedWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
