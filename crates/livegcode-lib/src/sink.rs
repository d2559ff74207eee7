//! Collaborator seams — where commands go and where machine activity comes from.
//!
//! The host owns both ends: a [`CommandSink`] that queues commands for the
//! printer (already safe to call from several threads), and an
//! [`ActivityProbe`] reporting whether a print job is running.

use std::io::Write;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::Result;

/// Commands written to the sink in one call, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandBatch {
    pub commands: Vec<String>,
    /// Ask the host to keep these out of its terminal log.
    pub suppress_log: bool,
}

impl CommandBatch {
    pub fn new(commands: Vec<String>) -> Self {
        CommandBatch {
            commands,
            suppress_log: false,
        }
    }

    /// A batch tagged for log suppression (high-rate lighting traffic).
    pub fn quiet(commands: Vec<String>) -> Self {
        CommandBatch {
            commands,
            suppress_log: true,
        }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Accepts commands for ordered dispatch to the machine.
pub trait CommandSink: Send + Sync {
    fn send_batch(&self, batch: &CommandBatch) -> Result<()>;
}

/// Reports the machine's current activity.
pub trait ActivityProbe: Send + Sync {
    fn is_printing(&self) -> Result<bool>;
}

/// Sink writing one command per line to any writer (stdout, a serial port
/// file, a pipe).
pub struct WriterSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl<W: Write + Send> CommandSink for WriterSink<W> {
    fn send_batch(&self, batch: &CommandBatch) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| crate::LiveGcodeError::Sink(format!("writer lock poisoned: {e}")))?;
        for command in &batch.commands {
            writeln!(writer, "{command}")?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Activity probe backed by a flag the host flips on job start/stop.
#[derive(Debug, Default)]
pub struct FixedActivity {
    printing: AtomicBool,
}

impl FixedActivity {
    pub fn new(printing: bool) -> Self {
        Self {
            printing: AtomicBool::new(printing),
        }
    }

    pub fn set_printing(&self, printing: bool) {
        self.printing.store(printing, Ordering::SeqCst);
    }
}

impl ActivityProbe for FixedActivity {
    fn is_printing(&self) -> Result<bool> {
        Ok(self.printing.load(Ordering::SeqCst))
    }
}

// ── Test doubles ──

/// Recording sink and scriptable probe for unit and integration tests.
///
/// Always compiled, hidden from public docs.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Condvar;
    use std::time::{Duration, Instant};

    /// Sink that stores every batch and can be told to fail.
    #[derive(Default)]
    pub struct RecordingSink {
        batches: Mutex<Vec<CommandBatch>>,
        arrived: Condvar,
        fail: AtomicBool,
    }

    impl RecordingSink {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make subsequent `send_batch` calls fail (or succeed again).
        pub fn set_failing(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }

        pub fn batches(&self) -> Vec<CommandBatch> {
            self.batches
                .lock()
                .map(|b| b.clone())
                .unwrap_or_default()
        }

        pub fn batch_count(&self) -> usize {
            self.batches.lock().map(|b| b.len()).unwrap_or(0)
        }

        /// Block until at least `count` batches have arrived or `timeout`
        /// elapses. Returns whether the count was reached.
        pub fn wait_for_batches(&self, count: usize, timeout: Duration) -> bool {
            let deadline = Instant::now() + timeout;
            let Ok(mut batches) = self.batches.lock() else {
                return false;
            };
            while batches.len() < count {
                let now = Instant::now();
                if now >= deadline {
                    return false;
                }
                batches = match self.arrived.wait_timeout(batches, deadline - now) {
                    Ok((guard, _)) => guard,
                    Err(_) => return false,
                };
            }
            true
        }
    }

    impl CommandSink for RecordingSink {
        fn send_batch(&self, batch: &CommandBatch) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(crate::LiveGcodeError::Sink("recording sink set to fail".into()));
            }
            if let Ok(mut batches) = self.batches.lock() {
                batches.push(batch.clone());
                self.arrived.notify_all();
            }
            Ok(())
        }
    }

    /// Probe replaying a script of answers; the last one repeats forever.
    /// `Err` entries simulate a failing activity query.
    pub struct ScriptedProbe {
        script: Mutex<VecDeque<std::result::Result<bool, String>>>,
        last: Mutex<std::result::Result<bool, String>>,
    }

    impl ScriptedProbe {
        pub fn new(script: Vec<std::result::Result<bool, String>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                last: Mutex::new(Ok(false)),
            }
        }

        /// Probe that always answers `printing`.
        pub fn constant(printing: bool) -> Self {
            Self::new(vec![Ok(printing)])
        }
    }

    impl ActivityProbe for ScriptedProbe {
        fn is_printing(&self) -> Result<bool> {
            let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
            let answer = match (next, self.last.lock()) {
                (Some(answer), Ok(mut last)) => {
                    *last = answer.clone();
                    answer
                }
                (Some(answer), Err(_)) => answer,
                (None, Ok(last)) => last.clone(),
                (None, Err(_)) => Ok(false),
            };
            answer.map_err(crate::LiveGcodeError::Probe)
        }
    }
}
