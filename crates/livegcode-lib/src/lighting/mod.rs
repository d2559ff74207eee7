//! Printer lighting — color parsing, frame rendering, and the background worker.

mod color;
mod render;
mod settings;
mod worker;

pub use color::{format_channels, hex_to_channels, is_hex_color};
pub use render::{effective_mode, render_frame, solid_command, wave_command};
pub use settings::{LightingConfig, LightingMode, LightingUpdate, MAX_LED_COUNT};
pub use worker::{LedWorker, WorkerState, WorkerTiming};
