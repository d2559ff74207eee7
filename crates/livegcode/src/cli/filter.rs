//! `filter` subcommand — pass a command stream through the interception rules.

use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use super::{CommandBatch, CommandSink, ConfigChannel, Interceptor, RUNNING, Result, WriterSink};

pub(super) fn cmd_filter(config_path: Option<&Path>, input: Option<&Path>) -> Result<()> {
    let config = super::load_config(config_path);
    let interceptor = Interceptor::new(Arc::new(ConfigChannel::from_config(&config)));
    let sink = WriterSink::new(std::io::stdout());

    let reader: Box<dyn BufRead> = match input {
        Some(path) => Box::new(std::io::BufReader::new(std::fs::File::open(path)?)),
        None => Box::new(std::io::stdin().lock()),
    };

    let mut seen = 0usize;
    let mut changed = 0usize;
    for line in reader.lines() {
        if !RUNNING.load(Ordering::SeqCst) {
            break;
        }
        let line = line?;
        let raw = line.trim_end_matches('\r');
        let intercepted = interceptor.intercept_line(raw);
        seen += 1;
        if intercepted != super::Intercepted::Pass {
            changed += 1;
        }
        sink.send_batch(&CommandBatch::new(intercepted.commands(raw)))?;
    }

    log::info!("[filter] {seen} command(s) read, {changed} rewritten");
    Ok(())
}
