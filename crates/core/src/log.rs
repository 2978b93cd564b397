//! Verbose step logging.
//!
//! Step lines are the user-facing narration of a setup run and are only
//! emitted when `verboseLogging` is on. Internal diagnostics go straight to
//! `tracing` at debug level regardless of that flag.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

const LINE_PREFIX: &str = "session-login";

/// Destination for verbose step lines.
pub trait LineSink: Send + Sync {
	fn emit(&self, line: &str);
}

/// Forwards step lines to `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LineSink for TracingSink {
	fn emit(&self, line: &str) {
		info!(target = "slogin", "{line}");
	}
}

/// Keeps every emitted line in memory.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
	lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn lines(&self) -> Vec<String> {
		self.lines.lock().clone()
	}
}

impl LineSink for RecordingSink {
	fn emit(&self, line: &str) {
		self.lines.lock().push(line.to_string());
	}
}

/// Gated line emitter handed to every component of a run.
#[derive(Clone)]
pub struct SessionLog {
	verbose: bool,
	sink: Arc<dyn LineSink>,
}

impl SessionLog {
	pub fn new(verbose: bool, sink: Arc<dyn LineSink>) -> Self {
		Self { verbose, sink }
	}

	/// Logger that writes through [`TracingSink`].
	pub fn tracing(verbose: bool) -> Self {
		Self::new(verbose, Arc::new(TracingSink))
	}

	pub fn is_verbose(&self) -> bool {
		self.verbose
	}

	pub fn step(&self, message: impl fmt::Display) {
		if self.verbose {
			self.sink.emit(&format!("{LINE_PREFIX}: {message}"));
		}
	}
}

impl fmt::Debug for SessionLog {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SessionLog").field("verbose", &self.verbose).finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn quiet_log_emits_nothing() {
		let sink = RecordingSink::new();
		let log = SessionLog::new(false, Arc::new(sink.clone()));
		log.step("cookie file found");
		assert!(sink.lines().is_empty());
	}

	#[test]
	fn verbose_log_prefixes_lines() {
		let sink = RecordingSink::new();
		let log = SessionLog::new(true, Arc::new(sink.clone()));
		log.step("cookie file found");
		assert_eq!(sink.lines(), vec!["session-login: cookie file found".to_string()]);
	}
}
