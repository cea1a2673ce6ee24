//! Helpers for the subordinate processes an export drives:
//! finding them, waiting on them with a deadline,
//! and making sure none is left running when an export gives up.

use crate::ExportError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(25);
/// how much of a tool's log to keep in an error
const LOG_TAIL_CHARS: usize = 2000;

/// Return the first of `candidates` which can be found on `PATH`
pub fn find_program(candidates: &[&str]) -> Option<PathBuf> {
	candidates.iter()
		.find_map(|name| which::which(name).ok())
}

/// Map a failure to spawn `tool` to an `ExportError`,
/// explaining the common case of the program not being installed
pub fn spawn_failure(tool: &Path, e: io::Error) -> ExportError {
	let detail = if e.kind() == io::ErrorKind::NotFound {
		format!("could not launch {}; is it installed?", tool.display())
	} else {
		e.to_string()
	};
	ExportError::external_tool(tool.display().to_string(), None, detail)
}

/// Read the end of a log file a tool wrote, for inclusion in an error.
/// A missing or unreadable log gives an explanatory placeholder instead.
pub fn read_log_tail<P: AsRef<Path>>(log: P) -> String {
	match fs::read_to_string(log.as_ref()) {
		Ok(s) if s.trim().is_empty() => "no output was logged".to_string(),
		Ok(s) => {
			let chars = s.chars().count();
			s.chars()
				.skip(chars.saturating_sub(LOG_TAIL_CHARS))
				.collect::<String>()
				.trim()
				.to_string()
		},
		Err(_) => "no log was produced".to_string()
	}
}

/// A running subordinate process which is killed and reaped on drop
/// if it has not already exited.
#[derive(Debug)]
pub struct ChildGuard {
	child: Child,
	tool: String,
	finished: bool
}

impl ChildGuard {
	/// Take ownership of a freshly spawned `child` running `tool`
	pub fn new<T: Into<String>>(child: Child, tool: T) -> Self {
		ChildGuard {
			child,
			tool: tool.into(),
			finished: false
		}
	}

	/// Wait for the process to exit, giving up after `timeout`.
	/// On timeout the process is killed before `RenderTimeout` is returned.
	pub fn wait_timeout(&mut self, timeout: Duration) -> Result<ExitStatus, ExportError> {
		let started = Instant::now();
		loop {
			match self.child.try_wait() {
				Ok(Some(status)) => {
					self.finished = true;
					return Ok(status);
				},
				Ok(None) if started.elapsed() >= timeout => {
					self.terminate();
					return Err(ExportError::RenderTimeout {
						elapsed: started.elapsed()
					});
				},
				Ok(None) => thread::sleep(POLL_INTERVAL),
				Err(e) => {
					return Err(ExportError::external_tool(self.tool.clone(), None, e.to_string()));
				}
			}
		}
	}

	fn terminate(&mut self) {
		if self.finished {
			return;
		}
		if let Err(e) = self.child.kill() {
			debug!(tool = %self.tool, error = %e, "kill failed; process may already have exited");
		}
		if let Err(e) = self.child.wait() {
			warn!(tool = %self.tool, error = %e, "failed to reap subordinate process");
		}
		self.finished = true;
	}
}

impl Drop for ChildGuard {
	fn drop(&mut self) {
		self.terminate();
	}
}

#[cfg(all(test, unix))]
mod tests {
	use super::*;
	use std::process::{Command, Stdio};
	use tempfile::TempDir;

	fn spawn_sh(script: &str) -> Child {
		Command::new("sh")
			.args(["-c", script])
			.stdout(Stdio::null())
			.stderr(Stdio::null())
			.spawn()
			.unwrap()
	}

	#[test]
	fn test_wait_for_quick_process() {
		let mut guard = ChildGuard::new(spawn_sh("exit 3"), "sh");
		let status = guard.wait_timeout(Duration::from_secs(10)).unwrap();
		assert_eq!(status.code(), Some(3));
	}

	#[test]
	fn test_slow_process_times_out() {
		let mut guard = ChildGuard::new(spawn_sh("exec sleep 10"), "sh");
		let started = Instant::now();
		let err = guard.wait_timeout(Duration::from_millis(100)).unwrap_err();
		assert!(matches!(err, ExportError::RenderTimeout { .. }));
		assert!(started.elapsed() < Duration::from_secs(5));
	}

	#[test]
	fn test_drop_kills_running_process() {
		let started = Instant::now();
		drop(ChildGuard::new(spawn_sh("exec sleep 10"), "sh"));
		// killing and reaping, not waiting out the sleep
		assert!(started.elapsed() < Duration::from_secs(5));
	}

	#[test]
	fn test_missing_program() {
		let tool = Path::new("definitely-not-a-real-typesetter");
		let err = Command::new(tool)
			.spawn()
			.map_err(|e| spawn_failure(tool, e))
			.unwrap_err();
		match err {
			ExportError::ExternalToolFailure { exit_code, detail, .. } => {
				assert_eq!(exit_code, None);
				assert!(detail.contains("is it installed"));
			},
			other => panic!("unexpected error: {:?}", other)
		}
	}

	#[test]
	fn test_read_log_tail() {
		let dir = TempDir::new().unwrap();
		let log = dir.path().join("browser.log");
		fs::write(&log, "line one\nline two\n").unwrap();
		assert_eq!(read_log_tail(&log), "line one\nline two");
		fs::remove_file(&log).unwrap();
		assert_eq!(read_log_tail(&log), "no log was produced");
	}
}
