use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors possible while exporting a manuscript.
///
/// Only `ManuscriptNotFound` is meant to reach a caller as anything other than
/// a generic export failure; the rest carry their root cause for logging.
/// Nothing here is retried automatically.
#[derive(Debug, Error)]
pub enum ExportError {
	/// No manuscript is stored under this identifier
	#[error("no manuscript found with id `{0}`")]
	ManuscriptNotFound(String),
	/// The rendering session did not finish loading and printing in time
	#[error("rendering session timed out after {}ms", .elapsed.as_millis())]
	RenderTimeout {
		/// how long we waited before giving up
		elapsed: Duration
	},
	/// An external program could not be started, exited unsuccessfully, or produced nothing
	#[error("{tool} failed (exit {exit_code:?}): {detail}")]
	ExternalToolFailure {
		/// the program invoked
		tool: String,
		/// its exit code, if it ran to completion
		exit_code: Option<i32>,
		/// stderr, a log excerpt, or a description of what went wrong
		detail: String
	},
	/// A temporary file could not be written or read back
	#[error("temporary file error at {}: {source}", .path.display())]
	TemporaryIoFailure {
		/// the scratch path involved
		path: PathBuf,
		/// the underlying error
		#[source]
		source: io::Error
	},
	/// The caller asked for something which is not a recognised option
	#[error("invalid export options: {0}")]
	InvalidOptions(String)
}

impl ExportError {
	/// Whether this should be reported as a missing manuscript rather than an export failure
	pub fn is_not_found(&self) -> bool {
		matches!(self, ExportError::ManuscriptNotFound(_))
	}

	/// A failure reading or writing the scratch path `path`
	pub fn temporary_io<P: AsRef<Path>>(path: P, source: io::Error) -> Self {
		ExportError::TemporaryIoFailure {
			path: path.as_ref().to_path_buf(),
			source
		}
	}

	/// A failure of the external program `tool`
	pub fn external_tool<T: Into<String>, D: Into<String>>(tool: T, exit_code: Option<i32>, detail: D) -> Self {
		ExportError::ExternalToolFailure {
			tool: tool.into(),
			exit_code,
			detail: detail.into()
		}
	}
}
