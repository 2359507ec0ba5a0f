use std::{fmt::Display, io, path::Path};

use thiserror::Error;
use tracing::error;

/// Logs the error of a fire-and-forget operation, keeping the caller's flow going
pub fn report_error<T>(res: &Result<T, impl Display>, context: &str) {
	if let Err(e) = res {
		error!(%context, "{e:#}");
	}
}

/// File I/O error that carries the path that caused it
#[derive(Error, Debug)]
pub struct FileIOError {
	pub path: Box<Path>,
	#[source]
	pub source: io::Error,
	pub maybe_context: Option<&'static str>,
}

impl Display for FileIOError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"file I/O error{}: {}; path: '{}'",
			self.maybe_context
				.map(|ctx| format!(" ({ctx})"))
				.unwrap_or_default(),
			self.source,
			self.path.display()
		)
	}
}

impl<P: AsRef<Path>> From<(P, io::Error)> for FileIOError {
	fn from((path, source): (P, io::Error)) -> Self {
		Self {
			path: path.as_ref().into(),
			source,
			maybe_context: None,
		}
	}
}

impl<P: AsRef<Path>> From<(P, io::Error, &'static str)> for FileIOError {
	fn from((path, source, context): (P, io::Error, &'static str)) -> Self {
		Self {
			path: path.as_ref().into(),
			source,
			maybe_context: Some(context),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	use tracing_test::traced_test;

	#[test]
	fn display_includes_context_and_path() {
		let err = FileIOError::from((
			"/tmp/cache/files/ab/abcd.png",
			io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
			"failed to persist cache entry",
		));

		let message = err.to_string();
		assert!(message.contains("(failed to persist cache entry)"));
		assert!(message.contains("/tmp/cache/files/ab/abcd.png"));
		assert_eq!(err.source.kind(), io::ErrorKind::PermissionDenied);
	}

	#[test]
	fn display_without_context() {
		let err = FileIOError::from(("/tmp/x", io::Error::from(io::ErrorKind::NotFound)));

		assert!(err.to_string().starts_with("file I/O error: "));
	}

	#[test]
	#[traced_test]
	fn report_error_logs_failures_only() {
		report_error(&Ok::<(), String>(()), "revoke notification");
		assert!(!logs_contain("revoke notification"));

		report_error(&Err::<(), _>("connection reset"), "revoke notification");
		assert!(logs_contain("connection reset"));
	}
}
