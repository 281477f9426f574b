//! Error types for the session client.

use motd_protocol::{DecodeError, Failure};
use thiserror::Error;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by [`SessionClient`](crate::SessionClient).
#[derive(Debug, Error)]
pub enum Error {
	/// An exchange failed. Renders as the sentinel string page code expects.
	#[error(transparent)]
	Failure(#[from] Failure),

	/// The page init string could not be decoded.
	#[error("invalid init string: {0}")]
	Init(#[from] DecodeError),

	/// The server endpoint could not be parsed.
	#[error("invalid endpoint '{input}': {reason}")]
	InvalidEndpoint { input: String, reason: String },
}

impl Error {
	/// Returns the exchange failure, if this is one.
	pub fn failure(&self) -> Option<&Failure> {
		match self {
			Error::Failure(failure) => Some(failure),
			_ => None,
		}
	}

	/// Returns true if the server refused the exchange.
	pub fn is_rejection(&self) -> bool {
		self.failure().is_some_and(Failure::is_rejection)
	}
}
