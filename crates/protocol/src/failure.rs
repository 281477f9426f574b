//! Failure sentinels delivered to page code.

use thiserror::Error;

/// A failed exchange, rendered exactly as page code sees it.
///
/// The `Display` output is the wire-compatible error string: fixed sentinels
/// for client-side failures and `"{status} {error_id}"` for server
/// rejections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Failure {
	/// The HTTP request never produced a 200 response.
	#[error("JS_AJAX_FAILURE")]
	HttpTransport,

	/// The WebSocket transport reported an error.
	#[error("WS_ONERROR_EVENT")]
	WsTransport,

	/// No WebSocket support in this environment.
	#[error("WS_NO_BROWSER_SUPPORT")]
	WsUnsupported,

	/// A WebSocket connection is already open for this session.
	#[error("WS_ALREADY_OPENED")]
	WsAlreadyOpened,

	/// The server answered with a non-OK status.
	#[error("{status} {error_id}")]
	Rejected { status: String, error_id: String },

	/// The server reply was not JSON, or was `OK` without a token.
	#[error("MALFORMED_RESPONSE")]
	MalformedResponse,
}

impl Failure {
	/// The error string handed to page callbacks.
	pub fn code(&self) -> String {
		self.to_string()
	}

	/// Returns true for failures the server decided on, as opposed to
	/// transport or client-side failures.
	pub fn is_rejection(&self) -> bool {
		matches!(self, Failure::Rejected { .. })
	}
}
