//! Structured output envelope for all CLI commands.
//!
//! Every command ends with one envelope on stdout:
//!
//! ```json
//! {
//!   "schemaVersion": 1,
//!   "ok": true,
//!   "command": "post",
//!   "data": { ... },
//!   "timings": { "durationMs": 42 }
//! }
//! ```
//!
//! On failure `data` is replaced by
//! `"error": { "code": "REJECTED", "message": "ERROR_VIEW Invalid Auth." }`.
//! `listen` additionally streams one [`EventRecord`] per line before its
//! envelope.

#[cfg(test)]
mod tests;

use std::fmt;
use std::io::{self, Write};
use std::time::{Duration, Instant};

use motd::SessionEvent;
use motd_protocol::SessionDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Current schema version for command output.
pub const SCHEMA_VERSION: u32 = 1;

/// Output format for CLI results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text
	#[default]
	Text,
	/// Pretty-printed JSON
	Json,
	/// Newline-delimited JSON (streaming)
	Ndjson,
}

impl std::str::FromStr for OutputFormat {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"text" => Ok(OutputFormat::Text),
			"json" => Ok(OutputFormat::Json),
			"ndjson" => Ok(OutputFormat::Ndjson),
			_ => Err(format!("unknown format: {s}")),
		}
	}
}

impl fmt::Display for OutputFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			OutputFormat::Text => write!(f, "text"),
			OutputFormat::Json => write!(f, "json"),
			OutputFormat::Ndjson => write!(f, "ndjson"),
		}
	}
}

/// The result envelope returned by all commands.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult<T: Serialize> {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub schema_version: Option<u32>,
	pub ok: bool,
	pub command: String,
	/// Only present on success
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,
	/// Only present on failure
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<CommandError>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub timings: Option<Timings>,
}

/// Error information for failed commands
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
	pub code: ErrorCode,
	/// Human-readable message; for session failures the exact sentinel
	/// string, e.g. `JS_AJAX_FAILURE`
	pub message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Value>,
}

/// Standardized error codes for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	/// Bad flag, payload, init string, or host
	InvalidInput,
	/// HTTP request or WebSocket failed below the protocol
	TransportFailed,
	/// Server answered with a non-`OK` status
	Rejected,
	/// Server reply could not be read
	MalformedResponse,
	/// WebSocket missing or already open
	WebSocketUnavailable,
	IoError,
	InternalError,
}

impl fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ErrorCode::InvalidInput => write!(f, "INVALID_INPUT"),
			ErrorCode::TransportFailed => write!(f, "TRANSPORT_FAILED"),
			ErrorCode::Rejected => write!(f, "REJECTED"),
			ErrorCode::MalformedResponse => write!(f, "MALFORMED_RESPONSE"),
			ErrorCode::WebSocketUnavailable => write!(f, "WEB_SOCKET_UNAVAILABLE"),
			ErrorCode::IoError => write!(f, "IO_ERROR"),
			ErrorCode::InternalError => write!(f, "INTERNAL_ERROR"),
		}
	}
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timings {
	pub duration_ms: u64,
}

impl From<Duration> for Timings {
	fn from(duration: Duration) -> Self {
		Timings {
			duration_ms: duration.as_millis() as u64,
		}
	}
}

/// Builder for [`CommandResult`]. Timing starts at [`ResultBuilder::new`].
pub struct ResultBuilder<T: Serialize> {
	command: String,
	data: Option<T>,
	error: Option<CommandError>,
	start_time: Instant,
}

impl<T: Serialize> ResultBuilder<T> {
	pub fn new(command: impl Into<String>) -> Self {
		Self {
			command: command.into(),
			data: None,
			error: None,
			start_time: Instant::now(),
		}
	}

	pub fn data(mut self, data: T) -> Self {
		self.data = Some(data);
		self
	}

	pub fn error(self, code: ErrorCode, message: impl Into<String>) -> Self {
		self.error_with_details(code, message, None)
	}

	pub fn error_with_details(
		mut self,
		code: ErrorCode,
		message: impl Into<String>,
		details: Option<Value>,
	) -> Self {
		self.error = Some(CommandError {
			code,
			message: message.into(),
			details,
		});
		self
	}

	pub fn build(self) -> CommandResult<T> {
		let ok = self.error.is_none() && self.data.is_some();
		CommandResult {
			schema_version: Some(SCHEMA_VERSION),
			ok,
			command: self.command,
			data: self.data,
			error: self.error,
			timings: Some(Timings::from(self.start_time.elapsed())),
		}
	}
}

/// Print a command result to stdout in the specified format
pub fn print_result<T: Serialize>(result: &CommandResult<T>, format: OutputFormat) {
	match format {
		OutputFormat::Json => {
			if let Ok(json) = serde_json::to_string_pretty(result) {
				println!("{json}");
			}
		}
		OutputFormat::Ndjson => {
			if let Ok(json) = serde_json::to_string(result) {
				println!("{json}");
			}
		}
		OutputFormat::Text => print_result_text(result),
	}
}

fn print_result_text<T: Serialize>(result: &CommandResult<T>) {
	let mut stdout = io::stdout().lock();

	if result.ok {
		if let Some(ref data) = result.data {
			if let Ok(json) = serde_json::to_string_pretty(data) {
				let _ = writeln!(stdout, "{json}");
			}
		}
	} else if let Some(ref error) = result.error {
		let _ = writeln!(stdout, "Error [{}]: {}", error.code, error.message);
	}
}

/// Print an error to stderr in human-readable format
pub fn print_error_stderr(error: &CommandError) {
	eprintln!("Error [{}]: {}", error.code, error.message);
}

/// Print one streamed event: a line of text, or one compact JSON object
/// per line for the JSON formats.
pub fn print_event(event: &EventRecord, format: OutputFormat) {
	let mut stdout = io::stdout().lock();
	match format {
		OutputFormat::Text => {
			let _ = writeln!(stdout, "{event}");
		}
		OutputFormat::Json | OutputFormat::Ndjson => {
			if let Ok(json) = serde_json::to_string(event) {
				let _ = writeln!(stdout, "{json}");
			}
		}
	}
	let _ = stdout.flush();
}

/// Request routes derived from a descriptor.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutesData {
	pub page: String,
	pub websocket: String,
}

impl RoutesData {
	pub fn of(descriptor: &SessionDescriptor) -> Self {
		Self {
			page: descriptor.page_route(),
			websocket: descriptor.ws_route(),
		}
	}
}

/// Result data for decode command
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeData {
	pub descriptor: SessionDescriptor,
	pub routes: RoutesData,
}

/// Result data for post command
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostData {
	/// Handler reply, `null` when the server sent none
	pub custom_data: Value,
	/// Descriptor after rotation
	pub descriptor: SessionDescriptor,
}

/// Result data for switch command
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchData {
	pub page_id: String,
	pub descriptor: SessionDescriptor,
	pub reload_route: String,
}

/// Result data for listen command
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenData {
	pub events: usize,
	pub sent: usize,
	/// `server` if the socket closed under us, `client` after stdin EOF
	pub closed_by: String,
	pub descriptor: SessionDescriptor,
}

/// One WebSocket event as printed by `listen`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum EventRecord {
	Opened,
	Authenticated,
	Message { data: Value },
	Error { failure: String },
	Closed,
}

impl From<SessionEvent> for EventRecord {
	fn from(event: SessionEvent) -> Self {
		match event {
			SessionEvent::Opened => EventRecord::Opened,
			SessionEvent::Authenticated => EventRecord::Authenticated,
			SessionEvent::Message(data) => EventRecord::Message { data },
			SessionEvent::Error(failure) => EventRecord::Error {
				failure: failure.code(),
			},
			SessionEvent::Closed => EventRecord::Closed,
		}
	}
}

impl fmt::Display for EventRecord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			EventRecord::Opened => write!(f, "opened"),
			EventRecord::Authenticated => write!(f, "authenticated"),
			EventRecord::Message { data } => write!(f, "message {data}"),
			EventRecord::Error { failure } => write!(f, "error {failure}"),
			EventRecord::Closed => write!(f, "closed"),
		}
	}
}
