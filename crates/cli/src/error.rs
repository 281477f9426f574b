use motd::Failure;
use thiserror::Error;

use crate::output::{CommandError, ErrorCode};

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("missing --{flag} (or set {env})")]
	MissingArg {
		flag: &'static str,
		env: &'static str,
	},

	#[error("invalid JSON payload: {0}")]
	Payload(#[from] serde_json::Error),

	#[error(transparent)]
	Session(#[from] motd::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Anyhow(#[from] anyhow::Error),
}

fn failure_code(failure: &Failure) -> ErrorCode {
	match failure {
		Failure::HttpTransport | Failure::WsTransport => ErrorCode::TransportFailed,
		Failure::WsUnsupported | Failure::WsAlreadyOpened => ErrorCode::WebSocketUnavailable,
		Failure::Rejected { .. } => ErrorCode::Rejected,
		Failure::MalformedResponse => ErrorCode::MalformedResponse,
	}
}

impl CliError {
	/// Convert this error to a CommandError for structured output
	pub fn to_command_error(&self) -> CommandError {
		let (code, details) = match self {
			CliError::MissingArg { flag, env } => (
				ErrorCode::InvalidInput,
				Some(serde_json::json!({ "flag": flag, "env": env })),
			),
			CliError::Payload(_) => (ErrorCode::InvalidInput, None),
			CliError::Session(motd::Error::Failure(failure)) => {
				let details = match failure {
					Failure::Rejected { status, error_id } => serde_json::json!({
						"failure": failure.code(),
						"status": status,
						"errorId": error_id,
					}),
					_ => serde_json::json!({ "failure": failure.code() }),
				};
				(failure_code(failure), Some(details))
			}
			CliError::Session(_) => (ErrorCode::InvalidInput, None),
			CliError::Io(_) => (ErrorCode::IoError, None),
			CliError::Anyhow(_) => (ErrorCode::InternalError, None),
		};

		CommandError {
			code,
			message: format!("{self:#}"),
			details,
		}
	}
}
