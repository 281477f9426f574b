//! Request and reply bodies for both channels.
//!
//! The conversation is the same over HTTP and WebSocket:
//!
//! 1. Client sends [`ClientRequest::CustomData`] (or [`ClientRequest::Switch`]
//!    over HTTP)
//! 2. Server answers with a [`ServerReply`] whose `status` is `OK` and which
//!    carries the next auth token, or a failure status with an `error_id`
//! 3. Over WebSocket the server may also push `CUSTOM_DATA` at any time
//!
//! [`parse_reply`] turns raw reply text into a [`Reply`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::failure::Failure;

/// Status of a successful exchange that issues a new token.
pub const STATUS_OK: &str = "OK";

/// Status of a server push carrying custom data.
pub const STATUS_CUSTOM_DATA: &str = "CUSTOM_DATA";

/// Status the server uses for view-level failures such as `"Invalid Auth."`.
pub const STATUS_ERROR_VIEW: &str = "ERROR_VIEW";

/// Content type of every HTTP request body.
pub const JSON_CONTENT_TYPE: &str = "application/json;charset=UTF-8";

/// Message sent from the page to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum ClientRequest {
	/// Opaque payload for the plugin's page handler.
	#[serde(rename = "custom-data")]
	CustomData {
		/// Forwarded to the plugin untouched.
		custom_data: Value,
	},
	/// Page switch. The target page travels in the request path.
	#[serde(rename = "switch")]
	Switch,
}

impl ClientRequest {
	pub fn custom_data(payload: Value) -> Self {
		ClientRequest::CustomData {
			custom_data: payload,
		}
	}

	/// Serialized request body.
	pub fn to_json(&self) -> String {
		// Tagged enum over a JSON value never fails to serialize.
		serde_json::to_string(self).unwrap_or_default()
	}
}

/// Raw reply from the server, on either channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerReply {
	pub status: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub web_auth_token: Option<String>,
	/// `None` only when the key is absent; an explicit `null` is `Some(Null)`.
	#[serde(
		default,
		deserialize_with = "present",
		skip_serializing_if = "Option::is_none"
	)]
	pub custom_data: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error_id: Option<String>,
}

impl ServerReply {
	/// Successful exchange issuing `token`.
	pub fn ok(token: impl Into<String>, custom_data: Option<Value>) -> Self {
		Self {
			status: STATUS_OK.into(),
			web_auth_token: Some(token.into()),
			custom_data,
			error_id: None,
		}
	}

	/// Server push of custom data.
	pub fn push(custom_data: Value) -> Self {
		Self {
			status: STATUS_CUSTOM_DATA.into(),
			web_auth_token: None,
			custom_data: Some(custom_data),
			error_id: None,
		}
	}

	/// Failure reply.
	pub fn error(status: impl Into<String>, error_id: impl Into<String>) -> Self {
		Self {
			status: status.into(),
			web_auth_token: None,
			custom_data: None,
			error_id: Some(error_id.into()),
		}
	}

	/// Classifies the reply by status.
	///
	/// A missing `error_id` renders as an empty string in the rejection.
	pub fn classify(self) -> Result<Reply, Failure> {
		match self.status.as_str() {
			STATUS_OK => {
				let token = self.web_auth_token.ok_or(Failure::MalformedResponse)?;
				Ok(Reply::Authenticated {
					token,
					custom_data: self.custom_data,
				})
			}
			STATUS_CUSTOM_DATA => Ok(Reply::CustomData(
				self.custom_data.unwrap_or(Value::Null),
			)),
			_ => Ok(Reply::Rejected(Failure::Rejected {
				status: self.status,
				error_id: self.error_id.unwrap_or_default(),
			})),
		}
	}

	pub fn to_json(&self) -> String {
		serde_json::to_string(self).unwrap_or_default()
	}
}

/// A classified server reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
	/// Exchange accepted; `token` authenticates the next one.
	Authenticated {
		token: String,
		custom_data: Option<Value>,
	},
	/// Server push (WebSocket only).
	CustomData(Value),
	/// Server refused the exchange.
	Rejected(Failure),
}

impl Reply {
	/// Outcome of a request/response exchange: the next token and the
	/// handler's reply, if it sent one.
	///
	/// A push is not a valid answer to a request and is reported as a
	/// `CUSTOM_DATA` rejection.
	pub fn into_exchange(self) -> Result<(String, Option<Value>), Failure> {
		match self {
			Reply::Authenticated { token, custom_data } => Ok((token, custom_data)),
			Reply::CustomData(_) => Err(Failure::Rejected {
				status: STATUS_CUSTOM_DATA.into(),
				error_id: String::new(),
			}),
			Reply::Rejected(failure) => Err(failure),
		}
	}
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
	Value::deserialize(deserializer).map(Some)
}

/// Parses reply text received on either channel.
pub fn parse_reply(text: &str) -> Result<Reply, Failure> {
	let reply: ServerReply =
		serde_json::from_str(text).map_err(|_| Failure::MalformedResponse)?;
	reply.classify()
}
