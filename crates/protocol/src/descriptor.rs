//! Session descriptor and the routes that embed it.
//!
//! The server renders every MOTD page with a base64 init string holding the
//! player's identity and a first auth token. Every request path afterwards
//! carries the whole descriptor:
//!
//! ```text
//! /{serverId}/{pluginId}/{pageId}/{steamid}/{authMethod}/{authToken}/{sessionId}/
//! ```
//!
//! Segments are inserted verbatim. The server issues them and expects them
//! back unchanged.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// How the session proves its identity on the next request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum AuthMethod {
	/// Salted password handed out by the game server. Used only until the
	/// web server issues its first token.
	Password,
	/// Token issued by the web server on the previous exchange.
	Token,
}

impl AuthMethod {
	/// Integer code used on the wire and in request paths.
	pub fn code(self) -> u8 {
		match self {
			AuthMethod::Password => 0,
			AuthMethod::Token => 1,
		}
	}
}

impl From<AuthMethod> for u8 {
	fn from(method: AuthMethod) -> Self {
		method.code()
	}
}

impl TryFrom<u8> for AuthMethod {
	type Error = String;

	fn try_from(code: u8) -> Result<Self, Self::Error> {
		match code {
			0 => Ok(AuthMethod::Password),
			1 => Ok(AuthMethod::Token),
			other => Err(format!("unknown auth method: {other}")),
		}
	}
}

impl fmt::Display for AuthMethod {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.code())
	}
}

/// Errors from decoding a page init string.
#[derive(Debug, Error)]
pub enum DecodeError {
	#[error("init string is not valid base64: {0}")]
	Base64(#[from] base64::DecodeError),

	#[error("init string is not valid UTF-8: {0}")]
	Utf8(#[from] std::string::FromUtf8Error),

	#[error("init payload is not a session descriptor: {0}")]
	Json(#[from] serde_json::Error),
}

/// Identity and auth state of one MOTD page session.
///
/// Only `page_id`, `auth_method` and `auth_token` change after construction:
/// the token on every successful exchange, the page on a successful switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDescriptor {
	#[serde(deserialize_with = "opaque_id")]
	pub server_id: String,
	#[serde(deserialize_with = "opaque_id")]
	pub plugin_id: String,
	#[serde(deserialize_with = "opaque_id")]
	pub page_id: String,
	/// SteamID64 of the player. Sent as a string since it does not fit a
	/// JavaScript number.
	#[serde(rename = "steamid", deserialize_with = "opaque_id")]
	pub steam_id: String,
	pub auth_method: AuthMethod,
	pub auth_token: String,
	#[serde(deserialize_with = "opaque_id")]
	pub session_id: String,
}

impl SessionDescriptor {
	/// Decodes the base64 JSON init string rendered into the page.
	pub fn from_init_string(encoded: &str) -> Result<Self, DecodeError> {
		let bytes = STANDARD.decode(encoded.trim())?;
		let json = String::from_utf8(bytes)?;
		Ok(serde_json::from_str(&json)?)
	}

	/// Encodes the descriptor the way the server renders it into a page.
	pub fn to_init_string(&self) -> String {
		// Plain strings and a small integer always serialize.
		let json = serde_json::to_string(self).unwrap_or_default();
		STANDARD.encode(json)
	}

	/// Path for page loads and custom-data posts.
	pub fn page_route(&self) -> String {
		format!(
			"/{}/{}/{}/{}",
			self.server_id,
			self.plugin_id,
			self.page_id,
			self.auth_tail()
		)
	}

	/// Path for a page switch request from the current page to `new_page_id`.
	pub fn switch_route(&self, new_page_id: &str) -> String {
		format!(
			"/switch/{}/{}/{}/{}/{}",
			self.server_id,
			self.plugin_id,
			new_page_id,
			self.page_id,
			self.auth_tail()
		)
	}

	/// Path of the WebSocket endpoint, relative to the host.
	pub fn ws_route(&self) -> String {
		format!("/ws{}", self.page_route())
	}

	/// Accepts a token issued by the server. The session authenticates with
	/// tokens from here on.
	pub fn rotate(&mut self, token: impl Into<String>) {
		self.auth_method = AuthMethod::Token;
		self.auth_token = token.into();
	}

	/// Commits a switch the server accepted.
	pub fn commit_page(&mut self, page_id: impl Into<String>) {
		self.page_id = page_id.into();
	}

	fn auth_tail(&self) -> String {
		format!(
			"{}/{}/{}/{}/",
			self.steam_id, self.auth_method, self.auth_token, self.session_id
		)
	}
}

/// Identifiers are opaque: accept strings, or numbers from servers that
/// render them unquoted.
fn opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Raw {
		Text(String),
		Number(serde_json::Number),
	}

	Ok(match Raw::deserialize(deserializer)? {
		Raw::Text(text) => text,
		Raw::Number(number) => number.to_string(),
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	const INIT_JSON: &str = r#"{"serverId":"1","pluginId":"motd","pageId":"home","steamid":"76561190000000000","authMethod":0,"authToken":"tok0","sessionId":"s1"}"#;

	fn descriptor() -> SessionDescriptor {
		SessionDescriptor::from_init_string(&STANDARD.encode(INIT_JSON)).unwrap()
	}

	#[test]
	fn decodes_init_string() {
		let desc = descriptor();
		assert_eq!(desc.server_id, "1");
		assert_eq!(desc.plugin_id, "motd");
		assert_eq!(desc.page_id, "home");
		assert_eq!(desc.steam_id, "76561190000000000");
		assert_eq!(desc.auth_method, AuthMethod::Password);
		assert_eq!(desc.auth_token, "tok0");
		assert_eq!(desc.session_id, "s1");
	}

	#[test]
	fn numeric_identifiers_are_kept_verbatim() {
		let json = r#"{"serverId":3,"pluginId":"motd","pageId":"home","steamid":76561190000000000,"authMethod":1,"authToken":"t","sessionId":42}"#;
		let desc = SessionDescriptor::from_init_string(&STANDARD.encode(json)).unwrap();
		assert_eq!(desc.server_id, "3");
		assert_eq!(desc.steam_id, "76561190000000000");
		assert_eq!(desc.session_id, "42");
		assert_eq!(desc.auth_method, AuthMethod::Token);
	}

	#[test]
	fn rejects_bad_base64() {
		let err = SessionDescriptor::from_init_string("not base64!").unwrap_err();
		assert!(matches!(err, DecodeError::Base64(_)));
	}

	#[test]
	fn rejects_non_descriptor_json() {
		let err = SessionDescriptor::from_init_string(&STANDARD.encode(r#"{"serverId":"1"}"#))
			.unwrap_err();
		assert!(matches!(err, DecodeError::Json(_)));
	}

	#[test]
	fn rejects_unknown_auth_method() {
		let json = INIT_JSON.replace(r#""authMethod":0"#, r#""authMethod":7"#);
		let err = SessionDescriptor::from_init_string(&STANDARD.encode(json)).unwrap_err();
		assert!(err.to_string().contains("unknown auth method"));
	}

	#[test]
	fn page_route_uses_fixed_field_order() {
		assert_eq!(
			descriptor().page_route(),
			"/1/motd/home/76561190000000000/0/tok0/s1/"
		);
	}

	#[test]
	fn switch_route_puts_new_page_before_current() {
		assert_eq!(
			descriptor().switch_route("scores"),
			"/switch/1/motd/scores/home/76561190000000000/0/tok0/s1/"
		);
	}

	#[test]
	fn ws_route_prefixes_page_route() {
		assert_eq!(
			descriptor().ws_route(),
			"/ws/1/motd/home/76561190000000000/0/tok0/s1/"
		);
	}

	#[test]
	fn rotate_switches_to_token_auth() {
		let mut desc = descriptor();
		desc.rotate("tok1");
		assert_eq!(desc.auth_method, AuthMethod::Token);
		assert_eq!(desc.page_route(), "/1/motd/home/76561190000000000/1/tok1/s1/");

		desc.rotate("tok2");
		assert_eq!(desc.auth_token, "tok2");
		assert_eq!(desc.auth_method, AuthMethod::Token);
	}

	#[test]
	fn init_string_survives_reencoding() {
		let desc = descriptor();
		let again = SessionDescriptor::from_init_string(&desc.to_init_string()).unwrap();
		assert_eq!(desc, again);
	}
}
