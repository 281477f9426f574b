use motd_protocol::{AuthMethod, Failure};
use serde_json::json;

use super::*;

fn descriptor() -> SessionDescriptor {
	SessionDescriptor {
		server_id: "1".into(),
		plugin_id: "motd".into(),
		page_id: "home".into(),
		steam_id: "76561190000000000".into(),
		auth_method: AuthMethod::Token,
		auth_token: "tok1".into(),
		session_id: "s1".into(),
	}
}

#[test]
fn result_builder_success() {
	let result: CommandResult<PostData> = ResultBuilder::new("post")
		.data(PostData {
			custom_data: json!({"y": 2}),
			descriptor: descriptor(),
		})
		.build();

	assert!(result.ok);
	assert_eq!(result.command, "post");
	assert_eq!(result.schema_version, Some(SCHEMA_VERSION));
	assert!(result.error.is_none());
}

#[test]
fn result_builder_error() {
	let result: CommandResult<PostData> = ResultBuilder::new("post")
		.error(ErrorCode::Rejected, "ERR E_BAD_TOKEN")
		.build();

	assert!(!result.ok);
	assert!(result.data.is_none());
	let error = result.error.as_ref().unwrap();
	assert_eq!(error.code, ErrorCode::Rejected);
	assert_eq!(error.message, "ERR E_BAD_TOKEN");
}

#[test]
fn builder_without_data_is_not_ok() {
	let result: CommandResult<()> = ResultBuilder::new("listen").build();
	assert!(!result.ok);
}

#[test]
fn envelope_serializes_camel_case() {
	let result: CommandResult<PostData> = ResultBuilder::new("post")
		.data(PostData {
			custom_data: json!(null),
			descriptor: descriptor(),
		})
		.build();

	let value = serde_json::to_value(&result).unwrap();
	assert_eq!(value["schemaVersion"], 1);
	assert_eq!(value["data"]["customData"], json!(null));
	assert_eq!(value["data"]["descriptor"]["steamid"], "76561190000000000");
	assert_eq!(value["data"]["descriptor"]["authMethod"], 1);
	assert!(value.get("error").is_none());
	assert!(value["timings"]["durationMs"].is_u64());
}

#[test]
fn error_envelope_carries_code_and_details() {
	let result: CommandResult<()> = ResultBuilder::new("switch")
		.error_with_details(
			ErrorCode::TransportFailed,
			"JS_AJAX_FAILURE",
			Some(json!({"failure": "JS_AJAX_FAILURE"})),
		)
		.build();

	let value = serde_json::to_value(&result).unwrap();
	assert_eq!(value["ok"], false);
	assert_eq!(value["error"]["code"], "TRANSPORT_FAILED");
	assert_eq!(value["error"]["details"]["failure"], "JS_AJAX_FAILURE");
	assert!(value.get("data").is_none());
}

#[test]
fn error_code_display_matches_serde() {
	for code in [
		ErrorCode::InvalidInput,
		ErrorCode::TransportFailed,
		ErrorCode::Rejected,
		ErrorCode::MalformedResponse,
		ErrorCode::WebSocketUnavailable,
		ErrorCode::IoError,
		ErrorCode::InternalError,
	] {
		assert_eq!(serde_json::to_value(code).unwrap(), json!(code.to_string()));
	}
}

#[test]
fn output_format_parse() {
	assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
	assert_eq!("NDJSON".parse::<OutputFormat>().unwrap(), OutputFormat::Ndjson);
	assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
	assert!("toon".parse::<OutputFormat>().is_err());
}

#[test]
fn routes_follow_descriptor() {
	let routes = RoutesData::of(&descriptor());
	assert_eq!(routes.page, "/1/motd/home/76561190000000000/1/tok1/s1/");
	assert_eq!(routes.websocket, "/ws/1/motd/home/76561190000000000/1/tok1/s1/");
}

#[test]
fn event_records_from_session_events() {
	assert_eq!(EventRecord::from(SessionEvent::Opened), EventRecord::Opened);
	assert_eq!(
		EventRecord::from(SessionEvent::Message(json!({"name": "Bob"}))),
		EventRecord::Message {
			data: json!({"name": "Bob"})
		}
	);
	assert_eq!(
		EventRecord::from(SessionEvent::Error(Failure::WsTransport)),
		EventRecord::Error {
			failure: "WS_ONERROR_EVENT".into()
		}
	);
}

#[test]
fn event_records_render() {
	let message = EventRecord::Message {
		data: json!({"name": "Bob"}),
	};
	assert_eq!(message.to_string(), r#"message {"name":"Bob"}"#);
	assert_eq!(
		serde_json::to_value(&message).unwrap(),
		json!({"event": "message", "data": {"name": "Bob"}})
	);

	let error = EventRecord::Error {
		failure: "ERROR_VIEW Invalid Auth.".into(),
	};
	assert_eq!(error.to_string(), "error ERROR_VIEW Invalid Auth.");
	assert_eq!(
		serde_json::to_value(&EventRecord::Closed).unwrap(),
		json!({"event": "closed"})
	);
}
