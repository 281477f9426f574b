//! End-to-end session against a local MOTD server stand-in.
//!
//! The server keeps one expected token, rejects anything else with
//! `ERROR_VIEW Invalid Auth.` and issues a fresh token on every accepted
//! exchange, like the real web server does.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{any, post};
use motd::{AuthMethod, Endpoint, SessionClient, SessionEvent, WsEvents};
use motd_protocol::{ClientRequest, STATUS_ERROR_VIEW, SessionDescriptor, ServerReply};
use serde_json::{Value, json};

#[derive(Clone, Default)]
struct Tokens {
	inner: Arc<Mutex<TokenState>>,
}

#[derive(Default)]
struct TokenState {
	current: String,
	issued: u32,
}

impl Tokens {
	fn new(first: &str) -> Self {
		let tokens = Tokens::default();
		tokens.inner.lock().unwrap().current = first.to_string();
		tokens
	}

	/// Checks `presented` and, if valid, replaces it with a new token.
	fn redeem(&self, presented: &str) -> Option<String> {
		let mut state = self.inner.lock().unwrap();
		if state.current != presented {
			return None;
		}
		state.issued += 1;
		state.current = format!("web{}", state.issued);
		Some(state.current.clone())
	}
}

type PageParams = (String, String, String, String, u8, String, String);
type SwitchParams = (String, String, String, String, String, u8, String, String);

async fn page(
	State(tokens): State<Tokens>,
	Path((_, _, _, _, _, token, _)): Path<PageParams>,
	body: String,
) -> String {
	let Some(next) = tokens.redeem(&token) else {
		return ServerReply::error(STATUS_ERROR_VIEW, "Invalid Auth.").to_json();
	};
	match serde_json::from_str::<ClientRequest>(&body) {
		Ok(ClientRequest::CustomData { custom_data }) => {
			ServerReply::ok(next, Some(json!({ "echo": custom_data }))).to_json()
		}
		_ => ServerReply::error(STATUS_ERROR_VIEW, "Invalid Action.").to_json(),
	}
}

async fn switch(
	State(tokens): State<Tokens>,
	Path((_, _, _, _, _, _, token, _)): Path<SwitchParams>,
	body: String,
) -> String {
	if serde_json::from_str::<ClientRequest>(&body).ok() != Some(ClientRequest::Switch) {
		return ServerReply::error(STATUS_ERROR_VIEW, "Bad Request.").to_json();
	}
	match tokens.redeem(&token) {
		Some(next) => ServerReply::ok(next, None).to_json(),
		None => ServerReply::error(STATUS_ERROR_VIEW, "Invalid Auth.").to_json(),
	}
}

async fn ws(
	ws: WebSocketUpgrade,
	State(tokens): State<Tokens>,
	Path((_, _, _, _, _, token, _)): Path<PageParams>,
) -> impl IntoResponse {
	ws.on_upgrade(move |socket| handle_socket(socket, tokens, token))
}

async fn handle_socket(mut socket: WebSocket, tokens: Tokens, token: String) {
	let Some(next) = tokens.redeem(&token) else {
		let reply = ServerReply::error(STATUS_ERROR_VIEW, "Invalid Auth.");
		let _ = socket.send(Message::Text(reply.to_json().into())).await;
		let _ = socket.send(Message::Close(None)).await;
		return;
	};
	let hello = ServerReply::ok(next, None);
	if socket.send(Message::Text(hello.to_json().into())).await.is_err() {
		return;
	}

	while let Some(Ok(message)) = socket.recv().await {
		let Message::Text(text) = message else {
			continue;
		};
		let Ok(ClientRequest::CustomData { custom_data }) = serde_json::from_str::<ClientRequest>(text.as_str())
		else {
			continue;
		};
		if custom_data == json!("bye") {
			let _ = socket.send(Message::Close(None)).await;
			return;
		}
		let push = ServerReply::push(json!({ "echo": custom_data }));
		if socket.send(Message::Text(push.to_json().into())).await.is_err() {
			return;
		}
	}
}

async fn spawn_server(first_token: &str) -> String {
	let app = Router::new()
		.route("/{server}/{plugin}/{page}/{steamid}/{method}/{token}/{session}/", post(page))
		.route(
			"/switch/{server}/{plugin}/{new_page}/{page}/{steamid}/{method}/{token}/{session}/",
			post(switch),
		)
		.route(
			"/ws/{server}/{plugin}/{page}/{steamid}/{method}/{token}/{session}/",
			any(ws),
		)
		.with_state(Tokens::new(first_token));

	let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	tokio::spawn(async move {
		axum::serve(listener, app).await.unwrap();
	});
	addr.to_string()
}

fn init_string(token: &str) -> String {
	SessionDescriptor {
		server_id: "1".into(),
		plugin_id: "motd".into(),
		page_id: "home".into(),
		steam_id: "76561190000000000".into(),
		auth_method: AuthMethod::Password,
		auth_token: token.into(),
		session_id: "s1".into(),
	}
	.to_init_string()
}

async fn next(events: &mut WsEvents) -> Option<SessionEvent> {
	tokio::time::timeout(Duration::from_secs(5), events.recv())
		.await
		.expect("timed out waiting for session event")
}

#[tokio::test]
async fn http_exchanges_rotate_tokens_against_server() {
	let host = spawn_server("salt0").await;
	let endpoint = Endpoint::from_host(&host).unwrap();
	let client = SessionClient::connect(&init_string("salt0"), endpoint.clone()).unwrap();

	let reply = client.post(json!({"x": 1})).await.unwrap();
	assert_eq!(reply, json!({"echo": {"x": 1}}));
	assert_eq!(client.descriptor().auth_token, "web1");
	assert_eq!(client.descriptor().auth_method, AuthMethod::Token);

	// The original token was consumed; a second client holding it is refused.
	let stale = SessionClient::connect(&init_string("salt0"), endpoint).unwrap();
	let err = stale.post(json!({"x": 2})).await.unwrap_err();
	assert_eq!(err.to_string(), "ERROR_VIEW Invalid Auth.");
	assert_eq!(stale.descriptor().auth_token, "salt0");

	client.switch_page("scores").await.unwrap();
	assert_eq!(client.page_id(), "scores");
	assert_eq!(client.descriptor().auth_token, "web2");

	let reply = client.post(Value::Null).await.unwrap();
	assert_eq!(reply, json!({"echo": null}));
	assert!(!client.indicator().is_visible());
}

#[tokio::test]
async fn websocket_authenticates_pushes_and_closes() {
	let host = spawn_server("salt0").await;
	let client =
		SessionClient::connect(&init_string("salt0"), Endpoint::from_host(&host).unwrap())
			.unwrap();

	let mut events = client.open_ws().unwrap();
	assert_eq!(next(&mut events).await, Some(SessionEvent::Opened));
	assert_eq!(next(&mut events).await, Some(SessionEvent::Authenticated));
	assert_eq!(client.descriptor().auth_token, "web1");

	client.send_ws(json!({"name": "Bob"}));
	assert_eq!(
		next(&mut events).await,
		Some(SessionEvent::Message(json!({"echo": {"name": "Bob"}})))
	);

	// HTTP keeps working with the token the socket rotated.
	client.post(json!(1)).await.unwrap();
	assert_eq!(client.descriptor().auth_token, "web2");

	client.send_ws(json!("bye"));
	assert_eq!(next(&mut events).await, Some(SessionEvent::Closed));
	assert!(!client.is_ws_open());
}

#[tokio::test]
async fn websocket_with_stale_token_reports_rejection() {
	let host = spawn_server("salt0").await;
	let client =
		SessionClient::connect(&init_string("wrong"), Endpoint::from_host(&host).unwrap())
			.unwrap();

	let mut events = client.open_ws().unwrap();
	assert_eq!(next(&mut events).await, Some(SessionEvent::Opened));
	match next(&mut events).await {
		Some(SessionEvent::Error(failure)) => {
			assert_eq!(failure.code(), "ERROR_VIEW Invalid Auth.")
		}
		other => panic!("expected rejection, got {other:?}"),
	}
	assert_eq!(next(&mut events).await, Some(SessionEvent::Closed));
	assert_eq!(client.descriptor().auth_token, "wrong");
}
