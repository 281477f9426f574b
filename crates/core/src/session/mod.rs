//! The rotating session and its two channels.
//!
//! Every successful exchange, HTTP or WebSocket, hands back the token that
//! must authenticate the next one. The client commits it to the descriptor
//! before reporting success, so the next request path is always built from
//! the newest token.


use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::task::{Context, Poll};

use futures_util::Stream;
use motd_protocol::{ClientRequest, Failure, Reply, SessionDescriptor, parse_reply};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::Endpoint;
use crate::error::Result;
use crate::indicator::PendingIndicator;
use crate::transport::{
	HttpTransport, ReqwestTransport, TungsteniteConnector, WsCommand, WsConnector, WsEvent,
};

/// What happened on the session's WebSocket.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
	/// Handshake completed.
	Opened,
	/// Server accepted the connection and issued a new token, which is
	/// already committed to the descriptor.
	Authenticated,
	/// Server push, payload unmodified.
	Message(Value),
	/// Server rejection, malformed frame, or transport error.
	Error(Failure),
	/// The server closed the socket or the transport failed. Never sent for
	/// a close requested through [`SessionClient::close_ws`].
	Closed,
}

/// Events of one WebSocket connection.
///
/// Ends after [`SessionEvent::Closed`], or without it once the connection is
/// closed by the client.
pub struct WsEvents {
	rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl WsEvents {
	pub async fn recv(&mut self) -> Option<SessionEvent> {
		self.rx.recv().await
	}
}

impl Stream for WsEvents {
	type Item = SessionEvent;

	fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		self.rx.poll_recv(cx)
	}
}

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

struct Connection {
	id: u64,
	commands: mpsc::UnboundedSender<WsCommand>,
	detached: Arc<AtomicBool>,
}

struct SessionState {
	descriptor: Mutex<SessionDescriptor>,
	connection: Mutex<Option<Connection>>,
}

/// Client for one MOTD page session.
///
/// Owns the session descriptor. HTTP exchanges may run concurrently; at most
/// one WebSocket is open at a time.
pub struct SessionClient {
	state: Arc<SessionState>,
	http: Arc<dyn HttpTransport>,
	ws: Arc<dyn WsConnector>,
	indicator: PendingIndicator,
}

impl SessionClient {
	/// Creates a client from the page init string and explicit transports.
	pub fn new(
		init: &str,
		http: Arc<dyn HttpTransport>,
		ws: Arc<dyn WsConnector>,
	) -> Result<Self> {
		let descriptor = SessionDescriptor::from_init_string(init)?;
		Ok(Self::from_descriptor(descriptor, http, ws))
	}

	/// Creates a client using the native `reqwest` and `tokio-tungstenite`
	/// transports.
	pub fn connect(init: &str, endpoint: Endpoint) -> Result<Self> {
		Self::new(
			init,
			Arc::new(ReqwestTransport::new(endpoint.clone())),
			Arc::new(TungsteniteConnector::new(endpoint)),
		)
	}

	pub fn from_descriptor(
		descriptor: SessionDescriptor,
		http: Arc<dyn HttpTransport>,
		ws: Arc<dyn WsConnector>,
	) -> Self {
		Self {
			state: Arc::new(SessionState {
				descriptor: Mutex::new(descriptor),
				connection: Mutex::new(None),
			}),
			http,
			ws,
			indicator: PendingIndicator::new(),
		}
	}

	/// Replaces the pending-request indicator, e.g. with one reporting to
	/// a UI sink.
	pub fn with_indicator(mut self, indicator: PendingIndicator) -> Self {
		self.indicator = indicator;
		self
	}

	pub fn indicator(&self) -> &PendingIndicator {
		&self.indicator
	}

	/// Snapshot of the current descriptor.
	pub fn descriptor(&self) -> SessionDescriptor {
		self.state.descriptor.lock().clone()
	}

	/// SteamID64 of the player this session belongs to.
	pub fn steam_id(&self) -> String {
		self.state.descriptor.lock().steam_id.clone()
	}

	pub fn page_id(&self) -> String {
		self.state.descriptor.lock().page_id.clone()
	}

	/// Path that reloads the current page with the current token.
	pub fn reload_route(&self) -> String {
		self.state.descriptor.lock().page_route()
	}

	/// Sends custom data to the page's plugin handler and returns the
	/// handler's reply.
	///
	/// # Errors
	///
	/// - [`Failure::HttpTransport`] if no 200 response arrived
	/// - [`Failure::Rejected`] if the server refused the exchange; the
	///   descriptor is left unchanged
	/// - [`Failure::MalformedResponse`] if the reply could not be read
	pub async fn post(&self, payload: Value) -> Result<Value> {
		let path = self.state.descriptor.lock().page_route();
		let (token, custom_data) = self
			.exchange(&path, ClientRequest::custom_data(payload))
			.await?;

		self.state.descriptor.lock().rotate(token);
		Ok(custom_data.unwrap_or(Value::Null))
	}

	/// Asks the server to move this session to `new_page_id`.
	///
	/// On success the descriptor's page id is updated. An open WebSocket is
	/// left as is and keeps the page id it was opened with.
	///
	/// # Errors
	///
	/// Same as [`post`](Self::post).
	pub async fn switch_page(&self, new_page_id: &str) -> Result<()> {
		let path = self.state.descriptor.lock().switch_route(new_page_id);
		let (token, _) = self.exchange(&path, ClientRequest::Switch).await?;

		let mut descriptor = self.state.descriptor.lock();
		descriptor.rotate(token);
		descriptor.commit_page(new_page_id);
		info!(target: "motd::http", page = new_page_id, "switched page");
		Ok(())
	}

	async fn exchange(
		&self,
		path: &str,
		request: ClientRequest,
	) -> std::result::Result<(String, Option<Value>), Failure> {
		let _pending = self.indicator.begin();
		let body = request.to_json();
		debug!(target: "motd::http", body = %body, "posting");

		let reply = self
			.http
			.post_json(path, body)
			.await
			.map_err(|err| {
				warn!(target: "motd::http", error = %err, "request failed");
				Failure::HttpTransport
			})?;

		if reply.status != 200 {
			warn!(target: "motd::http", status = reply.status, "unexpected http status");
			return Err(Failure::HttpTransport);
		}

		parse_reply(&reply.body)
			.and_then(Reply::into_exchange)
			.inspect_err(|failure| {
				warn!(target: "motd::http", error = %failure, "exchange refused");
			})
	}

	/// Capability check of the WebSocket transport.
	pub fn is_ws_supported(&self) -> bool {
		self.ws.is_supported()
	}

	pub fn is_ws_open(&self) -> bool {
		self.state.connection.lock().is_some()
	}

	/// Opens the session's WebSocket.
	///
	/// The URL embeds the descriptor as it is now. Must be called from within
	/// a tokio runtime.
	///
	/// # Errors
	///
	/// - [`Failure::WsAlreadyOpened`] if a connection is open; it is left
	///   untouched
	/// - [`Failure::WsUnsupported`] if the transport has no WebSocket support
	pub fn open_ws(&self) -> Result<WsEvents> {
		let mut slot = self.state.connection.lock();
		if slot.is_some() {
			return Err(Failure::WsAlreadyOpened.into());
		}
		if !self.ws.is_supported() {
			return Err(Failure::WsUnsupported.into());
		}

		let path = self.state.descriptor.lock().ws_route();
		let link = self.ws.open(&path);

		let id = NEXT_CONNECTION_ID.fetch_add(1, Ordering::SeqCst);
		let detached = Arc::new(AtomicBool::new(false));
		let (tx, rx) = mpsc::unbounded_channel();

		*slot = Some(Connection {
			id,
			commands: link.commands,
			detached: Arc::clone(&detached),
		});
		tokio::spawn(pump(Arc::clone(&self.state), id, detached, link.events, tx));

		info!(target: "motd::ws", connection = id, "websocket opening");
		Ok(WsEvents { rx })
	}

	/// Closes the session's WebSocket, if any.
	///
	/// The connection's event stream ends without [`SessionEvent::Closed`].
	pub fn close_ws(&self) {
		let mut slot = self.state.connection.lock();
		let Some(connection) = slot.take() else {
			return;
		};
		// The pump checks the flag under this lock before emitting anything.
		connection.detached.store(true, Ordering::SeqCst);
		drop(slot);
		let _ = connection.commands.send(WsCommand::Close);
		info!(target: "motd::ws", connection = connection.id, "websocket closed by client");
	}

	/// Sends custom data over the open WebSocket. Does nothing without one.
	///
	/// There is no acknowledgment; replies arrive as events.
	pub fn send_ws(&self, payload: Value) {
		let slot = self.state.connection.lock();
		let Some(connection) = slot.as_ref() else {
			debug!(target: "motd::ws", "no websocket, dropping payload");
			return;
		};
		let text = ClientRequest::custom_data(payload).to_json();
		debug!(target: "motd::ws", connection = connection.id, body = %text, "sending");
		let _ = connection.commands.send(WsCommand::Text(text));
	}
}

impl Drop for SessionClient {
	fn drop(&mut self) {
		self.close_ws();
	}
}

/// Turns socket events into session events, rotating the token on `OK`.
async fn pump(
	state: Arc<SessionState>,
	id: u64,
	detached: Arc<AtomicBool>,
	mut link: mpsc::UnboundedReceiver<WsEvent>,
	events: mpsc::UnboundedSender<SessionEvent>,
) {
	loop {
		let event = link.recv().await;
		if detached.load(Ordering::SeqCst) {
			return;
		}

		let session_event = match event {
			Some(WsEvent::Open) => {
				info!(target: "motd::ws", connection = id, "websocket open");
				SessionEvent::Opened
			}
			Some(WsEvent::Text(text)) => match parse_reply(&text) {
				Ok(Reply::Authenticated { token, .. }) => {
					state.descriptor.lock().rotate(token);
					SessionEvent::Authenticated
				}
				Ok(Reply::CustomData(data)) => SessionEvent::Message(data),
				Ok(Reply::Rejected(failure)) | Err(failure) => {
					warn!(target: "motd::ws", connection = id, error = %failure, "bad frame");
					SessionEvent::Error(failure)
				}
			},
			Some(WsEvent::Error(detail)) => {
				warn!(target: "motd::ws", connection = id, error = %detail, "websocket error");
				SessionEvent::Error(Failure::WsTransport)
			}
			Some(WsEvent::Closed) | None => {
				let mut slot = state.connection.lock();
				if detached.load(Ordering::SeqCst) || !slot.as_ref().is_some_and(|c| c.id == id) {
					return;
				}
				*slot = None;
				drop(slot);
				info!(target: "motd::ws", connection = id, "websocket closed");
				let _ = events.send(SessionEvent::Closed);
				return;
			}
		};

		// Held across the send so a concurrent `close_ws` either precedes or follows it.
		let _slot = state.connection.lock();
		if detached.load(Ordering::SeqCst) {
			return;
		}
		let _ = events.send(session_event);
	}
}
