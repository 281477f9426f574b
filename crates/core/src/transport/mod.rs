//! Transport seams between the session client and the network.
//!
//! - [`HttpTransport`]: one POST, one reply
//! - [`WsConnector`]: opens a WebSocket and hands back a [`WsLink`]
//!
//! Opening a WebSocket never blocks. Like a browser `WebSocket`, the
//! handshake runs in the background and its outcome arrives on the link as
//! [`WsEvent::Open`] or [`WsEvent::Error`] followed by [`WsEvent::Closed`].

mod http;
mod ws;


use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

pub use http::ReqwestTransport;
pub use ws::TungsteniteConnector;

/// Transport-level failure: no HTTP status, or a broken socket.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Raw HTTP reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
	pub status: u16,
	pub body: String,
}

/// Sends JSON POST requests to the MOTD server.
#[async_trait]
pub trait HttpTransport: Send + Sync {
	/// Posts `body` to `path` with the JSON content type.
	async fn post_json(&self, path: &str, body: String) -> Result<HttpReply, TransportError>;
}

/// Commands from the session to an open socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsCommand {
	Text(String),
	Close,
}

/// Events from a socket to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsEvent {
	/// Handshake completed.
	Open,
	/// Text frame from the server.
	Text(String),
	/// Transport error. Always followed by [`WsEvent::Closed`].
	Error(String),
	/// Socket is gone. Last event on the link.
	Closed,
}

/// Session side of an open socket.
pub struct WsLink {
	pub commands: mpsc::UnboundedSender<WsCommand>,
	pub events: mpsc::UnboundedReceiver<WsEvent>,
}

/// Transport side of an open socket.
pub struct WsPeer {
	pub commands: mpsc::UnboundedReceiver<WsCommand>,
	pub events: mpsc::UnboundedSender<WsEvent>,
}

impl WsLink {
	/// Creates a connected link/peer pair.
	pub fn pair() -> (WsLink, WsPeer) {
		let (command_tx, command_rx) = mpsc::unbounded_channel();
		let (event_tx, event_rx) = mpsc::unbounded_channel();
		(
			WsLink {
				commands: command_tx,
				events: event_rx,
			},
			WsPeer {
				commands: command_rx,
				events: event_tx,
			},
		)
	}
}

impl WsPeer {
	/// Reports a failed socket: error, then close.
	pub fn fail(&self, detail: impl Into<String>) {
		let _ = self.events.send(WsEvent::Error(detail.into()));
		let _ = self.events.send(WsEvent::Closed);
	}
}

/// Opens WebSocket connections.
pub trait WsConnector: Send + Sync {
	/// Capability check. Must not touch the network.
	fn is_supported(&self) -> bool {
		true
	}

	/// Starts connecting to `path` and returns the link immediately.
	fn open(&self, path: &str) -> WsLink;
}

/// Connector for environments without WebSocket support.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWebSocket;

impl WsConnector for NoWebSocket {
	fn is_supported(&self) -> bool {
		false
	}

	fn open(&self, _path: &str) -> WsLink {
		let (link, peer) = WsLink::pair();
		peer.fail("websocket not supported");
		link
	}
}
