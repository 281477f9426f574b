use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

use super::{WsCommand, WsConnector, WsEvent, WsLink, WsPeer};
use crate::config::Endpoint;

/// WebSocket connector backed by `tokio-tungstenite`.
///
/// Each open spawns one task that owns the socket for its whole life.
/// Must be used from within a tokio runtime.
#[derive(Debug, Clone)]
pub struct TungsteniteConnector {
	endpoint: Endpoint,
}

impl TungsteniteConnector {
	pub fn new(endpoint: Endpoint) -> Self {
		Self { endpoint }
	}
}

impl WsConnector for TungsteniteConnector {
	fn open(&self, path: &str) -> WsLink {
		let (link, peer) = WsLink::pair();
		tokio::spawn(run_socket(self.endpoint.ws_url(path), peer));
		link
	}
}

async fn run_socket(url: String, mut peer: WsPeer) {
	let stream = match connect_async(url.as_str()).await {
		Ok((stream, _response)) => stream,
		Err(err) => {
			debug!(target: "motd::ws", error = %err, "websocket handshake failed");
			peer.fail(err.to_string());
			return;
		}
	};
	let _ = peer.events.send(WsEvent::Open);

	let (mut sink, mut stream) = stream.split();

	loop {
		tokio::select! {
			command = peer.commands.recv() => match command {
				Some(WsCommand::Text(text)) => {
					if let Err(err) = sink.send(Message::Text(text)).await {
						peer.fail(err.to_string());
						return;
					}
				}
				// Session closed the socket or went away.
				Some(WsCommand::Close) | None => {
					let _ = sink.close().await;
					let _ = peer.events.send(WsEvent::Closed);
					return;
				}
			},
			frame = stream.next() => match frame {
				Some(Ok(Message::Text(text))) => {
					let _ = peer.events.send(WsEvent::Text(text));
				}
				Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
					Ok(text) => {
						let _ = peer.events.send(WsEvent::Text(text));
					}
					Err(_) => debug!(target: "motd::ws", "dropping non-UTF-8 binary frame"),
				},
				Some(Ok(Message::Close(_))) | None => {
					let _ = peer.events.send(WsEvent::Closed);
					return;
				}
				Some(Ok(_)) => {}
				Some(Err(err)) => {
					peer.fail(err.to_string());
					return;
				}
			},
		}
	}
}
