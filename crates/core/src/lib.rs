//! motd: session client for MOTD player pages
//!
//! A MOTD page session authenticates every request with a token the server
//! rotates on each successful exchange. [`SessionClient`] owns that rotating
//! descriptor and offers both channels the server speaks:
//!
//! - **HTTP**: [`SessionClient::post`] and [`SessionClient::switch_page`],
//!   one request and one reply each
//! - **WebSocket**: at most one connection per session, opened with
//!   [`SessionClient::open_ws`] and observed through a stream of
//!   [`SessionEvent`]s
//!
//! # Example
//!
//! ```ignore
//! use motd::{Endpoint, SessionClient, SessionEvent};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let endpoint = Endpoint::from_host("127.0.0.1:5000")?;
//!     let client = SessionClient::connect(init_string, endpoint)?;
//!
//!     let reply = client.post(json!({"action": "get-scores"})).await?;
//!     println!("scores: {reply}");
//!
//!     let mut events = client.open_ws()?;
//!     while let Some(event) = events.recv().await {
//!         if let SessionEvent::Message(data) = event {
//!             client.send_ws(json!({"ack": data}));
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Transports
//!
//! The client talks through [`HttpTransport`] and [`WsConnector`]. Native
//! implementations ([`ReqwestTransport`], [`TungsteniteConnector`]) are
//! wired up by [`SessionClient::connect`]; tests and embedders can supply
//! their own.

pub mod config;
pub mod error;
pub mod indicator;
pub mod session;
pub mod transport;

pub use config::Endpoint;
pub use error::{Error, Result};
pub use indicator::{IndicatorSink, PendingGuard, PendingIndicator};
pub use motd_protocol::{AuthMethod, Failure, SessionDescriptor};
pub use session::{SessionClient, SessionEvent, WsEvents};
pub use transport::{
	HttpReply, HttpTransport, NoWebSocket, ReqwestTransport, TransportError,
	TungsteniteConnector, WsCommand, WsConnector, WsEvent, WsLink, WsPeer,
};
