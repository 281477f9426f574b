//! Wire types for the MOTD player session protocol.
//!
//! A MOTD page talks to its hosting server over plain HTTP POSTs and an
//! optional WebSocket. Both channels carry the full session descriptor in the
//! URL path and both rotate the descriptor's auth token on every successful
//! exchange. This crate holds the shapes of that conversation:
//!
//! - [`SessionDescriptor`] - identity decoded from the page's init string,
//!   plus the route builders that embed it in request paths
//! - [`ClientRequest`] / [`ServerReply`] - JSON bodies in each direction
//! - [`Reply`] - a classified server reply
//! - [`Failure`] - the error sentinels surfaced to page code
//!
//! Transport and session state live in `motd-player`; the browser binding
//! in `motd-web` reuses these types directly.

pub mod descriptor;
pub mod failure;
pub mod message;

pub use descriptor::*;
pub use failure::*;
pub use message::*;
