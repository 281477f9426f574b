//! Interactive WebSocket session.
//!
//! Events are printed as they arrive. Each non-empty stdin line is parsed as
//! JSON and sent as custom data; lines that are not JSON are skipped with a
//! warning. EOF on stdin closes the socket from our side.
//!
//! Stdin is read on a plain thread; a blocking read on the runtime's pool
//! would keep the runtime from shutting down after a server close.

use std::io::BufRead;
use std::thread;

use anyhow::{Context, anyhow};
use motd::{SessionClient, SessionEvent};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::Result;
use crate::output::{EventRecord, ListenData, OutputFormat, ResultBuilder, print_event, print_result};

pub async fn execute(client: &SessionClient, format: OutputFormat) -> Result<()> {
	let builder = ResultBuilder::new("listen");
	let mut events = client.open_ws()?;

	let (tx, mut payloads) = mpsc::unbounded_channel();
	let reader = thread::spawn(move || forward_stdin(tx));

	let mut received = 0;
	let mut sent = 0;
	let closed_by = loop {
		tokio::select! {
			event = events.recv() => {
				let Some(event) = event else {
					break "server";
				};
				received += 1;
				let closed = event == SessionEvent::Closed;
				print_event(&EventRecord::from(event), format);
				if closed {
					break "server";
				}
			}
			payload = payloads.recv() => match payload {
				Some(payload) => {
					client.send_ws(payload);
					sent += 1;
				}
				None => {
					client.close_ws();
					break "client";
				}
			},
		}
	};
	info!(target: "motd_cli", closed_by, received, sent, "listen finished");

	// After a server close the reader stays parked on stdin until exit.
	if closed_by == "client" {
		reader
			.join()
			.map_err(|_| anyhow!("stdin reader panicked"))??;
	}

	let result = builder
		.data(ListenData {
			events: received,
			sent,
			closed_by: closed_by.to_string(),
			descriptor: client.descriptor(),
		})
		.build();
	print_result(&result, format);
	Ok(())
}

/// Feeds stdin lines, parsed as JSON, into `tx` until EOF.
fn forward_stdin(tx: mpsc::UnboundedSender<Value>) -> anyhow::Result<()> {
	for line in std::io::stdin().lock().lines() {
		let line = line.context("reading stdin")?;
		if let Some(payload) = parse_line(&line) {
			if tx.send(payload).is_err() {
				break;
			}
		}
	}
	Ok(())
}

fn parse_line(line: &str) -> Option<Value> {
	let line = line.trim();
	if line.is_empty() {
		return None;
	}
	match serde_json::from_str(line) {
		Ok(payload) => Some(payload),
		Err(err) => {
			warn!(target: "motd_cli", error = %err, "skipping stdin line that is not JSON");
			None
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn lines_parse_as_json() {
		assert_eq!(parse_line(r#"{"name":"Bob"}"#), Some(json!({"name": "Bob"})));
		assert_eq!(parse_line("  42 "), Some(json!(42)));
		assert_eq!(parse_line(r#""bye""#), Some(json!("bye")));
	}

	#[test]
	fn blank_and_invalid_lines_are_skipped() {
		assert_eq!(parse_line(""), None);
		assert_eq!(parse_line("   "), None);
		assert_eq!(parse_line("hello there"), None);
	}
}
