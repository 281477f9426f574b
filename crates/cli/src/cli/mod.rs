
use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use crate::styles::help_styles;

/// Drive a MOTD player session from the terminal.
#[derive(Parser, Debug)]
#[command(name = "motd")]
#[command(about = "MOTD player session client - rotating-token HTTP and WebSocket")]
#[command(version)]
#[command(styles = help_styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format: text (default), json, or ndjson
	#[arg(short = 'f', long, global = true, value_enum, default_value = "text")]
	pub format: OutputFormat,

	/// MOTD web server, as host[:port] or an http(s) URL
	#[arg(long, global = true, env = "MOTD_HOST", value_name = "HOST")]
	pub host: Option<String>,

	/// Base64 init string the page was rendered with
	#[arg(long, global = true, env = "MOTD_INIT", value_name = "B64")]
	pub init: Option<String>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
	/// Decode the init string and show the request routes it yields
	Decode,

	/// Post custom data to the page's handler
	Post {
		/// JSON payload, e.g. '{"name":"Bob"}'
		#[arg(value_name = "JSON")]
		json: String,
	},

	/// Switch the session to another page
	Switch {
		/// Page id to switch to
		#[arg(value_name = "PAGE")]
		page: String,
	},

	/// Open the WebSocket, print its events and send stdin lines as JSON
	Listen,
}

impl Commands {
	/// Name used in output envelopes.
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Decode => "decode",
			Commands::Post { .. } => "post",
			Commands::Switch { .. } => "switch",
			Commands::Listen => "listen",
		}
	}
}
