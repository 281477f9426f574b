mod decode;
mod listen;
mod post;
mod switch;

use motd::{Endpoint, SessionClient};

use crate::cli::{Cli, Commands};
use crate::error::{CliError, Result};

pub async fn dispatch(cli: Cli) -> Result<()> {
	let format = cli.format;
	let init = require(cli.init, "init", "MOTD_INIT")?;

	match cli.command {
		Commands::Decode => decode::execute(&init, format),
		Commands::Post { json } => post::execute(&session(cli.host, &init)?, &json, format).await,
		Commands::Switch { page } => {
			switch::execute(&session(cli.host, &init)?, &page, format).await
		}
		Commands::Listen => listen::execute(&session(cli.host, &init)?, format).await,
	}
}

fn require(value: Option<String>, flag: &'static str, env: &'static str) -> Result<String> {
	value
		.filter(|v| !v.trim().is_empty())
		.ok_or(CliError::MissingArg { flag, env })
}

fn session(host: Option<String>, init: &str) -> Result<SessionClient> {
	let host = require(host, "host", "MOTD_HOST")?;
	let endpoint = Endpoint::from_host(&host)?;
	Ok(SessionClient::connect(init, endpoint)?)
}
