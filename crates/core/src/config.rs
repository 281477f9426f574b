//! Where the MOTD web server lives.

use url::Url;

use crate::error::{Error, Result};

/// Base URLs for both channels.
///
/// Request paths built from the session descriptor are appended to these
/// bases, so any path prefix on a base is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
	http_base: Url,
	ws_base: Url,
}

impl Endpoint {
	/// Builds an endpoint from `host[:port]` (plain `http://` and `ws://`),
	/// or from an `http(s)://` URL, in which case the WebSocket base uses the
	/// matching `ws(s)://` scheme.
	pub fn from_host(host: &str) -> Result<Self> {
		let host = host.trim();
		let http = if host.contains("://") {
			host.to_string()
		} else {
			format!("http://{host}")
		};
		let http_base = parse(&http)?;

		let ws_scheme = match http_base.scheme() {
			"http" => "ws",
			"https" => "wss",
			other => {
				return Err(Error::InvalidEndpoint {
					input: host.to_string(),
					reason: format!("unsupported scheme '{other}'"),
				});
			}
		};
		let mut ws_base = http_base.clone();
		ws_base
			.set_scheme(ws_scheme)
			.map_err(|()| Error::InvalidEndpoint {
				input: host.to_string(),
				reason: "cannot derive websocket url".into(),
			})?;

		Ok(Self { http_base, ws_base })
	}

	/// Builds an endpoint from explicit base URLs.
	pub fn new(http_base: &str, ws_base: &str) -> Result<Self> {
		Ok(Self {
			http_base: parse(http_base)?,
			ws_base: parse(ws_base)?,
		})
	}

	/// Full URL of an HTTP route.
	pub fn http_url(&self, path: &str) -> String {
		join(&self.http_base, path)
	}

	/// Full URL of a WebSocket route.
	pub fn ws_url(&self, path: &str) -> String {
		join(&self.ws_base, path)
	}

	pub fn http_base(&self) -> &Url {
		&self.http_base
	}

	pub fn ws_base(&self) -> &Url {
		&self.ws_base
	}
}

fn parse(input: &str) -> Result<Url> {
	let url = Url::parse(input).map_err(|e| Error::InvalidEndpoint {
		input: input.to_string(),
		reason: e.to_string(),
	})?;
	if url.cannot_be_a_base() || url.host_str().is_none() {
		return Err(Error::InvalidEndpoint {
			input: input.to_string(),
			reason: "missing host".into(),
		});
	}
	Ok(url)
}

fn join(base: &Url, path: &str) -> String {
	format!("{}{}", base.as_str().trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn host_gets_plain_schemes() {
		let endpoint = Endpoint::from_host("127.0.0.1:5000").unwrap();
		assert_eq!(endpoint.http_url("/1/motd/"), "http://127.0.0.1:5000/1/motd/");
		assert_eq!(endpoint.ws_url("/ws/1/motd/"), "ws://127.0.0.1:5000/ws/1/motd/");
	}

	#[test]
	fn https_url_maps_to_wss() {
		let endpoint = Endpoint::from_host("https://motd.example.com").unwrap();
		assert_eq!(endpoint.ws_url("/ws/x/"), "wss://motd.example.com/ws/x/");
	}

	#[test]
	fn base_path_prefix_is_kept() {
		let endpoint = Endpoint::from_host("http://example.com/motdplayer/").unwrap();
		assert_eq!(
			endpoint.http_url("/1/motd/home/"),
			"http://example.com/motdplayer/1/motd/home/"
		);
	}

	#[test]
	fn unsupported_scheme_is_rejected() {
		let err = Endpoint::from_host("ftp://example.com").unwrap_err();
		assert!(err.to_string().contains("unsupported scheme"));
	}

	#[test]
	fn explicit_bases() {
		let endpoint = Endpoint::new("http://a:1", "ws://b:2").unwrap();
		assert_eq!(endpoint.http_url("/p/"), "http://a:1/p/");
		assert_eq!(endpoint.ws_url("/ws/p/"), "ws://b:2/ws/p/");
	}
}
