use async_trait::async_trait;
use motd_protocol::JSON_CONTENT_TYPE;
use reqwest::header::CONTENT_TYPE;

use super::{HttpReply, HttpTransport, TransportError};
use crate::config::Endpoint;

/// HTTP transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
	client: reqwest::Client,
	endpoint: Endpoint,
}

impl ReqwestTransport {
	pub fn new(endpoint: Endpoint) -> Self {
		Self::with_client(reqwest::Client::new(), endpoint)
	}

	/// Uses a preconfigured client, e.g. one with a request timeout.
	pub fn with_client(client: reqwest::Client, endpoint: Endpoint) -> Self {
		Self { client, endpoint }
	}
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
	async fn post_json(&self, path: &str, body: String) -> Result<HttpReply, TransportError> {
		let response = self
			.client
			.post(self.endpoint.http_url(path))
			.header(CONTENT_TYPE, JSON_CONTENT_TYPE)
			.body(body)
			.send()
			.await
			.map_err(|e| TransportError(e.to_string()))?;

		let status = response.status().as_u16();
		let body = response
			.text()
			.await
			.map_err(|e| TransportError(e.to_string()))?;

		Ok(HttpReply { status, body })
	}
}
