use motd::SessionClient;
use serde_json::Value;
use tracing::info;

use crate::error::Result;
use crate::output::{OutputFormat, PostData, ResultBuilder, print_result};

pub async fn execute(client: &SessionClient, json: &str, format: OutputFormat) -> Result<()> {
	let payload: Value = serde_json::from_str(json)?;
	let custom_data = client.post(payload).await?;
	info!(target: "motd_cli", page = %client.page_id(), "post accepted");

	let result = ResultBuilder::new("post")
		.data(PostData {
			custom_data,
			descriptor: client.descriptor(),
		})
		.build();
	print_result(&result, format);
	Ok(())
}
