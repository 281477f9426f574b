use motd::SessionClient;

use crate::error::Result;
use crate::output::{OutputFormat, ResultBuilder, SwitchData, print_result};

pub async fn execute(client: &SessionClient, page: &str, format: OutputFormat) -> Result<()> {
	client.switch_page(page).await?;

	let result = ResultBuilder::new("switch")
		.data(SwitchData {
			page_id: client.page_id(),
			descriptor: client.descriptor(),
			reload_route: client.reload_route(),
		})
		.build();
	print_result(&result, format);
	Ok(())
}
