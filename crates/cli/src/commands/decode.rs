//! Offline view of an init string.

use motd_protocol::SessionDescriptor;

use crate::error::Result;
use crate::output::{DecodeData, OutputFormat, ResultBuilder, RoutesData, print_result};

pub fn execute(init: &str, format: OutputFormat) -> Result<()> {
	let descriptor = SessionDescriptor::from_init_string(init).map_err(motd::Error::from)?;
	let routes = RoutesData::of(&descriptor);

	let result = ResultBuilder::new("decode")
		.data(DecodeData { descriptor, routes })
		.build();
	print_result(&result, format);
	Ok(())
}
