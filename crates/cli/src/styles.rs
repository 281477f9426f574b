//! Colors for `motd --help` and clap's usage errors.

use clap::builder::Styles;
use clap::builder::styling::AnsiColor;

/// Help styling for the `decode`/`post`/`switch`/`listen` commands.
///
/// Flag names and `<HOST>`/`<B64>` placeholders share one color so they
/// read as things to type. Rejected values (a bad `--format`, a missing
/// payload) are flagged in yellow under a red error header.
pub fn help_styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Green.on_default().bold())
		.usage(AnsiColor::Green.on_default().bold())
		.literal(AnsiColor::Cyan.on_default().bold())
		.placeholder(AnsiColor::Cyan.on_default())
		.valid(AnsiColor::Cyan.on_default())
		.invalid(AnsiColor::Yellow.on_default().bold())
		.error(AnsiColor::Red.on_default().bold())
}
