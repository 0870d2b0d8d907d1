use clap::builder::{
	Styles,
	styling::{AnsiColor, Effects},
};

/// Crate version, git revision and target triple, as printed by `--version`.
pub const VERSION: &str = concat!(
	env!("CARGO_PKG_VERSION"),
	"-",
	env!("VERGEN_GIT_SHA"),
	"-",
	env!("VERGEN_CARGO_TARGET_TRIPLE"),
);

pub fn styles() -> Styles {
	let heading = AnsiColor::Green.on_default() | Effects::BOLD;

	Styles::styled()
		.header(heading)
		.usage(heading)
		.literal(AnsiColor::Cyan.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Yellow.on_default())
		.valid(AnsiColor::Cyan.on_default())
		.invalid(AnsiColor::Red.on_default() | Effects::BOLD)
		.error(AnsiColor::Red.on_default() | Effects::BOLD)
}
