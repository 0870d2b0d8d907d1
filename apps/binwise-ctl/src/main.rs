use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = binwise_ctl::Args::parse();

	binwise_ctl::run(args).await
}
