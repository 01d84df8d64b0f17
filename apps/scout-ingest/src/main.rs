use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = scout_ingest::Args::parse();

	scout_ingest::run(args).await
}
