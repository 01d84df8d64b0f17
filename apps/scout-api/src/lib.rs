pub mod routes;
pub mod state;

use std::{future, net::SocketAddr};

use clap::Parser;
use color_eyre::eyre;
use tokio::{net::TcpListener, signal};

use scout_cli::ConfigArgs;

use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(
	version = scout_cli::VERSION,
	rename_all = "kebab",
	styles = scout_cli::styles(),
)]
pub struct Args {
	#[command(flatten)]
	pub config: ConfigArgs,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = scout_config::load(&args.config.config)?;

	scout_cli::init_tracing(&config.service.log_level);

	let http_addr: SocketAddr = config.service.http_bind.parse()?;

	if config.security.bind_localhost_only && !http_addr.ip().is_loopback() {
		return Err(eyre::eyre!(
			"http_bind must be a loopback address when bind_localhost_only is true."
		));
	}

	let state = AppState::new(config).await?;
	let app = routes::router(state.clone());
	let http_listener = TcpListener::bind(http_addr).await?;

	tracing::info!(%http_addr, version = scout_cli::VERSION, "HTTP server listening.");

	axum::serve(http_listener, app).with_graceful_shutdown(shutdown_signal()).await?;

	state.service.shutdown().await;

	Ok(())
}

async fn shutdown_signal() {
	match signal::ctrl_c().await {
		Ok(()) => tracing::info!("Shutdown signal received. Draining connections."),
		Err(err) => {
			tracing::error!(error = %err, "Failed to listen for the shutdown signal.");

			future::pending::<()>().await;
		},
	}
}
