use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use config::Config;
use server::AppState;
use state::State;

mod catalog;
mod config;
mod date;
mod dishfile;
mod error;
mod response;
mod selector;
mod server;
mod state;
mod store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_args(std::env::args().skip(1))?;
    let state = State::new(&config)?;

    let addr = SocketAddr::new(config.address()?, config.port()?);
    let listener = TcpListener::bind(addr).await?;
    server::run_server(listener, AppState::new(state)).await
}
