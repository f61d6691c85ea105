pub mod adapters;
mod app;
pub mod client;
pub mod config;
pub mod error;
pub mod ports;
pub mod push;
pub mod registry;
mod state;
pub mod types;
pub mod webhook;

pub use app::{app, app_with_store};
pub use push::generate_vapid_credentials;

use std::net::SocketAddr;

pub async fn serve(addr: SocketAddr, config: config::AppConfig) -> Result<(), error::ServeError> {
    let router = app(config)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "chat push relay listening");
    axum::serve(listener, router).await?;
    Ok(())
}
