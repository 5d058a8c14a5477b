use tracing_subscriber::EnvFilter;
use zephyr::App;

mod app_module;
mod modules;

use app_module::AppModule;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,zephyr=debug")),
        )
        .init();

    tracing::info!("🚀 Starting demo server...");

    // Reads zephyr.config.json (or .toml) from the working directory, then
    // HOST / PORT from the environment.
    let app = App::builder().module(AppModule).build().await?;

    for failure in app.failures() {
        tracing::warn!(module = %failure.module, "Module skipped: {}", failure.error);
    }
    for route in app.routes() {
        tracing::info!("{} {} -> {}::{}", route.method, route.path, route.controller, route.handler_name);
    }

    app.listen().await?;

    tracing::info!("👋 Server stopped");
    Ok(())
}
