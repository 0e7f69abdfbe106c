//! Warehouse Picking - Axum Server

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use warehouse_picking::config::AppConfig;
use warehouse_picking::console;
use warehouse_picking::planner::PickPlanner;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warehouse_picking=info".parse()?))
        .init();

    console::print_banner();

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    let warehouse = config.warehouse().context("Failed to load warehouse layout")?;

    let layout = warehouse.layout();
    let blocked = layout
        .to_flags()
        .iter()
        .flatten()
        .filter(|&&flag| flag == 1)
        .count();
    console::print_config(layout.rows(), layout.cols(), warehouse.shelves().len(), blocked);

    let planner = PickPlanner::new(Arc::new(warehouse), config.solver.clone())
        .with_console(config.server.console);
    let app = warehouse_picking::api::create_router(planner);

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, "Server listening");
    println!("Server listening on http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
