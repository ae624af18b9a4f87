// ABOUTME: Server binary for the Mealwise recipe and meal planning API
// ABOUTME: Loads configuration, prepares the database and serves HTTP until shutdown
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Mealwise API Server Binary

use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use mealwise_server::{
    config::{DatabaseUrl, ServerConfig},
    database::Database,
    logging,
    resources::ServerResources,
    server::MealwiseServer,
};
use tracing::{error, info};

/// Command-line overrides for environment configuration
#[derive(Parser)]
#[command(name = "mealwise-server")]
#[command(about = "Mealwise API - recipe generation, receipt analysis and meal planning")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL (e.g. `sqlite:./data/mealwise.db`)
    #[arg(long)]
    database_url: Option<String>,
}

/// Create the parent directory of a file-backed database
fn ensure_database_dir(url: &DatabaseUrl) -> Result<()> {
    if let DatabaseUrl::SQLite { path } = url {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory {}", parent.display())
            })?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(database_url) = args.database_url {
        config.database.url = DatabaseUrl::parse_url(&database_url);
    }

    info!("Starting Mealwise API");
    info!("{}", config.summary());

    ensure_database_dir(&config.database.url)?;
    let database = Database::new(&config.database.url.to_connection_string()).await?;
    info!("Database URL: {}", config.database.url);

    let port = config.http_port;
    let resources = Arc::new(ServerResources::from_config(Arc::new(config), database)?);
    let server = MealwiseServer::new(resources);

    info!("Ready to generate recipes on port {port}");

    if let Err(e) = server.run(port).await {
        error!("Server error: {e}");
        return Err(e.into());
    }

    Ok(())
}
