// ABOUTME: HTTP server assembly and lifecycle
// ABOUTME: Merges the route groups, applies middleware layers and serves until a shutdown signal
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use crate::errors::{AppError, AppResult};
use crate::middleware::{apply_request_layers, setup_cors};
use crate::resources::ServerResources;
use crate::routes::{AuthRoutes, HealthRoutes, MealPlanRoutes, ReceiptRoutes, RecipeRoutes};

/// Mealwise HTTP server
pub struct MealwiseServer {
    resources: Arc<ServerResources>,
}

impl MealwiseServer {
    /// Create a server over shared resources
    #[must_use]
    pub const fn new(resources: Arc<ServerResources>) -> Self {
        Self { resources }
    }

    /// Build the complete application router
    #[must_use]
    pub fn router(&self) -> Router {
        let resources = &self.resources;

        let router = Router::new()
            .merge(HealthRoutes::routes(Arc::clone(resources)))
            .merge(AuthRoutes::routes(Arc::clone(resources)))
            .merge(RecipeRoutes::routes(Arc::clone(resources)))
            .merge(MealPlanRoutes::routes(Arc::clone(resources)))
            .merge(ReceiptRoutes::routes(Arc::clone(resources)))
            .layer(setup_cors(&resources.config.cors));

        apply_request_layers(router)
    }

    /// Bind to `port` on all interfaces and serve until Ctrl+C or SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the port cannot be bound or the server fails.
    pub async fn run(self, port: u16) -> AppResult<()> {
        let address = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(address)
            .await
            .map_err(|e| AppError::internal(format!("Failed to bind {address}: {e}")))?;

        info!(%address, "HTTP server listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| AppError::internal(format!("HTTP server error: {e}")))?;

        info!("HTTP server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
