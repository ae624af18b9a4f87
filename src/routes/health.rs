// ABOUTME: Health check route handlers for service monitoring
// ABOUTME: Liveness reports the process is up, readiness checks the database and LLM provider
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Health check routes for load balancers and uptime monitors

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::json;
use tracing::warn;

use crate::resources::ServerResources;

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create all health check routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        async fn health_handler() -> Json<serde_json::Value> {
            Json(json!({
                "status": "healthy",
                "service": "mealwise-server",
                "timestamp": Utc::now().to_rfc3339()
            }))
        }

        async fn ready_handler(State(resources): State<Arc<ServerResources>>) -> Response {
            let database_ok = match sqlx::query("SELECT 1")
                .execute(resources.database.pool())
                .await
            {
                Ok(_) => true,
                Err(e) => {
                    warn!(error = %e, "Database readiness check failed");
                    false
                }
            };

            let llm = &resources.llm;
            let llm_ok = match llm.health_check().await {
                Ok(healthy) => {
                    if !healthy {
                        warn!(provider = llm.name(), "LLM provider reported unhealthy");
                    }
                    healthy
                }
                Err(e) => {
                    warn!(provider = llm.name(), error = %e, "LLM readiness check failed");
                    false
                }
            };
            let model = Some(resources.config.llm.model.as_str())
                .filter(|model| !model.is_empty())
                .unwrap_or_else(|| llm.default_model());

            let ready = database_ok && llm_ok;
            let body = Json(json!({
                "status": if ready { "ready" } else { "unavailable" },
                "checks": {
                    "database": check_status(database_ok),
                    "llm": {
                        "provider": llm.name(),
                        "model": model,
                        "status": check_status(llm_ok)
                    }
                },
                "timestamp": Utc::now().to_rfc3339()
            }));

            if ready {
                body.into_response()
            } else {
                (StatusCode::SERVICE_UNAVAILABLE, body).into_response()
            }
        }

        const fn check_status(ok: bool) -> &'static str {
            if ok {
                "ok"
            } else {
                "error"
            }
        }

        Router::new()
            .route("/health", get(health_handler))
            .route("/ready", get(ready_handler))
            .with_state(resources)
    }
}
