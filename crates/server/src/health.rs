use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};

use trivia_db::LinkRepository;

#[derive(Clone)]
pub struct HealthState {
    links: Arc<dyn LinkRepository>,
}

impl HealthState {
    pub fn new(links: Arc<dyn LinkRepository>) -> Self {
        Self { links }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub database: HealthCheck,
    pub archived_links: Option<u64>,
    pub checked_at: String,
}

pub fn router(links: Arc<dyn LinkRepository>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState::new(links))
}

pub async fn spawn(
    bind_address: &str,
    port: u16,
    links: Arc<dyn LinkRepository>,
) -> std::io::Result<()> {
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        event_name = "system.health.start",
        correlation_id = "bootstrap",
        bind_address = %address,
        "health endpoint started"
    );

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router(links)).await {
            error!(
                event_name = "system.health.error",
                correlation_id = "bootstrap",
                error = %error,
                "health endpoint server terminated unexpectedly"
            );
        }
    });

    Ok(())
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let (database, archived_links) = match state.links.count().await {
        Ok(count) => (
            HealthCheck { status: "ready", detail: "link archive query succeeded".to_string() },
            Some(count),
        ),
        Err(error) => (
            HealthCheck {
                status: "degraded",
                detail: format!("link archive query failed: {error}"),
            },
            None,
        ),
    };
    let ready = database.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "trivia-server runtime initialized".to_string(),
        },
        database,
        archived_links,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, Json};
    use chrono::Utc;

    use trivia_core::domain::link::{LinkKind, LinkRecord};
    use trivia_db::{connect_with_settings, migrations, LinkRepository, SqlLinkRepository};

    use crate::health::{health, HealthState};

    async fn archive() -> (trivia_db::DbPool, Arc<SqlLinkRepository>) {
        let pool =
            connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool should connect");
        migrations::run_pending(&pool).await.expect("migrations");
        let links = Arc::new(SqlLinkRepository::new(pool.clone()));
        (pool, links)
    }

    #[tokio::test]
    async fn health_reports_the_archive_size() {
        let (pool, links) = archive().await;
        links
            .insert(&LinkRecord {
                url: "https://forms.gle/health".to_owned(),
                captured_at: Utc::now(),
                submitter: "host".to_owned(),
                title: None,
                kind: LinkKind::Form,
            })
            .await
            .expect("insert");

        let (status, Json(payload)) = health(State(HealthState::new(links))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.database.status, "ready");
        assert_eq!(payload.service.status, "ready");
        assert_eq!(payload.archived_links, Some(1));

        pool.close().await;
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_when_database_is_unavailable() {
        let (pool, links) = archive().await;
        pool.close().await;

        let (status, Json(payload)) = health(State(HealthState::new(links))).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.database.status, "degraded");
        assert_eq!(payload.service.status, "ready");
        assert_eq!(payload.archived_links, None);
    }
}
