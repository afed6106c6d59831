use anyhow::Result;
use rmcp::{
    ServiceExt,
    transport::{
        stdio,
        streamable_http_server::{StreamableHttpService, session::local::LocalSessionManager},
    },
};

use crate::config::TransportConfig;
use crate::server::ActivityServer;

/// Serve `server` over the transport named in `config` until shutdown.
pub async fn serve(server: ActivityServer, config: &TransportConfig) -> Result<()> {
    match config.transport.as_str() {
        "stdio" => serve_stdio(server).await,
        "streamable-http" | "http" => serve_http(server, &config.bind_address).await,
        other => {
            tracing::error!("Unknown transport: {other}");
            anyhow::bail!("Unknown transport: {other}. Use 'stdio' or 'streamable-http'")
        }
    }
}

async fn serve_stdio(server: ActivityServer) -> Result<()> {
    let session = server
        .serve(stdio())
        .await
        .inspect_err(|e| tracing::error!("Failed to start stdio session: {e:?}"))?;

    tracing::info!("Activity view listening on stdio");
    session.waiting().await?;

    tracing::info!("Stdio session ended");
    Ok(())
}

async fn serve_http(server: ActivityServer, bind_address: &str) -> Result<()> {
    // Each HTTP session gets its own handle onto the shared view
    let sessions = StreamableHttpService::new(
        move || {
            tracing::debug!("Opening activity view session");
            Ok(server.clone())
        },
        LocalSessionManager::default().into(),
        Default::default(),
    );

    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    let app = axum::Router::new().nest_service("/mcp", sessions);

    tracing::info!("Activity view listening at http://{bind_address}/mcp");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Unable to listen for shutdown signal: {e}");
            }
            tracing::info!("Shutdown requested");
        })
        .await?;

    tracing::info!("HTTP transport stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::ActivityStore;
    use crate::view::{
        ActivityViewModel, BusyCounter, Collaborators, FeatureGrants, NoticeLog, SystemClock,
    };
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_unknown_transport_is_rejected() {
        let store = ActivityStore::new();
        let notices = Arc::new(NoticeLog::default());
        let collaborators = Collaborators {
            service: Arc::new(store.clone()),
            notifier: notices.clone(),
            busy: Arc::new(BusyCounter::default()),
            clock: Arc::new(SystemClock),
        };
        let view = ActivityViewModel::enter(
            &FeatureGrants::new(["menu_user_activity"]),
            collaborators,
            Duration::from_secs(5),
        )
        .unwrap();
        let server = ActivityServer::new(Arc::new(view), store, notices);

        let config = TransportConfig {
            transport: "carrier-pigeon".to_string(),
            ..TransportConfig::default()
        };
        let err = serve(server, &config).await.unwrap_err();
        assert!(err.to_string().contains("Unknown transport: carrier-pigeon"));
    }
}
