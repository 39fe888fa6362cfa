use anyhow::Result;
use axum::Router;
use domin8_core::Config;

/// Bind the listener and serve until SIGINT or SIGTERM; in-flight deliveries finish first.
pub async fn start_server(config: &Config, app: Router) -> Result<()> {
    let addr = format!("0.0.0.0:{}", config.server_port());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        addr = %addr,
        storage_mode = ?config.storage_mode(),
        output_dir = %config.output_dir().display(),
        public_dir = %config.public_dir().display(),
        max_upload_mb = config.max_upload_size_bytes() / 1024 / 1024,
        ffmpeg_path = %config.ffmpeg_path(),
        max_concurrent_transcodes = config.max_concurrent_transcodes(),
        delivery_encryption = config.delivery_encryption(),
        "domin8 listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    // A source whose handler cannot be installed never fires; the other still can
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let signal = tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    };
    tracing::info!(signal, "Shutting down, draining open requests");
}
