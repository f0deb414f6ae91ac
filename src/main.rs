use std::net::SocketAddr;
use std::sync::Arc;

use dotenvy::dotenv;
use invoice_flow::infrastructure::{database, storage};
use invoice_flow::services::file_service::FileService;
use invoice_flow::services::reconciler::Reconciler;
use invoice_flow::services::status_table::SeaOrmStatusTable;
use invoice_flow::services::worker::BackgroundWorker;
use invoice_flow::{AppState, create_app};
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize tracing with EnvFilter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "invoice_flow=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting Invoice Flow...");

    let config = invoice_flow::config::AppConfig::from_env();
    info!(
        "⚙️  Config: Max Size={}MB, Reconcile every {}s, Page Size={}",
        config.max_file_size / 1024 / 1024,
        config.reconcile_interval_secs,
        config.default_page_size
    );

    // Setup Infrastructure
    let db = database::setup_database().await?;
    let store = storage::setup_storage().await;
    let table = Arc::new(SeaOrmStatusTable::new(db.clone()));

    let reconciler = Arc::new(Reconciler::new(store.clone(), table.clone()));
    let files = Arc::new(FileService::new(store, table, config.clone()));

    // Heal any drift that accumulated while the service was down.
    match reconciler.run().await {
        Ok(report) => info!(
            "🔄 Startup reconciliation: +{} rows, -{} rows, {} failures",
            report.inserted, report.deleted, report.failed
        ),
        Err(e) => tracing::error!("Startup reconciliation failed: {}", e),
    }

    let state = AppState {
        db: db.clone(),
        files,
        reconciler: reconciler.clone(),
        config: config.clone(),
    };

    // Setup Shutdown Channel
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    // Start Background Worker
    let worker = BackgroundWorker::new(reconciler, config.reconcile_interval_secs, shutdown_rx);
    tokio::spawn(async move {
        worker.run().await;
    });

    let app = create_app(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        info!(
                            "📤 Finished in {:?} with status {}",
                            latency,
                            response.status()
                        );
                    },
                ),
        )
        .layer(CorsLayer::permissive())
        .layer(axum::extract::DefaultBodyLimit::max(config.max_file_size));

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!("✅ Server ready at http://{}", addr);
    info!("📖 Swagger UI: http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(true);
        })
        .await?;

    info!("🛑 Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, starting graceful shutdown...");
        },
    }
}
