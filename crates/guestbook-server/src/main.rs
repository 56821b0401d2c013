mod config;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use guestbook_api::AppStateInner;
use guestbook_db::{MemorySheet, RemoteSheet, RowStore, ServiceAccountKey, SqliteSheet};
use guestbook_theme::{HeuristicOnly, HolidayCalendar, HolidayTable};

use config::{Config, StoreKind};

/// How often idle sessions are looked for.
const SESSION_SWEEP_EVERY: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "guestbook=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    let store = open_store(&config).await?;
    let calendar = open_calendar(&config);
    let state = AppStateInner::new(store, calendar, config.app_url.clone())?;

    tokio::spawn(guestbook_api::session::run_session_sweep(
        state.sessions.clone(),
        config.session_idle,
        SESSION_SWEEP_EVERY.min(config.session_idle),
    ));

    let app = guestbook_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Guestbook listening on {} (share link {})", addr, config.app_url);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn RowStore>> {
    match config.store {
        StoreKind::Sqlite => {
            let sheet = SqliteSheet::open(&config.db_path)?;
            info!("Messages stored in {}", config.db_path.display());
            Ok(Arc::new(sheet))
        }
        StoreKind::Memory => {
            warn!("Messages are kept in memory and lost on restart");
            Ok(Arc::new(MemorySheet::with_header()))
        }
        StoreKind::Sheets => {
            let credentials = config.credentials.clone().context("missing credentials path")?;
            let sheet_id = config.sheet_id.clone().context("missing sheet id")?;
            let range = config.sheet_range.clone();
            // the blocking HTTP client must not be built on a runtime thread
            let sheet = tokio::task::spawn_blocking(move || {
                let key = ServiceAccountKey::load(&credentials)?;
                RemoteSheet::new(key, &sheet_id, &range)
            })
            .await??;
            Ok(Arc::new(sheet))
        }
    }
}

fn open_calendar(config: &Config) -> Arc<dyn HolidayCalendar> {
    let Some(path) = &config.holiday_file else {
        return Arc::new(HeuristicOnly);
    };
    match HolidayTable::load(path) {
        Ok(table) => Arc::new(table),
        Err(e) => {
            warn!("Holiday table unavailable, using date ranges only: {:#}", e);
            Arc::new(HeuristicOnly)
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
