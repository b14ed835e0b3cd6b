//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run UI.
//! No business logic here.

use bankseg::adapters::persistence::{JsonRepo, SqliteRepo};
use bankseg::adapters::ui::tui::TuiInputPort;
use bankseg::ports::{CustomerRepoPort, InputPort};
use bankseg::shared::config::{AppConfig, StorageBackend};
use bankseg::usecases::{AnalyticsService, ProfileService, SegmentationService, TransferService};
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    bankseg::adapters::ui::init_ui();

    let cfg = match AppConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(error = %e, "config could not be loaded, using defaults");
            AppConfig::default()
        }
    };

    let data_path = PathBuf::from(cfg.data_dir_or_default());
    tokio::fs::create_dir_all(&data_path)
        .await
        .map_err(|e| anyhow::anyhow!("create data dir: {}", e))?;
    let data_dir_abs = data_path
        .canonicalize()
        .unwrap_or_else(|_| data_path.clone());
    info!(path = %data_dir_abs.display(), "data directory");

    // --- Customer store ---
    let repo: Arc<dyn CustomerRepoPort> = match cfg.storage_or_default() {
        StorageBackend::Sqlite => Arc::new(
            SqliteRepo::connect(&data_path)
                .await
                .map_err(|e| anyhow::anyhow!("SQLite connect failed: {}", e))?,
        ),
        StorageBackend::Json => {
            let json = JsonRepo::new(data_path.join("customers.json"));
            json.load().await.map_err(|e| anyhow::anyhow!("{}", e))?;
            Arc::new(json)
        }
    };

    // --- Services ---
    let chunk_size = cfg.segmentation_chunk_size_or_default();
    let growth_window = cfg.growth_window_months_or_default();
    info!(
        storage = ?cfg.storage_or_default(),
        chunk_size,
        growth_window_months = growth_window,
        "services configured"
    );
    let segmentation = Arc::new(SegmentationService::new(Arc::clone(&repo), chunk_size));
    let analytics = Arc::new(AnalyticsService::new(Arc::clone(&repo), growth_window));
    let profiles = Arc::new(ProfileService::new(Arc::clone(&repo)));
    let transfer = Arc::new(TransferService::new(Arc::clone(&repo)));

    if let Some(path) = cfg.import_path.as_deref() {
        match transfer.seed_if_empty(&PathBuf::from(path)).await {
            Ok(Some(summary)) => info!(
                path,
                imported = summary.imported,
                rejected = summary.rejected,
                "seeded customer store"
            ),
            Ok(None) => {}
            Err(e) => warn!(path, error = %e, "seed import failed"),
        }
    }

    let input_port: Arc<dyn InputPort> = Arc::new(TuiInputPort::new(
        segmentation,
        analytics,
        profiles,
        transfer,
    ));

    // --- Run (main menu) ---
    input_port
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}
