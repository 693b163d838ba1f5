//! HTTP 介面：axum router、共用狀態、graceful shutdown。
//!
//! | Route | 說明 |
//! | --- | --- |
//! | `GET /`, `POST /` | 車牌擷取（stub），POST 轉到客戶資料表單 |
//! | `GET /customer/{plate}`, `POST /customer/{plate}` | 客戶資料表單與 upsert，成功後轉到收據 |
//! | `GET /receipt/{plate}` | 收據頁，每次都重新產生條碼圖 |
//! | `GET /plates/{plate}` | 車牌狀態 (JSON) |
//! | `GET <barcode.url_prefix>/*` | 已產生的條碼圖 |

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use tokio::{net::TcpListener, signal::ctrl_c};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;

use crate::adapters::{Code128Barcodes, SqliteStore};
use crate::core::front_desk::FrontDesk;
use crate::core::{ConfigProvider, LicensePlate};
use crate::utils::error::Result;

pub mod routes;
pub mod views;

pub type Desk = FrontDesk<SqliteStore, Code128Barcodes>;

pub struct AppState {
    pub desk: Desk,
    pub barcode_dir: PathBuf,
    pub barcode_url_prefix: String,
}

impl AppState {
    pub fn new(desk: Desk, barcode_dir: PathBuf, barcode_url_prefix: String) -> Arc<Self> {
        Arc::new(Self {
            desk,
            barcode_dir,
            barcode_url_prefix,
        })
    }

    /// 開資料庫、建條碼目錄
    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Arc<Self>> {
        let store = SqliteStore::open(
            config.database_path(),
            Duration::from_millis(config.busy_timeout_ms()),
        )?;
        let barcodes = Code128Barcodes::new(
            config.barcode_dir(),
            config.barcode_url_prefix(),
            config.barcode_height(),
        )?;
        let placeholder = LicensePlate::parse(config.placeholder_plate())?;

        Ok(Self::new(
            FrontDesk::new(store, barcodes, placeholder),
            config.barcode_dir().to_path_buf(),
            config.barcode_url_prefix().to_string(),
        ))
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let barcode_prefix = state.barcode_url_prefix.clone();
    let barcodes = ServeDir::new(&state.barcode_dir);

    Router::new()
        .route("/", get(routes::capture_form).post(routes::capture_submit))
        .route(
            "/customer/{plate}",
            get(routes::customer_form).post(routes::submit_customer_info),
        )
        .route("/receipt/{plate}", get(routes::receipt))
        .route("/plates/{plate}", get(routes::plate_status))
        .nest_service(&barcode_prefix, barcodes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server<C: ConfigProvider>(config: &C, state: Arc<AppState>) -> Result<()> {
    let address = config.bind_address();
    info!("Binding to {address}");

    let listener = TcpListener::bind(address).await?;
    info!("🚿 Server running on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
