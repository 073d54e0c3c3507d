use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use coin_dashboard_core::models::coin::PriceLookup;
use coin_dashboard_core::services::directory_service::DirectoryService;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};

use crate::error::ApiError;

/// Shared state of the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<DirectoryService>,
}

/// Build the router:
/// - `GET /`                → `index.html` from `public_dir`
/// - `GET /api/price/:coin` → directory lookup + live price
/// - anything else          → static file from `public_dir`
pub fn build_router(state: AppState, public_dir: impl AsRef<FsPath>) -> Router {
    let public_dir: PathBuf = public_dir.as_ref().to_path_buf();

    Router::new()
        .route_service("/", ServeFile::new(public_dir.join("index.html")))
        .route("/api/price/:coin", get(price_handler))
        .fallback_service(ServeDir::new(public_dir))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn price_handler(
    State(state): State<AppState>,
    Path(coin): Path<String>,
) -> Result<Json<PriceLookup>, ApiError> {
    match state.directory.lookup_price(&coin).await {
        Ok(lookup) => Ok(Json(lookup)),
        Err(e) => {
            let err = ApiError::from(e);
            if let ApiError::Upstream(details) = &err {
                tracing::warn!("Price lookup for {coin:?} failed: {details}");
            }
            Err(err)
        }
    }
}
