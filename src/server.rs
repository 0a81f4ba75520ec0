use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use chrono::SecondsFormat;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    catalog::CatalogItem,
    date::DateKey,
    error::Resolution,
    response::{
        CheckUpdateResponse, DishResponse, Failure, HealthResponse, StorageResponse,
        REROLL_MESSAGE,
    },
    state,
    store::DishMap,
};

#[derive(Clone)]
pub struct AppState {
    dishes: Arc<state::State>,
}

impl AppState {
    pub fn new(dishes: state::State) -> Self {
        AppState {
            dishes: Arc::new(dishes),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/random-dish", get(get_dish).post(reroll_dish))
        .route("/api/storage", get(get_storage))
        .route("/api/check-update", get(check_update))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run_server(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    tracing::info!("HTTP server listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

/// Resolve on the blocking pool; store access is synchronous file io.
async fn resolve_with<F>(
    state: &AppState,
    resolve: F,
) -> Result<(DateKey, CatalogItem), Failure<CatalogItem>>
where
    F: FnOnce(&state::State) -> (DateKey, Resolution) + Send + 'static,
{
    let dishes = state.dishes.clone();
    let joined = tokio::task::spawn_blocking(move || resolve(&*dishes)).await;
    match joined {
        Ok((date, Ok(item))) => Ok((date, item)),
        Ok((date, Err(degraded))) => {
            tracing::warn!(%date, "{}", degraded);
            Ok((date, degraded.fallback))
        }
        Err(e) => {
            tracing::error!("dish resolution task failed: {}", e);
            Err(Failure::new(
                "Internal server error",
                state.dishes.fallback_item().clone(),
            ))
        }
    }
}

async fn get_dish(
    State(state): State<AppState>,
) -> Result<Json<DishResponse>, Failure<CatalogItem>> {
    let (date, item) = resolve_with(&state, |dishes| dishes.current()).await?;
    Ok(Json(DishResponse::new(item, date)))
}

async fn reroll_dish(
    State(state): State<AppState>,
) -> Result<Json<DishResponse>, Failure<CatalogItem>> {
    let (date, item) = resolve_with(&state, |dishes| {
        let today = dishes.today();
        (today, dishes.force_reroll(today))
    })
    .await?;
    Ok(Json(DishResponse::new(item, date).with_message(REROLL_MESSAGE)))
}

async fn get_storage(
    State(state): State<AppState>,
) -> Result<Json<StorageResponse>, Failure<DishMap>> {
    let dishes = state.dishes.clone();
    match tokio::task::spawn_blocking(move || dishes.all_dishes()).await {
        Ok(data) => Ok(Json(StorageResponse::new(data))),
        Err(e) => {
            tracing::error!("failed to read storage: {}", e);
            Err(Failure::new("Failed to read storage data", DishMap::new()))
        }
    }
}

async fn check_update(
    State(state): State<AppState>,
) -> Result<Json<CheckUpdateResponse>, Failure<Option<()>>> {
    let dishes = state.dishes.clone();
    let checked = tokio::task::spawn_blocking(move || {
        let store = dishes.store();
        let has_today_dish = store.get(&dishes.today()).is_some();
        let last_updated = if has_today_dish {
            store
                .last_modified()
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        } else {
            None
        };
        (has_today_dish, last_updated)
    })
    .await;
    match checked {
        Ok((has_today_dish, last_updated)) => Ok(Json(CheckUpdateResponse {
            success: true,
            has_today_dish,
            last_updated,
        })),
        Err(e) => {
            tracing::error!("failed to check update: {}", e);
            Err(Failure::new("Failed to check update", None))
        }
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}
