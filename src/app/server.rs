//! HTTP API
//!
//! - `GET /api/storenews`: フィードを取得して新規分を保存
//! - `GET /api/fetchnews?limit=&offset=`: 当日（なければ前日）のニュース

use crate::{
    app::workflow::{execute_store_workflow, StoreOutcome},
    domain::{
        feed::{resolve_feeds, Feed},
        today::{fetch_day_news, DayNews, Page},
    },
    infra::{
        api::http::{HttpClient, ReqwestHttpClient},
        config::AppConfig,
        db::setup_database,
    },
    types::StoreError,
};
use anyhow::Context;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::FixedOffset;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

/// ハンドラ間で共有する状態
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub http_client: Arc<dyn HttpClient>,
    pub feeds: Arc<Vec<Feed>>,
    pub utc_offset: FixedOffset,
}

/// HTTP向けのエラー。本文は `{"error": ..., "detail": ...}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: String,
    detail: Option<String>,
}

impl ApiError {
    pub fn new<E: Into<String>>(status: StatusCode, error: E) -> Self {
        Self {
            status,
            error: error.into(),
            detail: None,
        }
    }

    pub fn with_detail<D: Into<String>>(mut self, detail: D) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn bad_request<E: Into<String>>(error: E) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    pub fn internal<E: Into<String>>(error: E) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::FeedFetch { .. } | StoreError::FeedParse { .. } => {
                Self::new(StatusCode::BAD_GATEWAY, err.to_string())
            }
            StoreError::Database { source } => {
                let detail = format!("{:#}", source);
                Self::internal(err.to_string()).with_detail(detail)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.detail {
            Some(detail) => json!({ "error": self.error, "detail": detail }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

/// ルーターを作成
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/storenews", get(store_news))
        .route("/api/fetchnews", get(fetch_news))
        .with_state(state)
}

/// フィードを取得し、重複を除いて保存する
pub async fn store_news(State(state): State<AppState>) -> Result<Json<StoreOutcome>, ApiError> {
    match execute_store_workflow(state.http_client.as_ref(), &state.feeds, &state.pool).await {
        Ok(outcome) => {
            tracing::info!("{}", outcome);
            Ok(Json(outcome))
        }
        Err(e) => {
            tracing::error!(error = %e, "storenews error");
            Err(e.into())
        }
    }
}

/// 当日分のニュースを返す
pub async fn fetch_news(
    State(state): State<AppState>,
    page: Result<Query<Page>, QueryRejection>,
) -> Result<Json<DayNews>, ApiError> {
    let Query(page) = page.map_err(|e| {
        ApiError::bad_request("Invalid query parameters").with_detail(e.body_text())
    })?;

    fetch_day_news(&state.pool, state.utc_offset, page)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!(error = %format!("{:#}", e), "fetchnews error");
            ApiError::internal("Failed to fetch news from DB").with_detail(format!("{:#}", e))
        })
}

/// DB初期化からサーバー起動までを行う
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let pool = setup_database(&config).await?;
    let feeds = resolve_feeds(&config)?;

    let state = AppState {
        pool,
        http_client: Arc::new(ReqwestHttpClient::new()),
        feeds: Arc::new(feeds),
        utc_offset: config.utc_offset,
    };

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("ポートのバインドに失敗: {}", addr))?;
    tracing::info!(%addr, feeds = state.feeds.len(), "HTTPサーバーを起動");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTPサーバーが異常終了しました")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "シグナル待機に失敗");
    }
    tracing::info!("シャットダウンします");
}
