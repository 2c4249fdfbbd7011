use crate::infra::config::AppConfig;
use crate::types::{InfraError, InfraResult};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// データベース接続プールを作成
/// 接続先は設定のDATABASE_URLを使用します
pub async fn create_pool(config: &AppConfig) -> InfraResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .map_err(InfraError::database_connection)
}

/// データベースの初期化（マイグレーション実行）
pub async fn initialize_database(pool: &PgPool) -> InfraResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(InfraError::migration)
}

/// プールの作成とデータベース初期化を一括で行う便利関数
pub async fn setup_database(config: &AppConfig) -> InfraResult<PgPool> {
    let pool = create_pool(config).await?;
    initialize_database(&pool).await?;
    tracing::info!("データベース初期化完了");
    Ok(pool)
}
