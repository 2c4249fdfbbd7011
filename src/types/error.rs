use thiserror::Error;

/// インフラストラクチャ層のエラー型
/// データベース、ファイルシステムなど基盤的なエラーを定義
#[derive(Error, Debug)]
pub enum InfraError {
    /// ファイルシステムエラー
    #[error("ファイルシステムエラー: {path} - {source}")]
    FileSystem {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// データベース接続エラー
    #[error("データベース接続エラー: {source}")]
    DatabaseConnection {
        #[source]
        source: sqlx::Error,
    },

    /// マイグレーションエラー
    #[error("データベースマイグレーションエラー: {source}")]
    Migration {
        #[source]
        source: sqlx::migrate::MigrateError,
    },
}

impl InfraError {
    /// ファイルシステムエラーを作成
    pub fn file_system<P: Into<String>>(path: P, source: std::io::Error) -> Self {
        Self::FileSystem {
            path: path.into(),
            source,
        }
    }

    /// データベース接続エラーを作成
    pub fn database_connection(source: sqlx::Error) -> Self {
        Self::DatabaseConnection { source }
    }

    /// マイグレーションエラーを作成
    pub fn migration(source: sqlx::migrate::MigrateError) -> Self {
        Self::Migration { source }
    }
}

/// インフラエラーのResult型エイリアス
pub type InfraResult<T> = std::result::Result<T, InfraError>;

/// ニュース保存ワークフローのエラー型
///
/// HTTP層はこの分類をステータスコードに対応付ける
/// (`FeedFetch`/`FeedParse` は 502、`Database` は 500)。
#[derive(Error, Debug)]
pub enum StoreError {
    /// フィードの取得に失敗（通信エラー、非2xxレスポンス）
    #[error("Failed to fetch feed ({detail})")]
    FeedFetch { detail: String },

    /// フィードXMLの解析に失敗
    #[error("Failed to parse feed: {detail}")]
    FeedParse { detail: String },

    /// DBへの書き込みに失敗
    #[error("Failed to insert into DB")]
    Database {
        #[source]
        source: anyhow::Error,
    },
}

impl StoreError {
    pub fn feed_fetch<D: Into<String>>(detail: D) -> Self {
        Self::FeedFetch {
            detail: detail.into(),
        }
    }

    pub fn feed_parse<D: Into<String>>(detail: D) -> Self {
        Self::FeedParse {
            detail: detail.into(),
        }
    }

    pub fn database(source: anyhow::Error) -> Self {
        Self::Database { source }
    }
}
