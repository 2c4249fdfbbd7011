//! 型定義モジュール
//!
//! アプリケーション全体で使用される共通的な型定義を管理します。
//! - エラー型: 設定、インフラ、保存ワークフロー
//! - 結果型: スキップ内訳と削除結果の統一表現

pub mod config;
pub mod error;
pub mod result;

// 便利な再エクスポート
pub use config::{ConfigError, ConfigResult};
pub use error::{InfraError, InfraResult, StoreError};
pub use result::{DeleteResult, SkipCounts};
