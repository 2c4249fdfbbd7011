//! RSSフィードのニュース見出しをPostgreSQLに保存し、当日分を返すサービス
//!
//! - `app`: 保存ワークフローとHTTP API
//! - `domain`: ニュースの抽出、正規化、重複判定、日付による削除と抽出
//! - `infra`: 設定、DB、HTTPクライアント、パーサー
//! - `types`: エラー型と結果型

pub mod app;
pub mod domain;
pub mod infra;
pub mod types;
