use crate::infra::config::AppConfig;
use crate::infra::storage::file::load_yaml_from_file;
use crate::types::ConfigError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub name: String,
    pub link: String,
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.link)
    }
}

// YAMLファイルの構造に対応する型（名前順で安定させる）
type FeedMap = BTreeMap<String, String>;

/// `name: url` 形式のYAMLからフィード一覧を読み込む
pub fn load_feeds_from_yaml(file_path: &str) -> Result<Vec<Feed>> {
    let feed_map: FeedMap = load_yaml_from_file(file_path)
        .map_err(|e| ConfigError::config_file(file_path, format!("{:#}", e)))?;

    if feed_map.is_empty() {
        return Err(ConfigError::config_file(file_path, "フィードが1件も定義されていません").into());
    }

    Ok(feed_map
        .into_iter()
        .map(|(name, link)| Feed { name, link })
        .collect())
}

/// 設定から対象フィードを決める
///
/// `FEEDS_FILE` があればその内容、なければ `FEED_URL` の1件。
pub fn resolve_feeds(config: &AppConfig) -> Result<Vec<Feed>> {
    match config.feeds_file.as_deref() {
        Some(path) => load_feeds_from_yaml(path),
        None => Ok(vec![Feed {
            name: "default".to_string(),
            link: config.feed_url.clone(),
        }]),
    }
}
