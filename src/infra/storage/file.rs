use crate::infra::parser::parse_channel_from_reader;
use crate::types::InfraError;
use anyhow::{Context, Result};
use rss::Channel;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::BufReader;

/// ファイルパスからBufReaderを作成する
/// パースやデータ変換は各ドメインで行う
pub fn load_file(file_path: &str) -> Result<BufReader<File>> {
    let file = File::open(file_path).map_err(|e| InfraError::file_system(file_path, e))?;
    Ok(BufReader::new(file))
}

/// xmlファイルからchannelを読み込む
pub fn load_channel_from_xml_file(file_path: &str) -> Result<Channel> {
    let buf_reader = load_file(file_path)?;
    parse_channel_from_reader(buf_reader)
        .with_context(|| format!("RSSファイルの解析に失敗: {}", file_path))
}

/// YAMLファイルからSerdeでDeserializeできる型を読み込む
pub fn load_yaml_from_file<T: DeserializeOwned>(file_path: &str) -> Result<T> {
    let buf_reader = load_file(file_path)?;
    serde_yaml::from_reader(buf_reader)
        .with_context(|| format!("YAMLファイルの解析に失敗: {}", file_path))
}
