use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rss::Channel;
use std::io::BufRead;

/// XML文字列からRSSチャンネルを解析する
pub fn parse_channel_from_xml_str(xml: &str) -> Result<Channel> {
    parse_channel_from_reader(xml.as_bytes())
}

/// BufReadからRSSチャンネルを解析する
pub fn parse_channel_from_reader<R: BufRead>(reader: R) -> Result<Channel> {
    Channel::read_from(reader).context("RSSのXML解析に失敗しました")
}

/// 文字列を日付型に変換するヘルパー関数
///
/// `dateparser`クレートを利用して、様々な形式の日付文字列を解析し、
/// `DateTime<Utc>`型に変換する。タイムゾーン情報のない文字列はUTCとして扱う。
///
/// # サポート形式の例
/// - "2025-01-15"
/// - "2025-01-15T10:00:00Z"
/// - "Sun, 10 Aug 2025 12:00:00 +0000"
pub fn parse_date(date_str: &str) -> Result<DateTime<Utc>> {
    dateparser::parse_with_timezone(date_str, &Utc)
        .map_err(|_| anyhow!("不正な日付形式: {}", date_str))
}

/// フィード由来の緩い日付文字列を解析する
///
/// RFC 2822 → RFC 3339 → `parse_date` の順に試し、どれも失敗したら `None`。
pub fn parse_loose_date(date_str: &str) -> Option<DateTime<Utc>> {
    let trimmed = date_str.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    parse_date(trimmed).ok()
}
