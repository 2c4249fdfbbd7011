use crate::types::{ConfigError, ConfigResult};
use chrono::FixedOffset;
use std::env;
use std::net::{IpAddr, SocketAddr};

/// 既定のRSSフィード
pub const DEFAULT_FEED_URL: &str = "https://pulse.zerodha.com/feed.php";
/// 既定のタイムゾーン（Asia/Kolkata、夏時間なし）
pub const DEFAULT_UTC_OFFSET: &str = "+05:30";

/// アプリケーション設定
///
/// 起動時に `dotenvy::dotenv()` の後で環境変数から組み立てる。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub feed_url: String,
    /// `name: url` 形式のYAML。指定時は `feed_url` より優先
    pub feeds_file: Option<String>,
    pub utc_offset: FixedOffset,
    pub host: IpAddr,
    pub port: u16,
}

impl AppConfig {
    /// プロセスの環境変数から設定を読み込む
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意の参照関数から設定を読み込む（テストで環境変数を汚さないため）
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let database_url =
            get("DATABASE_URL").ok_or_else(|| ConfigError::missing_env_var("DATABASE_URL"))?;

        let max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    ConfigError::invalid_value("DATABASE_MAX_CONNECTIONS", &raw, "正の整数が必要です")
                })?,
            None => 5,
        };

        let utc_offset_raw = get("NEWS_UTC_OFFSET").unwrap_or_else(|| DEFAULT_UTC_OFFSET.into());
        let utc_offset = parse_utc_offset(&utc_offset_raw).ok_or_else(|| {
            ConfigError::invalid_value("NEWS_UTC_OFFSET", &utc_offset_raw, "+HH:MM 形式が必要です")
        })?;

        let host = match get("HOST") {
            Some(raw) => raw
                .trim()
                .parse::<IpAddr>()
                .map_err(|e| ConfigError::invalid_value("HOST", &raw, e.to_string()))?,
            None => IpAddr::from([0, 0, 0, 0]),
        };

        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| ConfigError::invalid_value("PORT", &raw, e.to_string()))?,
            None => 5000,
        };

        Ok(Self {
            database_url,
            max_connections,
            feed_url: get("FEED_URL").unwrap_or_else(|| DEFAULT_FEED_URL.into()),
            feeds_file: get("FEEDS_FILE"),
            utc_offset,
            host,
            port,
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// `+05:30` / `-0800` / `Z` / `UTC` 形式のオフセットを解析する
pub fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }

    let (sign, rest) = match raw.as_bytes().first()? {
        b'+' => (1, &raw[1..]),
        b'-' => (-1, &raw[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
