//! 重複判定用の正規化
//!
//! 保存時の重複スキップとメンテナンスの重複削除は、どちらもこのモジュールの
//! キーを使う。

use url::{form_urlencoded, Url};

/// 重複判定キー
///
/// リンクがあれば正規化リンク、なければ正規化タイトルと日付の組。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DedupeKey {
    Link(String),
    TitleDate(String),
}

/// トラッキング用クエリパラメータかどうか
fn is_tracking_param(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.starts_with("utm_") || lower == "fbclid" || lower == "gclid"
}

/// URLを正規化する
///
/// スキームを落とし、トラッキング用パラメータを除き、末尾スラッシュを
/// 取り除いて小文字化する。`host + path + ?query` の形になる。
pub fn normalize_link(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    // //example.com/path のようなプロトコル相対リンク
    let candidate = if trimmed.starts_with("//") {
        format!("https:{}", trimmed)
    } else {
        trimmed.to_string()
    };

    match Url::parse(&candidate) {
        Ok(url) => {
            let kept: Vec<(String, String)> = url
                .query_pairs()
                .filter(|(name, _)| !is_tracking_param(name))
                .map(|(name, value)| (name.into_owned(), value.into_owned()))
                .collect();

            let mut norm = url.host_str().unwrap_or_default().to_string();
            norm.push_str(url.path());
            if !kept.is_empty() {
                let query = form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(kept.iter())
                    .finish();
                norm.push('?');
                norm.push_str(&query);
            }

            if norm.len() > 1 && norm.ends_with('/') {
                norm = norm.trim_end_matches('/').to_string();
            }
            norm.to_lowercase()
        }
        Err(_) => candidate.trim_end_matches('/').to_lowercase(),
    }
}

/// タイトルを正規化する（空白の連続を1つにまとめ、小文字化）
pub fn normalize_title(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// タイトル+日付キー。日付が空なら作らない
pub fn title_date_key(title: &str, date: &str) -> Option<String> {
    let date = date.trim();
    if date.is_empty() {
        return None;
    }
    Some(format!("{}||{}", normalize_title(title), date))
}

/// 1行分の重複判定キーを求める
pub fn dedupe_key(link: &str, title: &str, date: &str) -> Option<DedupeKey> {
    let norm_link = normalize_link(link);
    if !norm_link.is_empty() {
        return Some(DedupeKey::Link(norm_link));
    }
    title_date_key(title, date).map(DedupeKey::TitleDate)
}

/// 保存済みの行が重複判定に登録するキー
///
/// 候補側はどちらか一方のキーで判定されるが、保存済みの行はリンクの有無に
/// 関わらずタイトル+日付キーも持つ。
pub fn stored_keys(link: &str, title: &str, date: &str) -> Vec<DedupeKey> {
    let norm_link = normalize_link(link);
    let link_key = (!norm_link.is_empty()).then(|| DedupeKey::Link(norm_link));
    let title_date = title_date_key(title, date).map(DedupeKey::TitleDate);

    link_key.into_iter().chain(title_date).collect()
}
