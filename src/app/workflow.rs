use crate::{
    domain::{
        dedupe::{plan_inserts, SeenKeys},
        feed::Feed,
        news::{extract_news_from_channel, fetch_existing_key_rows, insert_news_items, ExtractedNews, NewsItem},
    },
    infra::{
        api::http::{HttpClient, FEED_TIMEOUT_SECS},
        parser::parse_channel_from_xml_str,
    },
    types::{SkipCounts, StoreError},
};
use serde::Serialize;
use sqlx::PgPool;

pub const MESSAGE_NOTHING_PARSED: &str = "No items parsed from feed";
pub const MESSAGE_NO_NEW_ITEMS: &str = "No new items to insert";
pub const MESSAGE_STORED: &str = "Fetched feed and stored new items";

/// 保存ワークフローの結果（APIレスポンスの形そのまま）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreOutcome {
    pub message: String,
    pub fetched_count: usize,
    pub inserted_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inserted: Vec<NewsItem>,
    pub skipped: SkipCounts,
}

impl StoreOutcome {
    fn nothing_parsed(skipped: SkipCounts) -> Self {
        Self {
            message: MESSAGE_NOTHING_PARSED.to_string(),
            fetched_count: 0,
            inserted_count: 0,
            inserted: Vec::new(),
            skipped,
        }
    }

    fn no_new_items(fetched_count: usize, skipped: SkipCounts) -> Self {
        Self {
            message: MESSAGE_NO_NEW_ITEMS.to_string(),
            fetched_count,
            inserted_count: 0,
            inserted: Vec::new(),
            skipped,
        }
    }

    fn stored(fetched_count: usize, inserted: Vec<NewsItem>, skipped: SkipCounts) -> Self {
        Self {
            message: MESSAGE_STORED.to_string(),
            fetched_count,
            inserted_count: inserted.len(),
            inserted,
            skipped,
        }
    }
}

impl std::fmt::Display for StoreOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: 取得{}件、新規保存{}件（スキップ: {}）",
            self.message, self.fetched_count, self.inserted_count, self.skipped
        )
    }
}

/// 1つのフィードを取得して挿入候補に変換する
pub async fn fetch_feed_news<H: HttpClient + ?Sized>(
    client: &H,
    feed: &Feed,
) -> Result<ExtractedNews, StoreError> {
    let xml_content = client
        .get_text(&feed.link, FEED_TIMEOUT_SECS)
        .await
        .map_err(|e| StoreError::feed_fetch(format!("{:#}", e)))?;
    let channel = parse_channel_from_xml_str(&xml_content)
        .map_err(|e| StoreError::feed_parse(format!("{}: {:#}", feed.link, e)))?;

    Ok(extract_news_from_channel(&channel))
}

/// 全フィードを取得してまとめる
///
/// 一部のフィードの失敗はログに残して続行する。すべて失敗した場合は
/// 最初のエラーを返す。
pub async fn collect_feed_news<H: HttpClient + ?Sized>(
    client: &H,
    feeds: &[Feed],
) -> Result<ExtractedNews, StoreError> {
    let mut collected = ExtractedNews::default();
    let mut first_error = None;
    let mut succeeded = 0;

    for feed in feeds {
        match fetch_feed_news(client, feed).await {
            Ok(extracted) => {
                tracing::info!(feed = %feed, items = extracted.items.len(), "フィードを取得");
                succeeded += 1;
                collected.items.extend(extracted.items);
                collected.dropped_no_link_no_title += extracted.dropped_no_link_no_title;
            }
            Err(e) => {
                tracing::warn!(feed = %feed, error = %e, "フィード取得エラー");
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) if succeeded == 0 => Err(e),
        _ => Ok(collected),
    }
}

/// ニュース保存ワークフロー（依存性を注入）
///
/// 1. フィードを取得して正規化
/// 2. 既存行のキーと突き合わせて新規分を選ぶ
/// 3. 新規分を1トランザクションで保存
pub async fn execute_store_workflow<H: HttpClient + ?Sized>(
    client: &H,
    feeds: &[Feed],
    pool: &PgPool,
) -> Result<StoreOutcome, StoreError> {
    let collected = collect_feed_news(client, feeds).await?;
    let base_skipped = SkipCounts {
        no_link_no_title: collected.dropped_no_link_no_title,
        ..SkipCounts::default()
    };

    let fetched_count = collected.items.len();
    if fetched_count == 0 {
        return Ok(StoreOutcome::nothing_parsed(base_skipped));
    }

    // 既存行の取得に失敗しても空として続行する（挿入時の重複は許容）
    let existing = match fetch_existing_key_rows(pool).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!(error = %format!("{:#}", e), "既存ニュースの取得に失敗");
            Vec::new()
        }
    };

    let mut seen = SeenKeys::from_rows(&existing);
    tracing::info!(
        links = seen.link_count(),
        title_dates = seen.title_date_count(),
        "重複判定セットを作成"
    );

    let mut plan = plan_inserts(collected.items, &mut seen);
    plan.skipped.no_link_no_title = base_skipped.no_link_no_title;
    tracing::info!(to_insert = plan.to_insert.len(), skipped = %plan.skipped, "重複判定結果");

    if plan.to_insert.is_empty() {
        return Ok(StoreOutcome::no_new_items(fetched_count, plan.skipped));
    }

    let inserted = insert_news_items(&plan.to_insert, pool)
        .await
        .map_err(StoreError::database)?;

    Ok(StoreOutcome::stored(fetched_count, inserted, plan.skipped))
}
