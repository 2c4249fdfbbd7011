//! 当日分ニュースの抽出
//!
//! 保存済みの日付文字列を解析し、設定したUTCオフセットでの日付が
//! 今日のものを返す。今日の分がなければ昨日の分を返す。

use crate::domain::news::{search_recent_news, NewsItem};
use crate::infra::parser::parse_loose_date;
use anyhow::Result;
use chrono::{DateTime, Days, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// 日付で絞り込む前に読み込む最新行数
pub const FETCH_ROWS: i64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestedDay {
    Today,
    Yesterday,
}

/// ページング指定。`limit` が0または未指定なら上限なし
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Page {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// 日付で絞り込んだ結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayNews {
    pub requested_day: RequestedDay,
    /// `YYYY-MM-DD`
    pub day_date: String,
    pub count: usize,
    pub news: Vec<NewsItem>,
}

/// 日付文字列を指定オフセットでの暦日に変換する
pub fn local_day(date_text: &str, offset: FixedOffset) -> Option<NaiveDate> {
    parse_loose_date(date_text).map(|dt| dt.with_timezone(&offset).date_naive())
}

/// 行を今日（なければ昨日）に絞り込み、offset → limit の順で切り出す
pub fn select_day_news(
    rows: Vec<NewsItem>,
    now: DateTime<Utc>,
    offset: FixedOffset,
    page: Page,
) -> DayNews {
    let today = now.with_timezone(&offset).date_naive();
    let yesterday = today.checked_sub_days(Days::new(1)).unwrap_or(today);

    let annotated: Vec<(Option<NaiveDate>, NewsItem)> = rows
        .into_iter()
        .map(|row| (local_day(&row.date, offset), row))
        .collect();

    let on_day = |day: NaiveDate| -> Vec<NewsItem> {
        annotated
            .iter()
            .filter(|(d, _)| *d == Some(day))
            .map(|(_, row)| row.clone())
            .collect()
    };

    let mut requested_day = RequestedDay::Today;
    let mut day = today;
    let mut selected = on_day(today);
    if selected.is_empty() {
        requested_day = RequestedDay::Yesterday;
        day = yesterday;
        selected = on_day(yesterday);
    }

    let skip = page.offset.unwrap_or(0);
    let take = page.limit.filter(|n| *n > 0).unwrap_or(usize::MAX);
    let news: Vec<NewsItem> = selected.into_iter().skip(skip).take(take).collect();

    DayNews {
        requested_day,
        day_date: day.format("%Y-%m-%d").to_string(),
        count: news.len(),
        news,
    }
}

/// DBから最新行を読み込み、当日分を返す
pub async fn fetch_day_news(pool: &PgPool, offset: FixedOffset, page: Page) -> Result<DayNews> {
    let rows = search_recent_news(FETCH_ROWS, pool).await?;
    let result = select_day_news(rows, Utc::now(), offset, page);
    tracing::debug!(
        day = %result.day_date,
        requested_day = ?result.requested_day,
        count = result.count,
        "当日分ニュースを抽出"
    );
    Ok(result)
}
