//! 日付文字列パターンによる削除
//!
//! `date` 列は正規化されていないため、代表的な表記
//! (`18 Oct 2025` / `Sat, 18 Oct 2025 ...` / `Oct 18, 2025` / `2025-10-18...`)
//! から年月日を取り出し、指定範囲に入る行を削除する。

use crate::domain::news::{delete_news_by_ids, fetch_existing_key_rows, NewsKeyRow};
use crate::types::DeleteResult;
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use regex::{Captures, Regex, RegexBuilder};
use sqlx::PgPool;

/// 一度に指定できる最大日数
pub const MAX_RANGE_DAYS: i64 = 366;

const MONTHS: &str = "jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec";

/// 両端を含む日付範囲
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DayRange {
    pub fn new(from: NaiveDate, to: Option<NaiveDate>) -> Result<Self> {
        let to = to.unwrap_or(from);
        if to < from {
            bail!("終了日 {} が開始日 {} より前です", to, from);
        }
        let span = (to - from).num_days() + 1;
        if span > MAX_RANGE_DAYS {
            bail!("日付範囲が長すぎます: {}日 (最大{}日)", span, MAX_RANGE_DAYS);
        }
        Ok(Self { from, to })
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.from <= day && day <= self.to
    }

    pub fn span_days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }
}

/// 削除対象の指定
#[derive(Debug, Clone)]
pub enum PurgeTarget {
    Days(DayRange),
    /// 任意の正規表現（大文字小文字は区別しない）
    Pattern(String),
}

impl PurgeTarget {
    pub fn matcher(&self) -> Result<DateMatcher> {
        match self {
            PurgeTarget::Days(range) => {
                let extractor = DayExtractor::new()
                    .with_context(|| format!("日付範囲 {}〜{} の照合器の構築に失敗", range.from, range.to))?;
                Ok(DateMatcher::Days { range: *range, extractor })
            }
            PurgeTarget::Pattern(raw) => {
                if raw.trim().is_empty() {
                    bail!("空のパターンは指定できません");
                }
                let regex = RegexBuilder::new(raw)
                    .case_insensitive(true)
                    .build()
                    .with_context(|| format!("正規表現の構築に失敗: {}", raw))?;
                Ok(DateMatcher::Pattern(regex))
            }
        }
    }
}

/// 日付文字列に現れる年月日を取り出す
///
/// 正規表現は範囲の長さによらず固定。
#[derive(Debug, Clone)]
pub struct DayExtractor {
    day_month_year: Regex,
    month_day_year: Regex,
    iso: Regex,
}

impl DayExtractor {
    pub fn new() -> Result<Self> {
        let build = |pattern: String| {
            RegexBuilder::new(&pattern)
                .case_insensitive(true)
                .build()
                .with_context(|| format!("正規表現の構築に失敗: {}", pattern))
        };

        Ok(Self {
            // 18 Oct 2025 / Sat, 18 Oct 2025 / 18 October 2025
            day_month_year: build(format!(
                r"(?:^|[^0-9])([0-9]{{1,2}})\s+({MONTHS})[a-z]*\.?,?\s+([0-9]{{4}})\b"
            ))?,
            // Oct 18, 2025 / October 18th 2025
            month_day_year: build(format!(
                r"\b({MONTHS})[a-z]*\.?\s+([0-9]{{1,2}})(?:st|nd|rd|th)?,?\s+([0-9]{{4}})\b"
            ))?,
            // 2025-10-18 / 2025-10-18T10:00:00Z
            iso: build(r"\b([0-9]{4})-([0-9]{2})-([0-9]{2})(?:[^0-9]|$)".to_string())?,
        })
    }

    /// 文字列中のすべての日付候補
    pub fn days(&self, text: &str) -> Vec<NaiveDate> {
        let dmy = self
            .day_month_year
            .captures_iter(text)
            .filter_map(|c| ymd_from(&c, 3, month_number(&c[2]), 1));
        let mdy = self
            .month_day_year
            .captures_iter(text)
            .filter_map(|c| ymd_from(&c, 3, month_number(&c[1]), 2));
        let iso = self
            .iso
            .captures_iter(text)
            .filter_map(|c| ymd_from(&c, 1, c[2].parse().ok(), 3));

        dmy.chain(mdy).chain(iso).collect()
    }
}

fn month_number(name: &str) -> Option<u32> {
    let name = name.to_ascii_lowercase();
    MONTHS
        .split('|')
        .position(|m| m == name)
        .map(|i| i as u32 + 1)
}

fn ymd_from(caps: &Captures<'_>, year: usize, month: Option<u32>, day: usize) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(caps[year].parse().ok()?, month?, caps[day].parse().ok()?)
}

/// 行の日付文字列に対する照合器
#[derive(Debug, Clone)]
pub enum DateMatcher {
    Days { range: DayRange, extractor: DayExtractor },
    Pattern(Regex),
}

impl DateMatcher {
    pub fn is_match(&self, date_text: &str) -> bool {
        match self {
            DateMatcher::Days { range, extractor } => extractor
                .days(date_text)
                .into_iter()
                .any(|day| range.contains(day)),
            DateMatcher::Pattern(regex) => regex.is_match(date_text),
        }
    }
}

/// 日付文字列がマッチする行のidを返す
pub fn select_matching_ids(rows: &[NewsKeyRow], matcher: &DateMatcher) -> Vec<i64> {
    rows.iter()
        .filter(|row| matcher.is_match(&row.date))
        .map(|row| row.id)
        .collect()
}

/// 日付文字列が対象にマッチする行を削除する
pub async fn purge_news_by_date(
    pool: &PgPool,
    target: &PurgeTarget,
    dry_run: bool,
) -> Result<DeleteResult> {
    let matcher = target.matcher()?;
    let rows = fetch_existing_key_rows(pool).await?;
    let ids = select_matching_ids(&rows, &matcher);
    tracing::info!(rows = rows.len(), matched = ids.len(), ?target, "日付パターン削除の対象を抽出");

    if dry_run || ids.is_empty() {
        return Ok(DeleteResult::new(ids.len(), 0, dry_run));
    }

    let deleted = delete_news_by_ids(&ids, pool).await? as usize;
    Ok(DeleteResult::new(ids.len(), deleted, false))
}
