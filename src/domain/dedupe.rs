//! 重複判定
//!
//! - 保存時: 既存キー集合と突き合わせ、新規分だけを挿入候補にする
//! - メンテナンス時: 同じキーの行を1件だけ残して削除する

use crate::domain::news::{delete_news_by_ids, fetch_existing_key_rows, NewNewsItem, NewsKeyRow};
use crate::domain::normalize::DedupeKey;
use crate::types::{DeleteResult, SkipCounts};
use anyhow::Result;
use sqlx::PgPool;
use std::collections::{BTreeMap, HashSet};

/// 既出の重複判定キー
#[derive(Debug, Default)]
pub struct SeenKeys {
    keys: HashSet<DedupeKey>,
}

impl SeenKeys {
    /// 保存済みの行から作る。リンクのある行もタイトル+日付キーを登録する
    pub fn from_rows(rows: &[NewsKeyRow]) -> Self {
        Self {
            keys: rows.iter().flat_map(NewsKeyRow::stored_keys).collect(),
        }
    }

    /// 未登録なら登録してtrueを返す
    pub fn insert(&mut self, key: DedupeKey) -> bool {
        self.keys.insert(key)
    }

    pub fn contains(&self, key: &DedupeKey) -> bool {
        self.keys.contains(key)
    }

    pub fn link_count(&self) -> usize {
        self.keys
            .iter()
            .filter(|k| matches!(k, DedupeKey::Link(_)))
            .count()
    }

    pub fn title_date_count(&self) -> usize {
        self.keys.len() - self.link_count()
    }
}

/// 挿入計画
#[derive(Debug, Default)]
pub struct InsertPlan {
    pub to_insert: Vec<NewNewsItem>,
    pub skipped: SkipCounts,
}

/// フィード順に候補を見て、既出でないものだけを挿入候補にする
///
/// 同じ実行内の重複も `seen` に登録してから判定する。
pub fn plan_inserts(candidates: Vec<NewNewsItem>, seen: &mut SeenKeys) -> InsertPlan {
    let mut plan = InsertPlan::default();

    for candidate in candidates {
        match candidate.dedupe_key() {
            Some(key) => {
                let is_link = matches!(key, DedupeKey::Link(_));
                if seen.insert(key) {
                    plan.to_insert.push(candidate);
                } else if is_link {
                    plan.skipped.duplicate_link += 1;
                } else {
                    plan.skipped.duplicate_title_date += 1;
                }
            }
            None => plan.skipped.missing_key += 1,
        }
    }

    plan
}

/// 重複グループで残す行の選び方
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum KeepPolicy {
    /// idが最小の行を残す
    Oldest,
    /// idが最大の行を残す
    Newest,
}

/// 重複削除の計画
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupePlan {
    /// 2行以上を持つキーの数
    pub duplicate_groups: usize,
    /// 削除するid（昇順）
    pub remove: Vec<i64>,
}

/// 行をキーでまとめ、各グループで1件だけ残す削除計画を作る
///
/// キーを作れない行（リンクも日付もない）は対象外。
pub fn plan_dedupe(rows: &[NewsKeyRow], policy: KeepPolicy) -> DedupePlan {
    let mut groups: BTreeMap<DedupeKey, Vec<i64>> = BTreeMap::new();
    for row in rows {
        if let Some(key) = row.dedupe_key() {
            groups.entry(key).or_default().push(row.id);
        }
    }

    let mut plan = DedupePlan::default();
    for ids in groups.values().filter(|ids| ids.len() > 1) {
        plan.duplicate_groups += 1;
        let keep = match policy {
            KeepPolicy::Oldest => ids.iter().min(),
            KeepPolicy::Newest => ids.iter().max(),
        };
        plan.remove
            .extend(ids.iter().filter(|id| Some(*id) != keep).copied());
    }
    plan.remove.sort_unstable();
    plan
}

/// テーブル全体の重複を削除する
pub async fn remove_duplicate_news(
    pool: &PgPool,
    policy: KeepPolicy,
    dry_run: bool,
) -> Result<(DedupePlan, DeleteResult)> {
    let rows = fetch_existing_key_rows(pool).await?;
    let plan = plan_dedupe(&rows, policy);
    tracing::info!(
        rows = rows.len(),
        groups = plan.duplicate_groups,
        remove = plan.remove.len(),
        ?policy,
        "重複削除の計画を作成"
    );

    let matched = plan.remove.len();
    if dry_run || matched == 0 {
        return Ok((plan, DeleteResult::new(matched, 0, dry_run)));
    }

    let deleted = delete_news_by_ids(&plan.remove, pool).await? as usize;
    tracing::info!(deleted, "重複行を削除");
    Ok((plan, DeleteResult::new(matched, deleted, false)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(title: &str, link: &str, date: &str) -> NewNewsItem {
        NewNewsItem {
            title: title.into(),
            link: link.into(),
            description: String::new(),
            date: date.into(),
        }
    }

    fn key_row(id: i64, title: &str, link: &str, date: &str) -> NewsKeyRow {
        NewsKeyRow {
            id,
            title: title.into(),
            link: link.into(),
            date: date.into(),
        }
    }

    fn fixture_rows() -> Vec<NewsKeyRow> {
        vec![
            key_row(1, "Sensex", "https://www.example.com/markets/sensex?utm_source=x", "d1"),
            key_row(2, "Sensex (update)", "http://WWW.example.com/markets/sensex/", "d2"),
            key_row(3, "RBI", "https://news.example.org/rbi", "d3"),
            key_row(4, "Rupee ends flat", "", "2025-10-16"),
            key_row(5, "rupee  ENDS flat", "", "2025-10-16"),
            key_row(6, "No key", "", ""),
            key_row(7, "No key", "", ""),
        ]
    }

    mod insert_plan_tests {
        use super::*;

        #[test]
        fn test_skips_existing_links_and_title_dates() {
            let mut seen = SeenKeys::from_rows(&fixture_rows());
            assert_eq!(seen.link_count(), 2);
            // リンクのある3行 + 行4/5で共通の1キー
            assert_eq!(seen.title_date_count(), 4);

            let plan = plan_inserts(
                vec![
                    candidate("Any", "https://example.com/markets/sensex", "x"),
                    candidate("Rupee Ends Flat", "", " 2025-10-16 "),
                    candidate("Fresh", "https://fresh.example.com/1", "x"),
                ],
                &mut seen,
            );

            // www付きは別ホスト扱い
            assert_eq!(plan.to_insert.len(), 2);
            assert_eq!(plan.to_insert[0].link, "https://example.com/markets/sensex");
            assert_eq!(plan.to_insert[1].title, "Fresh");
            assert_eq!(plan.skipped.duplicate_title_date, 1);
            assert_eq!(plan.skipped.duplicate_link, 0);
        }

        #[test]
        fn test_linkless_candidate_matches_stored_row_with_link() {
            let stored = vec![key_row(
                1,
                "Rupee ends flat",
                "https://e.com/rupee",
                "Fri, 17 Oct 2025",
            )];
            let mut seen = SeenKeys::from_rows(&stored);

            let plan = plan_inserts(
                vec![candidate("Rupee  ends FLAT", "", "Fri, 17 Oct 2025")],
                &mut seen,
            );

            assert!(plan.to_insert.is_empty());
            assert_eq!(plan.skipped.duplicate_title_date, 1);
            assert_eq!(plan.skipped.duplicate_link, 0);
        }

        #[test]
        fn test_linked_candidate_registers_only_its_link() {
            let mut seen = SeenKeys::default();
            let plan = plan_inserts(
                vec![
                    candidate("Gold hits record", "https://e.com/gold", "Fri, 17 Oct 2025"),
                    candidate("Gold hits record", "", "Fri, 17 Oct 2025"),
                ],
                &mut seen,
            );

            // 同じ実行内ではリンクのある候補はリンクキーだけを登録する
            assert_eq!(plan.to_insert.len(), 2);
            assert_eq!(seen.title_date_count(), 1);
        }

        #[test]
        fn test_dedupes_within_one_run() {
            let mut seen = SeenKeys::default();
            let plan = plan_inserts(
                vec![
                    candidate("A", "https://example.com/a?utm_medium=rss", "d"),
                    candidate("A again", "https://EXAMPLE.com/a/", "d"),
                    candidate("B", "", "Fri, 17 Oct 2025"),
                    candidate("b", "", "Fri, 17 Oct 2025"),
                    candidate("C", "", ""),
                ],
                &mut seen,
            );

            assert_eq!(plan.to_insert.len(), 2);
            assert_eq!(
                plan.skipped,
                SkipCounts {
                    duplicate_link: 1,
                    duplicate_title_date: 1,
                    no_link_no_title: 0,
                    missing_key: 1,
                }
            );
            assert!(seen.contains(&DedupeKey::Link("example.com/a".into())));
        }
    }

    mod dedupe_plan_tests {
        use super::*;

        #[test]
        fn test_keep_oldest() {
            let plan = plan_dedupe(&fixture_rows(), KeepPolicy::Oldest);
            assert_eq!(plan.duplicate_groups, 2);
            assert_eq!(plan.remove, vec![2, 5]);
        }

        #[test]
        fn test_keep_newest() {
            let plan = plan_dedupe(&fixture_rows(), KeepPolicy::Newest);
            assert_eq!(plan.remove, vec![1, 4]);
        }

        #[test]
        fn test_no_two_survivors_share_a_key() {
            let rows = fixture_rows();
            for policy in [KeepPolicy::Oldest, KeepPolicy::Newest] {
                let plan = plan_dedupe(&rows, policy);
                let survivors: Vec<_> = rows
                    .iter()
                    .filter(|r| !plan.remove.contains(&r.id))
                    .filter_map(NewsKeyRow::dedupe_key)
                    .collect();
                let unique: HashSet<_> = survivors.iter().collect();
                assert_eq!(unique.len(), survivors.len(), "{:?}で重複が残っています", policy);
            }
        }

        #[test]
        fn test_rows_without_key_are_untouched() {
            let rows = vec![key_row(6, "No key", "", ""), key_row(7, "No key", "", "")];
            let plan = plan_dedupe(&rows, KeepPolicy::Oldest);
            assert_eq!(plan, DedupePlan::default());
        }
    }

    #[cfg(feature = "db")]
    mod db_tests {
        use super::*;

        #[sqlx::test(fixtures("../../fixtures/news.sql"))]
        async fn test_remove_duplicate_news(pool: PgPool) -> Result<(), anyhow::Error> {
            let (plan, dry) = remove_duplicate_news(&pool, KeepPolicy::Oldest, true).await?;
            assert_eq!(plan.remove, vec![2, 5]);
            assert_eq!(dry, DeleteResult::new(2, 0, true));

            let (_, result) = remove_duplicate_news(&pool, KeepPolicy::Oldest, false).await?;
            assert_eq!(result, DeleteResult::new(2, 2, false));

            // 2回目は何も消さない
            let (plan, again) = remove_duplicate_news(&pool, KeepPolicy::Oldest, false).await?;
            assert_eq!(plan.duplicate_groups, 0);
            assert_eq!(again.deleted, 0);

            let rows = fetch_existing_key_rows(&pool).await?;
            let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
            assert_eq!(ids, vec![1, 3, 4, 6, 7, 8]);
            Ok(())
        }
    }
}
