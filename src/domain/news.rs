use crate::domain::normalize::{dedupe_key, stored_keys, DedupeKey};
use anyhow::{Context, Result};
use rss::{Channel, Item};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

/// 既存キー読み込み時のページサイズ
pub const KEY_PAGE_SIZE: i64 = 1000;
/// 1回のINSERT文にまとめる最大行数
const INSERT_CHUNK_SIZE: usize = 1000;

/// 保存済みのニュース行（テーブル定義と一致）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct NewsItem {
    pub id: i64,
    pub title: String,
    pub link: String,
    pub description: String,
    /// フィード由来の日付文字列（未正規化）
    pub date: String,
}

/// 挿入前のニュース（idはDBが採番）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewNewsItem {
    pub title: String,
    pub link: String,
    pub description: String,
    pub date: String,
}

impl NewNewsItem {
    pub fn dedupe_key(&self) -> Option<DedupeKey> {
        dedupe_key(&self.link, &self.title, &self.date)
    }
}

/// 重複判定に必要な列だけを持つ行
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct NewsKeyRow {
    pub id: i64,
    pub title: String,
    pub link: String,
    pub date: String,
}

impl NewsKeyRow {
    pub fn dedupe_key(&self) -> Option<DedupeKey> {
        dedupe_key(&self.link, &self.title, &self.date)
    }

    /// 保存時の重複判定に登録するキー（リンクとタイトル+日付）
    pub fn stored_keys(&self) -> Vec<DedupeKey> {
        stored_keys(&self.link, &self.title, &self.date)
    }
}

/// チャンネルからの抽出結果
#[derive(Debug, Default)]
pub struct ExtractedNews {
    pub items: Vec<NewNewsItem>,
    /// タイトルもリンクもなく捨てたエントリ数
    pub dropped_no_link_no_title: usize,
}

/// `<description>` → `<content:encoded>` → `<dc:description>` の順で本文を選ぶ
fn item_description(item: &Item) -> String {
    let dc_description = item
        .dublin_core_ext()
        .and_then(|dc| dc.descriptions().first().map(String::as_str));

    [item.description(), item.content(), dc_description]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// `<pubDate>` がなければ `<dc:date>` を使う
fn item_date(item: &Item) -> String {
    item.pub_date()
        .or_else(|| {
            item.dublin_core_ext()
                .and_then(|dc| dc.dates().first().map(String::as_str))
        })
        .map(str::trim)
        .unwrap_or_default()
        .to_string()
}

/// RSSのチャンネルから<item>要素を挿入候補に変換する
pub fn extract_news_from_channel(channel: &Channel) -> ExtractedNews {
    let mut extracted = ExtractedNews::default();

    for item in channel.items() {
        let title = item.title().map(str::trim).unwrap_or_default();
        let link = item.link().map(str::trim).unwrap_or_default();

        if title.is_empty() && link.is_empty() {
            extracted.dropped_no_link_no_title += 1;
            continue;
        }

        extracted.items.push(NewNewsItem {
            title: title.to_string(),
            link: link.to_string(),
            description: item_description(item),
            date: item_date(item),
        });
    }

    extracted
}

/// 既存行の重複判定キー列をページングしながらすべて読み込む
pub async fn fetch_existing_key_rows(pool: &PgPool) -> Result<Vec<NewsKeyRow>> {
    let mut rows = Vec::new();
    let mut offset = 0_i64;

    loop {
        let batch = sqlx::query_as::<_, NewsKeyRow>(
            r#"
            SELECT id, title, link, date
            FROM news
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(KEY_PAGE_SIZE)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("既存ニュースのキー取得に失敗しました")?;

        let fetched = batch.len() as i64;
        rows.extend(batch);
        if fetched < KEY_PAGE_SIZE {
            break;
        }
        offset += KEY_PAGE_SIZE;
    }

    Ok(rows)
}

/// # 概要
/// ニュースの配列を1トランザクションで保存し、採番済みの行を返す。
pub async fn insert_news_items(items: &[NewNewsItem], pool: &PgPool) -> Result<Vec<NewsItem>> {
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let mut tx = pool
        .begin()
        .await
        .context("トランザクションの開始に失敗しました")?;
    let mut inserted = Vec::with_capacity(items.len());

    for chunk in items.chunks(INSERT_CHUNK_SIZE) {
        let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO news (title, link, description, date) ");
        qb.push_values(chunk, |mut row, item| {
            row.push_bind(&item.title)
                .push_bind(&item.link)
                .push_bind(&item.description)
                .push_bind(&item.date);
        });
        qb.push(" RETURNING id, title, link, description, date");

        let rows = qb
            .build_query_as::<NewsItem>()
            .fetch_all(&mut *tx)
            .await
            .context("ニュースのデータベースへの挿入に失敗しました")?;
        inserted.extend(rows);
    }

    tx.commit()
        .await
        .context("トランザクションのコミットに失敗しました")?;

    Ok(inserted)
}

/// 新しい順に最大 `limit` 件のニュースを取得する
pub async fn search_recent_news(limit: i64, pool: &PgPool) -> Result<Vec<NewsItem>> {
    let rows = sqlx::query_as::<_, NewsItem>(
        r#"
        SELECT id, title, link, description, date
        FROM news
        ORDER BY id DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("ニュースの取得に失敗しました")?;

    Ok(rows)
}

/// 指定idの行を1トランザクションで削除し、削除件数を返す
pub async fn delete_news_by_ids(ids: &[i64], pool: &PgPool) -> Result<u64> {
    if ids.is_empty() {
        return Ok(0);
    }

    let mut tx = pool
        .begin()
        .await
        .context("トランザクションの開始に失敗しました")?;

    let result = sqlx::query("DELETE FROM news WHERE id = ANY($1)")
        .bind(ids)
        .execute(&mut *tx)
        .await
        .context("ニュースの削除に失敗しました")?;

    tx.commit()
        .await
        .context("トランザクションのコミットに失敗しました")?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::parser::parse_channel_from_xml_str;
    use crate::infra::storage::file::load_channel_from_xml_file;

    mod extraction_tests {
        use super::*;

        #[test]
        fn test_extract_from_xml() {
            let xml = r#"
                <rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/" xmlns:dc="http://purl.org/dc/elements/1.1/">
                    <channel>
                        <title>Test Feed</title>
                        <link>http://example.com</link>
                        <description>Test Description</description>
                        <item>
                            <title> Test Article 1 </title>
                            <link>http://example.com/article1</link>
                            <description>first</description>
                            <pubDate>Sun, 10 Aug 2025 12:00:00 +0000</pubDate>
                        </item>
                        <item>
                            <title>Test Article 2</title>
                            <content:encoded>encoded body</content:encoded>
                            <dc:date>2025-08-10T13:00:00Z</dc:date>
                        </item>
                        <item>
                            <description>no title, no link</description>
                        </item>
                    </channel>
                </rss>
                "#;
            let channel = parse_channel_from_xml_str(xml).expect("Failed to parse test RSS");
            let extracted = extract_news_from_channel(&channel);

            assert_eq!(extracted.items.len(), 2, "2件の記事が抽出されるはず");
            assert_eq!(extracted.dropped_no_link_no_title, 1);

            let first = &extracted.items[0];
            assert_eq!(first.title, "Test Article 1");
            assert_eq!(first.link, "http://example.com/article1");
            assert_eq!(first.description, "first");
            assert_eq!(first.date, "Sun, 10 Aug 2025 12:00:00 +0000");

            let second = &extracted.items[1];
            assert_eq!(second.link, "");
            assert_eq!(second.description, "encoded body");
            assert_eq!(second.date, "2025-08-10T13:00:00Z");
        }

        #[test]
        fn test_extract_from_mock_file() {
            let channel = load_channel_from_xml_file("mock/rss/pulse.rss").unwrap();
            let extracted = extract_news_from_channel(&channel);

            assert_eq!(extracted.items.len(), 5);
            assert_eq!(extracted.dropped_no_link_no_title, 1);
            assert!(extracted.items[2].description.contains("held rates steady"));
            assert_eq!(extracted.items[3].title, "Rupee   ends flat against dollar");
            assert_eq!(extracted.items[3].date, "2025-10-17T11:30:00+05:30");
        }

        #[test]
        fn test_dedupe_key_of_new_item() {
            let item = NewNewsItem {
                title: "Title".into(),
                link: "https://example.com/x/?utm_source=a".into(),
                description: String::new(),
                date: String::new(),
            };
            assert_eq!(item.dedupe_key(), Some(DedupeKey::Link("example.com/x".into())));
        }
    }

    #[cfg(feature = "db")]
    mod db_tests {
        use super::*;

        fn new_item(title: &str, link: &str, date: &str) -> NewNewsItem {
            NewNewsItem {
                title: title.into(),
                link: link.into(),
                description: format!("{} description", title),
                date: date.into(),
            }
        }

        #[sqlx::test]
        async fn test_insert_news_items(pool: PgPool) -> Result<(), anyhow::Error> {
            let items = vec![
                new_item("A", "https://test.example.com/a", "Fri, 17 Oct 2025 10:00:00 +0530"),
                new_item("B", "", "2025-10-17"),
            ];

            let inserted = insert_news_items(&items, &pool).await?;
            assert_eq!(inserted.len(), 2);
            assert!(inserted[0].id < inserted[1].id, "idは単調増加のはず");
            assert_eq!(inserted[1].title, "B");

            let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM news")
                .fetch_one(&pool)
                .await?;
            assert_eq!(count, 2);
            Ok(())
        }

        #[sqlx::test(fixtures("../../fixtures/news.sql"))]
        async fn test_fetch_existing_key_rows(pool: PgPool) -> Result<(), anyhow::Error> {
            let rows = fetch_existing_key_rows(&pool).await?;
            assert_eq!(rows.len(), 8);
            assert!(rows.windows(2).all(|w| w[0].id < w[1].id), "id昇順のはず");
            Ok(())
        }

        #[sqlx::test(fixtures("../../fixtures/news.sql"))]
        async fn test_search_recent_news(pool: PgPool) -> Result<(), anyhow::Error> {
            let rows = search_recent_news(3, &pool).await?;
            assert_eq!(rows.len(), 3);
            assert!(rows.windows(2).all(|w| w[0].id > w[1].id), "id降順のはず");
            Ok(())
        }

        #[sqlx::test(fixtures("../../fixtures/news.sql"))]
        async fn test_delete_news_by_ids(pool: PgPool) -> Result<(), anyhow::Error> {
            assert_eq!(delete_news_by_ids(&[], &pool).await?, 0);
            assert_eq!(delete_news_by_ids(&[1, 2, 999], &pool).await?, 2);

            let rows = fetch_existing_key_rows(&pool).await?;
            assert_eq!(rows.len(), 6);
            Ok(())
        }
    }
}
