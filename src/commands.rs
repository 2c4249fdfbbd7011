use anyhow::{bail, Result};
use chrono::NaiveDate;

use newswire::{
    app::workflow::execute_store_workflow,
    domain::{
        dedupe::{remove_duplicate_news, KeepPolicy},
        feed::resolve_feeds,
        purge::{purge_news_by_date, DayRange, PurgeTarget},
        today::{fetch_day_news, Page},
    },
    infra::{api::http::ReqwestHttpClient, config::AppConfig, db::setup_database},
};

pub async fn store(config: &AppConfig) -> Result<()> {
    let pool = setup_database(config).await?;
    let feeds = resolve_feeds(config)?;

    println!("=== ニュース保存を開始（フィード{}件）===", feeds.len());
    let outcome = execute_store_workflow(&ReqwestHttpClient::new(), &feeds, &pool).await?;
    println!("{}", outcome);
    for item in &outcome.inserted {
        println!("  + [{}] {}", item.id, item.title);
    }

    Ok(())
}

pub async fn list(config: &AppConfig, limit: usize, offset: usize) -> Result<()> {
    let pool = setup_database(config).await?;
    let page = Page {
        limit: Some(limit),
        offset: Some(offset),
    };

    let day_news = fetch_day_news(&pool, config.utc_offset, page).await?;
    println!(
        "{} ({:?}): {}件",
        day_news.day_date, day_news.requested_day, day_news.count
    );
    for item in &day_news.news {
        println!("[{}] {} | {} | {}", item.id, item.date, item.title, item.link);
    }

    Ok(())
}

pub async fn dedupe(config: &AppConfig, keep: KeepPolicy, dry_run: bool) -> Result<()> {
    let pool = setup_database(config).await?;

    let (plan, result) = remove_duplicate_news(&pool, keep, dry_run).await?;
    println!("重複グループ: {}件", plan.duplicate_groups);
    println!("{}", result.display_with_domain("重複削除"));

    Ok(())
}

pub async fn purge(
    config: &AppConfig,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    pattern: Option<String>,
    dry_run: bool,
) -> Result<()> {
    let target = match (from, pattern) {
        (Some(from), None) => PurgeTarget::Days(DayRange::new(from, to)?),
        (None, Some(pattern)) => PurgeTarget::Pattern(pattern),
        _ => bail!("--from か --pattern のどちらか一方を指定してください"),
    };

    let pool = setup_database(config).await?;
    let result = purge_news_by_date(&pool, &target, dry_run).await?;
    println!("{}", result.display_with_domain("日付指定削除"));

    Ok(())
}
