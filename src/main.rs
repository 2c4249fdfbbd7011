use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use newswire::domain::dedupe::KeepPolicy;
use newswire::infra::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(name = "newswire")]
#[command(version, about = "RSSニュースの保存・取得サービスとメンテナンスコマンド")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// HTTPサーバーを起動（既定）
    Serve,
    /// フィードを1回取得して新規分を保存
    Store,
    /// 当日（なければ前日）のニュースを表示
    List {
        /// 表示件数（0で無制限）
        #[arg(long, default_value_t = 0)]
        limit: usize,
        /// 先頭から飛ばす件数
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// 正規化キーが同じ行を1件だけ残して削除
    Dedupe {
        /// 残す行
        #[arg(long, value_enum, default_value_t = KeepPolicy::Oldest)]
        keep: KeepPolicy,
        /// 削除せず件数だけ表示
        #[arg(long)]
        dry_run: bool,
    },
    /// 日付文字列が指定日に一致する行を削除
    Purge {
        /// 対象日 (YYYY-MM-DD)
        #[arg(long, required_unless_present = "pattern", conflicts_with = "pattern")]
        from: Option<NaiveDate>,
        /// 範囲の最終日 (YYYY-MM-DD、省略時は --from と同じ)
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
        /// 日付文字列に当てる任意の正規表現
        #[arg(long)]
        pattern: Option<String>,
        /// 削除せず件数だけ表示
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // 環境変数を読み込み（.envファイルがあれば使用）
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => newswire::app::server::run_server(config).await,
        Commands::Store => commands::store(&config).await,
        Commands::List { limit, offset } => commands::list(&config, limit, offset).await,
        Commands::Dedupe { keep, dry_run } => commands::dedupe(&config, keep, dry_run).await,
        Commands::Purge {
            from,
            to,
            pattern,
            dry_run,
        } => commands::purge(&config, from, to, pattern, dry_run).await,
    }
}
