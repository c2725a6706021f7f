use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use teacup_core::filter::{DEFAULT_SINCE, DEFAULT_UNTIL};
use teacup_core::{build_filter, parse, Article, ArticleFilter, ArticleStorage, Page, SearchWindow, SortOrder};
use teacup_storage::BackendKind;
use teacup_web::{logging::init_logging, render, AppState};
use tracing::{info, warn};

const HEALTH_CHECK_RETRIES: u32 = 3;
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser, Debug)]
#[command(author, version, about = "Browse and search the teacup article archive", long_about = None)]
pub struct Cli {
    /// Storage backend: sqlite or memory
    #[arg(long, env = "TEACUP_STORAGE", default_value = "sqlite")]
    storage: BackendKind,
    /// SQLite database file, or JSON fixture for the memory backend
    #[arg(long, env = "TEACUP_DB")]
    db: Option<PathBuf>,
    /// Lower date bound used when a query has no since:
    #[arg(long, env = "TEACUP_DEFAULT_SINCE", default_value = DEFAULT_SINCE)]
    default_since: String,
    /// Upper date bound used when a query has no until:
    #[arg(long, env = "TEACUP_DEFAULT_UNTIL", default_value = DEFAULT_UNTIL)]
    default_until: String,
    #[arg(long, env = "TEACUP_LOG", default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the web front end
    Serve {
        #[arg(long, env = "TEACUP_BIND", default_value = "0.0.0.0:8001")]
        bind: SocketAddr,
    },
    /// Search articles, e.g. `teacup search hello since:2020-01-01 by:alice`
    Search {
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        query: Vec<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Print the page as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a single article
    Show {
        id: String,
    },
    /// List the articles of one month
    Month {
        year: i32,
        month: u32,
    },
    /// Print how a query is parsed and the filter built from it
    Parse {
        #[arg(num_args = 0.., allow_hyphen_values = true)]
        query: Vec<String>,
    },
}

impl Cli {
    fn window(&self) -> SearchWindow {
        SearchWindow::new(self.default_since.clone(), self.default_until.clone())
    }
}

async fn check_storage(storage: &Arc<dyn ArticleStorage>, kind: BackendKind) -> teacup_core::Result<()> {
    let mut last_error = None;

    for attempt in 1..=HEALTH_CHECK_RETRIES {
        match tokio::time::timeout(HEALTH_CHECK_TIMEOUT, storage.count()).await {
            Ok(Ok(count)) => {
                info!("🏦 Storage ready (using {}, {} articles)", kind, count);
                return Ok(());
            }
            Ok(Err(e)) => last_error = Some(e),
            Err(elapsed) => {
                last_error = Some(teacup_core::Error::Storage(format!("Storage health check timed out: {}", elapsed)));
            }
        }
        if attempt < HEALTH_CHECK_RETRIES {
            warn!("Storage health check failed, retrying {}/{}...", attempt, HEALTH_CHECK_RETRIES);
            tokio::time::sleep(Duration::from_secs(2)).await;
        }
    }

    Err(last_error.unwrap_or_else(|| teacup_core::Error::Storage("Storage health check failed after all retries".to_string())))
}

fn print_article_line(article: &Article) {
    println!(
        "{}\t{}\t{}\t{}",
        article.id,
        render::weekday(&article.created_at),
        article.author_name,
        article.title
    );
}

fn print_article(article: &Article) {
    println!("{}", article.title);
    println!("{} ({})", article.author_name, article.author_remote_addr);
    println!("{}", render::weekday(&article.created_at));
    println!();
    println!("{}", article.body);
}

async fn open_storage(kind: BackendKind, db: Option<&Path>) -> anyhow::Result<Arc<dyn ArticleStorage>> {
    let storage = teacup_storage::create_storage(kind, db)
        .await
        .with_context(|| format!("failed to open {} storage", kind))?;
    check_storage(&storage, kind).await?;
    Ok(storage)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let window = cli.window();
    let kind = cli.storage;
    let db = cli.db.clone();

    match cli.command {
        Commands::Serve { bind } => {
            let storage = open_storage(kind, db.as_deref()).await?;
            teacup_web::serve(AppState::new(storage, window), bind).await?;
        }
        Commands::Search { query, page, json } => {
            let storage = open_storage(kind, db.as_deref()).await?;
            let parsed = parse(&query.join(" "));
            let filter = build_filter(&parsed, &window);
            let results = storage.find(&filter, SortOrder::Oldest).await?;
            let page = Page::new(results, page);
            if json {
                println!("{}", serde_json::to_string_pretty(&page)?);
            } else {
                println!("{}", render::pagination_message(&page));
                for article in &page.items {
                    print_article_line(article);
                }
            }
        }
        Commands::Show { id } => {
            let storage = open_storage(kind, db.as_deref()).await?;
            match storage.get_by_id(&id).await? {
                Some(article) => print_article(&article),
                None => anyhow::bail!("article {} not found", id),
            }
        }
        Commands::Month { year, month } => {
            let storage = open_storage(kind, db.as_deref()).await?;
            let articles = storage.find(&ArticleFilter::month(year, month)?, SortOrder::Oldest).await?;
            println!("{} ({})", render::month_title(year, month), articles.len());
            for article in &articles {
                print_article_line(article);
            }
        }
        Commands::Parse { query } => {
            let parsed = parse(&query.join(" "));
            let filter = build_filter(&parsed, &window);
            println!("{}", serde_json::to_string_pretty(&parsed)?);
            println!("{}", serde_json::to_string_pretty(&filter)?);
        }
    }

    Ok(())
}
