use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use orgcrawl::client::AnypointClient;
use orgcrawl::config::{CrawlConfig, DEFAULT_BASE_URL};
use orgcrawl::engine::{Crawler, FailurePolicy, FlatKey, DEFAULT_MAX_IN_FLIGHT};
use orgcrawl::{pipeline, render};

#[derive(Parser)]
#[command(name = "orgcrawl")]
#[command(about = "Crawl an organization hierarchy and inventory its deployed applications")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover the hierarchy, list every environment's applications and write snapshots
    Crawl(CrawlArgs),
    /// Find every application deployed under a domain name
    Search(SearchArgs),
}

/// Settings shared by every command.
#[derive(Args)]
struct ConnectionArgs {
    /// ID of the root organization
    #[arg(long, env = "ORGCRAWL_ROOT_ID")]
    root_id: Option<String>,

    /// Account username
    #[arg(long, env = "ORGCRAWL_USERNAME")]
    username: Option<String>,

    /// Account password
    #[arg(long, env = "ORGCRAWL_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// API base URL
    #[arg(long, env = "ORGCRAWL_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Maximum number of concurrent remote calls
    #[arg(long, default_value_t = DEFAULT_MAX_IN_FLIGHT)]
    max_in_flight: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// How to handle a branch that cannot be fetched
    #[arg(long, value_enum, default_value_t = FailurePolicy::FailFast)]
    policy: FailurePolicy,
}

impl ConnectionArgs {
    fn into_config(self) -> orgcrawl::Result<CrawlConfig> {
        CrawlConfig::new(self.root_id, self.username, self.password)?
            .with_base_url(self.base_url)
            .with_request_timeout(Duration::from_secs(self.timeout_secs))
            .with_policy(self.policy)
            .with_max_in_flight(self.max_in_flight)
    }
}

#[derive(Args)]
struct CrawlArgs {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Directory to write metrics.json and metrics_flat.json into
    #[arg(long, default_value = ".")]
    outdir: PathBuf,

    /// Key for the flattened snapshot
    #[arg(long, value_enum, default_value_t = FlatKey::Name)]
    flat_key: FlatKey,

    /// Print the discovered hierarchy to stdout
    #[arg(long)]
    print_tree: bool,
}

#[derive(Args)]
struct SearchArgs {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Application domain to look for
    #[arg(long)]
    domain: String,
}

/// Initialize tracing on stderr so stdout only carries results.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "orgcrawl=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Build a crawler whose passes stop when Ctrl-C is pressed.
fn crawler_for(config: &CrawlConfig) -> orgcrawl::Result<Crawler> {
    let client = AnypointClient::from_config(config)?;
    let crawler = Crawler::with_client(client, config.engine);

    let shutdown = crawler.shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling crawl");
            shutdown.cancel();
        }
    });

    Ok(crawler)
}

async fn crawl(args: CrawlArgs) -> anyhow::Result<()> {
    let config = args
        .connection
        .into_config()?
        .with_output_dir(args.outdir)
        .with_flat_key(args.flat_key);
    let crawler = crawler_for(&config)?;

    let report = pipeline::run_crawl(&crawler, &config).await?;

    if args.print_tree {
        print!("{}", render::render_tree(&report.tree));
    }
    println!("wrote {} bytes to {}", report.tree_bytes, config.tree_path().display());
    println!("wrote {} bytes to {}", report.flat_bytes, config.flat_path().display());
    tracing::info!(
        "Crawl {} finished in {:.1}s",
        report.run_id,
        report.elapsed.as_secs_f64()
    );

    Ok(())
}

async fn search(args: SearchArgs) -> anyhow::Result<()> {
    let config = args.connection.into_config()?;
    let crawler = crawler_for(&config)?;

    let tree = crawler.build_tree(&config.root_id).await?;
    let matches = crawler.find_by_domain(&tree, &args.domain).await?;

    if matches.is_empty() {
        println!("No applications found with domain {}", args.domain);
    }
    for found in &matches {
        let app = &found.application;
        let updated = app
            .last_updated()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!(
            "{} / {}: {} ({}) status={} runtime={} updated={}",
            found.organization_name,
            found.environment_name,
            app.domain,
            app.full_domain,
            app.status,
            app.mule_version.version,
            updated
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Commands::Crawl(args) => crawl(args).await?,
        Commands::Search(args) => search(args).await?,
    }

    Ok(())
}
