mod campgrounds;
mod crawl;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "campdb-cli")]
#[command(about = "Campground catalog crawler and database tools")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Crawl the configured extent and reconcile results into the database
    Crawl {
        /// Print the region grid that would be crawled and exit
        #[arg(long)]
        dry_run: bool,
    },
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Inspect stored campgrounds
    Campgrounds {
        #[command(subcommand)]
        command: CampgroundsCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[derive(Debug, Subcommand)]
enum CampgroundsCommands {
    /// List stored campgrounds ordered by id
    List {
        #[arg(long, default_value = "20")]
        limit: u32,
        #[arg(long, default_value = "0")]
        offset: u32,
    },
    /// Show a single campground
    Get {
        /// Upstream campground id
        id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = campdb_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("campdb-cli: no command given; try --help");
        return Ok(());
    };

    // The dry run never touches the database.
    if let Commands::Crawl { dry_run: true } = command {
        return crawl::run_crawl_dry_run(&config);
    }

    let pool_config = campdb_db::PoolConfig::from_app_config(&config);
    let pool = campdb_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Crawl { .. } => crawl::run_crawl(&pool, &config).await?,
        Commands::Db {
            command: DbCommands::Ping,
        } => {
            campdb_db::ping(&pool).await?;
            println!("database: ok");
        }
        Commands::Db {
            command: DbCommands::Migrate,
        } => {
            let applied = campdb_db::run_migrations(&pool).await?;
            println!("migrations applied: {applied}");
        }
        Commands::Campgrounds {
            command: CampgroundsCommands::List { limit, offset },
        } => {
            campgrounds::run_campgrounds_list(&pool, i64::from(limit), i64::from(offset)).await?;
        }
        Commands::Campgrounds {
            command: CampgroundsCommands::Get { id },
        } => campgrounds::run_campgrounds_get(&pool, &id).await?,
    }

    Ok(())
}
