mod ingest;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "dealsdb-cli")]
#[command(about = "dealsdb operator command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// List the category registry in schedule order
    Categories,
    /// Run ingestion once for one category or for every category
    Ingest {
        /// Only ingest this storage key
        #[arg(long)]
        storage_key: Option<String>,
        /// Maximum number of categories ingested at the same time
        #[arg(long, default_value_t = 4)]
        concurrency: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("dealsdb-cli: run with --help to list commands");
        return Ok(());
    };

    let config = dealsdb_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match command {
        Commands::Migrate => {
            let pool = dealsdb_db::connect_pool(
                &config.database_url,
                dealsdb_db::PoolConfig::from_app_config(&config),
            )
            .await?;
            let applied = dealsdb_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        Commands::Categories => {
            let registry = dealsdb_core::load_categories(&config.categories_path)?;
            print!("{}", ingest::format_registry(&registry, config.schedule));
        }
        Commands::Ingest {
            storage_key,
            concurrency,
        } => {
            let registry = dealsdb_core::load_categories(&config.categories_path)?;
            ingest::run_ingest(&config, &registry, storage_key.as_deref(), concurrency).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests;
