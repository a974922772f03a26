mod products;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::products::ProductsCommands;

#[derive(Debug, Parser)]
#[command(name = "vendorbuddy-cli")]
#[command(about = "VendorBuddy catalog command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Catalog search and upkeep
    Products {
        #[command(subcommand)]
        command: ProductsCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Apply pending migrations
    Migrate,
    /// Check database connectivity
    Ping,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("vendorbuddy-cli: no command given; see --help");
        return Ok(());
    };

    let config = vendorbuddy_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    // Logs go to stderr so search output stays pipeable.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let pool_config = vendorbuddy_db::PoolConfig::from_app_config(&config);
    let pool = vendorbuddy_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db { command } => run_db(&pool, command).await?,
        Commands::Products { command } => products::run(&pool, &config, command).await?,
    }

    Ok(())
}

async fn run_db(pool: &sqlx::PgPool, command: DbCommands) -> anyhow::Result<()> {
    match command {
        DbCommands::Migrate => {
            let applied = vendorbuddy_db::run_migrations(pool).await?;
            println!("applied {applied} migration(s)");
        }
        DbCommands::Ping => {
            vendorbuddy_db::health_check(pool).await?;
            println!("database ok");
        }
    }
    Ok(())
}
