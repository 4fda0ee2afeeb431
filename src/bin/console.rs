use anyhow::Result;
use blogging::context::BloggingContext;
use blogging::model::SchemaVariant;
use blogging::{config, console, db};
use clap::Parser;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Blogging console sample: add one blog, then list all blogs"
)]
struct Args {
    /// Path to YAML config file (built-in defaults when absent)
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Override the configured schema variant
    #[arg(long, value_enum)]
    schema: Option<SchemaVariant>,

    /// Create and seed the existing-schema tables before running
    #[arg(long)]
    bootstrap: bool,

    /// Exit without waiting for a keypress
    #[arg(long)]
    no_wait: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let cfg = config::load_or_default(&args.config)?;
    cfg.ensure_dirs()?;
    let variant = args.schema.unwrap_or(cfg.database.schema);

    // --bootstrap has to be able to create the file the existing variant maps onto.
    let open_as = if args.bootstrap { SchemaVariant::New } else { variant };
    let pool = db::init_pool(&cfg.database_url(), open_as).await?;
    if args.bootstrap {
        db::bootstrap_existing(&pool).await?;
    }
    db::prepare(&pool, variant).await?;

    {
        let mut ctx = BloggingContext::new(pool.clone(), variant);
        let mut stdout = std::io::stdout();
        console::run(&mut ctx, &cfg.console.seed_url, &mut stdout).await?;
    }
    pool.close().await;

    println!("Press any key to continue ...");
    if !args.no_wait {
        let mut buf = [0u8; 1];
        let _ = tokio::io::stdin().read(&mut buf).await;
    }
    Ok(())
}
