use anyhow::Result;
use blogging::model::SchemaVariant;
use blogging::{config, db, web};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(author, version, about = "Blogging web sample: list and create blogs")]
struct Args {
    /// Path to YAML config file (built-in defaults when absent)
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Override the configured schema variant
    #[arg(long, value_enum)]
    schema: Option<SchemaVariant>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load_or_default(&args.config)?;
    cfg.ensure_dirs()?;
    let variant = args.schema.unwrap_or(cfg.database.schema);

    let pool = db::init_pool(&cfg.database_url(), variant).await?;
    db::prepare(&pool, variant).await?;

    let app = web::router(web::AppState::new(pool.clone(), variant));
    let addr = cfg.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, %variant, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    pool.close().await;
    info!("shut down");
    Ok(())
}
