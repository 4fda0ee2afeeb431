use anyhow::Result;
use blogging::model::SchemaVariant;
use blogging::{config, db, schema};
use clap::Parser;
use sqlx::Row;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(about = "Print the blogging model and check a database against it")]
struct Args {
    /// Path to YAML config (built-in defaults when absent)
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Schema variant to check
    #[arg(long, value_enum)]
    schema: Option<SchemaVariant>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = config::load_or_default(&args.config)?;
    let variant = args.schema.unwrap_or(cfg.database.schema);

    let snapshot = schema::model_snapshot(variant);
    print!("{}", schema::describe(&snapshot));

    // Never create the database just to inspect it.
    let pool = db::init_pool(&cfg.database_url(), SchemaVariant::Existing).await?;
    println!();
    println!("Tables:");
    let tables = sqlx::query(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(&pool)
    .await?;
    for row in tables {
        let name: String = row.get("name");
        println!("  {}", name);
    }

    println!();
    match schema::verify(&pool, &snapshot).await {
        Ok(()) => println!("Database matches the {} model.", variant),
        Err(err) => println!("Database does not match the {} model: {}", variant, err),
    }
    pool.close().await;
    Ok(())
}
