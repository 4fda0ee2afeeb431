use crate::context::BloggingContext;
use crate::model::NewBlog;
use anyhow::Result;
use std::io::Write;
use tracing::{info, instrument};

/// Insert one blog, save, then list every blog URL to `out`.
/// Returns the number of records saved.
#[instrument(skip_all, fields(variant = %ctx.variant()))]
pub async fn run<W: Write>(ctx: &mut BloggingContext, seed_url: &str, out: &mut W) -> Result<usize> {
    ctx.add_blog(NewBlog::new(seed_url));
    let count = ctx.save_changes().await?;
    info!(count, "records saved");
    writeln!(out, "{} records saved to database", count)?;

    writeln!(out)?;
    writeln!(out, "All blogs in database:")?;
    for blog in ctx.blogs().await? {
        writeln!(out, " - {}", blog.url)?;
    }
    Ok(count)
}
