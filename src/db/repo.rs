use super::model::{BlogRow, PostRow};
use crate::model::SchemaVariant;
use crate::schema;
use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Executor, Sqlite, SqlitePool, Transaction};
use std::str::FromStr;
use tracing::{info, instrument};

pub type Pool = SqlitePool;

/// Script that creates (and seeds) the database the `existing` variant maps onto.
pub const EXISTING_SCHEMA_SQL: &str = include_str!("../../sql/existing_blogging.sql");

pub async fn init_pool(database_url: &str, variant: SchemaVariant) -> Result<Pool> {
    let owned = variant == SchemaVariant::New;
    let normalized = prepare_sqlite_url(database_url, owned)
        .with_context(|| format!("failed to prepare {database_url}"))?;
    let in_memory = normalized.starts_with("sqlite::memory");

    // Foreign keys are what reject posts pointing at missing blogs.
    let mut options = SqliteConnectOptions::from_str(&normalized)
        .with_context(|| format!("invalid database url {normalized}"))?
        .foreign_keys(true)
        .create_if_missing(in_memory || owned)
        .synchronous(SqliteSynchronous::Full);
    // journal_mode persists in the file; leave an existing database's setting alone.
    if owned {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    let pool_options = if in_memory {
        // Every in-memory connection is its own database; keep exactly one alive.
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new()
    };

    let pool = pool_options
        .connect_with(options)
        .await
        .with_context(|| format!("failed to open {normalized}"))?;
    Ok(pool)
}

/// If using a file-backed SQLite URL, expand a leading `~/` and, when
/// `create_parent` is set, ensure the parent directory exists. Leaves in-memory
/// URLs untouched. Returns possibly-updated URL.
pub(crate) fn prepare_sqlite_url(url: &str, create_parent: bool) -> std::io::Result<String> {
    if !url.starts_with("sqlite:") {
        return Ok(url.to_string());
    }

    // sqlite::memory: or sqlite::memory:?cache=shared
    if url.starts_with("sqlite::memory") {
        return Ok(url.to_string());
    }

    let rest = &url["sqlite:".len()..];
    let path_with_query = rest.strip_prefix("//").unwrap_or(rest);

    let (path_part, query_part) = match path_with_query.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path_with_query, None),
    };

    if path_part.is_empty() {
        return Ok(url.to_string());
    }

    let expanded_path = match (path_part.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), rest),
        _ => path_part.to_string(),
    };

    if create_parent {
        if let Some(parent) = std::path::Path::new(&expanded_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }

    let mut rebuilt = String::from("sqlite://");
    rebuilt.push_str(&expanded_path);
    if let Some(q) = query_part {
        rebuilt.push('?');
        rebuilt.push_str(q);
    }
    Ok(rebuilt)
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Create the `Blog`/`Post` tables of the pre-existing database and seed it.
/// Safe to run more than once.
#[instrument(skip_all)]
pub async fn bootstrap_existing(pool: &Pool) -> Result<()> {
    pool.execute(EXISTING_SCHEMA_SQL)
        .await
        .context("failed to run existing database script")?;
    Ok(())
}

/// Make the database usable for `variant`: migrate a new database, verify an
/// existing one against the model snapshot.
#[instrument(skip_all, fields(variant = %variant))]
pub async fn prepare(pool: &Pool, variant: SchemaVariant) -> Result<()> {
    match variant {
        SchemaVariant::New => {
            run_migrations(pool).await?;
            info!("migrations applied");
        }
        SchemaVariant::Existing => {
            let snapshot = schema::model_snapshot(variant);
            schema::verify(pool, &snapshot)
                .await
                .context("existing database does not match the blogging model")?;
            info!("existing schema verified");
        }
    }
    Ok(())
}

pub async fn insert_blog_tx(
    tx: &mut Transaction<'_, Sqlite>,
    variant: SchemaVariant,
    url: &str,
) -> sqlx::Result<i64> {
    let sql = format!(r#"INSERT INTO "{}" ("Url") VALUES (?)"#, variant.blog_table());
    let done = sqlx::query(&sql).bind(url).execute(&mut **tx).await?;
    Ok(done.last_insert_rowid())
}

pub async fn insert_post_tx(
    tx: &mut Transaction<'_, Sqlite>,
    variant: SchemaVariant,
    blog_id: i64,
    title: Option<&str>,
    content: Option<&str>,
) -> sqlx::Result<i64> {
    let sql = format!(
        r#"INSERT INTO "{}" ("BlogId", "Title", "Content") VALUES (?, ?, ?)"#,
        variant.post_table()
    );
    let done = sqlx::query(&sql)
        .bind(blog_id)
        .bind(title)
        .bind(content)
        .execute(&mut **tx)
        .await?;
    Ok(done.last_insert_rowid())
}

#[instrument(skip_all)]
pub async fn list_blogs(pool: &Pool, variant: SchemaVariant) -> sqlx::Result<Vec<BlogRow>> {
    let sql = format!(
        r#"SELECT "BlogId", "Url" FROM "{}" ORDER BY "BlogId""#,
        variant.blog_table()
    );
    sqlx::query_as(&sql).fetch_all(pool).await
}

#[instrument(skip_all)]
pub async fn find_blog(
    pool: &Pool,
    variant: SchemaVariant,
    blog_id: i64,
) -> sqlx::Result<Option<BlogRow>> {
    let sql = format!(
        r#"SELECT "BlogId", "Url" FROM "{}" WHERE "BlogId" = ?"#,
        variant.blog_table()
    );
    sqlx::query_as(&sql).bind(blog_id).fetch_optional(pool).await
}

#[instrument(skip_all)]
pub async fn list_posts_for_blog(
    pool: &Pool,
    variant: SchemaVariant,
    blog_id: i64,
) -> sqlx::Result<Vec<PostRow>> {
    let sql = format!(
        r#"SELECT "PostId", "BlogId", "Title", "Content" FROM "{}" WHERE "BlogId" = ? ORDER BY "PostId""#,
        variant.post_table()
    );
    sqlx::query_as(&sql).bind(blog_id).fetch_all(pool).await
}

#[instrument(skip_all)]
pub async fn list_posts(pool: &Pool, variant: SchemaVariant) -> sqlx::Result<Vec<PostRow>> {
    let sql = format!(
        r#"SELECT "PostId", "BlogId", "Title", "Content" FROM "{}" ORDER BY "BlogId", "PostId""#,
        variant.post_table()
    );
    sqlx::query_as(&sql).fetch_all(pool).await
}

pub async fn count_blogs(pool: &Pool, variant: SchemaVariant) -> sqlx::Result<i64> {
    let sql = format!(r#"SELECT COUNT(*) FROM "{}""#, variant.blog_table());
    sqlx::query_scalar(&sql).fetch_one(pool).await
}

pub async fn count_posts(pool: &Pool, variant: SchemaVariant) -> sqlx::Result<i64> {
    let sql = format!(r#"SELECT COUNT(*) FROM "{}""#, variant.post_table());
    sqlx::query_scalar(&sql).fetch_one(pool).await
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_pool(variant: SchemaVariant) -> Pool {
        let pool = init_pool("sqlite::memory:", variant).await.unwrap();
        match variant {
            SchemaVariant::New => run_migrations(&pool).await.unwrap(),
            SchemaVariant::Existing => bootstrap_existing(&pool).await.unwrap(),
        }
        pool
    }

    #[test]
    fn memory_urls_pass_through() {
        assert_eq!(
            prepare_sqlite_url("sqlite::memory:", true).unwrap(),
            "sqlite::memory:"
        );
        assert_eq!(
            prepare_sqlite_url("postgres://localhost/db", true).unwrap(),
            "postgres://localhost/db"
        );
    }

    #[test]
    fn file_url_creates_parent_and_keeps_query() {
        let td = tempfile::tempdir().unwrap();
        let db_path = td.path().join("nested").join("blogging.db");
        let url = format!("sqlite:{}?mode=rwc", db_path.display());
        let prepared = prepare_sqlite_url(&url, true).unwrap();
        assert_eq!(prepared, format!("sqlite://{}?mode=rwc", db_path.display()));
        assert!(td.path().join("nested").exists());
    }

    #[test]
    fn parent_left_alone_when_not_owned() {
        let td = tempfile::tempdir().unwrap();
        let db_path = td.path().join("nested").join("blogging.db");
        let url = format!("sqlite://{}", db_path.display());
        prepare_sqlite_url(&url, false).unwrap();
        assert!(!td.path().join("nested").exists());
    }

    #[test]
    fn parent_creation_failure_is_reported() {
        let td = tempfile::tempdir().unwrap();
        let blocker = td.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let url = format!("sqlite://{}/blogging.db", blocker.display());
        assert!(prepare_sqlite_url(&url, true).is_err());
    }

    #[tokio::test]
    async fn insert_and_list_blogs() {
        let pool = setup_pool(SchemaVariant::New).await;
        let mut tx = pool.begin().await.unwrap();
        let id = insert_blog_tx(&mut tx, SchemaVariant::New, "http://a.example")
            .await
            .unwrap();
        insert_post_tx(&mut tx, SchemaVariant::New, id, Some("t"), None)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let blogs = list_blogs(&pool, SchemaVariant::New).await.unwrap();
        assert_eq!(blogs.len(), 1);
        assert_eq!(blogs[0].blog_id, id);
        let posts = list_posts_for_blog(&pool, SchemaVariant::New, id).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title.as_deref(), Some("t"));
        assert!(posts[0].content.is_none());
        assert!(find_blog(&pool, SchemaVariant::New, id + 1)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn bootstrap_existing_seeds_once() {
        let pool = setup_pool(SchemaVariant::Existing).await;
        bootstrap_existing(&pool).await.unwrap();
        assert_eq!(count_blogs(&pool, SchemaVariant::Existing).await.unwrap(), 3);
        assert_eq!(count_posts(&pool, SchemaVariant::Existing).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_existing_database_is_not_created() {
        let td = tempfile::tempdir().unwrap();
        let db_path = td.path().join("absent.db");
        let url = format!("sqlite://{}", db_path.display());
        assert!(init_pool(&url, SchemaVariant::Existing).await.is_err());
        assert!(!db_path.exists());

        let nested = td.path().join("missing_dir").join("absent.db");
        let url = format!("sqlite://{}", nested.display());
        assert!(init_pool(&url, SchemaVariant::Existing).await.is_err());
        assert!(!td.path().join("missing_dir").exists());
    }

    #[tokio::test]
    async fn existing_database_keeps_its_journal_mode() {
        let td = tempfile::tempdir().unwrap();
        let db_path = td.path().join("legacy.db");
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Delete);
        let legacy = SqlitePoolOptions::new().connect_with(options).await.unwrap();
        bootstrap_existing(&legacy).await.unwrap();
        legacy.close().await;

        let url = format!("sqlite://{}", db_path.display());
        let pool = init_pool(&url, SchemaVariant::Existing).await.unwrap();
        prepare(&pool, SchemaVariant::Existing).await.unwrap();
        let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "delete");
    }
}
