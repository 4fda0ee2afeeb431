//! Unit of work over the blogging database.
//!
//! A `BloggingContext` collects added entities in memory; nothing reaches the
//! database until `save_changes`, which writes everything pending in one
//! transaction. Contexts are cheap (a pool handle and a vector) and meant to
//! live for one operation or one request.

use crate::db::{self, Pool};
use crate::model::{Blog, NewBlog, NewPost, Post, SchemaVariant};
use thiserror::Error;
use tracing::{debug, instrument, warn};

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("post references blog {blog_id}, which does not exist")]
    ForeignKeyViolation { blog_id: i64 },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PendingChange {
    Blog(NewBlog),
    Post(NewPost),
}

impl PendingChange {
    fn record_count(&self) -> usize {
        match self {
            PendingChange::Blog(blog) => 1 + blog.posts.len(),
            PendingChange::Post(_) => 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BloggingContext {
    pool: Pool,
    variant: SchemaVariant,
    pending: Vec<PendingChange>,
}

impl BloggingContext {
    pub fn new(pool: Pool, variant: SchemaVariant) -> Self {
        Self {
            pool,
            variant,
            pending: Vec::new(),
        }
    }

    pub fn variant(&self) -> SchemaVariant {
        self.variant
    }

    pub fn add_blog(&mut self, blog: NewBlog) {
        self.pending.push(PendingChange::Blog(blog));
    }

    pub fn add_post(&mut self, post: NewPost) {
        self.pending.push(PendingChange::Post(post));
    }

    pub fn has_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Number of rows the next `save_changes` will write.
    pub fn pending_count(&self) -> usize {
        self.pending.iter().map(PendingChange::record_count).sum()
    }

    /// Write all pending entities in one transaction and return the number of
    /// records written. On error nothing is written and the entities stay
    /// pending.
    #[instrument(skip_all, fields(variant = %self.variant, pending = self.pending.len()))]
    pub async fn save_changes(&mut self) -> Result<usize, ContextError> {
        if self.pending.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut written = 0usize;
        for change in &self.pending {
            match change {
                PendingChange::Blog(blog) => {
                    let blog_id = db::insert_blog_tx(&mut tx, self.variant, &blog.url).await?;
                    written += 1;
                    for draft in &blog.posts {
                        db::insert_post_tx(
                            &mut tx,
                            self.variant,
                            blog_id,
                            draft.title.as_deref(),
                            draft.content.as_deref(),
                        )
                        .await?;
                        written += 1;
                    }
                    debug!(blog_id, posts = blog.posts.len(), "blog inserted");
                }
                PendingChange::Post(post) => {
                    let inserted = db::insert_post_tx(
                        &mut tx,
                        self.variant,
                        post.blog_id,
                        post.title.as_deref(),
                        post.content.as_deref(),
                    )
                    .await;
                    match inserted {
                        Ok(post_id) => {
                            written += 1;
                            debug!(post_id, blog_id = post.blog_id, "post inserted");
                        }
                        Err(sqlx::Error::Database(err)) if err.is_foreign_key_violation() => {
                            warn!(blog_id = post.blog_id, "post rejected: unknown blog");
                            return Err(ContextError::ForeignKeyViolation {
                                blog_id: post.blog_id,
                            });
                        }
                        Err(err) => return Err(err.into()),
                    }
                }
            }
        }
        tx.commit().await?;
        self.pending.clear();
        Ok(written)
    }

    /// All blogs, navigation collections left empty.
    pub async fn blogs(&self) -> Result<Vec<Blog>, ContextError> {
        let rows = db::list_blogs(&self.pool, self.variant).await?;
        Ok(rows.into_iter().map(Blog::from).collect())
    }

    /// All blogs with their posts loaded.
    pub async fn blogs_with_posts(&self) -> Result<Vec<Blog>, ContextError> {
        let mut blogs = self.blogs().await?;
        let posts = db::list_posts(&self.pool, self.variant).await?;
        for post in posts {
            if let Some(blog) = blogs.iter_mut().find(|b| b.blog_id == post.blog_id) {
                blog.posts.push(post.into());
            }
        }
        Ok(blogs)
    }

    pub async fn find_blog(&self, blog_id: i64) -> Result<Option<Blog>, ContextError> {
        let row = db::find_blog(&self.pool, self.variant, blog_id).await?;
        Ok(row.map(Blog::from))
    }

    pub async fn posts_of(&self, blog_id: i64) -> Result<Vec<Post>, ContextError> {
        let rows = db::list_posts_for_blog(&self.pool, self.variant, blog_id).await?;
        Ok(rows.into_iter().map(Post::from).collect())
    }

    /// The blog owning `post`.
    pub async fn blog_of(&self, post: &Post) -> Result<Option<Blog>, ContextError> {
        self.find_blog(post.blog_id).await
    }
}
