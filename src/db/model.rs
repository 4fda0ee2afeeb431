//! Row models returned by repositories.
//!
//! Column names are the PascalCase names both schema variants share; only
//! the table names differ.

use crate::model::{Blog, Post};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BlogRow {
    #[sqlx(rename = "BlogId")]
    pub blog_id: i64,
    #[sqlx(rename = "Url")]
    pub url: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
    #[sqlx(rename = "PostId")]
    pub post_id: i64,
    #[sqlx(rename = "BlogId")]
    pub blog_id: i64,
    #[sqlx(rename = "Title")]
    pub title: Option<String>,
    #[sqlx(rename = "Content")]
    pub content: Option<String>,
}

impl From<BlogRow> for Blog {
    fn from(row: BlogRow) -> Self {
        Blog {
            blog_id: row.blog_id,
            url: row.url,
            posts: Vec::new(),
        }
    }
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            post_id: row.post_id,
            blog_id: row.blog_id,
            title: row.title,
            content: row.content,
        }
    }
}
