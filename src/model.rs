use serde::{Deserialize, Serialize};

/// Which database layout the samples map onto.
///
/// `New` is owned by the crate's migrations; `Existing` was created outside
/// of it (see `sql/existing_blogging.sql`) and is only verified, never
/// altered.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVariant {
    #[default]
    New,
    Existing,
}

impl SchemaVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaVariant::New => "new",
            SchemaVariant::Existing => "existing",
        }
    }

    pub fn blog_table(&self) -> &'static str {
        match self {
            SchemaVariant::New => "Blogs",
            SchemaVariant::Existing => "Blog",
        }
    }

    pub fn post_table(&self) -> &'static str {
        match self {
            SchemaVariant::New => "Posts",
            SchemaVariant::Existing => "Post",
        }
    }
}

impl std::fmt::Display for SchemaVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Blog {
    pub blog_id: i64,
    pub url: String,
    /// Empty unless loaded through `BloggingContext::blogs_with_posts`.
    #[serde(default)]
    pub posts: Vec<Post>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    pub post_id: i64,
    pub blog_id: i64,
    pub title: Option<String>,
    pub content: Option<String>,
}

/// A blog that has not been saved yet. Drafts are inserted with it and
/// receive its generated id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewBlog {
    pub url: String,
    pub posts: Vec<PostDraft>,
}

impl NewBlog {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            posts: Vec::new(),
        }
    }

    pub fn with_post(mut self, draft: PostDraft) -> Self {
        self.posts.push(draft);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostDraft {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl PostDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            content: Some(content.into()),
        }
    }
}

/// A post attached to an already persisted blog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub blog_id: i64,
    pub title: Option<String>,
    pub content: Option<String>,
}

impl NewPost {
    pub fn new(blog_id: i64, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            blog_id,
            title: Some(title.into()),
            content: Some(content.into()),
        }
    }
}
