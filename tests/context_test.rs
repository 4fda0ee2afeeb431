use blogging::context::{BloggingContext, ContextError};
use blogging::db;
use blogging::model::{NewBlog, NewPost, PostDraft, SchemaVariant};

async fn setup_context(variant: SchemaVariant) -> BloggingContext {
    let pool = db::init_pool("sqlite::memory:", variant).await.unwrap();
    if variant == SchemaVariant::Existing {
        db::bootstrap_existing(&pool).await.unwrap();
    }
    db::prepare(&pool, variant).await.unwrap();
    BloggingContext::new(pool, variant)
}

#[tokio::test]
async fn saved_blog_is_listed_exactly_once() {
    let mut ctx = setup_context(SchemaVariant::New).await;
    ctx.add_blog(NewBlog::new("http://blogs.example/adonet"));
    assert!(ctx.has_changes());

    let count = ctx.save_changes().await.unwrap();
    assert_eq!(count, 1);
    assert!(!ctx.has_changes());

    let blogs = ctx.blogs().await.unwrap();
    let matching = blogs
        .iter()
        .filter(|b| b.url == "http://blogs.example/adonet")
        .count();
    assert_eq!(matching, 1);
    assert_eq!(blogs.len(), 1);
}

#[tokio::test]
async fn nothing_is_written_before_save() {
    let mut ctx = setup_context(SchemaVariant::New).await;
    ctx.add_blog(NewBlog::new("http://pending.example"));
    assert!(ctx.blogs().await.unwrap().is_empty());
    assert_eq!(ctx.pending_count(), 1);
}

#[tokio::test]
async fn save_without_changes_writes_nothing() {
    let mut ctx = setup_context(SchemaVariant::New).await;
    assert_eq!(ctx.save_changes().await.unwrap(), 0);
}

#[tokio::test]
async fn post_for_missing_blog_is_rejected() {
    let mut ctx = setup_context(SchemaVariant::New).await;
    ctx.add_post(NewPost::new(999, "Orphan", "no owner"));

    let err = ctx.save_changes().await.unwrap_err();
    assert!(matches!(err, ContextError::ForeignKeyViolation { blog_id: 999 }));
    assert!(ctx.has_changes());
    assert_eq!(ctx.posts_of(999).await.unwrap().len(), 0);
}

#[tokio::test]
async fn failed_save_rolls_back_whole_unit() {
    let mut ctx = setup_context(SchemaVariant::New).await;
    ctx.add_blog(NewBlog::new("http://rolled-back.example"));
    ctx.add_post(NewPost::new(42, "Orphan", "no owner"));

    assert!(ctx.save_changes().await.is_err());
    assert!(ctx.blogs().await.unwrap().is_empty());
    assert_eq!(ctx.pending_count(), 2);
}

#[tokio::test]
async fn blog_graph_is_saved_with_generated_key() {
    let mut ctx = setup_context(SchemaVariant::New).await;
    ctx.add_blog(
        NewBlog::new("http://graph.example")
            .with_post(PostDraft::new("First", "Hello"))
            .with_post(PostDraft::default()),
    );
    assert_eq!(ctx.pending_count(), 3);
    assert_eq!(ctx.save_changes().await.unwrap(), 3);

    let blogs = ctx.blogs_with_posts().await.unwrap();
    assert_eq!(blogs.len(), 1);
    let blog = &blogs[0];
    assert_eq!(blog.posts.len(), 2);
    assert!(blog.posts.iter().all(|p| p.blog_id == blog.blog_id));
    assert_eq!(blog.posts[0].title.as_deref(), Some("First"));
    assert!(blog.posts[1].title.is_none());

    let owner = ctx.blog_of(&blog.posts[0]).await.unwrap().unwrap();
    assert_eq!(owner.url, "http://graph.example");
}

#[tokio::test]
async fn post_added_to_existing_blog() {
    let mut ctx = setup_context(SchemaVariant::New).await;
    ctx.add_blog(NewBlog::new("http://owner.example"));
    ctx.save_changes().await.unwrap();
    let blog_id = ctx.blogs().await.unwrap()[0].blog_id;

    ctx.add_post(NewPost::new(blog_id, "Later", "Body"));
    assert_eq!(ctx.save_changes().await.unwrap(), 1);

    let posts = ctx.posts_of(blog_id).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].content.as_deref(), Some("Body"));
    assert!(ctx.blogs().await.unwrap()[0].posts.is_empty());
}

#[tokio::test]
async fn existing_schema_maps_onto_seeded_tables() {
    let mut ctx = setup_context(SchemaVariant::Existing).await;
    assert_eq!(ctx.blogs().await.unwrap().len(), 3);

    ctx.add_blog(NewBlog::new("http://blogs.msdn.com/adonet"));
    assert_eq!(ctx.save_changes().await.unwrap(), 1);

    let urls: Vec<String> = ctx.blogs().await.unwrap().into_iter().map(|b| b.url).collect();
    assert_eq!(urls.len(), 4);
    assert_eq!(urls[0], "http://blogs.msdn.com/dotnet");
    assert_eq!(urls[3], "http://blogs.msdn.com/adonet");

    ctx.add_post(NewPost::new(1234, "Orphan", "x"));
    assert!(matches!(
        ctx.save_changes().await,
        Err(ContextError::ForeignKeyViolation { blog_id: 1234 })
    ));
}

#[tokio::test]
async fn file_database_survives_reopen() {
    let td = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}/data/blogging.db", td.path().display());

    let pool = db::init_pool(&url, SchemaVariant::New).await.unwrap();
    db::prepare(&pool, SchemaVariant::New).await.unwrap();
    let mut ctx = BloggingContext::new(pool.clone(), SchemaVariant::New);
    ctx.add_blog(NewBlog::new("http://durable.example"));
    ctx.save_changes().await.unwrap();
    pool.close().await;

    let pool = db::init_pool(&url, SchemaVariant::New).await.unwrap();
    db::prepare(&pool, SchemaVariant::New).await.unwrap();
    let ctx = BloggingContext::new(pool, SchemaVariant::New);
    let blogs = ctx.blogs().await.unwrap();
    assert_eq!(blogs.len(), 1);
    assert_eq!(blogs[0].url, "http://durable.example");
}
