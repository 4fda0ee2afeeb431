use super::antiforgery;
use crate::model::Blog;
use axum::http::StatusCode;

pub const URL_REQUIRED: &str = "The Url field is required.";

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn html_attr(s: &str) -> String {
    html_escape(s).replace('"', "&quot;")
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{} - Blogging</title>
  </head>
  <body>
    <header>
      <a href="/blogs">Blogging</a>
    </header>
    <main>
{}
    </main>
  </body>
</html>"#,
        html_escape(title),
        body
    )
}

pub fn blog_index(blogs: &[Blog]) -> String {
    let mut rows = String::new();
    for blog in blogs {
        rows.push_str(&format!(
            "        <tr><td>{}</td><td>{}</td></tr>\n",
            blog.blog_id,
            html_escape(&blog.url)
        ));
    }
    let body = format!(
        r#"      <h2>Blogs</h2>
      <p><a href="/blogs/create">Create New</a></p>
      <table class="table">
        <tr><th>Id</th><th>Url</th></tr>
{}      </table>"#,
        rows
    );
    layout("Blogs", &body)
}

/// Create form, optionally redisplayed with the submitted value and errors.
pub fn blog_create(url: &str, errors: &[&str], token: &str) -> String {
    let summary = if errors.is_empty() {
        String::new()
    } else {
        let items: String = errors
            .iter()
            .map(|e| format!("<li>{}</li>", html_escape(e)))
            .collect();
        format!("      <div class=\"validation-summary-errors\"><ul>{}</ul></div>\n", items)
    };
    let body = format!(
        r#"      <h2>New Blog</h2>
{}      <form method="post" action="/blogs/create">
        <input type="hidden" name="{}" value="{}">
        <label for="Url">Url</label>
        <input type="text" id="Url" name="Url" value="{}">
        <input type="submit" value="Create">
      </form>
      <p><a href="/blogs">Back to List</a></p>"#,
        summary,
        antiforgery::FORM_FIELD,
        html_attr(token),
        html_attr(url)
    );
    layout("New Blog", &body)
}

pub fn error_page(status: StatusCode, detail: &str) -> String {
    let title = status.canonical_reason().unwrap_or("Error");
    let body = format!(
        "      <h2>{} {}</h2>\n      <p>{}</p>",
        status.as_u16(),
        html_escape(title),
        html_escape(detail)
    );
    layout(title, &body)
}
