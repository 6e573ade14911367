//! Landing page endpoint.

use axum::response::Html;

/// Embedded `index` template. `{{title}}` is the only substitution slot.
const INDEX_TEMPLATE: &str = "\
<!DOCTYPE html>
<html>
  <head>
    <title>{{title}}</title>
  </head>
  <body>
    <h1>{{title}}</h1>
    <p>Welcome to {{title}}</p>
  </body>
</html>
";

/// Page title rendered into the `index` template.
const INDEX_TITLE: &str = "Express";

/// `GET /` — render the index page.
pub async fn index() -> Html<String> {
    Html(render_index(INDEX_TITLE))
}

/// Render the `index` template with the given title.
fn render_index(title: &str) -> String {
    INDEX_TEMPLATE.replace("{{title}}", title)
}
