use crate::render::{escape_html, Container, Element};

pub fn render_page(container: &Element) -> Vec<u8> {
    let title = escape_html(container.id());
    let body = container.to_html();

    let html = format!(
        r####"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <title>{title}</title>
  <style>
    body {{
      font-family: system-ui, -apple-system, "Segoe UI", sans-serif;
      margin: 2rem auto;
      max-width: 48rem;
      color: #0f172a;
      background: #f8fafc;
    }}
    .list {{
      list-style: none;
      margin: 0;
      padding: 0;
    }}
    .list .list {{
      padding-left: 1rem;
    }}
    .list__header {{
      font-size: 1.25rem;
      margin: 1.5rem 0 0.5rem;
      border-bottom: 1px solid #e2e8f0;
    }}
    .list__item .list__item {{
      padding: 0.25rem 0;
    }}
    .name__last {{
      font-weight: 600;
    }}
  </style>
</head>
<body>
  {body}
</body>
</html>
"####,
    );

    html.into_bytes()
}
