//! The upload form served at `/`.

use minijinja::{context, Environment};
use serde::Serialize;
use std::sync::LazyLock;

use crate::error::Result;
use crate::upload::{MetadataTag, ALLOWED_EXTENSIONS};

/// The `.html` suffix turns on minijinja's HTML auto-escaping.
const INDEX_TEMPLATE: &str = "index.html";

const INDEX_SOURCE: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>reelpress</title>
  <style>
    body { font-family: sans-serif; max-width: 40rem; margin: 2rem auto; }
    label { display: block; margin: 0.4rem 0; }
    .flash { background: #fee; border: 1px solid #c99; padding: 0.5rem; white-space: pre-wrap; }
  </style>
</head>
<body>
  <h1>Process audio or video</h1>
{% if flash %}  <p class="flash">{{ flash }}</p>
{% endif %}  <form action="/process" method="post" enctype="multipart/form-data">
    <label>File <input type="file" name="input_file" accept="{{ accept }}"></label>
    <label><input type="checkbox" name="overlay_enable"> Portrait crop with caption (video only)</label>
    <fieldset>
      <legend><label><input type="checkbox" name="metadata_enable"> Write metadata</label></legend>
{% for field in metadata %}      <label>{{ field.label }} <input type="text" name="{{ field.name }}"></label>
{% endfor %}    </fieldset>
    <button type="submit">Process</button>
  </form>
</body>
</html>
"#;

static TEMPLATES: LazyLock<Environment<'static>> = LazyLock::new(|| {
    let mut env = Environment::new();
    env.add_template(INDEX_TEMPLATE, INDEX_SOURCE)
        .expect("index template is valid");
    env
});

#[derive(Serialize)]
struct MetadataField {
    label: &'static str,
    name: &'static str,
}

fn label(tag: MetadataTag) -> &'static str {
    match tag {
        MetadataTag::Title => "Title",
        MetadataTag::Artist => "Artist",
        MetadataTag::Album => "Album",
        MetadataTag::Genre => "Genre",
        MetadataTag::Year => "Year",
        MetadataTag::Comment => "Comment",
        MetadataTag::Copyright => "Copyright",
    }
}

pub fn render_index(flash: Option<&str>) -> Result<String> {
    let metadata: Vec<MetadataField> = MetadataTag::ALL
        .iter()
        .map(|tag| MetadataField {
            label: label(*tag),
            name: tag.form_field(),
        })
        .collect();

    let accept = ALLOWED_EXTENSIONS
        .iter()
        .map(|ext| format!(".{}", ext))
        .collect::<Vec<_>>()
        .join(",");

    let page = TEMPLATES.get_template(INDEX_TEMPLATE)?.render(context! {
        flash => flash,
        accept => accept,
        metadata => metadata,
    })?;
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_index() {
        let page = render_index(None).unwrap();
        assert!(page.contains("action=\"/process\""));
        assert!(page.contains("name=\"input_file\""));
        assert!(page.contains("accept=\".mp4,.mov,.mkv,.webm,.mp3,.wav,.aac,.m4a,.flac\""));
        assert!(!page.contains("class=\"flash\""));

        let title = page.find("name=\"title\"").unwrap();
        let copyright = page.find("name=\"copyright\"").unwrap();
        assert!(title < copyright);
    }

    #[test]
    fn test_flash_is_escaped() {
        let page = render_index(Some("<script>alert('x') & \"y\"</script>")).unwrap();
        assert!(page.contains("class=\"flash\""));
        assert!(page.contains("&lt;script&gt;"));
        assert!(page.contains("&amp;"));
        assert!(!page.contains("<script>"));
    }
}
