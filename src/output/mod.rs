pub mod report;

use serde::Serialize;

use crate::record::{Groups, Record};
use crate::render::{Container, Element};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// The container element with its rendered list.
    #[default]
    Fragment,
    /// A standalone HTML document holding the container.
    Page,
    /// Records and group mapping as JSON.
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "fragment" | "frag" => Some(Self::Fragment),
            "page" | "html" | "htm" => Some(Self::Page),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Page);
    }
    None
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    container: &'a str,
    records: &'a [Record],
    groups: &'a Groups,
}

pub fn render_fragment(container: &Element) -> Vec<u8> {
    let mut out = container.to_html();
    out.push('\n');
    out.into_bytes()
}

pub fn render_json(
    container: &Element,
    records: &[Record],
    groups: &Groups,
) -> Result<Vec<u8>, serde_json::Error> {
    let doc = JsonDocument {
        container: container.id(),
        records,
        groups,
    };
    let mut out = serde_json::to_vec_pretty(&doc)?;
    out.push(b'\n');
    Ok(out)
}

pub fn render_page(container: &Element) -> Vec<u8> {
    report::render_page(container)
}

pub fn render(
    format: OutputFormat,
    container: &Element,
    records: &[Record],
    groups: &Groups,
) -> Result<Vec<u8>, serde_json::Error> {
    match format {
        OutputFormat::Fragment => Ok(render_fragment(container)),
        OutputFormat::Page => Ok(render_page(container)),
        OutputFormat::Json => render_json(container, records, groups),
    }
}
