use thiserror::Error;

use crate::record::{Groups, Record};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("group '{group}' references record {index}, but only {len} records exist")]
    IndexOutOfRange {
        group: String,
        index: usize,
        len: usize,
    },

    #[error("record {index} has no displayable '{field}' field")]
    MissingField { index: usize, field: &'static str },
}

/// The fixed set of markup fragments a list is built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fragment {
    List,
    Header,
    Item,
    Name,
    First,
    Last,
}

impl Fragment {
    pub fn tag(self) -> &'static str {
        match self {
            Self::List => "ul",
            Self::Header => "h2",
            Self::Item => "li",
            Self::Name => "div",
            Self::First | Self::Last => "span",
        }
    }

    pub fn class(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Header => "list__header",
            Self::Item => "list__item",
            Self::Name => "name",
            Self::First => "name__first",
            Self::Last => "name__last",
        }
    }

    pub fn wrap(self, content: &str) -> String {
        let tag = self.tag();
        format!(r#"<{tag} class="{}">{content}</{tag}>"#, self.class())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// HTML-escape record content and group keys. Off by default: content
    /// is inserted verbatim.
    pub escape: bool,
}

impl RenderOptions {
    fn content(&self, value: &str) -> String {
        if self.escape {
            escape_html(value)
        } else {
            value.to_string()
        }
    }
}

pub fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// A caller-owned element whose inner markup the renderer replaces.
pub trait Container {
    fn id(&self) -> &str;
    fn replace_inner_markup(&mut self, markup: String);
}

/// In-memory element, written out as `<div id="...">...</div>`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
    id: String,
    inner: String,
}

impl Element {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            inner: String::new(),
        }
    }

    pub fn inner_markup(&self) -> &str {
        &self.inner
    }

    pub fn to_html(&self) -> String {
        format!(r#"<div id="{}">{}</div>"#, escape_html(&self.id), self.inner)
    }
}

impl Container for Element {
    fn id(&self) -> &str {
        &self.id
    }

    fn replace_inner_markup(&mut self, markup: String) {
        self.inner = markup;
    }
}

fn render_entry(
    record: &Record,
    index: usize,
    options: &RenderOptions,
) -> Result<String, RenderError> {
    let first = record
        .text("first")
        .ok_or(RenderError::MissingField {
            index,
            field: "first",
        })?;
    let last = record.text("last").ok_or(RenderError::MissingField {
        index,
        field: "last",
    })?;
    let first = Fragment::First.wrap(&options.content(&first));
    let last = Fragment::Last.wrap(&options.content(&last));
    let name = Fragment::Name.wrap(&format!("{first} {last}"));
    Ok(Fragment::Item.wrap(&name))
}

/// Build the nested list markup: one item per group, holding a header with
/// the key and an inner list of that group's members.
pub fn render_markup(
    records: &[Record],
    groups: &Groups,
    options: &RenderOptions,
) -> Result<String, RenderError> {
    let mut items = String::new();
    for (key, indexes) in groups.iter() {
        let mut entries = String::new();
        for &index in indexes {
            let record = records.get(index).ok_or_else(|| RenderError::IndexOutOfRange {
                group: key.to_string(),
                index,
                len: records.len(),
            })?;
            entries.push_str(&render_entry(record, index, options)?);
        }
        let header = Fragment::Header.wrap(&options.content(&key.to_string()));
        let list = Fragment::List.wrap(&entries);
        items.push_str(&Fragment::Item.wrap(&format!("{header}{list}")));
    }
    Ok(Fragment::List.wrap(&items))
}

/// Render into `container`. On error the container keeps its old markup.
pub fn render<C: Container + ?Sized>(
    container: &mut C,
    records: &[Record],
    groups: &Groups,
    options: &RenderOptions,
) -> Result<(), RenderError> {
    let markup = render_markup(records, groups, options)?;
    tracing::debug!(
        container = container.id(),
        groups = groups.len(),
        bytes = markup.len(),
        "rendered list"
    );
    container.replace_inner_markup(markup);
    Ok(())
}
