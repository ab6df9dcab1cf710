//! Pure list stages and the immutable value that chains them.
//!
//! Each stage takes its input by value or reference and returns a new value,
//! so stages can be exercised in isolation:
//!
//! ```
//! use grouplist::pipeline::{group_by, normalize};
//! use grouplist::record::Record;
//!
//! let records = normalize(vec![Record::new().with("first", "Ivan").with("last", "Ivanov")], |r| r);
//! let groups = group_by(&records, |_, r| r.text("last").and_then(|l| l.chars().next()));
//! assert_eq!(groups.len(), 1);
//! ```

use crate::record::{GroupKey, Groups, Record};
use crate::render::{self, Container, RenderError, RenderOptions};
use crate::source::{self, FetchRequest, Transport};

/// Replace the record list with `handler`'s result.
pub fn normalize<F>(records: Vec<Record>, handler: F) -> Vec<Record>
where
    F: FnOnce(Vec<Record>) -> Vec<Record>,
{
    handler(records)
}

/// Materialize the (key, indexes) pairs produced by `handler` into an
/// ordered mapping. Keys keep the order the handler first yields them.
pub fn group<F, I, K>(records: &[Record], handler: F) -> Groups
where
    F: FnOnce(&[Record]) -> I,
    I: IntoIterator<Item = (K, Vec<usize>)>,
    K: Into<GroupKey>,
{
    handler(records).into_iter().collect()
}

/// Group record positions by a per-record key. Records for which `key_fn`
/// yields `None` are left out of every group and logged as a warning.
pub fn group_by<F, K>(records: &[Record], mut key_fn: F) -> Groups
where
    F: FnMut(usize, &Record) -> Option<K>,
    K: Into<GroupKey>,
{
    let mut groups = Groups::new();
    for (index, record) in records.iter().enumerate() {
        match key_fn(index, record) {
            Some(key) => groups.push(key, index),
            None => tracing::warn!(index, "record has no group key, left out of the list"),
        }
    }
    groups
}

/// Records plus their grouping, threaded through the stages by value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GroupedList {
    records: Vec<Record>,
    groups: Groups,
}

impl GroupedList {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            groups: Groups::new(),
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn groups(&self) -> &Groups {
        &self.groups
    }

    pub fn into_parts(self) -> (Vec<Record>, Groups) {
        (self.records, self.groups)
    }

    /// Replace the records with the fetched ones. A failed fetch is logged
    /// and the current records are kept.
    pub async fn fetch<T: Transport>(self, transport: &T, request: &FetchRequest) -> Self {
        let records = source::fetch_or_keep(transport, request, self.records).await;
        Self {
            records,
            groups: self.groups,
        }
    }

    /// Groups are kept as they are; regroup after a normalization that
    /// changes record positions.
    pub fn normalize<F>(self, handler: F) -> Self
    where
        F: FnOnce(Vec<Record>) -> Vec<Record>,
    {
        Self {
            records: normalize(self.records, handler),
            groups: self.groups,
        }
    }

    pub fn group<F, I, K>(self, handler: F) -> Self
    where
        F: FnOnce(&[Record]) -> I,
        I: IntoIterator<Item = (K, Vec<usize>)>,
        K: Into<GroupKey>,
    {
        let groups = group(&self.records, handler);
        Self {
            records: self.records,
            groups,
        }
    }

    pub fn group_by<F, K>(self, key_fn: F) -> Self
    where
        F: FnMut(usize, &Record) -> Option<K>,
        K: Into<GroupKey>,
    {
        let groups = group_by(&self.records, key_fn);
        Self {
            records: self.records,
            groups,
        }
    }

    pub fn render_into<C: Container + ?Sized>(
        &self,
        container: &mut C,
        options: &RenderOptions,
    ) -> Result<(), RenderError> {
        render::render(container, &self.records, &self.groups, options)
    }

    /// Render explicit records and groups instead of the current ones.
    pub fn render_with<C: Container + ?Sized>(
        &self,
        container: &mut C,
        records: Option<&[Record]>,
        groups: Option<&Groups>,
        options: &RenderOptions,
    ) -> Result<(), RenderError> {
        render::render(
            container,
            records.unwrap_or(&self.records),
            groups.unwrap_or(&self.groups),
            options,
        )
    }
}
