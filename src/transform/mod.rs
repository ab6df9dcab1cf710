use thiserror::Error;

use crate::pipeline;
use crate::record::{GroupKey, Groups, Record};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StrategyError {
    #[error("unknown normalize strategy '{value}', expected none or split-name[:FIELD]")]
    UnknownNormalizer { value: String },

    #[error("unknown group strategy '{value}', expected initial:FIELD or field:FIELD")]
    UnknownGrouper { value: String },

    #[error("strategy '{value}' needs a field name")]
    MissingField { value: String },

    #[error("record {index} has no usable '{field}' to group by")]
    NoGroupKey { index: usize, field: String },
}

/// Named record-list normalizations selectable from the CLI.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Normalizer {
    #[default]
    Identity,
    /// Split `field` on its first whitespace into `first` and `last`. The
    /// source field is dropped, other fields are kept.
    SplitName { field: String },
}

impl Normalizer {
    pub fn parse(value: &str) -> Result<Self, StrategyError> {
        let raw = value.trim();
        let (name, arg) = match raw.split_once(':') {
            Some((name, arg)) => (name.trim(), Some(arg.trim())),
            None => (raw, None),
        };
        match name.to_lowercase().as_str() {
            "none" | "identity" if arg.is_none() => Ok(Self::Identity),
            "split-name" | "split_name" => match arg {
                None => Ok(Self::SplitName {
                    field: "name".to_string(),
                }),
                Some("") => Err(StrategyError::MissingField {
                    value: raw.to_string(),
                }),
                Some(field) => Ok(Self::SplitName {
                    field: field.to_string(),
                }),
            },
            _ => Err(StrategyError::UnknownNormalizer {
                value: raw.to_string(),
            }),
        }
    }

    pub fn apply(&self, records: Vec<Record>) -> Vec<Record> {
        match self {
            Self::Identity => records,
            Self::SplitName { field } => pipeline::normalize(records, |records| {
                records
                    .into_iter()
                    .enumerate()
                    .map(|(index, record)| split_name(record, field, index))
                    .collect()
            }),
        }
    }
}

fn split_name(mut record: Record, field: &str, index: usize) -> Record {
    let full = match record.get(field).and_then(|v| v.as_str()) {
        Some(full) => full.trim().to_string(),
        None => {
            tracing::debug!(index, field, "no name to split, record left as is");
            return record;
        }
    };
    let (first, last) = match full.split_once(char::is_whitespace) {
        Some((first, last)) => (first.to_string(), last.trim().to_string()),
        None => (full, String::new()),
    };
    record.remove(field);
    record.insert("first", first);
    record.insert("last", last);
    record
}

/// Named grouping reductions selectable from the CLI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Grouper {
    /// Upper-cased first character of `field`.
    Initial { field: String },
    /// The scalar value of `field` itself.
    Field { field: String },
}

impl Default for Grouper {
    fn default() -> Self {
        Self::Initial {
            field: "last".to_string(),
        }
    }
}

impl Grouper {
    pub fn parse(value: &str) -> Result<Self, StrategyError> {
        let raw = value.trim();
        let (name, field) = match raw.split_once(':') {
            Some((name, field)) => (name.trim(), field.trim()),
            None => {
                return match raw.to_lowercase().as_str() {
                    "initial" | "field" => Err(StrategyError::MissingField {
                        value: raw.to_string(),
                    }),
                    _ => Err(StrategyError::UnknownGrouper {
                        value: raw.to_string(),
                    }),
                }
            }
        };
        if field.is_empty() {
            return Err(StrategyError::MissingField {
                value: raw.to_string(),
            });
        }
        let field = field.to_string();
        match name.to_lowercase().as_str() {
            "initial" => Ok(Self::Initial { field }),
            "field" => Ok(Self::Field { field }),
            _ => Err(StrategyError::UnknownGrouper {
                value: raw.to_string(),
            }),
        }
    }

    pub fn key(&self, record: &Record) -> Option<GroupKey> {
        match self {
            Self::Initial { field } => {
                let text = record.text(field)?;
                let initial = text.trim().chars().next()?;
                Some(GroupKey::Text(initial.to_uppercase().collect()))
            }
            Self::Field { field } => GroupKey::from_value(record.get(field)?),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Self::Initial { field } | Self::Field { field } => field,
        }
    }

    /// Group every record. A record without a key fails the whole grouping
    /// instead of dropping out of the list.
    pub fn apply(&self, records: &[Record]) -> Result<Groups, StrategyError> {
        let mut groups = Groups::new();
        for (index, record) in records.iter().enumerate() {
            let key = self.key(record).ok_or_else(|| StrategyError::NoGroupKey {
                index,
                field: self.field().to_string(),
            })?;
            groups.push(key, index);
        }
        Ok(groups)
    }
}
