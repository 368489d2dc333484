//! YAML tag documents.
//!
//! A document is a sequence of mappings with the keys `name`, `start`,
//! `end`, `type`, `role` and `comment`. Offsets are written as decimal
//! integers and read as integers or offset text; enumerations are written
//! by name.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{FieldKey, FieldValue, Tag, TagStore};
use crate::error::{Error, Result};

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct TagRecord {
    #[serde(default)]
    name: String,
    #[serde(default)]
    start: OffsetRepr,
    #[serde(default)]
    end: OffsetRepr,
    #[serde(rename = "type", default = "unknown_name")]
    kind: String,
    #[serde(default = "unknown_name")]
    role: String,
    #[serde(default)]
    comment: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum OffsetRepr {
    Number(usize),
    Text(String),
}

impl Default for OffsetRepr {
    fn default() -> Self {
        OffsetRepr::Number(0)
    }
}

impl From<OffsetRepr> for FieldValue {
    fn from(repr: OffsetRepr) -> Self {
        match repr {
            OffsetRepr::Number(v) => FieldValue::Offset(v),
            OffsetRepr::Text(s) => FieldValue::Text(s),
        }
    }
}

fn unknown_name() -> String {
    "Unknown".to_string()
}

impl From<&Tag> for TagRecord {
    fn from(tag: &Tag) -> Self {
        Self {
            name: tag.name().to_string(),
            start: OffsetRepr::Number(tag.start()),
            end: OffsetRepr::Number(tag.end()),
            kind: tag.tag_type().name().to_string(),
            role: tag.role().name().to_string(),
            comment: tag.comment().to_string(),
        }
    }
}

impl TagRecord {
    fn into_tag(self) -> Result<Tag> {
        Tag::from_fields([
            (FieldKey::Name, FieldValue::Text(self.name)),
            (FieldKey::Start, self.start.into()),
            (FieldKey::End, self.end.into()),
            (FieldKey::Type, FieldValue::Text(self.kind)),
            (FieldKey::Role, FieldValue::Text(self.role)),
            (FieldKey::Comment, FieldValue::Text(self.comment)),
        ])
    }
}

/// Serialize every tag, ordered by start offset.
///
/// Ties are broken on the remaining fields so equal tag sets always
/// produce the same document.
pub fn to_string(store: &TagStore) -> Result<String> {
    let mut tags: Vec<&Tag> = store.iter().collect();
    tags.sort_by(|a, b| {
        (a.start(), a.end(), a.name(), a.tag_type(), a.role(), a.comment()).cmp(&(
            b.start(),
            b.end(),
            b.name(),
            b.tag_type(),
            b.role(),
            b.comment(),
        ))
    });
    let records: Vec<TagRecord> = tags.into_iter().map(TagRecord::from).collect();
    serde_yaml::to_string(&records).map_err(Error::Encode)
}

/// Parse a document into tags, in document order.
pub fn parse(content: &str) -> Result<Vec<Tag>> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let records: Vec<TagRecord> =
        serde_yaml::from_str(content).map_err(|err| Error::MalformedDocument(err.to_string()))?;
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            record.into_tag().map_err(|err| match err {
                Error::InvalidField { key, value } => Error::MalformedDocument(format!(
                    "tag {index}: invalid {key} {value:?}"
                )),
                other => other,
            })
        })
        .collect()
}

/// Replace the contents of `store` with the tags in `content`.
///
/// The store is untouched unless the whole document parses.
pub fn read(store: &mut TagStore, content: &str) -> Result<()> {
    let tags = parse(content)?;
    store.replace(tags);
    Ok(())
}

pub fn read_file(store: &mut TagStore, path: &Path) -> Result<()> {
    let content = fs::read_to_string(path)?;
    read(store, &content)
}

pub fn write_file(store: &TagStore, path: &Path) -> Result<()> {
    let content = to_string(store)?;
    fs::write(path, content)?;
    Ok(())
}
