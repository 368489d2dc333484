use std::ops::Range;

use uuid::Uuid;

use super::{FieldKey, FieldValue, Tag};
use crate::error::{Error, Result};

/// Column/row labels used unless a store is given its own.
pub const DEFAULT_LABELS: [(&str, FieldKey); 6] = [
    ("Name", FieldKey::Name),
    ("Start", FieldKey::Start),
    ("End", FieldKey::End),
    ("Type", FieldKey::Type),
    ("Role", FieldKey::Role),
    ("Comment", FieldKey::Comment),
];

/// Which axis of the table projection holds the tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// One row per tag, one column per field.
    #[default]
    TagPerRow,
    /// One column per tag, one row per field.
    TagPerColumn,
}

/// Ordered collection of tags, viewable as a table in either orientation.
#[derive(Debug, Clone)]
pub struct TagStore {
    orientation: Orientation,
    labels: Vec<(String, FieldKey)>,
    tags: Vec<Tag>,
}

impl TagStore {
    pub fn new(orientation: Orientation) -> Self {
        Self::with_labels(orientation, DEFAULT_LABELS)
    }

    pub fn with_labels<I, S>(orientation: Orientation, labels: I) -> Self
    where
        I: IntoIterator<Item = (S, FieldKey)>,
        S: Into<String>,
    {
        Self {
            orientation,
            labels: labels.into_iter().map(|(label, key)| (label.into(), key)).collect(),
            tags: Vec::new(),
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn labels(&self) -> &[(String, FieldKey)] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.tags.iter()
    }

    pub fn row_count(&self) -> usize {
        match self.orientation {
            Orientation::TagPerRow => self.tags.len(),
            Orientation::TagPerColumn => self.labels.len(),
        }
    }

    pub fn column_count(&self) -> usize {
        match self.orientation {
            Orientation::TagPerRow => self.labels.len(),
            Orientation::TagPerColumn => self.tags.len(),
        }
    }

    /// Label of a section on the field axis.
    pub fn header(&self, section: usize) -> Option<&str> {
        self.labels.get(section).map(|(label, _)| label.as_str())
    }

    /// Insert at `index`, which may equal `len()`.
    pub fn insert(&mut self, index: usize, tag: Tag) -> Result<()> {
        if index > self.tags.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.tags.len(),
            });
        }
        self.tags.insert(index, tag);
        Ok(())
    }

    /// Append and return the new position.
    pub fn append(&mut self, tag: Tag) -> usize {
        self.tags.push(tag);
        self.tags.len() - 1
    }

    /// Remove a contiguous run of tags.
    pub fn remove(&mut self, range: Range<usize>) -> Result<Vec<Tag>> {
        if range.start > range.end || range.end > self.tags.len() {
            return Err(Error::IndexOutOfRange {
                index: range.end.max(range.start),
                len: self.tags.len(),
            });
        }
        Ok(self.tags.drain(range).collect())
    }

    pub fn clear(&mut self) {
        self.tags.clear();
    }

    /// Replace every tag, keeping orientation and labels.
    pub fn replace(&mut self, tags: Vec<Tag>) {
        self.tags = tags;
    }

    pub fn tag_at(&self, position: usize) -> Result<&Tag> {
        self.tags.get(position).ok_or(Error::IndexOutOfRange {
            index: position,
            len: self.tags.len(),
        })
    }

    pub fn tag_at_mut(&mut self, position: usize) -> Result<&mut Tag> {
        let len = self.tags.len();
        self.tags.get_mut(position).ok_or(Error::IndexOutOfRange {
            index: position,
            len,
        })
    }

    pub fn position_of(&self, identifier: Uuid) -> Option<usize> {
        self.tags.iter().position(|t| t.identifier() == identifier)
    }

    /// Value of field `section` (an index into the labels) for a tag.
    pub fn field(&self, section: usize, position: usize) -> Result<FieldValue> {
        let key = self.key_at(section)?;
        Ok(self.tag_at(position)?.field(key))
    }

    pub fn set_field(
        &mut self,
        position: usize,
        key: FieldKey,
        value: impl Into<FieldValue>,
    ) -> Result<()> {
        self.tag_at_mut(position)?.set_field(key, value)
    }

    /// Read a cell of the table projection.
    pub fn cell(&self, row: usize, column: usize) -> Result<FieldValue> {
        let (section, position) = self.locate(row, column)?;
        self.field(section, position)
    }

    /// Write a cell of the table projection.
    pub fn set_cell(&mut self, row: usize, column: usize, value: impl Into<FieldValue>) -> Result<()> {
        let (section, position) = self.locate(row, column)?;
        let key = self.key_at(section)?;
        self.set_field(position, key, value)
    }

    /// Positions of every tag whose inclusive range contains `offset`.
    pub fn containing(&self, offset: usize) -> Vec<usize> {
        self.tags
            .iter()
            .enumerate()
            .filter(|(_, tag)| tag.contains(offset))
            .map(|(position, _)| position)
            .collect()
    }

    fn key_at(&self, section: usize) -> Result<FieldKey> {
        self.labels
            .get(section)
            .map(|(_, key)| *key)
            .ok_or(Error::IndexOutOfRange {
                index: section,
                len: self.labels.len(),
            })
    }

    /// Map (row, column) to (field section, tag position).
    fn locate(&self, row: usize, column: usize) -> Result<(usize, usize)> {
        for (index, len) in [(row, self.row_count()), (column, self.column_count())] {
            if index >= len {
                return Err(Error::IndexOutOfRange { index, len });
            }
        }
        Ok(match self.orientation {
            Orientation::TagPerRow => (column, row),
            Orientation::TagPerColumn => (row, column),
        })
    }
}

impl Default for TagStore {
    fn default() -> Self {
        Self::new(Orientation::default())
    }
}

impl<'a> IntoIterator for &'a TagStore {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::{TagRole, TagType};

    fn tag(name: &str, start: usize, end: usize) -> Tag {
        Tag::new().with_name(name).with_range(start, end)
    }

    fn store_with(orientation: Orientation) -> TagStore {
        let mut store = TagStore::new(orientation);
        store.append(tag("magic", 0, 3).with_type(TagType::Uint32));
        store.append(tag("count", 4, 5).with_role(TagRole::Count));
        store
    }

    #[test]
    fn insert_bounds() {
        let mut store = store_with(Orientation::TagPerRow);
        assert!(matches!(
            store.insert(3, tag("late", 0, 0)),
            Err(Error::IndexOutOfRange { index: 3, len: 2 })
        ));
        assert_eq!(store.len(), 2);

        store.insert(2, tag("end", 6, 6)).unwrap();
        store.insert(0, tag("front", 0, 0)).unwrap();
        let names: Vec<&str> = store.iter().map(Tag::name).collect();
        assert_eq!(names, ["front", "magic", "count", "end"]);
    }

    #[test]
    fn remove_range() {
        let mut store = store_with(Orientation::TagPerRow);
        store.append(tag("third", 8, 9));

        assert!(store.remove(2..4).is_err());
        assert_eq!(store.len(), 3);

        let removed = store.remove(0..2).unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(store.tag_at(0).unwrap().name(), "third");
        assert!(store.remove(1..1).is_ok());
    }

    #[test]
    fn row_orientation_projection() {
        let store = store_with(Orientation::TagPerRow);
        assert_eq!((store.row_count(), store.column_count()), (2, 6));
        assert_eq!(store.header(1), Some("Start"));
        assert_eq!(store.header(6), None);
        assert_eq!(store.cell(1, 0).unwrap(), FieldValue::Text("count".into()));
        assert_eq!(store.cell(0, 3).unwrap(), FieldValue::Type(TagType::Uint32));
        assert!(store.cell(2, 0).is_err());
        assert!(store.cell(0, 6).is_err());
    }

    #[test]
    fn column_orientation_projection() {
        let store = store_with(Orientation::TagPerColumn);
        assert_eq!((store.row_count(), store.column_count()), (6, 2));
        assert_eq!(store.cell(0, 1).unwrap(), FieldValue::Text("count".into()));
        assert_eq!(store.cell(2, 1).unwrap(), FieldValue::Offset(5));
        assert_eq!(store.cell(4, 1).unwrap(), FieldValue::Role(TagRole::Count));
        assert!(store.cell(0, 2).is_err());
    }

    #[test]
    fn both_orientations_agree() {
        let rows = store_with(Orientation::TagPerRow);
        let columns = store_with(Orientation::TagPerColumn);
        for position in 0..rows.len() {
            for section in 0..rows.labels().len() {
                assert_eq!(
                    rows.cell(position, section).unwrap(),
                    columns.cell(section, position).unwrap()
                );
            }
        }
    }

    #[test]
    fn set_cell_parses_text() {
        let mut store = store_with(Orientation::TagPerColumn);
        store.set_cell(1, 0, "0x40").unwrap();
        store.set_cell(3, 0, "Int32").unwrap();
        let first = store.tag_at(0).unwrap();
        assert_eq!(first.start(), 0x40);
        assert_eq!(first.tag_type(), TagType::Int32);

        let before = store.tag_at(1).unwrap().clone();
        assert!(store.set_field(1, FieldKey::Role, "Pointer").is_err());
        assert_eq!(store.tag_at(1).unwrap(), &before);
        assert!(store.set_field(5, FieldKey::Name, "x").is_err());
    }

    #[test]
    fn custom_labels() {
        let mut store = TagStore::with_labels(
            Orientation::TagPerRow,
            [("Offset", FieldKey::Start), ("Label", FieldKey::Name)],
        );
        store.append(tag("hdr", 16, 31));
        assert_eq!(store.column_count(), 2);
        assert_eq!(store.cell(0, 0).unwrap(), FieldValue::Offset(16));
        assert_eq!(store.field(1, 0).unwrap().to_string(), "hdr");
    }

    #[test]
    fn containing_follows_store_order() {
        let mut store = TagStore::default();
        store.append(tag("outer", 0, 15));
        store.append(tag("other", 32, 40));
        store.append(tag("inner", 4, 7));

        assert_eq!(store.containing(5), vec![0, 2]);
        assert_eq!(store.containing(15), vec![0]);
        assert_eq!(store.containing(16), Vec::<usize>::new());
        assert!(TagStore::default().containing(0).is_empty());
    }

    #[test]
    fn position_of_identifier() {
        let store = store_with(Orientation::TagPerRow);
        let id = store.tag_at(1).unwrap().identifier();
        assert_eq!(store.position_of(id), Some(1));
        assert_eq!(store.position_of(Tag::new().identifier()), None);
    }

    #[test]
    fn clear_keeps_orientation() {
        let mut store = store_with(Orientation::TagPerColumn);
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.orientation(), Orientation::TagPerColumn);
        assert_eq!(store.column_count(), 0);
    }
}
