//! Tags: typed, named annotations over inclusive byte ranges.

pub mod codec;
mod store;

pub use store::{DEFAULT_LABELS, Orientation, TagStore};

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::error::{Error, Result};

/// How the bytes of a tag are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum TagType {
    Char,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Int8,
    Int16,
    Int32,
    Int64,
    String,
    Array,
    #[default]
    Unknown,
}

impl TagType {
    pub const ALL: [TagType; 12] = [
        TagType::Char,
        TagType::Uint8,
        TagType::Uint16,
        TagType::Uint32,
        TagType::Uint64,
        TagType::Int8,
        TagType::Int16,
        TagType::Int32,
        TagType::Int64,
        TagType::String,
        TagType::Array,
        TagType::Unknown,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TagType::Char => "Char",
            TagType::Uint8 => "Uint8",
            TagType::Uint16 => "Uint16",
            TagType::Uint32 => "Uint32",
            TagType::Uint64 => "Uint64",
            TagType::Int8 => "Int8",
            TagType::Int16 => "Int16",
            TagType::Int32 => "Int32",
            TagType::Int64 => "Int64",
            TagType::String => "String",
            TagType::Array => "Array",
            TagType::Unknown => "Unknown",
        }
    }

    /// Exact, case-sensitive lookup by name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Byte width of fixed-size kinds.
    pub fn width(self) -> Option<usize> {
        match self {
            TagType::Char | TagType::Uint8 | TagType::Int8 => Some(1),
            TagType::Uint16 | TagType::Int16 => Some(2),
            TagType::Uint32 | TagType::Int32 => Some(4),
            TagType::Uint64 | TagType::Int64 => Some(8),
            TagType::String | TagType::Array | TagType::Unknown => None,
        }
    }
}

/// Why a byte range matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum TagRole {
    Constant,
    Count,
    Offset,
    Signature,
    Size,
    Data,
    #[default]
    Unknown,
}

impl TagRole {
    pub const ALL: [TagRole; 7] = [
        TagRole::Constant,
        TagRole::Count,
        TagRole::Offset,
        TagRole::Signature,
        TagRole::Size,
        TagRole::Data,
        TagRole::Unknown,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TagRole::Constant => "Constant",
            TagRole::Count => "Count",
            TagRole::Offset => "Offset",
            TagRole::Signature => "Signature",
            TagRole::Size => "Size",
            TagRole::Data => "Data",
            TagRole::Unknown => "Unknown",
        }
    }

    /// Exact, case-sensitive lookup by name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.name() == name)
    }
}

macro_rules! named_enum {
    ($ty:ident, $key:expr) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Self::from_name(s).ok_or_else(|| Error::InvalidField {
                    key: $key,
                    value: s.to_string(),
                })
            }
        }
    };
}

named_enum!(TagType, FieldKey::Type);
named_enum!(TagRole, FieldKey::Role);

/// The editable fields of a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    Name,
    Start,
    End,
    Type,
    Role,
    Comment,
}

impl FieldKey {
    pub fn name(self) -> &'static str {
        match self {
            FieldKey::Name => "name",
            FieldKey::Start => "start",
            FieldKey::End => "end",
            FieldKey::Type => "type",
            FieldKey::Role => "role",
            FieldKey::Comment => "comment",
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A field value, either typed or as text straight from a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Offset(usize),
    Type(TagType),
    Role(TagRole),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Offset(v) => write!(f, "{v}"),
            FieldValue::Type(t) => f.write_str(t.name()),
            FieldValue::Role(r) => f.write_str(r.name()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<usize> for FieldValue {
    fn from(v: usize) -> Self {
        FieldValue::Offset(v)
    }
}

impl From<TagType> for FieldValue {
    fn from(t: TagType) -> Self {
        FieldValue::Type(t)
    }
}

impl From<TagRole> for FieldValue {
    fn from(r: TagRole) -> Self {
        FieldValue::Role(r)
    }
}

/// Parse offset text: hexadecimal after a case-insensitive `0x`, decimal otherwise.
pub fn parse_offset(s: &str) -> Option<usize> {
    match s.get(..2) {
        Some(prefix) if prefix.eq_ignore_ascii_case("0x") => usize::from_str_radix(&s[2..], 16).ok(),
        _ => s.parse().ok(),
    }
}

/// One annotated byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    identifier: Uuid,
    parent: Option<Uuid>,
    name: String,
    start: usize,
    end: usize,
    kind: TagType,
    role: TagRole,
    comment: String,
}

impl Tag {
    /// An empty tag with a fresh identifier.
    pub fn new() -> Self {
        Self {
            identifier: Uuid::new_v4(),
            parent: None,
            name: String::new(),
            start: 0,
            end: 0,
            kind: TagType::Unknown,
            role: TagRole::Unknown,
            comment: String::new(),
        }
    }

    /// Build a tag from field/value pairs; missing fields keep their defaults.
    pub fn from_fields<I, V>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (FieldKey, V)>,
        V: Into<FieldValue>,
    {
        let mut tag = Self::new();
        for (key, value) in fields {
            tag.set_field(key, value)?;
        }
        Ok(tag)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_range(mut self, start: usize, end: usize) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn with_type(mut self, kind: TagType) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_role(mut self, role: TagRole) -> Self {
        self.role = role;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn identifier(&self) -> Uuid {
        self.identifier
    }

    pub fn parent(&self) -> Option<Uuid> {
        self.parent
    }

    pub fn set_parent(&mut self, parent: Option<Uuid>) {
        self.parent = parent;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn set_start(&mut self, start: usize) {
        self.start = start;
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn set_end(&mut self, end: usize) {
        self.end = end;
    }

    pub fn tag_type(&self) -> TagType {
        self.kind
    }

    pub fn set_tag_type(&mut self, kind: TagType) {
        self.kind = kind;
    }

    pub fn role(&self) -> TagRole {
        self.role
    }

    pub fn set_role(&mut self, role: TagRole) {
        self.role = role;
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = comment.into();
    }

    /// Number of bytes covered; zero when `end < start`, saturating at
    /// `usize::MAX` for a range spanning the whole address space.
    pub fn len(&self) -> usize {
        match self.end.checked_sub(self.start) {
            Some(span) => span.saturating_add(1),
            None => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }

    pub fn field(&self, key: FieldKey) -> FieldValue {
        match key {
            FieldKey::Name => FieldValue::Text(self.name.clone()),
            FieldKey::Start => FieldValue::Offset(self.start),
            FieldKey::End => FieldValue::Offset(self.end),
            FieldKey::Type => FieldValue::Type(self.kind),
            FieldKey::Role => FieldValue::Role(self.role),
            FieldKey::Comment => FieldValue::Text(self.comment.clone()),
        }
    }

    /// Set one field. Text goes through the same parsing as construction.
    ///
    /// Nothing is modified when the value is rejected.
    pub fn set_field(&mut self, key: FieldKey, value: impl Into<FieldValue>) -> Result<()> {
        let value = value.into();
        let invalid = |value: &FieldValue| Error::InvalidField {
            key,
            value: value.to_string(),
        };
        match key {
            FieldKey::Name => self.name = value.to_string(),
            FieldKey::Comment => self.comment = value.to_string(),
            FieldKey::Start | FieldKey::End => {
                let offset = match &value {
                    FieldValue::Offset(v) => *v,
                    FieldValue::Text(s) => parse_offset(s).ok_or_else(|| invalid(&value))?,
                    _ => return Err(invalid(&value)),
                };
                if key == FieldKey::Start {
                    self.start = offset;
                } else {
                    self.end = offset;
                }
            }
            FieldKey::Type => {
                self.kind = match &value {
                    FieldValue::Type(t) => *t,
                    FieldValue::Text(s) => s.parse()?,
                    _ => return Err(invalid(&value)),
                }
            }
            FieldKey::Role => {
                self.role = match &value {
                    FieldValue::Role(r) => *r,
                    FieldValue::Text(s) => s.parse()?,
                    _ => return Err(invalid(&value)),
                }
            }
        }
        Ok(())
    }

    /// Compare the six user-visible fields, ignoring identity and parent.
    pub fn same_fields(&self, other: &Tag) -> bool {
        self.name == other.name
            && self.start == other.start
            && self.end == other.end
            && self.kind == other.kind
            && self.role == other.role
            && self.comment == other.comment
    }
}

impl Default for Tag {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parent = self.parent.map(|p| p.to_string());
        writeln!(f, "Tag:")?;
        writeln!(f, "\tParent: {}", parent.as_deref().unwrap_or("None"))?;
        writeln!(f, "\tName: {}", self.name)?;
        writeln!(f, "\tStart: {}", self.start)?;
        writeln!(f, "\tEnd: {}", self.end)?;
        writeln!(f, "\tType: {}", self.kind)?;
        writeln!(f, "\tRole: {}", self.role)?;
        write!(f, "\tComment: {}", self.comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_text_parsing() {
        assert_eq!(parse_offset("0x10"), Some(16));
        assert_eq!(parse_offset("0X1A"), Some(26));
        assert_eq!(parse_offset("16"), Some(16));
        assert_eq!(parse_offset("0"), Some(0));
        assert_eq!(parse_offset("ten"), None);
        assert_eq!(parse_offset("0x"), None);
        assert_eq!(parse_offset(""), None);
        assert_eq!(parse_offset("-1"), None);
    }

    #[test]
    fn defaults() {
        let tag = Tag::new();
        assert_eq!(tag.name(), "");
        assert_eq!((tag.start(), tag.end()), (0, 0));
        assert_eq!(tag.tag_type(), TagType::Unknown);
        assert_eq!(tag.role(), TagRole::Unknown);
        assert_eq!(tag.comment(), "");
        assert_eq!(tag.parent(), None);
    }

    #[test]
    fn identifiers_are_unique() {
        assert_ne!(Tag::new().identifier(), Tag::new().identifier());
    }

    #[test]
    fn from_text_fields() {
        let tag = Tag::from_fields([
            (FieldKey::Name, "header"),
            (FieldKey::Start, "0x00000010"),
            (FieldKey::End, "19"),
            (FieldKey::Type, "Uint32"),
            (FieldKey::Role, "Offset"),
            (FieldKey::Comment, "points at the index"),
        ])
        .unwrap();

        assert_eq!(tag.name(), "header");
        assert_eq!((tag.start(), tag.end()), (16, 19));
        assert_eq!(tag.tag_type(), TagType::Uint32);
        assert_eq!(tag.role(), TagRole::Offset);
        assert_eq!(tag.len(), 4);
    }

    #[test]
    fn len_at_address_space_end() {
        let whole = Tag::new().with_range(0, usize::MAX);
        assert_eq!(whole.len(), usize::MAX);
        let tail = Tag::new().with_range(usize::MAX, usize::MAX);
        assert_eq!(tail.len(), 1);
        assert!(Tag::new().with_range(4, 3).is_empty());
    }

    #[test]
    fn from_typed_fields() {
        let tag = Tag::from_fields([
            (FieldKey::Start, FieldValue::Offset(3)),
            (FieldKey::Type, TagType::Int8.into()),
            (FieldKey::Role, TagRole::Count.into()),
        ])
        .unwrap();
        assert_eq!(tag.start(), 3);
        assert_eq!(tag.tag_type(), TagType::Int8);
        assert_eq!(tag.role(), TagRole::Count);
    }

    #[test]
    fn enum_names_are_case_sensitive() {
        let err = Tag::from_fields([(FieldKey::Type, "uint32")]).unwrap_err();
        assert!(matches!(err, Error::InvalidField { key: FieldKey::Type, .. }));
        assert!(Tag::from_fields([(FieldKey::Role, "SIGNATURE")]).is_err());
    }

    #[test]
    fn rejected_field_leaves_tag_unchanged() {
        let mut tag = Tag::new().with_range(4, 8);
        let before = tag.clone();
        assert!(tag.set_field(FieldKey::Start, "0xZZ").is_err());
        assert!(tag.set_field(FieldKey::End, TagRole::Data).is_err());
        assert_eq!(tag, before);
    }

    #[test]
    fn field_round_trip_through_text() {
        let tag = Tag::new()
            .with_name("count")
            .with_range(0x20, 0x21)
            .with_type(TagType::Uint16)
            .with_role(TagRole::Count);
        let mut copy = Tag::new();
        for key in [
            FieldKey::Name,
            FieldKey::Start,
            FieldKey::End,
            FieldKey::Type,
            FieldKey::Role,
            FieldKey::Comment,
        ] {
            copy.set_field(key, tag.field(key).to_string()).unwrap();
        }
        assert!(copy.same_fields(&tag));
        assert_ne!(copy.identifier(), tag.identifier());
    }

    #[test]
    fn containment_is_inclusive() {
        let tag = Tag::new().with_range(4, 7);
        assert!(!tag.contains(3));
        assert!(tag.contains(4));
        assert!(tag.contains(7));
        assert!(!tag.contains(8));
    }

    #[test]
    fn diagnostic_summary() {
        let mut tag = Tag::new()
            .with_name("sig")
            .with_range(0, 3)
            .with_type(TagType::Uint32)
            .with_role(TagRole::Signature);
        let text = tag.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            [
                "Tag:",
                "\tParent: None",
                "\tName: sig",
                "\tStart: 0",
                "\tEnd: 3",
                "\tType: Uint32",
                "\tRole: Signature",
                "\tComment: ",
            ]
        );

        let parent = Tag::new();
        tag.set_parent(Some(parent.identifier()));
        assert!(tag.to_string().contains(&parent.identifier().to_string()));
    }

    #[test]
    fn enum_names() {
        for t in TagType::ALL {
            assert_eq!(TagType::from_name(t.name()), Some(t));
        }
        for r in TagRole::ALL {
            assert_eq!(r.name().parse::<TagRole>().unwrap(), r);
        }
        assert_eq!(TagType::Uint64.width(), Some(8));
        assert_eq!(TagType::String.width(), None);
    }
}
