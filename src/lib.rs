//! htag - Binary file annotation engine
//!
//! Tags name, type and describe byte ranges of a binary file. This library
//! provides the tag model, its YAML persistence, typed decoding of the
//! tagged bytes and offset cross-reference search, shared by the `htag`
//! command line tool and any front end driving a [`Session`].

pub mod app;
pub mod buffer;
pub mod error;
pub mod locator;
pub mod tag;
pub mod value;

pub use app::{Action, Session, SessionConfig};
pub use buffer::{ByteSource, Document};
pub use error::{Error, Result};
pub use tag::{FieldKey, FieldValue, Orientation, Tag, TagRole, TagStore, TagType};
pub use value::{Endian, Value};
