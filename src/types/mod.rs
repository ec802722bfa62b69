//! Public types exposed by the `cbz-meta` crate.

pub mod comic_info;
pub mod field;
pub mod options;

pub use comic_info::{AgeRating, ComicInfo, ComicPageInfo, ComicPageType, Manga, YesNo};
pub use field::{FieldKind, FieldMut, FieldRef, FieldSpec, FieldType, FieldValue, Schema};
pub use options::UpdateOptions;
