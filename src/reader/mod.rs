//! Readers for the non-metadata content of an archive.

pub mod page;

pub use page::{PageAccumulator, PageFormat, analyze, infer_double_pages};
