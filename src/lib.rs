#![deny(clippy::all, clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![cfg_attr(
    test,
    allow(
        clippy::uninlined_format_args,
        clippy::cast_possible_truncation,
        clippy::float_cmp,
        clippy::cast_precision_loss
    )
)]
#![allow(clippy::module_name_repetitions)]
//
// Documentation lints: public entry points carry docs, table-driven helpers do not.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
//
// Cast safety: widths, heights and entry sizes are bounded by what an archive can hold.
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
//
// Builders take owned values and return Self.
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::case_sensitive_file_extension_comparisons)]

//! Edit and validate the `ComicInfo.xml` metadata of CBZ comic archives.
//!
//! Field updates arrive as `Name=Value` strings, are converted against the ComicInfo schema
//! ([`codec`]), composed into a [`MutationStep`] ([`pipeline`]) and applied to each archive
//! by an [`ArchiveTransaction`]. Page images are never recompressed; the metadata entry is
//! rewritten last and the archive is replaced atomically.

/// The cbz-meta crate version (matches `Cargo.toml`).
pub const CBZ_META_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod archive;
pub mod codec;
pub mod constants;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod reader;
pub mod types;

pub use archive::{ArchiveTransaction, BatchSummary, RewriteStats, read_comic_info, update_archives};
pub use codec::{FieldAssignment, convert, parse_assignments};
pub use constants::*;
pub use error::{CbzError, Result};
pub use pipeline::MutationStep;
pub use reader::{PageAccumulator, PageFormat, analyze, infer_double_pages};
pub use types::{
    AgeRating, ComicInfo, ComicPageInfo, ComicPageType, FieldKind, FieldValue, Manga, Schema,
    UpdateOptions, YesNo,
};
