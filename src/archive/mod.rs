//! Archive-level operations: single-file transactions, sequential batches and read-only
//! inspection.

mod transaction;

use std::path::{Path, PathBuf};

pub use transaction::{ArchiveTransaction, RewriteStats};

use crate::constants::COMIC_INFO_XML_NAME;
use crate::error::Result;
use crate::pipeline::MutationStep;
use crate::types::{ComicInfo, UpdateOptions};

/// Outcome of [`update_archives`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Archives replaced, in processing order.
    pub updated: Vec<PathBuf>,
}

/// Apply `step` to each archive in turn.
///
/// Processing stops at the first failing archive. Archives already replaced stay replaced;
/// the failing one is left untouched and its path is attached to the error.
pub fn update_archives<I, P>(paths: I, step: &MutationStep, options: &UpdateOptions) -> Result<BatchSummary>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut summary = BatchSummary::default();
    for path in paths {
        let path = path.as_ref();
        ArchiveTransaction::new(path)
            .with_options(options.clone())
            .apply(step)
            .map_err(|err| err.in_file(path))?;
        summary.updated.push(path.to_path_buf());
    }
    Ok(summary)
}

/// Decode the metadata entry of `path` without modifying the archive.
///
/// Returns `None` when the archive has no `ComicInfo.xml`.
pub fn read_comic_info(path: impl AsRef<Path>) -> Result<Option<ComicInfo>> {
    let path = path.as_ref();
    let mut archive = transaction::open_archive(path)?;
    let Some(index) = archive.index_for_name(COMIC_INFO_XML_NAME) else {
        return Ok(None);
    };
    let bytes = transaction::read_entry(&mut archive, index, COMIC_INFO_XML_NAME)?;
    ComicInfo::from_xml(&bytes).map(Some)
}
