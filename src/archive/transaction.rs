//! One-shot rewrite of a comic archive's metadata entry.
//!
//! The source archive is streamed into a staging file next to it. Every entry other than
//! `ComicInfo.xml` is raw-copied, so its compressed bytes and compression method survive
//! untouched. The metadata entry is rewritten and always placed last. Only a fully written
//! staging file replaces the source, via an atomic rename; any failure discards it.

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use atomic_write_file::AtomicWriteFile;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::constants::COMIC_INFO_XML_NAME;
use crate::error::{CbzError, Result};
use crate::pipeline::MutationStep;
use crate::reader::{PageAccumulator, PageFormat, infer_double_pages};
use crate::types::{ComicInfo, ComicPageType, UpdateOptions};

const MAX_PREALLOCATION: usize = 64 * 1024 * 1024;

pub(crate) type SourceArchive = ZipArchive<BufReader<File>>;

pub(crate) fn open_archive(path: &Path) -> Result<SourceArchive> {
    let file = File::open(path).map_err(|err| CbzError::ArchiveOpen {
        path: path.to_path_buf(),
        source: zip::result::ZipError::Io(err),
    })?;
    ZipArchive::new(BufReader::new(file)).map_err(|source| CbzError::ArchiveOpen {
        path: path.to_path_buf(),
        source,
    })
}

/// Read and decompress the entry at `index`.
pub(crate) fn read_entry(archive: &mut SourceArchive, index: usize, name: &str) -> Result<Vec<u8>> {
    let mut entry = archive.by_index(index).map_err(|source| CbzError::Archive {
        entry: name.to_owned(),
        source,
    })?;
    // The declared size is only a hint; a corrupt header must not drive the allocation.
    let hint = usize::try_from(entry.size()).map_or(0, |size| size.min(MAX_PREALLOCATION));
    let mut bytes = Vec::with_capacity(hint);
    entry.read_to_end(&mut bytes)?;
    Ok(bytes)
}

struct Staging {
    path: PathBuf,
    atomic: AtomicWriteFile,
}

impl Staging {
    /// Create the staging file in the destination's own directory.
    fn prepare(path: &Path) -> Result<Self> {
        let atomic = AtomicWriteFile::options()
            .open(path)
            .map_err(|err| CbzError::Transaction {
                path: path.to_path_buf(),
                reason: format!("failed creating temporary file: {err}").into(),
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            atomic,
        })
    }

    fn file_mut(&mut self) -> &mut File {
        self.atomic.as_file_mut()
    }

    fn commit(mut self) -> Result<()> {
        let path = self.path.clone();
        let to_transaction_error = |err: std::io::Error| CbzError::Transaction {
            path: path.clone(),
            reason: format!("failed replacing archive: {err}").into(),
        };
        self.file_mut().sync_all().map_err(to_transaction_error)?;
        self.atomic.commit().map_err(to_transaction_error)
    }

    fn discard(self) {
        if let Err(err) = self.atomic.discard() {
            tracing::warn!(
                target: "cbz::archive",
                path = %self.path.display(),
                error = %err,
                "failed to remove temporary file"
            );
        }
    }
}

/// What a successful rewrite did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    /// Entries raw-copied from the source.
    pub copied_entries: usize,
    /// Pages measured when page analysis was on.
    pub analyzed_pages: usize,
    /// Whether the source already carried a metadata entry.
    pub had_metadata: bool,
}

/// Applies one [`MutationStep`] to the metadata of a single archive.
#[derive(Debug, Clone)]
pub struct ArchiveTransaction {
    path: PathBuf,
    options: UpdateOptions,
}

impl ArchiveTransaction {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            options: UpdateOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: UpdateOptions) -> Self {
        self.options = options;
        self
    }

    /// Rewrite the archive in place.
    ///
    /// On error the source file is left exactly as it was and no temporary file remains.
    pub fn apply(&self, step: &MutationStep) -> Result<RewriteStats> {
        let start = Instant::now();
        let mut source = open_archive(&self.path)?;
        let mut staging = Staging::prepare(&self.path)?;

        match self.rewrite(&mut source, staging.file_mut(), step) {
            Ok(stats) => {
                // The source handle must be released before the rename replaces it.
                drop(source);
                staging.commit()?;
                tracing::info!(
                    target: "cbz::archive",
                    path = %self.path.display(),
                    copied = stats.copied_entries,
                    pages = stats.analyzed_pages,
                    had_metadata = stats.had_metadata,
                    duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                    "archive updated"
                );
                Ok(stats)
            }
            Err(err) => {
                drop(source);
                staging.discard();
                tracing::warn!(
                    target: "cbz::archive",
                    path = %self.path.display(),
                    error = %err,
                    "archive left unchanged"
                );
                Err(err)
            }
        }
    }

    fn rewrite(
        &self,
        source: &mut SourceArchive,
        out: &mut File,
        step: &MutationStep,
    ) -> Result<RewriteStats> {
        let mut writer = ZipWriter::new(out);
        let mut stats = RewriteStats::default();
        let mut info: Option<ComicInfo> = None;
        let mut pages = self.options.analyze_pages().then(|| {
            PageAccumulator::new(ComicPageType::from(self.options.page_type.as_str()))
        });

        for index in 0..source.len() {
            let (name, size) = {
                let entry = source
                    .by_index_raw(index)
                    .map_err(|source| CbzError::Archive {
                        entry: format!("#{index}"),
                        source,
                    })?;
                (entry.name().to_owned(), entry.size())
            };

            if name == COMIC_INFO_XML_NAME {
                let bytes = read_entry(source, index, &name)?;
                info = Some(ComicInfo::from_xml(&bytes)?);
                stats.had_metadata = true;
                continue;
            }

            if let Some(accumulator) = pages.as_mut() {
                if PageFormat::from_name(&name).is_some() {
                    let bytes = read_entry(source, index, &name)?;
                    accumulator.add(&name, size, &bytes)?;
                }
            }

            let entry = source
                .by_index_raw(index)
                .map_err(|source| CbzError::Archive {
                    entry: name.clone(),
                    source,
                })?;
            writer
                .raw_copy_file(entry)
                .map_err(|source| CbzError::Archive {
                    entry: name.clone(),
                    source,
                })?;
            stats.copied_entries += 1;
        }

        let mut info = info.unwrap_or_default();
        if let Some(accumulator) = pages {
            // Computed pages replace whatever the metadata held; they are never merged.
            stats.analyzed_pages = accumulator.len();
            let mut computed = accumulator.into_pages();
            if self.options.infer_double_pages {
                infer_double_pages(&mut computed)?;
            }
            info.pages = computed;
        }

        step.apply(&mut info)?;
        info.validate()?;
        let xml = info.to_xml()?;

        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        writer
            .start_file(COMIC_INFO_XML_NAME, options)
            .map_err(|source| CbzError::Archive {
                entry: COMIC_INFO_XML_NAME.to_owned(),
                source,
            })?;
        writer.write_all(&xml)?;
        writer.finish().map_err(|source| CbzError::Archive {
            entry: COMIC_INFO_XML_NAME.to_owned(),
            source,
        })?;

        Ok(stats)
    }
}
