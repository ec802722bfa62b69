//! Page measurement and double-page spread detection.

use std::path::Path;

use image::ImageFormat;

use crate::constants::{DOUBLE_PAGE_LOWER_RATIO, DOUBLE_PAGE_UPPER_RATIO};
use crate::error::{CbzError, Result};
use crate::types::{ComicPageInfo, ComicPageType};

/// Raster formats recognised as pages. Chosen by file extension only; contents are never
/// sniffed. Extensions match in any case, so `001.JPG` is a page as well as `001.jpg`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageFormat {
    Jpeg,
    Png,
}

impl PageFormat {
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let extension = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
        }
    }
}

/// Decode `bytes` and return `(width, height)` in pixels.
///
/// The whole image is decoded so a truncated or corrupt page is caught here rather than by
/// a reader later on.
pub fn analyze(entry: &str, format: PageFormat, bytes: &[u8]) -> Result<(u32, u32)> {
    let image = image::load_from_memory_with_format(bytes, format.image_format()).map_err(
        |source| CbzError::ImageDecode {
            entry: entry.to_owned(),
            source,
        },
    )?;
    Ok((image.width(), image.height()))
}

/// Flag pages whose width is close to twice the average page width.
///
/// The mean uses integer division, the expected spread width is twice that mean, and a page
/// is a spread when its width lies in `[0.8, 1.2]` times the expected width, inclusive.
/// Every page's flag is recomputed.
pub fn infer_double_pages(pages: &mut [ComicPageInfo]) -> Result<()> {
    if pages.is_empty() {
        return Err(CbzError::EmptyPageSequence);
    }

    let total: i64 = pages.iter().map(|page| page.image_width).sum();
    let mean = total / pages.len() as i64;
    let expected = (mean * 2) as f64;
    let lower = DOUBLE_PAGE_LOWER_RATIO * expected;
    let upper = DOUBLE_PAGE_UPPER_RATIO * expected;

    let mut flagged = 0usize;
    for page in pages.iter_mut() {
        let width = page.image_width as f64;
        page.double_page = (lower..=upper).contains(&width);
        flagged += usize::from(page.double_page);
    }

    tracing::debug!(
        target: "cbz::pages",
        pages = pages.len(),
        mean,
        lower,
        upper,
        flagged,
        "double-page inference complete"
    );
    Ok(())
}

/// Collects page descriptors in the order image entries are encountered.
#[derive(Debug, Clone)]
pub struct PageAccumulator {
    page_type: ComicPageType,
    pages: Vec<ComicPageInfo>,
}

impl PageAccumulator {
    #[must_use]
    pub fn new(page_type: ComicPageType) -> Self {
        Self {
            page_type,
            pages: Vec::new(),
        }
    }

    /// Measure one entry. Entries that are not JPEG or PNG are ignored and return `false`.
    pub fn add(&mut self, entry: &str, size: u64, bytes: &[u8]) -> Result<bool> {
        let Some(format) = PageFormat::from_name(entry) else {
            return Ok(false);
        };
        let (width, height) = analyze(entry, format, bytes)?;
        let page = ComicPageInfo {
            image: self.pages.len() as i64,
            page_type: self.page_type.clone(),
            image_size: i64::try_from(size).unwrap_or(i64::MAX),
            image_width: i64::from(width),
            image_height: i64::from(height),
            ..Default::default()
        };
        tracing::trace!(
            target: "cbz::pages",
            entry,
            format = format.label(),
            width,
            height,
            "page measured"
        );
        self.pages.push(page);
        Ok(true)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    #[must_use]
    pub fn into_pages(self) -> Vec<ComicPageInfo> {
        self.pages
    }
}
