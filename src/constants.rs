//! Fixed names and tuning values shared across the crate.

/// Name of the metadata entry inside a comic archive.
pub const COMIC_INFO_XML_NAME: &str = "ComicInfo.xml";

/// Lower bound of the double-page window, as a fraction of the expected spread width.
pub const DOUBLE_PAGE_LOWER_RATIO: f64 = 0.8;
/// Upper bound of the double-page window, as a fraction of the expected spread width.
pub const DOUBLE_PAGE_UPPER_RATIO: f64 = 1.2;

/// Default role assigned to pages discovered while scanning an archive.
pub const DEFAULT_PAGE_TYPE: &str = "Story";
