//! Builder-style options controlling how an archive update treats its pages.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_PAGE_TYPE;

fn default_page_type() -> String {
    DEFAULT_PAGE_TYPE.to_owned()
}

/// Tunable options for rewriting one archive.
///
/// With both flags off the existing `Pages` element is carried through untouched. Turning
/// either on rebuilds the page list from the archive's images and discards whatever the
/// metadata entry held before.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOptions {
    /// Decode every JPEG/PNG entry and rebuild `Pages` from it.
    #[serde(default)]
    pub compute_pages: bool,
    /// Flag double-page spreads by width. Implies `compute_pages`.
    #[serde(default)]
    pub infer_double_pages: bool,
    /// Role given to freshly computed pages.
    #[serde(default = "default_page_type")]
    pub page_type: String,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            compute_pages: false,
            infer_double_pages: false,
            page_type: default_page_type(),
        }
    }
}

impl UpdateOptions {
    #[must_use]
    pub fn builder() -> UpdateOptionsBuilder {
        UpdateOptionsBuilder::default()
    }

    /// True when the page list must be rebuilt from archive images.
    #[must_use]
    pub fn analyze_pages(&self) -> bool {
        self.compute_pages || self.infer_double_pages
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateOptionsBuilder {
    inner: UpdateOptions,
}

impl UpdateOptionsBuilder {
    #[must_use]
    pub fn compute_pages(mut self, enabled: bool) -> Self {
        self.inner.compute_pages = enabled;
        self
    }

    #[must_use]
    pub fn infer_double_pages(mut self, enabled: bool) -> Self {
        self.inner.infer_double_pages = enabled;
        self
    }

    #[must_use]
    pub fn page_type<S: Into<String>>(mut self, page_type: S) -> Self {
        self.inner.page_type = page_type.into();
        self
    }

    #[must_use]
    pub fn build(self) -> UpdateOptions {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_pages_imply_page_analysis() {
        let options = UpdateOptions::builder().infer_double_pages(true).build();
        assert!(!options.compute_pages);
        assert!(options.analyze_pages());
        assert!(!UpdateOptions::default().analyze_pages());
    }

    #[test]
    fn missing_fields_use_defaults() {
        let options: UpdateOptions = serde_json::from_str(r#"{"compute_pages": true}"#).unwrap();
        assert!(options.compute_pages);
        assert!(!options.infer_double_pages);
        assert_eq!(options.page_type, "Story");
    }
}
