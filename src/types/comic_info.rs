//! The ComicInfo.xml aggregate, schema v2.0.
//!
//! Enumerated attributes keep the raw string exactly as read or assigned. Membership in the
//! closed value set is only checked by [`ComicInfo::validate`], so an archive carrying an
//! unrecognized value can still be opened and inspected.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::field::{FieldKind, FieldMut, FieldRef, FieldType, schema_struct};
use crate::error::{CbzError, Result};

/// Declares a string newtype restricted to a closed set of literals.
macro_rules! enumerated_domain {
    ($(#[$meta:meta])* $name:ident [$($value:literal),+ $(,)?]) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Accepted literals, excluding the blank "unset" value.
            pub const VALUES: &'static [&'static str] = &[$($value),+];

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            #[must_use]
            pub fn is_valid(&self) -> bool {
                self.0.is_empty() || Self::VALUES.contains(&self.0.as_str())
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FieldType for $name {
            const KIND: FieldKind = FieldKind::Text;

            fn field_ref(&self) -> FieldRef<'_> {
                FieldRef::Text(&self.0)
            }

            fn field_mut(&mut self) -> FieldMut<'_> {
                FieldMut::Text(&mut self.0)
            }
        }
    };
}

enumerated_domain!(
    /// Tri-state used by `BlackAndWhite`.
    YesNo ["Unknown", "No", "Yes"]
);

enumerated_domain!(
    /// Manga flag, including the right-to-left reading variant.
    Manga ["Unknown", "No", "Yes", "YesAndRightToLeft"]
);

enumerated_domain!(
    /// Audience rating, listed from least to most restrictive.
    AgeRating [
        "Unknown",
        "Rating Pending",
        "Early Childhood",
        "Everyone",
        "G",
        "Everyone 10+",
        "PG",
        "Kids to Adults",
        "Teen",
        "MA15+",
        "Mature 17+",
        "M",
        "R18+",
        "Adults Only 18+",
        "X18+",
    ]
);

enumerated_domain!(
    /// Role of a single page within the book.
    ComicPageType [
        "FrontCover",
        "InnerCover",
        "Roundup",
        "Story",
        "Advertisement",
        "Editorial",
        "Letters",
        "Preview",
        "BackCover",
        "Other",
        "Deleted",
    ]
);

impl ComicPageType {
    #[must_use]
    pub fn story() -> Self {
        Self::from("Story")
    }
}

schema_struct! {
    /// Descriptor for one content page, serialized as attributes of a `<Page>` element.
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct ComicPageInfo {
        /// Zero-based position of the page in archive order.
        "Image" => pub image: i64,
        "Type" => pub page_type: ComicPageType,
        "DoublePage" => pub double_page: bool,
        "ImageSize" => pub image_size: i64,
        "Key" => pub key: String,
        "Bookmark" => pub bookmark: String,
        "ImageWidth" => pub image_width: i64,
        "ImageHeight" => pub image_height: i64,
    }
}

schema_struct! {
    /// The metadata aggregate stored in `ComicInfo.xml`.
    ///
    /// Every attribute is optional; the type's zero value means "unset" and is dropped when
    /// the aggregate is serialized.
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct ComicInfo {
        "Title" => pub title: String,
        "Series" => pub series: String,
        "Number" => pub number: String,
        "Count" => pub count: i64,
        "Volume" => pub volume: i64,
        "AlternativeSeries" => pub alternative_series: String,
        "AlternativeNumber" => pub alternative_number: String,
        "AlternativeCount" => pub alternative_count: i64,
        "Summary" => pub summary: String,
        "Notes" => pub notes: String,
        "Year" => pub year: i64,
        "Month" => pub month: i64,
        "Day" => pub day: i64,
        "Writer" => pub writer: String,
        "Penciller" => pub penciller: String,
        "Inker" => pub inker: String,
        "Colorist" => pub colorist: String,
        "Letterer" => pub letterer: String,
        "CoverArtist" => pub cover_artist: String,
        "Editor" => pub editor: String,
        "Publisher" => pub publisher: String,
        "Imprint" => pub imprint: String,
        "Genre" => pub genre: String,
        "Web" => pub web: String,
        "PageCount" => pub page_count: i64,
        "LanguageISO" => pub language_iso: String,
        "Format" => pub format: String,
        "BlackAndWhite" => pub black_and_white: YesNo,
        "Manga" => pub manga: Manga,
        "Characters" => pub characters: String,
        "Teams" => pub teams: String,
        "Locations" => pub locations: String,
        "ScanInformation" => pub scan_information: String,
        "StoryArc" => pub story_arc: String,
        "SeriesGroup" => pub series_group: String,
        "AgeRating" => pub age_rating: AgeRating,
        "Pages" => pub pages: Vec<ComicPageInfo>,
        "CommunityRating" => pub community_rating: f64,
        "MainCharacterOrTeam" => pub main_character_or_team: String,
        "Review" => pub review: String,
    }
}

impl ComicInfo {
    /// Check every enumerated attribute against its closed set.
    ///
    /// Free-text and numeric attributes are accepted as-is. The first offending attribute is
    /// reported with its raw value.
    pub fn validate(&self) -> Result<()> {
        check("AgeRating", self.age_rating.is_valid(), self.age_rating.as_str())?;
        check(
            "BlackAndWhite",
            self.black_and_white.is_valid(),
            self.black_and_white.as_str(),
        )?;
        check("Manga", self.manga.is_valid(), self.manga.as_str())?;

        for (index, page) in self.pages.iter().enumerate() {
            if !page.page_type.is_valid() {
                return Err(CbzError::Validation {
                    field: format!("Pages[{index}].Type"),
                    value: page.page_type.as_str().to_owned(),
                });
            }
        }

        Ok(())
    }
}

fn check(field: &str, valid: bool, value: &str) -> Result<()> {
    if valid {
        Ok(())
    } else {
        Err(CbzError::Validation {
            field: field.to_owned(),
            value: value.to_owned(),
        })
    }
}

impl fmt::Display for ComicInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_xml() {
            Ok(bytes) => f.write_str(&String::from_utf8_lossy(&bytes)),
            Err(_) => f.write_str("<invalid ComicInfo.xml>"),
        }
    }
}
