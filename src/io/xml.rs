//! `ComicInfo.xml` encoding and decoding.
//!
//! Both directions walk the schema dispatch tables, so element names, attribute names and
//! value types come from a single declaration. Output is indented by two spaces and omits
//! every attribute still holding its default value.

use std::borrow::Cow;

use quick_xml::Reader as XmlReader;
use quick_xml::Writer as XmlWriter;
use quick_xml::events::attributes::Attributes;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use crate::error::{CbzError, Result};
use crate::types::field::{FieldKind, FieldSpec, FieldValue, Schema};
use crate::types::{ComicInfo, ComicPageInfo};

const ROOT_ELEMENT: &str = "ComicInfo";
const PAGES_ELEMENT: &str = "Pages";
const PAGE_ELEMENT: &str = "Page";
/// The page index is written even when it is zero.
const PAGE_INDEX_ATTR: &str = "Image";
const INDENT_SIZE: usize = 2;

fn decode_error(reason: impl std::fmt::Display) -> CbzError {
    CbzError::MetadataDecode {
        reason: reason.to_string().into(),
    }
}

fn encode_error(reason: impl std::fmt::Display) -> CbzError {
    CbzError::MetadataEncode {
        reason: reason.to_string().into(),
    }
}

impl ComicInfo {
    /// Serialize to indented XML, dropping default-valued attributes.
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut writer = XmlWriter::new_with_indent(Vec::new(), b' ', INDENT_SIZE);
        writer
            .write_event(Event::Start(BytesStart::new(ROOT_ELEMENT)))
            .map_err(encode_error)?;

        for spec in Self::FIELDS {
            let value = spec.get(self);
            if value.is_default() {
                continue;
            }
            if spec.kind == FieldKind::Pages {
                write_pages(&mut writer, &self.pages)?;
                continue;
            }
            let Some(text) = value.to_text() else {
                continue;
            };
            writer
                .write_event(Event::Start(BytesStart::new(spec.name)))
                .map_err(encode_error)?;
            writer
                .write_event(Event::Text(BytesText::new(&text)))
                .map_err(encode_error)?;
            writer
                .write_event(Event::End(BytesEnd::new(spec.name)))
                .map_err(encode_error)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new(ROOT_ELEMENT)))
            .map_err(encode_error)?;
        Ok(writer.into_inner())
    }

    /// Parse a `ComicInfo.xml` document.
    ///
    /// Unknown elements are skipped. Numeric and boolean elements that fail to parse are
    /// rejected with the offending field and raw value.
    pub fn from_xml(bytes: &[u8]) -> Result<Self> {
        let mut reader = XmlReader::from_reader(bytes);
        let mut buf = Vec::new();
        let mut info = ComicInfo::default();

        // Depth of the element most recently opened; the root sits at 1.
        let mut depth = 0usize;
        let mut seen_root = false;
        let mut in_pages = false;
        let mut current: Option<&'static FieldSpec<ComicInfo>> = None;
        let mut text = String::new();

        loop {
            let event = reader.read_event_into(&mut buf).map_err(|err| {
                decode_error(format!(
                    "malformed XML at byte {}: {err}",
                    reader.buffer_position()
                ))
            })?;
            match event {
                Event::Start(ref element) | Event::Empty(ref element) => {
                    let is_empty = matches!(event, Event::Empty(_));
                    let name = element_name(element)?;
                    match depth {
                        0 => {
                            if name != ROOT_ELEMENT {
                                return Err(decode_error(format!(
                                    "root element is <{name}>, expected <{ROOT_ELEMENT}>"
                                )));
                            }
                            seen_root = true;
                        }
                        1 if name == PAGES_ELEMENT => {
                            // Older writers emitted one flat <Pages Image=".."/> per page.
                            if has_attributes(element) {
                                info.pages.push(read_page(element.attributes())?);
                            }
                            in_pages = !is_empty;
                        }
                        1 => {
                            current = ComicInfo::field(&name);
                            text.clear();
                        }
                        2 if in_pages && name == PAGE_ELEMENT => {
                            info.pages.push(read_page(element.attributes())?);
                        }
                        _ => {}
                    }
                    if is_empty {
                        // An empty element carries no text, so the field keeps its default.
                        if depth == 1 {
                            current = None;
                        }
                    } else {
                        depth += 1;
                    }
                }
                Event::Text(ref content) if depth == 2 && current.is_some() => {
                    let unescaped = content.unescape().map_err(decode_error)?;
                    text.push_str(&unescaped);
                }
                Event::CData(content) if depth == 2 && current.is_some() => {
                    text.push_str(&String::from_utf8_lossy(&content.into_inner()));
                }
                Event::End(_) => {
                    if depth == 2 {
                        if let Some(spec) = current.take() {
                            assign_scalar(&mut info, spec, &text)?;
                        }
                        in_pages = false;
                    }
                    depth = depth.saturating_sub(1);
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if !seen_root {
            return Err(decode_error(format!("missing <{ROOT_ELEMENT}> element")));
        }
        Ok(info)
    }
}

fn element_name(element: &BytesStart<'_>) -> Result<String> {
    std::str::from_utf8(element.name().as_ref())
        .map(str::to_owned)
        .map_err(decode_error)
}

fn has_attributes(element: &BytesStart<'_>) -> bool {
    element.attributes().flatten().next().is_some()
}

fn assign_scalar(info: &mut ComicInfo, spec: &FieldSpec<ComicInfo>, raw: &str) -> Result<()> {
    if spec.kind == FieldKind::Pages {
        return Ok(());
    }
    let value = parse_value(spec.kind, spec.name, raw)?;
    spec.get_mut(info).assign(spec.name, value)
}

fn parse_value(kind: FieldKind, field: &str, raw: &str) -> Result<FieldValue> {
    // Empty content is the zero value; whitespace alone is not.
    if raw.is_empty() {
        match kind {
            FieldKind::Integer => return Ok(FieldValue::Integer(0)),
            FieldKind::Float => return Ok(FieldValue::Float(0.0)),
            FieldKind::Bool => return Ok(FieldValue::Bool(false)),
            FieldKind::Text | FieldKind::Pages => {}
        }
    }
    let trimmed = if kind == FieldKind::Text {
        raw
    } else {
        raw.trim()
    };
    kind.parse(trimmed)
        .map_err(|_| CbzError::InvalidFieldValue {
            field: field.to_owned(),
            value: raw.to_owned(),
        })
}

fn read_page(attributes: Attributes<'_>) -> Result<ComicPageInfo> {
    let mut page = ComicPageInfo::default();
    for attribute in attributes {
        let attribute = attribute.map_err(decode_error)?;
        let key = std::str::from_utf8(attribute.key.as_ref()).map_err(decode_error)?;
        let Some(spec) = ComicPageInfo::field(key) else {
            continue;
        };
        let raw: Cow<'_, str> = attribute.unescape_value().map_err(decode_error)?;
        let value = parse_value(spec.kind, &format!("Pages.{}", spec.name), &raw)?;
        spec.get_mut(&mut page).assign(spec.name, value)?;
    }
    Ok(page)
}

fn write_pages(writer: &mut XmlWriter<Vec<u8>>, pages: &[ComicPageInfo]) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new(PAGES_ELEMENT)))
        .map_err(encode_error)?;
    for page in pages {
        let mut element = BytesStart::new(PAGE_ELEMENT);
        for spec in ComicPageInfo::FIELDS {
            let value = spec.get(page);
            if value.is_default() && spec.name != PAGE_INDEX_ATTR {
                continue;
            }
            if let Some(text) = value.to_text() {
                element.push_attribute((spec.name, text.as_str()));
            }
        }
        writer
            .write_event(Event::Empty(element))
            .map_err(encode_error)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(PAGES_ELEMENT)))
        .map_err(encode_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AgeRating, ComicPageType, Manga, YesNo};

    fn sample() -> ComicInfo {
        ComicInfo {
            title: "Great Comic".into(),
            series: "Great Series".into(),
            number: "1a".into(),
            count: 12,
            volume: 3,
            summary: "Heroes & <villains>, \"quoted\"".into(),
            year: 1986,
            month: 9,
            writer: "A. Writer".into(),
            black_and_white: YesNo::from("No"),
            manga: Manga::from("YesAndRightToLeft"),
            age_rating: AgeRating::from("Teen"),
            community_rating: 4.5,
            pages: vec![
                ComicPageInfo {
                    image: 0,
                    page_type: ComicPageType::from("FrontCover"),
                    image_size: 5120,
                    image_width: 800,
                    image_height: 1200,
                    ..Default::default()
                },
                ComicPageInfo {
                    image: 1,
                    page_type: ComicPageType::story(),
                    double_page: true,
                    image_width: 1600,
                    image_height: 1200,
                    bookmark: "Chapter 1".into(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn round_trips_non_default_values() {
        let info = sample();
        let bytes = info.to_xml().unwrap();
        let decoded = ComicInfo::from_xml(&bytes).unwrap();
        assert_eq!(decoded, info);
    }

    #[test]
    fn defaults_are_omitted() {
        let info = ComicInfo {
            series: "Foo".into(),
            volume: 1,
            ..Default::default()
        };
        let xml = String::from_utf8(info.to_xml().unwrap()).unwrap();
        assert_eq!(
            xml,
            "<ComicInfo>\n  <Series>Foo</Series>\n  <Volume>1</Volume>\n</ComicInfo>"
        );
    }

    #[test]
    fn pages_are_nested_and_index_always_written() {
        let info = ComicInfo {
            pages: vec![ComicPageInfo::default()],
            ..Default::default()
        };
        let xml = String::from_utf8(info.to_xml().unwrap()).unwrap();
        assert_eq!(
            xml,
            "<ComicInfo>\n  <Pages>\n    <Page Image=\"0\"/>\n  </Pages>\n</ComicInfo>"
        );
    }

    #[test]
    fn decodes_third_party_document() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<ComicInfo xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <Series>Foo</Series>
  <Count> 7 </Count>
  <GTIN>9780000000000</GTIN>
  <Notes><![CDATA[tagged <by> hand]]></Notes>
  <Web/>
  <Pages>
    <Page Image="0" Type="FrontCover" ImageWidth="100" Unknown="x" />
    <Page Image="1" DoublePage="True" />
  </Pages>
</ComicInfo>"#;
        let info = ComicInfo::from_xml(xml.as_bytes()).unwrap();
        assert_eq!(info.series, "Foo");
        assert_eq!(info.count, 7);
        assert_eq!(info.notes, "tagged <by> hand");
        assert!(info.web.is_empty());
        assert_eq!(info.pages.len(), 2);
        assert_eq!(info.pages[0].page_type.as_str(), "FrontCover");
        assert_eq!(info.pages[0].image_width, 100);
        assert!(info.pages[1].double_page);
    }

    #[test]
    fn decodes_flat_legacy_pages() {
        let xml = r#"<ComicInfo>
 <Pages Image="0" Type="Story" ImageWidth="640"></Pages>
 <Pages Image="1" Type="Story" ImageWidth="1280"></Pages>
 <Title>Legacy</Title>
</ComicInfo>"#;
        let info = ComicInfo::from_xml(xml.as_bytes()).unwrap();
        assert_eq!(info.pages.len(), 2);
        assert_eq!(info.pages[1].image, 1);
        assert_eq!(info.pages[1].image_width, 1280);
        assert_eq!(info.title, "Legacy");
    }

    #[test]
    fn text_is_preserved_verbatim() {
        let xml = "<ComicInfo><Summary>  leading and trailing  </Summary></ComicInfo>";
        let info = ComicInfo::from_xml(xml.as_bytes()).unwrap();
        assert_eq!(info.summary, "  leading and trailing  ");
    }

    #[test]
    fn rejects_unparsable_numbers() {
        let xml = "<ComicInfo><PageCount>xyz</PageCount></ComicInfo>";
        match ComicInfo::from_xml(xml.as_bytes()).unwrap_err() {
            CbzError::InvalidFieldValue { field, value } => {
                assert_eq!(field, "PageCount");
                assert_eq!(value, "xyz");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_values_decode_as_zero() {
        let xml = r#"<ComicInfo>
  <Series>X</Series>
  <Count></Count>
  <CommunityRating></CommunityRating>
  <Pages>
    <Page Image="0" ImageWidth="" DoublePage="" />
  </Pages>
</ComicInfo>"#;
        let info = ComicInfo::from_xml(xml.as_bytes()).unwrap();
        assert_eq!(info.series, "X");
        assert_eq!(info.count, 0);
        assert_eq!(info.community_rating, 0.0);
        assert_eq!(info.pages.len(), 1);
        assert_eq!(info.pages[0].image_width, 0);
        assert!(!info.pages[0].double_page);
    }

    #[test]
    fn whitespace_only_numbers_are_rejected() {
        let xml = "<ComicInfo><Count>   </Count></ComicInfo>";
        assert!(matches!(
            ComicInfo::from_xml(xml.as_bytes()),
            Err(CbzError::InvalidFieldValue { ref field, .. }) if field == "Count"
        ));

        let xml = r#"<ComicInfo><Pages><Page Image="0" ImageWidth=" " /></Pages></ComicInfo>"#;
        assert!(matches!(
            ComicInfo::from_xml(xml.as_bytes()),
            Err(CbzError::InvalidFieldValue { ref field, .. }) if field == "Pages.ImageWidth"
        ));
    }

    #[test]
    fn rejects_wrong_root_and_garbage() {
        assert!(matches!(
            ComicInfo::from_xml(b"<Comic><Title>x</Title></Comic>"),
            Err(CbzError::MetadataDecode { .. })
        ));
        assert!(matches!(
            ComicInfo::from_xml(b""),
            Err(CbzError::MetadataDecode { .. })
        ));
        assert!(matches!(
            ComicInfo::from_xml(b"<ComicInfo><Title>x</Series></ComicInfo>"),
            Err(CbzError::MetadataDecode { .. })
        ));
    }
}
