//! Conversion of `Name=Value` operands into typed field values.
//!
//! The target type is read from the schema dispatch tables instead of a separate list of
//! field names. `ComicInfo` is consulted first, then `ComicPageInfo`, so page-level names
//! such as `DoublePage` still convert to their declared type. Anything else is text.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::error::{CbzError, Result};
use crate::types::{ComicInfo, ComicPageInfo, FieldKind, FieldValue, Schema};

static FIELD_KINDS: Lazy<HashMap<&'static str, FieldKind>> = Lazy::new(|| {
    let mut kinds = HashMap::with_capacity(ComicInfo::FIELDS.len() + ComicPageInfo::FIELDS.len());
    for spec in ComicInfo::FIELDS {
        kinds.insert(spec.name, spec.kind);
    }
    for spec in ComicPageInfo::FIELDS {
        kinds.entry(spec.name).or_insert(spec.kind);
    }
    kinds
});

/// Type tag a value for `name` will be parsed as.
#[must_use]
pub fn field_kind(name: &str) -> FieldKind {
    match FIELD_KINDS.get(name) {
        // A page list has no scalar form; let the setter reject it with a type error.
        Some(FieldKind::Pages) | None => FieldKind::Text,
        Some(kind) => *kind,
    }
}

/// Convert the string form of `value` to the type declared for `name`.
pub fn convert(name: &str, value: &str) -> Result<FieldValue> {
    field_kind(name)
        .parse(value)
        .map_err(|reason| CbzError::Conversion {
            field: name.to_owned(),
            value: value.to_owned(),
            reason,
        })
}

/// A parsed `Name=Value` operand.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldAssignment {
    pub name: String,
    pub value: FieldValue,
}

impl FieldAssignment {
    /// Split on the first `=` and convert the right-hand side.
    ///
    /// Values may themselves contain `=`, as URLs in `Web` often do.
    pub fn parse(operand: &str) -> Result<Self> {
        let (name, raw) = operand
            .split_once('=')
            .filter(|(name, _)| !name.is_empty())
            .ok_or_else(|| CbzError::MalformedAssignment {
                operand: operand.to_owned(),
            })?;
        Ok(Self {
            name: name.to_owned(),
            value: convert(name, raw)?,
        })
    }
}

/// Parse every operand up front so a bad value is reported before any archive is opened.
pub fn parse_assignments<I, S>(operands: I) -> Result<Vec<FieldAssignment>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    operands
        .into_iter()
        .map(|operand| FieldAssignment::parse(operand.as_ref()))
        .collect()
}
