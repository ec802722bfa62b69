//! Name-keyed dispatch over schema attributes.
//!
//! Every schema struct is declared through [`schema_struct!`], which emits the struct and a
//! static table of [`FieldSpec`] entries from the same field list. The table carries the XML
//! name, the type tag and accessors, and is the only place the codec, the XML layer and the
//! mutation pipeline learn what type an attribute has.

use std::fmt;

use crate::error::{CbzError, Result};
use crate::types::ComicPageInfo;

/// Type category of a schema attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Text,
    Integer,
    Float,
    Bool,
    Pages,
}

impl FieldKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Text => "string",
            Self::Integer => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Pages => "pages",
        }
    }

    /// Parse a raw string as this kind. Page sequences have no scalar form.
    pub(crate) fn parse(self, raw: &str) -> std::result::Result<FieldValue, Box<str>> {
        match self {
            Self::Text => Ok(FieldValue::Text(raw.to_owned())),
            Self::Integer => raw
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|err| err.to_string().into()),
            Self::Float => raw
                .parse::<f64>()
                .map(FieldValue::Float)
                .map_err(|err| err.to_string().into()),
            Self::Bool => parse_bool(raw)
                .map(FieldValue::Bool)
                .ok_or_else(|| "invalid boolean literal".into()),
            Self::Pages => Err("page sequences have no scalar representation".into()),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// `1`, `t`, `true` and their capitalized forms, and the matching false spellings.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// A typed scalar ready to be assigned to an attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl FieldValue {
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Text(_) => FieldKind::Text,
            Self::Integer(_) => FieldKind::Integer,
            Self::Float(_) => FieldKind::Float,
            Self::Bool(_) => FieldKind::Bool,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Borrowed view of an attribute's current value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldRef<'a> {
    Text(&'a str),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Pages(&'a [ComicPageInfo]),
}

impl FieldRef<'_> {
    /// True when the value equals the type's zero value and must not be serialized.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_default(&self) -> bool {
        match *self {
            Self::Text(text) => text.is_empty(),
            Self::Integer(value) => value == 0,
            Self::Float(value) => value == 0.0,
            Self::Bool(value) => !value,
            Self::Pages(pages) => pages.is_empty(),
        }
    }

    /// Text form used for XML element content and attribute values.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match *self {
            Self::Text(text) => Some(text.to_owned()),
            Self::Integer(value) => Some(value.to_string()),
            Self::Float(value) => Some(value.to_string()),
            Self::Bool(value) => Some(value.to_string()),
            Self::Pages(_) => None,
        }
    }
}

/// Mutable slot for an attribute.
#[derive(Debug)]
pub enum FieldMut<'a> {
    Text(&'a mut String),
    Integer(&'a mut i64),
    Float(&'a mut f64),
    Bool(&'a mut bool),
    Pages(&'a mut Vec<ComicPageInfo>),
}

impl FieldMut<'_> {
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Text(_) => FieldKind::Text,
            Self::Integer(_) => FieldKind::Integer,
            Self::Float(_) => FieldKind::Float,
            Self::Bool(_) => FieldKind::Bool,
            Self::Pages(_) => FieldKind::Pages,
        }
    }

    /// Store `value` if its category matches the slot. Never coerces.
    pub fn assign(self, field: &str, value: FieldValue) -> Result<()> {
        match (self, value) {
            (Self::Text(slot), FieldValue::Text(value)) => *slot = value,
            (Self::Integer(slot), FieldValue::Integer(value)) => *slot = value,
            (Self::Float(slot), FieldValue::Float(value)) => *slot = value,
            (Self::Bool(slot), FieldValue::Bool(value)) => *slot = value,
            (slot, value) => {
                return Err(CbzError::UnsupportedType {
                    field: field.to_owned(),
                    expected: slot.kind(),
                    actual: value.kind(),
                });
            }
        }
        Ok(())
    }
}

/// Rust types that can back a schema attribute.
pub trait FieldType {
    const KIND: FieldKind;

    fn field_ref(&self) -> FieldRef<'_>;

    fn field_mut(&mut self) -> FieldMut<'_>;
}

impl FieldType for String {
    const KIND: FieldKind = FieldKind::Text;

    fn field_ref(&self) -> FieldRef<'_> {
        FieldRef::Text(self)
    }

    fn field_mut(&mut self) -> FieldMut<'_> {
        FieldMut::Text(self)
    }
}

impl FieldType for i64 {
    const KIND: FieldKind = FieldKind::Integer;

    fn field_ref(&self) -> FieldRef<'_> {
        FieldRef::Integer(*self)
    }

    fn field_mut(&mut self) -> FieldMut<'_> {
        FieldMut::Integer(self)
    }
}

impl FieldType for f64 {
    const KIND: FieldKind = FieldKind::Float;

    fn field_ref(&self) -> FieldRef<'_> {
        FieldRef::Float(*self)
    }

    fn field_mut(&mut self) -> FieldMut<'_> {
        FieldMut::Float(self)
    }
}

impl FieldType for bool {
    const KIND: FieldKind = FieldKind::Bool;

    fn field_ref(&self) -> FieldRef<'_> {
        FieldRef::Bool(*self)
    }

    fn field_mut(&mut self) -> FieldMut<'_> {
        FieldMut::Bool(self)
    }
}

impl FieldType for Vec<ComicPageInfo> {
    const KIND: FieldKind = FieldKind::Pages;

    fn field_ref(&self) -> FieldRef<'_> {
        FieldRef::Pages(self)
    }

    fn field_mut(&mut self) -> FieldMut<'_> {
        FieldMut::Pages(self)
    }
}

/// One row of a dispatch table: XML name, type tag and accessors.
pub struct FieldSpec<T> {
    pub name: &'static str,
    pub kind: FieldKind,
    pub(crate) get: for<'a> fn(&'a T) -> FieldRef<'a>,
    pub(crate) get_mut: for<'a> fn(&'a mut T) -> FieldMut<'a>,
}

impl<T> FieldSpec<T> {
    #[must_use]
    pub fn get<'a>(&self, target: &'a T) -> FieldRef<'a> {
        (self.get)(target)
    }

    pub fn get_mut<'a>(&self, target: &'a mut T) -> FieldMut<'a> {
        (self.get_mut)(target)
    }
}

impl<T> fmt::Debug for FieldSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

/// A struct whose attributes are reachable by their XML names.
pub trait Schema: Sized + 'static {
    /// Attributes in serialization order.
    const FIELDS: &'static [FieldSpec<Self>];

    /// Case-sensitive lookup by XML name.
    #[must_use]
    fn field(name: &str) -> Option<&'static FieldSpec<Self>> {
        Self::FIELDS.iter().find(|spec| spec.name == name)
    }
}

/// Declares a schema struct together with its [`Schema::FIELDS`] table.
macro_rules! schema_struct {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $xml:literal => pub $field:ident : $ty:ty,
            )*
        }
    ) => {
        $(#[$meta])*
        pub struct $name {
            $(
                $(#[$field_meta])*
                pub $field: $ty,
            )*
        }

        impl $crate::types::field::Schema for $name {
            const FIELDS: &'static [$crate::types::field::FieldSpec<Self>] = &[
                $(
                    $crate::types::field::FieldSpec {
                        name: $xml,
                        kind: <$ty as $crate::types::field::FieldType>::KIND,
                        get: |target| $crate::types::field::FieldType::field_ref(&target.$field),
                        get_mut: |target| {
                            $crate::types::field::FieldType::field_mut(&mut target.$field)
                        },
                    },
                )*
            ];
        }
    };
}

pub(crate) use schema_struct;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_follows_kind() {
        assert_eq!(FieldKind::Integer.parse("7"), Ok(FieldValue::Integer(7)));
        assert_eq!(FieldKind::Float.parse("1.5"), Ok(FieldValue::Float(1.5)));
        assert_eq!(FieldKind::Bool.parse("T"), Ok(FieldValue::Bool(true)));
        assert_eq!(FieldKind::Bool.parse("0"), Ok(FieldValue::Bool(false)));
        assert_eq!(
            FieldKind::Text.parse("abc"),
            Ok(FieldValue::Text("abc".to_string()))
        );
        assert!(FieldKind::Integer.parse("1.0").is_err());
        assert!(FieldKind::Bool.parse("yes").is_err());
        assert!(FieldKind::Pages.parse("").is_err());
    }

    #[test]
    fn assign_rejects_mismatched_category() {
        let mut count = 0_i64;
        let err = count
            .field_mut()
            .assign("Count", FieldValue::Text("7".into()))
            .unwrap_err();
        assert!(matches!(
            err,
            CbzError::UnsupportedType {
                expected: FieldKind::Integer,
                actual: FieldKind::Text,
                ..
            }
        ));
        assert_eq!(count, 0);

        count.field_mut().assign("Count", 7_i64.into()).unwrap();
        assert_eq!(count, 7);
    }

    #[test]
    fn defaults_are_detected() {
        assert!(FieldRef::Text("").is_default());
        assert!(FieldRef::Integer(0).is_default());
        assert!(FieldRef::Float(0.0).is_default());
        assert!(FieldRef::Bool(false).is_default());
        assert!(FieldRef::Pages(&[]).is_default());
        assert!(!FieldRef::Float(1.5).is_default());
        assert_eq!(FieldRef::Float(4.0).to_text().as_deref(), Some("4"));
    }
}
