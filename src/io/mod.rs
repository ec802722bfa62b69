//! Encoding of the metadata entry.

pub mod xml;
