use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::{Namespace, Rational};

/// A tag value as the underlying store keeps it, before any decoding.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum RawValue {
    Exif(ExifValue),
    /// One byte string per repeated IPTC dataset.
    Iptc(Vec<Vec<u8>>),
    Xmp(XmpValue),
}

impl RawValue {
    pub fn namespace(&self) -> Namespace {
        match self {
            Self::Exif(_) => Namespace::Exif,
            Self::Iptc(_) => Namespace::Iptc,
            Self::Xmp(_) => Namespace::Xmp,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ExifValue {
    Ascii(Vec<u8>),
    DateTime(NaiveDateTime),
    Integer(i64),
    Rational(Vec<Rational>),
}

/// XMP property value, tagged with its structural kind.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum XmpValue {
    Text(String),
    Bag(Vec<String>),
    Seq(Vec<String>),
    LangAlt(BTreeMap<String, String>),
    /// `DDD,MM,SSk` or `DDD,MM.mmk`.
    GpsCoordinate(String),
    /// A kind this layer has no decode rule for (struct, alt of structs, ...).
    Other { kind: String, value: String },
}

impl XmpValue {
    pub fn kind_name(&self) -> &str {
        match self {
            Self::Text(_) => "Text",
            Self::Bag(_) => "bag Text",
            Self::Seq(_) => "seq Text",
            Self::LangAlt(_) => "Lang Alt",
            Self::GpsCoordinate(_) => "GPSCoordinate",
            Self::Other { kind, .. } => kind,
        }
    }
}
