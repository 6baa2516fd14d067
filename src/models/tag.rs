use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::core::metadata::{MetadataError, Result};
use crate::models::GeoCoordinate;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub enum Namespace {
    Exif,
    Iptc,
    Xmp,
}

impl Namespace {
    pub const ALL: [Namespace; 3] = [Self::Exif, Self::Iptc, Self::Xmp];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exif => "Exif",
            Self::Iptc => "Iptc",
            Self::Xmp => "Xmp",
        }
    }
}

impl FromStr for Namespace {
    type Err = MetadataError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "Exif" => Ok(Self::Exif),
            "Iptc" => Ok(Self::Iptc),
            "Xmp" => Ok(Self::Xmp),
            other => Err(MetadataError::InvalidTagKey(String::from(other))),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A namespaced tag key such as `Exif.GPSInfo.GPSLatitude`.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TagId {
    namespace: Namespace,
    group: String,
    name: String,
}

impl TagId {
    pub fn new(namespace: Namespace, group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace,
            group: group.into(),
            name: name.into(),
        }
    }

    pub fn parse(key: &str) -> Result<Self> {
        let mut parts = key.trim().split('.');
        let (Some(namespace), Some(group), Some(name), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(MetadataError::InvalidTagKey(String::from(key)));
        };

        if group.is_empty() || name.is_empty() {
            return Err(MetadataError::InvalidTagKey(String::from(key)));
        }

        let namespace = namespace
            .parse::<Namespace>()
            .map_err(|_| MetadataError::InvalidTagKey(String::from(key)))?;

        Ok(Self::new(namespace, group, name))
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The `...Ref` tag that carries the hemisphere letter for an Exif GPS
    /// coordinate, e.g. `Exif.GPSInfo.GPSLatitudeRef`.
    pub fn companion_ref(&self) -> Self {
        Self::new(self.namespace, self.group.clone(), format!("{}Ref", self.name))
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.namespace, self.group, self.name)
    }
}

impl FromStr for TagId {
    type Err = MetadataError;

    fn from_str(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

impl TryFrom<String> for TagId {
    type Error = MetadataError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<TagId> for String {
    fn from(value: TagId) -> Self {
        value.to_string()
    }
}

/// A decoded, namespace-independent tag value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TagValue {
    Text(String),
    TextList(Vec<String>),
    LocalizedText(BTreeMap<String, String>),
    Timestamp(NaiveDateTime),
    Integer(i64),
    GeoCoordinate(GeoCoordinate),
}

impl TagValue {
    /// Tolerance used when comparing coordinates, matching the rational
    /// precision of the Exif encoding.
    pub const COORDINATE_TOLERANCE: f64 = 1e-6;

    /// A one-element [`TagValue::TextList`], the shape list-valued tags read as.
    pub fn single(value: impl Into<String>) -> Self {
        Self::TextList(vec![value.into()])
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::TextList(_) => "text list",
            Self::LocalizedText(_) => "localized text",
            Self::Timestamp(_) => "timestamp",
            Self::Integer(_) => "integer",
            Self::GeoCoordinate(_) => "coordinate",
        }
    }

    /// The plain strings carried by any of the text shapes.
    pub fn strings(&self) -> Option<Vec<&str>> {
        match self {
            Self::Text(value) => Some(vec![value.as_str()]),
            Self::TextList(values) => Some(values.iter().map(String::as_str).collect()),
            Self::LocalizedText(values) => Some(values.values().map(String::as_str).collect()),
            _ => None,
        }
    }

    /// Content equality: text shapes compare by their strings, so a
    /// one-entry language alternative equals a one-element list with the same
    /// string, and coordinates compare within [`Self::COORDINATE_TOLERANCE`].
    pub fn same_content(&self, other: &TagValue) -> bool {
        match (self, other) {
            (Self::GeoCoordinate(a), Self::GeoCoordinate(b)) => {
                a.approx_eq(*b, Self::COORDINATE_TOLERANCE)
            }
            (Self::Timestamp(a), Self::Timestamp(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            _ => match (self.strings(), other.strings()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(v) => write!(f, "{v}"),
            Self::TextList(v) => write!(f, "{}", v.join("; ")),
            Self::LocalizedText(v) => {
                let entries = v
                    .iter()
                    .map(|(lang, text)| format!("[{lang}] {text}"))
                    .collect::<Vec<_>>();
                write!(f, "{}", entries.join("; "))
            }
            Self::Timestamp(v) => write!(f, "{}", v.format("%Y:%m:%d %H:%M:%S")),
            Self::Integer(v) => write!(f, "{v}"),
            Self::GeoCoordinate(v) => write!(f, "{v}"),
        }
    }
}
