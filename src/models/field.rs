use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::core::metadata::{MetadataError, Result};
use crate::models::{GeoCoordinate, TagValue};

const DATE_FORMATS: &[&str] = &["%Y:%m:%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// A namespace-independent concept edited by the user.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticField {
    Date,
    Title,
    Creator,
    Description,
    Keywords,
    Copyright,
    Latitude,
    Longitude,
    Orientation,
}

impl SemanticField {
    pub const ALL: [SemanticField; 9] = [
        Self::Date,
        Self::Title,
        Self::Creator,
        Self::Description,
        Self::Keywords,
        Self::Copyright,
        Self::Latitude,
        Self::Longitude,
        Self::Orientation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Title => "title",
            Self::Creator => "creator",
            Self::Description => "description",
            Self::Keywords => "keywords",
            Self::Copyright => "copyright",
            Self::Latitude => "latitude",
            Self::Longitude => "longitude",
            Self::Orientation => "orientation",
        }
    }

    pub fn is_geographic(self) -> bool {
        matches!(self, Self::Latitude | Self::Longitude)
    }

    /// Parse user input into the value shape this field is written with.
    /// Keywords are comma separated; coordinates are signed decimal degrees.
    pub fn parse_value(self, input: &str) -> Result<TagValue> {
        let input = input.trim();
        let invalid = |reason: String| MetadataError::InvalidFieldValue {
            field: self,
            reason,
        };

        match self {
            Self::Date => DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
                .map(TagValue::Timestamp)
                .ok_or_else(|| invalid(format!("{input:?} is not a date and time"))),
            Self::Orientation => input
                .parse::<i64>()
                .map(TagValue::Integer)
                .map_err(|err| invalid(format!("{input:?}: {err}"))),
            Self::Latitude | Self::Longitude => {
                let degrees = input
                    .parse::<f64>()
                    .map_err(|err| invalid(format!("{input:?}: {err}")))?;
                let coord = GeoCoordinate::new(degrees, self == Self::Latitude)?;
                Ok(TagValue::GeoCoordinate(coord))
            }
            Self::Keywords => {
                let keywords = input
                    .split(',')
                    .map(str::trim)
                    .filter(|keyword| !keyword.is_empty())
                    .map(String::from)
                    .collect::<Vec<_>>();
                if keywords.is_empty() {
                    return Err(invalid(String::from("no keywords given")));
                }
                Ok(TagValue::TextList(keywords))
            }
            Self::Title | Self::Creator | Self::Description | Self::Copyright => {
                Ok(TagValue::single(input))
            }
        }
    }
}

impl FromStr for SemanticField {
    type Err = MetadataError;

    fn from_str(value: &str) -> Result<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == normalized)
            .ok_or_else(|| MetadataError::UnknownField(String::from(value)))
    }
}

impl fmt::Display for SemanticField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!(" Keywords ".parse::<SemanticField>().ok(), Some(SemanticField::Keywords));
        assert!(matches!(
            "rating".parse::<SemanticField>(),
            Err(MetadataError::UnknownField(_))
        ));
    }

    #[test]
    fn parses_values_per_field() {
        let keywords = SemanticField::Keywords
            .parse_value("alps, snow,,hiking ")
            .expect("keywords should parse");
        assert_eq!(
            keywords,
            TagValue::TextList(vec!["alps".into(), "snow".into(), "hiking".into()])
        );

        let date = SemanticField::Date
            .parse_value("2024:06:01 12:30:00")
            .expect("exif date should parse");
        assert_eq!(date.to_string(), "2024:06:01 12:30:00");

        let latitude = SemanticField::Latitude
            .parse_value("-33.8688")
            .expect("latitude should parse");
        let TagValue::GeoCoordinate(coord) = latitude else {
            panic!("latitude should parse to a coordinate");
        };
        assert!(coord.is_latitude());
        assert_eq!(coord.hemisphere().letter(), 'S');

        assert!(SemanticField::Orientation.parse_value("left").is_err());
        assert!(SemanticField::Longitude.parse_value("200").is_err());
    }
}
