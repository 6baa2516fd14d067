//! Which namespaced tags carry each semantic field, most preferred first.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::models::{SemanticField, TagId};

const CATALOG_KEYS: &[(SemanticField, &[&str])] = &[
    (
        SemanticField::Date,
        &[
            "Exif.Photo.DateTimeOriginal",
            "Exif.Photo.DateTimeDigitized",
            "Exif.Image.DateTime",
        ],
    ),
    (
        SemanticField::Title,
        &[
            "Xmp.dc.title",
            "Iptc.Application2.ObjectName",
            "Exif.Image.ImageDescription",
        ],
    ),
    (
        SemanticField::Creator,
        &[
            "Xmp.dc.creator",
            "Iptc.Application2.Byline",
            "Exif.Image.Artist",
        ],
    ),
    (
        SemanticField::Description,
        &["Xmp.dc.description", "Iptc.Application2.Caption"],
    ),
    (
        SemanticField::Keywords,
        &["Xmp.dc.subject", "Iptc.Application2.Keywords"],
    ),
    (
        SemanticField::Copyright,
        &[
            "Xmp.dc.rights",
            "Xmp.tiff.Copyright",
            "Iptc.Application2.Copyright",
            "Exif.Image.Copyright",
        ],
    ),
    (
        SemanticField::Latitude,
        &["Exif.GPSInfo.GPSLatitude", "Xmp.exif.GPSLatitude"],
    ),
    (
        SemanticField::Longitude,
        &["Exif.GPSInfo.GPSLongitude", "Xmp.exif.GPSLongitude"],
    ),
    (SemanticField::Orientation, &["Exif.Image.Orientation"]),
];

static CATALOG: LazyLock<HashMap<SemanticField, Vec<TagId>>> = LazyLock::new(|| {
    CATALOG_KEYS
        .iter()
        .map(|(field, keys)| {
            let tags = keys
                .iter()
                .filter_map(|key| TagId::parse(key).ok())
                .collect::<Vec<_>>();
            (*field, tags)
        })
        .collect()
});

/// Candidate tags for `field`, most preferred first. Never empty.
pub fn candidates_for(field: SemanticField) -> &'static [TagId] {
    CATALOG.get(&field).map(Vec::as_slice).unwrap_or(&[])
}

/// Every field that lists `tag` among its candidates.
pub fn fields_for(tag: &TagId) -> Vec<SemanticField> {
    SemanticField::ALL
        .into_iter()
        .filter(|field| candidates_for(*field).contains(tag))
        .collect()
}

/// All catalog tags, in field order, without duplicates.
pub fn all_tags() -> Vec<&'static TagId> {
    let mut tags: Vec<&'static TagId> = Vec::new();
    for field in SemanticField::ALL {
        for tag in candidates_for(field) {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
    }
    tags
}
