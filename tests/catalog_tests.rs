use photo_fields::core::catalog::{all_tags, candidates_for, fields_for};
use photo_fields::models::{Namespace, SemanticField, TagId};
use photo_fields::MetadataError;

fn keys(field: SemanticField) -> Vec<String> {
    candidates_for(field).iter().map(ToString::to_string).collect()
}

#[test]
fn every_field_has_candidates() {
    for field in SemanticField::ALL {
        assert!(
            !candidates_for(field).is_empty(),
            "{field} should map to at least one tag"
        );
        assert!(std::ptr::eq(candidates_for(field), candidates_for(field)));
    }
}

#[test]
fn candidates_keep_preference_order() {
    assert_eq!(
        keys(SemanticField::Date),
        [
            "Exif.Photo.DateTimeOriginal",
            "Exif.Photo.DateTimeDigitized",
            "Exif.Image.DateTime",
        ]
    );
    assert_eq!(
        keys(SemanticField::Copyright),
        [
            "Xmp.dc.rights",
            "Xmp.tiff.Copyright",
            "Iptc.Application2.Copyright",
            "Exif.Image.Copyright",
        ]
    );
    assert_eq!(
        keys(SemanticField::Latitude),
        ["Exif.GPSInfo.GPSLatitude", "Xmp.exif.GPSLatitude"]
    );
    assert_eq!(keys(SemanticField::Orientation), ["Exif.Image.Orientation"]);
}

#[test]
fn reverse_lookup_finds_owning_field() {
    let byline = TagId::parse("Iptc.Application2.Byline").expect("key should parse");
    assert_eq!(fields_for(&byline), vec![SemanticField::Creator]);

    let make = TagId::parse("Exif.Image.Make").expect("key should parse");
    assert!(fields_for(&make).is_empty());
}

#[test]
fn all_tags_lists_each_tag_once() {
    let tags = all_tags();
    let total: usize = SemanticField::ALL
        .into_iter()
        .map(|field| candidates_for(field).len())
        .sum();
    assert_eq!(tags.len(), total);
    assert!(tags.iter().any(|tag| tag.namespace() == Namespace::Iptc));
}

#[test]
fn tag_keys_parse_strictly() {
    let tag = TagId::parse("Xmp.dc.subject").expect("three-part key should parse");
    assert_eq!(tag.namespace(), Namespace::Xmp);
    assert_eq!(tag.group(), "dc");
    assert_eq!(tag.name(), "subject");
    assert_eq!(tag.to_string(), "Xmp.dc.subject");

    for bad in ["Xmp.dc", "Exif..Artist", "Foo.Image.Artist", "Exif.Image.Artist.Extra", ""] {
        assert!(
            matches!(TagId::parse(bad), Err(MetadataError::InvalidTagKey(_))),
            "{bad:?} should be rejected"
        );
    }
}

#[test]
fn tag_ids_serialize_as_strings() {
    let tag = TagId::parse("Exif.GPSInfo.GPSLatitude").expect("key should parse");
    let json = serde_json::to_string(&tag).expect("tag should serialize");
    assert_eq!(json, "\"Exif.GPSInfo.GPSLatitude\"");

    let back: TagId = serde_json::from_str(&json).expect("tag should deserialize");
    assert_eq!(back, tag);
    assert_eq!(back.companion_ref().to_string(), "Exif.GPSInfo.GPSLatitudeRef");
}
