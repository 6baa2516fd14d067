//! Per-namespace decoding and encoding between raw store values and
//! [`TagValue`]s.
//!
//! Reads dispatch on the stored [`RawValue`] variant. Writes dispatch on the
//! kind the target tag is expected to hold ([`ExifKind`], [`XmpKind`]); IPTC
//! tags are always lists of ISO-8859-1 strings.

use std::collections::BTreeMap;

use crate::core::gps;
use crate::core::metadata::{MetadataError, Result};
use crate::core::store::RawStore;
use crate::models::{
    ExifValue, GeoCoordinate, Hemisphere, Namespace, RawValue, TagId, TagValue, XmpValue,
};

/// Locale key used for the single entry written to language alternatives.
pub const DEFAULT_LANGUAGE: &str = "x-default";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExifKind {
    Ascii,
    DateTime,
    Integer,
    GpsCoordinate,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum XmpKind {
    Text,
    Bag,
    Seq,
    LangAlt,
    GpsCoordinate,
}

pub fn exif_kind(tag: &TagId) -> ExifKind {
    match (tag.group(), tag.name()) {
        ("GPSInfo", name) if axis_of(name).is_some() => ExifKind::GpsCoordinate,
        (_, "DateTime" | "DateTimeOriginal" | "DateTimeDigitized") => ExifKind::DateTime,
        (_, "Orientation") => ExifKind::Integer,
        _ => ExifKind::Ascii,
    }
}

/// Structural kind of an XMP property, for the properties this layer knows.
pub fn xmp_kind(tag: &TagId) -> Result<XmpKind> {
    let kind = match (tag.group(), tag.name()) {
        ("dc", "title" | "description" | "rights") => XmpKind::LangAlt,
        ("tiff", "Copyright" | "ImageDescription" | "Artist") => XmpKind::LangAlt,
        ("dc", "creator") => XmpKind::Seq,
        ("dc", "subject") => XmpKind::Bag,
        ("exif", "GPSLatitude" | "GPSLongitude" | "GPSDestLatitude" | "GPSDestLongitude") => {
            XmpKind::GpsCoordinate
        }
        ("photoshop", "Headline" | "Credit" | "Source" | "City" | "Country") => XmpKind::Text,
        ("xmpRights", "WebStatement") => XmpKind::Text,
        _ => {
            return Err(MetadataError::UnknownTagType {
                tag: tag.clone(),
                kind: String::from("unregistered XMP property"),
            })
        }
    };
    Ok(kind)
}

/// Decode `tag` if present in the store.
pub fn read_tag<S: RawStore + ?Sized>(store: &S, tag: &TagId) -> Result<Option<TagValue>> {
    let Some(raw) = store.get(tag) else {
        return Ok(None);
    };

    if raw.namespace() != tag.namespace() {
        return Err(MetadataError::UnknownTagType {
            tag: tag.clone(),
            kind: format!("{} value", raw.namespace()),
        });
    }

    let value = match raw {
        RawValue::Xmp(value) => decode_xmp(tag, value)?,
        RawValue::Iptc(datasets) => {
            TagValue::TextList(datasets.iter().map(|bytes| decode_latin1(bytes)).collect())
        }
        RawValue::Exif(value) => decode_exif(store, tag, value)?,
    };
    Ok(Some(value))
}

/// The raw writes needed to store `value` under `tag`, in write order.
///
/// Exif GPS coordinates produce two writes: the `...Ref` companion first,
/// then the coordinate itself.
pub fn encode_tag(tag: &TagId, value: &TagValue) -> Result<Vec<(TagId, RawValue)>> {
    match tag.namespace() {
        Namespace::Xmp => Ok(vec![(tag.clone(), RawValue::Xmp(encode_xmp(tag, value)?))]),
        Namespace::Iptc => {
            let datasets = text_values(tag, value)?
                .iter()
                .map(|text| encode_latin1(tag, text))
                .collect::<Result<Vec<_>>>()?;
            Ok(vec![(tag.clone(), RawValue::Iptc(datasets))])
        }
        Namespace::Exif => encode_exif(tag, value),
    }
}

pub fn write_tag<S: RawStore + ?Sized>(store: &mut S, tag: &TagId, value: &TagValue) -> Result<()> {
    for (target, raw) in encode_tag(tag, value)? {
        store.set(target, raw);
    }
    Ok(())
}

/// Remove `tag`, and its hemisphere companion when an Exif GPS coordinate
/// was actually removed. Returns whether `tag` itself was present.
pub fn remove_tag<S: RawStore + ?Sized>(store: &mut S, tag: &TagId) -> bool {
    let removed = store.remove(tag).is_some();
    if removed
        && tag.namespace() == Namespace::Exif
        && exif_kind(tag) == ExifKind::GpsCoordinate
    {
        store.remove(&tag.companion_ref());
    }
    removed
}

// ---------------------------------------------------------------------------
// Typed accessors
// ---------------------------------------------------------------------------

pub fn exif_string<S: RawStore + ?Sized>(store: &S, tag: &TagId) -> Result<Option<String>> {
    match store.get(tag) {
        None => Ok(None),
        Some(RawValue::Exif(ExifValue::Ascii(bytes))) => Ok(Some(decode_exif_ascii(bytes))),
        Some(_) => Err(unsupported(tag, "tag does not hold an Exif string")),
    }
}

pub fn iptc_strings<S: RawStore + ?Sized>(store: &S, tag: &TagId) -> Result<Option<Vec<String>>> {
    match store.get(tag) {
        None => Ok(None),
        Some(RawValue::Iptc(datasets)) => Ok(Some(
            datasets.iter().map(|bytes| decode_latin1(bytes)).collect(),
        )),
        Some(_) => Err(unsupported(tag, "tag does not hold IPTC datasets")),
    }
}

/// Every string of an XMP text property, whatever its container.
pub fn xmp_strings<S: RawStore + ?Sized>(store: &S, tag: &TagId) -> Result<Option<Vec<String>>> {
    match store.get(tag) {
        None => Ok(None),
        Some(RawValue::Xmp(XmpValue::Text(text))) => Ok(Some(vec![text.clone()])),
        Some(RawValue::Xmp(XmpValue::Bag(values) | XmpValue::Seq(values))) => {
            Ok(Some(values.clone()))
        }
        Some(RawValue::Xmp(XmpValue::LangAlt(values))) => Ok(Some(values.values().cloned().collect())),
        Some(_) => Err(unsupported(tag, "tag does not hold XMP text")),
    }
}

pub fn xmp_localized<S: RawStore + ?Sized>(
    store: &S,
    tag: &TagId,
) -> Result<Option<BTreeMap<String, String>>> {
    match store.get(tag) {
        None => Ok(None),
        Some(RawValue::Xmp(XmpValue::LangAlt(values))) => Ok(Some(values.clone())),
        Some(RawValue::Xmp(other)) => Err(unsupported(
            tag,
            &format!("tag holds {}, not Lang Alt", other.kind_name()),
        )),
        Some(_) => Err(unsupported(tag, "tag does not hold an XMP language alternative")),
    }
}

/// An Exif GPS coordinate together with its hemisphere letter.
pub fn exif_gps<S: RawStore + ?Sized>(store: &S, tag: &TagId) -> Result<Option<GeoCoordinate>> {
    match store.get(tag) {
        None => Ok(None),
        Some(RawValue::Exif(ExifValue::Rational(values))) => {
            let hemisphere = exif_hemisphere(store, tag)?;
            Ok(Some(gps::decode_rational_triple(values, hemisphere)?))
        }
        Some(_) => Err(unsupported(tag, "tag does not hold Exif rationals")),
    }
}

pub fn set_exif_string<S: RawStore + ?Sized>(store: &mut S, tag: &TagId, value: &str) -> Result<()> {
    require_namespace(tag, Namespace::Exif)?;
    store.set(
        tag.clone(),
        RawValue::Exif(ExifValue::Ascii(encode_latin1(tag, value)?)),
    );
    Ok(())
}

pub fn set_exif_long<S: RawStore + ?Sized>(store: &mut S, tag: &TagId, value: i64) -> Result<()> {
    require_namespace(tag, Namespace::Exif)?;
    store.set(tag.clone(), RawValue::Exif(ExifValue::Integer(value)));
    Ok(())
}

pub fn set_iptc_strings<S: RawStore + ?Sized>(
    store: &mut S,
    tag: &TagId,
    values: &[String],
) -> Result<()> {
    require_namespace(tag, Namespace::Iptc)?;
    write_tag(store, tag, &TagValue::TextList(values.to_vec()))
}

pub fn set_xmp_string<S: RawStore + ?Sized>(store: &mut S, tag: &TagId, value: &str) -> Result<()> {
    require_namespace(tag, Namespace::Xmp)?;
    store.set(tag.clone(), RawValue::Xmp(XmpValue::Text(String::from(value))));
    Ok(())
}

/// Stores `values` in the container the property's schema expects; a
/// language alternative keeps only the first string.
pub fn set_xmp_strings<S: RawStore + ?Sized>(
    store: &mut S,
    tag: &TagId,
    values: &[String],
) -> Result<()> {
    require_namespace(tag, Namespace::Xmp)?;
    write_tag(store, tag, &TagValue::TextList(values.to_vec()))
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

fn decode_xmp(tag: &TagId, value: &XmpValue) -> Result<TagValue> {
    match value {
        XmpValue::Bag(values) | XmpValue::Seq(values) => Ok(TagValue::TextList(values.clone())),
        XmpValue::LangAlt(values) => Ok(TagValue::LocalizedText(values.clone())),
        XmpValue::GpsCoordinate(text) => {
            let parsed = gps::parse_xmp_coordinate(text)?;
            let coord = gps::decode_sexagesimal(
                parsed.degrees,
                parsed.minutes,
                parsed.seconds,
                parsed.hemisphere,
            )?;
            Ok(TagValue::GeoCoordinate(coord))
        }
        XmpValue::Text(text) => Ok(TagValue::Text(text.clone())),
        XmpValue::Other { kind, .. } => Err(MetadataError::UnknownTagType {
            tag: tag.clone(),
            kind: kind.clone(),
        }),
    }
}

fn decode_exif<S: RawStore + ?Sized>(store: &S, tag: &TagId, value: &ExifValue) -> Result<TagValue> {
    match value {
        ExifValue::DateTime(timestamp) => Ok(TagValue::Timestamp(*timestamp)),
        ExifValue::Integer(number) => Ok(TagValue::Integer(*number)),
        ExifValue::Rational(values) if tag.group() == "GPSInfo" => {
            let hemisphere = exif_hemisphere(store, tag)?;
            Ok(TagValue::GeoCoordinate(gps::decode_rational_triple(
                values, hemisphere,
            )?))
        }
        ExifValue::Rational(values) => {
            let text = values
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" ");
            Ok(TagValue::TextList(vec![text]))
        }
        ExifValue::Ascii(bytes) => Ok(TagValue::TextList(vec![decode_exif_ascii(bytes)])),
    }
}

fn exif_hemisphere<S: RawStore + ?Sized>(store: &S, tag: &TagId) -> Result<Hemisphere> {
    let companion = tag.companion_ref();
    let letter = match store.get(&companion) {
        Some(RawValue::Exif(ExifValue::Ascii(bytes))) => decode_exif_ascii(bytes).chars().next(),
        _ => None,
    };
    let letter = letter.ok_or_else(|| {
        MetadataError::InvalidCoordinate(format!("{tag} has no usable {companion}"))
    })?;
    Hemisphere::try_from(letter)
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

fn encode_xmp(tag: &TagId, value: &TagValue) -> Result<XmpValue> {
    match xmp_kind(tag)? {
        XmpKind::Text => Ok(XmpValue::Text(first_text(tag, value)?)),
        XmpKind::Bag => Ok(XmpValue::Bag(text_values(tag, value)?)),
        XmpKind::Seq => Ok(XmpValue::Seq(text_values(tag, value)?)),
        XmpKind::LangAlt => {
            Ok(XmpValue::LangAlt(BTreeMap::from([(
                String::from(DEFAULT_LANGUAGE),
                first_text(tag, value)?,
            )])))
        }
        XmpKind::GpsCoordinate => {
            let coord = coordinate_for(tag, value)?;
            let sexagesimal = gps::encode_sexagesimal(coord)?;
            Ok(XmpValue::GpsCoordinate(gps::format_xmp_coordinate(&sexagesimal)))
        }
    }
}

fn encode_exif(tag: &TagId, value: &TagValue) -> Result<Vec<(TagId, RawValue)>> {
    let raw = match exif_kind(tag) {
        ExifKind::DateTime => match value {
            TagValue::Timestamp(timestamp) => ExifValue::DateTime(*timestamp),
            other => return Err(mismatch(tag, other, "timestamp")),
        },
        ExifKind::Integer => match value {
            TagValue::Integer(number) if u16::try_from(*number).is_ok() => {
                ExifValue::Integer(*number)
            }
            TagValue::Integer(number) => {
                return Err(unsupported(tag, &format!("{number} does not fit an Exif SHORT")))
            }
            other => return Err(mismatch(tag, other, "integer")),
        },
        ExifKind::GpsCoordinate => {
            let coord = coordinate_for(tag, value)?;
            let (fraction, hemisphere) = gps::encode_rational_triple(coord)?;
            let letter = hemisphere.letter().to_string().into_bytes();
            return Ok(vec![
                (tag.companion_ref(), RawValue::Exif(ExifValue::Ascii(letter))),
                (
                    tag.clone(),
                    RawValue::Exif(ExifValue::Rational(vec![fraction])),
                ),
            ]);
        }
        ExifKind::Ascii => ExifValue::Ascii(encode_latin1(tag, &first_text(tag, value)?)?),
    };
    Ok(vec![(tag.clone(), RawValue::Exif(raw))])
}

fn text_values(tag: &TagId, value: &TagValue) -> Result<Vec<String>> {
    let values: Vec<&str> = match value {
        // Only the default locale is written, or the first one without it.
        TagValue::LocalizedText(entries) => entries
            .get(DEFAULT_LANGUAGE)
            .or_else(|| entries.values().next())
            .map(String::as_str)
            .into_iter()
            .collect(),
        other => other
            .strings()
            .ok_or_else(|| mismatch(tag, other, "text"))?,
    };
    if values.is_empty() {
        return Err(unsupported(tag, "an empty list cannot be written; delete the field instead"));
    }
    Ok(values.into_iter().map(String::from).collect())
}

/// Single-string targets keep the first string of a list.
fn first_text(tag: &TagId, value: &TagValue) -> Result<String> {
    Ok(text_values(tag, value)?.swap_remove(0))
}

fn coordinate_for(tag: &TagId, value: &TagValue) -> Result<GeoCoordinate> {
    let TagValue::GeoCoordinate(coord) = value else {
        return Err(mismatch(tag, value, "coordinate"));
    };
    if let Some(is_latitude) = axis_of(tag.name()) {
        if coord.is_latitude() != is_latitude {
            let expected = if is_latitude { "latitude" } else { "longitude" };
            return Err(unsupported(tag, &format!("expected a {expected}")));
        }
    }
    Ok(*coord)
}

/// `Some(true)` for latitude tag names, `Some(false)` for longitude ones.
fn axis_of(name: &str) -> Option<bool> {
    if name.ends_with("Latitude") {
        Some(true)
    } else if name.ends_with("Longitude") {
        Some(false)
    } else {
        None
    }
}

fn require_namespace(tag: &TagId, namespace: Namespace) -> Result<()> {
    if tag.namespace() == namespace {
        Ok(())
    } else {
        Err(unsupported(tag, &format!("not a {namespace} tag")))
    }
}

fn mismatch(tag: &TagId, value: &TagValue, expected: &str) -> MetadataError {
    unsupported(
        tag,
        &format!("expected {expected}, got {}", value.kind_name()),
    )
}

fn unsupported(tag: &TagId, reason: &str) -> MetadataError {
    MetadataError::UnsupportedValueType {
        tag: tag.clone(),
        reason: String::from(reason),
    }
}

// ---------------------------------------------------------------------------
// ISO-8859-1
// ---------------------------------------------------------------------------

/// Every byte maps to the code point of the same value.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&byte| byte as char).collect()
}

fn encode_latin1(tag: &TagId, text: &str) -> Result<Vec<u8>> {
    text.chars()
        .map(|ch| u8::try_from(u32::from(ch)).ok())
        .collect::<Option<Vec<u8>>>()
        .ok_or_else(|| unsupported(tag, &format!("{text:?} is not representable in ISO-8859-1")))
}

fn decode_exif_ascii(bytes: &[u8]) -> String {
    decode_latin1(bytes).trim_end_matches('\0').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(key: &str) -> TagId {
        TagId::parse(key).expect("test key should parse")
    }

    #[test]
    fn latin1_round_trips_high_bytes() {
        let text = decode_latin1(&[0x43, 0x61, 0x66, 0xE9]);
        assert_eq!(text, "Café");
        let bytes = encode_latin1(&tag("Iptc.Application2.Byline"), &text)
            .expect("latin-1 text should encode");
        assert_eq!(bytes, vec![0x43, 0x61, 0x66, 0xE9]);
    }

    #[test]
    fn latin1_rejects_wide_characters() {
        let err = encode_latin1(&tag("Exif.Image.Artist"), "東京")
            .expect_err("CJK should not encode");
        assert!(matches!(err, MetadataError::UnsupportedValueType { .. }));
    }

    #[test]
    fn kinds_follow_the_tag_schema() {
        assert_eq!(exif_kind(&tag("Exif.GPSInfo.GPSLatitude")), ExifKind::GpsCoordinate);
        assert_eq!(exif_kind(&tag("Exif.GPSInfo.GPSLatitudeRef")), ExifKind::Ascii);
        assert_eq!(exif_kind(&tag("Exif.Photo.DateTimeOriginal")), ExifKind::DateTime);
        assert_eq!(exif_kind(&tag("Exif.Image.Orientation")), ExifKind::Integer);
        assert_eq!(exif_kind(&tag("Exif.Image.Artist")), ExifKind::Ascii);

        assert_eq!(xmp_kind(&tag("Xmp.dc.subject")).expect("known"), XmpKind::Bag);
        assert_eq!(xmp_kind(&tag("Xmp.tiff.Copyright")).expect("known"), XmpKind::LangAlt);
        assert!(matches!(
            xmp_kind(&tag("Xmp.iptcExt.LocationShown")),
            Err(MetadataError::UnknownTagType { .. })
        ));
    }

    #[test]
    fn exif_ascii_drops_trailing_nuls() {
        assert_eq!(decode_exif_ascii(b"Jane Doe\0\0"), "Jane Doe");
    }

    #[test]
    fn exif_ascii_keeps_surrounding_spaces() {
        assert_eq!(decode_exif_ascii(b"  Jane Doe \0"), "  Jane Doe ");
    }
}
