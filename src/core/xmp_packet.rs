//! The image's own XMP packet, read and rewritten through the XMP toolkit.
//!
//! Only catalog properties are loaded. On write every XMP tag of the store
//! with a known schema prefix is set, and catalog properties missing from
//! the store are deleted from the packet.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use xmp_toolkit::{
    xmp_ns, OpenFileOptions, XmpError, XmpFile, XmpMeta, XmpResult, XmpValue as PacketValue,
};

use crate::core::adapter::{self, XmpKind, DEFAULT_LANGUAGE};
use crate::core::catalog;
use crate::models::{Namespace, RawValue, TagId, XmpValue};

const SCHEMAS: &[(&str, &str)] = &[
    ("dc", xmp_ns::DC),
    ("exif", xmp_ns::EXIF),
    ("photoshop", xmp_ns::PHOTOSHOP),
    ("tiff", xmp_ns::TIFF),
    ("xmpRights", xmp_ns::XMP_RIGHTS),
];

fn schema_uri(prefix: &str) -> Option<&'static str> {
    SCHEMAS
        .iter()
        .find(|(known, _)| *known == prefix)
        .map(|(_, uri)| *uri)
}

fn catalog_properties() -> impl Iterator<Item = &'static TagId> {
    catalog::all_tags()
        .into_iter()
        .filter(|tag| tag.namespace() == Namespace::Xmp)
}

/// Catalog XMP properties from the image. A file the toolkit cannot open
/// yields an empty map.
pub fn read_embedded_xmp(path: &Path) -> BTreeMap<TagId, RawValue> {
    let meta = match read_packet(path) {
        Ok(Some(meta)) => meta,
        Ok(None) => return BTreeMap::new(),
        Err(err) => {
            log::debug!("no embedded XMP in {}: {err}", path.display());
            return BTreeMap::new();
        }
    };

    let tags = tags_from_meta(&meta);
    log::debug!("read {} XMP properties from {}", tags.len(), path.display());
    tags
}

fn read_packet(path: &Path) -> XmpResult<Option<XmpMeta>> {
    let mut file = XmpFile::new()?;
    file.open_file(
        path,
        OpenFileOptions::default()
            .for_read()
            .only_xmp()
            .use_smart_handler(),
    )?;
    let meta = file.xmp();
    file.close();
    Ok(meta)
}

/// Rewrite the image's XMP packet from `tags`.
pub fn embed_xmp(path: &Path, tags: &BTreeMap<TagId, RawValue>) -> io::Result<()> {
    let fail = |err: XmpError| {
        io::Error::other(format!("failed to embed XMP in {}: {err}", path.display()))
    };

    let mut file = XmpFile::new().map_err(fail)?;
    file.open_file(
        path,
        OpenFileOptions::default().for_update().use_smart_handler(),
    )
    .map_err(fail)?;

    let mut meta = match file.xmp() {
        Some(meta) => meta,
        None => XmpMeta::new().map_err(fail)?,
    };
    apply_tags(&mut meta, tags).map_err(fail)?;

    if !file.can_put_xmp(&meta) {
        file.close();
        return Err(io::Error::other(format!(
            "{} cannot hold the updated XMP packet",
            path.display()
        )));
    }
    file.put_xmp(&meta).map_err(fail)?;
    file.close();
    Ok(())
}

pub fn tags_from_meta(meta: &XmpMeta) -> BTreeMap<TagId, RawValue> {
    catalog_properties()
        .filter_map(|tag| Some((tag.clone(), RawValue::Xmp(read_property(meta, tag)?))))
        .collect()
}

pub fn apply_tags(meta: &mut XmpMeta, tags: &BTreeMap<TagId, RawValue>) -> XmpResult<()> {
    for tag in catalog_properties() {
        if tags.contains_key(tag) {
            continue;
        }
        if let Some(ns) = schema_uri(tag.group()) {
            meta.delete_property(ns, tag.name())?;
        }
    }

    for (tag, value) in tags {
        let RawValue::Xmp(value) = value else {
            continue;
        };
        let Some(ns) = schema_uri(tag.group()) else {
            log::debug!("{tag} has no known schema, not embedded");
            continue;
        };
        write_property(meta, ns, tag.name(), value)?;
    }
    Ok(())
}

fn read_property(meta: &XmpMeta, tag: &TagId) -> Option<XmpValue> {
    let ns = schema_uri(tag.group())?;
    let name = tag.name();
    let node = meta.property(ns, name)?;

    let value = if node.is_alt_text() {
        let entries = meta
            .property_array(ns, name)
            .enumerate()
            .map(|(index, item)| {
                let lang = meta
                    .property(ns, &format!("{name}[{}]/?xml:lang", index + 1))
                    .map(|lang| lang.value)
                    .unwrap_or_else(|| String::from(DEFAULT_LANGUAGE));
                (lang, item.value)
            })
            .collect();
        XmpValue::LangAlt(entries)
    } else if node.is_alternate() {
        XmpValue::Other {
            kind: String::from("alt"),
            value: node.value,
        }
    } else if node.is_array() {
        let items = meta
            .property_array(ns, name)
            .map(|item| item.value)
            .collect();
        if node.is_ordered() {
            XmpValue::Seq(items)
        } else {
            XmpValue::Bag(items)
        }
    } else if node.is_struct() {
        XmpValue::Other {
            kind: String::from("Struct"),
            value: node.value,
        }
    } else if matches!(adapter::xmp_kind(tag), Ok(XmpKind::GpsCoordinate)) {
        XmpValue::GpsCoordinate(node.value)
    } else {
        XmpValue::Text(node.value)
    };
    Some(value)
}

fn write_property(meta: &mut XmpMeta, ns: &str, name: &str, value: &XmpValue) -> XmpResult<()> {
    // Values this layer cannot express are left as the packet has them.
    if let XmpValue::Other { .. } = value {
        return Ok(());
    }

    meta.delete_property(ns, name)?;
    match value {
        XmpValue::Text(text) | XmpValue::GpsCoordinate(text) => {
            meta.set_property(ns, name, &PacketValue::new(text.clone()))
        }
        XmpValue::Bag(items) => append_items(meta, ns, name, items, false),
        XmpValue::Seq(items) => append_items(meta, ns, name, items, true),
        XmpValue::LangAlt(entries) => {
            // Built item by item: the toolkit's localized-text setter rewrites
            // x-default and matching locales as a side effect.
            let default = entries.get_key_value(DEFAULT_LANGUAGE);
            let others = entries
                .iter()
                .filter(|(lang, _)| lang.as_str() != DEFAULT_LANGUAGE);
            let array = PacketValue::new(String::from(name))
                .set_is_array(true)
                .set_is_ordered(true)
                .set_is_alternate(true)
                .set_is_alt_text(true);
            for (index, (lang, text)) in default.into_iter().chain(others).enumerate() {
                meta.append_array_item(ns, &array, &PacketValue::new(text.clone()))?;
                meta.set_property(
                    ns,
                    &format!("{name}[{}]/?xml:lang", index + 1),
                    &PacketValue::new(lang.clone()),
                )?;
            }
            Ok(())
        }
        XmpValue::Other { .. } => Ok(()),
    }
}

fn append_items(
    meta: &mut XmpMeta,
    ns: &str,
    name: &str,
    items: &[String],
    ordered: bool,
) -> XmpResult<()> {
    let array = PacketValue::new(String::from(name))
        .set_is_array(true)
        .set_is_ordered(ordered);
    for item in items {
        meta.append_array_item(ns, &array, &PacketValue::new(item.clone()))?;
    }
    Ok(())
}
