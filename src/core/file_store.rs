//! [`RawStore`] backed by an image file and a JSON sidecar next to it.
//!
//! The sidecar holds every tag of every namespace and, when present, is the
//! whole store. Without one, the catalog's Exif tags and XMP properties are
//! read from the image itself. Saving can also embed them back into the
//! image.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::panic;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use little_exif::exif_tag::ExifTag;
use little_exif::metadata::Metadata as ExifMetadata;
use little_exif::rational::uR64;
use serde::{Deserialize, Serialize};

use crate::config::StoreConfig;
use crate::core::adapter::decode_latin1;
use crate::core::formats;
use crate::core::xmp_packet;
use crate::core::metadata::{MetadataError, Result};
use crate::core::store::RawStore;
use crate::models::{ExifValue, Namespace, Rational, RawValue, TagId};

const SIDECAR_VERSION: u32 = 1;
const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

#[derive(Debug, Serialize, Deserialize)]
struct SidecarDocument {
    version: u32,
    tags: BTreeMap<TagId, RawValue>,
}

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    sidecar: PathBuf,
    config: StoreConfig,
    tags: BTreeMap<TagId, RawValue>,
}

impl FileStore {
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_config(path, StoreConfig::default())
    }

    pub fn open_with_config(path: &Path, config: StoreConfig) -> Result<Self> {
        if !path.exists() {
            return Err(MetadataError::FileNotFound(path.to_path_buf()));
        }
        fs::File::open(path)?;

        let sidecar = Self::sidecar_path(path, &config);
        let tags = if sidecar.exists() {
            let contents = fs::read_to_string(&sidecar)?;
            let document: SidecarDocument = serde_json::from_str(&contents)?;
            log::debug!(
                "loaded {} tags from {}",
                document.tags.len(),
                sidecar.display()
            );
            document.tags
        } else if formats::is_supported(path) {
            let mut tags = read_embedded_exif(path);
            tags.extend(xmp_packet::read_embedded_xmp(path));
            tags
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            sidecar,
            config,
            tags,
        })
    }

    /// `photo.jpg` becomes `photo.jpg{sidecar_suffix}`.
    pub fn sidecar_path(path: &Path, config: &StoreConfig) -> PathBuf {
        let base_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| String::from("photo"));

        path.with_file_name(format!("{base_name}{}", config.sidecar_suffix))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sidecar(&self) -> &Path {
        &self.sidecar
    }

    pub fn tags(&self) -> impl Iterator<Item = (&TagId, &RawValue)> {
        self.tags.iter()
    }

    /// Serialize the store next to the sidecar. Returns the staging path.
    fn stage_sidecar(&self) -> io::Result<PathBuf> {
        let document = SidecarDocument {
            version: SIDECAR_VERSION,
            tags: self.tags.clone(),
        };
        let encoded = serde_json::to_string_pretty(&document).map_err(io::Error::other)?;

        if let Some(parent) = self.sidecar.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut staging = self.sidecar.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);

        fs::write(&staging, encoded)?;
        Ok(staging)
    }

    /// Embed into the image, then move the staged sidecar into place. The
    /// image is restored from its original bytes if either step fails.
    fn embed_and_commit(&self, staging: &Path) -> io::Result<()> {
        let exif = self.config.embed_exif && formats::supports_embedded_exif(&self.path);
        let xmp = self.config.embed_xmp && formats::supports_embedded_xmp(&self.path);
        if !exif && !xmp {
            return fs::rename(staging, &self.sidecar);
        }

        let original = fs::read(&self.path)?;
        let result = self
            .embed(exif, xmp)
            .and_then(|()| fs::rename(staging, &self.sidecar));

        if result.is_err() {
            if let Err(err) = fs::write(&self.path, &original) {
                log::error!(
                    "could not restore {} after a failed save: {err}",
                    self.path.display()
                );
            }
        }
        result
    }

    fn embed(&self, exif: bool, xmp: bool) -> io::Result<()> {
        if exif {
            embed_exif(&self.path, &self.tags)?;
        }
        if xmp {
            xmp_packet::embed_xmp(&self.path, &self.tags)?;
        }
        Ok(())
    }
}

impl RawStore for FileStore {
    fn keys(&self, namespace: Namespace) -> Vec<TagId> {
        self.tags
            .keys()
            .filter(|tag| tag.namespace() == namespace)
            .cloned()
            .collect()
    }

    fn get(&self, tag: &TagId) -> Option<&RawValue> {
        self.tags.get(tag)
    }

    fn set(&mut self, tag: TagId, value: RawValue) {
        self.tags.insert(tag, value);
    }

    fn remove(&mut self, tag: &TagId) -> Option<RawValue> {
        self.tags.remove(tag)
    }

    fn persist(&mut self) -> io::Result<()> {
        let staging = self.stage_sidecar()?;
        if let Err(err) = self.embed_and_commit(&staging) {
            let _ = fs::remove_file(&staging);
            return Err(err);
        }
        log::debug!("wrote {}", self.sidecar.display());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Embedded Exif
// ---------------------------------------------------------------------------

/// Catalog-relevant Exif tags from the image. Anything little_exif cannot
/// parse yields an empty store.
fn read_embedded_exif(path: &Path) -> BTreeMap<TagId, RawValue> {
    let owned = path.to_path_buf();
    let exif = match panic::catch_unwind(panic::AssertUnwindSafe(|| {
        ExifMetadata::new_from_path(&owned)
    })) {
        Ok(Ok(exif)) => exif,
        Ok(Err(err)) => {
            log::debug!("no embedded Exif in {}: {err:?}", path.display());
            return BTreeMap::new();
        }
        Err(_) => {
            log::warn!("Exif parser panicked on {}", path.display());
            return BTreeMap::new();
        }
    };

    let mut tags = BTreeMap::new();
    for tag in &exif {
        if let Some((key, value)) = convert_exif_tag(tag) {
            tags.insert(exif_key(key), RawValue::Exif(value));
        }
    }
    log::debug!("read {} Exif tags from {}", tags.len(), path.display());
    tags
}

fn convert_exif_tag(tag: &ExifTag) -> Option<(&'static str, ExifValue)> {
    let converted = match tag {
        ExifTag::ImageDescription(s) => ("Image.ImageDescription", ascii(s)),
        ExifTag::Artist(s) => ("Image.Artist", ascii(s)),
        ExifTag::Copyright(s) => ("Image.Copyright", ascii(s)),
        ExifTag::DateTimeOriginal(s) => ("Photo.DateTimeOriginal", date_time(s)?),
        ExifTag::CreateDate(s) => ("Photo.DateTimeDigitized", date_time(s)?),
        ExifTag::ModifyDate(s) => ("Image.DateTime", date_time(s)?),
        ExifTag::Orientation(v) => ("Image.Orientation", ExifValue::Integer(i64::from(*v.first()?))),
        ExifTag::GPSLatitudeRef(s) => ("GPSInfo.GPSLatitudeRef", ascii(s)),
        ExifTag::GPSLongitudeRef(s) => ("GPSInfo.GPSLongitudeRef", ascii(s)),
        ExifTag::GPSLatitude(v) => ("GPSInfo.GPSLatitude", rationals(v)),
        ExifTag::GPSLongitude(v) => ("GPSInfo.GPSLongitude", rationals(v)),
        _ => return None,
    };
    Some(converted)
}

/// Write the Exif tags this store knows how to express into the image.
/// Tags absent from the store are left as they are in the file.
fn embed_exif(path: &Path, tags: &BTreeMap<TagId, RawValue>) -> io::Result<()> {
    let exif_tags = tags
        .iter()
        .filter_map(|(tag, value)| match value {
            RawValue::Exif(value) => to_exif_tag(tag, value),
            _ => None,
        })
        .collect::<Vec<_>>();

    if exif_tags.is_empty() {
        return Ok(());
    }

    let owned = path.to_path_buf();
    let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
        let mut exif = ExifMetadata::new_from_path(&owned).unwrap_or_else(|_| ExifMetadata::new());
        for tag in exif_tags {
            exif.set_tag(tag);
        }
        exif.write_to_file(&owned)
    }));

    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(io::Error::other(format!(
            "failed to embed Exif in {}: {err:?}",
            path.display()
        ))),
        Err(_) => Err(io::Error::other(format!(
            "Exif writer panicked on {}",
            path.display()
        ))),
    }
}

fn to_exif_tag(tag: &TagId, value: &ExifValue) -> Option<ExifTag> {
    let key = format!("{}.{}", tag.group(), tag.name());
    let exif_tag = match (key.as_str(), value) {
        ("Image.ImageDescription", ExifValue::Ascii(b)) => ExifTag::ImageDescription(decode_latin1(b)),
        ("Image.Artist", ExifValue::Ascii(b)) => ExifTag::Artist(decode_latin1(b)),
        ("Image.Copyright", ExifValue::Ascii(b)) => ExifTag::Copyright(decode_latin1(b)),
        ("Photo.DateTimeOriginal", ExifValue::DateTime(t)) => {
            ExifTag::DateTimeOriginal(t.format(EXIF_DATE_FORMAT).to_string())
        }
        ("Photo.DateTimeDigitized", ExifValue::DateTime(t)) => {
            ExifTag::CreateDate(t.format(EXIF_DATE_FORMAT).to_string())
        }
        ("Image.DateTime", ExifValue::DateTime(t)) => {
            ExifTag::ModifyDate(t.format(EXIF_DATE_FORMAT).to_string())
        }
        ("Image.Orientation", ExifValue::Integer(n)) => {
            ExifTag::Orientation(vec![u16::try_from(*n).ok()?])
        }
        ("GPSInfo.GPSLatitudeRef", ExifValue::Ascii(b)) => ExifTag::GPSLatitudeRef(decode_latin1(b)),
        ("GPSInfo.GPSLongitudeRef", ExifValue::Ascii(b)) => {
            ExifTag::GPSLongitudeRef(decode_latin1(b))
        }
        ("GPSInfo.GPSLatitude", ExifValue::Rational(r)) => ExifTag::GPSLatitude(ur64s(r)),
        ("GPSInfo.GPSLongitude", ExifValue::Rational(r)) => ExifTag::GPSLongitude(ur64s(r)),
        _ => return None,
    };
    Some(exif_tag)
}

fn exif_key(key: &str) -> TagId {
    let (group, name) = key.split_once('.').unwrap_or(("Image", key));
    TagId::new(Namespace::Exif, group, name)
}

/// Exif strings are stored as ISO-8859-1 bytes; characters outside it
/// become `?`.
fn ascii(s: &str) -> ExifValue {
    let bytes = s
        .trim_end_matches('\0')
        .chars()
        .map(|ch| u8::try_from(u32::from(ch)).unwrap_or(b'?'))
        .collect();
    ExifValue::Ascii(bytes)
}

fn date_time(s: &str) -> Option<ExifValue> {
    let trimmed = s.trim_end_matches('\0').trim();
    NaiveDateTime::parse_from_str(trimmed, EXIF_DATE_FORMAT)
        .ok()
        .map(ExifValue::DateTime)
}

fn rationals(values: &[uR64]) -> ExifValue {
    ExifValue::Rational(
        values
            .iter()
            .map(|r| Rational::new(r.nominator, r.denominator))
            .collect(),
    )
}

fn ur64s(values: &[Rational]) -> Vec<uR64> {
    values
        .iter()
        .map(|r| uR64 {
            nominator: r.numerator,
            denominator: r.denominator,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sidecar_sits_next_to_the_image() {
        let config = StoreConfig::default();
        assert_eq!(
            FileStore::sidecar_path(Path::new("/photos/IMG_1.jpg"), &config),
            PathBuf::from("/photos/IMG_1.jpg.fields.json")
        );
    }

    #[test]
    fn exif_tags_convert_both_ways() {
        let (key, value) = convert_exif_tag(&ExifTag::Artist(String::from("Zoë\0")))
            .expect("artist should convert");
        assert_eq!(key, "Image.Artist");
        assert_eq!(value, ExifValue::Ascii(vec![b'Z', b'o', 0xEB]));

        let tag = exif_key(key);
        assert_eq!(tag.to_string(), "Exif.Image.Artist");
        assert!(matches!(
            to_exif_tag(&tag, &value),
            Some(ExifTag::Artist(ref s)) if s == "Zoë"
        ));
    }

    #[test]
    fn unparseable_dates_are_skipped() {
        assert!(convert_exif_tag(&ExifTag::DateTimeOriginal(String::from("    :  :  "))).is_none());
        assert!(matches!(
            convert_exif_tag(&ExifTag::ModifyDate(String::from("2023:12:24 18:00:00\0"))),
            Some(("Image.DateTime", ExifValue::DateTime(_)))
        ));
    }

    #[test]
    fn out_of_range_orientation_is_not_embedded() {
        let tag = exif_key("Image.Orientation");
        assert!(to_exif_tag(&tag, &ExifValue::Integer(70_000)).is_none());
        assert!(to_exif_tag(&tag, &ExifValue::Integer(6)).is_some());
    }
}
