//! Azure Marketplace VM image records (`az vm image list` shape).

use super::{ImageRecord, MappingError, as_object, optional_str, required_str};
use serde_json::Value;
use time::{Date, macros::format_description};

/// Publisher of the official Red Hat images.
pub const RHEL_PUBLISHER: &str = "RedHat";

/// Map one Azure image record into the common image schema.
///
/// The image date is encoded in the last dot-separated segment of `version` (`YYYYMMDD`).
pub fn image_rhel(record: &Value) -> Result<ImageRecord, MappingError> {
    let record = as_object(record)?;
    let offer = required_str(record, "offer")?;
    let sku = required_str(record, "sku")?;
    let version = required_str(record, "version")?;
    let urn = required_str(record, "urn")?;
    let arch = optional_str(record, "architecture").unwrap_or("x64");
    let virt = optional_str(record, "hyperVGeneration").unwrap_or("unknown");
    let date = date_from_version(version)?;

    let mut image = ImageRecord::new();
    image.insert("name".into(), Value::String(format!("{offer} {sku} {arch}")));
    image.insert("arch".into(), Value::String(arch.to_string()));
    image.insert("version".into(), Value::String(version.to_string()));
    image.insert("imageId".into(), Value::String(urn.to_string()));
    image.insert("date".into(), Value::String(date));
    image.insert("virt".into(), Value::String(virt.to_string()));
    Ok(image)
}

fn date_from_version(version: &str) -> Result<String, MappingError> {
    let invalid = || MappingError::InvalidField {
        field: "version",
        value: version.to_string(),
    };
    let segment = version.rsplit('.').next().unwrap_or(version);
    let date = Date::parse(segment, format_description!("[year][month][day]"))
        .map_err(|_| invalid())?;
    date.format(format_description!("[year]-[month]-[day]"))
        .map_err(|_| invalid())
}
