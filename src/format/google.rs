//! Google Compute Engine image records (`images.list` shape).

use super::{ImageRecord, MappingError, as_object, optional_str, required_str};
use serde_json::Value;

/// Map one Compute Engine image into the common image schema.
///
/// Expects `creation_timestamp` to be populated; the transformer copies it from
/// `creationTimestamp` before calling in.
pub fn image_rhel(record: &Value) -> Result<ImageRecord, MappingError> {
    let record = as_object(record)?;
    let name = required_str(record, "name")?;
    let image_id = match record.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => return Err(MappingError::MissingField { field: "id" }),
    };
    let date = required_str(record, "creation_timestamp")?;
    let selflink = required_str(record, "selfLink")?;
    let arch = optional_str(record, "architecture")
        .unwrap_or("X86_64")
        .to_lowercase();
    let version = version_from_name(name).ok_or_else(|| MappingError::UnrecognizedName {
        name: name.to_string(),
    })?;

    let mut image = ImageRecord::new();
    image.insert("name".into(), Value::String(name.to_string()));
    image.insert("arch".into(), Value::String(arch));
    image.insert("version".into(), Value::String(version));
    image.insert("imageId".into(), Value::String(image_id));
    image.insert("date".into(), Value::String(date.to_string()));
    image.insert("selflink".into(), Value::String(selflink.to_string()));
    Ok(image)
}

/// `rhel-7-9-sap-v20220126` -> `7.9`; `None` when no numeric segment follows `rhel`.
fn version_from_name(name: &str) -> Option<String> {
    let mut segments = name.split('-').skip_while(|segment| *segment != "rhel");
    segments.next()?;
    let version: Vec<&str> = segments
        .take_while(|segment| {
            !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit())
        })
        .collect();
    if version.is_empty() {
        None
    } else {
        Some(version.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rhel_record() -> Value {
        json!({
            "name": "rhel-8-v20220126",
            "id": "4207418012637237123",
            "creation_timestamp": "2022-01-26T10:12:44.913-08:00",
            "creationTimestamp": "2022-01-26T10:12:44.913-08:00",
            "selfLink": "https://www.googleapis.com/compute/v1/projects/rhel-cloud/global/images/rhel-8-v20220126",
            "architecture": "X86_64"
        })
    }

    #[test]
    fn image_rhel_builds_common_record() {
        let image = image_rhel(&rhel_record()).expect("mapped");
        assert_eq!(image["name"], "rhel-8-v20220126");
        assert_eq!(image["arch"], "x86_64");
        assert_eq!(image["version"], "8");
        assert_eq!(image["imageId"], "4207418012637237123");
        assert_eq!(image["date"], "2022-01-26T10:12:44.913-08:00");
        assert!(image["selflink"].as_str().unwrap().ends_with("rhel-8-v20220126"));
    }

    #[test]
    fn version_joins_numeric_segments() {
        assert_eq!(version_from_name("rhel-7-9-sap-v20220126").as_deref(), Some("7.9"));
        assert_eq!(version_from_name("rhel-9-arm64-v20230411").as_deref(), Some("9"));
        assert_eq!(version_from_name("centos-7-v20220126"), None);
        assert_eq!(version_from_name("rhel-sap-v20220126"), None);
    }

    #[test]
    fn image_rhel_requires_creation_timestamp() {
        let mut record = rhel_record();
        record.as_object_mut().unwrap().remove("creation_timestamp");
        assert_eq!(
            image_rhel(&record),
            Err(MappingError::MissingField {
                field: "creation_timestamp"
            })
        );
    }
}
