//! AWS EC2 `DescribeImages` records.
//!
//! Red Hat publishes its AMIs with names such as `RHEL-8.5.0_HVM-20211103-x86_64-0-Hourly2-GP2`;
//! [`parse_image_name`] splits those into their parts and [`image_rhel`] builds the common
//! record from them.

use super::{ImageRecord, MappingError, as_object, required_str};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Account that owns the official Red Hat images.
pub const RHEL_OWNER_ID: &str = "309956199498";

static IMAGE_NAME: OnceLock<Regex> = OnceLock::new();

fn image_name_regex() -> &'static Regex {
    IMAGE_NAME.get_or_init(|| {
        Regex::new(
            r"^RHEL(?:_(?P<intprod>[A-Z]+))?-(?:(?P<extprod>[A-Z]+)-)?(?P<version>[\d.]+)_(?P<virt>[A-Z]+)(?:_(?P<beta>BETA))?-(?P<date>\d{8})-(?P<arch>[A-Za-z0-9_]+)-(?P<release>\d+)-(?P<billing>[A-Za-z0-9]+)-(?P<storage>[A-Za-z0-9]+)$",
        )
        .expect("AWS image name pattern is valid")
    })
}

/// Components of a Red Hat AMI name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageName {
    /// Internal product variant (e.g. `HA`).
    pub intprod: Option<String>,
    /// External product variant (e.g. `SAP`).
    pub extprod: Option<String>,
    /// RHEL version.
    pub version: String,
    /// Virtualization type.
    pub virt: String,
    /// `BETA` marker, if present.
    pub beta: Option<String>,
    /// Build date as `YYYYMMDD`.
    pub date: String,
    /// CPU architecture.
    pub arch: String,
    /// Image release number.
    pub release: String,
    /// Billing code (e.g. `Hourly2`, `Access2`).
    pub billing: String,
    /// Storage type (e.g. `GP2`).
    pub storage: String,
}

impl ImageName {
    /// Human-readable title used as the normalized image name.
    pub fn title(&self) -> String {
        let mut parts = vec!["RHEL"];
        if let Some(product) = self.intprod.as_deref().or(self.extprod.as_deref()) {
            parts.push(product);
        }
        parts.push(&self.version);
        if let Some(beta) = self.beta.as_deref() {
            parts.push(beta);
        }
        parts.push(&self.virt);
        parts.push(&self.arch);
        parts.push(&self.billing);
        parts.join(" ")
    }
}

/// Parse a Red Hat AMI name; returns `None` when the name does not follow the convention.
pub fn parse_image_name(name: &str) -> Option<ImageName> {
    let captures = image_name_regex().captures(name)?;
    let group = |key: &str| captures.name(key).map(|m| m.as_str().to_string());
    Some(ImageName {
        intprod: group("intprod"),
        extprod: group("extprod"),
        version: group("version")?,
        virt: group("virt")?,
        beta: group("beta"),
        date: group("date")?,
        arch: group("arch")?,
        release: group("release")?,
        billing: group("billing")?,
        storage: group("storage")?,
    })
}

/// Map one `DescribeImages` entry from `region` into the common image schema.
pub fn image_rhel(record: &Value, region: &str) -> Result<ImageRecord, MappingError> {
    let record = as_object(record)?;
    let name = required_str(record, "Name")?;
    let parsed = parse_image_name(name).ok_or_else(|| MappingError::UnrecognizedName {
        name: name.to_string(),
    })?;
    let image_id = required_str(record, "ImageId")?;

    let mut image = ImageRecord::new();
    image.insert("name".into(), Value::String(parsed.title()));
    image.insert(
        "arch".into(),
        Value::String(required_str(record, "Architecture")?.to_string()),
    );
    image.insert("version".into(), Value::String(parsed.version.clone()));
    image.insert("imageId".into(), Value::String(image_id.to_string()));
    image.insert(
        "date".into(),
        Value::String(required_str(record, "CreationDate")?.to_string()),
    );
    image.insert(
        "virt".into(),
        Value::String(required_str(record, "VirtualizationType")?.to_string()),
    );
    image.insert(
        "selflink".into(),
        Value::String(format!(
            "https://console.aws.amazon.com/ec2/home?region={region}#launchAmi={image_id}"
        )),
    );
    image.insert("region".into(), Value::String(region.to_string()));
    Ok(image)
}
